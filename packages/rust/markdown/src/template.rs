//! `{{ placeholder }}` substitution for the per-kind page templates.

use regex::{NoExpand, Regex};

/// Replace every `{{ key }}` (whitespace inside the braces is optional) for
/// each `(key, value)` pair, in order. Placeholders with no matching key are
/// left untouched.
pub fn apply_template(template: &str, replacements: &[(&str, String)]) -> String {
    replacements
        .iter()
        .fold(template.to_string(), |html, (key, value)| {
            let pattern = format!(r"\{{\{{\s*{}\s*\}}\}}", regex::escape(key));
            match Regex::new(&pattern) {
                Ok(re) => re.replace_all(&html, NoExpand(value)).into_owned(),
                Err(e) => {
                    tracing::warn!(key, error = %e, "skipping unusable template key");
                    html
                }
            }
        })
}
