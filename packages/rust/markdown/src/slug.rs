//! URL-safe slugs derived from titles.

use std::sync::LazyLock;

use regex::Regex;

/// Slug used when a title has no ASCII letters or digits at all.
pub const FALLBACK_SLUG: &str = "entry";

/// Lowercase, collapse every run of non-`[a-z0-9]` into `-`, trim dashes.
///
/// Idempotent: `slugify(&slugify(x)) == slugify(x)`.
pub fn slugify(text: &str) -> String {
    try_slugify(text).unwrap_or_else(|| FALLBACK_SLUG.to_string())
}

/// Like [`slugify`], but `None` when nothing slug-worthy is left.
pub fn try_slugify(text: &str) -> Option<String> {
    static NON_ALNUM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

    let lowered = text.to_lowercase();
    let dashed = NON_ALNUM_RE.replace_all(&lowered, "-");
    let slug = dashed.trim_matches('-');
    (!slug.is_empty()).then(|| slug.to_string())
}

/// `base`, `base-2`, `base-3`, …: the `n`th disambiguated form of a slug.
pub fn suffixed(base: &str, n: usize) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_titles() {
        assert_eq!(slugify("Frieren: Beyond Journey's End"), "frieren-beyond-journey-s-end");
        assert_eq!(slugify("  OK Computer  "), "ok-computer");
        assert_eq!(slugify("86 -Eighty Six-"), "86-eighty-six");
        assert_eq!(slugify("Mob Psycho 100 II"), "mob-psycho-100-ii");
    }

    #[test]
    fn empty_and_non_ascii_fall_back() {
        assert_eq!(slugify(""), "entry");
        assert_eq!(slugify("!!!"), "entry");
        assert_eq!(slugify("葬送のフリーレン"), "entry");
        assert_eq!(try_slugify("!!!"), None);
        assert_eq!(try_slugify("Akira!").as_deref(), Some("akira"));
    }

    #[test]
    fn idempotent() {
        for title in [
            "Cowboy Bebop",
            "K-On!!",
            "Re:Zero − Starting Life in Another World",
            "...",
            "Ünïcödé Tïtle",
            "a--b__c",
        ] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once, "slugify not idempotent for {title:?}");
        }
    }

    #[test]
    fn punctuation_and_case_variants_share_a_base() {
        assert_eq!(slugify("K-On!"), slugify("k on"));
        assert_eq!(slugify("K-On!"), "k-on");
    }

    #[test]
    fn suffixes() {
        assert_eq!(suffixed("k-on", 1), "k-on");
        assert_eq!(suffixed("k-on", 2), "k-on-2");
        assert_eq!(slugify(&suffixed("k-on", 3)), "k-on-3");
    }
}
