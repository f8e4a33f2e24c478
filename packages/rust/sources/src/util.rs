//! Deserialization and normalization helpers shared by the fetchers.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string, a number, or `null`; empty strings become `None`.
///
/// TheAudioDB in particular returns numeric fields as strings, and the
/// occasional field as a bare number.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// First candidate that is present and non-empty, like a chain of JS `||`.
pub(crate) fn first_non_empty<'a, I>(options: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    options
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

/// Join names with `, `, skipping blanks.
pub(crate) fn join_names<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Year from the front of an ISO-ish date (`2007`, `2007-10`, `2007-10-10T07:00:00Z`).
pub(crate) fn year_prefix(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

/// Keep the filtered subset only when it is non-empty.
pub(crate) fn narrow<T, F>(items: Vec<T>, keep: F) -> Vec<T>
where
    F: Fn(&T) -> bool,
{
    if !items.iter().any(&keep) {
        return items;
    }
    items.into_iter().filter(|item| keep(item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Lenient {
        #[serde(default, deserialize_with = "lenient_string")]
        value: Option<String>,
    }

    #[test]
    fn lenient_string_shapes() {
        let parse = |s: &str| serde_json::from_str::<Lenient>(s).unwrap().value;
        assert_eq!(parse(r#"{"value":"2007"}"#).as_deref(), Some("2007"));
        assert_eq!(parse(r#"{"value":2007}"#).as_deref(), Some("2007"));
        assert_eq!(parse(r#"{"value":""}"#), None);
        assert_eq!(parse(r#"{"value":null}"#), None);
        assert_eq!(parse(r#"{}"#), None);
    }

    #[test]
    fn helpers() {
        assert_eq!(first_non_empty([None, Some(""), Some("b")]), Some("b"));
        assert_eq!(first_non_empty([None, Some(" ")]), None);
        assert_eq!(join_names(["Bones", " ", "MAPPA"]), "Bones, MAPPA");
        assert_eq!(year_prefix("2007-10-10T07:00:00Z"), Some(2007));
        assert_eq!(year_prefix("20"), None);
        assert_eq!(narrow(vec![1, 2, 3], |n| *n > 1), vec![2, 3]);
        assert_eq!(narrow(vec![1, 2, 3], |n| *n > 5), vec![1, 2, 3]);
    }
}
