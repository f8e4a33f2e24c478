//! Core domain types for KawaiiReview entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::KawaiiError;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The two review collections the site publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Anime,
    Album,
}

impl Kind {
    /// All kinds, in the order they are listed and built.
    pub const ALL: [Kind; 2] = [Kind::Anime, Kind::Album];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anime => "anime",
            Self::Album => "album",
        }
    }

    /// Content directory under the site root (`anime/`, `album/`).
    pub fn content_dir(&self) -> &'static str {
        self.as_str()
    }

    /// JSON index file name under `data/`.
    pub fn data_file(&self) -> &'static str {
        match self {
            Self::Anime => "anime.json",
            Self::Album => "albums.json",
        }
    }

    /// Template file name under `templates/`.
    pub fn template_file(&self) -> &'static str {
        match self {
            Self::Anime => "anime.html",
            Self::Album => "album.html",
        }
    }

    /// Frontmatter / index key holding the studio or artist.
    pub fn owner_key(&self) -> &'static str {
        match self {
            Self::Anime => "studio",
            Self::Album => "artist",
        }
    }

    pub fn meta_label(&self) -> &'static str {
        match self {
            Self::Anime => "Studios",
            Self::Album => "Artists",
        }
    }

    pub fn eyebrow(&self) -> &'static str {
        match self {
            Self::Anime => "Anime review",
            Self::Album => "Album review",
        }
    }

    pub fn cover_class(&self) -> &'static str {
        match self {
            Self::Anime => "post-cover post-cover-anime",
            Self::Album => "post-cover post-cover-album",
        }
    }

    /// Heading used by `list` output.
    pub fn section_label(&self) -> &'static str {
        match self {
            Self::Anime => "Anime",
            Self::Album => "Albums",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = KawaiiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anime" => Ok(Self::Anime),
            "album" => Ok(Self::Album),
            other => Err(KawaiiError::validation(format!(
                "unknown kind '{other}': expected 'anime' or 'album'"
            ))),
        }
    }
}

/// A `list`/`build-all` selector: one kind or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    Anime,
    Album,
    #[default]
    All,
}

impl Scope {
    pub fn kinds(&self) -> Vec<Kind> {
        match self {
            Self::Anime => vec![Kind::Anime],
            Self::Album => vec![Kind::Album],
            Self::All => Kind::ALL.to_vec(),
        }
    }
}

impl FromStr for Scope {
    type Err = KawaiiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anime" => Ok(Self::Anime),
            "album" => Ok(Self::Album),
            "all" => Ok(Self::All),
            other => Err(KawaiiError::validation(format!(
                "unknown scope '{other}': expected 'anime', 'album', or 'all'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceKind
// ---------------------------------------------------------------------------

/// The metadata API a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    AniList,
    Jikan,
    MusicBrainz,
    TheAudioDb,
    Itunes,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AniList => "anilist",
            Self::Jikan => "jikan",
            Self::MusicBrainz => "musicbrainz",
            Self::TheAudioDb => "theaudiodb",
            Self::Itunes => "itunes",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// A review score: a number in `0..=10`, or free text the author typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Number(f64),
    Text(String),
}

impl Score {
    /// Parse operator input. Blank input means "no score".
    ///
    /// A leading number is accepted the way a browser's `parseFloat` would
    /// (`"8.5/10"` scores 8.5) and clamped into `0..=10`.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        match leading_float(trimmed) {
            Some(value) => Some(Self::Number(value.clamp(0.0, 10.0))),
            None => Some(Self::Text(trimmed.to_string())),
        }
    }

    /// Numeric value, if this score is (or starts with) a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(t) => leading_float(t.trim()),
        }
    }

    /// JSON form written into frontmatter.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => json_number(*n),
            Self::Text(t) => Value::String(t.clone()),
        }
    }
}

/// Parse the longest numeric prefix of `s`, like JavaScript's `parseFloat`.
pub fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|(i, c)| {
            c.is_ascii_digit() || *c == '.' || ((*c == '-' || *c == '+') && *i == 0)
        })
        .map(|(i, c)| i + c.len_utf8())
        .last()?;

    (1..=end)
        .rev()
        .filter(|i| s.is_char_boundary(*i))
        .find_map(|i| s[..i].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Encode a number the way JavaScript's `JSON.stringify` does: integral
/// values carry no fractional part.
pub fn json_number(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Enough fractional digits to print any `f64` exactly.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Fixed-point formatting matching JavaScript's `toFixed`: the digits of the
/// closest decimal to the exact binary value, with exact halves rounded away
/// from zero (`8.25` → `"8.3"`, but `8.35` → `"8.3"`).
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let exact = format!("{abs:.prec$}", prec = EXACT_FRACTION_DIGITS);
    let rest = exact
        .split_once('.')
        .and_then(|(_, fraction)| fraction.get(digits..))
        .unwrap_or("")
        .trim_end_matches('0');

    let fixed = if rest == "5" {
        let half_step = 0.5 / 10f64.powi(digits as i32);
        format!("{:.digits$}", abs + half_step)
    } else {
        format!("{abs:.digits$}")
    };
    format!("{sign}{fixed}")
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// One normalized metadata match from a source, before the operator picks it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    /// Studio(s) for anime, artist(s) for albums.
    pub owner: String,
    pub year: Option<i32>,
    /// Comma-separated genre list.
    pub genres: String,
    pub synopsis: String,
    pub cover_url: String,
    pub source_url: String,
    /// Human label, e.g. `1 Season × 12 Episodes` or `1 hr 02 mins`.
    pub runtime: String,
    /// Secondary label, e.g. `Aired Oct 2023 – Mar 2024`.
    pub runtime_detail: String,
    pub seasons: Option<u32>,
    pub episodes: Option<u32>,
    pub length_minutes: Option<f64>,
    pub source: SourceKind,
    /// MusicBrainz release id, used to fetch track lengths later.
    pub mbid: Option<String>,
    pub score: Option<Score>,
}

impl Candidate {
    /// An empty candidate for `source`, to be filled in by a fetcher.
    pub fn new(source: SourceKind, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            owner: String::new(),
            year: None,
            genres: String::new(),
            synopsis: String::new(),
            cover_url: String::new(),
            source_url: String::new(),
            runtime: String::new(),
            runtime_detail: String::new(),
            seasons: None,
            episodes: None,
            length_minutes: None,
            source,
            mbid: None,
            score: None,
        }
    }

    /// One-line summary shown in the chooser.
    pub fn describe(&self) -> String {
        let year = self
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        format!("{} ({year}) by {}", self.title, self.owner)
    }
}

// ---------------------------------------------------------------------------
// IndexEntry
// ---------------------------------------------------------------------------

/// A freshly scaffolded row of `data/anime.json` / `data/albums.json`.
///
/// Rows already on disk are handled as plain JSON values so hand-edited
/// rows of any shape survive a rewrite; this type only builds new ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub cover: String,
    /// Site-relative path of the built page; `null` until `build` runs.
    pub link: Option<String>,
    /// RFC 3339 creation timestamp; the index is sorted by it.
    pub created: String,
}

impl IndexEntry {
    /// Build a fresh row for a newly scaffolded review.
    pub fn new(
        kind: Kind,
        slug: impl Into<String>,
        title: impl Into<String>,
        year: Option<i32>,
        owner: impl Into<String>,
        cover: impl Into<String>,
        created: impl Into<String>,
    ) -> Self {
        let owner = Some(owner.into());
        let (studio, artist) = match kind {
            Kind::Anime => (owner, None),
            Kind::Album => (None, owner),
        };
        Self {
            slug: slug.into(),
            title: title.into(),
            year,
            studio,
            artist,
            cover: cover.into(),
            link: None,
            created: created.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_paths() {
        assert_eq!(Kind::Anime.data_file(), "anime.json");
        assert_eq!(Kind::Album.data_file(), "albums.json");
        assert_eq!(Kind::Album.owner_key(), "artist");
        assert_eq!("album".parse::<Kind>().unwrap(), Kind::Album);
        assert!("manga".parse::<Kind>().is_err());
    }

    #[test]
    fn scope_expands_to_kinds() {
        assert_eq!(Scope::All.kinds(), vec![Kind::Anime, Kind::Album]);
        assert_eq!("album".parse::<Scope>().unwrap().kinds(), vec![Kind::Album]);
    }

    #[test]
    fn score_parsing() {
        assert_eq!(Score::parse(""), None);
        assert_eq!(Score::parse("  "), None);
        assert_eq!(Score::parse("8.5"), Some(Score::Number(8.5)));
        assert_eq!(Score::parse("12"), Some(Score::Number(10.0)));
        assert_eq!(Score::parse("-3"), Some(Score::Number(0.0)));
        assert_eq!(Score::parse("7.5/10"), Some(Score::Number(7.5)));
        assert_eq!(Score::parse("masterpiece"), Some(Score::Text("masterpiece".into())));
    }

    #[test]
    fn score_json_matches_js_number_format() {
        assert_eq!(Score::Number(8.0).to_json().to_string(), "8");
        assert_eq!(Score::Number(8.5).to_json().to_string(), "8.5");
        assert_eq!(Score::Text("TBD".into()).to_json().to_string(), "\"TBD\"");
    }

    #[test]
    fn leading_float_prefixes() {
        assert_eq!(leading_float("9.25 stars"), Some(9.25));
        assert_eq!(leading_float("abc"), None);
        assert_eq!(leading_float("."), None);
        assert_eq!(leading_float("3."), Some(3.0));
    }

    #[test]
    fn fixed_point_rounding() {
        assert_eq!(to_fixed(8.0, 1), "8.0");
        assert_eq!(to_fixed(8.25, 1), "8.3");
        assert_eq!(to_fixed(0.85, 2), "0.85");
        assert_eq!(to_fixed(-3.0, 1), "-3.0");
        assert_eq!(to_fixed(-8.25, 1), "-8.3");
        assert_eq!(to_fixed(0.125, 2), "0.13");
    }

    #[test]
    fn fixed_point_uses_exact_binary_value() {
        assert_eq!(to_fixed(8.35, 1), "8.3");
        assert_eq!(to_fixed(0.825, 2), "0.82");
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(9.95, 1), "9.9");
    }

    #[test]
    fn candidate_description() {
        let mut c = Candidate::new(SourceKind::Jikan, "Frieren");
        c.owner = "Madhouse".into();
        assert_eq!(c.describe(), "Frieren (n/a) by Madhouse");
        c.year = Some(2023);
        assert_eq!(c.describe(), "Frieren (2023) by Madhouse");
    }

    #[test]
    fn index_entry_key_order() {
        let entry = IndexEntry::new(
            Kind::Album,
            "in-rainbows",
            "In Rainbows",
            Some(2007),
            "Radiohead",
            "album/in-rainbows/cover.jpg",
            "2024-01-01T00:00:00.000Z",
        );
        let json = serde_json::to_string(&entry).expect("serialize");
        assert_eq!(
            json,
            r#"{"slug":"in-rainbows","title":"In Rainbows","year":2007,"artist":"Radiohead","cover":"album/in-rainbows/cover.jpg","link":null,"created":"2024-01-01T00:00:00.000Z"}"#
        );
    }
}
