//! Metadata lookups for new reviews.
//!
//! Each kind has an ordered list of sources. [`resolve`] walks that list and
//! returns the candidates from the first source that yields anything:
//!
//! - anime: AniList, then Jikan
//! - album: MusicBrainz (+ Cover Art Archive), then TheAudioDB, then iTunes

pub mod client;

mod anilist;
mod itunes;
mod jikan;
mod musicbrainz;
mod theaudiodb;
mod util;

use tracing::{info, instrument};

use kawaii_shared::{
    Candidate, KawaiiError, Kind, Result, SourceKind, format_album_runtime, format_anime_runtime,
};

pub use client::SourceClient;

const ANIME_SOURCES: &[SourceKind] = &[SourceKind::AniList, SourceKind::Jikan];
const ALBUM_SOURCES: &[SourceKind] = &[
    SourceKind::MusicBrainz,
    SourceKind::TheAudioDb,
    SourceKind::Itunes,
];

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub title: String,
    pub year: Option<i32>,
    /// Only used for albums.
    pub artist: Option<String>,
}

/// The sources consulted for `kind`, in fallback order.
pub fn sources_for(kind: Kind) -> &'static [SourceKind] {
    match kind {
        Kind::Anime => ANIME_SOURCES,
        Kind::Album => ALBUM_SOURCES,
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for the source chain.
pub trait SearchProgress: Send + Sync {
    /// Called before each source is queried.
    fn querying(&self, source: SourceKind);
    /// Called after a source answers, with the number of candidates it gave.
    fn answered(&self, source: SourceKind, count: usize);
}

/// No-op search progress.
pub struct SilentSearch;

impl SearchProgress for SilentSearch {
    fn querying(&self, _source: SourceKind) {}
    fn answered(&self, _source: SourceKind, _count: usize) {}
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Candidates from the first source that had any.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub source: SourceKind,
    pub candidates: Vec<Candidate>,
}

/// Query a single source.
pub async fn search(
    client: &SourceClient,
    source: SourceKind,
    query: &SearchQuery,
) -> Result<Vec<Candidate>> {
    match source {
        SourceKind::AniList => anilist::search(client, query).await,
        SourceKind::Jikan => jikan::search(client, query).await,
        SourceKind::MusicBrainz => musicbrainz::search(client, query).await,
        SourceKind::TheAudioDb => theaudiodb::search(client, query).await,
        SourceKind::Itunes => itunes::search(client, query).await,
    }
}

/// Walk the fallback chain for `kind`.
///
/// Returns [`KawaiiError::NotFound`] when every source comes back empty.
#[instrument(skip_all, fields(kind = %kind, title = %query.title))]
pub async fn resolve(
    client: &SourceClient,
    kind: Kind,
    query: &SearchQuery,
    progress: &dyn SearchProgress,
) -> Result<Resolution> {
    if query.title.trim().is_empty() {
        return Err(KawaiiError::validation("a title is required"));
    }

    for &source in sources_for(kind) {
        progress.querying(source);
        let candidates = search(client, source, query).await?;
        progress.answered(source, candidates.len());
        if !candidates.is_empty() {
            info!(%source, count = candidates.len(), "resolved");
            return Ok(Resolution { source, candidates });
        }
    }

    Err(KawaiiError::NotFound(format!(
        "No {kind} matches found for \"{}\".",
        query.title
    )))
}

/// Fill in whatever runtime information the chosen candidate is missing.
///
/// MusicBrainz search results carry no track lengths, so those are looked
/// up from the release. Anime default to a single season.
pub async fn populate_runtime(client: &SourceClient, kind: Kind, candidate: &mut Candidate) {
    match kind {
        Kind::Album => {
            let incomplete = candidate.runtime.is_empty()
                || candidate.length_minutes.is_none_or(|m| m == 0.0);
            if candidate.source == SourceKind::MusicBrainz && incomplete {
                musicbrainz::populate_runtime(client, candidate).await;
            }
            if candidate.runtime.is_empty() {
                if let Some(minutes) = candidate.length_minutes {
                    candidate.runtime = format_album_runtime(minutes);
                }
            }
        }
        Kind::Anime => {
            let seasons = *candidate.seasons.get_or_insert(1);
            if candidate.runtime.is_empty() {
                candidate.runtime = format_anime_runtime(Some(seasons), candidate.episodes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use kawaii_shared::{AppConfig, EndpointsConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SourceClient {
        let mut config = AppConfig::default();
        config.endpoints = EndpointsConfig::all_at(&server.uri());
        SourceClient::new(&config).unwrap()
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(SourceKind, usize)>>);

    impl SearchProgress for Recorder {
        fn querying(&self, _source: SourceKind) {}
        fn answered(&self, source: SourceKind, count: usize) {
            self.0.lock().unwrap().push((source, count));
        }
    }

    #[test]
    fn fallback_order() {
        assert_eq!(
            sources_for(Kind::Anime),
            &[SourceKind::AniList, SourceKind::Jikan]
        );
        assert_eq!(
            sources_for(Kind::Album),
            &[
                SourceKind::MusicBrainz,
                SourceKind::TheAudioDb,
                SourceKind::Itunes
            ]
        );
    }

    #[tokio::test]
    async fn album_chain_falls_through_to_itunes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/musicbrainz/ws/2/release"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "releases": [] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/theaudiodb/api/v1/json/2/searchalbum.php"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/itunes/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [ { "collectionName": "Blonde", "artistName": "Frank Ocean" } ]
            })))
            .mount(&server)
            .await;

        let recorder = Recorder::default();
        let query = SearchQuery {
            title: "Blonde".into(),
            year: None,
            artist: None,
        };
        let resolution = resolve(&client_for(&server), Kind::Album, &query, &recorder)
            .await
            .unwrap();

        assert_eq!(resolution.source, SourceKind::Itunes);
        assert_eq!(resolution.candidates[0].owner, "Frank Ocean");
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                (SourceKind::MusicBrainz, 0),
                (SourceKind::TheAudioDb, 0),
                (SourceKind::Itunes, 1)
            ]
        );
    }

    #[tokio::test]
    async fn anime_chain_stops_at_first_hit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/anilist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "Page": { "media": [
                    { "title": { "romaji": "Mushishi" }, "coverImage": { "large": "https://img/m.jpg" } }
                ]}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jikan/v4/anime"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let query = SearchQuery {
            title: "Mushishi".into(),
            year: None,
            artist: None,
        };
        let resolution = resolve(&client_for(&server), Kind::Anime, &query, &SilentSearch)
            .await
            .unwrap();
        assert_eq!(resolution.source, SourceKind::AniList);
        assert_eq!(resolution.candidates.len(), 1);
    }

    #[tokio::test]
    async fn empty_chain_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/anilist"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/jikan/v4/anime"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;

        let query = SearchQuery {
            title: "zzzz".into(),
            year: None,
            artist: None,
        };
        let err = resolve(&client_for(&server), Kind::Anime, &query, &SilentSearch)
            .await
            .unwrap_err();
        assert!(matches!(err, KawaiiError::NotFound(_)));
        assert!(err.to_string().contains("No anime matches found"));
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let client = SourceClient::new(&AppConfig::default()).unwrap();
        let query = SearchQuery {
            title: "  ".into(),
            year: None,
            artist: None,
        };
        let err = resolve(&client, Kind::Anime, &query, &SilentSearch)
            .await
            .unwrap_err();
        assert!(matches!(err, KawaiiError::Validation { .. }));
    }

    #[tokio::test]
    async fn runtime_defaults() {
        let client = SourceClient::new(&AppConfig::default()).unwrap();

        let mut anime = Candidate::new(SourceKind::Jikan, "Ping Pong");
        anime.seasons = None;
        anime.episodes = Some(11);
        populate_runtime(&client, Kind::Anime, &mut anime).await;
        assert_eq!(anime.seasons, Some(1));
        assert_eq!(anime.runtime, "1 Season × 11 Episodes");

        let mut album = Candidate::new(SourceKind::TheAudioDb, "Homework");
        album.length_minutes = Some(73.9);
        populate_runtime(&client, Kind::Album, &mut album).await;
        assert_eq!(album.runtime, "1 hr 14 mins");
    }
}
