//! iTunes Search API (last album source).

use serde::Deserialize;
use tracing::{debug, instrument};

use kawaii_shared::{Candidate, Result, SourceKind, format_album_runtime};

use crate::SearchQuery;
use crate::client::SourceClient;
use crate::util::{first_non_empty, narrow, year_prefix};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Option<Vec<Collection>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Collection {
    collection_id: Option<u64>,
    collection_name: Option<String>,
    artist_name: Option<String>,
    artwork_url100: Option<String>,
    release_date: Option<String>,
    primary_genre_name: Option<String>,
    collection_view_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Option<Vec<LookupItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupItem {
    wrapper_type: Option<String>,
    track_time_millis: Option<f64>,
}

/// Search iTunes for albums. Failures degrade to empty.
#[instrument(skip_all, fields(title = %query.title, artist = ?query.artist))]
pub(crate) async fn search(client: &SourceClient, query: &SearchQuery) -> Result<Vec<Candidate>> {
    let artist = query.artist.as_deref().filter(|a| !a.is_empty());
    let term = match artist {
        Some(artist) => format!("{} {artist}", query.title),
        None => query.title.clone(),
    };
    let url = client.url(
        &client.endpoints().itunes,
        "/search",
        &[
            ("term", term.as_str()),
            ("entity", "album"),
            ("limit", "10"),
            ("country", "us"),
        ],
    )?;

    let mut results = match client.get_json::<SearchResponse>(&url).await {
        Ok(r) => r.results.unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "iTunes search failed");
            return Ok(Vec::new());
        }
    };
    if let Some(year) = query.year {
        results = narrow(results, |c| c.release_date.as_deref().and_then(year_prefix) == Some(year));
    }
    if let Some(artist) = artist {
        let needle = artist.to_lowercase();
        results = narrow(results, |c| {
            c.artist_name
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                .contains(&needle)
        });
    }

    let mut candidates = Vec::with_capacity(results.len());
    for collection in results {
        let minutes = match collection.collection_id {
            Some(id) => album_minutes(client, id).await,
            None => None,
        };
        candidates.push(normalize(collection, minutes, query));
    }
    Ok(candidates)
}

/// Total track time of a collection in minutes, rounded to two decimals.
async fn album_minutes(client: &SourceClient, collection_id: u64) -> Option<f64> {
    let id = collection_id.to_string();
    let url = client
        .url(
            &client.endpoints().itunes,
            "/lookup",
            &[("id", id.as_str()), ("entity", "song")],
        )
        .ok()?;
    let lookup: LookupResponse = match client.get_json(&url).await {
        Ok(l) => l,
        Err(e) => {
            debug!(error = %e, collection_id, "track lookup failed");
            return None;
        }
    };

    let total_ms: f64 = lookup
        .results
        .unwrap_or_default()
        .iter()
        .filter(|item| item.wrapper_type.as_deref() == Some("track"))
        .filter_map(|item| item.track_time_millis)
        .sum();
    (total_ms > 0.0).then(|| (total_ms / 60_000.0 * 100.0).round() / 100.0)
}

fn normalize(collection: Collection, minutes: Option<f64>, query: &SearchQuery) -> Candidate {
    let name = first_non_empty([collection.collection_name.as_deref()]).unwrap_or(&query.title);
    let mut candidate = Candidate::new(SourceKind::Itunes, name);

    candidate.owner = first_non_empty([
        collection.artist_name.as_deref(),
        query.artist.as_deref(),
    ])
    .unwrap_or("Unknown")
    .to_string();
    let released = collection.release_date.as_deref().filter(|d| !d.is_empty());
    candidate.year = released.and_then(year_prefix).or(query.year);
    candidate.genres = collection.primary_genre_name.clone().unwrap_or_default();
    candidate.synopsis =
        format!("Auto-imported via iTunes Search API for {name}. Replace with your synopsis.");
    candidate.cover_url = collection
        .artwork_url100
        .as_deref()
        .map(|url| url.replacen("100x100bb.jpg", "1000x1000bb.jpg", 1))
        .unwrap_or_default();
    candidate.source_url = collection.collection_view_url.clone().unwrap_or_default();
    candidate.length_minutes = minutes;
    candidate.runtime = minutes.map(format_album_runtime).unwrap_or_default();
    candidate.runtime_detail = released
        .map(|d| format!("Released {}", d.get(..10).unwrap_or(d)))
        .unwrap_or_default();
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use kawaii_shared::{AppConfig, EndpointsConfig};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SourceClient {
        let mut config = AppConfig::default();
        config.endpoints = EndpointsConfig::all_at(&server.uri());
        SourceClient::new(&config).unwrap()
    }

    async fn mount_search(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/itunes/search"))
            .and(query_param("entity", "album"))
            .and(query_param("country", "us"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resultCount": 3,
                "results": [
                    {
                        "collectionId": 1,
                        "collectionName": "Random Access Memories",
                        "artistName": "Daft Punk",
                        "artworkUrl100": "https://is1.mzstatic.com/ram/100x100bb.jpg",
                        "releaseDate": "2013-05-17T07:00:00Z",
                        "primaryGenreName": "Electronic",
                        "collectionViewUrl": "https://music.apple.com/album/1"
                    },
                    {
                        "collectionId": 2,
                        "collectionName": "Random Access Memories (Tribute)",
                        "artistName": "Various Artists",
                        "releaseDate": "2013-09-01T07:00:00Z"
                    },
                    {
                        "collectionName": "RAM (10th Anniversary)",
                        "artistName": "Daft Punk",
                        "releaseDate": "2023-05-12T07:00:00Z"
                    }
                ]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn narrows_by_year_and_artist_and_sums_tracks() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("GET"))
            .and(path("/itunes/lookup"))
            .and(query_param("id", "1"))
            .and(query_param("entity", "song"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    { "wrapperType": "collection", "trackTimeMillis": 999_999 },
                    { "wrapperType": "track", "trackTimeMillis": 2_000_000 },
                    { "wrapperType": "track", "trackTimeMillis": 2_470_000 }
                ]
            })))
            .mount(&server)
            .await;

        let query = SearchQuery {
            title: "Random Access Memories".into(),
            year: Some(2013),
            artist: Some("daft".into()),
        };
        let results = search(&client_for(&server), &query).await.unwrap();

        assert_eq!(results.len(), 1);
        let c = &results[0];
        assert_eq!(c.owner, "Daft Punk");
        assert_eq!(c.year, Some(2013));
        assert_eq!(c.cover_url, "https://is1.mzstatic.com/ram/1000x1000bb.jpg");
        assert_eq!(c.length_minutes, Some(74.5));
        assert_eq!(c.runtime, "1 hr 15 mins");
        assert_eq!(c.runtime_detail, "Released 2013-05-17");
        assert_eq!(
            c.synopsis,
            "Auto-imported via iTunes Search API for Random Access Memories. Replace with your synopsis."
        );
    }

    #[tokio::test]
    async fn failed_lookup_leaves_runtime_empty() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("GET"))
            .and(path("/itunes/lookup"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let query = SearchQuery {
            title: "Random Access Memories".into(),
            year: None,
            artist: None,
        };
        let results = search(&client_for(&server), &query).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|c| c.runtime.is_empty()));
        assert_eq!(results[2].cover_url, "");
    }
}
