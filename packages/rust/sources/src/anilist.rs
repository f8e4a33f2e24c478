//! AniList GraphQL search (first anime source).

use serde::Deserialize;
use tracing::{debug, instrument};

use kawaii_markdown::strip_html;
use kawaii_shared::{
    Candidate, PartialDate, Result, SourceKind, airing_window, format_anime_runtime,
};

use crate::SearchQuery;
use crate::client::SourceClient;
use crate::util::{first_non_empty, join_names};

const MEDIA_QUERY: &str = r#"
query ($search: String, $year: Int) {
  Page(perPage: 5) {
    media(search: $search, type: ANIME, seasonYear: $year) {
      title { romaji english native }
      description(asHtml: true)
      episodes
      seasonYear
      startDate { year month day }
      endDate { year month day }
      coverImage { extraLarge large }
      studios(isMain: true) { nodes { name } }
      genres
      siteUrl
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct Payload {
    data: Option<Data>,
}

#[derive(Debug, Deserialize)]
struct Data {
    #[serde(rename = "Page")]
    page: Option<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    media: Option<Vec<Media>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Media {
    title: Option<MediaTitle>,
    description: Option<String>,
    episodes: Option<u32>,
    season_year: Option<i32>,
    start_date: Option<FuzzyDate>,
    end_date: Option<FuzzyDate>,
    cover_image: Option<CoverImage>,
    studios: Option<Studios>,
    genres: Option<Vec<String>>,
    site_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaTitle {
    romaji: Option<String>,
    english: Option<String>,
    native: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct FuzzyDate {
    year: Option<i32>,
    month: Option<u32>,
}

impl From<FuzzyDate> for PartialDate {
    fn from(d: FuzzyDate) -> Self {
        PartialDate {
            year: d.year,
            month: d.month,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoverImage {
    extra_large: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Studios {
    nodes: Option<Vec<Option<StudioNode>>>,
}

#[derive(Debug, Deserialize)]
struct StudioNode {
    name: Option<String>,
}

/// Search AniList. Any failure degrades to an empty result so the chain
/// can fall through to Jikan.
#[instrument(skip_all, fields(title = %query.title, year = ?query.year))]
pub(crate) async fn search(client: &SourceClient, query: &SearchQuery) -> Result<Vec<Candidate>> {
    let body = serde_json::json!({
        "query": MEDIA_QUERY,
        "variables": { "search": query.title, "year": query.year },
    });

    let payload: Payload = match client.post_json(&client.endpoints().anilist, &body).await {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "AniList request failed");
            return Ok(Vec::new());
        }
    };

    let media = payload
        .data
        .and_then(|d| d.page)
        .and_then(|p| p.media)
        .unwrap_or_default();

    Ok(media
        .into_iter()
        .map(|m| normalize(m, query))
        .filter(|c| !c.cover_url.is_empty())
        .collect())
}

fn normalize(media: Media, query: &SearchQuery) -> Candidate {
    let title = media.title.as_ref().and_then(|t| {
        first_non_empty([t.romaji.as_deref(), t.english.as_deref(), t.native.as_deref()])
    });
    let mut candidate = Candidate::new(SourceKind::AniList, title.unwrap_or(&query.title));

    let studios = media
        .studios
        .and_then(|s| s.nodes)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter_map(|n| n.name)
        .collect::<Vec<_>>();
    let owner = join_names(studios.iter().map(String::as_str));
    candidate.owner = if owner.is_empty() {
        "Unknown".to_string()
    } else {
        owner
    };

    candidate.year = media
        .season_year
        .or_else(|| media.start_date.and_then(|d| d.year))
        .or(query.year);
    candidate.genres = media.genres.unwrap_or_default().join(", ");
    candidate.synopsis = strip_html(media.description.as_deref().unwrap_or_default());
    candidate.cover_url = media
        .cover_image
        .as_ref()
        .and_then(|c| first_non_empty([c.extra_large.as_deref(), c.large.as_deref()]))
        .unwrap_or_default()
        .to_string();
    candidate.source_url = media.site_url.unwrap_or_default();
    candidate.seasons = Some(1);
    candidate.episodes = media.episodes;
    candidate.runtime = format_anime_runtime(Some(1), media.episodes);
    candidate.runtime_detail = match media.start_date {
        Some(start) => airing_window(
            &PartialDate::from(start),
            media.end_date.map(PartialDate::from).as_ref(),
        ),
        None => String::new(),
    };
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use kawaii_shared::{AppConfig, EndpointsConfig};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SourceClient {
        let mut config = AppConfig::default();
        config.endpoints = EndpointsConfig::all_at(&server.uri());
        SourceClient::new(&config).unwrap()
    }

    fn query(title: &str, year: Option<i32>) -> SearchQuery {
        SearchQuery {
            title: title.into(),
            year,
            artist: None,
        }
    }

    #[tokio::test]
    async fn normalizes_media_and_drops_coverless_entries() {
        let server = MockServer::start().await;
        let payload = serde_json::json!({
            "data": { "Page": { "media": [
                {
                    "title": { "romaji": "Sousou no Frieren", "english": "Frieren", "native": null },
                    "description": "The adventure is over.<br><br>But life goes on &amp; on.",
                    "episodes": 28,
                    "seasonYear": 2023,
                    "startDate": { "year": 2023, "month": 9, "day": 29 },
                    "endDate": { "year": 2024, "month": 3, "day": 22 },
                    "coverImage": { "extraLarge": "https://img.anili.st/frieren.jpg", "large": null },
                    "studios": { "nodes": [ { "name": "Madhouse" } ] },
                    "genres": ["Adventure", "Drama", "Fantasy"],
                    "siteUrl": "https://anilist.co/anime/154587"
                },
                {
                    "title": { "romaji": "No Cover" },
                    "coverImage": { "extraLarge": "", "large": null }
                }
            ]}}
        });

        Mock::given(method("POST"))
            .and(path("/anilist"))
            .and(body_partial_json(serde_json::json!({
                "variables": { "search": "Frieren", "year": 2023 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload))
            .mount(&server)
            .await;

        let results = search(&client_for(&server), &query("Frieren", Some(2023)))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        let c = &results[0];
        assert_eq!(c.title, "Sousou no Frieren");
        assert_eq!(c.owner, "Madhouse");
        assert_eq!(c.year, Some(2023));
        assert_eq!(c.genres, "Adventure, Drama, Fantasy");
        assert_eq!(c.synopsis, "The adventure is over.\n\nBut life goes on & on.");
        assert_eq!(c.cover_url, "https://img.anili.st/frieren.jpg");
        assert_eq!(c.runtime, "1 Season × 28 Episodes");
        assert_eq!(c.runtime_detail, "Aired Sep 2023 – Mar 2024");
        assert_eq!(c.source, SourceKind::AniList);
    }

    #[tokio::test]
    async fn missing_fields_fall_back() {
        let server = MockServer::start().await;
        let payload = serde_json::json!({
            "data": { "Page": { "media": [
                {
                    "title": { "romaji": "", "english": "Bocchi the Rock!" },
                    "coverImage": { "large": "https://img/bocchi.png" },
                    "studios": { "nodes": [] },
                    "startDate": { "year": 2022, "month": null }
                }
            ]}}
        });
        Mock::given(method("POST"))
            .and(path("/anilist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload))
            .mount(&server)
            .await;

        let results = search(&client_for(&server), &query("bocchi", None)).await.unwrap();
        let c = &results[0];
        assert_eq!(c.title, "Bocchi the Rock!");
        assert_eq!(c.owner, "Unknown");
        assert_eq!(c.year, Some(2022));
        assert_eq!(c.runtime, "1 Season");
        assert_eq!(c.runtime_detail, "Aired 2022 – Present");
    }

    #[tokio::test]
    async fn server_error_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/anilist"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let results = search(&client_for(&server), &query("anything", None)).await.unwrap();
        assert!(results.is_empty());
    }
}
