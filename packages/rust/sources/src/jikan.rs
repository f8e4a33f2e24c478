//! Jikan (MyAnimeList) REST search (fallback anime source).

use serde::Deserialize;
use tracing::{info, instrument};

use kawaii_shared::{Candidate, Result, SourceKind, format_anime_runtime};

use crate::SearchQuery;
use crate::client::SourceClient;
use crate::util::{first_non_empty, join_names, narrow};

#[derive(Debug, Deserialize)]
struct Response {
    data: Option<Vec<Anime>>,
}

#[derive(Debug, Deserialize)]
struct Anime {
    title: Option<String>,
    year: Option<i32>,
    episodes: Option<u32>,
    seasons: Option<u32>,
    synopsis: Option<String>,
    url: Option<String>,
    images: Option<Images>,
    studios: Option<Vec<Named>>,
    genres: Option<Vec<Named>>,
    aired: Option<Aired>,
}

#[derive(Debug, Deserialize)]
struct Images {
    jpg: Option<ImageSet>,
}

#[derive(Debug, Deserialize)]
struct ImageSet {
    image_url: Option<String>,
    large_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Aired {
    string: Option<String>,
}

/// Search Jikan. Unlike the other sources an HTTP failure is an error:
/// Jikan is the last anime source, so there is nothing left to fall back to.
#[instrument(skip_all, fields(title = %query.title, year = ?query.year))]
pub(crate) async fn search(client: &SourceClient, query: &SearchQuery) -> Result<Vec<Candidate>> {
    let url = client.url(
        &client.endpoints().jikan,
        "/anime",
        &[
            ("q", query.title.as_str()),
            ("limit", "5"),
            ("order_by", "score"),
            ("sort", "desc"),
        ],
    )?;

    let response: Response = client.get_json(&url).await?;
    let mut results = response.data.unwrap_or_default();
    if let Some(year) = query.year {
        results = narrow(results, |a| a.year == Some(year));
    }

    info!(count = results.len(), "Jikan results");
    Ok(results.into_iter().map(|a| normalize(a, query)).collect())
}

fn normalize(anime: Anime, query: &SearchQuery) -> Candidate {
    let title = first_non_empty([anime.title.as_deref()]).unwrap_or(&query.title);
    let mut candidate = Candidate::new(SourceKind::Jikan, title);

    let studios = join_names(
        anime
            .studios
            .iter()
            .flatten()
            .filter_map(|s| s.name.as_deref()),
    );
    candidate.owner = if studios.is_empty() {
        "Unknown".to_string()
    } else {
        studios
    };
    candidate.year = anime.year;
    candidate.genres = join_names(
        anime
            .genres
            .iter()
            .flatten()
            .filter_map(|g| g.name.as_deref()),
    );
    candidate.synopsis = anime.synopsis.as_deref().unwrap_or_default().trim().to_string();
    candidate.cover_url = anime
        .images
        .as_ref()
        .and_then(|i| i.jpg.as_ref())
        .and_then(|j| first_non_empty([j.large_image_url.as_deref(), j.image_url.as_deref()]))
        .unwrap_or_default()
        .to_string();
    candidate.source_url = anime.url.clone().unwrap_or_default();

    let seasons = anime.seasons.unwrap_or(1);
    candidate.seasons = Some(seasons);
    candidate.episodes = anime.episodes;
    candidate.runtime = format_anime_runtime(Some(seasons), anime.episodes);
    candidate.runtime_detail = anime
        .aired
        .as_ref()
        .and_then(|a| first_non_empty([a.string.as_deref()]))
        .map(|s| format!("Aired {s}"))
        .unwrap_or_default();
    candidate
}
