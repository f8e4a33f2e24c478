//! MusicBrainz release search with Cover Art Archive lookups (first album source).

use serde::Deserialize;
use tracing::{debug, instrument};

use kawaii_shared::{Candidate, Result, SourceKind, format_album_runtime, release_detail};

use crate::SearchQuery;
use crate::client::SourceClient;
use crate::util::{first_non_empty, join_names, year_prefix};

const RELEASE_PAGE: &str = "https://musicbrainz.org/release";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    releases: Option<Vec<Release>>,
}

#[derive(Debug, Deserialize)]
struct Release {
    id: String,
    title: Option<String>,
    date: Option<String>,
    #[serde(rename = "artist-credit")]
    artist_credit: Option<Vec<ArtistCredit>>,
    tags: Option<Vec<Tag>>,
}

#[derive(Debug, Deserialize)]
struct ArtistCredit {
    name: Option<String>,
    artist: Option<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoverArtResponse {
    images: Option<Vec<CoverImage>>,
}

#[derive(Debug, Deserialize)]
struct CoverImage {
    #[serde(default)]
    front: bool,
    image: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseDetail {
    date: Option<String>,
    media: Option<Vec<Medium>>,
}

#[derive(Debug, Deserialize)]
struct Medium {
    tracks: Option<Vec<Track>>,
}

#[derive(Debug, Deserialize)]
struct Track {
    length: Option<f64>,
}

/// Lucene query for the release search. Quotes inside user input are escaped.
fn release_query(query: &SearchQuery) -> String {
    let quote = |s: &str| s.replace('"', "\\\"");
    let mut filters = vec![format!("release:\"{}\"", quote(&query.title))];
    if let Some(artist) = query.artist.as_deref().filter(|a| !a.is_empty()) {
        filters.push(format!("artist:\"{}\"", quote(artist)));
    }
    if let Some(year) = query.year {
        filters.push(format!("date:{year}"));
    }
    filters.join(" AND ")
}

/// Search MusicBrainz. Releases without cover art are skipped; any request
/// failure degrades to an empty result.
#[instrument(skip_all, fields(title = %query.title, artist = ?query.artist))]
pub(crate) async fn search(client: &SourceClient, query: &SearchQuery) -> Result<Vec<Candidate>> {
    let lucene = release_query(query);
    let url = client.url(
        &client.endpoints().musicbrainz,
        "/release",
        &[("query", lucene.as_str()), ("fmt", "json"), ("limit", "5")],
    )?;

    let releases = match client.get_json::<SearchResponse>(&url).await {
        Ok(r) => r.releases.unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "MusicBrainz search failed");
            return Ok(Vec::new());
        }
    };

    let mut candidates = Vec::new();
    for release in releases {
        let Some(cover_url) = cover_art_url(client, &release.id).await else {
            debug!(mbid = %release.id, "no cover art, skipping release");
            continue;
        };
        candidates.push(normalize(release, cover_url, query));
    }
    Ok(candidates)
}

/// Front image (or the first image) for a release from the Cover Art Archive.
async fn cover_art_url(client: &SourceClient, mbid: &str) -> Option<String> {
    let url = client
        .url(&client.endpoints().cover_art, &format!("/release/{mbid}"), &[])
        .ok()?;
    let response: CoverArtResponse = client.get_json(&url).await.ok()?;
    let images = response.images.unwrap_or_default();
    let primary = images
        .iter()
        .find(|img| img.front)
        .or_else(|| images.first())?;
    first_non_empty([
        primary.image.as_deref(),
        primary.thumbnails.as_ref().and_then(|t| t.large.as_deref()),
    ])
    .map(str::to_string)
}

fn normalize(release: Release, cover_url: String, query: &SearchQuery) -> Candidate {
    let title = first_non_empty([release.title.as_deref()]).unwrap_or(&query.title);
    let mut candidate = Candidate::new(SourceKind::MusicBrainz, title);

    let owner = join_names(release.artist_credit.iter().flatten().filter_map(|credit| {
        first_non_empty([
            credit.name.as_deref(),
            credit.artist.as_ref().and_then(|a| a.name.as_deref()),
        ])
    }));
    candidate.owner = first_non_empty([Some(owner.as_str()), query.artist.as_deref()])
        .unwrap_or("Unknown")
        .to_string();

    let date = release.date.as_deref().filter(|d| !d.is_empty());
    candidate.year = date.and_then(year_prefix).or(query.year);
    candidate.genres = join_names(release.tags.iter().flatten().filter_map(|t| t.name.as_deref()));
    candidate.cover_url = cover_url;
    candidate.source_url = format!("{RELEASE_PAGE}/{}", release.id);
    candidate.runtime_detail = release_detail(date);
    candidate.mbid = Some(release.id);
    candidate
}

/// Fill in runtime from the release's track list. Failures leave the
/// candidate untouched.
#[instrument(skip_all, fields(mbid = ?candidate.mbid))]
pub(crate) async fn populate_runtime(client: &SourceClient, candidate: &mut Candidate) {
    let Some(mbid) = candidate.mbid.as_deref() else {
        return;
    };
    let url = match client.url(
        &client.endpoints().musicbrainz,
        &format!("/release/{mbid}"),
        &[("inc", "recordings"), ("fmt", "json")],
    ) {
        Ok(url) => url,
        Err(_) => return,
    };
    let detail: ReleaseDetail = match client.get_json(&url).await {
        Ok(d) => d,
        Err(e) => {
            debug!(error = %e, "release lookup failed");
            return;
        }
    };

    let total_ms: f64 = detail
        .media
        .iter()
        .flatten()
        .flat_map(|m| m.tracks.iter().flatten())
        .filter_map(|t| t.length)
        .filter(|ms| ms.is_finite())
        .sum();

    if total_ms > 0.0 {
        let minutes = total_ms / 60_000.0;
        candidate.length_minutes = Some(minutes);
        candidate.runtime = format_album_runtime(minutes);
    }
    if candidate.runtime_detail.is_empty() {
        candidate.runtime_detail = release_detail(detail.date.as_deref());
    }
}
