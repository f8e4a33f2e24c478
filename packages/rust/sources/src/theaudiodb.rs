//! TheAudioDB album search (second album source).

use serde::Deserialize;
use tracing::{debug, instrument};

use kawaii_shared::{Candidate, Result, SourceKind, format_album_runtime, leading_float};

use crate::SearchQuery;
use crate::client::SourceClient;
use crate::util::{first_non_empty, lenient_string, narrow};

#[derive(Debug, Deserialize)]
struct Response {
    album: Option<Vec<Album>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Album {
    #[serde(default, deserialize_with = "lenient_string")]
    str_album: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    str_artist: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    int_year_released: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    int_duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    str_genre: Option<String>,
    #[serde(default, rename = "strDescriptionEN", deserialize_with = "lenient_string")]
    str_description_en: Option<String>,
    #[serde(default, rename = "strAlbumThumbHQ", deserialize_with = "lenient_string")]
    str_album_thumb_hq: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    str_album_thumb: Option<String>,
    #[serde(default, rename = "strAlbumCDart", deserialize_with = "lenient_string")]
    str_album_cdart: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    str_album_spine: Option<String>,
    #[serde(default, rename = "strMusicBrainzID", deserialize_with = "lenient_string")]
    str_music_brainz_id: Option<String>,
}

impl Album {
    fn year(&self) -> Option<i32> {
        self.int_year_released
            .as_deref()
            .and_then(|y| y.trim().parse().ok())
            .filter(|y| *y != 0)
    }

    fn minutes(&self) -> Option<f64> {
        self.int_duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|secs| *secs > 0.0)
            .map(|secs| secs / 60.0)
    }
}

/// Search TheAudioDB by artist and album name. Failures degrade to empty.
#[instrument(skip_all, fields(title = %query.title, artist = ?query.artist))]
pub(crate) async fn search(client: &SourceClient, query: &SearchQuery) -> Result<Vec<Candidate>> {
    let mut params = Vec::new();
    if let Some(artist) = query.artist.as_deref().filter(|a| !a.is_empty()) {
        params.push(("s", artist));
    }
    params.push(("a", query.title.as_str()));
    let url = client.url(&client.endpoints().theaudiodb, "/searchalbum.php", &params)?;

    let mut albums = match client.get_json::<Response>(&url).await {
        Ok(r) => r.album.unwrap_or_default(),
        Err(e) => {
            debug!(error = %e, "TheAudioDB search failed");
            return Ok(Vec::new());
        }
    };
    if let Some(year) = query.year {
        albums = narrow(albums, |a| a.year() == Some(year));
    }

    Ok(albums.into_iter().map(|a| normalize(a, query)).collect())
}

fn normalize(album: Album, query: &SearchQuery) -> Candidate {
    let name = first_non_empty([album.str_album.as_deref()]).unwrap_or(&query.title);
    let mut candidate = Candidate::new(SourceKind::TheAudioDb, name);

    candidate.owner = first_non_empty([album.str_artist.as_deref(), query.artist.as_deref()])
        .unwrap_or("Unknown")
        .to_string();
    candidate.year = album.year().or(query.year);
    candidate.genres = album.str_genre.clone().unwrap_or_default();
    candidate.synopsis = match album.str_description_en.as_deref() {
        Some(text) => text.to_string(),
        None => format!("Auto-imported via TheAudioDB for {name}. Replace with your synopsis."),
    };
    candidate.cover_url = first_non_empty([
        album.str_album_thumb_hq.as_deref(),
        album.str_album_thumb.as_deref(),
        album.str_album_cdart.as_deref(),
        album.str_album_spine.as_deref(),
    ])
    .unwrap_or_default()
    .to_string();
    candidate.source_url = album
        .str_music_brainz_id
        .as_deref()
        .map(|id| format!("https://musicbrainz.org/release/{id}"))
        .unwrap_or_default();

    candidate.length_minutes = album.minutes();
    candidate.runtime = candidate
        .length_minutes
        .map(format_album_runtime)
        .unwrap_or_default();
    candidate.runtime_detail = album
        .int_year_released
        .as_deref()
        .filter(|y| leading_float(y).is_some_and(|n| n != 0.0))
        .map(|y| format!("Released {y}"))
        .unwrap_or_default();
    candidate
}
