//! Human-readable runtime labels shared by scaffolding and page builds.

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A partial calendar date as the metadata APIs report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Format an album length: `42 mins`, `1 hr`, `2 hrs 05 mins`.
///
/// Non-positive or non-finite input yields an empty label.
pub fn format_album_runtime(minutes: f64) -> String {
    if !minutes.is_finite() || minutes <= 0.0 {
        return String::new();
    }
    // Half-up rounding, same as the site's browser scripts.
    let total = (minutes + 0.5).floor() as u64;
    if total < 60 {
        return format!("{total} mins");
    }
    let hrs = total / 60;
    let mins = total % 60;
    let hour_label = format!("{hrs} hr{}", if hrs == 1 { "" } else { "s" });
    if mins == 0 {
        return hour_label;
    }
    format!("{hour_label} {mins:02} mins")
}

/// Format an anime run: `1 Season × 12 Episodes`, or whichever half is known.
pub fn format_anime_runtime(seasons: Option<u32>, episodes: Option<u32>) -> String {
    let season_label = match seasons {
        Some(n) if n > 0 => format!("{n} Season{}", if n == 1 { "" } else { "s" }),
        _ => String::new(),
    };
    let episode_label = match episodes {
        Some(n) if n > 0 => format!("{n} Episode{}", if n == 1 { "" } else { "s" }),
        _ => String::new(),
    };
    match (season_label.is_empty(), episode_label.is_empty()) {
        (false, false) => format!("{season_label} × {episode_label}"),
        (false, true) => season_label,
        _ => episode_label,
    }
}

/// `Oct 2023`, or just `2023` when the month is unknown.
pub fn format_date_label(date: &PartialDate) -> String {
    let Some(year) = date.year else {
        return String::new();
    };
    match date.month.and_then(|m| MONTHS.get((m as usize).checked_sub(1)?)) {
        Some(month) => format!("{month} {year}"),
        None => year.to_string(),
    }
}

/// `Aired Oct 2023 – Mar 2024`; an open end reads `Present`.
pub fn airing_window(start: &PartialDate, end: Option<&PartialDate>) -> String {
    let start_label = format_date_label(start);
    if start_label.is_empty() {
        return String::new();
    }
    let end_label = match end {
        Some(date) if date.year.is_some() => format_date_label(date),
        _ => "Present".to_string(),
    };
    format!("Aired {start_label} – {end_label}")
}

/// `Released 2007-10-10`, or empty when the date is unknown.
pub fn release_detail(date: Option<&str>) -> String {
    match date {
        Some(d) if !d.is_empty() => format!("Released {d}"),
        _ => String::new(),
    }
}
