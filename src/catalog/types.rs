use chrono::NaiveDate;

/// Cover URL the backend reports for albums without an uploaded image
pub const PLACEHOLDER_COVER_URL: &str = "/static/default_album_cover.jpg";

/// Physical or digital release format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
  DigitalDownload,
  Cd,
  Vinyl,
  Other(String),
}

impl Format {
  pub fn from_code(code: &str) -> Option<Self> {
    let code = code.trim();
    if code.is_empty() {
      return None;
    }
    Some(match code.to_lowercase().as_str() {
      "dd" => Format::DigitalDownload,
      "cd" => Format::Cd,
      "vi" => Format::Vinyl,
      _ => Format::Other(code.to_string()),
    })
  }

  /// Short upper-case code, as shown on album cards
  pub fn code(&self) -> String {
    match self {
      Format::DigitalDownload => "DD".to_string(),
      Format::Cd => "CD".to_string(),
      Format::Vinyl => "VI".to_string(),
      Format::Other(code) => code.to_uppercase(),
    }
  }

  pub fn label(&self) -> &str {
    match self {
      Format::DigitalDownload => "Digital Download",
      Format::Cd => "CD",
      Format::Vinyl => "Vinyl",
      Format::Other(code) => code,
    }
  }
}

/// Album as returned by the listing endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumSummary {
  pub id: u64,
  pub title: String,
  pub artist: String,
  pub short_description: Option<String>,
  pub release_year: Option<i32>,
  pub format: Option<Format>,
  pub cover_image_url: Option<String>,
  pub total_playtime: Option<f64>,
}

/// Full album details
#[derive(Debug, Clone, PartialEq)]
pub struct Album {
  pub id: u64,
  pub title: String,
  pub artist: String,
  pub release_year: Option<i32>,
  pub release_date: Option<NaiveDate>,
  pub format: Option<Format>,
  /// Decimal string, e.g. "12.99"
  pub price: Option<String>,
  pub short_description: Option<String>,
  pub description: Option<String>,
  pub cover_image_url: Option<String>,
  /// Seconds
  pub total_playtime: Option<f64>,
  pub tracklist: Vec<Track>,
}

impl Album {
  /// Cover URL, or None when the album only has the placeholder
  pub fn cover(&self) -> Option<&str> {
    cover_url(self.cover_image_url.as_deref())
  }
}

fn cover_url(url: Option<&str>) -> Option<&str> {
  url.filter(|u| !u.is_empty() && *u != PLACEHOLDER_COVER_URL)
}

/// Song details nested inside a tracklist entry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackSong {
  pub title: Option<String>,
  pub running_time: Option<u32>,
}

/// One entry of an album's tracklist.
///
/// The backend either nests the song (`song.title`, `song.running_time`) or
/// flattens it onto the entry; both shapes are kept as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
  pub id: Option<u64>,
  /// 1-based position within the album
  pub position: Option<u32>,
  pub title: Option<String>,
  /// Seconds
  pub running_time: Option<u32>,
  pub song: Option<TrackSong>,
}

/// Standalone song from the songs endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
  pub id: u64,
  pub title: String,
  pub running_time: u32,
}
