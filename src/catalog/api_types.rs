//! Serde-deserializable types matching the catalog API responses.
//!
//! The listing and detail serializers on the backend expose different field
//! sets, so almost everything here is optional. Conversions at the bottom turn
//! these into the domain types in `types.rs`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer};

// ============================================================================
// Albums
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiAlbum {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub artist: String,
  pub short_description: Option<String>,
  pub description: Option<String>,
  pub release_year: Option<i32>,
  pub release_date: Option<NaiveDate>,
  pub format: Option<String>,
  #[serde(default, deserialize_with = "deserialize_price")]
  pub price: Option<String>,
  pub cover_image_url: Option<String>,
  pub total_playtime: Option<f64>,
  #[serde(default)]
  pub tracklist: Vec<ApiTrack>,
}

// ============================================================================
// Tracklist items and songs
// ============================================================================

/// Song as nested inside a tracklist item. Every field may be absent.
#[derive(Debug, Default, Deserialize)]
pub struct ApiTrackSong {
  pub id: Option<u64>,
  pub title: Option<String>,
  pub running_time: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTrack {
  pub id: Option<u64>,
  pub position: Option<u32>,
  pub title: Option<String>,
  pub running_time: Option<u32>,
  pub song: Option<ApiTrackSong>,
}

#[derive(Debug, Deserialize)]
pub struct ApiSong {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub running_time: u32,
}

/// Prices are decimals; the backend sends them as strings but a plain JSON
/// number is accepted too.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
  Ok(match value {
    Some(serde_json::Value::String(s)) => Some(s),
    Some(serde_json::Value::Number(n)) => Some(n.to_string()),
    _ => None,
  })
}

// ============================================================================
// Conversions to domain types
// ============================================================================

use super::types::{Album, AlbumSummary, Format, Song, Track, TrackSong};

impl ApiAlbum {
  pub fn into_summary(self) -> AlbumSummary {
    AlbumSummary {
      id: self.id,
      title: self.title,
      artist: self.artist,
      short_description: non_empty(self.short_description),
      release_year: self.release_year,
      format: self.format.as_deref().and_then(Format::from_code),
      cover_image_url: self.cover_image_url,
      total_playtime: self.total_playtime,
    }
  }

  pub fn into_full(self) -> Album {
    Album {
      id: self.id,
      title: self.title,
      artist: self.artist,
      release_year: self
        .release_year
        .or_else(|| self.release_date.map(|d| d.year())),
      release_date: self.release_date,
      format: self.format.as_deref().and_then(Format::from_code),
      price: self.price,
      short_description: non_empty(self.short_description),
      description: non_empty(self.description),
      cover_image_url: self.cover_image_url,
      total_playtime: self.total_playtime,
      tracklist: self.tracklist.into_iter().map(Track::from).collect(),
    }
  }
}

impl From<ApiTrack> for Track {
  fn from(track: ApiTrack) -> Self {
    Track {
      id: track.id,
      position: track.position,
      title: track.title,
      running_time: track.running_time,
      song: track.song.map(|s| TrackSong {
        title: s.title,
        running_time: s.running_time,
      }),
    }
  }
}

impl From<ApiSong> for Song {
  fn from(song: ApiSong) -> Self {
    Song {
      id: song.id,
      title: song.title,
      running_time: song.running_time,
    }
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|s| !s.trim().is_empty())
}
