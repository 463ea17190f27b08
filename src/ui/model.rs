//! What each page shows, derived purely from its query state.
//!
//! Views turn a `QueryState` into a `PageView` and then draw that; the
//! mapping lives here so it can be tested without a terminal.

use crate::catalog::types::{Album, AlbumSummary, Track};
use crate::query::{QueryState, QueryStatus};
use crate::ui::format::format_duration;

/// What the user can do from an error page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
  /// Reload the failed query
  Retry,
  /// Go back to the album listing
  BackToListing,
}

impl Recovery {
  /// Key hint shown under the error message
  pub fn hint(&self) -> &'static str {
    match self {
      Recovery::Retry => "Press 'r' to try again.",
      Recovery::BackToListing => "Press 'q' to go back to all albums.",
    }
  }
}

/// Data plus refresh status for a page that has something to show
#[derive(Debug, PartialEq)]
pub struct Populated<'a, T> {
  pub data: &'a T,
  /// A background refetch is in flight
  pub refreshing: bool,
  /// The last refetch failed; `data` is from an earlier success
  pub stale_error: Option<&'a str>,
}

#[derive(Debug, PartialEq)]
pub enum PageView<'a, T> {
  Loading,
  Error { message: String, recovery: Recovery },
  Empty,
  Populated(Populated<'a, T>),
}

fn page_view<'a, T>(
  state: &'a QueryState<T>,
  is_empty: impl Fn(&T) -> bool,
  failure: &str,
  recovery: Recovery,
) -> PageView<'a, T> {
  match (state.data(), state.status) {
    (Some(data), _) if is_empty(data) => PageView::Empty,
    (Some(data), status) => PageView::Populated(Populated {
      data,
      refreshing: status == QueryStatus::Loading,
      stale_error: match status {
        QueryStatus::Error => state.error(),
        _ => None,
      },
    }),
    (None, QueryStatus::Error) => PageView::Error {
      message: format!(
        "{}: {}",
        failure,
        state.error().unwrap_or("unknown error")
      ),
      recovery,
    },
    (None, _) => PageView::Loading,
  }
}

pub type ListingView<'a> = PageView<'a, Vec<AlbumSummary>>;
pub type DetailView<'a> = PageView<'a, Album>;

/// Album listing page
pub fn listing_view(state: &QueryState<Vec<AlbumSummary>>) -> ListingView<'_> {
  page_view(state, Vec::is_empty, "Failed to load albums", Recovery::Retry)
}

/// Album detail page. An album is never "empty"; a missing tracklist is shown
/// inside the populated page.
pub fn detail_view(state: &QueryState<Album>) -> DetailView<'_> {
  page_view(
    state,
    |_| false,
    "Failed to load album details",
    Recovery::BackToListing,
  )
}

/// One row of the tracklist table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
  pub number: u32,
  pub title: String,
  pub duration: String,
}

/// Title shown for a track, preferring the nested song's title
pub fn track_title(track: &Track) -> &str {
  track
    .song
    .as_ref()
    .and_then(|s| s.title.as_deref())
    .filter(|t| !t.is_empty())
    .or_else(|| track.title.as_deref().filter(|t| !t.is_empty()))
    .unwrap_or("Untitled")
}

/// Running time of a track in seconds, preferring the nested song's
pub fn track_running_time(track: &Track) -> u32 {
  track
    .song
    .as_ref()
    .and_then(|s| s.running_time)
    .filter(|t| *t > 0)
    .or(track.running_time)
    .unwrap_or(0)
}

/// Rows ordered by position; tracks without one are numbered by their index
pub fn track_rows(tracks: &[Track]) -> Vec<TrackRow> {
  let mut rows: Vec<TrackRow> = tracks
    .iter()
    .enumerate()
    .map(|(index, track)| TrackRow {
      number: track.position.unwrap_or(index as u32 + 1),
      title: track_title(track).to_string(),
      duration: format_duration(track_running_time(track)),
    })
    .collect();
  rows.sort_by_key(|row| row.number);
  rows
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::types::TrackSong;
  use std::sync::Arc;

  fn state<T>(status: QueryStatus, data: Option<T>, error: Option<&str>) -> QueryState<T> {
    QueryState {
      status,
      data: data.map(Arc::new),
      error: error.map(String::from),
    }
  }

  fn summary(id: u64) -> AlbumSummary {
    AlbumSummary {
      id,
      title: format!("Album {}", id),
      artist: "Artist".into(),
      short_description: None,
      release_year: Some(2001),
      format: None,
      cover_image_url: None,
      total_playtime: None,
    }
  }

  fn track(position: Option<u32>, title: &str, running_time: u32) -> Track {
    Track {
      id: None,
      position,
      title: Some(title.to_string()),
      running_time: Some(running_time),
      song: None,
    }
  }

  #[test]
  fn test_loading_without_data() {
    let s = state::<Vec<AlbumSummary>>(QueryStatus::Loading, None, None);
    assert_eq!(listing_view(&s), PageView::Loading);

    let s = state::<Vec<AlbumSummary>>(QueryStatus::Idle, None, None);
    assert_eq!(listing_view(&s), PageView::Loading);
  }

  #[test]
  fn test_empty_listing_is_not_an_error() {
    let s = state(QueryStatus::Success, Some(Vec::new()), None);
    assert_eq!(listing_view(&s), PageView::Empty);
  }

  #[test]
  fn test_listing_error_offers_retry() {
    let s = state::<Vec<AlbumSummary>>(
      QueryStatus::Error,
      None,
      Some("Request failed with status code 500"),
    );
    assert_eq!(
      listing_view(&s),
      PageView::Error {
        message: "Failed to load albums: Request failed with status code 500".into(),
        recovery: Recovery::Retry,
      }
    );
  }

  #[test]
  fn test_detail_error_offers_way_back() {
    let s = state::<Album>(QueryStatus::Error, None, Some("Network error: refused"));
    match detail_view(&s) {
      PageView::Error { message, recovery } => {
        assert!(message.starts_with("Failed to load album details"));
        assert_eq!(recovery, Recovery::BackToListing);
      }
      other => panic!("expected error view, got {:?}", other),
    }
  }

  #[test]
  fn test_populated_listing() {
    let s = state(QueryStatus::Success, Some(vec![summary(1), summary(2)]), None);
    match listing_view(&s) {
      PageView::Populated(p) => {
        assert_eq!(p.data.len(), 2);
        assert!(!p.refreshing);
        assert_eq!(p.stale_error, None);
      }
      other => panic!("expected populated view, got {:?}", other),
    }
  }

  #[test]
  fn test_stale_data_stays_visible() {
    let s = state(QueryStatus::Loading, Some(vec![summary(1)]), None);
    match listing_view(&s) {
      PageView::Populated(p) => assert!(p.refreshing),
      other => panic!("expected populated view, got {:?}", other),
    }

    let s = state(QueryStatus::Error, Some(vec![summary(1)]), Some("timeout"));
    match listing_view(&s) {
      PageView::Populated(p) => assert_eq!(p.stale_error, Some("timeout")),
      other => panic!("expected populated view, got {:?}", other),
    }
  }

  #[test]
  fn test_track_rows_follow_position() {
    let rows = track_rows(&[track(Some(2), "B", 90), track(Some(1), "A", 30)]);
    assert_eq!(
      rows,
      vec![
        TrackRow {
          number: 1,
          title: "A".into(),
          duration: "0:30".into()
        },
        TrackRow {
          number: 2,
          title: "B".into(),
          duration: "1:30".into()
        },
      ]
    );
  }

  #[test]
  fn test_track_rows_fall_back_to_index() {
    let rows = track_rows(&[track(None, "First", 10), track(None, "Second", 20)]);
    assert_eq!(rows[0].number, 1);
    assert_eq!(rows[1].number, 2);
    assert_eq!(rows[1].title, "Second");
  }

  #[test]
  fn test_nested_song_takes_precedence() {
    let mut t = track(Some(1), "Flat title", 10);
    t.song = Some(TrackSong {
      title: Some("Song title".into()),
      running_time: Some(200),
    });
    assert_eq!(track_title(&t), "Song title");
    assert_eq!(track_running_time(&t), 200);

    t.song = Some(TrackSong::default());
    assert_eq!(track_title(&t), "Flat title");
    assert_eq!(track_running_time(&t), 10);
  }

  #[test]
  fn test_track_without_any_title_or_time() {
    let t = Track {
      id: None,
      position: None,
      title: None,
      running_time: None,
      song: None,
    };
    assert_eq!(track_title(&t), "Untitled");
    assert_eq!(track_running_time(&t), 0);
  }
}
