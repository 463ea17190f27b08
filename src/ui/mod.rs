pub mod format;
pub mod model;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::{ListState, TableState};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Breadcrumb
    ])
    .split(frame.area());

  let breadcrumb = app.view_breadcrumb();
  let api_url = app.api_url().to_string();

  if let Some(view) = app.current_view_mut() {
    let route = view.route().to_string();
    renderfns::draw_header(frame, chunks[0], &api_url, &route, &view.shortcuts());
    view.render(frame, chunks[1]);
  }

  renderfns::draw_footer(frame, chunks[2], &breadcrumb);
}

/// Keep a list selection inside `0..len`, selecting the first row when unset
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  state.select(clamp_selection(state.selected(), len));
}

pub fn ensure_valid_table_selection(state: &mut TableState, len: usize) {
  state.select(clamp_selection(state.selected(), len));
}

fn clamp_selection(selected: Option<usize>, len: usize) -> Option<usize> {
  if len == 0 {
    None
  } else {
    Some(selected.unwrap_or(0).min(len - 1))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_clamp_selection() {
    assert_eq!(clamp_selection(None, 0), None);
    assert_eq!(clamp_selection(Some(3), 0), None);
    assert_eq!(clamp_selection(None, 4), Some(0));
    assert_eq!(clamp_selection(Some(9), 4), Some(3));
    assert_eq!(clamp_selection(Some(2), 4), Some(2));
  }
}
