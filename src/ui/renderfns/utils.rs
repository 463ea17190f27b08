use crate::catalog::types::Format;
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a release format
pub fn format_color(format: Option<&Format>) -> Color {
  match format {
    Some(Format::Vinyl) => Color::Magenta,
    Some(Format::Cd) => Color::Cyan,
    Some(Format::DigitalDownload) => Color::Green,
    Some(Format::Other(_)) | None => Color::Gray,
  }
}
