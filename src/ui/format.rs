//! Display formatting for catalog fields.

/// `M:SS` for a track running time, e.g. 125 -> "2:05"
pub fn format_duration(seconds: u32) -> String {
  format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Album playtime as `H:MM:SS` when at least an hour, else `M:SS`.
///
/// Missing or NaN values render as "0:00"; negatives clamp to zero and
/// fractions are dropped.
pub fn format_total_playtime(seconds: Option<f64>) -> String {
  let seconds = match seconds {
    Some(s) if !s.is_nan() => s.max(0.0).floor() as u64,
    _ => return "0:00".to_string(),
  };

  let hours = seconds / 3600;
  let minutes = (seconds % 3600) / 60;
  let secs = seconds % 60;
  if hours > 0 {
    format!("{}:{:02}:{:02}", hours, minutes, secs)
  } else {
    format!("{}:{:02}", minutes, secs)
  }
}

/// Playtime for the album detail header. Zero or missing means unknown;
/// anything else, negative included, is formatted (and clamped).
pub fn playtime_label(seconds: Option<f64>) -> String {
  match seconds {
    Some(s) if s != 0.0 && !s.is_nan() => format_total_playtime(Some(s)),
    _ => "Unknown".to_string(),
  }
}

/// Pound-sterling price from the API's decimal string
pub fn format_price(price: &str) -> String {
  match price.trim().parse::<f64>() {
    Ok(value) if value.is_finite() => format!("£{:.2}", value),
    _ => format!("£{}", price.trim()),
  }
}

/// "1 track", "12 tracks"
pub fn format_count(count: usize, noun: &str) -> String {
  if count == 1 {
    format!("{} {}", count, noun)
  } else {
    format!("{} {}s", count, noun)
  }
}
