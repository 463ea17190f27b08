use std::fmt;
use std::str::FromStr;

/// Navigable pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  /// `/`
  Albums,
  /// `/albums/:id`
  Album(u64),
}

impl FromStr for Route {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let path = s.trim().trim_end_matches('/');
    if path.is_empty() {
      return Ok(Route::Albums);
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
      ["albums"] => Ok(Route::Albums),
      ["albums", id] => id
        .parse()
        .map(Route::Album)
        .map_err(|_| format!("Invalid album id in route: {}", id)),
      _ => Err(format!(
        "Unknown route: {} (expected / or /albums/<id>)",
        s
      )),
    }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Route::Albums => f.write_str("/"),
      Route::Album(id) => write!(f, "/albums/{}", id),
    }
  }
}
