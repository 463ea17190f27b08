use std::fmt;

/// Identifies one cached fetch target: a resource name plus an optional id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
  resource: &'static str,
  id: Option<String>,
}

impl QueryKey {
  pub fn new(resource: &'static str, id: Option<String>) -> Self {
    Self { resource, id }
  }

  /// The album listing
  pub fn albums() -> Self {
    Self::new("albums", None)
  }

  /// A single album with its tracklist
  pub fn album(id: u64) -> Self {
    Self::new("album", Some(id.to_string()))
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.id {
      Some(id) => write!(f, "{}:{}", self.resource, id),
      None => f.write_str(self.resource),
    }
  }
}
