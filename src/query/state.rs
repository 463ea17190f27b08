use std::fmt;
use std::sync::Arc;

/// Lifecycle of a query key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Nothing has been fetched yet
  Idle,
  /// A fetch is in flight (previous data, if any, is still attached)
  Loading,
  /// The last fetch succeeded
  Success,
  /// The last fetch failed after all retries
  Error,
}

/// Snapshot of a cached query, handed to views.
pub struct QueryState<T> {
  pub status: QueryStatus,
  /// Last successfully fetched data; survives later failures and refetches
  pub data: Option<Arc<T>>,
  /// Message of the last failure, cleared by the next success
  pub error: Option<String>,
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  #[cfg(test)]
  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }
}

impl<T> Clone for QueryState<T> {
  fn clone(&self) -> Self {
    Self {
      status: self.status,
      data: self.data.clone(),
      error: self.error.clone(),
    }
  }
}

impl<T: fmt::Debug> fmt::Debug for QueryState<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("QueryState")
      .field("status", &self.status)
      .field("data", &self.data)
      .field("error", &self.error)
      .finish()
  }
}
