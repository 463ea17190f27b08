use thiserror::Error;

/// Failure of a single request against the catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No response was received (connection refused, DNS, timeout, ...)
  #[error("Network error: {0}")]
  Network(String),

  /// The server answered with a non-2xx status
  #[error("Request failed with status code {status}")]
  Http { status: u16 },

  /// The body was not valid JSON or did not match the expected record
  #[error("Invalid response from server: {0}")]
  Decode(String),
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    match err.status() {
      Some(status) => ApiError::Http {
        status: status.as_u16(),
      },
      None if err.is_decode() => ApiError::Decode(err.to_string()),
      None => ApiError::Network(err.to_string()),
    }
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(err: serde_json::Error) -> Self {
    ApiError::Decode(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_http_error_message() {
    let err = ApiError::Http { status: 404 };
    assert_eq!(err.to_string(), "Request failed with status code 404");
  }

  #[test]
  fn test_decode_error_from_serde() {
    let err: ApiError = serde_json::from_str::<serde_json::Value>("{not json")
      .unwrap_err()
      .into();
    assert!(matches!(err, ApiError::Decode(_)));
  }
}
