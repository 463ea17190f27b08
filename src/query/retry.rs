use std::future::Future;
use std::time::Duration;

/// How often and how patiently a failing loader is retried.
///
/// The delay before retry `n` (0-based) is `min(base_delay * 2^n, max_delay)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Retries after the first failed attempt
  pub max_retries: u32,
  pub base_delay: Duration,
  pub max_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      base_delay: Duration::from_millis(1000),
      max_delay: Duration::from_millis(30_000),
    }
  }
}

impl RetryPolicy {
  /// Fail on the first error
  #[cfg(test)]
  pub fn never() -> Self {
    Self {
      max_retries: 0,
      ..Self::default()
    }
  }

  /// Delay before retry number `retry` (0-based)
  pub fn delay(&self, retry: u32) -> Duration {
    let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
    self
      .base_delay
      .checked_mul(factor)
      .unwrap_or(self.max_delay)
      .min(self.max_delay)
  }

  /// Run `attempt` until it succeeds or retries are exhausted.
  ///
  /// Returns the last error when every attempt failed.
  pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T, String>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, String>>,
  {
    let mut retry = 0;
    loop {
      match attempt().await {
        Ok(value) => return Ok(value),
        Err(error) if retry < self.max_retries => {
          let delay = self.delay(retry);
          tracing::debug!(retry = retry + 1, ?delay, %error, "attempt failed, retrying");
          retry += 1;
          tokio::time::sleep(delay).await;
        }
        Err(error) => {
          tracing::debug!(attempts = retry + 1, %error, "giving up");
          return Err(error);
        }
      }
    }
  }
}
