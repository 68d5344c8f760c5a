//! Shared HTTP client with bounded retry

use crate::{ResolverConfig, ResolverError, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Thin wrapper over `reqwest::Client`; cheap to clone
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpClient {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// GET `url` with `query` and decode the JSON body.
    ///
    /// Transport failures, 429 and 5xx responses are retried after the
    /// configured delay; other error statuses fail immediately.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        service: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        with_retry(service, self.max_retries, self.retry_delay, move || async move {
            debug!("GET {} {}", service, url);
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| AttemptError::Retryable(ResolverError::Http(e)))?;

            let status = response.status();
            if !status.is_success() {
                let err = ResolverError::Status {
                    service: service.to_string(),
                    status: status.as_u16(),
                };
                return Err(if is_retryable(status.as_u16()) {
                    AttemptError::Retryable(err)
                } else {
                    AttemptError::Fatal(err)
                });
            }

            response
                .json::<T>()
                .await
                .map_err(|e| {
                    AttemptError::Fatal(ResolverError::Parse(format!("{}: {}", service, e)))
                })
        })
        .await
    }
}

/// Failure of a single attempt
#[derive(Debug)]
pub(crate) enum AttemptError {
    Retryable(ResolverError),
    Fatal(ResolverError),
}

/// Run `attempt` until it succeeds, fails fatally, or has been retried
/// `max_retries` times. Sleeps `retry_delay` before every retry.
pub(crate) async fn with_retry<T, F, Fut>(
    service: &str,
    max_retries: u32,
    retry_delay: Duration,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, AttemptError>>,
{
    let mut retries = 0;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(e)) => return Err(e),
            Err(AttemptError::Retryable(e)) if retries >= max_retries => return Err(e),
            Err(AttemptError::Retryable(e)) => {
                retries += 1;
                warn!(
                    "{} request failed ({}), retry {}/{} in {:?}",
                    service, e, retries, max_retries, retry_delay
                );
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}

fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(429));
        assert!(is_retryable(503));
        assert!(!is_retryable(404));
        assert!(!is_retryable(400));
    }

    fn unavailable() -> AttemptError {
        AttemptError::Retryable(ResolverError::Status {
            service: "Nominatim".into(),
            status: 503,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_fixed_delay() {
        let calls = AtomicUsize::new(0);
        let started = Instant::now();

        let result = with_retry("Nominatim", 2, Duration::from_millis(2000), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(unavailable())
                } else {
                    Ok(200u16)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 200);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted() {
        let calls = AtomicUsize::new(0);
        let started = Instant::now();

        let result: Result<u16> = with_retry("GeoNames", 2, Duration::from_millis(500), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(unavailable()) }
        })
        .await;

        assert!(matches!(result, Err(ResolverError::Status { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_not_retried() {
        let calls = AtomicUsize::new(0);
        let started = Instant::now();

        let result: Result<u16> = with_retry("Nominatim", 2, Duration::from_millis(2000), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(AttemptError::Fatal(ResolverError::Status {
                    service: "Nominatim".into(),
                    status: 404,
                }))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_client_builds_from_defaults() {
        assert!(HttpClient::new(&ResolverConfig::default()).is_ok());
    }
}
