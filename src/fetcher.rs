use anyhow::anyhow;
use async_trait::async_trait;
use colored::*;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SiteConfig;
use crate::error::{Error, Result};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, timeout or body read failure. Worth retrying.
    #[error("{0}")]
    Transport(String),

    #[error("HTTP status {0}")]
    Status(u16),
}

/// A single HTTP GET returning the full body.
#[async_trait]
pub trait HttpGet: Send + Sync {
    async fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &SiteConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(&config.referer)
            .map_err(|e| anyhow!("Invalid referer '{}': {}", config.referer, e))?;
        headers.insert(REFERER, referer);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpGet for ReqwestTransport {
    async fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Transport(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Downloads page images, retrying immediately on transport errors.
pub struct ImageFetcher<H> {
    transport: H,
    max_retries: usize,
}

impl<H: HttpGet> ImageFetcher<H> {
    pub fn new(transport: H, max_retries: usize) -> Self {
        Self {
            transport,
            max_retries,
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut retry = 0;
        loop {
            match self.transport.get(url).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(TransportError::Status(status)) => {
                    return Err(Error::ImageStatus {
                        url: url.to_string(),
                        status,
                    });
                }
                Err(TransportError::Transport(reason)) if retry < self.max_retries => {
                    retry += 1;
                    warn!(
                        "Request to {} failed, retry {}/{}: {}",
                        url.yellow(),
                        retry,
                        self.max_retries,
                        reason
                    );
                }
                Err(TransportError::Transport(reason)) => {
                    return Err(Error::ImageFetchExhausted {
                        url: url.to_string(),
                        attempts: retry + 1,
                        source: anyhow!(reason),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails with a transport error `failures` times, then succeeds.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl Flaky {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HttpGet for Flaky {
        async fn get(&self, _url: &str) -> std::result::Result<Vec<u8>, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(TransportError::Transport("connection reset".into()))
            } else {
                Ok(vec![1, 2, 3])
            }
        }
    }

    struct NotFound;

    #[async_trait]
    impl HttpGet for NotFound {
        async fn get(&self, _url: &str) -> std::result::Result<Vec<u8>, TransportError> {
            Err(TransportError::Status(404))
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_three_retries() {
        let fetcher = ImageFetcher::new(Flaky::new(3), 3);
        assert_eq!(fetcher.fetch("https://img/1.jpg").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(fetcher.transport.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_fourth_error_is_fatal() {
        let fetcher = ImageFetcher::new(Flaky::new(4), 3);
        match fetcher.fetch("https://img/1.jpg").await {
            Err(Error::ImageFetchExhausted { url, attempts, .. }) => {
                assert_eq!(url, "https://img/1.jpg");
                assert_eq!(attempts, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fetcher.transport.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_status_not_retried() {
        let fetcher = ImageFetcher::new(NotFound, 3);
        assert!(matches!(
            fetcher.fetch("https://img/404.jpg").await,
            Err(Error::ImageStatus { status: 404, .. })
        ));
    }

    #[test]
    fn test_transport_creation() {
        assert!(ReqwestTransport::new(&SiteConfig::default()).is_ok());
    }
}
