// src/fetch/mod.rs
//
// HTTP plumbing shared by the source locator and the table ingestor.
// Neither stage retries on its own; `RetryPolicy` is applied by whoever
// drives a whole load (see `snapshot`).

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{PipelineError, Result};

pub mod locator;
pub mod tables;

pub use locator::{fetch_dataset_url, locate_dataset_url};
pub use tables::{fetch_tables, parse_tables};

/// Publisher landing page carrying the link to the current dataset.
pub const LANDING_URL: &str =
    "https://www.canada.ca/en/public-health/services/surveillance/respiratory-virus-detections-canada.html";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the shared client. Timeouts are applied per request.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .gzip(true)
        .build()
        .map_err(|source| PipelineError::Fetch {
            url: "<client>".into(),
            source,
        })
}

/// GET `url` as text, failing on transport errors and non-success status.
pub async fn get_text(client: &Client, url: &Url, timeout: Duration) -> Result<String> {
    debug!(%url, ?timeout, "fetching");
    let fetch_err = |source| PipelineError::Fetch {
        url: url.to_string(),
        source,
    };
    let resp = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(fetch_err)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(PipelineError::HttpStatus {
            url: url.to_string(),
            status,
        });
    }
    resp.text().await.map_err(fetch_err)
}

/// Bounded retry with exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// retry budget is spent.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempts < self.max_retries => {
                    attempts += 1;
                    let delay = self.backoff(attempts);
                    warn!(attempt = attempts, delay_ms = delay.as_millis() as u64, error = %e, "Retrying");
                    sleep(delay).await;
                }
                Err(e) => {
                    if e.is_transient() {
                        error!(attempts, error = %e, "Exhausted retries");
                    }
                    return Err(e);
                }
            }
        }
    }
}
