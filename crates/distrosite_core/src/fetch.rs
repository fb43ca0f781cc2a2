use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde_json::Value;

const DEFAULT_RETRY_DELAY_MS: u64 = 350;

/// Synchronous network access used by every fetch-with-fallback tier.
pub trait HttpFetch {
    /// Fetch a body in one attempt bounded by `timeout`.
    fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>>;

    /// Issue a GET with `query` and decode the JSON body.
    fn get_json(&self, url: &str, query: &[(&str, String)], timeout: Duration) -> Result<Value>;
}

pub struct HttpClient {
    client: Client,
    user_agent: String,
    retries: usize,
    retry_delay_ms: u64,
}

impl HttpClient {
    pub fn new(user_agent: &str, retries: usize) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            retries,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        })
    }
}

impl HttpFetch for HttpClient {
    fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", self.user_agent.clone())
            .timeout(timeout)
            .send()
            .with_context(|| format!("failed to fetch {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} while fetching {}", status.as_u16(), url);
        }
        let bytes = response
            .bytes()
            .with_context(|| format!("failed to read body of {url}"))?;
        if bytes.is_empty() {
            bail!("empty body from {url}");
        }
        Ok(bytes.to_vec())
    }

    fn get_json(&self, url: &str, query: &[(&str, String)], timeout: Duration) -> Result<Value> {
        let mut last_error = None::<String>;
        for attempt in 0..=self.retries {
            let response = self
                .client
                .get(url)
                .header("User-Agent", self.user_agent.clone())
                .query(query)
                .timeout(timeout)
                .send();

            match response {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<Value>()
                        .with_context(|| format!("failed to decode JSON from {url}"));
                }
                Ok(response) => {
                    last_error = Some(format!("HTTP {}", response.status()));
                }
                Err(error) => {
                    last_error = Some(error.to_string());
                }
            }
            if attempt < self.retries {
                sleep(Duration::from_millis(
                    self.retry_delay_ms.saturating_mul(attempt as u64 + 1),
                ));
            }
        }

        let message = last_error.unwrap_or_else(|| "request failed".to_string());
        bail!("{message} while querying {url}")
    }
}

/// Fetcher for `--offline` builds: every request fails, so each tier falls through.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl HttpFetch for OfflineFetcher {
    fn get_bytes(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>> {
        bail!("offline: skipped fetch of {url}")
    }

    fn get_json(&self, url: &str, _query: &[(&str, String)], _timeout: Duration) -> Result<Value> {
        bail!("offline: skipped query to {url}")
    }
}
