//! HTTP retrieval of upstream blacklists.
//!
//! One attempt per URL. Anything but `200 OK` is fatal for the run; the next
//! scheduled invocation is the retry.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::{BlackholeError, Result};

#[cfg(test)]
use mockall::automock;

const TIMEOUT_SECS: u64 = 30;

/// Maximum size of one upstream list (10 MB)
/// The largest common hosts lists are a few MB
const MAX_LIST_SIZE: usize = 10 * 1024 * 1024;

/// Source of raw upstream text, abstracted for tests
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    /// GET `url` and return the response body
    async fn get(&self, url: &str) -> Result<String>;
}

/// HTTP client for fetching lists
pub struct Fetcher {
    client: Client,
    max_size: usize,
}

impl Fetcher {
    /// Create a new fetcher with default settings
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(user_agent())
            .build()
            .map_err(|e| BlackholeError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            max_size: MAX_LIST_SIZE,
        })
    }
}

// Note: Default is intentionally not implemented for Fetcher
// because new() can fail and we want explicit error handling.

#[async_trait]
impl Retriever for Fetcher {
    async fn get(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let transport = |e: reqwest::Error| BlackholeError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        if response.status() != StatusCode::OK {
            return Err(BlackholeError::Fetch {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_size {
                return Err(too_large(url, length as usize, self.max_size));
            }
        }

        let body = response.text().await.map_err(transport)?;
        if body.len() > self.max_size {
            return Err(too_large(url, body.len(), self.max_size));
        }

        Ok(body)
    }
}

fn too_large(url: &str, size: usize, max: usize) -> BlackholeError {
    BlackholeError::Transport {
        url: url.to_string(),
        message: format!("response too large: {} bytes (max: {} bytes)", size, max),
    }
}

/// Fixed descriptive User-Agent sent with every request
pub fn user_agent() -> String {
    format!(
        "blackhole/{} (DNS blacklist aggregator)",
        env!("CARGO_PKG_VERSION")
    )
}
