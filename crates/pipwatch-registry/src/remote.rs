//! Remote mapping feed

use pipwatch_foundation::{MappingTable, PipwatchError, PipwatchResult};
use std::time::Duration;
use tracing::{debug, error};

/// User agent sent with every feed request
pub const USER_AGENT: &str = "Pipwatch/1.0";

/// Timeout for registry-internal refreshes
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of fresh mapping tables
///
/// Implementations must not fail loudly: any problem reaching or decoding the
/// feed is reported as `None`.
pub trait RemoteFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Option<MappingTable>;
}

/// Fetches the feed with a single blocking HTTP GET
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    fn get_text(&self, url: &str, timeout: Duration) -> PipwatchResult<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| PipwatchError::network(format!("Failed to build HTTP client: {}", e)))?;

        let response = client
            .get(url)
            .send()
            .map_err(|e| PipwatchError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipwatchError::network(format!("HTTP {}", status)));
        }

        response
            .text()
            .map_err(|e| PipwatchError::network(e.to_string()))
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Option<MappingTable> {
        let text = match self.get_text(url, timeout) {
            Ok(text) => text,
            Err(e) => {
                debug!(url, error = %e, "Failed to fetch remote mappings");
                return None;
            }
        };

        match MappingTable::from_json(&text) {
            Ok(table) => {
                debug!(url, mappings = table.len(), "Fetched remote mappings");
                Some(table)
            }
            Err(e) => {
                error!(url, error = %e, "Invalid JSON in remote mappings");
                None
            }
        }
    }
}
