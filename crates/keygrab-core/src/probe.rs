//! HEAD checks against a list of authorization URLs

use crate::error::Result;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, instrument};

/// Result of probing one URL
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    /// A response arrived, whatever its status
    pub fn responded(&self) -> bool {
        self.status.is_some()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

/// Non-empty, trimmed lines of a URL list file
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Issue a HEAD request; failures are captured in the result
#[instrument(skip(client))]
pub async fn probe_url(client: &Client, url: &str) -> ProbeResult {
    match client.head(url).send().await {
        Ok(response) => {
            debug!(status = %response.status(), "probe response");
            ProbeResult {
                url: url.to_string(),
                status: Some(response.status().as_u16()),
                error: None,
            }
        }
        Err(e) => ProbeResult {
            url: url.to_string(),
            status: None,
            error: Some(e.to_string()),
        },
    }
}
