//! Shared HTTP client setup

use crate::config::GrabConfig;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Which page a client's requests appear to come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestProfile {
    /// Authorization, playlist and key requests of a grab run
    Keys,
    /// Player page scraping
    Harvest,
    /// HEAD checks on authorization URLs
    Probe,
}

impl RequestProfile {
    /// Origin and Referer configured for this profile
    pub fn headers<'a>(&self, config: &'a GrabConfig) -> (&'a str, Option<&'a str>) {
        match self {
            RequestProfile::Keys => (config.origin.as_str(), config.referer.as_deref()),
            RequestProfile::Harvest => (
                config.harvest_origin.as_str(),
                config.harvest_referer.as_deref(),
            ),
            RequestProfile::Probe => (
                config.probe_origin.as_str(),
                config.probe_referer.as_deref(),
            ),
        }
    }
}

/// Build the client used for every request in a run.
///
/// User-Agent, Origin and the optional Referer go out as default headers so the
/// authorization, playlist and key requests all look like they come from the player.
pub fn build_client(config: &GrabConfig) -> Result<Client> {
    build_client_for(config, RequestProfile::Keys)
}

/// Build a client carrying the Origin and Referer of `profile`
pub fn build_client_for(config: &GrabConfig, profile: RequestProfile) -> Result<Client> {
    let (origin, referer) = profile.headers(config);

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value("user_agent", &config.user_agent)?);
    headers.insert(ORIGIN, header_value("origin", origin)?);
    if let Some(referer) = referer {
        headers.insert(REFERER, header_value("referer", referer)?);
    }

    Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidConfig(format!("{} is not a valid header value", name)))
}

/// GET a URL and return the body bytes; non-2xx statuses are errors
pub async fn get_bytes(client: &Client, url: &Url) -> Result<Vec<u8>> {
    debug!(%url, "GET");
    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::request(url.as_str(), e))?;

    let body = response
        .bytes()
        .await
        .map_err(|e| Error::request(url.as_str(), e))?;

    Ok(body.to_vec())
}

/// GET a URL and return the body as text; non-2xx statuses are errors
pub async fn get_text(client: &Client, url: &Url) -> Result<String> {
    debug!(%url, "GET");
    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::request(url.as_str(), e))?;

    response
        .text()
        .await
        .map_err(|e| Error::request(url.as_str(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_defaults() {
        assert!(build_client(&GrabConfig::default()).is_ok());
    }

    #[test]
    fn test_build_client_rejects_bad_header() {
        let config = GrabConfig {
            origin: "bad\nvalue".into(),
            ..Default::default()
        };
        assert!(matches!(build_client(&config), Err(Error::InvalidConfig(_))));

        let config = GrabConfig {
            probe_referer: Some("bad\rvalue".into()),
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
        assert!(build_client_for(&config, RequestProfile::Probe).is_err());
    }

    #[test]
    fn test_profiles_pick_their_own_headers() {
        let config = GrabConfig::default();
        assert_eq!(
            RequestProfile::Keys.headers(&config),
            ("https://forcedtoplay.xyz", None)
        );
        assert_eq!(
            RequestProfile::Harvest.headers(&config),
            ("https://allupplay.xyz", Some("https://allupplay.xyz/"))
        );
        assert_eq!(
            RequestProfile::Probe.headers(&config),
            ("https://lefttoplay.xyz", Some("https://lefttoplay.xyz/"))
        );
    }
}
