//! Run configuration
//!
//! Every component receives the parts of [`GrabConfig`] it needs at construction.
//! Defaults reproduce the historical constants, so running without a config file
//! behaves exactly like the original scripts.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:139.0) Gecko/20100101 Firefox/139.0";
pub const DEFAULT_ORIGIN: &str = "https://forcedtoplay.xyz";
pub const DEFAULT_HARVEST_ORIGIN: &str = "https://allupplay.xyz";
pub const DEFAULT_PROBE_ORIGIN: &str = "https://lefttoplay.xyz";
pub const DEFAULT_AUTH_BASE_URL: &str = "https://top2new.newkso.ru/auth.php";
pub const DEFAULT_MANIFEST_BASE_URL: &str = "https://top2new.newkso.ru/top2";
pub const DEFAULT_PLAYER_PAGE_URL: &str = "https://lefttoplay.xyz/premiumtv/daddylivehd.php";
pub const DEFAULT_INPUT_PATH: &str = "channelAuth.txt";
pub const DEFAULT_OUTPUT_PATH: &str = "channelKeys.json";

/// How keys are obtained from the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyProtocol {
    /// The authorization endpoint answers with the key bytes directly
    Binary,
    /// Authorization acknowledges with JSON; the key URI comes from the channel playlist
    #[default]
    Manifest,
}

impl KeyProtocol {
    /// Length policy applied when no explicit override is configured
    pub fn default_length_policy(&self) -> KeyLengthPolicy {
        match self {
            KeyProtocol::Binary => KeyLengthPolicy::Warn,
            KeyProtocol::Manifest => KeyLengthPolicy::Reject,
        }
    }
}

impl std::str::FromStr for KeyProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "binary" | "a" => Ok(KeyProtocol::Binary),
            "manifest" | "b" => Ok(KeyProtocol::Manifest),
            other => Err(Error::InvalidConfig(format!("unknown protocol '{}'", other))),
        }
    }
}

/// What to do with a key whose length is not 16 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLengthPolicy {
    /// Log a warning and keep the bytes
    Warn,
    /// Log an error and skip the channel
    Reject,
}

/// Configuration for a keygrab run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// User-Agent sent on every request
    pub user_agent: String,
    /// Origin header sent on every request
    pub origin: String,
    /// Optional Referer header
    pub referer: Option<String>,
    /// Origin sent when scraping player pages
    pub harvest_origin: String,
    pub harvest_referer: Option<String>,
    /// Origin sent by URL probes
    pub probe_origin: String,
    pub probe_referer: Option<String>,
    /// Authorization endpoint
    pub auth_base_url: Url,
    /// Base for per-channel playlists (`<base>/<channel>/mono.m3u8`)
    pub manifest_base_url: Url,
    /// Player page scraped by `harvest`
    pub player_page_url: Url,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Pause between channels in manifest mode, in milliseconds
    pub channel_pause_ms: u64,
    /// Key retrieval protocol
    pub protocol: KeyProtocol,
    /// Overrides the protocol's default length policy
    pub key_length_policy: Option<KeyLengthPolicy>,
    /// Credentials file
    pub input_path: PathBuf,
    /// Output key mapping
    pub output_path: PathBuf,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            referer: None,
            harvest_origin: DEFAULT_HARVEST_ORIGIN.to_string(),
            harvest_referer: Some(format!("{}/", DEFAULT_HARVEST_ORIGIN)),
            probe_origin: DEFAULT_PROBE_ORIGIN.to_string(),
            probe_referer: Some(format!("{}/", DEFAULT_PROBE_ORIGIN)),
            auth_base_url: Url::parse(DEFAULT_AUTH_BASE_URL).expect("valid default URL"),
            manifest_base_url: Url::parse(DEFAULT_MANIFEST_BASE_URL).expect("valid default URL"),
            player_page_url: Url::parse(DEFAULT_PLAYER_PAGE_URL).expect("valid default URL"),
            request_timeout_ms: 15_000,
            channel_pause_ms: 200,
            protocol: KeyProtocol::default(),
            key_length_policy: None,
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl GrabConfig {
    /// Load a JSON config file; missing fields fall back to defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GrabConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_protocol(mut self, protocol: KeyProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn channel_pause(&self) -> Duration {
        Duration::from_millis(self.channel_pause_ms)
    }

    /// Effective length policy for the configured protocol
    pub fn length_policy(&self) -> KeyLengthPolicy {
        self.key_length_policy
            .unwrap_or_else(|| self.protocol.default_length_policy())
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(Error::InvalidConfig("user_agent must not be empty".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("request_timeout_ms must be positive".into()));
        }
        for (name, url) in [
            ("auth_base_url", &self.auth_base_url),
            ("manifest_base_url", &self.manifest_base_url),
            ("player_page_url", &self.player_page_url),
        ] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::InvalidConfig(format!(
                    "{} must be http(s), got '{}'",
                    name, url
                )));
            }
        }
        Ok(())
    }
}
