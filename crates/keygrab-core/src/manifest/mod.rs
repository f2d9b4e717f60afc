//! Channel playlist resolution

pub mod hls;

pub use hls::{extract_key_uri, find_key_line, key_uri_attribute, KEY_TAG};

use crate::{error::Error, http, Result};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

/// File name of the per-channel media playlist
pub const PLAYLIST_NAME: &str = "mono.m3u8";

/// Fetches channel playlists and pulls out the key URI
#[derive(Debug, Clone)]
pub struct PlaylistResolver {
    client: Client,
    base_url: Url,
}

impl PlaylistResolver {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// `<base>/<channel>/mono.m3u8`
    pub fn playlist_url(&self, channel_id: &str) -> Result<Url> {
        playlist_url(&self.base_url, channel_id)
    }

    /// Download the playlist text for a channel
    #[instrument(skip(self))]
    pub async fn fetch_playlist(&self, channel_id: &str) -> Result<(Url, String)> {
        let url = self.playlist_url(channel_id)?;
        let content = http::get_text(&self.client, &url).await?;
        debug!(bytes = content.len(), "fetched playlist");
        Ok((url, content))
    }
}

/// Build the playlist URL for a channel under a base URL
pub fn playlist_url(base: &Url, channel_id: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::InvalidConfig(format!("manifest base URL cannot be a base: {}", base)))?
        .pop_if_empty()
        .push(channel_id)
        .push(PLAYLIST_NAME);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_url() {
        let base = Url::parse("https://top2new.newkso.ru/top2").unwrap();
        assert_eq!(
            playlist_url(&base, "premium51").unwrap().as_str(),
            "https://top2new.newkso.ru/top2/premium51/mono.m3u8"
        );
    }

    #[test]
    fn test_playlist_url_trailing_slash() {
        let base = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(
            playlist_url(&base, "premium7").unwrap().as_str(),
            "http://127.0.0.1:8080/premium7/mono.m3u8"
        );
    }
}
