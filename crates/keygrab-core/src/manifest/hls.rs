//! `#EXT-X-KEY` extraction from HLS media playlists
//!
//! Only the first key line matters: channel playlists carry a single AES-128 key
//! for every segment. The line is matched textually rather than through a full
//! playlist parse so that a missing tag and a malformed tag stay distinguishable.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub const KEY_TAG: &str = "#EXT-X-KEY";

fn uri_attribute() -> &'static Regex {
    static URI: OnceLock<Regex> = OnceLock::new();
    URI.get_or_init(|| Regex::new(r#"URI="([^"]+)""#).expect("valid regex"))
}

/// First line starting with `#EXT-X-KEY`
pub fn find_key_line(playlist: &str) -> Option<&str> {
    playlist
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(KEY_TAG))
}

/// Quoted `URI` attribute of a key line
pub fn key_uri_attribute(line: &str) -> Option<&str> {
    uri_attribute()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Locate the key URI in a playlist and resolve it against the playlist URL
pub fn extract_key_uri(playlist: &str, playlist_url: &Url) -> Result<Url> {
    let line = find_key_line(playlist).ok_or_else(|| Error::KeyLineNotFound {
        url: playlist_url.to_string(),
    })?;

    let uri = key_uri_attribute(line).ok_or_else(|| Error::KeyUriNotFound {
        line: line.to_string(),
    })?;

    playlist_url.join(uri).map_err(|e| Error::InvalidKeyUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYLIST: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:4\n\
#EXT-X-MEDIA-SEQUENCE:1024\n\
#EXT-X-KEY:METHOD=AES-128,URI=\"https://keys.example.com/key/premium51/1024\",IV=0x0123\n\
#EXTINF:4.0,\n\
seg-1024.ts\n\
#EXT-X-KEY:METHOD=AES-128,URI=\"https://keys.example.com/key/premium51/1025\"\n\
#EXTINF:4.0,\n\
seg-1025.ts\n";

    fn base() -> Url {
        Url::parse("https://cdn.example.com/premium51/mono.m3u8").unwrap()
    }

    #[test]
    fn test_first_key_line_wins() {
        let uri = extract_key_uri(PLAYLIST, &base()).unwrap();
        assert_eq!(uri.as_str(), "https://keys.example.com/key/premium51/1024");
    }

    #[test]
    fn test_relative_uri_resolves_against_playlist() {
        let playlist = "#EXT-X-KEY:METHOD=AES-128,URI=\"key.bin\"\n";
        let uri = extract_key_uri(playlist, &base()).unwrap();
        assert_eq!(uri.as_str(), "https://cdn.example.com/premium51/key.bin");
    }

    #[test]
    fn test_missing_key_line() {
        let playlist = "#EXTM3U\n#EXTINF:4.0,\nseg.ts\n";
        assert!(matches!(
            extract_key_uri(playlist, &base()),
            Err(Error::KeyLineNotFound { .. })
        ));
    }

    #[test]
    fn test_key_line_without_uri() {
        let playlist = "#EXT-X-KEY:METHOD=NONE\n";
        assert!(matches!(
            extract_key_uri(playlist, &base()),
            Err(Error::KeyUriNotFound { .. })
        ));
    }

    #[test]
    fn test_tag_must_start_the_line() {
        assert_eq!(find_key_line("# note about #EXT-X-KEY\n"), None);
    }
}
