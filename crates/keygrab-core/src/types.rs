//! Core types for keygrab

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Length of an AES-128 content key in bytes
pub const KEY_LENGTH: usize = 16;

/// Channel credentials scraped from the player page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCredentials {
    /// Opaque channel identifier (e.g. `premium51`)
    pub channel_id: String,
    /// Authorization timestamp
    pub timestamp: String,
    /// Random nonce issued alongside the signature
    pub nonce: String,
    /// Hex signature over the other fields
    pub signature: String,
}

impl ChannelCredentials {
    pub fn new(
        channel_id: impl Into<String>,
        timestamp: impl Into<String>,
        nonce: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            timestamp: timestamp.into(),
            nonce: nonce.into(),
            signature: signature.into(),
        }
    }
}

/// Raw key bytes as returned by a key endpoint.
///
/// Length is not enforced here; see [`ContentKey::validate`] and
/// [`KeyLengthPolicy`](crate::config::KeyLengthPolicy).
#[derive(Clone, PartialEq, Eq)]
pub struct ContentKey(Vec<u8>);

impl ContentKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check the key is exactly [`KEY_LENGTH`] bytes
    pub fn validate(&self) -> Result<()> {
        if self.0.len() != KEY_LENGTH {
            return Err(Error::InvalidKeyLength {
                expected: KEY_LENGTH,
                actual: self.0.len(),
            });
        }
        Ok(())
    }

    /// Standard padded base64, the form stored in the output mapping
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        STANDARD
            .decode(encoded)
            .map(Self)
            .map_err(|e| Error::InvalidKeyEncoding(e.to_string()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

// Keys never show up in debug logs
impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentKey({} bytes)", self.0.len())
    }
}

/// Per-channel processing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    /// Credentials parsed from the input file
    Parsed,
    /// Authorization endpoint accepted the credentials
    Authorized,
    /// Playlist downloaded
    ManifestFetched,
    /// Key URI pulled out of the playlist
    UriExtracted,
    /// Key bytes downloaded
    KeyFetched,
    /// Key recorded in the result mapping
    Stored,
    /// Dropped after a failure
    Skipped,
}

impl ChannelState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: ChannelState) -> bool {
        use ChannelState::*;

        if target == Skipped {
            return !self.is_terminal();
        }

        matches!(
            (self, target),
            (Parsed, Authorized)
                | (Authorized, ManifestFetched)
                | (Authorized, KeyFetched)
                | (ManifestFetched, UriExtracted)
                | (UriExtracted, KeyFetched)
                | (KeyFetched, Stored)
        )
    }

    /// Whether the channel is finished, one way or the other
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelState::Stored | ChannelState::Skipped)
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChannelState::Parsed => "parsed",
            ChannelState::Authorized => "authorized",
            ChannelState::ManifestFetched => "manifest_fetched",
            ChannelState::UriExtracted => "uri_extracted",
            ChannelState::KeyFetched => "key_fetched",
            ChannelState::Stored => "stored",
            ChannelState::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_base64_roundtrip() {
        let key = ContentKey::new((0u8..16).collect::<Vec<_>>());
        let encoded = key.to_base64();
        assert_eq!(encoded, "AAECAwQFBgcICQoLDA0ODw==");
        assert_eq!(ContentKey::from_base64(&encoded).unwrap(), key);
    }

    #[test]
    fn test_key_validate() {
        assert!(ContentKey::new(vec![0u8; 16]).validate().is_ok());
        assert!(matches!(
            ContentKey::new(vec![0u8; 15]).validate(),
            Err(Error::InvalidKeyLength { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_key_debug_hides_bytes() {
        let key = ContentKey::new(vec![0xAB; 16]);
        assert_eq!(format!("{:?}", key), "ContentKey(16 bytes)");
        assert_eq!(key.to_hex(), "ab".repeat(16));
    }

    #[test]
    fn test_manifest_path_transitions() {
        use ChannelState::*;
        assert!(Parsed.can_transition_to(Authorized));
        assert!(Authorized.can_transition_to(ManifestFetched));
        assert!(ManifestFetched.can_transition_to(UriExtracted));
        assert!(UriExtracted.can_transition_to(KeyFetched));
        assert!(KeyFetched.can_transition_to(Stored));

        assert!(!Parsed.can_transition_to(KeyFetched));
        assert!(!Stored.can_transition_to(Skipped));
        assert!(!Skipped.can_transition_to(Parsed));
    }

    #[test]
    fn test_binary_path_transitions() {
        use ChannelState::*;
        assert!(Authorized.can_transition_to(KeyFetched));
        assert!(UriExtracted.can_transition_to(Skipped));
        assert!(Skipped.is_terminal());
        assert!(!KeyFetched.is_terminal());
        assert!(!Stored.can_transition_to(KeyFetched));
    }
}
