//! Key download and length checks

use crate::config::KeyLengthPolicy;
use crate::error::{Error, Result};
use crate::http;
use crate::types::{ContentKey, KEY_LENGTH};
use reqwest::Client;
use tracing::{instrument, warn};
use url::Url;

/// Downloads raw key bytes from a key-delivery URI
#[derive(Debug, Clone)]
pub struct KeyFetcher {
    client: Client,
}

impl KeyFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// GET the key URI; the body is returned as-is
    #[instrument(skip(self, url), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<ContentKey> {
        let body = http::get_bytes(&self.client, url).await?;
        Ok(ContentKey::new(body))
    }
}

/// Apply a length policy to a freshly downloaded key.
///
/// `Warn` keeps a wrong-length key after logging; `Reject` turns it into an error.
/// An empty body is never kept.
pub fn check_length(
    channel_id: &str,
    key: ContentKey,
    policy: KeyLengthPolicy,
) -> Result<ContentKey> {
    if key.is_empty() {
        return Err(Error::InvalidKeyLength {
            expected: KEY_LENGTH,
            actual: 0,
        });
    }

    match (key.validate(), policy) {
        (Ok(()), _) => Ok(key),
        (Err(_), KeyLengthPolicy::Warn) => {
            warn!(
                channel = channel_id,
                expected = KEY_LENGTH,
                actual = key.len(),
                "unexpected key length, keeping it anyway"
            );
            Ok(key)
        }
        (Err(e), KeyLengthPolicy::Reject) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_always_rejected() {
        assert!(check_length("c", ContentKey::new(Vec::new()), KeyLengthPolicy::Warn).is_err());
    }

    #[test]
    fn test_check_length_accepts_16_bytes() {
        let key = ContentKey::new(vec![1u8; 16]);
        assert!(check_length("c", key.clone(), KeyLengthPolicy::Reject).is_ok());
        assert_eq!(check_length("c", key.clone(), KeyLengthPolicy::Warn).unwrap(), key);
    }

    #[test]
    fn test_check_length_policies_diverge() {
        let short = ContentKey::new(vec![1u8; 12]);
        assert_eq!(
            check_length("c", short.clone(), KeyLengthPolicy::Warn).unwrap().len(),
            12
        );
        assert!(matches!(
            check_length("c", short, KeyLengthPolicy::Reject),
            Err(Error::InvalidKeyLength { actual: 12, .. })
        ));
    }
}
