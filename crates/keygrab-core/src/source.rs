//! Key retrieval protocols
//!
//! Two protocols exist in the wild:
//!
//! ```text
//! binary:    auth.php ──► 16 key bytes
//!
//! manifest:  auth.php ──► {"status":"ok"}
//!            <base>/<channel>/mono.m3u8 ──► #EXT-X-KEY URI
//!            <key uri> ──► 16 key bytes
//! ```

use crate::{
    auth::AuthClient,
    config::{GrabConfig, KeyLengthPolicy, KeyProtocol},
    key::{check_length, KeyFetcher},
    manifest::{extract_key_uri, PlaylistResolver},
    types::{ChannelCredentials, ChannelState, ContentKey},
    Result,
};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Tracks how far a channel got through its protocol
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    channel_id: String,
    state: ChannelState,
}

impl ChannelProgress {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            state: ChannelState::Parsed,
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn advance(&mut self, next: ChannelState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid channel transition {} -> {}",
            self.state,
            next
        );
        debug!(channel = %self.channel_id, from = %self.state, to = %next, "channel state");
        self.state = next;
    }
}

/// Trait for key retrieval protocols
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Protocol implemented by this source
    fn protocol(&self) -> KeyProtocol;

    /// Run the protocol for one channel, recording progress as it goes
    async fn obtain_key(
        &self,
        creds: &ChannelCredentials,
        progress: &mut ChannelProgress,
    ) -> Result<ContentKey>;
}

/// Authorization response body is the key
pub struct BinaryKeySource {
    auth: AuthClient,
    policy: KeyLengthPolicy,
}

impl BinaryKeySource {
    pub fn new(auth: AuthClient, policy: KeyLengthPolicy) -> Self {
        Self { auth, policy }
    }
}

#[async_trait]
impl KeySource for BinaryKeySource {
    fn protocol(&self) -> KeyProtocol {
        KeyProtocol::Binary
    }

    async fn obtain_key(
        &self,
        creds: &ChannelCredentials,
        progress: &mut ChannelProgress,
    ) -> Result<ContentKey> {
        let key = self.auth.fetch_key(creds).await?;
        progress.advance(ChannelState::Authorized);
        progress.advance(ChannelState::KeyFetched);
        check_length(&creds.channel_id, key, self.policy)
    }
}

/// Authorization acknowledgement, then playlist, then key URI
pub struct ManifestKeySource {
    auth: AuthClient,
    playlists: PlaylistResolver,
    keys: KeyFetcher,
    policy: KeyLengthPolicy,
}

impl ManifestKeySource {
    pub fn new(
        auth: AuthClient,
        playlists: PlaylistResolver,
        keys: KeyFetcher,
        policy: KeyLengthPolicy,
    ) -> Self {
        Self {
            auth,
            playlists,
            keys,
            policy,
        }
    }
}

#[async_trait]
impl KeySource for ManifestKeySource {
    fn protocol(&self) -> KeyProtocol {
        KeyProtocol::Manifest
    }

    async fn obtain_key(
        &self,
        creds: &ChannelCredentials,
        progress: &mut ChannelProgress,
    ) -> Result<ContentKey> {
        self.auth.authorize(creds).await?;
        progress.advance(ChannelState::Authorized);

        let (playlist_url, playlist) = self.playlists.fetch_playlist(&creds.channel_id).await?;
        progress.advance(ChannelState::ManifestFetched);

        let key_url = extract_key_uri(&playlist, &playlist_url)?;
        progress.advance(ChannelState::UriExtracted);
        debug!(channel = %creds.channel_id, %key_url, "resolved key URI");

        let key = self.keys.fetch(&key_url).await?;
        progress.advance(ChannelState::KeyFetched);

        check_length(&creds.channel_id, key, self.policy)
    }
}

/// Create the key source for the configured protocol
pub fn create_key_source(config: &GrabConfig, client: Client) -> Box<dyn KeySource> {
    let auth = AuthClient::new(client.clone(), config.auth_base_url.clone());
    let policy = config.length_policy();

    match config.protocol {
        KeyProtocol::Binary => Box::new(BinaryKeySource::new(auth, policy)),
        KeyProtocol::Manifest => Box::new(ManifestKeySource::new(
            auth,
            PlaylistResolver::new(client.clone(), config.manifest_base_url.clone()),
            KeyFetcher::new(client),
            policy,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_key_source_follows_protocol() {
        let client = Client::new();
        let config = GrabConfig::default();
        assert_eq!(
            create_key_source(&config, client.clone()).protocol(),
            KeyProtocol::Manifest
        );

        let config = config.with_protocol(KeyProtocol::Binary);
        assert_eq!(create_key_source(&config, client).protocol(), KeyProtocol::Binary);
    }

    #[test]
    fn test_progress_starts_parsed() {
        let mut progress = ChannelProgress::new("premium1");
        assert_eq!(progress.state(), ChannelState::Parsed);
        progress.advance(ChannelState::Authorized);
        assert_eq!(progress.state(), ChannelState::Authorized);
        assert_eq!(progress.channel_id(), "premium1");
    }
}
