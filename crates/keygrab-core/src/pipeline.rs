//! Key grab pipeline - main orchestrator for a run
//!
//! Coordinates:
//! - Credential parsing
//! - Per-channel key retrieval through a [`KeySource`]
//! - Result accumulation and the final JSON write
//!
//! Channels are processed strictly one after another. A failure only ever skips
//! the channel it happened on; the only errors that end a run are reading the
//! credentials file and writing the output file.

use crate::{
    config::{GrabConfig, KeyProtocol},
    credentials::{self, ParseOutcome},
    error::{Error, FailureKind},
    http::build_client,
    source::{create_key_source, ChannelProgress, KeySource},
    store::KeyStore,
    types::{ChannelCredentials, ChannelState},
    Result,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument};

/// Outcome of one channel
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel_id: String,
    /// Final state: `stored` or `skipped`
    pub state: ChannelState,
    /// Last state reached before a skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_after: Option<ChannelState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ChannelReport {
    fn stored(channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            state: ChannelState::Stored,
            failed_after: None,
            kind: None,
            error_code: None,
            reason: None,
        }
    }

    fn skipped(channel_id: &str, failed_after: ChannelState, err: &Error) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            state: ChannelState::Skipped,
            failed_after: Some(failed_after),
            kind: Some(err.kind()),
            error_code: Some(err.error_code()),
            reason: Some(err.to_string()),
        }
    }

    pub fn is_stored(&self) -> bool {
        self.state == ChannelState::Stored
    }
}

/// Summary of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Per-channel outcomes in processing order
    pub channels: Vec<ChannelReport>,
    /// Malformed credential blocks passed over by the parser
    pub skipped_blocks: usize,
    /// Entries in the written mapping
    pub written: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl RunReport {
    pub fn stored(&self) -> usize {
        self.channels.iter().filter(|c| c.is_stored()).count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ChannelReport> {
        self.channels.iter().filter(|c| !c.is_stored())
    }
}

/// Runs the credential → key pipeline
pub struct KeyGrabber {
    config: GrabConfig,
    source: Box<dyn KeySource>,
}

impl KeyGrabber {
    /// Create a grabber with the protocol and HTTP settings from `config`
    pub fn new(config: GrabConfig) -> Result<Self> {
        config.validate()?;
        let client = build_client(&config)?;
        let source = create_key_source(&config, client);
        Ok(Self { config, source })
    }

    /// Create a grabber around an existing key source
    pub fn with_source(config: GrabConfig, source: Box<dyn KeySource>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    /// Read the credentials file, fetch every key and overwrite the output file
    #[instrument(skip(self), fields(input = %self.config.input_path.display()))]
    pub async fn run(&self) -> Result<RunReport> {
        let blocks = credentials::open(&self.config.input_path)?;
        let (store, mut report) = self.collect(blocks).await?;

        store.write(&self.config.output_path)?;
        report.output_path = Some(self.config.output_path.clone());
        info!(
            written = report.written,
            output = %self.config.output_path.display(),
            "wrote key mapping"
        );

        Ok(report)
    }

    /// Process parsed blocks into a key store without touching the output file
    pub async fn collect<I>(&self, blocks: I) -> Result<(KeyStore, RunReport)>
    where
        I: Iterator<Item = Result<ParseOutcome>>,
    {
        let mut store = KeyStore::new();
        let mut report = RunReport::default();
        let pause = self.pause();

        for outcome in blocks {
            match outcome? {
                ParseOutcome::Skipped { line, channel_id } => {
                    debug!(line, channel = %channel_id, "incomplete credential block");
                    report.skipped_blocks += 1;
                }
                ParseOutcome::Credentials(creds) => {
                    if let Some(pause) = pause {
                        if !report.channels.is_empty() {
                            tokio::time::sleep(pause).await;
                        }
                    }
                    let channel = self.process(&creds, &mut store).await;
                    report.channels.push(channel);
                }
            }
        }

        report.written = store.len();
        Ok((store, report))
    }

    /// Run one channel through the key source
    pub async fn process(&self, creds: &ChannelCredentials, store: &mut KeyStore) -> ChannelReport {
        let mut progress = ChannelProgress::new(&creds.channel_id);

        match self.source.obtain_key(creds, &mut progress).await {
            Ok(key) => {
                store.insert(&creds.channel_id, &key);
                progress.advance(ChannelState::Stored);
                info!(channel = %creds.channel_id, bytes = key.len(), "stored key");
                ChannelReport::stored(&creds.channel_id)
            }
            Err(e) => {
                let failed_after = progress.state();
                progress.advance(ChannelState::Skipped);
                error!(
                    channel = %creds.channel_id,
                    code = e.error_code(),
                    after = %failed_after,
                    "skipping channel: {}",
                    e
                );
                ChannelReport::skipped(&creds.channel_id, failed_after, &e)
            }
        }
    }

    fn pause(&self) -> Option<std::time::Duration> {
        let pause = self.config.channel_pause();
        (self.source.protocol() == KeyProtocol::Manifest && !pause.is_zero()).then_some(pause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentKey;
    use async_trait::async_trait;
    use std::time::{Duration, Instant};

    /// Hands out a fixed key for every channel except the ones listed as failing
    struct FixedSource {
        protocol: KeyProtocol,
        failing: Vec<&'static str>,
    }

    #[async_trait]
    impl KeySource for FixedSource {
        fn protocol(&self) -> KeyProtocol {
            self.protocol
        }

        async fn obtain_key(
            &self,
            creds: &ChannelCredentials,
            progress: &mut ChannelProgress,
        ) -> Result<ContentKey> {
            if self.failing.contains(&creds.channel_id.as_str()) {
                return Err(Error::Timeout {
                    url: "http://auth".into(),
                });
            }
            progress.advance(ChannelState::Authorized);
            progress.advance(ChannelState::KeyFetched);
            Ok(ContentKey::new(vec![7u8; 16]))
        }
    }

    fn grabber(failing: Vec<&'static str>) -> KeyGrabber {
        KeyGrabber::with_source(
            GrabConfig::default(),
            Box::new(FixedSource {
                protocol: KeyProtocol::Binary,
                failing,
            }),
        )
    }

    fn paced_grabber(pause_ms: u64) -> KeyGrabber {
        let config = GrabConfig {
            channel_pause_ms: pause_ms,
            ..Default::default()
        };
        KeyGrabber::with_source(
            config,
            Box::new(FixedSource {
                protocol: KeyProtocol::Manifest,
                failing: vec![],
            }),
        )
    }

    const INPUT: &str = "var channelKey = \"premium1\";\nvar authTs = \"1\";\nvar authRnd = \"2\";\nvar authSig = \"3\";\n\
var channelKey = \"premium2\";\nvar authTs = \"1\";\n\
var channelKey = \"premium3\";\nvar authTs = \"1\";\nvar authRnd = \"2\";\nvar authSig = \"3\";\n";

    #[tokio::test]
    async fn test_failures_are_contained() {
        let (store, report) = grabber(vec!["premium1"])
            .collect(credentials::parse_str(INPUT))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.get("premium3").is_some());
        assert_eq!(report.written, 1);
        assert_eq!(report.stored(), 1);
        assert_eq!(report.skipped_blocks, 1);

        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].channel_id, "premium1");
        assert_eq!(skipped[0].failed_after, Some(ChannelState::Parsed));
        assert_eq!(skipped[0].kind, Some(FailureKind::Transport));
        assert_eq!(skipped[0].error_code, Some("TIMEOUT"));
    }

    #[tokio::test]
    async fn test_binary_protocol_does_not_pause() {
        assert!(grabber(vec![]).pause().is_none());
    }

    #[tokio::test]
    async fn test_manifest_pauses_between_channels() {
        let input = format!("{}{}", INPUT, INPUT.replace("premium", "extra"));
        let started = Instant::now();
        let (_, report) = paced_grabber(100)
            .collect(credentials::parse_str(&input))
            .await
            .unwrap();

        // Four complete channels, three gaps between them
        assert_eq!(report.channels.len(), 4);
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_no_pause_before_first_channel() {
        let single = "var channelKey = \"premium1\";\nvar authTs = \"1\";\nvar authRnd = \"2\";\nvar authSig = \"3\";\n";
        let started = Instant::now();
        let (store, _) = paced_grabber(1_000)
            .collect(credentials::parse_str(single))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_report_serializes_without_empty_fields() {
        let (_, report) = grabber(vec![]).collect(credentials::parse_str(INPUT)).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["channels"][0]["state"], "stored");
        assert!(json["channels"][0].get("reason").is_none());
    }
}
