//! keygrab core - per-channel stream key retrieval
//!
//! This crate provides the pieces of the key grab pipeline:
//! - Credential file parsing (tolerant, single pass)
//! - Authorization endpoint client
//! - Channel playlist `#EXT-X-KEY` resolution
//! - Key download with length checks
//! - Channel → key mapping written as JSON
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         KeyGrabber                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐      ┌───────────────────────────────┐       │
//! │  │  Credential  │      │          KeySource            │       │
//! │  │    Parser    │─────►│  Binary  │  Manifest          │       │
//! │  └──────────────┘      │  auth    │  auth → playlist   │       │
//! │                        │          │  → key URI → key   │       │
//! │                        └──────────────┬────────────────┘       │
//! │                                       │                        │
//! │                                ┌──────┴──────┐                 │
//! │                                │  KeyStore   │──► channelKeys  │
//! │                                └─────────────┘      .json      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod harvest;
pub mod http;
pub mod key;
pub mod manifest;
pub mod pipeline;
pub mod probe;
pub mod source;
pub mod store;
pub mod types;

pub use auth::{AuthAck, AuthClient};
pub use config::{GrabConfig, KeyLengthPolicy, KeyProtocol};
pub use credentials::{CredentialBlocks, ParseOutcome};
pub use error::{Error, FailureKind, Result};
pub use harvest::{HarvestReport, Harvester};
pub use key::KeyFetcher;
pub use manifest::PlaylistResolver;
pub use pipeline::{ChannelReport, KeyGrabber, RunReport};
pub use http::RequestProfile;
pub use probe::ProbeResult;
pub use source::{create_key_source, ChannelProgress, KeySource};
pub use store::KeyStore;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
