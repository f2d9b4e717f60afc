//! Channel → key mapping and its JSON file

use crate::error::Result;
use crate::types::ContentKey;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Accumulated channel keys, base64-encoded, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyStore {
    entries: Map<String, Value>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key; a repeated channel keeps its first position and takes the new value
    pub fn insert(&mut self, channel_id: &str, key: &ContentKey) {
        if self
            .entries
            .insert(channel_id.to_string(), Value::String(key.to_base64()))
            .is_some()
        {
            debug!(channel = channel_id, "replacing earlier key");
        }
    }

    pub fn get(&self, channel_id: &str) -> Option<&str> {
        self.entries.get(channel_id).and_then(Value::as_str)
    }

    /// Decoded key for a channel
    pub fn key(&self, channel_id: &str) -> Option<Result<ContentKey>> {
        self.get(channel_id).map(ContentKey::from_base64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.as_str(), v)))
    }

    /// Pretty JSON with two-space indentation, ASCII only
    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        Ok(escape_non_ascii(&json))
    }

    /// Overwrite `path` with the mapping
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a mapping written by [`KeyStore::write`]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Map<String, Value> = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }
}

/// Replace every non-ASCII character with `\uXXXX` escapes (surrogate pairs above U+FFFF).
///
/// serde_json only emits non-ASCII inside string literals, so the result is the same
/// JSON document.
fn escape_non_ascii(json: &str) -> String {
    if json.is_ascii() {
        return json.to_string();
    }

    let mut out = String::with_capacity(json.len() + 16);
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        for unit in c.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{:04x}", unit));
        }
    }
    out
}
