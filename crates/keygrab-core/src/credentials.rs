//! Credential file parser
//!
//! The credentials file is a grep of the player page: four `var` declarations per
//! channel, in the order `channelKey`, `authTs`, `authRnd`, `authSig`.
//!
//! ```text
//! var channelKey = "premium51";
//! var authTs = "1749990000";
//! var authRnd = "83412";
//! var authSig = "9f2c...";
//! ```
//!
//! Parsing is tolerant. A block whose follow-up lines are missing or out of order
//! produces [`ParseOutcome::Skipped`] and scanning resumes on the very next line.

use crate::error::Result;
use crate::types::ChannelCredentials;
use regex::Regex;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::sync::OnceLock;

/// Result of looking at one candidate block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A complete four-line block
    Credentials(ChannelCredentials),
    /// A `channelKey` line whose next three lines did not all match
    Skipped {
        /// 1-based line number of the `channelKey` declaration
        line: usize,
        channel_id: String,
    },
}

struct Patterns {
    channel: Regex,
    timestamp: Regex,
    nonce: Regex,
    signature: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        channel: Regex::new(r#"^var channelKey\s*=\s*"([^"]+)""#).expect("valid regex"),
        timestamp: Regex::new(r#"var authTs\s*=\s*"([^"]+)""#).expect("valid regex"),
        nonce: Regex::new(r#"var authRnd\s*=\s*"([^"]+)""#).expect("valid regex"),
        signature: Regex::new(r#"var authSig\s*=\s*"([^"]+)""#).expect("valid regex"),
    })
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line).map(|c| c[1].to_string())
}

/// Lazy, single-pass iterator over the blocks of a credentials file
pub struct CredentialBlocks<R> {
    lines: Lines<R>,
    window: VecDeque<String>,
    /// Line number of `window[0]`
    line_no: usize,
    exhausted: bool,
}

impl<R: BufRead> CredentialBlocks<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            window: VecDeque::with_capacity(4),
            line_no: 1,
            exhausted: false,
        }
    }

    /// Keep only complete credential blocks
    pub fn credentials(self) -> impl Iterator<Item = Result<ChannelCredentials>> {
        self.filter_map(|outcome| match outcome {
            Ok(ParseOutcome::Credentials(creds)) => Some(Ok(creds)),
            Ok(ParseOutcome::Skipped { .. }) => None,
            Err(e) => Some(Err(e)),
        })
    }

    fn fill(&mut self, wanted: usize) -> Result<()> {
        while self.window.len() < wanted && !self.exhausted {
            match self.lines.next() {
                Some(Ok(line)) => self.window.push_back(line.trim().to_string()),
                Some(Err(e)) => {
                    self.exhausted = true;
                    return Err(e.into());
                }
                None => self.exhausted = true,
            }
        }
        Ok(())
    }

    fn advance(&mut self, count: usize) {
        self.window.drain(..count);
        self.line_no += count;
    }

    fn try_block(&self) -> Option<ChannelCredentials> {
        let p = patterns();
        let channel_id = capture(&p.channel, &self.window[0])?;
        if self.window.len() < 4 {
            return None;
        }
        Some(ChannelCredentials {
            channel_id,
            timestamp: capture(&p.timestamp, &self.window[1])?,
            nonce: capture(&p.nonce, &self.window[2])?,
            signature: capture(&p.signature, &self.window[3])?,
        })
    }

    fn next_outcome(&mut self) -> Result<Option<ParseOutcome>> {
        loop {
            self.fill(1)?;
            let Some(first) = self.window.front() else {
                return Ok(None);
            };

            let Some(channel_id) = capture(&patterns().channel, first) else {
                self.advance(1);
                continue;
            };

            self.fill(4)?;
            if let Some(creds) = self.try_block() {
                self.advance(4);
                return Ok(Some(ParseOutcome::Credentials(creds)));
            }

            let line = self.line_no;
            self.advance(1);
            return Ok(Some(ParseOutcome::Skipped { line, channel_id }));
        }
    }
}

impl<R: BufRead> Iterator for CredentialBlocks<R> {
    type Item = Result<ParseOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_outcome().transpose()
    }
}

/// Open a credentials file for parsing
pub fn open(path: &Path) -> Result<CredentialBlocks<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(CredentialBlocks::new(BufReader::new(file)))
}

/// Parse credentials from an in-memory string
pub fn parse_str(content: &str) -> CredentialBlocks<&[u8]> {
    CredentialBlocks::new(content.as_bytes())
}
