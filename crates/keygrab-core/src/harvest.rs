//! Credentials file harvesting
//!
//! Channel lists mention channels as `premium<number>`. For each one the player
//! page is fetched and its `var channelKey/authTs/authRnd/authSig` lines are
//! appended to the credentials file, ready for [`crate::credentials`].

use crate::error::Result;
use crate::http;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, instrument, warn};
use url::Url;

/// Declarations copied from the player page
pub const DECLARATIONS: [&str; 4] = [
    "var channelKey",
    "var authTs",
    "var authRnd",
    "var authSig",
];

fn channel_number() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(r"premium(\d+)").expect("valid regex"))
}

/// Numeric part of the first `premium<digits>` token on a line
pub fn extract_channel_number(line: &str) -> Option<&str> {
    channel_number()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Keep the credential declarations of a player page, trimmed, in page order
pub fn filter_declarations(page: &str) -> Vec<String> {
    page.lines()
        .filter(|line| DECLARATIONS.iter().any(|d| line.contains(d)))
        .map(|line| line.trim().to_string())
        .collect()
}

/// Counters for a harvest run
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestReport {
    /// Channel numbers found in the list files
    pub channels: usize,
    /// Player pages that could not be fetched
    pub failed: usize,
    /// Declaration lines written
    pub lines_written: usize,
    /// List files that did not exist
    pub missing_files: Vec<PathBuf>,
}

/// Scrapes player pages into a credentials file
pub struct Harvester {
    client: Client,
    page_url: Url,
}

impl Harvester {
    pub fn new(client: Client, page_url: Url) -> Self {
        Self { client, page_url }
    }

    /// `<player page>?id=<number>`
    pub fn page_url(&self, number: &str) -> Url {
        let mut url = self.page_url.clone();
        url.query_pairs_mut().append_pair("id", number);
        url
    }

    /// Fetch one player page and return its declaration lines
    #[instrument(skip(self))]
    pub async fn fetch_declarations(&self, number: &str) -> Result<Vec<String>> {
        let page = http::get_text(&self.client, &self.page_url(number)).await?;
        Ok(filter_declarations(&page))
    }

    /// Truncate `output`, then append the declarations of every channel in `lists`
    pub async fn harvest(&self, lists: &[PathBuf], output: &Path) -> Result<HarvestReport> {
        let mut out = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(output)?,
        );
        let mut report = HarvestReport::default();

        for list in lists {
            if !list.exists() {
                warn!(file = %list.display(), "channel list not found");
                report.missing_files.push(list.clone());
                continue;
            }

            for line in BufReader::new(File::open(list)?).lines() {
                let line = line?;
                let Some(number) = extract_channel_number(line.trim()) else {
                    continue;
                };
                report.channels += 1;

                match self.fetch_declarations(number).await {
                    Ok(lines) => {
                        for l in &lines {
                            writeln!(out, "{}", l)?;
                        }
                        report.lines_written += lines.len();
                    }
                    Err(e) => {
                        warn!(channel = number, "failed to fetch player page: {}", e);
                        report.failed += 1;
                    }
                }
            }
        }

        out.flush()?;
        info!(
            channels = report.channels,
            lines = report.lines_written,
            output = %output.display(),
            "harvest complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_channel_number() {
        assert_eq!(extract_channel_number("ESPN | premium44 | US"), Some("44"));
        assert_eq!(extract_channel_number("premium1 premium2"), Some("1"));
        assert_eq!(extract_channel_number("premiumtv"), None);
    }

    #[test]
    fn test_filter_declarations() {
        let page = "<html>\n<script>\n    var channelKey = \"premium44\";\n    var authTs = \"1\";\n    var other = 3;\n    var authRnd = \"2\";\n    var authSig = \"ab\";\n</script>";
        assert_eq!(
            filter_declarations(page),
            vec![
                "var channelKey = \"premium44\";",
                "var authTs = \"1\";",
                "var authRnd = \"2\";",
                "var authSig = \"ab\";",
            ]
        );
    }

    #[test]
    fn test_page_url() {
        let harvester = Harvester::new(
            Client::new(),
            Url::parse("https://lefttoplay.xyz/premiumtv/daddylivehd.php").unwrap(),
        );
        assert_eq!(
            harvester.page_url("44").as_str(),
            "https://lefttoplay.xyz/premiumtv/daddylivehd.php?id=44"
        );
    }
}
