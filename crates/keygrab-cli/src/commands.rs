//! CLI command implementations

use crate::output::{is_json, timestamp, to_json};
use keygrab_core::{
    auth::auth_url,
    credentials,
    http::{build_client_for, RequestProfile},
    probe::{probe_url, read_url_list},
    ContentKey, GrabConfig, Harvester, KeyGrabber, KeyStore, ParseOutcome, KEY_LENGTH,
};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Run the key grab pipeline
pub async fn grab(config: GrabConfig, format: &str) -> anyhow::Result<()> {
    let grabber = KeyGrabber::new(config)?;
    let report = grabber.run().await?;

    if is_json(format) {
        println!("{}", to_json(&report));
        return Ok(());
    }

    let skipped = report.skipped().count();
    if skipped > 0 || report.skipped_blocks > 0 {
        println!(
            "Skipped {} channel(s) and {} incomplete credential block(s)",
            skipped, report.skipped_blocks
        );
    }
    println!(
        "Wrote {} entries to {}",
        report.written,
        grabber.config().output_path.display()
    );

    Ok(())
}

/// Write the authorization URL of every credential block to a file
pub fn urls(config: &GrabConfig, to: &Path, format: &str) -> anyhow::Result<()> {
    let mut generated = Vec::new();

    for outcome in credentials::open(&config.input_path)? {
        match outcome? {
            ParseOutcome::Credentials(creds) => {
                generated.push(auth_url(&config.auth_base_url, &creds).to_string());
            }
            ParseOutcome::Skipped { line, channel_id } => {
                tracing::warn!(
                    line,
                    channel = %channel_id,
                    "incomplete auth data block, skipping"
                );
            }
        }
    }

    if generated.is_empty() {
        println!(
            "No auth URLs generated. Check the contents of '{}'.",
            config.input_path.display()
        );
        return Ok(());
    }

    let mut file = std::io::BufWriter::new(std::fs::File::create(to)?);
    for url in &generated {
        writeln!(file, "{}", url)?;
    }
    file.flush()?;

    if is_json(format) {
        println!("{}", to_json(&generated));
    } else {
        println!(
            "Generated {} auth URLs and saved them to '{}'",
            generated.len(),
            to.display()
        );
    }

    Ok(())
}

/// HEAD every URL in a list file
pub async fn probe(config: &GrabConfig, list: &Path, format: &str) -> anyhow::Result<()> {
    let urls = read_url_list(list)?;
    if urls.is_empty() {
        println!("No URLs found in '{}'", list.display());
        return Ok(());
    }

    let client = build_client_for(config, RequestProfile::Probe)?;
    let json = is_json(format);
    let mut results = Vec::with_capacity(urls.len());

    for url in &urls {
        let result = probe_url(&client, url).await;
        if !json {
            match (result.status, &result.error) {
                (Some(status), _) => println!("[{}] SUCCESS {} {}", timestamp(), status, url),
                (None, Some(err)) => println!("[{}] FAILED {} ({})", timestamp(), url, err),
                (None, None) => println!("[{}] FAILED {}", timestamp(), url),
            }
        }
        results.push(result);
    }

    if json {
        println!("{}", to_json(&results));
    } else {
        let responded = results.iter().filter(|r| r.responded()).count();
        let success = results.iter().filter(|r| r.is_success()).count();
        println!(
            "\nProbed {} URLs: {} responded, {} with 2xx, {} failed",
            results.len(),
            responded,
            success,
            results.len() - responded
        );
    }

    Ok(())
}

/// Build the credentials file from channel lists
pub async fn harvest(config: &GrabConfig, lists: &[PathBuf], format: &str) -> anyhow::Result<()> {
    let client = build_client_for(config, RequestProfile::Harvest)?;
    let harvester = Harvester::new(client, config.player_page_url.clone());
    let report = harvester.harvest(lists, &config.input_path).await?;

    if is_json(format) {
        println!("{}", to_json(&report));
    } else {
        for missing in &report.missing_files {
            println!("File {} not found.", missing.display());
        }
        println!(
            "Harvested {} channels ({} failed), {} lines written to {}",
            report.channels,
            report.failed,
            report.lines_written,
            config.input_path.display()
        );
    }

    Ok(())
}

/// Print every key of a mapping file as hex
pub fn decode(file: &Path, format: &str) -> anyhow::Result<()> {
    let store = KeyStore::load(file)?;
    let mut decoded = serde_json::Map::new();
    let mut invalid = 0usize;

    for (channel, encoded) in store.iter() {
        match ContentKey::from_base64(encoded) {
            Ok(key) if key.len() == KEY_LENGTH => {
                decoded.insert(channel.to_string(), key.to_hex().into());
            }
            Ok(key) => {
                invalid += 1;
                eprintln!("{}: expected {} bytes, got {}", channel, KEY_LENGTH, key.len());
            }
            Err(e) => {
                invalid += 1;
                eprintln!("{}: {}", channel, e);
            }
        }
    }

    if is_json(format) {
        println!("{}", to_json(&decoded));
    } else {
        for (channel, key) in &decoded {
            println!("{:<24} {}", channel, key.as_str().unwrap_or_default());
        }
        println!("\n{} valid, {} invalid", decoded.len(), invalid);
    }

    Ok(())
}
