use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;

use crate::tweet::Tweet;

/// `{handle}_tweets_{YYYYMMDD_HHMMSS}.json`, local time.
pub fn output_filename(handle: &str, now: DateTime<Local>) -> String {
    format!("{}_tweets_{}.json", handle, now.format("%Y%m%d_%H%M%S"))
}

/// Write the whole run as one pretty-printed JSON array in a single write.
/// Absent referenced fields are omitted by the `Tweet` serializer, never
/// emitted as null.
pub fn write_tweets(tweets: &[Tweet], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(tweets).context("failed to serialize tweets")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
