// =============================================================================
// Snapshot Dump — write one raw quote payload to disk
// =============================================================================
//
// Backs the `snapshot` command: the payload is pretty-printed as UTF-8 JSON
// (Korean text kept as-is) into `stock_data_<item>_<YYYYmmdd_HHMMSS>.json`.
// Uses an atomic tmp + rename write so a crash never leaves a half file.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use tracing::info;

/// Number of characters logged as a preview after writing.
pub const PREVIEW_CHARS: usize = 500;

/// File name for a snapshot of `item_code` taken at `at`.
pub fn snapshot_file_name<Tz: TimeZone>(item_code: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("stock_data_{}_{}.json", item_code, at.format("%Y%m%d_%H%M%S"))
}

/// Write `payload` into `dir` and return the final path.
pub fn write_snapshot<Tz: TimeZone>(
    dir: impl AsRef<Path>,
    item_code: &str,
    at: &DateTime<Tz>,
    payload: &serde_json::Value,
) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let dir = dir.as_ref();
    let path = dir.join(snapshot_file_name(item_code, at));

    let content =
        serde_json::to_string_pretty(payload).context("failed to serialise quote payload")?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, &path)
        .with_context(|| format!("failed to rename snapshot to {}", path.display()))?;

    info!(
        path = %path.display(),
        preview = %preview(&content),
        "quote snapshot saved"
    );
    Ok(path)
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}
