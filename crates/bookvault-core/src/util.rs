//! Shared utility functions used across multiple modules.

use std::io;
use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Truncate text to at most 180 characters for log lines.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Replace `path` with `bytes` through a synced temp file and a rename.
///
/// Readers see either the previous file or the complete new one. The temp
/// file is removed when any step fails.
pub async fn atomic_write(path: &Path, tmp: &Path, bytes: &[u8]) -> io::Result<()> {
    let written = async {
        let mut file = fs::File::create(tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(tmp, path).await
    }
    .await;

    if written.is_err() {
        fs::remove_file(tmp).await.ok();
    }
    written
}
