//! Utility functions for time handling, string manipulation, and file system operations.
//!
//! - Clock helpers pinned to the São Paulo offset used for all dated filenames
//! - Character-safe truncation for logging and for report excerpts
//! - File system validation for output directories

use chrono::{DateTime, FixedOffset, Utc};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Name recorded in summaries for the fixed offset below.
pub const TIMEZONE_NAME: &str = "America/Sao_Paulo";

/// UTC−03:00. Brazil has not observed daylight saving time since 2019.
pub fn sao_paulo_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).expect("3h is a valid UTC offset")
}

/// Current wall-clock time in São Paulo.
pub fn now_sao_paulo() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&sao_paulo_offset())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and the
/// number of dropped bytes appended. Cuts always land on a character
/// boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep the first `max` characters of `s`, appending `"..."` when anything
/// was dropped.
pub fn excerpt(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...", &s[..cut]),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a scratch file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let scratch_path = path.join("..__write_check__");
    stdfs::File::create(&scratch_path)?;
    let _ = stdfs::remove_file(&scratch_path);
    info!("Output directory is writable");
    Ok(())
}
