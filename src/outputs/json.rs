//! JSON file output shared by the collector and the curator.
//!
//! Every artifact the pipeline persists (snapshots, the collection summary,
//! curated analyses) goes through [`write_json`], so they all share the same
//! layout: pretty-printed, UTF-8 kept verbatim, parent directories created
//! on demand.
//!
//! # Output Structure
//!
//! ```text
//! data/bruto/
//! ├── daily/
//! │   ├── eventos_hoje_20250506.json
//! │   └── noticias_brutas_ultimas_24h_20250506.json
//! ├── archive/
//! │   └── eventos_hoje_20250428.json
//! └── collection_summary_20250506.json
//!
//! data/curado/
//! ├── noticias_curadas_curado_20250506_0930.json
//! └── resumo_executivo_curado_20250506_0930.json
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info, instrument};

/// Serialize `value` as pretty JSON and write it to `path`.
///
/// Existing files are overwritten; callers choose filenames so that a rerun
/// on the same day replaces rather than duplicates.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!("Wrote JSON file");
    Ok(())
}

/// Read and deserialize a JSON file written by [`write_json`].
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    let value = serde_json::from_str(&text)?;
    debug!(bytes = text.len(), "Read JSON file");
    Ok(value)
}
