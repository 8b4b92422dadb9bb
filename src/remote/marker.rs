use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::Result;

/// File remote markers are appended to, inside the output directory
pub const MARKER_FILE_NAME: &str = "gps_marker_events.txt";

/// Append `MARKER,<unix_ms>` to the marker file in `dir`
pub async fn append_marker(dir: &Path, timestamp_ms: i64) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(MARKER_FILE_NAME);

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await?;
    let line = format!("MARKER,{}\n", timestamp_ms);
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;

    info!("Marker saved: {}", line.trim_end());
    Ok(path)
}
