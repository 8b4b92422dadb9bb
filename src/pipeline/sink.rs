use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{RecorderError, Result};
use crate::location::ReconciledSample;
use crate::recording::Session;

/// First line of every session log
pub const LOG_HEADER: &str = "timestamp [ns],latitude,longitude";

const MAX_NAME_ATTEMPTS: usize = 1000;

/// Append-only CSV log for one recording session
///
/// Every `append` is a single buffered write followed by a flush, so lines
/// that made it through `append` survive the writer being dropped.
#[derive(Debug)]
pub struct SessionLogWriter {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    samples_written: usize,
}

impl SessionLogWriter {
    /// Create a new, uniquely named log for `session` inside `dir`
    pub fn open(dir: &Path, session: &Session) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let (file, path) = create_unique(dir, &session.log_file_stem())?;
        let mut writer = BufWriter::new(file);
        writer.write_all(LOG_HEADER.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        info!("Session log opened: {:?}", path);

        Ok(Self {
            writer: Some(writer),
            path,
            samples_written: 0,
        })
    }

    /// Write one line per sample and flush
    pub fn append(&mut self, batch: &[ReconciledSample]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(RecorderError::SinkClosed)?;

        let mut lines = String::with_capacity(batch.len() * 48);
        for sample in batch {
            lines.push_str(&sample.to_log_line());
            lines.push('\n');
        }

        writer.write_all(lines.as_bytes())?;
        writer.flush()?;
        self.samples_written += batch.len();

        debug!("Appended {} samples to {:?}", batch.len(), self.path);
        Ok(())
    }

    /// Flush, sync and release the file handle
    ///
    /// Closing twice is harmless; appending after close is `SinkClosed`.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
            info!(
                "Session log closed: {:?} ({} samples)",
                self.path, self.samples_written
            );
        }
        Ok(())
    }

    /// Sync a session log whose writer is already gone and count its data
    /// lines
    ///
    /// Used after the consumer was cancelled: its writer flushed on drop but
    /// never reached `close`.
    pub fn recover(path: &Path) -> Result<usize> {
        let file = OpenOptions::new().read(true).append(true).open(path)?;
        file.sync_all()?;

        let lines = BufReader::new(&file).lines().map_while(|l| l.ok()).count();
        Ok(lines.saturating_sub(1))
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn samples_written(&self) -> usize {
        self.samples_written
    }
}

impl Drop for SessionLogWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("Failed to flush session log on drop: {}", e);
            }
        }
    }
}

/// Create `<stem>.csv`, falling back to `<stem>_1.csv`, `<stem>_2.csv`, ...
fn create_unique(dir: &Path, stem: &str) -> Result<(File, PathBuf)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{}.csv", stem)
        } else {
            format!("{}_{}.csv", stem, attempt)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(RecorderError::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free log file name for {} in {:?}", stem, dir),
    )))
}
