//! Writes records to a log file as they are inserted.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::codec::LineCodec;
use crate::error::Result;
use crate::traits::RecordObserver;
use crate::types::LogRecord;

/// Appends formatted records to a file.
///
/// Subscribe it to a [`RecordStore`](crate::store::RecordStore) to persist
/// every record the store accepts. Each record is flushed on write so that a
/// concurrent [`LogFileReader`](crate::parser::LogFileReader) sees complete
/// lines.
#[derive(Debug)]
pub struct FileSink {
    codec: LineCodec,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Creates or truncates the file at `path`.
    pub fn create(path: impl Into<PathBuf>, codec: LineCodec) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path)?;
        debug!(path = %path.display(), "created log file");
        Ok(Self::from_file(path, file, codec))
    }

    /// Opens the file at `path` for appending, creating it if needed.
    pub fn append(path: impl Into<PathBuf>, codec: LineCodec) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "opened log file for append");
        Ok(Self::from_file(path, file, codec))
    }

    fn from_file(path: PathBuf, file: File, codec: LineCodec) -> Self {
        Self {
            codec,
            path,
            writer: Mutex::new(BufWriter::new(file)),
        }
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The codec records are formatted with.
    #[must_use]
    pub const fn codec(&self) -> &LineCodec {
        &self.codec
    }

    /// Formats and writes one record followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns formatting errors such as
    /// [`HlogError::StageTooDeep`](crate::HlogError::StageTooDeep), and I/O
    /// errors.
    pub fn write_record(&self, record: &LogRecord) -> Result<()> {
        let line = self.codec.format(record)?;
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Flushes buffered output.
    pub fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

impl RecordObserver for FileSink {
    fn on_inserted(&self, record: &LogRecord) {
        if let Err(e) = self.write_record(record) {
            warn!(
                path = %self.path.display(),
                index = record.index(),
                error = %e,
                "failed to write log record"
            );
        }
    }
}
