// src/storage/output.rs

//! Line-delimited JSON output files.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::models::IssueRecord;

/// Appends normalized records to a JSONL file, one object per line.
///
/// UTF-8 is written unescaped; lines are flushed individually so that
/// every returned `Ok` is durable in the file.
#[derive(Debug)]
pub struct JsonlWriter {
    file: File,
}

impl JsonlWriter {
    /// Open an output file, creating parent directories as needed.
    ///
    /// With `append` false the file is truncated instead.
    pub fn open(path: impl AsRef<Path>, append: bool) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(append)
            .write(true)
            .truncate(!append)
            .open(path)?;
        Ok(Self { file })
    }

    /// Serialize one record and append it as a single line.
    pub fn write_record(&mut self, record: &IssueRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        Ok(())
    }
}
