//! CSV record writer.
//!
//! The output is a header line followed by one row per rate sample:
//!
//! ```text
//! date,input in bytes per second,output in bytes per second
//! 2024.05.01 12:00:01,1000,500
//! ```
//!
//! Timestamps are local time. Rates are truncated to whole bytes per second.
//! Every row is flushed as soon as it is written, so an interrupted run never
//! leaves a partial row behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::sampler::RateSample;

/// First line of every output file.
pub const HEADER: &str = "date,input in bytes per second,output in bytes per second";

/// `strftime` layout of the date column.
pub const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Format one data row, including its trailing newline. Pure.
pub fn format_row(sample: &RateSample) -> String {
    format!(
        "{},{},{}\n",
        sample.timestamp.format(TIMESTAMP_FORMAT),
        whole_bytes(sample.inbound_rate),
        whole_bytes(sample.outbound_rate),
    )
}

/// Truncate a rate to an integer. NaN and negatives become 0.
fn whole_bytes(rate: f64) -> u64 {
    rate as u64
}

/// Appends rows to an already-open output stream.
pub struct RecordWriter<W: Write> {
    out: BufWriter<W>,
    label: String,
    rows_written: u64,
}

impl RecordWriter<File> {
    /// Create (or truncate) `path` and write the header.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .map_err(|e| Error::io(format!("create output file '{}'", path.display()), e))?;
        Self::new(file, path.display().to_string())
    }
}

impl<W: Write> RecordWriter<W> {
    /// Wrap `inner` and write the header. `label` names the stream in errors.
    pub fn new(inner: W, label: impl Into<String>) -> Result<Self> {
        let mut writer = Self {
            out: BufWriter::new(inner),
            label: label.into(),
            rows_written: 0,
        };
        let header = format!("{HEADER}\n");
        writer.write_flushed(&header, "write header to")?;
        Ok(writer)
    }

    /// Append a pre-formatted row.
    pub fn append_row(&mut self, row: &str) -> Result<()> {
        self.write_flushed(row, "write row to")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Format and append a rate sample.
    pub fn append(&mut self, sample: &RateSample) -> Result<()> {
        self.append_row(&format_row(sample))
    }

    /// Data rows written so far (the header is not counted).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and hand back the underlying stream.
    pub fn finish(mut self) -> Result<W> {
        self.out
            .flush()
            .map_err(|e| Error::io(format!("flush '{}'", self.label), e))?;
        self.out
            .into_inner()
            .map_err(|e| Error::io(format!("close '{}'", self.label), e.into_error()))
    }

    fn write_flushed(&mut self, text: &str, action: &str) -> Result<()> {
        self.out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|e| Error::io(format!("{action} '{}'", self.label), e))
    }
}
