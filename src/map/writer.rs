use crate::json;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

/// Writes mapped records as JSON Lines, one record per line
pub struct RecordWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        RecordWriter { writer, written: 0 }
    }

    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let line = json::serialize(record).context("Failed to serialize record")?;
        writeln!(self.writer, "{}", line).context("Failed to write record")?;
        self.written += 1;
        Ok(())
    }

    pub fn write_records<'a, T: Serialize + 'a>(&mut self, records: impl IntoIterator<Item = &'a T>) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}
