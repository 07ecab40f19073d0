//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use chrono::{DateTime, Local};
use hlog::LogRecord;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Timestamp layout used in table output.
const TABLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write one value per line: compact JSON or a table row.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_line<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        writer.flush()?;
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// One record placed in the tree.
#[derive(Debug, Clone, Serialize)]
pub struct RecordRow {
    /// Absolute record index.
    pub index: u64,
    /// Indentation depth.
    pub depth: u32,
    /// Record timestamp.
    pub timestamp: DateTime<Local>,
    /// Level name.
    pub level: String,
    /// Full message.
    pub message: String,
    /// Most severe level among the record's descendants, when it is more
    /// severe than the record's own level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_below: Option<String>,
}

impl RecordRow {
    /// Builds a row for `record` drawn at `depth`.
    #[must_use]
    pub fn new(record: &LogRecord, depth: u32) -> Self {
        Self {
            index: record.index(),
            depth,
            timestamp: record.timestamp(),
            level: record.level_name().to_string(),
            message: record.message().to_string(),
            worst_below: None,
        }
    }

    /// Sets the rolled-up level shown next to the row.
    #[must_use]
    pub fn with_worst_below(mut self, level: Option<String>) -> Self {
        self.worst_below = level;
        self
    }
}

impl TableDisplay for RecordRow {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let indent = "  ".repeat(self.depth as usize);
        let mut lines = self.message.lines();
        write!(
            writer,
            "{indent}{} {:<8} {}",
            self.timestamp.format(TABLE_TIME_FORMAT),
            self.level,
            lines.next().unwrap_or_default()
        )?;
        if let Some(worst) = &self.worst_below {
            write!(writer, "  [{worst} below]")?;
        }
        writeln!(writer)?;
        for line in lines {
            writeln!(writer, "{indent}    {line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(message: &str, depth: u32) -> RecordRow {
        RecordRow {
            index: 7,
            depth,
            timestamp: Local
                .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
                .earliest()
                .expect("valid local time"),
            level: "INFO".to_string(),
            message: message.to_string(),
            worst_below: None,
        }
    }

    fn table(value: &RecordRow) -> String {
        let mut buf = Vec::new();
        OutputFormat::default().write(&mut buf, value).expect("format");
        String::from_utf8(buf).expect("utf-8 output")
    }

    #[test]
    fn row_table_indents_by_depth() {
        let out = table(&row("hello", 2));
        assert_eq!(out, "    2024-03-09 14:05:07 INFO     hello\n");
    }

    #[test]
    fn row_table_continuation_lines() {
        let out = table(&row("first\nsecond", 0));
        assert_eq!(out, "2024-03-09 14:05:07 INFO     first\n    second\n");
    }

    #[test]
    fn row_table_worst_below() {
        let row = row("parent", 0).with_worst_below(Some("ERROR".to_string()));
        let out = table(&row);
        assert!(out.ends_with("parent  [ERROR below]\n"));
    }

    #[test]
    fn row_json_omits_missing_roll_up() {
        let format = OutputFormat::new(Format::Json);
        let mut buf = Vec::new();
        format.write_line(&mut buf, &row("hi", 1)).expect("format");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("valid JSON");
        assert_eq!(value["index"], 7);
        assert_eq!(value["depth"], 1);
        assert_eq!(value["message"], "hi");
        assert!(value.get("worst_below").is_none());
    }
}
