//! Renders records as log file lines.

use std::fmt::Write as _;

use crate::error::{HlogError, Result};
use crate::template::{CompiledTemplate, FieldKind};
use crate::types::LogRecord;

/// Formats records according to a [`CompiledTemplate`].
///
/// A record becomes one header line
/// `<stage spaces><marker><max_depth - stage spaces> <fields…>`; every further
/// line of a multi-line message follows verbatim without any prefix. No line
/// break is appended after the last line.
#[derive(Debug, Clone)]
pub struct LineCodec {
    template: CompiledTemplate,
}

impl LineCodec {
    /// Creates a codec for the template.
    #[must_use]
    pub const fn new(template: CompiledTemplate) -> Self {
        Self { template }
    }

    /// The template in use.
    #[must_use]
    pub const fn template(&self) -> &CompiledTemplate {
        &self.template
    }

    /// Formats a record.
    ///
    /// Records outside the hierarchy (stage `-1`) are written at stage 0.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::StageTooDeep`] if the record's stage exceeds the
    /// template's maximum depth.
    pub fn format(&self, record: &LogRecord) -> Result<String> {
        let stage = record.depth() as usize;
        let max_depth = self.template.max_depth();
        if stage > max_depth {
            return Err(HlogError::StageTooDeep {
                stage: record.hierarchy_stage(),
                max: max_depth,
            });
        }

        let mut line = String::with_capacity(64 + record.message().len());
        for field in self.template.fields() {
            match field.kind {
                FieldKind::Hierarchy => {
                    line.push_str(&" ".repeat(stage));
                    line.push_str(self.template.branch_marker());
                    line.push_str(&" ".repeat(max_depth - stage));
                }
                FieldKind::Time => {
                    let time = record.timestamp().format(self.template.date_format());
                    push_padded(&mut line, &time.to_string(), field.width);
                }
                FieldKind::Level => push_padded(&mut line, record.level_name(), field.width),
                FieldKind::Message => line.push_str(record.message()),
            }
            line.push_str(&field.tail);
        }
        Ok(line)
    }
}

fn push_padded(line: &mut String, value: &str, width: Option<i32>) {
    // Writing into a String cannot fail.
    let _ = match width {
        Some(width) if width < 0 => {
            write!(line, "{value:<w$}", w = width.unsigned_abs() as usize)
        }
        Some(width) => write!(line, "{value:>w$}", w = width as usize),
        None => write!(line, "{value}"),
    };
}
