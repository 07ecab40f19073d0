//! Reads formatted log files back into records.
//!
//! This module provides:
//! - [`LineParser`] — Decodes single lines and streams of lines
//! - [`LogFileReader`] — Replays a log file into a [`RecordStore`](crate::store::RecordStore)
//! - [`ReaderConfig`] — End-of-input behavior for incremental reads
//!
//! Each template field gets a field parser that consumes its part of a line
//! and reports either a value or absence. A line carrying the hierarchy
//! marker starts a new record; a line without it continues the message of
//! the record before it.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use tracing::{debug, trace};

use crate::error::{HlogError, Result};
use crate::level::LevelFilter;
use crate::logger::HierarchicalLogger;
use crate::template::{CompiledTemplate, FieldKind, TemplateField};
use crate::types::{LogRecord, StandardLevel};

/// Options for [`LineParser::read_from`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Whether the record still buffered at end of input is emitted.
    ///
    /// When `false`, that record is held back and the returned offset points
    /// at its header, so a later read picks it up together with any
    /// continuation lines written in the meantime. A final line without a
    /// line terminator is then left unread as well.
    pub finalize_at_eof: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            finalize_at_eof: true,
        }
    }
}

impl ReaderConfig {
    /// Config for following a file that is still being written.
    #[must_use]
    pub const fn follow() -> Self {
        Self {
            finalize_at_eof: false,
        }
    }
}

/// Fields recovered from one line. Absent fields failed to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLine {
    /// Stage encoded by the marker indentation.
    pub hierarchy_stage: Option<u32>,
    /// Parsed timestamp.
    pub timestamp: Option<DateTime<Local>>,
    /// Level name.
    pub level_name: Option<String>,
    /// Message text on this line.
    pub message: Option<String>,
}

impl ParsedLine {
    fn has(&self, kind: FieldKind) -> bool {
        match kind {
            FieldKind::Hierarchy => self.hierarchy_stage.is_some(),
            FieldKind::Time => self.timestamp.is_some(),
            FieldKind::Level => self.level_name.is_some(),
            FieldKind::Message => self.message.is_some(),
        }
    }
}

/// How a line fits into the record stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    /// Marker and every header field present: starts a new record.
    Header,
    /// Marker present but the named field failed to parse.
    MalformedHeader(FieldKind),
    /// No marker: another line of the previous record's message.
    Continuation,
    /// Neither a header nor a continuation.
    Unrecognized,
}

/// A record reassembled from a header line and its continuation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    /// Hierarchy stage from the marker indentation.
    pub hierarchy_stage: u32,
    /// Timestamp, if the template has a time field.
    pub timestamp: Option<DateTime<Local>>,
    /// Level name, if the template has a level field.
    pub level_name: Option<String>,
    /// Full message, continuation lines joined with `\n`.
    pub message: String,
    /// Line number of the header, counted from the read start offset.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldValue {
    Stage(u32),
    Time(DateTime<Local>),
    Level(String),
    Message(String),
}

/// Decodes lines written with the same [`CompiledTemplate`].
#[derive(Debug, Clone)]
pub struct LineParser {
    template: CompiledTemplate,
    config: ReaderConfig,
}

impl LineParser {
    /// Creates a parser with the default [`ReaderConfig`].
    #[must_use]
    pub fn new(template: CompiledTemplate) -> Self {
        Self::with_config(template, ReaderConfig::default())
    }

    /// Creates a parser with explicit reader options.
    #[must_use]
    pub const fn with_config(template: CompiledTemplate, config: ReaderConfig) -> Self {
        Self { template, config }
    }

    /// The template in use.
    #[must_use]
    pub const fn template(&self) -> &CompiledTemplate {
        &self.template
    }

    /// Parses one line without its terminator.
    ///
    /// Field parsers run in template order. A field that fails is left
    /// absent and the next field starts where the failed one started. A line
    /// without the marker is never a header, so its whole text is reported
    /// as the message.
    #[must_use]
    pub fn parse_line(&self, line: &str) -> ParsedLine {
        let mut parsed = ParsedLine::default();
        let mut cursor = 0;

        for field in self.template.fields() {
            let Some((value, next)) = self.try_parse(field, line, cursor) else {
                if field.kind == FieldKind::Hierarchy {
                    parsed.message = Some(line.to_string());
                    return parsed;
                }
                trace!(field = %field.kind, cursor, "field absent");
                continue;
            };
            cursor = next;
            match value {
                FieldValue::Stage(stage) => parsed.hierarchy_stage = Some(stage),
                FieldValue::Time(time) => parsed.timestamp = Some(time),
                FieldValue::Level(level) => parsed.level_name = Some(level),
                FieldValue::Message(message) => parsed.message = Some(message),
            }
        }
        parsed
    }

    /// Classifies a parsed line.
    #[must_use]
    pub fn classify(&self, parsed: &ParsedLine) -> LineShape {
        let missing = self
            .template
            .fields()
            .iter()
            .map(|field| field.kind)
            .find(|kind| !parsed.has(*kind));

        match (parsed.hierarchy_stage.is_some(), missing, parsed.message.is_some()) {
            (true, None, _) => LineShape::Header,
            (true, Some(kind), _) => LineShape::MalformedHeader(kind),
            (false, _, true) => LineShape::Continuation,
            (false, _, false) => LineShape::Unrecognized,
        }
    }

    /// Reads records from `reader`, starting at byte `start_offset`.
    ///
    /// `on_record` receives each record once it is complete, that is when
    /// the next header arrives or input ends. Returns the offset just past
    /// the last record handed to `on_record`; pass it back as
    /// `start_offset` to continue reading a growing file. In follow mode a
    /// final line without a line terminator is left unread; otherwise it is
    /// parsed like any other line.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::Parse`] for a malformed header or a continuation
    /// line with no record before it, I/O errors, and any error returned by
    /// `on_record`.
    pub fn read_from<R, F>(&self, mut reader: R, start_offset: u64, mut on_record: F) -> Result<u64>
    where
        R: BufRead + Seek,
        F: FnMut(ParsedRecord) -> Result<()>,
    {
        // A previous read may have consumed a final line before its
        // terminator was written; that terminator is not a line of its own.
        let mut after_unterminated = false;
        if let Some(prev) = start_offset.checked_sub(1) {
            reader.seek(SeekFrom::Start(prev))?;
            let mut byte = [0_u8; 1];
            after_unterminated = reader.read(&mut byte)? == 1 && byte[0] != b'\n';
        } else {
            reader.seek(SeekFrom::Start(start_offset))?;
        }

        let mut offset = start_offset;
        let mut resume_offset = start_offset;
        let mut pending: Option<ParsedRecord> = None;
        let mut buf = String::new();
        let mut line_no = 0;

        loop {
            buf.clear();
            let read = reader.read_line(&mut buf)?;
            if read == 0 {
                break;
            }
            if !buf.ends_with('\n') && !self.config.finalize_at_eof {
                trace!(offset, "leaving unterminated line for the next read");
                break;
            }
            if std::mem::take(&mut after_unterminated) && (buf == "\n" || buf == "\r\n") {
                offset += read as u64;
                resume_offset = offset;
                continue;
            }
            line_no += 1;

            let line = buf.trim_end_matches('\n');
            let line = line.strip_suffix('\r').unwrap_or(line);
            let parsed = self.parse_line(line);

            match self.classify(&parsed) {
                LineShape::Header => {
                    if let Some(record) = pending.take() {
                        on_record(record)?;
                        resume_offset = offset;
                    }
                    pending = Some(ParsedRecord {
                        hierarchy_stage: parsed.hierarchy_stage.unwrap_or_default(),
                        timestamp: parsed.timestamp,
                        level_name: parsed.level_name,
                        message: parsed.message.unwrap_or_default(),
                        line: line_no,
                    });
                }
                LineShape::Continuation => {
                    let Some(record) = pending.as_mut() else {
                        return Err(HlogError::Parse {
                            line: line_no,
                            message: "continuation line without a preceding record".to_string(),
                        });
                    };
                    record.message.push('\n');
                    record.message.push_str(parsed.message.as_deref().unwrap_or_default());
                }
                LineShape::MalformedHeader(kind) => {
                    return Err(HlogError::Parse {
                        line: line_no,
                        message: format!("record header has no valid {kind} field"),
                    });
                }
                LineShape::Unrecognized => {
                    return Err(HlogError::Parse {
                        line: line_no,
                        message: "line is neither a record header nor a continuation".to_string(),
                    });
                }
            }

            offset += read as u64;
        }

        if let Some(record) = pending {
            if self.config.finalize_at_eof {
                on_record(record)?;
                resume_offset = offset;
            } else {
                trace!(line = record.line, "holding back trailing record");
            }
        }

        debug!(start_offset, resume_offset, lines = line_no, "read log lines");
        Ok(resume_offset)
    }

    fn try_parse(&self, field: &TemplateField, line: &str, cursor: usize) -> Option<(FieldValue, usize)> {
        let rest = line.get(cursor..)?;
        let (value, used) = match field.kind {
            FieldKind::Hierarchy => self.parse_hierarchy(field, rest)?,
            FieldKind::Time => self.parse_time(field, rest)?,
            FieldKind::Level => parse_level(field, rest)?,
            FieldKind::Message => (FieldValue::Message(rest.to_string()), rest.len()),
        };
        Some((value, cursor + used))
    }

    fn parse_hierarchy(&self, field: &TemplateField, rest: &str) -> Option<(FieldValue, usize)> {
        let marker = self.template.branch_marker();
        let width = usize::try_from(field.width?).ok()?;
        let marker_width = marker.chars().count();

        let stage = count_spaces(rest);
        if stage + marker_width > width {
            return None;
        }
        let after_marker = rest[stage..].strip_prefix(marker)?;
        let padding = width - stage - marker_width;
        if count_spaces(after_marker.get(..padding)?) != padding {
            return None;
        }
        let tail = after_marker[padding..].strip_prefix(field.tail.as_str())?;

        let used = rest.len() - tail.len();
        Some((FieldValue::Stage(u32::try_from(stage).ok()?), used))
    }

    fn parse_time(&self, field: &TemplateField, rest: &str) -> Option<(FieldValue, usize)> {
        let skipped = count_spaces(rest);
        let value_start = &rest[skipped..];
        let value_len = value_start
            .char_indices()
            .nth(self.template.time_width())
            .map_or(value_start.len(), |(at, _)| at);
        if value_start[..value_len].chars().count() != self.template.time_width() {
            return None;
        }

        let time = parse_timestamp(&value_start[..value_len], self.template.date_format())?;
        let tail = consume_tail(&value_start[value_len..], &field.tail)?;
        Some((FieldValue::Time(time), skipped + value_len + tail))
    }
}

fn parse_level(field: &TemplateField, rest: &str) -> Option<(FieldValue, usize)> {
    let skipped = count_spaces(rest);
    let value_start = &rest[skipped..];
    let value_len = value_start
        .find(char::is_whitespace)
        .unwrap_or(value_start.len());
    let value = &value_start[..value_len];
    // The level is immediately followed by its tail when that tail is not
    // whitespace-led, e.g. "[%(levelname)s]".
    let value = match field.tail.chars().next() {
        Some(first) if first != ' ' => value.split(first).next().unwrap_or(value),
        _ => value,
    };
    if value.is_empty() {
        return None;
    }

    let tail = consume_tail(&value_start[value.len()..], &field.tail)?;
    Some((
        FieldValue::Level(value.to_string()),
        skipped + value.len() + tail,
    ))
}

/// Length of the run of leading ASCII spaces.
fn count_spaces(text: &str) -> usize {
    text.len() - text.trim_start_matches(' ').len()
}

/// Matches a field's tail, tolerating extra padding spaces before it.
fn consume_tail(rest: &str, tail: &str) -> Option<usize> {
    if rest.starts_with(tail) {
        return Some(tail.len());
    }
    let padding = count_spaces(rest);
    let trimmed_tail = tail.trim_start_matches(' ');
    if padding >= tail.len() - trimmed_tail.len() && rest[padding..].starts_with(trimmed_tail) {
        return Some(padding + trimmed_tail.len());
    }
    None
}

/// Parses a timestamp, accepting formats that carry only a date or only a
/// time of day.
fn parse_timestamp(text: &str, date_format: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(text, date_format)
        .or_else(|_| {
            NaiveTime::parse_from_str(text, date_format)
                .map(|time| Local::now().date_naive().and_time(time))
        })
        .or_else(|_| {
            NaiveDate::parse_from_str(text, date_format)
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Replays a log file into a [`RecordStore`](crate::store::RecordStore)
/// through a registered logger.
///
/// For every record read, the logger's stage in the
/// [`HierarchyTracker`](crate::hierarchy::HierarchyTracker) is set to the
/// record's stage before the record is emitted, so replayed records carry
/// the nesting they were written with.
#[derive(Debug)]
pub struct LogFileReader<'a> {
    parser: LineParser,
    logger: HierarchicalLogger<'a>,
    levels: &'a LevelFilter,
}

impl<'a> LogFileReader<'a> {
    /// Creates a reader emitting through `logger`, resolving level values
    /// from `levels`.
    #[must_use]
    pub const fn new(
        parser: LineParser,
        logger: HierarchicalLogger<'a>,
        levels: &'a LevelFilter,
    ) -> Self {
        Self {
            parser,
            logger,
            levels,
        }
    }

    /// The underlying parser.
    #[must_use]
    pub const fn parser(&self) -> &LineParser {
        &self.parser
    }

    /// Reads `path` from `start_offset` and replays every complete record.
    ///
    /// Returns the offset to pass as `start_offset` on the next call.
    ///
    /// # Errors
    ///
    /// Returns I/O and parse errors, [`HlogError::UnknownLevel`] for a level
    /// name missing from the level table, and
    /// [`HlogError::NotRegistered`] if the logger is not registered.
    pub fn read(&self, path: impl AsRef<Path>, start_offset: u64) -> Result<u64> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let offset = self.read_from(BufReader::new(file), start_offset)?;
        debug!(path = %path.display(), start_offset, offset, "replayed log file");
        Ok(offset)
    }

    /// Same as [`read`](Self::read) over any seekable reader.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn read_from<R: BufRead + Seek>(&self, reader: R, start_offset: u64) -> Result<u64> {
        self.parser
            .read_from(reader, start_offset, |record| self.replay(record).map(|_| ()))
    }

    fn replay(&self, record: ParsedRecord) -> Result<LogRecord> {
        let level_name = record
            .level_name
            .unwrap_or_else(|| StandardLevel::Info.as_str().to_string());
        let level_value = self
            .levels
            .value_of(&level_name)
            .ok_or_else(|| HlogError::UnknownLevel(level_name.clone()))?;

        self.logger.set_stage(record.hierarchy_stage)?;
        let timestamp = record.timestamp.unwrap_or_else(Local::now);
        Ok(self
            .logger
            .log_at(timestamp, &level_name, level_value, record.message))
    }
}
