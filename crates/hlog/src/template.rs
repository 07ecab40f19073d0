//! Format templates shared by the log file writer and reader.
//!
//! A template is a format string with `%(name)s` placeholders, optionally
//! carrying a width (`%(levelname)8s` right-aligns, `%(levelname)-8s`
//! left-aligns). Supported placeholders are `asctime`, `levelname` and
//! `message`; `%%` is a literal percent sign. Compiling a template yields an
//! ordered list of [`TemplateField`]s, each with the literal text that
//! follows it, preceded by a synthesized hierarchy-marker field.

use std::fmt;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{HlogError, Result};

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%\((?P<name>\w+)\)(?P<width>-?\d+)?s").unwrap_or_else(|_| unreachable!())
});

/// What a template field captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Leading spaces, branch marker and padding encoding the hierarchy stage
    Hierarchy,
    /// Record timestamp (`%(asctime)s`)
    Time,
    /// Level name (`%(levelname)s`)
    Level,
    /// Message text (`%(message)s`), always last
    Message,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hierarchy => "hierarchy",
            Self::Time => "time",
            Self::Level => "level",
            Self::Message => "message",
        })
    }
}

/// One field of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateField {
    /// Field kind.
    pub kind: FieldKind,
    /// Padding width: positive right-aligns, negative left-aligns.
    pub width: Option<i32>,
    /// Literal text following the field up to the next field.
    pub tail: String,
}

/// Format settings shared by writer and reader.
///
/// Both sides must use the same settings to interoperate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Template with `%(asctime)s`, `%(levelname)s` and `%(message)s`.
    pub template: String,
    /// strftime-style timestamp format.
    pub date_format: String,
    /// Deepest hierarchy stage that can be written.
    pub max_depth: usize,
    /// Literal that starts every record header after the stage indentation.
    pub branch_marker: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            template: "%(asctime)s - %(levelname)8s - %(message)s".to_string(),
            date_format: "%y-%m-%d %H:%M:%S".to_string(),
            max_depth: 10,
            branch_marker: "|-".to_string(),
        }
    }
}

impl FormatConfig {
    /// Creates a config with the given template and default other settings.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Default::default()
        }
    }

    /// Sets the timestamp format.
    #[must_use]
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    /// Sets the maximum depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the branch marker.
    #[must_use]
    pub fn with_branch_marker(mut self, marker: impl Into<String>) -> Self {
        self.branch_marker = marker.into();
        self
    }

    /// Loads a config from a JSON file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Checks the marker and date format.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::InvalidConfig`] for an empty marker, a marker with
    /// whitespace, or an unusable date format.
    pub fn validate(&self) -> Result<()> {
        if self.branch_marker.is_empty() {
            return Err(HlogError::InvalidConfig(
                "branch marker must not be empty".to_string(),
            ));
        }
        if self.branch_marker.chars().any(char::is_whitespace) {
            return Err(HlogError::InvalidConfig(
                "branch marker must not contain whitespace".to_string(),
            ));
        }
        if self.date_format.contains('\n')
            || StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error))
        {
            return Err(HlogError::InvalidConfig(format!(
                "invalid date format: {:?}",
                self.date_format
            )));
        }
        Ok(())
    }

    /// Validates the settings and compiles the template.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::InvalidConfig`] or [`HlogError::Template`].
    pub fn compile(&self) -> Result<CompiledTemplate> {
        self.validate()?;
        CompiledTemplate::compile(self)
    }
}

/// A template reduced to ordered fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    fields: Vec<TemplateField>,
    date_format: String,
    max_depth: usize,
    branch_marker: String,
    time_width: usize,
}

impl CompiledTemplate {
    fn compile(config: &FormatConfig) -> Result<Self> {
        let template = config.template.as_str();
        let mut head = String::new();
        let mut fields: Vec<TemplateField> = Vec::new();
        let mut literal_start = 0;

        for caps in PLACEHOLDER_REGEX.captures_iter(template) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let literal = unescape(&template[literal_start..whole.start()])?;
            match fields.last_mut() {
                Some(previous) => previous.tail = literal,
                None => head = literal,
            }

            let name = &caps["name"];
            let kind = match name {
                "asctime" => FieldKind::Time,
                "levelname" => FieldKind::Level,
                "message" => FieldKind::Message,
                other => {
                    return Err(HlogError::Template(format!(
                        "unsupported placeholder %({other})s"
                    )));
                }
            };
            if fields.iter().any(|field| field.kind == kind) {
                return Err(HlogError::Template(format!("duplicate {kind} placeholder")));
            }
            let width = caps
                .name("width")
                .map(|w| {
                    w.as_str()
                        .parse::<i32>()
                        .map_err(|e| HlogError::Template(format!("invalid width: {e}")))
                })
                .transpose()?;
            if kind == FieldKind::Message && width.is_some() {
                return Err(HlogError::Template(
                    "message placeholder cannot have a width".to_string(),
                ));
            }

            fields.push(TemplateField {
                kind,
                width,
                tail: String::new(),
            });
            literal_start = whole.end();
        }

        let trailing = unescape(&template[literal_start..])?;
        match fields.last_mut() {
            Some(last) if last.kind == FieldKind::Message && trailing.is_empty() => {}
            Some(last) if last.kind == FieldKind::Message => {
                return Err(HlogError::Template(
                    "no text may follow the message placeholder".to_string(),
                ));
            }
            _ => {
                return Err(HlogError::Template(
                    "template must end with the message placeholder".to_string(),
                ));
            }
        }

        let marker_width = config.branch_marker.chars().count();
        fields.insert(
            0,
            TemplateField {
                kind: FieldKind::Hierarchy,
                width: i32::try_from(config.max_depth + marker_width).ok(),
                tail: format!(" {head}"),
            },
        );

        let time_width = example_time_width(&config.date_format);

        Ok(Self {
            fields,
            date_format: config.date_format.clone(),
            max_depth: config.max_depth,
            branch_marker: config.branch_marker.clone(),
            time_width,
        })
    }

    /// Fields in template order, hierarchy marker first.
    #[must_use]
    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    /// Returns true if the template contains a field of this kind.
    #[must_use]
    pub fn has_field(&self, kind: FieldKind) -> bool {
        self.fields.iter().any(|field| field.kind == kind)
    }

    /// strftime-style timestamp format.
    #[must_use]
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Deepest stage that can be written.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Branch marker literal.
    #[must_use]
    pub fn branch_marker(&self) -> &str {
        &self.branch_marker
    }

    /// Number of characters a formatted timestamp occupies.
    #[must_use]
    pub const fn time_width(&self) -> usize {
        self.time_width
    }
}

fn unescape(literal: &str) -> Result<String> {
    if literal.contains('\n') {
        return Err(HlogError::Template(
            "template must fit on one line".to_string(),
        ));
    }
    Ok(literal.replace("%%", "%"))
}

fn example_time_width(date_format: &str) -> usize {
    NaiveDate::from_ymd_opt(2000, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map_or(0, |example| {
            example.format(date_format).to_string().chars().count()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn compile(template: &str) -> Result<CompiledTemplate> {
        FormatConfig::new(template).compile()
    }

    #[test]
    fn default_template_fields() {
        let compiled = FormatConfig::default().compile().expect("default compiles");
        let kinds: Vec<FieldKind> = compiled.fields().iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FieldKind::Hierarchy,
                FieldKind::Time,
                FieldKind::Level,
                FieldKind::Message
            ]
        );

        let fields = compiled.fields();
        assert_eq!(fields[0].width, Some(12));
        assert_eq!(fields[0].tail, " ");
        assert_eq!(fields[1].tail, " - ");
        assert_eq!(fields[2].width, Some(8));
        assert_eq!(fields[2].tail, " - ");
        assert_eq!(fields[3].tail, "");
        assert_eq!(compiled.time_width(), 17);
    }

    #[test]
    fn leading_literal_becomes_hierarchy_tail() {
        let compiled = compile("[%(levelname)-7s] %(message)s").expect("compiles");
        let fields = compiled.fields();
        assert_eq!(fields[0].tail, " [");
        assert_eq!(fields[1].kind, FieldKind::Level);
        assert_eq!(fields[1].width, Some(-7));
        assert_eq!(fields[1].tail, "] ");
        assert!(!compiled.has_field(FieldKind::Time));
    }

    #[test]
    fn percent_escape() {
        let compiled = compile("%(levelname)s 100%% %(message)s").expect("compiles");
        assert_eq!(compiled.fields()[1].tail, " 100% ");
    }

    #[test_case("%(asctime)s - %(name)s - %(message)s" ; "unknown placeholder")]
    #[test_case("%(message)s - %(levelname)s" ; "message not last")]
    #[test_case("%(levelname)s - %(message)s!" ; "text after message")]
    #[test_case("%(levelname)s - %(levelname)s %(message)s" ; "duplicate placeholder")]
    #[test_case("%(levelname)s" ; "missing message")]
    #[test_case("plain text" ; "no placeholders")]
    #[test_case("%(levelname)s\n%(message)s" ; "multi-line template")]
    #[test_case("%(message)20s" ; "message width")]
    fn invalid_templates(template: &str) {
        assert!(matches!(compile(template), Err(HlogError::Template(_))));
    }

    #[test_case(FormatConfig::default().with_branch_marker("") ; "empty marker")]
    #[test_case(FormatConfig::default().with_branch_marker("| -") ; "marker with space")]
    #[test_case(FormatConfig::default().with_date_format("%Y-%Q") ; "bad date format")]
    fn invalid_configs(config: FormatConfig) {
        assert!(matches!(config.compile(), Err(HlogError::InvalidConfig(_))));
    }

    #[test]
    fn marker_width_counts_characters() {
        let compiled = FormatConfig::default()
            .with_branch_marker("├─")
            .with_max_depth(4)
            .compile()
            .expect("compiles");
        assert_eq!(compiled.fields()[0].width, Some(6));
        assert_eq!(compiled.branch_marker(), "├─");
        assert_eq!(compiled.max_depth(), 4);
    }

    #[test]
    fn config_load_uses_defaults_for_missing_keys() {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        let path = dir.path().join("format.json");
        std::fs::write(&path, r#"{ "max_depth": 4, "branch_marker": "+" }"#).expect("write");

        let config = FormatConfig::load(&path).expect("load");
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.branch_marker, "+");
        assert_eq!(config.template, FormatConfig::default().template);
    }

    #[test]
    fn config_load_rejects_bad_json() {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        let path = dir.path().join("format.json");
        std::fs::write(&path, "{ not json").expect("write");
        assert!(matches!(
            FormatConfig::load(&path),
            Err(HlogError::Serialization(_))
        ));
    }
}
