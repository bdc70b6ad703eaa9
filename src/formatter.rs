//! Template-driven rendering of log records
//!
//! A template such as `{time} - {name} - {level} - {message}` is compiled once
//! into an ordered list of literal segments and field lookups. Unknown
//! placeholders and unmatched braces are kept as literal text.

use chrono::format::{Item, StrftimeItems};

use crate::error::ConfigurationError;
use crate::record::LogRecord;

/// Default line template
pub const DEFAULT_TEMPLATE: &str = "{time} - {name} - {level} - {message}";

/// Default timestamp pattern (chrono `strftime` syntax, millisecond precision)
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// A record field a placeholder can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Time,
    Name,
    Level,
    Message,
    Filename,
    Line,
    Pathname,
    Module,
    Function,
}

impl Field {
    fn lookup(name: &str) -> Option<Field> {
        let field = match name {
            "time" | "asctime" => Field::Time,
            "name" => Field::Name,
            "level" | "levelname" => Field::Level,
            "message" => Field::Message,
            "filename" => Field::Filename,
            "lineno" | "line" => Field::Line,
            "pathname" => Field::Pathname,
            "module" => Field::Module,
            "function" | "funcName" => Field::Function,
            _ => return None,
        };
        Some(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A compiled line template
#[derive(Debug, Clone)]
pub struct Formatter {
    segments: Vec<Segment>,
    time_format: String,
}

impl Formatter {
    /// Compile `template`, rendering timestamps with `time_format`
    ///
    /// An invalid `time_format` falls back to [`DEFAULT_TIME_FORMAT`]; use
    /// [`check_time_format`] to reject it up front.
    pub fn new(template: &str, time_format: impl Into<String>) -> Self {
        let mut time_format = time_format.into();
        if let Err(e) = check_time_format(&time_format) {
            tracing::warn!(error = %e, "falling back to the default time format");
            time_format = DEFAULT_TIME_FORMAT.to_string();
        }
        Self {
            segments: compile(template),
            time_format,
        }
    }

    /// Render `record` into a single line without a trailing newline
    pub fn format(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(64 + record.message.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => self.push_field(&mut out, *field, record),
            }
        }
        out
    }

    fn push_field(&self, out: &mut String, field: Field, record: &LogRecord) {
        use std::fmt::Write;

        match field {
            Field::Time => {
                let _ = write!(out, "{}", record.timestamp.format(&self.time_format));
            }
            Field::Name => out.push_str(&record.logger_name),
            Field::Level => out.push_str(record.level.as_str()),
            Field::Message => out.push_str(&record.message),
            Field::Filename => out.push_str(record.source.filename()),
            Field::Line => {
                let _ = write!(out, "{}", record.source.line);
            }
            Field::Pathname => out.push_str(&record.source.file),
            Field::Module => out.push_str(record.source.module_name()),
            Field::Function => out.push_str(&record.source.function),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE, DEFAULT_TIME_FORMAT)
    }
}

/// One-shot convenience: compile `template` and render `record`
pub fn format(record: &LogRecord, template: &str) -> String {
    Formatter::new(template, DEFAULT_TIME_FORMAT).format(record)
}

/// Reject a strftime pattern chrono cannot render
pub fn check_time_format(time_format: &str) -> Result<(), ConfigurationError> {
    if StrftimeItems::new(time_format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigurationError::InvalidTimeFormat(time_format.to_string()));
    }
    Ok(())
}

fn compile(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find(['{', '}']) else {
            // no closing brace anywhere after this one
            literal.push_str(&rest[open..]);
            rest = "";
            break;
        };

        if after.as_bytes()[close] == b'{' {
            // "{ ... {": the first brace is literal, retry from the second
            literal.push_str(&rest[open..open + 1 + close]);
            rest = &after[close..];
            continue;
        }

        let name = &after[..close];
        match Field::lookup(name) {
            Some(field) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Field(field));
            }
            None => literal.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}
