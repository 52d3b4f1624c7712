//! Record renderers
//!
//! `PatternFormatter` renders `{placeholder}` patterns; `JsonFormatter`
//! renders one JSON object per record.

use std::sync::Arc;

use contracts::{FormatConfig, FormatKind, Formatter, Record, DEFAULT_PATTERN};
use tracing::warn;

/// Timestamp layout, e.g. `2024-05-01 10:00:00,123`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Timestamp,
    Level,
    Message,
    Key,
    Attribute(String),
}

/// Renders records through a pattern.
///
/// Supported placeholders: `{timestamp}`, `{level}`, `{message}`, `{key}`
/// (empty when the record is unkeyed) and `{attr:NAME}` (empty when absent).
/// Unknown placeholders are kept verbatim.
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    segments: Vec<Segment>,
}

impl PatternFormatter {
    pub fn new(pattern: &str) -> Self {
        Self {
            segments: parse_pattern(pattern),
        }
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

impl Formatter for PatternFormatter {
    fn render(&self, record: &Record) -> String {
        let mut out = String::with_capacity(record.message.len() + 48);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Timestamp => {
                    out.push_str(&record.timestamp.format(TIMESTAMP_FORMAT).to_string())
                }
                Segment::Level => out.push_str(record.level.as_str()),
                Segment::Message => out.push_str(&record.message),
                Segment::Key => out.push_str(record.key().unwrap_or_default()),
                Segment::Attribute(name) => {
                    out.push_str(record.attribute(name).unwrap_or_default())
                }
            }
        }
        out
    }
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };

        let segment = match &after[..close] {
            "timestamp" => Some(Segment::Timestamp),
            "level" => Some(Segment::Level),
            "message" => Some(Segment::Message),
            "key" => Some(Segment::Key),
            name => name
                .strip_prefix("attr:")
                .map(|attr| Segment::Attribute(attr.to_string())),
        };

        match segment {
            Some(segment) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
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

/// Renders each record as a single-line JSON object
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn render(&self, record: &Record) -> String {
        serde_json::to_string(record).unwrap_or_else(|e| {
            warn!(error = %e, "Record serialization failed, falling back to message");
            record.message.clone()
        })
    }
}

/// Build the formatter described by `config`
pub fn formatter_from_config(config: &FormatConfig) -> Arc<dyn Formatter> {
    match config.kind {
        FormatKind::Pattern => Arc::new(PatternFormatter::new(&config.pattern)),
        FormatKind::Json => Arc::new(JsonFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use contracts::{Level, RoutingKey};

    fn sample() -> Record {
        Record::new(Level::Warning, "disk almost full")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
            .with_attribute("disk", "sda1")
            .with_routing_key(RoutingKey::new("server1").unwrap())
    }

    #[test]
    fn test_default_pattern() {
        let rendered = PatternFormatter::default().render(&sample());
        assert_eq!(
            rendered,
            "2024-05-01 10:00:00,000 [WARNING]: disk almost full"
        );
    }

    #[test]
    fn test_key_and_attribute_placeholders() {
        let formatter = PatternFormatter::new("{key}|{attr:disk}|{attr:missing}|{level}");
        assert_eq!(formatter.render(&sample()), "server1|sda1||WARNING");
    }

    #[test]
    fn test_unknown_and_unclosed_placeholders_are_literal() {
        let formatter = PatternFormatter::new("{nope} {message} {open");
        assert_eq!(formatter.render(&sample()), "{nope} disk almost full {open");
    }

    #[test]
    fn test_json_formatter() {
        let rendered = JsonFormatter.render(&sample());
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["level"], "warning");
        assert_eq!(value["routing_key"], "server1");
        assert_eq!(value["attributes"]["disk"], "sda1");
        assert!(!rendered.contains('\n'));
    }

    #[test]
    fn test_formatter_from_config() {
        let config = FormatConfig {
            kind: FormatKind::Pattern,
            pattern: "{level}:{message}".to_string(),
        };
        let formatter = formatter_from_config(&config);
        assert_eq!(formatter.render(&sample()), "WARNING:disk almost full");
    }
}
