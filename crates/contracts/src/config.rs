//! RouterConfig - Config Loader output
//!
//! Describes one router deployment: naming, routing policy, thresholds,
//! rendering and the sink backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Level, DEFAULT_SELECTOR};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Logger name, also the stem of produced file names
    pub name: String,

    /// Routing policy variant
    #[serde(default)]
    pub policy: PolicyKind,

    /// Attribute lifted into the routing key of ingested records
    #[serde(default = "default_selector")]
    pub selector: String,

    /// Router threshold; records below it are dropped before routing
    #[serde(default)]
    pub level: Level,

    /// Rendering
    #[serde(default)]
    pub format: FormatConfig,

    /// Sink backend shared by the aggregate and every keyed destination
    #[serde(default)]
    pub sink: SinkSettings,
}

fn default_selector() -> String {
    DEFAULT_SELECTOR.to_string()
}

impl RouterConfig {
    /// Configuration with defaults for everything but the name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            version: ConfigVersion::default(),
            name: name.into(),
            policy: PolicyKind::default(),
            selector: default_selector(),
            level: Level::default(),
            format: FormatConfig::default(),
            sink: SinkSettings::default(),
        }
    }
}

/// Routing policy variant. A deployment picks exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Flat logger, routing by the record's key with filters on both sides
    #[default]
    Selector,
    /// One child handle per key, exclusivity by construction
    Hierarchical,
}

/// Rendering configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Renderer kind
    #[serde(default)]
    pub kind: FormatKind,

    /// Pattern for [`FormatKind::Pattern`]
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

/// Default line pattern: `2024-01-01 12:00:00,000 [INFO]: message`
pub const DEFAULT_PATTERN: &str = "{timestamp} [{level}]: {message}";

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            kind: FormatKind::default(),
            pattern: default_pattern(),
        }
    }
}

/// Renderer kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    #[default]
    Pattern,
    Json,
}

/// Sink backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkSettings {
    /// Sink type
    #[serde(default)]
    pub sink_type: SinkType,

    /// Directory holding the produced files (file sinks)
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Minimum level of every created sink
    #[serde(default)]
    pub level: Level,
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./logs")
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            sink_type: SinkType::default(),
            base_path: default_base_path(),
            level: Level::default(),
        }
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Append-only file per identity
    #[default]
    File,
    /// Re-emit through tracing
    Log,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config: RouterConfig = serde_json::from_str(r#"{"name": "my.company"}"#).unwrap();
        assert_eq!(config.name, "my.company");
        assert_eq!(config.policy, PolicyKind::Selector);
        assert_eq!(config.selector, "server");
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.format.pattern, DEFAULT_PATTERN);
        assert_eq!(config.sink.sink_type, SinkType::File);
        assert_eq!(config.sink.base_path, PathBuf::from("./logs"));
    }

    #[test]
    fn test_named_matches_serde_defaults() {
        let named = RouterConfig::named("svc");
        let parsed: RouterConfig = serde_json::from_str(r#"{"name": "svc"}"#).unwrap();
        assert_eq!(named.policy, parsed.policy);
        assert_eq!(named.selector, parsed.selector);
        assert_eq!(named.format, parsed.format);
        assert_eq!(named.sink, parsed.sink);
    }
}
