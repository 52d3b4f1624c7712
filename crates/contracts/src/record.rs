//! Record - one structured log event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::{Level, RoutingKey};

/// Default name of the selector attribute.
pub const DEFAULT_SELECTOR: &str = "server";

/// One structured log event.
///
/// Records are built by the caller and handed to the router by value; the
/// builder methods consume `self`, so a record cannot change after emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Event time
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Severity
    #[serde(default)]
    pub level: Level,

    /// Fully resolved message text
    pub message: String,

    /// Free-form attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Key of the keyed destination, if any
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_key"
    )]
    pub routing_key: Option<RoutingKey>,
}

impl Record {
    /// Create an unkeyed record stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            attributes: BTreeMap::new(),
            routing_key: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Tag the record for the keyed destination `key`.
    pub fn with_routing_key(mut self, key: RoutingKey) -> Self {
        self.routing_key = Some(key);
        self
    }

    /// Move the selector attribute `selector` into the typed routing key.
    ///
    /// An empty attribute value is dropped and leaves the record unkeyed. An
    /// already present routing key wins over the attribute.
    pub fn lift_selector(mut self, selector: &str) -> Self {
        if let Some(value) = self.attributes.remove(selector) {
            if self.routing_key.is_none() {
                self.routing_key = RoutingKey::new(&value);
            }
        }
        self
    }

    /// Routing key as a string slice, if any.
    pub fn key(&self) -> Option<&str> {
        self.routing_key.as_ref().map(RoutingKey::as_str)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

fn deserialize_optional_key<'de, D>(deserializer: D) -> Result<Option<RoutingKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(RoutingKey::new))
}
