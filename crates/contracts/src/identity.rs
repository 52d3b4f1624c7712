//! Identity - which destination a sink stands for

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::RoutingKey;

/// Identity of one sink: the aggregate stream or one keyed stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    /// Stream for records without a routing key
    Aggregate,
    /// Stream for records tagged with this key
    Keyed(RoutingKey),
}

impl Identity {
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Identity::Aggregate)
    }

    /// Routing key for keyed identities.
    pub fn key(&self) -> Option<&RoutingKey> {
        match self {
            Identity::Aggregate => None,
            Identity::Keyed(key) => Some(key),
        }
    }
}

impl From<RoutingKey> for Identity {
    fn from(key: RoutingKey) -> Self {
        Identity::Keyed(key)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Aggregate => f.write_str("<aggregate>"),
            Identity::Keyed(key) => f.write_str(key),
        }
    }
}
