//! Delivery - outcome of routing one record

use serde::Serialize;

use crate::Identity;

/// Outcome of a successful emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Appended to the destination with this identity
    Written(Identity),
    /// Dropped by a level threshold
    BelowThreshold,
    /// Refused by the destination's filter
    Rejected,
}

impl Delivery {
    pub fn is_written(&self) -> bool {
        matches!(self, Delivery::Written(_))
    }
}
