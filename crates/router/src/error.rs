//! Router error types

use contracts::{ContractError, Identity};
use thiserror::Error;

/// Router-specific errors.
///
/// Every variant is scoped to the single operation that hit it; the router
/// and its registry stay usable afterwards.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Sink factory could not create the backing resource
    #[error("failed to create sink for '{identity}': {source}")]
    Factory {
        identity: Identity,
        #[source]
        source: ContractError,
    },

    /// Sink could not append a record
    #[error("failed to write to sink '{identity}': {source}")]
    Write {
        identity: Identity,
        #[source]
        source: ContractError,
    },

    /// Emit after shutdown
    #[error("sink '{identity}' is closed")]
    Closed { identity: Identity },
}

impl RouterError {
    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Factory { .. } => "factory",
            Self::Write { .. } => "write",
            Self::Closed { .. } => "closed",
        }
    }

    /// Identity of the destination the failure belongs to
    pub fn identity(&self) -> &Identity {
        match self {
            Self::Factory { identity, .. }
            | Self::Write { identity, .. }
            | Self::Closed { identity } => identity,
        }
    }
}
