//! Sink-side traits - backing resources, their factory and the renderer
//!
//! The router owns every sink it obtains from a factory; nothing else may
//! close or replace one.

use crate::{ContractError, Identity, Record};

/// Append-only backing resource of one destination.
#[trait_variant::make(Sink: Send)]
pub trait LocalSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append one rendered record.
    ///
    /// # Errors
    /// Returns a write error carrying the sink name.
    async fn write(&mut self, rendered: &[u8]) -> Result<(), ContractError>;

    /// Flush buffered output (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Release the resource
    async fn close(&mut self) -> Result<(), ContractError>;
}

/// Creates the backing sink for an identity.
///
/// Called at most once per identity that is successfully created; a failed
/// call may be retried later for the same identity.
#[trait_variant::make(SinkFactory: Send)]
pub trait LocalSinkFactory {
    /// Sink type produced by this factory
    type Output: Sink + 'static;

    /// Open the backing resource for `identity`.
    ///
    /// # Errors
    /// `ContractError::SinkCreation` when the resource is unavailable.
    async fn create(&self, identity: &Identity) -> Result<Self::Output, ContractError>;
}

/// Renders a record into the text appended to a sink.
pub trait Formatter: Send + Sync {
    /// Render one record, without trailing newline.
    fn render(&self, record: &Record) -> String;
}
