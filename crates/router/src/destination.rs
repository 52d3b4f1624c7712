//! Destination - one sink bound to one identity
//!
//! Wraps the backing sink with its minimum level, formatter, admission
//! filter and metrics. Writes are serialized on a fair async mutex, so each
//! record is appended whole and records land in arrival order.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use contracts::{Delivery, Formatter, Identity, Level, Record, RoutingKey, Sink};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, trace, warn};

use crate::error::RouterError;
use crate::metrics::SinkMetrics;

/// Which records a destination admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkFilter {
    /// Every record
    AcceptAll,
    /// Only records without a routing key
    UnkeyedOnly,
    /// Only records whose routing key equals this key
    KeyEquals(RoutingKey),
}

impl SinkFilter {
    pub fn admits(&self, record: &Record) -> bool {
        match self {
            SinkFilter::AcceptAll => true,
            SinkFilter::UnkeyedOnly => record.routing_key.is_none(),
            SinkFilter::KeyEquals(key) => record.routing_key.as_ref() == Some(key),
        }
    }
}

/// A sink bound to one identity
pub struct Destination<S> {
    identity: Identity,
    sink: Mutex<Option<S>>,
    min_level: AtomicU8,
    formatter: Arc<dyn Formatter>,
    filter: SinkFilter,
    metrics: SinkMetrics,
}

impl<S> fmt::Debug for Destination<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("identity", &self.identity)
            .field("filter", &self.filter)
            .field("min_level", &Level::from_u8(self.min_level.load(Ordering::Relaxed)))
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

impl<S: Sink> Destination<S> {
    pub fn new(
        identity: Identity,
        sink: S,
        formatter: Arc<dyn Formatter>,
        filter: SinkFilter,
        min_level: Level,
    ) -> Self {
        Self {
            identity,
            sink: Mutex::new(Some(sink)),
            min_level: AtomicU8::new(min_level.as_u8()),
            formatter,
            filter,
            metrics: SinkMetrics::new(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn filter(&self) -> &SinkFilter {
        &self.filter
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    pub fn minimum_level(&self) -> Level {
        Level::from_u8(self.min_level.load(Ordering::Relaxed)).unwrap_or_default()
    }

    pub fn set_minimum_level(&self, level: Level) {
        self.min_level.store(level.as_u8(), Ordering::Relaxed);
    }

    /// Render and append `record`.
    ///
    /// Records below the minimum level or refused by the filter are dropped
    /// silently and reported through the returned [`Delivery`].
    ///
    /// # Errors
    /// `RouterError::Write` when the backing sink fails, `RouterError::Closed`
    /// after [`Destination::close`].
    pub async fn emit(&self, record: &Record) -> Result<Delivery, RouterError> {
        if record.level < self.minimum_level() {
            self.metrics.inc_below_threshold();
            return Ok(Delivery::BelowThreshold);
        }
        if !self.filter.admits(record) {
            self.metrics.inc_rejected();
            trace!(identity = %self.identity, key = ?record.key(), "Record rejected by filter");
            return Ok(Delivery::Rejected);
        }

        let mut rendered = self.formatter.render(record);
        rendered.push('\n');

        let mut guard = self.sink.lock().await;
        let Some(sink) = guard.as_mut() else {
            return Err(RouterError::Closed {
                identity: self.identity.clone(),
            });
        };

        match sink.write(rendered.as_bytes()).await {
            Ok(()) => {
                self.metrics.inc_written();
                Ok(Delivery::Written(self.identity.clone()))
            }
            Err(source) => {
                self.metrics.inc_failed();
                warn!(identity = %self.identity, error = %source, "Write failed");
                Err(RouterError::Write {
                    identity: self.identity.clone(),
                    source,
                })
            }
        }
    }

    /// Flush and release the backing sink. Later calls are no-ops.
    #[instrument(name = "destination_close", skip(self), fields(identity = %self.identity))]
    pub async fn close(&self) {
        let Some(mut sink) = self.sink.lock().await.take() else {
            return;
        };
        if let Err(e) = sink.flush().await {
            error!(identity = %self.identity, error = %e, "Flush failed on shutdown");
        }
        if let Err(e) = sink.close().await {
            error!(identity = %self.identity, error = %e, "Close failed on shutdown");
        }
        debug!(identity = %self.identity, "Destination closed");
    }

    pub async fn is_closed(&self) -> bool {
        self.sink.lock().await.is_none()
    }
}
