//! DestinationRegistry - lazy, cached identity -> destination resolver
//!
//! The aggregate destination is created eagerly at construction. Keyed
//! destinations are created on first resolve and never removed.
//!
//! Each key owns a `OnceCell`; the map's shard lock is only held to fetch
//! that cell, so creating one key never blocks resolving another. The cell
//! runs at most one initialisation at a time and stays empty when the
//! factory fails, leaving the key eligible for a later retry.

use std::sync::Arc;

use contracts::{Formatter, Identity, Level, RoutingKey, Sink, SinkFactory};
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::destination::Destination;
use crate::error::RouterError;
use crate::metrics::MetricsSnapshot;
use crate::policy::RoutingPolicy;

/// Destination type produced through factory `F`
pub type SharedDestination<F> = Arc<Destination<<F as SinkFactory>::Output>>;

type Slot<F> = Arc<OnceCell<SharedDestination<F>>>;

/// Owns every destination of one router
pub struct DestinationRegistry<F: SinkFactory> {
    factory: F,
    formatter: Arc<dyn Formatter>,
    policy: Arc<dyn RoutingPolicy>,
    sink_level: Level,
    aggregate: SharedDestination<F>,
    keyed: DashMap<RoutingKey, Slot<F>>,
}

impl<F: SinkFactory> DestinationRegistry<F> {
    /// Create the registry and its aggregate destination.
    ///
    /// # Errors
    /// `RouterError::Factory` when the aggregate sink cannot be created.
    #[instrument(name = "registry_new", skip_all, fields(policy = policy.name()))]
    pub async fn new(
        factory: F,
        formatter: Arc<dyn Formatter>,
        policy: Arc<dyn RoutingPolicy>,
        sink_level: Level,
    ) -> Result<Self, RouterError> {
        let aggregate = create_destination(
            &factory,
            &formatter,
            policy.as_ref(),
            sink_level,
            Identity::Aggregate,
        )
        .await?;

        Ok(Self {
            factory,
            formatter,
            policy,
            sink_level,
            aggregate,
            keyed: DashMap::new(),
        })
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn policy(&self) -> &dyn RoutingPolicy {
        self.policy.as_ref()
    }

    /// The eagerly created aggregate destination
    pub fn resolve_aggregate(&self) -> SharedDestination<F> {
        Arc::clone(&self.aggregate)
    }

    /// Destination for `key`, creating it on first use.
    ///
    /// Concurrent first calls for the same key share one factory call and
    /// all observe the same destination.
    ///
    /// # Errors
    /// `RouterError::Factory` when creation fails; the key stays absent.
    pub async fn resolve(&self, key: &RoutingKey) -> Result<SharedDestination<F>, RouterError> {
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }

        let slot: Slot<F> = {
            let entry = self.keyed.entry(key.clone()).or_insert_with(Default::default);
            Arc::clone(entry.value())
        };
        let destination = slot
            .get_or_try_init(|| {
                create_destination(
                    &self.factory,
                    &self.formatter,
                    self.policy.as_ref(),
                    self.sink_level,
                    Identity::Keyed(key.clone()),
                )
            })
            .await?;
        Ok(Arc::clone(destination))
    }

    /// Destination for `key` if it has been created; never creates one.
    pub fn get(&self, key: &str) -> Option<SharedDestination<F>> {
        self.keyed
            .get(key)
            .and_then(|slot| slot.value().get().cloned())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of created keyed destinations
    pub fn len(&self) -> usize {
        self.keyed
            .iter()
            .filter(|slot| slot.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys with a created destination, sorted
    pub fn keys(&self) -> Vec<RoutingKey> {
        let mut keys: Vec<RoutingKey> = self
            .keyed
            .iter()
            .filter(|slot| slot.value().initialized())
            .map(|slot| slot.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Aggregate destination first, then keyed destinations sorted by key
    pub fn destinations(&self) -> Vec<SharedDestination<F>> {
        let mut keyed: Vec<SharedDestination<F>> = self
            .keyed
            .iter()
            .filter_map(|slot| slot.value().get().cloned())
            .collect();
        keyed.sort_by(|a, b| a.identity().key().cmp(&b.identity().key()));

        let mut all = Vec::with_capacity(keyed.len() + 1);
        all.push(self.resolve_aggregate());
        all.extend(keyed);
        all
    }

    /// Metrics of every created destination
    pub fn metrics(&self) -> Vec<(Identity, MetricsSnapshot)> {
        self.destinations()
            .iter()
            .map(|d| (d.identity().clone(), d.metrics().snapshot()))
            .collect()
    }

    /// Close every created destination. Only meant for shutdown.
    #[instrument(name = "registry_close_all", skip(self))]
    pub async fn close_all(&self) {
        let destinations = self.destinations();
        for destination in &destinations {
            destination.close().await;
        }
        info!(destinations = destinations.len(), "All destinations closed");
    }
}

async fn create_destination<F: SinkFactory>(
    factory: &F,
    formatter: &Arc<dyn Formatter>,
    policy: &dyn RoutingPolicy,
    sink_level: Level,
    identity: Identity,
) -> Result<SharedDestination<F>, RouterError> {
    let sink = match factory.create(&identity).await {
        Ok(sink) => sink,
        Err(source) => {
            warn!(identity = %identity, error = %source, "Sink creation failed");
            return Err(RouterError::Factory { identity, source });
        }
    };

    info!(identity = %identity, sink = sink.name(), "Destination created");
    let filter = policy.filter_for(&identity);
    Ok(Arc::new(Destination::new(
        identity,
        sink,
        Arc::clone(formatter),
        filter,
        sink_level,
    )))
}
