//! Router - facade receiving records and dispatching them to destinations

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use contracts::{
    Delivery, Formatter, Identity, Level, Record, RouterConfig, RoutingKey, SinkFactory,
};
use tracing::{debug, info, instrument};

use crate::error::RouterError;
use crate::format::{formatter_from_config, PatternFormatter};
use crate::metrics::MetricsSnapshot;
use crate::policy::{policy_for, Route, RoutingPolicy, SelectorPolicy};
use crate::registry::{DestinationRegistry, SharedDestination};

/// Builder for creating a Router
pub struct RouterBuilder<F: SinkFactory> {
    factory: F,
    formatter: Arc<dyn Formatter>,
    policy: Arc<dyn RoutingPolicy>,
    level: Level,
    sink_level: Level,
    selector: Option<String>,
}

impl<F: SinkFactory> RouterBuilder<F> {
    /// Create a builder with the default pattern, selector policy and
    /// `Info` thresholds
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            formatter: Arc::new(PatternFormatter::default()),
            policy: Arc::new(SelectorPolicy),
            level: Level::Info,
            sink_level: Level::Info,
            selector: None,
        }
    }

    pub fn formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn policy(mut self, policy: Arc<dyn RoutingPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Router threshold, applied before routing
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Initial minimum level of every created destination
    pub fn sink_level(mut self, level: Level) -> Self {
        self.sink_level = level;
        self
    }

    /// Attribute lifted into the routing key of every root record
    pub fn selector(mut self, name: impl Into<String>) -> Self {
        self.selector = Some(name.into());
        self
    }

    /// Apply policy, selector, thresholds and format from configuration
    pub fn config(self, config: &RouterConfig) -> Self {
        self.policy(policy_for(config.policy))
            .selector(config.selector.clone())
            .formatter(formatter_from_config(&config.format))
            .level(config.level)
            .sink_level(config.sink.level)
    }

    /// Build the router, creating the aggregate destination.
    ///
    /// # Errors
    /// `RouterError::Factory` when the aggregate sink cannot be created.
    #[instrument(name = "router_builder_build", skip(self), fields(policy = self.policy.name()))]
    pub async fn build(self) -> Result<Router<F>, RouterError> {
        let registry =
            DestinationRegistry::new(self.factory, self.formatter, self.policy, self.sink_level)
                .await?;

        info!(level = %self.level, "Router ready");
        Ok(Router {
            inner: Arc::new(RouterInner {
                registry,
                min_level: AtomicU8::new(self.level.as_u8()),
                selector: self.selector,
            }),
        })
    }
}

struct RouterInner<F: SinkFactory> {
    registry: DestinationRegistry<F>,
    min_level: AtomicU8,
    selector: Option<String>,
}

/// Routes records to the aggregate destination or one keyed destination.
///
/// Cloning is cheap; clones share the registry and threshold.
pub struct Router<F: SinkFactory> {
    inner: Arc<RouterInner<F>>,
}

impl<F: SinkFactory> Clone for Router<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: SinkFactory> Router<F> {
    pub fn builder(factory: F) -> RouterBuilder<F> {
        RouterBuilder::new(factory)
    }

    /// Build a router with the given formatter and policy
    pub async fn new(
        factory: F,
        formatter: Arc<dyn Formatter>,
        policy: Arc<dyn RoutingPolicy>,
    ) -> Result<Self, RouterError> {
        RouterBuilder::new(factory)
            .formatter(formatter)
            .policy(policy)
            .build()
            .await
    }

    pub fn registry(&self) -> &DestinationRegistry<F> {
        &self.inner.registry
    }

    pub fn factory(&self) -> &F {
        self.inner.registry.factory()
    }

    pub fn policy(&self) -> &dyn RoutingPolicy {
        self.inner.registry.policy()
    }

    pub fn minimum_level(&self) -> Level {
        Level::from_u8(self.inner.min_level.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Set the router threshold (the logger level)
    pub fn set_minimum_level(&self, level: Level) {
        self.inner.min_level.store(level.as_u8(), Ordering::Relaxed);
    }

    fn admits(&self, record: &Record) -> bool {
        record.level >= self.minimum_level()
    }

    /// Route and write one record emitted through the root handle.
    ///
    /// When a selector is configured, its attribute is lifted into the
    /// routing key first.
    ///
    /// # Errors
    /// `RouterError::Factory` when the keyed destination had to be created
    /// and creation failed; `RouterError::Write` / `RouterError::Closed` from
    /// the destination.
    pub async fn emit(&self, record: Record) -> Result<Delivery, RouterError> {
        if !self.admits(&record) {
            return Ok(Delivery::BelowThreshold);
        }
        let record = match self.inner.selector.as_deref() {
            Some(selector) => record.lift_selector(selector),
            None => record,
        };

        let destination = match self.policy().route(&record) {
            Route::Aggregate => self.inner.registry.resolve_aggregate(),
            Route::Keyed(key) => self.inner.registry.resolve(&key).await?,
        };
        destination.emit(&record).await
    }

    /// Emit a fresh record through the root handle
    pub async fn log(
        &self,
        level: Level,
        message: impl Into<String>,
    ) -> Result<Delivery, RouterError> {
        self.emit(Record::new(level, message)).await
    }

    pub async fn info(&self, message: impl Into<String>) -> Result<Delivery, RouterError> {
        self.log(Level::Info, message).await
    }

    pub async fn warning(&self, message: impl Into<String>) -> Result<Delivery, RouterError> {
        self.log(Level::Warning, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Result<Delivery, RouterError> {
        self.log(Level::Error, message).await
    }

    /// Handle wired to the destination for `key`, created on first request.
    ///
    /// # Errors
    /// `RouterError::Factory` when the destination had to be created and
    /// creation failed.
    pub async fn child(&self, key: RoutingKey) -> Result<ChildRouter<F>, RouterError> {
        let destination = self.inner.registry.resolve(&key).await?;
        debug!(key = %key, "Child handle issued");
        Ok(ChildRouter {
            key,
            destination,
            router: self.clone(),
        })
    }

    /// Destination for `key`, created on first use
    pub async fn resolve(&self, key: &RoutingKey) -> Result<SharedDestination<F>, RouterError> {
        self.inner.registry.resolve(key).await
    }

    /// Metrics for every created destination
    pub fn metrics(&self) -> Vec<(Identity, MetricsSnapshot)> {
        self.inner.registry.metrics()
    }

    /// Close every destination. Emits afterwards fail with `RouterError::Closed`.
    #[instrument(name = "router_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        self.inner.registry.close_all().await;
        info!(keyed = self.inner.registry.len(), "Router shutdown complete");
    }
}

/// Handle emitting to one keyed destination
pub struct ChildRouter<F: SinkFactory> {
    key: RoutingKey,
    destination: SharedDestination<F>,
    router: Router<F>,
}

impl<F: SinkFactory> Clone for ChildRouter<F> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            destination: Arc::clone(&self.destination),
            router: self.router.clone(),
        }
    }
}

impl<F: SinkFactory> ChildRouter<F> {
    pub fn key(&self) -> &RoutingKey {
        &self.key
    }

    pub fn destination(&self) -> &SharedDestination<F> {
        &self.destination
    }

    /// Set the minimum level of this child's destination
    pub fn set_minimum_level(&self, level: Level) {
        self.destination.set_minimum_level(level);
    }

    /// Write one record to this child's destination.
    ///
    /// The router threshold still applies.
    pub async fn emit(&self, record: Record) -> Result<Delivery, RouterError> {
        if !self.router.admits(&record) {
            return Ok(Delivery::BelowThreshold);
        }
        let record = self.router.policy().stamp_child(&self.key, record);
        self.destination.emit(&record).await
    }

    pub async fn log(
        &self,
        level: Level,
        message: impl Into<String>,
    ) -> Result<Delivery, RouterError> {
        self.emit(Record::new(level, message)).await
    }

    pub async fn info(&self, message: impl Into<String>) -> Result<Delivery, RouterError> {
        self.log(Level::Info, message).await
    }

    pub async fn warning(&self, message: impl Into<String>) -> Result<Delivery, RouterError> {
        self.log(Level::Warning, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Result<Delivery, RouterError> {
        self.log(Level::Error, message).await
    }
}
