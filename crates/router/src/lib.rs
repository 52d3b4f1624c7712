//! # Router
//!
//! Keyed log routing.
//!
//! Responsibilities:
//! - Route every record to exactly one destination family: the aggregate
//!   destination or one keyed destination
//! - Create keyed destinations lazily, once per key, and keep them for the
//!   router's lifetime
//! - Apply router and per-destination level thresholds
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), router::RouterError> {
//! use router::{FileSinkFactory, Router, RoutingKey};
//!
//! let router = Router::builder(FileSinkFactory::new("my.company", "./logs"))
//!     .build()
//!     .await?;
//! router.info("startup").await?;
//!
//! let server = router.child(RoutingKey::new("server1").unwrap()).await?;
//! server.info("only in my.company.server1.log").await?;
//! router.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod destination;
pub mod error;
pub mod factory;
pub mod format;
pub mod metrics;
pub mod policy;
pub mod registry;
pub mod router;
pub mod sinks;

pub use contracts::{
    Delivery, Formatter, Identity, Level, Record, RoutingKey, Sink, SinkFactory,
};
pub use destination::{Destination, SinkFilter};
pub use error::RouterError;
pub use factory::{BuiltinSink, BuiltinSinkFactory, FileSinkFactory, MemorySinkFactory};
pub use format::{formatter_from_config, JsonFormatter, PatternFormatter};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use policy::{policy_for, HierarchicalPolicy, Route, RoutingPolicy, SelectorPolicy};
pub use registry::{DestinationRegistry, SharedDestination};
pub use router::{ChildRouter, Router, RouterBuilder};
pub use sinks::{FileSink, LogSink, MemoryBuffer, MemorySink};
