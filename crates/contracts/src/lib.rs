//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Routing model
//! - A [`Record`] either carries a [`RoutingKey`] or belongs to the aggregate stream
//! - Each [`Identity`] maps to exactly one sink produced by a [`SinkFactory`]

mod config;
mod delivery;
mod error;
mod identity;
mod level;
mod record;
mod routing_key;
mod sink;

pub use config::*;
pub use delivery::Delivery;
pub use error::*;
pub use identity::Identity;
pub use level::Level;
pub use record::{Record, DEFAULT_SELECTOR};
pub use routing_key::RoutingKey;
pub use sink::*;
