//! Routing policies
//!
//! A policy decides where a root-handle record goes and which admission
//! filter each destination gets. One router uses exactly one policy.

use std::fmt;
use std::sync::Arc;

use contracts::{Identity, PolicyKind, Record, RoutingKey};

use crate::destination::SinkFilter;

/// Destination class chosen for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Aggregate,
    Keyed(RoutingKey),
}

impl Route {
    pub fn identity(&self) -> Identity {
        match self {
            Route::Aggregate => Identity::Aggregate,
            Route::Keyed(key) => Identity::Keyed(key.clone()),
        }
    }
}

/// Routing strategy injected into the router.
pub trait RoutingPolicy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Route a record emitted through the root handle.
    fn route(&self, record: &Record) -> Route;

    /// Prepare a record emitted through the child handle for `key`.
    fn stamp_child(&self, _key: &RoutingKey, record: Record) -> Record {
        record
    }

    /// Admission filter for the destination with `identity`.
    fn filter_for(&self, identity: &Identity) -> SinkFilter;
}

/// Flat namespace: route by the record's key, filter on both sides.
///
/// Child handles tag their records with the child's key, so a keyed
/// destination only ever sees records carrying its own key and the
/// aggregate destination only ever sees unkeyed records.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorPolicy;

impl RoutingPolicy for SelectorPolicy {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn route(&self, record: &Record) -> Route {
        match &record.routing_key {
            Some(key) => Route::Keyed(key.clone()),
            None => Route::Aggregate,
        }
    }

    fn stamp_child(&self, key: &RoutingKey, record: Record) -> Record {
        record.with_routing_key(key.clone())
    }

    fn filter_for(&self, identity: &Identity) -> SinkFilter {
        match identity {
            Identity::Aggregate => SinkFilter::UnkeyedOnly,
            Identity::Keyed(key) => SinkFilter::KeyEquals(key.clone()),
        }
    }
}

/// Namespace per key: the root handle writes to the aggregate destination,
/// each child handle to its own. Destinations accept everything they get.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalPolicy;

impl RoutingPolicy for HierarchicalPolicy {
    fn name(&self) -> &'static str {
        "hierarchical"
    }

    fn route(&self, _record: &Record) -> Route {
        Route::Aggregate
    }

    fn filter_for(&self, _identity: &Identity) -> SinkFilter {
        SinkFilter::AcceptAll
    }
}

/// Build the policy selected by configuration
pub fn policy_for(kind: PolicyKind) -> Arc<dyn RoutingPolicy> {
    match kind {
        PolicyKind::Selector => Arc::new(SelectorPolicy),
        PolicyKind::Hierarchical => Arc::new(HierarchicalPolicy),
    }
}
