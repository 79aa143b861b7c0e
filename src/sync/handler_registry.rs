//! Handler registry: maps an item type tag to the domain function that
//! applies the recorded mutation.
//!
//! The registry is assembled fresh by the caller on every sync invocation
//! so handlers can close over request-scoped context (the acting user, a
//! transaction, live domain services). It is never persisted or cached.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A domain-side apply function for one item type.
///
/// The engine treats the payload and any returned value as opaque. A
/// handler may be invoked more than once for the same logical item if an
/// earlier attempt failed ambiguously (at-least-once delivery); handlers
/// whose effects must not duplicate are responsible for their own
/// idempotency, e.g. by rejecting duplicates on a natural key.
#[async_trait]
pub trait SyncHandler: Send + Sync {
    async fn apply(&self, payload: &serde_json::Value, owner_id: &str)
        -> Result<serde_json::Value>;
}

/// Per-invocation lookup table from item type to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn SyncHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, item_type: impl Into<String>, handler: Arc<dyn SyncHandler>) {
        self.handlers.insert(item_type.into(), handler);
    }

    /// Resolve the handler for an item type. An unknown type is not an
    /// engine error; the batch coordinator records it as a per-item
    /// failure.
    pub fn resolve(&self, item_type: &str) -> Option<Arc<dyn SyncHandler>> {
        self.handlers.get(item_type).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Builds a registry for one sync request. Implemented by the embedding
/// application, which wires its domain services (expenses, suppliers,
/// contracts, cashboxes...) to their type tags.
pub trait RegistryFactory: Send + Sync {
    fn registry_for(&self, owner_id: &str) -> HandlerRegistry;
}

/// Factory with no handlers. Every pending item fails with a
/// missing-handler error; useful for the bare daemon and for tests.
pub struct EmptyRegistryFactory;

impl RegistryFactory for EmptyRegistryFactory {
    fn registry_for(&self, _owner_id: &str) -> HandlerRegistry {
        HandlerRegistry::new()
    }
}
