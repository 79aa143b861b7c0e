//! Sync engine: executor, batch coordinator and handler registry.

pub mod errors;
pub mod handler_registry;
pub mod sync_executor;
pub mod sync_processor;

pub use errors::SyncError;
pub use handler_registry::{HandlerRegistry, RegistryFactory, SyncHandler};
pub use sync_executor::{RetryConfig, SyncExecutor};
pub use sync_processor::{SyncOutcome, SyncProcessor};
