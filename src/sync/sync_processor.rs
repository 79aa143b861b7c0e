//! Batch coordinator: replays all of an owner's pending items.

use crate::persistency::queue_item_repository::QueueItemRepository;
use crate::sync::errors::SyncError;
use crate::sync::handler_registry::HandlerRegistry;
use crate::sync::sync_executor::SyncExecutor;
use anyhow::Result;
use log::{error, info, warn};
use serde::Serialize;

/// Aggregate result of one batch run. Partial success is a normal
/// outcome, not an error.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncOutcome {
    pub synced: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

pub struct SyncProcessor {
    repo: QueueItemRepository,
    executor: SyncExecutor,
}

impl SyncProcessor {
    pub fn new(repo: QueueItemRepository, executor: SyncExecutor) -> Self {
        Self { repo, executor }
    }

    /// Replay every pending item for an owner, oldest first.
    ///
    /// Items run sequentially: backoff delays stay predictable and a
    /// downstream handler is never invoked concurrently for the same
    /// user. One item's failure never aborts the loop; per-item errors
    /// are folded into the outcome as `"<id>: <error>"`.
    pub async fn sync_all(
        &self,
        owner_id: &str,
        registry: &HandlerRegistry,
    ) -> Result<SyncOutcome> {
        let pending = self.repo.get_pending_items(owner_id).await?;
        info!(
            "Starting batch sync for owner {}: {} pending items",
            owner_id,
            pending.len()
        );

        let mut outcome = SyncOutcome::default();
        for item in pending {
            match registry.resolve(&item.item_type) {
                None => {
                    let err = SyncError::MissingHandler(item.item_type.clone());
                    let message = err.to_string();
                    warn!("Queue item {}: {}", item.id, message);
                    self.repo.mark_errored(item.id, owner_id, &message).await?;
                    outcome.failed += 1;
                    outcome.errors.push(format!("{}: {}", item.id, message));
                }
                Some(handler) => {
                    match self.executor.sync_one(item.id, owner_id, handler.as_ref()).await {
                        Ok(_) => outcome.synced += 1,
                        Err(e) => {
                            error!("Failed to sync queue item {}: {}", item.id, e);
                            outcome.failed += 1;
                            outcome.errors.push(format!("{}: {}", item.id, e));
                        }
                    }
                }
            }
        }

        info!(
            "Batch sync finished for owner {}: {} synced, {} failed",
            owner_id, outcome.synced, outcome.failed
        );
        Ok(outcome)
    }
}
