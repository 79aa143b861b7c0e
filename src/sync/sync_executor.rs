//! Retry state machine for a single queue item.

use crate::persistency::queue_item_repository::{QueueItem, QueueItemRepository};
use crate::sync::errors::SyncError;
use crate::sync::handler_registry::SyncHandler;
use log::{debug, info, warn};
use std::time::Duration;

/// Retry configuration for the executor
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_ms: 1000,
        }
    }
}

pub struct SyncExecutor {
    repo: QueueItemRepository,
    retry: RetryConfig,
}

impl SyncExecutor {
    pub fn new(repo: QueueItemRepository) -> Self {
        Self::with_config(repo, RetryConfig::default())
    }

    pub fn with_config(repo: QueueItemRepository, retry: RetryConfig) -> Self {
        Self { repo, retry }
    }

    /// Drive one item to synced or record its failure.
    ///
    /// An already-synced item is returned unchanged without invoking the
    /// handler, so replaying a sync request is always safe. Otherwise the
    /// handler runs up to `max_retries` times with a linear backoff
    /// (`delay_ms * attempt`) between attempts. The backoff awaits the
    /// tokio timer; it never blocks the thread.
    ///
    /// The expected failure mode is a brief downstream contention window,
    /// not sustained outage, hence linear backoff and a small ceiling.
    pub async fn sync_one(
        &self,
        id: i64,
        owner_id: &str,
        handler: &dyn SyncHandler,
    ) -> Result<QueueItem, SyncError> {
        let item = self
            .repo
            .get_queue_item(id, owner_id)
            .await?
            .ok_or(SyncError::NotFound)?;

        if item.is_synced() {
            debug!("Queue item {} already synced, nothing to do", id);
            return Ok(item);
        }

        let mut last_message = String::new();
        for attempt in 1..=self.retry.max_retries {
            match handler.apply(&item.payload, owner_id).await {
                Ok(_) => {
                    self.repo.mark_synced(id, owner_id).await?;
                    info!(
                        "Synced queue item {} (type: {}) on attempt {}",
                        id, item.item_type, attempt
                    );
                    return self
                        .repo
                        .get_queue_item(id, owner_id)
                        .await?
                        .ok_or(SyncError::NotFound);
                }
                Err(e) => {
                    // The handler's error is opaque; it is stored and
                    // surfaced verbatim, never interpreted.
                    last_message = e.to_string();
                    warn!(
                        "Sync attempt {}/{} failed for queue item {}: {}",
                        attempt, self.retry.max_retries, id, last_message
                    );
                    if attempt < self.retry.max_retries {
                        let delay = self.retry.delay_ms * attempt as u64;
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        let message = format!(
            "Failed to sync item after {} attempts: {}",
            self.retry.max_retries, last_message
        );
        self.repo.record_failure(id, owner_id, &message).await?;

        Err(SyncError::Exhausted {
            attempts: self.retry.max_retries,
            message: last_message,
        })
    }
}
