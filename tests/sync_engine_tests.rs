mod common;

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

use common::{FailingHandler, FlakyHandler, SucceedingHandler, TestEnv};
use worksite_sync::persistency::queue_item_repository::QueueItemStatus;
use worksite_sync::sync::errors::SyncError;
use worksite_sync::sync::handler_registry::HandlerRegistry;
use worksite_sync::sync::sync_executor::{RetryConfig, SyncExecutor};
use worksite_sync::sync::sync_processor::SyncProcessor;

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 3,
        delay_ms: 0,
    }
}

#[tokio::test]
async fn test_sync_one_success_marks_item_synced() -> Result<()> {
    let env = TestEnv::new().await?;
    let repo = env.repo();
    let executor = SyncExecutor::with_config(env.repo(), fast_retry());

    let item = repo.save("expense", &json!({"amount": 1000}), "u1").await?;
    let handler = SucceedingHandler::new();

    let synced = executor.sync_one(item.id, "u1", handler.as_ref()).await.unwrap();
    assert_eq!(synced.status, QueueItemStatus::Synced);
    assert!(synced.synced_at.is_some());
    assert!(synced.last_error.is_none());
    assert_eq!(handler.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_sync_one_is_idempotent_for_synced_items() -> Result<()> {
    let env = TestEnv::new().await?;
    let repo = env.repo();
    let executor = SyncExecutor::with_config(env.repo(), fast_retry());

    let item = repo.save("expense", &json!({}), "u1").await?;
    repo.mark_synced(item.id, "u1").await?;

    let handler = SucceedingHandler::new();
    let result = executor.sync_one(item.id, "u1", handler.as_ref()).await.unwrap();

    assert_eq!(result.status, QueueItemStatus::Synced);
    assert_eq!(handler.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_sync_one_not_found_for_foreign_owner() -> Result<()> {
    let env = TestEnv::new().await?;
    let repo = env.repo();
    let executor = SyncExecutor::with_config(env.repo(), fast_retry());

    let item = repo.save("expense", &json!({}), "u1").await?;
    let handler = SucceedingHandler::new();

    let err = executor
        .sync_one(item.id, "u2", handler.as_ref())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound));
    assert_eq!(handler.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_exhaustion_invokes_handler_exactly_max_retries_times() -> Result<()> {
    let env = TestEnv::new().await?;
    let repo = env.repo();
    let executor = SyncExecutor::with_config(env.repo(), fast_retry());

    let item = repo.save("expense", &json!({}), "u1").await?;
    let handler = FailingHandler::new("duplicate invoice number");

    let err = executor
        .sync_one(item.id, "u1", handler.as_ref())
        .await
        .unwrap_err();

    assert_eq!(handler.call_count(), 3);
    assert_eq!(
        err.to_string(),
        "Failed to sync item after 3 attempts: duplicate invoice number"
    );

    // The stored item keeps the full message and stays retryable
    let stored = repo.get_queue_item(item.id, "u1").await?.expect("item exists");
    assert_eq!(stored.status, QueueItemStatus::Pending);
    assert_eq!(
        stored.last_error.as_deref(),
        Some("Failed to sync item after 3 attempts: duplicate invoice number")
    );
    assert_eq!(repo.get_pending_items("u1").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() -> Result<()> {
    let env = TestEnv::new().await?;
    let repo = env.repo();
    let executor = SyncExecutor::with_config(env.repo(), fast_retry());

    let item = repo.save("expense", &json!({}), "u1").await?;
    let handler = FlakyHandler::new(1);

    let synced = executor.sync_one(item.id, "u1", handler.as_ref()).await.unwrap();
    assert_eq!(handler.call_count(), 2);
    assert_eq!(synced.status, QueueItemStatus::Synced);
    assert!(synced.last_error.is_none());
    Ok(())
}

#[tokio::test]
async fn test_partial_batch_success() -> Result<()> {
    let env = TestEnv::new().await?;
    let repo = env.repo();
    let processor = SyncProcessor::new(
        env.repo(),
        SyncExecutor::with_config(env.repo(), fast_retry()),
    );

    let ok_item = repo.save("expense", &json!({"amount": 10}), "u1").await?;
    let bad_item = repo.save("income", &json!({"amount": 20}), "u1").await?;
    let orphan = repo.save("mystery", &json!({}), "u1").await?;

    let mut registry = HandlerRegistry::new();
    registry.register("expense", SucceedingHandler::new());
    registry.register("income", FailingHandler::new("ledger closed"));

    let outcome = processor.sync_all("u1", &registry).await?;

    assert_eq!(outcome.synced, 1);
    assert_eq!(outcome.failed, 2);
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome
        .errors
        .iter()
        .any(|e| e.contains("No handler registered for item type: mystery")));

    // Per-item stored state reflects each path
    let ok_stored = repo.get_queue_item(ok_item.id, "u1").await?.unwrap();
    assert_eq!(ok_stored.status, QueueItemStatus::Synced);

    let bad_stored = repo.get_queue_item(bad_item.id, "u1").await?.unwrap();
    assert_eq!(bad_stored.status, QueueItemStatus::Pending);
    assert!(bad_stored.last_error.as_deref().unwrap().contains("ledger closed"));

    let orphan_stored = repo.get_queue_item(orphan.id, "u1").await?.unwrap();
    assert_eq!(orphan_stored.status, QueueItemStatus::Errored);
    Ok(())
}

#[tokio::test]
async fn test_one_failure_does_not_abort_the_batch() -> Result<()> {
    let env = TestEnv::new().await?;
    let repo = env.repo();
    let processor = SyncProcessor::new(
        env.repo(),
        SyncExecutor::with_config(env.repo(), fast_retry()),
    );

    // Failing item comes first in FIFO order
    repo.save("income", &json!({}), "u1").await?;
    repo.save("expense", &json!({}), "u1").await?;

    let mut registry = HandlerRegistry::new();
    registry.register("income", FailingHandler::new("boom"));
    let expense_handler = SucceedingHandler::new();
    registry.register("expense", expense_handler.clone());

    let outcome = processor.sync_all("u1", &registry).await?;
    assert_eq!(outcome.synced, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(expense_handler.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_offline_expense_lifecycle() -> Result<()> {
    let env = TestEnv::new().await?;
    let repo = env.repo();
    let processor = SyncProcessor::new(
        env.repo(),
        SyncExecutor::with_config(env.repo(), fast_retry()),
    );

    repo.save("expense", &json!({"amount": 1000}), "u1").await?;

    let pending = repo.get_pending_items("u1").await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status, QueueItemStatus::Pending);

    let mut registry = HandlerRegistry::new();
    registry.register("expense", SucceedingHandler::new());

    let outcome = processor.sync_all("u1", &registry).await?;
    assert_eq!(outcome.synced, 1);
    assert_eq!(outcome.failed, 0);

    assert!(repo.get_pending_items("u1").await?.is_empty());
    assert_eq!(repo.clear_synced("u1").await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_handlers_receive_payload_and_owner() -> Result<()> {
    use async_trait::async_trait;
    use std::sync::Mutex;
    use worksite_sync::sync::handler_registry::SyncHandler;

    struct RecordingHandler {
        seen: Mutex<Vec<(serde_json::Value, String)>>,
    }

    #[async_trait]
    impl SyncHandler for RecordingHandler {
        async fn apply(
            &self,
            payload: &serde_json::Value,
            owner_id: &str,
        ) -> Result<serde_json::Value> {
            self.seen
                .lock()
                .unwrap()
                .push((payload.clone(), owner_id.to_string()));
            Ok(json!({}))
        }
    }

    let env = TestEnv::new().await?;
    let repo = env.repo();
    let executor = SyncExecutor::with_config(env.repo(), fast_retry());

    let item = repo
        .save("expense", &json!({"amount": 42, "note": "cement"}), "u7")
        .await?;

    let handler = Arc::new(RecordingHandler {
        seen: Mutex::new(Vec::new()),
    });
    executor.sync_one(item.id, "u7", handler.as_ref()).await.unwrap();

    let seen = handler.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, json!({"amount": 42, "note": "cement"}));
    assert_eq!(seen[0].1, "u7");
    Ok(())
}
