#![allow(dead_code)]
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use worksite_sync::persistency::queue_item_repository::QueueItemRepository;
use worksite_sync::persistency::PersistencyManager;
use worksite_sync::sync::handler_registry::SyncHandler;

/// Test environment backed by a fresh tempdir database
pub struct TestEnv {
    // Held so the database directory outlives the test
    _temp_dir: TempDir,
    pub persistency: Arc<PersistencyManager>,
}

impl TestEnv {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let persistency = PersistencyManager::new(temp_dir.path().join("data")).await?;
        persistency.init_database().await?;
        Ok(Self {
            _temp_dir: temp_dir,
            persistency: Arc::new(persistency),
        })
    }

    pub fn repo(&self) -> QueueItemRepository {
        self.persistency.queue_item_repository()
    }
}

/// Handler that always succeeds and counts its invocations
pub struct SucceedingHandler {
    pub calls: AtomicU32,
}

impl SucceedingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncHandler for SucceedingHandler {
    async fn apply(
        &self,
        payload: &serde_json::Value,
        _owner_id: &str,
    ) -> Result<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(payload.clone())
    }
}

/// Handler that always fails with a fixed message
pub struct FailingHandler {
    pub calls: AtomicU32,
    message: String,
}

impl FailingHandler {
    pub fn new(message: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            message: message.to_string(),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncHandler for FailingHandler {
    async fn apply(
        &self,
        _payload: &serde_json::Value,
        _owner_id: &str,
    ) -> Result<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("{}", self.message))
    }
}

/// Handler that fails its first N invocations and then succeeds
pub struct FlakyHandler {
    pub calls: AtomicU32,
    fail_first: u32,
}

impl FlakyHandler {
    pub fn new(fail_first: u32) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            fail_first,
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncHandler for FlakyHandler {
    async fn apply(
        &self,
        payload: &serde_json::Value,
        _owner_id: &str,
    ) -> Result<serde_json::Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            Err(anyhow!("transient failure"))
        } else {
            Ok(payload.clone())
        }
    }
}
