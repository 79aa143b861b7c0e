//! QueueItemRepository: owner-scoped store for deferred offline mutations
//!
//! Every lookup and mutation is keyed by `(id, owner_id)` or `owner_id`;
//! an item belonging to another owner behaves exactly like a missing item.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row, Sqlite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueItemStatus {
    Pending,
    Synced,
    Errored,
}

impl QueueItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueItemStatus::Pending => "pending",
            QueueItemStatus::Synced => "synced",
            QueueItemStatus::Errored => "errored",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(QueueItemStatus::Pending),
            "synced" => Some(QueueItemStatus::Synced),
            "errored" => Some(QueueItemStatus::Errored),
            _ => None,
        }
    }
}

/// A single unit of deferred work recorded while a client was offline.
///
/// `item_type` and `payload` are opaque to the engine; the payload is
/// handed to the matching domain handler unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i64,
    pub item_type: String,
    pub payload: serde_json::Value,
    pub owner_id: String,
    pub status: QueueItemStatus,
    pub synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn is_synced(&self) -> bool {
        self.status == QueueItemStatus::Synced
    }
}

pub struct QueueItemRepository {
    pool: Pool<Sqlite>,
}

impl QueueItemRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Store a new queue item; it starts out `Pending` with no error.
    pub async fn save(
        &self,
        item_type: &str,
        payload: &serde_json::Value,
        owner_id: &str,
    ) -> Result<QueueItem> {
        let created_at = Utc::now();
        let payload_str =
            serde_json::to_string(payload).context("Failed to serialize queue item payload")?;

        let result = sqlx::query(
            r#"
            INSERT INTO queue_items (owner_id, item_type, payload, status, created_at)
            VALUES (?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(owner_id)
        .bind(item_type)
        .bind(&payload_str)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(
            "Stored queue item {} (type: {}) for owner {}",
            id, item_type, owner_id
        );

        Ok(QueueItem {
            id,
            item_type: item_type.to_string(),
            payload: payload.clone(),
            owner_id: owner_id.to_string(),
            status: QueueItemStatus::Pending,
            synced_at: None,
            last_error: None,
            created_at,
        })
    }

    /// Get a queue item by id, scoped to its owner
    pub async fn get_queue_item(&self, id: i64, owner_id: &str) -> Result<Option<QueueItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, item_type, payload, status, last_error, synced_at, created_at
            FROM queue_items WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_queue_item(row)?)),
            None => Ok(None),
        }
    }

    /// Get items still awaiting sync for an owner, oldest first.
    ///
    /// Errored items are included: an error is not terminal until the item
    /// is marked synced, so the next batch run picks them up again.
    pub async fn get_pending_items(&self, owner_id: &str) -> Result<Vec<QueueItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, item_type, payload, status, last_error, synced_at, created_at
            FROM queue_items
            WHERE owner_id = ? AND status != 'synced'
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::new();
        for row in rows {
            items.push(self.row_to_queue_item(row)?);
        }

        Ok(items)
    }

    /// Get every item for an owner, newest first (display/audit order)
    pub async fn get_all_items(&self, owner_id: &str) -> Result<Vec<QueueItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, item_type, payload, status, last_error, synced_at, created_at
            FROM queue_items
            WHERE owner_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::new();
        for row in rows {
            items.push(self.row_to_queue_item(row)?);
        }

        Ok(items)
    }

    /// Mark an item as synced: sets synced_at, clears last_error.
    /// Returns false when the item does not exist for this owner.
    pub async fn mark_synced(&self, id: i64, owner_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE queue_items
            SET status = 'synced', synced_at = ?, last_error = NULL
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!("Marked queue item {} as synced", id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Mark an item as errored with a message, without touching a handler
    pub async fn mark_errored(&self, id: i64, owner_id: &str, message: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE queue_items
            SET status = 'errored', last_error = ?, synced_at = NULL
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(message)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            warn!("Marked queue item {} as errored: {}", id, message);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Record the latest failure on an item while leaving its status alone.
    /// Used by the executor after retry exhaustion: the item stays pending
    /// and eligible for the next batch run.
    pub async fn record_failure(&self, id: i64, owner_id: &str, message: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE queue_items
            SET last_error = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(message)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            warn!("Recorded failure on queue item {}: {}", id, message);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Delete a synced item. Returns false when the item is absent, owned
    /// by someone else, or not yet synced - the three cases are
    /// indistinguishable to the caller.
    pub async fn delete_synced(&self, id: i64, owner_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM queue_items
            WHERE id = ? AND owner_id = ? AND status = 'synced'
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            debug!("Deleted synced queue item {}", id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Delete all synced items for an owner, returning how many went away
    pub async fn clear_synced(&self, owner_id: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM queue_items
            WHERE owner_id = ? AND status = 'synced'
            "#,
        )
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        debug!("Cleared {} synced queue items for owner {}", deleted, owner_id);
        Ok(deleted)
    }

    fn row_to_queue_item(&self, row: sqlx::sqlite::SqliteRow) -> Result<QueueItem> {
        let status_str: String = row.try_get("status")?;
        let status = QueueItemStatus::from_str(&status_str)
            .ok_or_else(|| anyhow::anyhow!("Unknown queue item status: {}", status_str))?;

        let payload_str: String = row.try_get("payload")?;
        let payload: serde_json::Value =
            serde_json::from_str(&payload_str).context("Failed to parse queue item payload")?;

        Ok(QueueItem {
            id: row.try_get("id")?,
            item_type: row.try_get("item_type")?,
            payload,
            owner_id: row.try_get("owner_id")?,
            status,
            synced_at: row.try_get("synced_at")?,
            last_error: row.try_get("last_error")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
