//! Persistency module for the offline write queue
//!
//! Provides the SQLite-backed queue store using SQLx. The queue is the
//! only shared mutable resource in the engine; everything in it is scoped
//! by owner.

pub mod queue_item_repository;

use anyhow::{Context, Result};
use log::info;
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;

use queue_item_repository::QueueItemRepository;

/// Database manager for the offline queue
pub struct PersistencyManager {
    pool: Pool<Sqlite>,
    db_path: PathBuf,
}

impl PersistencyManager {
    /// Create a new persistency manager with database connection pool
    pub async fn new(data_dir: PathBuf) -> Result<Self> {
        let db_path = data_dir.join("worksite-sync.db");

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(20)
            .connect(&database_url)
            .await
            .context("Failed to connect to database")?;

        info!(
            "Initialized database connection pool at: {}",
            db_path.display()
        );

        Ok(Self { pool, db_path })
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Get the database file path
    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn queue_item_repository(&self) -> QueueItemRepository {
        QueueItemRepository::new(self.pool.clone())
    }

    /// Initialize database schema (create tables if they don't exist)
    pub async fn init_database(&self) -> Result<()> {
        info!("Initializing database schema...");

        self.create_queue_items_table().await?;

        info!("Database schema initialized successfully");
        Ok(())
    }

    async fn create_queue_items_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                item_type TEXT NOT NULL,
                payload TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                last_error TEXT,
                synced_at TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // listPending filters on (owner, status); listAll orders by created_at
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_queue_items_owner_status ON queue_items(owner_id, status)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_queue_items_owner_created ON queue_items(owner_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
