//! Error taxonomy of the sync engine boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The item does not exist for this owner. Absent and foreign-owned
    /// items produce the same error.
    #[error("Queue item not found")]
    NotFound,

    /// Every retry attempt failed; `message` is the last handler error.
    #[error("Failed to sync item after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },

    /// No handler was registered for the item's type during a batch run.
    #[error("No handler registered for item type: {0}")]
    MissingHandler(String),

    /// Queue store failure unrelated to the handler.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
