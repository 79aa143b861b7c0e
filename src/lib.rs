//! Worksite offline sync engine
//!
//! Server-side queue and replay engine for mutations recorded by
//! disconnected mobile clients. Domain services register handlers per
//! item type; the engine itself knows nothing about domains.

pub mod api;
pub mod app_state;
pub mod config;
pub mod log_appender;
pub mod persistency;
pub mod sync;
