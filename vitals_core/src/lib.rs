#![forbid(unsafe_code)]

//! Core domain model and business logic for the Vitals health log.
//!
//! This crate provides:
//! - Domain types (entries, patches, trends)
//! - Date-keyed persistence (SQLite)
//! - Statistics and linear weight prediction
//! - CSV/JSON export and import
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod stats;
pub mod predict;
pub mod transfer;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::{EntryStore, SqliteStore};
pub use stats::{summarize, weight_trends, Summary};
pub use predict::{predict, Prediction};
pub use transfer::TransferFormat;
