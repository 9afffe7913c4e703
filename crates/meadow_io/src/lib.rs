//! # Meadow IO
//!
//! Persistence layer for the Meadow simulation.
//!
//! This crate provides:
//! - Structured error handling with a custom error type
//! - Gzip-compressed, versioned snapshot files
//! - An append-only JSON Lines event log
//! - JSON helpers for reports

/// Error types and result aliases for I/O operations
pub mod error;
/// Append-only event log
pub mod events;
/// Snapshot save and load
pub mod persistence;
/// Validated JSON helpers
pub mod serialization;

pub use error::{IoError, Result};
pub use events::EventLog;
pub use persistence::{load_snapshot, save_snapshot};
pub use serialization::{from_json, read_json_file, to_json, to_json_pretty, write_json_file};
