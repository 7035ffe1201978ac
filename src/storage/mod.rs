//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite table:
//! - records(identifier, label, last_modified)

pub mod schema;
pub mod sqlite;

pub use sqlite::{RecordStore, ImportReport, Status};
