//! # Labeller - Manual Data-Labelling Tool
//!
//! Presents one unlabelled item (a URL or a local file path) at a time to a
//! human annotator and records the chosen label(s).
//!
//! Labeller provides:
//! - A SQLite-backed record store with idempotent bulk import
//! - Uniform random selection of the next unlabelled item
//! - Progress status and a tab-separated export of labelled items
//! - A small web UI for the annotation loop

pub mod record;
pub mod storage;
pub mod export;
pub mod input;
pub mod config;
pub mod server;
pub mod ui;

// Re-exports for convenient access
pub use record::{Record, LabelState, LABEL_DELIMITER};
pub use storage::{RecordStore, ImportReport, Status};
pub use config::{Settings, ItemType, WorkDir};

use std::path::PathBuf;

/// Result type alias for Labeller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Labeller operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("At least one label is required")]
    EmptyLabels,

    #[error("Invalid label {0:?}: must not contain ',', tabs or line breaks")]
    InvalidLabel(String),

    #[error("Invalid identifier {0:?}: must not contain tabs or line breaks")]
    InvalidIdentifier(String),

    #[error("Work directory not found: {} (run `labeller init` first)", .0.display())]
    WorkDirMissing(PathBuf),

    #[error("Settings file not found, looked at: {}", .0.display())]
    ConfigurationMissing(PathBuf),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Input file not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("Storage unavailable at {}: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
