//! Error types shared across chunking, extraction, merging and snapshot handling.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::SeriesKind;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimlogError>;

/// Every fatal condition the engine can surface.
///
/// Nothing here is retried. Callers are expected to report the message and stop, since a
/// series merged past one of these conditions cannot be trusted downstream.
#[derive(Debug, Error)]
pub enum SimlogError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("no cycle info was found (sort key `{sort_key}` is missing from the record)")]
    MissingCycleInfo { sort_key: String },

    #[error("sort key `{key}` must be a finite number, found {found}")]
    InvalidSortKey { key: String, found: String },

    #[error(
        "problem data doesn't match for `{key}`{}: previous {previous}, incoming {incoming}",
        .index.map(|i| format!("[{i}]")).unwrap_or_default()
    )]
    ProblemDataConflict {
        key: String,
        /// Element index for sequence values (`None` for scalars and length mismatches).
        index: Option<usize>,
        previous: String,
        incoming: String,
    },

    #[error(
        "series was built with version {}, this engine is version {expected}; delete the old snapshot and rebuild it",
        .found.as_deref().unwrap_or("<none>")
    )]
    VersionMismatch {
        found: Option<String>,
        expected: String,
    },

    #[error("worker for {} failed: {reason}", .path.display())]
    WorkerFailure { path: PathBuf, reason: String },

    #[error("failed to extract record {index} of {}: {source}", .path.display())]
    ExtractionFailed {
        path: PathBuf,
        index: usize,
        #[source]
        source: Box<SimlogError>,
    },

    /// Returned by record extractors for a span they cannot parse.
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },

    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    #[error("snapshot checksum mismatch (expected {expected}, found {actual})")]
    SnapshotChecksum { expected: String, actual: String },

    #[error("snapshot holds a {found} series, expected {expected}")]
    SnapshotKindMismatch {
        expected: SeriesKind,
        found: SeriesKind,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("failed to render summary: {0}")]
    Summary(#[from] serde_json::Error),

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl SimlogError {
    /// Shorthand for extractors rejecting a span.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }
}
