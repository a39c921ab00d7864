//! Record extractor contract and the cycle-boundary chunker.
//!
//! A log format plugs in through [`RecordExtractor`]: it names the markers that delimit a
//! cycle, the sort key, and how one delimited span becomes a [`CycleRecord`]. Splitting
//! the file text into spans is format-independent and lives in [`chunker`].

pub mod chunker;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use chunker::{chunk_file, chunk_lines, chunk_text};

use crate::Result;
use crate::types::CycleRecord;

/// Textual delimiters of one cycle record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMarkers {
    pub opening: String,
    pub closing: String,
    /// Marks a log that finished cleanly; when absent the trailing open span is dropped.
    #[serde(default)]
    pub end: Option<String>,
}

impl ChunkMarkers {
    pub fn new<O: Into<String>, C: Into<String>>(opening: O, closing: C) -> Self {
        Self {
            opening: opening.into(),
            closing: closing.into(),
            end: None,
        }
    }

    #[must_use]
    pub fn with_end<S: Into<String>>(mut self, end: S) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Report a configuration that cannot delimit anything.
    #[must_use]
    pub fn check(&self) -> Option<ChunkConfigIssue> {
        if self.opening.is_empty() {
            Some(ChunkConfigIssue::EmptyOpening)
        } else if self.closing.is_empty() {
            Some(ChunkConfigIssue::EmptyClosing)
        } else if self.end.as_deref() == Some("") {
            Some(ChunkConfigIssue::EmptyEnd)
        } else {
            None
        }
    }
}

/// Degenerate marker configurations. Non-fatal: the chunker yields no spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkConfigIssue {
    EmptyOpening,
    EmptyClosing,
    EmptyEnd,
}

impl fmt::Display for ChunkConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::EmptyOpening => "opening marker is empty",
            Self::EmptyClosing => "closing marker is empty",
            Self::EmptyEnd => "end marker is empty",
        };
        f.write_str(text)
    }
}

/// Trait implemented by log-format plugins that turn one cycle span into a record.
///
/// Implementations are shared across extraction workers, hence `Send + Sync`.
pub trait RecordExtractor: Send + Sync {
    /// Human-readable name used for diagnostics.
    fn name(&self) -> &str {
        "record_extractor"
    }

    /// Markers delimiting one cycle in the raw log.
    fn markers(&self) -> &ChunkMarkers;

    /// Cycle-info key used to order and deduplicate records.
    fn sort_key(&self) -> &str;

    /// Parse one span. Return [`crate::SimlogError::MalformedRecord`] for bad input.
    fn parse_record(&self, span: &str) -> Result<CycleRecord>;
}

impl<T: RecordExtractor + ?Sized> RecordExtractor for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn markers(&self) -> &ChunkMarkers {
        (**self).markers()
    }

    fn sort_key(&self) -> &str {
        (**self).sort_key()
    }

    fn parse_record(&self, span: &str) -> Result<CycleRecord> {
        (**self).parse_record(span)
    }
}

impl<T: RecordExtractor + ?Sized> RecordExtractor for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn markers(&self) -> &ChunkMarkers {
        (**self).markers()
    }

    fn sort_key(&self) -> &str {
        (**self).sort_key()
    }

    fn parse_record(&self, span: &str) -> Result<CycleRecord> {
        (**self).parse_record(span)
    }
}
