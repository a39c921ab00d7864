//! Builder-style options for ingest runs and the snapshot version tag.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SIMLOG_CORE_VERSION;
use crate::constants::{DEFAULT_PROGRESS_LABEL, USE_THREADS_ENV};
use crate::error::SimlogError;

fn default_progress_label() -> String {
    DEFAULT_PROGRESS_LABEL.to_string()
}

/// Requested extraction parallelism.
///
/// Serialized as `"auto"` or a non-negative integer (`0` = sequential).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "WorkerCountRepr", into = "WorkerCountRepr")]
pub enum WorkerCount {
    /// Chunk and extract one file at a time on the calling thread.
    #[default]
    Sequential,
    /// Batches of exactly this many concurrent workers.
    Fixed(NonZeroUsize),
    /// One worker per available CPU, resolved at call time.
    Auto,
}

impl WorkerCount {
    /// Build from the legacy signed convention: negative = auto, zero = sequential.
    #[must_use]
    pub fn from_signed(requested: i64) -> Self {
        if requested < 0 {
            return Self::Auto;
        }
        usize::try_from(requested)
            .ok()
            .and_then(NonZeroUsize::new)
            .map_or(Self::Sequential, Self::Fixed)
    }

    #[must_use]
    pub fn fixed(workers: usize) -> Self {
        NonZeroUsize::new(workers).map_or(Self::Sequential, Self::Fixed)
    }

    /// Number of workers per batch for this call; `0` means sequential.
    ///
    /// Honours the `SIMLOG_USE_THREADS` switch and the `parallel` feature.
    #[must_use]
    pub fn resolve(self) -> usize {
        if threads_disabled_by_env() {
            tracing::debug!(
                target = "simlog::extract",
                env = USE_THREADS_ENV,
                "worker pool disabled by environment"
            );
            return 0;
        }
        self.resolve_for_host()
    }

    #[cfg(feature = "parallel")]
    fn resolve_for_host(self) -> usize {
        match self {
            Self::Sequential => 0,
            Self::Fixed(n) => n.get(),
            Self::Auto => num_cpus::get().max(1),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn resolve_for_host(self) -> usize {
        0
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("0"),
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Auto => f.write_str("auto"),
        }
    }
}

impl FromStr for WorkerCount {
    type Err = SimlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        trimmed
            .parse::<i64>()
            .map(Self::from_signed)
            .map_err(|_| SimlogError::InvalidConfig {
                reason: format!("worker count must be `auto` or an integer, got `{trimmed}`"),
            })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WorkerCountRepr {
    Count(i64),
    Word(String),
}

impl TryFrom<WorkerCountRepr> for WorkerCount {
    type Error = SimlogError;

    fn try_from(repr: WorkerCountRepr) -> Result<Self, Self::Error> {
        match repr {
            WorkerCountRepr::Count(n) => Ok(Self::from_signed(n)),
            WorkerCountRepr::Word(word) => word.parse(),
        }
    }
}

impl From<WorkerCount> for WorkerCountRepr {
    fn from(count: WorkerCount) -> Self {
        match count {
            WorkerCount::Sequential => Self::Count(0),
            WorkerCount::Fixed(n) => Self::Count(i64::try_from(n.get()).unwrap_or(i64::MAX)),
            WorkerCount::Auto => Self::Word("auto".to_string()),
        }
    }
}

/// True when `SIMLOG_USE_THREADS` holds a false-like value.
#[must_use]
pub fn threads_disabled_by_env() -> bool {
    std::env::var(USE_THREADS_ENV).is_ok_and(|raw| {
        matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "false" | "0" | "no" | "off"
        )
    })
}

/// Tunable options for one ingest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOptions {
    #[serde(default)]
    pub workers: WorkerCount,
    /// Suffix each recorded file identifier with the local ingest date and time.
    #[serde(default)]
    pub append_date: bool,
    #[serde(default = "default_progress_label")]
    pub progress_label: String,
    /// Sub-table fields to keep; `None` keeps every field the extractor produces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeSet<String>>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            workers: WorkerCount::default(),
            append_date: false,
            progress_label: default_progress_label(),
            fields: None,
        }
    }
}

impl IngestOptions {
    /// Start a fluent builder for `IngestOptions`.
    #[must_use]
    pub fn builder() -> IngestOptionsBuilder {
        IngestOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestOptionsBuilder {
    inner: IngestOptions,
}

impl IngestOptionsBuilder {
    #[must_use]
    pub fn workers(mut self, workers: WorkerCount) -> Self {
        self.inner.workers = workers;
        self
    }

    #[must_use]
    pub fn append_date(mut self, enabled: bool) -> Self {
        self.inner.append_date = enabled;
        self
    }

    pub fn progress_label<S: Into<String>>(mut self, label: S) -> Self {
        self.inner.progress_label = label.into();
        self
    }

    /// Restrict extraction to the named sub-table fields.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn build(self) -> IngestOptions {
        self.inner
    }
}

/// Version tag threaded into the snapshot layer and stamped on new series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub version_tag: String,
}

impl SnapshotConfig {
    pub fn with_version_tag<S: Into<String>>(tag: S) -> Self {
        Self {
            version_tag: tag.into(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            version_tag: SIMLOG_CORE_VERSION.to_string(),
        }
    }
}
