#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Strategic lint exceptions, allowed project-wide:
//
// Documentation lints: internal helpers don't need error/panic sections.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Sort keys and problem data are compared exactly; a re-run that reprints the same
// value must land on the same entry.
#![allow(clippy::float_cmp)]
//
// Cast safety: lengths and counts are bounded by file sizes.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
//
// Style/complexity
#![allow(clippy::too_many_lines)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::similar_names)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::format_push_string)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::unnecessary_wraps)]

//! Ingestion and merge engine for cycle-structured simulation logs.
//!
//! Raw log files are split into per-cycle spans by [`reader::chunk_text`], parsed into
//! [`CycleRecord`]s by a pluggable [`RecordExtractor`], optionally across a bounded worker
//! pool ([`extract`]), and folded in arrival order into a [`ColumnarSeries`] or
//! [`TallySeries`] ([`merge`]). A [`SeriesStore`] ties a series to its snapshot file and
//! refuses snapshots written by a different engine version.

/// The simlog-core crate version (matches `Cargo.toml`), used as the default snapshot tag.
pub const SIMLOG_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constants;
pub mod error;
pub mod extract;
pub mod io;
pub mod merge;
pub mod progress;
pub mod reader;
pub mod store;
pub mod types;

#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
use once_cell::sync::Lazy;

pub use constants::*;
pub use error::{Result, SimlogError};
pub use extract::{
    ExtractionCoordinator, FileRecords, extract_file, extract_file_filtered, extract_files,
    extract_files_with,
};
pub use io::{SnapshotCodec, SnapshotHeader, read_header};
pub use merge::{Series, reconcile_problem_data};
pub use progress::{NoProgress, ProgressSink, TracingProgress};
pub use reader::{ChunkConfigIssue, ChunkMarkers, RecordExtractor, chunk_file, chunk_lines, chunk_text};
pub use store::{SeriesStore, build_series_list};
pub use types::{
    ColumnarSeries, CycleInfo, CycleRecord, CycleTables, DatasetSummary, InfoSummary,
    IngestOptions, IngestOptionsBuilder, ProblemData, RunManifest, SeriesKind, SeriesSummary,
    SnapshotConfig, SubSeries, SubTable, TallySeries, Value, WorkerCount, threads_disabled_by_env,
};

#[cfg(test)]
#[allow(clippy::non_std_lazy_statics)]
static SERIAL_TEST_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialises tests that touch the process environment or spawn worker pools.
#[cfg(test)]
pub(crate) fn run_serial_test<T>(f: impl FnOnce() -> T) -> T {
    let _guard = SERIAL_TEST_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    f()
}
