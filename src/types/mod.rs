//! Public types exposed by the `simlog-core` crate.

pub mod options;
pub mod record;
pub mod series;
pub mod summary;
pub mod value;

pub use options::{
    IngestOptions, IngestOptionsBuilder, SnapshotConfig, WorkerCount, threads_disabled_by_env,
};
pub use record::{CycleInfo, CycleRecord, CycleTables, ProblemData, SubTable};
pub use series::{ColumnarSeries, RunManifest, SeriesKind, SubSeries, TallySeries};
pub use summary::{DatasetSummary, InfoSummary, SeriesSummary};
pub use value::Value;
