//! Persistence of accumulated series.

pub mod snapshot;

pub use snapshot::{SnapshotCodec, SnapshotHeader, read_header};
