//! Basic usage example: ingest two overlapping log files, save a snapshot, resume it.
//!
//! Run with: cargo run --example basic_usage

use std::path::PathBuf;

use tempfile::tempdir;

use simlog_core::{
    ChunkMarkers, ColumnarSeries, CycleRecord, IngestOptions, RecordExtractor, Result,
    SeriesStore, SimlogError, SnapshotConfig, TracingProgress, WorkerCount,
};

/// `step <n> t=<time>` headers followed by `name value` lines.
struct StepLog {
    markers: ChunkMarkers,
}

impl RecordExtractor for StepLog {
    fn name(&self) -> &str {
        "step_log"
    }

    fn markers(&self) -> &ChunkMarkers {
        &self.markers
    }

    fn sort_key(&self) -> &str {
        "time"
    }

    fn parse_record(&self, span: &str) -> Result<CycleRecord> {
        let mut record = CycleRecord::new();
        for line in span.lines() {
            let mut words = line.split_whitespace();
            match (words.next(), words.next(), words.next()) {
                (Some("step"), Some(step), Some(time)) => {
                    let step = parse(step)?;
                    let time = parse(time.trim_start_matches("t="))?;
                    record = record.with_info("step", step).with_info("time", time);
                }
                (Some("done"), _, _) | (None, _, _) => {}
                (Some(name), Some(value), None) => record.set_field("totals", name, parse(value)?),
                _ => return Err(SimlogError::malformed(format!("unexpected line `{line}`"))),
            }
        }
        Ok(record)
    }
}

fn parse(raw: &str) -> Result<f64> {
    raw.parse()
        .map_err(|_| SimlogError::malformed(format!("`{raw}` is not a number")))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let dir = tempdir()?;
    let first: PathBuf = dir.path().join("run1.log");
    let restart: PathBuf = dir.path().join("run2.log");
    std::fs::write(
        &first,
        "step 1 t=0.1\nmass 10\nenergy 5\nstep 2 t=0.2\nmass 10\nenergy 6\nstep 3 t=0.3\nmass 10\nenergy 7\ndone\n",
    )?;
    std::fs::write(
        &restart,
        "step 2 t=0.2\nmass 10\nenergy 6.5\nstep 3 t=0.3\nmass 9\nenergy 8\nstep 4 t=0.4\nmass 9\nenergy 9\ndone\n",
    )?;

    println!("=== simlog-core Basic Usage Example ===\n");

    let extractor = StepLog {
        markers: ChunkMarkers::new("step", "step").with_end("done"),
    };
    let options = IngestOptions::builder()
        .workers(WorkerCount::Auto)
        .append_date(true)
        .build();
    let snapshot = dir.path().join("run.snap");

    // 1. Build a series from the first run and persist it.
    let mut store = SeriesStore::<ColumnarSeries>::open_or_create(&snapshot, SnapshotConfig::default())?;
    store.append_files(&[first], &extractor, &options, &TracingProgress)?;
    store.save()?;
    println!("1. Saved snapshot to {}", snapshot.display());

    // 2. Reopen it and append the restart, which rewinds to step 2.
    let mut store = SeriesStore::<ColumnarSeries>::open(&snapshot, SnapshotConfig::default())?;
    let summary = store.append_files(&[restart], &extractor, &options, &TracingProgress)?;
    store.save()?;

    println!("2. Summary after resume:\n{}\n", summary.to_text());

    if let Some(totals) = store.series().dataset("totals") {
        println!("   time:   {:?}", totals.numbers("time").unwrap_or_default());
        println!("   energy: {:?}", totals.numbers("energy").unwrap_or_default());
    }

    println!("\n3. JSON summary:\n{}", summary.to_json()?);
    Ok(())
}
