//! Integration tests for whole-blob tally series.

mod support;

use simlog_core::{
    IngestOptions, NoProgress, SeriesStore, SimlogError, SnapshotConfig, TallySeries, Value,
    WorkerCount,
};
use support::{TallyLogExtractor, write_tally_log};
use tempfile::TempDir;

const BINS: [f64; 3] = [0.0, 1.0, 2.0];

#[test]
fn blocks_are_stored_whole_and_replaced_on_equal_time() {
    let dir = TempDir::new().unwrap();
    let first = write_tally_log(
        dir.path(),
        "tally_a.out",
        &[
            (1, 0.5, vec![1.0, 2.0]),
            (2, 1.0, vec![3.0, 4.0]),
            (3, 1.5, vec![5.0, 6.0]),
        ],
        &BINS,
    );
    let rerun = write_tally_log(dir.path(), "tally_b.out", &[(2, 1.0, vec![30.0, 40.0])], &BINS);

    let mut store = SeriesStore::<TallySeries>::create(SnapshotConfig::default());
    let summary = store
        .append_files(
            &[first, rerun],
            &TallyLogExtractor::new(),
            &IngestOptions::builder().workers(WorkerCount::fixed(2)).build(),
            &NoProgress,
        )
        .unwrap();

    let series = store.series();
    assert_eq!(series.info_values("time"), Some(&[0.5, 1.0][..]));
    assert_eq!(series.info_values("cycle"), Some(&[1.0, 2.0][..]));
    assert_eq!(
        series.last_entry().unwrap()["tally"]["counts"],
        Value::from(vec![30.0, 40.0])
    );
    assert_eq!(series.problem_data.as_ref().unwrap()["bins"], Value::from(BINS.to_vec()));
    assert_eq!(summary.blob_keys, vec!["tally"]);
}

#[test]
fn trailing_block_without_blank_line_is_dropped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.out");
    std::fs::write(
        &path,
        "cycle: 1\ntime: 1\ncounts: 1 2\n\ncycle: 2\ntime: 2\ncounts: 3 4\n",
    )
    .unwrap();

    let mut store = SeriesStore::<TallySeries>::create(SnapshotConfig::default());
    store
        .append_files(&[path], &TallyLogExtractor::new(), &IngestOptions::default(), &NoProgress)
        .unwrap();
    assert_eq!(store.series().len(), 1);
}

#[test]
fn changed_bins_between_files_is_a_conflict() {
    let dir = TempDir::new().unwrap();
    let first = write_tally_log(dir.path(), "a.out", &[(1, 1.0, vec![1.0])], &BINS);
    let second = write_tally_log(dir.path(), "b.out", &[(2, 2.0, vec![2.0])], &[0.0, 1.5, 2.0]);

    let mut store = SeriesStore::<TallySeries>::create(SnapshotConfig::default());
    let err = store
        .append_files(
            &[first, second],
            &TallyLogExtractor::new(),
            &IngestOptions::default(),
            &NoProgress,
        )
        .unwrap_err();

    match &err {
        SimlogError::ProblemDataConflict { key, index, .. } => {
            assert_eq!(key, "bins");
            assert_eq!(*index, Some(1));
        }
        other => panic!("unexpected error: {other}"),
    }
    // The first file was fully merged before the conflict and stays merged.
    assert_eq!(store.series().len(), 1);
    assert_eq!(store.series().manifest.appended_files, vec!["a.out"]);
}
