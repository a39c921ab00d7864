//! Columnar merge: every field of every dataset becomes a sort-key-aligned column.

use std::collections::BTreeMap;

use crate::error::{Result, SimlogError};
use crate::types::summary::min_max;
use crate::types::{
    ColumnarSeries, CycleInfo, CycleRecord, DatasetSummary, SeriesKind, SeriesSummary, SubSeries,
    SubTable, Value,
};

use super::{Placement, place, reconcile_problem_data};

impl ColumnarSeries {
    /// Fold one record into the series.
    ///
    /// Each non-empty sub-table of the record updates the dataset of the same name. A new
    /// dataset is seeded from the record; an existing one has its stale tail evicted, then
    /// gets a zero placeholder in every column which the record's fields overwrite. Cycle
    /// info fields are written as columns too and win over same-named table fields.
    pub fn merge_cycle(&mut self, record: &CycleRecord, sort_key: &str) -> Result<()> {
        let (info, t_new) = record.sort_value(sort_key)?;

        // Resolve placement for every existing dataset before mutating anything.
        let mut plans = Vec::with_capacity(record.tables.len());
        for (name, table) in &record.tables {
            if table.is_empty() {
                continue;
            }
            let plan = match self.datasets.get(name) {
                Some(sub) => Some(place(&sub.sort_keys(name, sort_key)?, t_new)),
                None => None,
            };
            plans.push((name, table, plan));
        }

        reconcile_problem_data(&mut self.problem_data, record.problem_data.as_ref())?;

        for (name, table, plan) in plans {
            match (plan, self.datasets.get_mut(name)) {
                (Some((keep, placement)), Some(sub)) => {
                    sub.truncate(name, keep);
                    sub.write_row(placement, table, info);
                }
                _ => {
                    tracing::debug!(target = "simlog::merge", dataset = %name, "new dataset");
                    self.datasets
                        .insert(name.clone(), SubSeries::seeded(table, info));
                }
            }
        }
        Ok(())
    }

    /// Per-dataset entry counts, sort-key ranges and field names.
    #[must_use]
    pub fn summary(&self, sort_key: &str) -> SeriesSummary {
        let datasets = self
            .datasets
            .iter()
            .map(|(name, sub)| {
                let (sort_min, sort_max) = min_max(sub.numbers(sort_key).unwrap_or_default());
                DatasetSummary {
                    name: name.clone(),
                    entries: sub.len(),
                    sort_min,
                    sort_max,
                    fields: sub.field_names().map(str::to_string).collect(),
                }
            })
            .collect();
        SeriesSummary {
            kind: SeriesKind::Columnar,
            version: self.manifest.version.clone(),
            sort_key: sort_key.to_string(),
            appended_files: self.manifest.appended_files.clone(),
            problem_data_keys: self
                .problem_data
                .as_ref()
                .map(|data| data.keys().cloned().collect())
                .unwrap_or_default(),
            datasets,
            cycle_info: Vec::new(),
            blob_keys: Vec::new(),
        }
    }
}

impl SubSeries {
    fn seeded(table: &SubTable, info: &CycleInfo) -> Self {
        let mut columns: BTreeMap<String, Vec<Value>> = table
            .iter()
            .map(|(field, value)| (field.clone(), vec![value.clone()]))
            .collect();
        for (key, value) in info.iter() {
            columns.insert(key.to_string(), vec![Value::Number(value)]);
        }
        Self { columns, rows: 1 }
    }

    fn sort_keys(&self, dataset: &str, sort_key: &str) -> Result<Vec<f64>> {
        let column = self
            .columns
            .get(sort_key)
            .ok_or_else(|| SimlogError::InvalidConfig {
                reason: format!(
                    "dataset `{dataset}` has no `{sort_key}` column; it was built with a different sort key"
                ),
            })?;
        Ok(column
            .iter()
            .map(|value| value.as_number().unwrap_or(f64::NAN))
            .collect())
    }

    fn truncate(&mut self, dataset: &str, keep: usize) {
        if keep >= self.rows {
            return;
        }
        tracing::debug!(
            target = "simlog::merge",
            dataset,
            evicted = self.rows - keep,
            "evicting superseded entries"
        );
        for column in self.columns.values_mut() {
            column.truncate(keep);
        }
        self.rows = keep;
    }

    fn write_row(&mut self, placement: Placement, table: &SubTable, info: &CycleInfo) {
        let row = match placement {
            Placement::Replace(row) => {
                for column in self.columns.values_mut() {
                    column[row] = Value::zero();
                }
                row
            }
            Placement::Append => {
                for column in self.columns.values_mut() {
                    column.push(Value::zero());
                }
                self.rows += 1;
                self.rows - 1
            }
        };

        for (field, value) in table {
            self.set(field, row, value.clone());
        }
        for (key, value) in info.iter() {
            self.set(key, row, Value::Number(value));
        }
    }

    /// Set one cell, creating a zero-filled column for a first-seen field.
    fn set(&mut self, field: &str, row: usize, value: Value) {
        let rows = self.rows;
        let column = self
            .columns
            .entry(field.to_string())
            .or_insert_with(|| vec![Value::zero(); rows]);
        column[row] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProblemData;

    fn record(time: f64, fields: &[(&str, f64)]) -> CycleRecord {
        fields
            .iter()
            .fold(CycleRecord::new().with_info("time", time), |rec, (k, v)| {
                rec.with_field("K", *k, *v)
            })
    }

    fn merge_all(series: &mut ColumnarSeries, records: &[CycleRecord]) {
        for rec in records {
            series.merge_cycle(rec, "time").unwrap();
        }
    }

    fn assert_aligned(series: &ColumnarSeries) {
        for (_, sub) in series.datasets() {
            for (field, column) in sub.columns() {
                assert_eq!(column.len(), sub.len(), "column {field}");
            }
        }
    }

    #[test]
    fn first_record_seeds_dataset_with_cycle_info() {
        let mut series = ColumnarSeries::new("1.0");
        let rec = record(1.0, &[("a", 10.0)]).with_info("cycle", 7.0);
        series.merge_cycle(&rec, "time").unwrap();

        let sub = series.dataset("K").unwrap();
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.numbers("a"), Some(vec![10.0]));
        assert_eq!(sub.numbers("time"), Some(vec![1.0]));
        assert_eq!(sub.numbers("cycle"), Some(vec![7.0]));
    }

    #[test]
    fn remerging_same_record_is_idempotent() {
        let mut series = ColumnarSeries::new("1.0");
        let rec = record(1.0, &[("a", 10.0), ("b", 20.0)]);
        series.merge_cycle(&rec, "time").unwrap();
        let once = series.clone();
        series.merge_cycle(&rec, "time").unwrap();
        assert_eq!(series, once);
    }

    #[test]
    fn earlier_time_supersedes_tail() {
        let mut series = ColumnarSeries::new("1.0");
        let records: Vec<_> = (1..=4)
            .map(|t| record(f64::from(t), &[("a", f64::from(t) * 10.0)]))
            .collect();
        merge_all(&mut series, &records);

        series
            .merge_cycle(&record(2.0, &[("a", 99.0)]), "time")
            .unwrap();

        let sub = series.dataset("K").unwrap();
        assert_eq!(sub.numbers("time"), Some(vec![1.0, 2.0]));
        assert_eq!(sub.numbers("a"), Some(vec![10.0, 99.0]));
    }

    #[test]
    fn record_between_keys_truncates_then_appends() {
        let mut series = ColumnarSeries::new("1.0");
        merge_all(
            &mut series,
            &[record(1.0, &[("a", 1.0)]), record(3.0, &[("a", 3.0)])],
        );
        series.merge_cycle(&record(2.0, &[("a", 2.0)]), "time").unwrap();
        let sub = series.dataset("K").unwrap();
        assert_eq!(sub.numbers("time"), Some(vec![1.0, 2.0]));

        series.merge_cycle(&record(0.5, &[("a", 0.5)]), "time").unwrap();
        let sub = series.dataset("K").unwrap();
        assert_eq!(sub.numbers("time"), Some(vec![0.5]));
        assert_eq!(sub.numbers("a"), Some(vec![0.5]));
    }

    #[test]
    fn new_and_missing_fields_are_backfilled_with_zero() {
        let mut series = ColumnarSeries::new("1.0");
        merge_all(
            &mut series,
            &[
                record(1.0, &[("a", 1.0), ("b", 2.0)]),
                record(2.0, &[("a", 3.0), ("c", 4.0)]),
            ],
        );
        let sub = series.dataset("K").unwrap();
        assert_eq!(sub.numbers("a"), Some(vec![1.0, 3.0]));
        assert_eq!(sub.numbers("b"), Some(vec![2.0, 0.0]));
        assert_eq!(sub.numbers("c"), Some(vec![0.0, 4.0]));
        assert_aligned(&series);
    }

    #[test]
    fn replacement_clears_fields_the_new_record_lacks() {
        let mut series = ColumnarSeries::new("1.0");
        merge_all(
            &mut series,
            &[
                record(1.0, &[("a", 1.0), ("b", 2.0)]),
                record(1.0, &[("a", 5.0)]),
            ],
        );
        let sub = series.dataset("K").unwrap();
        assert_eq!(sub.numbers("a"), Some(vec![5.0]));
        assert_eq!(sub.numbers("b"), Some(vec![0.0]));
    }

    #[test]
    fn cycle_info_wins_over_table_field() {
        let mut series = ColumnarSeries::new("1.0");
        let rec = record(4.0, &[("time", 123.0)]);
        series.merge_cycle(&rec, "time").unwrap();
        series.merge_cycle(&record(5.0, &[]).with_field("K", "time", -1.0), "time").unwrap();
        assert_eq!(series.dataset("K").unwrap().numbers("time"), Some(vec![4.0, 5.0]));
    }

    #[test]
    fn datasets_evolve_independently() {
        let mut series = ColumnarSeries::new("1.0");
        series
            .merge_cycle(&record(1.0, &[("a", 1.0)]).with_field("L", "x", 1.0), "time")
            .unwrap();
        series.merge_cycle(&record(2.0, &[("a", 2.0)]), "time").unwrap();
        series
            .merge_cycle(&CycleRecord::new().with_info("time", 3.0).with_field("L", "x", 3.0), "time")
            .unwrap();

        assert_eq!(series.dataset("K").unwrap().numbers("time"), Some(vec![1.0, 2.0]));
        assert_eq!(series.dataset("L").unwrap().numbers("time"), Some(vec![1.0, 3.0]));
        assert_aligned(&series);
    }

    #[test]
    fn empty_tables_are_skipped() {
        let mut series = ColumnarSeries::new("1.0");
        let mut rec = record(1.0, &[("a", 1.0)]);
        rec.tables.insert("empty".into(), SubTable::new());
        series.merge_cycle(&rec, "time").unwrap();
        assert!(series.dataset("empty").is_none());
    }

    #[test]
    fn sequences_and_text_are_columnised() {
        let mut series = ColumnarSeries::new("1.0");
        let rec = CycleRecord::new()
            .with_info("time", 1.0)
            .with_field("K", "bins", vec![1.0, 2.0])
            .with_field("K", "label", "warm");
        series.merge_cycle(&rec, "time").unwrap();
        series.merge_cycle(&record(2.0, &[("a", 1.0)]), "time").unwrap();

        let sub = series.dataset("K").unwrap();
        assert_eq!(
            sub.column("bins").unwrap(),
            &[Value::from(vec![1.0, 2.0]), Value::zero()]
        );
        assert_eq!(sub.column("label").unwrap()[0], Value::from("warm"));
    }

    #[test]
    fn missing_cycle_info_commits_nothing() {
        let mut series = ColumnarSeries::new("1.0");
        series.merge_cycle(&record(1.0, &[("a", 1.0)]), "time").unwrap();
        let before = series.clone();

        let orphan = CycleRecord::new()
            .with_field("K", "a", 2.0)
            .with_problem("mass", 1.0);
        let err = series.merge_cycle(&orphan, "time").unwrap_err();
        assert!(matches!(err, SimlogError::MissingCycleInfo { .. }));
        assert_eq!(series, before);
    }

    #[test]
    fn problem_conflict_leaves_series_untouched() {
        let mut series = ColumnarSeries::new("1.0");
        series
            .merge_cycle(&record(1.0, &[("a", 1.0)]).with_problem("mass", 2.0), "time")
            .unwrap();
        let before = series.clone();

        let bad = record(2.0, &[("a", 2.0)]).with_problem("mass", 3.0);
        let err = series.merge_cycle(&bad, "time").unwrap_err();
        assert!(matches!(err, SimlogError::ProblemDataConflict { .. }));
        assert_eq!(series, before);
        assert_eq!(
            series.problem_data,
            Some(ProblemData::from([("mass".to_string(), Value::from(2.0))]))
        );
    }

    #[test]
    fn summary_reports_ranges_and_fields() {
        let mut series = ColumnarSeries::new("1.0");
        merge_all(
            &mut series,
            &[record(1.0, &[("a", 1.0)]), record(3.0, &[("b", 1.0)])],
        );
        series.manifest.record_file("run1.log");
        let summary = series.summary("time");
        assert_eq!(summary.appended_files, vec!["run1.log"]);
        let dataset = &summary.datasets[0];
        assert_eq!(dataset.entries, 2);
        assert_eq!((dataset.sort_min, dataset.sort_max), (Some(1.0), Some(3.0)));
        assert_eq!(dataset.fields, vec!["a", "b", "time"]);
    }
}
