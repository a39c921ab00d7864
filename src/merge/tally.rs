//! Tally merge: each accepted cycle keeps its whole table map as one opaque entry.

use std::collections::BTreeSet;

use crate::error::{Result, SimlogError};
use crate::types::summary::min_max;
use crate::types::{
    CycleInfo, CycleRecord, CycleTables, InfoSummary, SeriesKind, SeriesSummary, TallySeries,
};

use super::{Placement, place, reconcile_problem_data};

impl TallySeries {
    /// Fold one record into the series, replacing or appending its table map as a whole.
    ///
    /// Cycle-info columns stay aligned with the entries: a key the record lacks gets `0.0`
    /// and a first-seen key is back-filled with `0.0`.
    pub fn merge_cycle(&mut self, record: &CycleRecord, sort_key: &str) -> Result<()> {
        let (info, t_new) = record.sort_value(sort_key)?;

        let keys = match self.cycle_info.get(sort_key) {
            Some(keys) => keys.as_slice(),
            None if self.cycle_data.is_empty() => &[][..],
            None => {
                return Err(SimlogError::InvalidConfig {
                    reason: format!(
                        "tally series has no `{sort_key}` cycle info; it was built with a different sort key"
                    ),
                });
            }
        };
        let (keep, placement) = place(keys, t_new);

        reconcile_problem_data(&mut self.problem_data, record.problem_data.as_ref())?;

        if keep < self.cycle_data.len() {
            tracing::debug!(
                target = "simlog::merge",
                evicted = self.cycle_data.len() - keep,
                "evicting superseded tally entries"
            );
            self.cycle_data.truncate(keep);
            for column in self.cycle_info.values_mut() {
                column.truncate(keep);
            }
        }

        let tables: CycleTables = record
            .tables
            .iter()
            .filter(|(_, table)| !table.is_empty())
            .map(|(name, table)| (name.clone(), table.clone()))
            .collect();

        let row = match placement {
            Placement::Replace(row) => {
                self.cycle_data[row] = tables;
                for column in self.cycle_info.values_mut() {
                    column[row] = 0.0;
                }
                row
            }
            Placement::Append => {
                self.cycle_data.push(tables);
                for column in self.cycle_info.values_mut() {
                    column.push(0.0);
                }
                self.cycle_data.len() - 1
            }
        };
        self.write_info(row, info);
        Ok(())
    }

    fn write_info(&mut self, row: usize, info: &CycleInfo) {
        let rows = self.cycle_data.len();
        for (key, value) in info.iter() {
            let column = self
                .cycle_info
                .entry(key.to_string())
                .or_insert_with(|| vec![0.0; rows]);
            column[row] = value;
        }
    }

    /// Cycle-info ranges and the dataset names present across stored entries.
    #[must_use]
    pub fn summary(&self, sort_key: &str) -> SeriesSummary {
        let cycle_info = self
            .cycle_info
            .iter()
            .map(|(key, values)| {
                let (min, max) = min_max(values.iter().copied());
                InfoSummary {
                    key: key.clone(),
                    entries: values.len(),
                    min,
                    max,
                }
            })
            .collect();
        let blob_keys: BTreeSet<&String> =
            self.cycle_data.iter().flat_map(CycleTables::keys).collect();

        SeriesSummary {
            kind: SeriesKind::Tally,
            version: self.manifest.version.clone(),
            sort_key: sort_key.to_string(),
            appended_files: self.manifest.appended_files.clone(),
            problem_data_keys: self
                .problem_data
                .as_ref()
                .map(|data| data.keys().cloned().collect())
                .unwrap_or_default(),
            datasets: Vec::new(),
            cycle_info,
            blob_keys: blob_keys.into_iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn record(time: f64, counts: Vec<f64>) -> CycleRecord {
        CycleRecord::new()
            .with_info("time", time)
            .with_field("tally", "counts", counts)
    }

    fn times(series: &TallySeries) -> Vec<f64> {
        series.info_values("time").unwrap_or_default().to_vec()
    }

    #[test]
    fn equal_key_replaces_in_place() {
        let mut series = TallySeries::new("1.0");
        series.merge_cycle(&record(1.0, vec![1.0]), "time").unwrap();
        series.merge_cycle(&record(2.0, vec![2.0]), "time").unwrap();
        series.merge_cycle(&record(2.0, vec![9.0, 9.0]), "time").unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(times(&series), vec![1.0, 2.0]);
        assert_eq!(
            series.last_entry().unwrap()["tally"]["counts"],
            Value::from(vec![9.0, 9.0])
        );
    }

    #[test]
    fn greater_keys_are_evicted_before_append() {
        let mut series = TallySeries::new("1.0");
        for t in 1..=4 {
            series
                .merge_cycle(&record(f64::from(t), vec![f64::from(t)]), "time")
                .unwrap();
        }
        series.merge_cycle(&record(2.5, vec![0.0]), "time").unwrap();
        assert_eq!(times(&series), vec![1.0, 2.0, 2.5]);
        assert_eq!(series.entries().len(), 3);
    }

    #[test]
    fn record_older_than_everything_is_kept() {
        let mut series = TallySeries::new("1.0");
        series.merge_cycle(&record(5.0, vec![5.0]), "time").unwrap();
        series.merge_cycle(&record(6.0, vec![6.0]), "time").unwrap();
        series.merge_cycle(&record(1.0, vec![1.0]), "time").unwrap();
        assert_eq!(times(&series), vec![1.0]);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn info_columns_stay_aligned() {
        let mut series = TallySeries::new("1.0");
        series.merge_cycle(&record(1.0, vec![1.0]), "time").unwrap();
        series
            .merge_cycle(&record(2.0, vec![2.0]).with_info("cycle", 20.0), "time")
            .unwrap();
        series.merge_cycle(&record(3.0, vec![3.0]), "time").unwrap();

        assert_eq!(series.info_values("cycle"), Some(&[0.0, 20.0, 0.0][..]));
        for key in series.info_keys() {
            assert_eq!(series.info_values(key).unwrap().len(), series.len());
        }
    }

    #[test]
    fn failures_leave_series_untouched() {
        let mut series = TallySeries::new("1.0");
        series
            .merge_cycle(&record(1.0, vec![1.0]).with_problem("bins", vec![0.0, 1.0]), "time")
            .unwrap();
        let before = series.clone();

        let conflicting = record(0.5, vec![1.0]).with_problem("bins", vec![0.0, 2.0]);
        assert!(series.merge_cycle(&conflicting, "time").is_err());
        let orphan = CycleRecord::new().with_field("tally", "counts", 1.0);
        assert!(series.merge_cycle(&orphan, "time").is_err());
        assert_eq!(series, before);
    }

    #[test]
    fn summary_lists_info_and_blob_keys() {
        let mut series = TallySeries::new("1.0");
        series.merge_cycle(&record(1.0, vec![1.0]), "time").unwrap();
        series
            .merge_cycle(&record(2.0, vec![2.0]).with_field("other", "x", 1.0), "time")
            .unwrap();
        let summary = series.summary("time");
        assert_eq!(summary.blob_keys, vec!["other", "tally"]);
        assert_eq!(summary.cycle_info[0].key, "time");
        assert_eq!(summary.cycle_info[0].max, Some(2.0));
        assert!(summary.to_text().contains("cycle_data keys"));
    }
}
