//! Human and JSON summaries of an accumulated series.

use serde::{Deserialize, Serialize};

use super::series::SeriesKind;
use crate::error::Result;

const RULE: &str = "######################################################";

/// Entry count, sort-key range and field names of one columnar dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    pub entries: usize,
    pub sort_min: Option<f64>,
    pub sort_max: Option<f64>,
    pub fields: Vec<String>,
}

/// Range of one tally cycle-info column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoSummary {
    pub key: String,
    pub entries: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Provenance and shape of a series, as printed after every ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub kind: SeriesKind,
    pub version: String,
    pub sort_key: String,
    pub appended_files: Vec<String>,
    pub problem_data_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datasets: Vec<DatasetSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycle_info: Vec<InfoSummary>,
    /// Dataset names seen across the stored tally blobs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blob_keys: Vec<String>,
}

impl SeriesSummary {
    /// Render the report as plain text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!("##  Built with: simlog {} ({} series)\n", self.version, self.kind));
        out.push_str(RULE);
        out.push('\n');
        out.push_str("This series has been appended in the following order:\n");
        for file in &self.appended_files {
            out.push_str(file);
            out.push('\n');
        }
        out.push_str(RULE);
        out.push('\n');

        if !self.problem_data_keys.is_empty() {
            out.push_str("problem_data keys:\n");
            for key in &self.problem_data_keys {
                out.push_str(&format!("  {key}\n"));
            }
        }

        for dataset in &self.datasets {
            out.push_str(&format!("{}:\n", dataset.name));
            out.push_str(&format!("  #_of_entries = {}\n", dataset.entries));
            if let (Some(min), Some(max)) = (dataset.sort_min, dataset.sort_max) {
                out.push_str(&format!("  min_{0} = {min}\n  max_{0} = {max}\n", self.sort_key));
            }
            out.push_str("  keys:\n");
            for pair in dataset.fields.chunks(2) {
                out.push_str(&format!("    {}\n", pair.join("    ")));
            }
        }

        if !self.cycle_info.is_empty() {
            out.push_str("cycle_info data:\n");
            for info in &self.cycle_info {
                out.push_str(&format!("  {}: #_of_entries = {}", info.key, info.entries));
                if let (Some(min), Some(max)) = (info.min, info.max) {
                    out.push_str(&format!(", min = {min}, max = {max}"));
                }
                out.push('\n');
            }
        }
        if !self.blob_keys.is_empty() {
            out.push_str("cycle_data keys:\n");
            for key in &self.blob_keys {
                out.push_str(&format!("  {key}\n"));
            }
        }
        out.push_str(RULE);
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Min and max of a run of finite values.
pub(crate) fn min_max(values: impl IntoIterator<Item = f64>) -> (Option<f64>, Option<f64>) {
    values.into_iter().fold((None, None), |(lo, hi), v| {
        (
            Some(lo.map_or(v, |lo: f64| lo.min(v))),
            Some(hi.map_or(v, |hi: f64| hi.max(v))),
        )
    })
}
