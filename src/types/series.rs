//! Accumulated series: the columnar variant and the whole-blob tally variant.
//!
//! The merge rules live in [`crate::merge`]; these types only hold the state and expose
//! read accessors. Both variants keep every per-cycle sequence index-aligned with the
//! sort-key sequence.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::{CycleTables, ProblemData};
use super::value::Value;

/// Discriminates the two series layouts, also recorded in snapshot headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Columnar,
    Tally,
}

impl SeriesKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Columnar => "columnar",
            Self::Tally => "tally",
        }
    }

    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Columnar => 1,
            Self::Tally => 2,
        }
    }

    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Columnar),
            2 => Some(Self::Tally),
            _ => None,
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Provenance: which files fed a series, in merge order, and the engine version tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    pub version: String,
    #[serde(default)]
    pub appended_files: Vec<String>,
}

impl RunManifest {
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            appended_files: Vec::new(),
        }
    }

    pub fn record_file(&mut self, identifier: impl Into<String>) {
        self.appended_files.push(identifier.into());
    }
}

/// Columns of one dataset, all of length `rows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubSeries {
    pub(crate) columns: BTreeMap<String, Vec<Value>>,
    pub(crate) rows: usize,
}

impl SubSeries {
    /// Number of accepted cycles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[must_use]
    pub fn column(&self, field: &str) -> Option<&[Value]> {
        self.columns.get(field).map(Vec::as_slice)
    }

    /// Numeric view of a column; `None` if absent or if any row is not a scalar number.
    #[must_use]
    pub fn numbers(&self, field: &str) -> Option<Vec<f64>> {
        self.columns
            .get(field)?
            .iter()
            .map(Value::as_number)
            .collect()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Columnar series: every scalar field of every dataset becomes a time-indexed column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnarSeries {
    pub manifest: RunManifest,
    #[serde(default)]
    pub problem_data: Option<ProblemData>,
    #[serde(default)]
    pub(crate) datasets: BTreeMap<String, SubSeries>,
}

impl ColumnarSeries {
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            manifest: RunManifest::new(version),
            problem_data: None,
            datasets: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn dataset(&self, name: &str) -> Option<&SubSeries> {
        self.datasets.get(name)
    }

    pub fn datasets(&self) -> impl Iterator<Item = (&str, &SubSeries)> {
        self.datasets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }
}

/// Tally series: each accepted cycle stores its whole table map as one opaque entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TallySeries {
    pub manifest: RunManifest,
    #[serde(default)]
    pub problem_data: Option<ProblemData>,
    /// Cycle-info key to its per-entry values, parallel to `cycle_data`.
    #[serde(default)]
    pub(crate) cycle_info: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub(crate) cycle_data: Vec<CycleTables>,
}

impl TallySeries {
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            manifest: RunManifest::new(version),
            problem_data: None,
            cycle_info: BTreeMap::new(),
            cycle_data: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cycle_data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cycle_data.is_empty()
    }

    /// Values of one cycle-info key, aligned with [`TallySeries::entries`].
    #[must_use]
    pub fn info_values(&self, key: &str) -> Option<&[f64]> {
        self.cycle_info.get(key).map(Vec::as_slice)
    }

    pub fn info_keys(&self) -> impl Iterator<Item = &str> {
        self.cycle_info.keys().map(String::as_str)
    }

    #[must_use]
    pub fn entries(&self) -> &[CycleTables] {
        &self.cycle_data
    }

    #[must_use]
    pub fn last_entry(&self) -> Option<&CycleTables> {
        self.cycle_data.last()
    }
}
