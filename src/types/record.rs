//! One parsed cycle: cycle info, optional problem data, and named sub-tables.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::error::{Result, SimlogError};

/// Field name to value for one dataset of one cycle.
pub type SubTable = BTreeMap<String, Value>;

/// Run-invariant metadata (bin edges, geometry, ...).
pub type ProblemData = BTreeMap<String, Value>;

/// Dataset name to sub-table; the whole map is the blob stored by tally series.
pub type CycleTables = BTreeMap<String, SubTable>;

/// Small key/value map identifying a cycle (`time`, `cycle`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleInfo {
    values: BTreeMap<String, f64>,
}

impl CycleInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(key.into(), value)
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve the sort-key value, rejecting missing and non-finite keys.
    pub fn sort_value(&self, sort_key: &str) -> Result<f64> {
        let value = self
            .get(sort_key)
            .ok_or_else(|| SimlogError::MissingCycleInfo {
                sort_key: sort_key.to_string(),
            })?;
        if !value.is_finite() {
            return Err(SimlogError::InvalidSortKey {
                key: sort_key.to_string(),
                found: value.to_string(),
            });
        }
        Ok(value)
    }
}

impl FromIterator<(String, f64)> for CycleInfo {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// The structured output of a record extractor for one span.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle_info: Option<CycleInfo>,
    #[serde(default)]
    pub problem_data: Option<ProblemData>,
    #[serde(default)]
    pub tables: CycleTables,
}

impl CycleRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one cycle-info entry, creating the cycle info on first use.
    #[must_use]
    pub fn with_info(mut self, key: impl Into<String>, value: f64) -> Self {
        self.cycle_info
            .get_or_insert_with(CycleInfo::new)
            .insert(key, value);
        self
    }

    #[must_use]
    pub fn with_field(
        mut self,
        dataset: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.set_field(dataset, field, value);
        self
    }

    #[must_use]
    pub fn with_problem(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.problem_data
            .get_or_insert_with(ProblemData::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn set_field(
        &mut self,
        dataset: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.tables
            .entry(dataset.into())
            .or_default()
            .insert(field.into(), value.into());
    }

    /// Keep only the sub-table fields named in `fields` and drop datasets left empty.
    ///
    /// Cycle info and problem data are not touched.
    pub fn retain_fields(&mut self, fields: &BTreeSet<String>) {
        for table in self.tables.values_mut() {
            table.retain(|name, _| fields.contains(name));
        }
        self.tables.retain(|_, table| !table.is_empty());
    }

    /// Return the cycle info and its sort-key value, or the reason the record is unusable.
    pub fn sort_value(&self, sort_key: &str) -> Result<(&CycleInfo, f64)> {
        let info = self
            .cycle_info
            .as_ref()
            .ok_or_else(|| SimlogError::MissingCycleInfo {
                sort_key: sort_key.to_string(),
            })?;
        let value = info.sort_value(sort_key)?;
        Ok((info, value))
    }
}
