//! Shared fixtures: two small log formats and helpers to write them to disk.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use simlog_core::{ChunkMarkers, CycleRecord, RecordExtractor, Result, SimlogError, Value};

/// Hydro-style dump:
///
/// ```text
/// # cycle 3
/// time = 0.25
/// problem bins = 0, 1, 2
/// [density]
/// steel = 7.8
/// [energy]
/// spectrum = 1, 2, 3
/// # end of run
/// ```
pub struct CycleLogExtractor {
    markers: ChunkMarkers,
}

impl CycleLogExtractor {
    pub fn new() -> Self {
        Self {
            markers: ChunkMarkers::new("# cycle", "# cycle").with_end("# end of run"),
        }
    }
}

impl RecordExtractor for CycleLogExtractor {
    fn name(&self) -> &str {
        "cycle_log"
    }

    fn markers(&self) -> &ChunkMarkers {
        &self.markers
    }

    fn sort_key(&self) -> &str {
        "time"
    }

    fn parse_record(&self, span: &str) -> Result<CycleRecord> {
        let mut record = CycleRecord::new();
        let mut dataset: Option<String> = None;
        for line in span.lines().map(str::trim) {
            if let Some(cycle) = line.strip_prefix("# cycle") {
                record = record.with_info("cycle", number(cycle)?);
            } else if line.starts_with("# end") || line.is_empty() {
                continue;
            } else if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                dataset = Some(name.to_string());
            } else if let Some((key, raw)) = line.split_once('=') {
                let key = key.trim();
                let value = value(raw)?;
                if key == "time" {
                    let time = value
                        .as_number()
                        .ok_or_else(|| SimlogError::malformed("time must be a scalar"))?;
                    record = record.with_info("time", time);
                } else if let Some(problem_key) = key.strip_prefix("problem ") {
                    record = record.with_problem(problem_key.trim(), value);
                } else {
                    let dataset = dataset.as_deref().ok_or_else(|| {
                        SimlogError::malformed(format!("field `{key}` outside a [dataset]"))
                    })?;
                    record.set_field(dataset, key, value);
                }
            } else {
                return Err(SimlogError::malformed(format!("unexpected line `{line}`")));
            }
        }
        Ok(record)
    }
}

/// Tally dump with blank-line terminated blocks and no end marker:
///
/// ```text
/// cycle: 1
/// time: 0.1
/// bins: 0 1 2
/// counts: 4 5 6
///
/// ```
pub struct TallyLogExtractor {
    markers: ChunkMarkers,
}

impl TallyLogExtractor {
    pub fn new() -> Self {
        Self {
            markers: ChunkMarkers::new("cycle:", "\n"),
        }
    }
}

impl RecordExtractor for TallyLogExtractor {
    fn name(&self) -> &str {
        "tally_log"
    }

    fn markers(&self) -> &ChunkMarkers {
        &self.markers
    }

    fn sort_key(&self) -> &str {
        "time"
    }

    fn parse_record(&self, span: &str) -> Result<CycleRecord> {
        let mut record = CycleRecord::new();
        for line in span.lines().filter(|l| !l.trim().is_empty()) {
            let (key, raw) = line
                .split_once(':')
                .ok_or_else(|| SimlogError::malformed(format!("expected `key: value`, got `{line}`")))?;
            let values = raw
                .split_whitespace()
                .map(|v| v.parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| SimlogError::malformed(e.to_string()))?;
            match key.trim() {
                "cycle" | "time" => {
                    let [value] = values[..] else {
                        return Err(SimlogError::malformed(format!("`{key}` takes one value")));
                    };
                    record = record.with_info(key.trim(), value);
                }
                "bins" => record = record.with_problem("bins", values),
                other => record.set_field("tally", other, values),
            }
        }
        Ok(record)
    }
}

fn number(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| SimlogError::malformed(format!("`{}`: {e}", raw.trim())))
}

fn value(raw: &str) -> Result<Value> {
    let raw = raw.trim();
    if raw.contains(',') {
        let items = raw.split(',').map(number).collect::<Result<Vec<_>>>()?;
        return Ok(Value::from(items));
    }
    match raw.parse::<f64>() {
        Ok(n) => Ok(Value::Number(n)),
        Err(_) => Ok(Value::Text(raw.to_string())),
    }
}

/// One cycle of a [`CycleLogExtractor`] log.
pub struct Cycle {
    pub cycle: u32,
    pub time: f64,
    pub fields: Vec<(&'static str, &'static str, String)>,
}

impl Cycle {
    pub fn new(cycle: u32, time: f64) -> Self {
        Self {
            cycle,
            time,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, dataset: &'static str, key: &'static str, value: impl ToString) -> Self {
        self.fields.push((dataset, key, value.to_string()));
        self
    }
}

/// Write a cycle log; `finished` appends the end-of-run marker.
pub fn write_cycle_log(dir: &Path, name: &str, cycles: &[Cycle], finished: bool) -> PathBuf {
    let mut body = String::from("simulation banner\n");
    for cycle in cycles {
        writeln!(body, "# cycle {}", cycle.cycle).unwrap();
        writeln!(body, "time = {}", cycle.time).unwrap();
        writeln!(body, "problem bins = 0, 1, 2").unwrap();
        let mut current = "";
        for (dataset, key, value) in &cycle.fields {
            if *dataset != current {
                writeln!(body, "[{dataset}]").unwrap();
                current = *dataset;
            }
            writeln!(body, "{key} = {value}").unwrap();
        }
    }
    if finished {
        body.push_str("# end of run\n");
    }
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// Write a tally log with one block per `(cycle, time, counts)`.
pub fn write_tally_log(dir: &Path, name: &str, blocks: &[(u32, f64, Vec<f64>)], bins: &[f64]) -> PathBuf {
    let join = |values: &[f64]| {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let mut body = String::from("tally output\n\n");
    for (cycle, time, counts) in blocks {
        writeln!(body, "cycle: {cycle}").unwrap();
        writeln!(body, "time: {time}").unwrap();
        writeln!(body, "bins: {}", join(bins)).unwrap();
        writeln!(body, "counts: {}", join(counts)).unwrap();
        body.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}
