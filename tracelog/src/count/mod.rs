//! Frequency histograms over trace files.

mod parallel;

pub use parallel::{DEFAULT_WORKERS, count_file, count_file_with_workers};

use crate::collections::HashMap;
use crate::model::{Cluster, QuadKey, Record};
use std::fmt;

/// Section separator in the persisted result file.
pub const SECTION_SEPARATOR: &str =
    "-----------------------------------------------------------------------------";

/// The category names accepted by the interactive lookup.
pub const SECTION_NAMES: [&str; 5] = ["ThreadId", "Unit", "Area", "Cluster", "Quad"];

/// The five frequency histograms computed in count mode.
///
/// Entries are created lazily on first observation; merge order never
/// affects the final counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceCounts {
    pub tid: HashMap<i32, u64>,
    pub unit: HashMap<String, u64>,
    pub area: HashMap<String, u64>,
    pub cluster: HashMap<Cluster, u64>,
    pub quad: HashMap<QuadKey, u64>,
}

impl TraceCounts {
    pub fn new() -> TraceCounts {
        TraceCounts::default()
    }

    /// Accounts one record in all five histograms.
    pub fn observe(&mut self, record: &Record) {
        *self.tid.entry(record.tid).or_insert(0) += 1;
        *self.unit.entry(record.unit.clone()).or_insert(0) += 1;
        *self.area.entry(record.area.clone()).or_insert(0) += 1;
        *self.cluster.entry(record.cluster).or_insert(0) += 1;
        *self.quad.entry(record.cluster.quad_key()).or_insert(0) += 1;
    }

    /// Folds another set of histograms into this one.
    pub fn merge(&mut self, other: TraceCounts) {
        for (key, count) in other.tid {
            *self.tid.entry(key).or_insert(0) += count;
        }
        for (key, count) in other.unit {
            *self.unit.entry(key).or_insert(0) += count;
        }
        for (key, count) in other.area {
            *self.area.entry(key).or_insert(0) += count;
        }
        for (key, count) in other.cluster {
            *self.cluster.entry(key).or_insert(0) += count;
        }
        for (key, count) in other.quad {
            *self.quad.entry(key).or_insert(0) += count;
        }
    }

    /// Total number of records observed.
    pub fn total(&self) -> u64 {
        self.tid.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tid.is_empty()
    }

    /// Renders one histogram section by its interactive name, or `None`
    /// for an unrecognized name.
    pub fn section(&self, name: &str) -> Option<String> {
        let mut out = String::new();
        match name {
            "ThreadId" => write_section(&mut out, name, &self.tid),
            "Unit" => write_section(&mut out, name, &self.unit),
            "Area" => write_section(&mut out, name, &self.area),
            "Cluster" => write_section(&mut out, name, &self.cluster),
            "Quad" => write_section(&mut out, name, &self.quad),
            _ => return None,
        }
        .expect("formatting into a String cannot fail");
        Some(out)
    }
}

fn write_section<K: fmt::Display>(
    out: &mut impl fmt::Write,
    name: &str,
    histogram: &HashMap<K, u64>,
) -> fmt::Result {
    writeln!(out, "Total {name}: {}", histogram.values().sum::<u64>())?;
    for (key, count) in histogram {
        writeln!(out, "{name} - {key} : {count}")?;
    }
    Ok(())
}

impl fmt::Display for TraceCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in SECTION_NAMES {
            let section = self.section(name).expect("known section name");
            f.write_str(&section)?;
            writeln!(f, "{SECTION_SEPARATOR}")?;
        }
        Ok(())
    }
}
