// Cross-unit aggregation of header parse time
//
// Every Source interval adds its duration to its path's total and own time.
// Every resolved child then subtracts its duration from its parent's own
// time. Summing total time over all headers double-counts nested time; own
// time sums to the time spent in top-level files.

use super::containment::{resolve_parents, resolve_parents_pairwise, ParentMap};
use crate::config::{OverlapPolicy, Settings};
use crate::trace::{TraceInterval, UnitTrace};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

const MICROS_PER_SEC: f64 = 1e6;

/// Accumulated parse time for one header path, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeaderAggregate {
    pub total_secs: f64,
    pub own_secs: f64,
    /// Number of `Source` occurrences across all units
    pub count: u64,
}

/// Per-header report row, times in milliseconds
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRow {
    pub path: String,
    pub count: u64,
    pub own_ms: f64,
    pub total_ms: f64,
    pub avg_own_ms: f64,
    pub avg_total_ms: f64,
}

/// Per-folder report row
#[derive(Debug, Clone, PartialEq)]
pub struct FolderRow {
    pub folder: String,
    pub own_ms: f64,
}

/// Flat category total, in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub name: String,
    pub secs: f64,
}

/// Headline numbers for the stdout summary
#[derive(Debug, Clone, PartialEq)]
pub struct AttributionSummary {
    /// Sum of total time over all headers (nested time counted repeatedly)
    pub total_header_secs: f64,
    /// Sum of own time over all headers
    pub own_header_secs: f64,
    pub units: usize,
    /// Units whose intervals partially overlapped
    pub overlapping_units: Vec<PathBuf>,
    /// Malformed trace events dropped across all units
    pub skipped_events: usize,
    /// `Source` occurrences attributed under their raw, uncanonicalized path
    pub unresolved_paths: usize,
}

/// Data-quality issues found while folding one unit in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitFindings {
    /// Header paths parsed more than once, minus the allow-list
    pub duplicates: Vec<String>,
    /// Paths of the first partially overlapping pair, if any
    pub overlap: Option<(String, String)>,
}

impl UnitFindings {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.overlap.is_none()
    }
}

/// Header paths seen more than once in a unit, minus allow-listed suffixes
pub fn find_duplicates<'a>(sources: &'a [TraceInterval], allow_list: &[String]) -> Vec<&'a str> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for interval in sources {
        *seen.entry(interval.path()).or_default() += 1;
    }

    let mut duplicates: Vec<&str> = seen
        .into_iter()
        .filter(|(path, count)| *count > 1 && !allow_list.iter().any(|s| path.ends_with(s.as_str())))
        .map(|(path, _)| path)
        .collect();
    duplicates.sort_unstable();
    duplicates
}

/// Parent directory of a header path
pub fn folder_of(path: &str) -> String {
    Path::new(path)
        .parent()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Accumulates header, folder and category time across translation units
#[derive(Debug, Clone)]
pub struct Aggregator {
    allow_list: Vec<String>,
    policy: OverlapPolicy,
    headers: BTreeMap<String, HeaderAggregate>,
    /// Microseconds, keyed by full event name
    categories: BTreeMap<String, f64>,
    units: usize,
    overlapping_units: Vec<PathBuf>,
    skipped_events: usize,
    unresolved_paths: usize,
}

impl Aggregator {
    pub fn new(allow_list: Vec<String>, policy: OverlapPolicy) -> Self {
        Self {
            allow_list,
            policy,
            headers: BTreeMap::new(),
            categories: BTreeMap::new(),
            units: 0,
            overlapping_units: Vec::new(),
            skipped_events: 0,
            unresolved_paths: 0,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.duplicate_allow_list.clone(), settings.overlap_policy)
    }

    /// Fold one translation unit into the running totals
    ///
    /// Every finding is also logged as a warning.
    pub fn add_unit(&mut self, unit: &UnitTrace) -> UnitFindings {
        self.units += 1;
        self.skipped_events += unit.skipped_events;
        self.unresolved_paths += unit.unresolved_paths.len();
        if unit.skipped_events > 0 {
            tracing::debug!(
                "{} malformed events skipped in {}",
                unit.skipped_events,
                unit.trace_file.display()
            );
        }

        for (name, micros) in &unit.categories {
            *self.categories.entry(name.clone()).or_default() += micros;
        }

        let mut findings = UnitFindings::default();
        for path in find_duplicates(&unit.sources, &self.allow_list) {
            tracing::warn!("double header {} in {}", path, unit.trace_file.display());
            findings.duplicates.push(path.to_string());
        }

        let (parents, overlap) = self.resolve(unit);
        findings.overlap = overlap;

        for interval in &unit.sources {
            let secs = interval.duration_us / MICROS_PER_SEC;
            let entry = self.headers.entry(interval.path().to_string()).or_default();
            entry.total_secs += secs;
            entry.own_secs += secs;
            entry.count += 1;
        }

        for (child, parent) in parents.iter().enumerate() {
            let Some(parent) = *parent else { continue };
            let child = &unit.sources[child];
            let parent = &unit.sources[parent];
            tracing::trace!("{}'s parent is {}", child.path(), parent.path());

            self.headers
                .entry(parent.path().to_string())
                .or_default()
                .own_secs -= child.duration_us / MICROS_PER_SEC;
        }

        findings
    }

    fn resolve(&mut self, unit: &UnitTrace) -> (ParentMap, Option<(String, String)>) {
        let containment = resolve_parents(&unit.sources);
        let Some((earlier, later)) = containment.overlap else {
            return (containment.parents, None);
        };

        tracing::warn!(
            "partially overlapping intervals {} and {} in {}; {}",
            unit.sources[earlier].path(),
            unit.sources[later].path(),
            unit.trace_file.display(),
            match self.policy {
                OverlapPolicy::Flatten => "attributing without nesting",
                OverlapPolicy::BestEffort => "falling back to pairwise attribution",
            }
        );
        self.overlapping_units.push(unit.trace_file.clone());

        let parents = match self.policy {
            OverlapPolicy::Flatten => vec![None; unit.sources.len()],
            OverlapPolicy::BestEffort => resolve_parents_pairwise(&unit.sources),
        };
        let pair = (
            unit.sources[earlier].path().to_string(),
            unit.sources[later].path().to_string(),
        );
        (parents, Some(pair))
    }

    pub fn headers(&self) -> &BTreeMap<String, HeaderAggregate> {
        &self.headers
    }

    pub fn header(&self, path: &str) -> Option<&HeaderAggregate> {
        self.headers.get(path)
    }

    /// Accumulated microseconds for a `Total ...` event name
    pub fn category_total_us(&self, name: &str) -> Option<f64> {
        self.categories.get(name).copied()
    }

    pub fn header_rows(&self) -> Vec<HeaderRow> {
        self.headers
            .iter()
            .map(|(path, h)| {
                let count = h.count.max(1) as f64;
                HeaderRow {
                    path: path.clone(),
                    count: h.count,
                    own_ms: h.own_secs * 1000.0,
                    total_ms: h.total_secs * 1000.0,
                    avg_own_ms: h.own_secs * 1000.0 / count,
                    avg_total_ms: h.total_secs * 1000.0 / count,
                }
            })
            .collect()
    }

    /// Own seconds per parent directory, recomputed on every call
    pub fn folder_totals(&self) -> BTreeMap<String, f64> {
        let mut folders = BTreeMap::new();
        for (path, h) in &self.headers {
            *folders.entry(folder_of(path)).or_insert(0.0) += h.own_secs;
        }
        folders
    }

    pub fn folder_rows(&self) -> Vec<FolderRow> {
        self.folder_totals()
            .into_iter()
            .map(|(folder, own_secs)| FolderRow {
                folder,
                own_ms: own_secs * 1000.0,
            })
            .collect()
    }

    /// Category totals, largest first (ties by name)
    pub fn ranked_categories(&self) -> Vec<CategoryRow> {
        let mut rows: Vec<CategoryRow> = self
            .categories
            .iter()
            .map(|(name, micros)| CategoryRow {
                name: name.clone(),
                secs: micros / MICROS_PER_SEC,
            })
            .collect();
        rows.sort_by(|a, b| b.secs.total_cmp(&a.secs).then_with(|| a.name.cmp(&b.name)));
        rows
    }

    pub fn summary(&self) -> AttributionSummary {
        AttributionSummary {
            total_header_secs: self.headers.values().map(|h| h.total_secs).sum(),
            own_header_secs: self.headers.values().map(|h| h.own_secs).sum(),
            units: self.units,
            overlapping_units: self.overlapping_units.clone(),
            skipped_events: self.skipped_events,
            unresolved_paths: self.unresolved_paths,
        }
    }
}
