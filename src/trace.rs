//! Time-trace file parsing
//!
//! Reads the Chrome-trace-style JSON the instrumented compiler writes next to
//! each object file:
//!
//! ```json
//! { "traceEvents": [
//!     { "ph": "X", "name": "Source", "ts": 120, "dur": 3400,
//!       "args": { "detail": "/usr/include/stdio.h" } },
//!     { "ph": "X", "name": "Total Frontend", "ts": 0, "dur": 91000 },
//!     { "ph": "M", "name": "process_name", "args": { "name": "clang" } }
//! ] }
//! ```
//!
//! Only complete (`X`) events matter. `Source` events become intervals for
//! containment analysis; `Total ...` events are summed per name. A malformed
//! event is logged and skipped; a file without the container shape is fatal.

use crate::error::{ProfileError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Event name for per-file parse intervals
pub const SOURCE_EVENT: &str = "Source";

/// Prefix of flat per-phase totals
pub const CATEGORY_PREFIX: &str = "Total ";

/// One complete event from a trace, times in microseconds
#[derive(Debug, Clone, PartialEq)]
pub struct TraceInterval {
    pub name: String,
    pub start_us: f64,
    pub duration_us: f64,
    /// Canonical path, only set for `Source` events
    pub path: Option<String>,
}

impl TraceInterval {
    /// Build a `Source` interval
    pub fn source(path: impl Into<String>, start_us: f64, duration_us: f64) -> Self {
        Self {
            name: SOURCE_EVENT.to_string(),
            start_us,
            duration_us,
            path: Some(path.into()),
        }
    }

    pub fn end_us(&self) -> f64 {
        self.start_us + self.duration_us
    }

    pub fn midpoint_us(&self) -> f64 {
        self.start_us + self.duration_us / 2.0
    }

    /// Path for `Source` intervals, empty otherwise
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }
}

/// Everything one translation unit's trace contributes
#[derive(Debug, Clone, Default)]
pub struct UnitTrace {
    pub trace_file: PathBuf,
    /// `Source` intervals in file order
    pub sources: Vec<TraceInterval>,
    /// `Total ...` durations in microseconds, keyed by full event name
    pub categories: BTreeMap<String, f64>,
    /// Events dropped as malformed
    pub skipped_events: usize,
    /// `Source` details kept verbatim because they could not be canonicalized
    pub unresolved_paths: Vec<String>,
}

/// Parse a trace file from disk
pub fn parse_trace_file(path: &Path) -> Result<UnitTrace> {
    let content = fs::read_to_string(path)?;
    parse_trace_str(&content, path)
}

/// Parse trace JSON; `origin` is only used in diagnostics
pub fn parse_trace_str(content: &str, origin: &Path) -> Result<UnitTrace> {
    let format_error = |reason: String| ProfileError::TraceFormat {
        path: origin.to_path_buf(),
        reason,
    };

    let root: Value = serde_json::from_str(content).map_err(|e| format_error(e.to_string()))?;
    let events = root
        .get("traceEvents")
        .and_then(Value::as_array)
        .ok_or_else(|| format_error("missing traceEvents array".to_string()))?;

    let mut unit = UnitTrace {
        trace_file: origin.to_path_buf(),
        ..UnitTrace::default()
    };

    for event in events {
        match parse_event(event) {
            Ok(Some(mut interval)) => {
                if let Some(detail) = interval.path.take() {
                    interval.path = Some(match canonicalize_detail(&detail) {
                        Ok(canonical) => canonical,
                        Err(e) => {
                            tracing::warn!("cannot canonicalize {}: {}", detail, e);
                            unit.unresolved_paths.push(detail.clone());
                            detail
                        }
                    });
                }
                unit.add(interval);
            }
            Ok(None) => {}
            Err(reason) => {
                tracing::warn!("unknown event in {}: {} ({})", origin.display(), event, reason);
                unit.skipped_events += 1;
            }
        }
    }

    Ok(unit)
}

impl UnitTrace {
    fn add(&mut self, interval: TraceInterval) {
        if interval.name.starts_with(CATEGORY_PREFIX) {
            *self.categories.entry(interval.name.clone()).or_default() += interval.duration_us;
        }
        if interval.name == SOURCE_EVENT {
            self.sources.push(interval);
        }
    }
}

fn parse_event(event: &Value) -> std::result::Result<Option<TraceInterval>, String> {
    let phase = event
        .get("ph")
        .and_then(Value::as_str)
        .ok_or("missing phase")?;

    match phase {
        "M" => return Ok(None),
        "X" => {}
        other => return Err(format!("unsupported phase {:?}", other)),
    }

    let name = event
        .get("name")
        .and_then(Value::as_str)
        .ok_or("missing name")?;
    let start_us = number_field(event, "ts")?;
    let duration_us = number_field(event, "dur")?;

    let path = if name == SOURCE_EVENT {
        let detail = event
            .get("args")
            .and_then(|args| args.get("detail"))
            .and_then(Value::as_str)
            .ok_or("Source event without args.detail")?;
        Some(detail.to_string())
    } else {
        None
    };

    Ok(Some(TraceInterval {
        name: name.to_string(),
        start_us,
        duration_us,
        path,
    }))
}

fn number_field(event: &Value, field: &str) -> std::result::Result<f64, String> {
    let value = event
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| format!("missing or non-numeric {}", field))?;
    if value < 0.0 {
        return Err(format!("negative {}", field));
    }
    Ok(value)
}

/// Resolve a header path to its canonical absolute form
pub fn canonicalize_detail(detail: &str) -> std::io::Result<String> {
    fs::canonicalize(detail).map(|path| path.to_string_lossy().into_owned())
}
