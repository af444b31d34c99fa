// Attribution tests over whole translation units
//
// Times in the traces are microseconds; aggregates are seconds.

use super::*;
use crate::config::OverlapPolicy;
use crate::trace::{TraceInterval, UnitTrace};
use std::collections::BTreeMap;
use std::path::PathBuf;

const EPS: f64 = 1e-12;

fn unit(name: &str, sources: Vec<TraceInterval>) -> UnitTrace {
    UnitTrace {
        trace_file: PathBuf::from(name),
        sources,
        categories: BTreeMap::new(),
        ..UnitTrace::default()
    }
}

fn unit_with_category(name: &str, category: &str, micros: f64) -> UnitTrace {
    let mut u = unit(name, vec![]);
    u.categories.insert(category.to_string(), micros);
    u
}

fn aggregator() -> Aggregator {
    Aggregator::new(vec!["bits/mathcalls.h".to_string()], OverlapPolicy::Flatten)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPS,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// main.cpp [0,100] > a.h [10,60] > b.h [20,20]
#[test]
fn test_three_level_chain() {
    let mut agg = aggregator();
    agg.add_unit(&unit(
        "main.cpp.json",
        vec![
            TraceInterval::source("/src/main.cpp", 0.0, 100.0),
            TraceInterval::source("/src/a.h", 10.0, 60.0),
            TraceInterval::source("/src/b.h", 20.0, 20.0),
        ],
    ));

    let b = agg.header("/src/b.h").unwrap();
    assert_close(b.own_secs, 20e-6);
    assert_close(b.total_secs, 20e-6);

    let a = agg.header("/src/a.h").unwrap();
    assert_close(a.own_secs, 40e-6);
    assert_close(a.total_secs, 60e-6);

    let main = agg.header("/src/main.cpp").unwrap();
    assert_close(main.own_secs, 40e-6);
    assert_close(main.total_secs, 100e-6);

    let summary = agg.summary();
    // Own time sums to the root's total; total time double-counts nesting
    assert_close(summary.own_header_secs, 100e-6);
    assert_close(summary.total_header_secs, 180e-6);
    assert!(summary.overlapping_units.is_empty());
}

#[test]
fn test_category_totals_add_across_units() {
    let mut agg = aggregator();
    agg.add_unit(&unit_with_category("a.json", "Total Parse", 500.0));
    agg.add_unit(&unit_with_category("b.json", "Total Parse", 700.0));

    assert_eq!(agg.category_total_us("Total Parse"), Some(1200.0));
    let ranked = agg.ranked_categories();
    assert_eq!(ranked.len(), 1);
    assert_close(ranked[0].secs, 1200e-6);
}

#[test]
fn test_categories_ranked_descending() {
    let mut agg = aggregator();
    let mut u = unit("a.json", vec![]);
    u.categories.insert("Total Backend".to_string(), 300.0);
    u.categories.insert("Total Frontend".to_string(), 900.0);
    u.categories.insert("Total Codegen".to_string(), 300.0);
    agg.add_unit(&u);

    let names: Vec<String> = agg.ranked_categories().into_iter().map(|r| r.name).collect();
    assert_eq!(
        names,
        vec!["Total Frontend", "Total Backend", "Total Codegen"]
    );
}

#[test]
fn test_folder_rollup() {
    let mut agg = aggregator();
    agg.add_unit(&unit(
        "u.json",
        vec![
            TraceInterval::source("/x/a.h", 0.0, 10.0),
            TraceInterval::source("/x/b.h", 20.0, 5.0),
            TraceInterval::source("/y/c.h", 40.0, 1.0),
        ],
    ));

    let folders = agg.folder_totals();
    assert_close(folders["/x"], 15e-6);
    assert_close(folders["/y"], 1e-6);

    let rows = agg.folder_rows();
    assert_eq!(rows[0].folder, "/x");
    assert!((rows[0].own_ms - 0.015).abs() < 1e-9);
}

#[test]
fn test_count_is_per_occurrence() {
    let mut agg = aggregator();
    let sources = vec![
        TraceInterval::source("/src/main.cpp", 0.0, 100.0),
        TraceInterval::source("/src/common.h", 10.0, 10.0),
    ];
    agg.add_unit(&unit("one.json", sources.clone()));
    agg.add_unit(&unit("two.json", sources));

    let common = agg.header("/src/common.h").unwrap();
    assert_eq!(common.count, 2);
    assert_close(common.total_secs, 20e-6);

    let row = agg
        .header_rows()
        .into_iter()
        .find(|r| r.path == "/src/common.h")
        .unwrap();
    assert!((row.avg_total_ms - 0.010).abs() < 1e-9);
}

#[test]
fn test_duplicate_sources_are_kept() {
    let mut agg = aggregator();
    let findings = agg.add_unit(&unit(
        "dup.json",
        vec![
            TraceInterval::source("/src/main.cpp", 0.0, 100.0),
            TraceInterval::source("/src/twice.h", 10.0, 10.0),
            TraceInterval::source("/src/twice.h", 50.0, 20.0),
        ],
    ));

    assert_eq!(findings.duplicates, vec!["/src/twice.h"]);

    let twice = agg.header("/src/twice.h").unwrap();
    assert_eq!(twice.count, 2);
    assert_close(twice.total_secs, 30e-6);
    assert_close(agg.header("/src/main.cpp").unwrap().own_secs, 70e-6);
}

#[test]
fn test_parent_path_shared_across_units() {
    // Own time is subtracted from the parent's global entry, not per unit
    let mut agg = aggregator();
    agg.add_unit(&unit(
        "a.json",
        vec![
            TraceInterval::source("/inc/big.h", 0.0, 50.0),
            TraceInterval::source("/inc/small.h", 10.0, 20.0),
        ],
    ));
    agg.add_unit(&unit(
        "b.json",
        vec![TraceInterval::source("/inc/big.h", 0.0, 40.0)],
    ));

    let big = agg.header("/inc/big.h").unwrap();
    assert_close(big.total_secs, 90e-6);
    assert_close(big.own_secs, 70e-6);
}

#[test]
fn test_overlap_flatten() {
    let mut agg = Aggregator::new(vec![], OverlapPolicy::Flatten);
    let findings = agg.add_unit(&unit(
        "bad.json",
        vec![
            TraceInterval::source("/a.h", 0.0, 50.0),
            TraceInterval::source("/b.h", 30.0, 40.0),
        ],
    ));

    assert_eq!(
        findings.overlap,
        Some(("/a.h".to_string(), "/b.h".to_string()))
    );

    let a = agg.header("/a.h").unwrap();
    assert_close(a.own_secs, a.total_secs);
    assert_eq!(
        agg.summary().overlapping_units,
        vec![PathBuf::from("bad.json")]
    );
}

#[test]
fn test_overlap_best_effort() {
    let mut agg = Aggregator::new(vec![], OverlapPolicy::BestEffort);
    agg.add_unit(&unit(
        "bad.json",
        vec![
            TraceInterval::source("/a.h", 0.0, 50.0),
            TraceInterval::source("/b.h", 30.0, 40.0),
        ],
    ));

    // b.h's midpoint (50) lies on a.h's end, and a.h is longer
    assert_close(agg.header("/a.h").unwrap().own_secs, 10e-6);
    assert_eq!(agg.summary().overlapping_units.len(), 1);
}

#[test]
fn test_rows_sorted_by_path() {
    let mut agg = aggregator();
    agg.add_unit(&unit(
        "u.json",
        vec![
            TraceInterval::source("/z.h", 0.0, 1.0),
            TraceInterval::source("/a.h", 5.0, 1.0),
        ],
    ));
    let paths: Vec<String> = agg.header_rows().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/a.h", "/z.h"]);
}
