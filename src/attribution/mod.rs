// Header parse-time attribution
//
// Objective: turn a flat list of timestamped parse intervals per translation
// unit into own (exclusive) and total (inclusive) time per header, then roll
// that up by folder and by `Total ...` category.
//
// Intervals are assumed to be nested or disjoint. Units that break this are
// detected, reported, and attributed according to `OverlapPolicy`.

mod aggregate;
mod containment;

pub use aggregate::{
    find_duplicates, folder_of, Aggregator, AttributionSummary, CategoryRow, FolderRow,
    HeaderAggregate, HeaderRow, UnitFindings,
};
pub use containment::{
    is_candidate_parent, resolve_parents, resolve_parents_pairwise, Containment, ParentMap,
};

#[cfg(test)]
mod tests;
