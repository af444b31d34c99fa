// Containment reconstruction for one translation unit
//
// Trace intervals carry no parent pointers. The inclusion tree is inferred
// from timing alone: A is a candidate parent of B iff A is strictly longer
// than B and A's span contains B's midpoint. B's parent is the candidate
// with the smallest duration.
//
// Tie-break among equally short candidates: latest start offset, then
// lexicographically smallest path, then earliest position in the trace.

use crate::trace::TraceInterval;
use std::cmp::Ordering;

/// Parent index for each interval (None for roots)
pub type ParentMap = Vec<Option<usize>>;

/// Result of the sweep resolver
#[derive(Debug, Clone, PartialEq)]
pub struct Containment {
    pub parents: ParentMap,
    /// First pair of intervals found to partially overlap, as (earlier, later)
    pub overlap: Option<(usize, usize)>,
}

impl Containment {
    pub fn is_well_nested(&self) -> bool {
        self.overlap.is_none()
    }
}

/// True if `parent` qualifies as a candidate parent of `child`
pub fn is_candidate_parent(parent: &TraceInterval, child: &TraceInterval) -> bool {
    let mid = child.midpoint_us();
    parent.duration_us > child.duration_us && parent.start_us <= mid && mid <= parent.end_us()
}

/// Ordering among candidate parents; `Less` is preferred
fn preference(intervals: &[TraceInterval], a: usize, b: usize) -> Ordering {
    let (ia, ib) = (&intervals[a], &intervals[b]);
    ia.duration_us
        .total_cmp(&ib.duration_us)
        .then_with(|| ib.start_us.total_cmp(&ia.start_us))
        .then_with(|| ia.path().cmp(ib.path()))
        .then_with(|| a.cmp(&b))
}

/// Resolve parents by checking every pair, O(n²)
///
/// Applies the midpoint rule literally, so it also gives an answer (not
/// necessarily a meaningful one) for partially overlapping intervals.
pub fn resolve_parents_pairwise(intervals: &[TraceInterval]) -> ParentMap {
    (0..intervals.len())
        .map(|child| {
            (0..intervals.len())
                .filter(|&candidate| {
                    candidate != child
                        && is_candidate_parent(&intervals[candidate], &intervals[child])
                })
                .min_by(|&a, &b| preference(intervals, a, b))
        })
        .collect()
}

/// Resolve parents with a start-ordered sweep over a stack of open intervals
///
/// Matches `resolve_parents_pairwise` for nested-or-disjoint intervals with
/// positive durations, in O(n log n). Partial overlap is detected and
/// reported in `Containment::overlap`; the parent map is unreliable then.
pub fn resolve_parents(intervals: &[TraceInterval]) -> Containment {
    let mut order: Vec<usize> = (0..intervals.len()).collect();
    order.sort_by(|&a, &b| {
        let (ia, ib) = (&intervals[a], &intervals[b]);
        ia.start_us
            .total_cmp(&ib.start_us)
            .then_with(|| ib.duration_us.total_cmp(&ia.duration_us))
            .then_with(|| ia.path().cmp(ib.path()))
            .then_with(|| a.cmp(&b))
    });

    let mut parents = vec![None; intervals.len()];
    let mut overlap = None;
    // Invariant: every entry encloses the entries above it
    let mut stack: Vec<usize> = Vec::new();

    for &current in &order {
        let cur = &intervals[current];

        while let Some(&top) = stack.last() {
            let open = &intervals[top];
            if open.end_us() >= cur.end_us() {
                break;
            }
            if open.end_us() > cur.start_us && overlap.is_none() {
                overlap = Some((top, current));
            }
            stack.pop();
        }

        if let Some(mut pos) = stack
            .iter()
            .rposition(|&open| intervals[open].duration_us > cur.duration_us)
        {
            // Equal durations on the stack mean identical spans; the deepest
            // one sorts first by path.
            while pos > 0
                && intervals[stack[pos - 1]].duration_us == intervals[stack[pos]].duration_us
            {
                pos -= 1;
            }
            parents[current] = Some(stack[pos]);
        }

        stack.push(current);
    }

    Containment { parents, overlap }
}
