use serde::Serialize;
use std::collections::HashSet;

use crate::types::CanonicalRecord;

/// Counts from one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub input_rows: usize,
    pub duplicates_dropped: usize,
    pub empty_dropped: usize,
    pub kept: usize,
}

/// Reduce a candidate batch to the rows eligible for storage.
///
/// Duplicates of `text_original` are dropped first (first occurrence wins,
/// missing texts count as equal to each other), then rows whose cleaned text
/// is empty. Survivors keep their original order. Records are moved, never
/// edited.
pub fn reconcile(candidates: Vec<CanonicalRecord>) -> (Vec<CanonicalRecord>, ReconcileReport) {
    let input_rows = candidates.len();

    let mut seen: HashSet<Option<String>> = HashSet::with_capacity(input_rows);
    let unique: Vec<CanonicalRecord> = candidates
        .into_iter()
        .filter(|r| seen.insert(r.text_original().map(str::to_owned)))
        .collect();
    let duplicates_dropped = input_rows - unique.len();

    let after_dedup = unique.len();
    let kept: Vec<CanonicalRecord> = unique
        .into_iter()
        .filter(|r| !r.cleaned_text().is_empty())
        .collect();

    let report = ReconcileReport {
        input_rows,
        duplicates_dropped,
        empty_dropped: after_dedup - kept.len(),
        kept: kept.len(),
    };
    (kept, report)
}
