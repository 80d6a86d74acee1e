use std::collections::HashSet;

use crate::model::ActivityRecord;

/// Identity of a listing for deduplication: destination and activity,
/// lowercased with whitespace collapsed.
pub fn record_key(record: &ActivityRecord) -> String {
    let norm = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    format!("{}\u{1f}{}", norm(&record.destination), norm(&record.activity))
}

/// Drop records whose key is already in `seen`, keeping the first occurrence.
///
/// The seen-set is threaded through explicitly so several batches of the same
/// source can be deduplicated against each other. Records with both fields
/// blank have no identity and are always kept.
pub fn dedupe_records(
    records: Vec<ActivityRecord>,
    mut seen: HashSet<String>,
) -> (Vec<ActivityRecord>, HashSet<String>) {
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if record.destination.trim().is_empty() && record.activity.trim().is_empty() {
            kept.push(record);
            continue;
        }
        if seen.insert(record_key(&record)) {
            kept.push(record);
        }
    }
    (kept, seen)
}
