use crate::model::{AssignmentOutput, MatchSummary};

/// Compute summary statistics for one run.
///
/// `n`/`m` are the record counts after deduplication.
pub fn compute_summary(
    n: usize,
    m: usize,
    duplicates: (usize, usize),
    output: &AssignmentOutput,
    failed_cells: usize,
) -> MatchSummary {
    let matched = output.pairs.len();
    let mean_score = if matched == 0 {
        None
    } else {
        Some(output.pairs.iter().map(|p| p.score).sum::<f64>() / matched as f64)
    };

    MatchSummary {
        left_records: n,
        right_records: m,
        left_duplicates: duplicates.0,
        right_duplicates: duplicates.1,
        candidate_pairs: n.min(m),
        matched,
        below_threshold: output.below_threshold,
        left_unmatched: n - matched,
        right_unmatched: m - matched,
        failed_cells,
        mean_score,
    }
}
