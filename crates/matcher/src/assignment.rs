//! Optimal one-to-one assignment.
//!
//! [`linear_sum_assignment`] solves the rectangular linear assignment problem
//! (minimum total cost, min(rows, cols) pairs) with the shortest augmenting
//! path form of the Hungarian algorithm: one Dijkstra-like search per row over
//! reduced costs, with dual variables `u`/`v` keeping reduced costs
//! non-negative. O(min(n,m)² · max(n,m)).
//!
//! [`solve`] maximizes similarity by running it on the negated matrix.

use crate::matrix::SimilarityMatrix;
use crate::model::{Assignment, AssignmentOutput};

/// Minimum-cost assignment over a row-major `rows`×`cols` cost matrix.
///
/// Returns min(rows, cols) `(row, col)` pairs sorted by row. Every cost must
/// be finite. Panics if `cost` does not hold exactly `rows * cols` entries.
/// Among equal-cost choices the search prefers the lowest column
/// index, so the result is reproducible.
pub fn linear_sum_assignment(cost: &[f64], rows: usize, cols: usize) -> Vec<(usize, usize)> {
    assert_eq!(cost.len(), rows * cols, "cost matrix has {} entries, expected {rows}x{cols}", cost.len());
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    if rows <= cols {
        let col4row = solve_wide(cost, rows, cols);
        col4row
            .into_iter()
            .enumerate()
            .filter_map(|(r, c)| c.map(|c| (r, c)))
            .collect()
    } else {
        // Solve the transpose so the search always runs over the short side.
        let mut transposed = vec![0.0; cost.len()];
        for r in 0..rows {
            for c in 0..cols {
                transposed[c * rows + r] = cost[r * cols + c];
            }
        }
        let row4col = solve_wide(&transposed, cols, rows);
        let mut pairs: Vec<(usize, usize)> = row4col
            .into_iter()
            .enumerate()
            .filter_map(|(c, r)| r.map(|r| (r, c)))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Core solver for `nr <= nc`. Returns the column assigned to each row.
fn solve_wide(cost: &[f64], nr: usize, nc: usize) -> Vec<Option<usize>> {
    let mut u = vec![0.0f64; nr];
    let mut v = vec![0.0f64; nc];
    let mut shortest = vec![f64::INFINITY; nc];
    let mut path = vec![0usize; nc];
    let mut col4row: Vec<Option<usize>> = vec![None; nr];
    let mut row4col: Vec<Option<usize>> = vec![None; nc];
    let mut seen_rows = vec![false; nr];
    let mut seen_cols = vec![false; nc];
    let mut remaining: Vec<usize> = Vec::with_capacity(nc);

    for cur_row in 0..nr {
        remaining.clear();
        remaining.extend(0..nc);
        seen_rows.fill(false);
        seen_cols.fill(false);
        shortest.fill(f64::INFINITY);

        let mut min_val = 0.0f64;
        let mut i = cur_row;

        // Grow the shortest-path tree until it reaches a free column.
        let sink = loop {
            seen_rows[i] = true;
            let mut best: Option<usize> = None;
            let mut lowest = f64::INFINITY;

            for (pos, &j) in remaining.iter().enumerate() {
                let reduced = min_val + cost[i * nc + j] - u[i] - v[j];
                if reduced < shortest[j] {
                    path[j] = i;
                    shortest[j] = reduced;
                }
                let take = match best {
                    None => true,
                    Some(b) => {
                        shortest[j] < lowest
                            || (shortest[j] == lowest
                                && row4col[j].is_none()
                                && row4col[remaining[b]].is_some())
                    }
                };
                if take {
                    lowest = shortest[j];
                    best = Some(pos);
                }
            }

            let Some(pos) = best else { break None };
            min_val = lowest;
            let j = remaining.remove(pos);
            seen_cols[j] = true;
            match row4col[j] {
                None => break Some(j),
                Some(r) => i = r,
            }
        };

        let Some(sink) = sink else {
            log::warn!("assignment: no augmenting path for row {cur_row}");
            break;
        };

        // Update duals.
        u[cur_row] += min_val;
        for r in 0..nr {
            if seen_rows[r] && r != cur_row {
                if let Some(c) = col4row[r] {
                    u[r] += min_val - shortest[c];
                }
            }
        }
        for c in 0..nc {
            if seen_cols[c] {
                v[c] -= min_val - shortest[c];
            }
        }

        // Augment along the path back to cur_row.
        let mut j = sink;
        loop {
            let r = path[j];
            row4col[j] = Some(r);
            let prev = col4row[r].replace(j);
            if r == cur_row {
                break;
            }
            match prev {
                Some(p) => j = p,
                None => break,
            }
        }
    }

    col4row
}

/// Maximum-similarity one-to-one assignment with an acceptance threshold.
///
/// Cells scoring below `threshold` are masked to a neutral weight before
/// solving, and any solver pair that lands on one is dropped and counted in
/// `below_threshold`. The neutral weight is `min(threshold, 0)`, so with a
/// non-negative threshold the accepted pairs have the largest total score of
/// any one-to-one assignment over the surviving cells.
///
/// Accepted pairs are sorted by descending score, then by left and right index.
pub fn solve(matrix: &SimilarityMatrix, threshold: f64) -> AssignmentOutput {
    if matrix.is_empty() {
        return AssignmentOutput::default();
    }

    let (n, m) = (matrix.rows(), matrix.cols());
    let neutral = threshold.min(0.0);
    let mut cost = Vec::with_capacity(n * m);
    for i in 0..n {
        for &s in matrix.row(i) {
            cost.push(if s >= threshold { -s } else { -neutral });
        }
    }

    let mut out = AssignmentOutput::default();
    for (left, right) in linear_sum_assignment(&cost, n, m) {
        let score = matrix.get(left, right);
        if score >= threshold {
            out.pairs.push(Assignment { left, right, score });
        } else {
            out.below_threshold += 1;
        }
    }

    out.pairs.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.left.cmp(&b.left))
            .then(a.right.cmp(&b.right))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f64]]) -> SimilarityMatrix {
        let cols = rows.first().map_or(0, |r| r.len());
        SimilarityMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect(), cols, -100.0).unwrap()
    }

    fn total(cost: &[f64], cols: usize, pairs: &[(usize, usize)]) -> f64 {
        pairs.iter().map(|&(r, c)| cost[r * cols + c]).sum()
    }

    #[test]
    fn square_min_cost() {
        // Classic 3x3: optimum is (0,1), (1,0), (2,2) with cost 1 + 2 + 2 = 5.
        let cost = [4.0, 1.0, 3.0, 2.0, 0.0, 5.0, 3.0, 2.0, 2.0];
        let pairs = linear_sum_assignment(&cost, 3, 3);
        assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 2)]);
        assert_eq!(total(&cost, 3, &pairs), 5.0);
    }

    #[test]
    fn wide_matrix() {
        let cost = [10.0, 1.0, 10.0, 10.0, 1.0, 10.0, 10.0, 10.0];
        let pairs = linear_sum_assignment(&cost, 2, 4);
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn tall_matrix_transposes() {
        let cost = [5.0, 9.0, 1.0, 9.0, 9.0, 2.0];
        let pairs = linear_sum_assignment(&cost, 3, 2);
        assert_eq!(pairs, vec![(1, 0), (2, 1)]);
    }

    #[test]
    fn ties_resolve_in_input_order() {
        let cost = [1.0; 9];
        assert_eq!(linear_sum_assignment(&cost, 3, 3), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn empty_cost() {
        assert!(linear_sum_assignment(&[], 0, 3).is_empty());
        assert!(linear_sum_assignment(&[], 2, 0).is_empty());
    }

    #[test]
    #[should_panic(expected = "cost matrix has 5 entries, expected 2x3")]
    fn short_cost_slice_names_dimensions() {
        linear_sum_assignment(&[1.0, 2.0, 3.0, 4.0, 5.0], 2, 3);
    }

    #[test]
    fn solve_beats_greedy_argmax() {
        // Row-wise argmax would give both rows column 0.
        let m = matrix(&[&[0.9, 0.8], &[0.85, 0.1]]);
        let out = solve(&m, 0.0);
        let pairs: Vec<(usize, usize)> = out.pairs.iter().map(|p| (p.left, p.right)).collect();
        assert_eq!(pairs, vec![(1, 0), (0, 1)]);
        assert!((out.pairs[0].score - 0.85).abs() < 1e-12);
    }

    #[test]
    fn below_threshold_pairs_are_dropped() {
        let m = matrix(&[&[0.9, 0.1], &[0.2, 0.15]]);
        let out = solve(&m, 0.5);
        assert_eq!(out.pairs.len(), 1);
        assert_eq!((out.pairs[0].left, out.pairs[0].right), (0, 0));
        assert_eq!(out.below_threshold, 1);
    }

    #[test]
    fn masking_keeps_best_surviving_total() {
        // Full assignment would take the diagonal (1.0 + 0.4) and then drop
        // 0.4; the anti-diagonal survives whole with a larger total of 1.2.
        let m = matrix(&[&[1.0, 0.6], &[0.6, 0.4]]);
        let out = solve(&m, 0.5);
        let sum: f64 = out.pairs.iter().map(|p| p.score).sum();
        assert!((sum - 1.2).abs() < 1e-12);
        assert_eq!(out.pairs.len(), 2);
    }

    #[test]
    fn three_by_one_returns_single_pair() {
        let m = matrix(&[&[0.4], &[0.9], &[0.7]]);
        let out = solve(&m, 0.3);
        assert_eq!(out.pairs.len(), 1);
        assert_eq!((out.pairs[0].left, out.pairs[0].right), (1, 0));
        assert_eq!(out.below_threshold, 0);
    }

    #[test]
    fn sentinel_cells_never_accepted() {
        let m = matrix(&[&[-100.0, 0.7], &[-100.0, -100.0]]);
        let out = solve(&m, 0.0);
        assert_eq!(out.pairs.len(), 1);
        assert_eq!((out.pairs[0].left, out.pairs[0].right), (0, 1));
        assert_eq!(out.below_threshold, 1);
    }

    #[test]
    fn output_sorted_by_descending_score() {
        let m = matrix(&[&[0.5, 0.0, 0.0], &[0.0, 0.9, 0.0], &[0.0, 0.0, 0.7]]);
        let out = solve(&m, 0.1);
        let scores: Vec<f64> = out.pairs.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn empty_matrix_yields_nothing() {
        let m = SimilarityMatrix::from_rows(vec![], 3, -100.0).unwrap();
        let out = solve(&m, 0.0);
        assert!(out.pairs.is_empty());
        assert_eq!(out.below_threshold, 0);
    }

    #[test]
    fn solve_is_deterministic() {
        let m = matrix(&[&[0.5, 0.5, 0.5], &[0.5, 0.5, 0.5]]);
        let a = solve(&m, 0.0);
        let b = solve(&m, 0.0);
        assert_eq!(a.pairs, b.pairs);
        let pairs: Vec<(usize, usize)> = a.pairs.iter().map(|p| (p.left, p.right)).collect();
        assert_eq!(pairs, vec![(0, 0), (1, 1)]);
    }
}
