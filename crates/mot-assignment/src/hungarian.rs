use pathfinding::prelude::{kuhn_munkres_min, Matrix};

/// Cost scale used to turn `f32` costs into the `i64` weights `kuhn_munkres_min` operates on.
/// Large enough that sub-pixel cost differences still separate after rounding.
const COST_SCALE: f64 = 1.0e4;

/// Cost standing in for "forbidden" — set by gating (`mot_assignment::gating`) on any pair that
/// exceeds a threshold. Must exceed any real pairwise cost the gating stage can produce so
/// Hungarian only ever picks it when there is no legal alternative.
pub const SENTINEL_COST: f32 = 1.0e6;

/// Solve the rectangular assignment problem for an `n x m` non-negative cost matrix, returning
/// an `n`-length vector where entry `i` is either the matched column or `None` ("unassigned").
///
/// `n` or `m` may be zero (returns an all-`None` / empty vector respectively). Pairs whose cost
/// is at or above [`SENTINEL_COST`] are reported as unassigned even if Hungarian matched them —
/// that can happen when one side outnumbers the other and every real pairing for a row is
/// already taken, forcing a match against a conceptually padded column.
#[must_use]
pub fn solve(cost: &[Vec<f32>]) -> Vec<Option<usize>> {
    let n = cost.len();
    if n == 0 {
        return Vec::new();
    }
    let m = cost[0].len();
    if m == 0 {
        return vec![None; n];
    }

    // kuhn_munkres_min requires rows <= columns (it finds a matching that saturates every row).
    // When there are more tracks than detections we solve the transposed problem instead and
    // invert the result, rather than padding the matrix with sentinel rows/columns ourselves —
    // pathfinding's rectangular support already gives the same "every row assigned-or-not,
    // no column twice" guarantee the padding approach would.
    let transpose = n > m;
    let (rows, cols) = if transpose { (m, n) } else { (n, m) };

    let mut weights = Matrix::new(rows, cols, 0i64);
    for r in 0..rows {
        for c in 0..cols {
            let value = if transpose { cost[c][r] } else { cost[r][c] };
            weights[(r, c)] = (f64::from(value) * COST_SCALE) as i64;
        }
    }

    let (_, assignment) = kuhn_munkres_min(&weights);

    let mut result = vec![None; n];
    if transpose {
        // assignment has length m; assignment[original_col] = original_row
        for (original_col, &original_row) in assignment.iter().enumerate() {
            if cost[original_row][original_col] < SENTINEL_COST {
                result[original_row] = Some(original_col);
            }
        }
    } else {
        for (original_row, &original_col) in assignment.iter().enumerate() {
            if cost[original_row][original_col] < SENTINEL_COST {
                result[original_row] = Some(original_col);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_optimal_assignment() {
        let cost = vec![vec![1.0, 5.0], vec![5.0, 1.0]];
        assert_eq!(solve(&cost), vec![Some(0), Some(1)]);

        let cost = vec![vec![5.0, 1.0], vec![1.0, 5.0]];
        assert_eq!(solve(&cost), vec![Some(1), Some(0)]);
    }

    #[test]
    fn more_tracks_than_detections_leaves_rows_unassigned() {
        let cost = vec![vec![1.0], vec![2.0], vec![SENTINEL_COST]];
        let result = solve(&cost);
        assert_eq!(result.len(), 3);
        assert_eq!(result.iter().filter(|a| a.is_some()).count(), 1);
        assert_eq!(result[0], Some(0));
        assert_eq!(result[2], None);
    }

    #[test]
    fn more_detections_than_tracks_assigns_every_row() {
        let cost = vec![vec![1.0, 9.0, 9.0], vec![9.0, 1.0, 9.0]];
        let result = solve(&cost);
        assert_eq!(result, vec![Some(0), Some(1)]);
    }

    #[test]
    fn cost_at_or_above_sentinel_is_unassigned_even_if_matched() {
        let cost = vec![vec![SENTINEL_COST, SENTINEL_COST]];
        let result = solve(&cost);
        assert_eq!(result, vec![None]);
    }

    #[test]
    fn brute_force_matches_for_small_matrices() {
        let cost = vec![
            vec![4.0, 1.0, 3.0],
            vec![2.0, 0.0, 5.0],
            vec![3.0, 2.0, 2.0],
        ];
        let result = solve(&cost);
        let total: f32 = result
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.map(|j| cost[i][j]))
            .sum();
        assert_eq!(total, brute_force_min_cost(&cost));
    }

    fn brute_force_min_cost(cost: &[Vec<f32>]) -> f32 {
        let n = cost.len();
        let m = cost[0].len();
        let mut cols: Vec<usize> = (0..m).collect();
        let mut best = f32::MAX;
        permute(&mut cols, n, cost, &mut best);
        best
    }

    fn permute(cols: &mut [usize], n: usize, cost: &[Vec<f32>], best: &mut f32) {
        fn heap(k: usize, cols: &mut [usize], n: usize, cost: &[Vec<f32>], best: &mut f32) {
            if k == 1 {
                let total: f32 = cols[..n].iter().enumerate().map(|(i, &j)| cost[i][j]).sum();
                if total < *best {
                    *best = total;
                }
                return;
            }
            for i in 0..k {
                heap(k - 1, cols, n, cost, best);
                if k % 2 == 0 {
                    cols.swap(i, k - 1);
                } else {
                    cols.swap(0, k - 1);
                }
            }
        }
        let len = cols.len();
        heap(len, cols, n, cost, best);
    }
}
