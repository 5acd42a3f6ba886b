//! Minimum-cost matching between records that have no shared key.
//!
//! The caller scores every (left, right) pair as either incompatible
//! (`None`) or a non-negative cost. [`scored_match`] picks the pairing that
//! first maximizes the number of matched pairs and then, among those,
//! minimizes the summed cost. This is a full assignment solve (Hungarian
//! method), not a greedy nearest-neighbour pass.
//!
//! # Tie-breaking
//!
//! Rows are inserted into the assignment in left input order, and every
//! slack scan walks right elements in input order, keeping the first
//! strict minimum. Among equal-cost optima the result is therefore a pure
//! function of input order: `[a, b]` vs `[x, y]` with all costs equal
//! pairs `a-x` and `b-y`.

use crate::Join;

/// Match `left` against `right` using `score` as the pair cost.
///
/// `score(l, r)` returns `None` when the two can never be paired.
pub fn scored_match<L, R, F>(left: Vec<L>, right: Vec<R>, score: F) -> Join<L, R>
where
    F: Fn(&L, &R) -> Option<u32>,
{
    if left.is_empty() || right.is_empty() {
        let assigned = vec![None; left.len()];
        return Join::assemble(left, right, assigned);
    }

    let scores: Vec<Vec<Option<u32>>> = left
        .iter()
        .map(|l| right.iter().map(|r| score(l, r)).collect())
        .collect();

    // Any assignment with one more real pair must beat any assignment with
    // fewer, whatever the costs: the penalty exceeds the largest possible
    // sum of real costs.
    let max_cost = scores.iter().flatten().flatten().copied().max().unwrap_or(0);
    let penalty = i64::from(max_cost) * left.len().min(right.len()) as i64 + 1;

    let size = left.len().max(right.len());
    let cost = |i: usize, j: usize| -> i64 {
        scores
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .flatten()
            .map_or(penalty, i64::from)
    };

    let row_to_col = solve_assignment(size, cost);

    let assigned: Vec<Option<usize>> = scores
        .iter()
        .zip(&row_to_col)
        .map(|(row, &j)| row.get(j).copied().flatten().map(|_| j))
        .collect();

    Join::assemble(left, right, assigned)
}

/// Solve a square `size`×`size` assignment problem, minimizing total cost.
///
/// Returns, for every row, the column assigned to it. Shortest augmenting
/// path formulation with row/column potentials, O(size³).
fn solve_assignment(size: usize, cost: impl Fn(usize, usize) -> i64) -> Vec<usize> {
    // Arrays are 1-based; column 0 is the sentinel the augmenting path starts from.
    let mut row_pot = vec![0i64; size + 1];
    let mut col_pot = vec![0i64; size + 1];
    let mut owner = vec![0usize; size + 1];
    let mut way = vec![0usize; size + 1];

    for row in 1..=size {
        owner[0] = row;
        let mut col0 = 0;
        let mut min_slack = vec![i64::MAX; size + 1];
        let mut visited = vec![false; size + 1];

        loop {
            visited[col0] = true;
            let r = owner[col0];
            let mut delta = i64::MAX;
            let mut col1 = 0;

            for col in 1..=size {
                if visited[col] {
                    continue;
                }
                let slack = cost(r - 1, col - 1) - row_pot[r] - col_pot[col];
                if slack < min_slack[col] {
                    min_slack[col] = slack;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }

            for col in 0..=size {
                if visited[col] {
                    row_pot[owner[col]] += delta;
                    col_pot[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            col0 = col1;
            if owner[col0] == 0 {
                break;
            }
        }

        // Flip the augmenting path back to the sentinel.
        loop {
            let col1 = way[col0];
            owner[col0] = owner[col1];
            col0 = col1;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![0; size];
    for col in 1..=size {
        if owner[col] != 0 {
            row_to_col[owner[col] - 1] = col - 1;
        }
    }
    row_to_col
}
