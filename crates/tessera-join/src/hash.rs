//! Exact-key equi-join.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use crate::Join;

/// Pair every left element with a right element that has the same key.
///
/// Each element takes part in at most one pair. When a key occurs several
/// times on either side, the overlap is paired off completely: left
/// elements are visited in input order and each takes the earliest
/// still-unpaired right element with that key. Whatever is left over is
/// returned in input order.
pub fn hash_join<L, R, K, FL, FR>(left: Vec<L>, right: Vec<R>, left_key: FL, right_key: FR) -> Join<L, R>
where
    K: Eq + Hash,
    FL: Fn(&L) -> K,
    FR: Fn(&R) -> K,
{
    let mut index: HashMap<K, VecDeque<usize>> = HashMap::with_capacity(right.len());
    for (j, r) in right.iter().enumerate() {
        index.entry(right_key(r)).or_default().push_back(j);
    }

    let assigned: Vec<Option<usize>> = left
        .iter()
        .map(|l| index.get_mut(&left_key(l)).and_then(VecDeque::pop_front))
        .collect();

    Join::assemble(left, right, assigned)
}
