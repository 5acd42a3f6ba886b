//! tessera-join: matching primitives for reconciliation.
//!
//! Pairs a *desired* collection against an *existing* one and reports what
//! matched and what was left over on each side:
//!
//! - **`hash`**: exact-key equi-join ([`hash_join`]).
//! - **`scored`**: minimum-cost assignment over a compatibility graph
//!   ([`scored_match`]), for records without a stable identity.
//! - **`distance`**: token-level edit distance, the usual cost function
//!   for `scored_match`.
//!
//! Everything here is pure and deterministic: the same inputs in the same
//! order always produce the same pairing.

pub mod distance;
pub mod hash;
pub mod scored;

pub use distance::edit_distance;
pub use hash::hash_join;
pub use scored::scored_match;

/// Outcome of matching a left collection against a right one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join<L, R> {
    /// Matched elements, in left input order.
    pub pairs: Vec<(L, R)>,
    /// Left elements with no counterpart, in input order.
    pub left_only: Vec<L>,
    /// Right elements with no counterpart, in input order.
    pub right_only: Vec<R>,
}

impl<L, R> Join<L, R> {
    /// Move elements into a `Join` given, for each left element, the index
    /// of the right element it pairs with (each right index used at most once).
    pub(crate) fn assemble(left: Vec<L>, right: Vec<R>, assigned: Vec<Option<usize>>) -> Self {
        let mut slots: Vec<Option<R>> = right.into_iter().map(Some).collect();
        let mut pairs = Vec::new();
        let mut left_only = Vec::new();

        for (l, idx) in left.into_iter().zip(assigned) {
            match idx.and_then(|j| slots.get_mut(j).and_then(Option::take)) {
                Some(r) => pairs.push((l, r)),
                None => left_only.push(l),
            }
        }

        Self {
            pairs,
            left_only,
            right_only: slots.into_iter().flatten().collect(),
        }
    }
}
