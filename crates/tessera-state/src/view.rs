//! The store abstraction reconcilers read from and write to.

use std::fmt;

use redb::TableDefinition;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StateResult;
use crate::types::RowId;

/// A kind of row living in its own table.
pub trait Row: Clone + fmt::Debug + Serialize + DeserializeOwned {
    /// Table holding rows of this kind.
    const TABLE: TableDefinition<'static, RowId, &'static [u8]>;

    /// Short name used in log fields.
    const KIND: &'static str;

    /// An empty row carrying a freshly allocated id.
    fn with_id(id: RowId) -> Self;

    fn id(&self) -> RowId;
}

/// Read and mutate rows of any [`Row`] kind.
///
/// Writes are visible to later reads through the same view.
pub trait View {
    /// All rows of kind `R`, ordered by row id.
    fn select_all<R: Row>(&self) -> StateResult<Vec<R>>;

    /// Rows of kind `R` for which `predicate` holds, ordered by row id.
    fn select<R: Row, P: Fn(&R) -> bool>(&self, predicate: P) -> StateResult<Vec<R>> {
        Ok(self
            .select_all::<R>()?
            .into_iter()
            .filter(|row| predicate(row))
            .collect())
    }

    /// Allocate a new row. Nothing is stored until the row is committed.
    fn insert<R: Row>(&self) -> StateResult<R>;

    /// Store the row's current field values under its id.
    fn commit<R: Row>(&self, row: &R) -> StateResult<()>;

    /// Delete the row with this row's id. Removing an absent row is a no-op.
    fn remove<R: Row>(&self, row: &R) -> StateResult<()>;
}
