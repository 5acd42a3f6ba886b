//! StateStore: redb-backed row persistence for Tessera.
//!
//! Reads outside a transaction go through [`StateStore::list`]. All writes
//! happen inside [`StateStore::transact`], whose [`Transaction`] implements
//! [`View`]. The store supports both on-disk and in-memory backends (the
//! latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use tracing::{debug, warn};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::RowId;
use crate::view::{Row, View};

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(CONNECTIONS).map_err(map_err!(Table))?;
        txn.open_table(PLACEMENTS).map_err(map_err!(Table))?;
        txn.open_table(CONTAINERS).map_err(map_err!(Table))?;
        txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Snapshot every row of kind `R`, ordered by row id.
    pub fn list<R: Row>(&self) -> StateResult<Vec<R>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(R::TABLE).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let row: R = serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(row);
        }
        Ok(results)
    }

    /// Run `f` inside one write transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and is aborted otherwise,
    /// so either every write `f` made becomes visible or none does. Write
    /// transactions are serialized by the database.
    pub fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction) -> Result<T, E>,
        E: From<StateError>,
    {
        let txn = Transaction {
            txn: self.db.begin_write().map_err(map_err!(Transaction))?,
        };

        match f(&txn) {
            Ok(value) => {
                txn.txn.commit().map_err(map_err!(Transaction))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort) = txn.txn.abort() {
                    warn!(error = %abort, "failed to abort state transaction");
                }
                Err(e)
            }
        }
    }
}

/// An open write transaction, handed out by [`StateStore::transact`].
pub struct Transaction {
    txn: WriteTransaction,
}

impl Transaction {
    fn next_row_id(&self) -> StateResult<RowId> {
        let mut table = self.txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
        let next = table
            .get(ROW_ID_SEQUENCE)
            .map_err(map_err!(Read))?
            .map(|guard| guard.value())
            .unwrap_or(0)
            + 1;
        table
            .insert(ROW_ID_SEQUENCE, next)
            .map_err(map_err!(Write))?;
        Ok(next)
    }
}

impl View for Transaction {
    fn select_all<R: Row>(&self) -> StateResult<Vec<R>> {
        let table = self.txn.open_table(R::TABLE).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let row: R = serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(row);
        }
        Ok(results)
    }

    fn insert<R: Row>(&self) -> StateResult<R> {
        let id = self.next_row_id()?;
        debug!(kind = R::KIND, id, "row allocated");
        Ok(R::with_id(id))
    }

    fn commit<R: Row>(&self, row: &R) -> StateResult<()> {
        let value = serde_json::to_vec(row).map_err(map_err!(Serialize))?;
        let mut table = self.txn.open_table(R::TABLE).map_err(map_err!(Table))?;
        table
            .insert(row.id(), value.as_slice())
            .map_err(map_err!(Write))?;
        Ok(())
    }

    fn remove<R: Row>(&self, row: &R) -> StateResult<()> {
        let mut table = self.txn.open_table(R::TABLE).map_err(map_err!(Table))?;
        let existed = table.remove(row.id()).map_err(map_err!(Write))?.is_some();
        debug!(kind = R::KIND, id = row.id(), existed, "row removed");
        Ok(())
    }
}
