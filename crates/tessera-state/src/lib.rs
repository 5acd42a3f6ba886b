//! tessera-state: the row store reconciliation writes into.
//!
//! Backed by [redb](https://docs.rs/redb). Holds three tables of rows:
//! connections, placements, and containers. Rows are JSON-serialized into
//! `&[u8]` value columns under `u64` row ids drawn from a shared,
//! never-reused sequence.
//!
//! # Architecture
//!
//! ```text
//! StateStore (Clone, Arc<Database>)
//!   ├── list::<R>()            read-only snapshot of one table
//!   └── transact(|txn| ...)    one atomic write transaction
//!         └── Transaction: View
//!               select_all / insert / commit / remove, generic over R: Row
//! ```
//!
//! Everything a reconciler does goes through the [`View`] trait, so a pass
//! either commits as a whole or leaves the store untouched.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;
pub mod view;

pub use error::{StateError, StateResult};
pub use store::{StateStore, Transaction};
pub use types::*;
pub use view::{Row, View};
