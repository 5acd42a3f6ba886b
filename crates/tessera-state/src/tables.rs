//! redb table definitions for the Tessera state store.
//!
//! Row tables use `u64` row ids as keys and JSON-serialized rows as values.

use redb::TableDefinition;

use crate::types::RowId;

/// Allowed flows between labels.
pub const CONNECTIONS: TableDefinition<RowId, &[u8]> = TableDefinition::new("connections");

/// Scheduling constraints, one rule per row.
pub const PLACEMENTS: TableDefinition<RowId, &[u8]> = TableDefinition::new("placements");

/// Containers: desired ones on the master, running ones on a worker.
pub const CONTAINERS: TableDefinition<RowId, &[u8]> = TableDefinition::new("containers");

/// Named counters keyed by sequence name.
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Sequence all row ids are drawn from.
pub const ROW_ID_SEQUENCE: &str = "row_id";
