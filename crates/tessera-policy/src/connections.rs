//! Connection reconciler.

use tracing::debug;

use tessera_core::{Blueprint, ConnectionSpec};
use tessera_join::{Join, hash_join};
use tessera_state::{Connection, View};

use crate::engine::TableStats;
use crate::error::PolicyResult;

/// A connection is identified by all four of its fields.
type ConnectionKey = (String, String, u16, u16);

fn spec_key(spec: &ConnectionSpec) -> ConnectionKey {
    (spec.from.clone(), spec.to.clone(), spec.min_port, spec.max_port)
}

fn row_key(row: &Connection) -> ConnectionKey {
    (row.from.clone(), row.to.clone(), row.min_port, row.max_port)
}

/// Make the connection table hold exactly the blueprint's connections.
///
/// Rows with no counterpart are removed, missing connections get a new
/// row, and every surviving row is rewritten from its blueprint entry and
/// committed. Re-running with the same blueprint rewrites the same values.
pub fn update_connections<V: View>(view: &V, blueprint: &Blueprint) -> PolicyResult<TableStats> {
    let current: Vec<Connection> = view.select_all()?;
    let Join {
        mut pairs,
        left_only,
        right_only,
    } = hash_join(blueprint.connections().to_vec(), current, spec_key, row_key);

    let mut stats = TableStats::default();

    for stale in &right_only {
        view.remove(stale)?;
        stats.removed += 1;
        debug!(
            id = stale.id,
            from = %stale.from,
            to = %stale.to,
            "removed connection"
        );
    }

    for spec in left_only {
        let row: Connection = view.insert()?;
        stats.inserted += 1;
        pairs.push((spec, row));
    }

    for (spec, mut row) in pairs {
        row.from = spec.from;
        row.to = spec.to;
        row.min_port = spec.min_port;
        row.max_port = spec.max_port;
        view.commit(&row)?;
        stats.committed += 1;
    }

    Ok(stats)
}
