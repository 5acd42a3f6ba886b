//! Policy update entry points.

use tracing::{info, warn};

use tessera_core::{Blueprint, Role};
use tessera_state::{StateStore, View};

use crate::connections::update_connections;
use crate::containers::update_containers;
use crate::error::PolicyResult;
use crate::placements::update_placements;

/// Row operations issued against one table during a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub inserted: u32,
    pub removed: u32,
    pub committed: u32,
}

impl TableStats {
    /// No rows were added or deleted (rows may still have been rewritten).
    pub fn is_stable(&self) -> bool {
        self.inserted == 0 && self.removed == 0
    }
}

/// Per-table operations issued during one [`update_policy`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub connections: TableStats,
    pub placements: TableStats,
    pub containers: TableStats,
}

impl UpdateStats {
    pub fn is_stable(&self) -> bool {
        self.connections.is_stable() && self.placements.is_stable() && self.containers.is_stable()
    }
}

/// Reconcile the view against blueprint `source`.
///
/// An invalid blueprint is logged and reported before anything is written.
/// Connections are synced on every node; placements and containers only on
/// the master, and only after connections, since public ports become
/// placement rules.
pub fn update_policy<V: View>(view: &V, role: Role, source: &str) -> PolicyResult<UpdateStats> {
    let blueprint = match Blueprint::compile(source) {
        Ok(blueprint) => blueprint,
        Err(e) => {
            warn!(error = %e, "invalid blueprint, skipping policy update");
            return Err(e.into());
        }
    };

    let mut stats = UpdateStats {
        connections: update_connections(view, &blueprint)?,
        ..UpdateStats::default()
    };

    if role == Role::Master {
        stats.placements = update_placements(view, &blueprint)?;
        stats.containers = update_containers(view, &blueprint)?;
    }

    info!(
        %role,
        connections_inserted = stats.connections.inserted,
        connections_removed = stats.connections.removed,
        placements_inserted = stats.placements.inserted,
        placements_removed = stats.placements.removed,
        containers_inserted = stats.containers.inserted,
        containers_removed = stats.containers.removed,
        "policy updated"
    );

    Ok(stats)
}

/// Run [`update_policy`] as one atomic transaction on `store`.
pub fn apply_policy(store: &StateStore, role: Role, source: &str) -> PolicyResult<UpdateStats> {
    store.transact(|txn| update_policy(txn, role, source))
}
