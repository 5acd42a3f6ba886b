//! Container reconciler.
//!
//! Blueprint container ids are not stable across compilations, so stored
//! rows are matched to desired containers by content. A row can only stand
//! for a desired container with the same image, command and environment;
//! among those, the pairing that changes the fewest labels wins. A label
//! change therefore rewrites the row in place instead of replacing the
//! container.

use std::collections::BTreeMap;

use tracing::debug;

use tessera_core::{Blueprint, ContainerId};
use tessera_join::{Join, edit_distance, scored_match};
use tessera_state::{Container, View};

use crate::engine::TableStats;
use crate::error::PolicyResult;

/// A container the blueprint asks for, stripped of its blueprint id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredContainer {
    pub command: Vec<String>,
    pub image: String,
    pub env: BTreeMap<String, String>,
    pub labels: Vec<String>,
}

/// Attach labels to the blueprint's containers, then drop the ids.
///
/// Output is ordered by blueprint container id.
pub fn desired_containers(blueprint: &Blueprint) -> Vec<DesiredContainer> {
    let mut by_id: BTreeMap<ContainerId, DesiredContainer> = blueprint
        .containers()
        .iter()
        .map(|c| {
            let desired = DesiredContainer {
                command: c.command.clone(),
                image: c.image.clone(),
                env: c.env.clone(),
                labels: Vec::new(),
            };
            (c.id, desired)
        })
        .collect();

    for (label, ids) in blueprint.labels() {
        for id in ids {
            match by_id.get_mut(id) {
                Some(container) => container.labels.push(label.clone()),
                // Blueprint::compile rejects labels on undeclared containers.
                None => unreachable!("label `{label}` references undeclared container {id}"),
            }
        }
    }

    by_id.into_values().collect()
}

/// Cost of letting `row` stand for `desired`, or `None` if it never can.
pub fn match_cost(desired: &DesiredContainer, row: &Container) -> Option<u32> {
    if desired.image != row.image || desired.command != row.command || desired.env != row.env {
        return None;
    }
    Some(edit_distance(&desired.labels, &row.labels))
}

/// Make the container table hold one row per desired container.
///
/// Unmatched rows are removed and unmatched desired containers get new
/// rows. Every kept or new row is rewritten from its desired container,
/// with labels sorted, and committed.
pub fn update_containers<V: View>(view: &V, blueprint: &Blueprint) -> PolicyResult<TableStats> {
    let current: Vec<Container> = view.select_all()?;
    let Join {
        mut pairs,
        left_only,
        right_only,
    } = scored_match(desired_containers(blueprint), current, match_cost);

    let mut stats = TableStats::default();

    for stale in &right_only {
        view.remove(stale)?;
        stats.removed += 1;
        debug!(id = stale.id, image = %stale.image, "removed container");
    }

    for desired in left_only {
        let row: Container = view.insert()?;
        stats.inserted += 1;
        debug!(id = row.id, image = %desired.image, "inserted container");
        pairs.push((desired, row));
    }

    for (desired, mut row) in pairs {
        // Label order out of the blueprint is not meaningful; keep it
        // canonical so an unchanged blueprint rewrites identical rows.
        row.labels = desired.labels;
        row.labels.sort();

        row.command = desired.command;
        row.image = desired.image;
        row.env = desired.env;
        view.commit(&row)?;
        stats.committed += 1;
    }

    Ok(stats)
}
