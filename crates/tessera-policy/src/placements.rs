//! Placement reconciler.
//!
//! Desired placements come from two places:
//! - the blueprint's placement directives (label and machine rules)
//! - the connection table: every port opened to the public internet pins
//!   a [`PlacementRule::Port`] on the destination label
//!
//! The second source reads the view, so connections must already be
//! reconciled when this runs.

use std::collections::BTreeSet;

use tracing::debug;

use tessera_core::{Blueprint, PUBLIC_INTERNET_LABEL, PlacementSpec};
use tessera_join::{Join, hash_join};
use tessera_state::{Connection, Placement, PlacementRule, View};

use crate::engine::TableStats;
use crate::error::PolicyResult;

/// A placement is identified by its target label and rule.
pub type PlacementKey = (String, PlacementRule);

fn row_key(row: &Placement) -> PlacementKey {
    (row.target_label.clone(), row.rule.clone())
}

/// Rules stated directly in the blueprint.
///
/// One label rule per peer label and one machine rule per attribute with a
/// non-empty value. Identical rules from different directives collapse.
pub fn blueprint_placements(specs: &[PlacementSpec]) -> BTreeSet<PlacementKey> {
    let mut placements = BTreeSet::new();
    for spec in specs {
        for other in &spec.other_labels {
            placements.insert((
                spec.target_label.clone(),
                PlacementRule::Label {
                    other_label: other.clone(),
                    exclusive: spec.exclusive,
                },
            ));
        }
        for (attribute, value) in &spec.machine_attributes {
            if value.is_empty() {
                continue;
            }
            placements.insert((
                spec.target_label.clone(),
                PlacementRule::Machine {
                    exclusive: spec.exclusive,
                    attribute: attribute.clone(),
                    value: value.clone(),
                },
            ));
        }
    }
    placements
}

/// One port rule per port opened from the public internet, on the
/// connection's destination label.
pub fn connection_placements(connections: &[Connection]) -> Vec<PlacementKey> {
    connections
        .iter()
        .filter(|conn| conn.from == PUBLIC_INTERNET_LABEL)
        .flat_map(|conn| {
            (conn.min_port..=conn.max_port)
                .map(move |port| (conn.to.clone(), PlacementRule::Port { port }))
        })
        .collect()
}

/// Make the placement table hold exactly the derived placement set.
///
/// Placement rows are immutable values: matched rows are left alone, the
/// rest are inserted or removed.
pub fn update_placements<V: View>(view: &V, blueprint: &Blueprint) -> PolicyResult<TableStats> {
    let connections: Vec<Connection> = view.select_all()?;

    let mut desired = blueprint_placements(blueprint.placements());
    desired.extend(connection_placements(&connections));

    let current: Vec<Placement> = view.select_all()?;
    let Join {
        left_only,
        right_only,
        ..
    } = hash_join(
        desired.into_iter().collect(),
        current,
        |key: &PlacementKey| key.clone(),
        row_key,
    );

    let mut stats = TableStats::default();

    for stale in &right_only {
        view.remove(stale)?;
        stats.removed += 1;
        debug!(id = stale.id, target = %stale.target_label, rule = ?stale.rule, "removed placement");
    }

    for (target_label, rule) in left_only {
        let mut row: Placement = view.insert()?;
        row.target_label = target_label;
        row.rule = rule;
        view.commit(&row)?;
        stats.inserted += 1;
        stats.committed += 1;
        debug!(id = row.id, target = %row.target_label, rule = ?row.rule, "inserted placement");
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn spec(target: &str, exclusive: bool, others: &[&str], machine: &[(&str, &str)]) -> PlacementSpec {
        PlacementSpec {
            target_label: target.to_string(),
            exclusive,
            other_labels: others.iter().map(|l| l.to_string()).collect(),
            machine_attributes: machine
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn conn(from: &str, to: &str, min_port: u16, max_port: u16) -> Connection {
        Connection {
            id: 0,
            from: from.to_string(),
            to: to.to_string(),
            min_port,
            max_port,
        }
    }

    #[test]
    fn one_label_rule_per_peer() {
        let placements = blueprint_placements(&[spec("web", true, &["db", "cache"], &[])]);

        let peers: Vec<_> = placements
            .iter()
            .map(|(target, rule)| match rule {
                PlacementRule::Label { other_label, exclusive } => {
                    assert_eq!(target, "web");
                    assert!(*exclusive);
                    other_label.as_str()
                }
                other => panic!("unexpected rule {other:?}"),
            })
            .collect();
        assert_eq!(peers, vec!["cache", "db"]);
    }

    #[test]
    fn empty_machine_values_are_skipped() {
        let placements = blueprint_placements(&[spec(
            "web",
            false,
            &[],
            &[("provider", "aws"), ("region", ""), ("size", "m4.large")],
        )]);

        let attributes: Vec<_> = placements
            .iter()
            .filter_map(|(_, rule)| match rule {
                PlacementRule::Machine { attribute, .. } => Some(attribute.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(attributes, vec!["provider", "size"]);
    }

    #[test]
    fn identical_directives_collapse() {
        let placements = blueprint_placements(&[
            spec("web", true, &["db"], &[("provider", "aws")]),
            spec("web", true, &["db"], &[("provider", "aws")]),
        ]);
        assert_eq!(placements.len(), 2);
    }

    #[test]
    fn exclusivity_distinguishes_rules() {
        let placements = blueprint_placements(&[
            spec("web", true, &["db"], &[]),
            spec("web", false, &["db"], &[]),
        ]);
        assert_eq!(placements.len(), 2);
    }

    #[test]
    fn public_connections_expand_to_one_rule_per_port() {
        let rules = connection_placements(&[
            conn("public", "web", 80, 82),
            conn("web", "db", 5432, 5432),
        ]);

        assert_eq!(
            rules,
            vec![
                ("web".to_string(), PlacementRule::Port { port: 80 }),
                ("web".to_string(), PlacementRule::Port { port: 81 }),
                ("web".to_string(), PlacementRule::Port { port: 82 }),
            ]
        );
    }

    #[test]
    fn port_range_reaching_u16_max_terminates() {
        let rules = connection_placements(&[conn("public", "edge", u16::MAX - 1, u16::MAX)]);
        assert_eq!(rules.len(), 2);
    }
}
