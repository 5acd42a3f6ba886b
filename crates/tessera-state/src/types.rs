//! Row types for the Tessera state store.
//!
//! Each row carries a store-assigned `id`. The id is a storage handle only:
//! reconcilers decide which rows correspond by looking at field values,
//! never at ids.

use std::collections::BTreeMap;

use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use crate::tables::{CONNECTIONS, CONTAINERS, PLACEMENTS};
use crate::view::Row;

/// Store-assigned row identifier.
pub type RowId = u64;

// ── Connection ────────────────────────────────────────────────────

/// An allowed flow from one endpoint label to another over an inclusive
/// port range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: RowId,
    pub from: String,
    pub to: String,
    pub min_port: u16,
    pub max_port: u16,
}

impl Row for Connection {
    const TABLE: TableDefinition<'static, RowId, &'static [u8]> = CONNECTIONS;
    const KIND: &'static str = "connection";

    fn with_id(id: RowId) -> Self {
        Self {
            id,
            from: String::new(),
            to: String::new(),
            min_port: 0,
            max_port: 0,
        }
    }

    fn id(&self) -> RowId {
        self.id
    }
}

// ── Placement ─────────────────────────────────────────────────────

/// A scheduling constraint on the containers carrying `target_label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: RowId,
    pub target_label: String,
    pub rule: PlacementRule,
}

/// The constraint a placement row expresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlacementRule {
    /// Run together with (or, if exclusive, apart from) another label.
    Label { other_label: String, exclusive: bool },
    /// Run on (or, if exclusive, off) machines whose `attribute` equals `value`.
    Machine {
        exclusive: bool,
        attribute: String,
        value: String,
    },
    /// Expose `port` to the public internet; two containers needing the same
    /// port cannot share a machine.
    Port { port: u16 },
}

impl Row for Placement {
    const TABLE: TableDefinition<'static, RowId, &'static [u8]> = PLACEMENTS;
    const KIND: &'static str = "placement";

    fn with_id(id: RowId) -> Self {
        // The rule is a placeholder until the caller fills the row in.
        Self {
            id,
            target_label: String::new(),
            rule: PlacementRule::Label {
                other_label: String::new(),
                exclusive: false,
            },
        }
    }

    fn id(&self) -> RowId {
        self.id
    }
}

// ── Container ─────────────────────────────────────────────────────

/// A deployable container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: RowId,
    pub command: Vec<String>,
    pub image: String,
    pub env: BTreeMap<String, String>,
    /// Every label the container carries.
    pub labels: Vec<String>,
}

impl Row for Container {
    const TABLE: TableDefinition<'static, RowId, &'static [u8]> = CONTAINERS;
    const KIND: &'static str = "container";

    fn with_id(id: RowId) -> Self {
        Self {
            id,
            command: Vec::new(),
            image: String::new(),
            env: BTreeMap::new(),
            labels: Vec::new(),
        }
    }

    fn id(&self) -> RowId {
        self.id
    }
}
