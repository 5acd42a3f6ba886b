//! Blueprint parser and compiler.
//!
//! A blueprint is a TOML document declaring the containers a cluster should
//! run, which labels they carry, which connections are allowed between
//! labels, and where labelled containers may be placed:
//!
//! ```toml
//! [[container]]
//! id = 1
//! image = "nginx"
//!
//! [labels]
//! web = [1]
//!
//! [[connection]]
//! from = "public"
//! to = "web"
//! min_port = 80
//! max_port = 82
//!
//! [[placement]]
//! target = "web"
//! exclusive = true
//! machine = { provider = "aws" }
//! ```
//!
//! [`BlueprintFile`] is the raw document; [`Blueprint`] is the validated
//! model handed to the reconcilers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::types::PUBLIC_INTERNET_LABEL;

/// Blueprint-local container identifier. Only meaningful inside one
/// compiled blueprint; it is not carried into the state store.
pub type ContainerId = u32;

// ── Raw document ───────────────────────────────────────────────────

/// A blueprint as written, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlueprintFile {
    #[serde(default, rename = "container")]
    pub containers: Vec<ContainerEntry>,
    /// Label name → ids of the containers carrying it.
    #[serde(default)]
    pub labels: BTreeMap<String, Vec<ContainerId>>,
    #[serde(default, rename = "connection")]
    pub connections: Vec<ConnectionEntry>,
    #[serde(default, rename = "placement")]
    pub placements: Vec<PlacementEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerEntry {
    pub id: ContainerId,
    pub image: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionEntry {
    pub from: String,
    pub to: String,
    pub port: Option<u16>,
    pub min_port: Option<u16>,
    pub max_port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlacementEntry {
    pub target: String,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default)]
    pub other_labels: Vec<String>,
    /// Machine attribute → required value. Empty values mean "no constraint".
    #[serde(default)]
    pub machine: BTreeMap<String, String>,
}

// ── Compiled model ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSpec {
    pub id: ContainerId,
    pub image: String,
    pub command: Vec<String>,
    pub env: BTreeMap<String, String>,
}

/// An allowed flow from one endpoint to another over an inclusive port range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionSpec {
    pub from: String,
    pub to: String,
    pub min_port: u16,
    pub max_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementSpec {
    pub target_label: String,
    pub exclusive: bool,
    pub other_labels: Vec<String>,
    pub machine_attributes: BTreeMap<String, String>,
}

/// A validated blueprint.
///
/// Every label names only declared containers, every connection endpoint
/// is a declared label or [`PUBLIC_INTERNET_LABEL`], and every port range
/// is non-empty. Containers are ordered by id and labels by name;
/// connections and placements keep document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Blueprint {
    containers: Vec<ContainerSpec>,
    labels: BTreeMap<String, Vec<ContainerId>>,
    connections: Vec<ConnectionSpec>,
    placements: Vec<PlacementSpec>,
}

impl Blueprint {
    /// Parse and validate blueprint source text.
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let file: BlueprintFile = toml::from_str(source)?;
        file.compile()
    }

    pub fn containers(&self) -> &[ContainerSpec] {
        &self.containers
    }

    /// Label name → container ids, each list sorted and free of duplicates.
    pub fn labels(&self) -> &BTreeMap<String, Vec<ContainerId>> {
        &self.labels
    }

    pub fn connections(&self) -> &[ConnectionSpec] {
        &self.connections
    }

    pub fn placements(&self) -> &[PlacementSpec] {
        &self.placements
    }
}

impl BlueprintFile {
    /// Validate the raw document into a [`Blueprint`].
    pub fn compile(self) -> Result<Blueprint, CompileError> {
        let mut containers: BTreeMap<ContainerId, ContainerSpec> = BTreeMap::new();
        for entry in self.containers {
            if entry.image.trim().is_empty() {
                return Err(CompileError::MissingImage(entry.id));
            }
            if containers.contains_key(&entry.id) {
                return Err(CompileError::DuplicateContainer(entry.id));
            }
            containers.insert(
                entry.id,
                ContainerSpec {
                    id: entry.id,
                    image: entry.image,
                    command: entry.command,
                    env: entry.env,
                },
            );
        }

        let mut labels = BTreeMap::new();
        for (label, ids) in self.labels {
            if label == PUBLIC_INTERNET_LABEL {
                return Err(CompileError::ReservedLabel(label));
            }
            let ids: BTreeSet<ContainerId> = ids.into_iter().collect();
            if let Some(&id) = ids.iter().find(|id| !containers.contains_key(*id)) {
                return Err(CompileError::UnknownContainer { label, id });
            }
            labels.insert(label, ids.into_iter().collect::<Vec<_>>());
        }

        let connections = self
            .connections
            .into_iter()
            .map(|entry| compile_connection(entry, &labels))
            .collect::<Result<Vec<_>, _>>()?;

        let placements = self
            .placements
            .into_iter()
            .map(|entry| compile_placement(entry, &labels))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Blueprint {
            containers: containers.into_values().collect(),
            labels,
            connections,
            placements,
        })
    }
}

fn compile_connection(
    entry: ConnectionEntry,
    labels: &BTreeMap<String, Vec<ContainerId>>,
) -> Result<ConnectionSpec, CompileError> {
    for endpoint in [&entry.from, &entry.to] {
        if endpoint != PUBLIC_INTERNET_LABEL && !labels.contains_key(endpoint) {
            return Err(CompileError::UnknownLabel {
                context: "connection",
                label: endpoint.clone(),
            });
        }
    }

    let (min_port, max_port) = match (entry.port, entry.min_port, entry.max_port) {
        (Some(port), None, None) => (port, port),
        (None, Some(min), None) => (min, min),
        (None, Some(min), Some(max)) => (min, max),
        _ => {
            return Err(CompileError::InvalidPorts {
                from: entry.from,
                to: entry.to,
            });
        }
    };

    if min_port > max_port {
        return Err(CompileError::EmptyPortRange {
            from: entry.from,
            to: entry.to,
            min: min_port,
            max: max_port,
        });
    }

    Ok(ConnectionSpec {
        from: entry.from,
        to: entry.to,
        min_port,
        max_port,
    })
}

fn compile_placement(
    entry: PlacementEntry,
    labels: &BTreeMap<String, Vec<ContainerId>>,
) -> Result<PlacementSpec, CompileError> {
    let referenced = std::iter::once(&entry.target).chain(&entry.other_labels);
    if let Some(unknown) = referenced.into_iter().find(|l| !labels.contains_key(*l)) {
        return Err(CompileError::UnknownLabel {
            context: "placement",
            label: unknown.clone(),
        });
    }

    Ok(PlacementSpec {
        target_label: entry.target,
        exclusive: entry.exclusive,
        other_labels: entry.other_labels,
        machine_attributes: entry.machine,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[[container]]
id = 2
image = "postgres"
env = { POSTGRES_DB = "app" }

[[container]]
id = 1
image = "nginx"
command = ["nginx", "-g", "daemon off;"]

[labels]
web = [1]
db = [2, 2]

[[connection]]
from = "public"
to = "web"
min_port = 80
max_port = 82

[[connection]]
from = "web"
to = "db"
port = 5432

[[placement]]
target = "web"
exclusive = true
other_labels = ["db"]
machine = { provider = "aws", region = "" }
"#;

    #[test]
    fn compiles_full_blueprint() {
        let bp = Blueprint::compile(FULL).unwrap();

        let ids: Vec<_> = bp.containers().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2], "containers are ordered by id");
        assert_eq!(bp.containers()[0].command, vec!["nginx", "-g", "daemon off;"]);
        assert_eq!(bp.containers()[1].env.get("POSTGRES_DB").map(String::as_str), Some("app"));

        assert_eq!(bp.labels().get("db"), Some(&vec![2]), "duplicate ids collapse");
        assert_eq!(bp.labels().get("web"), Some(&vec![1]));

        assert_eq!(
            bp.connections(),
            &[
                ConnectionSpec {
                    from: "public".to_string(),
                    to: "web".to_string(),
                    min_port: 80,
                    max_port: 82,
                },
                ConnectionSpec {
                    from: "web".to_string(),
                    to: "db".to_string(),
                    min_port: 5432,
                    max_port: 5432,
                },
            ]
        );

        let placement = &bp.placements()[0];
        assert_eq!(placement.target_label, "web");
        assert!(placement.exclusive);
        assert_eq!(placement.other_labels, vec!["db"]);
        // Empty values survive compilation; the placement reconciler drops them.
        assert_eq!(placement.machine_attributes.len(), 2);
    }

    #[test]
    fn empty_source_is_an_empty_blueprint() {
        let bp = Blueprint::compile("").unwrap();
        assert_eq!(bp, Blueprint::default());
    }

    #[test]
    fn compiled_model_serializes() {
        let bp = Blueprint::compile(FULL).unwrap();
        let json = serde_json::to_value(&bp).unwrap();
        assert_eq!(json["connections"][0]["to"], "web");
        assert_eq!(json["labels"]["web"][0], 1);
    }

    #[test]
    fn rejects_syntax_errors() {
        let err = Blueprint::compile("[[container]\nid = ").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = Blueprint::compile("[[container]]\nid = 1\nimage = \"x\"\nimgae = \"y\"\n").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn rejects_duplicate_container() {
        let src = "[[container]]\nid = 1\nimage = \"a\"\n[[container]]\nid = 1\nimage = \"b\"\n";
        assert!(matches!(
            Blueprint::compile(src).unwrap_err(),
            CompileError::DuplicateContainer(1)
        ));
    }

    #[test]
    fn rejects_missing_image() {
        let src = "[[container]]\nid = 3\nimage = \"  \"\n";
        assert!(matches!(
            Blueprint::compile(src).unwrap_err(),
            CompileError::MissingImage(3)
        ));
    }

    #[test]
    fn rejects_label_on_undeclared_container() {
        let src = "[[container]]\nid = 1\nimage = \"a\"\n[labels]\nweb = [1, 9]\n";
        match Blueprint::compile(src).unwrap_err() {
            CompileError::UnknownContainer { label, id } => {
                assert_eq!(label, "web");
                assert_eq!(id, 9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_reserved_label() {
        let src = "[[container]]\nid = 1\nimage = \"a\"\n[labels]\npublic = [1]\n";
        assert!(matches!(
            Blueprint::compile(src).unwrap_err(),
            CompileError::ReservedLabel(_)
        ));
    }

    #[test]
    fn rejects_connection_to_unknown_label() {
        let src = "[[connection]]\nfrom = \"public\"\nto = \"web\"\nport = 80\n";
        match Blueprint::compile(src).unwrap_err() {
            CompileError::UnknownLabel { context, label } => {
                assert_eq!(context, "connection");
                assert_eq!(label, "web");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn connection_port_forms() {
        let base = "[[container]]\nid = 1\nimage = \"a\"\n[labels]\nweb = [1]\n[[connection]]\nfrom = \"public\"\nto = \"web\"\n";

        let bp = Blueprint::compile(&format!("{base}min_port = 443\n")).unwrap();
        assert_eq!((bp.connections()[0].min_port, bp.connections()[0].max_port), (443, 443));

        let err = Blueprint::compile(&format!("{base}port = 80\nmax_port = 90\n")).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPorts { .. }));

        let err = Blueprint::compile(base).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPorts { .. }));

        let err = Blueprint::compile(&format!("{base}min_port = 90\nmax_port = 80\n")).unwrap_err();
        assert!(matches!(err, CompileError::EmptyPortRange { min: 90, max: 80, .. }));
    }

    #[test]
    fn rejects_placement_on_unknown_label() {
        let src = "[[container]]\nid = 1\nimage = \"a\"\n[labels]\nweb = [1]\n[[placement]]\ntarget = \"web\"\nother_labels = [\"cache\"]\n";
        match Blueprint::compile(src).unwrap_err() {
            CompileError::UnknownLabel { context, label } => {
                assert_eq!(context, "placement");
                assert_eq!(label, "cache");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
