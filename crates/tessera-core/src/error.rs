//! Error types for blueprint compilation.

use thiserror::Error;

use crate::blueprint::ContainerId;

/// Why a blueprint was rejected.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("blueprint syntax error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("container {0} is declared more than once")]
    DuplicateContainer(ContainerId),

    #[error("container {0} has no image")]
    MissingImage(ContainerId),

    #[error("label `{0}` is reserved for connection endpoints")]
    ReservedLabel(String),

    #[error("label `{label}` references undeclared container {id}")]
    UnknownContainer { label: String, id: ContainerId },

    #[error("{context} references undeclared label `{label}`")]
    UnknownLabel {
        context: &'static str,
        label: String,
    },

    #[error("connection {from} -> {to} must set either `port` or `min_port` (with optional `max_port`)")]
    InvalidPorts { from: String, to: String },

    #[error("connection {from} -> {to} has an empty port range {min}-{max}")]
    EmptyPortRange {
        from: String,
        to: String,
        min: u16,
        max: u16,
    },
}

/// A role name other than `master` or `worker`.
#[derive(Debug, Error)]
#[error("unknown role `{0}` (expected `master` or `worker`)")]
pub struct UnknownRole(pub String);
