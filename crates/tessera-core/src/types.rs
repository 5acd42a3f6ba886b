//! Shared types used across Tessera crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownRole;

/// Endpoint label standing for traffic from outside the cluster.
///
/// Never a container label; only valid as a connection endpoint.
pub const PUBLIC_INTERNET_LABEL: &str = "public";

/// What a node is responsible for in the cluster.
///
/// Only the master owns the aspirational placement and container tables;
/// on a worker the container table mirrors what actually runs locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Master,
    #[default]
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Worker => "worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "master" => Ok(Role::Master),
            "worker" => Ok(Role::Worker),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}
