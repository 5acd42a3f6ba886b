pub mod blueprint;
pub mod config;
pub mod error;
pub mod types;

pub use blueprint::{Blueprint, BlueprintFile, ConnectionSpec, ContainerId, ContainerSpec, PlacementSpec};
pub use config::DaemonConfig;
pub use error::{CompileError, UnknownRole};
pub use types::*;
