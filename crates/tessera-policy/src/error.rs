//! Policy engine error types.

use thiserror::Error;

/// Errors that can abort a reconciliation pass.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid blueprint: {0}")]
    InvalidBlueprint(#[from] tessera_core::CompileError),

    #[error("state store error: {0}")]
    State(#[from] tessera_state::StateError),
}

pub type PolicyResult<T> = Result<T, PolicyError>;
