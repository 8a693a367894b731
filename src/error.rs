//! Error types for the fallible edges of the simulation.
//!
//! Advancing a tick never fails; only configuration and snapshot
//! (de)serialization can.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to parse configuration: {0}")]
    Config(#[source] serde_json::Error),

    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("snapshot serialization failed: {0}")]
    Snapshot(#[source] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
