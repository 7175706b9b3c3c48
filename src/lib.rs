//! # rust-early-stopping
//!
//! Early stopping for iterative training loops.
//!
//! The [`StoppingPolicy`] is fed one validation loss per epoch and answers
//! whether training should halt. Besides the usual patience counter it keeps
//! track of epoch-over-epoch improvement streaks: a moderate streak forgives
//! staleness, and a long streak adopts the current loss as the new reference
//! point even when it does not beat the recorded best.
//!
//! Modules:
//! - [`config`]: patience / min_delta configuration with JSON file support
//! - [`bands`]: streak thresholds derived from patience
//! - [`events`]: structured diagnostics emitted by the policy
//! - [`policy`]: the per-epoch state machine
//! - [`controller`]: caller-side epoch loop driving a policy

pub mod bands;
pub mod config;
pub mod controller;
pub mod events;
pub mod policy;

pub use bands::ImprovementBands;
pub use config::StoppingConfig;
pub use controller::{replay, EpochController, StopReport};
pub use events::{EventSink, PolicyEvent, TracingSink};
pub use policy::{Decision, Outcome, PolicyState, StoppingPolicy};

/// Result type for early stopping operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for early stopping operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Non-finite validation loss {value} at epoch {epoch}")]
    NonFiniteLoss { epoch: usize, value: f64 },

    #[error("Epoch {epoch} failed: {source}")]
    Epoch {
        epoch: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
