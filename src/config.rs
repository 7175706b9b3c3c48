//! Configuration for the stopping policy

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Configuration for early stopping during training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoppingConfig {
    /// Number of epochs with no improvement after which training will be stopped.
    #[serde(default = "default_patience")]
    pub patience: usize,

    /// Minimum decrease in validation loss to qualify as an improvement.
    /// Improvement is defined as: current_loss < reference_loss - min_delta
    #[serde(default = "default_min_delta")]
    pub min_delta: f64,
}

fn default_patience() -> usize {
    5
}

fn default_min_delta() -> f64 {
    0.0
}

impl Default for StoppingConfig {
    fn default() -> Self {
        Self {
            patience: default_patience(),
            min_delta: default_min_delta(),
        }
    }
}

impl StoppingConfig {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self { patience, min_delta }
    }

    /// Check that the configuration describes a usable policy.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] if `min_delta` is negative or not finite.
    /// A `patience` of 0 is accepted (every call then reports stop) but logged.
    pub fn validate(&self) -> Result<()> {
        if !self.min_delta.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "min_delta must be finite, got {}",
                self.min_delta
            )));
        }
        if self.min_delta < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "min_delta must be non-negative, got {}",
                self.min_delta
            )));
        }
        if self.patience == 0 {
            tracing::warn!("patience is 0; the policy will request a stop on every epoch");
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
