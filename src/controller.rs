//! Epoch loop that drives a [`StoppingPolicy`]
//!
//! The controller owns the caller side of the contract: it feeds exactly one
//! loss per epoch, in order, rejects non-finite losses before they reach the
//! policy, and halts at the first stop verdict.

use crate::config::StoppingConfig;
use crate::events::{EventSink, TracingSink};
use crate::policy::{PolicyState, StoppingPolicy};
use crate::{Error, Result};

/// Summary of a controlled training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopReport {
    /// Number of epochs whose loss was evaluated
    pub epochs_run: usize,
    /// Epoch (1-based) at which the policy requested a stop
    pub stopped_at: Option<usize>,
    /// Lowest validation loss observed, independent of the policy's reference loss
    pub lowest_loss: f64,
    /// Policy state after the last evaluated epoch
    pub final_state: PolicyState,
}

impl StopReport {
    pub fn stopped_early(&self) -> bool {
        self.stopped_at.is_some()
    }
}

/// Runs epochs until the policy requests a stop or `max_epochs` is reached.
///
/// The controller remembers how far it got, so a later [`run`](Self::run)
/// continues with the next epoch instead of starting over.
pub struct EpochController<S = TracingSink> {
    policy: StoppingPolicy<S>,
    max_epochs: usize,
    epochs_run: usize,
    lowest_loss: f64,
    stopped_at: Option<usize>,
}

impl<S: EventSink> EpochController<S> {
    pub fn new(policy: StoppingPolicy<S>, max_epochs: usize) -> Self {
        Self {
            policy,
            max_epochs,
            epochs_run: 0,
            lowest_loss: f64::INFINITY,
            stopped_at: None,
        }
    }

    /// Runs the remaining epochs, up to `max_epochs` in total.
    ///
    /// `epoch_fn` receives the 1-based epoch number and returns that epoch's
    /// validation loss. Epoch numbering and the lowest loss carry over from
    /// earlier calls. Once the policy has requested a stop, `epoch_fn` is no
    /// longer called and the existing report is returned.
    ///
    /// # Errors
    /// - [`Error::Epoch`] if `epoch_fn` fails
    /// - [`Error::NonFiniteLoss`] if `epoch_fn` returns NaN or an infinite loss
    ///
    /// A failed epoch is not counted; the next call retries it.
    pub fn run<F>(&mut self, mut epoch_fn: F) -> Result<StopReport>
    where
        F: FnMut(usize) -> anyhow::Result<f64>,
    {
        if let Some(epoch) = self.stopped_at {
            tracing::debug!(epoch, "Training already stopped; not running further epochs");
            return Ok(self.report());
        }

        for epoch in self.epochs_run + 1..=self.max_epochs {
            let loss = epoch_fn(epoch).map_err(|source| Error::Epoch { epoch, source })?;
            if !loss.is_finite() {
                tracing::error!(epoch, loss, "Validation loss is not finite");
                return Err(Error::NonFiniteLoss { epoch, value: loss });
            }

            tracing::debug!(
                epoch,
                loss,
                "Epoch {}/{} validation loss: {:.4}",
                epoch,
                self.max_epochs,
                loss
            );

            if loss < self.lowest_loss {
                self.lowest_loss = loss;
            }
            self.epochs_run = epoch;

            if self.policy.evaluate(loss) {
                tracing::info!(
                    epoch,
                    best_loss = self.policy.best_loss(),
                    "Early stopping triggered at epoch {} (best loss {:.4}).",
                    epoch,
                    self.policy.best_loss()
                );
                self.stopped_at = Some(epoch);
                break;
            }
        }

        if self.stopped_at.is_none() {
            tracing::info!(
                epochs_run = self.epochs_run,
                lowest_loss = self.lowest_loss,
                "Training completed. Lowest loss: {:.4}",
                self.lowest_loss
            );
        }

        Ok(self.report())
    }

    /// Summary of all epochs run so far.
    pub fn report(&self) -> StopReport {
        StopReport {
            epochs_run: self.epochs_run,
            stopped_at: self.stopped_at,
            lowest_loss: self.lowest_loss,
            final_state: self.policy.state(),
        }
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn policy(&self) -> &StoppingPolicy<S> {
        &self.policy
    }

    pub fn into_policy(self) -> StoppingPolicy<S> {
        self.policy
    }
}

/// Feeds a recorded loss trace through a fresh policy.
///
/// # Errors
/// Returns an error if `config` is invalid or the trace contains a non-finite loss
pub fn replay(config: StoppingConfig, losses: &[f64]) -> Result<StopReport> {
    let policy = StoppingPolicy::try_new(config)?;
    let mut controller = EpochController::new(policy, losses.len());
    controller.run(|epoch| Ok(losses[epoch - 1]))
}
