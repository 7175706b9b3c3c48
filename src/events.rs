//! Structured diagnostics emitted by the stopping policy
//!
//! Every branch of a policy step is reported as a [`PolicyEvent`] to the
//! policy's [`EventSink`]. The default sink forwards events to `tracing`;
//! a `Vec<PolicyEvent>` can be used to record them instead.

use std::fmt;

/// A single branch taken while evaluating an epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolicyEvent {
    /// Loss improved on the previous epoch by more than min_delta
    StreakExtended { streak: usize },

    /// Loss beat the recorded best by more than min_delta
    NewMinimum { loss: f64 },

    /// No new best and no qualifying streak
    StaleIncremented { stale_count: usize, patience: usize },

    /// Streak in the moderate band; staleness forgiven, best kept
    ModerateStreakReset { streak: usize },

    /// Streak in the high band; current loss adopted as best
    ForcedBestReset { loss: f64, streak: usize },

    /// Stale counter reached patience
    StopTriggered { stale_count: usize, patience: usize },

    /// Policy state restored to its initial values
    Reset,
}

impl fmt::Display for PolicyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreakExtended { streak } => {
                write!(f, "Loss improved. Consecutive improvements: {streak}")
            }
            Self::NewMinimum { loss } => {
                write!(f, "New minimum validation loss: {loss}. Counter reset.")
            }
            Self::StaleIncremented {
                stale_count,
                patience,
            } => write!(f, "No new min. Counter incremented to {stale_count}/{patience}"),
            Self::ModerateStreakReset { streak } => write!(
                f,
                "Improvement streak of {streak} epochs. Counter reset, best loss kept"
            ),
            Self::ForcedBestReset { loss, streak } => write!(
                f,
                "Improvement streak of {streak} epochs without a new min. Best loss set to {loss}"
            ),
            Self::StopTriggered {
                stale_count,
                patience,
            } => write!(
                f,
                "Early stopping triggered ({stale_count} stale epochs, patience {patience})"
            ),
            Self::Reset => write!(f, "Early stopping state reset"),
        }
    }
}

/// Receiver for policy diagnostics.
pub trait EventSink {
    fn record(&mut self, event: &PolicyEvent);
}

/// Forwards policy events to `tracing` under the `early_stopping` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: &PolicyEvent) {
        match *event {
            PolicyEvent::StreakExtended { streak } => {
                tracing::debug!(target: "early_stopping", streak, "{}", event);
            }
            PolicyEvent::NewMinimum { loss } => {
                tracing::debug!(target: "early_stopping", loss, "{}", event);
            }
            PolicyEvent::StaleIncremented {
                stale_count,
                patience,
            } => {
                tracing::debug!(
                    target: "early_stopping",
                    stale_count,
                    patience,
                    "{}",
                    event
                );
            }
            PolicyEvent::ModerateStreakReset { streak } => {
                tracing::debug!(target: "early_stopping", streak, "{}", event);
            }
            PolicyEvent::ForcedBestReset { loss, streak } => {
                tracing::info!(target: "early_stopping", loss, streak, "{}", event);
            }
            PolicyEvent::StopTriggered {
                stale_count,
                patience,
            } => {
                tracing::info!(
                    target: "early_stopping",
                    stale_count,
                    patience,
                    "{}",
                    event
                );
            }
            PolicyEvent::Reset => {
                tracing::debug!(target: "early_stopping", "{}", event);
            }
        }
    }
}

impl EventSink for Vec<PolicyEvent> {
    fn record(&mut self, event: &PolicyEvent) {
        self.push(*event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: &PolicyEvent) {
        (**self).record(event);
    }
}
