use crate::bands::ImprovementBands;
use crate::config::StoppingConfig;
use crate::events::{EventSink, PolicyEvent, TracingSink};
use crate::Result;

/// Snapshot of the mutable part of a [`StoppingPolicy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyState {
    /// Reference loss that new epochs must beat (lowest seen, unless replaced by a long streak)
    pub best_loss: f64,
    /// Loss passed to the previous call
    pub previous_loss: f64,
    /// Consecutive evaluations without a qualifying improvement
    pub stale_count: usize,
    /// Consecutive epoch-over-epoch improvements
    pub streak_count: usize,
}

impl PolicyState {
    fn initial() -> Self {
        Self {
            best_loss: f64::INFINITY,
            previous_loss: f64::INFINITY,
            stale_count: 0,
            streak_count: 0,
        }
    }
}

/// Which branch of the best-loss check an epoch went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Loss beat the recorded best by more than min_delta
    NewBest,
    /// No new best and the streak was below the low band
    Stale,
    /// Streak in `[low, high)`: stale counter reset, best kept
    ModerateStreak,
    /// Streak of at least `high`: stale counter reset, current loss adopted as best
    ForcedBest,
}

/// Full result of one policy step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub should_stop: bool,
    pub outcome: Outcome,
    /// Whether the loss improved on the previous epoch
    pub streak_extended: bool,
    /// State after the step
    pub state: PolicyState,
}

/// Streak-aware early stopping monitor.
///
/// Tracks validation loss and stops training when loss stops improving
/// for `patience` epochs. A run of consecutive epoch-over-epoch improvements
/// suspends the patience counter even if the global best is not beaten.
///
/// Each training run owns its own policy; there is no shared state between
/// instances.
#[derive(Debug, Clone)]
pub struct StoppingPolicy<S = TracingSink> {
    config: StoppingConfig,
    bands: ImprovementBands,
    state: PolicyState,
    sink: S,
}

impl StoppingPolicy<TracingSink> {
    /// Creates a policy that reports its decisions through `tracing`.
    pub fn new(config: StoppingConfig) -> Self {
        Self::with_sink(config, TracingSink)
    }

    /// Like [`StoppingPolicy::new`], but validates the configuration first.
    pub fn try_new(config: StoppingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }
}

impl Default for StoppingPolicy<TracingSink> {
    fn default() -> Self {
        Self::new(StoppingConfig::default())
    }
}

impl<S: EventSink> StoppingPolicy<S> {
    /// Creates a policy that reports its decisions to `sink`.
    ///
    /// # Arguments
    /// * `config` - Patience and min_delta
    /// * `sink` - Receiver for [`PolicyEvent`]s
    ///
    /// # Returns
    /// A policy with best and previous loss set to infinity and both counters at 0
    pub fn with_sink(config: StoppingConfig, sink: S) -> Self {
        Self {
            bands: ImprovementBands::from_patience(config.patience),
            config,
            state: PolicyState::initial(),
            sink,
        }
    }

    /// Checks if training should stop based on validation loss.
    ///
    /// Must be called once per epoch, in epoch order. The loss must not be NaN.
    ///
    /// # Returns
    /// `true` if the stale counter has reached patience, `false` otherwise
    pub fn evaluate(&mut self, validation_loss: f64) -> bool {
        self.step(validation_loss).should_stop
    }

    /// Evaluates one epoch and returns the full decision.
    ///
    /// # Behavior
    /// 1. Extends the streak if the loss beats the previous epoch by more than
    ///    min_delta, otherwise resets it
    /// 2. If the loss beats the best by more than min_delta, records a new best
    ///    and resets the stale counter. Otherwise, depending on the streak:
    ///    below the low band the stale counter is incremented, inside
    ///    `[low, high)` it is reset, and at or above the high band it is reset
    ///    and the current loss becomes the best
    /// 3. Requests a stop when the stale counter reaches patience
    /// 4. Remembers the loss as the previous loss
    pub fn step(&mut self, validation_loss: f64) -> Decision {
        debug_assert!(!validation_loss.is_nan(), "validation loss must not be NaN");

        let min_delta = self.config.min_delta;
        let state = &mut self.state;

        let streak_extended = validation_loss < state.previous_loss - min_delta;
        if streak_extended {
            state.streak_count += 1;
            self.sink.record(&PolicyEvent::StreakExtended {
                streak: state.streak_count,
            });
        } else {
            state.streak_count = 0;
        }

        let streak = state.streak_count;
        let outcome = if validation_loss < state.best_loss - min_delta {
            state.best_loss = validation_loss;
            state.stale_count = 0;
            self.sink.record(&PolicyEvent::NewMinimum {
                loss: validation_loss,
            });
            Outcome::NewBest
        } else if streak < self.bands.low {
            state.stale_count += 1;
            self.sink.record(&PolicyEvent::StaleIncremented {
                stale_count: state.stale_count,
                patience: self.config.patience,
            });
            Outcome::Stale
        } else if streak < self.bands.high {
            state.stale_count = 0;
            self.sink.record(&PolicyEvent::ModerateStreakReset { streak });
            Outcome::ModerateStreak
        } else {
            state.stale_count = 0;
            state.best_loss = validation_loss;
            self.sink.record(&PolicyEvent::ForcedBestReset {
                loss: validation_loss,
                streak,
            });
            Outcome::ForcedBest
        };

        let should_stop = state.stale_count >= self.config.patience;
        if should_stop {
            self.sink.record(&PolicyEvent::StopTriggered {
                stale_count: state.stale_count,
                patience: self.config.patience,
            });
        }

        state.previous_loss = validation_loss;

        Decision {
            should_stop,
            outcome,
            streak_extended,
            state: *state,
        }
    }

    /// Resets the early stopping state to initial values.
    pub fn reset(&mut self) {
        self.state = PolicyState::initial();
        self.sink.record(&PolicyEvent::Reset);
    }
}

impl<S> StoppingPolicy<S> {
    pub fn config(&self) -> &StoppingConfig {
        &self.config
    }

    pub fn patience(&self) -> usize {
        self.config.patience
    }

    pub fn min_delta(&self) -> f64 {
        self.config.min_delta
    }

    pub fn bands(&self) -> ImprovementBands {
        self.bands
    }

    /// Returns the current reference loss (may have been replaced by a long streak).
    pub fn best_loss(&self) -> f64 {
        self.state.best_loss
    }

    pub fn previous_loss(&self) -> f64 {
        self.state.previous_loss
    }

    /// Returns the current patience counter value.
    pub fn stale_count(&self) -> usize {
        self.state.stale_count
    }

    pub fn streak_count(&self) -> usize {
        self.state.streak_count
    }

    pub fn state(&self) -> PolicyState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(patience: usize, min_delta: f64) -> StoppingPolicy<Vec<PolicyEvent>> {
        StoppingPolicy::with_sink(StoppingConfig::new(patience, min_delta), Vec::new())
    }

    #[test]
    fn test_initial_state() {
        let policy: StoppingPolicy = StoppingPolicy::default();
        assert_eq!(policy.patience(), 5);
        assert_eq!(policy.min_delta(), 0.0);
        assert_eq!(policy.best_loss(), f64::INFINITY);
        assert_eq!(policy.previous_loss(), f64::INFINITY);
        assert_eq!(policy.stale_count(), 0);
        assert_eq!(policy.streak_count(), 0);
    }

    #[test]
    fn test_first_call_is_new_best_and_streak() {
        let mut policy = recording(5, 0.0);
        let decision = policy.step(1.0);

        assert!(!decision.should_stop);
        assert_eq!(decision.outcome, Outcome::NewBest);
        assert!(decision.streak_extended);
        assert_eq!(decision.state.streak_count, 1);
        assert_eq!(decision.state.best_loss, 1.0);
        assert_eq!(decision.state.previous_loss, 1.0);
    }

    #[test]
    fn test_plateau_scenario() {
        let mut policy = recording(5, 0.0);
        let losses = [1.0, 0.9, 0.95, 0.95, 0.95, 0.95];
        let expected_stale = [0, 0, 1, 2, 3, 4];
        let expected_streak = [1, 2, 0, 0, 0, 0];

        for ((&loss, &stale), &streak) in losses.iter().zip(&expected_stale).zip(&expected_streak) {
            assert!(!policy.evaluate(loss));
            assert_eq!(policy.stale_count(), stale);
            assert_eq!(policy.streak_count(), streak);
        }
        assert_eq!(policy.best_loss(), 0.9);
        assert_eq!(policy.previous_loss(), 0.95);
    }

    #[test]
    fn test_min_delta_applies_to_streak_and_best() {
        let mut policy = recording(3, 0.1);
        policy.evaluate(1.0);

        // 0.95 is not 0.1 below either reference
        let decision = policy.step(0.95);
        assert!(!decision.streak_extended);
        assert_eq!(decision.outcome, Outcome::Stale);
        assert_eq!(policy.best_loss(), 1.0);

        let decision = policy.step(0.8);
        assert!(decision.streak_extended);
        assert_eq!(decision.outcome, Outcome::NewBest);
        assert_eq!(policy.stale_count(), 0);
    }

    #[test]
    fn test_event_order_on_stop() {
        let mut policy = recording(2, 0.0);
        policy.evaluate(1.0);
        policy.evaluate(1.0);
        assert!(policy.evaluate(1.0));

        assert_eq!(
            policy.sink().as_slice(),
            &[
                PolicyEvent::StreakExtended { streak: 1 },
                PolicyEvent::NewMinimum { loss: 1.0 },
                PolicyEvent::StaleIncremented {
                    stale_count: 1,
                    patience: 2
                },
                PolicyEvent::StaleIncremented {
                    stale_count: 2,
                    patience: 2
                },
                PolicyEvent::StopTriggered {
                    stale_count: 2,
                    patience: 2
                },
            ]
        );
    }

    #[test]
    fn test_reset() {
        let mut policy = recording(3, 0.0);
        policy.evaluate(1.0);
        policy.evaluate(1.0);
        assert_eq!(policy.stale_count(), 1);

        policy.reset();
        assert_eq!(policy.state(), PolicyState::initial());
        assert_eq!(policy.sink().last(), Some(&PolicyEvent::Reset));
        assert_eq!(policy.patience(), 3);
    }

    #[test]
    fn test_config_and_sink_access() {
        let config = StoppingConfig::new(4, 0.05);
        let mut policy = recording(config.patience, config.min_delta);
        assert_eq!(policy.config(), &config);

        policy.evaluate(1.0);
        assert_eq!(policy.sink().len(), 2);

        policy.sink_mut().clear();
        policy.evaluate(1.0);

        let events = policy.into_sink();
        assert_eq!(
            events,
            vec![PolicyEvent::StaleIncremented {
                stale_count: 1,
                patience: 4
            }]
        );
    }

    #[test]
    fn test_try_new_validates() {
        assert!(StoppingPolicy::try_new(StoppingConfig::new(5, -1.0)).is_err());
        assert!(StoppingPolicy::try_new(StoppingConfig::new(5, 0.01)).is_ok());
    }
}
