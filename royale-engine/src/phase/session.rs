use crate::actor::Actor;
use crate::constants::DEFAULT_PHASE_CAP;
use crate::phase::{MatchContext, MatchController, MatchError, MatchState, PhaseOutcome};
use crate::result::MatchReport;
use crate::rng::RandomSource;

/// High-level session wrapper binding a match controller to a mutable match state.
#[derive(Debug, Clone)]
pub struct MatchSession {
    controller: MatchController,
    state: MatchState,
}

impl MatchSession {
    /// Construct a fresh session from context, roster and seed.
    ///
    /// # Errors
    ///
    /// Returns an error when the ruleset is invalid or the roster is empty
    /// or contains duplicate ids.
    pub fn new(context: MatchContext, roster: Vec<Actor>, seed: u64) -> Result<Self, MatchError> {
        let controller = MatchController::new(context, seed)?;
        let state = MatchState::new(roster)?;
        Ok(Self { controller, state })
    }

    /// Advance the simulation by one phase.
    ///
    /// # Errors
    ///
    /// See [`MatchController::advance_phase`].
    pub fn advance_phase(&mut self) -> Result<PhaseOutcome, MatchError> {
        self.controller.advance_phase(&mut self.state)
    }

    /// Advance one phase with every draw taken from `rng`.
    ///
    /// # Errors
    ///
    /// See [`MatchController::advance_phase`].
    pub fn advance_phase_with(
        &mut self,
        rng: &mut dyn RandomSource,
    ) -> Result<PhaseOutcome, MatchError> {
        self.controller.advance_phase_with(&mut self.state, rng)
    }

    /// Advance until the match finishes or `max_phases` phases have been played.
    ///
    /// A cap of zero falls back to the engine default.
    ///
    /// # Errors
    ///
    /// Propagates orchestrator errors.
    pub fn run_to_end(&mut self, max_phases: u32) -> Result<MatchReport, MatchError> {
        let cap = if max_phases == 0 {
            DEFAULT_PHASE_CAP
        } else {
            max_phases
        };
        while !self.state.is_finished() && self.state.phases_played < cap {
            if self.advance_phase()?.is_terminal() {
                break;
            }
        }
        if self.state.is_finished() {
            log::debug!(
                "match finished after {} phases using {} rng draws",
                self.state.phases_played,
                self.controller.rng.total_draws()
            );
        } else {
            log::warn!(
                "match stopped at phase cap {cap} with {} actors alive",
                self.state.alive.len()
            );
        }
        Ok(self.report())
    }

    /// Summary of the match so far.
    #[must_use]
    pub fn report(&self) -> MatchReport {
        MatchReport::from_state(
            &self.state,
            self.controller.seed(),
            &self.controller.context().ruleset.id,
        )
    }

    /// Borrow the underlying immutable match state.
    #[must_use]
    pub const fn state(&self) -> &MatchState {
        &self.state
    }

}
