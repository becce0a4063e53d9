//! Day/night phase orchestration.
//!
//! A [`MatchController`] owns the match context (ruleset, catalog, flavor
//! deck) and the seeded RNG bundle; a [`MatchState`] owns the roster. Each
//! `advance_phase` call resolves exactly one phase: upkeep (status ticks and
//! zone damage), the shuffled turn loop, and the terminal check.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actor::{Actor, ActorId};
use crate::battle::BattleReport;
use crate::events::{EventCategory, EventOutcome};
use crate::flavor::{FlavorDeck, FlavorHistory};
use crate::item::ItemCatalog;
use crate::rng::{PhaseStreams, RandomSource, RngBundle, SharedStream};
use crate::ruleset::{Ruleset, RulesetError};

mod session;
mod steps;

pub use session::MatchSession;

use steps::{TurnStep, UpkeepStep};

/// Hard invariant violations raised by the orchestrator and battle resolver.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("actor `{id}` cannot battle itself")]
    SelfBattle { id: ActorId },
    #[error("phase invoked with no living actors and no casualties to report")]
    EmptyRoster,
    #[error("duplicate actor id `{0}` in roster")]
    DuplicateActor(ActorId),
    #[error("match has already finished")]
    MatchFinished,
    #[error(transparent)]
    Ruleset(#[from] RulesetError),
}

/// Half of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Morning,
    Night,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Morning => write!(f, "morning"),
            Self::Night => write!(f, "night"),
        }
    }
}

/// Lifecycle of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchStatus {
    NotStarted,
    InProgress,
    Finished { winner: Option<ActorId> },
}

/// Why an actor left the alive roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum CasualtyCause {
    /// Entered the phase already at zero HP.
    Wounds,
    StatusEffects,
    Zone,
    Battle { by: ActorId },
    Event { category: EventCategory },
}

/// An eliminated actor, frozen at the moment of elimination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Casualty {
    pub actor: Actor,
    pub day: u32,
    pub phase: Phase,
    pub cause: CasualtyCause,
}

/// Solo event applied to one actor during the turn loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoloEvent {
    pub actor_id: ActorId,
    pub outcome: EventOutcome,
}

/// Everything that happened during one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub day: u32,
    pub phase: Phase,
    pub lines: Vec<String>,
    pub battles: Vec<BattleReport>,
    pub events: Vec<SoloEvent>,
    /// Ids eliminated this phase, in elimination order.
    pub casualties: Vec<ActorId>,
    pub status: MatchStatus,
}

impl PhaseOutcome {
    const fn new(day: u32, phase: Phase) -> Self {
        Self {
            day,
            phase,
            lines: Vec::new(),
            battles: Vec::new(),
            events: Vec::new(),
            casualties: Vec::new(),
            status: MatchStatus::InProgress,
        }
    }

    pub(crate) fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.status, MatchStatus::Finished { .. })
    }
}

/// Mutable match state owned by the caller between phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchState {
    pub day: u32,
    pub phase: Phase,
    pub status: MatchStatus,
    pub alive: Vec<Actor>,
    pub casualties: Vec<Casualty>,
    /// Kill counts for every actor in the starting roster.
    pub kills: BTreeMap<ActorId, u32>,
    pub transcript: Vec<String>,
    pub phases_played: u32,
    #[serde(default)]
    pub flavor_history: FlavorHistory,
}

impl MatchState {
    /// Fresh state before the first phase.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::EmptyRoster`] for an empty roster and
    /// [`MatchError::DuplicateActor`] when two actors share an id.
    pub fn new(roster: Vec<Actor>) -> Result<Self, MatchError> {
        if roster.is_empty() {
            return Err(MatchError::EmptyRoster);
        }
        let mut kills = BTreeMap::new();
        for actor in &roster {
            if kills.insert(actor.id.clone(), 0).is_some() {
                return Err(MatchError::DuplicateActor(actor.id.clone()));
            }
        }
        Ok(Self {
            day: 0,
            phase: Phase::Night,
            status: MatchStatus::NotStarted,
            alive: roster,
            casualties: Vec::new(),
            kills,
            transcript: Vec::new(),
            phases_played: 0,
            flavor_history: FlavorHistory::default(),
        })
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.status, MatchStatus::Finished { .. })
    }

    #[must_use]
    pub fn winner(&self) -> Option<&str> {
        match &self.status {
            MatchStatus::Finished { winner } => winner.as_deref(),
            _ => None,
        }
    }

    /// Look up an actor among the living and the eliminated.
    #[must_use]
    pub fn find_actor(&self, id: &str) -> Option<&Actor> {
        self.alive
            .iter()
            .find(|actor| actor.id == id)
            .or_else(|| {
                self.casualties
                    .iter()
                    .map(|casualty| &casualty.actor)
                    .find(|actor| actor.id == id)
            })
    }

    fn advance_clock(&mut self) {
        if self.status == MatchStatus::NotStarted {
            self.day = 1;
            self.phase = Phase::Morning;
            self.status = MatchStatus::InProgress;
            return;
        }
        match self.phase {
            Phase::Morning => self.phase = Phase::Night,
            Phase::Night => {
                self.day = self.day.saturating_add(1);
                self.phase = Phase::Morning;
            }
        }
    }

    /// Move every actor at or below zero HP into the casualty list.
    pub(crate) fn sweep_casualties(
        &mut self,
        mut cause_for: impl FnMut(&Actor) -> CasualtyCause,
        outcome: &mut PhaseOutcome,
    ) {
        if self.alive.iter().all(Actor::is_alive) {
            return;
        }
        let roster = std::mem::take(&mut self.alive);
        for actor in roster {
            if actor.is_alive() {
                self.alive.push(actor);
                continue;
            }
            let cause = cause_for(&actor);
            if let Some(line) = elimination_line(&actor, &cause) {
                outcome.line(line);
            }
            log::debug!(
                "casualty day {} {}: {} ({:?})",
                self.day,
                self.phase,
                actor.id,
                cause
            );
            outcome.casualties.push(actor.id.clone());
            self.casualties.push(Casualty {
                actor,
                day: self.day,
                phase: self.phase,
                cause,
            });
        }
    }

    fn finish_if_decided(&mut self, outcome: &mut PhaseOutcome) {
        if self.alive.len() > 1 {
            return;
        }
        let winner = self.alive.first().map(|actor| actor.id.clone());
        match self.alive.first() {
            Some(actor) => outcome.line(format!("{} is the last one standing!", actor.name)),
            None => outcome.line("No one survived the match."),
        }
        log::debug!("match finished on day {}: winner {winner:?}", self.day);
        self.status = MatchStatus::Finished { winner };
    }
}

fn elimination_line(actor: &Actor, cause: &CasualtyCause) -> Option<String> {
    let line = match cause {
        CasualtyCause::Battle { .. } => return None,
        CasualtyCause::Wounds | CasualtyCause::StatusEffects => {
            format!("{} succumbs to their wounds.", actor.name)
        }
        CasualtyCause::Zone => format!("{} could not escape the restricted zone.", actor.name),
        CasualtyCause::Event { .. } => format!("{} did not survive the ordeal.", actor.name),
    };
    Some(line)
}

/// Read-only inputs shared by every phase of a match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchContext {
    pub ruleset: Ruleset,
    pub catalog: ItemCatalog,
    pub flavor: FlavorDeck,
}

impl MatchContext {
    #[must_use]
    pub const fn new(ruleset: Ruleset, catalog: ItemCatalog, flavor: FlavorDeck) -> Self {
        Self {
            ruleset,
            catalog,
            flavor,
        }
    }
}

/// Drives a [`MatchState`] one phase at a time.
#[derive(Debug, Clone)]
pub struct MatchController {
    context: MatchContext,
    rng: RngBundle,
}

impl MatchController {
    /// Controller with seeded, reproducible RNG streams.
    ///
    /// # Errors
    ///
    /// Returns an error if the ruleset fails validation.
    pub fn new(context: MatchContext, seed: u64) -> Result<Self, MatchError> {
        context.ruleset.validate()?;
        Ok(Self {
            context,
            rng: RngBundle::from_user_seed(seed),
        })
    }

    #[must_use]
    pub const fn context(&self) -> &MatchContext {
        &self.context
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Resolve one phase using the controller's RNG streams.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MatchFinished`] once the match is over and
    /// [`MatchError::EmptyRoster`] when there is no one left to simulate.
    pub fn advance_phase(&mut self, state: &mut MatchState) -> Result<PhaseOutcome, MatchError> {
        run_phase(&self.context, state, &mut self.rng)
    }

    /// Resolve one phase with every draw routed through `rng`.
    ///
    /// # Errors
    ///
    /// Same as [`MatchController::advance_phase`].
    pub fn advance_phase_with(
        &mut self,
        state: &mut MatchState,
        rng: &mut dyn RandomSource,
    ) -> Result<PhaseOutcome, MatchError> {
        run_phase(&self.context, state, &mut SharedStream(rng))
    }
}

fn run_phase(
    context: &MatchContext,
    state: &mut MatchState,
    streams: &mut dyn PhaseStreams,
) -> Result<PhaseOutcome, MatchError> {
    if state.is_finished() {
        return Err(MatchError::MatchFinished);
    }
    if state.alive.is_empty() {
        return Err(MatchError::EmptyRoster);
    }

    state.advance_clock();
    let mut outcome = PhaseOutcome::new(state.day, state.phase);
    outcome.line(format!("Day {}, {}", state.day, state.phase));
    log::debug!(
        "advancing to day {} {} with {} alive",
        state.day,
        state.phase,
        state.alive.len()
    );

    UpkeepStep::new(state, &context.ruleset).run(&mut outcome);
    TurnStep::new(state, context, streams).run(&mut outcome)?;

    state.finish_if_decided(&mut outcome);
    state.phases_played = state.phases_played.saturating_add(1);
    state.transcript.extend(outcome.lines.iter().cloned());
    outcome.status = state.status.clone();
    Ok(outcome)
}
