//! Royale Engine
//!
//! Platform-agnostic battle and event resolution for a day/night
//! battle-royale simulator. The crate resolves combat, minor events,
//! status effects and equipment, and drives a roster to a single winner
//! one phase at a time. It performs no I/O beyond parsing the JSON handed
//! to it.

pub mod actor;
pub mod battle;
pub mod constants;
pub mod data;
pub mod effects;
pub mod equipment;
pub mod events;
pub mod flavor;
pub mod item;
pub mod numbers;
pub mod phase;
pub mod result;
pub mod rng;
pub mod ruleset;
pub mod skills;

// Re-export commonly used types
pub use actor::{Actor, ActorId, Equipped, Stat, StatBlock};
pub use battle::{BattleOutcome, BattleReport, ScoreBreakdown, draw_threshold, resolve};
pub use data::{DataError, parse_catalog, parse_flavor, parse_roster, parse_ruleset};
pub use effects::{
    EffectKind, StatusEffect, TickReport, apply_effect, effective_stats, tick_effects,
};
pub use equipment::{EquipmentDeltas, EquipmentTotals, equipment_deltas, equipment_stat_totals};
pub use events::{
    EventCategory, EventDecisionTrace, EventOutcome, ItemDrop, apply_outcome, generate,
};
pub use flavor::{FlavorDeck, FlavorEvent, FlavorHistory, FlavorKind};
pub use item::{EquipSlot, ItemCatalog, ItemDef, ItemKind, ItemStack, ItemStats};
pub use phase::{
    Casualty, CasualtyCause, MatchContext, MatchController, MatchError, MatchSession, MatchState,
    MatchStatus, Phase, PhaseOutcome, SoloEvent,
};
pub use result::{CasualtySummary, MatchReport};
pub use rng::{CountingRng, PhaseStreams, RandomSource, RngBundle, ScriptedRng, SharedStream};
pub use ruleset::{Ruleset, RulesetError};
pub use skills::SkillKind;

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the item catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<ItemCatalog, Self::Error>;

    /// Load the roster, resolving item references against `catalog`.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster cannot be loaded or parsed.
    fn load_roster(&self, catalog: &ItemCatalog) -> Result<Vec<Actor>, Self::Error>;

    /// Load flavor templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the templates cannot be loaded.
    fn load_flavor(&self) -> Result<FlavorDeck, Self::Error>;

    /// Load the match ruleset.
    ///
    /// # Errors
    ///
    /// Returns an error if the ruleset cannot be loaded or fails validation.
    fn load_ruleset(&self) -> Result<Ruleset, Self::Error>;
}

/// Receives terminal match reports.
pub trait MatchSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Accept a finished (or capped) match.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be recorded.
    fn submit(&self, report: &MatchReport) -> Result<(), Self::Error>;
}

/// Loader backed by the JSON fixtures compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedAssets;

impl EmbeddedAssets {
    pub const CATALOG: &'static str = include_str!("../assets/catalog.json");
    pub const ROSTER: &'static str = include_str!("../assets/roster.json");
    pub const FLAVOR: &'static str = include_str!("../assets/flavor.json");
    pub const RULESET: &'static str = include_str!("../assets/ruleset.json");
}

impl DataLoader for EmbeddedAssets {
    type Error = DataError;

    fn load_catalog(&self) -> Result<ItemCatalog, Self::Error> {
        parse_catalog(Self::CATALOG)
    }

    fn load_roster(&self, catalog: &ItemCatalog) -> Result<Vec<Actor>, Self::Error> {
        parse_roster(Self::ROSTER, catalog)
    }

    fn load_flavor(&self) -> Result<FlavorDeck, Self::Error> {
        parse_flavor(Self::FLAVOR)
    }

    fn load_ruleset(&self) -> Result<Ruleset, Self::Error> {
        parse_ruleset(Self::RULESET)
    }
}

/// Main engine for creating and reporting matches
pub struct MatchEngine<L, S>
where
    L: DataLoader,
    S: MatchSink,
{
    data_loader: L,
    sink: S,
}

impl<L, S> MatchEngine<L, S>
where
    L: DataLoader,
    S: MatchSink,
{
    /// Create a new engine with the provided data loader and sink
    pub const fn new(data_loader: L, sink: S) -> Self {
        Self { data_loader, sink }
    }

    /// Borrow the report sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Load every input and build a match context plus roster.
    ///
    /// # Errors
    ///
    /// Returns an error if any input fails to load.
    pub fn load_inputs(&self) -> Result<(MatchContext, Vec<Actor>), L::Error> {
        let catalog = self.data_loader.load_catalog()?;
        let roster = self.data_loader.load_roster(&catalog)?;
        let flavor = self.data_loader.load_flavor()?;
        let ruleset = self.data_loader.load_ruleset()?;
        Ok((MatchContext::new(ruleset, catalog, flavor), roster))
    }

    /// Construct a new match session encompassing controller and state.
    ///
    /// # Errors
    ///
    /// Returns an error if inputs cannot be loaded or the roster is invalid.
    pub fn create_session(&self, seed: u64) -> Result<MatchSession, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let (context, roster) = self.load_inputs().map_err(Into::into)?;
        Ok(MatchSession::new(context, roster, seed)?)
    }

    /// Run a seeded match to completion and submit its report to the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the match cannot be created or run, or the sink rejects the report.
    pub fn run_match(&self, seed: u64, max_phases: u32) -> Result<MatchReport, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let mut session = self.create_session(seed)?;
        let report = session.run_to_end(max_phases)?;
        self.sink.submit(&report).map_err(Into::into)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<ItemCatalog, Self::Error> {
            Ok(ItemCatalog::empty())
        }

        fn load_roster(&self, _catalog: &ItemCatalog) -> Result<Vec<Actor>, Self::Error> {
            Ok(vec![
                Actor::new("a", "Ana", StatBlock::uniform(12), 100),
                Actor::new("b", "Bo", StatBlock::uniform(9), 100),
                Actor::new("c", "Cy", StatBlock::uniform(6), 100),
            ])
        }

        fn load_flavor(&self) -> Result<FlavorDeck, Self::Error> {
            Ok(FlavorDeck::default())
        }

        fn load_ruleset(&self) -> Result<Ruleset, Self::Error> {
            Ok(Ruleset::default())
        }
    }

    #[derive(Clone, Default)]
    struct MemorySink {
        reports: Rc<RefCell<Vec<MatchReport>>>,
    }

    impl MatchSink for MemorySink {
        type Error = Infallible;

        fn submit(&self, report: &MatchReport) -> Result<(), Self::Error> {
            self.reports.borrow_mut().push(report.clone());
            Ok(())
        }
    }

    #[test]
    fn engine_runs_and_submits_report() {
        let sink = MemorySink::default();
        let engine = MatchEngine::new(FixtureLoader, sink.clone());
        let report = engine.run_match(0xABCD, 0).unwrap();
        assert!(report.finished);
        assert_eq!(report.seed, 0xABCD);

        let stored = sink.reports.borrow();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], report);
    }

    #[test]
    fn embedded_assets_load_cleanly() {
        let catalog = EmbeddedAssets.load_catalog().unwrap();
        let roster = EmbeddedAssets.load_roster(&catalog).unwrap();
        assert_eq!(roster.len(), 8);
        assert!(catalog.find("katana").is_some());
        assert!(EmbeddedAssets.load_flavor().unwrap().count(FlavorKind::Death) > 0);
        assert_eq!(EmbeddedAssets.load_ruleset().unwrap().id, "standard");
    }

    #[test]
    fn create_session_starts_before_day_one() {
        let engine = MatchEngine::new(EmbeddedAssets, MemorySink::default());
        let session = engine.create_session(1).unwrap();
        assert_eq!(session.state().status, MatchStatus::NotStarted);
        assert_eq!(session.state().alive.len(), 8);
    }
}
