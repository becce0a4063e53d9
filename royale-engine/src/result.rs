//! Terminal match summary handed to a [`crate::MatchSink`].
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::phase::{CasualtyCause, MatchState, Phase};

/// One eliminated actor as reported to sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasualtySummary {
    pub id: ActorId,
    pub name: String,
    pub day: u32,
    pub phase: Phase,
    pub cause: CasualtyCause,
}

/// Summary of a match: winner, kills, casualties and the full transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub seed: u64,
    pub ruleset_id: String,
    pub finished: bool,
    pub winner: Option<ActorId>,
    pub winner_name: Option<String>,
    pub kills: BTreeMap<ActorId, u32>,
    pub casualties: Vec<CasualtySummary>,
    pub days: u32,
    pub phases: u32,
    pub transcript: Vec<String>,
}

impl MatchReport {
    #[must_use]
    pub fn from_state(state: &MatchState, seed: u64, ruleset_id: &str) -> Self {
        let winner = state.winner().map(str::to_string);
        let winner_name = winner
            .as_deref()
            .and_then(|id| state.find_actor(id))
            .map(|actor| actor.name.clone());
        Self {
            seed,
            ruleset_id: ruleset_id.to_string(),
            finished: state.is_finished(),
            winner,
            winner_name,
            kills: state.kills.clone(),
            casualties: state
                .casualties
                .iter()
                .map(|casualty| CasualtySummary {
                    id: casualty.actor.id.clone(),
                    name: casualty.actor.name.clone(),
                    day: casualty.day,
                    phase: casualty.phase,
                    cause: casualty.cause.clone(),
                })
                .collect(),
            days: state.day,
            phases: state.phases_played,
            transcript: state.transcript.clone(),
        }
    }

    #[must_use]
    pub fn total_kills(&self) -> u32 {
        self.kills.values().copied().sum()
    }

    /// Final placement (1 = winner) for `id`, counting back from the last casualty.
    ///
    /// Returns `None` for unknown ids and for actors still alive in an unfinished match.
    #[must_use]
    pub fn placement(&self, id: &str) -> Option<usize> {
        if self.winner.as_deref() == Some(id) {
            return Some(1);
        }
        let position = self.casualties.iter().position(|casualty| casualty.id == id)?;
        let offset = usize::from(self.winner.is_some());
        Some(self.casualties.len() - position + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Actor, StatBlock};
    use crate::phase::{Casualty, MatchStatus};

    fn finished_state() -> MatchState {
        let mut state = MatchState::new(vec![
            Actor::new("a", "Ana", StatBlock::uniform(5), 100),
            Actor::new("b", "Bo", StatBlock::uniform(5), 100),
            Actor::new("c", "Cy", StatBlock::uniform(5), 100),
        ])
        .unwrap();
        let mut losers: Vec<Actor> = state.alive.drain(1..).collect();
        let c = losers.pop().unwrap();
        let b = losers.pop().unwrap();
        state.casualties.push(Casualty {
            actor: c,
            day: 1,
            phase: Phase::Morning,
            cause: CasualtyCause::Zone,
        });
        state.casualties.push(Casualty {
            actor: b,
            day: 2,
            phase: Phase::Night,
            cause: CasualtyCause::Battle {
                by: String::from("a"),
            },
        });
        state.kills.insert(String::from("a"), 1);
        state.status = MatchStatus::Finished {
            winner: Some(String::from("a")),
        };
        state.day = 2;
        state
    }

    #[test]
    fn report_captures_winner_and_placements() {
        let report = MatchReport::from_state(&finished_state(), 7, "standard");
        assert!(report.finished);
        assert_eq!(report.winner.as_deref(), Some("a"));
        assert_eq!(report.winner_name.as_deref(), Some("Ana"));
        assert_eq!(report.total_kills(), 1);
        assert_eq!(report.placement("a"), Some(1));
        assert_eq!(report.placement("b"), Some(2));
        assert_eq!(report.placement("c"), Some(3));
        assert_eq!(report.placement("zzz"), None);
    }

    #[test]
    fn report_serializes_causes_with_tags() {
        let report = MatchReport::from_state(&finished_state(), 7, "standard");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["casualties"][1]["cause"]["cause"], "battle");
        assert_eq!(json["casualties"][1]["cause"]["by"], "a");
    }
}
