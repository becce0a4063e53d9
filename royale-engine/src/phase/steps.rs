use std::collections::HashMap;

use super::{CasualtyCause, MatchContext, MatchError, MatchState, PhaseOutcome, SoloEvent};
use crate::actor::ActorId;
use crate::battle::{self, BattleOutcome};
use crate::constants::AUTO_HEAL_HP_RATIO;
use crate::effects::tick_effects;
use crate::events;
use crate::flavor::FlavorKind;
use crate::rng::{PhaseStreams, RandomSource};
use crate::ruleset::Ruleset;

/// Status ticks and zone damage, applied before anyone acts.
pub(super) struct UpkeepStep<'a> {
    state: &'a mut MatchState,
    ruleset: &'a Ruleset,
}

impl<'a> UpkeepStep<'a> {
    pub(super) const fn new(state: &'a mut MatchState, ruleset: &'a Ruleset) -> Self {
        Self { state, ruleset }
    }

    pub(super) fn run(self, outcome: &mut PhaseOutcome) {
        self.state
            .sweep_casualties(|_| CasualtyCause::Wounds, outcome);

        for actor in &mut self.state.alive {
            if actor.effects.is_empty() {
                continue;
            }
            let report = tick_effects(actor);
            if report.damage > 0 {
                outcome.line(format!(
                    "{} suffers {} damage from lingering conditions.",
                    actor.name, report.damage
                ));
            }
            for name in &report.expired {
                outcome.line(format!("{} is no longer affected by {name}.", actor.name));
            }
        }
        self.state
            .sweep_casualties(|_| CasualtyCause::StatusEffects, outcome);

        let zone = self.ruleset.phase.zone_damage(self.state.day);
        if zone > 0 && !self.state.alive.is_empty() {
            outcome.line(format!(
                "The restricted zone closes in, dealing {zone} damage to everyone."
            ));
            for actor in &mut self.state.alive {
                actor.take_damage(zone);
            }
            self.state.sweep_casualties(|_| CasualtyCause::Zone, outcome);
        }
    }
}

/// Shuffled turn loop: battles, encounters and solo events.
pub(super) struct TurnStep<'a> {
    state: &'a mut MatchState,
    context: &'a MatchContext,
    streams: &'a mut dyn PhaseStreams,
}

impl<'a> TurnStep<'a> {
    pub(super) fn new(
        state: &'a mut MatchState,
        context: &'a MatchContext,
        streams: &'a mut dyn PhaseStreams,
    ) -> Self {
        Self {
            state,
            context,
            streams,
        }
    }

    pub(super) fn run(mut self, outcome: &mut PhaseOutcome) -> Result<(), MatchError> {
        let day = self.state.day;
        let battle_p = self.context.ruleset.phase.battle_probability(day);
        let event_p = self.context.ruleset.phase.event_probability(day);

        let mut order: Vec<usize> = (0..self.state.alive.len()).collect();
        shuffle(&mut order, self.streams.turn());
        let mut taken = vec![false; order.len()];
        let mut causes: HashMap<ActorId, CasualtyCause> = HashMap::new();

        for pos in 0..order.len() {
            let idx = order[pos];
            if taken[idx] {
                continue;
            }
            taken[idx] = true;
            if !self.state.alive[idx].is_alive() {
                continue;
            }
            self.auto_heal(idx, outcome);

            let others: Vec<usize> = order[pos + 1..]
                .iter()
                .copied()
                .filter(|other| !taken[*other])
                .collect();
            if others.is_empty() {
                self.solo_event(idx, &mut causes, outcome);
                continue;
            }

            if self.streams.turn().chance(battle_p) {
                let opponent = pick(&others, self.streams.turn());
                taken[opponent] = true;
                self.battle(idx, opponent, &mut causes, outcome)?;
            } else if self.streams.turn().chance(event_p) {
                let partner = pick(&others, self.streams.turn());
                taken[partner] = true;
                self.encounter(idx, partner, outcome);
            } else {
                self.solo_event(idx, &mut causes, outcome);
            }
        }

        self.state.sweep_casualties(
            |actor| {
                causes
                    .remove(&actor.id)
                    .unwrap_or(CasualtyCause::Wounds)
            },
            outcome,
        );
        Ok(())
    }

    fn auto_heal(&mut self, idx: usize, outcome: &mut PhaseOutcome) {
        let actor = &mut self.state.alive[idx];
        if actor.hp_ratio() >= AUTO_HEAL_HP_RATIO {
            return;
        }
        if let Some((item, restored)) = actor.consume_healing_item() {
            outcome.line(format!(
                "{} uses {} and recovers {restored} HP.",
                actor.name, item.name
            ));
        }
    }

    fn battle(
        &mut self,
        first: usize,
        second: usize,
        causes: &mut HashMap<ActorId, CasualtyCause>,
        outcome: &mut PhaseOutcome,
    ) -> Result<(), MatchError> {
        let report = battle::resolve(
            &self.state.alive[first],
            &self.state.alive[second],
            self.state.day,
            &self.context.ruleset,
            self.streams.battle(),
        )?;
        outcome.lines.extend(report.lines().map(str::to_string));

        if let BattleOutcome::Decisive { winner, loser, .. } = &report.outcome {
            let (winner_idx, loser_idx) = if *winner == self.state.alive[first].id {
                (first, second)
            } else {
                (second, first)
            };
            self.state.alive[loser_idx].hp = 0;
            if let Some(count) = self.state.kills.get_mut(winner) {
                *count = count.saturating_add(1);
            }
            causes.insert(
                loser.clone(),
                CasualtyCause::Battle { by: winner.clone() },
            );
            let line = self.context.flavor.line(
                FlavorKind::Death,
                &self.state.alive[winner_idx].name,
                &self.state.alive[loser_idx].name,
                &mut self.state.flavor_history,
                self.streams.flavor(),
            );
            outcome.line(line);
            log::debug!("{winner} eliminated {loser} on day {}", self.state.day);
        }
        outcome.battles.push(report);
        Ok(())
    }

    fn encounter(&mut self, first: usize, second: usize, outcome: &mut PhaseOutcome) {
        let line = self.context.flavor.line(
            FlavorKind::Normal,
            &self.state.alive[first].name,
            &self.state.alive[second].name,
            &mut self.state.flavor_history,
            self.streams.flavor(),
        );
        outcome.line(line);
    }

    fn solo_event(
        &mut self,
        idx: usize,
        causes: &mut HashMap<ActorId, CasualtyCause>,
        outcome: &mut PhaseOutcome,
    ) {
        let event = events::generate(
            &self.state.alive[idx],
            self.state.day,
            &self.context.ruleset,
            self.state.phase,
            &self.context.catalog,
            self.streams.event(),
        );
        let actor = &mut self.state.alive[idx];
        events::apply_outcome(actor, &event);
        if let Some(log) = &event.log {
            outcome.line(log.clone());
        }
        if !actor.is_alive() {
            causes.insert(
                actor.id.clone(),
                CasualtyCause::Event {
                    category: event.category,
                },
            );
        }
        outcome.events.push(SoloEvent {
            actor_id: actor.id.clone(),
            outcome: event,
        });
    }
}

/// Fisher-Yates shuffle driven by `rng`.
fn shuffle(order: &mut [usize], rng: &mut dyn RandomSource) {
    for i in (1..order.len()).rev() {
        let j = rng.pick_index(i + 1).unwrap_or(i);
        order.swap(i, j);
    }
}

fn pick(candidates: &[usize], rng: &mut dyn RandomSource) -> usize {
    let idx = rng.pick_index(candidates.len()).unwrap_or(0);
    candidates[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRng;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut order: Vec<usize> = (0..6).collect();
        shuffle(&mut order, &mut ScriptedRng::new(vec![0.9, 0.1, 0.5, 0.3, 0.7]));
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_with_zero_draws_rotates_deterministically() {
        let mut order: Vec<usize> = (0..3).collect();
        shuffle(&mut order, &mut ScriptedRng::constant(0.0));
        // i=2 swaps with 0, then i=1 swaps with 0
        assert_eq!(order, vec![1, 2, 0]);
    }
}
