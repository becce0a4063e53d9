//! Minor solo events: weighted category selection and materialization.
use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::constants::{
    CRITICAL_HP_MEDICAL_BOOST, CRITICAL_HP_RATIO, CRITICAL_HP_REST_BOOST, FIGHT_BASE_DAY,
    FIGHT_BASE_NIGHT, FIGHT_CREDITS_MAX, FIGHT_CREDITS_MIN, FIGHT_DAMAGE_MAX, FIGHT_DAMAGE_MIN,
    FIGHT_DAY_DIVISOR, FIGHT_POWER_DIVISOR, FIGHT_ROLL_MAX, FOOD_POISONING_CHANCE,
    LOW_HP_MEDICAL_BOOST, LOW_HP_RATIO, LOW_HP_REST_BOOST, MEDICAL_FALLBACK_BASE,
    MEDICAL_FALLBACK_ROLL_MAX, MISHAP_BASE_DAY, MISHAP_BASE_NIGHT, MISHAP_BLEED_CHANCE,
    MISHAP_DAMAGE_MAX, MISHAP_DAMAGE_MIN, MISHAP_DAY_DIVISOR, MISHAP_POWER_DIVISOR,
    MISHAP_ROLL_MAX, NIGHT_FIGHT_BOOST, NIGHT_MISHAP_BOOST, REST_BASE_DAY, REST_BASE_NIGHT,
    REST_HEAL_MAX, REST_HEAL_MIN, REST_POWER_BONUS_CAP, REST_POWER_DIVISOR, REST_ROLL_MAX,
    REST_SUPPRESS_CHANCE, REST_SUPPRESS_HP_RATIO, RISK_DAY_CAP, RISK_PER_DAY,
    SCAVENGE_CREDITS_MAX, SCAVENGE_CREDITS_MIN,
};
use crate::effects::{StatusEffect, apply_effect, effective_stats};
use crate::item::{ItemCatalog, ItemDef};
use crate::numbers::{floor_f64_to_i32, u32_to_i32};
use crate::phase::Phase;
use crate::rng::RandomSource;
use crate::ruleset::Ruleset;

const POOL_ID: &str = "royale.minor_events";

/// Minor event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Nothing,
    Rest,
    Medical,
    Scavenge,
    Food,
    Mishap,
    MinorFight,
}

impl EventCategory {
    pub const ALL: [Self; 7] = [
        Self::Nothing,
        Self::Rest,
        Self::Medical,
        Self::Scavenge,
        Self::Food,
        Self::Mishap,
        Self::MinorFight,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Rest => "rest",
            Self::Medical => "medical",
            Self::Scavenge => "scavenge",
            Self::Food => "food",
            Self::Mishap => "mishap",
            Self::MinorFight => "minor_fight",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.key() == key)
    }

    /// Categories whose weight grows at night and with the day count.
    #[must_use]
    pub const fn is_risk(self) -> bool {
        matches!(self, Self::Mishap | Self::MinorFight)
    }

    const fn base_weight(self, ruleset: &Ruleset) -> f64 {
        let weights = &ruleset.events;
        match self {
            Self::Nothing => weights.nothing,
            Self::Rest => weights.rest,
            Self::Medical => weights.medical,
            Self::Scavenge => weights.scavenge,
            Self::Food => weights.food,
            Self::Mishap => weights.mishap,
            Self::MinorFight => weights.minor_fight,
        }
    }
}

/// Explainability telemetry for the weighted category pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDecisionTrace {
    pub pool_id: String,
    /// Draw scaled onto the summed final weights.
    pub roll: f64,
    pub candidates: Vec<WeightedCandidate>,
    pub chosen_id: String,
}

/// Candidate weight telemetry captured during selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCandidate {
    pub id: String,
    pub base_weight: f64,
    /// Multipliers applied in order.
    pub multipliers: Vec<WeightFactor>,
    pub final_weight: f64,
}

/// Single multiplicative weight factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightFactor {
    pub label: String,
    pub value: f64,
}

/// Item granted by an event. Always a clone of a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDrop {
    pub item: ItemDef,
    pub qty: u32,
}

/// State deltas produced by a minor event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOutcome {
    pub category: EventCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop: Option<ItemDrop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_credits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_effect: Option<StatusEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    pub silent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<EventDecisionTrace>,
}

impl EventOutcome {
    const fn new(category: EventCategory) -> Self {
        Self {
            category,
            damage: None,
            recovery: None,
            drop: None,
            earned_credits: None,
            new_effect: None,
            log: None,
            silent: false,
            trace: None,
        }
    }

    /// Outcome with no log and no state change.
    #[must_use]
    pub const fn silent(category: EventCategory) -> Self {
        let mut outcome = Self::new(category);
        outcome.silent = true;
        outcome
    }

    fn logged(category: EventCategory, log: String) -> Self {
        let mut outcome = Self::new(category);
        outcome.log = Some(log);
        outcome
    }
}

/// Weighted pool for the given actor and phase context.
#[must_use]
pub fn weighted_candidates(
    actor: &Actor,
    day: u32,
    ruleset: &Ruleset,
    phase: Phase,
) -> Vec<WeightedCandidate> {
    let hp_ratio = actor.hp_ratio();
    let risk_factor = RISK_PER_DAY.mul_add(f64::from(day.min(RISK_DAY_CAP)), 1.0);

    EventCategory::ALL
        .into_iter()
        .map(|category| {
            let mut multipliers = Vec::new();
            match category {
                EventCategory::Rest if hp_ratio < CRITICAL_HP_RATIO => {
                    multipliers.push(factor("critical_hp", CRITICAL_HP_REST_BOOST));
                }
                EventCategory::Rest if hp_ratio < LOW_HP_RATIO => {
                    multipliers.push(factor("low_hp", LOW_HP_REST_BOOST));
                }
                EventCategory::Medical if hp_ratio < CRITICAL_HP_RATIO => {
                    multipliers.push(factor("critical_hp", CRITICAL_HP_MEDICAL_BOOST));
                }
                EventCategory::Medical if hp_ratio < LOW_HP_RATIO => {
                    multipliers.push(factor("low_hp", LOW_HP_MEDICAL_BOOST));
                }
                EventCategory::Mishap if phase == Phase::Night => {
                    multipliers.push(factor("night", NIGHT_MISHAP_BOOST));
                }
                EventCategory::MinorFight if phase == Phase::Night => {
                    multipliers.push(factor("night", NIGHT_FIGHT_BOOST));
                }
                _ => {}
            }
            if category.is_risk() && day > 0 {
                multipliers.push(factor("day", risk_factor));
            }
            let base_weight = category.base_weight(ruleset);
            let final_weight = multipliers
                .iter()
                .fold(base_weight, |weight, multiplier| weight * multiplier.value);
            WeightedCandidate {
                id: category.key().to_string(),
                base_weight,
                multipliers,
                final_weight,
            }
        })
        .collect()
}

fn factor(label: &str, value: f64) -> WeightFactor {
    WeightFactor {
        label: label.to_string(),
        value,
    }
}

/// Pick a category from the weighted pool, recording the decision.
pub fn pick_category(
    actor: &Actor,
    day: u32,
    ruleset: &Ruleset,
    phase: Phase,
    rng: &mut dyn RandomSource,
) -> (EventCategory, EventDecisionTrace) {
    let candidates = weighted_candidates(actor, day, ruleset, phase);
    let total: f64 = candidates
        .iter()
        .map(|candidate| candidate.final_weight.max(0.0))
        .sum();
    let roll = rng.next_f64() * total;

    let mut chosen = EventCategory::Nothing;
    let mut cumulative = 0.0;
    for (category, candidate) in EventCategory::ALL.into_iter().zip(&candidates) {
        let weight = candidate.final_weight.max(0.0);
        if weight <= 0.0 {
            continue;
        }
        chosen = category;
        cumulative += weight;
        if roll < cumulative {
            break;
        }
    }

    let trace = EventDecisionTrace {
        pool_id: POOL_ID.to_string(),
        roll,
        candidates,
        chosen_id: chosen.key().to_string(),
    };
    (chosen, trace)
}

/// Select and materialize a minor event for `actor`.
pub fn generate(
    actor: &Actor,
    day: u32,
    ruleset: &Ruleset,
    phase: Phase,
    catalog: &ItemCatalog,
    rng: &mut dyn RandomSource,
) -> EventOutcome {
    let (category, trace) = pick_category(actor, day, ruleset, phase, rng);
    log::trace!(
        "event pick for {} (day {day}, {phase:?}): {} at roll {:.2}",
        actor.id,
        trace.chosen_id,
        trace.roll
    );
    let mut outcome = materialize(category, actor, day, phase, catalog, rng);
    outcome.trace = Some(trace);
    outcome
}

/// Materialize a specific category without the weighted pick.
pub fn materialize(
    category: EventCategory,
    actor: &Actor,
    day: u32,
    phase: Phase,
    catalog: &ItemCatalog,
    rng: &mut dyn RandomSource,
) -> EventOutcome {
    let power = effective_stats(actor).power();
    match category {
        EventCategory::Nothing => EventOutcome::silent(category),
        EventCategory::Rest => rest(actor, phase, power, rng),
        EventCategory::Medical => medical(actor, catalog, rng),
        EventCategory::Scavenge => scavenge(actor, catalog, rng),
        EventCategory::Food => food(actor, catalog, rng),
        EventCategory::Mishap => mishap(actor, day, phase, power, rng),
        EventCategory::MinorFight => minor_fight(actor, day, phase, power, rng),
    }
}

fn rest(actor: &Actor, phase: Phase, power: f64, rng: &mut dyn RandomSource) -> EventOutcome {
    let category = EventCategory::Rest;
    if phase == Phase::Morning
        && actor.hp_ratio() >= REST_SUPPRESS_HP_RATIO
        && rng.chance(REST_SUPPRESS_CHANCE)
    {
        return EventOutcome::silent(category);
    }
    let base = if phase == Phase::Night {
        REST_BASE_NIGHT
    } else {
        REST_BASE_DAY
    };
    let power_bonus = floor_f64_to_i32(power / REST_POWER_DIVISOR).clamp(0, REST_POWER_BONUS_CAP);
    let heal = (base + rng.range_inclusive(0, REST_ROLL_MAX) + power_bonus)
        .clamp(REST_HEAL_MIN, REST_HEAL_MAX)
        .min(actor.missing_hp());
    let mut outcome = if heal > 0 {
        EventOutcome::logged(
            category,
            format!("{} takes a moment to rest and recovers {heal} HP.", actor.name),
        )
    } else {
        EventOutcome::logged(category, format!("{} rests in a quiet corner.", actor.name))
    };
    if heal > 0 {
        outcome.recovery = Some(heal);
    }
    outcome
}

fn pick_item<'a>(items: &[&'a ItemDef], rng: &mut dyn RandomSource) -> Option<&'a ItemDef> {
    rng.pick_index(items.len()).map(|idx| items[idx])
}

fn with_drop(mut outcome: EventOutcome, item: &ItemDef) -> EventOutcome {
    outcome.drop = Some(ItemDrop {
        item: item.clone(),
        qty: 1,
    });
    outcome
}

fn medical(actor: &Actor, catalog: &ItemCatalog, rng: &mut dyn RandomSource) -> EventOutcome {
    let category = EventCategory::Medical;
    if let Some(item) = pick_item(&catalog.medical(), rng) {
        let log = format!("{} finds a {} in an abandoned clinic.", actor.name, item.name);
        return with_drop(EventOutcome::logged(category, log), item);
    }
    let heal = (MEDICAL_FALLBACK_BASE + rng.range_inclusive(0, MEDICAL_FALLBACK_ROLL_MAX))
        .min(actor.missing_hp());
    if heal <= 0 {
        let log = format!("{} searches a ransacked clinic but has nothing to treat.", actor.name);
        return EventOutcome::logged(category, log);
    }
    let mut outcome = EventOutcome::logged(
        category,
        format!("{} patches up a few scrapes and recovers {heal} HP.", actor.name),
    );
    outcome.recovery = Some(heal);
    outcome
}

fn scavenge(actor: &Actor, catalog: &ItemCatalog, rng: &mut dyn RandomSource) -> EventOutcome {
    let category = EventCategory::Scavenge;
    if let Some(item) = pick_item(&catalog.scavenge_materials(), rng) {
        let log = format!("{} scavenges a {} from the rubble.", actor.name, item.name);
        return with_drop(EventOutcome::logged(category, log), item);
    }
    let credits = rng.range_inclusive(SCAVENGE_CREDITS_MIN, SCAVENGE_CREDITS_MAX);
    let mut outcome = EventOutcome::logged(
        category,
        format!("{} digs up {credits} credits while scavenging.", actor.name),
    );
    outcome.earned_credits = u32::try_from(credits).ok();
    outcome
}

fn food(actor: &Actor, catalog: &ItemCatalog, rng: &mut dyn RandomSource) -> EventOutcome {
    let category = EventCategory::Food;
    let Some(item) = pick_item(&catalog.food(), rng) else {
        return EventOutcome::logged(
            category,
            format!("{} searches for something to eat but comes up empty.", actor.name),
        );
    };
    let log = format!("{} finds some {}.", actor.name, item.name);
    let mut outcome = with_drop(EventOutcome::logged(category, log), item);
    if rng.chance(FOOD_POISONING_CHANCE) {
        outcome.new_effect = Some(StatusEffect::food_poisoning());
        outcome.log = Some(format!(
            "{} finds some {}, but it was spoiled. Food poisoning!",
            actor.name, item.name
        ));
    }
    outcome
}

fn mishap(
    actor: &Actor,
    day: u32,
    phase: Phase,
    power: f64,
    rng: &mut dyn RandomSource,
) -> EventOutcome {
    let category = EventCategory::Mishap;
    let base = if phase == Phase::Night {
        MISHAP_BASE_NIGHT
    } else {
        MISHAP_BASE_DAY
    };
    let damage = base
        .saturating_add(u32_to_i32(day / MISHAP_DAY_DIVISOR))
        .saturating_add(rng.range_inclusive(0, MISHAP_ROLL_MAX))
        .saturating_sub(floor_f64_to_i32(power / MISHAP_POWER_DIVISOR))
        .clamp(MISHAP_DAMAGE_MIN, MISHAP_DAMAGE_MAX);
    let mut outcome = EventOutcome::logged(
        category,
        format!("{} stumbles over debris and takes {damage} damage.", actor.name),
    );
    outcome.damage = Some(damage);
    if phase == Phase::Night && rng.chance(MISHAP_BLEED_CHANCE) {
        outcome.new_effect = Some(StatusEffect::bleeding());
        outcome.log = Some(format!(
            "{} cuts themself on rusted metal in the dark, taking {damage} damage and bleeding.",
            actor.name
        ));
    }
    outcome
}

fn minor_fight(
    actor: &Actor,
    day: u32,
    phase: Phase,
    power: f64,
    rng: &mut dyn RandomSource,
) -> EventOutcome {
    let category = EventCategory::MinorFight;
    let base = if phase == Phase::Night {
        FIGHT_BASE_NIGHT
    } else {
        FIGHT_BASE_DAY
    };
    let damage = base
        .saturating_add(u32_to_i32(day / FIGHT_DAY_DIVISOR))
        .saturating_add(rng.range_inclusive(0, FIGHT_ROLL_MAX))
        .saturating_sub(floor_f64_to_i32(power / FIGHT_POWER_DIVISOR))
        .clamp(FIGHT_DAMAGE_MIN, FIGHT_DAMAGE_MAX);
    let credits = rng.range_inclusive(FIGHT_CREDITS_MIN, FIGHT_CREDITS_MAX);
    let mut outcome = EventOutcome::logged(
        category,
        format!(
            "{} fends off a scavenger, taking {damage} damage and grabbing {credits} credits.",
            actor.name
        ),
    );
    outcome.damage = Some(damage);
    outcome.earned_credits = u32::try_from(credits).ok();
    outcome
}

/// Fold an event outcome into the actor it was generated for.
pub fn apply_outcome(actor: &mut Actor, outcome: &EventOutcome) {
    if outcome.silent {
        return;
    }
    if let Some(damage) = outcome.damage {
        actor.take_damage(damage);
    }
    if let Some(recovery) = outcome.recovery {
        actor.heal(recovery);
    }
    if let Some(drop) = &outcome.drop {
        actor.add_item(drop.item.clone(), drop.qty);
    }
    if let Some(credits) = outcome.earned_credits {
        actor.credits = actor.credits.saturating_add(credits);
    }
    if let Some(effect) = &outcome.new_effect {
        apply_effect(actor, effect.clone());
    }
}
