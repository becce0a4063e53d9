//! Status effects: stat aggregation, per-phase ticking and application.
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, StatBlock};
use crate::constants::{
    BLEEDING_DOT_DAMAGE, BLEEDING_DURATION, DEFAULT_DOT_DAMAGE, FOOD_POISONING_DURATION,
    FOOD_POISONING_END_FACTOR,
};
use crate::numbers::floor_f64_to_i32;

/// Special-cased behaviour resolved from the effect name at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Halves endurance after the effect's own modifiers.
    FoodPoisoning,
    Bleeding,
    Burn,
    Poison,
    #[default]
    Generic,
}

impl EffectKind {
    /// Resolve a kind from a display name (English or Korean keywords).
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        let has = |keys: &[&str]| keys.iter().any(|key| lower.contains(key));
        if has(&["food poisoning", "food_poisoning", "식중독"]) {
            Self::FoodPoisoning
        } else if has(&["bleed", "출혈"]) {
            Self::Bleeding
        } else if has(&["burn", "화상"]) {
            Self::Burn
        } else if has(&["poison", "중독"]) {
            Self::Poison
        } else {
            Self::Generic
        }
    }

    /// Kinds that deal damage every phase even without an explicit magnitude.
    #[must_use]
    pub const fn is_periodic(self) -> bool {
        matches!(self, Self::Bleeding | Self::Burn | Self::Poison)
    }
}

/// An active status effect on an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    #[serde(default)]
    pub kind: EffectKind,
    /// Phases left before expiry.
    pub remaining: u32,
    /// Flat additive stat modifiers.
    #[serde(default)]
    pub modifiers: StatBlock,
    /// Damage applied once per phase.
    #[serde(default)]
    pub dot_damage: Option<i32>,
}

impl StatusEffect {
    #[must_use]
    pub fn new(name: impl Into<String>, remaining: u32) -> Self {
        let name = name.into();
        Self {
            kind: EffectKind::from_name(&name),
            name,
            remaining,
            modifiers: StatBlock::default(),
            dot_damage: None,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: StatBlock) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_dot(mut self, damage: i32) -> Self {
        self.dot_damage = Some(damage);
        self
    }

    #[must_use]
    pub fn food_poisoning() -> Self {
        Self::new("Food Poisoning", FOOD_POISONING_DURATION)
    }

    #[must_use]
    pub fn bleeding() -> Self {
        Self::new("Bleeding", BLEEDING_DURATION).with_dot(BLEEDING_DOT_DAMAGE)
    }

    /// Damage this effect deals per phase.
    #[must_use]
    pub fn tick_damage(&self) -> i32 {
        match self.dot_damage {
            Some(damage) => damage.max(0),
            None if self.kind.is_periodic() => DEFAULT_DOT_DAMAGE,
            None => 0,
        }
    }
}

/// Base stats after status-effect modifiers, every stat at least 1.
#[must_use]
pub fn effective_stats(actor: &Actor) -> StatBlock {
    let mut stats = actor.stats;
    for effect in &actor.effects {
        stats.add_assign(&effect.modifiers);
        if effect.kind == EffectKind::FoodPoisoning {
            stats.endurance =
                floor_f64_to_i32(f64::from(stats.endurance) * FOOD_POISONING_END_FACTOR);
        }
    }
    stats.clamp_to_floor();
    stats
}

/// Result of one status-effect tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Total periodic damage dealt this phase.
    pub damage: i32,
    /// Names of effects that expired.
    pub expired: Vec<String>,
}

/// Apply periodic damage, decrement durations and drop expired effects.
pub fn tick_effects(actor: &mut Actor) -> TickReport {
    let mut report = TickReport::default();
    for effect in &mut actor.effects {
        report.damage = report.damage.saturating_add(effect.tick_damage());
        effect.remaining = effect.remaining.saturating_sub(1);
    }
    actor.effects.retain(|effect| {
        if effect.remaining == 0 {
            report.expired.push(effect.name.clone());
            false
        } else {
            true
        }
    });
    debug_assert!(actor.effects.iter().all(|effect| effect.remaining > 0));
    actor.take_damage(report.damage);
    report
}

/// Add an effect, refreshing an existing effect of the same name to the longer duration.
pub fn apply_effect(actor: &mut Actor, effect: StatusEffect) {
    if let Some(existing) = actor
        .effects
        .iter_mut()
        .find(|current| current.kind == effect.kind && current.name == effect.name)
    {
        existing.remaining = existing.remaining.max(effect.remaining);
        return;
    }
    actor.effects.push(effect);
}
