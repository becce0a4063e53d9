//! Match ruleset: stat weights and tuning constants supplied once per match.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actor::Stat;

/// Errors raised when ruleset invariants are violated.
#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("ruleset JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("event weights must not all be zero")]
    EmptyEventPool,
}

fn ensure_min(field: &'static str, value: f64, min: f64) -> Result<(), RulesetError> {
    if !value.is_finite() || value < min {
        return Err(RulesetError::MinViolation { field, min, value });
    }
    Ok(())
}

fn ensure_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), RulesetError> {
    if !value.is_finite() || !(min..=max).contains(&value) {
        return Err(RulesetError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

const fn one() -> f64 {
    1.0
}

/// Per-stat score multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatWeights {
    #[serde(rename = "str", default = "one")]
    pub strength: f64,
    #[serde(rename = "agi", default = "one")]
    pub agility: f64,
    #[serde(rename = "int", default = "one")]
    pub intellect: f64,
    #[serde(rename = "men", default = "one")]
    pub mental: f64,
    #[serde(rename = "luk", default = "one")]
    pub luck: f64,
    #[serde(rename = "dex", default = "one")]
    pub dexterity: f64,
    #[serde(rename = "sht", default = "one")]
    pub shooting: f64,
    #[serde(rename = "end", default = "one")]
    pub endurance: f64,
}

impl Default for StatWeights {
    fn default() -> Self {
        Self {
            strength: 1.0,
            agility: 1.0,
            intellect: 1.0,
            mental: 1.0,
            luck: 1.0,
            dexterity: 1.0,
            shooting: 1.0,
            endurance: 1.0,
        }
    }
}

impl StatWeights {
    #[must_use]
    pub const fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Str => self.strength,
            Stat::Agi => self.agility,
            Stat::Int => self.intellect,
            Stat::Men => self.mental,
            Stat::Luk => self.luck,
            Stat::Dex => self.dexterity,
            Stat::Sht => self.shooting,
            Stat::End => self.endurance,
        }
    }

    fn validate(&self) -> Result<(), RulesetError> {
        for stat in Stat::ALL {
            ensure_min(weight_field(stat), self.get(stat), 0.0)?;
        }
        Ok(())
    }
}

const fn weight_field(stat: Stat) -> &'static str {
    match stat {
        Stat::Str => "weights.str",
        Stat::Agi => "weights.agi",
        Stat::Int => "weights.int",
        Stat::Men => "weights.men",
        Stat::Luk => "weights.luk",
        Stat::Dex => "weights.dex",
        Stat::Sht => "weights.sht",
        Stat::End => "weights.end",
    }
}

/// Battle resolver tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleTuning {
    #[serde(default = "BattleTuning::default_skill_bonus_cap")]
    pub skill_bonus_cap: f64,
    #[serde(default = "BattleTuning::default_sudden_death_per_day")]
    pub sudden_death_per_day: f64,
    #[serde(default = "BattleTuning::default_weapon_stat_scale")]
    pub weapon_stat_scale: f64,
    #[serde(default = "BattleTuning::default_weapon_atk_scale")]
    pub weapon_atk_scale: f64,
    #[serde(default = "BattleTuning::default_crit_damage_scale")]
    pub crit_damage_scale: f64,
    #[serde(default = "BattleTuning::default_lifesteal_heal_scale")]
    pub lifesteal_heal_scale: f64,
    #[serde(default = "BattleTuning::default_lifesteal_log_threshold")]
    pub lifesteal_log_threshold: f64,
    #[serde(default = "BattleTuning::default_drone_sht_scale")]
    pub drone_sht_scale: f64,
    #[serde(default = "BattleTuning::default_abyss_hp_threshold")]
    pub abyss_hp_threshold: f64,
    #[serde(default = "BattleTuning::default_abyss_missing_hp_scale")]
    pub abyss_missing_hp_scale: f64,
    #[serde(default = "BattleTuning::default_iaido_scale")]
    pub iaido_scale: f64,
    #[serde(default = "BattleTuning::default_berserk_str_scale")]
    pub berserk_str_scale: f64,
    #[serde(default = "BattleTuning::default_tactician_scale")]
    pub tactician_scale: f64,
}

impl BattleTuning {
    const fn default_skill_bonus_cap() -> f64 {
        60.0
    }

    const fn default_sudden_death_per_day() -> f64 {
        0.1
    }

    const fn default_weapon_stat_scale() -> f64 {
        0.3
    }

    const fn default_weapon_atk_scale() -> f64 {
        0.5
    }

    const fn default_crit_damage_scale() -> f64 {
        0.5
    }

    const fn default_lifesteal_heal_scale() -> f64 {
        0.3
    }

    const fn default_lifesteal_log_threshold() -> f64 {
        0.5
    }

    const fn default_drone_sht_scale() -> f64 {
        0.6
    }

    const fn default_abyss_hp_threshold() -> f64 {
        0.35
    }

    const fn default_abyss_missing_hp_scale() -> f64 {
        0.4
    }

    const fn default_iaido_scale() -> f64 {
        0.5
    }

    const fn default_berserk_str_scale() -> f64 {
        0.5
    }

    const fn default_tactician_scale() -> f64 {
        0.4
    }

    fn validate(&self) -> Result<(), RulesetError> {
        ensure_min("battle.skill_bonus_cap", self.skill_bonus_cap, 0.0)?;
        ensure_range("battle.sudden_death_per_day", self.sudden_death_per_day, 0.0, 1.0)?;
        ensure_min("battle.weapon_stat_scale", self.weapon_stat_scale, 0.0)?;
        ensure_min("battle.weapon_atk_scale", self.weapon_atk_scale, 0.0)?;
        ensure_min("battle.crit_damage_scale", self.crit_damage_scale, 0.0)?;
        ensure_min("battle.lifesteal_heal_scale", self.lifesteal_heal_scale, 0.0)?;
        ensure_min("battle.lifesteal_log_threshold", self.lifesteal_log_threshold, 0.0)?;
        ensure_range("battle.abyss_hp_threshold", self.abyss_hp_threshold, 0.0, 1.0)?;
        Ok(())
    }
}

impl Default for BattleTuning {
    fn default() -> Self {
        Self {
            skill_bonus_cap: Self::default_skill_bonus_cap(),
            sudden_death_per_day: Self::default_sudden_death_per_day(),
            weapon_stat_scale: Self::default_weapon_stat_scale(),
            weapon_atk_scale: Self::default_weapon_atk_scale(),
            crit_damage_scale: Self::default_crit_damage_scale(),
            lifesteal_heal_scale: Self::default_lifesteal_heal_scale(),
            lifesteal_log_threshold: Self::default_lifesteal_log_threshold(),
            drone_sht_scale: Self::default_drone_sht_scale(),
            abyss_hp_threshold: Self::default_abyss_hp_threshold(),
            abyss_missing_hp_scale: Self::default_abyss_missing_hp_scale(),
            iaido_scale: Self::default_iaido_scale(),
            berserk_str_scale: Self::default_berserk_str_scale(),
            tactician_scale: Self::default_tactician_scale(),
        }
    }
}

/// Equipment aggregator tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentTuning {
    #[serde(default = "EquipmentTuning::default_weapon_atk_per_tier")]
    pub weapon_atk_per_tier: f64,
    #[serde(default = "EquipmentTuning::default_armor_def_per_tier")]
    pub armor_def_per_tier: f64,
    #[serde(default = "EquipmentTuning::default_armor_end_per_tier")]
    pub armor_end_per_tier: f64,
    #[serde(default = "EquipmentTuning::default_max_tier")]
    pub max_tier: u8,
}

impl EquipmentTuning {
    const fn default_weapon_atk_per_tier() -> f64 {
        2.0
    }

    const fn default_armor_def_per_tier() -> f64 {
        1.5
    }

    const fn default_armor_end_per_tier() -> f64 {
        1.0
    }

    const fn default_max_tier() -> u8 {
        6
    }

    fn validate(&self) -> Result<(), RulesetError> {
        ensure_min("equipment.weapon_atk_per_tier", self.weapon_atk_per_tier, 0.0)?;
        ensure_min("equipment.armor_def_per_tier", self.armor_def_per_tier, 0.0)?;
        ensure_min("equipment.armor_end_per_tier", self.armor_end_per_tier, 0.0)?;
        ensure_range("equipment.max_tier", f64::from(self.max_tier), 1.0, 6.0)?;
        Ok(())
    }
}

impl Default for EquipmentTuning {
    fn default() -> Self {
        Self {
            weapon_atk_per_tier: Self::default_weapon_atk_per_tier(),
            armor_def_per_tier: Self::default_armor_def_per_tier(),
            armor_end_per_tier: Self::default_armor_end_per_tier(),
            max_tier: Self::default_max_tier(),
        }
    }
}

/// Base weights for minor event categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWeights {
    #[serde(default = "EventWeights::default_nothing")]
    pub nothing: f64,
    #[serde(default = "EventWeights::default_rest")]
    pub rest: f64,
    #[serde(default = "EventWeights::default_medical")]
    pub medical: f64,
    #[serde(default = "EventWeights::default_scavenge")]
    pub scavenge: f64,
    #[serde(default = "EventWeights::default_food")]
    pub food: f64,
    #[serde(default = "EventWeights::default_mishap")]
    pub mishap: f64,
    #[serde(default = "EventWeights::default_minor_fight")]
    pub minor_fight: f64,
}

impl EventWeights {
    const fn default_nothing() -> f64 {
        20.0
    }

    const fn default_rest() -> f64 {
        15.0
    }

    const fn default_medical() -> f64 {
        8.0
    }

    const fn default_scavenge() -> f64 {
        18.0
    }

    const fn default_food() -> f64 {
        12.0
    }

    const fn default_mishap() -> f64 {
        12.0
    }

    const fn default_minor_fight() -> f64 {
        10.0
    }

    fn validate(&self) -> Result<(), RulesetError> {
        let fields = [
            ("events.nothing", self.nothing),
            ("events.rest", self.rest),
            ("events.medical", self.medical),
            ("events.scavenge", self.scavenge),
            ("events.food", self.food),
            ("events.mishap", self.mishap),
            ("events.minor_fight", self.minor_fight),
        ];
        let mut total = 0.0;
        for (field, value) in fields {
            ensure_min(field, value, 0.0)?;
            total += value;
        }
        if total <= 0.0 {
            return Err(RulesetError::EmptyEventPool);
        }
        Ok(())
    }
}

impl Default for EventWeights {
    fn default() -> Self {
        Self {
            nothing: Self::default_nothing(),
            rest: Self::default_rest(),
            medical: Self::default_medical(),
            scavenge: Self::default_scavenge(),
            food: Self::default_food(),
            mishap: Self::default_mishap(),
            minor_fight: Self::default_minor_fight(),
        }
    }
}

/// Phase orchestrator tuning: zone damage and per-phase conflict rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTuning {
    #[serde(default = "PhaseTuning::default_zone_start_day")]
    pub zone_start_day: u32,
    #[serde(default = "PhaseTuning::default_zone_base")]
    pub zone_base: i32,
    #[serde(default = "PhaseTuning::default_zone_per_day")]
    pub zone_per_day: i32,
    #[serde(default = "PhaseTuning::default_zone_max")]
    pub zone_max: i32,
    #[serde(default = "PhaseTuning::default_battle_base")]
    pub battle_base: f64,
    #[serde(default = "PhaseTuning::default_battle_per_day")]
    pub battle_per_day: f64,
    #[serde(default = "PhaseTuning::default_battle_max")]
    pub battle_max: f64,
    #[serde(default = "PhaseTuning::default_event_base")]
    pub event_base: f64,
    #[serde(default = "PhaseTuning::default_event_per_day")]
    pub event_per_day: f64,
    #[serde(default = "PhaseTuning::default_event_max")]
    pub event_max: f64,
}

impl PhaseTuning {
    const fn default_zone_start_day() -> u32 {
        3
    }

    const fn default_zone_base() -> i32 {
        3
    }

    const fn default_zone_per_day() -> i32 {
        2
    }

    const fn default_zone_max() -> i32 {
        25
    }

    const fn default_battle_base() -> f64 {
        0.25
    }

    const fn default_battle_per_day() -> f64 {
        0.05
    }

    const fn default_battle_max() -> f64 {
        0.7
    }

    const fn default_event_base() -> f64 {
        0.3
    }

    const fn default_event_per_day() -> f64 {
        0.02
    }

    const fn default_event_max() -> f64 {
        0.5
    }

    /// Probability that an acting actor starts a battle on `day`.
    #[must_use]
    pub fn battle_probability(&self, day: u32) -> f64 {
        (self.battle_base + f64::from(day) * self.battle_per_day).min(self.battle_max)
    }

    /// Probability of a two-actor flavor event on `day`.
    #[must_use]
    pub fn event_probability(&self, day: u32) -> f64 {
        (self.event_base + f64::from(day) * self.event_per_day).min(self.event_max)
    }

    /// Forbidden-area damage dealt to every living actor on `day`.
    #[must_use]
    pub fn zone_damage(&self, day: u32) -> i32 {
        if day < self.zone_start_day {
            return 0;
        }
        let elapsed = i32::try_from(day - self.zone_start_day).unwrap_or(i32::MAX);
        self.zone_base
            .saturating_add(elapsed.saturating_mul(self.zone_per_day))
            .min(self.zone_max)
            .max(0)
    }

    fn validate(&self) -> Result<(), RulesetError> {
        ensure_min("phase.zone_base", f64::from(self.zone_base), 0.0)?;
        ensure_min("phase.zone_per_day", f64::from(self.zone_per_day), 0.0)?;
        ensure_min("phase.zone_max", f64::from(self.zone_max), 0.0)?;
        ensure_range("phase.battle_base", self.battle_base, 0.0, 1.0)?;
        ensure_min("phase.battle_per_day", self.battle_per_day, 0.0)?;
        ensure_range("phase.battle_max", self.battle_max, 0.0, 1.0)?;
        ensure_range("phase.event_base", self.event_base, 0.0, 1.0)?;
        ensure_min("phase.event_per_day", self.event_per_day, 0.0)?;
        ensure_range("phase.event_max", self.event_max, 0.0, 1.0)?;
        Ok(())
    }
}

impl Default for PhaseTuning {
    fn default() -> Self {
        Self {
            zone_start_day: Self::default_zone_start_day(),
            zone_base: Self::default_zone_base(),
            zone_per_day: Self::default_zone_per_day(),
            zone_max: Self::default_zone_max(),
            battle_base: Self::default_battle_base(),
            battle_per_day: Self::default_battle_per_day(),
            battle_max: Self::default_battle_max(),
            event_base: Self::default_event_base(),
            event_per_day: Self::default_event_per_day(),
            event_max: Self::default_event_max(),
        }
    }
}

/// Complete tuning configuration for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(default = "Ruleset::default_id", alias = "rulesetId")]
    pub id: String,
    #[serde(default, alias = "statWeights")]
    pub weights: StatWeights,
    #[serde(default)]
    pub battle: BattleTuning,
    #[serde(default)]
    pub equipment: EquipmentTuning,
    #[serde(default)]
    pub events: EventWeights,
    #[serde(default)]
    pub phase: PhaseTuning,
}

impl Ruleset {
    fn default_id() -> String {
        String::from("standard")
    }

    /// Parse and validate a ruleset from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a tuning value is out of range.
    pub fn from_json(json: &str) -> Result<Self, RulesetError> {
        let ruleset: Self = serde_json::from_str(json)?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Check every tuning invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), RulesetError> {
        self.weights.validate()?;
        self.battle.validate()?;
        self.equipment.validate()?;
        self.events.validate()?;
        self.phase.validate()?;
        Ok(())
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            id: Self::default_id(),
            weights: StatWeights::default(),
            battle: BattleTuning::default(),
            equipment: EquipmentTuning::default(),
            events: EventWeights::default(),
            phase: PhaseTuning::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let ruleset = Ruleset::from_json("{}").unwrap();
        assert_eq!(ruleset, Ruleset::default());
        assert!((ruleset.weights.get(Stat::Luk) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_overrides_keep_remaining_defaults() {
        let json = r#"{"id":"hardcore","statWeights":{"sht":1.5},"phase":{"zone_start_day":1}}"#;
        let ruleset = Ruleset::from_json(json).unwrap();
        assert_eq!(ruleset.id, "hardcore");
        assert!((ruleset.weights.shooting - 1.5).abs() < f64::EPSILON);
        assert!((ruleset.weights.strength - 1.0).abs() < f64::EPSILON);
        assert_eq!(ruleset.phase.zone_start_day, 1);
        assert_eq!(ruleset.phase.zone_max, 25);
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let err = Ruleset::from_json(r#"{"weights":{"agi":-1.0}}"#).unwrap_err();
        assert!(matches!(
            err,
            RulesetError::MinViolation {
                field: "weights.agi",
                ..
            }
        ));

        let err = Ruleset::from_json(r#"{"phase":{"battle_max":1.5}}"#).unwrap_err();
        assert!(err.to_string().contains("phase.battle_max"));

        let zeroed = r#"{"events":{"nothing":0,"rest":0,"medical":0,"scavenge":0,
            "food":0,"mishap":0,"minor_fight":0}}"#;
        assert!(matches!(
            Ruleset::from_json(zeroed).unwrap_err(),
            RulesetError::EmptyEventPool
        ));
        assert!(matches!(
            Ruleset::from_json("not json").unwrap_err(),
            RulesetError::Parse(_)
        ));
    }

    #[test]
    fn validation_rejects_non_finite_tuning() {
        let mut ruleset = Ruleset::default();
        ruleset.battle.crit_damage_scale = f64::INFINITY;
        assert!(matches!(
            ruleset.validate().unwrap_err(),
            RulesetError::MinViolation {
                field: "battle.crit_damage_scale",
                ..
            }
        ));

        let mut ruleset = Ruleset::default();
        ruleset.phase.event_base = f64::NAN;
        assert!(matches!(
            ruleset.validate().unwrap_err(),
            RulesetError::RangeViolation {
                field: "phase.event_base",
                ..
            }
        ));
    }

    #[test]
    fn lifesteal_log_threshold_must_be_non_negative() {
        let err = Ruleset::from_json(r#"{"battle":{"lifesteal_log_threshold":-1.0}}"#).unwrap_err();
        assert!(err.to_string().contains("battle.lifesteal_log_threshold"));

        let mut ruleset = Ruleset::default();
        ruleset.battle.lifesteal_log_threshold = f64::INFINITY;
        assert!(ruleset.validate().is_err());
    }

    #[test]
    fn phase_curves_grow_and_cap() {
        let phase = PhaseTuning::default();
        assert_eq!(phase.zone_damage(2), 0);
        assert_eq!(phase.zone_damage(3), 3);
        assert_eq!(phase.zone_damage(5), 7);
        assert_eq!(phase.zone_damage(40), 25);
        assert!((phase.battle_probability(1) - 0.3).abs() < 1e-9);
        assert!((phase.battle_probability(50) - 0.7).abs() < 1e-9);
        assert!(phase.event_probability(2) > phase.event_probability(1));
        assert!((phase.event_probability(100) - 0.5).abs() < 1e-9);
    }
}
