//! Centralized balance constants for the resolution engine.
//!
//! Values that a match ruleset may override live in [`crate::ruleset`];
//! everything here is fixed engine policy.

// Stats --------------------------------------------------------------------
pub(crate) const STAT_FLOOR: i32 = 1;
pub(crate) const FOOD_POISONING_END_FACTOR: f64 = 0.5;
pub(crate) const POWER_MEN_FACTOR: f64 = 0.5;
pub(crate) const DEFAULT_MAX_HP: i32 = 100;

// Effects ------------------------------------------------------------------
pub(crate) const DEFAULT_DOT_DAMAGE: i32 = 3;
pub(crate) const FOOD_POISONING_DURATION: u32 = 3;
pub(crate) const BLEEDING_DURATION: u32 = 2;
pub(crate) const BLEEDING_DOT_DAMAGE: i32 = 2;

// Equipment ----------------------------------------------------------------
pub(crate) const RATIO_STAT_CAP: f64 = 0.75;
pub(crate) const SKILL_AMP_CAP: f64 = 2.5;
pub(crate) const WEAPON_TIER_STEP: f64 = 0.25;
pub(crate) const RANGED_MARKERS: [&str; 12] = [
    "ranged", "gun", "pistol", "rifle", "sniper", "shotgun", "bow", "crossbow", "throw", "thrown",
    "원거리", "총",
];

// Battle -------------------------------------------------------------------
pub(crate) const LUCK_ROLL_SCALE: f64 = 0.2;
pub(crate) const DRAW_THRESHOLD_BASE: f64 = 30.0;
pub(crate) const DRAW_THRESHOLD_PER_DAY: f64 = 3.0;
pub(crate) const DRAW_THRESHOLD_FLOOR: f64 = 5.0;
pub(crate) const ESCALATED_LOG_DAY: u32 = 5;

// Events -------------------------------------------------------------------
pub(crate) const LOW_HP_RATIO: f64 = 0.5;
pub(crate) const CRITICAL_HP_RATIO: f64 = 0.25;
pub(crate) const LOW_HP_REST_BOOST: f64 = 1.8;
pub(crate) const LOW_HP_MEDICAL_BOOST: f64 = 2.0;
pub(crate) const CRITICAL_HP_REST_BOOST: f64 = 2.5;
pub(crate) const CRITICAL_HP_MEDICAL_BOOST: f64 = 3.0;
pub(crate) const NIGHT_MISHAP_BOOST: f64 = 1.4;
pub(crate) const NIGHT_FIGHT_BOOST: f64 = 1.5;
pub(crate) const RISK_PER_DAY: f64 = 0.05;
pub(crate) const RISK_DAY_CAP: u32 = 10;

pub(crate) const REST_BASE_DAY: i32 = 6;
pub(crate) const REST_BASE_NIGHT: i32 = 8;
pub(crate) const REST_ROLL_MAX: i32 = 6;
pub(crate) const REST_POWER_DIVISOR: f64 = 50.0;
pub(crate) const REST_POWER_BONUS_CAP: i32 = 4;
pub(crate) const REST_HEAL_MIN: i32 = 3;
pub(crate) const REST_HEAL_MAX: i32 = 18;
pub(crate) const REST_SUPPRESS_HP_RATIO: f64 = 0.8;
pub(crate) const REST_SUPPRESS_CHANCE: f64 = 0.6;

pub(crate) const MEDICAL_FALLBACK_BASE: i32 = 2;
pub(crate) const MEDICAL_FALLBACK_ROLL_MAX: i32 = 4;

pub(crate) const SCAVENGE_TIER: u8 = 1;
pub(crate) const SCAVENGE_CREDITS_MIN: i32 = 5;
pub(crate) const SCAVENGE_CREDITS_MAX: i32 = 10;
pub(crate) const LEGENDARY_CORE_NAMES: [&str; 9] = [
    "meteorite",
    "tree of life",
    "mithril",
    "force core",
    "vf blood sample",
    "운석",
    "생명의 나무",
    "미스릴",
    "포스 코어",
];

pub(crate) const FOOD_POISONING_CHANCE: f64 = 0.1;

pub(crate) const MISHAP_BASE_DAY: i32 = 2;
pub(crate) const MISHAP_BASE_NIGHT: i32 = 4;
pub(crate) const MISHAP_DAY_DIVISOR: u32 = 3;
pub(crate) const MISHAP_ROLL_MAX: i32 = 4;
pub(crate) const MISHAP_POWER_DIVISOR: f64 = 80.0;
pub(crate) const MISHAP_DAMAGE_MIN: i32 = 1;
pub(crate) const MISHAP_DAMAGE_MAX: i32 = 10;
pub(crate) const MISHAP_BLEED_CHANCE: f64 = 0.25;

pub(crate) const FIGHT_BASE_DAY: i32 = 5;
pub(crate) const FIGHT_BASE_NIGHT: i32 = 8;
pub(crate) const FIGHT_DAY_DIVISOR: u32 = 2;
pub(crate) const FIGHT_ROLL_MAX: i32 = 6;
pub(crate) const FIGHT_POWER_DIVISOR: f64 = 60.0;
pub(crate) const FIGHT_DAMAGE_MIN: i32 = 3;
pub(crate) const FIGHT_DAMAGE_MAX: i32 = 20;
pub(crate) const FIGHT_CREDITS_MIN: i32 = 3;
pub(crate) const FIGHT_CREDITS_MAX: i32 = 7;

// Items --------------------------------------------------------------------
pub(crate) const DEFAULT_MEDICAL_RECOVERY: i32 = 20;
pub(crate) const DEFAULT_FOOD_RECOVERY: i32 = 8;

// Orchestrator -------------------------------------------------------------
pub(crate) const AUTO_HEAL_HP_RATIO: f64 = 0.4;
pub(crate) const FLAVOR_HISTORY_CAPACITY: usize = 8;
pub(crate) const DEFAULT_PHASE_CAP: u32 = 200;
