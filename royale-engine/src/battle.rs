//! One-shot two-actor battle resolution.
//!
//! Both sides are scored by the same function with roles swapped. Each side
//! draws luck, then crit, then lifesteal from the supplied source, first side
//! first, so a scripted source reproduces a battle exactly.
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorId, StatBlock};
use crate::constants::{
    DRAW_THRESHOLD_BASE, DRAW_THRESHOLD_FLOOR, DRAW_THRESHOLD_PER_DAY, ESCALATED_LOG_DAY,
    LUCK_ROLL_SCALE, WEAPON_TIER_STEP,
};
use crate::effects::effective_stats;
use crate::equipment::{EquipmentDeltas, EquipmentTotals, equipment_deltas, equipment_stat_totals};
use crate::numbers::round_f64_to_i32;
use crate::phase::MatchError;
use crate::rng::RandomSource;
use crate::ruleset::Ruleset;
use crate::skills::{SkillContext, skill_bonus};

const DRAW_LINES: [&str; 4] = [
    "{1} and {2} trade blows until both retreat, exhausted.",
    "{1} and {2} circle each other warily before breaking off.",
    "Neither {1} nor {2} can find an opening; the fight ends in a stalemate.",
    "{1} and {2} clash briefly, then vanish into the ruins.",
];

/// Per-side score contributions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub actor_id: ActorId,
    /// Skill bonus after amplification and capping, before sudden death.
    pub skill: f64,
    /// Weapon bonus before sudden death.
    pub weapon: f64,
    pub sudden_death: f64,
    pub ranged: f64,
    pub melee: f64,
    /// Scaled skill and weapon bonus plus ranged and melee exchange scores.
    pub offense_base: f64,
    pub luck: f64,
    pub crit: f64,
    pub lifesteal: f64,
    pub total: f64,
}

/// Result of a single battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BattleOutcome {
    Draw {
        log: String,
    },
    Decisive {
        winner: ActorId,
        loser: ActorId,
        log: String,
    },
}

impl BattleOutcome {
    #[must_use]
    pub const fn is_draw(&self) -> bool {
        matches!(self, Self::Draw { .. })
    }

    #[must_use]
    pub fn log(&self) -> &str {
        match self {
            Self::Draw { log } | Self::Decisive { log, .. } => log,
        }
    }
}

/// Outcome plus the scoring telemetry that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub day: u32,
    pub outcome: BattleOutcome,
    pub first: ScoreBreakdown,
    pub second: ScoreBreakdown,
    /// Score gap below which the battle is a draw.
    pub threshold: f64,
    /// Crit and lifesteal lines, in the order they happened.
    pub notes: Vec<String>,
}

impl BattleReport {
    #[must_use]
    pub fn winner(&self) -> Option<&str> {
        match &self.outcome {
            BattleOutcome::Decisive { winner, .. } => Some(winner),
            BattleOutcome::Draw { .. } => None,
        }
    }

    #[must_use]
    pub fn loser(&self) -> Option<&str> {
        match &self.outcome {
            BattleOutcome::Decisive { loser, .. } => Some(loser),
            BattleOutcome::Draw { .. } => None,
        }
    }

    /// Notes followed by the outcome line.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.notes
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.outcome.log()))
    }
}

/// Score gap under which a battle on `day` ends in a draw.
#[must_use]
pub fn draw_threshold(day: u32) -> f64 {
    (DRAW_THRESHOLD_BASE - DRAW_THRESHOLD_PER_DAY * f64::from(day)).max(DRAW_THRESHOLD_FLOOR)
}

/// Sudden-death multiplier for `day`.
#[must_use]
pub fn sudden_death_multiplier(day: u32, ruleset: &Ruleset) -> f64 {
    ruleset
        .battle
        .sudden_death_per_day
        .mul_add(f64::from(day), 1.0)
}

/// Resolved combat inputs for one side.
struct Combatant<'a> {
    actor: &'a Actor,
    stats: StatBlock,
    deltas: EquipmentDeltas,
    totals: EquipmentTotals,
    has_weapon: bool,
}

impl<'a> Combatant<'a> {
    fn prepare(actor: &'a Actor, ruleset: &Ruleset) -> Self {
        let deltas = equipment_deltas(actor, &ruleset.equipment);
        let mut stats = effective_stats(actor);
        stats.strength = stats.strength.saturating_add(round_f64_to_i32(deltas.str_add));
        stats.shooting = stats.shooting.saturating_add(round_f64_to_i32(deltas.sht_add));
        stats.endurance = stats.endurance.saturating_add(round_f64_to_i32(deltas.end_add));
        Self {
            actor,
            stats,
            totals: equipment_stat_totals(actor),
            has_weapon: deltas.weapon_tier > 0,
            deltas,
        }
    }

    fn skill_bonus(&self, ruleset: &Ruleset) -> f64 {
        let ctx = SkillContext {
            stats: &self.stats,
            hp: self.actor.hp,
            max_hp: self.actor.max_hp,
        };
        let raw = skill_bonus(self.actor.skill, &ctx, &ruleset.battle);
        (raw * (1.0 + self.totals.skill_amp)).min(ruleset.battle.skill_bonus_cap)
    }

    fn weapon_bonus(&self, ruleset: &Ruleset) -> f64 {
        if !self.has_weapon {
            return 0.0;
        }
        let base = if self.deltas.weapon_is_ranged {
            self.stats.shooting
        } else {
            self.stats.strength
        };
        let tier_mult = WEAPON_TIER_STEP.mul_add(f64::from(self.deltas.weapon_tier) - 1.0, 1.0);
        let speed = 1.0 + self.totals.atk_speed;
        f64::from(base) * ruleset.battle.weapon_stat_scale * tier_mult * speed
            + self.totals.atk * ruleset.battle.weapon_atk_scale
    }
}

fn score_side(
    me: &Combatant<'_>,
    opp: &Combatant<'_>,
    day: u32,
    ruleset: &Ruleset,
    rng: &mut dyn RandomSource,
    notes: &mut Vec<String>,
) -> ScoreBreakdown {
    let w = &ruleset.weights;
    let sd = sudden_death_multiplier(day, ruleset);

    let skill = me.skill_bonus(ruleset);
    let weapon = me.weapon_bonus(ruleset);
    let ranged = (f64::from(me.stats.shooting) * w.shooting
        - f64::from(opp.stats.agility) * w.agility
        - opp.deltas.armor_def)
        .max(0.0)
        * sd;
    let melee = (f64::from(me.stats.strength) * w.strength
        + f64::from(me.stats.dexterity) * w.dexterity
        - f64::from(opp.stats.endurance) * w.endurance)
        .max(0.0)
        * sd;
    let offense_base = (skill + weapon) * sd + ranged + melee;

    let luck = rng.next_f64() * f64::from(me.stats.luck) * w.luck * LUCK_ROLL_SCALE;

    let crit = if rng.chance(me.totals.crit_chance) {
        notes.push(format!("{} lands a critical hit!", me.actor.name));
        offense_base * ruleset.battle.crit_damage_scale
    } else {
        0.0
    };
    let offense = offense_base + crit;

    let lifesteal = if rng.chance(me.totals.lifesteal) {
        offense * me.totals.lifesteal * ruleset.battle.lifesteal_heal_scale
    } else {
        0.0
    };
    if lifesteal > ruleset.battle.lifesteal_log_threshold {
        notes.push(format!(
            "{} drains {}'s strength ({lifesteal:.1}).",
            me.actor.name, opp.actor.name
        ));
    }

    ScoreBreakdown {
        actor_id: me.actor.id.clone(),
        skill,
        weapon,
        sudden_death: sd,
        ranged,
        melee,
        offense_base,
        luck,
        crit,
        lifesteal,
        total: offense + luck + lifesteal,
    }
}

/// Resolve a battle between two distinct actors on `day`.
///
/// # Errors
///
/// Returns [`MatchError::SelfBattle`] when both sides are the same actor.
pub fn resolve(
    a: &Actor,
    b: &Actor,
    day: u32,
    ruleset: &Ruleset,
    rng: &mut dyn RandomSource,
) -> Result<BattleReport, MatchError> {
    if a.id == b.id {
        return Err(MatchError::SelfBattle { id: a.id.clone() });
    }

    let first_side = Combatant::prepare(a, ruleset);
    let second_side = Combatant::prepare(b, ruleset);
    let mut notes = Vec::new();
    let first = score_side(&first_side, &second_side, day, ruleset, rng, &mut notes);
    let second = score_side(&second_side, &first_side, day, ruleset, rng, &mut notes);

    let threshold = draw_threshold(day);
    let gap = (first.total - second.total).abs();
    let outcome = if gap < threshold {
        let template = rng
            .pick_index(DRAW_LINES.len())
            .map_or(DRAW_LINES[0], |idx| DRAW_LINES[idx]);
        BattleOutcome::Draw {
            log: template.replace("{1}", &a.name).replace("{2}", &b.name),
        }
    } else {
        let (winner, loser) = if first.total > second.total { (a, b) } else { (b, a) };
        let log = if day >= ESCALATED_LOG_DAY {
            format!("{} lands a critical blow and cuts down {}!", winner.name, loser.name)
        } else {
            format!("{} defeats {} in battle.", winner.name, loser.name)
        };
        BattleOutcome::Decisive {
            winner: winner.id.clone(),
            loser: loser.id.clone(),
            log,
        }
    };

    log::debug!(
        "battle day {day}: {} {:.1} vs {} {:.1} (threshold {threshold:.1}) -> {}",
        a.id,
        first.total,
        b.id,
        second.total,
        if outcome.is_draw() { "draw" } else { "decisive" }
    );

    Ok(BattleReport {
        day,
        outcome,
        first,
        second,
        threshold,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Stat;
    use crate::item::{EquipSlot, ItemDef, ItemKind, ItemStats};
    use crate::rng::{PhaseStreams, RngBundle, ScriptedRng};
    use crate::skills::SkillKind;

    fn fighter(id: &str, value: i32) -> Actor {
        Actor::new(id, id.to_uppercase(), StatBlock::uniform(value), 100)
    }

    #[test]
    fn threshold_shrinks_with_day_and_floors() {
        assert!((draw_threshold(1) - 27.0).abs() < f64::EPSILON);
        assert!((draw_threshold(8) - 6.0).abs() < f64::EPSILON);
        assert!((draw_threshold(10) - 5.0).abs() < f64::EPSILON);
        assert!((draw_threshold(40) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn identical_fighters_draw_on_day_one() {
        let ruleset = Ruleset::default();
        let mut bundle = RngBundle::from_user_seed(11);
        for _ in 0..200 {
            let report = resolve(&fighter("a", 10), &fighter("b", 10), 1, &ruleset, bundle.battle())
                .unwrap();
            assert!(report.outcome.is_draw());
            assert!(report.winner().is_none());
        }
    }

    #[test]
    fn self_battle_is_rejected() {
        let actor = fighter("solo", 10);
        let err = resolve(&actor, &actor, 1, &Ruleset::default(), &mut ScriptedRng::constant(0.5))
            .unwrap_err();
        assert!(matches!(err, MatchError::SelfBattle { .. }));
    }

    #[test]
    fn swapping_roles_swaps_breakdowns() {
        let ruleset = Ruleset::default();
        let a = fighter("a", 30).with_skill(SkillKind::Berserk);
        let b = fighter("b", 8).with_equipped(
            EquipSlot::Weapon,
            ItemDef::new("bow", "Bow", ItemKind::Weapon).with_tags(&["bow"]).with_tier(2),
        );
        let forward = resolve(&a, &b, 3, &ruleset, &mut ScriptedRng::constant(0.5)).unwrap();
        let backward = resolve(&b, &a, 3, &ruleset, &mut ScriptedRng::constant(0.5)).unwrap();
        assert_eq!(forward.first, backward.second);
        assert_eq!(forward.second, backward.first);
        assert_eq!(forward.winner(), backward.winner());
    }

    #[test]
    fn stronger_fighter_wins_with_escalated_phrasing_late() {
        let ruleset = Ruleset::default();
        let strong = fighter("strong", 40);
        let weak = fighter("weak", 2);
        let early = resolve(&strong, &weak, 2, &ruleset, &mut ScriptedRng::constant(0.5)).unwrap();
        assert_eq!(early.winner(), Some("strong"));
        assert_eq!(early.loser(), Some("weak"));
        assert!(!early.outcome.log().contains("critical blow"));

        let late = resolve(&weak, &strong, 6, &ruleset, &mut ScriptedRng::constant(0.5)).unwrap();
        assert_eq!(late.winner(), Some("strong"));
        assert!(late.outcome.log().contains("critical blow"));
    }

    #[test]
    fn breakdown_follows_exchange_formulas() {
        let ruleset = Ruleset::default();
        let a = fighter("a", 10).with_hp(100);
        let b = fighter("b", 10);
        // luck 0, no crit or lifesteal chance without gear
        let report = resolve(&a, &b, 0, &ruleset, &mut ScriptedRng::constant(0.0)).unwrap();
        let first = &report.first;
        assert!((first.sudden_death - 1.0).abs() < f64::EPSILON);
        assert!(first.ranged.abs() < f64::EPSILON);
        assert!((first.melee - 10.0).abs() < f64::EPSILON);
        assert!(first.luck.abs() < f64::EPSILON);
        assert!((first.total - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn crit_and_lifesteal_add_score_and_notes() {
        let ruleset = Ruleset::default();
        let fangs = ItemStats {
            crit_chance: 0.75,
            lifesteal: 0.75,
            ..ItemStats::default()
        };
        let a = fighter("a", 20).with_equipped(
            EquipSlot::Weapon,
            ItemDef::new("fangs", "Fangs", ItemKind::Weapon).with_stats(fangs),
        );
        let b = fighter("b", 5);
        let report = resolve(&a, &b, 2, &ruleset, &mut ScriptedRng::constant(0.1)).unwrap();
        let first = &report.first;
        assert!(first.crit > 0.0);
        assert!((first.crit - first.offense_base * 0.5).abs() < 1e-9);
        let offense = first.offense_base + first.crit;
        assert!((first.lifesteal - offense * 0.75 * 0.3).abs() < 1e-9);
        assert_eq!(report.notes.len(), 2);
        assert_eq!(report.lines().count(), 3);
    }

    #[test]
    fn skill_bonus_is_capped() {
        let ruleset = Ruleset::default();
        let a = fighter("a", 10)
            .with_skill(SkillKind::DroneSupport)
            .with_hp(100);
        let mut sharpshooter = a.clone();
        sharpshooter.stats = sharpshooter.stats.with(Stat::Sht, 500);
        let mut rng = ScriptedRng::constant(0.5);
        let report = resolve(&sharpshooter, &fighter("b", 10), 1, &ruleset, &mut rng).unwrap();
        assert!((report.first.skill - ruleset.battle.skill_bonus_cap).abs() < f64::EPSILON);
    }

    #[test]
    fn paired_stat_skills_resolve_with_huge_stats() {
        let ruleset = Ruleset::default();
        let huge = 2_000_000_000;
        let mut duelist = fighter("duelist", 10).with_skill(SkillKind::Iaido);
        duelist.stats = duelist.stats.with(Stat::Agi, huge).with(Stat::Dex, huge);
        let mut planner = fighter("planner", 10).with_skill(SkillKind::Tactician);
        planner.stats = planner.stats.with(Stat::Int, huge).with(Stat::Men, huge);
        let report = resolve(&duelist, &planner, 1, &ruleset, &mut ScriptedRng::constant(0.5))
            .unwrap();
        let cap = ruleset.battle.skill_bonus_cap;
        assert!((report.first.skill - cap).abs() < f64::EPSILON);
        assert!((report.second.skill - cap).abs() < f64::EPSILON);
    }

    #[test]
    fn ranged_weapon_and_armor_breakdown_on_day_five() {
        let ruleset = Ruleset::default();
        let scope = ItemStats {
            atk: 10.0,
            atk_speed: 0.2,
            ..ItemStats::default()
        };
        let rifle = ItemDef::new("rifle", "Rifle", ItemKind::Weapon)
            .with_tags(&["rifle"])
            .with_tier(3)
            .with_stats(scope);
        let vest = ItemDef::new("vest", "Vest", ItemKind::Armor).with_tier(2);
        let shooter = fighter("shooter", 10).with_equipped(EquipSlot::Weapon, rifle);
        let tank = fighter("tank", 10).with_equipped(EquipSlot::Clothes, vest);

        // luck rolls 0 and no side has crit or lifesteal chance
        let mut rng = ScriptedRng::constant(0.0);
        let report = resolve(&shooter, &tank, 5, &ruleset, &mut rng).unwrap();
        let first = &report.first;
        assert!((first.sudden_death - 1.5).abs() < 1e-9);
        assert!(first.skill.abs() < f64::EPSILON);
        // sht 10 + 2*3 tier atk = 16; 16 * 0.3 * (1 + 0.25*2) * 1.2 + 10 * 0.5
        assert!((first.weapon - 13.64).abs() < 1e-9);
        // (16 - agi 10 - armor 2*1.5) * 1.5
        assert!((first.ranged - 4.5).abs() < 1e-9);
        // (str 10 + dex 10 - end 10+2) * 1.5
        assert!((first.melee - 12.0).abs() < 1e-9);
        assert!((first.offense_base - (13.64 * 1.5 + 4.5 + 12.0)).abs() < 1e-9);
        assert!((first.total - 36.96).abs() < 1e-9);

        let second = &report.second;
        assert!(second.weapon.abs() < f64::EPSILON);
        assert!(second.ranged.abs() < f64::EPSILON);
        assert!((second.melee - 15.0).abs() < 1e-9);
        assert!((second.total - 15.0).abs() < 1e-9);

        assert!((report.threshold - 15.0).abs() < f64::EPSILON);
        assert_eq!(report.winner(), Some("shooter"));
        assert!(report.outcome.log().contains("critical blow"));
    }

    #[test]
    fn gap_equal_to_threshold_is_decisive() {
        let ruleset = Ruleset::default();
        let brawler = |strength| {
            let mut actor = fighter("brawler", 10);
            actor.stats = actor.stats.with(Stat::Str, strength);
            actor
        };
        let target = fighter("target", 10);

        // melee 40 vs 10 on day 0, where the threshold is 30
        let at =
            resolve(&brawler(40), &target, 0, &ruleset, &mut ScriptedRng::constant(0.0)).unwrap();
        assert!((report_gap(&at) - at.threshold).abs() < f64::EPSILON);
        assert_eq!(at.winner(), Some("brawler"));

        let below =
            resolve(&brawler(39), &target, 0, &ruleset, &mut ScriptedRng::constant(0.0)).unwrap();
        assert!((report_gap(&below) - 29.0).abs() < f64::EPSILON);
        assert!(below.outcome.is_draw());
    }

    fn report_gap(report: &BattleReport) -> f64 {
        (report.first.total - report.second.total).abs()
    }
}
