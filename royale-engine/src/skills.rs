//! Named special skills resolved once at load time, with a formula table.
use serde::{Deserialize, Serialize};

use crate::actor::StatBlock;
use crate::ruleset::BattleTuning;

/// Special skill families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    #[default]
    None,
    /// Drone support fire, scales with shooting.
    DroneSupport,
    /// Desperation strike below an HP threshold, scales with missing HP.
    Abyss,
    /// Quick-draw opener, scales with agility and dexterity.
    Iaido,
    Berserk,
    Tactician,
}

const SKILL_KEYWORDS: [(SkillKind, &[&str]); 5] = [
    (SkillKind::DroneSupport, &["drone", "드론"]),
    (SkillKind::Abyss, &["abyss", "심연"]),
    (SkillKind::Iaido, &["iaido", "발도", "居合"]),
    (SkillKind::Berserk, &["berserk", "광폭"]),
    (SkillKind::Tactician, &["tactic", "전술"]),
];

impl SkillKind {
    /// Resolve a skill family from a free-form skill name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        if lower.is_empty() {
            return Self::None;
        }
        SKILL_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|key| lower.contains(key)))
            .map_or(Self::None, |(kind, _)| *kind)
    }
}

/// Inputs a skill formula may read.
#[derive(Debug, Clone, Copy)]
pub struct SkillContext<'a> {
    /// Effective stats including equipment deltas.
    pub stats: &'a StatBlock,
    pub hp: i32,
    pub max_hp: i32,
}

impl SkillContext<'_> {
    fn hp_ratio(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        f64::from(self.hp.max(0)) / f64::from(self.max_hp)
    }
}

type SkillFormula = fn(&SkillContext<'_>, &BattleTuning) -> f64;

fn no_bonus(_: &SkillContext<'_>, _: &BattleTuning) -> f64 {
    0.0
}

fn drone_support(ctx: &SkillContext<'_>, tuning: &BattleTuning) -> f64 {
    f64::from(ctx.stats.shooting) * tuning.drone_sht_scale
}

fn abyss(ctx: &SkillContext<'_>, tuning: &BattleTuning) -> f64 {
    if ctx.hp_ratio() >= tuning.abyss_hp_threshold {
        return 0.0;
    }
    let missing = ctx.max_hp.saturating_sub(ctx.hp.max(0)).max(0);
    f64::from(missing) * tuning.abyss_missing_hp_scale
}

fn iaido(ctx: &SkillContext<'_>, tuning: &BattleTuning) -> f64 {
    (f64::from(ctx.stats.agility) + f64::from(ctx.stats.dexterity)) * tuning.iaido_scale
}

fn berserk(ctx: &SkillContext<'_>, tuning: &BattleTuning) -> f64 {
    f64::from(ctx.stats.strength) * tuning.berserk_str_scale
}

fn tactician(ctx: &SkillContext<'_>, tuning: &BattleTuning) -> f64 {
    (f64::from(ctx.stats.intellect) + f64::from(ctx.stats.mental)) * tuning.tactician_scale
}

const fn formula(kind: SkillKind) -> SkillFormula {
    match kind {
        SkillKind::None => no_bonus,
        SkillKind::DroneSupport => drone_support,
        SkillKind::Abyss => abyss,
        SkillKind::Iaido => iaido,
        SkillKind::Berserk => berserk,
        SkillKind::Tactician => tactician,
    }
}

/// Raw skill bonus before amplification and capping.
#[must_use]
pub fn skill_bonus(kind: SkillKind, ctx: &SkillContext<'_>, tuning: &BattleTuning) -> f64 {
    formula(kind)(ctx, tuning).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Stat;

    #[test]
    fn names_resolve_to_kinds() {
        assert_eq!(SkillKind::from_name("Drone Strike"), SkillKind::DroneSupport);
        assert_eq!(SkillKind::from_name("드론 지원"), SkillKind::DroneSupport);
        assert_eq!(SkillKind::from_name("Call of the Abyss"), SkillKind::Abyss);
        assert_eq!(SkillKind::from_name("iaido"), SkillKind::Iaido);
        assert_eq!(SkillKind::from_name("Juggling"), SkillKind::None);
        assert_eq!(SkillKind::from_name("  "), SkillKind::None);
    }

    #[test]
    fn abyss_only_triggers_below_threshold() {
        let tuning = BattleTuning::default();
        let stats = StatBlock::uniform(10);
        let healthy = SkillContext {
            stats: &stats,
            hp: 80,
            max_hp: 100,
        };
        assert!(skill_bonus(SkillKind::Abyss, &healthy, &tuning).abs() < f64::EPSILON);

        let desperate = SkillContext {
            stats: &stats,
            hp: 20,
            max_hp: 100,
        };
        let bonus = skill_bonus(SkillKind::Abyss, &desperate, &tuning);
        assert!((bonus - 80.0 * tuning.abyss_missing_hp_scale).abs() < 1e-9);
    }

    #[test]
    fn stat_formulas_read_their_stats() {
        let tuning = BattleTuning::default();
        let stats = StatBlock::uniform(1).with(Stat::Sht, 20).with(Stat::Agi, 6).with(Stat::Dex, 4);
        let ctx = SkillContext {
            stats: &stats,
            hp: 50,
            max_hp: 50,
        };
        let drone = skill_bonus(SkillKind::DroneSupport, &ctx, &tuning);
        assert!((drone - 20.0 * tuning.drone_sht_scale).abs() < 1e-9);
        let opener = skill_bonus(SkillKind::Iaido, &ctx, &tuning);
        assert!((opener - 10.0 * tuning.iaido_scale).abs() < 1e-9);
        assert!(skill_bonus(SkillKind::None, &ctx, &tuning).abs() < f64::EPSILON);
    }

    #[test]
    fn paired_stat_formulas_survive_huge_stats() {
        let tuning = BattleTuning::default();
        let stats = StatBlock::uniform(i32::MAX - 1);
        let ctx = SkillContext {
            stats: &stats,
            hp: 50,
            max_hp: 50,
        };
        let expected = 2.0 * f64::from(i32::MAX - 1);
        let opener = skill_bonus(SkillKind::Iaido, &ctx, &tuning);
        assert!((opener - expected * tuning.iaido_scale).abs() < 1.0);
        let plan = skill_bonus(SkillKind::Tactician, &ctx, &tuning);
        assert!((plan - expected * tuning.tactician_scale).abs() < 1.0);
    }
}
