//! Equipment aggregation: combat deltas and catalog-style stat totals.
use serde::{Deserialize, Serialize};

use crate::actor::Actor;
use crate::constants::{RATIO_STAT_CAP, SKILL_AMP_CAP};
use crate::item::{EquipSlot, ItemDef};
use crate::numbers::finite_or;
use crate::ruleset::EquipmentTuning;

/// Flat combat bonuses derived from equipped weapon and armor tiers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EquipmentDeltas {
    pub str_add: f64,
    pub sht_add: f64,
    pub end_add: f64,
    /// Flat defense subtracted from an opponent's ranged score.
    pub armor_def: f64,
    /// Tier of the resolved weapon, 0 without a weapon.
    pub weapon_tier: u8,
    pub armor_tier_sum: u32,
    pub weapon_is_ranged: bool,
}

/// Summed item stats of the resolved weapon and equipped armor, clamped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EquipmentTotals {
    pub atk: f64,
    pub hp: f64,
    pub skill_amp: f64,
    pub atk_speed: f64,
    pub crit_chance: f64,
    pub cdr: f64,
    pub lifesteal: f64,
    pub move_speed: f64,
    /// Type name of the resolved weapon, if any.
    pub weapon_type: Option<String>,
    pub weapon_is_ranged: bool,
}

/// Resolve the weapon an actor fights with.
///
/// The equipped reference wins when it points at an owned stack; otherwise
/// the highest-tier weapon in the inventory is used (first one on ties).
#[must_use]
pub fn resolve_weapon(actor: &Actor) -> Option<&ItemDef> {
    if let Some(stack) = actor
        .equipped
        .get(EquipSlot::Weapon)
        .and_then(|id| actor.stack(id))
    {
        return Some(&stack.item);
    }
    actor
        .inventory
        .iter()
        .filter(|stack| stack.qty > 0 && stack.item.is_weapon())
        .map(|stack| &stack.item)
        .fold(None, |best: Option<&ItemDef>, item| match best {
            Some(current) if current.tier_or_default() >= item.tier_or_default() => Some(current),
            _ => Some(item),
        })
}

/// Equipped armor pieces that resolve to owned stacks, in slot order.
pub fn resolve_armor(actor: &Actor) -> impl Iterator<Item = &ItemDef> {
    EquipSlot::ARMOR.into_iter().filter_map(move |slot| {
        actor
            .equipped
            .get(slot)
            .and_then(|id| actor.stack(id))
            .map(|stack| &stack.item)
    })
}

/// Combat deltas from the resolved weapon and armor.
#[must_use]
pub fn equipment_deltas(actor: &Actor, tuning: &EquipmentTuning) -> EquipmentDeltas {
    let mut deltas = EquipmentDeltas::default();

    if let Some(weapon) = resolve_weapon(actor) {
        let tier = weapon.tier_or_default().clamp(1, tuning.max_tier.max(1));
        let weapon_atk = tuning.weapon_atk_per_tier * f64::from(tier);
        deltas.weapon_tier = tier;
        deltas.weapon_is_ranged = weapon.is_ranged();
        if deltas.weapon_is_ranged {
            deltas.sht_add = weapon_atk;
        } else {
            deltas.str_add = weapon_atk;
        }
    }

    deltas.armor_tier_sum = resolve_armor(actor)
        .map(|piece| u32::from(piece.tier_or_default()))
        .sum();
    let tier_sum = f64::from(deltas.armor_tier_sum);
    deltas.armor_def = tuning.armor_def_per_tier * tier_sum;
    deltas.end_add = tuning.armor_end_per_tier * tier_sum;
    deltas
}

/// Catalog-style stat totals with stacking caps applied.
#[must_use]
pub fn equipment_stat_totals(actor: &Actor) -> EquipmentTotals {
    let weapon = resolve_weapon(actor);
    let mut totals = EquipmentTotals {
        weapon_type: weapon.map(|item| {
            if item.type_name.is_empty() {
                item.name.clone()
            } else {
                item.type_name.clone()
            }
        }),
        weapon_is_ranged: weapon.is_some_and(ItemDef::is_ranged),
        ..EquipmentTotals::default()
    };

    for item in weapon.into_iter().chain(resolve_armor(actor)) {
        let stats = &item.stats;
        totals.atk += stats.atk;
        totals.hp += stats.hp;
        totals.skill_amp += stats.skill_amp;
        totals.atk_speed += stats.atk_speed;
        totals.crit_chance += stats.crit_chance;
        totals.cdr += stats.cdr;
        totals.lifesteal += stats.lifesteal;
        totals.move_speed += stats.move_speed;
    }

    totals.atk = non_negative(totals.atk);
    totals.hp = non_negative(totals.hp);
    totals.skill_amp = clamp_ratio(totals.skill_amp, SKILL_AMP_CAP);
    totals.atk_speed = clamp_ratio(totals.atk_speed, RATIO_STAT_CAP);
    totals.crit_chance = clamp_ratio(totals.crit_chance, RATIO_STAT_CAP);
    totals.cdr = clamp_ratio(totals.cdr, RATIO_STAT_CAP);
    totals.lifesteal = clamp_ratio(totals.lifesteal, RATIO_STAT_CAP);
    totals
}

fn non_negative(value: f64) -> f64 {
    finite_or(value, 0.0).max(0.0)
}

fn clamp_ratio(value: f64, cap: f64) -> f64 {
    finite_or(value, 0.0).clamp(0.0, cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::StatBlock;
    use crate::item::{ItemKind, ItemStats};

    fn base() -> Actor {
        Actor::new("a", "Alpha", StatBlock::uniform(10), 100)
    }

    fn rifle(tier: u8) -> ItemDef {
        ItemDef::new("rifle", "Rifle", ItemKind::Weapon)
            .with_tags(&["weapon", "rifle"])
            .with_tier(tier)
    }

    fn armor(id: &str, tier: u8) -> ItemDef {
        ItemDef::new(id, id, ItemKind::Armor).with_tier(tier)
    }

    #[test]
    fn unarmed_actor_has_zero_deltas() {
        let deltas = equipment_deltas(&base(), &EquipmentTuning::default());
        assert_eq!(deltas, EquipmentDeltas::default());
        let totals = equipment_stat_totals(&base());
        assert!(totals.weapon_type.is_none());
        assert!(!totals.weapon_is_ranged);
    }

    #[test]
    fn ranged_weapon_routes_into_shooting() {
        let actor = base().with_equipped(EquipSlot::Weapon, rifle(3));
        let deltas = equipment_deltas(&actor, &EquipmentTuning::default());
        assert!(deltas.weapon_is_ranged);
        assert_eq!(deltas.weapon_tier, 3);
        assert!((deltas.sht_add - 6.0).abs() < f64::EPSILON);
        assert!(deltas.str_add.abs() < f64::EPSILON);
    }

    #[test]
    fn weapon_tier_is_clamped_to_max() {
        let actor = base().with_equipped(EquipSlot::Weapon, rifle(9));
        let deltas = equipment_deltas(&actor, &EquipmentTuning::default());
        assert_eq!(deltas.weapon_tier, 6);
        assert!((deltas.sht_add - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unequipped_weapons_fall_back_to_highest_tier() {
        let actor = base()
            .with_item(ItemDef::new("club", "Club", ItemKind::Weapon).with_tier(1), 1)
            .with_item(
                ItemDef::new("axe", "Axe", ItemKind::Misc)
                    .with_tags(&["weapon"])
                    .with_tier(4),
                1,
            )
            .with_item(ItemDef::new("sword", "Sword", ItemKind::Weapon).with_tier(4), 1);
        let weapon = resolve_weapon(&actor).unwrap();
        assert_eq!(weapon.id, "axe");
        let deltas = equipment_deltas(&actor, &EquipmentTuning::default());
        assert!((deltas.str_add - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn armor_tiers_sum_and_dangling_refs_are_ignored() {
        let mut actor = base()
            .with_equipped(EquipSlot::Head, armor("helm", 2))
            .with_equipped(EquipSlot::Shoes, ItemDef::new("boots", "Boots", ItemKind::Armor));
        actor.equipped.set(EquipSlot::Clothes, Some(String::from("missing")));
        let deltas = equipment_deltas(&actor, &EquipmentTuning::default());
        assert_eq!(deltas.armor_tier_sum, 3);
        assert!((deltas.armor_def - 4.5).abs() < f64::EPSILON);
        assert!((deltas.end_add - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stacked_totals_are_clamped() {
        let heavy = ItemStats {
            atk: -50.0,
            crit_chance: 0.5,
            lifesteal: 0.6,
            atk_speed: -0.3,
            skill_amp: 2.0,
            cdr: 0.4,
            ..ItemStats::default()
        };
        let actor = base()
            .with_equipped(EquipSlot::Weapon, rifle(1).with_stats(heavy))
            .with_equipped(EquipSlot::Head, armor("helm", 1).with_stats(heavy))
            .with_equipped(EquipSlot::Arm, armor("gloves", 1).with_stats(heavy));
        let totals = equipment_stat_totals(&actor);
        assert!(totals.atk.abs() < f64::EPSILON);
        assert!((totals.crit_chance - 0.75).abs() < f64::EPSILON);
        assert!((totals.lifesteal - 0.75).abs() < f64::EPSILON);
        assert!((totals.cdr - 0.75).abs() < f64::EPSILON);
        assert!(totals.atk_speed.abs() < f64::EPSILON);
        assert!((totals.skill_amp - 2.5).abs() < f64::EPSILON);
        assert!(totals.weapon_is_ranged);
    }

    #[test]
    fn non_finite_item_stats_total_to_zero() {
        let broken = ItemStats {
            atk: f64::INFINITY,
            crit_chance: f64::NAN,
            skill_amp: f64::NEG_INFINITY,
            ..ItemStats::default()
        };
        let actor = base().with_equipped(EquipSlot::Weapon, rifle(2).with_stats(broken));
        let totals = equipment_stat_totals(&actor);
        assert!(totals.atk.abs() < f64::EPSILON);
        assert!(totals.crit_chance.abs() < f64::EPSILON);
        assert!(totals.skill_amp.abs() < f64::EPSILON);
    }
}
