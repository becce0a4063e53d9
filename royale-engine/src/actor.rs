//! Canonical actor records: base stats, HP, inventory and equipment.
use serde::{Deserialize, Serialize};

use crate::constants::{POWER_MEN_FACTOR, STAT_FLOOR};
use crate::effects::StatusEffect;
use crate::item::{EquipSlot, ItemDef, ItemStack};
use crate::skills::SkillKind;

pub type ActorId = String;

/// The eight base stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Str,
    Agi,
    Int,
    Men,
    Luk,
    Dex,
    Sht,
    End,
}

impl Stat {
    pub const ALL: [Self; 8] = [
        Self::Str,
        Self::Agi,
        Self::Int,
        Self::Men,
        Self::Luk,
        Self::Dex,
        Self::Sht,
        Self::End,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Agi => "agi",
            Self::Int => "int",
            Self::Men => "men",
            Self::Luk => "luk",
            Self::Dex => "dex",
            Self::Sht => "sht",
            Self::End => "end",
        }
    }
}

/// Integer stat record. Also used for additive modifiers, where zero means "no change".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBlock {
    #[serde(rename = "str", default)]
    pub strength: i32,
    #[serde(rename = "agi", default)]
    pub agility: i32,
    #[serde(rename = "int", default)]
    pub intellect: i32,
    #[serde(rename = "men", default)]
    pub mental: i32,
    #[serde(rename = "luk", default)]
    pub luck: i32,
    #[serde(rename = "dex", default)]
    pub dexterity: i32,
    #[serde(rename = "sht", default)]
    pub shooting: i32,
    #[serde(rename = "end", default)]
    pub endurance: i32,
}

impl StatBlock {
    /// Every stat set to the same value.
    #[must_use]
    pub const fn uniform(value: i32) -> Self {
        Self {
            strength: value,
            agility: value,
            intellect: value,
            mental: value,
            luck: value,
            dexterity: value,
            shooting: value,
            endurance: value,
        }
    }

    #[must_use]
    pub const fn get(&self, stat: Stat) -> i32 {
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

    pub const fn get_mut(&mut self, stat: Stat) -> &mut i32 {
        match stat {
            Stat::Str => &mut self.strength,
            Stat::Agi => &mut self.agility,
            Stat::Int => &mut self.intellect,
            Stat::Men => &mut self.mental,
            Stat::Luk => &mut self.luck,
            Stat::Dex => &mut self.dexterity,
            Stat::Sht => &mut self.shooting,
            Stat::End => &mut self.endurance,
        }
    }

    #[must_use]
    pub const fn with(mut self, stat: Stat, value: i32) -> Self {
        *self.get_mut(stat) = value;
        self
    }

    /// Add another block stat by stat.
    pub fn add_assign(&mut self, other: &Self) {
        for stat in Stat::ALL {
            let slot = self.get_mut(stat);
            *slot = slot.saturating_add(other.get(stat));
        }
    }

    /// Raise every stat to at least the engine floor.
    pub fn clamp_to_floor(&mut self) {
        for stat in Stat::ALL {
            let slot = self.get_mut(stat);
            *slot = (*slot).max(STAT_FLOOR);
        }
    }

    /// Aggregate power used to soften minor event damage and scale rest.
    #[must_use]
    pub fn power(&self) -> f64 {
        f64::from(self.strength)
            + f64::from(self.agility)
            + f64::from(self.shooting)
            + f64::from(self.endurance)
            + f64::from(self.mental) * POWER_MEN_FACTOR
    }
}

/// Equipped item references (item ids into the actor's inventory).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Equipped {
    #[serde(default)]
    pub weapon: Option<String>,
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub clothes: Option<String>,
    #[serde(default)]
    pub arm: Option<String>,
    #[serde(default)]
    pub shoes: Option<String>,
}

impl Equipped {
    #[must_use]
    pub fn get(&self, slot: EquipSlot) -> Option<&str> {
        let reference = match slot {
            EquipSlot::Weapon => &self.weapon,
            EquipSlot::Head => &self.head,
            EquipSlot::Clothes => &self.clothes,
            EquipSlot::Arm => &self.arm,
            EquipSlot::Shoes => &self.shoes,
        };
        reference.as_deref()
    }

    pub fn set(&mut self, slot: EquipSlot, item_id: Option<String>) {
        let reference = match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Head => &mut self.head,
            EquipSlot::Clothes => &mut self.clothes,
            EquipSlot::Arm => &mut self.arm,
            EquipSlot::Shoes => &mut self.shoes,
        };
        *reference = item_id;
    }

    fn clear_item(&mut self, item_id: &str) {
        let slots = [
            EquipSlot::Weapon,
            EquipSlot::Head,
            EquipSlot::Clothes,
            EquipSlot::Arm,
            EquipSlot::Shoes,
        ];
        for slot in slots {
            if self.get(slot) == Some(item_id) {
                self.set(slot, None);
            }
        }
    }
}

/// A participant in the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub stats: StatBlock,
    pub hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub inventory: Vec<ItemStack>,
    #[serde(default)]
    pub equipped: Equipped,
    #[serde(default)]
    pub effects: Vec<StatusEffect>,
    #[serde(default)]
    pub skill: SkillKind,
    #[serde(default)]
    pub credits: u32,
}

impl Actor {
    /// Full-health actor with no items, effects or skill.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        stats: StatBlock,
        max_hp: i32,
    ) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            id: id.into(),
            name: name.into(),
            stats,
            hp: max_hp,
            max_hp,
            inventory: Vec::new(),
            equipped: Equipped::default(),
            effects: Vec::new(),
            skill: SkillKind::None,
            credits: 0,
        }
    }

    #[must_use]
    pub const fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self
    }

    #[must_use]
    pub const fn with_skill(mut self, skill: SkillKind) -> Self {
        self.skill = skill;
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: ItemDef, qty: u32) -> Self {
        self.add_item(item, qty);
        self
    }

    /// Add an item to the inventory and reference it from `slot`.
    #[must_use]
    pub fn with_equipped(mut self, slot: EquipSlot, item: ItemDef) -> Self {
        let id = item.id.clone();
        self.add_item(item, 1);
        self.equipped.set(slot, Some(id));
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: StatusEffect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Current HP as a fraction of max HP (0 when max HP is not positive).
    #[must_use]
    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        f64::from(self.hp.max(0)) / f64::from(self.max_hp)
    }

    #[must_use]
    pub const fn missing_hp(&self) -> i32 {
        let missing = self.max_hp.saturating_sub(self.hp);
        if missing < 0 { 0 } else { missing }
    }

    /// Restore HP up to max, returning the amount actually applied.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let applied = amount.max(0).min(self.missing_hp());
        self.hp = self.hp.saturating_add(applied);
        applied
    }

    /// Reduce HP (it may drop below zero), returning the amount applied.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let applied = amount.max(0);
        self.hp = self.hp.saturating_sub(applied);
        applied
    }

    #[must_use]
    pub fn stack(&self, item_id: &str) -> Option<&ItemStack> {
        self.inventory
            .iter()
            .find(|stack| stack.item.id == item_id && stack.qty > 0)
    }

    /// Merge an item into the inventory by id.
    pub fn add_item(&mut self, item: ItemDef, qty: u32) {
        if qty == 0 {
            return;
        }
        if let Some(stack) = self.inventory.iter_mut().find(|stack| stack.item.id == item.id) {
            stack.qty = stack.qty.saturating_add(qty);
        } else {
            self.inventory.push(ItemStack::new(item, qty));
        }
    }

    /// Use one healing consumable, returning the item and HP restored.
    pub fn consume_healing_item(&mut self) -> Option<(ItemDef, i32)> {
        let idx = self
            .inventory
            .iter()
            .position(|stack| stack.qty > 0 && stack.item.is_healing())?;
        let stack = &mut self.inventory[idx];
        stack.qty -= 1;
        let item = stack.item.clone();
        if stack.qty == 0 {
            self.inventory.remove(idx);
            self.equipped.clear_item(&item.id);
        }
        let restored = self.heal(item.recovery_amount());
        Some((item, restored))
    }
}
