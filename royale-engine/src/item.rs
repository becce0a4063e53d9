//! Canonical item definitions, inventory stacks and the item catalog.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{
    DEFAULT_FOOD_RECOVERY, DEFAULT_MEDICAL_RECOVERY, LEGENDARY_CORE_NAMES, RANGED_MARKERS,
    SCAVENGE_TIER,
};

/// Lower-cased item tags stored inline without additional allocations.
pub type ItemTags = SmallVec<[String; 4]>;

/// Broad item classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Weapon,
    Armor,
    Consumable,
    Material,
    #[default]
    Misc,
}

impl ItemKind {
    /// Resolve a free-form type name into a kind.
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "weapon" | "무기" => Self::Weapon,
            "armor" | "armour" | "방어구" => Self::Armor,
            "consumable" | "food" | "drink" | "medical" | "소모품" => Self::Consumable,
            "material" | "재료" => Self::Material,
            _ => Self::Misc,
        }
    }
}

/// Equipment slot names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipSlot {
    Weapon,
    Head,
    Clothes,
    Arm,
    Shoes,
}

impl EquipSlot {
    /// The four armor slots, in resolution order.
    pub const ARMOR: [Self; 4] = [Self::Head, Self::Clothes, Self::Arm, Self::Shoes];

    /// Parse a slot key, accepting common aliases.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "weapon" => Some(Self::Weapon),
            "head" | "helmet" => Some(Self::Head),
            "clothes" | "body" | "chest" => Some(Self::Clothes),
            "arm" | "arms" | "gloves" => Some(Self::Arm),
            "shoes" | "boots" | "leg" | "legs" => Some(Self::Shoes),
            _ => None,
        }
    }
}

/// Catalog-style numeric item stats. Missing fields contribute zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemStats {
    #[serde(default)]
    pub atk: f64,
    #[serde(default)]
    pub hp: f64,
    #[serde(default)]
    pub skill_amp: f64,
    #[serde(default)]
    pub atk_speed: f64,
    #[serde(default)]
    pub crit_chance: f64,
    #[serde(default)]
    pub cdr: f64,
    #[serde(default)]
    pub lifesteal: f64,
    #[serde(default)]
    pub move_speed: f64,
}

/// Canonical item definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: ItemKind,
    /// Raw type name (e.g. `pistol`, `bandage`), kept for display.
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub tags: ItemTags,
    #[serde(default)]
    pub tier: Option<u8>,
    #[serde(default)]
    pub stats: ItemStats,
    #[serde(default)]
    pub equip_slot: Option<EquipSlot>,
    /// HP restored when consumed.
    #[serde(default)]
    pub recovery: Option<i32>,
    #[serde(default)]
    pub value: u32,
}

impl ItemDef {
    /// Minimal definition used by builders and tests.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            type_name: String::new(),
            tags: ItemTags::new(),
            tier: None,
            stats: ItemStats::default(),
            equip_slot: None,
            recovery: None,
            value: 0,
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        for tag in tags {
            self.push_tag(tag);
        }
        self
    }

    #[must_use]
    pub const fn with_tier(mut self, tier: u8) -> Self {
        self.tier = Some(tier);
        self
    }

    #[must_use]
    pub const fn with_stats(mut self, stats: ItemStats) -> Self {
        self.stats = stats;
        self
    }

    #[must_use]
    pub const fn with_recovery(mut self, recovery: i32) -> Self {
        self.recovery = Some(recovery);
        self
    }

    /// Adds a lower-cased tag if it is not already present.
    pub fn push_tag(&mut self, tag: &str) {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || self.tags.iter().any(|existing| *existing == tag) {
            return;
        }
        self.tags.push(tag);
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing == tag)
    }

    /// Tier with the catalog default of 1 for untiered items.
    #[must_use]
    pub fn tier_or_default(&self) -> u8 {
        self.tier.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn is_weapon(&self) -> bool {
        self.kind == ItemKind::Weapon || self.has_tag("weapon")
    }

    #[must_use]
    pub fn is_ranged(&self) -> bool {
        self.tags
            .iter()
            .any(|tag| RANGED_MARKERS.contains(&tag.as_str()))
    }

    #[must_use]
    pub fn is_consumable(&self) -> bool {
        self.kind == ItemKind::Consumable
    }

    #[must_use]
    pub fn is_medical(&self) -> bool {
        self.has_tag("medical")
    }

    #[must_use]
    pub fn is_food(&self) -> bool {
        self.has_tag("food") || self.has_tag("drink")
    }

    /// Consumables that restore HP when used.
    #[must_use]
    pub fn is_healing(&self) -> bool {
        self.is_consumable() && (self.is_medical() || self.recovery.is_some_and(|hp| hp > 0))
    }

    /// HP restored on use, falling back to per-category defaults.
    #[must_use]
    pub fn recovery_amount(&self) -> i32 {
        match self.recovery {
            Some(hp) => hp.max(0),
            None if self.is_medical() => DEFAULT_MEDICAL_RECOVERY,
            None if self.is_food() => DEFAULT_FOOD_RECOVERY,
            None => 0,
        }
    }

    /// Rare crafting cores reserved for dedicated spawn systems.
    #[must_use]
    pub fn is_legendary_core(&self) -> bool {
        let name = self.name.trim().to_lowercase();
        LEGENDARY_CORE_NAMES.iter().any(|core| name == *core)
            || self.has_tag("special")
            || self.has_tag("legendary")
    }
}

/// A quantity of one item owned by an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemDef,
    pub qty: u32,
}

impl ItemStack {
    #[must_use]
    pub const fn new(item: ItemDef, qty: u32) -> Self {
        Self { item, qty }
    }
}

/// Flat list of item definitions queried by category predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemCatalog {
    #[serde(default)]
    pub items: Vec<ItemDef>,
}

impl ItemCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub const fn from_items(items: Vec<ItemDef>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ItemDef> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Medical consumables.
    #[must_use]
    pub fn medical(&self) -> Vec<&ItemDef> {
        self.items
            .iter()
            .filter(|item| item.is_consumable() && item.is_medical())
            .collect()
    }

    /// Food and drink consumables that are not medical supplies.
    #[must_use]
    pub fn food(&self) -> Vec<&ItemDef> {
        self.items
            .iter()
            .filter(|item| item.is_consumable() && item.is_food() && !item.is_medical())
            .collect()
    }

    /// Common tier-1 materials, excluding legendary cores.
    #[must_use]
    pub fn scavenge_materials(&self) -> Vec<&ItemDef> {
        self.items
            .iter()
            .filter(|item| {
                item.kind == ItemKind::Material
                    && item.tier_or_default() == SCAVENGE_TIER
                    && !item.is_legendary_core()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_items(vec![
            ItemDef::new("bandage", "Bandage", ItemKind::Consumable).with_tags(&["medical"]),
            ItemDef::new("bread", "Bread", ItemKind::Consumable).with_tags(&["food"]),
            ItemDef::new("herbal-tea", "Herbal Tea", ItemKind::Consumable)
                .with_tags(&["drink", "medical"]),
            ItemDef::new("stone", "Stone", ItemKind::Material).with_tier(1),
            ItemDef::new("iron-ore", "Iron Ore", ItemKind::Material).with_tier(2),
            ItemDef::new("meteorite", "Meteorite", ItemKind::Material).with_tier(1),
            ItemDef::new("rare-gem", "Rare Gem", ItemKind::Material).with_tags(&["special"]),
        ])
    }

    #[test]
    fn catalog_predicates_partition_items() {
        let catalog = catalog();
        let medical: Vec<_> = catalog.medical().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(medical, vec!["bandage", "herbal-tea"]);

        let food: Vec<_> = catalog.food().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(food, vec!["bread"]);

        let materials: Vec<_> = catalog
            .scavenge_materials()
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(materials, vec!["stone"]);
    }

    #[test]
    fn tags_are_normalized_and_deduplicated() {
        let item = ItemDef::new("p", "Pistol", ItemKind::Weapon).with_tags(&[" Gun ", "gun", ""]);
        assert_eq!(item.tags.len(), 1);
        assert!(item.is_ranged());
        assert!(item.is_weapon());
    }

    #[test]
    fn recovery_defaults_follow_category() {
        let bandage = ItemDef::new("b", "Bandage", ItemKind::Consumable).with_tags(&["medical"]);
        assert_eq!(bandage.recovery_amount(), DEFAULT_MEDICAL_RECOVERY);
        assert!(bandage.is_healing());

        let bread = ItemDef::new("r", "Bread", ItemKind::Consumable).with_tags(&["food"]);
        assert_eq!(bread.recovery_amount(), DEFAULT_FOOD_RECOVERY);
        assert!(!bread.is_healing());
        assert!(bread.clone().with_recovery(5).is_healing());
    }

    #[test]
    fn slot_keys_accept_aliases() {
        assert_eq!(EquipSlot::from_key("Helmet"), Some(EquipSlot::Head));
        assert_eq!(EquipSlot::from_key("boots"), Some(EquipSlot::Shoes));
        assert_eq!(EquipSlot::from_key("ring"), None);
        assert_eq!(ItemKind::from_type_name("Weapon"), ItemKind::Weapon);
        assert_eq!(ItemKind::from_type_name("gadget"), ItemKind::Misc);
    }
}
