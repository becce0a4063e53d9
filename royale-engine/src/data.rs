//! Data ingestion: lenient raw records normalized into canonical engine types.
//!
//! Collaborator data arrives with field aliases (`_id`, `maxHp`, `dotDamage`
//! vs `dot`, `price`/`gold`/`value`), numbers encoded as strings and missing
//! fields. Everything is resolved here, once; the engine never sees raw input.
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::actor::{Actor, Stat, StatBlock};
use crate::constants::DEFAULT_MAX_HP;
use crate::effects::StatusEffect;
use crate::flavor::{FlavorDeck, FlavorEvent, FlavorKind};
use crate::item::{EquipSlot, ItemCatalog, ItemDef, ItemKind, ItemStats};
use crate::numbers::round_f64_to_i32;
use crate::ruleset::{Ruleset, RulesetError};
use crate::skills::SkillKind;

/// Errors raised while loading match data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to parse {what} JSON: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate actor id `{0}` in roster")]
    DuplicateActor(String),
    #[error(transparent)]
    Ruleset(#[from] RulesetError),
}

fn parse_value(json: &str, what: &'static str) -> Result<Value, DataError> {
    serde_json::from_str(json).map_err(|source| DataError::Parse { what, source })
}

/// Top-level record list: either a bare array or an object wrapping one.
fn records(value: Value, keys: &[&str]) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => keys
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn int_or(value: &Value, fallback: i32) -> i32 {
    number(value).map_or(fallback, round_f64_to_i32)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

fn stat_for_key(key: &str) -> Option<Stat> {
    match key.trim().to_lowercase().as_str() {
        "str" | "strength" | "힘" => Some(Stat::Str),
        "agi" | "agility" | "민첩" => Some(Stat::Agi),
        "int" | "intellect" | "intelligence" | "지능" => Some(Stat::Int),
        "men" | "mental" | "mentality" | "정신" => Some(Stat::Men),
        "luk" | "luck" | "행운" => Some(Stat::Luk),
        "dex" | "dexterity" | "손재주" => Some(Stat::Dex),
        "sht" | "shooting" | "사격" => Some(Stat::Sht),
        "end" | "endurance" | "인내" => Some(Stat::End),
        _ => None,
    }
}

/// Stat block from any map of stat keys; malformed values count as zero.
fn stat_block(map: &Map<String, Value>) -> StatBlock {
    let mut block = StatBlock::default();
    for (key, value) in map {
        if let Some(stat) = stat_for_key(key) {
            *block.get_mut(stat) = int_or(value, 0);
        }
    }
    block
}

fn item_stats(map: &Map<String, Value>) -> ItemStats {
    let mut stats = ItemStats::default();
    for (key, value) in map {
        let amount = number(value).unwrap_or(0.0);
        let field = match key.as_str() {
            "atk" | "attack" => &mut stats.atk,
            "hp" | "health" => &mut stats.hp,
            "skillAmp" | "skill_amp" => &mut stats.skill_amp,
            "atkSpeed" | "atk_speed" | "attackSpeed" => &mut stats.atk_speed,
            "critChance" | "crit_chance" | "crit" => &mut stats.crit_chance,
            "cdr" | "cooldownReduction" => &mut stats.cdr,
            "lifesteal" | "lifeSteal" => &mut stats.lifesteal,
            "moveSpeed" | "move_speed" => &mut stats.move_speed,
            _ => continue,
        };
        *field = amount;
    }
    stats
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawItem {
    #[serde(alias = "_id", alias = "itemId")]
    id: Value,
    name: Value,
    #[serde(rename = "type", alias = "category")]
    type_name: Value,
    tags: Value,
    tier: Value,
    stats: Value,
    #[serde(alias = "equipSlot", alias = "slot")]
    equip_slot: Value,
    #[serde(alias = "recover", alias = "heal", alias = "hpRecovery")]
    recovery: Value,
    price: Value,
    gold: Value,
    value: Value,
}

impl RawItem {
    fn normalize(self) -> Option<ItemDef> {
        let id = text(&self.id).or_else(|| text(&self.name).map(|name| slug(&name)))?;
        let name = text(&self.name).unwrap_or_else(|| id.clone());
        let type_name = text(&self.type_name).unwrap_or_default();

        let mut item = ItemDef::new(id, name, ItemKind::from_type_name(&type_name));
        match &self.tags {
            Value::Array(tags) => tags.iter().filter_map(text).for_each(|tag| item.push_tag(&tag)),
            Value::String(tags) => tags.split(',').for_each(|tag| item.push_tag(tag)),
            _ => {}
        }
        item.push_tag(&type_name);
        item.type_name = type_name;
        item.equip_slot = text(&self.equip_slot).and_then(|key| EquipSlot::from_key(&key));
        if item.kind == ItemKind::Misc {
            item.kind = infer_kind(&item);
        }

        item.tier = number(&self.tier)
            .map(round_f64_to_i32)
            .and_then(|tier| u8::try_from(tier.clamp(1, 6)).ok());
        if let Some(stats) = self.stats.as_object() {
            item.stats = item_stats(stats);
        }
        item.recovery = number(&self.recovery).map(round_f64_to_i32);
        item.value = [&self.price, &self.gold, &self.value]
            .into_iter()
            .find_map(number)
            .map_or(0, |value| u32::try_from(round_f64_to_i32(value).max(0)).unwrap_or(0));
        Some(item)
    }
}

fn infer_kind(item: &ItemDef) -> ItemKind {
    if item.has_tag("weapon") || item.is_ranged() || item.equip_slot == Some(EquipSlot::Weapon) {
        ItemKind::Weapon
    } else if item.equip_slot.is_some() || item.has_tag("armor") {
        ItemKind::Armor
    } else if item.is_medical() || item.is_food() {
        ItemKind::Consumable
    } else if item.has_tag("material") {
        ItemKind::Material
    } else {
        ItemKind::Misc
    }
}

fn item_from_value(value: Value) -> Option<ItemDef> {
    serde_json::from_value::<RawItem>(value)
        .ok()
        .and_then(RawItem::normalize)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEffect {
    name: Value,
    #[serde(alias = "remainingDuration", alias = "remaining_duration", alias = "duration")]
    remaining: Value,
    #[serde(alias = "statModifiers", alias = "stat_modifiers")]
    modifiers: Value,
    #[serde(alias = "dotDamage")]
    dot_damage: Value,
    dot: Value,
}

impl RawEffect {
    fn normalize(self) -> Option<StatusEffect> {
        let name = text(&self.name)?;
        let remaining = u32::try_from(int_or(&self.remaining, 0).max(0)).unwrap_or(0);
        let mut effect = StatusEffect::new(name, remaining);
        if let Some(modifiers) = self.modifiers.as_object() {
            effect.modifiers = stat_block(modifiers);
        }
        effect.dot_damage = number(&self.dot_damage)
            .or_else(|| number(&self.dot))
            .map(|dot| round_f64_to_i32(dot).max(0));
        Some(effect)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawActor {
    #[serde(alias = "_id")]
    id: Value,
    name: Value,
    stats: Value,
    hp: Value,
    #[serde(alias = "maxHp", alias = "maxHP")]
    max_hp: Value,
    inventory: Value,
    #[serde(alias = "equipment")]
    equipped: Value,
    #[serde(alias = "activeEffects", alias = "statusEffects")]
    effects: Value,
    #[serde(alias = "specialSkill")]
    skill: Value,
    #[serde(alias = "gold", alias = "money")]
    credits: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RawActor {
    fn normalize(self, index: usize, catalog: &ItemCatalog) -> Actor {
        let id = text(&self.id)
            .or_else(|| text(&self.name).map(|name| slug(&name)))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("actor-{}", index + 1));
        let name = text(&self.name).unwrap_or_else(|| id.clone());
        let stats = self
            .stats
            .as_object()
            .filter(|map| !map.is_empty())
            .map_or_else(|| stat_block(&self.extra), stat_block);
        let max_hp = if self.max_hp.is_null() {
            DEFAULT_MAX_HP
        } else {
            int_or(&self.max_hp, 1).max(1)
        };

        let mut actor = Actor::new(id, name, stats, max_hp);
        actor.hp = int_or(&self.hp, max_hp).min(max_hp);
        actor.skill = skill_kind(&self.skill);
        actor.credits = u32::try_from(int_or(&self.credits, 0).max(0)).unwrap_or(0);

        for entry in self.inventory.as_array().into_iter().flatten() {
            if let Some((item, qty)) = inventory_entry(entry, catalog) {
                actor.add_item(item, qty);
            }
        }
        if let Some(slots) = self.equipped.as_object() {
            for (key, reference) in slots {
                if let Some(slot) = EquipSlot::from_key(key) {
                    equip_reference(&mut actor, slot, reference, catalog);
                }
            }
        }
        actor.effects = self
            .effects
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|raw| serde_json::from_value::<RawEffect>(raw.clone()).ok())
            .filter_map(RawEffect::normalize)
            .collect();
        actor
    }
}

fn skill_kind(value: &Value) -> SkillKind {
    match value {
        Value::String(name) => SkillKind::from_name(name),
        Value::Object(map) => map.get("name").and_then(text).map_or(SkillKind::None, |name| {
            SkillKind::from_name(&name)
        }),
        _ => SkillKind::None,
    }
}

fn catalog_lookup<'a>(catalog: &'a ItemCatalog, reference: &str) -> Option<&'a ItemDef> {
    catalog
        .find(reference)
        .or_else(|| catalog.items.iter().find(|item| item.name == reference))
}

fn inventory_entry(entry: &Value, catalog: &ItemCatalog) -> Option<(ItemDef, u32)> {
    match entry {
        Value::String(reference) => {
            catalog_lookup(catalog, reference.trim()).map(|item| (item.clone(), 1))
        }
        Value::Object(map) => {
            let qty = map
                .get("qty")
                .or_else(|| map.get("quantity"))
                .or_else(|| map.get("count"))
                .map_or(1, |value| int_or(value, 1));
            if qty <= 0 {
                return None;
            }
            let item = match map.get("item") {
                Some(Value::Object(inner)) => item_from_value(Value::Object(inner.clone())),
                Some(Value::String(reference)) => catalog_lookup(catalog, reference).cloned(),
                _ => item_from_value(entry.clone()),
            }?;
            Some((item, u32::try_from(qty).unwrap_or(1)))
        }
        _ => None,
    }
}

fn equip_reference(actor: &mut Actor, slot: EquipSlot, reference: &Value, catalog: &ItemCatalog) {
    let resolved = match reference {
        Value::String(key) => {
            let key = key.trim();
            let owned = actor
                .inventory
                .iter()
                .find(|stack| stack.item.id == key || stack.item.name == key)
                .map(|stack| stack.item.id.clone());
            owned.or_else(|| {
                let item = catalog_lookup(catalog, key)?.clone();
                let id = item.id.clone();
                actor.add_item(item, 1);
                Some(id)
            })
        }
        Value::Object(_) => item_from_value(reference.clone()).map(|item| {
            let id = item.id.clone();
            if actor.stack(&id).is_none() {
                actor.add_item(item, 1);
            }
            id
        }),
        _ => None,
    };
    if resolved.is_none() && !reference.is_null() {
        log::debug!("dropping unresolved {slot:?} reference on {}", actor.id);
    }
    actor.equipped.set(slot, resolved);
}

/// Parse an item catalog from a bare array or `{ "items": [...] }`.
///
/// # Errors
///
/// Returns an error if the input is not valid JSON.
pub fn parse_catalog(json: &str) -> Result<ItemCatalog, DataError> {
    let mut items: Vec<ItemDef> = Vec::new();
    for item in records(parse_value(json, "catalog")?, &["items", "catalog"])
        .into_iter()
        .filter_map(item_from_value)
    {
        if items.iter().any(|existing| existing.id == item.id) {
            log::debug!("skipping duplicate catalog item {}", item.id);
            continue;
        }
        items.push(item);
    }
    Ok(ItemCatalog::from_items(items))
}

/// Parse a roster, resolving bare item references against `catalog`.
///
/// # Errors
///
/// Returns an error on invalid JSON or when two actors share an id.
pub fn parse_roster(json: &str, catalog: &ItemCatalog) -> Result<Vec<Actor>, DataError> {
    let raw = records(parse_value(json, "roster")?, &["characters", "roster", "actors"]);
    let mut roster: Vec<Actor> = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        let Ok(record) = serde_json::from_value::<RawActor>(value) else {
            log::debug!("skipping malformed roster entry {index}");
            continue;
        };
        let actor = record.normalize(index, catalog);
        if roster.iter().any(|existing| existing.id == actor.id) {
            return Err(DataError::DuplicateActor(actor.id));
        }
        roster.push(actor);
    }
    Ok(roster)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFlavor {
    #[serde(alias = "message", alias = "template")]
    text: Value,
    #[serde(rename = "type", alias = "kind")]
    kind: Value,
}

/// Parse flavor templates from a bare array or `{ "events": [...] }`.
///
/// # Errors
///
/// Returns an error if the input is not valid JSON.
pub fn parse_flavor(json: &str) -> Result<FlavorDeck, DataError> {
    let events = records(parse_value(json, "flavor")?, &["events", "flavor"])
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RawFlavor>(value).ok())
        .filter_map(|raw| {
            let text = text(&raw.text)?;
            let kind = match text_lower(&raw.kind).as_deref() {
                Some("death" | "사망") => FlavorKind::Death,
                _ => FlavorKind::Normal,
            };
            Some(FlavorEvent::new(text, kind))
        })
        .collect();
    Ok(FlavorDeck::new(events))
}

fn text_lower(value: &Value) -> Option<String> {
    text(value).map(|s| s.to_lowercase())
}

/// Parse and validate a ruleset.
///
/// # Errors
///
/// Returns an error on invalid JSON or out-of-range tuning values.
pub fn parse_ruleset(json: &str) -> Result<Ruleset, DataError> {
    Ok(Ruleset::from_json(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;

    fn catalog() -> ItemCatalog {
        parse_catalog(
            r#"{"items": [
                {"_id": "knife", "name": "Knife", "type": "weapon", "tier": "2", "stats": {"atk": "4", "critChance": 0.1}},
                {"name": "First Aid Kit", "type": "consumable", "tags": "medical, Heal", "recover": 30, "gold": "12"},
                {"id": "knife", "name": "Duplicate Knife"},
                {"type": "material"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn catalog_normalizes_aliases_and_strings() {
        let catalog = catalog();
        assert_eq!(catalog.items.len(), 2);
        let knife = catalog.find("knife").unwrap();
        assert_eq!(knife.kind, ItemKind::Weapon);
        assert_eq!(knife.tier, Some(2));
        assert!((knife.stats.atk - 4.0).abs() < f64::EPSILON);
        assert!(knife.is_weapon());

        let kit = catalog.find("first-aid-kit").unwrap();
        assert!(kit.is_medical());
        assert!(kit.has_tag("heal"));
        assert_eq!(kit.recovery, Some(30));
        assert_eq!(kit.value, 12);
    }

    #[test]
    fn roster_normalizes_actor_shapes() {
        let roster = parse_roster(
            r#"[
                {"_id": "c1", "name": "Mina", "stats": {"str": "12", "AGI": 9, "luck": 4},
                 "hp": 150, "maxHp": "120", "specialSkill": {"name": "드론 지원"},
                 "inventory": ["knife", {"item": "First Aid Kit", "quantity": 2}, "ghost-item"],
                 "equipped": {"weapon": "Knife", "helmet": {"name": "Pot Lid", "type": "armor", "tier": 1}},
                 "activeEffects": [
                    {"name": "Bleeding", "remainingDuration": 2, "dot": 4},
                    {"name": "Weakened", "duration": -3, "statModifiers": {"str": -2}}
                 ]},
                {"name": "Jun", "str": 7, "maxHp": "abc", "gold": 5}
            ]"#,
            &catalog(),
        )
        .unwrap();

        let mina = &roster[0];
        assert_eq!(mina.id, "c1");
        assert_eq!(mina.stats.strength, 12);
        assert_eq!(mina.stats.agility, 9);
        assert_eq!(mina.stats.luck, 4);
        assert_eq!(mina.stats.shooting, 0);
        assert_eq!(mina.max_hp, 120);
        assert_eq!(mina.hp, 120);
        assert_eq!(mina.skill, SkillKind::DroneSupport);
        assert_eq!(mina.stack("first-aid-kit").map(|s| s.qty), Some(2));
        assert_eq!(mina.inventory.len(), 3);
        assert_eq!(mina.equipped.get(EquipSlot::Weapon), Some("knife"));
        assert_eq!(mina.equipped.get(EquipSlot::Head), Some("pot-lid"));
        assert_eq!(mina.effects[0].dot_damage, Some(4));
        assert_eq!(mina.effects[0].kind, EffectKind::Bleeding);
        assert_eq!(mina.effects[1].remaining, 0);
        assert_eq!(mina.effects[1].modifiers.strength, -2);

        let jun = &roster[1];
        assert_eq!(jun.id, "jun");
        assert_eq!(jun.stats.strength, 7);
        assert_eq!(jun.max_hp, 1);
        assert_eq!(jun.credits, 5);
        assert_eq!(jun.skill, SkillKind::None);
    }

    #[test]
    fn dot_damage_and_dot_are_synonyms() {
        let roster = parse_roster(
            r#"[{"id": "a", "effects": [
                {"name": "Burn", "remaining": 1, "dotDamage": 6, "dot": 1},
                {"name": "Poison", "remaining": 1}
            ]}]"#,
            &ItemCatalog::empty(),
        )
        .unwrap();
        let effects = &roster[0].effects;
        assert_eq!(effects[0].dot_damage, Some(6));
        assert_eq!(effects[1].dot_damage, None);
        assert_eq!(effects[1].tick_damage(), 3);
        assert_eq!(roster[0].max_hp, DEFAULT_MAX_HP);
    }

    #[test]
    fn duplicate_ids_and_bad_json_are_errors() {
        let err = parse_roster(r#"[{"id": "x"}, {"id": "x"}]"#, &ItemCatalog::empty()).unwrap_err();
        assert!(matches!(err, DataError::DuplicateActor(id) if id == "x"));
        assert!(matches!(
            parse_catalog("{").unwrap_err(),
            DataError::Parse { what: "catalog", .. }
        ));
        assert!(matches!(
            parse_ruleset(r#"{"battle": {"skill_bonus_cap": -1}}"#).unwrap_err(),
            DataError::Ruleset(_)
        ));
    }

    #[test]
    fn flavor_accepts_wrapped_lists() {
        let deck = parse_flavor(
            r#"{"events": [
                {"text": "{1} and {2} share a meal.", "type": "normal"},
                {"message": "{1} eliminated {2}.", "kind": "DEATH"},
                {"text": "   "}
            ]}"#,
        )
        .unwrap();
        assert_eq!(deck.events.len(), 2);
        assert_eq!(deck.count(FlavorKind::Death), 1);
    }
}
