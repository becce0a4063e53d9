use anyhow::{Context, Result};
use royale_engine::{
    Actor, DataLoader, EmbeddedAssets, FlavorDeck, ItemCatalog, Ruleset, parse_catalog,
    parse_flavor, parse_roster, parse_ruleset,
};
use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};

/// Optional overrides for each input file. `None` uses the embedded fixture.
#[derive(Debug, Clone, Default)]
pub struct AssetPaths {
    pub roster: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub flavor: Option<PathBuf>,
    pub ruleset: Option<PathBuf>,
}

/// Parsed match inputs, loaded once and shared by every simulated match.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    catalog: ItemCatalog,
    roster: Vec<Actor>,
    flavor: FlavorDeck,
    ruleset: Ruleset,
}

impl TesterAssets {
    pub fn load(paths: &AssetPaths) -> Result<Self> {
        let catalog_json = read_or(paths.catalog.as_deref(), EmbeddedAssets::CATALOG)?;
        let catalog = parse_catalog(&catalog_json).context("parsing item catalog")?;

        let roster_json = read_or(paths.roster.as_deref(), EmbeddedAssets::ROSTER)?;
        let roster = parse_roster(&roster_json, &catalog).context("parsing roster")?;

        let flavor_json = read_or(paths.flavor.as_deref(), EmbeddedAssets::FLAVOR)?;
        let flavor = parse_flavor(&flavor_json).context("parsing flavor templates")?;

        let ruleset_json = read_or(paths.ruleset.as_deref(), EmbeddedAssets::RULESET)?;
        let ruleset = parse_ruleset(&ruleset_json).context("parsing ruleset")?;

        log::debug!(
            "loaded {} actors, {} items, {} flavor templates, ruleset `{}`",
            roster.len(),
            catalog.items.len(),
            flavor.events.len(),
            ruleset.id
        );
        Ok(Self {
            catalog,
            roster,
            flavor,
            ruleset,
        })
    }

    #[cfg(test)]
    pub fn load_default() -> Result<Self> {
        Self::load(&AssetPaths::default())
    }

    pub fn roster_size(&self) -> usize {
        self.roster.len()
    }

    pub fn ruleset_id(&self) -> &str {
        &self.ruleset.id
    }
}

fn read_or(path: Option<&Path>, embedded: &str) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => Ok(embedded.to_string()),
    }
}

impl DataLoader for TesterAssets {
    type Error = Infallible;

    fn load_catalog(&self) -> Result<ItemCatalog, Self::Error> {
        Ok(self.catalog.clone())
    }

    fn load_roster(&self, _catalog: &ItemCatalog) -> Result<Vec<Actor>, Self::Error> {
        Ok(self.roster.clone())
    }

    fn load_flavor(&self) -> Result<FlavorDeck, Self::Error> {
        Ok(self.flavor.clone())
    }

    fn load_ruleset(&self) -> Result<Ruleset, Self::Error> {
        Ok(self.ruleset.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_assets_use_embedded_fixtures() {
        let assets = TesterAssets::load_default().unwrap();
        assert_eq!(assets.roster_size(), 8);
        assert_eq!(assets.ruleset_id(), "standard");
    }

    #[test]
    fn missing_override_reports_path() {
        let paths = AssetPaths {
            roster: Some(PathBuf::from("/definitely/not/here.json")),
            ..AssetPaths::default()
        };
        let err = TesterAssets::load(&paths).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }

    #[test]
    fn override_files_replace_fixtures() {
        let path = std::env::temp_dir().join("royale-tester-ruleset-override.json");
        fs::write(&path, r#"{ "id": "blitz", "phase": { "battle_base": 0.9 } }"#).unwrap();
        let assets = TesterAssets::load(&AssetPaths {
            ruleset: Some(path),
            ..AssetPaths::default()
        })
        .unwrap();
        assert_eq!(assets.ruleset_id(), "blitz");
    }
}
