use std::path::Path;

use anyhow::{Context, Result};
use hashbrown::HashSet;
use maptracker_game::ItemLocation;
use serde::{Deserialize, Serialize};

/// Read access to the game's persisted event flags.
pub trait FlagStore {
    fn get_flag(&self, key: &str) -> bool;
}

/// Flag recording that the item at a location was picked up in game.
pub fn location_flag(location: &ItemLocation) -> String {
    match &location.location_flag {
        Some(flag) => flag.split('~').next().unwrap_or(flag).to_string(),
        None => format!("LOCATION_{}", location.id),
    }
}

/// Flag recording that a location's item was awarded from outside the game.
pub fn awarded_flag(location_id: &str) -> String {
    format!("APLOCATION_{location_id}")
}

pub fn hint_flag(location_id: &str) -> String {
    format!("APHINT_{location_id}")
}

pub fn item_flag(item_id: &str) -> String {
    format!("ITEM_{item_id}")
}

/// In-memory flag snapshot, e.g. loaded from a JSON list of set flags.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct FlagSet {
    flags: HashSet<String>,
}

impl FlagSet {
    pub fn new() -> Self {
        FlagSet::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let flags_str = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        serde_json::from_str(&flags_str)
            .with_context(|| format!("unable to parse {}", path.display()))
    }

    pub fn set_flag(&mut self, key: &str) {
        self.flags.insert(key.to_string());
    }

    pub fn clear_flag(&mut self, key: &str) {
        self.flags.remove(key);
    }
}

impl FlagStore for FlagSet {
    fn get_flag(&self, key: &str) -> bool {
        self.flags.contains(key)
    }
}

impl<const N: usize> From<[&str; N]> for FlagSet {
    fn from(keys: [&str; N]) -> Self {
        let mut flags = FlagSet::new();
        for key in keys {
            flags.set_flag(key);
        }
        flags
    }
}
