use std::path::Path;

use anyhow::{Context, Result};
use maptracker_game::{ItemLocation, LocationType, LOCATION_BOOTS_OF_PLEADING, LOCATION_PURIFIED_HAND};
use maptracker_logic::LogicSettings;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TrackerSettings {
    pub starting_door: String,
    pub shuffle_sword_skills: bool,
    pub shuffle_thorns: bool,
    pub shuffle_boots_of_pleading: bool,
    pub shuffle_purified_hand: bool,
    pub shuffle_dash: bool,
    pub shuffle_wall_climb: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        TrackerSettings {
            starting_door: "D17Z01S01[E]".to_string(),
            shuffle_sword_skills: true,
            shuffle_thorns: true,
            shuffle_boots_of_pleading: true,
            shuffle_purified_hand: true,
            shuffle_dash: true,
            shuffle_wall_climb: true,
        }
    }
}

impl TrackerSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let settings_str = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        serde_json::from_str(&settings_str)
            .with_context(|| format!("unable to parse {}", path.display()))
    }

    pub fn logic_settings(&self) -> LogicSettings {
        LogicSettings {
            shuffle_dash: self.shuffle_dash,
            shuffle_wall_climb: self.shuffle_wall_climb,
        }
    }

    /// Whether the location holds a randomized item under these settings.
    pub fn should_track(&self, location: &ItemLocation) -> bool {
        if !self.shuffle_sword_skills && location.location_type == LocationType::SwordSkill {
            return false;
        }
        if !self.shuffle_thorns && location.location_type == LocationType::Thorn {
            return false;
        }
        if !self.shuffle_boots_of_pleading && location.id == LOCATION_BOOTS_OF_PLEADING {
            return false;
        }
        if !self.shuffle_purified_hand && location.id == LOCATION_PURIFIED_HAND {
            return false;
        }
        true
    }
}
