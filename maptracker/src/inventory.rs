use std::path::Path;

use anyhow::{Context, Result};
use maptracker_game::{ItemType, WorldData};
use maptracker_logic::{Inventory, LogicSettings};
use serde::{Deserialize, Serialize};

use crate::flags::{item_flag, FlagStore};

/// Player progress that the game tracks as counters rather than flags.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProgressCounters {
    pub rescued_cherubs: usize,
    pub life_upgrades: usize,
    pub fervour_upgrades: usize,
    pub strength_upgrades: usize,
}

impl ProgressCounters {
    pub fn load(path: &Path) -> Result<Self> {
        let counters_str = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        serde_json::from_str(&counters_str)
            .with_context(|| format!("unable to parse {}", path.display()))
    }
}

/// Rebuilds the inventory of obtained items from the game's flags and counters.
/// Doors are not included: the reachability pass adds them.
pub fn build_base_inventory(
    world: &WorldData,
    flags: &dyn FlagStore,
    counters: &ProgressCounters,
    settings: LogicSettings,
) -> Inventory {
    let mut inventory = Inventory::new(settings);
    for item in &world.items {
        let copies = match item.item_type {
            ItemType::Bead
            | ItemType::Prayer
            | ItemType::Relic
            | ItemType::Heart
            | ItemType::Bone
            | ItemType::QuestItem
            | ItemType::SwordSkill
            | ItemType::Special => {
                if item.sub_items.is_empty() {
                    flags.get_flag(&item_flag(&item.id)) as usize
                } else {
                    item.sub_items
                        .iter()
                        .filter(|sub_id| flags.get_flag(&item_flag(sub_id)))
                        .count()
                }
            }
            ItemType::Cherub => counters.rescued_cherubs,
            ItemType::Life => counters.life_upgrades,
            ItemType::Fervour => counters.fervour_upgrades,
            ItemType::Strength => counters.strength_upgrades,
            ItemType::Tears => 0,
        };
        for _ in 0..copies {
            inventory.add_item(&item.id);
        }
    }
    inventory
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FlagSet;

    #[test]
    fn test_build_base_inventory() -> Result<()> {
        let items = json::parse(
            r#"[
                { "id": "RB01", "type": 0 },
                { "id": "PR01", "type": 1 },
                { "id": "COMBO", "type": 11, "subItems": ["COMBO1", "COMBO2", "COMBO3"] },
                { "id": "CH", "type": 6 },
                { "id": "LU", "type": 7 },
                { "id": "TE", "type": 10 }
            ]"#,
        )?;
        let empty = json::parse("[]")?;
        let world = WorldData::from_json(&empty, &empty, &items, &empty)?;
        let flags = FlagSet::from(["ITEM_RB01", "ITEM_COMBO1", "ITEM_COMBO3", "ITEM_TE"]);
        let counters = ProgressCounters {
            rescued_cherubs: 3,
            life_upgrades: 2,
            ..ProgressCounters::default()
        };
        let settings = LogicSettings {
            shuffle_dash: false,
            shuffle_wall_climb: true,
        };

        let inventory = build_base_inventory(&world, &flags, &counters, settings);
        assert_eq!(inventory.count("RB01"), 1);
        assert_eq!(inventory.count("PR01"), 0);
        assert_eq!(inventory.count("COMBO"), 2);
        assert_eq!(inventory.count("CH"), 3);
        assert_eq!(inventory.count("LU"), 2);
        assert_eq!(inventory.count("TE"), 0);
        assert!(inventory.has("Slide"));
        assert!(!inventory.has("WallClimb"));
        Ok(())
    }
}
