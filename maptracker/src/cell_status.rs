use anyhow::{Context, Result};
use log::error;
use maptracker_game::{MapCell, WorldData};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::classify::{classify_location, special_name, ClassifyContext, LocationStatus};
use crate::settings::TrackerSettings;

/// Roll-up of all tracked locations in a map cell, in increasing order of urgency.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display, Serialize, Deserialize,
)]
pub enum CellStatus {
    Untracked,
    Finished,
    AllUnreachable,
    SomeReachable,
    AllReachable,
    HintedAllUnreachable,
    HintedSomeReachable,
    HintedReachable,
}

impl CellStatus {
    /// Marker color drawn on the map.
    pub fn color(self) -> [u8; 3] {
        match self {
            CellStatus::Untracked => [0, 0, 0],
            CellStatus::Finished => [63, 63, 63],
            CellStatus::AllUnreachable => [207, 16, 16],
            CellStatus::SomeReachable => [255, 159, 32],
            CellStatus::AllReachable => [32, 255, 32],
            CellStatus::HintedAllUnreachable => [192, 16, 255],
            CellStatus::HintedSomeReachable => [32, 255, 255],
            CellStatus::HintedReachable => [48, 64, 255],
        }
    }
}

impl From<LocationStatus> for CellStatus {
    // Color used for a single selected location.
    fn from(status: LocationStatus) -> Self {
        match status {
            LocationStatus::Collected => CellStatus::Finished,
            LocationStatus::Reachable => CellStatus::AllReachable,
            LocationStatus::Unreachable => CellStatus::AllUnreachable,
            LocationStatus::HintedReachable => CellStatus::HintedReachable,
            LocationStatus::HintedUnreachable => CellStatus::HintedAllUnreachable,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

pub fn aggregate_cell(
    cell: &MapCell,
    settings: &TrackerSettings,
    cx: &ClassifyContext,
) -> Result<CellStatus> {
    let anchor = cell
        .anchor()
        .with_context(|| format!("Map cell {} has no locations", cell.key))?;
    let anchor = cx.world.get_location(anchor)?;
    let mut num_untracked = 0;
    let mut num_collected = 0;
    let mut num_reachable = 0;
    let mut num_unreachable = 0;
    let mut num_hinted = 0;

    for id in &cell.locations {
        let location = cx.world.get_location(id)?;
        if !settings.should_track(location) {
            num_untracked += 1;
            continue;
        }
        match classify_location(location, anchor, cx) {
            LocationStatus::HintedReachable => return Ok(CellStatus::HintedReachable),
            LocationStatus::Collected => num_collected += 1,
            LocationStatus::Reachable => num_reachable += 1,
            LocationStatus::Unreachable => num_unreachable += 1,
            LocationStatus::HintedUnreachable => num_hinted += 1,
        }
    }

    let num_tracked = cell.len() - num_untracked;
    if num_tracked == 0 {
        return Ok(CellStatus::Untracked);
    }
    if num_hinted > 0 {
        return Ok(if num_reachable > 0 {
            CellStatus::HintedSomeReachable
        } else {
            CellStatus::HintedAllUnreachable
        });
    }
    if num_collected == num_tracked {
        return Ok(CellStatus::Finished);
    }
    let num_remaining = num_tracked - num_collected;
    Ok(if num_reachable == num_remaining {
        CellStatus::AllReachable
    } else if num_unreachable == num_remaining {
        CellStatus::AllUnreachable
    } else {
        CellStatus::SomeReachable
    })
}

/// Status of one member of a cell, for the selected-location label.
pub fn classify_member(cell: &MapCell, idx: usize, cx: &ClassifyContext) -> LocationStatus {
    if idx >= cell.len() {
        error!("Location idx {} out of bounds for map cell {}", idx, cell.key);
        return LocationStatus::Unreachable;
    }
    let anchor = cell
        .anchor()
        .with_context(|| format!("Map cell {} has no locations", cell.key))
        .and_then(|id| cx.world.get_location(id));
    let (location, anchor) = match (cx.world.get_location(&cell.locations[idx]), anchor) {
        (Ok(location), Ok(anchor)) => (location, anchor),
        (Err(e), _) | (_, Err(e)) => {
            error!("{e:#}");
            return LocationStatus::Unreachable;
        }
    };
    classify_location(location, anchor, cx)
}

pub fn member_name(cell: &MapCell, idx: usize, world: &WorldData) -> String {
    if idx >= cell.len() {
        error!("Location idx {} out of bounds for map cell {}", idx, cell.key);
        return "???".to_string();
    }
    match world.get_location(&cell.locations[idx]) {
        Ok(location) => special_name(world, location).to_string(),
        Err(e) => {
            error!("{e:#}");
            "???".to_string()
        }
    }
}

/// Next member, stepping circularly in `direction`, that is tracked under `settings`.
/// With no current selection, the scan starts at the first member (or the last, going backward).
/// Returns `current` unchanged when no member qualifies.
pub fn next_selectable_index(
    cell: &MapCell,
    current: Option<usize>,
    direction: CycleDirection,
    settings: &TrackerSettings,
    world: &WorldData,
) -> Option<usize> {
    let len = cell.len();
    let mut idx = current.filter(|&i| i < len);
    for _ in 0..len {
        let next = match (idx, direction) {
            (None, CycleDirection::Forward) => 0,
            (None, CycleDirection::Backward) => len - 1,
            (Some(i), CycleDirection::Forward) => (i + 1) % len,
            (Some(0), CycleDirection::Backward) => len - 1,
            (Some(i), CycleDirection::Backward) => i - 1,
        };
        idx = Some(next);
        let tracked = world
            .get_location(&cell.locations[next])
            .map(|location| settings.should_track(location))
            .unwrap_or(false);
        if tracked {
            return idx;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FlagSet;
    use crate::traverse::{compute_reachability, DoorMap, Reachability};
    use maptracker_game::CellKey;
    use maptracker_logic::{Inventory, LogicSettings};
    use strum::IntoEnumIterator;

    fn test_world() -> Result<WorldData> {
        let doors = json::parse(
            r#"[
                { "id": "D17Z01S01[E]", "direction": 1, "originalDoor": "D17Z01S02[W]" },
                { "id": "D17Z01S02[W]", "direction": 3, "originalDoor": "D17Z01S01[E]" },
                { "id": "D17Z01S02[E]", "direction": 1, "originalDoor": "D17Z01S03[W]", "logic": "Key" },
                { "id": "D17Z01S03[W]", "direction": 3, "originalDoor": "D17Z01S02[E]" },
                { "id": "D02Z02S11[Elevator]", "direction": 5 },
                { "id": "D01Z02S03[Elevator]", "direction": 5 }
            ]"#,
        )?;
        let locations = json::parse(
            r#"[
                { "id": "A", "name": "Altar", "room": "D17Z01S02" },
                { "id": "B", "name": "Bridge", "room": "D17Z01S03" },
                { "id": "C", "name": "Chest", "room": "D17Z01S02" },
                { "id": "D", "name": "Door", "room": "D17Z01S03" },
                { "id": "SS01", "name": "Skill", "room": "D17Z01S03", "type": 1 },
                { "id": "RE401", "name": "Boots", "room": "D17Z01S03" }
            ]"#,
        )?;
        let items = json::parse("[]")?;
        let cells = json::parse("[]")?;
        WorldData::from_json(&doors, &locations, &items, &cells)
    }

    fn reachability(world: &WorldData) -> Result<Reachability> {
        let inventory = Inventory::new(LogicSettings::default());
        compute_reachability(world, &DoorMap::new(), "D17Z01S01[E]", inventory)
    }

    fn cell(ids: &[&str]) -> MapCell {
        MapCell {
            key: CellKey::new(0, 0),
            locations: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn aggregate<const N: usize>(ids: &[&str], flags: [&str; N]) -> Result<CellStatus> {
        let world = test_world()?;
        let reachability = reachability(&world)?;
        let flags = FlagSet::from(flags);
        let cx = ClassifyContext {
            world: &world,
            flags: &flags,
            reachability: &reachability,
        };
        aggregate_cell(&cell(ids), &TrackerSettings::default(), &cx)
    }

    #[test]
    fn test_hinted_reachable_dominates() -> Result<()> {
        assert_eq!(
            aggregate(&["B", "A", "C"], ["APHINT_A", "LOCATION_C"])?,
            CellStatus::HintedReachable
        );
        Ok(())
    }

    #[test]
    fn test_hinted_unreachable() -> Result<()> {
        assert_eq!(
            aggregate(&["A", "B"], ["APHINT_B"])?,
            CellStatus::HintedSomeReachable
        );
        assert_eq!(
            aggregate(&["B", "D"], ["APHINT_B"])?,
            CellStatus::HintedAllUnreachable
        );
        // A collected neighbour is not reachable.
        assert_eq!(
            aggregate(&["A", "B"], ["APHINT_B", "LOCATION_A"])?,
            CellStatus::HintedAllUnreachable
        );
        Ok(())
    }

    #[test]
    fn test_unhinted_cells() -> Result<()> {
        assert_eq!(aggregate(&["A", "C"], [])?, CellStatus::AllReachable);
        assert_eq!(aggregate(&["B", "D"], [])?, CellStatus::AllUnreachable);
        assert_eq!(aggregate(&["A", "B"], [])?, CellStatus::SomeReachable);
        assert_eq!(
            aggregate(&["A", "B"], ["LOCATION_A"])?,
            CellStatus::AllUnreachable
        );
        assert_eq!(
            aggregate(&["A", "B"], ["LOCATION_B"])?,
            CellStatus::AllReachable
        );
        Ok(())
    }

    #[test]
    fn test_all_collected() -> Result<()> {
        assert_eq!(
            aggregate(&["A", "B"], ["LOCATION_A", "APLOCATION_B"])?,
            CellStatus::Finished
        );
        Ok(())
    }

    #[test]
    fn test_sword_skill_uses_anchor_room() -> Result<()> {
        assert_eq!(aggregate(&["A", "SS01"], [])?, CellStatus::AllReachable);
        assert_eq!(aggregate(&["SS01"], [])?, CellStatus::AllUnreachable);
        Ok(())
    }

    #[test]
    fn test_untracked_members() -> Result<()> {
        let world = test_world()?;
        let reachability = reachability(&world)?;
        let flags = FlagSet::new();
        let cx = ClassifyContext {
            world: &world,
            flags: &flags,
            reachability: &reachability,
        };
        let settings = TrackerSettings {
            shuffle_boots_of_pleading: false,
            shuffle_sword_skills: false,
            ..TrackerSettings::default()
        };
        assert_eq!(
            aggregate_cell(&cell(&["RE401"]), &settings, &cx)?,
            CellStatus::Untracked
        );
        assert_eq!(
            aggregate_cell(&cell(&["RE401"]), &TrackerSettings::default(), &cx)?,
            CellStatus::AllUnreachable
        );
        assert_eq!(
            aggregate_cell(&cell(&["A", "RE401", "SS01"]), &settings, &cx)?,
            CellStatus::AllReachable
        );
        Ok(())
    }

    #[test]
    fn test_classify_member() -> Result<()> {
        let world = test_world()?;
        let reachability = reachability(&world)?;
        let flags = FlagSet::from(["APHINT_B"]);
        let cx = ClassifyContext {
            world: &world,
            flags: &flags,
            reachability: &reachability,
        };
        let c = cell(&["A", "B"]);
        assert_eq!(classify_member(&c, 0, &cx), LocationStatus::Reachable);
        assert_eq!(classify_member(&c, 1, &cx), LocationStatus::HintedUnreachable);
        assert_eq!(classify_member(&c, 2, &cx), LocationStatus::Unreachable);
        assert_eq!(member_name(&c, 1, &world), "Bridge");
        assert_eq!(member_name(&c, 2, &world), "???");
        Ok(())
    }

    #[test]
    fn test_empty_cell() -> Result<()> {
        let world = test_world()?;
        let reachability = reachability(&world)?;
        let flags = FlagSet::new();
        let cx = ClassifyContext {
            world: &world,
            flags: &flags,
            reachability: &reachability,
        };
        let empty = cell(&[]);
        assert_eq!(empty.anchor(), None);
        assert!(aggregate_cell(&empty, &TrackerSettings::default(), &cx).is_err());
        assert_eq!(classify_member(&empty, 0, &cx), LocationStatus::Unreachable);
        assert_eq!(member_name(&empty, 0, &world), "???");
        assert_eq!(
            next_selectable_index(&empty, None, CycleDirection::Forward, &TrackerSettings::default(), &world),
            None
        );
        Ok(())
    }

    #[test]
    fn test_next_selectable_index() -> Result<()> {
        let world = test_world()?;
        let settings = TrackerSettings {
            shuffle_boots_of_pleading: false,
            ..TrackerSettings::default()
        };
        let c = cell(&["A", "RE401", "C"]);
        let next =
            |current, direction| next_selectable_index(&c, current, direction, &settings, &world);
        assert_eq!(next(None, CycleDirection::Forward), Some(0));
        assert_eq!(next(Some(0), CycleDirection::Forward), Some(2));
        assert_eq!(next(Some(2), CycleDirection::Forward), Some(0));
        assert_eq!(next(Some(0), CycleDirection::Backward), Some(2));
        assert_eq!(next(Some(2), CycleDirection::Backward), Some(0));

        let untracked = cell(&["RE401"]);
        assert_eq!(
            next_selectable_index(&untracked, Some(0), CycleDirection::Forward, &settings, &world),
            Some(0)
        );
        assert_eq!(
            next_selectable_index(&untracked, None, CycleDirection::Backward, &settings, &world),
            None
        );
        Ok(())
    }

    #[test]
    fn test_colors_distinct() {
        let colors: Vec<[u8; 3]> = CellStatus::iter().map(|s| s.color()).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(
            CellStatus::from(LocationStatus::HintedUnreachable),
            CellStatus::HintedAllUnreachable
        );
    }
}
