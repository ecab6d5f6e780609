use anyhow::Result;
use json::JsonValue;
use maptracker::classify::{is_collected, is_hinted};
use maptracker::flags::{awarded_flag, hint_flag, FlagSet};
use maptracker_game::{AliasGroup, SpecialLocations, WorldData};
use strum::IntoEnumIterator;

/// A world holding every alias group member, all in one room.
fn alias_world() -> Result<WorldData> {
    let special = SpecialLocations::standard()?;
    let mut locations = JsonValue::new_array();
    for group in AliasGroup::iter() {
        for id in special.members(group) {
            let mut location = JsonValue::new_object();
            location["id"] = id.as_str().into();
            location["room"] = "D01Z01S01".into();
            locations.push(location)?;
        }
    }
    let empty = JsonValue::new_array();
    WorldData::from_json(&empty, &locations, &empty, &empty)
}

#[test]
fn test_hint_covers_whole_group() -> Result<()> {
    let world = alias_world()?;
    for group in AliasGroup::iter() {
        let members = world.special.members(group);
        assert!(members.len() >= 2, "{group}");
        for hinted in members {
            let mut flags = FlagSet::new();
            flags.set_flag(&hint_flag(hinted));
            for id in members {
                let location = world.get_location(id)?;
                assert!(is_hinted(&world, location, &flags), "{hinted} -> {id}");
                assert!(!is_collected(&world, location, &flags), "{id}");
            }

            // Collecting the hinted copy ends the hint for its siblings only.
            flags.set_flag(&format!("LOCATION_{hinted}"));
            for id in members {
                let location = world.get_location(id)?;
                assert_eq!(is_hinted(&world, location, &flags), id == hinted, "{hinted} -> {id}");
                assert_eq!(is_collected(&world, location, &flags), id == hinted, "{id}");
            }
        }
    }
    Ok(())
}

#[test]
fn test_awarded_flag_ignored_for_groups() -> Result<()> {
    let world = alias_world()?;
    for group in AliasGroup::iter() {
        let mut flags = FlagSet::new();
        for id in world.special.members(group) {
            flags.set_flag(&awarded_flag(id));
        }
        for id in world.special.members(group) {
            assert!(!is_collected(&world, world.get_location(id)?, &flags), "{id}");
        }
    }
    Ok(())
}
