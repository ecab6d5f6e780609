use maptracker_game::{ItemLocation, LocationType, WorldData};
use maptracker_logic::{Inventory, Requirement};
use serde::Serialize;
use strum_macros::{Display, EnumIter};

use crate::flags::{awarded_flag, hint_flag, location_flag, FlagStore};
use crate::traverse::{Reachability, VisibleRooms};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, Display, Serialize)]
pub enum LocationStatus {
    Collected,
    Reachable,
    Unreachable,
    HintedReachable,
    HintedUnreachable,
}

/// Everything needed to classify locations against one reachability snapshot.
#[derive(Clone, Copy)]
pub struct ClassifyContext<'a> {
    pub world: &'a WorldData,
    pub flags: &'a dyn FlagStore,
    pub reachability: &'a Reachability,
}

/// Room a location is checked from. Sword skills are learned at the shrine of
/// their cell's anchor; candles and guilt arenas use their pinned room.
pub fn special_room<'a>(
    world: &'a WorldData,
    location: &'a ItemLocation,
    anchor: &'a ItemLocation,
) -> &'a str {
    if location.location_type == LocationType::SwordSkill {
        return &anchor.room;
    }
    match world.special.get(&location.id).and_then(|o| o.room.as_deref()) {
        Some(room) => room,
        None => &location.room,
    }
}

pub fn special_requirement<'a>(world: &'a WorldData, location: &'a ItemLocation) -> &'a Requirement {
    match world.special.get(&location.id).and_then(|o| o.requirement.as_ref()) {
        Some(req) => req,
        None => &location.requirement,
    }
}

pub fn special_name<'a>(world: &'a WorldData, location: &'a ItemLocation) -> &'a str {
    match world.special.get(&location.id).and_then(|o| o.name.as_deref()) {
        Some(name) => name,
        None => &location.name,
    }
}

pub fn is_collected(world: &WorldData, location: &ItemLocation, flags: &dyn FlagStore) -> bool {
    if flags.get_flag(&location_flag(location)) {
        return true;
    }
    // A shared resource is not collected just because one copy was awarded from outside.
    world.special.alias_group(&location.id).is_none() && flags.get_flag(&awarded_flag(&location.id))
}

/// Whether the location, or an uncollected member of its alias group, has been hinted.
pub fn is_hinted(world: &WorldData, location: &ItemLocation, flags: &dyn FlagStore) -> bool {
    if flags.get_flag(&hint_flag(&location.id)) {
        return true;
    }
    let Some(group) = world.special.alias_group(&location.id) else {
        return false;
    };
    world.special.members(group).iter().any(|id| {
        let collected_flag = match world.location_idx_by_id.get(id) {
            Some(&idx) => location_flag(&world.locations[idx]),
            None => format!("LOCATION_{id}"),
        };
        flags.get_flag(&hint_flag(id)) && !flags.get_flag(&collected_flag)
    })
}

pub fn is_reachable(
    world: &WorldData,
    location: &ItemLocation,
    anchor: &ItemLocation,
    visible_rooms: &VisibleRooms,
    inventory: &Inventory,
) -> bool {
    visible_rooms.contains(special_room(world, location, anchor))
        && inventory.evaluate(special_requirement(world, location))
}

pub fn classify_location(
    location: &ItemLocation,
    anchor: &ItemLocation,
    cx: &ClassifyContext,
) -> LocationStatus {
    if is_collected(cx.world, location, cx.flags) {
        return LocationStatus::Collected;
    }
    let reachable = is_reachable(
        cx.world,
        location,
        anchor,
        &cx.reachability.visible_rooms,
        &cx.reachability.inventory,
    );
    match (is_hinted(cx.world, location, cx.flags), reachable) {
        (true, true) => LocationStatus::HintedReachable,
        (true, false) => LocationStatus::HintedUnreachable,
        (false, true) => LocationStatus::Reachable,
        (false, false) => LocationStatus::Unreachable,
    }
}
