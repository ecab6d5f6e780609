use anyhow::{Context, Result};
use hashbrown::HashMap;
use maptracker_logic::Requirement;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::{LocationId, RoomKey};

/// Location IDs that stand for one shared resource. Hints and collection flags
/// of any member have to be read across the whole group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display)]
pub enum AliasGroup {
    RedCandle,
    BlueCandle,
    GuiltArena,
    Amanecida,
}

struct SpecialEntry {
    id: &'static str,
    room: Option<&'static str>,
    logic: Option<&'static str>,
    name: Option<&'static str>,
    group: AliasGroup,
}

// Candles and guilt arenas appear in several rooms, so each copy is pinned to
// its own room and given a simplified requirement once that room is visible.
const SPECIAL_ENTRIES: &[SpecialEntry] = &[
    SpecialEntry {
        id: "RB18",
        room: Some("D02Z03S06"),
        logic: Some("redWax > 0"),
        name: Some("Red candle"),
        group: AliasGroup::RedCandle,
    },
    SpecialEntry {
        id: "RB19",
        room: Some("D05Z01S02"),
        logic: Some("redWax > 0 && D05Z01S02[W]"),
        name: Some("Red candle"),
        group: AliasGroup::RedCandle,
    },
    SpecialEntry {
        id: "RB25",
        room: Some("D17Z01S04"),
        logic: Some("blueWax > 0 && (D17Z01S04[N] || D17Z01S04[FrontR])"),
        name: Some("Blue candle"),
        group: AliasGroup::BlueCandle,
    },
    SpecialEntry {
        id: "RB26",
        room: Some("D01Z04S16"),
        logic: Some("blueWax > 0"),
        name: Some("Blue candle"),
        group: AliasGroup::BlueCandle,
    },
    SpecialEntry {
        id: "QI32",
        room: Some("D01Z04S17"),
        logic: Some("guiltBead"),
        name: Some("Guilt arena"),
        group: AliasGroup::GuiltArena,
    },
    SpecialEntry {
        id: "QI33",
        room: Some("D02Z02S06"),
        logic: Some("guiltBead"),
        name: Some("Guilt arena"),
        group: AliasGroup::GuiltArena,
    },
    SpecialEntry {
        id: "QI34",
        room: Some("D03Z03S14"),
        logic: Some("guiltBead"),
        name: Some("Guilt arena"),
        group: AliasGroup::GuiltArena,
    },
    SpecialEntry {
        id: "QI35",
        room: Some("D17Z01S12"),
        logic: Some("guiltBead"),
        name: Some("Guilt arena"),
        group: AliasGroup::GuiltArena,
    },
    SpecialEntry {
        id: "QI79",
        room: Some("D04Z02S17"),
        logic: Some("guiltBead"),
        name: Some("Guilt arena"),
        group: AliasGroup::GuiltArena,
    },
    SpecialEntry {
        id: "QI80",
        room: Some("D05Z01S17"),
        logic: Some("guiltBead"),
        name: Some("Guilt arena"),
        group: AliasGroup::GuiltArena,
    },
    SpecialEntry {
        id: "QI81",
        room: Some("D09Z01S13"),
        logic: Some("guiltBead"),
        name: Some("Guilt arena"),
        group: AliasGroup::GuiltArena,
    },
    SpecialEntry {
        id: "Amanecida[D02Z02S14]",
        room: None,
        logic: None,
        name: None,
        group: AliasGroup::Amanecida,
    },
    SpecialEntry {
        id: "Amanecida[D03Z01S03]",
        room: None,
        logic: None,
        name: None,
        group: AliasGroup::Amanecida,
    },
    SpecialEntry {
        id: "Amanecida[D04Z01S04]",
        room: None,
        logic: None,
        name: None,
        group: AliasGroup::Amanecida,
    },
    SpecialEntry {
        id: "Amanecida[D09Z01S01]",
        room: None,
        logic: None,
        name: None,
        group: AliasGroup::Amanecida,
    },
];

#[derive(Clone, Debug)]
pub struct LocationOverride {
    pub room: Option<RoomKey>,
    pub requirement: Option<Requirement>,
    pub name: Option<String>,
    pub alias_group: Option<AliasGroup>,
}

/// Per-location overrides plus the reverse index from alias group to its members.
#[derive(Clone, Debug, Default)]
pub struct SpecialLocations {
    overrides: HashMap<LocationId, LocationOverride>,
    members: HashMap<AliasGroup, Vec<LocationId>>,
}

impl SpecialLocations {
    pub fn standard() -> Result<Self> {
        let mut special = SpecialLocations::default();
        for entry in SPECIAL_ENTRIES {
            let requirement = match entry.logic {
                Some(logic) => Some(
                    Requirement::parse(logic)
                        .with_context(|| format!("special logic for {}", entry.id))?,
                ),
                None => None,
            };
            special.overrides.insert(
                entry.id.to_string(),
                LocationOverride {
                    room: entry.room.map(|r| r.to_string()),
                    requirement,
                    name: entry.name.map(|n| n.to_string()),
                    alias_group: Some(entry.group),
                },
            );
            special
                .members
                .entry(entry.group)
                .or_default()
                .push(entry.id.to_string());
        }
        for group in AliasGroup::iter() {
            special.members.entry(group).or_default();
        }
        Ok(special)
    }

    pub fn get(&self, id: &str) -> Option<&LocationOverride> {
        self.overrides.get(id)
    }

    pub fn alias_group(&self, id: &str) -> Option<AliasGroup> {
        self.overrides.get(id).and_then(|o| o.alias_group)
    }

    pub fn members(&self, group: AliasGroup) -> &[LocationId] {
        self.members.get(&group).map(|v| v.as_slice()).unwrap_or(&[])
    }
}
