pub mod cells;
pub mod special;

use std::fs::File;
use std::hash::Hash;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use hashbrown::HashMap;
use json::JsonValue;
use log::info;
use maptracker_logic::Requirement;
use num_enum::{FromPrimitive, TryFromPrimitive};

pub use cells::{CellKey, MapCell};
pub use special::{AliasGroup, LocationOverride, SpecialLocations};

pub type DoorId = String; // e.g. "D05Z01S02[W]": room key followed by the exit name in brackets
pub type RoomKey = String; // Scene name, e.g. "D05Z01S02"
pub type LocationId = String; // Item location ID, e.g. "RB18" or "Amanecida[D02Z02S14]"
pub type ItemId = String;
pub type DoorIdx = usize; // Index into WorldData.doors
pub type RoomIdx = usize; // Index into WorldData.room_isv.keys
pub type LocationIdx = usize; // Index into WorldData.locations
pub type CellIdx = usize; // Index into WorldData.cells

/// Pseudo-room that is always visible and shares the starting room's doors.
pub const INITIAL_ROOM: &str = "Initial";
/// The Albero elevator room also shows the graveyard elevator room's doors.
pub const ELEVATOR_ROOM: &str = "D02Z02S11";
pub const ELEVATOR_LINKED_ROOM: &str = "D01Z02S03";

/// Door direction of doors that lead nowhere new.
pub const DIRECTION_NO_EXIT: u8 = 5;

pub const VISIBILITY_THIS_DOOR: u8 = 1;
pub const VISIBILITY_REQUIRED_DOORS: u8 = 2;
pub const VISIBILITY_SLIDE: u8 = 4;
pub const VISIBILITY_WALL_CLIMB: u8 = 8;

pub const LOCATION_BOOTS_OF_PLEADING: &str = "RE401";
pub const LOCATION_PURIFIED_HAND: &str = "RE402";

#[derive(Default, Clone, Debug)]
pub struct IndexedVec<T: Hash + Eq> {
    pub keys: Vec<T>,
    pub index_by_key: HashMap<T, usize>,
}

impl<T: Hash + Eq> IndexedVec<T> {
    pub fn add<U: ToOwned<Owned = T> + ?Sized>(&mut self, name: &U) -> usize {
        if !self.index_by_key.contains_key(&name.to_owned()) {
            let idx = self.keys.len();
            self.index_by_key.insert(name.to_owned(), self.keys.len());
            self.keys.push(name.to_owned());
            idx
        } else {
            self.index_by_key[&name.to_owned()]
        }
    }
}

#[derive(Clone, Debug)]
pub struct Door {
    pub id: DoorId,
    pub room: RoomKey,
    pub room_idx: RoomIdx,
    pub direction: u8,
    /// Vanilla counterpart, used when the shuffle has no entry for this door.
    pub original_door: Option<DoorIdx>,
    pub requirement: Requirement,
    pub visibility_flags: u8,
    pub required_doors: Vec<DoorIdx>,
}

impl Door {
    pub fn has_exit(&self) -> bool {
        self.direction != DIRECTION_NO_EXIT
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum LocationType {
    Item = 0,
    SwordSkill = 1,
    Thorn = 2,
    #[num_enum(catch_all)]
    Other(u8),
}

#[derive(Clone, Debug)]
pub struct ItemLocation {
    pub id: LocationId,
    pub name: String,
    pub room: RoomKey,
    pub location_type: LocationType,
    pub requirement: Requirement,
    /// Game flag recording collection, when it differs from `LOCATION_<id>`.
    /// Anything after a `~` is ignored.
    pub location_flag: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ItemType {
    Bead = 0,
    Prayer = 1,
    Relic = 2,
    Heart = 3,
    Bone = 4,
    QuestItem = 5,
    Cherub = 6,
    Life = 7,
    Fervour = 8,
    Strength = 9,
    Tears = 10,
    SwordSkill = 11,
    Special = 12,
}

#[derive(Clone, Debug)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub item_type: ItemType,
    /// For progressive items, the IDs of each level. The item ID is added once per owned level.
    pub sub_items: Vec<ItemId>,
}

/// Static world description: doors grouped by room, item locations, items and map cells.
/// Loaded once and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct WorldData {
    pub room_isv: IndexedVec<RoomKey>,
    pub doors: Vec<Door>,
    pub door_idx_by_id: HashMap<DoorId, DoorIdx>,
    pub room_doors: Vec<Vec<DoorIdx>>,
    pub locations: Vec<ItemLocation>,
    pub location_idx_by_id: HashMap<LocationId, LocationIdx>,
    pub items: Vec<Item>,
    pub cells: Vec<MapCell>,
    pub cell_idx_by_key: HashMap<CellKey, CellIdx>,
    pub special: SpecialLocations,
}

fn read_json(path: &Path) -> Result<JsonValue> {
    let file = File::open(path).with_context(|| format!("unable to open {}", path.display()))?;
    let json_str = std::io::read_to_string(file)
        .with_context(|| format!("unable to read {}", path.display()))?;
    let json_data =
        json::parse(&json_str).with_context(|| format!("unable to parse {}", path.display()))?;
    Ok(json_data)
}

fn parse_logic(value: &JsonValue) -> Result<Requirement> {
    if value.is_null() {
        Ok(Requirement::Free)
    } else {
        Requirement::parse(value.as_str().context("logic must be a string")?)
    }
}

fn door_room_from_id(id: &str) -> &str {
    match id.find('[') {
        Some(i) => &id[..i],
        None => id,
    }
}

impl WorldData {
    pub fn get_door(&self, id: &str) -> Result<&Door> {
        let idx = self
            .door_idx_by_id
            .get(id)
            .with_context(|| format!("Unknown door '{id}'"))?;
        Ok(&self.doors[*idx])
    }

    pub fn get_location(&self, id: &str) -> Result<&ItemLocation> {
        let idx = self
            .location_idx_by_id
            .get(id)
            .with_context(|| format!("Unknown location '{id}'"))?;
        Ok(&self.locations[*idx])
    }

    pub fn room_idx(&self, room: &str) -> Result<RoomIdx> {
        self.room_isv
            .index_by_key
            .get(room)
            .copied()
            .with_context(|| format!("Unknown room '{room}'"))
    }

    pub fn get_cell(&self, key: CellKey) -> Option<&MapCell> {
        self.cell_idx_by_key.get(&key).map(|&i| &self.cells[i])
    }

    fn add_room(&mut self, room: &str) -> RoomIdx {
        let idx = self.room_isv.add(room);
        if idx == self.room_doors.len() {
            self.room_doors.push(vec![]);
        }
        idx
    }

    fn load_doors(&mut self, doors_json: &JsonValue) -> Result<()> {
        ensure!(doors_json.is_array(), "doors must be an array");
        // Door IDs are registered first so that forward references resolve.
        for door_json in doors_json.members() {
            let id = door_json["id"].as_str().context("Missing 'id' in door")?;
            if self.door_idx_by_id.contains_key(id) {
                bail!("Duplicate door '{id}'");
            }
            let room = match door_json["room"].as_str() {
                Some(r) => r.to_string(),
                None => door_room_from_id(id).to_string(),
            };
            let room_idx = self.add_room(&room);
            let requirement =
                parse_logic(&door_json["logic"]).with_context(|| format!("door '{id}'"))?;
            let direction = door_json["direction"]
                .as_u8()
                .with_context(|| format!("Missing 'direction' in door '{id}'"))?;
            let door_idx = self.doors.len();
            self.door_idx_by_id.insert(id.to_string(), door_idx);
            self.room_doors[room_idx].push(door_idx);
            self.doors.push(Door {
                id: id.to_string(),
                room,
                room_idx,
                direction,
                original_door: None,
                requirement,
                visibility_flags: door_json["visibilityFlags"].as_u8().unwrap_or(0),
                required_doors: vec![],
            });
        }
        for (door_idx, door_json) in doors_json.members().enumerate() {
            let id = self.doors[door_idx].id.clone();
            if let Some(original) = door_json["originalDoor"].as_str() {
                let original_idx = *self.door_idx_by_id.get(original).with_context(|| {
                    format!("Door '{id}' has unknown original door '{original}'")
                })?;
                self.doors[door_idx].original_door = Some(original_idx);
            }
            let mut required_doors = vec![];
            for req_json in door_json["requiredDoors"].members() {
                let req_id = req_json.as_str().context("requiredDoors must be strings")?;
                let req_idx = *self.door_idx_by_id.get(req_id).with_context(|| {
                    format!("Door '{id}' has unknown required door '{req_id}'")
                })?;
                required_doors.push(req_idx);
            }
            self.doors[door_idx].required_doors = required_doors;
        }
        Ok(())
    }

    fn load_locations(&mut self, locations_json: &JsonValue) -> Result<()> {
        ensure!(locations_json.is_array(), "locations must be an array");
        for loc_json in locations_json.members() {
            let id = loc_json["id"]
                .as_str()
                .context("Missing 'id' in location")?;
            if self.location_idx_by_id.contains_key(id) {
                bail!("Duplicate location '{id}'");
            }
            let room = loc_json["room"]
                .as_str()
                .with_context(|| format!("Missing 'room' in location '{id}'"))?;
            self.add_room(room);
            let requirement =
                parse_logic(&loc_json["logic"]).with_context(|| format!("location '{id}'"))?;
            let location_type = LocationType::from_primitive(loc_json["type"].as_u8().unwrap_or(0));
            let loc_idx = self.locations.len();
            self.location_idx_by_id.insert(id.to_string(), loc_idx);
            self.locations.push(ItemLocation {
                id: id.to_string(),
                name: loc_json["name"].as_str().unwrap_or(id).to_string(),
                room: room.to_string(),
                location_type,
                requirement,
                location_flag: loc_json["locationFlag"].as_str().map(|s| s.to_string()),
            });
        }
        Ok(())
    }

    fn load_items(&mut self, items_json: &JsonValue) -> Result<()> {
        ensure!(items_json.is_array(), "items must be an array");
        for item_json in items_json.members() {
            let id = item_json["id"].as_str().context("Missing 'id' in item")?;
            let type_num = item_json["type"]
                .as_u8()
                .with_context(|| format!("Missing 'type' in item '{id}'"))?;
            let item_type = ItemType::try_from(type_num)
                .with_context(|| format!("Invalid type {type_num} in item '{id}'"))?;
            let mut sub_items = vec![];
            for sub_json in item_json["subItems"].members() {
                sub_items.push(sub_json.as_str().context("subItems must be strings")?.to_string());
            }
            ensure!(
                item_type != ItemType::SwordSkill || !sub_items.is_empty(),
                "Sword skill item '{id}' has no subItems"
            );
            self.items.push(Item {
                id: id.to_string(),
                name: item_json["name"].as_str().unwrap_or(id).to_string(),
                item_type,
                sub_items,
            });
        }
        Ok(())
    }

    fn load_cells(&mut self, cells_json: &JsonValue) -> Result<()> {
        ensure!(cells_json.is_array(), "cells must be an array");
        for cell_json in cells_json.members() {
            let x = cell_json["x"].as_i32().context("Missing 'x' in map cell")?;
            let y = cell_json["y"].as_i32().context("Missing 'y' in map cell")?;
            let mut locations = vec![];
            for loc_json in cell_json["locations"].members() {
                locations.push(loc_json.as_str().context("locations must be strings")?.to_string());
            }
            let cell = MapCell {
                key: CellKey::new(x, y),
                locations,
            };
            ensure!(!cell.is_empty(), "Map cell {} has no locations", cell.key);
            for id in &cell.locations {
                ensure!(
                    self.location_idx_by_id.contains_key(id),
                    "Map cell {} has unknown location '{id}'",
                    cell.key
                );
            }
            if self.cell_idx_by_key.contains_key(&cell.key) {
                bail!("Duplicate map cell {}", cell.key);
            }
            self.cell_idx_by_key.insert(cell.key, self.cells.len());
            self.cells.push(cell);
        }
        Ok(())
    }

    pub fn from_json(
        doors_json: &JsonValue,
        locations_json: &JsonValue,
        items_json: &JsonValue,
        cells_json: &JsonValue,
    ) -> Result<WorldData> {
        let mut world = WorldData {
            special: SpecialLocations::standard()?,
            ..WorldData::default()
        };
        world.add_room(INITIAL_ROOM);
        world.load_doors(doors_json).context("loading doors")?;
        world.load_locations(locations_json).context("loading locations")?;
        world.load_items(items_json).context("loading items")?;
        world.load_cells(cells_json).context("loading map cells")?;
        Ok(world)
    }

    /// Loads `doors.json`, `locations.json`, `items.json` and `cells.json` from `base_path`.
    pub fn load(base_path: &Path) -> Result<WorldData> {
        Self::load_with_cells(base_path, &base_path.join("cells.json"))
    }

    /// Like [`WorldData::load`], but with the map cell table read from `cells_path`,
    /// e.g. the `data/cells.json` table shipped with this crate.
    pub fn load_with_cells(base_path: &Path, cells_path: &Path) -> Result<WorldData> {
        let doors_json = read_json(&base_path.join("doors.json"))?;
        let locations_json = read_json(&base_path.join("locations.json"))?;
        let items_path = base_path.join("items.json");
        let items_json = if items_path.exists() {
            read_json(&items_path)?
        } else {
            JsonValue::new_array()
        };
        let cells_json = read_json(cells_path)?;
        let world = Self::from_json(&doors_json, &locations_json, &items_json, &cells_json)?;
        info!(
            "Loaded {} doors, {} locations, {} items, {} map cells from {}",
            world.doors.len(),
            world.locations.len(),
            world.items.len(),
            world.cells.len(),
            base_path.display()
        );
        Ok(world)
    }
}
