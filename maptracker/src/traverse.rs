use std::path::Path;

use anyhow::{Context, Result};
use hashbrown::{HashMap, HashSet};
use log::{debug, info};
use maptracker_game::{
    Door, DoorId, DoorIdx, RoomKey, WorldData, ELEVATOR_LINKED_ROOM, ELEVATOR_ROOM, INITIAL_ROOM,
    VISIBILITY_REQUIRED_DOORS, VISIBILITY_SLIDE, VISIBILITY_THIS_DOOR, VISIBILITY_WALL_CLIMB,
};
use maptracker_logic::{Inventory, ITEM_SLIDE, ITEM_WALL_CLIMB};

/// Door shuffle: entering the key door exits through the value door.
pub type DoorMap = HashMap<DoorId, DoorId>;

pub fn load_door_map(path: &Path) -> Result<DoorMap> {
    let door_map_str = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    serde_json::from_str(&door_map_str)
        .with_context(|| format!("unable to parse {}", path.display()))
}

/// Rooms seen so far, in the order they became visible.
#[derive(Clone, Debug, Default)]
pub struct VisibleRooms {
    rooms: Vec<RoomKey>,
    room_set: HashSet<RoomKey>,
}

impl VisibleRooms {
    pub fn insert(&mut self, room: &str) -> bool {
        if self.room_set.contains(room) {
            return false;
        }
        self.room_set.insert(room.to_string());
        self.rooms.push(room.to_string());
        true
    }

    pub fn contains(&self, room: &str) -> bool {
        self.room_set.contains(room)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.rooms.iter().map(|r| r.as_str())
    }
}

impl PartialEq for VisibleRooms {
    // Set equality: the order rooms were found in is not significant.
    fn eq(&self, other: &Self) -> bool {
        self.room_set == other.room_set
    }
}

/// Sizes at the end of one relaxation round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundSummary {
    pub frontier_len: usize,
    pub visible_rooms: usize,
    pub inventory_items: usize,
}

#[derive(Clone, Debug)]
pub struct Reachability {
    pub inventory: Inventory,
    pub visible_rooms: VisibleRooms,
    /// Doors passed through in either direction.
    pub checked_doors: Vec<bool>,
    pub rounds: Vec<RoundSummary>,
}

/// Exit door reached by entering `door_idx`: the shuffled target if any, else its vanilla counterpart.
pub fn resolve_exit_door(world: &WorldData, door_map: &DoorMap, door_idx: DoorIdx) -> Result<DoorIdx> {
    let door = &world.doors[door_idx];
    if let Some(target) = door_map.get(&door.id) {
        return world
            .door_idx_by_id
            .get(target)
            .copied()
            .with_context(|| format!("Door '{}' is shuffled to unknown door '{}'", door.id, target));
    }
    door.original_door
        .with_context(|| format!("Door '{}' has no shuffle target and no original door", door.id))
}

/// Whether a door in a newly visible room should be queued for traversal.
pub fn should_be_made_visible(door: &Door, world: &WorldData, inventory: &Inventory) -> bool {
    if !door.has_exit() {
        return false;
    }
    let flags = door.visibility_flags;
    if flags == 0 {
        return true;
    }
    (flags & VISIBILITY_THIS_DOOR != 0 && inventory.has(&door.id))
        || (flags & VISIBILITY_REQUIRED_DOORS != 0
            && door
                .required_doors
                .iter()
                .any(|&d| inventory.has(&world.doors[d].id)))
        || (flags & VISIBILITY_SLIDE != 0 && inventory.has(ITEM_SLIDE))
        || (flags & VISIBILITY_WALL_CLIMB != 0 && inventory.has(ITEM_WALL_CLIMB))
}

struct Traverser<'a> {
    world: &'a WorldData,
    door_map: &'a DoorMap,
    room_doors: Vec<Vec<DoorIdx>>,
    inventory: Inventory,
    visible_rooms: VisibleRooms,
    checked_doors: Vec<bool>,
    frontier: Vec<DoorIdx>,
    in_frontier: Vec<bool>,
    rounds: Vec<RoundSummary>,
}

impl<'a> Traverser<'a> {
    fn new(world: &'a WorldData, door_map: &'a DoorMap, inventory: Inventory) -> Self {
        Traverser {
            world,
            door_map,
            room_doors: world.room_doors.clone(),
            inventory,
            visible_rooms: VisibleRooms::default(),
            checked_doors: vec![false; world.doors.len()],
            frontier: vec![],
            in_frontier: vec![false; world.doors.len()],
            rounds: vec![],
        }
    }

    fn enqueue(&mut self, door_idx: DoorIdx) {
        if !self.in_frontier[door_idx] {
            self.in_frontier[door_idx] = true;
            self.frontier.push(door_idx);
        }
    }

    fn dequeue(&mut self, door_idx: DoorIdx) {
        if self.in_frontier[door_idx] {
            self.in_frontier[door_idx] = false;
            self.frontier.retain(|&d| d != door_idx);
        }
    }

    fn add_origin(&mut self, starting_door: &str) -> Result<()> {
        let world = self.world;
        let start_idx = *world
            .door_idx_by_id
            .get(starting_door)
            .with_context(|| format!("Unknown starting door '{starting_door}'"))?;
        let start = &world.doors[start_idx];
        let initial_idx = world.room_idx(INITIAL_ROOM)?;

        // The starting room's doors count as part of the initial room.
        let start_room_doors = self.room_doors[start.room_idx].clone();
        self.room_doors[initial_idx].extend(start_room_doors);

        // Two physically separate elevator scenes share their doors.
        let elevator_idx = world
            .room_idx(ELEVATOR_ROOM)
            .context("Elevator scene missing from world")?;
        let linked_idx = world
            .room_idx(ELEVATOR_LINKED_ROOM)
            .context("Linked elevator scene missing from world")?;
        let linked_doors = self.room_doors[linked_idx].clone();
        self.room_doors[elevator_idx].extend(linked_doors);

        for door_idx in self.room_doors[initial_idx].clone() {
            if world.doors[door_idx].has_exit() {
                self.enqueue(door_idx);
            }
        }
        self.inventory.add_item(&start.id);
        self.visible_rooms.insert(&start.room);
        self.visible_rooms.insert(INITIAL_ROOM);
        Ok(())
    }

    fn open_door(&mut self, enter_idx: DoorIdx) -> Result<()> {
        let world = self.world;
        let exit_idx = resolve_exit_door(world, self.door_map, enter_idx)?;
        let enter = &world.doors[enter_idx];
        let exit = &world.doors[exit_idx];

        // Going through a door also opens its exit for the way back.
        self.checked_doors[enter_idx] = true;
        self.checked_doors[exit_idx] = true;
        self.inventory.add_item(&enter.id);
        self.inventory.add_item(&exit.id);
        self.dequeue(enter_idx);
        self.dequeue(exit_idx);

        for i in 0..self.room_doors[exit.room_idx].len() {
            let door_idx = self.room_doors[exit.room_idx][i];
            if self.checked_doors[door_idx] {
                continue;
            }
            if should_be_made_visible(&world.doors[door_idx], world, &self.inventory) {
                self.enqueue(door_idx);
            }
        }

        self.visible_rooms.insert(&exit.room);
        if exit.room == ELEVATOR_ROOM {
            self.visible_rooms.insert(ELEVATOR_LINKED_ROOM);
        }
        Ok(())
    }

    fn traverse(&mut self) -> Result<()> {
        let world = self.world;
        loop {
            let mut stack = std::mem::take(&mut self.frontier);
            self.in_frontier.fill(false);
            let previous_frontier: HashSet<DoorIdx> = stack.iter().copied().collect();

            while let Some(door_idx) = stack.pop() {
                if self.checked_doors[door_idx] {
                    continue;
                }
                if self.inventory.evaluate(&world.doors[door_idx].requirement) {
                    self.open_door(door_idx)?;
                } else {
                    // Retry next round, in case a later door brings what it needs.
                    self.enqueue(door_idx);
                }
            }

            let summary = RoundSummary {
                frontier_len: self.frontier.len(),
                visible_rooms: self.visible_rooms.len(),
                inventory_items: self.inventory.len(),
            };
            debug!("Round {}: {:?}", self.rounds.len(), summary);
            self.rounds.push(summary);

            // Only failing doors were carried over, so nothing new can open.
            let frontier: HashSet<DoorIdx> = self.frontier.iter().copied().collect();
            if frontier == previous_frontier {
                return Ok(());
            }
        }
    }
}

/// Finds every room and door reachable from `starting_door` by repeatedly
/// passing through doors whose logic the growing inventory satisfies.
pub fn compute_reachability(
    world: &WorldData,
    door_map: &DoorMap,
    starting_door: &str,
    base_inventory: Inventory,
) -> Result<Reachability> {
    info!("Calculating current inventory");
    let mut traverser = Traverser::new(world, door_map, base_inventory);
    traverser.add_origin(starting_door)?;
    traverser.traverse()?;
    info!(
        "Reachability: {} rooms visible after {} rounds",
        traverser.visible_rooms.len(),
        traverser.rounds.len()
    );
    Ok(Reachability {
        inventory: traverser.inventory,
        visible_rooms: traverser.visible_rooms,
        checked_doors: traverser.checked_doors,
        rounds: traverser.rounds,
    })
}
