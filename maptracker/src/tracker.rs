use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use log::{debug, info};
use maptracker_game::{CellKey, WorldData};
use serde::Serialize;

use crate::cell_status::{
    aggregate_cell, classify_member, member_name, next_selectable_index, CellStatus,
    CycleDirection,
};
use crate::classify::{ClassifyContext, LocationStatus};
use crate::flags::FlagStore;
use crate::inventory::{build_base_inventory, ProgressCounters};
use crate::settings::TrackerSettings;
use crate::traverse::{compute_reachability, DoorMap, Reachability};

/// Owns the cached reachability snapshot for one game session.
///
/// The snapshot is computed lazily and reused until [`MapTracker::invalidate`]
/// is called, e.g. when a new item has been obtained. Recomputation holds a
/// lock, so concurrent callers never observe a partially built snapshot.
pub struct MapTracker<'a> {
    world: &'a WorldData,
    settings: TrackerSettings,
    door_map: DoorMap,
    cache: Mutex<Option<Arc<Reachability>>>,
    generation: AtomicU64,
}

impl<'a> MapTracker<'a> {
    pub fn new(world: &'a WorldData, settings: TrackerSettings, door_map: DoorMap) -> Self {
        MapTracker {
            world,
            settings,
            door_map,
            cache: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn world(&self) -> &'a WorldData {
        self.world
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Bumped every time the cached snapshot is dropped.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<Arc<Reachability>>> {
        // A panic mid-recompute never stores a partial snapshot.
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn invalidate(&self) {
        let mut cache = self.lock_cache();
        if cache.take().is_some() {
            debug!("Reachability snapshot invalidated");
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn set_door_map(&mut self, door_map: DoorMap) {
        self.door_map = door_map;
        self.invalidate();
    }

    pub fn recompute_if_stale(
        &self,
        flags: &dyn FlagStore,
        counters: &ProgressCounters,
    ) -> Result<Arc<Reachability>> {
        let mut cache = self.lock_cache();
        if let Some(reachability) = cache.as_ref() {
            return Ok(Arc::clone(reachability));
        }
        let base_inventory = build_base_inventory(
            self.world,
            flags,
            counters,
            self.settings.logic_settings(),
        );
        let reachability = Arc::new(
            compute_reachability(
                self.world,
                &self.door_map,
                &self.settings.starting_door,
                base_inventory,
            )
            .context("computing reachability")?,
        );
        *cache = Some(Arc::clone(&reachability));
        Ok(reachability)
    }

    /// Status of every map cell, in the order the cells were loaded.
    pub fn cell_statuses(
        &self,
        flags: &dyn FlagStore,
        counters: &ProgressCounters,
    ) -> Result<Vec<(CellKey, CellStatus)>> {
        let reachability = self.recompute_if_stale(flags, counters)?;
        let cx = ClassifyContext {
            world: self.world,
            flags,
            reachability: &reachability,
        };
        let mut statuses = Vec::with_capacity(self.world.cells.len());
        for cell in &self.world.cells {
            let status = aggregate_cell(cell, &self.settings, &cx)
                .with_context(|| format!("map cell {}", cell.key))?;
            statuses.push((cell.key, status));
        }
        info!("Updated {} map cells", statuses.len());
        Ok(statuses)
    }
}

/// Label for the currently selected member of the hovered cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectedLocation {
    pub cell: CellKey,
    pub index: usize,
    pub name: String,
    pub status: LocationStatus,
}

impl SelectedLocation {
    pub fn color(&self) -> [u8; 3] {
        CellStatus::from(self.status).color()
    }
}

/// Hovered cell and the member shown for it. Owned by the overlay, and reset
/// whenever the tracker's snapshot has been invalidated since the last update.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    generation: u64,
    cell: Option<CellKey>,
    index: Option<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Selection::default()
    }

    pub fn cell(&self) -> Option<CellKey> {
        self.cell
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn clear(&mut self) {
        self.cell = None;
        self.index = None;
    }

    fn sync(&mut self, tracker: &MapTracker) {
        let generation = tracker.generation();
        if generation != self.generation {
            self.clear();
            self.generation = generation;
        }
    }

    /// Selects the first trackable member of the cell under the cursor.
    pub fn hover(
        &mut self,
        tracker: &MapTracker,
        key: Option<CellKey>,
        flags: &dyn FlagStore,
        counters: &ProgressCounters,
    ) -> Result<Option<SelectedLocation>> {
        self.sync(tracker);
        let Some(key) = key else {
            self.clear();
            return Ok(None);
        };
        let Some(cell) = tracker.world.get_cell(key) else {
            self.clear();
            return Ok(None);
        };
        if self.cell != Some(key) {
            self.cell = Some(key);
            self.index = next_selectable_index(
                cell,
                None,
                CycleDirection::Forward,
                &tracker.settings,
                tracker.world,
            );
        }
        self.describe(tracker, flags, counters)
    }

    /// Moves the selection to the next trackable member of the hovered cell.
    pub fn tab(
        &mut self,
        tracker: &MapTracker,
        direction: CycleDirection,
        flags: &dyn FlagStore,
        counters: &ProgressCounters,
    ) -> Result<Option<SelectedLocation>> {
        self.sync(tracker);
        let Some(cell) = self.cell.and_then(|key| tracker.world.get_cell(key)) else {
            return Ok(None);
        };
        self.index = next_selectable_index(
            cell,
            self.index,
            direction,
            &tracker.settings,
            tracker.world,
        );
        self.describe(tracker, flags, counters)
    }

    fn describe(
        &mut self,
        tracker: &MapTracker,
        flags: &dyn FlagStore,
        counters: &ProgressCounters,
    ) -> Result<Option<SelectedLocation>> {
        let (Some(key), Some(index)) = (self.cell, self.index) else {
            self.clear();
            return Ok(None);
        };
        let Some(cell) = tracker.world.get_cell(key) else {
            self.clear();
            return Ok(None);
        };
        let reachability = tracker.recompute_if_stale(flags, counters)?;
        let cx = ClassifyContext {
            world: tracker.world,
            flags,
            reachability: &reachability,
        };
        if aggregate_cell(cell, &tracker.settings, &cx)? == CellStatus::Untracked {
            self.clear();
            return Ok(None);
        }
        Ok(Some(SelectedLocation {
            cell: key,
            index,
            name: member_name(cell, index, tracker.world),
            status: classify_member(cell, index, &cx),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FlagSet;

    fn small_world() -> Result<WorldData> {
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
                { "id": "QI01", "name": "Near", "room": "D17Z01S02" },
                { "id": "QI02", "name": "Far", "room": "D17Z01S03" },
                { "id": "RE401", "name": "Boots", "room": "D17Z01S03" }
            ]"#,
        )?;
        let items = json::parse(r#"[ { "id": "Key", "type": 5 } ]"#)?;
        let cells = json::parse(
            r#"[
                { "x": 1, "y": 1, "locations": ["QI01", "QI02"] },
                { "x": 2, "y": 1, "locations": ["RE401"] }
            ]"#,
        )?;
        WorldData::from_json(&doors, &locations, &items, &cells)
    }

    fn settings() -> TrackerSettings {
        TrackerSettings {
            shuffle_boots_of_pleading: false,
            ..TrackerSettings::default()
        }
    }

    #[test]
    fn test_snapshot_cached_until_invalidated() -> Result<()> {
        let world = small_world()?;
        let tracker = MapTracker::new(&world, settings(), DoorMap::new());
        let counters = ProgressCounters::default();
        let mut flags = FlagSet::new();

        let first = tracker.recompute_if_stale(&flags, &counters)?;
        assert!(!first.visible_rooms.contains("D17Z01S03"));

        // A stale snapshot is served until the tracker is told otherwise.
        flags.set_flag("ITEM_Key");
        let second = tracker.recompute_if_stale(&flags, &counters)?;
        assert!(Arc::ptr_eq(&first, &second));

        tracker.invalidate();
        let third = tracker.recompute_if_stale(&flags, &counters)?;
        assert!(third.visible_rooms.contains("D17Z01S03"));
        Ok(())
    }

    #[test]
    fn test_set_door_map() -> Result<()> {
        let world = small_world()?;
        let mut tracker = MapTracker::new(&world, settings(), DoorMap::new());
        let flags = FlagSet::new();
        let counters = ProgressCounters::default();

        let vanilla = tracker.recompute_if_stale(&flags, &counters)?;
        assert!(vanilla.visible_rooms.contains("D17Z01S02"));
        assert!(!vanilla.visible_rooms.contains("D17Z01S03"));
        let generation = tracker.generation();

        let mut door_map = DoorMap::new();
        door_map.insert("D17Z01S01[E]".to_string(), "D17Z01S03[W]".to_string());
        tracker.set_door_map(door_map);
        assert_eq!(tracker.generation(), generation + 1);

        let shuffled = tracker.recompute_if_stale(&flags, &counters)?;
        assert!(!Arc::ptr_eq(&vanilla, &shuffled));
        assert!(shuffled.visible_rooms.contains("D17Z01S03"));
        assert!(!shuffled.visible_rooms.contains("D17Z01S02"));
        Ok(())
    }

    #[test]
    fn test_cell_statuses() -> Result<()> {
        let world = small_world()?;
        let tracker = MapTracker::new(&world, settings(), DoorMap::new());
        let statuses = tracker.cell_statuses(&FlagSet::new(), &ProgressCounters::default())?;
        assert_eq!(
            statuses,
            vec![
                (CellKey::new(1, 1), CellStatus::SomeReachable),
                (CellKey::new(2, 1), CellStatus::Untracked),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_hover_and_tab() -> Result<()> {
        let world = small_world()?;
        let tracker = MapTracker::new(&world, settings(), DoorMap::new());
        let flags = FlagSet::new();
        let counters = ProgressCounters::default();
        let mut selection = Selection::new();

        let selected = selection
            .hover(&tracker, Some(CellKey::new(1, 1)), &flags, &counters)?
            .context("expected a selection")?;
        assert_eq!(selected.name, "Near");
        assert_eq!(selected.status, LocationStatus::Reachable);
        assert_eq!(selected.color(), [32, 255, 32]);

        let selected = selection
            .tab(&tracker, CycleDirection::Forward, &flags, &counters)?
            .context("expected a selection")?;
        assert_eq!(selected.name, "Far");
        assert_eq!(selected.status, LocationStatus::Unreachable);

        let selected = selection
            .tab(&tracker, CycleDirection::Forward, &flags, &counters)?
            .context("expected a selection")?;
        assert_eq!(selected.index, 0);

        // An untracked cell shows nothing.
        assert_eq!(
            selection.hover(&tracker, Some(CellKey::new(2, 1)), &flags, &counters)?,
            None
        );
        assert_eq!(selection.cell(), None);
        Ok(())
    }

    #[test]
    fn test_selection_reset_on_invalidate() -> Result<()> {
        let world = small_world()?;
        let tracker = MapTracker::new(&world, settings(), DoorMap::new());
        let flags = FlagSet::new();
        let counters = ProgressCounters::default();
        let mut selection = Selection::new();

        selection.hover(&tracker, Some(CellKey::new(1, 1)), &flags, &counters)?;
        selection.tab(&tracker, CycleDirection::Forward, &flags, &counters)?;
        assert_eq!(selection.index(), Some(1));

        tracker.invalidate();
        assert_eq!(
            selection.tab(&tracker, CycleDirection::Forward, &flags, &counters)?,
            None
        );
        let selected = selection
            .hover(&tracker, Some(CellKey::new(1, 1)), &flags, &counters)?
            .context("expected a selection")?;
        assert_eq!(selected.index, 0);
        Ok(())
    }
}
