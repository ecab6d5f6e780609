pub mod requirement;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub use requirement::{Comparison, Requirement};

pub type Capacity = i32; // Number of copies of an item held in the inventory

pub const ITEM_SLIDE: &str = "Slide";
pub const ITEM_WALL_CLIMB: &str = "WallClimb";

/// Settings that change which abilities the player starts with.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogicSettings {
    pub shuffle_dash: bool,
    pub shuffle_wall_climb: bool,
}

impl Default for LogicSettings {
    fn default() -> Self {
        LogicSettings {
            shuffle_dash: true,
            shuffle_wall_climb: true,
        }
    }
}

/// Owned items, progressive item levels and traversed doors, counted as a multiset.
///
/// An inventory only grows while a reachability pass runs. When the underlying
/// game state changes it is rebuilt from scratch rather than edited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    counts: HashMap<String, Capacity>,
    pub settings: LogicSettings,
}

impl Inventory {
    pub fn new(settings: LogicSettings) -> Self {
        let mut inventory = Inventory {
            counts: HashMap::new(),
            settings,
        };
        if !settings.shuffle_dash {
            inventory.add_item(ITEM_SLIDE);
        }
        if !settings.shuffle_wall_climb {
            inventory.add_item(ITEM_WALL_CLIMB);
        }
        inventory
    }

    pub fn add_item(&mut self, id: &str) {
        if let Some(count) = self.counts.get_mut(id) {
            *count += 1;
        } else {
            self.counts.insert(id.to_string(), 1);
        }
    }

    pub fn count(&self, id: &str) -> Capacity {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn has(&self, id: &str) -> bool {
        self.count(id) > 0
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Distinct owned identifiers, in no particular order.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(|k| k.as_str())
    }

    /// Whether every identifier owned by `other` is also owned here.
    pub fn contains_all(&self, other: &Inventory) -> bool {
        other.items().all(|id| self.has(id))
    }

    pub fn evaluate(&self, req: &Requirement) -> bool {
        match req {
            Requirement::Free => true,
            Requirement::Never => false,
            Requirement::Item(id) => self.has(id),
            Requirement::Count { item, cmp, value } => cmp.apply(self.count(item), *value),
            Requirement::And(reqs) => reqs.iter().all(|r| self.evaluate(r)),
            Requirement::Or(reqs) => reqs.iter().any(|r| self.evaluate(r)),
        }
    }
}
