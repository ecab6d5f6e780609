use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::LocationId;

/// Map grid coordinate of a cell, in whole map tiles.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
}

impl CellKey {
    pub fn new(x: i32, y: i32) -> Self {
        CellKey { x, y }
    }
}

impl Display for CellKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One or more item locations drawn at the same map position. The first
/// member anchors the room of sword-skill locations in the cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapCell {
    #[serde(flatten)]
    pub key: CellKey,
    pub locations: Vec<LocationId>,
}

impl MapCell {
    /// `None` only for a cell built by hand with no members; loaded cells are never empty.
    pub fn anchor(&self) -> Option<&str> {
        self.locations.first().map(|id| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
