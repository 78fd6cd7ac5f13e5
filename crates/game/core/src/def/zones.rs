use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::ZoneId;
use crate::value::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneOwner {
    #[default]
    None,
    /// One copy per seat, named `base:seat`.
    Player,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneVisibility {
    #[default]
    Public,
    Hidden,
    /// Visible to the owning seat only.
    Owner,
}

/// Where tokens entering a zone are placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneOrdering {
    /// New tokens go on top (index 0).
    #[default]
    Stack,
    /// New tokens go to the bottom.
    Queue,
    /// Unordered; kept sorted by token id.
    Set,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDef {
    pub id: ZoneId,
    #[serde(default)]
    pub owner: ZoneOwner,
    #[serde(default)]
    pub visibility: ZoneVisibility,
    #[serde(default)]
    pub ordering: ZoneOrdering,
    /// Concrete ids of adjacent zones.
    #[serde(default)]
    pub adjacent: Vec<ZoneId>,
    #[serde(default)]
    pub map_space: bool,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl ZoneDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ZoneId::new(id),
            owner: ZoneOwner::None,
            visibility: ZoneVisibility::Public,
            ordering: ZoneOrdering::Stack,
            adjacent: Vec::new(),
            map_space: false,
            attributes: BTreeMap::new(),
        }
    }

    /// Concrete zone ids this declaration instantiates for `player_count` seats.
    pub fn instances(&self, player_count: u32) -> Vec<ZoneId> {
        match self.owner {
            ZoneOwner::None => vec![self.id.clone()],
            ZoneOwner::Player => (0..player_count)
                .map(|seat| ZoneId::owned(&self.id, crate::state::PlayerId(seat)))
                .collect(),
        }
    }
}
