//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for characters that own a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for items held or wielded by a bodypart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable identifier of a bodypart within its species schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Stable identifier of a limb within its species schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LimbId(pub u32);

/// Identifier of a species body schema in the part catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub u32);

/// Identifier of a wound on one character's body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WoundId(pub u32);

/// Side of the body a part sits on, or the side a strike comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
    Center,
    #[default]
    Irrelevant,
}

impl Alignment {
    /// Whether a strike from this side can land on a part with `part` alignment
    pub fn admits(&self, part: Alignment) -> bool {
        match self {
            Alignment::Irrelevant => true,
            Alignment::Center => matches!(part, Alignment::Center | Alignment::Irrelevant),
            side => part == *side || matches!(part, Alignment::Center | Alignment::Irrelevant),
        }
    }
}

/// Facing of a part, or the facing a strike comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Front,
    Back,
    Top,
    Bottom,
    #[default]
    Irrelevant,
}

impl Orientation {
    pub fn admits(&self, part: Orientation) -> bool {
        *self == Orientation::Irrelevant || part == Orientation::Irrelevant || part == *self
    }
}

/// Rough physical size of a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizeCategory {
    Tiny,
    VerySmall,
    Small,
    #[default]
    Normal,
    Large,
    VeryLarge,
    Huge,
}

/// Physical outline of a part, used for wear-slot matching and description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Head,
    Face,
    Neck,
    #[default]
    Torso,
    Arm,
    Hand,
    Finger,
    Leg,
    Foot,
    Wing,
    Tail,
    Eye,
    Ear,
    Mouth,
    Internal,
}
