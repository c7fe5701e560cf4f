//! Static configuration store
//!
//! The combat core reads its tunables through the `StaticConfig` trait, a plain
//! key -> f64 lookup. `StaticConfigStore` is the in-process implementation,
//! seeded with defaults for every key the core consults and optionally
//! overridden from a TOML `[static]` table.

use ahash::AHashMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

use crate::combat::damage::DamageType;
use crate::core::error::Result;

/// Key -> value lookup for global tunables
pub trait StaticConfig {
    /// Returns the configured value, or 0.0 when the key is unknown
    fn get_static_double(&self, key: &str) -> f64;
}

// === KEYS ===

pub const BONY_PART_EFFECTIVE_HEALTH_MODIFIER: &str = "BonyPartEffectiveHealthModifier";

pub const BRAIN_MINOR_DAMAGE_RATIO: &str = "BrainMinorDamageRatio";
pub const BRAIN_CONCUSSION_RATIO: &str = "BrainConcussionRatio";
pub const BRAIN_MAJOR_DAMAGE_RATIO: &str = "BrainMajorDamageRatio";

pub const POSITRONIC_BRAIN_MINOR_DAMAGE_RATIO: &str = "PositronicBrainMinorDamageRatio";
pub const POSITRONIC_BRAIN_CONCUSSION_RATIO: &str = "PositronicBrainConcussionRatio";
pub const POSITRONIC_BRAIN_MAJOR_DAMAGE_RATIO: &str = "PositronicBrainMajorDamageRatio";

/// Damage absorbed before a bony external part starts taking bone damage
pub fn bone_break_leeway_key(damage_type: DamageType) -> String {
    format!("BoneBreakLeeway{}", damage_type.name())
}

/// Multiplier applied to damage above the leeway on a bony external part
pub fn bone_break_multiplier_key(damage_type: DamageType) -> String {
    format!("BoneBreakMultiplier{}", damage_type.name())
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default, rename = "static")]
    values: AHashMap<String, f64>,
}

/// In-memory static configuration with built-in defaults
#[derive(Debug, Clone)]
pub struct StaticConfigStore {
    values: AHashMap<String, f64>,
}

impl Default for StaticConfigStore {
    fn default() -> Self {
        let mut values = AHashMap::new();

        for damage_type in DamageType::all() {
            let (leeway, multiplier) = default_bone_break(damage_type);
            values.insert(bone_break_leeway_key(damage_type), leeway);
            values.insert(bone_break_multiplier_key(damage_type), multiplier);
        }

        // A fused skin-and-bone part has half the distinguishable bone capacity
        values.insert(BONY_PART_EFFECTIVE_HEALTH_MODIFIER.to_string(), 0.5);

        values.insert(BRAIN_MINOR_DAMAGE_RATIO.to_string(), 0.8);
        values.insert(BRAIN_CONCUSSION_RATIO.to_string(), 0.5);
        values.insert(BRAIN_MAJOR_DAMAGE_RATIO.to_string(), 0.2);
        values.insert(POSITRONIC_BRAIN_MINOR_DAMAGE_RATIO.to_string(), 0.75);
        values.insert(POSITRONIC_BRAIN_CONCUSSION_RATIO.to_string(), 0.4);
        values.insert(POSITRONIC_BRAIN_MAJOR_DAMAGE_RATIO.to_string(), 0.1);

        Self { values }
    }
}

/// (leeway, multiplier) defaults per damage type
fn default_bone_break(damage_type: DamageType) -> (f64, f64) {
    use DamageType::*;
    match damage_type {
        Crushing | Falling | Shockwave | Wrenching => (5.0, 1.0),
        Chopping | Ballistic | BallisticArmourPiercing => (8.0, 0.5),
        Slashing | Piercing | Bite | Claw | Shearing | ArmourPiercing | Shrapnel => (10.0, 0.25),
        Eldritch | Arcane => (10.0, 0.25),
        // Full ordinary damage, never any bone damage
        _ => (f64::MAX, 1.0),
    }
}

impl StaticConfigStore {
    /// Create a store holding only the built-in defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document and apply its `[static]` table over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut store = Self::default();
        store.values.extend(file.values);
        Ok(store)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Override a single key
    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
}

impl StaticConfig for StaticConfigStore {
    fn get_static_double(&self, key: &str) -> f64 {
        match self.values.get(key) {
            Some(value) => *value,
            None => {
                tracing::warn!("Static config key {} is not set, using 0.0", key);
                0.0
            }
        }
    }
}

// === GLOBAL CONFIG ACCESS ===

static CONFIG: OnceLock<StaticConfigStore> = OnceLock::new();

/// Get the global static config (initializes with defaults if not set)
pub fn static_config() -> &'static StaticConfigStore {
    CONFIG.get_or_init(StaticConfigStore::default)
}

/// Set the global static config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_static_config(config: StaticConfigStore) -> std::result::Result<(), StaticConfigStore> {
    CONFIG.set(config)
}
