//! Damage values delivered by the combat layer
//!
//! The damage type set is closed. Strings from authored data or the command
//! line are parsed with `FromStr`, which is the only place an unknown type
//! can surface.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::AnatomyError;

/// Every kind of damage the simulation can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Slashing,
    Chopping,
    Crushing,
    Piercing,
    Ballistic,
    Burning,
    Freezing,
    Chemical,
    Shockwave,
    Bite,
    Claw,
    Electrical,
    Hypoxia,
    Cellular,
    Sonic,
    Shearing,
    BallisticArmourPiercing,
    Wrenching,
    Shrapnel,
    Necrotic,
    Falling,
    Eldritch,
    Arcane,
    ArmourPiercing,
}

impl DamageType {
    pub fn all() -> [DamageType; 24] {
        use DamageType::*;
        [
            Slashing,
            Chopping,
            Crushing,
            Piercing,
            Ballistic,
            Burning,
            Freezing,
            Chemical,
            Shockwave,
            Bite,
            Claw,
            Electrical,
            Hypoxia,
            Cellular,
            Sonic,
            Shearing,
            BallisticArmourPiercing,
            Wrenching,
            Shrapnel,
            Necrotic,
            Falling,
            Eldritch,
            Arcane,
            ArmourPiercing,
        ]
    }

    pub fn name(&self) -> &'static str {
        use DamageType::*;
        match self {
            Slashing => "Slashing",
            Chopping => "Chopping",
            Crushing => "Crushing",
            Piercing => "Piercing",
            Ballistic => "Ballistic",
            Burning => "Burning",
            Freezing => "Freezing",
            Chemical => "Chemical",
            Shockwave => "Shockwave",
            Bite => "Bite",
            Claw => "Claw",
            Electrical => "Electrical",
            Hypoxia => "Hypoxia",
            Cellular => "Cellular",
            Sonic => "Sonic",
            Shearing => "Shearing",
            BallisticArmourPiercing => "BallisticArmourPiercing",
            Wrenching => "Wrenching",
            Shrapnel => "Shrapnel",
            Necrotic => "Necrotic",
            Falling => "Falling",
            Eldritch => "Eldritch",
            Arcane => "Arcane",
            ArmourPiercing => "ArmourPiercing",
        }
    }

    /// Hard/kinetic damage that a plain bone takes entirely as bone damage
    pub fn is_kinetic(&self) -> bool {
        use DamageType::*;
        // Exhaustive on purpose: adding a type must force a decision here
        match self {
            Slashing | Chopping | Crushing | Piercing | Ballistic | Shockwave | Bite | Claw
            | Shearing | BallisticArmourPiercing | ArmourPiercing | Wrenching | Shrapnel
            | Falling | Eldritch | Arcane => true,
            Burning | Freezing | Chemical | Electrical | Hypoxia | Cellular | Sonic
            | Necrotic => false,
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DamageType {
    type Err = AnatomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['_', '-', ' '], "");
        DamageType::all()
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| AnatomyError::UnknownDamageType(s.to_string()))
    }
}

/// A single incoming hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    /// Never negative
    pub amount: f64,
    pub damage_type: DamageType,
}

impl Damage {
    /// Negative amounts are clamped to zero
    pub fn new(amount: f64, damage_type: DamageType) -> Self {
        Self {
            amount: amount.max(0.0),
            damage_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinetic_set_has_sixteen_members() {
        let kinetic = DamageType::all().iter().filter(|t| t.is_kinetic()).count();
        assert_eq!(kinetic, 16);
    }

    #[test]
    fn test_parse_is_case_and_separator_insensitive() {
        assert_eq!("crushing".parse::<DamageType>().unwrap(), DamageType::Crushing);
        assert_eq!(
            "ballistic_armour_piercing".parse::<DamageType>().unwrap(),
            DamageType::BallisticArmourPiercing
        );
        assert_eq!("Armour-Piercing".parse::<DamageType>().unwrap(), DamageType::ArmourPiercing);
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let err = "plasma".parse::<DamageType>().unwrap_err();
        assert!(matches!(err, AnatomyError::UnknownDamageType(ref s) if s == "plasma"));
    }

    #[test]
    fn test_negative_amount_clamped() {
        assert_eq!(Damage::new(-3.0, DamageType::Burning).amount, 0.0);
    }
}
