//! Strike resolution: where a blow lands and what it does to the part

pub mod damage;
pub mod fracture;
pub mod hit;
pub mod strike;

pub use damage::{Damage, DamageType};
pub use fracture::{classify_fracture, effective_bone_life, is_severed, FractureSplit};
pub use hit::{resolve_from_surface, resolve_hit, HitOptions, HitResult};
pub use strike::{strike, strike_from, StrikeOutcome};
