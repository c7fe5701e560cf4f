//! Per-character body state and usability queries

pub mod state;
pub mod usability;

pub use state::{Body, EffectSeverity, HeldItem, Position, StatusEffect, Wound};
pub use usability::{BodypartUsability, UsabilityReason};
