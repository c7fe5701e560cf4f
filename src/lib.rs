//! Anatomy Engine - species body schemas and damage resolution
//!
//! Bodies are graphs of external parts, bones and organs. A strike picks a
//! part, splits its damage between flesh and bone, and the body reports what
//! stopped working as a result.

pub mod anatomy;
pub mod body;
pub mod combat;
pub mod core;
pub mod effects;
pub mod organs;
