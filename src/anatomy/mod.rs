//! Species anatomy: bodypart definitions and the graphs built over them

pub mod catalog;
pub mod containment;
pub mod coverage;
pub mod limb;
pub mod loader;
pub mod node;
pub mod schema;

pub use catalog::PartCatalog;
pub use containment::{ContainmentEdge, ContainmentGraph};
pub use coverage::{CoverageEdge, CoverageGraph};
pub use limb::{Limb, LimbKind, LimbPartition};
pub use node::{
    BodypartNode, BoneAttrs, BoneClass, Capability, CommonAttrs, ExternalAttrs, ExternalKind,
    HitChanceOverride, NodeKind, NodeVariant, OrganAttrs, OrganKind,
};
pub use schema::BodySchema;
