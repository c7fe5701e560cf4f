use thiserror::Error;

use crate::anatomy::node::NodeKind;
use crate::core::types::{LimbId, NodeId, SpeciesId};

#[derive(Error, Debug)]
pub enum AnatomyError {
    #[error("{internal:?} is already contained in {external:?}")]
    DuplicateContainment { external: NodeId, internal: NodeId },

    #[error("{organ:?} is already covered by {bone:?}")]
    DuplicateCoverage { bone: NodeId, organ: NodeId },

    #[error("{internal:?} is not contained in {external:?}")]
    NotContained { external: NodeId, internal: NodeId },

    #[error("{organ:?} is not covered by {bone:?}")]
    NotCovered { bone: NodeId, organ: NodeId },

    #[error("Linking {node:?} to {target:?} would create a cycle")]
    CyclicLink { node: NodeId, target: NodeId },

    #[error("Unknown damage type: {0}")]
    UnknownDamageType(String),

    #[error("Containing part {0:?} has no positive max life")]
    DegenerateMaxLife(NodeId),

    #[error("Unknown bodypart: {0:?}")]
    UnknownNode(NodeId),

    #[error("Unknown bodypart name: {0}")]
    UnknownNodeName(String),

    #[error("Unknown limb: {0:?}")]
    UnknownLimb(LimbId),

    #[error("Unknown species: {0:?}")]
    UnknownSpecies(SpeciesId),

    #[error("Bodypart {node:?} is {actual:?}, expected {expected}")]
    WrongKind {
        node: NodeId,
        actual: NodeKind,
        expected: &'static str,
    },

    #[error("Chance {0} is outside 0..=100")]
    ChanceOutOfRange(f64),

    #[error("Duplicate bodypart name: {0}")]
    DuplicateName(String),

    #[error("No targetable bodyparts remain")]
    NoTargetableParts,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Schema parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AnatomyError>;
