//! Organ function thresholds
//!
//! Each organ kind has a descending list of function levels worth telling
//! the owner about. Brains read theirs from static config so species can
//! tune how fragile they are.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::anatomy::node::OrganKind;
use crate::core::config::{
    StaticConfig, BRAIN_CONCUSSION_RATIO, BRAIN_MAJOR_DAMAGE_RATIO, BRAIN_MINOR_DAMAGE_RATIO,
    POSITRONIC_BRAIN_CONCUSSION_RATIO, POSITRONIC_BRAIN_MAJOR_DAMAGE_RATIO,
    POSITRONIC_BRAIN_MINOR_DAMAGE_RATIO,
};
use crate::core::types::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crossing {
    /// Function fell to or below the threshold
    Downward,
    /// Function recovered above the threshold
    Upward,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEvent {
    pub organ: NodeId,
    pub organ_kind: OrganKind,
    pub threshold: f64,
    /// Position in the organ's descending threshold list; 0 is the mildest
    pub stage: usize,
    pub direction: Crossing,
}

/// Descending thresholds for an organ kind, without duplicates
pub fn thresholds_for(kind: OrganKind, config: &dyn StaticConfig) -> Vec<f64> {
    let raw: Vec<f64> = match kind {
        OrganKind::Heart => vec![0.85, 0.65, 0.3],
        OrganKind::Brain => vec![
            config.get_static_double(BRAIN_MINOR_DAMAGE_RATIO),
            config.get_static_double(BRAIN_CONCUSSION_RATIO),
            config.get_static_double(BRAIN_MAJOR_DAMAGE_RATIO),
        ],
        OrganKind::PositronicBrain => vec![
            config.get_static_double(POSITRONIC_BRAIN_MINOR_DAMAGE_RATIO),
            config.get_static_double(POSITRONIC_BRAIN_CONCUSSION_RATIO),
            config.get_static_double(POSITRONIC_BRAIN_MAJOR_DAMAGE_RATIO),
        ],
        OrganKind::Trachea => vec![0.6, 0.3, 0.0],
        OrganKind::PowerCore => vec![0.85, 0.75, 0.5, 0.3, 0.0],
        OrganKind::Lung => vec![0.6, 0.3],
        OrganKind::Ear => vec![0.5, 0.0],
        OrganKind::Liver
        | OrganKind::Kidney
        | OrganKind::Spleen
        | OrganKind::Stomach
        | OrganKind::Intestines
        | OrganKind::Esophagus
        | OrganKind::SpinalCord
        | OrganKind::Other => Vec::new(),
    };

    let mut sorted: Vec<OrderedFloat<f64>> = raw.into_iter().map(OrderedFloat).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    sorted.into_iter().map(|t| t.0).collect()
}

/// Thresholds crossed moving from `old` to `new`, in the order they were passed
///
/// A threshold `t` is crossed downward when `old > t >= new` and upward when
/// `old <= t < new`. Equal values cross nothing.
pub fn crossed(thresholds: &[f64], old: f64, new: f64) -> Vec<(usize, f64, Crossing)> {
    if old == new {
        return Vec::new();
    }

    let mut events: Vec<(usize, f64, Crossing)> = thresholds
        .iter()
        .enumerate()
        .filter_map(|(stage, &t)| {
            if old > t && t >= new {
                Some((stage, t, Crossing::Downward))
            } else if old <= t && t < new {
                Some((stage, t, Crossing::Upward))
            } else {
                None
            }
        })
        .collect();

    // Recovery passes the most severe threshold first
    if new > old {
        events.reverse();
    }
    events
}

/// Threshold events for one organ's change in function
pub fn threshold_events(
    organ: NodeId,
    kind: OrganKind,
    old: f64,
    new: f64,
    config: &dyn StaticConfig,
) -> Vec<ThresholdEvent> {
    crossed(&thresholds_for(kind, config), old, new)
        .into_iter()
        .map(|(stage, threshold, direction)| ThresholdEvent {
            organ,
            organ_kind: kind,
            threshold,
            stage,
            direction,
        })
        .collect()
}
