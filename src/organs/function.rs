//! Organ function
//!
//! An organ's function factor falls with damage to the part that houses it
//! and with blood pooling around it. Medical stabilisation sets a floor, and
//! an organ forced ineffective drops straight to that floor.

use serde::{Deserialize, Serialize};

use crate::anatomy::node::{ExternalKind, OrganKind};
use crate::body::state::{Body, StatusEffect};
use crate::body::usability::BodypartUsability;
use crate::core::config::StaticConfig;
use crate::core::error::{AnatomyError, Result};
use crate::core::types::NodeId;
use crate::effects::notification::{Notification, Sense};
use crate::organs::thresholds::{threshold_events, ThresholdEvent};

/// Result of recomputing one organ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionChange {
    pub organ: NodeId,
    pub old: f64,
    pub new: f64,
    pub events: Vec<ThresholdEvent>,
    /// Set when this organ was the last one providing a sense
    pub sense_lost: Option<Sense>,
}

impl FunctionChange {
    pub fn notifications(&self) -> Vec<Notification> {
        let mut out: Vec<Notification> = self
            .events
            .iter()
            .copied()
            .map(Notification::OrganThreshold)
            .collect();
        if let Some(sense) = self.sense_lost {
            out.push(Notification::SenseLost { sense });
        }
        out
    }
}

/// The part whose wounds count against an organ: its primary container,
/// or the organ itself when nothing houses it
pub fn housing_node(body: &Body, organ: NodeId) -> NodeId {
    body.schema()
        .containment()
        .primary_container(organ)
        .unwrap_or(organ)
}

fn stabilised_floor(body: &Body, organ: NodeId) -> f64 {
    body.effects()
        .iter()
        .filter_map(|e| match e {
            StatusEffect::StabilisedOrgan { organ: o, floor } if *o == organ => Some(*floor),
            _ => None,
        })
        .fold(0.0, f64::max)
}

fn internal_bleeding(body: &Body, organ: NodeId) -> f64 {
    body.effects()
        .iter()
        .filter_map(|e| match e {
            StatusEffect::InternalBleeding { organ: o, volume } if *o == organ => Some(*volume),
            _ => None,
        })
        .sum()
}

/// Current function factor of an organ, usually in [0, 1]
pub fn function_factor(body: &Body, organ: NodeId) -> Result<f64> {
    let part = body.schema().require(organ)?;
    let attrs = part.as_organ().ok_or(AnatomyError::WrongKind {
        node: organ,
        actual: part.kind(),
        expected: "an organ",
    })?;

    let floor = stabilised_floor(body, organ);
    if body.has_effect(&StatusEffect::OrganIneffective { organ }) {
        return Ok(floor);
    }

    let housing = housing_node(body, organ);
    let max_life = body.node(housing).map_or(0.0, |n| n.common.max_life);
    if max_life <= 0.0 {
        tracing::debug!(
            "{}, treating organ {:?} as failed",
            AnatomyError::DegenerateMaxLife(housing),
            organ
        );
        return Ok(0.0);
    }
    let damage_ratio = body.damage_on(housing) / max_life;

    let blood_effect = match attrs.blood_buildup_failure_volume {
        Some(failure) if failure > 0.0 => internal_bleeding(body, organ) / failure,
        Some(failure) => {
            tracing::warn!(
                "Organ {:?} has blood failure volume {}, ignoring blood build-up",
                organ,
                failure
            );
            0.0
        }
        None => 0.0,
    };

    Ok(floor.max(1.0 - damage_ratio - blood_effect))
}

/// Whether any present part still provides the sense
pub fn has_sense(body: &Body, sense: Sense) -> bool {
    let schema = body.schema();
    match sense {
        Sense::Sight => schema
            .externals()
            .filter(|n| n.external_kind() == Some(ExternalKind::Eye))
            .any(|n| body.can_use_bodypart(n.id()).is_usable()),
        Sense::Hearing => schema
            .organs()
            .filter(|n| n.organ_kind() == Some(OrganKind::Ear))
            .any(|n| body.is_present(n.id()) && body.organ_function(n.id()) > 0.0),
    }
}

/// Recompute an organ's function, update the body's cache and report what changed
pub fn recompute_organ_function(
    body: &mut Body,
    organ: NodeId,
    config: &dyn StaticConfig,
) -> Result<FunctionChange> {
    let new = function_factor(body, organ)?;
    let kind = body
        .node(organ)
        .and_then(|n| n.organ_kind())
        .unwrap_or(OrganKind::Other);

    let old = body.set_organ_function(organ, new);
    let events = threshold_events(organ, kind, old, new, config);

    let went_deaf =
        kind == OrganKind::Ear && old > 0.0 && new <= 0.0 && !has_sense(body, Sense::Hearing);
    let sense_lost = went_deaf.then_some(Sense::Hearing);

    if !events.is_empty() {
        tracing::debug!(
            "Organ {:?} function {:.2} -> {:.2}, {} threshold(s)",
            organ,
            old,
            new,
            events.len()
        );
    }

    Ok(FunctionChange {
        organ,
        old,
        new,
        events,
        sense_lost,
    })
}

/// Recompute every organ on the body, in id order
pub fn recompute_all(body: &mut Body, config: &dyn StaticConfig) -> Result<Vec<FunctionChange>> {
    let organs: Vec<NodeId> = body.schema().organs().map(|n| n.id()).collect();
    organs
        .into_iter()
        .map(|organ| recompute_organ_function(body, organ, config))
        .collect()
}
