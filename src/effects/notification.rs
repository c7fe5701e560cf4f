//! Narrative events raised by the body
//!
//! Nothing in the core prints. Organ and part behaviour returns these values
//! and a presentation layer decides how to show them.

use serde::{Deserialize, Serialize};

use crate::anatomy::node::OrganKind;
use crate::anatomy::schema::BodySchema;
use crate::body::state::{EffectSeverity, Position};
use crate::body::usability::UsabilityReason;
use crate::core::types::NodeId;
use crate::organs::thresholds::{Crossing, ThresholdEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    Sight,
    Hearing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    OrganThreshold(ThresholdEvent),
    PartUnusable {
        node: NodeId,
        reason: UsabilityReason,
        severity: EffectSeverity,
    },
    PartSevered {
        node: NodeId,
    },
    BoneBroken {
        node: NodeId,
    },
    ItemDropped {
        node: NodeId,
        item: String,
        reason: UsabilityReason,
        retrievable: bool,
    },
    /// One sensory part stopped working
    SenseImpaired {
        node: NodeId,
        sense: Sense,
    },
    /// Every part providing the sense has stopped working
    SenseLost {
        sense: Sense,
    },
    SpeechLost {
        node: NodeId,
    },
    BreathLost {
        organ: NodeId,
    },
    PositionChanged {
        from: Position,
        to: Position,
    },
    FlightLost,
}

fn part_name(schema: &BodySchema, node: NodeId) -> &str {
    schema.node(node).map_or("part", |n| n.name())
}

fn cause(reason: UsabilityReason) -> &'static str {
    match reason {
        UsabilityReason::LimbDamage => "limb is too damaged",
        UsabilityReason::LimbPain => "limb is in too much pain",
        UsabilityReason::PartDamage => "is too damaged",
        UsabilityReason::PartPain => "is in too much pain",
        UsabilityReason::Severed => "has been severed",
        UsabilityReason::NonFunctionalProsthetic => "prosthetic has stopped working",
        UsabilityReason::LimbGrappled => "limb is grappled",
        UsabilityReason::MissingBone => "has a broken bone",
        UsabilityReason::SpinalDamage => "is paralysed by spinal damage",
        UsabilityReason::CanUse => "is fine",
    }
}

fn organ_stage(kind: OrganKind, stage: usize, direction: Crossing) -> &'static str {
    let worse = direction == Crossing::Downward;
    match (kind, stage, worse) {
        (OrganKind::Heart, 0, true) => "feels a twinge in the chest",
        (OrganKind::Heart, 1, true) => "feels heart pain worsening",
        (OrganKind::Heart, _, true) => "clutches at a failing heart",
        (OrganKind::Heart, _, false) => "feels the heart pain ease",
        (OrganKind::Brain | OrganKind::PositronicBrain, 0, true) => "feels a little dazed",
        (OrganKind::Brain | OrganKind::PositronicBrain, 1, true) => "is concussed",
        (OrganKind::Brain | OrganKind::PositronicBrain, _, true) => "has suffered major brain damage",
        (OrganKind::Brain | OrganKind::PositronicBrain, _, false) => "is thinking more clearly",
        (OrganKind::Trachea | OrganKind::Lung, _, true) => "struggles to breathe",
        (OrganKind::Trachea | OrganKind::Lung, _, false) => "breathes more easily",
        (OrganKind::Ear, _, true) => "can barely hear out of one ear",
        (OrganKind::Ear, _, false) => "hears better out of one ear",
        (OrganKind::PowerCore, _, true) => "feels power output dropping",
        (OrganKind::PowerCore, _, false) => "feels power output recovering",
        (_, _, true) => "feels something give inside",
        (_, _, false) => "feels something recover inside",
    }
}

impl Notification {
    /// Plain text line for logs and the demo binary
    pub fn describe(&self, schema: &BodySchema) -> String {
        match self {
            Notification::OrganThreshold(event) => format!(
                "{}: {}",
                part_name(schema, event.organ),
                organ_stage(event.organ_kind, event.stage, event.direction)
            ),
            Notification::PartUnusable { node, reason, .. } => {
                format!("{} {}", part_name(schema, *node), cause(*reason))
            }
            Notification::PartSevered { node } => {
                format!("{} is severed", part_name(schema, *node))
            }
            Notification::BoneBroken { node } => format!("{} breaks", part_name(schema, *node)),
            Notification::ItemDropped {
                node, item, reason, ..
            } => format!(
                "loses grip on {} because {} {}",
                item,
                part_name(schema, *node),
                cause(*reason)
            ),
            Notification::SenseImpaired { node, sense } => match sense {
                Sense::Sight => format!("can no longer see out of {}", part_name(schema, *node)),
                Sense::Hearing => format!("can no longer hear out of {}", part_name(schema, *node)),
            },
            Notification::SenseLost { sense } => match sense {
                Sense::Sight => "is blind".to_string(),
                Sense::Hearing => "is deaf".to_string(),
            },
            Notification::SpeechLost { node } => {
                format!("can no longer speak with {}", part_name(schema, *node))
            }
            Notification::BreathLost { organ } => {
                format!("cannot draw breath through {}", part_name(schema, *organ))
            }
            Notification::PositionChanged { to, .. } => match to {
                Position::Prone => "falls to the ground".to_string(),
                Position::Sitting => "slumps into a sitting position".to_string(),
                Position::Standing => "stands up".to_string(),
            },
            Notification::FlightLost => "can no longer fly and plummets".to_string(),
        }
    }
}
