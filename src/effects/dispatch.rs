//! Consequences of parts becoming unusable
//!
//! `dispatch_effects` raises the generic damage or pain effect for a part,
//! then applies whatever its kind adds on top: dropped items, lost senses,
//! falling over, falling out of the sky.

use serde::{Deserialize, Serialize};

use crate::anatomy::node::{BodypartNode, ExternalKind, NodeKind, OrganKind};
use crate::body::state::{Body, EffectSeverity, Position, StatusEffect};
use crate::body::usability::{BodypartUsability, UsabilityReason};
use crate::combat::strike::StrikeOutcome;
use crate::core::config::StaticConfig;
use crate::core::error::Result;
use crate::core::types::NodeId;
use crate::effects::notification::{Notification, Sense};
use crate::organs::function::{has_sense, recompute_all};

/// What one dispatch did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dispatch {
    /// Whether anything new happened to the body
    pub produced: bool,
    pub notifications: Vec<Notification>,
}

impl Dispatch {
    fn push(&mut self, notification: Notification) {
        self.produced = true;
        self.notifications.push(notification);
    }

    fn extend(&mut self, other: Dispatch) {
        self.produced |= other.produced;
        self.notifications.extend(other.notifications);
    }
}

fn severity_of(node: &BodypartNode) -> EffectSeverity {
    if node.common.significant {
        EffectSeverity::Major
    } else {
        EffectSeverity::Minor
    }
}

fn generic_effect(node: NodeId, reason: UsabilityReason, severity: EffectSeverity) -> StatusEffect {
    if reason.is_pain() {
        StatusEffect::ExcessivelyPainful { node, severity }
    } else {
        StatusEffect::ExcessivelyDamaged { node, severity }
    }
}

/// Apply the consequences of `node` being unusable for `reason`
pub fn dispatch_effects(body: &mut Body, node: NodeId, reason: UsabilityReason) -> Result<Dispatch> {
    let mut dispatch = Dispatch::default();
    if reason.is_usable() {
        return Ok(dispatch);
    }

    let schema = body.schema_arc();
    let part = schema.require(node)?;

    let severity = severity_of(part);
    let fresh = body.add_effect(generic_effect(node, reason, severity));
    if fresh {
        dispatch.push(Notification::PartUnusable {
            node,
            reason,
            severity,
        });
    }

    if let Some(ext) = part.as_external() {
        if ext.grabbing || ext.wielding {
            dispatch.extend(drop_held(body, node, reason));
        }
    }

    if fresh {
        match (part.kind(), part.external_kind(), part.organ_kind()) {
            (NodeKind::External, Some(ExternalKind::Eye), _) => {
                dispatch.push(Notification::SenseImpaired {
                    node,
                    sense: Sense::Sight,
                });
                if !has_sense(body, Sense::Sight) {
                    dispatch.push(Notification::SenseLost { sense: Sense::Sight });
                }
            }
            (NodeKind::External, Some(ExternalKind::Tongue), _) => {
                dispatch.push(Notification::SpeechLost { node });
            }
            (NodeKind::Organ, _, Some(OrganKind::Ear)) => {
                dispatch.push(Notification::SenseImpaired {
                    node,
                    sense: Sense::Hearing,
                });
                if !has_sense(body, Sense::Hearing) {
                    dispatch.push(Notification::SenseLost {
                        sense: Sense::Hearing,
                    });
                }
            }
            (NodeKind::Organ, _, Some(OrganKind::Trachea)) => {
                dispatch.push(Notification::BreathLost { organ: node });
            }
            _ => {}
        }
    }

    match part.external_kind() {
        Some(ExternalKind::Standing) => {
            if let Some(notification) = revalidate_position(body) {
                dispatch.push(notification);
            }
        }
        Some(ExternalKind::Wing) => {
            if let Some(notification) = revalidate_flight(body) {
                dispatch.push(notification);
            }
        }
        _ => {}
    }

    if dispatch.produced {
        tracing::debug!(
            "{:?} unusable ({:?}): {} notification(s)",
            node,
            reason,
            dispatch.notifications.len()
        );
    }
    Ok(dispatch)
}

/// Force-drop everything held in a part. Items dropped mid-combat cannot be
/// picked straight back up.
fn drop_held(body: &mut Body, node: NodeId, reason: UsabilityReason) -> Dispatch {
    let mut dispatch = Dispatch::default();
    for mut item in body.take_held(node) {
        item.retrievable = !body.in_combat;
        dispatch.push(Notification::ItemDropped {
            node,
            item: item.name.clone(),
            reason,
            retrievable: item.retrievable,
        });
        body.dropped.push(item);
    }
    dispatch
}

/// Fall prone when nothing is left to stand on
///
/// Only ever knocks the owner down. Getting back up is a deliberate action
/// for the movement layer, so a prone body stays prone after healing.
pub fn revalidate_position(body: &mut Body) -> Option<Notification> {
    if body.position != Position::Standing {
        return None;
    }
    let can_stand = body
        .schema()
        .externals()
        .filter(|n| n.external_kind() == Some(ExternalKind::Standing))
        .any(|n| body.can_use_bodypart(n.id()).is_usable());
    if can_stand {
        return None;
    }

    let from = body.position;
    body.position = Position::Prone;
    tracing::debug!("{:?} can no longer stand", body.owner);
    Some(Notification::PositionChanged {
        from,
        to: Position::Prone,
    })
}

/// Stop flying unless every wing still works
pub fn revalidate_flight(body: &mut Body) -> Option<Notification> {
    if !body.flying {
        return None;
    }
    let can_fly = {
        let mut wings = body
            .schema()
            .externals()
            .filter(|n| n.external_kind() == Some(ExternalKind::Wing))
            .peekable();
        wings.peek().is_some() && wings.all(|n| body.can_use_bodypart(n.id()).is_usable())
    };
    if can_fly {
        return None;
    }

    body.flying = false;
    tracing::debug!("{:?} can no longer fly", body.owner);
    Some(Notification::FlightLost)
}

/// Bring the body's derived state up to date after its wounds changed
///
/// Recomputes every organ, clears generic effects on parts that recovered
/// and dispatches effects for every part that cannot be used.
pub fn settle(body: &mut Body, config: &dyn StaticConfig) -> Result<Vec<Notification>> {
    let mut notifications = Vec::new();
    for change in recompute_all(body, config)? {
        notifications.extend(change.notifications());
    }

    let nodes: Vec<NodeId> = body.schema().nodes().map(|n| n.id()).collect();
    for node in nodes {
        let reason = body.can_use_bodypart(node);
        if reason.is_usable() {
            body.remove_effects(|e| match e {
                StatusEffect::ExcessivelyDamaged { node: n, .. }
                | StatusEffect::ExcessivelyPainful { node: n, .. } => *n == node,
                _ => false,
            });
            continue;
        }
        // Parts the body never had are not news
        if !body.is_present(node) && !body.is_severed(node) && body.prosthetic(node).is_none() {
            continue;
        }
        notifications.extend(dispatch_effects(body, node, reason)?.notifications);
    }

    // An ear failing is reported by both its organ and its part
    let mut unique: Vec<Notification> = Vec::with_capacity(notifications.len());
    for notification in notifications {
        if !unique.contains(&notification) {
            unique.push(notification);
        }
    }
    Ok(unique)
}

/// Everything that follows from one strike
pub fn aftermath(
    body: &mut Body,
    outcome: &StrikeOutcome,
    config: &dyn StaticConfig,
) -> Result<Vec<Notification>> {
    let mut notifications: Vec<Notification> = outcome
        .severed
        .iter()
        .map(|&node| Notification::PartSevered { node })
        .collect();
    notifications.extend(
        outcome
            .newly_broken
            .iter()
            .map(|&node| Notification::BoneBroken { node }),
    );
    notifications.extend(settle(body, config)?);
    Ok(notifications)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::node::BodypartNode;
    use crate::anatomy::schema::BodySchema;
    use crate::body::state::HeldItem;
    use crate::combat::damage::DamageType;
    use crate::core::config::StaticConfigStore;
    use crate::core::types::SpeciesId;
    use std::sync::Arc;

    const TORSO: NodeId = NodeId(1);
    const HAND: NodeId = NodeId(2);
    const LEG: NodeId = NodeId(3);
    const EYE: NodeId = NodeId(4);
    const WING: NodeId = NodeId(5);
    const TONGUE: NodeId = NodeId(6);
    const TRACHEA: NodeId = NodeId(10);

    fn body() -> Body {
        let mut schema = BodySchema::new(SpeciesId(1), "test");
        schema
            .add_node(BodypartNode::external(TORSO, "torso", ExternalKind::General).significant())
            .unwrap();
        schema
            .add_node(
                BodypartNode::external(HAND, "hand", ExternalKind::General)
                    .with_grip(true, true)
                    .with_max_life(20.0),
            )
            .unwrap();
        schema
            .add_node(BodypartNode::external(LEG, "leg", ExternalKind::Standing).with_max_life(30.0))
            .unwrap();
        schema.add_node(BodypartNode::external(EYE, "eye", ExternalKind::Eye)).unwrap();
        schema.add_node(BodypartNode::external(WING, "wing", ExternalKind::Wing)).unwrap();
        schema.add_node(BodypartNode::external(TONGUE, "tongue", ExternalKind::Tongue)).unwrap();
        schema.add_node(BodypartNode::organ(TRACHEA, "trachea", OrganKind::Trachea)).unwrap();
        for part in [HAND, LEG, EYE, WING, TONGUE] {
            schema.set_upstream(part, Some(TORSO)).unwrap();
        }
        schema.add_containment(TORSO, TRACHEA, 5.0, None).unwrap();
        Body::new(Arc::new(schema))
    }

    #[test]
    fn test_can_use_is_a_no_op() {
        let mut body = body();
        let dispatch = dispatch_effects(&mut body, HAND, UsabilityReason::CanUse).unwrap();
        assert!(!dispatch.produced);
        assert!(body.effects().is_empty());
    }

    #[test]
    fn test_generic_effect_raised_once() {
        let mut body = body();
        let first = dispatch_effects(&mut body, TORSO, UsabilityReason::PartDamage).unwrap();
        assert!(first.produced);
        assert!(body.has_effect(&StatusEffect::ExcessivelyDamaged {
            node: TORSO,
            severity: EffectSeverity::Major,
        }));

        let second = dispatch_effects(&mut body, TORSO, UsabilityReason::PartDamage).unwrap();
        assert!(!second.produced);

        // Pain is a separate cause
        let pain = dispatch_effects(&mut body, TORSO, UsabilityReason::PartPain).unwrap();
        assert!(pain.produced);
        assert_eq!(body.effects().len(), 2);
    }

    #[test]
    fn test_insignificant_part_gets_minor_effect() {
        let mut body = body();
        dispatch_effects(&mut body, LEG, UsabilityReason::LimbPain).unwrap();
        assert!(body.has_effect(&StatusEffect::ExcessivelyPainful {
            node: LEG,
            severity: EffectSeverity::Minor,
        }));
    }

    #[test]
    fn test_hand_drops_items_in_combat() {
        let mut body = body();
        body.in_combat = true;
        body.hold(HAND, HeldItem::new("sword", true));
        let dispatch = dispatch_effects(&mut body, HAND, UsabilityReason::LimbGrappled).unwrap();

        assert!(body.held_items(HAND).is_empty());
        assert_eq!(body.dropped.len(), 1);
        assert!(!body.dropped[0].retrievable);
        assert!(dispatch.notifications.iter().any(|n| matches!(
            n,
            Notification::ItemDropped { item, reason: UsabilityReason::LimbGrappled, .. } if item == "sword"
        )));
    }

    #[test]
    fn test_items_dropped_out_of_combat_stay_retrievable() {
        let mut body = body();
        body.hold(HAND, HeldItem::new("cup", false));
        dispatch_effects(&mut body, HAND, UsabilityReason::PartPain).unwrap();
        assert!(body.dropped[0].retrievable);
    }

    #[test]
    fn test_only_eye_lost_means_blind() {
        let mut body = body();
        body.sever(EYE);
        let dispatch = dispatch_effects(&mut body, EYE, UsabilityReason::Severed).unwrap();
        assert!(dispatch
            .notifications
            .contains(&Notification::SenseLost { sense: Sense::Sight }));
    }

    #[test]
    fn test_tongue_and_trachea() {
        let mut body = body();
        let tongue = dispatch_effects(&mut body, TONGUE, UsabilityReason::PartDamage).unwrap();
        assert!(tongue
            .notifications
            .contains(&Notification::SpeechLost { node: TONGUE }));
        let trachea = dispatch_effects(&mut body, TRACHEA, UsabilityReason::PartDamage).unwrap();
        assert!(trachea
            .notifications
            .contains(&Notification::BreathLost { organ: TRACHEA }));
    }

    #[test]
    fn test_losing_only_leg_falls_prone() {
        let config = StaticConfigStore::new();
        let mut body = body();
        body.wound(LEG, DamageType::Crushing, 40.0, 0.0, 0.0, 0.0);
        let notifications = settle(&mut body, &config).unwrap();
        assert_eq!(body.position, Position::Prone);
        assert!(notifications.contains(&Notification::PositionChanged {
            from: Position::Standing,
            to: Position::Prone,
        }));
    }

    #[test]
    fn test_healed_leg_leaves_body_prone() {
        let config = StaticConfigStore::new();
        let mut body = body();
        let wound = body.wound(LEG, DamageType::Crushing, 40.0, 0.0, 0.0, 0.0);
        settle(&mut body, &config).unwrap();
        assert_eq!(body.position, Position::Prone);

        body.heal(wound, 40.0);
        let notifications = settle(&mut body, &config).unwrap();
        assert!(body.can_use_bodypart(LEG).is_usable());
        assert_eq!(body.position, Position::Prone);
        assert!(!notifications
            .iter()
            .any(|n| matches!(n, Notification::PositionChanged { .. })));
    }

    #[test]
    fn test_intact_wings_keep_flying() {
        let mut body = body();
        body.flying = true;
        assert_eq!(revalidate_flight(&mut body), None);
        assert!(body.flying);
    }

    #[test]
    fn test_broken_wing_grounds_flier() {
        let mut body = body();
        body.flying = true;
        body.sever(WING);
        let dispatch = dispatch_effects(&mut body, WING, UsabilityReason::Severed).unwrap();
        assert!(!body.flying);
        assert!(dispatch.notifications.contains(&Notification::FlightLost));
    }

    #[test]
    fn test_settle_clears_recovered_parts() {
        let config = StaticConfigStore::new();
        let mut body = body();
        let wound = body.wound(HAND, DamageType::Slashing, 25.0, 0.0, 0.0, 0.0);
        settle(&mut body, &config).unwrap();
        assert!(body
            .effects()
            .iter()
            .any(|e| matches!(e, StatusEffect::ExcessivelyDamaged { node, .. } if *node == HAND)));

        body.heal(wound, 25.0);
        settle(&mut body, &config).unwrap();
        assert!(body.effects().is_empty());
    }
}
