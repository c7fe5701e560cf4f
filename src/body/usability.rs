//! Whether a bodypart can currently be used, and if not, why

use serde::{Deserialize, Serialize};

use crate::anatomy::node::{Capability, NodeKind};
use crate::body::state::Body;
use crate::core::types::NodeId;

/// Why a part cannot be used. `CanUse` means it can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsabilityReason {
    LimbDamage,
    LimbPain,
    PartDamage,
    PartPain,
    Severed,
    NonFunctionalProsthetic,
    LimbGrappled,
    MissingBone,
    SpinalDamage,
    CanUse,
}

impl UsabilityReason {
    pub fn is_usable(&self) -> bool {
        matches!(self, UsabilityReason::CanUse)
    }

    /// Pain reasons raise pain effects; everything else raises damage effects
    pub fn is_pain(&self) -> bool {
        matches!(self, UsabilityReason::LimbPain | UsabilityReason::PartPain)
    }
}

/// The combat layer's view of part usability
pub trait BodypartUsability {
    fn can_use_bodypart(&self, node: NodeId) -> UsabilityReason;
}

impl BodypartUsability for Body {
    fn can_use_bodypart(&self, node: NodeId) -> UsabilityReason {
        let Some(part) = self.node(node) else {
            return UsabilityReason::Severed;
        };
        if !self.is_present(node) {
            return UsabilityReason::Severed;
        }
        if self.prosthetic(node) == Some(false) {
            return UsabilityReason::NonFunctionalProsthetic;
        }

        if part.kind() == NodeKind::Organ {
            return if self.organ_function(node) <= 0.0 {
                UsabilityReason::PartDamage
            } else {
                UsabilityReason::CanUse
            };
        }

        let max_life = part.common.max_life;
        if self.damage_on(node) >= max_life {
            return UsabilityReason::PartDamage;
        }
        if self.pain_on(node) >= max_life {
            return UsabilityReason::PartPain;
        }

        let schema = self.schema();
        if let Some(limb) = schema.limb_for(node) {
            if self.is_limb_grappled(limb.id) {
                return UsabilityReason::LimbGrappled;
            }

            let root_life = schema.node(limb.root).map_or(0.0, |n| n.common.max_life);
            let limb_damage: f64 = limb.members().iter().map(|m| self.damage_on(*m)).sum();
            let limb_pain: f64 = limb.members().iter().map(|m| self.pain_on(*m)).sum();
            if limb_damage >= root_life * limb.damage_threshold_multiplier {
                return UsabilityReason::LimbDamage;
            }
            if limb_pain >= root_life * limb.pain_threshold_multiplier {
                return UsabilityReason::LimbPain;
            }

            // A broken bone anywhere between the part and the limb root
            let mut chain = vec![node];
            chain.extend(
                schema
                    .ancestors(node)
                    .into_iter()
                    .take_while(|a| limb.members().contains(a)),
            );
            let broken = chain.iter().any(|link| {
                self.is_bone_broken(*link)
                    || schema
                        .containment()
                        .contents(*link)
                        .any(|e| e.internal_kind == NodeKind::Bone && self.is_bone_broken(e.internal))
            });
            if broken {
                return UsabilityReason::MissingBone;
            }

            if limb
                .spinal_dependencies
                .iter()
                .any(|organ| self.organ_function(*organ) <= 0.0)
            {
                return UsabilityReason::SpinalDamage;
            }
        } else if part.has(Capability::Bone) && self.is_bone_broken(node) {
            return UsabilityReason::MissingBone;
        }

        UsabilityReason::CanUse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::limb::{Limb, LimbKind};
    use crate::anatomy::node::{BodypartNode, BoneClass, ExternalKind, OrganKind};
    use crate::anatomy::schema::BodySchema;
    use crate::combat::damage::DamageType;
    use crate::core::types::{LimbId, SpeciesId};
    use std::sync::Arc;

    const TORSO: NodeId = NodeId(1);
    const ARM: NodeId = NodeId(2);
    const HAND: NodeId = NodeId(3);
    const HUMERUS: NodeId = NodeId(10);
    const SPINE: NodeId = NodeId(20);

    fn body() -> Body {
        let mut schema = BodySchema::new(SpeciesId(1), "test");
        schema.add_node(BodypartNode::external(TORSO, "torso", ExternalKind::General)).unwrap();
        schema
            .add_node(BodypartNode::external(ARM, "arm", ExternalKind::General).with_max_life(40.0))
            .unwrap();
        schema
            .add_node(BodypartNode::external(HAND, "hand", ExternalKind::General).with_max_life(20.0))
            .unwrap();
        schema.add_node(BodypartNode::bone(HUMERUS, "humerus", BoneClass::Standard)).unwrap();
        schema.add_node(BodypartNode::organ(SPINE, "spinal cord", OrganKind::SpinalCord)).unwrap();
        schema.set_upstream(ARM, Some(TORSO)).unwrap();
        schema.set_upstream(HAND, Some(ARM)).unwrap();
        schema.add_containment(ARM, HUMERUS, 50.0, None).unwrap();
        schema.add_limb(Limb::new(LimbId(1), "torso", LimbKind::Torso, TORSO)).unwrap();
        schema
            .add_limb(
                Limb::new(LimbId(2), "arm", LimbKind::Arm, ARM)
                    .with_thresholds(1.2, 2.0)
                    .with_spinal_dependency(SPINE),
            )
            .unwrap();
        Body::new(Arc::new(schema))
    }

    #[test]
    fn test_healthy_hand_is_usable() {
        assert_eq!(body().can_use_bodypart(HAND), UsabilityReason::CanUse);
    }

    #[test]
    fn test_part_damage_and_pain() {
        let mut body = body();
        body.wound(HAND, DamageType::Slashing, 25.0, 0.0, 0.0, 0.0);
        assert_eq!(body.can_use_bodypart(HAND), UsabilityReason::PartDamage);

        let mut body = self::body();
        body.wound(HAND, DamageType::Burning, 1.0, 0.0, 25.0, 0.0);
        assert_eq!(body.can_use_bodypart(HAND), UsabilityReason::PartPain);
    }

    #[test]
    fn test_limb_damage_spreads_over_members() {
        let mut body = body();
        // 35 on the arm and 15 on the hand: each under its own max life,
        // together over 1.2 x the arm's 40
        body.wound(ARM, DamageType::Crushing, 35.0, 0.0, 0.0, 0.0);
        body.wound(HAND, DamageType::Crushing, 15.0, 0.0, 0.0, 0.0);
        assert_eq!(body.can_use_bodypart(HAND), UsabilityReason::LimbDamage);
    }

    #[test]
    fn test_grappled_limb() {
        let mut body = body();
        body.grapple_limb(LimbId(2));
        assert_eq!(body.can_use_bodypart(HAND), UsabilityReason::LimbGrappled);
        body.release_limb(LimbId(2));
        assert!(body.can_use_bodypart(HAND).is_usable());
    }

    #[test]
    fn test_broken_upstream_bone() {
        let mut body = body();
        body.set_bone_broken(HUMERUS, true);
        assert_eq!(body.can_use_bodypart(HAND), UsabilityReason::MissingBone);
        assert!(body.can_use_bodypart(TORSO).is_usable());
    }

    #[test]
    fn test_spinal_damage() {
        let mut body = body();
        body.set_organ_function(SPINE, 0.0);
        assert_eq!(body.can_use_bodypart(HAND), UsabilityReason::SpinalDamage);
    }

    #[test]
    fn test_severed_and_prosthetic() {
        let mut body = body();
        body.sever(HAND);
        assert_eq!(body.can_use_bodypart(HAND), UsabilityReason::Severed);
        body.attach_prosthetic(HAND, false);
        assert_eq!(body.can_use_bodypart(HAND), UsabilityReason::NonFunctionalProsthetic);
        body.attach_prosthetic(HAND, true);
        assert!(body.can_use_bodypart(HAND).is_usable());
    }
}
