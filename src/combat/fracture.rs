//! Fracture classification
//!
//! Splits an incoming hit on a bone into ordinary tissue damage and bone
//! damage, and decides severing and breaking.
//!
//! Plain bones route hard/kinetic damage entirely to bone damage and
//! everything else entirely to ordinary damage. Bony external parts derive
//! both figures from per-type leeway and multiplier tunables:
//!
//! - bone = max(0, (amount - leeway) * multiplier)
//! - ordinary = multiplier * amount
//!
//! The two are not complementary for bony parts; their sum may differ from
//! the incoming amount.

use serde::{Deserialize, Serialize};

use crate::anatomy::node::{BodypartNode, NodeVariant};
use crate::body::state::Body;
use crate::combat::damage::Damage;
use crate::core::config::{
    bone_break_leeway_key, bone_break_multiplier_key, StaticConfig,
    BONY_PART_EFFECTIVE_HEALTH_MODIFIER,
};
use crate::core::error::{AnatomyError, Result};
use crate::core::types::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractureSplit {
    pub ordinary: f64,
    pub bone: f64,
}

/// Split a hit on a bone or bony external part
pub fn classify_fracture(
    node: &BodypartNode,
    damage: &Damage,
    config: &dyn StaticConfig,
) -> Result<FractureSplit> {
    let amount = damage.amount;
    match &node.variant {
        NodeVariant::Bone(_) => {
            if damage.damage_type.is_kinetic() {
                Ok(FractureSplit {
                    ordinary: 0.0,
                    bone: amount,
                })
            } else {
                Ok(FractureSplit {
                    ordinary: amount,
                    bone: 0.0,
                })
            }
        }
        NodeVariant::External(ext) if ext.bone.is_some() => {
            let leeway = config.get_static_double(&bone_break_leeway_key(damage.damage_type));
            let multiplier =
                config.get_static_double(&bone_break_multiplier_key(damage.damage_type));
            Ok(FractureSplit {
                ordinary: multiplier * amount,
                bone: ((amount - leeway) * multiplier).max(0.0),
            })
        }
        _ => Err(AnatomyError::WrongKind {
            node: node.id(),
            actual: node.kind(),
            expected: "a bone or bony external part",
        }),
    }
}

/// Whether a single hit severs the part outright
pub fn is_severed(node: &BodypartNode, single_hit_amount: f64) -> bool {
    node.is_severed_by(single_hit_amount)
}

/// Share of max life that counts as bone-only capacity
pub fn bone_effective_health_modifier(node: &BodypartNode, config: &dyn StaticConfig) -> f64 {
    if node.is_bony_external() {
        config.get_static_double(BONY_PART_EFFECTIVE_HEALTH_MODIFIER)
    } else {
        1.0
    }
}

/// Bone damage a part can take before it breaks
pub fn effective_bone_life(node: &BodypartNode, config: &dyn StaticConfig) -> f64 {
    node.common.max_life * bone_effective_health_modifier(node, config)
}

/// Whether accumulated bone damage on unhealed wounds exceeds the bone's capacity
pub fn is_bone_broken(body: &Body, node: NodeId, config: &dyn StaticConfig) -> bool {
    match body.node(node) {
        Some(part) if part.as_bone().is_some() => {
            body.bone_damage_on(node) > effective_bone_life(part, config)
        }
        _ => false,
    }
}

/// Re-derive the body's broken bones from its wounds. Returns newly broken bones.
pub fn refresh_broken_bones(body: &mut Body, config: &dyn StaticConfig) -> Vec<NodeId> {
    let bones: Vec<NodeId> = body.schema().bones().map(|n| n.id()).collect();
    let mut newly_broken = Vec::new();
    for bone in bones {
        let broken = is_bone_broken(body, bone, config);
        if body.set_bone_broken(bone, broken) && broken {
            tracing::debug!("Bone {:?} broke on {:?}", bone, body.owner);
            newly_broken.push(bone);
        }
    }
    newly_broken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::node::{BoneAttrs, BoneClass, ExternalKind};
    use crate::anatomy::schema::BodySchema;
    use crate::combat::damage::DamageType;
    use crate::core::config::StaticConfigStore;
    use crate::core::types::SpeciesId;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn femur() -> BodypartNode {
        BodypartNode::bone(NodeId(1), "femur", BoneClass::Standard).with_severed_threshold(50.0)
    }

    fn skull() -> BodypartNode {
        BodypartNode::external(NodeId(2), "head", ExternalKind::General)
            .with_bone(BoneAttrs::default())
    }

    #[test]
    fn test_crushing_femur_is_all_bone_and_severs() {
        let config = StaticConfigStore::new();
        let damage = Damage::new(60.0, DamageType::Crushing);
        let split = classify_fracture(&femur(), &damage, &config).unwrap();
        assert_eq!(split, FractureSplit { ordinary: 0.0, bone: 60.0 });
        assert!(is_severed(&femur(), damage.amount));
    }

    #[test]
    fn test_burning_femur_is_all_ordinary() {
        let config = StaticConfigStore::new();
        let split =
            classify_fracture(&femur(), &Damage::new(20.0, DamageType::Burning), &config).unwrap();
        assert_eq!(split, FractureSplit { ordinary: 20.0, bone: 0.0 });
    }

    #[test]
    fn test_minor_bone_routes_like_plain_bone() {
        let config = StaticConfigStore::new();
        let phalanx = BodypartNode::bone(NodeId(3), "phalanx", BoneClass::Minor);
        let split =
            classify_fracture(&phalanx, &Damage::new(7.0, DamageType::Bite), &config).unwrap();
        assert_eq!(split.bone, 7.0);
    }

    #[test]
    fn test_bony_external_uses_tunables() {
        let mut config = StaticConfigStore::new();
        config.set("BoneBreakLeewayCrushing", 10.0);
        config.set("BoneBreakMultiplierCrushing", 0.5);

        let split =
            classify_fracture(&skull(), &Damage::new(30.0, DamageType::Crushing), &config).unwrap();
        assert_eq!(split.ordinary, 15.0);
        assert_eq!(split.bone, 10.0);

        // Below the leeway there is no bone damage, but ordinary damage remains
        let split =
            classify_fracture(&skull(), &Damage::new(4.0, DamageType::Crushing), &config).unwrap();
        assert_eq!(split.bone, 0.0);
        assert_eq!(split.ordinary, 2.0);
    }

    #[test]
    fn test_non_kinetic_damage_on_bony_external_is_all_ordinary() {
        let config = StaticConfigStore::new();
        for damage_type in [DamageType::Burning, DamageType::Electrical, DamageType::Chemical] {
            let split =
                classify_fracture(&skull(), &Damage::new(40.0, damage_type), &config).unwrap();
            assert_eq!(split, FractureSplit { ordinary: 40.0, bone: 0.0 }, "{}", damage_type);
        }
    }

    #[test]
    fn test_soft_part_rejected() {
        let config = StaticConfigStore::new();
        let arm = BodypartNode::external(NodeId(4), "arm", ExternalKind::General);
        assert!(matches!(
            classify_fracture(&arm, &Damage::new(5.0, DamageType::Crushing), &config),
            Err(AnatomyError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_bony_part_breaks_at_reduced_capacity() {
        let config = StaticConfigStore::new();
        let mut schema = BodySchema::new(SpeciesId(1), "test");
        schema.add_node(femur().with_max_life(100.0)).unwrap();
        schema.add_node(skull().with_max_life(100.0)).unwrap();
        let mut body = Body::new(Arc::new(schema));

        body.wound(NodeId(1), DamageType::Crushing, 0.0, 60.0, 0.0, 0.0);
        body.wound(NodeId(2), DamageType::Crushing, 0.0, 60.0, 0.0, 0.0);

        // Default modifier halves the skull's bone capacity
        assert!(!is_bone_broken(&body, NodeId(1), &config));
        assert!(is_bone_broken(&body, NodeId(2), &config));
        assert_eq!(refresh_broken_bones(&mut body, &config), vec![NodeId(2)]);
        assert!(refresh_broken_bones(&mut body, &config).is_empty());
    }

    fn any_damage_type() -> impl Strategy<Value = DamageType> {
        prop::sample::select(DamageType::all().to_vec())
    }

    proptest! {
        #[test]
        fn prop_plain_bone_routing_is_total(amount in 0.0f64..1000.0, damage_type in any_damage_type()) {
            let config = StaticConfigStore::new();
            let split = classify_fracture(&femur(), &Damage::new(amount, damage_type), &config).unwrap();
            if damage_type.is_kinetic() {
                prop_assert_eq!(split, FractureSplit { ordinary: 0.0, bone: amount });
            } else {
                prop_assert_eq!(split, FractureSplit { ordinary: amount, bone: 0.0 });
            }
        }

        #[test]
        fn prop_bony_formula(amount in 0.0f64..1000.0, damage_type in any_damage_type()) {
            let config = StaticConfigStore::new();
            let leeway = config.get_static_double(&bone_break_leeway_key(damage_type));
            let multiplier = config.get_static_double(&bone_break_multiplier_key(damage_type));
            let split = classify_fracture(&skull(), &Damage::new(amount, damage_type), &config).unwrap();
            prop_assert_eq!(split.ordinary, multiplier * amount);
            prop_assert_eq!(split.bone, ((amount - leeway) * multiplier).max(0.0));
        }

        #[test]
        fn prop_severing(threshold in -1.0f64..200.0, amount in 0.0f64..400.0) {
            let node = femur().with_severed_threshold(threshold);
            prop_assert_eq!(is_severed(&node, amount), amount > threshold && threshold >= 0.0);
        }
    }

    #[test]
    fn test_disabled_severing() {
        let node = femur().with_severed_threshold(-1.0);
        assert!(!is_severed(&node, f64::MAX));
    }
}
