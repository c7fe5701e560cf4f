//! Applying a resolved strike to a body
//!
//! Splits the damage for bones, scales it by the part's modifiers, records
//! the wound, severs if the single hit was heavy enough and refreshes which
//! bones are broken.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::body::state::Body;
use crate::combat::damage::Damage;
use crate::combat::fracture::{classify_fracture, is_severed, refresh_broken_bones, FractureSplit};
use crate::combat::hit::{resolve_hit, HitOptions, HitResult};
use crate::core::config::StaticConfig;
use crate::core::error::{AnatomyError, Result};
use crate::core::types::{Alignment, NodeId, Orientation, WoundId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeOutcome {
    pub node: NodeId,
    pub damage: Damage,
    pub split: FractureSplit,
    pub wound: WoundId,
    /// Parts lost to this strike, the struck part first
    pub severed: Vec<NodeId>,
    pub newly_broken: Vec<NodeId>,
}

/// Apply `damage` to a part that has already been chosen
pub fn strike(
    body: &mut Body,
    node: NodeId,
    damage: Damage,
    config: &dyn StaticConfig,
) -> Result<StrikeOutcome> {
    let part = body.schema().require(node)?;
    if !body.is_present(node) {
        return Err(AnatomyError::NoTargetableParts);
    }

    let split = if part.as_bone().is_some() {
        classify_fracture(part, &damage, config)?
    } else {
        FractureSplit {
            ordinary: damage.amount,
            bone: 0.0,
        }
    };

    let common = &part.common;
    let ordinary = split.ordinary * common.damage_modifier;
    let pain = damage.amount * common.pain_modifier;
    let stun = damage.amount * common.stun_modifier;
    let severs = is_severed(part, damage.amount);

    let wound = body.wound(node, damage.damage_type, ordinary, split.bone, pain, stun);
    let severed = if severs {
        let lost = body.sever(node);
        tracing::info!("{:?} severed {} part(s) from {:?}", damage, lost.len(), body.owner);
        lost
    } else {
        Vec::new()
    };
    let newly_broken = refresh_broken_bones(body, config);

    tracing::debug!(
        "Struck {:?} for {} {} (ordinary {}, bone {})",
        node,
        damage.amount,
        damage.damage_type,
        ordinary,
        split.bone
    );

    Ok(StrikeOutcome {
        node,
        damage,
        split,
        wound,
        severed,
        newly_broken,
    })
}

/// Resolve where a strike lands, then apply it
pub fn strike_from<R: Rng + ?Sized>(
    body: &mut Body,
    alignment: Alignment,
    orientation: Orientation,
    damage: Damage,
    options: HitOptions,
    config: &dyn StaticConfig,
    rng: &mut R,
) -> Result<(HitResult, StrikeOutcome)> {
    let hit = resolve_hit(body, alignment, orientation, options, rng)?;
    let outcome = strike(body, hit.node, damage, config)?;
    Ok((hit, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::node::{BodypartNode, BoneClass, ExternalKind};
    use crate::anatomy::schema::BodySchema;
    use crate::combat::damage::DamageType;
    use crate::core::config::StaticConfigStore;
    use crate::core::types::SpeciesId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    const THIGH: NodeId = NodeId(1);
    const SHIN: NodeId = NodeId(2);
    const FEMUR: NodeId = NodeId(10);

    fn body() -> Body {
        let mut schema = BodySchema::new(SpeciesId(1), "test");
        schema
            .add_node(
                BodypartNode::external(THIGH, "thigh", ExternalKind::Standing)
                    .with_hit_chance(1.0)
                    .with_severed_threshold(80.0),
            )
            .unwrap();
        schema
            .add_node(BodypartNode::external(SHIN, "shin", ExternalKind::Standing))
            .unwrap();
        schema
            .add_node(
                BodypartNode::bone(FEMUR, "femur", BoneClass::Standard)
                    .with_max_life(50.0)
                    .with_severed_threshold(50.0),
            )
            .unwrap();
        schema.set_upstream(SHIN, Some(THIGH)).unwrap();
        schema.add_containment(THIGH, FEMUR, 40.0, None).unwrap();
        Body::new(Arc::new(schema))
    }

    #[test]
    fn test_crushing_blow_breaks_and_severs_femur() {
        let config = StaticConfigStore::new();
        let mut body = body();
        let outcome = strike(
            &mut body,
            FEMUR,
            Damage::new(60.0, DamageType::Crushing),
            &config,
        )
        .unwrap();

        assert_eq!(outcome.split, FractureSplit { ordinary: 0.0, bone: 60.0 });
        assert_eq!(outcome.severed, vec![FEMUR]);
        assert_eq!(outcome.newly_broken, vec![FEMUR]);
        assert_eq!(body.bone_damage_on(FEMUR), 60.0);
        assert!(!body.is_present(FEMUR));
    }

    #[test]
    fn test_repeated_cuts_extend_one_wound() {
        let config = StaticConfigStore::new();
        let mut body = body();
        let first = strike(&mut body, THIGH, Damage::new(10.0, DamageType::Slashing), &config).unwrap();
        let second = strike(&mut body, THIGH, Damage::new(15.0, DamageType::Slashing), &config).unwrap();
        assert_eq!(first.wound, second.wound);
        assert_eq!(body.damage_on(THIGH), 25.0);
        assert_eq!(body.pain_on(THIGH), 25.0);
        assert!(second.severed.is_empty());
    }

    #[test]
    fn test_severing_the_thigh_takes_the_shin() {
        let config = StaticConfigStore::new();
        let mut body = body();
        let outcome =
            strike(&mut body, THIGH, Damage::new(90.0, DamageType::Chopping), &config).unwrap();
        assert_eq!(outcome.severed, vec![THIGH, SHIN]);
        assert!(matches!(
            strike(&mut body, SHIN, Damage::new(1.0, DamageType::Chopping), &config),
            Err(AnatomyError::NoTargetableParts)
        ));
    }

    #[test]
    fn test_unknown_part() {
        let config = StaticConfigStore::new();
        let mut body = body();
        assert!(matches!(
            strike(&mut body, NodeId(99), Damage::new(1.0, DamageType::Bite), &config),
            Err(AnatomyError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_strike_from_direction() {
        let config = StaticConfigStore::new();
        let mut body = body();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (hit, outcome) = strike_from(
            &mut body,
            Alignment::Irrelevant,
            Orientation::Irrelevant,
            Damage::new(5.0, DamageType::Piercing),
            HitOptions::default(),
            &config,
            &mut rng,
        )
        .unwrap();
        assert_eq!(hit.node, outcome.node);
        assert_eq!(hit.surface, THIGH);
    }
}
