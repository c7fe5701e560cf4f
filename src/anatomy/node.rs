//! Bodypart taxonomy
//!
//! Every part is a `BodypartNode`: shared `CommonAttrs` plus exactly one of the
//! `External`, `Bone` or `Organ` variants. Hybrid parts (a skull that is also an
//! external surface, a hand that grabs and wields) are External variants with
//! capability markers attached, queried through `has`.

use serde::{Deserialize, Serialize};

use crate::core::types::{Alignment, NodeId, Orientation, Shape, SizeCategory};

/// The three mutually exclusive part variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    External,
    Bone,
    Organ,
}

/// Capabilities a node may offer to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    External,
    Bone,
    Organ,
    Wearable,
    Grabbing,
    Wielding,
}

/// What an external part does for its owner beyond being a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExternalKind {
    #[default]
    General,
    Eye,
    Tongue,
    /// Legs, feet and anything else the owner stands on
    Standing,
    Wing,
}

/// Bone subclasses. All share the same fracture routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoneClass {
    #[default]
    Standard,
    NonImmobilising,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganKind {
    Heart,
    Brain,
    PositronicBrain,
    Lung,
    Trachea,
    Liver,
    Kidney,
    Spleen,
    Stomach,
    Intestines,
    Esophagus,
    SpinalCord,
    Ear,
    PowerCore,
    Other,
}

/// Attributes every part carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonAttrs {
    pub id: NodeId,
    pub name: String,
    pub description: String,

    pub shape: Shape,
    pub alignment: Alignment,
    pub orientation: Orientation,
    pub size: SizeCategory,

    /// Damage at which the part is disabled
    pub max_life: f64,
    /// Single-hit damage that severs the part; -1 disables severing
    pub severed_threshold: f64,
    pub damage_modifier: f64,
    pub pain_modifier: f64,
    pub stun_modifier: f64,
    pub bleed_modifier: f64,

    /// Unnormalised weight used when picking which part a strike lands on
    pub relative_hit_chance: f64,

    pub default_material: String,
    pub natural_armour: Option<String>,

    /// Cosmetically important
    pub significant: bool,
    /// Loss is lethal
    pub vital: bool,
    /// Always present, as opposed to added to particular bodies
    pub is_core: bool,

    pub(crate) counts_as: Option<NodeId>,
}

impl CommonAttrs {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            description: name.clone(),
            name,
            shape: Shape::default(),
            alignment: Alignment::Irrelevant,
            orientation: Orientation::Irrelevant,
            size: SizeCategory::Normal,
            max_life: 100.0,
            severed_threshold: -1.0,
            damage_modifier: 1.0,
            pain_modifier: 1.0,
            stun_modifier: 1.0,
            bleed_modifier: 1.0,
            relative_hit_chance: 0.0,
            default_material: "flesh".to_string(),
            natural_armour: None,
            significant: false,
            vital: false,
            is_core: true,
            counts_as: None,
        }
    }
}

/// Extra weight an external part receives from a particular strike direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitChanceOverride {
    pub alignment: Alignment,
    pub orientation: Orientation,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneAttrs {
    pub class: BoneClass,
    /// Loss is severe
    pub critical: bool,
    pub can_be_immobilised: bool,
    pub healing_modifier: f64,
}

impl Default for BoneAttrs {
    fn default() -> Self {
        Self {
            class: BoneClass::Standard,
            critical: false,
            can_be_immobilised: true,
            healing_modifier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganAttrs {
    pub kind: OrganKind,
    pub implant_space_occupied: f64,
    pub hypoxia_damage_per_tick: f64,
    pub relative_infectability: f64,
    pub requires_spinal_connection: bool,
    /// Blood volume at which build-up causes total failure.
    /// `None` when the organ is not affected by blood build-up.
    pub blood_buildup_failure_volume: Option<f64>,
}

impl OrganAttrs {
    pub fn new(kind: OrganKind) -> Self {
        Self {
            kind,
            implant_space_occupied: 0.0,
            hypoxia_damage_per_tick: 0.0,
            relative_infectability: 1.0,
            requires_spinal_connection: false,
            blood_buildup_failure_volume: None,
        }
    }

    pub fn affected_by_blood_buildup(&self) -> bool {
        self.blood_buildup_failure_volume.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalAttrs {
    pub kind: ExternalKind,
    pub(crate) upstream: Option<NodeId>,
    pub hit_overrides: Vec<HitChanceOverride>,
    /// Present on bony external parts (skulls, carapaces)
    pub bone: Option<BoneAttrs>,
    pub wearable: bool,
    pub grabbing: bool,
    pub wielding: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeVariant {
    External(ExternalAttrs),
    Bone(BoneAttrs),
    Organ(OrganAttrs),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodypartNode {
    pub common: CommonAttrs,
    pub variant: NodeVariant,
}

impl BodypartNode {
    pub fn external(id: NodeId, name: impl Into<String>, kind: ExternalKind) -> Self {
        Self {
            common: CommonAttrs::new(id, name),
            variant: NodeVariant::External(ExternalAttrs {
                kind,
                wearable: true,
                ..ExternalAttrs::default()
            }),
        }
    }

    pub fn bone(id: NodeId, name: impl Into<String>, class: BoneClass) -> Self {
        let mut common = CommonAttrs::new(id, name);
        common.shape = Shape::Internal;
        common.default_material = "bone".to_string();
        Self {
            common,
            variant: NodeVariant::Bone(BoneAttrs {
                class,
                can_be_immobilised: class != BoneClass::NonImmobilising,
                ..BoneAttrs::default()
            }),
        }
    }

    pub fn organ(id: NodeId, name: impl Into<String>, kind: OrganKind) -> Self {
        let mut common = CommonAttrs::new(id, name);
        common.shape = Shape::Internal;
        Self {
            common,
            variant: NodeVariant::Organ(OrganAttrs::new(kind)),
        }
    }

    pub fn id(&self) -> NodeId {
        self.common.id
    }

    pub fn name(&self) -> &str {
        &self.common.name
    }

    pub fn kind(&self) -> NodeKind {
        match self.variant {
            NodeVariant::External(_) => NodeKind::External,
            NodeVariant::Bone(_) => NodeKind::Bone,
            NodeVariant::Organ(_) => NodeKind::Organ,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        match (&self.variant, capability) {
            (NodeVariant::External(_), Capability::External) => true,
            (NodeVariant::External(ext), Capability::Bone) => ext.bone.is_some(),
            (NodeVariant::External(ext), Capability::Wearable) => ext.wearable,
            (NodeVariant::External(ext), Capability::Grabbing) => ext.grabbing,
            (NodeVariant::External(ext), Capability::Wielding) => ext.wielding,
            (NodeVariant::Bone(_), Capability::Bone) => true,
            (NodeVariant::Organ(_), Capability::Organ) => true,
            _ => false,
        }
    }

    pub fn as_external(&self) -> Option<&ExternalAttrs> {
        match &self.variant {
            NodeVariant::External(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn as_external_mut(&mut self) -> Option<&mut ExternalAttrs> {
        match &mut self.variant {
            NodeVariant::External(ext) => Some(ext),
            _ => None,
        }
    }

    /// Bone attributes of a bone, or of a bony external part
    pub fn as_bone(&self) -> Option<&BoneAttrs> {
        match &self.variant {
            NodeVariant::Bone(bone) => Some(bone),
            NodeVariant::External(ext) => ext.bone.as_ref(),
            NodeVariant::Organ(_) => None,
        }
    }

    pub fn as_organ(&self) -> Option<&OrganAttrs> {
        match &self.variant {
            NodeVariant::Organ(organ) => Some(organ),
            _ => None,
        }
    }

    pub fn organ_kind(&self) -> Option<OrganKind> {
        self.as_organ().map(|o| o.kind)
    }

    pub fn external_kind(&self) -> Option<ExternalKind> {
        self.as_external().map(|e| e.kind)
    }

    /// An external surface that is also a bone
    pub fn is_bony_external(&self) -> bool {
        matches!(&self.variant, NodeVariant::External(ext) if ext.bone.is_some())
    }

    /// Internal parts are bones and organs
    pub fn is_internal(&self) -> bool {
        !matches!(self.variant, NodeVariant::External(_))
    }

    pub fn upstream(&self) -> Option<NodeId> {
        self.as_external().and_then(|e| e.upstream)
    }

    pub fn counts_as(&self) -> Option<NodeId> {
        self.common.counts_as
    }

    /// Weight of this part for a strike from the given direction
    ///
    /// Base weight plus the most specific matching override, falling back
    /// towards the (Irrelevant, Irrelevant) bucket.
    pub fn hit_chances(&self, alignment: Alignment, orientation: Orientation) -> f64 {
        let base = self.common.relative_hit_chance;
        let Some(ext) = self.as_external() else {
            return base;
        };

        let lookup = |a: Alignment, o: Orientation| {
            ext.hit_overrides
                .iter()
                .find(|h| h.alignment == a && h.orientation == o)
                .map(|h| h.weight)
        };

        let extra = lookup(alignment, orientation)
            .or_else(|| lookup(alignment, Orientation::Irrelevant))
            .or_else(|| lookup(Alignment::Irrelevant, orientation))
            .or_else(|| lookup(Alignment::Irrelevant, Orientation::Irrelevant))
            .unwrap_or(0.0);

        base + extra
    }

    /// Whether a single hit of `amount` severs this part outright
    pub fn is_severed_by(&self, amount: f64) -> bool {
        let threshold = self.common.severed_threshold;
        threshold >= 0.0 && amount > threshold
    }

    // === Builder helpers ===

    pub fn with_max_life(mut self, max_life: f64) -> Self {
        self.common.max_life = max_life;
        self
    }

    pub fn with_severed_threshold(mut self, threshold: f64) -> Self {
        self.common.severed_threshold = threshold;
        self
    }

    pub fn with_hit_chance(mut self, weight: f64) -> Self {
        self.common.relative_hit_chance = weight;
        self
    }

    pub fn with_placement(mut self, alignment: Alignment, orientation: Orientation) -> Self {
        self.common.alignment = alignment;
        self.common.orientation = orientation;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.common.shape = shape;
        self
    }

    pub fn with_bone(mut self, bone: BoneAttrs) -> Self {
        if let NodeVariant::External(ext) = &mut self.variant {
            ext.bone = Some(bone);
        }
        self
    }

    pub fn with_grip(mut self, grabbing: bool, wielding: bool) -> Self {
        if let NodeVariant::External(ext) = &mut self.variant {
            ext.grabbing = grabbing;
            ext.wielding = wielding;
        }
        self
    }

    pub fn with_hit_override(mut self, over: HitChanceOverride) -> Self {
        if let NodeVariant::External(ext) = &mut self.variant {
            ext.hit_overrides.push(over);
        }
        self
    }

    pub fn significant(mut self) -> Self {
        self.common.significant = true;
        self
    }

    pub fn vital(mut self) -> Self {
        self.common.vital = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.common.is_core = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_capabilities() {
        let arm = BodypartNode::external(NodeId(1), "left arm", ExternalKind::General);
        assert!(arm.has(Capability::External));
        assert!(arm.has(Capability::Wearable));
        assert!(!arm.has(Capability::Bone));

        let femur = BodypartNode::bone(NodeId(2), "femur", BoneClass::Standard);
        assert!(femur.has(Capability::Bone));
        assert!(!femur.has(Capability::External));
        assert!(femur.is_internal());

        let heart = BodypartNode::organ(NodeId(3), "heart", OrganKind::Heart);
        assert!(heart.has(Capability::Organ));
        assert_eq!(heart.organ_kind(), Some(OrganKind::Heart));
    }

    #[test]
    fn test_bony_external_is_both() {
        let skull = BodypartNode::external(NodeId(4), "head", ExternalKind::General)
            .with_bone(BoneAttrs::default());
        assert!(skull.has(Capability::External));
        assert!(skull.has(Capability::Bone));
        assert!(skull.is_bony_external());
        assert!(skull.as_bone().is_some());
    }

    #[test]
    fn test_grabbing_wielding_hand() {
        let hand = BodypartNode::external(NodeId(5), "right hand", ExternalKind::General)
            .with_grip(true, true);
        assert!(hand.has(Capability::Grabbing));
        assert!(hand.has(Capability::Wielding));
    }

    #[test]
    fn test_non_immobilising_bone() {
        let rib = BodypartNode::bone(NodeId(6), "rib", BoneClass::NonImmobilising);
        assert!(!rib.as_bone().unwrap().can_be_immobilised);
    }

    #[test]
    fn test_hit_chances_fallback_order() {
        let arm = BodypartNode::external(NodeId(1), "left arm", ExternalKind::General)
            .with_hit_chance(10.0)
            .with_hit_override(HitChanceOverride {
                alignment: Alignment::Left,
                orientation: Orientation::Front,
                weight: 15.0,
            })
            .with_hit_override(HitChanceOverride {
                alignment: Alignment::Irrelevant,
                orientation: Orientation::Irrelevant,
                weight: 2.0,
            });

        assert_eq!(arm.hit_chances(Alignment::Left, Orientation::Front), 25.0);
        // No exact override: falls back to the irrelevant bucket
        assert_eq!(arm.hit_chances(Alignment::Right, Orientation::Back), 12.0);
    }

    #[test]
    fn test_severing_threshold() {
        let finger = BodypartNode::external(NodeId(7), "finger", ExternalKind::General)
            .with_severed_threshold(50.0);
        assert!(finger.is_severed_by(60.0));
        assert!(!finger.is_severed_by(50.0));

        let torso = BodypartNode::external(NodeId(8), "torso", ExternalKind::General);
        assert!(!torso.is_severed_by(10_000.0));
    }
}
