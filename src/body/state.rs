//! Per-character body state
//!
//! A `Body` pairs a snapshot of its species schema with everything that is
//! specific to one character: wounds, status effects, held items, severed
//! parts and the cached organ function values. It is owned by exactly one
//! character and never shared, so nothing here locks.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::anatomy::node::BodypartNode;
use crate::anatomy::schema::BodySchema;
use crate::combat::damage::DamageType;
use crate::core::types::{EntityId, ItemId, LimbId, NodeId, WoundId};

/// Damage carried on one part from one kind of damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wound {
    pub id: WoundId,
    pub node: NodeId,
    pub damage_type: DamageType,
    /// Ordinary tissue damage
    pub damage: f64,
    /// Skeletal damage, counted towards breaking the bone
    pub bone_damage: f64,
    pub pain: f64,
    pub stun: f64,
}

impl Wound {
    pub fn is_healed(&self) -> bool {
        self.damage <= 0.0 && self.bone_damage <= 0.0 && self.pain <= 0.0
    }
}

/// How strongly a generic status effect weighs on the owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectSeverity {
    /// Raised for significant parts
    Major,
    /// Raised for insignificant parts; safe to ignore
    Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Medical intervention holding an organ's function at or above `floor`
    StabilisedOrgan { organ: NodeId, floor: f64 },
    /// Organ forced fully ineffective (e.g. stopped heart)
    OrganIneffective { organ: NodeId },
    /// Blood pooling around an organ
    InternalBleeding { organ: NodeId, volume: f64 },
    ExcessivelyDamaged { node: NodeId, severity: EffectSeverity },
    ExcessivelyPainful { node: NodeId, severity: EffectSeverity },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldItem {
    pub id: ItemId,
    pub name: String,
    pub wielded: bool,
    /// False while the owner may not pick it back up (dropped mid-combat)
    pub retrievable: bool,
}

impl HeldItem {
    pub fn new(name: impl Into<String>, wielded: bool) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            wielded,
            retrievable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Position {
    #[default]
    Standing,
    Sitting,
    Prone,
}

#[derive(Debug, Clone)]
pub struct Body {
    pub owner: EntityId,
    schema: Arc<BodySchema>,

    wounds: Vec<Wound>,
    next_wound: u32,
    effects: Vec<StatusEffect>,

    held: AHashMap<NodeId, Vec<HeldItem>>,
    /// Items that have fallen from the body's parts
    pub dropped: Vec<HeldItem>,

    severed: AHashSet<NodeId>,
    extra_parts: AHashSet<NodeId>,
    /// Prosthetics attached in place of severed parts, and whether they work
    prosthetics: AHashMap<NodeId, bool>,
    broken_bones: AHashSet<NodeId>,
    grappled_limbs: AHashSet<LimbId>,

    organ_function: AHashMap<NodeId, f64>,

    pub position: Position,
    pub flying: bool,
    pub in_combat: bool,
}

impl Body {
    pub fn new(schema: Arc<BodySchema>) -> Self {
        Self {
            owner: EntityId::new(),
            schema,
            wounds: Vec::new(),
            next_wound: 1,
            effects: Vec::new(),
            held: AHashMap::new(),
            dropped: Vec::new(),
            severed: AHashSet::new(),
            extra_parts: AHashSet::new(),
            prosthetics: AHashMap::new(),
            broken_bones: AHashSet::new(),
            grappled_limbs: AHashSet::new(),
            organ_function: AHashMap::new(),
            position: Position::Standing,
            flying: false,
            in_combat: false,
        }
    }

    pub fn schema(&self) -> &BodySchema {
        &self.schema
    }

    /// Shared handle to the schema snapshot this body was built against
    pub fn schema_arc(&self) -> Arc<BodySchema> {
        Arc::clone(&self.schema)
    }

    pub fn node(&self, id: NodeId) -> Option<&BodypartNode> {
        self.schema.node(id)
    }

    // === Presence ===

    /// A part exists on this body: core or added, and not severed
    pub fn is_present(&self, id: NodeId) -> bool {
        let Some(node) = self.schema.node(id) else {
            return false;
        };
        (node.common.is_core || self.extra_parts.contains(&id)) && !self.severed.contains(&id)
    }

    /// Grow a non-core part on this body
    pub fn add_part(&mut self, id: NodeId) {
        self.extra_parts.insert(id);
    }

    pub fn is_severed(&self, id: NodeId) -> bool {
        self.severed.contains(&id)
    }

    /// Sever a part and everything downstream of it. Returns the newly lost parts.
    pub fn sever(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut lost = vec![id];
        lost.extend(self.schema.downstream(id));
        lost.retain(|n| self.severed.insert(*n));
        for node in &lost {
            self.prosthetics.remove(node);
        }
        lost
    }

    /// Replace a severed part with a prosthetic
    pub fn attach_prosthetic(&mut self, id: NodeId, functional: bool) {
        self.severed.remove(&id);
        self.prosthetics.insert(id, functional);
    }

    pub fn prosthetic(&self, id: NodeId) -> Option<bool> {
        self.prosthetics.get(&id).copied()
    }

    // === Wounds ===

    pub fn wounds(&self) -> &[Wound] {
        &self.wounds
    }

    pub fn open_wounds_on(&self, node: NodeId) -> impl Iterator<Item = &Wound> {
        self.wounds
            .iter()
            .filter(move |w| w.node == node && !w.is_healed())
    }

    /// Ordinary damage across unhealed wounds on a part
    pub fn damage_on(&self, node: NodeId) -> f64 {
        self.open_wounds_on(node).map(|w| w.damage).sum()
    }

    pub fn bone_damage_on(&self, node: NodeId) -> f64 {
        self.open_wounds_on(node).map(|w| w.bone_damage).sum()
    }

    pub fn pain_on(&self, node: NodeId) -> f64 {
        self.open_wounds_on(node).map(|w| w.pain).sum()
    }

    /// Add to an open wound of the same type on the same part, or open a new one
    pub fn wound(
        &mut self,
        node: NodeId,
        damage_type: DamageType,
        damage: f64,
        bone_damage: f64,
        pain: f64,
        stun: f64,
    ) -> WoundId {
        if let Some(existing) = self
            .wounds
            .iter_mut()
            .find(|w| w.node == node && w.damage_type == damage_type && !w.is_healed())
        {
            existing.damage += damage;
            existing.bone_damage += bone_damage;
            existing.pain += pain;
            existing.stun += stun;
            return existing.id;
        }

        let id = WoundId(self.next_wound);
        self.next_wound += 1;
        self.wounds.push(Wound {
            id,
            node,
            damage_type,
            damage,
            bone_damage,
            pain,
            stun,
        });
        id
    }

    /// Reduce a wound's damage, bone damage and pain. Returns false if unknown.
    pub fn heal(&mut self, id: WoundId, amount: f64) -> bool {
        let Some(wound) = self.wounds.iter_mut().find(|w| w.id == id) else {
            return false;
        };
        wound.damage = (wound.damage - amount).max(0.0);
        wound.bone_damage = (wound.bone_damage - amount).max(0.0);
        wound.pain = (wound.pain - amount).max(0.0);
        wound.stun = (wound.stun - amount).max(0.0);
        true
    }

    /// Drop healed wounds
    pub fn prune_wounds(&mut self) {
        self.wounds.retain(|w| !w.is_healed());
    }

    // === Bones ===

    pub fn is_bone_broken(&self, id: NodeId) -> bool {
        self.broken_bones.contains(&id)
    }

    pub fn broken_bones(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.broken_bones.iter().copied()
    }

    pub(crate) fn set_bone_broken(&mut self, id: NodeId, broken: bool) -> bool {
        if broken {
            self.broken_bones.insert(id)
        } else {
            self.broken_bones.remove(&id)
        }
    }

    // === Limbs ===

    pub fn grapple_limb(&mut self, limb: LimbId) {
        self.grappled_limbs.insert(limb);
    }

    pub fn release_limb(&mut self, limb: LimbId) {
        self.grappled_limbs.remove(&limb);
    }

    pub fn is_limb_grappled(&self, limb: LimbId) -> bool {
        self.grappled_limbs.contains(&limb)
    }

    // === Status effects ===

    pub fn effects(&self) -> &[StatusEffect] {
        &self.effects
    }

    pub fn has_effect(&self, effect: &StatusEffect) -> bool {
        self.effects.contains(effect)
    }

    /// Add an effect unless an identical one is already active
    pub fn add_effect(&mut self, effect: StatusEffect) -> bool {
        if self.has_effect(&effect) {
            return false;
        }
        self.effects.push(effect);
        true
    }

    pub fn remove_effects<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&StatusEffect) -> bool,
    {
        let before = self.effects.len();
        self.effects.retain(|e| !predicate(e));
        before - self.effects.len()
    }

    pub fn stabilise_organ(&mut self, organ: NodeId, floor: f64) {
        self.effects.push(StatusEffect::StabilisedOrgan { organ, floor });
    }

    /// Accumulate internal bleeding around an organ
    pub fn bleed_internally(&mut self, organ: NodeId, volume: f64) {
        for effect in &mut self.effects {
            if let StatusEffect::InternalBleeding { organ: o, volume: v } = effect {
                if *o == organ {
                    *v += volume;
                    return;
                }
            }
        }
        self.effects.push(StatusEffect::InternalBleeding { organ, volume });
    }

    // === Held items ===

    pub fn hold(&mut self, node: NodeId, item: HeldItem) {
        self.held.entry(node).or_default().push(item);
    }

    pub fn held_items(&self, node: NodeId) -> &[HeldItem] {
        self.held.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn take_held(&mut self, node: NodeId) -> Vec<HeldItem> {
        self.held.remove(&node).unwrap_or_default()
    }

    // === Organ function cache ===

    /// Last computed function factor of an organ; fully functional until computed
    pub fn organ_function(&self, organ: NodeId) -> f64 {
        self.organ_function.get(&organ).copied().unwrap_or(1.0)
    }

    pub(crate) fn set_organ_function(&mut self, organ: NodeId, value: f64) -> f64 {
        self.organ_function.insert(organ, value).unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::node::ExternalKind;
    use crate::core::types::SpeciesId;

    fn body() -> Body {
        let mut schema = BodySchema::new(SpeciesId(1), "test");
        schema
            .add_node(BodypartNode::external(NodeId(1), "torso", ExternalKind::General))
            .unwrap();
        schema
            .add_node(BodypartNode::external(NodeId(2), "arm", ExternalKind::General))
            .unwrap();
        schema
            .add_node(BodypartNode::external(NodeId(3), "hand", ExternalKind::General))
            .unwrap();
        schema
            .add_node(BodypartNode::external(NodeId(4), "tail", ExternalKind::General).optional())
            .unwrap();
        schema.set_upstream(NodeId(2), Some(NodeId(1))).unwrap();
        schema.set_upstream(NodeId(3), Some(NodeId(2))).unwrap();
        Body::new(Arc::new(schema))
    }

    #[test]
    fn test_wounds_extend_same_type() {
        let mut body = body();
        let a = body.wound(NodeId(2), DamageType::Slashing, 10.0, 0.0, 5.0, 0.0);
        let b = body.wound(NodeId(2), DamageType::Slashing, 5.0, 0.0, 1.0, 0.0);
        let c = body.wound(NodeId(2), DamageType::Burning, 3.0, 0.0, 1.0, 0.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(body.damage_on(NodeId(2)), 18.0);
        assert_eq!(body.pain_on(NodeId(2)), 7.0);
    }

    #[test]
    fn test_healed_wounds_do_not_count() {
        let mut body = body();
        let id = body.wound(NodeId(2), DamageType::Crushing, 10.0, 4.0, 2.0, 0.0);
        assert!(body.heal(id, 20.0));
        assert_eq!(body.damage_on(NodeId(2)), 0.0);
        body.prune_wounds();
        assert!(body.wounds().is_empty());
        assert!(!body.heal(id, 1.0));
    }

    #[test]
    fn test_sever_takes_downstream_parts() {
        let mut body = body();
        let lost = body.sever(NodeId(2));
        assert_eq!(lost, vec![NodeId(2), NodeId(3)]);
        assert!(!body.is_present(NodeId(3)));
        // Severing again loses nothing new
        assert!(body.sever(NodeId(3)).is_empty());
    }

    #[test]
    fn test_optional_part_presence() {
        let mut body = body();
        assert!(!body.is_present(NodeId(4)));
        body.add_part(NodeId(4));
        assert!(body.is_present(NodeId(4)));
    }

    #[test]
    fn test_effects_deduplicate() {
        let mut body = body();
        let effect = StatusEffect::ExcessivelyDamaged {
            node: NodeId(2),
            severity: EffectSeverity::Major,
        };
        assert!(body.add_effect(effect.clone()));
        assert!(!body.add_effect(effect));
        assert_eq!(body.effects().len(), 1);
    }

    #[test]
    fn test_internal_bleeding_accumulates() {
        let mut body = body();
        body.bleed_internally(NodeId(9), 0.1);
        body.bleed_internally(NodeId(9), 0.2);
        assert_eq!(body.effects().len(), 1);
        assert!(matches!(
            body.effects()[0],
            StatusEffect::InternalBleeding { volume, .. } if (volume - 0.3).abs() < 1e-9
        ));
    }
}
