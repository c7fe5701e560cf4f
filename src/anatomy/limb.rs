//! Limb partition
//!
//! Limbs group external parts that share damage and pain thresholds. Each limb
//! is rooted at an external part; every other part belongs to the limb whose
//! root is its nearest ancestor along upstream links. Torso limbs only claim
//! parts no more specific limb claims.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::error::{AnatomyError, Result};
use crate::core::types::{LimbId, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimbKind {
    Arm,
    Leg,
    Wing,
    Torso,
    Spine,
    Head,
    Tail,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limb {
    pub id: LimbId,
    pub name: String,
    pub kind: LimbKind,
    pub root: NodeId,
    /// Organs the limb needs working to be usable (usually spinal cord sections)
    pub spinal_dependencies: Vec<NodeId>,
    pub damage_threshold_multiplier: f64,
    pub pain_threshold_multiplier: f64,
    #[serde(skip)]
    members: Vec<NodeId>,
}

impl Limb {
    pub fn new(id: LimbId, name: impl Into<String>, kind: LimbKind, root: NodeId) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            root,
            spinal_dependencies: Vec::new(),
            damage_threshold_multiplier: 1.0,
            pain_threshold_multiplier: 1.0,
            members: Vec::new(),
        }
    }

    pub fn with_thresholds(mut self, damage: f64, pain: f64) -> Self {
        self.damage_threshold_multiplier = damage;
        self.pain_threshold_multiplier = pain;
        self
    }

    pub fn with_spinal_dependency(mut self, organ: NodeId) -> Self {
        self.spinal_dependencies.push(organ);
        self
    }

    /// External parts currently assigned to this limb, sorted by id
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }
}

#[derive(Debug, Clone, Default)]
pub struct LimbPartition {
    limbs: AHashMap<LimbId, Limb>,
    membership: AHashMap<NodeId, LimbId>,
}

impl LimbPartition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a limb. Membership is not touched; call `recompute` afterwards.
    pub(crate) fn insert(&mut self, limb: Limb) {
        self.limbs.insert(limb.id, limb);
    }

    pub(crate) fn remove(&mut self, id: LimbId) -> Result<Limb> {
        let limb = self.limbs.remove(&id).ok_or(AnatomyError::UnknownLimb(id))?;
        self.membership.retain(|_, l| *l != id);
        Ok(limb)
    }

    pub(crate) fn limb_mut(&mut self, id: LimbId) -> Result<&mut Limb> {
        self.limbs.get_mut(&id).ok_or(AnatomyError::UnknownLimb(id))
    }

    pub fn limb(&self, id: LimbId) -> Option<&Limb> {
        self.limbs.get(&id)
    }

    pub fn limbs(&self) -> impl Iterator<Item = &Limb> {
        self.limbs.values()
    }

    pub fn limb_by_name(&self, name: &str) -> Option<&Limb> {
        self.limbs.values().find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// The limb an external part belongs to
    pub fn limb_for(&self, node: NodeId) -> Option<&Limb> {
        self.membership.get(&node).and_then(|id| self.limbs.get(id))
    }

    /// (damage threshold multiplier, pain threshold multiplier)
    pub fn threshold_multipliers(&self, id: LimbId) -> Result<(f64, f64)> {
        let limb = self.limbs.get(&id).ok_or(AnatomyError::UnknownLimb(id))?;
        Ok((limb.damage_threshold_multiplier, limb.pain_threshold_multiplier))
    }

    pub fn spinal_dependencies(&self, id: LimbId) -> Result<&[NodeId]> {
        let limb = self.limbs.get(&id).ok_or(AnatomyError::UnknownLimb(id))?;
        Ok(&limb.spinal_dependencies)
    }

    /// Pick the limb for a part by walking up from it
    fn assign<F>(&self, node: NodeId, upstream: &F) -> Option<LimbId>
    where
        F: Fn(NodeId) -> Option<NodeId>,
    {
        let mut torso_fallback = None;
        let mut visited = AHashSet::new();
        let mut current = Some(node);

        while let Some(step) = current {
            if !visited.insert(step) {
                break;
            }

            let mut rooted: Vec<&Limb> = self.limbs.values().filter(|l| l.root == step).collect();
            rooted.sort_by_key(|l| l.id);

            if let Some(limb) = rooted.iter().find(|l| l.kind != LimbKind::Torso) {
                return Some(limb.id);
            }
            if torso_fallback.is_none() {
                torso_fallback = rooted.first().map(|l| l.id);
            }

            current = upstream(step);
        }

        torso_fallback
    }

    /// Reassign the given parts and rebuild member lists
    pub(crate) fn recompute<I, F>(&mut self, nodes: I, upstream: F)
    where
        I: IntoIterator<Item = NodeId>,
        F: Fn(NodeId) -> Option<NodeId>,
    {
        for node in nodes {
            match self.assign(node, &upstream) {
                Some(limb) => {
                    self.membership.insert(node, limb);
                }
                None => {
                    self.membership.remove(&node);
                }
            }
        }
        self.rebuild_members();
    }

    pub(crate) fn forget(&mut self, node: NodeId) {
        self.membership.remove(&node);
        self.rebuild_members();
    }

    fn rebuild_members(&mut self) {
        for limb in self.limbs.values_mut() {
            limb.members.clear();
        }
        for (node, limb) in &self.membership {
            if let Some(limb) = self.limbs.get_mut(limb) {
                limb.members.push(*node);
            }
        }
        for limb in self.limbs.values_mut() {
            limb.members.sort();
        }
    }
}
