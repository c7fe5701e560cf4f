//! Body schema for one species
//!
//! Owns every bodypart definition plus the containment graph, coverage graph
//! and limb partition built over them. All structural edits go through this
//! type so that cross-graph invariants (part kinds, cycles, limb membership)
//! are checked in one place. A rejected edit leaves the schema unchanged.

use ahash::{AHashMap, AHashSet};
use std::collections::BTreeMap;

use crate::anatomy::containment::ContainmentGraph;
use crate::anatomy::coverage::CoverageGraph;
use crate::anatomy::limb::{Limb, LimbPartition};
use crate::anatomy::node::{BodypartNode, Capability, NodeKind};
use crate::core::error::{AnatomyError, Result};
use crate::core::types::{LimbId, NodeId, SpeciesId};

#[derive(Debug, Clone)]
pub struct BodySchema {
    pub species: SpeciesId,
    pub name: String,
    nodes: BTreeMap<NodeId, BodypartNode>,
    by_name: AHashMap<String, NodeId>,
    containment: ContainmentGraph,
    coverage: CoverageGraph,
    limbs: LimbPartition,
}

impl BodySchema {
    pub fn new(species: SpeciesId, name: impl Into<String>) -> Self {
        Self {
            species,
            name: name.into(),
            nodes: BTreeMap::new(),
            by_name: AHashMap::new(),
            containment: ContainmentGraph::new(),
            coverage: CoverageGraph::new(),
            limbs: LimbPartition::new(),
        }
    }

    // === Lookup ===

    pub fn node(&self, id: NodeId) -> Option<&BodypartNode> {
        self.nodes.get(&id)
    }

    pub fn require(&self, id: NodeId) -> Result<&BodypartNode> {
        self.nodes.get(&id).ok_or(AnatomyError::UnknownNode(id))
    }

    pub fn node_by_name(&self, name: &str) -> Option<&BodypartNode> {
        self.by_name
            .get(&name.to_lowercase())
            .and_then(|id| self.nodes.get(id))
    }

    pub fn id_by_name(&self, name: &str) -> Result<NodeId> {
        self.by_name
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| AnatomyError::UnknownNodeName(name.to_string()))
    }

    /// All parts in id order
    pub fn nodes(&self) -> impl Iterator<Item = &BodypartNode> {
        self.nodes.values()
    }

    pub fn externals(&self) -> impl Iterator<Item = &BodypartNode> {
        self.nodes.values().filter(|n| n.kind() == NodeKind::External)
    }

    pub fn organs(&self) -> impl Iterator<Item = &BodypartNode> {
        self.nodes.values().filter(|n| n.kind() == NodeKind::Organ)
    }

    pub fn bones(&self) -> impl Iterator<Item = &BodypartNode> {
        self.nodes.values().filter(|n| n.has(Capability::Bone))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Next unused node id
    pub fn next_node_id(&self) -> NodeId {
        NodeId(self.nodes.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    pub fn containment(&self) -> &ContainmentGraph {
        &self.containment
    }

    pub fn coverage(&self) -> &CoverageGraph {
        &self.coverage
    }

    pub fn limbs(&self) -> &LimbPartition {
        &self.limbs
    }

    pub fn limb_for(&self, node: NodeId) -> Option<&Limb> {
        self.limbs.limb_for(node)
    }

    // === Parts ===

    /// Add a part. Its upstream link and counts-as alias start empty.
    pub fn add_node(&mut self, mut node: BodypartNode) -> Result<NodeId> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(AnatomyError::DuplicateName(format!("id {}", id.0)));
        }
        let key = node.name().to_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(AnatomyError::DuplicateName(node.name().to_string()));
        }

        node.common.counts_as = None;
        if let Some(ext) = node.as_external_mut() {
            ext.upstream = None;
        }

        self.by_name.insert(key, id);
        self.nodes.insert(id, node);
        if self.nodes[&id].kind() == NodeKind::External {
            self.recompute_limbs(vec![id]);
        }
        Ok(id)
    }

    /// Remove a part along with every edge, alias and upstream link touching it
    pub fn remove_node(&mut self, id: NodeId) -> Result<BodypartNode> {
        let children = self.children(id);
        let node = self.nodes.remove(&id).ok_or(AnatomyError::UnknownNode(id))?;
        self.by_name.remove(&node.name().to_lowercase());

        self.containment.remove_node(id);
        self.coverage.remove_node(id);

        for other in self.nodes.values_mut() {
            if other.common.counts_as == Some(id) {
                other.common.counts_as = None;
            }
            if let Some(ext) = other.as_external_mut() {
                if ext.upstream == Some(id) {
                    ext.upstream = None;
                }
            }
        }

        let orphaned: Vec<LimbId> = self.limbs.limbs().filter(|l| l.root == id).map(|l| l.id).collect();
        for limb in orphaned {
            self.limbs.remove(limb)?;
        }
        let dependent: Vec<LimbId> = self
            .limbs
            .limbs()
            .filter(|l| l.spinal_dependencies.contains(&id))
            .map(|l| l.id)
            .collect();
        for limb in dependent {
            self.limbs.limb_mut(limb)?.spinal_dependencies.retain(|n| *n != id);
        }

        self.limbs.forget(id);
        let mut affected = Vec::new();
        for child in children {
            affected.push(child);
            affected.extend(self.downstream(child));
        }
        self.recompute_limbs(affected);
        Ok(node)
    }

    // === Counts-as aliasing ===

    /// Follow counts-as links to the end of the chain
    pub fn canonical(&self, id: NodeId) -> NodeId {
        let mut visited = AHashSet::new();
        let mut current = id;
        while visited.insert(current) {
            match self.nodes.get(&current).and_then(|n| n.counts_as()) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Whether `id` is `other` or counts as it, directly or transitively
    pub fn counts_as(&self, id: NodeId, other: NodeId) -> bool {
        let mut visited = AHashSet::new();
        let mut current = Some(id);
        while let Some(step) = current {
            if step == other {
                return true;
            }
            if !visited.insert(step) {
                return false;
            }
            current = self.nodes.get(&step).and_then(|n| n.counts_as());
        }
        false
    }

    /// Every part linked to `id` through counts-as in either direction, including itself
    fn alias_closure(&self, id: NodeId) -> AHashSet<NodeId> {
        let mut closure = AHashSet::new();
        let mut stack = vec![id];
        while let Some(step) = stack.pop() {
            if !closure.insert(step) {
                continue;
            }
            if let Some(target) = self.nodes.get(&step).and_then(|n| n.counts_as()) {
                stack.push(target);
            }
            stack.extend(
                self.nodes
                    .values()
                    .filter(|n| n.counts_as() == Some(step))
                    .map(|n| n.id()),
            );
        }
        closure
    }

    pub fn set_counts_as(&mut self, id: NodeId, target: Option<NodeId>) -> Result<()> {
        self.require(id)?;
        if let Some(target) = target {
            self.require(target)?;
            // Aliasing merges the two classes, so neither may sit above the other
            let ours = self.alias_closure(id);
            let theirs = self.alias_closure(target);
            let cyclic = self.counts_as(target, id)
                || self.climbs_into(self.parents_of(&ours), &theirs)
                || self.climbs_into(self.parents_of(&theirs), &ours);
            if cyclic {
                return Err(AnatomyError::CyclicLink { node: id, target });
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.common.counts_as = target;
        }
        Ok(())
    }

    // === Upstream links ===

    fn upstream_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.upstream())
    }

    /// Ancestors of a part, nearest first, not including itself
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut visited = AHashSet::from_iter([id]);
        let mut current = self.upstream_of(id);
        while let Some(step) = current {
            if !visited.insert(step) {
                break;
            }
            result.push(step);
            current = self.upstream_of(step);
        }
        result
    }

    /// Direct children of an external part
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.upstream() == Some(id))
            .map(|n| n.id())
            .collect()
    }

    /// Every external part downstream of `id`, not including itself
    pub fn downstream(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut visited = AHashSet::from_iter([id]);
        let mut stack = self.children(id);
        while let Some(step) = stack.pop() {
            if !visited.insert(step) {
                continue;
            }
            result.push(step);
            stack.extend(self.children(step));
        }
        result.sort();
        result
    }

    fn require_kind(&self, id: NodeId, capability: Capability, expected: &'static str) -> Result<&BodypartNode> {
        let node = self.require(id)?;
        if node.has(capability) {
            Ok(node)
        } else {
            Err(AnatomyError::WrongKind {
                node: id,
                actual: node.kind(),
                expected,
            })
        }
    }

    fn parents_of(&self, ids: &AHashSet<NodeId>) -> Vec<NodeId> {
        ids.iter().filter_map(|id| self.upstream_of(*id)).collect()
    }

    /// Whether walking upstream from `start`, treating counts-as aliases as
    /// the same part, reaches any of `forbidden`
    fn climbs_into(&self, start: Vec<NodeId>, forbidden: &AHashSet<NodeId>) -> bool {
        let mut visited = AHashSet::new();
        let mut frontier = start;
        while let Some(step) = frontier.pop() {
            if !visited.insert(step) {
                continue;
            }
            for alias in self.alias_closure(step) {
                if forbidden.contains(&alias) {
                    return true;
                }
                if let Some(up) = self.upstream_of(alias) {
                    frontier.push(up);
                }
            }
        }
        false
    }

    /// Link an external part to its parent, or detach it with `None`
    ///
    /// Rejected when the parent is already downstream of the part, directly or
    /// through counts-as aliases in either direction.
    pub fn set_upstream(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<()> {
        self.require_kind(id, Capability::External, "an external part")?;

        if let Some(parent) = parent {
            self.require_kind(parent, Capability::External, "an external part")?;

            if self.climbs_into(vec![parent], &self.alias_closure(id)) {
                return Err(AnatomyError::CyclicLink { node: id, target: parent });
            }
        }

        if let Some(ext) = self.nodes.get_mut(&id).and_then(|n| n.as_external_mut()) {
            ext.upstream = parent;
        }

        let mut affected = vec![id];
        affected.extend(self.downstream(id));
        self.recompute_limbs(affected);
        Ok(())
    }

    fn recompute_limbs(&mut self, affected: Vec<NodeId>) {
        let nodes = &self.nodes;
        self.limbs
            .recompute(affected, |n| nodes.get(&n).and_then(|x| x.upstream()));
    }

    // === Containment ===

    pub fn add_containment(
        &mut self,
        external: NodeId,
        internal: NodeId,
        hit_chance: f64,
        proximity_group: Option<String>,
    ) -> Result<()> {
        self.require_kind(external, Capability::External, "an external part")?;
        let inner = self.require(internal)?;
        if !inner.is_internal() {
            return Err(AnatomyError::WrongKind {
                node: internal,
                actual: inner.kind(),
                expected: "a bone or organ",
            });
        }
        let kind = inner.kind();
        self.containment
            .add_containment(external, internal, kind, hit_chance, proximity_group)
    }

    pub fn remove_containment(&mut self, external: NodeId, internal: NodeId) -> Result<()> {
        self.containment.remove_containment(external, internal).map(|_| ())
    }

    pub fn set_containment_chance(&mut self, external: NodeId, internal: NodeId, hit_chance: f64) -> Result<()> {
        self.containment.set_hit_chance(external, internal, hit_chance)
    }

    pub fn set_proximity_group(
        &mut self,
        external: NodeId,
        internal: NodeId,
        group: Option<String>,
    ) -> Result<()> {
        self.containment.set_proximity_group(external, internal, group)
    }

    pub fn set_primary(&mut self, external: NodeId, internal: NodeId) -> Result<Option<NodeId>> {
        self.containment.set_primary(external, internal)
    }

    // === Coverage ===

    pub fn add_coverage(&mut self, bone: NodeId, organ: NodeId, coverage_chance: f64) -> Result<()> {
        self.require_kind(bone, Capability::Bone, "a bone")?;
        self.require_kind(organ, Capability::Organ, "an organ")?;
        self.coverage.add_coverage(bone, organ, coverage_chance)
    }

    pub fn remove_coverage(&mut self, bone: NodeId, organ: NodeId) -> Result<()> {
        self.coverage.remove_coverage(bone, organ).map(|_| ())
    }

    pub fn set_coverage(&mut self, bone: NodeId, organ: NodeId, coverage_chance: f64) -> Result<()> {
        self.coverage.set_coverage(bone, organ, coverage_chance)
    }

    // === Limbs ===

    pub fn add_limb(&mut self, limb: Limb) -> Result<LimbId> {
        self.require_kind(limb.root, Capability::External, "an external part")?;
        for organ in &limb.spinal_dependencies {
            self.require_kind(*organ, Capability::Organ, "an organ")?;
        }
        if self.limbs.limb(limb.id).is_some() || self.limbs.limb_by_name(&limb.name).is_some() {
            return Err(AnatomyError::DuplicateName(limb.name));
        }

        let id = limb.id;
        self.limbs.insert(limb);
        let all: Vec<NodeId> = self.externals().map(|n| n.id()).collect();
        self.recompute_limbs(all);
        Ok(id)
    }

    pub fn remove_limb(&mut self, id: LimbId) -> Result<Limb> {
        let limb = self.limbs.remove(id)?;
        let all: Vec<NodeId> = self.externals().map(|n| n.id()).collect();
        self.recompute_limbs(all);
        Ok(limb)
    }

    pub fn add_spinal_dependency(&mut self, limb: LimbId, organ: NodeId) -> Result<()> {
        self.require_kind(organ, Capability::Organ, "an organ")?;
        let limb = self.limbs.limb_mut(limb)?;
        if !limb.spinal_dependencies.contains(&organ) {
            limb.spinal_dependencies.push(organ);
        }
        Ok(())
    }
}
