//! Containment graph: which bones and organs sit inside which external parts
//!
//! Edges are keyed by (external, internal) and indexed in both directions, so
//! lookups cost O(edges per node). Each edge carries the chance that a strike
//! on the external part reaches the internal one.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::anatomy::node::NodeKind;
use crate::core::error::{AnatomyError, Result};
use crate::core::types::NodeId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainmentEdge {
    pub external: NodeId,
    pub internal: NodeId,
    /// Bone or Organ; primary designation is scoped per kind
    pub internal_kind: NodeKind,
    /// 0..=100
    pub hit_chance: f64,
    pub is_primary: bool,
    pub proximity_group: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContainmentGraph {
    edges: AHashMap<(NodeId, NodeId), ContainmentEdge>,
    by_external: AHashMap<NodeId, Vec<NodeId>>,
    by_internal: AHashMap<NodeId, Vec<NodeId>>,
}

pub(crate) fn check_chance(chance: f64) -> Result<()> {
    if (0.0..=100.0).contains(&chance) {
        Ok(())
    } else {
        Err(AnatomyError::ChanceOutOfRange(chance))
    }
}

impl ContainmentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new edge. Existing edges must be updated, not re-added.
    pub fn add_containment(
        &mut self,
        external: NodeId,
        internal: NodeId,
        internal_kind: NodeKind,
        hit_chance: f64,
        proximity_group: Option<String>,
    ) -> Result<()> {
        if self.edges.contains_key(&(external, internal)) {
            return Err(AnatomyError::DuplicateContainment { external, internal });
        }
        check_chance(hit_chance)?;

        self.edges.insert(
            (external, internal),
            ContainmentEdge {
                external,
                internal,
                internal_kind,
                hit_chance,
                is_primary: false,
                proximity_group,
            },
        );
        self.by_external.entry(external).or_default().push(internal);
        self.by_internal.entry(internal).or_default().push(external);
        Ok(())
    }

    pub fn remove_containment(
        &mut self,
        external: NodeId,
        internal: NodeId,
    ) -> Result<ContainmentEdge> {
        let edge = self
            .edges
            .remove(&(external, internal))
            .ok_or(AnatomyError::NotContained { external, internal })?;

        if let Some(list) = self.by_external.get_mut(&external) {
            list.retain(|n| *n != internal);
        }
        if let Some(list) = self.by_internal.get_mut(&internal) {
            list.retain(|n| *n != external);
        }
        Ok(edge)
    }

    pub fn set_hit_chance(&mut self, external: NodeId, internal: NodeId, hit_chance: f64) -> Result<()> {
        check_chance(hit_chance)?;
        let edge = self
            .edges
            .get_mut(&(external, internal))
            .ok_or(AnatomyError::NotContained { external, internal })?;
        edge.hit_chance = hit_chance;
        Ok(())
    }

    pub fn set_proximity_group(
        &mut self,
        external: NodeId,
        internal: NodeId,
        group: Option<String>,
    ) -> Result<()> {
        let edge = self
            .edges
            .get_mut(&(external, internal))
            .ok_or(AnatomyError::NotContained { external, internal })?;
        if edge.proximity_group != group {
            // Changing scope drops the primary flag rather than risk two primaries
            edge.is_primary = false;
            edge.proximity_group = group;
        }
        Ok(())
    }

    /// Mark `internal` as the primary content of `external` within its scope
    ///
    /// The scope is (external, proximity group, internal kind). Any previous
    /// primary in that scope is cleared. Returns the previous primary, if it
    /// was a different node.
    pub fn set_primary(&mut self, external: NodeId, internal: NodeId) -> Result<Option<NodeId>> {
        let (group, kind) = match self.edges.get(&(external, internal)) {
            Some(edge) => (edge.proximity_group.clone(), edge.internal_kind),
            None => return Err(AnatomyError::NotContained { external, internal }),
        };

        let mut previous = None;
        for other in self.by_external.get(&external).into_iter().flatten() {
            if *other == internal {
                continue;
            }
            if let Some(edge) = self.edges.get_mut(&(external, *other)) {
                if edge.is_primary && edge.proximity_group == group && edge.internal_kind == kind {
                    edge.is_primary = false;
                    previous = Some(*other);
                }
            }
        }

        if let Some(edge) = self.edges.get_mut(&(external, internal)) {
            edge.is_primary = true;
        }
        Ok(previous)
    }

    pub fn clear_primary(&mut self, external: NodeId, internal: NodeId) -> Result<()> {
        let edge = self
            .edges
            .get_mut(&(external, internal))
            .ok_or(AnatomyError::NotContained { external, internal })?;
        edge.is_primary = false;
        Ok(())
    }

    pub fn get(&self, external: NodeId, internal: NodeId) -> Option<&ContainmentEdge> {
        self.edges.get(&(external, internal))
    }

    /// Edges out of an external part, in insertion order
    pub fn contents(&self, external: NodeId) -> impl Iterator<Item = &ContainmentEdge> {
        self.by_external
            .get(&external)
            .into_iter()
            .flatten()
            .filter_map(move |internal| self.edges.get(&(external, *internal)))
    }

    /// Edges into an internal part, in insertion order
    pub fn containers(&self, internal: NodeId) -> impl Iterator<Item = &ContainmentEdge> {
        self.by_internal
            .get(&internal)
            .into_iter()
            .flatten()
            .filter_map(move |external| self.edges.get(&(*external, internal)))
    }

    /// The part an internal node is housed in: its primary container, or the
    /// lowest-id container when none is marked primary
    pub fn primary_container(&self, internal: NodeId) -> Option<NodeId> {
        self.containers(internal)
            .find(|e| e.is_primary)
            .or_else(|| self.containers(internal).min_by_key(|e| e.external))
            .map(|e| e.external)
    }

    /// The primary internal node in a given scope of an external part
    pub fn primary_in(
        &self,
        external: NodeId,
        group: Option<&str>,
        kind: NodeKind,
    ) -> Option<NodeId> {
        self.contents(external)
            .find(|e| e.is_primary && e.proximity_group.as_deref() == group && e.internal_kind == kind)
            .map(|e| e.internal)
    }

    pub fn edges(&self) -> impl Iterator<Item = &ContainmentEdge> {
        self.edges.values()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Drop every edge touching `node`
    pub(crate) fn remove_node(&mut self, node: NodeId) {
        let externals: Vec<NodeId> = self.by_internal.get(&node).cloned().unwrap_or_default();
        for external in externals {
            let _ = self.remove_containment(external, node);
        }
        let internals: Vec<NodeId> = self.by_external.get(&node).cloned().unwrap_or_default();
        for internal in internals {
            let _ = self.remove_containment(node, internal);
        }
        self.by_external.remove(&node);
        self.by_internal.remove(&node);
    }
}
