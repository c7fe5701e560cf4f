//! Coverage graph: which bones shield which organs
//!
//! Coverage is evaluated per bone. Several bones may each cover the same organ
//! with a high chance; the chances are independent and need not sum to 100.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::anatomy::containment::check_chance;
use crate::core::error::{AnatomyError, Result};
use crate::core::types::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageEdge {
    pub bone: NodeId,
    pub organ: NodeId,
    /// 0..=100
    pub coverage_chance: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CoverageGraph {
    edges: AHashMap<(NodeId, NodeId), CoverageEdge>,
    by_bone: AHashMap<NodeId, Vec<NodeId>>,
    by_organ: AHashMap<NodeId, Vec<NodeId>>,
}

impl CoverageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coverage(&mut self, bone: NodeId, organ: NodeId, coverage_chance: f64) -> Result<()> {
        if self.edges.contains_key(&(bone, organ)) {
            return Err(AnatomyError::DuplicateCoverage { bone, organ });
        }
        check_chance(coverage_chance)?;

        self.edges.insert(
            (bone, organ),
            CoverageEdge {
                bone,
                organ,
                coverage_chance,
            },
        );
        self.by_bone.entry(bone).or_default().push(organ);
        self.by_organ.entry(organ).or_default().push(bone);
        Ok(())
    }

    pub fn remove_coverage(&mut self, bone: NodeId, organ: NodeId) -> Result<CoverageEdge> {
        let edge = self
            .edges
            .remove(&(bone, organ))
            .ok_or(AnatomyError::NotCovered { bone, organ })?;

        if let Some(list) = self.by_bone.get_mut(&bone) {
            list.retain(|n| *n != organ);
        }
        if let Some(list) = self.by_organ.get_mut(&organ) {
            list.retain(|n| *n != bone);
        }
        Ok(edge)
    }

    pub fn set_coverage(&mut self, bone: NodeId, organ: NodeId, coverage_chance: f64) -> Result<()> {
        check_chance(coverage_chance)?;
        let edge = self
            .edges
            .get_mut(&(bone, organ))
            .ok_or(AnatomyError::NotCovered { bone, organ })?;
        edge.coverage_chance = coverage_chance;
        Ok(())
    }

    pub fn get(&self, bone: NodeId, organ: NodeId) -> Option<&CoverageEdge> {
        self.edges.get(&(bone, organ))
    }

    /// Organs shielded by a bone
    pub fn covered_organs(&self, bone: NodeId) -> impl Iterator<Item = &CoverageEdge> {
        self.by_bone
            .get(&bone)
            .into_iter()
            .flatten()
            .filter_map(move |organ| self.edges.get(&(bone, *organ)))
    }

    /// Bones shielding an organ
    pub fn covering_bones(&self, organ: NodeId) -> impl Iterator<Item = &CoverageEdge> {
        self.by_organ
            .get(&organ)
            .into_iter()
            .flatten()
            .filter_map(move |bone| self.edges.get(&(*bone, organ)))
    }

    pub fn edges(&self) -> impl Iterator<Item = &CoverageEdge> {
        self.edges.values()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) {
        let organs: Vec<NodeId> = self.by_bone.get(&node).cloned().unwrap_or_default();
        for organ in organs {
            let _ = self.remove_coverage(node, organ);
        }
        let bones: Vec<NodeId> = self.by_organ.get(&node).cloned().unwrap_or_default();
        for bone in bones {
            let _ = self.remove_coverage(bone, node);
        }
        self.by_bone.remove(&node);
        self.by_organ.remove(&node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STERNUM: NodeId = NodeId(1);
    const RIBS: NodeId = NodeId(2);
    const HEART: NodeId = NodeId(10);
    const LUNG: NodeId = NodeId(11);

    #[test]
    fn test_many_to_many_coverage() {
        let mut graph = CoverageGraph::new();
        graph.add_coverage(STERNUM, HEART, 90.0).unwrap();
        graph.add_coverage(RIBS, HEART, 85.0).unwrap();
        graph.add_coverage(RIBS, LUNG, 70.0).unwrap();

        // Independent chances, no requirement to sum to 100
        let total: f64 = graph.covering_bones(HEART).map(|e| e.coverage_chance).sum();
        assert_eq!(total, 175.0);
        assert_eq!(graph.covered_organs(RIBS).count(), 2);
    }

    #[test]
    fn test_duplicate_and_missing_coverage() {
        let mut graph = CoverageGraph::new();
        graph.add_coverage(STERNUM, HEART, 90.0).unwrap();
        assert!(matches!(
            graph.add_coverage(STERNUM, HEART, 10.0),
            Err(AnatomyError::DuplicateCoverage { .. })
        ));
        assert!(matches!(
            graph.remove_coverage(RIBS, HEART),
            Err(AnatomyError::NotCovered { .. })
        ));
        assert!(matches!(
            graph.set_coverage(RIBS, HEART, 10.0),
            Err(AnatomyError::NotCovered { .. })
        ));
        assert_eq!(graph.get(STERNUM, HEART).unwrap().coverage_chance, 90.0);
    }

    #[test]
    fn test_remove_updates_both_indexes() {
        let mut graph = CoverageGraph::new();
        graph.add_coverage(RIBS, HEART, 85.0).unwrap();
        graph.remove_coverage(RIBS, HEART).unwrap();
        assert_eq!(graph.covering_bones(HEART).count(), 0);
        assert_eq!(graph.covered_organs(RIBS).count(), 0);
    }
}
