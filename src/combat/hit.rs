//! Hit location resolution
//!
//! Picks the external part a strike lands on by weighted draw, then
//! optionally follows containment edges down to a bone or organ. Each
//! proximity group on the struck part gets its own draw, with whatever is
//! left of 100 as the chance of staying on the surface.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::anatomy::containment::ContainmentEdge;
use crate::anatomy::node::NodeKind;
use crate::body::state::Body;
use crate::core::error::{AnatomyError, Result};
use crate::core::types::{Alignment, NodeId, Orientation};

/// Containment chances are percentages of a strike on the container
const FULL_CHANCE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitOptions {
    /// Follow containment edges from the struck surface to bones and organs
    pub resolve_internals: bool,
    /// Let covering bones intercept strikes that reach an organ
    pub apply_bone_shielding: bool,
}

impl Default for HitOptions {
    fn default() -> Self {
        Self {
            resolve_internals: true,
            apply_bone_shielding: true,
        }
    }
}

impl HitOptions {
    /// Surface hits only
    pub fn surface() -> Self {
        Self {
            resolve_internals: false,
            apply_bone_shielding: false,
        }
    }
}

/// Where a strike landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitResult {
    /// The external part the strike came in through
    pub surface: NodeId,
    /// The part actually struck
    pub node: NodeId,
    pub kind: NodeKind,
}

/// Weighted draw over `(item, weight)` pairs using a cumulative-weight search.
/// Non-positive weights never win. Returns `None` if nothing has weight.
pub fn weighted_choice<T: Copy, R: Rng + ?Sized>(entries: &[(T, f64)], rng: &mut R) -> Option<T> {
    let mut cumulative = Vec::with_capacity(entries.len());
    let mut total = 0.0;
    for (_, weight) in entries {
        total += weight.max(0.0);
        cumulative.push(total);
    }
    if total <= 0.0 {
        return None;
    }

    let roll = rng.gen::<f64>() * total;
    let index = cumulative.partition_point(|c| *c <= roll);
    entries
        .get(index.min(entries.len() - 1))
        .map(|(item, _)| *item)
}

/// Candidate surfaces and their weights for a strike from this direction
pub fn surface_weights(
    body: &Body,
    alignment: Alignment,
    orientation: Orientation,
) -> Vec<(NodeId, f64)> {
    let schema = body.schema();
    let weigh = |filtered: bool| -> Vec<(NodeId, f64)> {
        schema
            .externals()
            .filter(|n| body.is_present(n.id()))
            .filter(|n| {
                !filtered
                    || (alignment.admits(n.common.alignment)
                        && orientation.admits(n.common.orientation))
            })
            .map(|n| (n.id(), n.hit_chances(alignment, orientation)))
            .filter(|(_, w)| *w > 0.0)
            .collect()
    };

    let filtered = weigh(true);
    if !filtered.is_empty() {
        return filtered;
    }
    tracing::debug!(
        "No parts face {:?}/{:?}, falling back to the whole body",
        alignment,
        orientation
    );
    weigh(false)
}

/// Choose the part a strike from the given direction lands on
pub fn resolve_hit<R: Rng + ?Sized>(
    body: &Body,
    alignment: Alignment,
    orientation: Orientation,
    options: HitOptions,
    rng: &mut R,
) -> Result<HitResult> {
    let weights = surface_weights(body, alignment, orientation);
    let surface = weighted_choice(&weights, rng).ok_or(AnatomyError::NoTargetableParts)?;
    let result = resolve_from_surface(body, surface, options, rng);
    tracing::debug!(
        "Strike {:?}/{:?} landed on {:?} ({:?})",
        alignment,
        orientation,
        result.node,
        result.kind
    );
    Ok(result)
}

/// Continue a strike that already landed on `surface`
pub fn resolve_from_surface<R: Rng + ?Sized>(
    body: &Body,
    surface: NodeId,
    options: HitOptions,
    rng: &mut R,
) -> HitResult {
    let surface_hit = HitResult {
        surface,
        node: surface,
        kind: NodeKind::External,
    };
    if !options.resolve_internals {
        return surface_hit;
    }

    let Some(edge) = draw_internal(body, surface, rng) else {
        return surface_hit;
    };

    let mut hit = HitResult {
        surface,
        node: edge.internal,
        kind: edge.internal_kind,
    };
    if options.apply_bone_shielding && hit.kind == NodeKind::Organ {
        if let Some(bone) = shielding_bone(body, hit.node, rng) {
            tracing::debug!("Bone {:?} shielded organ {:?}", bone, hit.node);
            hit.node = bone;
            // Bony external parts can shield too
            hit.kind = body.node(bone).map_or(NodeKind::Bone, |n| n.kind());
        }
    }
    hit
}

/// Draw group by group: ungrouped contents first, then named groups in order
fn draw_internal<'a, R: Rng + ?Sized>(
    body: &'a Body,
    surface: NodeId,
    rng: &mut R,
) -> Option<&'a ContainmentEdge> {
    let mut groups: BTreeMap<Option<&str>, Vec<&ContainmentEdge>> = BTreeMap::new();
    for edge in body.schema().containment().contents(surface) {
        if body.is_present(edge.internal) {
            groups
                .entry(edge.proximity_group.as_deref())
                .or_default()
                .push(edge);
        }
    }

    for (group, edges) in groups {
        let allotted: f64 = edges.iter().map(|e| e.hit_chance).sum();
        if allotted > FULL_CHANCE {
            tracing::warn!(
                "Containment on {:?} group {:?} totals {} over {}, renormalising",
                surface,
                group,
                allotted,
                FULL_CHANCE
            );
        }

        let mut entries: Vec<(Option<usize>, f64)> = edges
            .iter()
            .enumerate()
            .map(|(i, e)| (Some(i), e.hit_chance))
            .collect();
        entries.push((None, (FULL_CHANCE - allotted).max(0.0)));

        if let Some(Some(index)) = weighted_choice(&entries, rng) {
            return edges.get(index).copied();
        }
    }
    None
}

/// First covering bone whose coverage roll succeeds
fn shielding_bone<R: Rng + ?Sized>(body: &Body, organ: NodeId, rng: &mut R) -> Option<NodeId> {
    let mut covering: Vec<_> = body
        .schema()
        .coverage()
        .covering_bones(organ)
        .filter(|e| body.is_present(e.bone))
        .collect();
    covering.sort_by_key(|e| e.bone);

    covering
        .into_iter()
        .find(|e| rng.gen::<f64>() * FULL_CHANCE < e.coverage_chance)
        .map(|e| e.bone)
}
