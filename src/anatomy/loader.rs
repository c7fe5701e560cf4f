//! Load species body schemas from TOML files
//!
//! Parts are referenced by name throughout the file. Ids are assigned in the
//! order parts are listed, unless a part gives an explicit `id`.

use serde::Deserialize;
use std::path::Path;

use crate::anatomy::limb::{Limb, LimbKind};
use crate::anatomy::node::{
    BodypartNode, BoneAttrs, BoneClass, ExternalKind, HitChanceOverride, NodeKind, NodeVariant,
    OrganKind,
};
use crate::anatomy::schema::BodySchema;
use crate::core::error::Result;
use crate::core::types::{Alignment, LimbId, NodeId, Orientation, Shape, SizeCategory, SpeciesId};

fn one() -> f64 {
    1.0
}

fn default_max_life() -> f64 {
    100.0
}

fn disabled() -> f64 {
    -1.0
}

fn yes() -> bool {
    true
}

/// Whole schema file
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDef {
    pub species: u32,
    pub name: String,
    #[serde(default)]
    pub parts: Vec<PartDef>,
    #[serde(default)]
    pub containment: Vec<ContainmentDef>,
    #[serde(default)]
    pub coverage: Vec<CoverageDef>,
    #[serde(default)]
    pub limbs: Vec<LimbDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoneDef {
    #[serde(default)]
    pub class: BoneClass,
    #[serde(default)]
    pub critical: bool,
    #[serde(default = "yes")]
    pub can_be_immobilised: bool,
    #[serde(default = "one")]
    pub healing_modifier: f64,
}

impl From<&BoneDef> for BoneAttrs {
    fn from(def: &BoneDef) -> Self {
        BoneAttrs {
            class: def.class,
            critical: def.critical,
            can_be_immobilised: def.can_be_immobilised && def.class != BoneClass::NonImmobilising,
            healing_modifier: def.healing_modifier,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartDef {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub shape: Option<Shape>,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub size: SizeCategory,

    #[serde(default = "default_max_life")]
    pub max_life: f64,
    #[serde(default = "disabled")]
    pub severed_threshold: f64,
    #[serde(default = "one")]
    pub damage_modifier: f64,
    #[serde(default = "one")]
    pub pain_modifier: f64,
    #[serde(default = "one")]
    pub stun_modifier: f64,
    #[serde(default = "one")]
    pub bleed_modifier: f64,
    #[serde(default)]
    pub hit_chance: f64,
    #[serde(default)]
    pub hit_overrides: Vec<HitChanceOverride>,

    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub natural_armour: Option<String>,

    #[serde(default)]
    pub significant: bool,
    #[serde(default)]
    pub vital: bool,
    #[serde(default = "yes")]
    pub core: bool,

    #[serde(default)]
    pub upstream: Option<String>,
    #[serde(default)]
    pub counts_as: Option<String>,

    // External only
    #[serde(default)]
    pub external_kind: ExternalKind,
    #[serde(default = "yes")]
    pub wearable: bool,
    #[serde(default)]
    pub grabbing: bool,
    #[serde(default)]
    pub wielding: bool,

    /// Bone attributes for bones, or for bony external parts
    #[serde(default)]
    pub bone: Option<BoneDef>,

    // Organ only
    #[serde(default)]
    pub organ_kind: Option<OrganKind>,
    #[serde(default)]
    pub implant_space: f64,
    #[serde(default)]
    pub hypoxia_damage: f64,
    #[serde(default = "one")]
    pub infectability: f64,
    #[serde(default)]
    pub requires_spinal_connection: bool,
    #[serde(default)]
    pub blood_failure_volume: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainmentDef {
    pub external: String,
    pub internal: String,
    pub hit_chance: f64,
    #[serde(default)]
    pub proximity_group: Option<String>,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverageDef {
    pub bone: String,
    pub organ: String,
    pub chance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimbDef {
    pub name: String,
    pub kind: LimbKind,
    pub root: String,
    #[serde(default = "one")]
    pub damage_threshold: f64,
    #[serde(default = "one")]
    pub pain_threshold: f64,
    #[serde(default)]
    pub spinal: Vec<String>,
}

impl PartDef {
    fn build(&self, id: NodeId) -> BodypartNode {
        let mut node = match self.kind {
            NodeKind::External => {
                let mut node = BodypartNode::external(id, &self.name, self.external_kind);
                if let Some(ext) = node.as_external_mut() {
                    ext.wearable = self.wearable;
                    ext.grabbing = self.grabbing;
                    ext.wielding = self.wielding;
                    ext.hit_overrides = self.hit_overrides.clone();
                    ext.bone = self.bone.as_ref().map(BoneAttrs::from);
                }
                node
            }
            NodeKind::Bone => {
                let class = self.bone.as_ref().map(|b| b.class).unwrap_or_default();
                let mut node = BodypartNode::bone(id, &self.name, class);
                if let (Some(def), NodeVariant::Bone(attrs)) =
                    (&self.bone, &mut node.variant)
                {
                    *attrs = BoneAttrs::from(def);
                }
                node
            }
            NodeKind::Organ => {
                let kind = self.organ_kind.unwrap_or(OrganKind::Other);
                let mut node = BodypartNode::organ(id, &self.name, kind);
                if let NodeVariant::Organ(attrs) = &mut node.variant {
                    attrs.implant_space_occupied = self.implant_space;
                    attrs.hypoxia_damage_per_tick = self.hypoxia_damage;
                    attrs.relative_infectability = self.infectability;
                    attrs.requires_spinal_connection = self.requires_spinal_connection;
                    attrs.blood_buildup_failure_volume = self.blood_failure_volume;
                }
                node
            }
        };

        let common = &mut node.common;
        if let Some(description) = &self.description {
            common.description = description.clone();
        }
        if let Some(shape) = self.shape {
            common.shape = shape;
        }
        common.alignment = self.alignment;
        common.orientation = self.orientation;
        common.size = self.size;
        common.max_life = self.max_life;
        common.severed_threshold = self.severed_threshold;
        common.damage_modifier = self.damage_modifier;
        common.pain_modifier = self.pain_modifier;
        common.stun_modifier = self.stun_modifier;
        common.bleed_modifier = self.bleed_modifier;
        common.relative_hit_chance = self.hit_chance;
        if let Some(material) = &self.material {
            common.default_material = material.clone();
        }
        common.natural_armour = self.natural_armour.clone();
        common.significant = self.significant;
        common.vital = self.vital;
        common.is_core = self.core;
        node
    }
}

/// Build a schema from its parsed definition
pub fn build_schema(def: &SchemaDef) -> Result<BodySchema> {
    let mut schema = BodySchema::new(SpeciesId(def.species), &def.name);

    for part in &def.parts {
        let id = part.id.map(NodeId).unwrap_or_else(|| schema.next_node_id());
        schema.add_node(part.build(id))?;
    }

    // Links need every part in place first
    for part in &def.parts {
        let id = schema.id_by_name(&part.name)?;
        if let Some(parent) = &part.upstream {
            let parent = schema.id_by_name(parent)?;
            schema.set_upstream(id, Some(parent))?;
        }
        if let Some(target) = &part.counts_as {
            let target = schema.id_by_name(target)?;
            schema.set_counts_as(id, Some(target))?;
        }
    }

    for edge in &def.containment {
        let external = schema.id_by_name(&edge.external)?;
        let internal = schema.id_by_name(&edge.internal)?;
        schema.add_containment(external, internal, edge.hit_chance, edge.proximity_group.clone())?;
        if edge.primary {
            schema.set_primary(external, internal)?;
        }
    }

    for edge in &def.coverage {
        let bone = schema.id_by_name(&edge.bone)?;
        let organ = schema.id_by_name(&edge.organ)?;
        schema.add_coverage(bone, organ, edge.chance)?;
    }

    for (index, limb_def) in def.limbs.iter().enumerate() {
        let root = schema.id_by_name(&limb_def.root)?;
        let mut limb = Limb::new(LimbId(index as u32 + 1), &limb_def.name, limb_def.kind, root)
            .with_thresholds(limb_def.damage_threshold, limb_def.pain_threshold);
        for organ in &limb_def.spinal {
            limb = limb.with_spinal_dependency(schema.id_by_name(organ)?);
        }
        schema.add_limb(limb)?;
    }

    Ok(schema)
}

pub fn parse_schema(content: &str) -> Result<BodySchema> {
    let def: SchemaDef = toml::from_str(content)?;
    build_schema(&def)
}

pub fn load_schema_file(path: &Path) -> Result<BodySchema> {
    let content = std::fs::read_to_string(path)?;
    let schema = parse_schema(&content)?;
    tracing::info!(
        "Loaded body schema {} from {} ({} parts, {} limbs)",
        schema.name,
        path.display(),
        schema.len(),
        schema.limbs().limbs().count()
    );
    Ok(schema)
}
