//! Process-wide catalog of species body schemas
//!
//! Schemas are read on every hit and edited almost never, so they are
//! published as immutable `Arc` snapshots. Readers clone the `Arc` under a
//! brief read lock; edits clone the schema, mutate the copy with no lock on
//! the map held, and swap it in. Writers are serialised on a separate mutex.

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;

use crate::anatomy::loader::load_schema_file;
use crate::anatomy::schema::BodySchema;
use crate::core::error::{AnatomyError, Result};
use crate::core::types::SpeciesId;

#[derive(Debug, Default)]
pub struct PartCatalog {
    schemas: RwLock<AHashMap<SpeciesId, Arc<BodySchema>>>,
    writers: Mutex<()>,
}

impl PartCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a schema, replacing any previous one for the species
    pub fn insert(&self, schema: BodySchema) -> Arc<BodySchema> {
        let species = schema.species;
        let schema = Arc::new(schema);
        tracing::info!(
            "Published body schema {} ({} parts) for {:?}",
            schema.name,
            schema.len(),
            species
        );
        let _writer = self.writers.lock();
        self.schemas.write().insert(species, Arc::clone(&schema));
        schema
    }

    /// Load a TOML schema file and publish it
    pub fn load_file(&self, path: &Path) -> Result<Arc<BodySchema>> {
        let schema = load_schema_file(path)?;
        Ok(self.insert(schema))
    }

    /// Current snapshot for a species
    pub fn snapshot(&self, species: SpeciesId) -> Option<Arc<BodySchema>> {
        self.schemas.read().get(&species).cloned()
    }

    pub fn require(&self, species: SpeciesId) -> Result<Arc<BodySchema>> {
        self.snapshot(species).ok_or(AnatomyError::UnknownSpecies(species))
    }

    /// Apply an administrative edit as a copy-on-write swap
    ///
    /// The edit runs against a private copy. If it fails, the published
    /// schema is left as it was. Bodies holding the old snapshot keep it.
    /// Readers are never blocked by the edit itself, only by the final swap.
    /// The edit must not call `insert`, `remove` or `edit` on this catalog.
    pub fn edit<T, F>(&self, species: SpeciesId, edit: F) -> Result<T>
    where
        F: FnOnce(&mut BodySchema) -> Result<T>,
    {
        let _writer = self.writers.lock();
        let current = self.require(species)?;

        let mut draft = BodySchema::clone(&current);
        let result = edit(&mut draft)?;
        self.schemas.write().insert(species, Arc::new(draft));
        tracing::debug!("Swapped edited body schema for {:?}", species);
        Ok(result)
    }

    pub fn remove(&self, species: SpeciesId) -> Option<Arc<BodySchema>> {
        let _writer = self.writers.lock();
        self.schemas.write().remove(&species)
    }

    pub fn species(&self) -> Vec<SpeciesId> {
        self.schemas.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::node::{BodypartNode, ExternalKind};
    use crate::core::types::NodeId;

    fn schema() -> BodySchema {
        let mut schema = BodySchema::new(SpeciesId(7), "blob");
        schema
            .add_node(BodypartNode::external(NodeId(1), "body", ExternalKind::General))
            .unwrap();
        schema
    }

    #[test]
    fn test_snapshot_survives_edit() {
        let catalog = PartCatalog::new();
        catalog.insert(schema());
        let before = catalog.snapshot(SpeciesId(7)).unwrap();

        catalog
            .edit(SpeciesId(7), |s| {
                s.add_node(BodypartNode::external(NodeId(2), "pseudopod", ExternalKind::General))
            })
            .unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(catalog.snapshot(SpeciesId(7)).unwrap().len(), 2);
    }

    #[test]
    fn test_failed_edit_publishes_nothing() {
        let catalog = PartCatalog::new();
        catalog.insert(schema());
        let result = catalog.edit(SpeciesId(7), |s| {
            s.add_node(BodypartNode::external(NodeId(2), "pseudopod", ExternalKind::General))?;
            s.set_upstream(NodeId(2), Some(NodeId(2)))
        });

        assert!(matches!(result, Err(AnatomyError::CyclicLink { .. })));
        assert_eq!(catalog.snapshot(SpeciesId(7)).unwrap().len(), 1);
    }

    #[test]
    fn test_readers_see_old_snapshot_during_edit() {
        let catalog = PartCatalog::new();
        let original = catalog.insert(schema());

        let seen = catalog
            .edit(SpeciesId(7), |s| {
                s.add_node(BodypartNode::external(NodeId(2), "pseudopod", ExternalKind::General))?;
                Ok(catalog.snapshot(SpeciesId(7)))
            })
            .unwrap()
            .unwrap();

        assert!(Arc::ptr_eq(&seen, &original));
        assert_eq!(catalog.snapshot(SpeciesId(7)).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_species() {
        let catalog = PartCatalog::new();
        assert!(matches!(
            catalog.require(SpeciesId(1)),
            Err(AnatomyError::UnknownSpecies(_))
        ));
        assert!(catalog.edit(SpeciesId(1), |_| Ok(())).is_err());
    }

    #[test]
    fn test_concurrent_readers() {
        let catalog = Arc::new(PartCatalog::new());
        catalog.insert(schema());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                std::thread::spawn(move || {
                    (0..100)
                        .filter_map(|_| catalog.snapshot(SpeciesId(7)))
                        .map(|s| s.len())
                        .sum::<usize>()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 100);
        }
    }
}
