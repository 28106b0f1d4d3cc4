//! Unified schema registry.
//!
//! One owned registry instance per hosting application. Sources are
//! registered explicitly; `build()` resolves them into one `EntitySchema`
//! per entity type, wholesale. The built state is an `Arc` snapshot behind
//! an `RwLock`: rebuilds replace the whole snapshot atomically, readers
//! keep whatever snapshot they already hold, and accessors build on demand
//! when no snapshot exists yet.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bridge_types::EntityType;
use tracing::debug;

use crate::entity_schema::{EntitySchema, IndexDefinition};
use crate::error::SchemaError;

/// An immutable resolved view of all registered schemas.
#[derive(Debug)]
pub struct SchemaSnapshot {
    by_entity: HashMap<EntityType, EntitySchema>,
}

impl SchemaSnapshot {
    /// Schema for one entity type.
    pub fn index(&self, entity: &EntityType) -> Result<&EntitySchema, SchemaError> {
        self.by_entity
            .get(entity)
            .ok_or_else(|| SchemaError::Unregistered(entity.label()))
    }

    /// All registered entity types, sorted for determinism.
    pub fn entity_types(&self) -> Vec<EntityType> {
        let mut types: Vec<EntityType> = self.by_entity.keys().cloned().collect();
        types.sort();
        types
    }

    /// Every schema's resolution of a logical field name.
    ///
    /// Different entities may map one logical name to different physical
    /// fields, so the result is a per-entity mapping.
    pub fn index_fieldnames(&self, logical: &str) -> HashMap<EntityType, String> {
        self.by_entity
            .iter()
            .map(|(entity, schema)| (entity.clone(), schema.index_fieldname(logical).to_string()))
            .collect()
    }

    /// Every schema's resolution of a logical name to its facet variant.
    pub fn facet_fieldnames(&self, logical: &str) -> HashMap<EntityType, String> {
        self.by_entity
            .iter()
            .map(|(entity, schema)| (entity.clone(), schema.facet_fieldname(logical).to_string()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityType, &EntitySchema)> {
        self.by_entity.iter()
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

/// Collects all index definitions into a cohesive whole.
pub struct SchemaRegistry {
    sources: Vec<Arc<dyn IndexDefinition>>,
    excluded: Vec<String>,
    document_field: String,
    built: RwLock<Option<Arc<SchemaSnapshot>>>,
}

impl SchemaRegistry {
    pub fn new(document_field: impl Into<String>) -> Self {
        Self {
            sources: Vec::new(),
            excluded: Vec::new(),
            document_field: document_field.into(),
            built: RwLock::new(None),
        }
    }

    /// Exclude definitions by qualified name during collection.
    pub fn with_excluded(mut self, excluded: Vec<String>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Register an index definition. Registration order is preserved.
    pub fn register(&mut self, source: Arc<dyn IndexDefinition>) {
        self.sources.push(source);
    }

    /// Registered sources minus the exclusion list.
    pub fn collect_sources(&self) -> Vec<Arc<dyn IndexDefinition>> {
        self.sources
            .iter()
            .filter(|s| !self.excluded.iter().any(|e| e == s.name()))
            .cloned()
            .collect()
    }

    /// Drop the built snapshot; the next access rebuilds.
    pub fn reset(&self) {
        let mut built = self.built.write().unwrap_or_else(|e| e.into_inner());
        *built = None;
    }

    /// Resolve all sources into a fresh snapshot and install it.
    ///
    /// Passing explicit sources bypasses the collection/exclusion step.
    /// A second source for one entity type is fatal.
    pub fn build(
        &self,
        sources: Option<Vec<Arc<dyn IndexDefinition>>>,
    ) -> Result<Arc<SchemaSnapshot>, SchemaError> {
        let sources = sources.unwrap_or_else(|| self.collect_sources());
        let mut by_entity: HashMap<EntityType, EntitySchema> = HashMap::new();

        for source in sources {
            let entity = source.entity_type();

            if let Some(existing) = by_entity.get(&entity) {
                return Err(SchemaError::Duplicate {
                    entity: entity.label(),
                    first: existing.source_name().to_string(),
                    second: source.name().to_string(),
                });
            }

            let mut schema = EntitySchema::new(source, self.document_field.clone());
            schema.build()?;
            by_entity.insert(entity, schema);
        }

        debug!(schemas = by_entity.len(), "Built schema registry");

        let snapshot = Arc::new(SchemaSnapshot { by_entity });
        let mut built = self.built.write().unwrap_or_else(|e| e.into_inner());
        *built = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Current snapshot, building on demand if none exists.
    pub fn snapshot(&self) -> Result<Arc<SchemaSnapshot>, SchemaError> {
        {
            let built = self.built.read().unwrap_or_else(|e| e.into_inner());
            if let Some(snapshot) = built.as_ref() {
                return Ok(snapshot.clone());
            }
        }
        // Racing builders both compute a full snapshot; the merge is a
        // pure function of the sources, so last-write-wins is harmless.
        self.build(None)
    }

    /// All registered entity types.
    pub fn entity_types(&self) -> Result<Vec<EntityType>, SchemaError> {
        Ok(self.snapshot()?.entity_types())
    }

    /// Per-entity resolution of a logical field name.
    pub fn index_fieldnames(&self, logical: &str) -> Result<HashMap<EntityType, String>, SchemaError> {
        Ok(self.snapshot()?.index_fieldnames(logical))
    }

    /// Per-entity resolution of a logical name to its facet variant.
    pub fn facet_fieldnames(&self, logical: &str) -> Result<HashMap<EntityType, String>, SchemaError> {
        Ok(self.snapshot()?.facet_fieldnames(logical))
    }

    /// Sources that participate in the global analyzer check.
    pub fn sources(&self) -> Vec<Arc<dyn IndexDefinition>> {
        self.collect_sources()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("sources", &self.sources.len())
            .field("excluded", &self.excluded)
            .finish()
    }
}
