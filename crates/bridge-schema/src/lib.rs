//! # bridge-schema
//!
//! Schema unification for search-bridge.
//!
//! Applications declare fields per entity type through `IndexDefinition`
//! sources. `EntitySchema` merges all declarations of one entity type into
//! a single resolved field set, detecting naming conflicts;
//! `SchemaRegistry` aggregates one schema per entity type across the whole
//! application and guards against duplicate registrations. The resolved
//! state is rebuilt wholesale and handed out as an immutable snapshot.

pub mod analyzers;
pub mod entity_schema;
pub mod error;
pub mod mapping;
pub mod registry;

pub use analyzers::check_analyzers;
pub use entity_schema::{EntitySchema, IndexDefinition};
pub use error::SchemaError;
pub use mapping::build_mapping;
pub use registry::{SchemaRegistry, SchemaSnapshot};
