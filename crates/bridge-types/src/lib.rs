//! # bridge-types
//!
//! Shared value objects for search-bridge: field descriptors, entity
//! identifiers, request/result types, geo primitives, and configuration.
//!
//! Everything here is a plain data type. The schema engine, query
//! compiler, and backend facade live in their own crates and consume
//! these types read-only.

pub mod config;
pub mod entity;
pub mod error;
pub mod field;
pub mod geo;
pub mod request;
pub mod result;
pub mod value;

pub use config::SearchConfig;
pub use entity::{EntityResolver, EntityType, Identifier};
pub use error::ConfigError;
pub use field::{FieldDescriptor, TermVector, ValueKind};
pub use geo::{bounding_box, Distance, Point};
pub use request::{
    DateFacetSpec, DateGap, DistancePoint, FacetSpec, FilterClause, FilterOperator, FilterValue,
    GeoNear, GeoWithin, QueryFacetSpec, SearchRequest, SortDirection,
};
pub use result::{Facets, ResultItem, ResultPage};
pub use value::FieldValue;

/// Reserved engine field holding the entity-type label of a document.
pub const ENTITY_TYPE_FIELD: &str = "entity_type";

/// Reserved engine field holding the entity's primary key.
pub const ENTITY_ID_FIELD: &str = "entity_id";

/// Logical field carrying the full document identifier, used as the
/// engine-level `_id`.
pub const ID_FIELD: &str = "id";

/// The universal match-all query string.
pub const MATCH_ALL: &str = "*:*";
