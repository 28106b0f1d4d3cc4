//! Schema error types.
//!
//! All of these indicate a programming or configuration defect, never a
//! transient condition; callers must not swallow them.

use thiserror::Error;

/// Errors raised while building or querying the unified schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Irreconcilable field declarations
    #[error("Schema conflict: {0}")]
    Conflict(String),

    /// Two index definitions claim the same entity type
    #[error(
        "Entity type '{entity}' has more than one index definition: \
         '{first}' and '{second}'. Exclude one of them."
    )]
    Duplicate {
        entity: String,
        first: String,
        second: String,
    },

    /// Lookup of an entity type that was never registered
    #[error("Entity type '{0}' is not registered")]
    Unregistered(String),
}
