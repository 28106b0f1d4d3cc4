//! Query error types.

use bridge_schema::SchemaError;
use thiserror::Error;

/// Errors raised while compiling a request or materializing a response.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed facet/filter input; a caller defect, always propagated
    #[error("Invalid query spec: {0}")]
    InvalidSpec(String),

    /// The raw response is missing a structurally required field
    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    /// Schema lookup failure during compilation
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
