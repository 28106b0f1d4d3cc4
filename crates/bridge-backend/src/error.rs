//! Backend error types.

use bridge_query::QueryError;
use bridge_schema::SchemaError;
use thiserror::Error;

/// Errors raised by the engine transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The engine could not be reached at all
    #[error("Engine connection failed: {0}")]
    Connection(String),

    /// The engine rejected or failed the request
    #[error("Engine request failed: {0}")]
    Request(String),

    /// The addressed container or document does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Errors surfaced by the backend facade.
///
/// `Transport` failures and malformed responses are degradable under the
/// silent-failure policy; schema conflicts and invalid request specs are
/// caller defects and always propagate.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl BackendError {
    /// Whether the silent-failure policy may swallow this error.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            BackendError::Transport(_) | BackendError::Query(QueryError::MalformedResponse(_))
        )
    }
}
