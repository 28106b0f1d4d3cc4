//! Engine transport abstraction.
//!
//! The facade never talks HTTP directly; every engine interaction goes
//! through `SearchTransport`. Production code implements it over an
//! engine client, tests implement it over canned responses.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

/// The raw operations the backend needs from an engine.
///
/// All bodies and responses are engine-native JSON; compilation and
/// materialization stay on the caller's side of this seam.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Run a compiled search body, optionally scoped to document types.
    async fn execute_search(
        &self,
        index: &str,
        doc_types: &[String],
        body: &Value,
    ) -> Result<Value, TransportError>;

    /// Run a more-like-this query seeded by one stored document, with an
    /// optional result window of `(start, row count)`.
    async fn execute_more_like_this(
        &self,
        index: &str,
        document_id: &str,
        field: &str,
        window: Option<(u64, u64)>,
    ) -> Result<Value, TransportError>;

    /// Fetch the schema (mapping) currently published for the container.
    async fn get_schema(&self, index: &str) -> Result<Value, TransportError>;

    /// Create the container with the given settings body. Creating a
    /// container that already exists is not an error.
    async fn create_container(&self, index: &str, settings: &Value)
        -> Result<(), TransportError>;

    /// Publish a schema (mapping) to the container.
    async fn publish_schema(&self, index: &str, mapping: &Value) -> Result<(), TransportError>;

    /// Delete the whole container and everything in it.
    async fn delete_container(&self, index: &str) -> Result<(), TransportError>;

    /// Delete every document matching a query.
    async fn delete_by_query(
        &self,
        index: &str,
        doc_types: &[String],
        query: &Value,
    ) -> Result<(), TransportError>;

    /// Delete one document by its engine id.
    async fn delete_document(&self, index: &str, document_id: &str)
        -> Result<(), TransportError>;

    /// Index a batch of `(document id, document body)` pairs.
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[(String, Value)],
    ) -> Result<(), TransportError>;

    /// Make all pending writes visible to searches.
    async fn refresh(&self, index: &str) -> Result<(), TransportError>;
}
