//! # bridge-backend
//!
//! The engine-facing facade for search-bridge.
//!
//! `SearchBackend` owns the full lifecycle: provisioning the container
//! and unified schema on first use, compiling and running searches,
//! bulk-indexing prepared documents, and removing or clearing indexed
//! data. The engine itself sits behind the async `SearchTransport`
//! trait, so the facade is testable without a running engine.

pub mod backend;
pub mod document;
pub mod error;
pub mod logging;
pub mod transport;

pub use backend::SearchBackend;
pub use document::PreparedDocument;
pub use error::{BackendError, TransportError};
pub use logging::init_logging;
pub use transport::SearchTransport;
