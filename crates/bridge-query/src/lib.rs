//! # bridge-query
//!
//! Query compilation and result materialization for search-bridge.
//!
//! `compile()` translates a backend-agnostic `SearchRequest` into the
//! engine's native nested query/filter document; `materialize()` walks a
//! raw engine response and reconstructs a typed `ResultPage`, discounting
//! hits whose backing entity can no longer be resolved. Both are pure
//! transformations over an immutable schema snapshot.

pub mod compiler;
pub mod convert;
pub mod error;
pub mod fragment;
pub mod results;

pub use compiler::{compile, CompiledQuery};
pub use convert::{convert_for_field, from_engine, to_engine};
pub use error::QueryError;
pub use fragment::{build_filter_fragment, compose_query_string, sanitize};
pub use results::{materialize, MaterializeOptions};
