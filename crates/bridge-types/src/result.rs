//! Materialized search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::entity::EntityType;
use crate::geo::Distance;
use crate::value::FieldValue;

/// One scored hit, reconstructed into native values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub entity_type: EntityType,
    pub pk: String,
    pub score: f32,
    /// Stored fields converted back to native values
    pub fields: HashMap<String, FieldValue>,
    /// Highlight fragments, verbatim from the engine
    pub highlighted: Option<Value>,
    /// Distance from the sort origin when geo-sorting was requested
    pub distance: Option<Distance>,
}

/// Reconstructed facet tallies, one bucket list per requested facet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Facets {
    /// Term facets: field -> [(term, count)]
    pub fields: HashMap<String, Vec<(String, u64)>>,
    /// Date-histogram facets: field -> [(bucket start, count)]
    pub dates: HashMap<String, Vec<(DateTime<Utc>, u64)>>,
    /// Query facets: field -> count
    pub queries: HashMap<String, u64>,
}

impl Facets {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.dates.is_empty() && self.queries.is_empty()
    }
}

/// A full results page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultPage {
    pub results: Vec<ResultItem>,
    /// Engine-reported total, discounted by hits that could not be
    /// materialized
    pub total_hits: u64,
    pub facets: Facets,
    pub spelling_suggestion: Option<String>,
}

impl ResultPage {
    /// The empty, zero-hit page.
    pub fn empty() -> Self {
        Self::default()
    }
}
