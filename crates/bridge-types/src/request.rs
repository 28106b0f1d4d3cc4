//! Structured search requests.
//!
//! A `SearchRequest` is everything the query compiler needs: the query
//! string, typed filter clauses, sort/pagination, facet specs, geo
//! constraints, and display options. Constructed per search through the
//! builder methods and never mutated during compilation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityType;
use crate::geo::{Distance, Point};

/// Comparison operator of a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Contains,
    StartsWith,
    Exact,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Range,
}

/// A typed filter value.
///
/// `Text` is cleaned (reserved engine characters escaped) before use;
/// `Exact` is quoted verbatim as a phrase; `Raw` bypasses all processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    Text(String),
    Exact(String),
    Raw(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    List(Vec<FilterValue>),
}

impl FilterValue {
    pub fn text(s: impl Into<String>) -> Self {
        FilterValue::Text(s.into())
    }

    pub fn exact(s: impl Into<String>) -> Self {
        FilterValue::Exact(s.into())
    }
}

/// One `(field, operator, value)` filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    /// Logical field name; the reserved name "content" means "no
    /// specific field" and searches the document body
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Term-facet request over one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetSpec {
    pub field: String,
    /// Bucket count, capped at 100
    pub size: u32,
    /// Compute the facet over the whole index instead of the query scope
    pub global_scope: bool,
    /// Facet-level filter passed through verbatim
    pub facet_filter: Option<Value>,
}

impl FacetSpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            size: 100,
            global_scope: false,
            facet_filter: None,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.min(100);
        self
    }

    pub fn global_scope(mut self) -> Self {
        self.global_scope = true;
        self
    }

    pub fn with_facet_filter(mut self, filter: Value) -> Self {
        self.facet_filter = Some(filter);
        self
    }
}

/// Gap unit for date-histogram facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateGap {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl DateGap {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateGap::Hour => "hour",
            DateGap::Day => "day",
            DateGap::Week => "week",
            DateGap::Month => "month",
            DateGap::Year => "year",
        }
    }

    /// Months and years do not support sub-multiples in the engine's
    /// histogram interval grammar.
    pub fn supports_amount(&self) -> bool {
        !matches!(self, DateGap::Month | DateGap::Year)
    }
}

/// Date-histogram facet over one field, scoped to `[start, end]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateFacetSpec {
    pub field: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub gap_by: DateGap,
    pub gap_amount: u32,
}

impl DateFacetSpec {
    pub fn new(
        field: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        gap_by: DateGap,
    ) -> Self {
        Self {
            field: field.into(),
            start,
            end,
            gap_by,
            gap_amount: 1,
        }
    }

    pub fn with_gap_amount(mut self, amount: u32) -> Self {
        self.gap_amount = amount;
        self
    }
}

/// Facet counting the matches of a verbatim query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFacetSpec {
    pub field: String,
    pub query: String,
}

impl QueryFacetSpec {
    pub fn new(field: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
        }
    }
}

/// Bounding-box constraint from two corner points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoWithin {
    pub field: String,
    pub point_1: Point,
    pub point_2: Point,
}

/// Radius constraint around a center point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoNear {
    pub field: String,
    pub point: Point,
    pub distance: Distance,
}

/// Origin point for distance sorting and distance reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistancePoint {
    pub field: String,
    pub point: Point,
}

/// A backend-agnostic search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub filters: Vec<FilterClause>,
    pub sort: Vec<(String, SortDirection)>,
    pub start_offset: u64,
    pub end_offset: Option<u64>,
    pub facets: Vec<FacetSpec>,
    pub date_facets: Vec<DateFacetSpec>,
    pub query_facets: Vec<QueryFacetSpec>,
    /// Caller-supplied raw query strings applied as cached filters
    pub narrow_queries: Vec<String>,
    pub spelling_query: Option<String>,
    pub within: Option<GeoWithin>,
    pub dwithin: Option<GeoNear>,
    pub distance_point: Option<DistancePoint>,
    /// Explicit entity-type scope; empty means "use the registry default"
    pub models: Vec<EntityType>,
    pub highlight: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, clause: FilterClause) -> Self {
        self.filters.push(clause);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push((field.into(), direction));
        self
    }

    pub fn offsets(mut self, start: u64, end: Option<u64>) -> Self {
        self.start_offset = start;
        self.end_offset = end;
        self
    }

    pub fn facet(mut self, spec: FacetSpec) -> Self {
        self.facets.push(spec);
        self
    }

    pub fn date_facet(mut self, spec: DateFacetSpec) -> Self {
        self.date_facets.push(spec);
        self
    }

    pub fn query_facet(mut self, spec: QueryFacetSpec) -> Self {
        self.query_facets.push(spec);
        self
    }

    pub fn narrow(mut self, query: impl Into<String>) -> Self {
        self.narrow_queries.push(query.into());
        self
    }

    pub fn with_spelling_query(mut self, query: impl Into<String>) -> Self {
        self.spelling_query = Some(query.into());
        self
    }

    pub fn within(mut self, within: GeoWithin) -> Self {
        self.within = Some(within);
        self
    }

    pub fn dwithin(mut self, dwithin: GeoNear) -> Self {
        self.dwithin = Some(dwithin);
        self
    }

    pub fn with_distance_point(mut self, point: DistancePoint) -> Self {
        self.distance_point = Some(point);
        self
    }

    pub fn scope_to(mut self, models: Vec<EntityType>) -> Self {
        self.models = models;
        self
    }

    pub fn with_highlight(mut self) -> Self {
        self.highlight = true;
        self
    }
}
