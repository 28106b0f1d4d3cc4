//! Request-to-engine query compilation.
//!
//! `compile()` folds a `SearchRequest` into the engine's nested JSON
//! search body: the main query-string node (with filter fragments
//! conjoined in), narrow/geo/model filters wrapped in a `filtered`
//! node, sort and pagination, highlighting, the suggest block, and the
//! three facet families.

use serde_json::{json, Map, Value};
use tracing::warn;

use bridge_schema::SchemaSnapshot;
use bridge_types::value::ENGINE_DATETIME_FORMAT;
use bridge_types::{
    bounding_box, DateFacetSpec, SearchConfig, SearchRequest, SortDirection, ENTITY_TYPE_FIELD,
    MATCH_ALL,
};

use crate::error::QueryError;
use crate::fragment::{build_filter_fragment, compose_query_string};

/// The reserved sort key requesting distance ordering.
const DISTANCE_SORT: &str = "distance";

/// A compiled search, ready for the transport.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    /// Engine search body
    pub body: Value,
    /// Document types the search is scoped to; empty means all
    pub doc_types: Vec<String>,
    /// The first sort criterion is a geo-distance sort, so each hit's
    /// leading sort value is its distance from the origin
    pub geo_sort: bool,
}

/// Compile a request against the current schema snapshot.
pub fn compile(
    snapshot: &SchemaSnapshot,
    config: &SearchConfig,
    request: &SearchRequest,
) -> Result<CompiledQuery, QueryError> {
    let mut fragments = Vec::with_capacity(request.filters.len());
    for clause in &request.filters {
        fragments.push(build_filter_fragment(snapshot, clause)?);
    }
    let composed = compose_query_string(&request.query, &fragments, &config.default_operator);

    let query_node = if composed.is_empty() || composed == MATCH_ALL {
        json!({ "match_all": {} })
    } else {
        json!({
            "query_string": {
                "default_field": config.document_field,
                "default_operator": config.default_operator,
                "query": composed,
                "analyze_wildcard": true,
                "auto_generate_phrase_queries": true,
            }
        })
    };

    let mut body = Map::new();
    let mut filters: Vec<Value> = Vec::new();

    // Entity-type scope. Explicit request scope wins; otherwise every
    // registered entity when configured to limit. The scope is carried
    // both as doc_types for the transport and as a terms filter so it
    // holds even when routing cannot apply it.
    let doc_types: Vec<String> = if !request.models.is_empty() {
        request.models.iter().map(|m| m.label()).collect()
    } else if config.limit_to_registered_models {
        snapshot.entity_types().iter().map(|e| e.label()).collect()
    } else {
        Vec::new()
    };
    if !doc_types.is_empty() {
        filters.push(json!({ "terms": { ENTITY_TYPE_FIELD: doc_types } }));
    }

    for narrow in &request.narrow_queries {
        filters.push(json!({
            "fquery": {
                "query": { "query_string": { "query": narrow } },
                "_cache": true,
            }
        }));
    }

    if let Some(within) = &request.within {
        let ((south, west), (north, east)) = bounding_box(within.point_1, within.point_2);
        filters.push(json!({
            "geo_bounding_box": {
                within.field.as_str(): {
                    "top_left": { "lat": north, "lon": west },
                    "bottom_right": { "lat": south, "lon": east },
                }
            }
        }));
    }

    if let Some(dwithin) = &request.dwithin {
        filters.push(json!({
            "geo_distance": {
                "distance": format!("{:.6}km", dwithin.distance.km()),
                dwithin.field.as_str(): {
                    "lat": dwithin.point.lat,
                    "lon": dwithin.point.lon,
                }
            }
        }));
    }

    let full_query = match filters.len() {
        0 => query_node,
        1 => json!({
            "filtered": {
                "query": query_node,
                "filter": filters.into_iter().next().unwrap_or(Value::Null),
            }
        }),
        _ => json!({
            "filtered": {
                "query": query_node,
                "filter": { "bool": { "must": filters } },
            }
        }),
    };
    body.insert("query".to_string(), full_query);

    let mut geo_sort = false;
    if !request.sort.is_empty() {
        let mut sort_entries = Vec::with_capacity(request.sort.len());
        for (index, (field, direction)) in request.sort.iter().enumerate() {
            if field == DISTANCE_SORT {
                let Some(origin) = &request.distance_point else {
                    warn!("Distance sort requested with no origin point; skipping");
                    continue;
                };
                if index == 0 {
                    geo_sort = true;
                }
                sort_entries.push(json!({
                    "_geo_distance": {
                        origin.field.as_str(): [origin.point.lon, origin.point.lat],
                        "order": direction.as_str(),
                        "unit": "km",
                    }
                }));
            } else {
                sort_entries.push(sort_entry(snapshot, field, *direction));
            }
        }
        if !sort_entries.is_empty() {
            body.insert("sort".to_string(), Value::Array(sort_entries));
        }
    }

    body.insert("from".to_string(), json!(request.start_offset));
    if let Some(end) = request.end_offset {
        if end > request.start_offset {
            body.insert("size".to_string(), json!(end - request.start_offset));
        }
    }

    if request.highlight {
        // Highlights come from the synthetic all-fields field, like the
        // suggest block below
        body.insert(
            "highlight".to_string(),
            json!({ "fields": { "_all": { "store": "yes" } } }),
        );
    }

    if config.include_spelling {
        let text = request.spelling_query.as_deref().unwrap_or(&request.query);
        body.insert(
            "suggest".to_string(),
            json!({
                "suggest": {
                    "text": text,
                    "term": { "field": "_all" },
                }
            }),
        );
    }

    let mut facets = Map::new();
    for spec in &request.facets {
        let mut facet = Map::new();
        facet.insert(
            "terms".to_string(),
            json!({ "field": spec.field, "size": spec.size }),
        );
        if spec.global_scope {
            facet.insert("global".to_string(), json!(true));
        }
        if let Some(filter) = &spec.facet_filter {
            facet.insert("facet_filter".to_string(), filter.clone());
        }
        facets.insert(spec.field.clone(), Value::Object(facet));
    }
    for spec in &request.date_facets {
        facets.insert(spec.field.clone(), date_facet(spec));
    }
    for spec in &request.query_facets {
        facets.insert(
            spec.field.clone(),
            json!({ "query": { "query_string": { "query": spec.query } } }),
        );
    }
    if !facets.is_empty() {
        body.insert("facets".to_string(), Value::Object(facets));
    }

    Ok(CompiledQuery {
        body: Value::Object(body),
        doc_types,
        geo_sort,
    })
}

fn sort_entry(snapshot: &SchemaSnapshot, field: &str, direction: SortDirection) -> Value {
    // Entities rarely disagree on a physical sort name; when they do,
    // the first (sorted) resolution wins.
    let resolved = snapshot
        .index_fieldnames(field)
        .into_values()
        .min()
        .unwrap_or_else(|| field.to_string());
    json!({ resolved: { "order": direction.as_str() } })
}

fn date_facet(spec: &DateFacetSpec) -> Value {
    let interval = if spec.gap_amount > 1 && spec.gap_by.supports_amount() {
        // The histogram interval grammar abbreviates the unit: "3d", "12h"
        let unit = spec
            .gap_by
            .as_str()
            .chars()
            .next()
            .unwrap_or('d')
            .to_string();
        format!("{}{}", spec.gap_amount, unit)
    } else {
        spec.gap_by.as_str().to_string()
    };

    json!({
        "date_histogram": { "field": spec.field, "interval": interval },
        "facet_filter": {
            "range": {
                spec.field.as_str(): {
                    "from": spec.start.format(ENGINE_DATETIME_FORMAT).to_string(),
                    "to": spec.end.format(ENGINE_DATETIME_FORMAT).to_string(),
                }
            }
        }
    })
}
