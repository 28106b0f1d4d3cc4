//! Response materialization.
//!
//! Walks a raw engine response and rebuilds a typed `ResultPage`. Hits
//! whose backing entity type is stale (unregistered, or rejected by the
//! resolver) are dropped and discounted from the reported total; a hit
//! with no `_source` at all is a structural failure and fails the page.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use bridge_schema::SchemaSnapshot;
use bridge_types::{
    Distance, EntityResolver, EntityType, Facets, FieldValue, ResultItem, ResultPage,
    ENTITY_ID_FIELD, ENTITY_TYPE_FIELD,
};
use chrono::{DateTime, Utc};

use crate::convert::{convert_for_field, from_engine};
use crate::error::QueryError;

/// Per-search context the compiler hands forward to materialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializeOptions {
    /// The leading sort value of every hit is a distance in kilometers
    pub geo_sort: bool,
}

/// Rebuild a typed results page from a raw engine response.
pub fn materialize(
    snapshot: &SchemaSnapshot,
    resolver: &dyn EntityResolver,
    raw: &Value,
    options: MaterializeOptions,
) -> Result<ResultPage, QueryError> {
    let mut total_hits = raw["hits"]["total"].as_u64().unwrap_or(0);

    let spelling_suggestion = raw.get("suggest").map(spelling_suggestion);

    let facets = raw
        .get("facets")
        .and_then(Value::as_object)
        .map(collect_facets)
        .unwrap_or_default();

    let mut results = Vec::new();
    let empty = Vec::new();
    let hits = raw["hits"]["hits"].as_array().unwrap_or(&empty);

    for hit in hits {
        let source = hit.get("_source").and_then(Value::as_object).ok_or_else(|| {
            QueryError::MalformedResponse("hit with no '_source' document".into())
        })?;

        let Some(item) = materialize_hit(snapshot, resolver, hit, source, options) else {
            // Stale hit: the entity type no longer resolves. The document
            // outlived its type, so drop it and adjust the total.
            total_hits = total_hits.saturating_sub(1);
            continue;
        };
        results.push(item);
    }

    Ok(ResultPage {
        results,
        total_hits,
        facets,
        spelling_suggestion,
    })
}

fn materialize_hit(
    snapshot: &SchemaSnapshot,
    resolver: &dyn EntityResolver,
    hit: &Value,
    source: &serde_json::Map<String, Value>,
    options: MaterializeOptions,
) -> Option<ResultItem> {
    let label = source.get(ENTITY_TYPE_FIELD)?.as_str()?;
    let parsed = EntityType::parse(label)?;
    let entity_type = resolver.resolve(&parsed.app_label, &parsed.name)?;

    let schema = match snapshot.index(&entity_type) {
        Ok(schema) => schema,
        Err(_) => {
            debug!(entity = %label, "Dropping hit for unregistered entity type");
            return None;
        }
    };

    let pk = match source.get(ENTITY_ID_FIELD)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let mut fields: HashMap<String, FieldValue> = HashMap::new();
    for (key, value) in source {
        if key == ENTITY_TYPE_FIELD || key == ENTITY_ID_FIELD {
            continue;
        }
        let converted = match schema.fields().get(key) {
            Some(descriptor) => convert_for_field(descriptor.value_kind, value),
            None => from_engine(value),
        };
        fields.insert(key.clone(), converted);
    }

    let distance = if options.geo_sort {
        hit["sort"][0].as_f64().map(Distance::from_km)
    } else {
        None
    };

    Some(ResultItem {
        entity_type,
        pk,
        score: hit["_score"].as_f64().unwrap_or(0.0) as f32,
        fields,
        highlighted: hit.get("highlight").cloned(),
        distance,
    })
}

/// Join each suggested token back into a corrected query, keeping the
/// original token wherever the engine offered no alternative.
fn spelling_suggestion(suggest: &Value) -> String {
    let mut words = Vec::new();

    if let Some(tokens) = suggest["suggest"].as_array() {
        for token in tokens {
            let original = token["text"].as_str().unwrap_or_default();
            let best = token["options"][0]["text"].as_str().unwrap_or(original);
            words.push(best.to_string());
        }
    }

    words.join(" ")
}

fn collect_facets(raw: &serde_json::Map<String, Value>) -> Facets {
    let mut facets = Facets::default();

    for (name, facet) in raw {
        // An absent _type means a plain terms facet
        match facet.get("_type").and_then(Value::as_str).unwrap_or("terms") {
            "terms" => {
                let buckets = facet["terms"]
                    .as_array()
                    .map(|terms| {
                        terms
                            .iter()
                            .filter_map(|t| {
                                Some((
                                    t["term"].as_str()?.to_string(),
                                    t["count"].as_u64().unwrap_or(0),
                                ))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                facets.fields.insert(name.clone(), buckets);
            }
            "date_histogram" => {
                let buckets = facet["entries"]
                    .as_array()
                    .map(|entries| {
                        entries
                            .iter()
                            .filter_map(|e| {
                                // Bucket timestamps arrive in epoch millis
                                let millis = e["time"].as_i64()?;
                                let start = DateTime::<Utc>::from_timestamp(millis / 1000, 0)?;
                                Some((start, e["count"].as_u64().unwrap_or(0)))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                facets.dates.insert(name.clone(), buckets);
            }
            "query" => {
                facets
                    .queries
                    .insert(name.clone(), facet["count"].as_u64().unwrap_or(0));
            }
            other => {
                debug!(facet = %name, facet_type = other, "Ignoring unrecognized facet type");
            }
        }
    }

    facets
}
