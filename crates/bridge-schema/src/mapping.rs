//! Engine mapping generation.
//!
//! Turns a resolved schema snapshot into the mapping document the engine
//! expects: one type body per entity label, each carrying the reserved
//! entity fields plus every declared field's mapping fragment.

use serde_json::{json, Map, Value};
use tracing::warn;

use bridge_types::{FieldDescriptor, ValueKind, ENTITY_ID_FIELD, ENTITY_TYPE_FIELD};

use crate::registry::SchemaSnapshot;

/// Build the full engine mapping for every registered entity type.
///
/// Keyed by entity label; values are type bodies ready for
/// `publish_schema`.
pub fn build_mapping(snapshot: &SchemaSnapshot, default_analyzer: &str) -> Value {
    let mut mapping = Map::new();

    for (entity, schema) in snapshot.iter() {
        let mut properties = Map::new();

        properties.insert(
            ENTITY_TYPE_FIELD.to_string(),
            json!({"type": "string", "index": "not_analyzed", "include_in_all": false}),
        );
        properties.insert(
            ENTITY_ID_FIELD.to_string(),
            json!({"type": "string", "index": "not_analyzed", "include_in_all": false}),
        );

        for (fieldname, field) in schema.fields() {
            properties.insert(
                fieldname.clone(),
                field_mapping(fieldname, field, default_analyzer),
            );
        }

        mapping.insert(
            entity.label(),
            json!({
                "properties": properties,
                "_boost": {"name": "boost", "null_value": 1.0},
            }),
        );
    }

    Value::Object(mapping)
}

fn base_mapping(kind: ValueKind, default_analyzer: &str) -> Map<String, Value> {
    let base = match kind {
        ValueKind::Text => json!({"type": "string", "analyzer": default_analyzer}),
        ValueKind::Ngram => json!({"type": "string", "analyzer": "ngram_analyzer"}),
        ValueKind::EdgeNgram => json!({"type": "string", "analyzer": "edgengram_analyzer"}),
        ValueKind::Integer => json!({"type": "long"}),
        ValueKind::Float => json!({"type": "double"}),
        ValueKind::Decimal => json!({"type": "string", "analyzer": default_analyzer}),
        ValueKind::Boolean => json!({"type": "boolean"}),
        ValueKind::Date | ValueKind::DateTime => json!({"type": "date"}),
        ValueKind::Location => json!({"type": "geo_point"}),
    };
    match base {
        Value::Object(obj) => obj,
        _ => Map::new(),
    }
}

fn field_mapping(fieldname: &str, field: &FieldDescriptor, default_analyzer: &str) -> Value {
    let mut obj = base_mapping(field.value_kind, default_analyzer);

    if field.boost != 1.0 {
        obj.insert("boost".to_string(), json!(field.boost));
    }

    if field.stored {
        obj.insert("store".to_string(), json!(true));
    }

    // String handling last so it can override the base analyzer setup.
    if obj.get("type").and_then(Value::as_str) == Some("string") {
        if !field.indexed || field.facet_for.is_some() || field.multivalued {
            obj.insert("index".to_string(), json!("not_analyzed"));
            obj.remove("analyzer");
            obj.remove("term_vector");
        } else if !matches!(field.value_kind, ValueKind::Ngram | ValueKind::EdgeNgram) {
            if field.analyzer.is_none() {
                warn!(field = fieldname, analyzer = default_analyzer, "Field declares no analyzer, using default");
            }
            obj.insert("index".to_string(), json!("analyzed"));
            obj.insert(
                "analyzer".to_string(),
                json!(field.analyzer.as_deref().unwrap_or(default_analyzer)),
            );
            if let Some(term_vector) = field.term_vector {
                obj.insert("term_vector".to_string(), json!(term_vector.as_str()));
            }
        }
    }

    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_schema::testing::StaticDefinition;
    use crate::registry::SchemaRegistry;
    use bridge_types::{EntityType, TermVector};
    use std::sync::Arc;

    fn snapshot_for(fields: Vec<FieldDescriptor>) -> Arc<SchemaSnapshot> {
        let mut registry = SchemaRegistry::new("text");
        registry.register(StaticDefinition::new(
            EntityType::new("blog", "Article"),
            "blog.ArticleIndex",
            fields,
        ));
        registry.snapshot().unwrap()
    }

    #[test]
    fn test_reserved_fields_present() {
        let snapshot = snapshot_for(vec![FieldDescriptor::new("text", ValueKind::Text).document()]);
        let mapping = build_mapping(&snapshot, "snowball");

        let properties = &mapping["blog.Article"]["properties"];
        assert_eq!(properties["entity_type"]["index"], "not_analyzed");
        assert_eq!(properties["entity_type"]["include_in_all"], false);
        assert_eq!(properties["entity_id"]["type"], "string");
        assert_eq!(
            mapping["blog.Article"]["_boost"],
            json!({"name": "boost", "null_value": 1.0})
        );
    }

    #[test]
    fn test_analyzed_text_field_mapping() {
        let snapshot = snapshot_for(vec![FieldDescriptor::new("text", ValueKind::Text)
            .document()
            .with_analyzer("english")
            .with_term_vector(TermVector::WithPositionsOffsets)
            .with_boost(1.5)]);
        let mapping = build_mapping(&snapshot, "snowball");

        let text = &mapping["blog.Article"]["properties"]["text"];
        assert_eq!(text["type"], "string");
        assert_eq!(text["index"], "analyzed");
        assert_eq!(text["analyzer"], "english");
        assert_eq!(text["term_vector"], "with_positions_offsets");
        assert_eq!(text["boost"], 1.5);
        assert_eq!(text["store"], true);
    }

    #[test]
    fn test_default_analyzer_applied_when_undeclared() {
        let snapshot = snapshot_for(vec![FieldDescriptor::new("text", ValueKind::Text).document()]);
        let mapping = build_mapping(&snapshot, "snowball");
        assert_eq!(
            mapping["blog.Article"]["properties"]["text"]["analyzer"],
            "snowball"
        );
    }

    #[test]
    fn test_facet_variant_is_not_analyzed() {
        let base = FieldDescriptor::new("author", ValueKind::Text).faceted();
        let facet = base.facet_variant();
        let snapshot = snapshot_for(vec![
            FieldDescriptor::new("text", ValueKind::Text).document(),
            base,
            facet,
        ]);
        let mapping = build_mapping(&snapshot, "snowball");

        let facet_mapping = &mapping["blog.Article"]["properties"]["author_exact"];
        assert_eq!(facet_mapping["index"], "not_analyzed");
        assert!(facet_mapping.get("analyzer").is_none());
    }

    #[test]
    fn test_unindexed_and_multivalued_strings_not_analyzed() {
        let snapshot = snapshot_for(vec![
            FieldDescriptor::new("text", ValueKind::Text).document(),
            FieldDescriptor::new("raw", ValueKind::Text).with_indexed(false),
            FieldDescriptor::new("tags", ValueKind::Text).multivalued(),
        ]);
        let mapping = build_mapping(&snapshot, "snowball");
        let properties = &mapping["blog.Article"]["properties"];

        assert_eq!(properties["raw"]["index"], "not_analyzed");
        assert_eq!(properties["tags"]["index"], "not_analyzed");
    }

    #[test]
    fn test_non_string_kinds() {
        let snapshot = snapshot_for(vec![
            FieldDescriptor::new("text", ValueKind::Text).document(),
            FieldDescriptor::new("views", ValueKind::Integer),
            FieldDescriptor::new("rating", ValueKind::Float),
            FieldDescriptor::new("published", ValueKind::Boolean),
            FieldDescriptor::new("pub_date", ValueKind::DateTime),
            FieldDescriptor::new("location", ValueKind::Location),
        ]);
        let mapping = build_mapping(&snapshot, "snowball");
        let properties = &mapping["blog.Article"]["properties"];

        assert_eq!(properties["views"]["type"], "long");
        assert_eq!(properties["rating"]["type"], "double");
        assert_eq!(properties["published"]["type"], "boolean");
        assert_eq!(properties["pub_date"]["type"], "date");
        assert_eq!(properties["location"]["type"], "geo_point");
    }

    #[test]
    fn test_ngram_kinds_keep_their_analyzers() {
        let snapshot = snapshot_for(vec![
            FieldDescriptor::new("text", ValueKind::Text).document(),
            FieldDescriptor::new("suggest", ValueKind::EdgeNgram),
        ]);
        let mapping = build_mapping(&snapshot, "snowball");
        assert_eq!(
            mapping["blog.Article"]["properties"]["suggest"]["analyzer"],
            "edgengram_analyzer"
        );
    }
}
