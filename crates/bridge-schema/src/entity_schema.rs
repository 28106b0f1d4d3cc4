//! Per-entity schema builder.
//!
//! Merges every field declared for one entity type into a single resolved
//! field set. Multiple declarations of one physical field are unioned:
//! boolean capability flags are monotonic (true wins), and a multivalued
//! declaration replaces the stored representative.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bridge_types::{EntityType, FieldDescriptor};

use crate::error::SchemaError;

/// A source of field declarations for one entity type.
///
/// This is the explicit-registration replacement for discovering index
/// classes by reflection: each indexable entity type supplies an
/// enumerable list of descriptors at start-up, in declaration order.
pub trait IndexDefinition: Send + Sync {
    /// The entity type this definition indexes.
    fn entity_type(&self) -> EntityType;

    /// Qualified name, used in the exclusion list and in diagnostics
    /// (e.g. "blog.search_indexes.ArticleIndex").
    fn name(&self) -> &str;

    /// Declared fields, in declaration order.
    fn fields(&self) -> Vec<FieldDescriptor>;
}

/// The resolved field set for one entity type.
pub struct EntitySchema {
    source: Arc<dyn IndexDefinition>,
    document_field: String,
    built: bool,
    fields: BTreeMap<String, FieldDescriptor>,
    fieldnames: HashMap<String, String>,
    facet_fieldnames: HashMap<String, String>,
}

impl EntitySchema {
    pub fn new(source: Arc<dyn IndexDefinition>, document_field: impl Into<String>) -> Self {
        Self {
            source,
            document_field: document_field.into(),
            built: false,
            fields: BTreeMap::new(),
            fieldnames: HashMap::new(),
            facet_fieldnames: HashMap::new(),
        }
    }

    /// Drop all resolved state.
    pub fn reset(&mut self) {
        self.fields = BTreeMap::new();
        self.fieldnames = HashMap::new();
        self.facet_fieldnames = HashMap::new();
        self.built = false;
    }

    /// Full re-merge of the source's declarations.
    pub fn build(&mut self) -> Result<(), SchemaError> {
        self.reset();
        self.collect_fields()?;
        self.built = true;
        Ok(())
    }

    fn collect_fields(&mut self) -> Result<(), SchemaError> {
        for field in self.source.fields() {
            if field.document && field.index_fieldname != self.document_field {
                return Err(SchemaError::Conflict(format!(
                    "all index definitions must use the same '{}' fieldname for \
                     their document field; offending definition is '{}'",
                    self.document_field,
                    self.source.name()
                )));
            }

            // Stow the physical name so query-time lookups are cheap.
            if let Some(existing) = self.fieldnames.get(&field.logical_name) {
                if *existing != field.index_fieldname {
                    return Err(SchemaError::Conflict(format!(
                        "all uses of the '{}' field need to use the same \
                         'index_fieldname' ('{}' vs '{}', in '{}')",
                        field.logical_name,
                        existing,
                        field.index_fieldname,
                        self.source.name()
                    )));
                }
            }
            self.fieldnames
                .insert(field.logical_name.clone(), field.index_fieldname.clone());

            if let Some(base) = &field.facet_for {
                let key = if base.is_empty() {
                    field.logical_name.clone()
                } else {
                    base.clone()
                };
                self.facet_fieldnames.insert(key, field.logical_name.clone());
            }

            match self.fields.get_mut(&field.index_fieldname) {
                None => {
                    self.fields
                        .insert(field.index_fieldname.clone(), field.clone());
                }
                Some(existing) => {
                    // A multivalued declaration becomes the representative;
                    // either way the displaced declaration's flags are
                    // unioned in so the result is a superset of all
                    // schema-affecting options.
                    let other = if field.multivalued {
                        std::mem::replace(existing, field.clone())
                    } else {
                        field.clone()
                    };

                    existing.indexed |= other.indexed;
                    existing.stored |= other.stored;
                    existing.faceted |= other.faceted;
                    existing.use_template |= other.use_template;
                    existing.null_allowed |= other.null_allowed;
                }
            }
        }

        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn entity_type(&self) -> EntityType {
        self.source.entity_type()
    }

    /// Qualified name of the backing index definition.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Resolved fields, keyed by physical name.
    pub fn fields(&self) -> &BTreeMap<String, FieldDescriptor> {
        &self.fields
    }

    /// Resolve a logical name to its physical name.
    ///
    /// Unresolved names are returned unchanged: they are assumed to
    /// already be physical names, never an error.
    pub fn index_fieldname<'a>(&'a self, logical: &'a str) -> &'a str {
        self.fieldnames
            .get(logical)
            .map(String::as_str)
            .unwrap_or(logical)
    }

    /// Resolve a logical name to the logical name of its facet variant,
    /// falling back to the input unchanged.
    pub fn facet_fieldname<'a>(&'a self, logical: &'a str) -> &'a str {
        self.facet_fieldnames
            .get(logical)
            .map(String::as_str)
            .unwrap_or(logical)
    }

    /// The entity's document/content field, if one was declared.
    pub fn content_field(&self) -> Option<&FieldDescriptor> {
        self.fields.values().find(|f| f.document)
    }
}

impl std::fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySchema")
            .field("source", &self.source.name())
            .field("built", &self.built)
            .field("fields", &self.fields.keys())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticDefinition;
    use super::*;
    use bridge_types::ValueKind;

    fn article_definition(fields: Vec<FieldDescriptor>) -> Arc<StaticDefinition> {
        StaticDefinition::new(
            EntityType::new("blog", "Article"),
            "blog.search_indexes.ArticleIndex",
            fields,
        )
    }

    #[test]
    fn test_build_resolves_names() {
        let definition = article_definition(vec![
            FieldDescriptor::new("text", ValueKind::Text).document(),
            FieldDescriptor::new("author", ValueKind::Text).with_index_fieldname("author_name"),
        ]);
        let mut schema = EntitySchema::new(definition, "text");
        schema.build().unwrap();

        assert!(schema.is_built());
        assert_eq!(schema.index_fieldname("author"), "author_name");
        assert_eq!(schema.index_fieldname("text"), "text");
        // Unresolved names pass through unchanged
        assert_eq!(schema.index_fieldname("unknown"), "unknown");
    }

    #[test]
    fn test_document_field_name_mismatch_fails() {
        let definition = article_definition(vec![FieldDescriptor::new("body", ValueKind::Text)
            .document()
            .with_index_fieldname("body")]);
        let mut schema = EntitySchema::new(definition, "text");

        let err = schema.build().unwrap_err();
        assert!(matches!(err, SchemaError::Conflict(_)));
        assert!(err.to_string().contains("ArticleIndex"));
    }

    #[test]
    fn test_logical_name_with_two_physical_names_fails() {
        let definition = article_definition(vec![
            FieldDescriptor::new("author", ValueKind::Text).with_index_fieldname("author_a"),
            FieldDescriptor::new("author", ValueKind::Text).with_index_fieldname("author_b"),
        ]);
        let mut schema = EntitySchema::new(definition, "text");

        let err = schema.build().unwrap_err();
        assert!(matches!(err, SchemaError::Conflict(_)));
        assert!(err.to_string().contains("author"));
    }

    #[test]
    fn test_flag_union_is_monotonic() {
        let definition = article_definition(vec![
            FieldDescriptor::new("count", ValueKind::Integer)
                .with_index_fieldname("count")
                .with_indexed(false)
                .with_stored(false),
            FieldDescriptor::new("count_2", ValueKind::Integer)
                .with_index_fieldname("count")
                .with_stored(true)
                .with_null_allowed(true)
                .faceted(),
        ]);
        let mut schema = EntitySchema::new(definition, "text");
        schema.build().unwrap();

        let merged = &schema.fields()["count"];
        assert!(merged.indexed);
        assert!(merged.stored);
        assert!(merged.faceted);
        assert!(merged.null_allowed);
    }

    #[test]
    fn test_merge_is_order_insensitive() {
        let a = FieldDescriptor::new("count", ValueKind::Integer)
            .with_index_fieldname("count")
            .with_indexed(false)
            .with_use_template(true);
        let b = FieldDescriptor::new("count_2", ValueKind::Integer)
            .with_index_fieldname("count")
            .with_stored(false)
            .faceted();

        let mut forward = EntitySchema::new(
            article_definition(vec![a.clone(), b.clone()]),
            "text",
        );
        forward.build().unwrap();
        let mut backward = EntitySchema::new(article_definition(vec![b, a]), "text");
        backward.build().unwrap();

        let f = &forward.fields()["count"];
        let g = &backward.fields()["count"];
        assert_eq!(f.indexed, g.indexed);
        assert_eq!(f.stored, g.stored);
        assert_eq!(f.faceted, g.faceted);
        assert_eq!(f.use_template, g.use_template);
        assert_eq!(
            forward.fields().keys().collect::<Vec<_>>(),
            backward.fields().keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_multivalued_declaration_becomes_representative() {
        let definition = article_definition(vec![
            FieldDescriptor::new("tags", ValueKind::Text)
                .with_index_fieldname("tags")
                .faceted(),
            FieldDescriptor::new("tags_2", ValueKind::Text)
                .with_index_fieldname("tags")
                .multivalued(),
        ]);
        let mut schema = EntitySchema::new(definition, "text");
        schema.build().unwrap();

        let merged = &schema.fields()["tags"];
        assert!(merged.multivalued);
        // Flags from the displaced declaration survive the swap
        assert!(merged.faceted);
    }

    #[test]
    fn test_facet_fieldname_mapping() {
        let base = FieldDescriptor::new("author", ValueKind::Text).faceted();
        let facet = base.facet_variant();
        let definition = article_definition(vec![base, facet]);
        let mut schema = EntitySchema::new(definition, "text");
        schema.build().unwrap();

        assert_eq!(schema.facet_fieldname("author"), "author_exact");
        assert_eq!(schema.facet_fieldname("title"), "title");
    }

    #[test]
    fn test_reset_then_rebuild_is_idempotent() {
        let definition = article_definition(vec![
            FieldDescriptor::new("text", ValueKind::Text).document(),
            FieldDescriptor::new("author", ValueKind::Text),
        ]);
        let mut schema = EntitySchema::new(definition, "text");
        schema.build().unwrap();
        let first: Vec<String> = schema.fields().keys().cloned().collect();

        schema.reset();
        assert!(!schema.is_built());
        assert!(schema.fields().is_empty());

        schema.build().unwrap();
        let second: Vec<String> = schema.fields().keys().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_content_field() {
        let definition = article_definition(vec![
            FieldDescriptor::new("text", ValueKind::Text).document(),
            FieldDescriptor::new("author", ValueKind::Text),
        ]);
        let mut schema = EntitySchema::new(definition, "text");
        schema.build().unwrap();

        assert_eq!(schema.content_field().unwrap().index_fieldname, "text");
    }
}
