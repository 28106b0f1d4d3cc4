//! Global analyzer-consistency check.
//!
//! One physical field can be declared by many schemas sharing one
//! physical index, so analyzer agreement is checked across *all* sources,
//! not per entity.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entity_schema::IndexDefinition;
use crate::error::SchemaError;

/// Verify that every declaration of a physical field uses the same
/// analyzer.
///
/// Only explicitly declared analyzers participate: a field without one
/// falls back to the configured default at mapping time and never
/// conflicts.
pub fn check_analyzers(sources: &[Arc<dyn IndexDefinition>]) -> Result<(), SchemaError> {
    let mut seen: HashMap<String, (String, String)> = HashMap::new();

    for source in sources {
        for field in source.fields() {
            let Some(analyzer) = field.analyzer else {
                continue;
            };

            match seen.get(&field.index_fieldname) {
                Some((existing, first_source)) if *existing != analyzer => {
                    return Err(SchemaError::Conflict(format!(
                        "all uses of the '{}' field need to use the same analyzer \
                         ('{}' in '{}' vs '{}' in '{}')",
                        field.index_fieldname,
                        existing,
                        first_source,
                        analyzer,
                        source.name()
                    )));
                }
                Some(_) => {}
                None => {
                    seen.insert(
                        field.index_fieldname.clone(),
                        (analyzer, source.name().to_string()),
                    );
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_schema::testing::StaticDefinition;
    use bridge_types::{EntityType, FieldDescriptor, ValueKind};

    fn source_with_analyzer(
        name: &str,
        type_name: &str,
        analyzer: &str,
    ) -> Arc<dyn IndexDefinition> {
        StaticDefinition::new(
            EntityType::new("blog", type_name),
            name,
            vec![FieldDescriptor::new("text", ValueKind::Text)
                .document()
                .with_analyzer(analyzer)],
        )
    }

    #[test]
    fn test_same_analyzer_passes() {
        let sources = vec![
            source_with_analyzer("blog.ArticleIndex", "Article", "snowball"),
            source_with_analyzer("blog.CommentIndex", "Comment", "snowball"),
        ];
        assert!(check_analyzers(&sources).is_ok());
    }

    #[test]
    fn test_conflicting_analyzers_fail_naming_the_field() {
        let sources = vec![
            source_with_analyzer("blog.ArticleIndex", "Article", "snowball"),
            source_with_analyzer("blog.CommentIndex", "Comment", "english"),
        ];
        let err = check_analyzers(&sources).unwrap_err();
        assert!(matches!(err, SchemaError::Conflict(_)));
        let message = err.to_string();
        assert!(message.contains("text"));
        assert!(message.contains("snowball"));
        assert!(message.contains("english"));
    }

    #[test]
    fn test_undeclared_analyzer_never_conflicts() {
        let sources = vec![
            source_with_analyzer("blog.ArticleIndex", "Article", "snowball"),
            StaticDefinition::new(
                EntityType::new("blog", "Comment"),
                "blog.CommentIndex",
                vec![FieldDescriptor::new("text", ValueKind::Text).document()],
            ) as Arc<dyn IndexDefinition>,
        ];
        assert!(check_analyzers(&sources).is_ok());
    }
}
