//! Documents prepared for indexing.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use bridge_query::to_engine;
use bridge_types::{FieldValue, Identifier, ENTITY_ID_FIELD, ENTITY_TYPE_FIELD, ID_FIELD};

/// One entity's field values, ready to be written to the engine.
///
/// The host application extracts and prepares field values itself (it
/// owns the entities); the backend only converts and ships them.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub identifier: Identifier,
    pub fields: HashMap<String, FieldValue>,
}

impl PreparedDocument {
    pub fn new(identifier: Identifier, fields: HashMap<String, FieldValue>) -> Self {
        Self { identifier, fields }
    }

    /// Engine form: `(document id, body)`. The body carries every field
    /// in engine representation plus the reserved identity fields.
    pub fn to_engine(&self) -> (String, Value) {
        let id = self.identifier.to_string();

        let mut body = Map::new();
        for (name, value) in &self.fields {
            body.insert(name.clone(), to_engine(value));
        }
        body.insert(
            ENTITY_TYPE_FIELD.to_string(),
            json!(self.identifier.entity_type.label()),
        );
        body.insert(ENTITY_ID_FIELD.to_string(), json!(self.identifier.pk));
        body.insert(ID_FIELD.to_string(), json!(id));

        (id, Value::Object(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_types::EntityType;

    #[test]
    fn test_to_engine_adds_identity_fields() {
        let mut fields = HashMap::new();
        fields.insert("text".to_string(), FieldValue::Text("an article".into()));
        fields.insert("views".to_string(), FieldValue::Integer(42));

        let doc = PreparedDocument::new(
            Identifier::new(EntityType::new("blog", "Article"), "7"),
            fields,
        );
        let (id, body) = doc.to_engine();

        assert_eq!(id, "blog.Article.7");
        assert_eq!(body["entity_type"], "blog.Article");
        assert_eq!(body["entity_id"], "7");
        assert_eq!(body["id"], "blog.Article.7");
        assert_eq!(body["text"], "an article");
        assert_eq!(body["views"], 42);
    }
}
