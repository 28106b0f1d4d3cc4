//! Entity-type labels and document identifiers.
//!
//! An entity type is an application-level data category ("blog.Article").
//! Documents in the engine carry the label plus the primary key; the
//! combination is the document identifier ("blog.Article.42").

use serde::{Deserialize, Serialize};
use std::fmt;

/// An indexable application entity type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityType {
    /// Application module the type belongs to (e.g. "blog")
    pub app_label: String,
    /// Type name within the module (e.g. "Article")
    pub name: String,
}

impl EntityType {
    pub fn new(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            name: name.into(),
        }
    }

    /// Canonical label used as the engine doc-type string.
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.name)
    }

    /// Parse a label of the form "app.Name", returning None otherwise.
    pub fn parse(label: &str) -> Option<Self> {
        let (app_label, name) = label.split_once('.')?;
        if app_label.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(app_label, name))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.name)
    }
}

/// A fully qualified document identifier: entity type plus primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub entity_type: EntityType,
    pub pk: String,
}

impl Identifier {
    pub fn new(entity_type: EntityType, pk: impl Into<String>) -> Self {
        Self {
            entity_type,
            pk: pk.into(),
        }
    }

    /// Parse "app.Name.pk". The primary key is the final segment; the
    /// entity label is everything before it.
    pub fn parse(s: &str) -> Option<Self> {
        let (label, pk) = s.rsplit_once('.')?;
        let entity_type = EntityType::parse(label)?;
        if pk.is_empty() {
            return None;
        }
        Some(Self::new(entity_type, pk))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity_type, self.pk)
    }
}

/// Resolves raw entity-type labels coming back from the engine to the
/// host application's registered entity types.
///
/// Returning `None` marks the hit as stale (deleted type, renamed module)
/// and the materializer discounts it rather than failing the page.
pub trait EntityResolver: Send + Sync {
    fn resolve(&self, app_label: &str, name: &str) -> Option<EntityType>;
}
