//! Field descriptors.
//!
//! One concrete descriptor type with orthogonal capability flags replaces
//! the original per-kind class hierarchy. A "facet variant of field X" is
//! a derived descriptor referencing its base through `facet_for`, not a
//! separate type.

use serde::{Deserialize, Serialize};

/// The kind of value a field holds, which determines its engine mapping
/// and its engine-to-native conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Ngram,
    EdgeNgram,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Location,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Text => "text",
            ValueKind::Ngram => "ngram",
            ValueKind::EdgeNgram => "edge_ngram",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::Location => "location",
        }
    }

    /// Whether the engine stores this kind as an analyzable string.
    pub fn is_string_kind(&self) -> bool {
        matches!(
            self,
            ValueKind::Text | ValueKind::Ngram | ValueKind::EdgeNgram | ValueKind::Decimal
        )
    }
}

/// Term-vector options for analyzed string fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermVector {
    Yes,
    WithPositions,
    WithOffsets,
    WithPositionsOffsets,
}

impl TermVector {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermVector::Yes => "yes",
            TermVector::WithPositions => "with_positions",
            TermVector::WithOffsets => "with_offsets",
            TermVector::WithPositionsOffsets => "with_positions_offsets",
        }
    }
}

/// Declarative description of one attribute of an indexed entity.
///
/// Immutable once constructed; the schema builder clones descriptors
/// instead of mutating the caller's declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Application-facing name used in queries and declarations
    pub logical_name: String,
    /// Name used inside the engine's stored document
    pub index_fieldname: String,
    pub value_kind: ValueKind,
    /// Whether this is *the* document/content field of the entity
    pub document: bool,
    /// Analyzed/searchable
    pub indexed: bool,
    pub stored: bool,
    pub faceted: bool,
    pub multivalued: bool,
    /// Content is rendered from a template rather than a single attribute
    pub use_template: bool,
    pub null_allowed: bool,
    pub boost: f32,
    /// Analyzer for string kinds; None means the configured default
    pub analyzer: Option<String>,
    pub term_vector: Option<TermVector>,
    /// Logical name of the base field this descriptor is a facet variant of
    pub facet_for: Option<String>,
}

impl FieldDescriptor {
    /// Create a descriptor with the given logical name and kind.
    ///
    /// The index fieldname defaults to the logical name; flags default to
    /// indexed + stored, everything else off.
    pub fn new(logical_name: impl Into<String>, value_kind: ValueKind) -> Self {
        let logical_name = logical_name.into();
        Self {
            index_fieldname: logical_name.clone(),
            logical_name,
            value_kind,
            document: false,
            indexed: true,
            stored: true,
            faceted: false,
            multivalued: false,
            use_template: false,
            null_allowed: false,
            boost: 1.0,
            analyzer: None,
            term_vector: None,
            facet_for: None,
        }
    }

    pub fn with_index_fieldname(mut self, name: impl Into<String>) -> Self {
        self.index_fieldname = name.into();
        self
    }

    pub fn document(mut self) -> Self {
        self.document = true;
        self
    }

    pub fn with_indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    pub fn with_stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    pub fn faceted(mut self) -> Self {
        self.faceted = true;
        self
    }

    pub fn multivalued(mut self) -> Self {
        self.multivalued = true;
        self
    }

    pub fn with_use_template(mut self, use_template: bool) -> Self {
        self.use_template = use_template;
        self
    }

    pub fn with_null_allowed(mut self, null_allowed: bool) -> Self {
        self.null_allowed = null_allowed;
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn with_term_vector(mut self, term_vector: TermVector) -> Self {
        self.term_vector = Some(term_vector);
        self
    }

    /// Derive the facet variant of this descriptor.
    ///
    /// The variant keeps the base kind but is stored unanalyzed under
    /// `<name>_exact`, referencing its base by logical name.
    pub fn facet_variant(&self) -> Self {
        let facet_name = format!("{}_exact", self.logical_name);
        Self {
            logical_name: facet_name.clone(),
            index_fieldname: facet_name,
            value_kind: self.value_kind,
            document: false,
            indexed: true,
            stored: self.stored,
            faceted: true,
            multivalued: self.multivalued,
            use_template: false,
            null_allowed: self.null_allowed,
            boost: 1.0,
            analyzer: None,
            term_vector: None,
            facet_for: Some(self.logical_name.clone()),
        }
    }
}
