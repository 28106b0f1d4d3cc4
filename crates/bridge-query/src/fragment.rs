//! Filter-clause grammar.
//!
//! Translates one typed `(field, operator, value)` clause into an engine
//! query-string fragment: operator templates (`[a TO b]`, `{a TO *}`,
//! `term*`), reserved-character escaping, term splitting with phrase
//! quoting, and an OR-join across every entity's physical resolution of
//! the logical field name.

use std::collections::BTreeSet;

use bridge_schema::SchemaSnapshot;
use bridge_types::value::ENGINE_DATETIME_FORMAT;
use bridge_types::{FilterClause, FilterOperator, FilterValue, MATCH_ALL};

use crate::error::QueryError;

/// The reserved logical name meaning "no specific field": the clause
/// applies to the document body and gets no field prefix.
pub const CONTENT_FIELD: &str = "content";

/// Characters the engine's query-string parser treats specially.
/// Backslash must be escaped first.
const RESERVED_CHARACTERS: [&str; 19] = [
    "\\", "+", "-", "&&", "||", "!", "(", ")", "{", "}", "[", "]", "^", "\"", "~", "*", "?", ":",
    "/",
];

/// Operator words the parser would interpret; lowercased to neutralize.
const RESERVED_WORDS: [&str; 4] = ["AND", "NOT", "OR", "TO"];

/// Escape reserved characters and neutralize reserved operator words in
/// user-supplied text.
pub fn sanitize(input: &str) -> String {
    let mut cleaned_words = Vec::new();

    for word in input.split_whitespace() {
        let mut word = if RESERVED_WORDS.contains(&word) {
            word.to_lowercase()
        } else {
            word.to_string()
        };
        for reserved in RESERVED_CHARACTERS {
            word = word.replace(reserved, &format!("\\{}", reserved));
        }
        cleaned_words.push(word);
    }

    cleaned_words.join(" ")
}

/// Engine-side string form of a scalar filter value.
fn scalar_string(value: &FilterValue) -> Result<String, QueryError> {
    match value {
        FilterValue::Text(s) => Ok(sanitize(s)),
        FilterValue::Exact(s) | FilterValue::Raw(s) => Ok(s.clone()),
        FilterValue::Integer(v) => Ok(v.to_string()),
        FilterValue::Float(v) => Ok(v.to_string()),
        FilterValue::Boolean(v) => Ok(v.to_string()),
        FilterValue::DateTime(dt) => Ok(dt.format(ENGINE_DATETIME_FORMAT).to_string()),
        FilterValue::List(_) => Err(QueryError::InvalidSpec(
            "list values are only valid with the 'in' and 'range' operators".into(),
        )),
    }
}

fn apply_template(operator: FilterOperator, value: &str) -> String {
    match operator {
        FilterOperator::Contains | FilterOperator::Exact | FilterOperator::In => value.to_string(),
        FilterOperator::StartsWith => format!("{}*", value),
        FilterOperator::Gt => format!("{{{} TO *}}", value),
        FilterOperator::Gte => format!("[{} TO *]", value),
        FilterOperator::Lt => format!("{{* TO {}}}", value),
        FilterOperator::Lte => format!("[* TO {}]", value),
        FilterOperator::Range => value.to_string(),
    }
}

fn contains_fragment(
    operator: FilterOperator,
    value: &FilterValue,
) -> Result<String, QueryError> {
    match value {
        FilterValue::Raw(s) => Ok(s.clone()),
        FilterValue::Exact(s) => Ok(format!("\"{}\"", s)),
        FilterValue::Text(s) => {
            let cleaned = sanitize(s);
            let terms: Vec<String> = cleaned
                .split_whitespace()
                .map(|term| format!("\"{}\"", apply_template(operator, term)))
                .collect();
            match terms.len() {
                0 => Err(QueryError::InvalidSpec("empty filter value".into())),
                1 => Ok(terms.into_iter().next().unwrap_or_default()),
                _ => Ok(format!("({})", terms.join(" AND "))),
            }
        }
        FilterValue::Boolean(v) => Ok(format!("\"{}\"", apply_template(operator, &v.to_string()))),
        other => Ok(apply_template(operator, &scalar_string(other)?)),
    }
}

fn in_fragment(value: &FilterValue) -> Result<String, QueryError> {
    let FilterValue::List(values) = value else {
        return Err(QueryError::InvalidSpec(
            "'in' filter requires a list value".into(),
        ));
    };
    if values.is_empty() {
        return Err(QueryError::InvalidSpec("'in' filter requires at least one value".into()));
    }

    let mut options = Vec::with_capacity(values.len());
    for v in values {
        let option = match v {
            FilterValue::Text(s) => format!("\"{}\"", sanitize(s)),
            FilterValue::Exact(s) | FilterValue::Raw(s) => format!("\"{}\"", s),
            FilterValue::Boolean(b) => format!("\"{}\"", b),
            other => scalar_string(other)?,
        };
        options.push(option);
    }

    Ok(format!("({})", options.join(" OR ")))
}

fn range_fragment(value: &FilterValue) -> Result<String, QueryError> {
    let FilterValue::List(values) = value else {
        return Err(QueryError::InvalidSpec(
            "'range' filter requires a two-element list".into(),
        ));
    };
    let [start, end] = values.as_slice() else {
        return Err(QueryError::InvalidSpec(
            "'range' filter requires exactly two values".into(),
        ));
    };
    Ok(format!(
        "[{} TO {}]",
        scalar_string(start)?,
        scalar_string(end)?
    ))
}

fn exact_fragment(value: &FilterValue) -> Result<String, QueryError> {
    match value {
        FilterValue::Raw(s) => Ok(s.clone()),
        FilterValue::Exact(s) => Ok(format!("\"{}\"", s)),
        other => Ok(format!("\"{}\"", scalar_string(other)?)),
    }
}

fn comparison_fragment(
    operator: FilterOperator,
    value: &FilterValue,
) -> Result<String, QueryError> {
    let prepared = match value {
        FilterValue::Exact(s) => format!("\"{}\"", s),
        other => scalar_string(other)?,
    };
    Ok(apply_template(operator, &prepared))
}

/// Build the query-string fragment for one filter clause.
///
/// The logical field is resolved through every registered schema; when
/// entities disagree on the physical name the fragment matches any of
/// them (`(name_a:frag OR name_b:frag)`).
pub fn build_filter_fragment(
    snapshot: &SchemaSnapshot,
    clause: &FilterClause,
) -> Result<String, QueryError> {
    let fragment = match clause.operator {
        FilterOperator::Contains | FilterOperator::StartsWith => {
            contains_fragment(clause.operator, &clause.value)?
        }
        FilterOperator::In => in_fragment(&clause.value)?,
        FilterOperator::Range => range_fragment(&clause.value)?,
        FilterOperator::Exact => exact_fragment(&clause.value)?,
        FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
            comparison_fragment(clause.operator, &clause.value)?
        }
    };

    // Raw values bypass the defensive parenthesization.
    let raw = matches!(clause.value, FilterValue::Raw(_));
    let fragment = if !raw && !fragment.starts_with('(') && !fragment.ends_with(')') {
        format!("({})", fragment)
    } else {
        fragment
    };

    if clause.field == CONTENT_FIELD {
        return Ok(fragment);
    }

    // Distinct physical resolutions, sorted for deterministic output.
    let field_names: BTreeSet<String> = snapshot
        .index_fieldnames(&clause.field)
        .into_values()
        .collect();

    if field_names.is_empty() {
        Ok(fragment)
    } else {
        let scoped: Vec<String> = field_names
            .iter()
            .map(|name| format!("{}:{}", name, fragment))
            .collect();
        Ok(format!("({})", scoped.join(" OR ")))
    }
}

/// Conjoin the main query string with compiled filter fragments under the
/// default operator. A match-all or empty main query contributes nothing.
pub fn compose_query_string(query: &str, fragments: &[String], operator: &str) -> String {
    if fragments.is_empty() {
        return query.to_string();
    }

    let mut parts = Vec::with_capacity(fragments.len() + 1);
    if !query.is_empty() && query != MATCH_ALL {
        parts.push(format!("({})", query));
    }
    parts.extend(fragments.iter().cloned());

    if parts.is_empty() {
        MATCH_ALL.to_string()
    } else {
        parts.join(&format!(" {} ", operator))
    }
}
