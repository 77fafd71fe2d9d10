//! Query composition.
//!
//! A search request carries up to three inputs — a free-text term, a filter
//! expression string, and a nested facet-filter structure — which compose
//! into one ordered list of sub-queries executed as a single conjunction.
//!
//! Facet filters follow the hosted service's nesting rules: the outer list
//! combines with AND, an inner list is a group of OR-ed alternatives:
//! `["genre:horror", ["lang:en", "lang:fr"]]` ⇒
//! `genre:horror AND (lang:en OR lang:fr)`.

use serde::{Deserialize, Serialize};
use tantivy::query::{AllQuery, Query, QueryParser};
use tantivy::Index;

use loupe_core::Result;

use crate::schema::StoreSchema;

/// One element of a facet-filter list: a filter or a group of alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetFilter {
    /// A single facet filter expression.
    Single(String),
    /// Alternatives to be OR-combined.
    Group(Vec<String>),
}

/// The facet-filter input shape: a bare expression or a nested list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetFilters {
    /// A single filter expression string.
    Expression(String),
    /// AND-combined list of filters and OR-groups.
    Groups(Vec<FacetFilter>),
}

impl FacetFilters {
    /// Rewrite the structure into one filter expression string.
    pub fn to_expression(&self) -> String {
        match self {
            Self::Expression(s) => s.clone(),
            Self::Groups(groups) => groups
                .iter()
                .map(|group| match group {
                    FacetFilter::Single(s) => s.clone(),
                    FacetFilter::Group(alternatives) => {
                        format!("({})", alternatives.join(" OR "))
                    }
                })
                .collect::<Vec<String>>()
                .join(" AND "),
        }
    }
}

/// The three optional inputs of a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Free-text term. An empty string means "match everything".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Filter expression string, compiled as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,

    /// Nested facet-filter structure.
    #[serde(
        default,
        rename = "facetFilters",
        skip_serializing_if = "Option::is_none"
    )]
    pub facet_filters: Option<FacetFilters>,
}

impl QuerySpec {
    /// Whether any input is present.
    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.filters.is_none() && self.facet_filters.is_none()
    }
}

/// Compose a spec into the ordered conjunct list to execute.
///
/// Returns an empty list when no input is present — the caller treats that
/// as "nothing to execute", not match-all. An explicitly empty free-text
/// term does mean match-all.
pub fn compose(index: &Index, schema: &StoreSchema, spec: &QuerySpec) -> Result<Vec<Box<dyn Query>>> {
    let mut conjuncts: Vec<Box<dyn Query>> = Vec::new();

    if let Some(term) = &spec.query {
        if term.is_empty() {
            conjuncts.push(Box::new(AllQuery));
        } else {
            let parser = QueryParser::for_index(index, vec![schema.all]);
            let (query, errors) = parser.parse_query_lenient(term);
            for error in errors {
                log::debug!("lenient query parse: {error}");
            }
            conjuncts.push(query);
        }
    }

    if let Some(filters) = &spec.filters {
        conjuncts.push(loupe_filter::compile(schema.attrs, filters)?);
    }

    if let Some(facet_filters) = &spec.facet_filters {
        let expression = facet_filters.to_expression();
        if !expression.trim().is_empty() {
            conjuncts.push(loupe_filter::compile(schema.attrs, &expression)?);
        }
    }

    Ok(conjuncts)
}

// ============================================================================
// Tests
// ============================================================================
