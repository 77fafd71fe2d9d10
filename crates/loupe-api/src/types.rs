//! Wire shapes for the emulated REST surface.
//!
//! Request bodies are read as raw bytes and parsed here: hosted-service
//! client libraries POST JSON bodies under non-JSON content types (the
//! legacy preflight-avoidance trick), and the classic surface also wraps
//! search parameters URL-encoded under a `params` member. Response shapes
//! mirror the hosted service field-for-field, including its mixed
//! `camelCase`/`ID` capitalizations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use loupe_core::{Error, Result};
use loupe_store::{FacetFilters, QuerySpec};

/// Constant task identifier carried by every acknowledgment.
///
/// Mutations apply synchronously, so there is never a real task to poll;
/// clients that insist on waiting for one get an id that is always done.
pub const TASK_ID: &str = "loupe-task-id";

/// Current time in the RFC 3339 shape the hosted service uses.
pub fn now_iso() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /1/indexes/{index}/query`.
///
/// Either the search inputs inline, or the whole thing URL-encoded under
/// `params`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchBody {
    /// URL-encoded search parameters.
    #[serde(default)]
    pub params: Option<String>,

    /// Inline search inputs (used when `params` is absent).
    #[serde(flatten)]
    pub spec: QuerySpec,
}

impl SearchBody {
    /// Resolve to the spec to execute plus the raw params string to echo.
    pub fn resolve(self) -> Result<(QuerySpec, String)> {
        match self.params {
            Some(params) => {
                let spec = spec_from_params(&params)?;
                Ok((spec, params))
            }
            None => Ok((self.spec, String::new())),
        }
    }
}

/// URL-encoded rendition of the search inputs.
#[derive(Debug, Default, Deserialize)]
struct ParamsForm {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    filters: Option<String>,
    #[serde(default, rename = "facetFilters")]
    facet_filters: Option<String>,
}

/// Parse a `params` string into a query spec.
///
/// In the form encoding `facetFilters` arrives as a string; a JSON array is
/// decoded into the nested structure, anything else is taken as a single
/// filter expression.
pub fn spec_from_params(params: &str) -> Result<QuerySpec> {
    let form: ParamsForm = serde_urlencoded::from_str(params)
        .map_err(|e| Error::bad_request(format!("invalid params: {e}")))?;

    let facet_filters = form.facet_filters.map(|raw| {
        if raw.trim_start().starts_with('[') {
            serde_json::from_str::<FacetFilters>(&raw)
                .unwrap_or(FacetFilters::Expression(raw))
        } else {
            FacetFilters::Expression(raw)
        }
    });

    Ok(QuerySpec {
        query: form.query,
        filters: form.filters,
        facet_filters,
    })
}

/// One entry of a batch request.
#[derive(Debug, Deserialize)]
pub struct BatchEntry {
    /// Requested action (`updateObject` or `deleteObject`).
    pub action: String,
    /// The document body, or `{objectID}` for deletes.
    #[serde(default)]
    pub body: Map<String, Value>,
}

/// Body of `POST /1/indexes/{index}/batch`.
#[derive(Debug, Default, Deserialize)]
pub struct BatchBody {
    /// Ordered mutation requests.
    #[serde(default)]
    pub requests: Vec<BatchEntry>,
}

/// Body of `POST /1/indexes/{index}/deleteByQuery`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteByQueryBody {
    /// URL-encoded parameters; only `facetFilters` qualifies.
    #[serde(default)]
    pub params: Option<String>,
}

/// Body of `POST /1/indexes/{index}/browse`.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseBody {
    /// Resume cursor from a previous page.
    #[serde(default)]
    pub cursor: Option<String>,

    /// Restrict hits to these attributes (plus `objectID`).
    #[serde(default, rename = "attributesToRetrieve")]
    pub attributes_to_retrieve: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response of the query endpoint.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Matching documents in relevance order.
    pub hits: Vec<Map<String, Value>>,
    /// Raw params string echoed back.
    pub params: String,
    /// Free-text term echoed back.
    pub query: String,
}

/// Acknowledgment for a create.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// Creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Task identifier placeholder.
    #[serde(rename = "taskID")]
    pub task_id: String,
    /// The resulting document key.
    #[serde(rename = "objectID")]
    pub object_id: String,
}

/// Acknowledgment for a replace-by-id.
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    /// Update timestamp.
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    /// Task identifier placeholder.
    #[serde(rename = "taskID")]
    pub task_id: String,
    /// The document key.
    #[serde(rename = "objectID")]
    pub object_id: String,
}

/// Acknowledgment for a delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Deletion timestamp.
    #[serde(rename = "deletedAt")]
    pub deleted_at: String,
    /// Task identifier placeholder.
    #[serde(rename = "taskID")]
    pub task_id: String,
    /// The document key.
    #[serde(rename = "objectID")]
    pub object_id: String,
}

/// Acknowledgment for a batch.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// Task identifier placeholder.
    #[serde(rename = "taskID")]
    pub task_id: String,
    /// Keys touched, in request order.
    #[serde(rename = "objectIDs")]
    pub object_ids: Vec<String>,
}

/// Acknowledgment for a delete-by-query.
#[derive(Debug, Serialize)]
pub struct DeleteByQueryResponse {
    /// Update timestamp.
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    /// Task identifier placeholder.
    #[serde(rename = "taskID")]
    pub task_id: String,
}

/// Acknowledgment for a clear.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    /// Task identifier placeholder.
    #[serde(rename = "taskID")]
    pub task_id: String,
}

/// Response of the browse endpoint.
#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    /// This page's documents in enumeration order.
    pub hits: Vec<Map<String, Value>>,
    /// Zero-based page number.
    pub page: usize,
    /// Total documents in the index.
    #[serde(rename = "nbHits")]
    pub nb_hits: usize,
    /// Total pages.
    #[serde(rename = "nbPages")]
    pub nb_pages: usize,
    /// Fixed page size.
    #[serde(rename = "hitsPerPage")]
    pub hits_per_page: usize,
    /// Server-side processing time.
    #[serde(rename = "processingTimeMS")]
    pub processing_time_ms: u64,
    /// Echoed free-text term (always empty for browse).
    pub query: String,
    /// Echoed params (always empty for browse).
    pub params: String,
    /// Cursor for the next page; absent when enumeration is complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// The hosted service's error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub message: String,
    /// HTTP status, repeated in the body.
    pub status: u16,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_store::FacetFilter;

    #[test]
    fn test_search_body_inline() {
        let body: SearchBody =
            serde_json::from_str(r#"{"query": "test", "filters": "year > 2000"}"#).unwrap();
        let (spec, params) = body.resolve().unwrap();
        assert_eq!(spec.query.as_deref(), Some("test"));
        assert_eq!(spec.filters.as_deref(), Some("year > 2000"));
        assert_eq!(params, "");
    }

    #[test]
    fn test_search_body_url_encoded_params() {
        let body: SearchBody =
            serde_json::from_str(r#"{"params": "query=test&filters=year%20%3E%202000"}"#).unwrap();
        let (spec, params) = body.resolve().unwrap();
        assert_eq!(spec.query.as_deref(), Some("test"));
        assert_eq!(spec.filters.as_deref(), Some("year > 2000"));
        assert_eq!(params, "query=test&filters=year%20%3E%202000");
    }

    #[test]
    fn test_params_facet_filters_json_array() {
        let spec =
            spec_from_params("facetFilters=%5B%5B%22genre%3Ahorror%22%5D%5D").unwrap();
        assert_eq!(
            spec.facet_filters,
            Some(FacetFilters::Groups(vec![FacetFilter::Group(vec![
                "genre:horror".into()
            ])]))
        );
    }

    #[test]
    fn test_params_facet_filters_bare_expression() {
        let spec = spec_from_params("facetFilters=genre%3Ahorror").unwrap();
        assert_eq!(
            spec.facet_filters,
            Some(FacetFilters::Expression("genre:horror".into()))
        );
    }

    #[test]
    fn test_empty_query_in_params_survives() {
        // `query=` must resolve to Some("") — "match everything", not None
        let spec = spec_from_params("query=").unwrap();
        assert_eq!(spec.query.as_deref(), Some(""));
    }

    #[test]
    fn test_batch_body_shape() {
        let body: BatchBody = serde_json::from_str(
            r#"{"requests": [
                {"action": "updateObject", "body": {"objectID": "a", "text": "x"}},
                {"action": "deleteObject", "body": {"objectID": "b"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(body.requests.len(), 2);
        assert_eq!(body.requests[0].action, "updateObject");
    }

    #[test]
    fn test_browse_response_omits_final_cursor() {
        let response = BrowseResponse {
            hits: Vec::new(),
            page: 0,
            nb_hits: 0,
            nb_pages: 0,
            hits_per_page: 1000,
            processing_time_ms: 1,
            query: String::new(),
            params: String::new(),
            cursor: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("cursor"));
        assert!(json.contains("nbHits"));
        assert!(json.contains("processingTimeMS"));
    }
}
