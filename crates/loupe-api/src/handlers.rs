//! Request handlers for the emulated REST surface.
//!
//! Every handler resolves an index through the shared [`StoreRegistry`] and
//! routes to exactly one of the mutation pipeline, the query path, or the
//! browse engine. Mutations acknowledge synchronously: the store commits
//! before the response is built, so a client that reads its own write always
//! sees it.
//!
//! Batch note: the upsert group and the delete group are applied as two
//! separate store writes. Each group is atomic on its own; the pair is not —
//! a concurrent search may observe the state between them.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use loupe_store::{QuerySpec, StoredDocument, OBJECT_ID};

use crate::cursor;
use crate::error::{ApiError, Result};
use crate::routes::AppState;
use crate::types::{
    now_iso, spec_from_params, BatchBody, BatchResponse, BrowseBody, BrowseResponse,
    ClearResponse, DeleteByQueryBody, DeleteByQueryResponse, DeleteResponse, SaveResponse,
    SearchBody, SearchResponse, UpdateResponse, TASK_ID,
};

/// Parse a request body, tolerating any Content-Type and an empty body.
fn parse_body<T: DeserializeOwned + Default>(bytes: &Bytes) -> Result<T> {
    if bytes.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
}

/// Parse a body that must be a JSON object of document fields.
fn parse_fields(bytes: &Bytes) -> Result<Map<String, Value>> {
    if bytes.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ApiError::BadRequest(format!(
            "document body must be a JSON object, got {other}"
        ))),
        Err(e) => Err(ApiError::BadRequest(format!("invalid request body: {e}"))),
    }
}

/// `POST /1/indexes/{index_name}/query` — full-text and filtered search.
pub async fn query_index(
    State(state): State<Arc<AppState>>,
    Path(index_name): Path<String>,
    bytes: Bytes,
) -> Result<impl IntoResponse> {
    let body: SearchBody = parse_body(&bytes)?;
    let (spec, params) = body.resolve()?;

    let store = state.registry.get(&index_name).await?;
    let hits = store
        .search(&spec)?
        .iter()
        .map(StoredDocument::to_public)
        .collect();

    Ok(Json(SearchResponse {
        hits,
        params,
        query: spec.query.unwrap_or_default(),
    }))
}

/// `POST /1/indexes/{index_name}` — save one document.
pub async fn save_object(
    State(state): State<Arc<AppState>>,
    Path(index_name): Path<String>,
    bytes: Bytes,
) -> Result<impl IntoResponse> {
    let fields = parse_fields(&bytes)?;
    let doc = StoredDocument::from_public(fields);
    let object_id = doc.id.clone();

    let store = state.registry.get(&index_name).await?;
    store.put(&[doc]).await?;

    Ok((
        StatusCode::CREATED,
        Json(SaveResponse {
            created_at: now_iso(),
            task_id: TASK_ID.to_string(),
            object_id,
        }),
    ))
}

/// `POST /1/indexes/{index_name}/batch` — mixed upserts and deletes.
///
/// The whole batch is validated before anything is applied; an unsupported
/// action rejects it with nothing written.
pub async fn batch_write(
    State(state): State<Arc<AppState>>,
    Path(index_name): Path<String>,
    bytes: Bytes,
) -> Result<impl IntoResponse> {
    let body: BatchBody = parse_body(&bytes)?;

    let mut puts = Vec::new();
    let mut deletes = Vec::new();
    let mut object_ids = Vec::with_capacity(body.requests.len());

    for entry in body.requests {
        match entry.action.as_str() {
            "updateObject" => {
                let doc = StoredDocument::from_public(entry.body);
                object_ids.push(doc.id.clone());
                puts.push(doc);
            }
            "deleteObject" => {
                let id = match entry.body.get(OBJECT_ID) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => {
                        return Err(ApiError::BadRequest(
                            "deleteObject requires an objectID".to_string(),
                        ));
                    }
                };
                object_ids.push(id.clone());
                deletes.push(id);
            }
            other => {
                return Err(ApiError::BadRequest(format!(
                    "unsupported batch action '{other}'"
                )));
            }
        }
    }

    let store = state.registry.get(&index_name).await?;
    if !puts.is_empty() {
        store.put(&puts).await?;
    }
    if !deletes.is_empty() {
        store.delete(&deletes).await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(BatchResponse {
            task_id: TASK_ID.to_string(),
            object_ids,
        }),
    ))
}

/// `PUT /1/indexes/{index_name}/{object_id}` — replace by id.
///
/// Absence of an existing document is not an error; applying the same
/// payload twice leaves the same stored state.
pub async fn update_object(
    State(state): State<Arc<AppState>>,
    Path((index_name, object_id)): Path<(String, String)>,
    bytes: Bytes,
) -> Result<impl IntoResponse> {
    let fields = parse_fields(&bytes)?;
    let doc = StoredDocument::with_id(object_id.clone(), fields);

    let store = state.registry.get(&index_name).await?;
    store.put(&[doc]).await?;

    Ok((
        StatusCode::CREATED,
        Json(UpdateResponse {
            updated_at: now_iso(),
            task_id: TASK_ID.to_string(),
            object_id,
        }),
    ))
}

/// `DELETE /1/indexes/{index_name}/{object_id}` — delete by id.
pub async fn delete_object(
    State(state): State<Arc<AppState>>,
    Path((index_name, object_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let store = state.registry.get(&index_name).await?;
    match store.delete(std::slice::from_ref(&object_id)).await {
        Ok(()) => {}
        // Absence already means what the caller wanted.
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err.into()),
    }

    Ok(Json(DeleteResponse {
        deleted_at: now_iso(),
        task_id: TASK_ID.to_string(),
        object_id,
    }))
}

/// `POST /1/indexes/{index_name}/deleteByQuery` — delete every match of a
/// facet filter.
pub async fn delete_by_query(
    State(state): State<Arc<AppState>>,
    Path(index_name): Path<String>,
    bytes: Bytes,
) -> Result<impl IntoResponse> {
    let body: DeleteByQueryBody = parse_body(&bytes)?;
    let spec = match body.params.as_deref() {
        Some(params) => spec_from_params(params)?,
        None => QuerySpec::default(),
    };

    if spec.query.is_some() || spec.filters.is_some() || spec.facet_filters.is_none() {
        return Err(ApiError::BadRequest(
            "deleteByQuery only supports facetFilters conditions".to_string(),
        ));
    }

    let restricted = QuerySpec {
        facet_filters: spec.facet_filters,
        ..Default::default()
    };

    let store = state.registry.get(&index_name).await?;
    let ids: Vec<String> = store
        .search(&restricted)?
        .into_iter()
        .map(|doc| doc.id)
        .collect();
    store.delete(&ids).await?;

    Ok((
        StatusCode::CREATED,
        Json(DeleteByQueryResponse {
            updated_at: now_iso(),
            task_id: TASK_ID.to_string(),
        }),
    ))
}

/// `POST /1/indexes/{index_name}/clear` — delete every document.
pub async fn clear_index(
    State(state): State<Arc<AppState>>,
    Path(index_name): Path<String>,
) -> Result<impl IntoResponse> {
    if !state.registry.exists(&index_name) {
        return Err(ApiError::BadRequest(format!(
            "index '{index_name}' does not exist"
        )));
    }

    let store = state.registry.get(&index_name).await?;
    let ids = store.all_ids()?;
    store.delete(&ids).await?;
    state.registry.reset(&index_name).await?;

    Ok(Json(ClearResponse {
        task_id: TASK_ID.to_string(),
    }))
}

/// `POST /1/indexes/{index_name}/browse` — cursor-paged enumeration.
pub async fn browse_index(
    State(state): State<Arc<AppState>>,
    Path(index_name): Path<String>,
    bytes: Bytes,
) -> Result<impl IntoResponse> {
    let started = Instant::now();

    if !state.registry.exists(&index_name) {
        return Err(ApiError::BadRequest(format!(
            "index '{index_name}' does not exist"
        )));
    }

    let body: BrowseBody = parse_body(&bytes)?;
    let offset = cursor::decode(body.cursor.as_deref())?;
    let attributes = body.attributes_to_retrieve.unwrap_or_default();

    let store = state.registry.get(&index_name).await?;
    let ids = store.all_ids()?;
    let total = ids.len();

    let start = offset.min(total);
    let end = (offset + cursor::PAGE_SIZE).min(total);
    let hits = store
        .get_objects(&ids[start..end])?
        .iter()
        .map(|doc| {
            let mut public = doc.to_public();
            if !attributes.is_empty() {
                public.retain(|key, _| key == OBJECT_ID || attributes.iter().any(|a| a == key));
            }
            public
        })
        .collect();

    Ok(Json(BrowseResponse {
        hits,
        page: cursor::page(offset),
        nb_hits: total,
        nb_pages: cursor::page_count(total),
        hits_per_page: cursor::PAGE_SIZE,
        processing_time_ms: started.elapsed().as_millis() as u64,
        query: String::new(),
        params: String::new(),
        cursor: cursor::next(offset, total),
    }))
}

/// `GET /1/indexes/{index_name}/{object_id}` — point lookup.
pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path((index_name, object_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    if !state.registry.exists(&index_name) {
        return Err(ApiError::NotFound(format!(
            "index '{index_name}' does not exist"
        )));
    }

    let store = state.registry.get(&index_name).await?;
    let doc = store.get(&object_id)?;
    Ok(Json(Value::Object(doc.to_public())))
}
