//! Per-index store handle.
//!
//! `IndexStore` wraps one on-disk Tantivy index: writes, deletes, search,
//! and ordered enumeration. Every mutation commits and reloads the reader
//! before returning, so acknowledgments are only produced once the write is
//! durably applied and observable.
//!
//! # Enumeration order
//!
//! Each write is assigned a monotonically increasing `_seq`; the stable
//! enumeration order of an index is ascending `_seq` (append order). The
//! counter resumes from the maximum stored value when an index is re-opened,
//! so the order survives process restarts.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::json;
use tantivy::collector::{Count, DocSetCollector, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{
    DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term,
};
use tokio::sync::Mutex;

use loupe_core::{Error, Result};

use crate::document::StoredDocument;
use crate::query::{self, QuerySpec};
use crate::schema::StoreSchema;

/// Index writer buffer size (50MB).
const WRITER_BUFFER_SIZE: usize = 50_000_000;

/// Handle to one named index.
pub struct IndexStore {
    name: String,
    index: Index,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    schema: StoreSchema,
    next_seq: AtomicU64,
}

impl IndexStore {
    /// Create or open the index at the given directory.
    ///
    /// Creates the directory (parents included) when missing; re-opening an
    /// existing directory resumes the persisted contents and the write
    /// sequence.
    pub fn open(name: &str, dir: &Path) -> Result<Self> {
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io_with_path(e, dir))?;
        }

        let schema = StoreSchema::build();
        let index = if dir.join("meta.json").exists() {
            Index::open_in_dir(dir)
                .map_err(|e| Error::store(format!("failed to open index '{name}': {e}")))?
        } else {
            Index::create_in_dir(dir, schema.schema().clone())
                .map_err(|e| Error::store(format!("failed to create index '{name}': {e}")))?
        };

        StoreSchema::register_tokenizers(&index);

        let writer = index
            .writer(WRITER_BUFFER_SIZE)
            .map_err(|e| Error::store(format!("failed to create index writer: {e}")))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| Error::store(format!("failed to create index reader: {e}")))?;

        let next_seq = max_stored_seq(&reader.searcher(), &schema)?
            .map(|max| max + 1)
            .unwrap_or(0);

        Ok(Self {
            name: name.to_string(),
            index,
            writer: Mutex::new(writer),
            reader,
            schema,
            next_seq: AtomicU64::new(next_seq),
        })
    }

    /// The index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write documents, replacing any existing record with the same key.
    ///
    /// The whole slice is applied under one commit.
    pub async fn put(&self, docs: &[StoredDocument]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        for doc in docs {
            writer.delete_term(Term::from_field_text(self.schema.id, &doc.id));
            let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            writer
                .add_document(self.to_tantivy_doc(doc, seq)?)
                .map_err(|e| Error::store(format!("failed to add document '{}': {e}", doc.id)))?;
        }
        self.commit(&mut writer)
    }

    /// Delete documents by key. Absent keys are not an error.
    pub async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        for id in ids {
            writer.delete_term(Term::from_field_text(self.schema.id, id));
        }
        self.commit(&mut writer)
    }

    /// Remove every document from the index.
    pub async fn reset(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer
            .delete_all_documents()
            .map_err(|e| Error::store(format!("failed to clear index: {e}")))?;
        self.commit(&mut writer)
    }

    /// Compose and execute a search; hits come back in the store's native
    /// relevance order.
    pub fn search(&self, spec: &QuerySpec) -> Result<Vec<StoredDocument>> {
        let conjuncts = query::compose(&self.index, &self.schema, spec)?;
        if conjuncts.is_empty() {
            return Ok(Vec::new());
        }

        let query = BooleanQuery::intersection(conjuncts);
        let searcher = self.reader.searcher();

        let total = searcher
            .search(&query, &Count)
            .map_err(|e| Error::store(format!("search failed: {e}")))?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let top = searcher
            .search(&query, &TopDocs::with_limit(total).order_by_score())
            .map_err(|e| Error::store(format!("search failed: {e}")))?;

        top.into_iter()
            .map(|(_score, address)| self.doc_at(&searcher, address))
            .collect()
    }

    /// Full identifier list in stable enumeration order.
    pub fn all_ids(&self) -> Result<Vec<String>> {
        let searcher = self.reader.searcher();
        let addresses = searcher
            .search(&AllQuery, &DocSetCollector)
            .map_err(|e| Error::store(format!("enumeration failed: {e}")))?;

        let mut entries = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| Error::store(format!("failed to load document: {e}")))?;
            let seq = doc
                .get_first(self.schema.seq)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| Error::store("stored document missing sequence"))?;
            let id = doc
                .get_first(self.schema.id)
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::store("stored document missing key"))?
                .to_string();
            entries.push((seq, id));
        }

        entries.sort_unstable_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, id)| id).collect())
    }

    /// Fetch documents for a list of keys, skipping any that are gone.
    pub fn get_objects(&self, ids: &[String]) -> Result<Vec<StoredDocument>> {
        let searcher = self.reader.searcher();
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(address) = self.lookup(&searcher, id)? {
                docs.push(self.doc_at(&searcher, address)?);
            }
        }
        Ok(docs)
    }

    /// Point lookup by key.
    pub fn get(&self, id: &str) -> Result<StoredDocument> {
        let searcher = self.reader.searcher();
        match self.lookup(&searcher, id)? {
            Some(address) => self.doc_at(&searcher, address),
            None => Err(Error::not_found(format!(
                "object '{id}' does not exist in index '{}'",
                self.name
            ))),
        }
    }

    /// Live document count.
    pub fn count(&self) -> Result<usize> {
        self.reader
            .searcher()
            .search(&AllQuery, &Count)
            .map_err(|e| Error::store(format!("count failed: {e}")))
    }

    fn commit(&self, writer: &mut IndexWriter) -> Result<()> {
        writer
            .commit()
            .map_err(|e| Error::store(format!("failed to commit index: {e}")))?;
        self.reader
            .reload()
            .map_err(|e| Error::store(format!("failed to reload reader: {e}")))?;
        Ok(())
    }

    fn lookup(&self, searcher: &Searcher, id: &str) -> Result<Option<DocAddress>> {
        let query = TermQuery::new(
            Term::from_field_text(self.schema.id, id),
            IndexRecordOption::Basic,
        );
        let top = searcher
            .search(&query, &TopDocs::with_limit(1).order_by_score())
            .map_err(|e| Error::store(format!("lookup failed: {e}")))?;
        Ok(top.into_iter().next().map(|(_score, address)| address))
    }

    fn doc_at(&self, searcher: &Searcher, address: DocAddress) -> Result<StoredDocument> {
        let doc: TantivyDocument = searcher
            .doc(address)
            .map_err(|e| Error::store(format!("failed to load document: {e}")))?;

        let id = doc
            .get_first(self.schema.id)
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::store("stored document missing key"))?
            .to_string();
        let source = doc
            .get_first(self.schema.source)
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::store("stored document missing body"))?;
        let fields = serde_json::from_str(source)
            .map_err(|e| Error::store(format!("corrupt stored document '{id}': {e}")))?;

        Ok(StoredDocument { id, fields })
    }

    fn to_tantivy_doc(&self, doc: &StoredDocument, seq: u64) -> Result<TantivyDocument> {
        let source = serde_json::to_string(&doc.fields)
            .map_err(|e| Error::store(format!("failed to serialize document '{}': {e}", doc.id)))?;

        let mut raw = serde_json::Map::new();
        raw.insert(crate::schema::FIELD_ID.to_string(), json!(doc.id));
        raw.insert(crate::schema::FIELD_SEQ.to_string(), json!(seq));
        raw.insert(crate::schema::FIELD_ALL.to_string(), json!(doc.full_text()));
        raw.insert(crate::schema::FIELD_SOURCE.to_string(), json!(source));
        raw.insert(
            crate::schema::FIELD_ATTRS.to_string(),
            serde_json::Value::Object(doc.fields.clone()),
        );

        TantivyDocument::parse_json(self.schema.schema(), &serde_json::Value::Object(raw).to_string())
            .map_err(|e| Error::store(format!("failed to convert document '{}': {e}", doc.id)))
    }
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("name", &self.name)
            .field("index", &"<tantivy::Index>")
            .finish()
    }
}

/// Highest `_seq` currently stored, or `None` for an empty index.
fn max_stored_seq(searcher: &Searcher, schema: &StoreSchema) -> Result<Option<u64>> {
    let addresses = searcher
        .search(&AllQuery, &DocSetCollector)
        .map_err(|e| Error::store(format!("sequence scan failed: {e}")))?;

    let mut max = None;
    for address in addresses {
        let doc: TantivyDocument = searcher
            .doc(address)
            .map_err(|e| Error::store(format!("sequence scan failed: {e}")))?;
        if let Some(seq) = doc.get_first(schema.seq).and_then(|v| v.as_u64()) {
            max = Some(max.map_or(seq, |m: u64| m.max(seq)));
        }
    }
    Ok(max)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, body: serde_json::Value) -> StoredDocument {
        let mut fields = match body {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        };
        fields.remove("objectID");
        StoredDocument {
            id: id.to_string(),
            fields,
        }
    }

    fn open_store(dir: &Path) -> IndexStore {
        IndexStore::open("test", dir).unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store
            .put(&[doc("asdf", json!({"text": "test"}))])
            .await
            .unwrap();

        let fetched = store.get("asdf").unwrap();
        assert_eq!(fetched.id, "asdf");
        assert_eq!(fetched.fields["text"], json!("test"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        let err = store.get("nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_same_id_replaces() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store
            .put(&[doc("asdf", json!({"text": "first"}))])
            .await
            .unwrap();
        store
            .put(&[doc("asdf", json!({"text": "second"}))])
            .await
            .unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("asdf").unwrap().fields["text"], json!("second"));
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store.delete(&["never-inserted".to_string()]).await.unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_document() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store
            .put(&[doc("asdf", json!({"text": "test"}))])
            .await
            .unwrap();
        store.delete(&["asdf".to_string()]).await.unwrap();

        assert_eq!(store.count().unwrap(), 0);
        assert!(store.get("asdf").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_free_text_search() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store
            .put(&[
                doc("a", json!({"text": "a test document"})),
                doc("b", json!({"text": "something else"})),
            ])
            .await
            .unwrap();

        let spec = QuerySpec {
            query: Some("test".into()),
            ..Default::default()
        };
        let hits = store.search(&spec).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn test_empty_query_matches_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store
            .put(&[
                doc("a", json!({"text": "one"})),
                doc("b", json!({"text": "two"})),
            ])
            .await
            .unwrap();

        let spec = QuerySpec {
            query: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(store.search(&spec).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_spec_matches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store.put(&[doc("a", json!({"text": "one"}))]).await.unwrap();
        assert!(store.search(&QuerySpec::default()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_with_facet_filter() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store
            .put(&[
                doc("a", json!({"text": "night", "genre": "horror"})),
                doc("b", json!({"text": "night", "genre": "comedy"})),
            ])
            .await
            .unwrap();

        let spec: QuerySpec = serde_json::from_value(json!({
            "query": "night",
            "facetFilters": ["genre:horror"]
        }))
        .unwrap();
        let hits = store.search(&spec).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn test_all_ids_in_insertion_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        let docs: Vec<StoredDocument> = (0..25)
            .map(|i| doc(&i.to_string(), json!({"text": "test"})))
            .collect();
        store.put(&docs).await.unwrap();

        let ids = store.all_ids().unwrap();
        let expected: Vec<String> = (0..25).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_replaced_document_moves_to_end_of_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store
            .put(&[
                doc("a", json!({"n": 1})),
                doc("b", json!({"n": 2})),
                doc("c", json!({"n": 3})),
            ])
            .await
            .unwrap();
        store.put(&[doc("a", json!({"n": 4}))]).await.unwrap();

        assert_eq!(store.all_ids().unwrap(), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store
            .put(&[doc("a", json!({"text": "test"}))])
            .await
            .unwrap();
        store.reset().await.unwrap();

        assert_eq!(store.count().unwrap(), 0);
        let spec = QuerySpec {
            query: Some("test".into()),
            ..Default::default()
        };
        assert!(store.search(&spec).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_preserves_contents_and_order() {
        let tmp = tempfile::tempdir().unwrap();

        {
            let store = open_store(tmp.path());
            store
                .put(&[doc("a", json!({"n": 1})), doc("b", json!({"n": 2}))])
                .await
                .unwrap();
            // store dropped, releasing the writer lock
        }

        let store = open_store(tmp.path());
        assert_eq!(store.count().unwrap(), 2);

        // sequence resumes: a later write still lands at the end
        store.put(&[doc("c", json!({"n": 3}))]).await.unwrap();
        assert_eq!(store.all_ids().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_get_objects_preserves_request_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path());

        store
            .put(&[
                doc("a", json!({"n": 1})),
                doc("b", json!({"n": 2})),
                doc("c", json!({"n": 3})),
            ])
            .await
            .unwrap();

        let ids = vec!["c".to_string(), "missing".to_string(), "a".to_string()];
        let docs = store.get_objects(&ids).unwrap();
        let got: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(got, vec!["c", "a"]);
    }
}
