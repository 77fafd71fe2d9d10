//! Process-wide store registry.
//!
//! One live [`IndexStore`] handle per index name per process: every request
//! resolving the same name observes the same handle, including concurrent
//! first accesses (get-or-create holds the write lock across the check and
//! the insert).
//!
//! On-disk existence and in-memory liveness are independent facts: an index
//! created by a previous process run exists on disk but has no cached handle
//! until `get` is called, and `exists` never populates the cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use loupe_core::{valid_index_name, Error, Result};

use crate::index::IndexStore;

/// Name of the hidden per-root store directory.
pub const STORE_DIR: &str = ".loupe";

/// Registry of per-index store handles under one data root.
pub struct StoreRegistry {
    root: PathBuf,
    stores: RwLock<HashMap<String, Arc<IndexStore>>>,
}

impl StoreRegistry {
    /// Create a registry rooted at the given directory.
    ///
    /// Nothing is touched on disk until an index is first accessed.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// The data root this registry serves.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_dir(&self, name: &str) -> PathBuf {
        self.root.join(STORE_DIR).join(name)
    }

    fn check_name(name: &str) -> Result<()> {
        if valid_index_name(name) {
            Ok(())
        } else {
            Err(Error::bad_request(format!("invalid index name '{name}'")))
        }
    }

    /// Get the cached handle for an index, creating the on-disk store on
    /// first access.
    pub async fn get(&self, name: &str) -> Result<Arc<IndexStore>> {
        Self::check_name(name)?;

        if let Some(store) = self.stores.read().await.get(name) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write().await;
        // Double-check: another request may have created it while we waited.
        if let Some(store) = stores.get(name) {
            return Ok(Arc::clone(store));
        }

        log::debug!("opening index '{name}'");
        let store = Arc::new(IndexStore::open(name, &self.index_dir(name))?);
        stores.insert(name.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Whether the index exists on disk, regardless of the cache.
    pub fn exists(&self, name: &str) -> bool {
        valid_index_name(name) && self.index_dir(name).exists()
    }

    /// Clear a cached index's contents. Does nothing if the index was never
    /// cached in this process.
    pub async fn reset(&self, name: &str) -> Result<()> {
        let store = {
            let stores = self.stores.read().await;
            stores.get(name).map(Arc::clone)
        };
        match store {
            Some(store) => store.reset().await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("root", &self.root)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StoredDocument;
    use serde_json::json;

    fn doc(id: &str) -> StoredDocument {
        let mut fields = serde_json::Map::new();
        fields.insert("text".to_string(), json!("test"));
        StoredDocument {
            id: id.to_string(),
            fields,
        }
    }

    #[tokio::test]
    async fn test_exists_independent_of_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = StoreRegistry::new(tmp.path());

        assert!(!registry.exists("movies"));
        registry.get("movies").await.unwrap();
        assert!(registry.exists("movies"));

        // A fresh registry over the same root sees the index on disk
        // without having a handle for it.
        let second = StoreRegistry::new(tmp.path());
        assert!(second.exists("movies"));
    }

    #[tokio::test]
    async fn test_get_returns_same_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = StoreRegistry::new(tmp.path());

        let a = registry.get("movies").await.unwrap();
        let b = registry.get("movies").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_concurrent_first_access_single_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = Arc::new(StoreRegistry::new(tmp.path()));

        let r1 = Arc::clone(&registry);
        let r2 = Arc::clone(&registry);
        let (a, b) = tokio::join!(r1.get("movies"), r2.get("movies"));
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn test_reset_uncached_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = StoreRegistry::new(tmp.path());

        registry.reset("never-seen").await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_clears_cached_store() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = StoreRegistry::new(tmp.path());

        let store = registry.get("movies").await.unwrap();
        store.put(&[doc("a")]).await.unwrap();
        assert_eq!(store.count().unwrap(), 1);

        registry.reset("movies").await.unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_names_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = StoreRegistry::new(tmp.path());

        for name in ["", "..", "a/b", "a\\b"] {
            let err = registry.get(name).await.unwrap_err();
            assert!(matches!(err, Error::BadRequest(_)), "name: {name:?}");
            assert!(!registry.exists(name));
        }
    }
}
