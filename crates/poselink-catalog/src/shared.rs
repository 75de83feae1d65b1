use std::sync::{Arc, Mutex, PoisonError};

use crate::catalog::Catalog;

/// Shared copy-on-write catalogue handle.
///
/// Readers `load()` a snapshot and work against it; the sync path builds a
/// complete successor and `store()`s it in one swap. Entries, expected
/// frame size and generation always travel together — the lock protects a
/// single `Arc`, never individual fields.
#[derive(Clone)]
pub struct SharedCatalog {
    inner: Arc<Mutex<Arc<Catalog>>>,
}

impl SharedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Arc::new(catalog))),
        }
    }

    /// Snapshot the current catalogue.
    pub fn load(&self) -> Arc<Catalog> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the catalogue wholesale; returns the stored snapshot.
    pub fn store(&self, catalog: Catalog) -> Arc<Catalog> {
        let snapshot = Arc::new(catalog);
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        snapshot
    }
}

impl std::fmt::Debug for SharedCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCatalog")
            .field("catalog", &self.load())
            .finish()
    }
}
