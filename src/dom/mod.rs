pub mod document;
pub mod selector;
pub mod snapshot;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::dom::document::Document;

/// Shared handle to the page's document.
///
/// The scanner, the notifier and every in-flight save task hold a clone.
/// Access goes through [`Page::with`] so the lock is never held across an
/// await point.
#[derive(Debug, Clone)]
pub struct Page {
    inner: Arc<Mutex<Document>>,
}

impl Page {
    pub fn new(doc: Document) -> Self {
        Self {
            inner: Arc::new(Mutex::new(doc)),
        }
    }

    /// Run `f` with exclusive access to the document.
    pub fn with<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        // A panic in another holder leaves the tree structurally valid.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
