//! The [`Store`] trait: the boundary to the live-query and sync engine.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use orrery_core::Document;

use crate::error::StoreError;
use crate::query::Query;

/// Invoked with the full, ordered result set of an observed query, once on
/// registration and again after every change that may affect it. May be
/// called from any thread, but never concurrently for the same observer.
/// Callbacks must not write to the store they observe.
pub type ObserverCallback = Arc<dyn Fn(Vec<Document>) + Send + Sync>;

/// A document store with live queries and background sync.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new document. The document must carry a string `_id`.
    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// Set `assignments` (field to value) on every document matching `query`.
    ///
    /// Returns the number of documents updated.
    async fn update(&self, query: &Query, assignments: Document) -> Result<usize, StoreError>;

    /// One-shot execution of `query`.
    async fn select(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Register a live query. The observer stays registered until the
    /// returned handle is cancelled or dropped.
    fn register_observer(
        &self,
        query: Query,
        callback: ObserverCallback,
    ) -> Result<ObserverHandle, StoreError>;

    /// Ask the sync engine to replicate the documents matching `query`.
    fn register_subscription(&self, query: Query) -> Result<SyncSubscription, StoreError>;

    fn start_sync(&self) -> Result<(), StoreError>;

    fn stop_sync(&self);
}

// ---------------------------------------------------------------------------
// Registration handles
// ---------------------------------------------------------------------------

type OnCancel = Box<dyn FnOnce() + Send>;

/// Runs its cancel action at most once, on `cancel()` or drop.
struct Registration {
    on_cancel: Option<OnCancel>,
}

impl Registration {
    fn new(on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_cancel: Some(Box::new(on_cancel)),
        }
    }

    fn cancel(&mut self) {
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.on_cancel.is_none()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Handle for a live query registered with [`Store::register_observer`].
#[must_use = "dropping an ObserverHandle closes the observer"]
pub struct ObserverHandle {
    query: Query,
    registration: Registration,
}

impl ObserverHandle {
    /// Wrap a store-specific close action.
    pub fn new(query: Query, on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            query,
            registration: Registration::new(on_cancel),
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Close the observer. Idempotent.
    pub fn cancel(&mut self) {
        self.registration.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.registration.is_cancelled()
    }
}

impl fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("query", &self.query.to_string())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Handle for a sync subscription registered with
/// [`Store::register_subscription`].
#[must_use = "dropping a SyncSubscription cancels it"]
pub struct SyncSubscription {
    query: Query,
    registration: Registration,
}

impl SyncSubscription {
    pub fn new(query: Query, on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            query,
            registration: Registration::new(on_cancel),
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Stop replicating. Idempotent.
    pub fn cancel(&mut self) {
        self.registration.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.registration.is_cancelled()
    }
}

impl fmt::Debug for SyncSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSubscription")
            .field("query", &self.query.to_string())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn cancel_action_runs_once_across_cancel_and_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut handle = ObserverHandle::new(Query::collection("planets"), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!handle.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        drop(handle);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_cancels_it() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = SyncSubscription::new(Query::collection("planets"), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(sub);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
