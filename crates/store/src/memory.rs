//! In-process [`Store`] implementation.
//!
//! Documents live in insertion order per collection. Observers receive the
//! full result set of their query when registered and again after every
//! mutation of their collection, on the thread that performed the mutation.
//! Every result set carries the store version it was computed at, and an
//! observer never receives a version older than one it has already seen, so
//! the last delivery always reflects the latest mutation even when writers
//! race.
//! Sync subscriptions are only recorded; there is no peer to sync with.
//!
//! [`MemoryStore::set_offline`] makes every operation fail with
//! [`StoreError::Unavailable`], which stands in for transport failures.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use orrery_core::Document;
use serde_json::Value;

use crate::error::StoreError;
use crate::query::Query;
use crate::store::{ObserverCallback, ObserverHandle, Store, SyncSubscription};

struct Observer {
    query: Query,
    callback: ObserverCallback,
    /// Highest version delivered so far. Held while the callback runs.
    delivered: Arc<Mutex<u64>>,
}

/// A result set computed under the state lock, delivered after it is released.
struct Notification {
    version: u64,
    callback: ObserverCallback,
    delivered: Arc<Mutex<u64>>,
    documents: Vec<Document>,
}

impl Notification {
    fn deliver(self) {
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        if self.version <= *delivered {
            tracing::trace!(version = self.version, "Dropping superseded result set");
            return;
        }
        *delivered = self.version;
        (self.callback)(self.documents);
    }
}

#[derive(Default)]
struct State {
    collections: HashMap<String, Vec<Document>>,
    observers: BTreeMap<u64, Observer>,
    subscriptions: BTreeMap<u64, Query>,
    next_id: u64,
    /// Bumped on every mutation and observer registration.
    version: u64,
    offline: bool,
    syncing: bool,
}

impl State {
    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline {
            Err(StoreError::Unavailable("store is offline".into()))
        } else {
            Ok(())
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn select(&self, query: &Query) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .collections
            .get(&query.collection)
            .map(|docs| docs.iter().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default();
        query.sort(&mut docs);
        docs
    }

    fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    fn notification(&self, version: u64, observer: &Observer) -> Notification {
        Notification {
            version,
            callback: Arc::clone(&observer.callback),
            delivered: Arc::clone(&observer.delivered),
            documents: self.select(&observer.query),
        }
    }

    /// Result sets for every observer of `collection` at a fresh version, to
    /// deliver once the lock is released.
    fn pending_notifications(&mut self, collection: &str) -> Vec<Notification> {
        let version = self.next_version();
        self.observers
            .values()
            .filter(|o| o.query.collection == collection)
            .map(|o| self.notification(version, o))
            .collect()
    }
}

type Shared = Arc<Mutex<State>>;

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn deliver(notifications: Vec<Notification>) {
    for notification in notifications {
        notification.deliver();
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Thread-safe in-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    state: Shared,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert documents without going through the offline check or
    /// notifying observers. Documents whose `_id` already exists are skipped.
    ///
    /// Returns the number of documents added.
    pub fn seed(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = Document>,
    ) -> Result<usize, StoreError> {
        let mut state = lock(&self.state);
        let docs = state.collections.entry(collection.to_string()).or_default();
        let mut added = 0;
        for doc in documents {
            let id = document_id(&doc)?.to_string();
            if docs.iter().any(|d| d.get("_id").and_then(Value::as_str) == Some(id.as_str())) {
                tracing::debug!(collection, id = %id, "Seed document already present, skipping");
                continue;
            }
            docs.push(doc);
            added += 1;
        }
        Ok(added)
    }

    /// Parse a JSON array of documents and [`seed`](Self::seed) them.
    pub fn seed_json(&self, collection: &str, json: &str) -> Result<usize, StoreError> {
        let documents: Vec<Document> = serde_json::from_str(json)?;
        self.seed(collection, documents)
    }

    /// Toggle simulated transport failure.
    pub fn set_offline(&self, offline: bool) {
        lock(&self.state).offline = offline;
        tracing::info!(offline, "Memory store connectivity changed");
    }

    pub fn is_syncing(&self) -> bool {
        lock(&self.state).syncing
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.state).observers.len()
    }

    pub fn subscription_count(&self) -> usize {
        lock(&self.state).subscriptions.len()
    }

    /// Every document of `collection`, archived or not, in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        lock(&self.state)
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

fn document_id(doc: &Document) -> Result<&str, StoreError> {
    doc.get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidDocument("document has no string `_id`".into()))
}

fn remove_observer(state: &Weak<Mutex<State>>, id: u64) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let removed = lock(&state).observers.remove(&id);
    if let Some(observer) = removed {
        // Waits for an in-flight delivery and rejects any still pending.
        *observer
            .delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = u64::MAX;
        tracing::debug!(observer_id = id, "Observer closed");
    }
}

fn remove_subscription(state: &Weak<Mutex<State>>, id: u64) {
    if let Some(state) = state.upgrade() {
        lock(&state).subscriptions.remove(&id);
        tracing::debug!(subscription_id = id, "Sync subscription cancelled");
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let notifications = {
            let mut state = lock(&self.state);
            state.ensure_online()?;

            let id = document_id(&document)?.to_string();
            let docs = state.collections.entry(collection.to_string()).or_default();
            if docs
                .iter()
                .any(|d| d.get("_id").and_then(Value::as_str) == Some(id.as_str()))
            {
                return Err(StoreError::Conflict(format!(
                    "document `{id}` already exists in `{collection}`"
                )));
            }
            docs.push(document);
            tracing::debug!(collection, id = %id, "Document inserted");

            state.pending_notifications(collection)
        };

        deliver(notifications);
        Ok(())
    }

    async fn update(&self, query: &Query, assignments: Document) -> Result<usize, StoreError> {
        let (updated, notifications) = {
            let mut state = lock(&self.state);
            state.ensure_online()?;

            if assignments.contains_key("_id") {
                return Err(StoreError::InvalidDocument("`_id` is immutable".into()));
            }

            let mut updated = 0;
            if let Some(docs) = state.collections.get_mut(&query.collection) {
                for doc in docs.iter_mut().filter(|d| query.matches(d)) {
                    for (field, value) in &assignments {
                        doc.insert(field.clone(), value.clone());
                    }
                    updated += 1;
                }
            }
            tracing::debug!(
                query = %query,
                fields = assignments.len(),
                updated,
                "Documents updated"
            );

            let notifications = if updated > 0 {
                state.pending_notifications(&query.collection)
            } else {
                Vec::new()
            };
            (updated, notifications)
        };

        deliver(notifications);
        Ok(updated)
    }

    async fn select(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let state = lock(&self.state);
        state.ensure_online()?;
        Ok(state.select(query))
    }

    fn register_observer(
        &self,
        query: Query,
        callback: ObserverCallback,
    ) -> Result<ObserverHandle, StoreError> {
        let (id, initial) = {
            let mut state = lock(&self.state);
            state.ensure_online()?;
            let id = state.next_id();
            let version = state.next_version();
            let observer = Observer {
                query: query.clone(),
                callback,
                delivered: Arc::new(Mutex::new(0)),
            };
            let initial = state.notification(version, &observer);
            state.observers.insert(id, observer);
            (id, initial)
        };
        tracing::debug!(observer_id = id, query = %query, "Observer registered");

        initial.deliver();

        let state = Arc::downgrade(&self.state);
        Ok(ObserverHandle::new(query, move || remove_observer(&state, id)))
    }

    fn register_subscription(&self, query: Query) -> Result<SyncSubscription, StoreError> {
        let id = {
            let mut state = lock(&self.state);
            state.ensure_online()?;
            let id = state.next_id();
            state.subscriptions.insert(id, query.clone());
            id
        };
        tracing::debug!(subscription_id = id, query = %query, "Sync subscription registered");

        let state = Arc::downgrade(&self.state);
        Ok(SyncSubscription::new(query, move || {
            remove_subscription(&state, id)
        }))
    }

    fn start_sync(&self) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        state.ensure_online()?;
        state.syncing = true;
        Ok(())
    }

    fn stop_sync(&self) {
        lock(&self.state).syncing = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
