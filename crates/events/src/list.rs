//! Reactive list of active planets.
//!
//! [`PlanetList`] holds one immutable [`Snapshot`] at a time. A snapshot is
//! always replaced wholesale, never patched, and every subscriber sees each
//! replacement exactly once. The container does not sort; snapshots keep the
//! order the producer emitted.
//!
//! Snapshots are expected from a single producer. [`PlanetList::run`] is the
//! usual producer: it drains a stream coming from the sync layer and applies
//! each item on the task that called it, so subscribers are always notified
//! from the consumer's context rather than from the store's callback thread.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::{Stream, StreamExt};
use orrery_core::Planet;
use tokio_util::sync::CancellationToken;

/// An immutable, cheaply clonable list of planets.
pub type Snapshot = Arc<[Planet]>;

type Callback = Box<dyn Fn(&[Planet]) + Send + Sync>;

/// A subscriber's callback, cleared on dispose. Locked for the duration of
/// every invocation, so dispose waits for an in-flight call to finish.
type Slot = Arc<Mutex<Option<Callback>>>;

fn lock_slot(slot: &Slot) -> MutexGuard<'_, Option<Callback>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn invoke(slot: &Slot, planets: &[Planet]) {
    if let Some(callback) = lock_slot(slot).as_ref() {
        callback(planets);
    }
}

#[derive(Default)]
struct Registry {
    snapshot: Option<Snapshot>,
    next_id: u64,
    subscribers: BTreeMap<u64, Slot>,
}

struct Inner {
    registry: Mutex<Registry>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// PlanetList
// ---------------------------------------------------------------------------

/// Observable snapshot of the non-archived planets.
///
/// Designed to be shared via `Arc<PlanetList>` between the task that feeds
/// it and the view-models that read it.
pub struct PlanetList {
    inner: Arc<Inner>,
}

impl PlanetList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        current(&self.inner.lock())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().snapshot.as_ref().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Swap in a new snapshot and notify every current subscriber with it.
    ///
    /// Subscribers are called after the swap completes and outside the
    /// internal lock, so a callback may read [`snapshot`](Self::snapshot).
    pub fn replace(&self, planets: Vec<Planet>) {
        let snapshot: Snapshot = planets.into();

        let targets: Vec<Slot> = {
            let mut registry = self.inner.lock();
            registry.snapshot = Some(Arc::clone(&snapshot));
            registry.subscribers.values().map(Arc::clone).collect()
        };

        tracing::trace!(
            planets = snapshot.len(),
            subscribers = targets.len(),
            "Planet snapshot replaced"
        );

        for slot in &targets {
            invoke(slot, &snapshot);
        }
    }

    /// Register `callback` for snapshot changes.
    ///
    /// The callback runs once immediately with the current snapshot, then
    /// after every [`replace`](Self::replace) until the returned
    /// [`Subscription`] is disposed or dropped. A callback must not dispose
    /// its own subscription.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Planet]) + Send + Sync + 'static,
    {
        let callback: Callback = Box::new(callback);
        let slot: Slot = Arc::new(Mutex::new(Some(callback)));

        let (id, snapshot) = {
            let mut registry = self.inner.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.subscribers.insert(id, Arc::clone(&slot));
            (id, current(&registry))
        };

        invoke(&slot, &snapshot);

        Subscription {
            id,
            active: AtomicBool::new(true),
            slot,
            list: Arc::downgrade(&self.inner),
        }
    }

    /// Apply every snapshot from `snapshots` until the stream ends or
    /// `cancel` fires.
    ///
    /// Dropping the stream on exit releases whatever live query backs it.
    pub async fn run<S>(&self, snapshots: S, cancel: CancellationToken)
    where
        S: Stream<Item = Vec<Planet>>,
    {
        let mut snapshots = std::pin::pin!(snapshots);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Planet list feed cancelled");
                    break;
                }
                next = snapshots.next() => match next {
                    Some(planets) => self.replace(planets),
                    None => {
                        tracing::debug!("Planet list feed ended");
                        break;
                    }
                },
            }
        }
    }
}

impl Default for PlanetList {
    fn default() -> Self {
        Self::new()
    }
}

fn current(registry: &Registry) -> Snapshot {
    registry
        .snapshot
        .clone()
        .unwrap_or_else(|| Arc::from(Vec::new()))
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Handle for a [`PlanetList::subscribe`] registration.
///
/// Disposing is idempotent and also happens on drop. Once `dispose`
/// returns, the callback is not running and is never invoked again.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    active: AtomicBool,
    slot: Slot,
    list: Weak<Inner>,
}

impl Subscription {
    pub fn dispose(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(inner) = self.list.upgrade() {
            inner.lock().subscribers.remove(&self.id);
        }
        lock_slot(&self.slot).take();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
