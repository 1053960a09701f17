//! Planets list screen.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{future, StreamExt};
use orrery_core::Planet;
use orrery_events::{ErrorReporter, PlanetList, Snapshot, Subscription};
use orrery_store::PlanetService;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Running feed task and the token that stops it.
struct Feed {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct PlanetsListViewModel {
    service: Arc<PlanetService>,
    planets: Arc<PlanetList>,
    errors: Arc<ErrorReporter>,
    feed: Mutex<Option<Feed>>,
}

impl PlanetsListViewModel {
    pub fn new(
        service: Arc<PlanetService>,
        planets: Arc<PlanetList>,
        errors: Arc<ErrorReporter>,
    ) -> Self {
        Self {
            service,
            planets,
            errors,
            feed: Mutex::new(None),
        }
    }

    fn feed(&self) -> MutexGuard<'_, Option<Feed>> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start feeding live snapshots into the planet list.
    ///
    /// Must be called from within a tokio runtime. No-op if already running.
    pub fn start(&self) {
        let mut feed = self.feed();
        if feed.as_ref().is_some_and(|f| !f.handle.is_finished()) {
            return;
        }

        let errors = Arc::clone(&self.errors);
        let snapshots = self.service.planets().filter_map(move |item| {
            future::ready(match item {
                Ok(planets) => Some(planets),
                Err(e) => {
                    errors.report(format!("Failed to load planets: {e}"));
                    None
                }
            })
        });

        let cancel = CancellationToken::new();
        let planets = Arc::clone(&self.planets);
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            planets.run(snapshots, token).await;
        });

        tracing::debug!("Planets list feed started");
        *feed = Some(Feed { cancel, handle });
    }

    /// Stop the feed and release its live query. Idempotent.
    pub async fn stop(&self) {
        let feed = self.feed().take();
        let Some(feed) = feed else {
            return;
        };
        feed.cancel.cancel();
        if let Err(e) = feed.handle.await {
            tracing::warn!(error = %e, "Planets list feed task failed");
        }
        tracing::debug!("Planets list feed stopped");
    }

    pub fn is_running(&self) -> bool {
        self.feed()
            .as_ref()
            .is_some_and(|f| !f.handle.is_finished())
    }

    /// Current snapshot of active planets.
    pub fn planets(&self) -> Snapshot {
        self.planets.snapshot()
    }

    /// Render hook: `callback` gets the current snapshot now and every new one
    /// after.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Planet]) + Send + Sync + 'static,
    {
        self.planets.subscribe(callback)
    }

    /// Archive the planet with `planet_id`.
    ///
    /// The list is not touched here; the planet disappears when the live
    /// query delivers the next snapshot. Returns whether the archive
    /// succeeded.
    pub async fn archive(&self, planet_id: &str) -> bool {
        match self.service.archive_planet(planet_id).await {
            Ok(()) => true,
            Err(e) => {
                self.errors
                    .report(format!("Failed to archive planet: {e}"));
                false
            }
        }
    }
}

impl Drop for PlanetsListViewModel {
    /// Cancels a running feed. The task exits on its own and releases the
    /// live query when it drops the stream.
    fn drop(&mut self) {
        let feed = self
            .feed
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(feed) = feed {
            feed.cancel.cancel();
            tracing::debug!("Planets list dropped, feed cancelled");
        }
    }
}
