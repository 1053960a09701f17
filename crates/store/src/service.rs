//! Planet service: the application's single entry point to the store.
//!
//! [`PlanetService`] is constructed explicitly and owned by the application
//! entry point, which drives its lifecycle with [`init`](PlanetService::init)
//! and [`dispose`](PlanetService::dispose). View-models receive it by `Arc`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use orrery_core::{CoreError, Planet};

use crate::error::StoreError;
use crate::repositories::PlanetRepo;
use crate::store::{Store, SyncSubscription};
use crate::stream::PlanetStream;

/// A failed call into the store.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Planet not found: {planet_id}")]
    NotFound { planet_id: String },
}

pub struct PlanetService {
    store: Arc<dyn Store>,
    subscription: Mutex<Option<SyncSubscription>>,
}

impl PlanetService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            subscription: Mutex::new(None),
        }
    }

    fn subscription(&self) -> MutexGuard<'_, Option<SyncSubscription>> {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the sync subscription for active planets and start syncing.
    ///
    /// Calling this again while initialized is a no-op.
    pub fn init(&self) -> Result<(), ServiceError> {
        let mut subscription = self.subscription();
        if subscription.is_some() {
            return Ok(());
        }

        let registered = self.store.register_subscription(PlanetRepo::active())?;
        self.store.start_sync()?;
        tracing::info!(query = %registered.query(), "Planet sync started");

        *subscription = Some(registered);
        Ok(())
    }

    /// Cancel the sync subscription and stop syncing. Idempotent.
    pub fn dispose(&self) {
        let Some(mut subscription) = self.subscription().take() else {
            return;
        };
        subscription.cancel();
        self.store.stop_sync();
        tracing::info!("Planet sync stopped");
    }

    pub fn is_initialized(&self) -> bool {
        self.subscription().is_some()
    }

    /// Live snapshots of the active planets, ordered by `orderFromSun`.
    ///
    /// Each call returns an independent stream with its own observer.
    pub fn planets(&self) -> PlanetStream {
        PlanetStream::new(Arc::clone(&self.store), PlanetRepo::active_by_order())
    }

    /// One-shot read of the active planets.
    pub async fn list_planets(&self) -> Result<Vec<Planet>, ServiceError> {
        Ok(PlanetRepo::list_active(self.store.as_ref()).await?)
    }

    pub async fn add_planet(&self, planet: &Planet) -> Result<(), ServiceError> {
        PlanetRepo::insert(self.store.as_ref(), planet).await?;
        tracing::info!(planet_id = %planet.planet_id, name = %planet.name, "Planet added");
        Ok(())
    }

    pub async fn update_planet(&self, planet: &Planet) -> Result<(), ServiceError> {
        let updated = PlanetRepo::update(self.store.as_ref(), planet).await?;
        ensure_found(updated, &planet.planet_id)?;
        tracing::info!(planet_id = %planet.planet_id, name = %planet.name, "Planet updated");
        Ok(())
    }

    pub async fn archive_planet(&self, planet_id: &str) -> Result<(), ServiceError> {
        let updated = PlanetRepo::archive(self.store.as_ref(), planet_id).await?;
        ensure_found(updated, planet_id)?;
        tracing::info!(planet_id, "Planet archived");
        Ok(())
    }
}

impl Drop for PlanetService {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn ensure_found(updated: usize, planet_id: &str) -> Result<(), ServiceError> {
    if updated == 0 {
        return Err(ServiceError::NotFound {
            planet_id: planet_id.to_string(),
        });
    }
    Ok(())
}
