use std::sync::Arc;

use orrery_core::Planet;
use orrery_events::{ErrorReporter, PlanetList};
use orrery_store::{PlanetService, Store};

use crate::config::AppConfig;
use crate::viewmodels::{PlanetEditorViewModel, PlanetsListViewModel};

/// Shared application state, built once by the entry point and handed to
/// every view-model.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Sync endpoint configuration.
    pub config: Arc<AppConfig>,
    /// Planet service over the configured store. Lifecycle is owned by the
    /// entry point (`init` at startup, `dispose` at shutdown).
    pub service: Arc<PlanetService>,
    /// Current snapshot of active planets.
    pub planets: Arc<PlanetList>,
    /// Most recent user-facing error.
    pub errors: Arc<ErrorReporter>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(PlanetService::new(store)),
            planets: Arc::new(PlanetList::new()),
            errors: Arc::new(ErrorReporter::new()),
        }
    }

    pub fn planets_list_view_model(&self) -> PlanetsListViewModel {
        PlanetsListViewModel::new(
            Arc::clone(&self.service),
            Arc::clone(&self.planets),
            Arc::clone(&self.errors),
        )
    }

    /// Editor for `planet`, or for a new planet when `None`.
    pub fn planet_editor_view_model(&self, planet: Option<Planet>) -> PlanetEditorViewModel {
        let mut editor =
            PlanetEditorViewModel::new(Arc::clone(&self.service), Arc::clone(&self.errors));
        editor.initialize(planet);
        editor
    }
}
