//! Planet editor screen.

use std::sync::Arc;

use orrery_core::{EditorForm, Planet, SaveAction};
use orrery_events::ErrorReporter;
use orrery_store::{PlanetService, ServiceError};

pub struct PlanetEditorViewModel {
    service: Arc<PlanetService>,
    errors: Arc<ErrorReporter>,
    form: EditorForm,
}

impl PlanetEditorViewModel {
    pub fn new(service: Arc<PlanetService>, errors: Arc<ErrorReporter>) -> Self {
        Self {
            service,
            errors,
            form: EditorForm::new(),
        }
    }

    /// Switch to create mode (`None`) or edit mode for `planet`.
    pub fn initialize(&mut self, planet: Option<Planet>) {
        self.form.initialize(planet);
    }

    pub fn form(&self) -> &EditorForm {
        &self.form
    }

    /// Field access for UI bindings.
    pub fn form_mut(&mut self) -> &mut EditorForm {
        &mut self.form
    }

    /// Add or update the planet described by the form.
    ///
    /// Failures are reported and the form keeps its values. Returns whether
    /// the save succeeded.
    pub async fn save(&self) -> bool {
        match self.try_save().await {
            Ok(planet) => {
                tracing::debug!(planet_id = %planet.planet_id, "Planet saved from editor");
                true
            }
            Err(e) => {
                self.errors.report(format!("Failed to save planet: {e}"));
                false
            }
        }
    }

    async fn try_save(&self) -> Result<Planet, ServiceError> {
        let action = self.form.prepare_save()?;
        match &action {
            SaveAction::Add(planet) => self.service.add_planet(planet).await?,
            SaveAction::Update(planet) => self.service.update_planet(planet).await?,
        }
        Ok(action.into_planet())
    }
}
