//! Planet editor form state machine.
//!
//! The form mirrors a [`Planet`] as editable fields. It is either in
//! [`EditorMode::Empty`] (saving creates a new planet) or
//! [`EditorMode::Editing`] (saving replaces the original planet, keeping its
//! identity). The form performs no I/O: [`EditorForm::prepare_save`] returns
//! a [`SaveAction`] that the caller hands to the planet service.

use uuid::Uuid;
use validator::Validate;

use crate::error::CoreError;
use crate::planet::{Planet, Temperature};

/// Whether the form is backed by an existing record.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditorMode {
    /// No backing record; saving adds a new planet.
    #[default]
    Empty,
    /// Backed by the given planet; saving updates it.
    Editing(Planet),
}

/// The store operation a save resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveAction {
    Add(Planet),
    Update(Planet),
}

impl SaveAction {
    pub fn planet(&self) -> &Planet {
        match self {
            Self::Add(planet) | Self::Update(planet) => planet,
        }
    }

    pub fn into_planet(self) -> Planet {
        match self {
            Self::Add(planet) | Self::Update(planet) => planet,
        }
    }
}

/// Fields checked before a save is allowed.
#[derive(Debug, Validate)]
struct PlanetDraft {
    #[validate(length(min = 1, message = "name must not be empty"))]
    name: String,
    #[validate(range(min = 1, message = "orderFromSun must be at least 1"))]
    order_from_sun: i32,
}

/// Editable planet fields plus the mode they were initialized in.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorForm {
    mode: EditorMode,
    pub name: String,
    pub order_from_sun: i32,
    pub has_rings: bool,
    /// Comma separated gases, e.g. `"N2, O2"`.
    pub atmosphere: String,
    pub max_temp: Option<f64>,
    pub mean_temp: f64,
    pub min_temp: Option<f64>,
}

impl Default for EditorForm {
    fn default() -> Self {
        Self {
            mode: EditorMode::Empty,
            name: String::new(),
            order_from_sun: 1,
            has_rings: false,
            atmosphere: String::new(),
            max_temp: None,
            mean_temp: 0.0,
            min_temp: None,
        }
    }
}

impl EditorForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form already initialized from `planet` (or empty for `None`).
    pub fn for_planet(planet: Option<Planet>) -> Self {
        let mut form = Self::default();
        form.initialize(planet);
        form
    }

    /// Reset the form to create mode, or load an existing planet for editing.
    pub fn initialize(&mut self, planet: Option<Planet>) {
        match planet {
            None => *self = Self::default(),
            Some(planet) => {
                self.name = planet.name.clone();
                self.order_from_sun = planet.order_from_sun;
                self.has_rings = planet.has_rings;
                self.atmosphere = join_atmosphere(&planet.main_atmosphere);
                self.max_temp = planet.surface_temperature_c.max;
                self.mean_temp = planet.surface_temperature_c.mean;
                self.min_temp = planet.surface_temperature_c.min;
                self.mode = EditorMode::Editing(planet);
            }
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditorMode::Editing(_))
    }

    /// Screen title for the current mode.
    pub fn title(&self) -> &'static str {
        match self.mode {
            EditorMode::Empty => "Add Planet",
            EditorMode::Editing(_) => "Edit Planet",
        }
    }

    /// Whether the save action should be enabled.
    pub fn can_save(&self) -> bool {
        !self.name.trim().is_empty()
    }

    // -- text field setters --------------------------------------------------

    pub fn set_order_from_sun_text(&mut self, text: &str) -> Result<(), CoreError> {
        let trimmed = text.trim();
        self.order_from_sun = trimmed.parse().map_err(|_| {
            CoreError::Validation(format!("orderFromSun `{trimmed}` is not a whole number"))
        })?;
        Ok(())
    }

    /// Empty text clears the maximum.
    pub fn set_max_temp_text(&mut self, text: &str) -> Result<(), CoreError> {
        self.max_temp = parse_optional_celsius("max", text)?;
        Ok(())
    }

    /// Empty text resets the mean to `0.0`.
    pub fn set_mean_temp_text(&mut self, text: &str) -> Result<(), CoreError> {
        self.mean_temp = parse_optional_celsius("mean", text)?.unwrap_or(0.0);
        Ok(())
    }

    /// Empty text clears the minimum.
    pub fn set_min_temp_text(&mut self, text: &str) -> Result<(), CoreError> {
        self.min_temp = parse_optional_celsius("min", text)?;
        Ok(())
    }

    // -- save ----------------------------------------------------------------

    /// Validate the fields and build the planet to persist.
    ///
    /// In create mode a fresh UUID becomes both `id` and `planet_id`. In edit
    /// mode the original identity is kept. Either way the result is not
    /// archived. The form itself is left untouched.
    pub fn prepare_save(&self) -> Result<SaveAction, CoreError> {
        let draft = PlanetDraft {
            name: self.name.trim().to_string(),
            order_from_sun: self.order_from_sun,
        };
        draft
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let (id, planet_id) = match &self.mode {
            EditorMode::Empty => {
                let id = Uuid::new_v4().to_string();
                (id.clone(), id)
            }
            EditorMode::Editing(original) => (original.id.clone(), original.planet_id.clone()),
        };

        let planet = Planet {
            id,
            planet_id,
            name: draft.name,
            order_from_sun: draft.order_from_sun,
            has_rings: self.has_rings,
            main_atmosphere: parse_atmosphere(&self.atmosphere),
            is_archived: false,
            surface_temperature_c: Temperature::new(self.max_temp, self.mean_temp, self.min_temp),
        };

        Ok(match self.mode {
            EditorMode::Empty => SaveAction::Add(planet),
            EditorMode::Editing(_) => SaveAction::Update(planet),
        })
    }
}

/// Split a comma separated list, trimming whitespace and dropping empty entries.
pub fn parse_atmosphere(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn join_atmosphere(gases: &[String]) -> String {
    gases.join(", ")
}

fn parse_optional_celsius(field: &str, text: &str) -> Result<Option<f64>, CoreError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(CoreError::Validation(format!(
            "{field} temperature `{trimmed}` is not a number"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn mars() -> Planet {
        Planet {
            id: "mars-id".into(),
            planet_id: "mars-pid".into(),
            name: "Mars".into(),
            order_from_sun: 4,
            has_rings: false,
            main_atmosphere: vec!["CO2".into(), "N2".into(), "Ar".into()],
            is_archived: false,
            surface_temperature_c: Temperature::new(Some(20.0), -63.0, Some(-143.0)),
        }
    }

    #[test]
    fn new_form_has_defaults() {
        let form = EditorForm::new();
        assert_eq!(form.mode(), &EditorMode::Empty);
        assert_eq!(form.name, "");
        assert_eq!(form.order_from_sun, 1);
        assert!(!form.has_rings);
        assert_eq!(form.atmosphere, "");
        assert_eq!(form.max_temp, None);
        assert_eq!(form.mean_temp, 0.0);
        assert_eq!(form.min_temp, None);
        assert_eq!(form.title(), "Add Planet");
    }

    #[test]
    fn initialize_with_planet_populates_fields() {
        let form = EditorForm::for_planet(Some(mars()));
        assert!(form.is_editing());
        assert_eq!(form.name, "Mars");
        assert_eq!(form.order_from_sun, 4);
        assert_eq!(form.atmosphere, "CO2, N2, Ar");
        assert_eq!(form.max_temp, Some(20.0));
        assert_eq!(form.mean_temp, -63.0);
        assert_eq!(form.min_temp, Some(-143.0));
        assert_eq!(form.title(), "Edit Planet");
    }

    #[test]
    fn initialize_none_resets_an_edited_form() {
        let mut form = EditorForm::for_planet(Some(mars()));
        form.initialize(None);
        assert_eq!(form, EditorForm::default());
    }

    #[test]
    fn create_mode_save_assigns_fresh_identity() {
        let mut form = EditorForm::new();
        form.name = "Earth".into();
        form.order_from_sun = 3;
        form.atmosphere = "N2, O2".into();

        let action = form.prepare_save().expect("save should be allowed");
        let planet = assert_matches!(action, SaveAction::Add(p) => p);
        assert_eq!(planet.main_atmosphere, vec!["N2", "O2"]);
        assert_eq!(planet.id, planet.planet_id);
        assert!(Uuid::parse_str(&planet.id).is_ok());
        assert!(!planet.is_archived);
        assert_eq!(planet.name, "Earth");
        assert_eq!(planet.order_from_sun, 3);

        let second = form.prepare_save().unwrap().into_planet();
        assert_ne!(second.id, planet.id);
    }

    #[test]
    fn edit_mode_save_keeps_identity() {
        let mut archived = mars();
        archived.is_archived = true;
        let mut form = EditorForm::for_planet(Some(archived));
        form.name = "Red Planet".into();
        form.has_rings = true;

        let planet = assert_matches!(form.prepare_save(), Ok(SaveAction::Update(p)) => p);
        assert_eq!(planet.id, "mars-id");
        assert_eq!(planet.planet_id, "mars-pid");
        assert_eq!(planet.name, "Red Planet");
        assert!(planet.has_rings);
        assert!(!planet.is_archived);
        assert_eq!(planet.main_atmosphere, vec!["CO2", "N2", "Ar"]);
    }

    #[test]
    fn save_rejects_blank_name() {
        let mut form = EditorForm::new();
        form.name = "   ".into();
        assert!(!form.can_save());
        assert_matches!(form.prepare_save(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn save_rejects_order_below_one() {
        let mut form = EditorForm::new();
        form.name = "Vulcan".into();
        form.order_from_sun = 0;
        assert_matches!(form.prepare_save(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn save_trims_name() {
        let mut form = EditorForm::new();
        form.name = "  Venus ".into();
        assert_eq!(form.prepare_save().unwrap().planet().name, "Venus");
    }

    #[test]
    fn atmosphere_parsing_drops_empty_segments() {
        assert_eq!(parse_atmosphere(" N2 ,, O2,  ,Ar "), vec!["N2", "O2", "Ar"]);
        assert!(parse_atmosphere("").is_empty());
        assert!(parse_atmosphere(" , ,").is_empty());
    }

    #[test]
    fn numeric_text_setters_parse_or_keep_previous_value() {
        let mut form = EditorForm::new();
        form.set_order_from_sun_text(" 5 ").unwrap();
        assert_eq!(form.order_from_sun, 5);
        assert_matches!(form.set_order_from_sun_text("five"), Err(CoreError::Validation(_)));
        assert_eq!(form.order_from_sun, 5);

        form.set_max_temp_text("470").unwrap();
        form.set_mean_temp_text("464.5").unwrap();
        form.set_min_temp_text("-12").unwrap();
        assert_eq!(form.max_temp, Some(470.0));
        assert_eq!(form.mean_temp, 464.5);
        assert_eq!(form.min_temp, Some(-12.0));

        assert!(form.set_max_temp_text("hot").is_err());
        assert!(form.set_min_temp_text("NaN").is_err());
        assert_eq!(form.max_temp, Some(470.0));
        assert_eq!(form.min_temp, Some(-12.0));

        form.set_max_temp_text("").unwrap();
        form.set_mean_temp_text("  ").unwrap();
        assert_eq!(form.max_temp, None);
        assert_eq!(form.mean_temp, 0.0);
    }
}
