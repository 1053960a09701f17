//! View-models: UI-facing state plus the actions a screen can trigger.
//!
//! External failures never propagate out of a view-model action. They are
//! handed to the [`ErrorReporter`](orrery_events::ErrorReporter) and the
//! action reports `false`.

pub mod planet_editor;
pub mod planets_list;

pub use planet_editor::PlanetEditorViewModel;
pub use planets_list::PlanetsListViewModel;
