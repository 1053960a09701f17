//! Orrery domain core: the planet model, document decoding and the editor
//! form state machine.
//!
//! This crate has no I/O. The store and service layers live in
//! `orrery-store`; reactive containers live in `orrery-events`.

pub mod editor;
pub mod error;
pub mod planet;
pub mod record;
pub mod types;

pub use editor::{EditorForm, EditorMode, SaveAction};
pub use error::CoreError;
pub use planet::{Planet, Temperature};
pub use record::Document;
