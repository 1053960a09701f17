//! `orrery-app` library crate.
//!
//! Configuration, the explicitly constructed application state, and the
//! view-models a UI binds to. The binary entrypoint lives in `main.rs`.

pub mod config;
pub mod state;
pub mod viewmodels;
