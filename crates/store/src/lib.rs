//! Orrery storage and sync boundary.
//!
//! - [`Store`]: the live-query/sync engine the application talks to. The
//!   real engine is an external SDK; [`MemoryStore`] implements the same
//!   contract in process for tests and offline runs.
//! - [`PlanetRepo`]: the queries issued against the `planets` collection.
//! - [`PlanetService`]: the explicitly owned service the view-models use,
//!   including the [`PlanetStream`] live snapshot stream.

pub mod error;
pub mod memory;
pub mod query;
pub mod repositories;
pub mod service;
pub mod store;
pub mod stream;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use query::Query;
pub use repositories::PlanetRepo;
pub use service::{PlanetService, ServiceError};
pub use store::{ObserverCallback, ObserverHandle, Store, SyncSubscription};
pub use stream::PlanetStream;
