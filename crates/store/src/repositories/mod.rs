//! Query builders and operations per collection.

pub mod planet_repo;

pub use planet_repo::PlanetRepo;
