//! Repository for the `planets` collection.

use orrery_core::record::planet_from_document;
use orrery_core::{Document, Planet};
use serde_json::Value;

use crate::error::StoreError;
use crate::query::Query;
use crate::store::Store;

/// Collection holding planet documents.
pub const COLLECTION: &str = "planets";

/// Fields rewritten by [`PlanetRepo::update`]. Identity fields are never
/// part of an update.
const UPDATE_FIELDS: [&str; 6] = [
    "hasRings",
    "isArchived",
    "mainAtmosphere",
    "name",
    "orderFromSun",
    "surfaceTemperatureC",
];

/// Provides the queries and writes used for planets.
pub struct PlanetRepo;

impl PlanetRepo {
    /// Non-archived planets; the sync subscription query.
    pub fn active() -> Query {
        Query::collection(COLLECTION).filter_eq("isArchived", false)
    }

    /// Non-archived planets ordered by distance from the sun; the observer query.
    pub fn active_by_order() -> Query {
        Self::active().order_by("orderFromSun")
    }

    pub fn by_planet_id(planet_id: &str) -> Query {
        Query::collection(COLLECTION).filter_eq("planetId", planet_id)
    }

    /// Insert a full planet document.
    pub async fn insert(store: &dyn Store, planet: &Planet) -> Result<(), StoreError> {
        store.insert(COLLECTION, planet.to_document()).await
    }

    /// Rewrite the mutable fields of the planet with the same `planet_id`.
    ///
    /// Returns the number of documents updated.
    pub async fn update(store: &dyn Store, planet: &Planet) -> Result<usize, StoreError> {
        let mut doc = planet.to_document();
        let assignments: Document = UPDATE_FIELDS
            .iter()
            .filter_map(|field| doc.remove(*field).map(|v| (field.to_string(), v)))
            .collect();
        store
            .update(&Self::by_planet_id(&planet.planet_id), assignments)
            .await
    }

    /// Set `isArchived = true` on the planet with `planet_id`.
    ///
    /// Returns the number of documents updated.
    pub async fn archive(store: &dyn Store, planet_id: &str) -> Result<usize, StoreError> {
        let mut assignments = Document::new();
        assignments.insert("isArchived".into(), Value::Bool(true));
        store
            .update(&Self::by_planet_id(planet_id), assignments)
            .await
    }

    /// One-shot read of the active planets, ordered.
    pub async fn list_active(store: &dyn Store) -> Result<Vec<Planet>, StoreError> {
        let docs = store.select(&Self::active_by_order()).await?;
        Ok(Self::decode_all(docs))
    }

    /// Decode a result set, skipping and logging documents that do not
    /// decode. Order is preserved.
    pub fn decode_all(docs: Vec<Document>) -> Vec<Planet> {
        docs.iter()
            .filter_map(|doc| match planet_from_document(doc) {
                Ok(planet) => Some(planet),
                Err(e) => {
                    let id = doc.get("_id").and_then(Value::as_str).unwrap_or("<none>");
                    tracing::warn!(error = %e, id, "Skipping malformed planet document");
                    None
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
