//! Integration tests for `PlanetService` over the in-memory store.
//!
//! Covers the service lifecycle, add/update/archive round trips through the
//! store, and the live `PlanetStream`: laziness, ordering, archived planets
//! dropping out, malformed documents being skipped, and observer release on
//! drop.

use std::sync::Arc;

use assert_matches::assert_matches;
use futures::StreamExt;
use orrery_core::{Planet, Temperature};
use orrery_store::repositories::planet_repo::COLLECTION;
use orrery_store::{MemoryStore, PlanetService, ServiceError, StoreError};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn planet(id: &str, name: &str, order: i32) -> Planet {
    Planet {
        id: id.into(),
        planet_id: id.into(),
        name: name.into(),
        order_from_sun: order,
        has_rings: false,
        main_atmosphere: vec!["N2".into()],
        is_archived: false,
        surface_temperature_c: Temperature::new(None, 15.0, None),
    }
}

fn setup() -> (Arc<MemoryStore>, PlanetService) {
    let store = Arc::new(MemoryStore::new());
    let service = PlanetService::new(store.clone());
    (store, service)
}

fn names(planets: &[Planet]) -> Vec<&str> {
    planets.iter().map(|p| p.name.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn init_and_dispose_are_idempotent() {
    let (store, service) = setup();

    service.init().unwrap();
    service.init().unwrap();
    assert!(service.is_initialized());
    assert!(store.is_syncing());
    assert_eq!(store.subscription_count(), 1);

    service.dispose();
    service.dispose();
    assert!(!service.is_initialized());
    assert!(!store.is_syncing());
    assert_eq!(store.subscription_count(), 0);
}

#[test]
fn init_fails_when_store_is_unavailable() {
    let (store, service) = setup();
    store.set_offline(true);
    assert_matches!(
        service.init(),
        Err(ServiceError::Store(StoreError::Unavailable(_)))
    );
    assert!(!service.is_initialized());
    assert_eq!(store.subscription_count(), 0);
}

#[test]
fn dropping_service_stops_sync() {
    let (store, service) = setup();
    service.init().unwrap();
    drop(service);
    assert!(!store.is_syncing());
    assert_eq!(store.subscription_count(), 0);
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_update_and_archive_round_trip() {
    let (store, service) = setup();
    let mut earth = planet("e1", "Earth", 3);
    service.add_planet(&earth).await.unwrap();
    service.add_planet(&planet("m1", "Mercury", 1)).await.unwrap();

    assert_eq!(names(&service.list_planets().await.unwrap()), vec!["Mercury", "Earth"]);

    earth.name = "Terra".into();
    earth.main_atmosphere = vec!["N2".into(), "O2".into()];
    service.update_planet(&earth).await.unwrap();
    let listed = service.list_planets().await.unwrap();
    assert_eq!(listed[1], earth);

    service.archive_planet("e1").await.unwrap();
    assert_eq!(names(&service.list_planets().await.unwrap()), vec!["Mercury"]);

    // Archived, not deleted.
    let stored = store.documents(COLLECTION);
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["isArchived"], true);
}

#[tokio::test]
async fn update_never_touches_identity() {
    let (store, service) = setup();
    service.add_planet(&planet("e1", "Earth", 3)).await.unwrap();

    let mut changed = planet("e1", "Earth", 3);
    changed.id = "something-else".into();
    service.update_planet(&changed).await.unwrap();

    assert_eq!(store.documents(COLLECTION)[0]["_id"], "e1");
}

#[tokio::test]
async fn unknown_planet_is_not_found() {
    let (_store, service) = setup();
    assert_matches!(
        service.archive_planet("missing").await,
        Err(ServiceError::NotFound { planet_id }) if planet_id == "missing"
    );
    assert_matches!(
        service.update_planet(&planet("missing", "Nowhere", 1)).await,
        Err(ServiceError::NotFound { .. })
    );
}

#[tokio::test]
async fn writes_fail_while_offline() {
    let (store, service) = setup();
    service.add_planet(&planet("e1", "Earth", 3)).await.unwrap();
    store.set_offline(true);

    assert_matches!(
        service.add_planet(&planet("v1", "Venus", 2)).await,
        Err(ServiceError::Store(StoreError::Unavailable(_)))
    );
    assert_matches!(
        service.archive_planet("e1").await,
        Err(ServiceError::Store(StoreError::Unavailable(_)))
    );
}

// ---------------------------------------------------------------------------
// PlanetStream
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stream_is_lazy_and_closes_observer_on_drop() {
    let (store, service) = setup();
    let mut stream = service.planets();
    assert_eq!(store.observer_count(), 0);
    assert!(!stream.is_live());

    let first = stream.next().await.expect("item").expect("snapshot");
    assert!(first.is_empty());
    assert!(stream.is_live());
    assert_eq!(store.observer_count(), 1);

    drop(stream);
    assert_eq!(store.observer_count(), 0);
}

#[tokio::test]
async fn stream_emits_ordered_active_snapshots() {
    let (_store, service) = setup();
    let mut stream = service.planets();
    assert!(stream.next().await.unwrap().unwrap().is_empty());

    service.add_planet(&planet("j1", "Jupiter", 5)).await.unwrap();
    service.add_planet(&planet("v1", "Venus", 2)).await.unwrap();
    service.archive_planet("j1").await.unwrap();

    let snapshots: Vec<Vec<Planet>> = vec![
        stream.next().await.unwrap().unwrap(),
        stream.next().await.unwrap().unwrap(),
        stream.next().await.unwrap().unwrap(),
    ];
    assert_eq!(names(&snapshots[0]), vec!["Jupiter"]);
    assert_eq!(names(&snapshots[1]), vec!["Venus", "Jupiter"]);
    assert_eq!(names(&snapshots[2]), vec!["Venus"]);
}

#[tokio::test]
async fn stream_skips_malformed_documents() {
    let (store, service) = setup();
    store
        .seed(
            COLLECTION,
            [
                planet("e1", "Earth", 3).to_document(),
                json!({"_id": "bad", "planetId": "bad", "isArchived": false, "orderFromSun": 2})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ],
        )
        .unwrap();

    let snapshot = service.planets().next().await.unwrap().unwrap();
    assert_eq!(names(&snapshot), vec!["Earth"]);
}

#[tokio::test]
async fn each_call_gets_an_independent_stream() {
    let (store, service) = setup();
    let mut a = service.planets();
    let mut b = service.planets();
    a.next().await.unwrap().unwrap();
    b.next().await.unwrap().unwrap();
    assert_eq!(store.observer_count(), 2);

    drop(a);
    assert_eq!(store.observer_count(), 1);

    service.add_planet(&planet("e1", "Earth", 3)).await.unwrap();
    assert_eq!(names(&b.next().await.unwrap().unwrap()), vec!["Earth"]);
}

#[tokio::test]
async fn stream_reports_registration_failure_then_ends() {
    let (store, service) = setup();
    store.set_offline(true);
    let mut stream = service.planets();
    assert_matches!(
        stream.next().await,
        Some(Err(ServiceError::Store(StoreError::Unavailable(_))))
    );
    assert!(stream.next().await.is_none());
}
