//! Integration tests for `TaxiStore` across entities.

use taxi_core::TaxiError;
use taxi_db::{NewCar, NewDriver, NewManufacturer, TaxiStore};

// ═══════════════════════════════════════════════════════════════════
// 1. Fleet scenario
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_fleet_lifecycle() {
    let store = TaxiStore::memory_migrated().await.unwrap();

    let toyota = store
        .create_manufacturer(NewManufacturer::new("Toyota", "Japan"))
        .await
        .unwrap();
    let bmw = store
        .create_manufacturer(NewManufacturer::new("BMW", "Germany"))
        .await
        .unwrap();

    let alice = store
        .create_driver(
            NewDriver::new("alice", "hash")
                .name("Alice", "Smith")
                .license_number("ALI00001"),
        )
        .await
        .unwrap();
    let bob = store
        .create_driver(
            NewDriver::new("bob", "hash")
                .name("Bob", "Jones")
                .license_number("BOB00002"),
        )
        .await
        .unwrap();

    let corolla = store
        .create_car(NewCar::new("Corolla", toyota.id, vec![alice.id, bob.id]))
        .await
        .unwrap();
    store
        .create_car(NewCar::new("X5", bmw.id, vec![alice.id]))
        .await
        .unwrap();

    let alice_detail = store.get_driver_detail(alice.id).await.unwrap();
    let cars: Vec<String> = alice_detail
        .cars
        .iter()
        .map(|c| format!("{} / {}", c.car, c.manufacturer.name))
        .collect();
    assert_eq!(cars, vec!["Corolla / Toyota", "X5 / BMW"]);

    let corolla_detail = store.get_car(corolla.id).await.unwrap();
    let drivers: Vec<String> = corolla_detail.drivers.iter().map(ToString::to_string).collect();
    assert_eq!(drivers, vec!["alice (Alice Smith)", "bob (Bob Jones)"]);

    assert_eq!(store.count_manufacturers().await.unwrap(), 2);
    assert_eq!(store.count_drivers().await.unwrap(), 2);
    assert_eq!(store.count_cars().await.unwrap(), 2);
}

// ═══════════════════════════════════════════════════════════════════
// 2. Concurrent access through cloned handles
// ═══════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_are_serialized() {
    let store = TaxiStore::memory_migrated().await.unwrap();
    let maker = store
        .create_manufacturer(NewManufacturer::new("Skoda", "Czechia"))
        .await
        .unwrap();
    let maker_id = maker.id;

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let driver = store
                .create_driver(NewDriver::new(format!("driver{i:02}"), "hash"))
                .await?;
            store
                .create_car(NewCar::new(format!("Octavia {i}"), maker_id, vec![driver.id]))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.count_cars().await.unwrap(), 16);
    assert_eq!(store.list_drivers(Some("driver1")).await.unwrap().len(), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_username_only_one_wins() {
    let store = TaxiStore::memory_migrated().await.unwrap();
    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.create_driver(NewDriver::new("same", "hash")).await
        }));
    }
    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(TaxiError::UniqueViolation { field, .. }) => assert_eq!(field, "username"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(ok, 1);
}

// ═══════════════════════════════════════════════════════════════════
// 3. Persistence
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.sqlite3");

    {
        let store = TaxiStore::open(&path).unwrap();
        store.migrate().await.unwrap();
        store
            .create_manufacturer(NewManufacturer::new("Ford", "USA"))
            .await
            .unwrap();
    }

    let store = TaxiStore::open(&path).unwrap();
    assert!(store.migrate().await.unwrap().is_empty());
    let all = store.list_manufacturers(None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].to_string(), "Ford USA");
}
