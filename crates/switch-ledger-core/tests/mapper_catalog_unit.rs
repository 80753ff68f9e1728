// crates/switch-ledger-core/tests/mapper_catalog_unit.rs
// ============================================================================
// Module: Mapper and Catalog Unit Tests
// Description: Targeted tests for identity mapping and the sensor catalog.
// Purpose: Validate exactly-once alias assignment and the two-row sensor
//          layout with readings and location queries.
// ============================================================================

//! ## Overview
//! Unit-level tests for the supplemental stores:
//! - Alias assignment is stable across repeated and concurrent lookups
//! - Sensor registration is atomic and rejects duplicate identifiers
//! - Latest-readings queries return the sensor plus newest readings
//! - Location queries narrow from city to building to floor

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use switch_ledger_core::CatalogError;
use switch_ledger_core::ExternalId;
use switch_ledger_core::IdentityMapper;
use switch_ledger_core::Location;
use switch_ledger_core::MemoryBackend;
use switch_ledger_core::Reading;
use switch_ledger_core::Sensor;
use switch_ledger_core::SensorCatalog;
use switch_ledger_core::SensorId;
use switch_ledger_core::StoreContext;
use time::macros::datetime;

/// Sensor fixture placed in Poznan.
fn sensor(id: &str, building: &str, floor: &str, room: &str) -> Sensor {
    Sensor {
        id: SensorId::from(id),
        city: "Poznan".to_string(),
        building: building.to_string(),
        floor: floor.to_string(),
        room: room.to_string(),
    }
}

/// Reading fixture offset in seconds from a fixed base.
fn reading(sensor_id: &str, value: &str, offset_secs: u64) -> Reading {
    let base = datetime!(2026-08-27 10:00:00 UTC);
    Reading {
        sensor_id: SensorId::from(sensor_id),
        value: value.to_string(),
        read_at: (base + Duration::from_secs(offset_secs)).into(),
    }
}

#[test]
fn alias_is_stable_across_lookups() {
    let mapper = IdentityMapper::new(MemoryBackend::new());
    let ctx = StoreContext::unbounded();
    let external = ExternalId::from("user@example.com");

    let first = mapper.alias_for(&ctx, &external).unwrap();
    let second = mapper.alias_for(&ctx, &external).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.as_str().len(), 32);
    assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn distinct_externals_get_distinct_aliases() {
    let mapper = IdentityMapper::new(MemoryBackend::new());
    let ctx = StoreContext::unbounded();

    let a = mapper.alias_for(&ctx, &ExternalId::from("a@example.com")).unwrap();
    let b = mapper.alias_for(&ctx, &ExternalId::from("b@example.com")).unwrap();
    assert_ne!(a, b);
}

#[test]
fn concurrent_first_lookups_agree_on_one_alias() {
    let backend = Arc::new(MemoryBackend::new());
    let external = ExternalId::from("raced@example.com");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let backend = Arc::clone(&backend);
        let external = external.clone();
        handles.push(thread::spawn(move || {
            let mapper = IdentityMapper::new(backend);
            mapper.alias_for(&StoreContext::unbounded(), &external).unwrap()
        }));
    }
    let aliases: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    assert!(aliases.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn register_then_get_round_trips() {
    let catalog = SensorCatalog::new(MemoryBackend::new());
    let ctx = StoreContext::unbounded();
    let registered = sensor("s1", "b1", "f2", "r3");

    catalog.register(&ctx, &registered).unwrap();
    assert_eq!(catalog.get(&ctx, &registered.id).unwrap(), registered);
}

#[test]
fn duplicate_registration_is_rejected_atomically() {
    let catalog = SensorCatalog::new(MemoryBackend::new());
    let ctx = StoreContext::unbounded();

    catalog.register(&ctx, &sensor("s1", "b1", "f1", "r1")).unwrap();
    let err = catalog.register(&ctx, &sensor("s1", "b9", "f9", "r9")).unwrap_err();
    assert!(matches!(err, CatalogError::AlreadyRegistered { .. }));

    // The losing registration must not have moved the location index either.
    let at_b9 = catalog
        .sensors_at(&ctx, &Location {
            city: "Poznan".to_string(),
            building: Some("b9".to_string()),
            floor: None,
        })
        .unwrap();
    assert!(at_b9.is_empty());
}

#[test]
fn unknown_sensor_reports_not_found() {
    let catalog = SensorCatalog::new(MemoryBackend::new());
    let ctx = StoreContext::unbounded();
    let err = catalog.get(&ctx, &SensorId::from("missing")).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[test]
fn latest_readings_returns_sensor_and_newest_first() {
    let catalog = SensorCatalog::new(MemoryBackend::new());
    let ctx = StoreContext::unbounded();
    let registered = sensor("s1", "b1", "f1", "r1");
    catalog.register(&ctx, &registered).unwrap();

    for (value, offset) in [("19.5", 0), ("20.0", 10), ("20.5", 20)] {
        catalog.save_reading(&ctx, &reading("s1", value, offset)).unwrap();
    }

    let (fetched, readings) = catalog.latest_readings(&ctx, &registered.id, 2).unwrap();
    assert_eq!(fetched, registered);
    assert_eq!(readings.len(), 2);
    assert_eq!(readings[0].value, "20.5");
    assert_eq!(readings[1].value, "20.0");
}

#[test]
fn latest_readings_with_no_readings_returns_empty() {
    let catalog = SensorCatalog::new(MemoryBackend::new());
    let ctx = StoreContext::unbounded();
    let registered = sensor("s1", "b1", "f1", "r1");
    catalog.register(&ctx, &registered).unwrap();

    let (fetched, readings) = catalog.latest_readings(&ctx, &registered.id, 5).unwrap();
    assert_eq!(fetched, registered);
    assert!(readings.is_empty());
}

#[test]
fn location_queries_narrow_by_prefix() {
    let catalog = SensorCatalog::new(MemoryBackend::new());
    let ctx = StoreContext::unbounded();
    catalog.register(&ctx, &sensor("s1", "b1", "f1", "r1")).unwrap();
    catalog.register(&ctx, &sensor("s2", "b1", "f2", "r1")).unwrap();
    catalog.register(&ctx, &sensor("s3", "b2", "f1", "r1")).unwrap();

    let city = Location {
        city: "Poznan".to_string(),
        building: None,
        floor: None,
    };
    assert_eq!(catalog.sensors_at(&ctx, &city).unwrap().len(), 3);

    let building = Location {
        building: Some("b1".to_string()),
        ..city.clone()
    };
    let in_b1 = catalog.sensors_at(&ctx, &building).unwrap();
    assert_eq!(in_b1.len(), 2);
    assert!(in_b1.contains(&SensorId::from("s1")));
    assert!(in_b1.contains(&SensorId::from("s2")));

    let floor = Location {
        floor: Some("f2".to_string()),
        ..building
    };
    assert_eq!(catalog.sensors_at(&ctx, &floor).unwrap(), vec![SensorId::from("s2")]);

    let other_city = Location {
        city: "Warsaw".to_string(),
        building: None,
        floor: None,
    };
    assert!(catalog.sensors_at(&ctx, &other_city).unwrap().is_empty());
}
