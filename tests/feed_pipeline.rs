/// Integration tests for the station feed pipeline
///
/// Tests verify:
/// 1. A realistic mixed snapshot (device-written and hand-edited entries)
///    parses into clean readings
/// 2. Alerts are raised on the parsed readings in rule order
/// 3. A simulated cycle produces a document the same parser accepts
/// 4. The catalog file at the repo root matches the built-in tables
///
/// Run with: cargo test --test feed_pipeline

use autoweather_service::alert::{self, AlertSeverity, Locale, MessageKey};
use autoweather_service::components::ComponentCatalog;
use autoweather_service::config::Catalogs;
use autoweather_service::dev_mode::{self, SimulationMode};
use autoweather_service::ingest::snapshot;
use autoweather_service::model::SensorKind;
use autoweather_service::stations::StationTable;

use chrono::{DateTime, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

const SNAPSHOT: &str = r#"{
    "Manila": {
        "stationName": "Manila Weather Station",
        "region": "Metro Manila",
        "municipality": "Manila",
        "temperature": 29.4,
        "humidity": 78,
        "pressure": 1009.5,
        "windSpeed": 30,
        "windDirection": "NE",
        "rainfall": 60,
        "sensorTypes": ["atmosphericPressure", "solarRadiation"],
        "extraSensors": {"atmosphericPressure": 1009.5, "solarRadiation": 640},
        "timestamp": 1754020800000
    },
    "Laguna": {
        "stationName": "Laguna Weather Station",
        "region": "Calabarzon",
        "mainSensors": {
            "temperature": 32.0, "humidity": 90, "rainfall": 0,
            "windVane": "SW", "windSpeed": 4.5
        },
        "sensorTypes": ["soilMoisture"],
        "extraSensors": {"soilMoisture": 55.5, "uvIndex": 9},
        "timestamp": "2025-08-01T12:00:00+08:00",
        "audienceFocus": "farmers"
    },
    "Cavite": {
        "temperature": 25, "humidity": 60, "pressure": 1013,
        "windSpeed": 5, "rainfall": 0
    },
    "Broken": "not a station"
}"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 5, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn test_mixed_snapshot_normalizes() {
    let readings = snapshot::parse_snapshot_at(SNAPSHOT, now()).unwrap();
    let ids: Vec<&str> = readings.iter().map(|r| r.station_id.as_str()).collect();
    assert_eq!(ids, vec!["Cavite", "Laguna", "Manila"]);

    let cavite = &readings[0];
    assert_eq!(cavite.station_name, "Unknown Station");
    assert_eq!(cavite.region, "Unknown");
    assert_eq!(cavite.wind_direction, "N");
    assert_eq!(cavite.timestamp, now());

    let laguna = &readings[1];
    assert_eq!(laguna.temperature, 32.0);
    assert_eq!(laguna.wind_direction, "SW");
    assert_eq!(laguna.pressure, 0.0, "pressure has no mainSensors fallback");
    assert_eq!(laguna.extra_sensors.len(), 1);
    assert_eq!(laguna.extra_sensors[&SensorKind::SoilMoisture], 55.5);
    assert_eq!(laguna.timestamp, Utc.with_ymd_and_hms(2025, 8, 1, 4, 0, 0).unwrap());

    for r in &readings {
        assert!(r.extras_consistent(), "{} has undeclared extras", r.station_id);
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[test]
fn test_alerts_on_parsed_readings() {
    let readings = snapshot::parse_snapshot_at(SNAPSHOT, now()).unwrap();

    // Cavite is calm.
    assert_eq!(alert::classify(&readings[0]), None);

    // Laguna: 32 °C and 90 % humidity.
    let laguna = alert::classify(&readings[1]).unwrap();
    assert_eq!(laguna.message_key, MessageKey::HighHumidity);
    assert_eq!(laguna.severity, AlertSeverity::Warning);

    // Manila: rainfall 60 and wind 30; rainfall is checked first.
    let manila = alert::classify(&readings[2]).unwrap();
    assert_eq!(manila.message_key, MessageKey::HeavyRainfall);
    assert_eq!(manila.severity, AlertSeverity::Warning);
    assert_ne!(manila.message(Locale::Tl), manila.message(Locale::En));
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[test]
fn test_simulated_snapshot_round_trips_through_parser() {
    let observed = snapshot::parse_snapshot_at(SNAPSHOT, now()).unwrap();
    let stations = dev_mode::stations_from_readings(&observed);

    let mut rng = StdRng::seed_from_u64(2024);
    let cycle = SimulationMode::new().cycle_at(&stations, &mut rng, now());
    let body = serde_json::to_string(&cycle.document).unwrap();
    let reparsed = snapshot::parse_snapshot_at(&body, now()).unwrap();

    assert_eq!(reparsed.len(), observed.len());
    for (before, after) in observed.iter().zip(&reparsed) {
        assert_eq!(before.station_id, after.station_id);
        assert_eq!(before.sensor_types, after.sensor_types);
        let keys: Vec<SensorKind> = after.extra_sensors.keys().copied().collect();
        let mut declared = before.sensor_types.clone();
        declared.sort();
        assert_eq!(keys, declared, "{}", after.station_id);
    }
}

// ---------------------------------------------------------------------------
// Catalog file
// ---------------------------------------------------------------------------

#[test]
fn test_repo_catalog_file_matches_builtins() {
    let catalogs = Catalogs::load("stations.toml").expect("stations.toml should load");
    assert_eq!(catalogs.stations, StationTable::builtin());
    assert_eq!(catalogs.components, ComponentCatalog::builtin());
}
