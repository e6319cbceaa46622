/// Integration tests for device artifact generation
///
/// Tests verify:
/// 1. Unknown station and component ids fall back to the defaults
/// 2. Sensor selection maps to exactly the expected HAS_* flags
/// 3. The firmware keeps its section order and trailer
/// 4. Rendering is deterministic apart from the creation timestamp
///
/// Run with: cargo test --test device_artifact

use autoweather_service::components::ComponentCatalog;
use autoweather_service::config::StoreConfig;
use autoweather_service::device::{DeviceArtifact, DeviceConfigRequest, render_device_artifact_at};
use autoweather_service::stations::StationTable;

use chrono::{DateTime, TimeZone, Utc};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, hour, 0, 0).unwrap()
}

fn render(request: &DeviceConfigRequest, now: DateTime<Utc>) -> DeviceArtifact {
    render_device_artifact_at(
        request,
        &ComponentCatalog::builtin(),
        &StationTable::builtin(),
        &StoreConfig::placeholders(),
        now,
    )
}

fn for_station(key: &str) -> DeviceConfigRequest {
    DeviceConfigRequest {
        station_profile_key: Some(key.to_string()),
        ..Default::default()
    }
}

fn flag_lines(firmware: &str) -> Vec<&str> {
    firmware
        .lines()
        .filter(|l| l.starts_with("#define HAS_"))
        .collect()
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_station_falls_back_to_default() {
    let artifact = render(&for_station("atlantis"), at(4));
    assert_eq!(artifact.station_key, "manila");
    assert!(!artifact.firmware.is_empty());
    assert!(
        artifact.firmware.contains("STATION_LOCATION = \"manila\""),
        "firmware should target the default station"
    );
}

#[test]
fn test_unknown_components_fall_back_to_role_defaults() {
    let request = DeviceConfigRequest {
        rainfall_component_id: Some("bucket_of_holding".into()),
        wind_speed_component_id: Some("windsock".into()),
        ..Default::default()
    };
    let firmware = render(&request, at(4)).firmware;
    assert!(firmware.contains("#define RAINFALL_COMPONENT \"TipBucket_RainGauge\""));
    assert!(firmware.contains("#define WIND_SPEED_COMPONENT \"Anemometer_3Cup\""));
}

// ---------------------------------------------------------------------------
// Sensor flags
// ---------------------------------------------------------------------------

#[test]
fn test_empty_selection_emits_no_flags_but_keeps_trailer() {
    let request = DeviceConfigRequest {
        selected_sensor_kinds: Some(vec![]),
        ..for_station("manila")
    };
    let firmware = render(&request, at(4)).firmware;
    assert!(flag_lines(&firmware).is_empty(), "got {:?}", flag_lines(&firmware));
    assert!(firmware.contains("SENSOR FLAG OPTIONS:"));
    assert!(firmware.contains("Station Configurations:"));
}

#[test]
fn test_station_defaults_used_when_selection_absent() {
    let firmware = render(&for_station("pampanga"), at(4)).firmware;
    assert_eq!(
        flag_lines(&firmware),
        vec!["#define HAS_UV_INDEX", "#define HAS_VISIBILITY"]
    );
}

#[test]
fn test_explicit_selection_drops_unknown_ids() {
    let request = DeviceConfigRequest {
        selected_sensor_kinds: Some(vec![
            "soilMoisture".into(),
            "lightning".into(),
            "solarRadiation".into(),
        ]),
        ..for_station("cavite")
    };
    let firmware = render(&request, at(4)).firmware;
    assert_eq!(
        flag_lines(&firmware),
        vec!["#define HAS_SOLAR_RADIATION", "#define HAS_SOIL_MOISTURE"]
    );
}

// ---------------------------------------------------------------------------
// Template structure
// ---------------------------------------------------------------------------

#[test]
fn test_sections_appear_in_order() {
    let firmware = render(&for_station("laguna"), at(4)).firmware;
    let header = firmware.find("ESP32 Weather Station Sensor Template").unwrap();
    let config = firmware.find("CONFIGURATION - MODIFY THESE SETTINGS").unwrap();
    let interval = firmware.find("#define UPDATE_INTERVAL 30000").unwrap();
    let trailer = firmware.find("SENSOR FLAG OPTIONS:").unwrap();
    assert!(header < config && config < interval && interval < trailer);
}

#[test]
fn test_serial_wind_component_keeps_numeric_calibration() {
    let request = DeviceConfigRequest {
        wind_speed_component_id: Some("sonic_Anemometer".into()),
        ..for_station("batangas")
    };
    let firmware = render(&request, at(4)).firmware;
    assert!(firmware.contains("#define WIND_SPEED_SERIAL"));
    assert!(firmware.contains("#define WIND_SPEED_CALIBRATION 1.0"));
    assert!(firmware.contains("#define WIND_SPEED_PIN 16"));
}

#[test]
fn test_name_override_reaches_firmware() {
    let request = DeviceConfigRequest {
        station_name: Some("Lipa Rooftop".into()),
        ..for_station("batangas")
    };
    let firmware = render(&request, at(4)).firmware;
    assert!(firmware.contains("STATION_NAME = \"Lipa Rooftop\""));
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn test_renders_differ_only_in_timestamp() {
    let request = DeviceConfigRequest {
        rainfall_component_id: Some("optical_RainGauge".into()),
        ..for_station("bulacan")
    };
    let first = render(&request, at(4));
    let second = render(&request, at(5));

    let stamp_a = first.credentials.created_at.clone();
    let stamp_b = second.credentials.created_at.clone();
    assert_ne!(stamp_a, stamp_b);

    assert_eq!(
        first.firmware.replace(&stamp_a, "<ts>"),
        second.firmware.replace(&stamp_b, "<ts>")
    );
    assert_eq!(
        first.credentials.to_json_pretty().replace(&stamp_a, "<ts>"),
        second.credentials.to_json_pretty().replace(&stamp_b, "<ts>")
    );
}

#[test]
fn test_same_instant_renders_identically() {
    let request = for_station("manila");
    assert_eq!(render(&request, at(4)), render(&request, at(4)));
}
