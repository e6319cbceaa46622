//! ESP32 firmware template.
//!
//! Section order is fixed and parsed by downstream tooling:
//!
//! 1. header comment (provenance, station, components)
//! 2. configuration constants (network placeholders, station identity,
//!    sensor flags, rainfall block, wind speed block, upload interval)
//! 3. upload loop skeleton
//! 4. documentation trailer listing every station, sensor flag and
//!    component option
//!
//! Every optional sensor is read inside an `#ifdef HAS_*` block, so any
//! combination of flags compiles.

use std::collections::BTreeSet;

use crate::components::{Calibration, ComponentCatalog, ComponentProfile, ComponentRole};
use crate::model::SensorKind;
use crate::stations::{StationProfile, StationTable};

/// Upload period baked into the firmware, in milliseconds.
pub const UPDATE_INTERVAL_MS: u32 = 30_000;

/// Feature flag for an extra sensor kind.
pub fn sensor_flag(kind: SensorKind) -> &'static str {
    match kind {
        SensorKind::AtmosphericPressure => "HAS_ATMOSPHERIC_PRESSURE",
        SensorKind::SolarRadiation => "HAS_SOLAR_RADIATION",
        SensorKind::SoilMoisture => "HAS_SOIL_MOISTURE",
        SensorKind::UvIndex => "HAS_UV_INDEX",
        SensorKind::Visibility => "HAS_VISIBILITY",
    }
}

/// Everything the template needs, already resolved.
pub struct FirmwareContext<'a> {
    pub created_at: &'a str,
    pub project_id: &'a str,
    pub database_host: &'a str,
    pub station: &'a StationProfile,
    pub station_name: &'a str,
    pub sensors: &'a BTreeSet<SensorKind>,
    pub rainfall: &'a ComponentProfile,
    pub wind_speed: &'a ComponentProfile,
    pub stations: &'a StationTable,
    pub catalog: &'a ComponentCatalog,
}

/// Escapes a value for use inside a C string literal.
fn c_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' | '\r' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Keeps free text from closing a block comment early.
fn comment_text(value: &str) -> String {
    value.replace("*/", "* /").replace(['\n', '\r'], " ")
}

pub fn render(ctx: &FirmwareContext<'_>) -> String {
    let mut out = String::with_capacity(8 * 1024);
    out.push_str(&header(ctx));
    out.push_str(&configuration(ctx));
    out.push_str(UPLOAD_LOOP);
    out.push_str(&trailer(ctx.stations, ctx.catalog));
    out
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn header(ctx: &FirmwareContext<'_>) -> String {
    format!(
        r#"/*
 * ESP32 Weather Station Sensor Template
 *
 * Purpose: Arduino sketch for ESP32 microcontroller to read weather sensors
 * and upload data to Firebase Realtime Database
 *
 * Target Path: /weatherStations/{{stationLocation}}/
 *
 * Generated: {created_at}
 * Firebase Project: {project}
 *
 * Station: {name} ({municipality}, {province})
 * Rainfall Component: {rain}
 * Wind Speed Component: {wind}
 *
 * Required Libraries:
 * - Firebase Realtime Database (firebase-esp32)
 * - DHT Sensor Library (for temperature & humidity)
 *
 * Installation:
 * 1. Arduino IDE -> Sketch -> Include Library -> Manage Libraries
 * 2. Search and install: "Firebase Arduino Client Library by Mobizt"
 * 3. Configure WiFi and Firebase credentials below
 * 4. Set STATION_LOCATION and sensor flags
 * 5. Upload to ESP32
 */

#include <WiFi.h>
#include <Firebase.h>
#include <FirebaseJSON.h>
#include "time.h"

"#,
        created_at = ctx.created_at,
        project = comment_text(ctx.project_id),
        name = comment_text(ctx.station_name),
        municipality = comment_text(&ctx.station.municipality),
        province = comment_text(&ctx.station.province),
        rain = comment_text(&ctx.rainfall.display_name),
        wind = comment_text(&ctx.wind_speed.display_name),
    )
}

fn sensor_defines(sensors: &BTreeSet<SensorKind>) -> String {
    if sensors.is_empty() {
        return "// No extra sensors configured for this station\n".to_string();
    }
    sensors
        .iter()
        .map(|&k| format!("#define {}\n", sensor_flag(k)))
        .collect()
}

fn component_block(role: ComponentRole, part: &ComponentProfile) -> String {
    let prefix = role.define_prefix();
    let pin = match part.gpio_number() {
        Some(n) => format!("#define {}_PIN {}  // {}", prefix, n, comment_text(&part.pin_assignment)),
        None => format!(
            "#define {}_PIN -1  // {} (no GPIO number)",
            prefix,
            comment_text(&part.pin_assignment)
        ),
    };
    let calibration = match part.calibration {
        Calibration::Scale(v) => format!(
            "#define {} {:?}  // Component: {}",
            role.calibration_define(),
            v,
            comment_text(&part.display_name)
        ),
        Calibration::Serial => format!(
            "#define {}_SERIAL\n#define {} 1.0  // Component: {} ({})",
            prefix,
            role.calibration_define(),
            comment_text(&part.display_name),
            crate::components::SERIAL_MARKER
        ),
    };
    format!(
        "// {title} Sensor Configuration\n{pin}\n{calibration}\n// {description}\n",
        title = role.title(),
        description = comment_text(&part.description),
    )
}

fn configuration(ctx: &FirmwareContext<'_>) -> String {
    format!(
        r#"// ============================================
// CONFIGURATION - MODIFY THESE SETTINGS
// ============================================

// WiFi Credentials
const char* ssid = "YOUR_WIFI_SSID";
const char* password = "YOUR_WIFI_PASSWORD";

// Firebase Configuration
const char* firebaseHost = "{host}";
const char* firebaseAuth = "YOUR_FIREBASE_DATABASE_SECRET";

// Station Configuration
const char* STATION_LOCATION = "{location}";
const char* STATION_NAME = "{name}";
const char* MUNICIPALITY = "{municipality}";
const char* PROVINCE = "{province}";

// Sensor Type Configuration (PRE-CONFIGURED FOR YOUR STATION)
{defines}
// Component Configuration
#define RAINFALL_COMPONENT "{rain_id}"
#define WIND_SPEED_COMPONENT "{wind_id}"

// ============================================
// COMPONENT PIN & CALIBRATION CONFIGURATION
// ============================================

{rain_block}
{wind_block}
#define UPDATE_INTERVAL {interval}   // Upload data every {secs} seconds

"#,
        host = c_str(ctx.database_host),
        location = c_str(&ctx.station.key),
        name = c_str(ctx.station_name),
        municipality = c_str(&ctx.station.municipality),
        province = c_str(&ctx.station.province),
        defines = sensor_defines(ctx.sensors),
        rain_id = c_str(&ctx.rainfall.id),
        wind_id = c_str(&ctx.wind_speed.id),
        rain_block = component_block(ComponentRole::Rainfall, ctx.rainfall),
        wind_block = component_block(ComponentRole::WindSpeed, ctx.wind_speed),
        interval = UPDATE_INTERVAL_MS,
        secs = UPDATE_INTERVAL_MS / 1000,
    )
}

const UPLOAD_LOOP: &str = r#"// ============================================
// GLOBAL VARIABLES & FIREBASE SETUP
// ============================================

FirebaseData firebaseData;
unsigned long lastUpdateTime = 0;

float readRainfallSensor();
float readWindSpeedSensor();
void connectToWiFi();
String getTimestamp();

void setup() {
  Serial.begin(115200);
  delay(1000);

  Serial.println("\n=== ESP32 Weather Station Starting ===");
  Serial.print("Station: ");
  Serial.println(STATION_LOCATION);

  configTime(0, 0, "pool.ntp.org", "time.nist.gov");
  connectToWiFi();

  Firebase.begin(firebaseHost, firebaseAuth);
  Firebase.reconnectWiFi(true);

  Serial.println("Setup complete");
}

void loop() {
  if (millis() - lastUpdateTime >= UPDATE_INTERVAL) {
    lastUpdateTime = millis();

    // Read sensors (implement your actual sensor code)
    float temperature = 25.0 + (random(0, 50) / 10.0);
    float humidity = 60.0 + (random(0, 200) / 10.0);

    // Read rainfall sensor based on selected component
    float rainfall = readRainfallSensor();

    // Read wind speed sensor based on selected component
    float windSpeed = readWindSpeedSensor();
    String windDirection = "N";

    // Prepare Firebase JSON
    FirebaseJson json;
    json.set("region", STATION_LOCATION);
    json.set("stationName", STATION_NAME);
    json.set("municipality", MUNICIPALITY);
    json.set("province", PROVINCE);

    // Main sensors (all stations)
    json.set("mainSensors/temperature", temperature);
    json.set("mainSensors/humidity", humidity);
    json.set("mainSensors/rainfall", rainfall);
    json.set("mainSensors/windVane", windDirection);
    json.set("mainSensors/windSpeed", windSpeed);

    // Extra sensors (station-specific)
#ifdef HAS_ATMOSPHERIC_PRESSURE
    json.set("extraSensors/atmosphericPressure", 1013.25);
#endif

#ifdef HAS_SOLAR_RADIATION
    json.set("extraSensors/solarRadiation", 500.0);
#endif

#ifdef HAS_SOIL_MOISTURE
    json.set("extraSensors/soilMoisture", 45.0);
#endif

#ifdef HAS_UV_INDEX
    json.set("extraSensors/uvIndex", 5.0);
#endif

#ifdef HAS_VISIBILITY
    json.set("extraSensors/visibility", 10000.0);
#endif

    json.set("timestamp", getTimestamp());
    json.set("lastUpdated", getTimestamp());

    // Upload to /weatherStations/{stationLocation}
    String path = "/weatherStations/";
    path += STATION_LOCATION;

    if (Firebase.set(firebaseData, path, json)) {
      Serial.print("Data uploaded: ");
      Serial.print(temperature);
      Serial.println(" C");
    } else {
      Serial.print("Error: ");
      Serial.println(firebaseData.errorReason());
    }
  }
  delay(100);
}

void connectToWiFi() {
  Serial.print("Connecting to WiFi: ");
  Serial.println(ssid);

  WiFi.begin(ssid, password);
  int attempts = 0;

  while (WiFi.status() != WL_CONNECTED && attempts < 20) {
    delay(500);
    Serial.print(".");
    attempts++;
  }

  if (WiFi.status() == WL_CONNECTED) {
    Serial.println("\nWiFi connected");
    Serial.println(WiFi.localIP());
  } else {
    Serial.println("\nWiFi failed");
  }
}

String getTimestamp() {
  time_t now = time(nullptr);
  struct tm* timeinfo = gmtime(&now);
  char buffer[30];
  strftime(buffer, sizeof(buffer), "%Y-%m-%dT%H:%M:%S", timeinfo);
  return String(buffer) + "Z";
}

// ============================================
// SENSOR READING FUNCTIONS
// ============================================

float readRainfallSensor() {
  // Replace with tip counting or analog sampling for RAINFALL_COMPONENT,
  // e.g. return tipCount * RAINFALL_MM_PER_TIP;
  return 0.0;  // Placeholder
}

float readWindSpeedSensor() {
#ifdef WIND_SPEED_SERIAL
  // Serial anemometer: parse km/h directly from the sensor's UART frames.
  return 5.0;  // Placeholder
#else
  // Pulse or analog anemometer, e.g. return pulseHz * WIND_SPEED_CALIBRATION;
  return 5.0;  // Placeholder
#endif
}

"#;

fn trailer(stations: &StationTable, catalog: &ComponentCatalog) -> String {
    let rule = "// ============================================\n";
    let mut out = String::new();

    out.push_str(rule);
    out.push_str("// Station Configurations:\n");
    for profile in stations.profiles() {
        let flags: Vec<&str> = profile.sensor_set().into_iter().map(sensor_flag).collect();
        let flags = if flags.is_empty() {
            "(no extra sensors)".to_string()
        } else {
            flags.join(", ")
        };
        out.push_str(&format!("// {}: {}\n", comment_text(&profile.key), flags));
    }
    out.push_str(rule);
    out.push('\n');

    out.push_str(rule);
    out.push_str("// SENSOR FLAG OPTIONS:\n");
    for kind in SensorKind::ALL {
        out.push_str(&format!("// - {} -> {}\n", kind.id(), sensor_flag(kind)));
    }
    out.push_str(rule);
    out.push('\n');

    out.push_str(rule);
    for (i, role) in ComponentRole::ALL.into_iter().enumerate() {
        if i > 0 {
            out.push_str("//\n");
        }
        out.push_str(&format!(
            "// {} COMPONENT OPTIONS:\n",
            role.title().to_ascii_uppercase()
        ));
        for part in catalog.role(role).alternatives() {
            let note = match part.calibration {
                Calibration::Scale(v) => format!("{} {}", v, role.calibration_unit()),
                Calibration::Serial => "serial, no numeric scale".to_string(),
            };
            out.push_str(&format!("// - {} ({})\n", comment_text(&part.id), note));
        }
    }
    out.push_str(rule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_distinct_flag() {
        let flags: BTreeSet<&str> = SensorKind::ALL.into_iter().map(sensor_flag).collect();
        assert_eq!(flags.len(), 5);
        assert!(flags.iter().all(|f| f.starts_with("HAS_")));
    }

    #[test]
    fn test_c_str_escapes_quotes_and_backslashes() {
        assert_eq!(c_str(r#"A "B" \ C"#), r#"A \"B\" \\ C"#);
        assert_eq!(c_str("two\nlines"), "two lines");
    }

    #[test]
    fn test_comment_text_cannot_close_comment() {
        assert!(!comment_text("evil */ text").contains("*/"));
    }

    #[test]
    fn test_empty_sensor_set_emits_comment_not_define() {
        let text = sensor_defines(&BTreeSet::new());
        assert!(!text.contains("#define"));
    }

    #[test]
    fn test_serial_component_block_stays_numeric() {
        let catalog = ComponentCatalog::builtin();
        let sonic = catalog.resolve(ComponentRole::WindSpeed, Some("sonic_Anemometer"));
        let block = component_block(ComponentRole::WindSpeed, sonic);
        assert!(block.contains("#define WIND_SPEED_SERIAL"));
        assert!(block.contains("#define WIND_SPEED_CALIBRATION 1.0"));
        assert!(block.contains("#define WIND_SPEED_PIN 16"));
    }

    #[test]
    fn test_scale_component_block() {
        let catalog = ComponentCatalog::builtin();
        let tip = catalog.resolve(ComponentRole::Rainfall, None);
        let block = component_block(ComponentRole::Rainfall, tip);
        assert!(block.contains("#define RAINFALL_PIN 35"));
        assert!(block.contains("#define RAINFALL_MM_PER_TIP 0.254"));
        assert!(block.contains("// Standard tipping bucket with magnetic reed switch"));
    }

    #[test]
    fn test_trailer_lists_all_options() {
        let stations = StationTable::builtin();
        let catalog = ComponentCatalog::builtin();
        let text = trailer(&stations, &catalog);
        for kind in SensorKind::ALL {
            assert!(text.contains(sensor_flag(kind)));
        }
        for role in ComponentRole::ALL {
            for part in catalog.role(role).alternatives() {
                assert!(text.contains(&part.id), "trailer missing {}", part.id);
            }
        }
        assert!(text.contains("// cavite: (no extra sensors)"));
    }
}
