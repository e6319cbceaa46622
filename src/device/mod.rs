//! Device artifact generation.
//!
//! Builds the two files a station owner downloads to flash an ESP32: the
//! firmware sketch and the credentials JSON. The artifact is downloaded
//! with no recovery path, so generation never fails: an unknown station
//! falls back to the default station, an unknown component to the role
//! default, and missing store settings to placeholders.
//!
//! Submodules:
//! - `credentials`: the JSON credentials document.
//! - `firmware`: the sketch template.

pub mod credentials;
pub mod firmware;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::components::{ComponentCatalog, ComponentProfile, ComponentRole};
use crate::config::StoreConfig;
use crate::model::{AudienceTarget, SensorKind, parse_sensor_set};
use crate::stations::{StationProfile, StationTable};

pub use credentials::DeviceCredentials;
pub use firmware::{UPDATE_INTERVAL_MS, sensor_flag};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// User-chosen parameters for a device artifact. Every field is optional
/// in effect; see `resolve` for the fallbacks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceConfigRequest {
    pub station_profile_key: Option<String>,
    /// Overrides the station's display name in the firmware.
    pub station_name: Option<String>,
    /// Raw sensor identifiers. `None` uses the station's default set;
    /// `Some(vec![])` enables no extra sensors.
    pub selected_sensor_kinds: Option<Vec<String>>,
    pub rainfall_component_id: Option<String>,
    pub wind_speed_component_id: Option<String>,
    /// Routing tag for the news panel; does not change the artifact.
    pub audience_target: AudienceTarget,
}

/// A request with every lookup settled.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest<'a> {
    pub station: &'a StationProfile,
    pub station_name: String,
    pub sensors: BTreeSet<SensorKind>,
    pub rainfall: &'a ComponentProfile,
    pub wind_speed: &'a ComponentProfile,
}

/// Applies the fallback order: station first, then sensors (which may
/// come from the station), then each component.
pub fn resolve<'a>(
    request: &DeviceConfigRequest,
    catalog: &'a ComponentCatalog,
    stations: &'a StationTable,
) -> ResolvedRequest<'a> {
    let station = stations.resolve(request.station_profile_key.as_deref());

    let station_name = request
        .station_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(station.name.as_str())
        .to_string();

    let sensors = match &request.selected_sensor_kinds {
        Some(ids) => parse_sensor_set(ids),
        None => station.sensor_set(),
    };

    ResolvedRequest {
        station,
        station_name,
        sensors,
        rainfall: catalog.resolve(
            ComponentRole::Rainfall,
            request.rainfall_component_id.as_deref(),
        ),
        wind_speed: catalog.resolve(
            ComponentRole::WindSpeed,
            request.wind_speed_component_id.as_deref(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceArtifact {
    pub credentials: DeviceCredentials,
    pub firmware: String,
    /// Key of the station the artifact was built for, after fallback.
    pub station_key: String,
    pub audience_target: AudienceTarget,
    pub created_at: DateTime<Utc>,
}

impl DeviceArtifact {
    pub fn firmware_file_name(&self) -> String {
        format!("esp32_weather_station_{}.ino", self.station_key)
    }

    pub fn credentials_file_name(&self) -> String {
        format!("esp32_credentials_{}.json", self.created_at.timestamp_millis())
    }
}

/// Renders the firmware sketch and credentials for `request` as of `now`.
///
/// Output depends only on the arguments; two calls that differ only in
/// `now` differ only in the embedded creation timestamp.
pub fn render_device_artifact_at(
    request: &DeviceConfigRequest,
    catalog: &ComponentCatalog,
    stations: &StationTable,
    store: &StoreConfig,
    now: DateTime<Utc>,
) -> DeviceArtifact {
    let resolved = resolve(request, catalog, stations);
    let credentials = DeviceCredentials::from_store(store, now);
    let host = credentials.database_host();

    let firmware = firmware::render(&firmware::FirmwareContext {
        created_at: &credentials.created_at,
        project_id: &credentials.firebase_project_id,
        database_host: &host,
        station: resolved.station,
        station_name: &resolved.station_name,
        sensors: &resolved.sensors,
        rainfall: resolved.rainfall,
        wind_speed: resolved.wind_speed,
        stations,
        catalog,
    });

    DeviceArtifact {
        station_key: resolved.station.key.clone(),
        credentials,
        firmware,
        audience_target: request.audience_target,
        created_at: now,
    }
}

/// Convenience wrapper that uses the real current time.
pub fn render_device_artifact(
    request: &DeviceConfigRequest,
    catalog: &ComponentCatalog,
    stations: &StationTable,
    store: &StoreConfig,
) -> DeviceArtifact {
    render_device_artifact_at(request, catalog, stations, store, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_everything() {
        let catalog = ComponentCatalog::builtin();
        let stations = StationTable::builtin();
        let r = resolve(&DeviceConfigRequest::default(), &catalog, &stations);
        assert_eq!(r.station.key, "manila");
        assert_eq!(r.station_name, "Manila Weather Station");
        assert_eq!(
            r.sensors,
            BTreeSet::from([SensorKind::AtmosphericPressure, SensorKind::SolarRadiation])
        );
        assert_eq!(r.rainfall.id, "TipBucket_RainGauge");
        assert_eq!(r.wind_speed.id, "Anemometer_3Cup");
    }

    #[test]
    fn test_explicit_empty_selection_overrides_station_defaults() {
        let catalog = ComponentCatalog::builtin();
        let stations = StationTable::builtin();
        let request = DeviceConfigRequest {
            station_profile_key: Some("pampanga".into()),
            selected_sensor_kinds: Some(vec![]),
            ..Default::default()
        };
        assert!(resolve(&request, &catalog, &stations).sensors.is_empty());
    }

    #[test]
    fn test_unknown_sensor_ids_are_dropped() {
        let catalog = ComponentCatalog::builtin();
        let stations = StationTable::builtin();
        let request = DeviceConfigRequest {
            selected_sensor_kinds: Some(vec!["uvIndex".into(), "lightning".into()]),
            ..Default::default()
        };
        assert_eq!(
            resolve(&request, &catalog, &stations).sensors,
            BTreeSet::from([SensorKind::UvIndex])
        );
    }

    #[test]
    fn test_blank_name_override_ignored() {
        let catalog = ComponentCatalog::builtin();
        let stations = StationTable::builtin();
        let request = DeviceConfigRequest {
            station_profile_key: Some("laguna".into()),
            station_name: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(resolve(&request, &catalog, &stations).station_name, "Laguna Weather Station");
    }

    #[test]
    fn test_file_names() {
        use chrono::TimeZone;
        let now = Utc.timestamp_millis_opt(1_754_000_000_000).unwrap();
        let artifact = render_device_artifact_at(
            &DeviceConfigRequest {
                station_profile_key: Some("batangas".into()),
                ..Default::default()
            },
            &ComponentCatalog::builtin(),
            &StationTable::builtin(),
            &StoreConfig::placeholders(),
            now,
        );
        assert_eq!(artifact.firmware_file_name(), "esp32_weather_station_batangas.ino");
        assert_eq!(artifact.credentials_file_name(), "esp32_credentials_1754000000000.json");
    }
}
