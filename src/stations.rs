//! Station registry for the weather dashboard.
//!
//! Defines the predefined station profiles a device artifact can be built
//! for, along with each station's default set of extra sensors. The
//! built-in table matches the deployed network; a replacement table can be
//! loaded from TOML (see `stations.toml` at the repo root) and is validated
//! on load, so a `StationTable` value always has a resolvable default.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{SensorKind, WxError, parse_sensor_set};

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single predefined station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationProfile {
    /// Lookup key, also the store path segment (e.g. "manila").
    pub key: String,
    /// Display name written into the firmware.
    pub name: String,
    pub municipality: String,
    pub province: String,
    /// Region label the station reports under. Defaults to the province.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Default extra sensors, as raw identifiers. Identifiers the service
    /// does not know are kept here and dropped when resolved.
    #[serde(default)]
    pub sensors: Vec<String>,
}

impl StationProfile {
    pub fn sensor_set(&self) -> BTreeSet<SensorKind> {
        parse_sensor_set(&self.sensors)
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(&self.province)
    }
}

/// On-disk shape of a station table.
#[derive(Debug, Deserialize)]
struct StationTableFile {
    default: String,
    #[serde(rename = "profile")]
    profiles: Vec<StationProfile>,
}

/// An immutable, validated set of station profiles with a designated
/// default.
///
/// Invariants: at least one profile, keys are unique, and `default_key`
/// names one of the profiles.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "StationTableFile")]
pub struct StationTable {
    default_key: String,
    profiles: Vec<StationProfile>,
}

impl TryFrom<StationTableFile> for StationTable {
    type Error = WxError;

    fn try_from(file: StationTableFile) -> Result<Self, Self::Error> {
        StationTable::new(file.default, file.profiles)
    }
}

impl StationTable {
    pub fn new(default_key: String, profiles: Vec<StationProfile>) -> Result<Self, WxError> {
        if profiles.is_empty() {
            return Err(WxError::Config("station table has no profiles".into()));
        }
        let mut seen = BTreeSet::new();
        for profile in &profiles {
            if !seen.insert(profile.key.as_str()) {
                return Err(WxError::Config(format!(
                    "duplicate station key '{}'",
                    profile.key
                )));
            }
        }
        if !seen.contains(default_key.as_str()) {
            return Err(WxError::Config(format!(
                "default station '{}' is not in the table",
                default_key
            )));
        }
        Ok(Self {
            default_key,
            profiles,
        })
    }

    /// The deployed station network.
    pub fn builtin() -> Self {
        Self {
            default_key: "manila".to_string(),
            profiles: BUILTIN_STATIONS
                .iter()
                .map(|(key, name, region, municipality, province, sensors)| StationProfile {
                    key: key.to_string(),
                    name: name.to_string(),
                    municipality: municipality.to_string(),
                    province: province.to_string(),
                    region: Some(region.to_string()),
                    sensors: sensors.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        }
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn profiles(&self) -> &[StationProfile] {
        &self.profiles
    }

    /// Looks up a station by key. Returns `None` if not found.
    pub fn find(&self, key: &str) -> Option<&StationProfile> {
        self.profiles.iter().find(|p| p.key == key)
    }

    pub fn default_profile(&self) -> &StationProfile {
        // Construction guarantees the default key exists; the first profile
        // is only a belt for tables built by hand in tests.
        self.find(&self.default_key).unwrap_or(&self.profiles[0])
    }

    /// Looks up a station by key, falling back to the default profile for
    /// an unknown or absent key. Never fails.
    pub fn resolve(&self, key: Option<&str>) -> &StationProfile {
        key.and_then(|k| self.find(k))
            .unwrap_or_else(|| self.default_profile())
    }
}

impl Default for StationTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// (key, name, region, municipality, province, default extra sensors)
type StationRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static [&'static str],
);

static BUILTIN_STATIONS: &[StationRow] = &[
    (
        "manila",
        "Manila Weather Station",
        "Manila",
        "Manila",
        "Metro Manila",
        &["atmosphericPressure", "solarRadiation"],
    ),
    (
        "laguna",
        "Laguna Weather Station",
        "Laguna",
        "Santa Rosa",
        "Laguna",
        &["soilMoisture"],
    ),
    (
        "pampanga",
        "Pampanga Weather Station",
        "Pampanga",
        "Capas",
        "Pampanga",
        &["uvIndex", "visibility"],
    ),
    (
        "cavite",
        "Cavite Weather Station",
        "Cavite",
        "Kawit",
        "Cavite",
        &[],
    ),
    (
        "bulacan",
        "Bulacan Weather Station",
        "Bulacan",
        "Bulacan",
        "Bulacan",
        &["soilMoisture", "atmosphericPressure"],
    ),
    (
        "batangas",
        "Batangas Station",
        "Batangas",
        "Lipa",
        "Batangas",
        &["uvIndex"],
    ),
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
