//! Core data types for the weather station dashboard service.
//!
//! This module defines the shared domain model imported by all other modules:
//! sensor kinds, station readings, audience tags and the crate error type.
//! It contains no I/O.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sensor kinds
// ---------------------------------------------------------------------------

/// The fixed set of optional ("extra") sensors a station may carry.
///
/// Ordering follows declaration order and is used wherever output must be
/// stable (firmware flags, generated documents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensorKind {
    AtmosphericPressure,
    SolarRadiation,
    SoilMoisture,
    UvIndex,
    Visibility,
}

impl SensorKind {
    pub const ALL: [SensorKind; 5] = [
        SensorKind::AtmosphericPressure,
        SensorKind::SolarRadiation,
        SensorKind::SoilMoisture,
        SensorKind::UvIndex,
        SensorKind::Visibility,
    ];

    /// Identifier used by the data store and the firmware template.
    pub fn id(self) -> &'static str {
        match self {
            SensorKind::AtmosphericPressure => "atmosphericPressure",
            SensorKind::SolarRadiation => "solarRadiation",
            SensorKind::SoilMoisture => "soilMoisture",
            SensorKind::UvIndex => "uvIndex",
            SensorKind::Visibility => "visibility",
        }
    }

    /// Lenient lookup from a store identifier. Unknown identifiers yield
    /// `None`; callers drop them rather than fail.
    pub fn from_id(id: &str) -> Option<SensorKind> {
        SensorKind::ALL.into_iter().find(|k| k.id() == id)
    }

    pub fn unit(self) -> &'static str {
        match self {
            SensorKind::AtmosphericPressure => "hPa",
            SensorKind::SolarRadiation => "W/m²",
            SensorKind::SoilMoisture => "%",
            SensorKind::UvIndex => "",
            SensorKind::Visibility => "m",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Parses a list of raw identifiers into a sensor set, silently dropping
/// anything outside the enumerated kinds.
pub fn parse_sensor_set<S: AsRef<str>>(ids: &[S]) -> BTreeSet<SensorKind> {
    ids.iter()
        .filter_map(|id| SensorKind::from_id(id.as_ref()))
        .collect()
}

// ---------------------------------------------------------------------------
// Audience
// ---------------------------------------------------------------------------

/// Routing tag for auxiliary content such as regional news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudienceTarget {
    #[default]
    Students,
    Farmers,
    Government,
}

impl AudienceTarget {
    pub fn id(self) -> &'static str {
        match self {
            AudienceTarget::Students => "students",
            AudienceTarget::Farmers => "farmers",
            AudienceTarget::Government => "government",
        }
    }

    pub fn from_id(id: &str) -> Option<AudienceTarget> {
        match id {
            "students" => Some(AudienceTarget::Students),
            "farmers" => Some(AudienceTarget::Farmers),
            "government" => Some(AudienceTarget::Government),
            _ => None,
        }
    }
}

impl fmt::Display for AudienceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// One station's current sensor snapshot, already normalized.
///
/// Produced by `ingest::snapshot` from the live feed or by `dev_mode` from
/// the synthetic generator. Readings are never mutated; the next update for
/// the same station replaces the value wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationReading {
    pub station_id: String,
    pub station_name: String,
    pub region: String,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub temperature: f64, // °C
    pub humidity: f64,    // %
    pub pressure: f64,    // hPa
    pub wind_speed: f64,
    pub wind_direction: String, // compass point, e.g. "NE"
    pub rainfall: f64,          // mm
    pub extra_sensors: BTreeMap<SensorKind, f64>,
    pub sensor_types: Vec<SensorKind>,
    pub audience_focus: AudienceTarget,
    pub timestamp: DateTime<Utc>,
}

impl StationReading {
    /// True when every extra-sensor key is also declared in `sensor_types`.
    pub fn extras_consistent(&self) -> bool {
        self.extra_sensors
            .keys()
            .all(|k| self.sensor_types.contains(k))
    }
}

/// Identity and location of a station, supplied alongside generated values.
#[derive(Debug, Clone, PartialEq)]
pub struct StationIdentity {
    pub station_id: String,
    pub station_name: String,
    pub region: String,
    pub province: Option<String>,
    pub municipality: Option<String>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the collaborators around the core: configuration
/// loading, feed parsing, news fetching and file output. The alert,
/// generator and device-config functions never produce one.
#[derive(Debug, PartialEq)]
pub enum WxError {
    /// Non-2xx HTTP response from a remote API.
    Http(u16),
    /// The request could not be sent or its body could not be read.
    Request(String),
    /// A payload could not be deserialized.
    Parse(String),
    /// A configuration file or value was invalid.
    Config(String),
    /// A local file could not be read or written.
    Io(String),
}

impl fmt::Display for WxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WxError::Http(code) => write!(f, "HTTP error: {}", code),
            WxError::Request(msg) => write!(f, "Request failed: {}", msg),
            WxError::Parse(msg) => write!(f, "Parse error: {}", msg),
            WxError::Config(msg) => write!(f, "Config error: {}", msg),
            WxError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for WxError {}

impl From<std::io::Error> for WxError {
    fn from(err: std::io::Error) -> Self {
        WxError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for WxError {
    fn from(err: serde_json::Error) -> Self {
        WxError::Parse(err.to_string())
    }
}
