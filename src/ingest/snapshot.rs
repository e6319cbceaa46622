//! Station feed snapshot parsing.
//!
//! The data store delivers the whole station collection on every update as
//! a JSON object keyed by station id. Values are loosely typed: fields go
//! missing, arrive as `null`, or live only under `mainSensors` when a
//! device wrote them. This module repairs all of that into `StationReading`
//! values so the alert and display code can assume clean input.
//!
//! # Clock injection
//! `parse_snapshot_at` takes `now` for readings without a usable
//! timestamp; `parse_snapshot` uses the real clock.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::logging::{self, DataSource};
use crate::model::{AudienceTarget, SensorKind, StationReading, WxError};

/// Store path for live station data.
pub const LIVE_PATH: &str = "weatherStations";
/// Store path for simulated station data.
pub const TEST_PATH: &str = "testWeatherStations";

pub const UNKNOWN_STATION_NAME: &str = "Unknown Station";
pub const UNKNOWN_REGION: &str = "Unknown";
pub const DEFAULT_WIND_DIRECTION: &str = "N";

/// Which collection a dashboard is watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedPath {
    #[default]
    Live,
    Test,
}

impl FeedPath {
    pub fn path(self) -> &'static str {
        match self {
            FeedPath::Live => LIVE_PATH,
            FeedPath::Test => TEST_PATH,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw document shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawMainSensors {
    temperature: Option<f64>,
    humidity: Option<f64>,
    rainfall: Option<f64>,
    wind_vane: Option<String>,
    wind_speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawStation {
    station_name: Option<String>,
    region: Option<String>,
    province: Option<String>,
    municipality: Option<String>,
    temperature: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
    wind_speed: Option<f64>,
    wind_direction: Option<String>,
    wind_vane: Option<String>,
    rainfall: Option<f64>,
    timestamp: Option<Value>,
    audience_focus: Option<String>,
    main_sensors: Option<RawMainSensors>,
    extra_sensors: Option<BTreeMap<String, Value>>,
    sensor_types: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Accepts epoch milliseconds or an RFC 3339 string.
fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_f64()? as i64),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

fn normalize(station_id: &str, raw: RawStation, now: DateTime<Utc>) -> StationReading {
    let main = raw.main_sensors.unwrap_or_default();

    // Known sensor types, in declared order, without duplicates.
    let declared: Option<Vec<SensorKind>> = raw.sensor_types.as_ref().map(|ids| {
        let mut seen = BTreeSet::new();
        ids.iter()
            .filter_map(|id| SensorKind::from_id(id))
            .filter(|k| seen.insert(*k))
            .collect()
    });

    let mut extra_sensors = BTreeMap::new();
    for (key, value) in raw.extra_sensors.unwrap_or_default() {
        let Some(kind) = SensorKind::from_id(&key) else {
            logging::debug(
                DataSource::Feed,
                Some(station_id),
                &format!("dropping unknown extra sensor '{}'", key),
            );
            continue;
        };
        if declared.as_ref().is_some_and(|d| !d.contains(&kind)) {
            logging::debug(
                DataSource::Feed,
                Some(station_id),
                &format!("dropping undeclared extra sensor '{}'", key),
            );
            continue;
        }
        if let Some(v) = value.as_f64() {
            extra_sensors.insert(kind, v);
        }
    }

    let sensor_types = declared.unwrap_or_else(|| extra_sensors.keys().copied().collect());

    let timestamp = parse_timestamp(raw.timestamp.as_ref()).unwrap_or_else(|| {
        logging::debug(
            DataSource::Feed,
            Some(station_id),
            "missing or unreadable timestamp, using ingestion time",
        );
        now
    });

    StationReading {
        station_id: station_id.to_string(),
        station_name: non_empty(raw.station_name)
            .unwrap_or_else(|| UNKNOWN_STATION_NAME.to_string()),
        region: non_empty(raw.region).unwrap_or_else(|| UNKNOWN_REGION.to_string()),
        province: non_empty(raw.province),
        municipality: non_empty(raw.municipality),
        temperature: raw.temperature.or(main.temperature).unwrap_or(0.0),
        humidity: raw.humidity.or(main.humidity).unwrap_or(0.0),
        pressure: raw.pressure.unwrap_or(0.0),
        wind_speed: raw.wind_speed.or(main.wind_speed).unwrap_or(0.0),
        wind_direction: non_empty(raw.wind_direction)
            .or_else(|| non_empty(raw.wind_vane))
            .or_else(|| non_empty(main.wind_vane))
            .unwrap_or_else(|| DEFAULT_WIND_DIRECTION.to_string()),
        rainfall: raw.rainfall.or(main.rainfall).unwrap_or(0.0),
        extra_sensors,
        sensor_types,
        audience_focus: raw
            .audience_focus
            .as_deref()
            .and_then(AudienceTarget::from_id)
            .unwrap_or_default(),
        timestamp,
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Normalizes an already-decoded snapshot.
///
/// A `null` snapshot (empty collection) yields no readings. Entries that
/// are not objects are skipped with a warning. Only a top-level value that
/// is neither an object nor `null` is an error.
pub fn readings_from_value(
    snapshot: &Value,
    now: DateTime<Utc>,
) -> Result<Vec<StationReading>, WxError> {
    let entries = match snapshot {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(WxError::Parse(format!(
                "station snapshot must be an object, got {}",
                type_name(other)
            )));
        }
    };

    let mut readings = Vec::with_capacity(entries.len());
    for (station_id, value) in entries {
        if !value.is_object() {
            logging::warn(
                DataSource::Feed,
                Some(station_id),
                &format!("skipping non-object entry ({})", type_name(value)),
            );
            continue;
        }
        // Per-field types are repaired below; a field of the wrong type
        // is treated as missing rather than failing the station.
        let raw = RawStation::deserialize(value).unwrap_or_else(|_| lenient(value));
        readings.push(normalize(station_id, raw, now));
    }

    readings.sort_by(|a, b| a.station_id.cmp(&b.station_id));
    Ok(readings)
}

/// Field-by-field fallback for documents where some field has the wrong
/// JSON type.
fn lenient(value: &Value) -> RawStation {
    let num = |k: &str| value.get(k).and_then(Value::as_f64);
    let text = |k: &str| value.get(k).and_then(Value::as_str).map(String::from);
    let main = value.get("mainSensors").map(|m| RawMainSensors {
        temperature: m.get("temperature").and_then(Value::as_f64),
        humidity: m.get("humidity").and_then(Value::as_f64),
        rainfall: m.get("rainfall").and_then(Value::as_f64),
        wind_vane: m.get("windVane").and_then(Value::as_str).map(String::from),
        wind_speed: m.get("windSpeed").and_then(Value::as_f64),
    });
    RawStation {
        station_name: text("stationName"),
        region: text("region"),
        province: text("province"),
        municipality: text("municipality"),
        temperature: num("temperature"),
        humidity: num("humidity"),
        pressure: num("pressure"),
        wind_speed: num("windSpeed"),
        wind_direction: text("windDirection"),
        wind_vane: text("windVane"),
        rainfall: num("rainfall"),
        timestamp: value.get("timestamp").cloned(),
        audience_focus: text("audienceFocus"),
        main_sensors: main,
        extra_sensors: value
            .get("extraSensors")
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        sensor_types: value.get("sensorTypes").and_then(Value::as_array).map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses a snapshot body.
pub fn parse_snapshot_at(json: &str, now: DateTime<Utc>) -> Result<Vec<StationReading>, WxError> {
    let value: Value = serde_json::from_str(json)?;
    readings_from_value(&value, now)
}

/// Convenience wrapper that uses the real current time.
pub fn parse_snapshot(json: &str) -> Result<Vec<StationReading>, WxError> {
    parse_snapshot_at(json, Utc::now())
}

/// Distinct regions in a set of readings, sorted, excluding the unknown
/// placeholder. Feeds the dashboard's region filter.
pub fn regions(readings: &[StationReading]) -> Vec<String> {
    readings
        .iter()
        .map(|r| r.region.as_str())
        .filter(|r| *r != UNKNOWN_REGION)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
