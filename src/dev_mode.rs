//! Development mode: synthetic station updates.
//!
//! When no devices are reporting, the dashboard can be driven from the
//! simulated collection instead. Each cycle generates one reading per
//! station, honoring the station's own sensor set, and assembles the
//! update document written to the test path in the same shape devices
//! use for the live path.

use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde_json::{Map, Value, json};

use crate::alert;
use crate::ingest::snapshot::{FeedPath, UNKNOWN_REGION, UNKNOWN_STATION_NAME};
use crate::logging::{self, DataSource};
use crate::model::{SensorKind, StationIdentity, StationReading, WxError};
use crate::stations::StationTable;
use crate::generator;

/// Seconds between pushes while simulation is on.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// A station to simulate: who it is and which extra sensors it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedStation {
    pub identity: StationIdentity,
    pub sensor_types: Vec<SensorKind>,
}

impl SimulatedStation {
    fn enabled(&self) -> BTreeSet<SensorKind> {
        self.sensor_types.iter().copied().collect()
    }
}

/// Stations as they appear in the current feed snapshot.
pub fn stations_from_readings(readings: &[StationReading]) -> Vec<SimulatedStation> {
    readings
        .iter()
        .map(|r| SimulatedStation {
            identity: StationIdentity {
                station_id: r.station_id.clone(),
                station_name: r.station_name.clone(),
                region: r.region.clone(),
                province: r.province.clone(),
                municipality: r.municipality.clone(),
            },
            sensor_types: r.sensor_types.clone(),
        })
        .collect()
}

/// Stations from the registry, for when the feed is empty.
pub fn stations_from_table(table: &StationTable) -> Vec<SimulatedStation> {
    table
        .profiles()
        .iter()
        .map(|p| SimulatedStation {
            identity: StationIdentity {
                station_id: p.key.clone(),
                station_name: p.name.clone(),
                region: p.region().to_string(),
                province: Some(p.province.clone()),
                municipality: Some(p.municipality.clone()),
            },
            sensor_types: p.sensor_set().into_iter().collect(),
        })
        .collect()
}

/// One simulation cycle: the document to write and the readings it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationCycle {
    pub document: Value,
    pub readings: Vec<StationReading>,
}

impl SimulationCycle {
    pub fn alert_count(&self) -> usize {
        self.readings
            .iter()
            .filter(|r| alert::classify(r).is_some())
            .count()
    }
}

/// Configuration for the simulation loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationMode {
    pub update_interval: Duration,
    pub path: FeedPath,
}

impl Default for SimulationMode {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            path: FeedPath::Test,
        }
    }
}

impl SimulationMode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one cycle's update document as of `now`.
    pub fn cycle_at<R: Rng + ?Sized>(
        &self,
        stations: &[SimulatedStation],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> SimulationCycle {
        let mut document = Map::new();
        let mut readings = Vec::with_capacity(stations.len());

        for station in stations {
            let reading = generator::generate(&station.enabled(), rng).into_station_reading(
                station.identity.clone(),
                Default::default(),
                now,
            );
            document.insert(
                station.identity.station_id.clone(),
                update_entry(&reading, &station.sensor_types, now),
            );
            readings.push(reading);
        }

        SimulationCycle {
            document: Value::Object(document),
            readings,
        }
    }

    pub fn cycle<R: Rng + ?Sized>(&self, stations: &[SimulatedStation], rng: &mut R) -> SimulationCycle {
        self.cycle_at(stations, rng, Utc::now())
    }

    /// Runs cycles until `max_cycles` is reached (forever if `None`),
    /// handing each to `sink` and sleeping `update_interval` in between.
    /// Stops at the first sink error.
    pub fn run<R, F>(
        &self,
        stations: &[SimulatedStation],
        rng: &mut R,
        max_cycles: Option<usize>,
        mut sink: F,
    ) -> Result<usize, WxError>
    where
        R: Rng + ?Sized,
        F: FnMut(&SimulationCycle) -> Result<(), WxError>,
    {
        logging::info(
            DataSource::Simulation,
            None,
            &format!(
                "Simulating {} stations to '{}' every {}s",
                stations.len(),
                self.path.path(),
                self.update_interval.as_secs()
            ),
        );

        let mut done = 0;
        loop {
            let cycle = self.cycle(stations, rng);
            logging::log_cycle_summary(cycle.readings.len(), cycle.alert_count());
            sink(&cycle)?;
            done += 1;
            if max_cycles.is_some_and(|max| done >= max) {
                return Ok(done);
            }
            thread::sleep(self.update_interval);
        }
    }
}

/// Document entry for one station, as a device would write it.
fn update_entry(reading: &StationReading, declared: &[SensorKind], now: DateTime<Utc>) -> Value {
    let extra: Map<String, Value> = reading
        .extra_sensors
        .iter()
        .map(|(k, v)| (k.id().to_string(), json!(v)))
        .collect();
    let sensor_types: Vec<&str> = declared.iter().map(|k| k.id()).collect();

    let station_name = if reading.station_name.is_empty() {
        UNKNOWN_STATION_NAME
    } else {
        &reading.station_name
    };

    json!({
        "stationName": station_name,
        "municipality": reading.municipality.as_deref().unwrap_or(UNKNOWN_REGION),
        "region": reading.region,
        "windVane": reading.wind_direction,
        "temperature": reading.temperature,
        "humidity": reading.humidity,
        "pressure": reading.pressure,
        "windSpeed": reading.wind_speed,
        "rainfall": reading.rainfall,
        "mainSensors": {
            "temperature": reading.temperature,
            "humidity": reading.humidity,
            "rainfall": reading.rainfall,
            "windVane": reading.wind_direction,
            "windSpeed": reading.wind_speed,
        },
        "extraSensors": extra,
        "sensorTypes": sensor_types,
        "timestamp": now.timestamp_millis(),
        "lastUpdated": now.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::snapshot;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 4, 0, 0).unwrap()
    }

    #[test]
    fn test_default_interval_is_five_seconds() {
        let mode = SimulationMode::new();
        assert_eq!(mode.update_interval, Duration::from_secs(5));
        assert_eq!(mode.path.path(), "testWeatherStations");
    }

    #[test]
    fn test_cycle_covers_every_station_with_own_sensors() {
        let stations = stations_from_table(&StationTable::builtin());
        let mut rng = StdRng::seed_from_u64(11);
        let cycle = SimulationMode::new().cycle_at(&stations, &mut rng, now());

        let doc = cycle.document.as_object().unwrap();
        assert_eq!(doc.len(), stations.len());

        let pampanga = &doc["pampanga"];
        let extras = pampanga["extraSensors"].as_object().unwrap();
        let mut keys: Vec<&str> = extras.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["uvIndex", "visibility"]);
        assert_eq!(pampanga["sensorTypes"], json!(["uvIndex", "visibility"]));

        assert_eq!(doc["manila"]["region"], "Manila");
        assert_eq!(doc["manila"]["municipality"], "Manila");

        let cavite = &doc["cavite"];
        assert!(cavite["extraSensors"].as_object().unwrap().is_empty());
        assert_eq!(pampanga["timestamp"], json!(now().timestamp_millis()));
        assert_eq!(pampanga["lastUpdated"], "2025-08-01T04:00:00.000Z");
    }

    #[test]
    fn test_main_sensors_mirror_top_level() {
        let stations = stations_from_table(&StationTable::builtin());
        let mut rng = StdRng::seed_from_u64(5);
        let cycle = SimulationMode::new().cycle_at(&stations, &mut rng, now());
        for entry in cycle.document.as_object().unwrap().values() {
            assert_eq!(entry["mainSensors"]["temperature"], entry["temperature"]);
            assert_eq!(entry["mainSensors"]["windVane"], entry["windVane"]);
        }
    }

    #[test]
    fn test_document_reparses_to_same_readings() {
        let stations = stations_from_table(&StationTable::builtin());
        let mut rng = StdRng::seed_from_u64(9);
        let cycle = SimulationMode::new().cycle_at(&stations, &mut rng, now());

        let parsed = snapshot::readings_from_value(&cycle.document, now()).unwrap();
        assert_eq!(parsed.len(), cycle.readings.len());
        for reading in &parsed {
            let generated = cycle
                .readings
                .iter()
                .find(|r| r.station_id == reading.station_id)
                .unwrap();
            assert_eq!(reading.temperature, generated.temperature);
            assert_eq!(reading.extra_sensors, generated.extra_sensors);
            assert_eq!(reading.timestamp, now());
        }
    }

    #[test]
    fn test_stations_from_readings_keep_declared_types() {
        let json = r#"{"Laguna": {"stationName": "Laguna", "region": "Calabarzon",
                        "sensorTypes": ["soilMoisture"]}}"#;
        let readings = snapshot::parse_snapshot_at(json, now()).unwrap();
        let stations = stations_from_readings(&readings);
        assert_eq!(stations[0].sensor_types, vec![SensorKind::SoilMoisture]);
        assert_eq!(stations[0].identity.region, "Calabarzon");
    }

    #[test]
    fn test_run_stops_after_max_cycles() {
        let stations = stations_from_table(&StationTable::builtin());
        let mode = SimulationMode {
            update_interval: Duration::from_millis(1),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = 0;
        let done = mode
            .run(&stations, &mut rng, Some(3), |_| {
                seen += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(done, 3);
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_run_propagates_sink_error() {
        let stations = stations_from_table(&StationTable::builtin());
        let mut rng = StdRng::seed_from_u64(1);
        let result = SimulationMode::new().run(&stations, &mut rng, None, |_| {
            Err(WxError::Io("disk full".into()))
        });
        assert_eq!(result, Err(WxError::Io("disk full".into())));
    }
}
