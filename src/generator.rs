//! Synthetic sensor data.
//!
//! Produces plausible random readings for simulated stations. The values
//! are uniform over fixed ranges; only the extra sensors a station actually
//! carries are generated, so simulated documents have the same shape as the
//! live ones for that station.
//!
//! # Random source
//! `generate` takes the RNG as a parameter. Tests pass a seeded
//! `StdRng`; `generate_now` uses the thread-local generator.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::model::{AudienceTarget, SensorKind, StationIdentity, StationReading};

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

pub const TEMPERATURE_RANGE: (f64, f64) = (15.0, 38.0);
pub const HUMIDITY_RANGE: (f64, f64) = (40.0, 95.0);
pub const PRESSURE_RANGE: (f64, f64) = (1008.0, 1023.0);
pub const WIND_SPEED_RANGE: (f64, f64) = (2.0, 20.0);
pub const RAINFALL_RANGE: (f64, f64) = (0.0, 25.0);

pub const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Inclusive range for an extra sensor kind.
pub fn extra_range(kind: SensorKind) -> (f64, f64) {
    match kind {
        SensorKind::AtmosphericPressure => (1008.0, 1023.0),
        SensorKind::SolarRadiation => (0.0, 1000.0),
        SensorKind::SoilMoisture => (30.0, 80.0),
        SensorKind::UvIndex => (1.0, 12.0),
        SensorKind::Visibility => (5000.0, 10000.0),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The sensor half of a reading; identity is attached by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticReading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: &'static str,
    pub rainfall: f64,
    pub extra_sensors: BTreeMap<SensorKind, f64>,
}

impl SyntheticReading {
    pub fn into_station_reading(
        self,
        identity: StationIdentity,
        audience_focus: AudienceTarget,
        timestamp: DateTime<Utc>,
    ) -> StationReading {
        let sensor_types = self.extra_sensors.keys().copied().collect();
        StationReading {
            station_id: identity.station_id,
            station_name: identity.station_name,
            region: identity.region,
            province: identity.province,
            municipality: identity.municipality,
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction.to_string(),
            rainfall: self.rainfall,
            extra_sensors: self.extra_sensors,
            sensor_types,
            audience_focus,
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn draw<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    rng.random_range(lo..=hi)
}

fn draw_extra<R: Rng + ?Sized>(rng: &mut R, kind: SensorKind) -> f64 {
    let v = draw(rng, extra_range(kind));
    match kind {
        SensorKind::SolarRadiation => v.round(),
        SensorKind::Visibility => (v / 100.0).round() * 100.0,
        _ => round1(v),
    }
}

/// Generates one reading. Extra sensors appear for exactly the kinds in
/// `enabled`.
pub fn generate<R: Rng + ?Sized>(enabled: &BTreeSet<SensorKind>, rng: &mut R) -> SyntheticReading {
    let temperature = round1(draw(rng, TEMPERATURE_RANGE));
    let humidity = round1(draw(rng, HUMIDITY_RANGE));
    let pressure = round1(draw(rng, PRESSURE_RANGE));
    let wind_speed = round1(draw(rng, WIND_SPEED_RANGE));
    let wind_direction = COMPASS_POINTS[rng.random_range(0..COMPASS_POINTS.len())];
    let rainfall = round1(draw(rng, RAINFALL_RANGE));

    let extra_sensors = enabled
        .iter()
        .map(|&kind| (kind, draw_extra(rng, kind)))
        .collect();

    SyntheticReading {
        temperature,
        humidity,
        pressure,
        wind_speed,
        wind_direction,
        rainfall,
        extra_sensors,
    }
}

/// Convenience wrapper over the thread-local RNG.
pub fn generate_now(enabled: &BTreeSet<SensorKind>) -> SyntheticReading {
    generate(enabled, &mut rand::rng())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
