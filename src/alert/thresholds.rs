//! Weather alert classification.
//!
//! Rules are evaluated top to bottom and the first match wins, so a reading
//! that is both very wet and very windy only surfaces the rainfall alert.
//! The order is relied on by dashboards in the field and must not change.
//! Each call is stateless; there is no hysteresis or debouncing.

use std::fmt;

use crate::model::StationReading;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

pub const HEAVY_RAINFALL_MM: f64 = 50.0;
pub const HIGH_WIND_SPEED: f64 = 25.0;
pub const EXTREME_HEAT_C: f64 = 38.0;
pub const HIGH_HUMIDITY_PCT: f64 = 85.0;
pub const HUMID_HEAT_C: f64 = 30.0;
pub const LOW_PRESSURE_HPA: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Verdict types
// ---------------------------------------------------------------------------

/// Alert severity levels, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertSeverity {
    None,
    Warning,
    Danger,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::None => write!(f, "none"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Danger => write!(f, "danger"),
        }
    }
}

/// Dashboard language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Tl,
}

impl Locale {
    pub fn from_code(code: &str) -> Option<Locale> {
        match code {
            "en" => Some(Locale::En),
            "tl" => Some(Locale::Tl),
            _ => None,
        }
    }
}

/// Key into the localized alert message catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    HeavyRainfall,
    HighWind,
    ExtremeHeat,
    HighHumidity,
    LowPressure,
}

impl MessageKey {
    pub fn message(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, MessageKey::HeavyRainfall) => "Heavy rainfall detected",
            (Locale::En, MessageKey::HighWind) => "High wind speed - Potential typhoon warning",
            (Locale::En, MessageKey::ExtremeHeat) => "Extreme heat warning",
            (Locale::En, MessageKey::HighHumidity) => "Very high humidity - Flood risk",
            (Locale::En, MessageKey::LowPressure) => "Low pressure - Storm approaching",
            (Locale::Tl, MessageKey::HeavyRainfall) => "Mataas na ulan na natukoy",
            (Locale::Tl, MessageKey::HighWind) => "Mataas na bilis ng hangin - Posibleng babagyo",
            (Locale::Tl, MessageKey::ExtremeHeat) => "Alerto ng matinding init",
            (Locale::Tl, MessageKey::HighHumidity) => {
                "Napakataas na kahalumigaan - Panganib ng baha"
            }
            (Locale::Tl, MessageKey::LowPressure) => "Mababang presyon - Bagyo na paparating",
        }
    }
}

/// Banner colour family the UI paints the alert with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerStyle {
    Yellow,
    Red,
    Orange,
}

/// A weather alert raised for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertVerdict {
    pub severity: AlertSeverity,
    pub message_key: MessageKey,
}

impl AlertVerdict {
    fn new(severity: AlertSeverity, message_key: MessageKey) -> Self {
        Self {
            severity,
            message_key,
        }
    }

    pub fn message(&self, locale: Locale) -> &'static str {
        self.message_key.message(locale)
    }

    pub fn banner_style(&self) -> BannerStyle {
        match (self.message_key, self.severity) {
            (MessageKey::LowPressure, _) => BannerStyle::Orange,
            (_, AlertSeverity::Danger) => BannerStyle::Red,
            _ => BannerStyle::Yellow,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classifies a reading into at most one alert.
///
/// All comparisons are strict: a reading sitting exactly on a threshold
/// does not trigger it. Returns `None` for a calm reading.
pub fn classify(reading: &StationReading) -> Option<AlertVerdict> {
    classify_values(
        reading.temperature,
        reading.humidity,
        reading.pressure,
        reading.wind_speed,
        reading.rainfall,
    )
}

/// `classify` over bare values, for callers that have not built a
/// `StationReading`.
pub fn classify_values(
    temperature: f64,
    humidity: f64,
    pressure: f64,
    wind_speed: f64,
    rainfall: f64,
) -> Option<AlertVerdict> {
    use AlertSeverity::{Danger, Warning};

    if rainfall > HEAVY_RAINFALL_MM {
        Some(AlertVerdict::new(Warning, MessageKey::HeavyRainfall))
    } else if wind_speed > HIGH_WIND_SPEED {
        Some(AlertVerdict::new(Danger, MessageKey::HighWind))
    } else if temperature > EXTREME_HEAT_C {
        Some(AlertVerdict::new(Danger, MessageKey::ExtremeHeat))
    } else if humidity > HIGH_HUMIDITY_PCT && temperature > HUMID_HEAT_C {
        Some(AlertVerdict::new(Warning, MessageKey::HighHumidity))
    } else if pressure < LOW_PRESSURE_HPA {
        Some(AlertVerdict::new(Warning, MessageKey::LowPressure))
    } else {
        None
    }
}

/// Severity of a reading, `AlertSeverity::None` when calm.
pub fn severity_of(reading: &StationReading) -> AlertSeverity {
    classify(reading).map_or(AlertSeverity::None, |v| v.severity)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
