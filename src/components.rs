//! Hardware component catalog.
//!
//! Each physical sensing role (rainfall, wind speed) can be fulfilled by
//! several interchangeable parts, each wired to its own pin and carrying its
//! own calibration constant. The catalog is static data: a built-in copy
//! ships with the service and a replacement can be loaded from TOML.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;

use crate::model::WxError;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRole {
    Rainfall,
    WindSpeed,
}

impl ComponentRole {
    pub const ALL: [ComponentRole; 2] = [ComponentRole::Rainfall, ComponentRole::WindSpeed];

    /// Prefix for the role's firmware `#define`s.
    pub fn define_prefix(self) -> &'static str {
        match self {
            ComponentRole::Rainfall => "RAINFALL",
            ComponentRole::WindSpeed => "WIND_SPEED",
        }
    }

    /// Name of the calibration constant in the firmware.
    pub fn calibration_define(self) -> &'static str {
        match self {
            ComponentRole::Rainfall => "RAINFALL_MM_PER_TIP",
            ComponentRole::WindSpeed => "WIND_SPEED_CALIBRATION",
        }
    }

    pub fn calibration_unit(self) -> &'static str {
        match self {
            ComponentRole::Rainfall => "mm per tip",
            ComponentRole::WindSpeed => "km/h per Hz",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ComponentRole::Rainfall => "Rainfall",
            ComponentRole::WindSpeed => "Wind Speed",
        }
    }
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// A component's calibration: a numeric scale, or a serial-protocol part
/// that reports engineering units directly.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "CalibrationRepr")]
pub enum Calibration {
    Scale(f64),
    Serial,
}

pub const SERIAL_MARKER: &str = "uses serial protocol, no numeric scale";

#[derive(Deserialize)]
#[serde(untagged)]
enum CalibrationRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<CalibrationRepr> for Calibration {
    type Error = WxError;

    fn try_from(repr: CalibrationRepr) -> Result<Self, Self::Error> {
        let invalid = |raw: &str| WxError::Config(format!("invalid calibration '{}'", raw));
        // The value is emitted as a C literal; inf and NaN have no spelling there.
        let scale = match repr {
            CalibrationRepr::Number(v) if v.is_finite() => v,
            CalibrationRepr::Number(v) => return Err(invalid(&v.to_string())),
            CalibrationRepr::Text(s) if s.eq_ignore_ascii_case("serial") => {
                return Ok(Calibration::Serial);
            }
            CalibrationRepr::Text(s) if s == SERIAL_MARKER => return Ok(Calibration::Serial),
            CalibrationRepr::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => return Err(invalid(&s)),
            },
        };
        Ok(Calibration::Scale(scale))
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Calibration::Scale(v) => write!(f, "{}", v),
            Calibration::Serial => f.write_str(SERIAL_MARKER),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// One interchangeable hardware option for a sensing role.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentProfile {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "pins")]
    pub pin_assignment: String,
    pub calibration: Calibration,
    pub description: String,
}

impl ComponentProfile {
    /// GPIO number from the pin description, e.g. 36 from "ADC0 (GPIO_36)"
    /// or 16 from "RX/TX (GPIO_16/17)".
    pub fn gpio_number(&self) -> Option<u8> {
        let rest = &self.pin_assignment[self.pin_assignment.find("GPIO_")? + 5..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

#[derive(Debug, Deserialize)]
struct RoleCatalogFile {
    default: String,
    #[serde(rename = "alternative")]
    alternatives: Vec<ComponentProfile>,
}

/// All alternatives for one role plus the designated default.
///
/// Invariants: ids are unique and `default_id` is among them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RoleCatalogFile")]
pub struct RoleCatalog {
    default_id: String,
    alternatives: Vec<ComponentProfile>,
}

impl TryFrom<RoleCatalogFile> for RoleCatalog {
    type Error = WxError;

    fn try_from(file: RoleCatalogFile) -> Result<Self, Self::Error> {
        RoleCatalog::new(file.default, file.alternatives)
    }
}

impl RoleCatalog {
    pub fn new(default_id: String, alternatives: Vec<ComponentProfile>) -> Result<Self, WxError> {
        let mut seen = BTreeSet::new();
        for c in &alternatives {
            if !seen.insert(c.id.as_str()) {
                return Err(WxError::Config(format!("duplicate component id '{}'", c.id)));
            }
        }
        if !seen.contains(default_id.as_str()) {
            return Err(WxError::Config(format!(
                "default component '{}' is not among the alternatives",
                default_id
            )));
        }
        Ok(Self {
            default_id,
            alternatives,
        })
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn alternatives(&self) -> &[ComponentProfile] {
        &self.alternatives
    }

    pub fn find(&self, id: &str) -> Option<&ComponentProfile> {
        self.alternatives.iter().find(|c| c.id == id)
    }

    pub fn default_component(&self) -> &ComponentProfile {
        self.find(&self.default_id).unwrap_or(&self.alternatives[0])
    }

    /// Looks up a component, falling back to the role default for a
    /// missing or unknown id.
    pub fn resolve(&self, id: Option<&str>) -> &ComponentProfile {
        id.and_then(|id| self.find(id))
            .unwrap_or_else(|| self.default_component())
    }
}

/// Catalog of both roles.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentCatalog {
    pub rainfall: RoleCatalog,
    #[serde(rename = "wind_speed")]
    pub wind_speed: RoleCatalog,
}

impl ComponentCatalog {
    pub fn role(&self, role: ComponentRole) -> &RoleCatalog {
        match role {
            ComponentRole::Rainfall => &self.rainfall,
            ComponentRole::WindSpeed => &self.wind_speed,
        }
    }

    pub fn resolve(&self, role: ComponentRole, id: Option<&str>) -> &ComponentProfile {
        self.role(role).resolve(id)
    }

    pub fn builtin() -> Self {
        Self {
            rainfall: builtin_role("TipBucket_RainGauge", RAINFALL_PARTS),
            wind_speed: builtin_role("Anemometer_3Cup", WIND_SPEED_PARTS),
        }
    }
}

impl Default for ComponentCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// (id, name, pins, calibration, description)
type PartRow = (&'static str, &'static str, &'static str, Calibration, &'static str);

fn builtin_role(default_id: &str, rows: &[PartRow]) -> RoleCatalog {
    RoleCatalog {
        default_id: default_id.to_string(),
        alternatives: rows
            .iter()
            .map(|(id, name, pins, calibration, description)| ComponentProfile {
                id: id.to_string(),
                display_name: name.to_string(),
                pin_assignment: pins.to_string(),
                calibration: *calibration,
                description: description.to_string(),
            })
            .collect(),
    }
}

static RAINFALL_PARTS: &[PartRow] = &[
    (
        "TipBucket_RainGauge",
        "Tip Bucket Rain Gauge (Default)",
        "GPIO_35",
        Calibration::Scale(0.254),
        "Standard tipping bucket with magnetic reed switch",
    ),
    (
        "reedSwitch_RainGauge",
        "Reed Switch Rain Gauge",
        "GPIO_35",
        Calibration::Scale(0.2),
        "Direct reed switch with magnet-triggered bucket",
    ),
    (
        "capac_RainSensor",
        "Capacitive Rain Sensor",
        "ADC0 (GPIO_36)",
        Calibration::Scale(0.5),
        "Analog capacitive sensor for gradual rainfall detection",
    ),
    (
        "optical_RainGauge",
        "Optical Rain Gauge",
        "GPIO_32",
        Calibration::Scale(0.254),
        "Optical sensor detects bucket tip motion",
    ),
];

static WIND_SPEED_PARTS: &[PartRow] = &[
    (
        "Anemometer_3Cup",
        "3-Cup Anemometer (Default)",
        "GPIO_34",
        Calibration::Scale(2.4),
        "Traditional 3-cup anemometer with reed switch",
    ),
    (
        "reedSwitch_Anemometer",
        "Reed Switch Anemometer",
        "GPIO_34",
        Calibration::Scale(2.0),
        "Magnet on cup rotor triggers reed switch for each rotation",
    ),
    (
        "hotwire_Anemometer",
        "Hot Wire Anemometer",
        "ADC1 (GPIO_39)",
        Calibration::Scale(1.0),
        "Analog hot wire sensor for fine wind speed resolution",
    ),
    (
        "sonic_Anemometer",
        "Sonic Anemometer",
        "RX/TX (GPIO_16/17)",
        Calibration::Serial,
        "Ultrasonic sensor with serial output (higher accuracy)",
    ),
    (
        "propeller_Anemometer",
        "Propeller Anemometer",
        "GPIO_32",
        Calibration::Scale(1.8),
        "Propeller rotor with reed switch counting",
    ),
];
