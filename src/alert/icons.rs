//! Decorative weather icon selection.
//!
//! This ladder is tuned for the card artwork, independently of the alert
//! thresholds in `thresholds`. The two share inputs and one cutoff
//! (rainfall > 50) but move separately; keep them apart.

/// Icon shown on a station card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKey {
    Storm,
    Rain,
    HotHumid,
    Hot,
    Sunny,
    Cold,
    PartlyCloudy,
}

impl IconKey {
    pub fn emoji(self) -> &'static str {
        match self {
            IconKey::Storm => "⛈️",
            IconKey::Rain => "🌧️",
            IconKey::HotHumid => "🥵",
            IconKey::Hot => "🔥",
            IconKey::Sunny => "☀️",
            IconKey::Cold => "❄️",
            IconKey::PartlyCloudy => "🌤️",
        }
    }
}

pub fn icon_for(temperature: f64, humidity: f64, rainfall: f64) -> IconKey {
    if rainfall > 50.0 {
        IconKey::Storm
    } else if rainfall > 20.0 {
        IconKey::Rain
    } else if humidity > 85.0 && temperature > 28.0 {
        IconKey::HotHumid
    } else if temperature > 35.0 {
        IconKey::Hot
    } else if temperature > 28.0 {
        IconKey::Sunny
    } else if temperature < 20.0 {
        IconKey::Cold
    } else {
        IconKey::PartlyCloudy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rain_ladder() {
        assert_eq!(icon_for(25.0, 60.0, 51.0), IconKey::Storm);
        assert_eq!(icon_for(25.0, 60.0, 50.0), IconKey::Rain);
        assert_eq!(icon_for(25.0, 60.0, 20.0), IconKey::PartlyCloudy);
    }

    #[test]
    fn test_humid_heat_checked_before_plain_heat() {
        // 36 °C would be "hot" on its own; humidity wins first.
        assert_eq!(icon_for(36.0, 90.0, 0.0), IconKey::HotHumid);
        assert_eq!(icon_for(36.0, 60.0, 0.0), IconKey::Hot);
    }

    #[test]
    fn test_icon_humidity_cutoff_differs_from_alert_cutoff() {
        // 29 °C / 90 % gets the humid icon but no humidity alert (alert needs > 30 °C).
        assert_eq!(icon_for(29.0, 90.0, 0.0), IconKey::HotHumid);
        assert!(crate::alert::thresholds::classify_values(29.0, 90.0, 1013.0, 5.0, 0.0).is_none());
    }

    #[test]
    fn test_temperature_bands() {
        assert_eq!(icon_for(30.0, 50.0, 0.0), IconKey::Sunny);
        assert_eq!(icon_for(19.9, 50.0, 0.0), IconKey::Cold);
        assert_eq!(icon_for(20.0, 50.0, 0.0), IconKey::PartlyCloudy);
        assert_eq!(icon_for(28.0, 50.0, 0.0), IconKey::PartlyCloudy);
    }

    #[test]
    fn test_emoji_mapping() {
        assert_eq!(IconKey::Storm.emoji(), "⛈️");
        assert_eq!(IconKey::PartlyCloudy.emoji(), "🌤️");
    }
}
