//! Alerting for station readings.
//!
//! Submodules:
//! - `thresholds`: first-match alert classification and localized messages.
//! - `icons`: decorative card icon, on its own threshold ladder.

pub mod icons;
pub mod thresholds;

pub use icons::{IconKey, icon_for};
pub use thresholds::{AlertSeverity, AlertVerdict, BannerStyle, Locale, MessageKey, classify};
