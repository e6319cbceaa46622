//! Structured logging for the weather dashboard service.
//!
//! Every line carries a source tag and, where relevant, the station it is
//! about. Output goes to the console and optionally to an append-only
//! log file. The binary calls `init_logger` once at startup; before that,
//! logging calls are no-ops, which keeps library tests quiet.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<LogLevel> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Live station feed ingestion.
    Feed,
    /// Synthetic data cycle.
    Simulation,
    /// Device artifact generation.
    Device,
    News,
    Events,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Feed => write!(f, "FEED"),
            DataSource::Simulation => write!(f, "SIM"),
            DataSource::Device => write!(f, "DEVICE"),
            DataSource::News => write!(f, "NEWS"),
            DataSource::Events => write!(f, "EVENTS"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure, e.g. live news disabled or a rate limit.
    Expected,
    /// Unexpected failure - indicates service degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    min_level: LogLevel,
    log_file: Option<String>,
    /// Full timestamped lines on the console instead of the short form.
    console_timestamps: bool,
}

impl Logger {
    fn format_entry(level: LogLevel, source: DataSource, station: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, source, station_part, message)
    }

    fn log(&self, level: LogLevel, source: DataSource, station: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let entry = Self::format_entry(level, source, station, message);
        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, station_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, station_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger. Later calls replace the earlier settings.
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    let logger = Logger {
        min_level,
        log_file: log_file.map(String::from),
        console_timestamps,
    };
    if let Ok(mut slot) = LOGGER.lock() {
        *slot = Some(logger);
    }
}

fn emit(level: LogLevel, source: DataSource, station: Option<&str>, message: &str) {
    if let Ok(slot) = LOGGER.lock() {
        if let Some(logger) = slot.as_ref() {
            logger.log(level, source, station, message);
        }
    }
}

pub fn info(source: DataSource, station: Option<&str>, message: &str) {
    emit(LogLevel::Info, source, station, message);
}

pub fn warn(source: DataSource, station: Option<&str>, message: &str) {
    emit(LogLevel::Warning, source, station, message);
}

pub fn error(source: DataSource, station: Option<&str>, message: &str) {
    emit(LogLevel::Error, source, station, message);
}

pub fn debug(source: DataSource, station: Option<&str>, message: &str) {
    emit(LogLevel::Debug, source, station, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a live news fetch failure.
pub fn classify_news_failure(error_message: &str) -> FailureType {
    if error_message.contains("HTTP error: 429") || error_message.contains("HTTP error: 426") {
        // Rate limit / plan restriction on the free tier.
        FailureType::Expected
    } else if error_message.contains("HTTP error") || error_message.contains("Request failed") {
        FailureType::Unexpected
    } else if error_message.contains("Parse error") {
        // API shape changed.
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

/// Classify a local file sink failure (artifact or event log).
pub fn classify_io_failure(error_message: &str) -> FailureType {
    if error_message.contains("No such file") || error_message.contains("not found") {
        FailureType::Expected
    } else if error_message.contains("I/O error") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

fn log_classified(source: DataSource, subject: Option<&str>, failure: FailureType, message: &str) {
    match failure {
        FailureType::Expected => debug(source, subject, message),
        FailureType::Unexpected => error(source, subject, message),
        FailureType::Unknown => warn(source, subject, message),
    }
}

/// Log a news failure with automatic classification.
pub fn log_news_failure(region: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_news_failure(&error_msg);
    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);
    log_classified(DataSource::News, Some(region), failure_type, &message);
}

/// Log a file sink failure with classification.
pub fn log_io_failure(source: DataSource, path: &str, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_io_failure(&error_msg);
    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);
    log_classified(source, Some(path), failure_type, &message);
}

/// Log a summary of a simulation cycle.
pub fn log_cycle_summary(total: usize, alerts: usize) {
    let message = format!(
        "Simulation cycle complete: {} stations, {} with alerts",
        total, alerts
    );
    if total == 0 {
        warn(DataSource::Simulation, None, &message);
    } else {
        info(DataSource::Simulation, None, &message);
    }
}
