//! Manual event logging for stations.
//!
//! Operators record observations, maintenance and calibration visits
//! against a station. Events are grouped under a station key derived from
//! the display name and read back newest first. The log lives in memory;
//! the CLI persists it as JSON lines, one event per line.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::logging::{self, DataSource};
use crate::model::WxError;

/// Manila is UTC+8 year-round.
const MANILA_OFFSET_SECS: i32 = 8 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ManualObservation,
    Maintenance,
    Calibration,
    Alert,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::ManualObservation,
        EventType::Maintenance,
        EventType::Calibration,
        EventType::Alert,
        EventType::Other,
    ];

    pub fn id(self) -> &'static str {
        match self {
            EventType::ManualObservation => "manual_observation",
            EventType::Maintenance => "maintenance",
            EventType::Calibration => "calibration",
            EventType::Alert => "alert",
            EventType::Other => "other",
        }
    }

    pub fn from_id(id: &str) -> Option<EventType> {
        EventType::ALL.into_iter().find(|t| t.id() == id)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// What the operator entered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventData {
    pub description: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
    pub wind_speed: Option<f64>,
    pub notes: Option<String>,
}

/// A stored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub id: String,
    pub station_name: String,
    pub event_type: EventType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rainfall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub formatted_time: String,
}

impl LogEvent {
    pub fn station_key(&self) -> String {
        station_key(&self.station_name)
    }
}

/// Lowercased name with each whitespace run replaced by `_`.
/// Leading and trailing runs count too, so `" Laguna "` keys as `_laguna_`.
pub fn station_key(station_name: &str) -> String {
    let mut key = String::with_capacity(station_name.len());
    let mut in_space = false;
    for c in station_name.chars() {
        if c.is_whitespace() {
            if !in_space {
                key.push('_');
            }
            in_space = true;
        } else {
            key.extend(c.to_lowercase());
            in_space = false;
        }
    }
    key
}

/// `MM/DD/YYYY, hh:mm:ss AM` in Manila time.
pub fn manila_time(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(MANILA_OFFSET_SECS) {
        Some(offset) => at
            .with_timezone(&offset)
            .format("%m/%d/%Y, %I:%M:%S %p")
            .to_string(),
        None => at.format("%m/%d/%Y, %I:%M:%S %p UTC").to_string(),
    }
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    by_station: BTreeMap<String, Vec<LogEvent>>,
    next_seq: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event at `now` and returns its id.
    ///
    /// Ids sort by creation time: epoch millis, then a per-log sequence
    /// number to keep events logged in the same millisecond distinct.
    pub fn log_at(
        &mut self,
        station_name: &str,
        event_type: EventType,
        data: EventData,
        now: DateTime<Utc>,
    ) -> String {
        let timestamp = now.timestamp_millis();
        let id = format!("{:013}-{:04}", timestamp, self.next_seq);
        self.next_seq += 1;

        let event = LogEvent {
            id: id.clone(),
            station_name: station_name.to_string(),
            event_type,
            description: data.description,
            temperature: data.temperature,
            humidity: data.humidity,
            rainfall: data.rainfall,
            wind_speed: data.wind_speed,
            notes: data.notes,
            timestamp,
            formatted_time: manila_time(now),
        };
        logging::info(
            DataSource::Events,
            Some(station_name),
            &format!("Logged {} event {}", event_type, id),
        );
        self.insert(event);
        id
    }

    pub fn log(&mut self, station_name: &str, event_type: EventType, data: EventData) -> String {
        self.log_at(station_name, event_type, data, Utc::now())
    }

    fn insert(&mut self, event: LogEvent) {
        self.by_station
            .entry(event.station_key())
            .or_default()
            .push(event);
    }

    /// Up to `limit` most recent events for a station, newest first.
    pub fn recent(&self, station_name: &str, limit: usize) -> Vec<&LogEvent> {
        let Some(events) = self.by_station.get(&station_key(station_name)) else {
            return Vec::new();
        };
        let mut sorted: Vec<&LogEvent> = events.iter().collect();
        sort_newest_first(&mut sorted);
        sorted.truncate(limit);
        sorted
    }

    /// Every event across all stations, newest first.
    pub fn all(&self) -> Vec<&LogEvent> {
        let mut all: Vec<&LogEvent> = self.by_station.values().flatten().collect();
        sort_newest_first(&mut all);
        all
    }

    /// Removes one event. Returns whether it existed.
    pub fn delete(&mut self, station_name: &str, event_id: &str) -> bool {
        let key = station_key(station_name);
        let Some(events) = self.by_station.get_mut(&key) else {
            return false;
        };
        let before = events.len();
        events.retain(|e| e.id != event_id);
        let removed = events.len() != before;
        if events.is_empty() {
            self.by_station.remove(&key);
        }
        if removed {
            logging::info(
                DataSource::Events,
                Some(station_name),
                &format!("Deleted event {}", event_id),
            );
        }
        removed
    }

    /// Removes every event for a station. Returns how many were removed.
    pub fn clear(&mut self, station_name: &str) -> usize {
        let removed = self
            .by_station
            .remove(&station_key(station_name))
            .map_or(0, |events| events.len());
        logging::info(
            DataSource::Events,
            Some(station_name),
            &format!("Cleared {} events", removed),
        );
        removed
    }

    pub fn len(&self) -> usize {
        self.by_station.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_station.is_empty()
    }

    // -----------------------------------------------------------------------
    // JSON-lines persistence
    // -----------------------------------------------------------------------

    /// Loads a JSON-lines file. A missing file is an empty log; blank lines
    /// are skipped; a malformed line is an error naming its line number.
    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Self, WxError> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };

        let mut log = Self::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: LogEvent = serde_json::from_str(&line).map_err(|e| {
                WxError::Parse(format!("{} line {}: {}", path.display(), n + 1, e))
            })?;
            log.insert(event);
            log.next_seq += 1;
        }
        Ok(log)
    }

    /// Rewrites the whole file, oldest event first.
    pub fn save_jsonl(&self, path: impl AsRef<Path>) -> Result<(), WxError> {
        let mut events = self.all();
        events.reverse();
        let mut file = File::create(path)?;
        for event in events {
            writeln!(file, "{}", serde_json::to_string(event)?)?;
        }
        Ok(())
    }
}

/// Appends one event to a JSON-lines file, creating it if needed.
pub fn append_jsonl(path: impl AsRef<Path>, event: &LogEvent) -> Result<(), WxError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", serde_json::to_string(event)?)?;
    Ok(())
}

fn sort_newest_first(events: &mut [&LogEvent]) {
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 4, 5, 6).unwrap()
    }

    fn note(text: &str) -> EventData {
        EventData {
            description: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_station_key() {
        assert_eq!(station_key("Manila Weather Station"), "manila_weather_station");
        assert_eq!(station_key(" Laguna  Station "), "_laguna_station_");
        assert_eq!(station_key("Laguna \t\n Station"), "laguna_station");
        assert_ne!(station_key(" Laguna"), station_key("Laguna"));
    }

    #[test]
    fn test_manila_time_is_utc_plus_eight() {
        assert_eq!(manila_time(t0()), "08/01/2025, 12:05:06 PM");
    }

    #[test]
    fn test_event_type_ids() {
        assert_eq!(EventType::from_id("manual_observation"), Some(EventType::ManualObservation));
        assert_eq!(EventType::from_id("party"), None);
        assert_eq!(
            serde_json::to_string(&EventType::Calibration).unwrap(),
            "\"calibration\""
        );
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let mut log = EventLog::new();
        for i in 0..5 {
            log.log_at("Manila Station", EventType::Other, note(&format!("e{}", i)), t0() + Duration::minutes(i));
        }
        let recent = log.recent("manila station", 3);
        let descriptions: Vec<&str> = recent.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["e4", "e3", "e2"]);
    }

    #[test]
    fn test_same_millisecond_events_get_distinct_ids() {
        let mut log = EventLog::new();
        let a = log.log_at("X", EventType::Alert, note("a"), t0());
        let b = log.log_at("X", EventType::Alert, note("b"), t0());
        assert_ne!(a, b);
        assert_eq!(log.recent("X", 1)[0].description, "b");
    }

    #[test]
    fn test_all_spans_stations() {
        let mut log = EventLog::new();
        log.log_at("A", EventType::Maintenance, note("old"), t0());
        log.log_at("B", EventType::Calibration, note("new"), t0() + Duration::hours(1));
        let all = log.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].description, "new");
    }

    #[test]
    fn test_delete_and_clear() {
        let mut log = EventLog::new();
        let id = log.log_at("A", EventType::Other, note("x"), t0());
        log.log_at("A", EventType::Other, note("y"), t0());
        log.log_at("B", EventType::Other, note("z"), t0());

        assert!(log.delete("A", &id));
        assert!(!log.delete("A", &id), "second delete should be a no-op");
        assert_eq!(log.len(), 2);

        assert_eq!(log.clear("A"), 1);
        assert_eq!(log.clear("A"), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_jsonl_round_trip_preserves_order() {
        let dir = std::env::temp_dir().join(format!("autoweather-events-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("events.jsonl");
        let _ = std::fs::remove_file(&path);

        let mut log = EventLog::new();
        log.log_at(
            "Manila",
            EventType::ManualObservation,
            EventData {
                description: "Sky clearing".into(),
                temperature: Some(30.5),
                ..Default::default()
            },
            t0(),
        );
        log.log_at("Manila", EventType::Maintenance, note("Cleaned gauge"), t0() + Duration::minutes(1));
        log.save_jsonl(&path).unwrap();

        let loaded = EventLog::load_jsonl(&path).unwrap();
        let recent = loaded.recent("Manila", 10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].description, "Cleaned gauge");
        assert_eq!(recent[1].temperature, Some(30.5));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_append_rounds_accumulate_in_file() {
        let dir = std::env::temp_dir().join(format!("autoweather-append-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("events.jsonl");
        let _ = std::fs::remove_file(&path);

        // Each round reloads the file, logs one event and appends it, the
        // way the CLI records a single event per invocation.
        let mut ids = Vec::new();
        for (offset, text) in [(0, "Gauge checked"), (0, "Gauge recalibrated")] {
            let mut log = EventLog::load_jsonl(&path).unwrap();
            let id = log.log_at(
                "Laguna",
                EventType::Calibration,
                note(text),
                t0() + Duration::seconds(offset),
            );
            let event = log.all().into_iter().find(|e| e.id == id).unwrap().clone();
            append_jsonl(&path, &event).unwrap();
            ids.push(id);
        }
        assert_ne!(ids[0], ids[1], "same-millisecond events keep distinct ids");

        let loaded = EventLog::load_jsonl(&path).unwrap();
        let recent = loaded.recent("Laguna", 10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, ids[1]);
        assert_eq!(recent[0].description, "Gauge recalibrated");
        assert_eq!(recent[1].id, ids[0]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let log = EventLog::load_jsonl("/nonexistent/autoweather/events.jsonl").unwrap();
        assert!(log.is_empty());
    }
}
