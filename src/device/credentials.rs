//! Device credentials file.
//!
//! The JSON document an ESP32 reads to reach the data store. Field names
//! match what the device firmware SDK expects, so they are fixed.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;

pub const DEVICE_TYPE: &str = "ESP32";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCredentials {
    pub firebase_api_key: String,
    pub firebase_auth_domain: String,
    pub firebase_database_url: String,
    pub firebase_project_id: String,
    pub firebase_storage_bucket: String,
    pub firebase_messaging_sender_id: String,
    pub firebase_app_id: String,
    pub device_type: String,
    pub created_at: String,
}

impl DeviceCredentials {
    /// Builds credentials from the deployment's store settings. `StoreConfig`
    /// already carries placeholders for anything the environment left out.
    pub fn from_store(store: &StoreConfig, now: DateTime<Utc>) -> Self {
        Self {
            firebase_api_key: store.api_key.clone(),
            firebase_auth_domain: store.auth_domain.clone(),
            firebase_database_url: store.database_url.clone(),
            firebase_project_id: store.project_id.clone(),
            firebase_storage_bucket: store.storage_bucket.clone(),
            firebase_messaging_sender_id: store.messaging_sender_id.clone(),
            firebase_app_id: store.app_id.clone(),
            device_type: DEVICE_TYPE.to_string(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Database host in the legacy `*.firebaseio.com` form the device
    /// library connects to.
    pub fn database_host(&self) -> String {
        let host = self
            .firebase_database_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .trim_end_matches(".firebasedatabase.app")
            .trim_end_matches(".firebaseio.com");
        format!("{}.firebaseio.com", host)
    }

    /// Pretty-printed JSON, as written to the downloadable file.
    pub fn to_json_pretty(&self) -> String {
        // Plain string fields; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
