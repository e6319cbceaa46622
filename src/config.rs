//! Runtime configuration.
//!
//! Two sources:
//! - Deployment settings (data store connection fields, news API key,
//!   logging) come from environment variables, with `.env` support loaded
//!   by the binary via `dotenv`. Absent store fields are replaced with
//!   placeholders so generated device files are always complete.
//! - Station and component tables come from an optional TOML file; either
//!   section may be omitted to keep the built-in table.

use std::env;
use std::path::Path;

use serde::Deserialize;

use crate::components::ComponentCatalog;
use crate::logging::LogLevel;
use crate::model::WxError;
use crate::stations::StationTable;

/// NewsAPI key value meaning "no key configured".
pub const DEMO_NEWS_KEY: &str = "demo";

// ---------------------------------------------------------------------------
// Deployment configuration
// ---------------------------------------------------------------------------

/// Connection parameters for the remote data store, as handed to devices.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub database_url: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

impl StoreConfig {
    /// Placeholder values used for every field the environment leaves out.
    pub fn placeholders() -> Self {
        Self {
            api_key: "YOUR_FIREBASE_API_KEY".to_string(),
            auth_domain: "your-project.firebaseapp.com".to_string(),
            database_url: "https://your-project-default-rtdb.firebasedatabase.app".to_string(),
            project_id: "your-project".to_string(),
            storage_bucket: "your-project.appspot.com".to_string(),
            messaging_sender_id: "000000000000".to_string(),
            app_id: "1:000000000000:web:0000000000000000".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::placeholders()
    }
}

/// Strongly typed deployment configuration, immutable after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store: StoreConfig,
    /// NewsAPI key; `DEMO_NEWS_KEY` disables live news.
    pub news_api_key: String,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::placeholders(),
            news_api_key: DEMO_NEWS_KEY.to_string(),
            log_level: LogLevel::Info,
            log_file: None,
        }
    }
}

/// Load configuration from the process environment.
///
/// Optional, all of them:
/// - `FIREBASE_API_KEY`, `FIREBASE_AUTH_DOMAIN`, `FIREBASE_DATABASE_URL`,
///   `FIREBASE_PROJECT_ID`, `FIREBASE_STORAGE_BUCKET`,
///   `FIREBASE_MESSAGING_SENDER_ID`, `FIREBASE_APP_ID`
/// - `NEWS_API_KEY` (default: "demo")
/// - `AUTOWEATHER_LOG_LEVEL`: debug/info/warn/error (default: info)
/// - `AUTOWEATHER_LOG_FILE`: append log lines to this file
pub fn load_from_env() -> Result<Config, WxError> {
    load_with(|name| env::var(name).ok())
}

/// Load configuration through an arbitrary variable lookup. Empty values
/// count as unset.
pub fn load_with<F>(lookup: F) -> Result<Config, WxError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let defaults = StoreConfig::placeholders();

    let store = StoreConfig {
        api_key: get("FIREBASE_API_KEY").unwrap_or(defaults.api_key),
        auth_domain: get("FIREBASE_AUTH_DOMAIN").unwrap_or(defaults.auth_domain),
        database_url: get("FIREBASE_DATABASE_URL").unwrap_or(defaults.database_url),
        project_id: get("FIREBASE_PROJECT_ID").unwrap_or(defaults.project_id),
        storage_bucket: get("FIREBASE_STORAGE_BUCKET").unwrap_or(defaults.storage_bucket),
        messaging_sender_id: get("FIREBASE_MESSAGING_SENDER_ID")
            .unwrap_or(defaults.messaging_sender_id),
        app_id: get("FIREBASE_APP_ID").unwrap_or(defaults.app_id),
    };

    let log_level = match get("AUTOWEATHER_LOG_LEVEL") {
        Some(level) => LogLevel::parse(&level)
            .ok_or_else(|| WxError::Config(format!("Invalid AUTOWEATHER_LOG_LEVEL: {}", level)))?,
        None => LogLevel::Info,
    };

    Ok(Config {
        store,
        news_api_key: get("NEWS_API_KEY").unwrap_or_else(|| DEMO_NEWS_KEY.to_string()),
        log_level,
        log_file: get("AUTOWEATHER_LOG_FILE"),
    })
}

fn mask(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", secret.chars().take(4).collect::<String>())
    }
}

impl Config {
    pub fn live_news_enabled(&self) -> bool {
        self.news_api_key != DEMO_NEWS_KEY
    }

    /// Log the loaded configuration, masking keys.
    pub fn log_config(&self) {
        use crate::logging::{DataSource, debug};

        debug(DataSource::System, None, "Configuration loaded:");
        debug(
            DataSource::System,
            None,
            &format!("  FIREBASE_DATABASE_URL : {}", self.store.database_url),
        );
        debug(
            DataSource::System,
            None,
            &format!("  FIREBASE_PROJECT_ID   : {}", self.store.project_id),
        );
        debug(
            DataSource::System,
            None,
            &format!("  FIREBASE_API_KEY      : {}", mask(&self.store.api_key)),
        );
        debug(
            DataSource::System,
            None,
            &format!(
                "  NEWS_API_KEY          : {}",
                if self.live_news_enabled() {
                    mask(&self.news_api_key)
                } else {
                    DEMO_NEWS_KEY.to_string()
                }
            ),
        );
    }
}

// ---------------------------------------------------------------------------
// Catalog file
// ---------------------------------------------------------------------------

/// Station and component tables in effect for this process.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalogs {
    pub stations: StationTable,
    pub components: ComponentCatalog,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    stations: Option<StationTable>,
    components: Option<ComponentCatalog>,
}

impl Catalogs {
    /// Parses a TOML catalog override. Omitted sections keep the built-ins;
    /// present sections are validated as they are deserialized.
    pub fn from_toml_str(text: &str) -> Result<Self, WxError> {
        let file: CatalogFile =
            toml::from_str(text).map_err(|e| WxError::Config(e.to_string()))?;
        Ok(Self {
            stations: file.stations.unwrap_or_default(),
            components: file.components.unwrap_or_default(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WxError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| WxError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }
}
