//! Region-scoped news catalog.
//!
//! Each region carries a short list of items per audience. The built-in
//! catalog is compiled from `data/news.toml`; live articles come from
//! `ingest::news_api` and are shown in addition when enabled.

use serde::Deserialize;

use crate::logging::{self, DataSource};
use crate::model::{AudienceTarget, WxError};

const BUILTIN_NEWS: &str = include_str!("../data/news.toml");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsItem {
    pub region: String,
    pub audience: AudienceTarget,
    pub title: String,
    pub description: String,
    pub category: String,
    pub emoji: String,
}

#[derive(Debug, Deserialize)]
struct NewsFile {
    #[serde(default)]
    item: Vec<NewsItem>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewsCatalog {
    items: Vec<NewsItem>,
}

impl NewsCatalog {
    pub fn from_toml_str(text: &str) -> Result<Self, WxError> {
        let file: NewsFile = toml::from_str(text).map_err(|e| WxError::Config(e.to_string()))?;
        Ok(Self { items: file.item })
    }

    /// The compiled-in catalog. A broken data file yields an empty catalog
    /// and an error log line rather than a failed startup.
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_NEWS).unwrap_or_else(|e| {
            logging::error(DataSource::News, None, &format!("built-in news catalog: {}", e));
            Self::default()
        })
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    /// Items for `region` and `audience`, in catalog order. An absent or
    /// unknown region yields nothing.
    pub fn items_for(&self, region: Option<&str>, audience: AudienceTarget) -> Vec<&NewsItem> {
        let Some(region) = region else {
            return Vec::new();
        };
        self.items
            .iter()
            .filter(|item| item.region == region && item.audience == audience)
            .collect()
    }

    /// Regions with at least one item, in first-seen order.
    pub fn regions(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.region.as_str()) {
                seen.push(&item.region);
            }
        }
        seen
    }
}
