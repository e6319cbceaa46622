//! Data ingestion: the station feed and live news.

pub mod news_api;
pub mod snapshot;
