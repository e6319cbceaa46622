//! Weather station dashboard service.
//!
//! Library half of the `autoweather` binary: station feed ingestion,
//! alert classification, synthetic data, device artifact generation,
//! regional news and manual event logging.

pub mod alert;
pub mod components;
pub mod config;
pub mod dev_mode;
pub mod device;
pub mod events;
pub mod generator;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod news;
pub mod stations;
