//! Trade route scanning against a local market API, plus monitoring of its
//! cache prewarm job.
//!
//! [`domain`] holds the pure pipeline (payload normalization, route scoring,
//! freshness classification, status aggregation), [`infra`] the HTTP client,
//! and [`app`] the refresh controller that drives both and owns shared state.

pub mod app;
pub mod config;
pub mod domain;
pub mod infra;

pub use app::{MarketFeed, RefreshController};
pub use config::{MonitorConfig, ScanMode, ScanParams};
pub use domain::{CacheStatus, DashState, DataSource, Route, RouteFilter, RouteSort};
pub use infra::{ApiError, ScanApiClient};
