//! Transport layer for the upstream scan/prewarm service.

pub mod api;

pub use api::{ApiError, ScanApiClient};
