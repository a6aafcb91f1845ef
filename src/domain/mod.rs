//! Domain logic for route scanning and cache monitoring lives here.

pub mod demo;
pub mod freshness;
pub mod normalize;
pub mod route;
pub mod state;
pub mod summary;

pub use demo::demo_routes;
pub use freshness::{
    classify, parse_timestamp, CacheStatus, LastRun, PrewarmEntry, PrewarmStatusPayload,
    SystemStatusRow,
};
pub use normalize::{normalize, ScanPayload, ScanResults, ScanRow};
pub use route::{
    derive_demand, derive_risk, sort_routes, Route, RouteFilter, RouteSort, SecurityBand,
};
pub use state::{DashState, DataSource, Locale, MonitorState};
pub use summary::{aggregate, StatusSummary};
