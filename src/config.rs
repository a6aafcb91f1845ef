//! Scan and monitor parameter defaults.
//!
//! All values mirror the upstream service defaults so a bare `ScanParams::default()`
//! issues the same request the dashboard issues on first load. The structs
//! deserialize with per-field fallbacks so an embedding service can splice them
//! from its own config file.

use serde::{Deserialize, Serialize};

/// Start systems offered for scanning, major trade hubs first.
pub const START_LOCATIONS: [&str; 6] = ["Jita", "Perimeter", "Amarr", "Dodixie", "Rens", "Hek"];

/// Systems the monitor watches when none are configured.
pub const DEFAULT_MONITOR_SYSTEMS: [&str; 5] = ["Jita", "Amarr", "Dodixie", "Rens", "Hek"];

/// Which sourcing lists a scan should return.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Instant,
    List,
    #[default]
    Both,
}

impl ScanMode {
    /// Value sent on the wire in the `mode` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            ScanMode::Instant => "instant",
            ScanMode::List => "list",
            ScanMode::Both => "both",
        }
    }
}

/// Parameters for one scan request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    pub start_system: String,
    pub budget: f64,
    pub max_jumps: u32,
    pub min_security: f64,
    pub min_margin_pct: f64,
    pub sample_size: u32,
    pub order_pages: u32,
    pub mode: ScanMode,
    pub limit: u32,
    /// Upstream worker budget in seconds; the request timeout is derived from it.
    pub max_runtime_secs: u64,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            start_system: START_LOCATIONS[0].to_string(),
            budget: 10_000_000.0,
            max_jumps: 6,
            min_security: 0.5,
            min_margin_pct: 8.0,
            sample_size: 160,
            order_pages: 3,
            mode: ScanMode::Both,
            limit: 40,
            max_runtime_secs: 12,
        }
    }
}

/// Which systems the prewarm monitor polls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub systems: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            systems: DEFAULT_MONITOR_SYSTEMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
