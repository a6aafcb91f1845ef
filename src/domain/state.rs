//! Shared dashboard state.
//!
//! One owned store, mutated only through the refresh controller; readers take
//! snapshots and never write.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::demo::demo_routes;
use super::freshness::{LastRun, PrewarmEntry};
use super::route::{sort_routes, Route, RouteFilter, RouteSort};
use super::summary::StatusSummary;

/// Where the displayed routes came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Demo,
    Live,
    Cached,
    /// Last scan failed. Distinct from a live scan with no matches.
    Error,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Demo => "demo",
            DataSource::Live => "live",
            DataSource::Cached => "cached",
            DataSource::Error => "error",
        }
    }
}

/// Active display language. The string tables themselves live with the
/// renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Cs,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Cs => "cs",
        }
    }
}

/// Snapshot of the prewarm monitor after the most recent poll.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorState {
    pub entries: Vec<PrewarmEntry>,
    pub summary: Option<StatusSummary>,
    pub last_run: Option<LastRun>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub polled_at: Option<OffsetDateTime>,
}

impl MonitorState {
    /// Timestamp shown in the "last run" header: the run's own times when the
    /// job reported them, otherwise the newest generation seen.
    pub fn last_run_time(&self) -> Option<OffsetDateTime> {
        self.last_run
            .as_ref()
            .and_then(LastRun::latest)
            .or_else(|| self.summary.as_ref().and_then(|s| s.latest_generated_at))
    }
}

/// Everything the dashboard renders from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashState {
    pub locale: Locale,
    pub routes: Vec<Route>,
    pub source: DataSource,
    /// True while a scan is in flight; doubles as the refresh-button guard.
    pub loading: bool,
    pub monitor: MonitorState,
}

impl Default for DashState {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            routes: demo_routes(),
            source: DataSource::Demo,
            loading: false,
            monitor: MonitorState::default(),
        }
    }
}

impl DashState {
    /// Filtered, sorted view of the current routes for display.
    pub fn visible_routes(
        &self,
        filter: &RouteFilter,
        sort: RouteSort,
        descending: bool,
    ) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .routes
            .iter()
            .filter(|route| filter.matches(route))
            .cloned()
            .collect();
        sort_routes(&mut routes, sort, descending);
        routes
    }
}
