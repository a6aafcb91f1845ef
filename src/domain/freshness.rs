//! Freshness classification for prewarm cache entries.
//!
//! Status is always recomputed from the generation and expiry timestamps; the
//! upstream payload's own status field is never trusted, so a skewed server
//! clock cannot contradict the local classification.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Classification of one monitored system's cached scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Fresh,
    Stale,
    Missing,
    /// Poll dispatched, no response yet. Assigned by the refresh controller only.
    Loading,
    /// Poll failed or returned garbage. Assigned by the refresh controller only.
    Error,
}

impl CacheStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CacheStatus::Fresh => "fresh",
            CacheStatus::Stale => "stale",
            CacheStatus::Missing => "missing",
            CacheStatus::Loading => "loading",
            CacheStatus::Error => "error",
        }
    }
}

/// Parse an RFC 3339 timestamp; absent or unparseable values become `None`.
pub fn parse_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    raw.and_then(|value| OffsetDateTime::parse(value, &Rfc3339).ok())
}

/// Classify a cache entry against `now`.
///
/// No generation timestamp means the cache was never written (`Missing`). An
/// absent expiry never expires. The boundary is non-strict: `now` exactly at
/// the expiry still classifies `Fresh`.
pub fn classify(
    generated_at: Option<OffsetDateTime>,
    cache_expires_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> CacheStatus {
    if generated_at.is_none() {
        return CacheStatus::Missing;
    }
    match cache_expires_at {
        Some(expires) if now > expires => CacheStatus::Stale,
        _ => CacheStatus::Fresh,
    }
}

/// One row of the upstream prewarm status payload. The row's own `status`
/// field is deliberately not read.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SystemStatusRow {
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub start_system_id: Option<i64>,
    #[serde(default)]
    pub start_system_name: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub cache_expires_at: Option<String>,
}

/// Timestamps of the last prewarm run, passed through for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LastRun {
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
}

impl LastRun {
    /// The run's most relevant timestamp: finish time if recorded, else start.
    pub fn latest(&self) -> Option<OffsetDateTime> {
        let raw = self
            .finished_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.started_at.as_deref());
        parse_timestamp(raw)
    }
}

/// The whole prewarm status payload. A missing `systems` key fails
/// deserialization so the caller can treat the payload as malformed; the
/// upstream `summary` block is ignored and recomputed locally.
#[derive(Clone, Debug, Deserialize)]
pub struct PrewarmStatusPayload {
    pub systems: Vec<SystemStatusRow>,
    #[serde(default)]
    pub last_run: Option<LastRun>,
}

/// One monitored system with its classified status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrewarmEntry {
    pub system: String,
    pub start_system_id: Option<i64>,
    pub start_system_name: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub generated_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub cache_expires_at: Option<OffsetDateTime>,
    pub status: CacheStatus,
}

impl PrewarmEntry {
    /// Build an entry from an upstream row, classifying it against `now`.
    pub fn classified(row: &SystemStatusRow, now: OffsetDateTime) -> Self {
        let generated_at = parse_timestamp(row.generated_at.as_deref());
        let cache_expires_at = parse_timestamp(row.cache_expires_at.as_deref());
        Self {
            system: row.system.clone(),
            start_system_id: row.start_system_id,
            start_system_name: row.start_system_name.clone(),
            generated_at,
            cache_expires_at,
            status: classify(generated_at, cache_expires_at, now),
        }
    }

    /// Placeholder shown between poll dispatch and response.
    pub fn loading(system: &str) -> Self {
        Self {
            system: system.to_string(),
            start_system_id: None,
            start_system_name: None,
            generated_at: None,
            cache_expires_at: None,
            status: CacheStatus::Loading,
        }
    }

    /// Sentinel for a failed poll; timestamps stay unknown.
    pub fn errored(system: &str) -> Self {
        Self {
            system: system.to_string(),
            start_system_id: None,
            start_system_name: None,
            generated_at: None,
            cache_expires_at: None,
            status: CacheStatus::Error,
        }
    }

    pub fn display_name(&self) -> &str {
        self.start_system_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.system)
    }

    /// Human-readable age of the cached scan, `None` when never generated.
    pub fn age_string(&self, now: OffsetDateTime) -> Option<String> {
        let generated = self.generated_at?;
        let secs = (now - generated).whole_seconds().max(0);
        Some(if secs < 60 {
            format!("{secs}s")
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h", secs / 3600)
        } else {
            format!("{}d", secs / 86400)
        })
    }
}
