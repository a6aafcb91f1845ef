//! Reduction of classified prewarm entries into a health summary.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::freshness::{CacheStatus, PrewarmEntry};

/// Aggregate over one status poll. Recomputed from scratch every poll, never
/// merged with a previous summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub fresh: usize,
    pub stale: usize,
    pub missing: usize,
    /// Every polled entry, loading and error included.
    pub total: usize,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub latest_generated_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub next_expiry_at: Option<OffsetDateTime>,
}

/// Count entries by status and track the newest generation and the earliest
/// upcoming expiry. Loading/error entries only contribute to `total`; expired
/// entries are past their expiry already, so only `Fresh` ones feed
/// `next_expiry_at`.
pub fn aggregate(entries: &[PrewarmEntry]) -> StatusSummary {
    let mut summary = StatusSummary {
        total: entries.len(),
        ..StatusSummary::default()
    };

    for entry in entries {
        match entry.status {
            CacheStatus::Fresh => summary.fresh += 1,
            CacheStatus::Stale => summary.stale += 1,
            CacheStatus::Missing => summary.missing += 1,
            CacheStatus::Loading | CacheStatus::Error => {}
        }

        if let Some(generated) = entry.generated_at {
            summary.latest_generated_at = Some(match summary.latest_generated_at {
                Some(latest) if latest >= generated => latest,
                _ => generated,
            });
        }

        if entry.status == CacheStatus::Fresh {
            if let Some(expires) = entry.cache_expires_at {
                summary.next_expiry_at = Some(match summary.next_expiry_at {
                    Some(next) if next <= expires => next,
                    _ => expires,
                });
            }
        }
    }

    summary
}
