//! Population-wide averages from `GET /global-stats`.
//!
//! The dashboard compares one account against these numbers. They change
//! slowly, so a reply is reused for [`ClientConfig::stats_ttl`]. When the
//! endpoint cannot be reached, built-in baseline values stand in.
//!
//! [`ClientConfig::stats_ttl`]: crate::config::ClientConfig::stats_ttl

use postlens_queue::RetryPolicy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::{ApiClient, RequestOptions};
use crate::status::endpoints;

/// Averages across all analyzed accounts.
///
/// Fields missing from a reply take their baseline value; unknown fields are
/// kept in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalStats {
    pub karma_per_item: f64,
    pub activity_per_day: f64,
    pub comment_length: f64,
    pub controversy_pct: f64,
    /// Type-token ratio, as a percentage.
    pub ttr: f64,
    pub night_pct: f64,
    pub weekend_pct: f64,
    pub subreddit_count: f64,
    pub karma_efficiency: f64,
    pub total_users: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self {
            karma_per_item: 10.0,
            activity_per_day: 0.5,
            comment_length: 75.0,
            controversy_pct: 8.0,
            ttr: 40.0,
            night_pct: 15.0,
            weekend_pct: 30.0,
            subreddit_count: 6.0,
            karma_efficiency: 8.5,
            total_users: 0,
            extra: Map::new(),
        }
    }
}

pub(crate) struct CachedStats {
    fetched_at: Instant,
    stats: GlobalStats,
}

fn stats_retry() -> RetryPolicy {
    RetryPolicy::from_millis(2, 500)
}

impl ApiClient {
    /// Current global stats, from cache when fresh.
    ///
    /// Never fails: on error the baseline [`GlobalStats::default`] is
    /// returned and nothing is cached, so the next call tries again.
    /// Concurrent callers share one fetch.
    pub async fn global_stats(&self) -> GlobalStats {
        let ttl = self.config().stats_ttl();
        let mut cache = self.stats_cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < ttl {
                debug!("global stats served from cache");
                return cached.stats.clone();
            }
        }

        let options = RequestOptions::default().with_retry(stats_retry());
        match self.get::<GlobalStats>(endpoints::GLOBAL_STATS, options).await {
            Ok(stats) => {
                *cache = Some(CachedStats {
                    fetched_at: Instant::now(),
                    stats: stats.clone(),
                });
                stats
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch global stats, using defaults");
                GlobalStats::default()
            }
        }
    }
}
