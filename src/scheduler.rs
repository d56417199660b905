//! Background maintenance jobs: rate limiter sweeps and expired-session
//! purges. Both are housekeeping, not correctness; the limiter and the
//! session resolver enforce their windows on every request regardless.

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::db::Store;
use crate::services::RateLimiter;

pub struct Maintenance {
    store: Store,
    limiter: Arc<RateLimiter>,
    config: Config,
}

/// Six-field cron for an every-N-minutes cadence. Intervals of an hour or
/// more switch to an hourly expression, since `*/N` on the minute field
/// wraps at 60 and would also fire on the wrap.
fn interval_cron(minutes: u32) -> String {
    if minutes >= 60 {
        format!("0 0 */{} * * *", (minutes / 60).clamp(1, 23))
    } else {
        format!("0 */{} * * * *", minutes.max(1))
    }
}

impl Maintenance {
    pub fn new(store: Store, limiter: Arc<RateLimiter>, config: Config) -> Self {
        Self {
            store,
            limiter,
            config,
        }
    }

    pub async fn start(&self) -> Result<JobScheduler> {
        let scheduler = JobScheduler::new().await?;

        let sweep_cron = interval_cron(self.config.security.rate_limit.sweep_interval_minutes);
        let limiter = self.limiter.clone();

        scheduler
            .add(Job::new_async(sweep_cron.as_str(), move |_uuid, _lock| {
                let limiter = limiter.clone();
                Box::pin(async move {
                    let removed = limiter.sweep();
                    if removed > 0 {
                        debug!(removed, "Rate limiter sweep evicted stale entries");
                    }
                })
            })?)
            .await?;

        let purge_cron = interval_cron(self.config.scheduler.session_purge_minutes);
        let store = self.store.clone();

        scheduler
            .add(Job::new_async(purge_cron.as_str(), move |_uuid, _lock| {
                let store = store.clone();
                Box::pin(async move {
                    let now = chrono::Utc::now().to_rfc3339();
                    match store.purge_expired_sessions(&now).await {
                        Ok(purged) if purged > 0 => {
                            info!(purged, "Purged expired sessions");
                        }
                        Ok(_) => {}
                        Err(e) => error!("Session purge failed: {}", e),
                    }
                })
            })?)
            .await?;

        scheduler.start().await?;
        info!(
            sweep = %sweep_cron,
            purge = %purge_cron,
            "Maintenance scheduler started"
        );

        Ok(scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::interval_cron;

    #[test]
    fn test_interval_cron_sub_hour() {
        assert_eq!(interval_cron(5), "0 */5 * * * *");
        assert_eq!(interval_cron(59), "0 */59 * * * *");
    }

    #[test]
    fn test_interval_cron_hourly_and_up() {
        assert_eq!(interval_cron(60), "0 0 */1 * * *");
        assert_eq!(interval_cron(120), "0 0 */2 * * *");
    }

    #[test]
    fn test_interval_cron_clamps_extremes() {
        assert_eq!(interval_cron(0), "0 */1 * * * *");
        assert_eq!(interval_cron(10_000), "0 0 */23 * * *");
    }
}
