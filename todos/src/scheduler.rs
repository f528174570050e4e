use todos_core::settings::interval::Interval;
use tracing::{debug, instrument};

use crate::app_state::SharedAppState;

/// clokwerk schedules in whole seconds at best.
fn to_clokwerk(interval: Interval) -> clokwerk::Interval {
    match interval {
        Interval::Millis(ms) => clokwerk::Interval::Seconds(ms.div_ceil(1000).max(1) as u32),
        Interval::Seconds(s) => clokwerk::Interval::Seconds(s.max(1) as u32),
        Interval::Minutes(m) => clokwerk::Interval::Minutes(m.max(1) as u32),
        Interval::Hours(h) => clokwerk::Interval::Hours(h.max(1) as u32),
    }
}

/// Periodically evicts expired rate limit counters and cache entries.
pub async fn setup_sweeper(
    app_state: SharedAppState,
) -> anyhow::Result<tokio::task::JoinHandle<anyhow::Result<()>>> {
    let stop_flag = app_state.stop_flag.clone();
    let mut scheduler = clokwerk::AsyncScheduler::new();

    {
        let app_state = app_state.clone();
        scheduler
            .every(to_clokwerk(app_state.settings.rate_limiting.sweep_interval))
            .run(move || {
                let app_state = app_state.clone();
                async move {
                    sweep_rate_limits(app_state).await;
                }
            });
    }
    {
        let app_state = app_state.clone();
        scheduler
            .every(to_clokwerk(app_state.settings.cache.sweep_interval))
            .run(move || {
                let app_state = app_state.clone();
                async move {
                    sweep_response_cache(app_state).await;
                }
            });
    }

    let handle = tokio::spawn(async move {
        while !stop_flag.is_stopped() {
            scheduler.run_pending().await;
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        debug!("Sweeper stopped");
        Ok(())
    });

    Ok(handle)
}

#[instrument(skip(app_state))]
async fn sweep_rate_limits(app_state: SharedAppState) {
    let removed = app_state.rate_limiter.sweep();
    debug!(
        "{} rate limit counters removed, {} left",
        removed,
        app_state.rate_limiter.len()
    );
}

#[instrument(skip(app_state))]
async fn sweep_response_cache(app_state: SharedAppState) {
    let removed = app_state.response_cache.sweep();
    debug!(
        "{} cache entries removed, {} left",
        removed,
        app_state.response_cache.len()
    );
}
