use crate::stats::collector::StatsCollector;
use crate::utils::monitor::SystemMonitor;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Logs a one-line progress summary every `every` until `stop` fires.
/// The task yields the number of lines logged.
pub fn spawn_progress_logger(
    stats: StatsCollector,
    monitor: SystemMonitor,
    every: Duration,
    stop: CancellationToken,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // 第一次 tick 立即觸發，略過
        ticker.tick().await;

        let mut lines = 0u64;
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    log_progress(&stats, &monitor);
                    lines += 1;
                }
            }
        }
        lines
    })
}

fn log_progress(stats: &StatsCollector, monitor: &SystemMonitor) {
    let elapsed = stats.elapsed().as_secs_f64();
    let requests = stats.total_requests();
    let failures = stats.total_failures();
    let rps = if elapsed > 0.0 {
        requests as f64 / elapsed
    } else {
        0.0
    };

    match monitor.describe() {
        Some(process) => tracing::info!(
            "📈 {:.0}s | users: {} | requests: {} | failures: {} | {:.2} req/s | {}",
            elapsed,
            stats.active_users(),
            requests,
            failures,
            rps,
            process
        ),
        None => tracing::info!(
            "📈 {:.0}s | users: {} | requests: {} | failures: {} | {:.2} req/s",
            elapsed,
            stats.active_users(),
            requests,
            failures,
            rps
        ),
    }
}
