use crate::core::catalog::TaskCatalog;
use crate::core::user::SimulatedUser;
use crate::core::wait_time::WaitTime;
use crate::domain::ports::{ConfigProvider, Executor};
use crate::stats::collector::{StatsCollector, StatsSnapshot};
use crate::utils::error::{Result, SwarmError};
use crate::utils::validation::{validate_positive_number, validate_spawn_rate};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub struct SwarmSettings {
    pub users: usize,
    pub spawn_rate: f64,
    pub run_time: Option<Duration>,
    pub wait_time: WaitTime,
    pub iterations: Option<u64>,
    pub seed: Option<u64>,
    pub authenticate: bool,
}

impl SwarmSettings {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let settings = Self {
            users: config.users(),
            spawn_rate: config.spawn_rate(),
            run_time: config.run_time(),
            wait_time: WaitTime::between(config.min_wait(), config.max_wait())?,
            iterations: config.iterations(),
            seed: config.seed(),
            authenticate: config.authenticate(),
        };
        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<()> {
        validate_positive_number("users", self.users, 1)?;
        validate_spawn_rate("spawn_rate", self.spawn_rate)?;
        self.spawn_gap()?;
        Ok(())
    }

    /// Delay between two user spawns; rejects rates too small to express.
    fn spawn_gap(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(1.0 / self.spawn_rate).map_err(|_| {
            SwarmError::InvalidConfigValueError {
                field: "spawn_rate".to_string(),
                value: self.spawn_rate.to_string(),
                reason: "Spawn rate is too small to schedule users".to_string(),
            }
        })
    }
}

impl Default for SwarmSettings {
    fn default() -> Self {
        Self {
            users: 1,
            spawn_rate: 1.0,
            run_time: None,
            wait_time: WaitTime::default(),
            iterations: None,
            seed: None,
            authenticate: false,
        }
    }
}

/// Spawns and supervises the simulated users of one run.
pub struct Swarm<E: Executor + 'static> {
    catalog: Arc<TaskCatalog>,
    executor: Arc<E>,
    settings: SwarmSettings,
    stats: StatsCollector,
}

impl<E: Executor + 'static> Swarm<E> {
    pub fn new(catalog: TaskCatalog, executor: E, settings: SwarmSettings) -> Result<Self> {
        settings.check()?;
        Ok(Self {
            catalog: Arc::new(catalog),
            executor: Arc::new(executor),
            settings,
            stats: StatsCollector::new()?,
        })
    }

    /// Live statistics, shared with the running users.
    pub fn stats(&self) -> &StatsCollector {
        &self.stats
    }

    pub fn settings(&self) -> &SwarmSettings {
        &self.settings
    }

    /// Runs until `shutdown` fires, the run time elapses, or every user
    /// has finished its iterations.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<StatsSnapshot> {
        let stop = shutdown.child_token();
        let settings = &self.settings;

        tracing::info!(
            "🚀 Starting swarm: {} users at {:.2}/s, think time {:?}..{:?}",
            settings.users,
            settings.spawn_rate,
            settings.wait_time.min(),
            settings.wait_time.max()
        );

        if let Some(run_time) = settings.run_time {
            let timer = stop.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = timer.cancelled() => {}
                    _ = tokio::time::sleep(run_time) => {
                        tracing::info!("⏱️  Run time of {:?} reached, stopping users", run_time);
                        timer.cancel();
                    }
                }
            });
        }

        let mut users = JoinSet::new();
        let gap = settings.spawn_gap()?;

        for id in 0..settings.users {
            if stop.is_cancelled() {
                break;
            }

            let user = SimulatedUser {
                id,
                catalog: Arc::clone(&self.catalog),
                executor: Arc::clone(&self.executor),
                stats: self.stats.clone(),
                wait_time: settings.wait_time,
                iterations: settings.iterations,
                authenticate: settings.authenticate,
                seed: settings.seed,
            };
            users.spawn(user.run(stop.clone()));

            if id + 1 < settings.users {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = tokio::time::sleep(gap) => {}
                }
            }
        }

        tracing::info!("{} users spawned", users.len());

        let mut tasks = 0u64;
        while let Some(joined) = users.join_next().await {
            match joined {
                Ok(executed) => tasks += executed,
                Err(e) => tracing::error!("Simulated user task failed: {}", e),
            }
        }

        // 結束計時器
        stop.cancel();

        let snapshot = self.stats.snapshot();
        tracing::info!(
            "✅ Swarm finished: {} tasks, {} requests, {} failures in {:.2}s",
            tasks,
            snapshot.aggregated.requests,
            snapshot.aggregated.failures,
            snapshot.elapsed_secs
        );
        Ok(snapshot)
    }
}
