use crate::core::catalog::TaskCatalog;
use crate::core::session::authenticate;
use crate::core::wait_time::WaitTime;
use crate::domain::model::Session;
use crate::domain::ports::Executor;
use crate::stats::collector::StatsCollector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One simulated user: pick, execute, record, think, repeat.
pub struct SimulatedUser<E: Executor + ?Sized> {
    pub id: usize,
    pub catalog: Arc<TaskCatalog>,
    pub executor: Arc<E>,
    pub stats: StatsCollector,
    pub wait_time: WaitTime,
    pub iterations: Option<u64>,
    pub authenticate: bool,
    pub seed: Option<u64>,
}

impl<E: Executor + ?Sized> SimulatedUser<E> {
    /// Runs until `stop` is cancelled or the iteration limit is reached.
    /// Returns the number of tasks executed.
    ///
    /// The stop signal is only observed between requests: an in-flight
    /// request always completes and is recorded.
    pub async fn run(self, stop: CancellationToken) -> u64 {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.id as u64)),
            None => StdRng::from_entropy(),
        };
        let mut session = Session::anonymous(self.id);

        self.stats.user_started();
        tracing::debug!("User {} started", self.id);

        if self.authenticate && !stop.is_cancelled() {
            let executor = self.executor.as_ref();
            if let Err(e) = authenticate(executor, &self.catalog, &self.stats, &mut session).await {
                tracing::warn!("User {} continues unauthenticated: {}", self.id, e);
            }
        }

        let mut executed = 0u64;
        while !stop.is_cancelled() {
            let operation = self.catalog.pick(&mut rng);
            let outcome = self.executor.execute(operation, &session).await;
            self.stats.record(&outcome.record);
            executed += 1;

            if let Some(error) = &outcome.record.error {
                tracing::debug!("User {} {} failed: {}", self.id, operation.name, error);
            }

            if self.iterations.is_some_and(|limit| executed >= limit) {
                break;
            }

            let pause = self.wait_time.sample(&mut rng);
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        self.stats.user_stopped();
        tracing::debug!("User {} stopped after {} tasks", self.id, executed);
        executed
    }
}
