use crate::adapters::http::HttpExecutor;
use crate::adapters::storage::LocalStorage;
use crate::core::catalog::TaskCatalog;
use crate::core::swarm::{Swarm, SwarmSettings};
use crate::domain::ports::ConfigProvider;
use crate::stats::collector::StatsSnapshot;
use crate::stats::progress::spawn_progress_logger;
use crate::stats::report::{print_summary, ReportWriter};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct AttackReport {
    pub snapshot: StatsSnapshot,
    pub report_files: Vec<String>,
    exit_code_on_error: i32,
}

impl AttackReport {
    /// Process exit code: the configured error code when any request failed.
    pub fn exit_code(&self) -> i32 {
        if self.snapshot.has_failures() {
            self.exit_code_on_error
        } else {
            0
        }
    }
}

/// Wires configuration, catalog, HTTP executor, swarm and reports together.
pub struct AttackEngine<C: ConfigProvider> {
    config: C,
    monitor: SystemMonitor,
}

impl<C: ConfigProvider> AttackEngine<C> {
    pub fn new(config: C) -> Self {
        let monitor = SystemMonitor::new(config.monitor_enabled());
        Self { config, monitor }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn catalog(&self) -> Result<TaskCatalog> {
        TaskCatalog::standard(&self.config.catalog_options())
    }

    pub async fn run(&self, shutdown: CancellationToken) -> Result<AttackReport> {
        let catalog = self.catalog()?;
        let settings = SwarmSettings::from_config(&self.config)?;
        let executor = HttpExecutor::new(self.config.host(), self.config.request_timeout())?;

        tracing::info!(
            "🎯 Target: {} ({} operations in catalog)",
            self.config.host(),
            catalog.len()
        );

        let swarm = Swarm::new(catalog, executor, settings)?;

        let progress_stop = shutdown.child_token();
        let progress = self.config.report_interval().map(|every| {
            spawn_progress_logger(
                swarm.stats().clone(),
                self.monitor.clone(),
                every,
                progress_stop.clone(),
            )
        });

        let snapshot = swarm.run(shutdown).await;

        progress_stop.cancel();
        if let Some(handle) = progress {
            match handle.await {
                Ok(lines) => tracing::debug!("Progress logger stopped after {} updates", lines),
                Err(e) => tracing::warn!("Progress logger ended abnormally: {}", e),
            }
        }

        let snapshot = snapshot?;
        print_summary(&snapshot);
        self.monitor.log_final_stats();

        let report_files = self.write_reports(&snapshot).await?;

        Ok(AttackReport {
            snapshot,
            report_files,
            exit_code_on_error: self.config.exit_code_on_error(),
        })
    }

    async fn write_reports(&self, snapshot: &StatsSnapshot) -> Result<Vec<String>> {
        let writer = ReportWriter::new(LocalStorage::new(self.config.output_dir()));
        let mut files = Vec::new();

        if let Some(prefix) = self.config.csv_prefix() {
            files.extend(writer.write_csv(prefix, snapshot).await?);
        }
        if let Some(path) = self.config.json_report() {
            files.push(writer.write_json(path, self.config.host(), snapshot).await?);
        }

        Ok(files)
    }
}
