use crate::core::catalog::CatalogOptions;
use crate::domain::model::{Operation, Outcome, Session};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn host(&self) -> &str;
    fn users(&self) -> usize;
    fn spawn_rate(&self) -> f64;
    fn run_time(&self) -> Option<Duration>;
    fn min_wait(&self) -> Duration;
    fn max_wait(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
    fn iterations(&self) -> Option<u64>;
    fn seed(&self) -> Option<u64>;
    fn authenticate(&self) -> bool;
    fn catalog_options(&self) -> CatalogOptions;

    fn output_dir(&self) -> &str;
    fn csv_prefix(&self) -> Option<&str>;
    fn json_report(&self) -> Option<&str>;
    fn report_interval(&self) -> Option<Duration>;
    fn monitor_enabled(&self) -> bool;
    fn exit_code_on_error(&self) -> i32;
}

/// Turns an operation into a request against the target.
///
/// Transport and HTTP failures are reported inside the returned record,
/// never as an error, so one bad response cannot stop a simulated user.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, operation: &Operation, session: &Session) -> Outcome;
}
