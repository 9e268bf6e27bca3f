pub mod collector;
pub mod progress;
pub mod report;

pub use collector::{EndpointRow, FailureRow, StatsCollector, StatsSnapshot, UserCounts};
