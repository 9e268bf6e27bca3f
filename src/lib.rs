pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod stats;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{http::HttpExecutor, storage::LocalStorage};
pub use config::toml_config::LoadProfile;
pub use core::catalog::{CatalogOptions, TaskCatalog};
pub use core::engine::{AttackEngine, AttackReport};
pub use core::swarm::{Swarm, SwarmSettings};
pub use core::wait_time::WaitTime;
pub use stats::{StatsCollector, StatsSnapshot};
pub use utils::error::{Result, SwarmError};
