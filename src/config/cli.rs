use crate::core::catalog::CatalogOptions;
use crate::domain::model::{Credentials, OrderSchema, OrderTicket};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SwarmError};
use crate::utils::validation::{
    parse_duration, validate_host, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, validate_spawn_rate, validate_wait_bounds, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn duration_arg(input: &str) -> std::result::Result<Duration, String> {
    parse_duration("duration", input).map_err(|e| e.to_string())
}

fn weight_arg(input: &str) -> std::result::Result<(String, u32), String> {
    let (name, weight) = input
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=WEIGHT, got '{}'", input))?;
    let weight = weight
        .trim()
        .parse()
        .map_err(|_| format!("weight for '{}' must be a non-negative integer", name))?;
    Ok((name.trim().to_string(), weight))
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "trade-swarm")]
#[command(about = "Load generator for the stock trading API")]
pub struct CliConfig {
    /// Base URL of the target service
    #[arg(long, default_value = "http://localhost:3001")]
    pub host: String,

    /// Number of concurrent simulated users
    #[arg(short = 'u', long, default_value_t = 1)]
    pub users: usize,

    /// Users started per second
    #[arg(short = 'r', long, default_value_t = 1.0)]
    pub spawn_rate: f64,

    /// Stop after this long (e.g. 90, 30s, 5m, 1h); runs until Ctrl+C otherwise
    #[arg(short = 't', long, value_parser = duration_arg)]
    pub run_time: Option<Duration>,

    #[arg(long, default_value = "5s", value_parser = duration_arg)]
    pub min_wait: Duration,

    #[arg(long, default_value = "15s", value_parser = duration_arg)]
    pub max_wait: Duration,

    /// Per-request timeout
    #[arg(long, default_value = "30s", value_parser = duration_arg)]
    pub timeout: Duration,

    /// Tasks per user before it stops
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Seed for reproducible task and think-time sequences
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value = "AAPL")]
    pub symbol: String,

    #[arg(long, value_enum, default_value_t = OrderSchema::Company)]
    pub order_schema: OrderSchema,

    /// Only run these operations
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Never run these operations
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Operation weight override, NAME=WEIGHT (repeatable)
    #[arg(long = "weight", value_parser = weight_arg)]
    pub weights: Vec<(String, u32)>,

    /// Register and log in every user before its first task
    #[arg(long)]
    pub authenticate: bool,

    #[arg(long, default_value = "loadtest-{user}")]
    pub username: String,

    #[arg(long, default_value = "loadtest-{user}@example.com")]
    pub email: String,

    #[arg(long, default_value = "loadtest-password")]
    pub password: String,

    #[arg(long, default_value = ".")]
    pub output_dir: String,

    /// Write PREFIX_stats.csv and PREFIX_failures.csv
    #[arg(long = "csv")]
    pub csv_prefix: Option<String>,

    /// Write a JSON summary to this file
    #[arg(long = "json")]
    pub json_report: Option<String>,

    /// Progress log interval, 0 disables it
    #[arg(long, default_value = "10s", value_parser = duration_arg)]
    pub report_interval: Duration,

    #[arg(long, help = "Log CPU and memory of the generator process")]
    pub monitor: bool,

    #[arg(long, default_value_t = 1)]
    pub exit_code_on_error: i32,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "List the task catalog and exit")]
    pub list: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_host("host", &self.host)?;
        validate_positive_number("users", self.users, 1)?;
        validate_spawn_rate("spawn_rate", self.spawn_rate)?;
        validate_wait_bounds(self.min_wait, self.max_wait)?;
        validate_path("output_dir", &self.output_dir)?;
        validate_non_empty_string("symbol", &self.symbol)?;
        validate_range("exit_code_on_error", self.exit_code_on_error, 0, 255)?;

        if self.timeout.is_zero() {
            return Err(SwarmError::InvalidConfigValueError {
                field: "timeout".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than zero".to_string(),
            });
        }
        if let Some(prefix) = &self.csv_prefix {
            validate_path("csv", prefix)?;
        }
        if let Some(path) = &self.json_report {
            validate_path("json", path)?;
        }
        Ok(())
    }
}

impl ConfigProvider for CliConfig {
    fn host(&self) -> &str {
        &self.host
    }

    fn users(&self) -> usize {
        self.users
    }

    fn spawn_rate(&self) -> f64 {
        self.spawn_rate
    }

    fn run_time(&self) -> Option<Duration> {
        self.run_time
    }

    fn min_wait(&self) -> Duration {
        self.min_wait
    }

    fn max_wait(&self) -> Duration {
        self.max_wait
    }

    fn request_timeout(&self) -> Duration {
        self.timeout
    }

    fn iterations(&self) -> Option<u64> {
        self.iterations
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn authenticate(&self) -> bool {
        self.authenticate
    }

    fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            symbol: self.symbol.clone(),
            order: OrderTicket::default(),
            order_schema: self.order_schema,
            credentials: Credentials {
                username: self.username.clone(),
                email: self.email.clone(),
                password: self.password.clone(),
            },
            include: self.only.clone(),
            exclude: self.exclude.clone(),
            weights: self.weights.iter().cloned().collect(),
        }
    }

    fn output_dir(&self) -> &str {
        &self.output_dir
    }

    fn csv_prefix(&self) -> Option<&str> {
        self.csv_prefix.as_deref()
    }

    fn json_report(&self) -> Option<&str> {
        self.json_report.as_deref()
    }

    fn report_interval(&self) -> Option<Duration> {
        Some(self.report_interval).filter(|every| !every.is_zero())
    }

    fn monitor_enabled(&self) -> bool {
        self.monitor
    }

    fn exit_code_on_error(&self) -> i32 {
        self.exit_code_on_error
    }
}
