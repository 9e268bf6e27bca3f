use crate::core::catalog::CatalogOptions;
use crate::domain::model::{Credentials, OrderSchema, OrderTicket};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SwarmError};
use crate::utils::validation::{
    parse_duration, validate_host, validate_log_level, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, validate_required_field, validate_resolved,
    validate_spawn_rate, validate_wait_bounds, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// A load profile read from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadProfile {
    pub target: TargetConfig,
    #[serde(default)]
    pub users: UsersConfig,
    #[serde(default)]
    pub think_time: ThinkTimeConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub auth: Option<AuthConfig>,
    pub report: Option<ReportConfig>,
    pub monitoring: Option<MonitoringConfig>,

    // 以下欄位在 TOML 解析後才計算
    #[serde(skip)]
    resolved: Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub host: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    pub count: usize,
    pub spawn_rate: f64,
    pub run_time: Option<String>,
    pub iterations: Option<u64>,
    pub seed: Option<u64>,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            count: 1,
            spawn_rate: 1.0,
            run_time: None,
            iterations: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinkTimeConfig {
    pub min: String,
    pub max: String,
}

impl Default for ThinkTimeConfig {
    fn default() -> Self {
        Self {
            min: "5s".to_string(),
            max: "15s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub symbol: Option<String>,
    pub order_schema: Option<OrderSchema>,
    pub order: Option<OrderTicket>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub weights: HashMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// An `[auth]` section turns authentication on unless set to false.
    #[serde(default = "default_auth_enabled")]
    pub enabled: bool,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_dir: Option<String>,
    pub csv_prefix: Option<String>,
    pub json: Option<String>,
    pub interval_seconds: Option<u64>,
    pub exit_code_on_error: Option<i32>,
}

fn default_auth_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enabled: bool,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Resolved {
    run_time: Option<Duration>,
    min_wait: Duration,
    max_wait: Duration,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static pattern"))
}

impl LoadProfile {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        let mut profile: Self = toml::from_str(&processed).map_err(|e| SwarmError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })?;
        profile.resolve()?;
        Ok(profile)
    }

    /// 替換環境變數 (例如 ${API_TOKEN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let name = &caps[1];
                std::env::var(name).unwrap_or_else(|_| {
                    tracing::warn!("⚠️  Environment variable {} is not set, placeholder kept", name);
                    format!("${{{}}}", name)
                })
            })
            .into_owned()
    }

    fn resolve(&mut self) -> Result<()> {
        self.resolved = Resolved {
            run_time: self
                .users
                .run_time
                .as_deref()
                .map(|text| parse_duration("users.run_time", text))
                .transpose()?,
            min_wait: parse_duration("think_time.min", &self.think_time.min)?,
            max_wait: parse_duration("think_time.max", &self.think_time.max)?,
        };
        Ok(())
    }

    /// Re-parses duration strings after a field was overridden.
    pub fn set_run_time(&mut self, run_time: Option<String>) -> Result<()> {
        self.users.run_time = run_time;
        self.resolve()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl Validate for LoadProfile {
    fn validate(&self) -> Result<()> {
        validate_host("target.host", &self.target.host)?;
        validate_positive_number("users.count", self.users.count, 1)?;
        validate_spawn_rate("users.spawn_rate", self.users.spawn_rate)?;
        validate_wait_bounds(self.resolved.min_wait, self.resolved.max_wait)?;
        validate_path("report.output_dir", self.output_dir())?;

        if let Some(timeout) = self.target.timeout_seconds {
            validate_range("target.timeout_seconds", timeout, 1, 3600)?;
        }
        if let Some(code) = self.report.as_ref().and_then(|r| r.exit_code_on_error) {
            validate_range("report.exit_code_on_error", code, 0, 255)?;
        }
        if let Some(auth) = self.auth.as_ref().filter(|auth| auth.enabled) {
            let password = validate_required_field("auth.password", &auth.password)?;
            validate_non_empty_string("auth.password", password)?;

            let fields = [
                ("auth.username", &auth.username),
                ("auth.email", &auth.email),
                ("auth.password", &auth.password),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    validate_resolved(field, value)?;
                }
            }
        }
        if let Some(level) = self.log_level() {
            validate_log_level("monitoring.log_level", level)?;
        }
        Ok(())
    }
}

impl ConfigProvider for LoadProfile {
    fn host(&self) -> &str {
        &self.target.host
    }

    fn users(&self) -> usize {
        self.users.count
    }

    fn spawn_rate(&self) -> f64 {
        self.users.spawn_rate
    }

    fn run_time(&self) -> Option<Duration> {
        self.resolved.run_time
    }

    fn min_wait(&self) -> Duration {
        self.resolved.min_wait
    }

    fn max_wait(&self) -> Duration {
        self.resolved.max_wait
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.target.timeout_seconds.unwrap_or(30))
    }

    fn iterations(&self) -> Option<u64> {
        self.users.iterations
    }

    fn seed(&self) -> Option<u64> {
        self.users.seed
    }

    fn authenticate(&self) -> bool {
        self.auth.as_ref().is_some_and(|auth| auth.enabled)
    }

    fn catalog_options(&self) -> CatalogOptions {
        let defaults = CatalogOptions::default();
        let default_credentials = Credentials::default();

        let credentials = match &self.auth {
            Some(auth) => Credentials {
                username: auth.username.clone().unwrap_or(default_credentials.username),
                email: auth.email.clone().unwrap_or(default_credentials.email),
                password: auth.password.clone().unwrap_or(default_credentials.password),
            },
            None => default_credentials,
        };

        CatalogOptions {
            symbol: self.catalog.symbol.clone().unwrap_or(defaults.symbol),
            order: self.catalog.order.clone().unwrap_or(defaults.order),
            order_schema: self.catalog.order_schema.unwrap_or(defaults.order_schema),
            credentials,
            include: self.catalog.include.clone(),
            exclude: self.catalog.exclude.clone(),
            weights: self.catalog.weights.clone(),
        }
    }

    fn output_dir(&self) -> &str {
        self.report
            .as_ref()
            .and_then(|r| r.output_dir.as_deref())
            .unwrap_or(".")
    }

    fn csv_prefix(&self) -> Option<&str> {
        self.report.as_ref().and_then(|r| r.csv_prefix.as_deref())
    }

    fn json_report(&self) -> Option<&str> {
        self.report.as_ref().and_then(|r| r.json.as_deref())
    }

    fn report_interval(&self) -> Option<Duration> {
        let seconds = self
            .report
            .as_ref()
            .and_then(|r| r.interval_seconds)
            .unwrap_or(10);
        (seconds > 0).then(|| Duration::from_secs(seconds))
    }

    fn monitor_enabled(&self) -> bool {
        self.monitoring.as_ref().is_some_and(|m| m.enabled)
    }

    fn exit_code_on_error(&self) -> i32 {
        self.report
            .as_ref()
            .and_then(|r| r.exit_code_on_error)
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"
[target]
host = "http://localhost:3001"
timeout_seconds = 10

[users]
count = 25
spawn_rate = 5.0
run_time = "10m"
seed = 42

[think_time]
min = "1s"
max = "3s"

[catalog]
symbol = "TSLA"
order_schema = "symbol"
exclude = ["register"]

[catalog.weights]
load_companies = 4

[auth]
enabled = true
username = "swarm-{user}"
password = "${TRADE_SWARM_TEST_PASSWORD}"

[report]
output_dir = "results"
csv_prefix = "run1"
interval_seconds = 0
"#;

    #[test]
    fn test_full_profile() {
        std::env::set_var("TRADE_SWARM_TEST_PASSWORD", "hunter2");
        let profile = LoadProfile::from_toml_str(PROFILE).unwrap();
        assert!(profile.validate().is_ok());

        assert_eq!(profile.users(), 25);
        assert_eq!(profile.run_time(), Some(Duration::from_secs(600)));
        assert_eq!(profile.min_wait(), Duration::from_secs(1));
        assert_eq!(profile.max_wait(), Duration::from_secs(3));
        assert_eq!(profile.request_timeout(), Duration::from_secs(10));
        assert!(profile.authenticate());
        assert_eq!(profile.report_interval(), None);
        assert_eq!(profile.output_dir(), "results");
        assert_eq!(profile.csv_prefix(), Some("run1"));

        let options = profile.catalog_options();
        assert_eq!(options.symbol, "TSLA");
        assert_eq!(options.order_schema, OrderSchema::Symbol);
        assert_eq!(options.credentials.username, "swarm-{user}");
        assert_eq!(options.credentials.password, "hunter2");
        assert_eq!(options.credentials.email, "loadtest-{user}@example.com");
        assert_eq!(options.weights.get("load_companies"), Some(&4));
    }

    #[test]
    fn test_minimal_profile_uses_defaults() {
        let profile = LoadProfile::from_toml_str("[target]\nhost = \"http://localhost:3001\"\n").unwrap();
        assert!(profile.validate().is_ok());
        assert_eq!(profile.users(), 1);
        assert_eq!(profile.min_wait(), Duration::from_secs(5));
        assert_eq!(profile.max_wait(), Duration::from_secs(15));
        assert!(!profile.authenticate());
        assert_eq!(profile.report_interval(), Some(Duration::from_secs(10)));
        assert_eq!(profile.exit_code_on_error(), 1);
    }

    #[test]
    fn test_unset_env_var_is_left_verbatim() {
        let text = "[target]\nhost = \"${TRADE_SWARM_SURELY_UNSET_HOST}\"\n";
        let profile = LoadProfile::from_toml_str(text).unwrap();
        assert_eq!(profile.host(), "${TRADE_SWARM_SURELY_UNSET_HOST}");
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_bad_duration_is_a_config_error() {
        let text = "[target]\nhost = \"http://localhost\"\n[think_time]\nmin = \"soon\"\nmax = \"15s\"\n";
        assert!(matches!(
            LoadProfile::from_toml_str(text),
            Err(SwarmError::InvalidConfigValueError { field, .. }) if field == "think_time.min"
        ));
    }

    #[test]
    fn test_auth_section_enables_authentication_by_default() {
        let text = "[target]\nhost = \"http://localhost\"\n[auth]\npassword = \"pw\"\n";
        let profile = LoadProfile::from_toml_str(text).unwrap();
        assert!(profile.validate().is_ok());
        assert!(profile.authenticate());
        assert_eq!(profile.catalog_options().credentials.password, "pw");
    }

    #[test]
    fn test_enabled_auth_requires_password() {
        let text = "[target]\nhost = \"http://localhost\"\n[auth]\nusername = \"swarm-{user}\"\n";
        let profile = LoadProfile::from_toml_str(text).unwrap();
        assert!(matches!(
            profile.validate(),
            Err(SwarmError::MissingConfigError { field }) if field == "auth.password"
        ));

        let disabled = "[target]\nhost = \"http://localhost\"\n[auth]\nenabled = false\n";
        assert!(LoadProfile::from_toml_str(disabled).unwrap().validate().is_ok());
    }

    #[test]
    fn test_unset_password_variable_fails_validation() {
        let text = "[target]\nhost = \"http://localhost\"\n[auth]\npassword = \"${TRADE_SWARM_SURELY_UNSET_PASSWORD}\"\n";
        let profile = LoadProfile::from_toml_str(text).unwrap();
        assert!(matches!(
            profile.validate(),
            Err(SwarmError::InvalidConfigValueError { field, .. }) if field == "auth.password"
        ));
    }

    #[test]
    fn test_monitoring_log_level_is_checked() {
        let ok = "[target]\nhost = \"http://localhost\"\n[monitoring]\nlog_level = \"debug\"\n";
        let profile = LoadProfile::from_toml_str(ok).unwrap();
        assert!(profile.validate().is_ok());
        assert_eq!(profile.log_level(), Some("debug"));
        assert!(!profile.monitor_enabled());

        let bad = "[target]\nhost = \"http://localhost\"\n[monitoring]\nlog_level = \"chatty\"\n";
        assert!(LoadProfile::from_toml_str(bad).unwrap().validate().is_err());
    }

    #[test]
    fn test_set_run_time_override() {
        let mut profile = LoadProfile::from_toml_str("[target]\nhost = \"http://localhost\"\n").unwrap();
        profile.set_run_time(Some("45s".to_string())).unwrap();
        assert_eq!(profile.run_time(), Some(Duration::from_secs(45)));
    }
}
