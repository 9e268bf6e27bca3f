use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwarmError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV report error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Operation '{name}' is registered more than once")]
    DuplicateOperation { name: String },

    #[error("Unknown operation '{name}'")]
    UnknownOperation { name: String },

    #[error("Task catalog has no runnable operations")]
    EmptyCatalog,

    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },

    #[error("Report error: {message}")]
    ReportError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Catalog,
    Authentication,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SwarmError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SwarmError::ConfigError { .. }
            | SwarmError::InvalidConfigValueError { .. }
            | SwarmError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SwarmError::HttpError(_) => ErrorCategory::Network,
            SwarmError::DuplicateOperation { .. }
            | SwarmError::UnknownOperation { .. }
            | SwarmError::EmptyCatalog => ErrorCategory::Catalog,
            SwarmError::AuthenticationError { .. } => ErrorCategory::Authentication,
            SwarmError::CsvError(_)
            | SwarmError::IoError(_)
            | SwarmError::SerializationError(_)
            | SwarmError::ReportError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Authentication => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Output => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Catalog => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SwarmError::HttpError(_) => {
                "Check that the target host is reachable and the TLS setup is valid".to_string()
            }
            SwarmError::CsvError(_) | SwarmError::IoError(_) | SwarmError::ReportError { .. } => {
                "Check that the output directory exists and is writable".to_string()
            }
            SwarmError::SerializationError(_) => {
                "Inspect the JSON payloads configured for the catalog".to_string()
            }
            SwarmError::ConfigError { .. } => "Review the load profile file syntax".to_string(),
            SwarmError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' and run again", field)
            }
            SwarmError::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            SwarmError::DuplicateOperation { name } => {
                format!("Give operation '{}' a unique name", name)
            }
            SwarmError::UnknownOperation { .. } => {
                "Run with --list to see the available operation names".to_string()
            }
            SwarmError::EmptyCatalog => {
                "Relax the --only/--exclude filters or give some operation a non-zero weight"
                    .to_string()
            }
            SwarmError::AuthenticationError { .. } => {
                "Verify the credentials and that /auth/login returns a token".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not talk to the target: {}", self),
            ErrorCategory::Catalog => format!("Task catalog problem: {}", self),
            ErrorCategory::Authentication => format!("Login problem: {}", self),
            ErrorCategory::Output => format!("Could not write results: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SwarmError>;
