use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillkitError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Directory walk failed: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Corpus error at {path}: {message}")]
    CorpusError { path: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Git command failed: {message}")]
    GitError { message: String },

    #[error("Webhook delivery to {channel} failed: {message}")]
    WebhookError { channel: String, message: String },

    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamStatusError { status: u16, body: String },

    #[error("Skill generation failed for {skill}: {message}")]
    GenerationError { skill: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Corpus,
    Network,
    Parsing,
    External,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SkillkitError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn corpus(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorpusError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Configuration,
            Self::CorpusError { .. } | Self::WalkError(_) => ErrorCategory::Corpus,
            Self::HttpError(_)
            | Self::WebhookError { .. }
            | Self::UpstreamStatusError { .. }
            | Self::GenerationError { .. } => ErrorCategory::Network,
            Self::SerializationError(_) | Self::YamlError(_) | Self::TomlError(_) => {
                ErrorCategory::Parsing
            }
            Self::GitError { .. } => ErrorCategory::External,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::WebhookError { .. } => ErrorSeverity::Medium,
            Self::HttpError(_) | Self::UpstreamStatusError { .. } | Self::GenerationError { .. } => {
                ErrorSeverity::Medium
            }
            Self::IoError(_) | Self::WalkError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Whether a later attempt of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().map(|s| s.as_u16() == 429 || s.is_server_error()) == Some(true)
            }
            Self::UpstreamStatusError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::MissingConfigError { field } => {
                format!("Required setting '{}' is not configured", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::CorpusError { path, message } => {
                format!("Could not read the skill corpus at {}: {}", path, message)
            }
            Self::GitError { message } => format!("Git is unavailable or failed: {}", message),
            Self::WebhookError { channel, .. } => {
                format!("Could not deliver the {} notification", channel)
            }
            Self::HttpError(_) | Self::UpstreamStatusError { .. } => {
                "A remote service could not be reached".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check skillkit.toml and the command-line flags",
            ErrorCategory::Corpus => "Check that --root points at the skills repository",
            ErrorCategory::Network => "Check network access and credentials, then retry",
            ErrorCategory::Parsing => "Fix the malformed file named in the error",
            ErrorCategory::External => "Make sure git is installed and run inside a repository",
            ErrorCategory::System => "Check file permissions and free disk space",
        }
    }

    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, SkillkitError>;
