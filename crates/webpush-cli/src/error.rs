//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use webpush_config::ConfigError;
use webpush_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(
        code(webpush::validation),
        help("Fix the value in {path} or the matching WEBPUSH_ environment variable.")
    )]
    Validation {
        field: String,
        reason: String,
        path: String,
    },

    #[error("Instance '{name}' not found in configuration")]
    #[diagnostic(
        code(webpush::instance_not_found),
        help(
            "Available instances: {available}\n\
             Select one with --instance or set default_instance."
        )
    )]
    InstanceNotFound { name: String, available: String },

    #[error("No instance configured")]
    #[diagnostic(
        code(webpush::no_instance),
        help(
            "Create one with: webpush init --id <ID> --public-key <KEY>\n\
             Expected at: {path}"
        )
    )]
    NoInstance { path: String },

    #[error("Configuration file already exists: {path}")]
    #[diagnostic(
        code(webpush::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(webpush::config))]
    Config(Box<figment::Error>),

    // ── Identifiers ──────────────────────────────────────────────────
    #[error("Invalid instance id segment '{segment}': {reason}")]
    #[diagnostic(
        code(webpush::invalid_segment),
        help("Pass the segment exactly as it appears between the slashes of the script URL.")
    )]
    InvalidSegment { segment: String, reason: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(webpush::json))]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    #[diagnostic(code(webpush::general))]
    General { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::InvalidSegment { .. } => exit_code::USAGE,
            Self::InstanceNotFound { .. } | Self::NoInstance { .. } => exit_code::NOT_FOUND,
            Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::General { .. } => {
                exit_code::GENERAL
            }
        }
    }

    /// Translate a config error, naming the config file in help text.
    pub fn from_config(err: ConfigError, path: &str, available: &[&str]) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation {
                field,
                reason,
                path: path.into(),
            },
            ConfigError::UnknownInstance { name } => Self::InstanceNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            ConfigError::NoInstance => Self::NoInstance { path: path.into() },
            ConfigError::Figment(err) => Self::Config(err),
            ConfigError::Io(err) => Self::Io(err),
            ConfigError::Serialization(err) => Self::General {
                message: format!("failed to serialize config: {err}"),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInstanceId { segment, reason } => {
                Self::InvalidSegment { segment, reason }
            }
            other => Self::General {
                message: other.to_string(),
            },
        }
    }
}
