//! Domain errors, exit codes and structured error output.

use serde::Serialize;

use crate::api::{ApiError, EntityKind};

/// Errors that abort a command and are reported to the user.
///
/// Per-file upload failures are not represented here: the upload engine
/// contains them and only logs them.
#[derive(thiserror::Error, Debug)]
pub enum PngxError {
    /// A connection setting was neither given nor configured.
    #[error("No {0} specified, and none in config")]
    MissingConfig(&'static str),

    /// The configured server URL does not parse.
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The configuration file or environment could not be read.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A named entity is required but does not exist on the server.
    #[error("{kind} '{name}' does not exist{}", suggestion_suffix(.suggestion))]
    EntityNotFound {
        kind: EntityKind,
        name: String,
        suggestion: Option<String>,
    },

    /// A required tag, correspondent or document type is missing and the
    /// corresponding `*_must_exist` option forbids creating it.
    #[error("{kind} '{name}' does not exist (and upload.{setting} is set){}", suggestion_suffix(.suggestion))]
    MustExist {
        kind: EntityKind,
        name: String,
        setting: &'static str,
        suggestion: Option<String>,
    },

    /// The server rejected or failed a request outside of a file upload.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

/// Result alias for domain operations.
pub type Result<T> = std::result::Result<T, PngxError>;

/// Exit codes for the pngx application.
///
/// - 0: Success
/// - 1: General error (unexpected failure)
/// - 2: Usage error (bad configuration, missing required entity or group)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: The command completed. Individual upload failures are logged
    /// but do not change the exit code.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Usage error: The command could not run as requested.
    UsageError = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "PX000",
            Self::GeneralError => "PX001",
            Self::UsageError => "PX002",
        }
    }

    /// Pick the exit code for an error returned by [`crate::run_app`].
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<PngxError>().is_some() {
            Self::UsageError
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "PX002")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
