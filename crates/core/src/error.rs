//! Error types for the TaskPilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; [`Error`] wraps the ones
//! that can end a run.

use std::fmt;

use thiserror::Error;

/// The top-level error type for a TaskPilot run: startup failures plus
/// whatever ends a session early.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model service errors ---
    #[error("Service error: {0}")]
    Provider(#[from] ProviderError),

    // --- Credential errors ---
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Operator console ---
    #[error("Console error: {0}")]
    Console(#[from] std::io::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failure of one round trip to the model service.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors raised by a tool before it could produce a result.
///
/// A tool that ran and failed (non-zero exit, unwritable path) reports that
/// through an unsuccessful [`crate::tool::ToolResult`] instead.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Why a single plan step failed.
///
/// The `Display` output is the verbatim underlying cause; it is what the
/// operator sees and what goes into the next refinement prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The command exited with a non-zero status. `stderr` is the captured
    /// error stream, unmodified.
    #[error("{stderr}")]
    CommandFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The file could not be opened or written.
    #[error("{reason}")]
    WriteFailed { path: String, reason: String },

    /// Anything else that went wrong while running the step.
    #[error("{0}")]
    Unexpected(String),
}

impl StepError {
    /// The failure detail, verbatim.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

/// A model response that could not be turned into a plan.
///
/// The raw response is always kept so the operator can see what the model
/// actually said.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{cause}")]
pub struct ExtractError {
    pub cause: ExtractCause,
    pub raw: String,
}

impl ExtractError {
    pub fn new(cause: ExtractCause, raw: impl Into<String>) -> Self {
        Self {
            cause,
            raw: raw.into(),
        }
    }
}

/// The specific reason a plan failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractCause {
    /// The selected text is not JSON, or has the wrong JSON types.
    MalformedJson(String),

    /// A required field is absent. `step` is the 1-based step number, or
    /// `None` for a plan-level field.
    MissingField {
        step: Option<usize>,
        field: &'static str,
    },

    /// The step discriminator is present but not a boolean.
    UnknownVariant { step: usize, found: String },
}

impl fmt::Display for ExtractCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson(reason) => write!(f, "malformed JSON: {reason}"),
            Self::MissingField { step: None, field } => {
                write!(f, "missing field '{field}' in plan")
            }
            Self::MissingField {
                step: Some(step),
                field,
            } => write!(f, "missing field '{field}' in step {step}"),
            Self::UnknownVariant { step, found } => {
                write!(f, "step {step} has unknown variant: is_command = {found}")
            }
        }
    }
}

/// Failures resolving or persisting the model service credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential '{name}' not found and no prompt is available")]
    Missing { name: String },

    #[error("Credential '{name}' is empty")]
    Empty { name: String },

    #[error("Failed to read credential input: {0}")]
    Prompt(String),

    #[error("Failed to persist credential to {location}: {reason}")]
    Storage { location: String, reason: String },
}
