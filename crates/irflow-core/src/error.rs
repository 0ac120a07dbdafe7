//! Error types for the flow tracker library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{FlowStatus, StepStatus};

/// Comprehensive error type for all tracker operations.
#[derive(Error, Debug)]
pub enum FlowError {
    /// A step action was requested from a state that does not allow it
    #[error("Invalid transition for step '{step}': cannot move from {from} to {to}")]
    InvalidTransition {
        step: String,
        from: StepStatus,
        to: StepStatus,
    },
    /// A step was started or completed while some dependencies are unfinished
    #[error("Step '{step}' has unmet dependencies: {}", unmet.join(", "))]
    DependencyNotSatisfied { step: String, unmet: Vec<String> },
    /// Attempted to skip a required step
    #[error("Step '{step}' is required and cannot be skipped")]
    RequiredStep { step: String },
    /// Steps remain unfinished but none of them can ever run
    #[error("Flow {id} is deadlocked; blocked steps: {}", blocked.join(", "))]
    DeadlockDetected { id: u64, blocked: Vec<String> },
    /// The flow still has steps in a non-terminal state
    #[error("Flow {id} still has {remaining} unfinished step(s)")]
    FlowIncomplete { id: u64, remaining: usize },
    /// Step actions are only accepted while the flow is active
    #[error("Flow {id} is {status}; step actions require an active flow")]
    FlowNotActive { id: u64, status: FlowStatus },
    /// Flow-level lifecycle change not permitted from the current status
    #[error("Flow {id} cannot move from {from} to {to}")]
    InvalidFlowTransition {
        id: u64,
        from: FlowStatus,
        to: FlowStatus,
    },
    /// Flow not found for the given ID
    #[error("Flow with ID {id} not found")]
    FlowNotFound { id: u64 },
    /// Step not found in the flow
    #[error("Step '{name}' not found in flow {flow_id}")]
    StepNotFound { flow_id: u64, name: String },
    /// Playbook not found in the catalogue
    #[error("Playbook '{name}' not found")]
    PlaybookNotFound { name: String },
    /// Transport-level failure talking to the remote backend
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    /// The remote backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    /// Live feed connection or transport failure
    #[error("Live feed error: {message}")]
    Feed { message: String },
    /// A bounded wait ran out of attempts
    #[error("Timed out waiting for {operation} after {attempts} attempt(s)")]
    Timeout { operation: String, attempts: u32 },
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> FlowError {
        FlowError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> FlowError {
        FlowError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl FlowError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Wraps a reqwest failure with a short description of the request.
    pub fn network(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            message: message.into(),
            source,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the error is a rule violation of the step or flow state
    /// machines, as opposed to an infrastructure failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. }
                | Self::DependencyNotSatisfied { .. }
                | Self::RequiredStep { .. }
                | Self::DeadlockDetected { .. }
                | Self::FlowIncomplete { .. }
                | Self::FlowNotActive { .. }
                | Self::InvalidFlowTransition { .. }
                | Self::InvalidInput { .. }
        )
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| FlowError::database(message).with_source(e))
    }
}

/// Converts a blocking-task join failure into a configuration error.
pub(crate) fn join_error(e: tokio::task::JoinError) -> FlowError {
    FlowError::Configuration {
        message: format!("Task join error: {e}"),
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, FlowError>;
