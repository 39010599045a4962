use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinError;

/// Errors produced while turning a service description into definitions.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Description parsing or type resolution failed.
    #[error(transparent)]
    Parse(#[from] servicedefs_spec_parser::ParseError),

    /// E2101: The requested operation is not declared by the service.
    #[error("E2101: operation id '{operation_id}' does not exist in service '{service}'")]
    OperationNotFound {
        service: String,
        operation_id: String,
    },

    /// E2102: Operation declares no tags, so it has no controller.
    #[error("E2102: operation '{operation_id}' in service '{service}' has no tags")]
    MissingTag {
        service: String,
        operation_id: String,
    },

    /// E2103: Operation has no operationId.
    #[error("E2103: operation {method} {path} in service '{service}' has no operationId")]
    MissingOperationId {
        service: String,
        method: String,
        path: String,
    },

    /// E2104: Two operations share an operationId.
    #[error("E2104: duplicate operationId '{operation_id}' in service '{service}'")]
    DuplicateOperationId {
        service: String,
        operation_id: String,
    },
}

/// A task failure observed by a consumer of the task's result.
///
/// Build results are read by many scan tasks through a shared future,
/// so the failure has to be cloneable.
#[derive(Debug, Clone, Error)]
pub enum TaskFailure {
    #[error("build of service '{service}' failed: {source}")]
    Build {
        service: String,
        #[source]
        source: Arc<GenerateError>,
    },

    #[error("task '{task}' panicked")]
    Panicked { task: String },

    #[error("task '{task}' was cancelled")]
    Cancelled { task: String },
}

impl TaskFailure {
    pub fn from_join(task: impl Into<String>, err: JoinError) -> Self {
        let task = task.into();
        if err.is_cancelled() {
            TaskFailure::Cancelled { task }
        } else {
            TaskFailure::Panicked { task }
        }
    }
}

/// Run-level errors. Any of these stops the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A build or scan task failed and its result was consumed.
    #[error(transparent)]
    Task(#[from] TaskFailure),

    /// E2201: A variable file could not be read.
    #[error("E2201: failed to read variable file {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// E2202: A service definition resource could not be written.
    #[error("E2202: failed to persist service definitions in resource {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// E2203: Walking the application tree failed.
    #[error("E2203: failed to discover files under {}: {message}", .path.display())]
    Discovery { path: PathBuf, message: String },

    /// E2204: Submission after the worker pool was closed.
    #[error("E2204: worker pool is closed")]
    PoolClosed,

    /// Options file missing, malformed or out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-item conditions found while scanning a variable file.
///
/// These are logged and absorbed; the file or entry contributes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanWarning {
    #[error("variable file {file} is not a JSON object: {message}")]
    MalformedDescriptor { file: String, message: String },

    #[error("variable '{variable}' in {file} is not an object")]
    NotAnObject { file: String, variable: String },

    #[error("service variable '{variable}' in {file} does not have an operationId")]
    MissingOperationId { file: String, variable: String },

    #[error("service variable '{variable}' in {file} does not have a service name")]
    MissingService { file: String, variable: String },

    #[error("service '{service}' does not exist for service variable '{variable}' in {file}")]
    UnknownService {
        file: String,
        variable: String,
        service: String,
    },

    #[error("operation '{operation_id}' does not exist in service '{service}' for service variable '{variable}' in {file}")]
    UnknownOperation {
        file: String,
        variable: String,
        service: String,
        operation_id: String,
    },
}
