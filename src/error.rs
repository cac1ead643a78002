use thiserror::Error;

/// Errors raised by the dotted-name parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Operation name is empty")]
    Empty,

    #[error("Operation name '{name}' contains an empty segment (leading, trailing or double dot)")]
    EmptySegment { name: String },

    #[error(
        "Operation name '{name}' has invalid segment '{segment}': segments must be alphanumeric/underscore and must not begin with a digit"
    )]
    InvalidSegment { name: String, segment: String },
}

/// Errors raised when wiring operation bodies into invocation handles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error(
        "Operation '{operation}' is declared {declared} but was given a {given} body; registration metadata and body kind must agree"
    )]
    DispatchMismatch {
        operation: String,
        declared: &'static str,
        given: &'static str,
    },

    #[error("Worker pool size must be at least 1")]
    EmptyWorkerPool,

    #[error("No invocation handle bound for operation '{0}'")]
    UnboundOperation(String),
}

/// Errors that can occur while a plan (or a single handle) is executing.
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error("Operation '{operation}' failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("Operation '{operation}' was cancelled before completion")]
    Cancelled { operation: String },

    #[error("Operation '{operation}' panicked or was aborted by the runtime")]
    JoinFailed { operation: String },

    #[error("Plan references group '{0}' which has no emitted batches")]
    MissingGroupPlan(String),

    #[error("Producer '{producer}' finished without an output required by '{consumer}'")]
    MissingProducerOutput { producer: String, consumer: String },
}

/// Errors when converting a custom metadata format into a hensei catalog.
#[derive(Error, Debug, Clone)]
pub enum ConversionError {
    #[error("Invalid catalog metadata: {0}")]
    Invalid(String),
}

/// Errors when serializing, deserializing or persisting a plan artifact.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Plan serialization failed: {0}")]
    Encode(String),

    #[error("Plan deserialization failed: {0}")]
    Decode(String),

    #[error("Could not access plan file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
