use thiserror::Error;

/// Conditions the pipeline checks for itself. Everything else (model load,
/// file writes, browser launch) travels as a plain `anyhow::Error`.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
