//! Domain-specific errors.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage reported alongside failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Concatenate,
    Filter,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Concatenate => f.write_str("concatenate"),
            Stage::Filter => f.write_str("filter"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no input files configured")]
    EmptyInputList,
    #[error("[concatenate] input '{name}' not found or unreadable: {}", path.display())]
    MissingInput {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[{stage}] failed to read {}", path.display())]
    ReadFailure {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[{stage}] failed to write {}", path.display())]
    WriteFailure {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[filter] intermediate artifact missing: {}", path.display())]
    MissingIntermediate { path: PathBuf },
}

impl PipelineError {
    /// Stage the failure belongs to, when it is tied to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::EmptyInputList | PipelineError::MissingInput { .. } => {
                Some(Stage::Concatenate)
            }
            PipelineError::ReadFailure { stage, .. } | PipelineError::WriteFailure { stage, .. } => {
                Some(*stage)
            }
            PipelineError::MissingIntermediate { .. } => Some(Stage::Filter),
        }
    }
}
