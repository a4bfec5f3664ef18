//! Domain models for amalgamation plans and run reports.

use std::path::PathBuf;

use serde::Serialize;

/// One entry of the ordered input list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputFile {
    /// Logical identifier used in diagnostics.
    pub name: String,
    pub path: PathBuf,
}

impl InputFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    /// Raw concatenation of every input.
    pub intermediate: PathBuf,
    /// Directive-filtered deliverable.
    pub processed: PathBuf,
}

/// Fully resolved inputs and outputs handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmalgamationPlan {
    pub inputs: Vec<InputFile>,
    pub artifacts: ArtifactPaths,
    /// Write the intermediate artifact to disk instead of handing it over in memory.
    pub materialize_intermediate: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConcatReport {
    pub files: usize,
    pub bytes: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub lines_read: usize,
    pub lines_kept: usize,
    pub dropped_include: usize,
    pub dropped_pragma: usize,
}

impl FilterStats {
    pub fn lines_dropped(&self) -> usize {
        self.dropped_include + self.dropped_pragma
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub concat: ConcatReport,
    pub filter: FilterStats,
    /// Set when the intermediate artifact was written to disk.
    pub intermediate: Option<PathBuf>,
    pub processed: PathBuf,
}
