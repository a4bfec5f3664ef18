//! Concatenation of the ordered input list into the intermediate artifact.

use std::path::Path;

use rayon::prelude::*;

use crate::domain::errors::{PipelineError, Stage};
use crate::domain::model::{ConcatReport, InputFile};
use crate::infra::fs;

/// Joins input files byte for byte, with no separators between them.
#[derive(Debug, Default)]
pub struct Concatenator;

impl Concatenator {
    pub fn new() -> Self {
        Self
    }

    /// Read every input and return their contents joined in list order.
    ///
    /// Inputs are read in parallel and assembled strictly in list order. When several inputs fail
    /// the error for the earliest one in the list is returned.
    pub fn concatenate(&self, inputs: &[InputFile]) -> Result<Vec<u8>, PipelineError> {
        if inputs.is_empty() {
            return Err(PipelineError::EmptyInputList);
        }

        let reads: Vec<Result<Vec<u8>, PipelineError>> = inputs
            .par_iter()
            .map(|input| -> Result<Vec<u8>, PipelineError> {
                let contents = fs::read_input(input)?;
                tracing::debug!(
                    name = %input.name,
                    path = %input.path.display(),
                    bytes = contents.len(),
                    "read input"
                );
                Ok(contents)
            })
            .collect();

        let mut output = Vec::new();
        for read in reads {
            output.extend_from_slice(&read?);
        }
        Ok(output)
    }

    /// Concatenate `inputs` and atomically replace `output` with the result.
    ///
    /// Nothing is written unless every input was read successfully.
    pub fn write(&self, inputs: &[InputFile], output: &Path) -> Result<ConcatReport, PipelineError> {
        let contents = self.concatenate(inputs)?;
        fs::write_atomic(Stage::Concatenate, output, &contents)?;

        let report = ConcatReport {
            files: inputs.len(),
            bytes: contents.len(),
        };
        tracing::info!(
            path = %output.display(),
            files = report.files,
            bytes = report.bytes,
            "wrote intermediate artifact"
        );
        Ok(report)
    }
}
