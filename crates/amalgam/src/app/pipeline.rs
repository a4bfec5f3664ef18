//! Two-stage amalgamation: concatenate, then filter directives.

use crate::app::concat::Concatenator;
use crate::app::filter::DirectiveFilter;
use crate::domain::errors::PipelineError;
use crate::domain::model::{AmalgamationPlan, ConcatReport, PipelineReport};

/// Runs the concatenate and filter stages for a resolved plan.
#[derive(Debug)]
pub struct Pipeline {
    plan: AmalgamationPlan,
    concatenator: Concatenator,
    filter: DirectiveFilter,
}

impl Pipeline {
    pub fn new(plan: AmalgamationPlan) -> Self {
        Self {
            plan,
            concatenator: Concatenator::new(),
            filter: DirectiveFilter::new(),
        }
    }

    /// Run both stages. The first failure aborts the run and no later stage starts.
    ///
    /// With `materialize_intermediate` set, the concatenation is fully written and closed before
    /// the filter opens it. Otherwise the filter consumes the in-memory buffer and no intermediate
    /// file is touched.
    pub fn run(&self) -> Result<PipelineReport, PipelineError> {
        let span = tracing::info_span!("amalgamate", inputs = self.plan.inputs.len());
        let _guard = span.enter();

        let artifacts = &self.plan.artifacts;

        if self.plan.materialize_intermediate {
            let concat = self
                .concatenator
                .write(&self.plan.inputs, &artifacts.intermediate)?;
            let filter = self
                .filter
                .filter_file(&artifacts.intermediate, &artifacts.processed)?;

            Ok(PipelineReport {
                concat,
                filter,
                intermediate: Some(artifacts.intermediate.clone()),
                processed: artifacts.processed.clone(),
            })
        } else {
            let buffer = self.concatenator.concatenate(&self.plan.inputs)?;
            let concat = ConcatReport {
                files: self.plan.inputs.len(),
                bytes: buffer.len(),
            };
            tracing::debug!(bytes = concat.bytes, "holding intermediate in memory");
            let filter = self.filter.filter_into(&buffer, &artifacts.processed)?;

            Ok(PipelineReport {
                concat,
                filter,
                intermediate: None,
                processed: artifacts.processed.clone(),
            })
        }
    }
}
