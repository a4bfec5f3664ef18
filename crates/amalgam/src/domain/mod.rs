//! Core types shared by the amalgamation stages.

pub mod directive;
pub mod errors;
pub mod model;
