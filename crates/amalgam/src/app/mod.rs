//! Application layer running the concatenate and filter stages.

pub mod concat;
pub mod filter;
pub mod pipeline;
