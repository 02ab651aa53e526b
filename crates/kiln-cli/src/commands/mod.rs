//! CLI command implementations

pub mod generate;
pub mod refine;
pub mod status;
