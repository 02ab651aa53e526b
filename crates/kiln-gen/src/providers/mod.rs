//! Concrete remote services
//!
//! Builds the production implementation of each service trait from config.

pub mod groq;
pub mod http;
pub mod meshy;

use crate::config::KilnConfig;
use crate::provider::{AssetSource, CompletionBackend, TaskApi};
use kiln_core::Result;

/// Completion backend used for prompt refinement
pub fn create_completion_backend(config: &KilnConfig) -> Result<Box<dyn CompletionBackend>> {
    Ok(Box::new(groq::GroqBackend::from_config(config)?))
}

/// Task API used for shape and texture generation
pub fn create_task_api(config: &KilnConfig) -> Result<Box<dyn TaskApi>> {
    Ok(Box::new(meshy::MeshyApi::from_config(config)?))
}

/// Asset source used for downloads
pub fn create_asset_source() -> Box<dyn AssetSource> {
    Box::new(http::HttpAssetSource::new())
}
