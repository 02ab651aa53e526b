//! Kiln Gen - text-to-3D generation pipeline
//!
//! Refines a free-form prompt into shape and style halves, drives a remote
//! shape task and texture task to completion by polling, and streams the
//! resulting model, thumbnail and texture files to disk.

pub mod client;
pub mod config;
pub mod download;
pub mod pipeline;
pub mod provider;
pub mod providers;
pub mod record;
pub mod refine;
pub mod task;

#[cfg(test)]
mod testing;

pub use client::{CancelToken, ClientSettings, ModelGenerationClient};
pub use config::KilnConfig;
pub use download::AssetDownloader;
pub use pipeline::{GenerationRequest, Pipeline, PipelineError, SavedAssets, Stage};
pub use provider::{AssetSource, CompletionBackend, TaskApi};
pub use record::GenerationRecord;
pub use refine::{PromptRefiner, RefinedPrompt};
pub use task::{Task, TaskResult, TextureAsset, TextureOutput};
