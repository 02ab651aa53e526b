//! Remote service traits and request types
//!
//! Each remote collaborator sits behind a trait so the pipeline can be built
//! from explicit configuration in production and from in-memory fakes in tests.

use kiln_core::{Result, TaskKind};
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::task::Task;

/// Parameters of a shape-generation task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeTaskRequest {
    pub prompt: String,
    pub art_style: String,
}

/// Parameters of a texturing task against an already generated shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureTaskRequest {
    pub model_url: String,
    pub object_prompt: String,
    pub style_prompt: String,
    pub enable_pbr: bool,
}

/// A text-generation service that answers one system + user exchange
pub trait CompletionBackend: Send {
    /// Backend name (e.g. "groq")
    fn name(&self) -> &str;

    /// Send a single exchange and return the assistant's text
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// A task-based 3D generation service
pub trait TaskApi: Send {
    /// Service name (e.g. "meshy")
    fn name(&self) -> &str;

    /// Create a shape task and return its opaque id
    fn create_shape_task(&self, request: &ShapeTaskRequest) -> Result<String>;

    /// Create a texture task and return its opaque id
    fn create_texture_task(&self, request: &TextureTaskRequest) -> Result<String>;

    /// Fetch the current state of a task; the route depends on `kind`
    fn fetch_task(&self, task_id: &str, kind: TaskKind) -> Result<Task>;
}

/// Where downloadable asset bytes come from
pub trait AssetSource: Send {
    /// Open a byte stream for `url`. Non-success responses are errors.
    fn open(&self, url: &str) -> Result<Box<dyn Read>>;
}
