//! End-to-end generation pipeline
//!
//! A single linear run: refine the prompt, generate a shape, texture it, and
//! download every asset the texture task declares. Any stage failure ends the
//! run; a partially filled `SavedAssets` is never returned.

use crate::client::{shape_model_url, ClientSettings, ModelGenerationClient};
use crate::config::KilnConfig;
use crate::download::{url_extension, AssetDownloader};
use crate::providers;
use crate::record::{write_record, GenerationRecord, RECORD_FILE};
use crate::refine::{PromptRefiner, RefinedPrompt};
use crate::task::{TaskResult, TextureOutput};
use kiln_core::{KilnError, Result, TaskKind};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_MODEL_EXT: &str = ".glb";
const THUMBNAIL_FILE: &str = "thumbnail.png";

/// A single pipeline invocation's input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub raw_prompt: String,
}

impl GenerationRequest {
    pub fn new(raw_prompt: impl Into<String>) -> Self {
        Self {
            raw_prompt: raw_prompt.into(),
        }
    }
}

/// Stages of a pipeline run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    RefiningPrompt,
    SubmittingShape,
    AwaitingShape,
    SubmittingTexture,
    AwaitingTexture,
    DownloadingAssets,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::RefiningPrompt => "refining prompt",
            Stage::SubmittingShape => "submitting shape task",
            Stage::AwaitingShape => "awaiting shape task",
            Stage::SubmittingTexture => "submitting texture task",
            Stage::AwaitingTexture => "awaiting texture task",
            Stage::DownloadingAssets => "downloading assets",
        };
        f.write_str(name)
    }
}

/// A run's terminal failure, annotated with where it happened
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: KilnError,
}

/// Files saved by a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SavedAssets {
    /// Folder holding every file below, named after the texture task
    pub output_dir: PathBuf,
    pub model_path: Option<PathBuf>,
    pub thumbnail_path: Option<PathBuf>,
    pub texture_paths: Vec<PathBuf>,
    /// The `generation.toml` describing this run
    pub record_path: PathBuf,
}

/// Sequences refinement, generation and download
pub struct Pipeline {
    refiner: Option<PromptRefiner>,
    client: ModelGenerationClient,
    downloader: AssetDownloader,
    output_root: PathBuf,
}

impl Pipeline {
    /// Assemble a pipeline from explicit parts.
    ///
    /// With no refiner the raw prompt drives both tasks.
    pub fn new(
        refiner: Option<PromptRefiner>,
        client: ModelGenerationClient,
        downloader: AssetDownloader,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            refiner,
            client,
            downloader,
            output_root: output_root.into(),
        }
    }

    /// Build the production pipeline from config.
    ///
    /// Credentials are checked here, before anything touches the network.
    pub fn from_config(config: &KilnConfig, refine: bool) -> Result<Self> {
        if refine {
            config.require_pipeline_credentials()?;
        } else {
            config.require_credentials(&[crate::config::GENERATOR])?;
        }

        let refiner = if refine {
            Some(PromptRefiner::new(providers::create_completion_backend(config)?))
        } else {
            None
        };

        let settings = ClientSettings {
            poll_interval: config.poll_interval()?,
            timeout: config.timeout(),
            art_style: config.generation.art_style.clone(),
            enable_pbr: config.generation.enable_pbr,
        };
        let client = ModelGenerationClient::new(providers::create_task_api(config)?, settings);
        let downloader = AssetDownloader::new(providers::create_asset_source());

        Ok(Self::new(
            refiner,
            client,
            downloader,
            &config.generation.output_dir,
        ))
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Run every stage for `request`
    pub fn run(&self, request: &GenerationRequest) -> std::result::Result<SavedAssets, PipelineError> {
        info!("Starting 3D model generation for: '{}'", request.raw_prompt);

        enter(Stage::RefiningPrompt);
        let prompts = match &self.refiner {
            Some(refiner) => refiner.refine(&request.raw_prompt),
            None => RefinedPrompt::fallback(&request.raw_prompt),
        };

        enter(Stage::SubmittingShape);
        let shape_id = self
            .client
            .submit_shape(&prompts.object_prompt)
            .map_err(at(Stage::SubmittingShape))?;

        enter(Stage::AwaitingShape);
        let shape = self
            .client
            .await_completion(&shape_id, TaskKind::Shape)
            .map_err(at(Stage::AwaitingShape))?;
        let shape_url = shape_model_url(&shape).map_err(at(Stage::AwaitingShape))?;

        enter(Stage::SubmittingTexture);
        let texture_id = self
            .client
            .submit_texture(&shape_url, &prompts.object_prompt, &prompts.style_prompt)
            .map_err(at(Stage::SubmittingTexture))?;

        enter(Stage::AwaitingTexture);
        let texture = self
            .client
            .await_completion(&texture_id, TaskKind::Texture)
            .map_err(at(Stage::AwaitingTexture))?;
        let output = match texture.result {
            Some(TaskResult::Texture(output)) => output,
            _ => {
                return Err(PipelineError {
                    stage: Stage::AwaitingTexture,
                    source: KilnError::MissingOutput {
                        task_id: texture.id.clone(),
                        field: "texture result".to_string(),
                    },
                })
            }
        };

        enter(Stage::DownloadingAssets);
        let record = GenerationRecord {
            raw_prompt: request.raw_prompt.clone(),
            object_prompt: prompts.object_prompt,
            style_prompt: prompts.style_prompt,
            shape_task_id: shape.id,
            texture_task_id: texture.id.clone(),
            files: Vec::new(),
        };
        let folder = self.output_root.join(path_component(&texture.id));
        let saved = self
            .download_all(&output, &folder, record)
            .map_err(at(Stage::DownloadingAssets))?;

        info!("Generation complete: {}", saved.output_dir.display());
        Ok(saved)
    }

    fn download_all(
        &self,
        output: &TextureOutput,
        folder: &Path,
        mut record: GenerationRecord,
    ) -> Result<SavedAssets> {
        let mut saved = SavedAssets {
            output_dir: folder.to_path_buf(),
            ..Default::default()
        };
        let mut taken: HashSet<String> = HashSet::from([RECORD_FILE.to_string()]);

        if let Some(url) = &output.model_url {
            let ext = url_extension(url).unwrap_or_else(|| DEFAULT_MODEL_EXT.to_string());
            let name = claim_name(&format!("model{}", ext), &mut taken);
            let path = self.downloader.download(url, folder, &name)?;
            record.add_file("model", &path)?;
            saved.model_path = Some(path);
        }

        if let Some(url) = &output.thumbnail_url {
            let name = claim_name(THUMBNAIL_FILE, &mut taken);
            let path = self.downloader.download(url, folder, &name)?;
            record.add_file("thumbnail", &path)?;
            saved.thumbnail_path = Some(path);
        }

        for texture in &output.textures {
            let name = claim_name(&path_component(&texture.name), &mut taken);
            let path = self.downloader.download(&texture.url, folder, &name)?;
            record.add_file("texture", &path)?;
            saved.texture_paths.push(path);
        }

        saved.record_path = write_record(&record, folder)?;
        Ok(saved)
    }
}

fn enter(stage: Stage) {
    debug!("Pipeline stage: {}", stage);
}

fn at(stage: Stage) -> impl Fn(KilnError) -> PipelineError {
    move |source| PipelineError { stage, source }
}

/// Reserve `wanted` in `taken`, suffixing `_1`, `_2`, ... before the
/// extension when another file in the folder already has that name
fn claim_name(wanted: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(wanted.to_string()) {
        return wanted.to_string();
    }
    let (stem, ext) = match wanted.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
        _ => (wanted, String::new()),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, n, ext);
        if taken.insert(candidate.clone()) {
            warn!("File name {} already used, saving as {}", wanted, candidate);
            return candidate;
        }
        n += 1;
    }
}

/// Reduce a service-supplied name to a single safe path component
fn path_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}
