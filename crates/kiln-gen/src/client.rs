//! Task submission and polling against a 3D generation service

use crate::provider::{ShapeTaskRequest, TaskApi, TextureTaskRequest};
use crate::task::{Task, TaskResult};
use kiln_core::{KilnError, Result, TaskKind, TaskStatus};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default wait between status checks
pub const POLL_INTERVAL_SECS: u64 = 10;
/// Default limit on a single task's wait
pub const TIMEOUT_SECS: u64 = 900;
/// Longest uninterrupted sleep, so cancellation is noticed promptly
const CANCEL_CHECK_SLICE: Duration = Duration::from_millis(250);

/// Timing and request settings for a `ModelGenerationClient`
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
    pub art_style: String,
    pub enable_pbr: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            art_style: "realistic".to_string(),
            enable_pbr: true,
        }
    }
}

/// A flag the caller can raise to stop an in-progress wait.
///
/// Only local polling stops; nothing is canceled on the remote service.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Submits shape and texture tasks and waits for them to finish
pub struct ModelGenerationClient {
    api: Box<dyn TaskApi>,
    settings: ClientSettings,
    cancel: Option<CancelToken>,
}

impl ModelGenerationClient {
    pub fn new(api: Box<dyn TaskApi>, settings: ClientSettings) -> Self {
        Self {
            api,
            settings,
            cancel: None,
        }
    }

    /// Stop waits when `token` is raised
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Create a shape task for `prompt`
    pub fn submit_shape(&self, prompt: &str) -> Result<String> {
        let request = ShapeTaskRequest {
            prompt: prompt.to_string(),
            art_style: self.settings.art_style.clone(),
        };
        let task_id = self.api.create_shape_task(&request)?;
        info!("Submitted shape task {} to {}", task_id, self.api.name());
        Ok(task_id)
    }

    /// Create a texture task against the shape at `model_url`
    pub fn submit_texture(
        &self,
        model_url: &str,
        object_prompt: &str,
        style_prompt: &str,
    ) -> Result<String> {
        let request = TextureTaskRequest {
            model_url: model_url.to_string(),
            object_prompt: object_prompt.to_string(),
            style_prompt: style_prompt.to_string(),
            enable_pbr: self.settings.enable_pbr,
        };
        let task_id = self.api.create_texture_task(&request)?;
        info!("Submitted texture task {} to {}", task_id, self.api.name());
        Ok(task_id)
    }

    /// Fetch a task's current state once
    pub fn poll(&self, task_id: &str, kind: TaskKind) -> Result<Task> {
        self.api.fetch_task(task_id, kind)
    }

    /// Wait with the configured timeout. See `await_completion_within`.
    pub fn await_completion(&self, task_id: &str, kind: TaskKind) -> Result<Task> {
        self.await_completion_within(task_id, kind, self.settings.timeout)
    }

    /// Poll until the task is terminal or `timeout` has elapsed.
    ///
    /// Returns the succeeded task, whose `result` is always populated.
    /// Polls are strictly sequential: poll, sleep, poll.
    pub fn await_completion_within(
        &self,
        task_id: &str,
        kind: TaskKind,
        timeout: Duration,
    ) -> Result<Task> {
        let start = Instant::now();
        loop {
            self.check_canceled(task_id)?;

            let task = self.poll(task_id, kind)?;
            info!(
                "Task {} ({}) status: {} (progress: {}%)",
                task_id, kind, task.status, task.progress
            );

            match task.status {
                TaskStatus::Succeeded => {
                    if task.result.is_none() {
                        return Err(KilnError::MissingOutput {
                            task_id: task_id.to_string(),
                            field: "result".to_string(),
                        });
                    }
                    return Ok(task);
                }
                TaskStatus::Failed | TaskStatus::Canceled => {
                    return Err(KilnError::TaskFailed {
                        task_id: task_id.to_string(),
                        kind,
                        status: task.status,
                        detail: task.error,
                    });
                }
                TaskStatus::Pending | TaskStatus::Running => {}
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(KilnError::TaskTimeout {
                    task_id: task_id.to_string(),
                    kind,
                    elapsed,
                });
            }

            let wait = self.settings.poll_interval.min(timeout - elapsed);
            self.sleep(task_id, wait)?;
        }
    }

    fn check_canceled(&self, task_id: &str) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_canceled() => Err(KilnError::Canceled {
                task_id: task_id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Park the thread for `wait`, waking early only to observe cancellation
    fn sleep(&self, task_id: &str, wait: Duration) -> Result<()> {
        if self.cancel.is_none() {
            std::thread::sleep(wait);
            return Ok(());
        }
        let deadline = Instant::now() + wait;
        loop {
            self.check_canceled(task_id)?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep((deadline - now).min(CANCEL_CHECK_SLICE));
        }
    }
}

/// The shape model URL of a succeeded shape task
pub fn shape_model_url(task: &Task) -> Result<String> {
    match &task.result {
        Some(TaskResult::Shape {
            model_url: Some(url),
        }) => Ok(url.clone()),
        _ => Err(KilnError::MissingOutput {
            task_id: task.id.clone(),
            field: "model_urls.glb".to_string(),
        }),
    }
}
