//! Remote task state as seen by a single poll

use kiln_core::{KilnError, Result, TaskKind, TaskStatus};
use log::warn;
use serde::Serialize;
use serde_json::Value;

/// One downloadable texture map declared by a texture task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureAsset {
    /// File name the service suggests (e.g. `c.png`)
    pub name: String,
    pub url: String,
}

/// Output of a succeeded texture task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextureOutput {
    pub model_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub textures: Vec<TextureAsset>,
}

/// Kind-dependent payload of a succeeded task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskResult {
    Shape { model_url: Option<String> },
    Texture(TextureOutput),
}

/// A snapshot of a remote task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// Opaque id assigned by the service
    pub id: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Only populated once `status` is `Succeeded`
    pub result: Option<TaskResult>,
    /// Service-reported error detail, if any
    pub error: Option<String>,
}

impl Task {
    /// Build a task from a status response body.
    ///
    /// `requested_id` is used when the body does not echo the task id.
    pub fn from_json(requested_id: &str, kind: TaskKind, response: &Value) -> Result<Self> {
        let token = response
            .get("status")
            .and_then(|s| s.as_str())
            .ok_or_else(|| {
                KilnError::Parse(format!(
                    "task {} status response has no 'status' field",
                    requested_id
                ))
            })?;

        let status = TaskStatus::from_token(token).unwrap_or_else(|| {
            warn!(
                "Task {} reported unknown status '{}'; treating as pending",
                requested_id, token
            );
            TaskStatus::Pending
        });

        let id = response
            .get("id")
            .and_then(|i| i.as_str())
            .filter(|i| !i.is_empty())
            .unwrap_or(requested_id)
            .to_string();

        let result = (status == TaskStatus::Succeeded).then(|| match kind {
            TaskKind::Shape => TaskResult::Shape {
                model_url: string_at(response, &["model_urls", "glb"]),
            },
            TaskKind::Texture => TaskResult::Texture(parse_texture_output(response)),
        });

        Ok(Task {
            id,
            kind,
            status,
            progress: parse_progress(response),
            result,
            error: parse_error_detail(response),
        })
    }
}

fn parse_progress(response: &Value) -> u8 {
    let raw = match response.get("progress") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        _ => 0.0,
    };
    raw.clamp(0.0, 100.0).round() as u8
}

fn parse_texture_output(response: &Value) -> TextureOutput {
    let textures = response
        .get("texture_urls")
        .and_then(|t| t.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let url = string_at(entry, &["url"])?;
                    let name = string_at(entry, &["base_name"])?;
                    Some(TextureAsset { name, url })
                })
                .collect()
        })
        .unwrap_or_default();

    TextureOutput {
        model_url: string_at(response, &["model_url"]),
        thumbnail_url: string_at(response, &["thumbnail_url"]),
        textures,
    }
}

/// Error detail lives in `task_error.message` on newer routes and in `error`
/// on older ones.
fn parse_error_detail(response: &Value) -> Option<String> {
    string_at(response, &["task_error", "message"]).or_else(|| match response.get("error") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(obj @ Value::Object(_)) => string_at(obj, &["message"]),
        _ => None,
    })
}

/// Non-empty string at a nested path
fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
