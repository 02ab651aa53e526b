//! Meshy task API
//!
//! Shape tasks go through the v2 text-to-3d route in `preview` mode;
//! texturing goes through the v1 ai-texturing route. Status lookups use a
//! different resource path per task kind.

use crate::config::{KilnConfig, GENERATOR};
use crate::provider::{ShapeTaskRequest, TaskApi, TextureTaskRequest};
use crate::providers::http::{bearer, body_error, build_agent, request_error};
use crate::task::Task;
use kiln_core::{KilnError, Result, TaskKind};
use log::debug;
use serde_json::{json, Value};

const DEFAULT_MESHY_URL: &str = "https://api.meshy.ai";
const SHAPE_PATH: &str = "/openapi/v2/text-to-3d";
const TEXTURE_PATH: &str = "/v1/ai-texturing";
const TASK_STATUS_PATH: &str = "/v1/tasks";

/// Meshy client for text-to-3D shape and texture tasks
pub struct MeshyApi {
    api_key: String,
    api_url: String,
    agent: ureq::Agent,
}

impl MeshyApi {
    /// Create a new MeshyApi from config
    pub fn from_config(config: &KilnConfig) -> Result<Self> {
        let api_key = config
            .api_key(GENERATOR)
            .ok_or_else(|| {
                KilnError::Config(
                    "Meshy API key not configured. Set MESHY_API_KEY or add to .kiln/config.toml"
                        .to_string(),
                )
            })?
            .to_string();

        let api_url = config
            .api_url(GENERATOR)
            .unwrap_or(DEFAULT_MESHY_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            api_url,
            agent: build_agent(),
        })
    }

    /// Resource path for a task's status
    fn status_url(&self, task_id: &str, kind: TaskKind) -> String {
        match kind {
            TaskKind::Shape => format!("{}{}/{}", self.api_url, SHAPE_PATH, task_id),
            TaskKind::Texture => format!("{}{}/{}", self.api_url, TASK_STATUS_PATH, task_id),
        }
    }

    fn post_json(&self, url: &str, payload: &Value) -> Result<Value> {
        let mut response = self
            .agent
            .post(url)
            .header("Authorization", &bearer(&self.api_key))
            .header("Content-Type", "application/json")
            .send_json(payload)
            .map_err(|e| request_error(url, e))?;

        response.body_mut().read_json().map_err(|e| body_error(url, e))
    }

    fn get_json(&self, url: &str) -> Result<Value> {
        let mut response = self
            .agent
            .get(url)
            .header("Authorization", &bearer(&self.api_key))
            .call()
            .map_err(|e| request_error(url, e))?;

        response.body_mut().read_json().map_err(|e| body_error(url, e))
    }
}

impl TaskApi for MeshyApi {
    fn name(&self) -> &str {
        "meshy"
    }

    fn create_shape_task(&self, request: &ShapeTaskRequest) -> Result<String> {
        let url = format!("{}{}", self.api_url, SHAPE_PATH);
        let payload = shape_payload(request);
        debug!("POST {} {}", url, payload);
        let response = self.post_json(&url, &payload)?;
        parse_submit_response(&response)
    }

    fn create_texture_task(&self, request: &TextureTaskRequest) -> Result<String> {
        let url = format!("{}{}", self.api_url, TEXTURE_PATH);
        let payload = texture_payload(request);
        debug!("POST {} {}", url, payload);
        let response = self.post_json(&url, &payload)?;
        parse_submit_response(&response)
    }

    fn fetch_task(&self, task_id: &str, kind: TaskKind) -> Result<Task> {
        let url = self.status_url(task_id, kind);
        let response = self.get_json(&url)?;
        Task::from_json(task_id, kind, &response)
    }
}

fn shape_payload(request: &ShapeTaskRequest) -> Value {
    json!({
        "mode": "preview",
        "prompt": request.prompt,
        "art_style": request.art_style
    })
}

fn texture_payload(request: &TextureTaskRequest) -> Value {
    json!({
        "model_url": request.model_url,
        "object_prompt": request.object_prompt,
        "style_prompt": request.style_prompt,
        "enable_pbr": request.enable_pbr
    })
}

/// Extract the task id from a creation response (`{"result": "<id>"}`)
pub fn parse_submit_response(response: &Value) -> Result<String> {
    response
        .get("result")
        .and_then(|r| r.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            KilnError::Parse(format!(
                "Unexpected Meshy submit response: {}",
                serde_json::to_string(response).unwrap_or_default()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> MeshyApi {
        let mut config = KilnConfig::default();
        config.set_api_key(GENERATOR, "msy_test");
        MeshyApi::from_config(&config).unwrap()
    }

    #[test]
    fn test_parse_submit_response() {
        let response = json!({"result": "018d2158-xxxx-yyyy-zzzz-aabbccddee"});
        assert_eq!(
            parse_submit_response(&response).unwrap(),
            "018d2158-xxxx-yyyy-zzzz-aabbccddee"
        );
        assert!(parse_submit_response(&json!({"result": ""})).is_err());
        assert!(parse_submit_response(&json!({"message": "invalid"})).is_err());
    }

    #[test]
    fn test_status_routes_by_kind() {
        let api = api();
        assert_eq!(
            api.status_url("abc", TaskKind::Shape),
            "https://api.meshy.ai/openapi/v2/text-to-3d/abc"
        );
        assert_eq!(
            api.status_url("abc", TaskKind::Texture),
            "https://api.meshy.ai/v1/tasks/abc"
        );
    }

    #[test]
    fn test_payloads() {
        let shape = shape_payload(&ShapeTaskRequest {
            prompt: "a wooden chair".to_string(),
            art_style: "realistic".to_string(),
        });
        assert_eq!(shape["mode"], "preview");
        assert_eq!(shape["prompt"], "a wooden chair");
        assert_eq!(shape["art_style"], "realistic");

        let texture = texture_payload(&TextureTaskRequest {
            model_url: "http://x/a.glb".to_string(),
            object_prompt: "a wooden chair".to_string(),
            style_prompt: "matte red paint".to_string(),
            enable_pbr: true,
        });
        assert_eq!(texture["model_url"], "http://x/a.glb");
        assert_eq!(texture["style_prompt"], "matte red paint");
        assert_eq!(texture["enable_pbr"], true);
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = MeshyApi::from_config(&KilnConfig::default()).err().unwrap();
        assert!(matches!(err, KilnError::Config(_)));
    }
}
