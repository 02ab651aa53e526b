//! In-memory fakes for the service traits

use crate::provider::{AssetSource, CompletionBackend, ShapeTaskRequest, TaskApi, TextureTaskRequest};
use crate::task::Task;
use kiln_core::{KilnError, Result, TaskKind};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Completion backend returning a fixed reply or a fixed failure
pub struct StaticCompletion {
    reply: std::result::Result<String, String>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl StaticCompletion {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.calls)
    }
}

impl CompletionBackend for StaticCompletion {
    fn name(&self) -> &str {
        "static"
    }

    fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        self.reply.clone().map_err(|message| KilnError::Request {
            url: "fake://completion".to_string(),
            status: Some(500),
            message,
        })
    }
}

/// A call observed by `ScriptedTaskApi`
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    CreateShape(ShapeTaskRequest),
    CreateTexture(TextureTaskRequest),
    Fetch(String, TaskKind),
}

#[derive(Default)]
struct ScriptState {
    shape_id: String,
    texture_id: String,
    responses: HashMap<TaskKind, VecDeque<Value>>,
    create_failure: HashMap<TaskKind, u16>,
    calls: Vec<ApiCall>,
}

/// Task API that replays scripted status bodies per task kind.
///
/// The last scripted body for a kind repeats forever, so a single non-terminal
/// body models a task that never finishes.
#[derive(Clone)]
pub struct ScriptedTaskApi {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTaskApi {
    pub fn new(shape_id: &str, texture_id: &str) -> Self {
        let state = ScriptState {
            shape_id: shape_id.to_string(),
            texture_id: texture_id.to_string(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn script(self, kind: TaskKind, bodies: Vec<Value>) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(kind, bodies.into());
        self
    }

    pub fn fail_create(self, kind: TaskKind, status: u16) -> Self {
        self.state.lock().unwrap().create_failure.insert(kind, status);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn fetch_count(&self, kind: TaskKind) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ApiCall::Fetch(_, k) if *k == kind))
            .count()
    }

    fn create(&self, kind: TaskKind, call: ApiCall) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(&status) = state.create_failure.get(&kind) {
            return Err(KilnError::Request {
                url: format!("fake://{}", kind),
                status: Some(status),
                message: "scripted failure".to_string(),
            });
        }
        Ok(match kind {
            TaskKind::Shape => state.shape_id.clone(),
            TaskKind::Texture => state.texture_id.clone(),
        })
    }
}

impl TaskApi for ScriptedTaskApi {
    fn name(&self) -> &str {
        "scripted"
    }

    fn create_shape_task(&self, request: &ShapeTaskRequest) -> Result<String> {
        self.create(TaskKind::Shape, ApiCall::CreateShape(request.clone()))
    }

    fn create_texture_task(&self, request: &TextureTaskRequest) -> Result<String> {
        self.create(TaskKind::Texture, ApiCall::CreateTexture(request.clone()))
    }

    fn fetch_task(&self, task_id: &str, kind: TaskKind) -> Result<Task> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::Fetch(task_id.to_string(), kind));
        let queue = state.responses.entry(kind).or_default();
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        let body = next.ok_or_else(|| KilnError::Request {
            url: format!("fake://{}/{}", kind, task_id),
            status: Some(404),
            message: "no scripted task".to_string(),
        })?;
        Task::from_json(task_id, kind, &body)
    }
}

/// Asset source serving in-memory blobs, delivered a few bytes per read
pub struct MemoryAssetSource {
    blobs: HashMap<String, Vec<u8>>,
    read_size: usize,
    fail_after: Option<usize>,
}

impl MemoryAssetSource {
    pub fn new(read_size: usize) -> Self {
        Self {
            blobs: HashMap::new(),
            read_size,
            fail_after: None,
        }
    }

    pub fn with(mut self, url: &str, bytes: &[u8]) -> Self {
        self.blobs.insert(url.to_string(), bytes.to_vec());
        self
    }

    /// Make every stream error once this many bytes have been delivered
    pub fn failing_after(mut self, bytes: usize) -> Self {
        self.fail_after = Some(bytes);
        self
    }
}

impl AssetSource for MemoryAssetSource {
    fn open(&self, url: &str) -> Result<Box<dyn Read>> {
        let bytes = self.blobs.get(url).cloned().ok_or_else(|| KilnError::Request {
            url: url.to_string(),
            status: Some(404),
            message: "not found".to_string(),
        })?;
        Ok(Box::new(TrickleReader {
            bytes,
            pos: 0,
            read_size: self.read_size.max(1),
            fail_after: self.fail_after,
        }))
    }
}

struct TrickleReader {
    bytes: Vec<u8>,
    pos: usize,
    read_size: usize,
    fail_after: Option<usize>,
}

impl Read for TrickleReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if let Some(limit) = self.fail_after {
            if self.pos >= limit {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset by fake",
                ));
            }
        }
        let end = (self.pos + self.read_size)
            .min(self.bytes.len())
            .min(self.pos + buf.len());
        let n = end - self.pos;
        buf[..n].copy_from_slice(&self.bytes[self.pos..end]);
        self.pos = end;
        Ok(n)
    }
}

/// Fresh directory under the system temp dir
pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{}_{}", prefix, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
