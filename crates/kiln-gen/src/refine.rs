//! Prompt refinement
//!
//! Splits a free-form request into a geometry prompt for the shape task and a
//! material prompt for the texture task. Refinement is best-effort: any
//! failure falls back to the raw prompt for both halves.

use crate::provider::CompletionBackend;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Fixed instruction constraining the reply to a two-field JSON object
pub const SYSTEM_INSTRUCTION: &str = "You are a prompt engineer for a text-to-3D AI. Your task is to \
interpret a user's request and break it down into two components: an 'object_prompt' for \
generating the 3D model's shape, and a 'style_prompt' for texturing the model. The \
'object_prompt' should be a concise, one-sentence description of the object's geometry. The \
'style_prompt' should describe the materials, colors, patterns, and overall aesthetic. Respond \
ONLY with a valid JSON object with the keys 'object_prompt' and 'style_prompt'.";

/// Shape and style halves of a user request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinedPrompt {
    pub object_prompt: String,
    pub style_prompt: String,
}

impl RefinedPrompt {
    /// The degraded form: the raw prompt drives both tasks
    pub fn fallback(raw_prompt: &str) -> Self {
        Self {
            object_prompt: raw_prompt.to_string(),
            style_prompt: raw_prompt.to_string(),
        }
    }
}

/// Turns raw prompts into `RefinedPrompt`s via a completion backend
pub struct PromptRefiner {
    backend: Box<dyn CompletionBackend>,
}

impl PromptRefiner {
    pub fn new(backend: Box<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Refine `raw_prompt` with a single attempt. Never fails.
    pub fn refine(&self, raw_prompt: &str) -> RefinedPrompt {
        info!("Refining prompt with {}: '{}'", self.backend.name(), raw_prompt);

        let reply = match self.backend.complete(SYSTEM_INSTRUCTION, raw_prompt) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Prompt refinement failed, using raw prompt: {}", e);
                return RefinedPrompt::fallback(raw_prompt);
            }
        };

        match parse_refined(&reply) {
            Some(refined) => {
                info!(
                    "Refined prompts: object='{}' style='{}'",
                    refined.object_prompt, refined.style_prompt
                );
                refined
            }
            None => {
                warn!(
                    "Prompt refinement returned unusable output, using raw prompt: {}",
                    reply
                );
                RefinedPrompt::fallback(raw_prompt)
            }
        }
    }
}

/// Parse a refinement reply. Both keys must be non-empty strings.
///
/// Models sometimes wrap the object in a Markdown code fence; the fence is
/// stripped before parsing.
pub fn parse_refined(reply: &str) -> Option<RefinedPrompt> {
    let refined: RefinedPrompt = serde_json::from_str(strip_code_fence(reply)).ok()?;
    if refined.object_prompt.trim().is_empty() || refined.style_prompt.trim().is_empty() {
        return None;
    }
    Some(refined)
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop an info string such as `json` on the opening fence line
    match inner.find('\n') {
        Some(pos) if !inner[..pos].trim_start().starts_with('{') => inner[pos + 1..].trim(),
        _ => inner.trim(),
    }
}
