//! Shared HTTP plumbing for the remote providers

use crate::provider::AssetSource;
use kiln_core::{KilnError, Result};
use std::io::Read;
use std::time::Duration;

/// Per-call deadline for JSON API requests
pub const REQUEST_TIMEOUT_SECS: u64 = 60;
/// Connect deadline for asset downloads; the body itself may take longer
const DOWNLOAD_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Agent for short JSON exchanges
pub(crate) fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .build();
    config.into()
}

/// Agent for streaming downloads, bounded only on connect
fn build_download_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(Duration::from_secs(DOWNLOAD_CONNECT_TIMEOUT_SECS)))
        .build();
    config.into()
}

/// `Authorization` header value for a key
pub(crate) fn bearer(api_key: &str) -> String {
    format!("Bearer {}", api_key)
}

/// Map a transport or status error onto `KilnError::Request`
pub(crate) fn request_error(url: &str, err: ureq::Error) -> KilnError {
    match err {
        ureq::Error::StatusCode(code) => KilnError::Request {
            url: url.to_string(),
            status: Some(code),
            message: status_reason(code).to_string(),
        },
        other => KilnError::Request {
            url: url.to_string(),
            status: None,
            message: other.to_string(),
        },
    }
}

/// Error for a success response whose JSON body could not be read
pub(crate) fn body_error(url: &str, err: ureq::Error) -> KilnError {
    KilnError::Parse(format!("unreadable response body from {}: {}", url, err))
}

fn status_reason(code: u16) -> &'static str {
    match code {
        400 => "bad request",
        401 => "unauthorized (check the API key)",
        402 => "payment required (out of credits?)",
        403 => "forbidden",
        404 => "not found",
        429 => "rate limited",
        500..=599 => "server error",
        _ => "unexpected status",
    }
}

/// Plain HTTP GET asset source
pub struct HttpAssetSource {
    agent: ureq::Agent,
}

impl HttpAssetSource {
    pub fn new() -> Self {
        Self {
            agent: build_download_agent(),
        }
    }
}

impl Default for HttpAssetSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetSource for HttpAssetSource {
    fn open(&self, url: &str) -> Result<Box<dyn Read>> {
        let response = self.agent.get(url).call().map_err(|e| request_error(url, e))?;
        Ok(Box::new(response.into_body().into_reader()))
    }
}
