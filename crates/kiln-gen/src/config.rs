//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `KILN_{PROVIDER}_API_KEY`, then `{PROVIDER}_API_KEY`
//! 2. Project-local: `.kiln/config.toml`
//! 3. Global: `~/.kiln/config.toml`

use kiln_core::{KilnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Provider name of the prompt refinement service
pub const REFINER: &str = "groq";
/// Provider name of the 3D generation service
pub const GENERATOR: &str = "meshy";

const PROVIDER_NAMES: [&str; 2] = [REFINER, GENERATOR];

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
}

/// Resolved generation settings
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub output_dir: String,
    pub timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub art_style: String,
    pub enable_pbr: bool,
    pub refine_model: String,
    pub refine_max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: "models".to_string(),
            timeout_secs: 900,
            poll_interval_secs: 10,
            art_style: "realistic".to_string(),
            enable_pbr: true,
            refine_model: "llama-3.3-70b-versatile".to_string(),
            refine_max_tokens: 256,
        }
    }
}

/// The `[generation]` table of one config file. Unset keys fall through to
/// the layer below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationFile {
    pub output_dir: Option<String>,
    pub timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub art_style: Option<String>,
    pub enable_pbr: Option<bool>,
    pub refine_model: Option<String>,
    pub refine_max_tokens: Option<u32>,
}

impl GenerationFile {
    fn merge(&mut self, overlay: GenerationFile) {
        if overlay.output_dir.is_some() {
            self.output_dir = overlay.output_dir;
        }
        if overlay.timeout_secs.is_some() {
            self.timeout_secs = overlay.timeout_secs;
        }
        if overlay.poll_interval_secs.is_some() {
            self.poll_interval_secs = overlay.poll_interval_secs;
        }
        if overlay.art_style.is_some() {
            self.art_style = overlay.art_style;
        }
        if overlay.enable_pbr.is_some() {
            self.enable_pbr = overlay.enable_pbr;
        }
        if overlay.refine_model.is_some() {
            self.refine_model = overlay.refine_model;
        }
        if overlay.refine_max_tokens.is_some() {
            self.refine_max_tokens = overlay.refine_max_tokens;
        }
    }

    /// Fill unset keys with built-in defaults
    fn resolve(self) -> GenerationConfig {
        let d = GenerationConfig::default();
        GenerationConfig {
            output_dir: self.output_dir.unwrap_or(d.output_dir),
            timeout_secs: self.timeout_secs.unwrap_or(d.timeout_secs),
            poll_interval_secs: self.poll_interval_secs.unwrap_or(d.poll_interval_secs),
            art_style: self.art_style.unwrap_or(d.art_style),
            enable_pbr: self.enable_pbr.unwrap_or(d.enable_pbr),
            refine_model: self.refine_model.unwrap_or(d.refine_model),
            refine_max_tokens: self.refine_max_tokens.unwrap_or(d.refine_max_tokens),
        }
    }
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KilnConfigFile {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub generation: GenerationFile,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, Default)]
pub struct KilnConfig {
    pub providers: HashMap<String, ProviderConfig>,
    pub generation: GenerationConfig,
}

impl KilnConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = KilnConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = PathBuf::from(".kiln/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_overrides(&mut config, |name| std::env::var(name).ok());

        Ok(KilnConfig {
            providers: config.providers,
            generation: config.generation.resolve(),
        })
    }

    /// Load config from a specific file path only, with env overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config, |name| std::env::var(name).ok());
        Ok(KilnConfig {
            providers: config.providers,
            generation: config.generation.resolve(),
        })
    }

    /// Get API key for a provider. Empty keys count as unset.
    pub fn api_key(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    /// Get the base URL override for a provider
    pub fn api_url(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_url.as_deref())
    }

    /// Set a provider's API key, creating the provider entry if needed
    pub fn set_api_key(&mut self, provider_name: &str, key: impl Into<String>) {
        self.providers
            .entry(provider_name.to_string())
            .or_default()
            .api_key = Some(key.into());
    }

    /// Fail unless every named provider has a credential.
    ///
    /// The error names all missing keys at once so a single edit of the
    /// environment fixes startup.
    pub fn require_credentials(&self, provider_names: &[&str]) -> Result<()> {
        let missing: Vec<String> = provider_names
            .iter()
            .filter(|name| self.api_key(name).is_none())
            .map(|name| format!("{}_API_KEY", name.to_uppercase()))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(KilnError::Config(format!(
                "missing credential(s): {}. Set them in the environment, .env.local, or .kiln/config.toml",
                missing.join(", ")
            )))
        }
    }

    /// Both credentials the full pipeline needs
    pub fn require_pipeline_credentials(&self) -> Result<()> {
        self.require_credentials(&PROVIDER_NAMES)
    }

    /// Wait between status checks. Zero is rejected so waits never spin.
    pub fn poll_interval(&self) -> Result<Duration> {
        match self.generation.poll_interval_secs {
            0 => Err(KilnError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            )),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.generation.timeout_secs)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".kiln").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<KilnConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let config: KilnConfigFile = toml::from_str(&content).map_err(|e| {
            KilnError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut KilnConfigFile, overlay: KilnConfigFile) {
        for (name, provider) in overlay.providers {
            let entry = base.providers.entry(name).or_default();
            if provider.api_key.is_some() {
                entry.api_key = provider.api_key;
            }
            if provider.api_url.is_some() {
                entry.api_url = provider.api_url;
            }
        }

        base.generation.merge(overlay.generation);
    }

    fn apply_env_overrides<F>(config: &mut KilnConfigFile, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in &PROVIDER_NAMES {
            let upper = name.to_uppercase();
            let key = lookup(&format!("KILN_{}_API_KEY", upper))
                .or_else(|| lookup(&format!("{}_API_KEY", upper)))
                .filter(|k| !k.trim().is_empty());
            if let Some(key) = key {
                let entry = config.providers.entry(name.to_string()).or_default();
                entry.api_key = Some(key);
            }
        }
    }
}
