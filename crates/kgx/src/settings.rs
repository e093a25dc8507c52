//! Layered configuration: built-in defaults, then an optional `kgx.toml`, then `KGX_*`
//! environment variables (`KGX_PROVIDER__API_KEY`, `KGX_LOADER__MAX_CHARS`, ...).
//!
//! Settings are resolved once at startup and handed to the components that need them.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::loader::ExtractorStrategy;
use crate::pipeline::PipelineOptions;
use crate::providers::base::GenerationParams;
use crate::providers::configs::{
    OpenAiProviderConfig, DEFAULT_HOST, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
};
use crate::store::DEFAULT_DB_PATH;

pub const DEFAULT_MAX_CHARS: usize = 12_000;
pub const MIN_MAX_CHARS: usize = 2_000;
pub const MAX_MAX_CHARS: usize = 50_000;

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    pub host: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl ProviderSettings {
    pub fn to_config(&self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.host.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderSettings {
    pub max_chars: usize,
    pub timeout_secs: u64,
    pub strategy: ExtractorStrategy,
}

impl LoaderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub enforce_confirmation_subset: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub loader: LoaderSettings,
    pub store: StoreSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    pub server: ServerSettings,
}

/// Values supplied for a single invocation (CLI flags, request fields)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub host: Option<String>,
    pub model: Option<String>,
    pub max_chars: Option<usize>,
}

impl Settings {
    /// Load from `kgx.toml` in the working directory (if any) and the environment
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load using `config_file` instead of the default `kgx.toml` lookup
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name("kgx").required(false),
        };

        Config::builder()
            .set_default("provider.host", DEFAULT_HOST)?
            .set_default("provider.model", DEFAULT_MODEL)?
            .set_default("provider.temperature", 0.2)?
            .set_default("provider.top_p", 0.7)?
            .set_default("provider.max_tokens", 1200)?
            .set_default("provider.timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("loader.max_chars", DEFAULT_MAX_CHARS as u64)?
            .set_default("loader.timeout_secs", 20)?
            .set_default("loader.strategy", "auto")?
            .set_default("store.path", DEFAULT_DB_PATH)?
            .set_default("pipeline.enforce_confirmation_subset", false)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .add_source(file)
            .add_source(
                Environment::with_prefix("KGX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Replace settings with whatever the caller supplied for this invocation
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(api_key) = overrides.api_key.filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(api_key);
        }
        if let Some(host) = overrides.host.filter(|h| !h.trim().is_empty()) {
            self.provider.host = host;
        }
        if let Some(model) = overrides.model.filter(|m| !m.trim().is_empty()) {
            self.provider.model = model;
        }
        if let Some(max_chars) = overrides.max_chars {
            self.loader.max_chars = max_chars;
        }
    }

    /// The page-text budget, kept inside the range the surfaces allow
    pub fn max_chars(&self) -> usize {
        self.loader.max_chars.clamp(MIN_MAX_CHARS, MAX_MAX_CHARS)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            params: self.provider.params(),
            enforce_confirmation_subset: self.pipeline.enforce_confirmation_subset,
        }
    }
}
