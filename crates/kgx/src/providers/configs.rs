pub const DEFAULT_HOST: &str = "https://integrate.api.nvidia.com/v1";
pub const DEFAULT_MODEL: &str = "meta/llama-3.3-70b-instruct";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Connection settings for an OpenAI-compatible chat completions endpoint.
///
/// `host` is the API base including any version segment, e.g. `https://api.openai.com/v1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl OpenAiProviderConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }
}
