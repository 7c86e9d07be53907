use std::time::Duration;

use crate::engine::EngineConfig;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CORRECTION_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub engine: EngineConfig,
    /// `None` keeps the correction stage off.
    pub correction: Option<CorrectionConfig>,
}

#[derive(Clone)]
pub struct CorrectionConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl CorrectionConfig {
    /// Reads the API key from `OPENAI_API_KEY`.
    pub fn from_env(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(DEFAULT_CORRECTION_TIMEOUT_SECS),
        }
    }
}

// Keeps the key out of startup logs.
impl std::fmt::Debug for CorrectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrectionConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug)]
pub struct ClientConfig {
    pub server_url: String,
    pub audio_file: String,
    pub lang: Option<String>,
    pub model: Option<String>,
    pub require_correction: bool,
}
