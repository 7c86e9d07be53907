use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    ClientConfig, CorrectionConfig, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, ServerConfig,
};
use crate::engine::EngineConfig;
use crate::engine::config::{DEFAULT_ENGINE, DEFAULT_MAX_JOBS, DEFAULT_TIMEOUT_SECS, default_work_dir};

const MAX_BODY_MB: u64 = 4096;

#[derive(Parser)]
#[command(
    name = "wav-transcribe",
    about = "WAV upload transcription service backed by the whisper CLI",
    long_about = "Accepts WAV uploads over HTTP, transcribes (or translates to English) them with the whisper command-line tool and optionally polishes the transcript with a chat-completion model.",
    after_help = "EXAMPLES:\n    # Start the server on 0.0.0.0:3000\n    wav-transcribe serve\n\n    # Use a specific whisper install and enable grammar correction\n    OPENAI_API_KEY=sk-... wav-transcribe serve --engine /opt/whisper/bin/whisper --correct\n\n    # Transcribe a Spanish recording into English text\n    wav-transcribe file recording.wav --lang spanish --model small\n\n    # Use a different server\n    wav-transcribe file audio.wav --server-url http://my-server:3000"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(name = "serve")]
    Serve(ServeArgs),
    #[command(name = "file")]
    TranscribeFile(FileArgs),
}

#[derive(clap::Args)]
pub struct FileArgs {
    pub audio_file: String,

    #[arg(long, default_value = "http://localhost:3000")]
    pub server_url: String,

    /// English or Spanish, any case
    #[arg(long)]
    pub lang: Option<String>,

    /// tiny, base or small
    #[arg(long)]
    pub model: Option<String>,

    /// Fail instead of falling back to the raw transcript
    #[arg(long)]
    pub require_correction: bool,
}

#[derive(clap::Args)]
pub struct ServeArgs {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// whisper executable, a path or a name on PATH
    #[arg(long, env = "WHISPER_BIN", default_value = DEFAULT_ENGINE)]
    pub engine: PathBuf,

    /// Directory for per-request audio and result files
    #[arg(long, env = "WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    #[arg(long, env = "TRANSCRIBE_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Maximum number of concurrent engine runs
    #[arg(long, env = "MAX_CONCURRENT_JOBS", default_value_t = DEFAULT_MAX_JOBS, value_parser = validate_max_jobs)]
    pub max_jobs: usize,

    /// Request body limit in MiB
    #[arg(long, env = "MAX_BODY_MB", default_value = "100", value_parser = clap::value_parser!(u64).range(1..=MAX_BODY_MB))]
    pub max_body_mb: u64,

    /// Enable the grammar correction stage (needs OPENAI_API_KEY)
    #[arg(long, env = "CORRECTION_ENABLED", value_parser = clap::builder::BoolishValueParser::new())]
    pub correct: bool,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    pub openai_base_url: String,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_OPENAI_MODEL)]
    pub openai_model: String,
}

impl ServeArgs {
    pub fn into_config(self) -> ServerConfig {
        let correction = self
            .correct
            .then(|| CorrectionConfig::from_env(self.openai_base_url, self.openai_model));

        ServerConfig {
            host: self.host,
            port: self.port,
            max_body_bytes: usize::try_from(self.max_body_mb * 1024 * 1024).unwrap_or(usize::MAX),
            engine: EngineConfig {
                program: self.engine,
                work_dir: self.work_dir.unwrap_or_else(default_work_dir),
                timeout: Duration::from_secs(self.timeout_secs),
                max_jobs: self.max_jobs,
            },
            correction,
        }
    }
}

impl FileArgs {
    pub fn into_config(self) -> ClientConfig {
        ClientConfig {
            server_url: self.server_url,
            audio_file: self.audio_file,
            lang: self.lang,
            model: self.model,
            require_correction: self.require_correction,
        }
    }
}

pub fn validate_max_jobs(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("Max jobs must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err("Invalid max jobs value".to_string()),
    }
}
