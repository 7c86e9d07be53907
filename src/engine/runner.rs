use log::{debug, info, warn};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::engine::config::EngineConfig;
use crate::error::PipelineError;
use crate::params::TranscribeParams;

// Longest stderr excerpt carried into an error.
const STDERR_EXCERPT: usize = 512;

/// The subset of the engine's JSON output we rely on.
#[derive(Debug, Deserialize)]
struct EngineOutput {
    text: String,
}

/// Runs the whisper CLI as a child process, at most `max_jobs` at a time.
#[derive(Clone)]
pub struct WhisperEngine {
    program: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl WhisperEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            program: config.program.clone(),
            output_dir: config.work_dir.clone(),
            timeout: config.timeout,
            permits: Arc::new(Semaphore::new(config.max_jobs)),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs the engine on `audio` and returns the transcribed text.
    pub async fn transcribe(
        &self,
        audio: &Path,
        params: &TranscribeParams,
    ) -> Result<String, PipelineError> {
        self.run(audio, params).await?;
        read_result(&output_path(audio, &self.output_dir)).await
    }

    async fn run(&self, audio: &Path, params: &TranscribeParams) -> Result<(), PipelineError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PipelineError::Process("engine pool closed".to_string()))?;

        let args = build_args(audio, params, &self.output_dir);
        debug!("Running {} {:?}", self.program.display(), args);

        let start = Instant::now();
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so helpers the engine starts (ffmpeg) die with it.
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| {
                PipelineError::Process(format!(
                    "failed to launch {}: {e}",
                    self.program.display()
                ))
            })?;

        let pid = child.id();

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| {
                PipelineError::Process(format!("failed to wait for engine: {e}"))
            })?,
            Err(_) => {
                #[cfg(unix)]
                if let Some(pid) = pid {
                    kill_process_group(pid).await;
                }
                warn!("Engine timed out after {:?}, killed", self.timeout);
                return Err(PipelineError::Process(format!(
                    "timed out after {:?}",
                    self.timeout
                )));
            }
        };

        debug!(
            "Engine stdout: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Process(format!(
                "exited with {}: {}",
                output.status,
                excerpt(stderr.trim())
            )));
        }

        info!(
            "Engine finished in {} ms ({} {}, model {})",
            start.elapsed().as_millis(),
            params.language.task(),
            params.language,
            params.model
        );
        Ok(())
    }
}

/// Sends SIGKILL to every process in the group led by `pgid`.
#[cfg(unix)]
async fn kill_process_group(pgid: u32) {
    let target = format!("-{pgid}");
    match Command::new("kill")
        .args(["-KILL", "--", &target])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) if !status.success() => {
            debug!("kill {target} exited with {status}");
        }
        Ok(_) => {}
        Err(e) => warn!("Failed to kill engine process group {pgid}: {e}"),
    }
}

/// Argument vector for one engine run, audio path first.
pub fn build_args(audio: &Path, params: &TranscribeParams, output_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![audio.into()];
    for arg in [
        "--model",
        params.model.as_str(),
        "--output_format",
        "json",
        "--language",
        params.language.as_str(),
        "--task",
        params.language.task().as_str(),
        "--fp16",
        "False",
        "--output_dir",
    ] {
        args.push(arg.into());
    }
    args.push(output_dir.into());
    args
}

/// Where the engine writes its result: the audio file's stem with `.json`.
pub fn output_path(audio: &Path, output_dir: &Path) -> PathBuf {
    let stem = audio.file_stem().unwrap_or(audio.as_os_str());
    let mut name = stem.to_os_string();
    name.push(".json");
    output_dir.join(name)
}

pub async fn read_result(path: &Path) -> Result<String, PipelineError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::io(format!("failed to read {}", path.display()), e))?;
    let output: EngineOutput =
        serde_json::from_slice(&raw).map_err(|e| PipelineError::Parse(e.to_string()))?;
    Ok(output.text.trim().to_string())
}

fn excerpt(s: &str) -> &str {
    if s.len() <= STDERR_EXCERPT {
        return s;
    }
    let mut end = STDERR_EXCERPT;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
