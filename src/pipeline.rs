use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::correction::{self, Corrector};
use crate::dto::UploadQuery;
use crate::engine::WhisperEngine;
use crate::engine::runner::output_path;
use crate::error::PipelineError;
use crate::params::TranscribeParams;

/// Everything one upload needs: the engine pool and, when enabled, the
/// correction client.
pub struct Pipeline {
    engine: WhisperEngine,
    corrector: Option<Corrector>,
}

impl Pipeline {
    pub fn new(engine: WhisperEngine, corrector: Option<Corrector>) -> Self {
        Self { engine, corrector }
    }

    pub fn correction_enabled(&self) -> bool {
        self.corrector.is_some()
    }

    /// Validates, transcribes and optionally corrects one upload.
    pub async fn process(
        &self,
        request_id: &str,
        query_string: &str,
        audio: &[u8],
    ) -> Result<String, PipelineError> {
        let query = parse_query(query_string)?;
        let params = TranscribeParams::parse(query.lang.as_deref(), query.model.as_deref())?;

        info!(
            "[{request_id}] Received WAV file of {} bytes (language={}, model={})",
            audio.len(),
            params.language,
            params.model
        );

        if audio.is_empty() {
            return Err(PipelineError::Validation("empty request body".to_string()));
        }
        if query.require_correction && self.corrector.is_none() {
            return Err(PipelineError::RemoteService(
                "correction required but not enabled on this server".to_string(),
            ));
        }

        let files = WorkFiles::new(self.engine.output_dir(), request_id);
        write_audio(&files.audio, audio).await?;

        let transcript = self.engine.transcribe(&files.audio, &params).await?;
        debug!("[{request_id}] Transcript: {transcript}");

        let Some(corrector) = &self.corrector else {
            return Ok(transcript);
        };

        match corrector.correct(&transcript).await {
            Ok(corrected) => Ok(correction::combine(&transcript, &corrected)),
            Err(e) if !query.require_correction => {
                warn!("[{request_id}] Correction skipped ({}): {e}", e.kind());
                Ok(transcript)
            }
            Err(e) => Err(e),
        }
    }
}

pub fn parse_query(query_string: &str) -> Result<UploadQuery, PipelineError> {
    actix_web::web::Query::<UploadQuery>::from_query(query_string)
        .map(|q| q.into_inner())
        .map_err(|e| PipelineError::Validation(e.to_string()))
}

/// Overwrites `path` with `bytes` and flushes to disk before returning.
async fn write_audio(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let context = || format!("failed to write {}", path.display());
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| PipelineError::io(context(), e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| PipelineError::io(context(), e))?;
    file.sync_all()
        .await
        .map_err(|e| PipelineError::io(context(), e))?;
    Ok(())
}

/// Per-request audio and result paths, removed when dropped.
struct WorkFiles {
    audio: PathBuf,
    output: PathBuf,
}

impl WorkFiles {
    fn new(dir: &Path, request_id: &str) -> Self {
        let audio = dir.join(format!("{request_id}.wav"));
        let output = output_path(&audio, dir);
        Self { audio, output }
    }
}

// Drop cannot await, so the unlink is synchronous.
impl Drop for WorkFiles {
    fn drop(&mut self) {
        for path in [&self.audio, &self.output] {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {e}", path.display());
                }
            }
        }
    }
}
