use thiserror::Error;

/// Every way an upload can fail. The client never sees these details, they are
/// logged server-side and collapsed into one generic response.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine failed: {0}")]
    Process(String),

    #[error("correction service failed: {0}")]
    RemoteService(String),

    #[error("malformed engine output: {0}")]
    Parse(String),
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Stable tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Io { .. } => "io",
            PipelineError::Process(_) => "process",
            PipelineError::RemoteService(_) => "remote_service",
            PipelineError::Parse(_) => "parse",
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::RemoteService(e.to_string())
    }
}
