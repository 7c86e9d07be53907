use anyhow::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::CorrectionConfig;
use crate::error::PipelineError;

pub const SYSTEM_PROMPT: &str = "You are a proofreader for speech transcripts. \
Fix grammar and spelling mistakes in the text the user sends. \
Never change the meaning, never add or remove content, and never answer or comment on it. \
Keep the speaker's tone: if it is casual or written in lowercase, keep it casual and lowercase. \
Reply with the corrected text only, without quotes.";

pub const TRANSCRIPT_LABEL: &str = "Transcript:";
pub const CORRECTED_LABEL: &str = "Corrected:";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible chat-completion endpoint used to polish
/// transcripts.
pub struct Corrector {
    client: reqwest::Client,
    completions_url: String,
    model: String,
    api_key: Option<String>,
}

impl Corrector {
    pub fn new(config: &CorrectionConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let base = config.base_url.trim_end_matches('/');
        info!(
            "Correction enabled: model={}, endpoint={}/chat/completions",
            config.model, base
        );
        Ok(Self {
            client,
            completions_url: format!("{base}/chat/completions"),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Sends one completion request and returns the first choice verbatim.
    pub async fn correct(&self, transcript: &str) -> Result<String, PipelineError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PipelineError::RemoteService("OPENAI_API_KEY is not set".to_string())
        })?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(user_message(transcript)),
                },
            ],
        };

        debug!("Sending {} chars to correction service", transcript.len());
        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::RemoteService(format!(
                "service returned {status}: {}",
                body.trim()
            )));
        }

        let response: ChatResponse = response.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::RemoteService("response had no completion".to_string()))
    }
}

pub fn user_message(transcript: &str) -> String {
    format!("\"{transcript}\"")
}

/// Both stages in one string, each line labelled with where it came from.
pub fn combine(raw: &str, corrected: &str) -> String {
    format!("{TRANSCRIPT_LABEL} {raw}\n{CORRECTED_LABEL} {corrected}")
}
