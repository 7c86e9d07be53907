use serde::{Deserialize, Serialize};

pub const GENERIC_ERROR: &str = "Failed to process WAV file";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn ok(text: String) -> Self {
        Self {
            success: true,
            text: Some(text),
            error: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            text: None,
            error: Some(GENERIC_ERROR.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(alias = "language")]
    pub lang: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub require_correction: bool,
}
