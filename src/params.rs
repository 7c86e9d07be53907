use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

pub const DEFAULT_LANGUAGE: Language = Language::English;
pub const DEFAULT_MODEL: ModelSize = ModelSize::Base;

/// Spoken language of the uploaded audio. Spanish audio is translated to English.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    English,
    Spanish,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
        }
    }

    /// Engine task for this language.
    pub fn task(&self) -> Task {
        match self {
            Language::English => Task::Transcribe,
            Language::Spanish => Task::Translate,
        }
    }
}

impl FromStr for Language {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match title_case(s).as_str() {
            "English" => Ok(Language::English),
            "Spanish" => Ok(Language::Spanish),
            _ => Err(PipelineError::Validation(format!(
                "unsupported language: {s:?}"
            ))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    Transcribe,
    Translate,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Transcribe => "transcribe",
            Task::Translate => "translate",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whisper model size. Matched exactly, no case folding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
        }
    }
}

impl FromStr for ModelSize {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            _ => Err(PipelineError::Validation(format!(
                "unsupported model: {s:?}"
            ))),
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated selectors for one transcription request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranscribeParams {
    pub language: Language,
    pub model: ModelSize,
}

impl TranscribeParams {
    pub fn parse(language: Option<&str>, model: Option<&str>) -> Result<Self, PipelineError> {
        let language = match language {
            Some(raw) => raw.parse()?,
            None => DEFAULT_LANGUAGE,
        };
        let model = match model {
            Some(raw) => raw.parse()?,
            None => DEFAULT_MODEL,
        };
        Ok(Self { language, model })
    }
}

// "enGLISH" -> "English"
fn title_case(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
