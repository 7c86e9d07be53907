pub mod config;
pub mod runner;

pub use config::EngineConfig;
pub use runner::WhisperEngine;
