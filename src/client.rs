use anyhow::{Result, anyhow};
use std::path::Path;

use crate::config::ClientConfig;
use crate::dto::UploadResponse;

pub fn upload_url(config: &ClientConfig) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(&format!(
        "{}/upload-wav",
        config.server_url.trim_end_matches('/')
    ))
    .map_err(|e| anyhow!("Invalid server URL {}: {}", config.server_url, e))?;

    {
        let mut query = url.query_pairs_mut();
        if let Some(lang) = &config.lang {
            query.append_pair("lang", lang);
        }
        if let Some(model) = &config.model {
            query.append_pair("model", model);
        }
        if config.require_correction {
            query.append_pair("require_correction", "true");
        }
    }
    // An empty query_pairs_mut still leaves a trailing '?'.
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

pub async fn send_transcription_request(config: &ClientConfig) -> Result<UploadResponse> {
    let client = reqwest::Client::new();

    if !Path::new(&config.audio_file).exists() {
        return Err(anyhow!("Audio file not found: {}", config.audio_file));
    }
    let audio_data = tokio::fs::read(&config.audio_file)
        .await
        .map_err(|e| anyhow!("Failed to read audio file: {}", e))?;

    println!(
        "📁 Audio source: file: {} ({} bytes)",
        config.audio_file,
        audio_data.len()
    );

    let url = upload_url(config)?;
    println!("🚀 Sending transcription request to: {url}");

    let response = client
        .post(url)
        .header("content-type", "audio/wav")
        .body(audio_data)
        .send()
        .await
        .map_err(|e| anyhow!("Failed to send request: {}", e))?;

    let status = response.status();
    let response_text = response
        .text()
        .await
        .map_err(|e| anyhow!("Failed to read response: {}", e))?;

    let result: UploadResponse = serde_json::from_str(&response_text)
        .map_err(|e| anyhow!("Failed to parse JSON response ({}): {}", status, e))?;

    if !status.is_success() || !result.success {
        return Err(anyhow!(
            "Server returned error {}: {}",
            status,
            result.error.unwrap_or(response_text)
        ));
    }

    Ok(result)
}

pub async fn check_server_health(server_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let server_url = server_url.trim_end_matches('/');

    println!("🔍 Checking server health at: {server_url}/");

    let response = client
        .get(format!("{server_url}/"))
        .send()
        .await
        .map_err(|e| anyhow!("Failed to connect to server: {}", e))?;

    if response.status().is_success() {
        println!("✅ Server is healthy");
        Ok(())
    } else {
        Err(anyhow!("Server health check failed: {}", response.status()))
    }
}

pub async fn run_client(config: ClientConfig) -> Result<()> {
    println!("🎵 WAV Transcribe Client");
    println!("========================");
    println!("📁 File Mode: {}", config.audio_file);
    println!();

    if let Err(e) = check_server_health(&config.server_url).await {
        eprintln!("❌ {e}");
        eprintln!("💡 Make sure the server is running: wav-transcribe serve");
        return Err(e);
    }

    match send_transcription_request(&config).await {
        Ok(result) => {
            println!("\n✅ Transcription completed!");
            println!("📝 Result:");
            println!("{}", result.text.unwrap_or_default());
        }
        Err(e) => {
            eprintln!("❌ Transcription failed: {e}");
            return Err(e);
        }
    }

    Ok(())
}
