use actix_cors::Cors;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, get, middleware::Logger, post, web};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::correction::Corrector;
use crate::dto::UploadResponse;
use crate::engine::WhisperEngine;
use crate::pipeline::Pipeline;

pub struct AppState {
    pub pipeline: Pipeline,
}

#[get("/")]
pub async fn index() -> impl Responder {
    debug!("Health check endpoint called");
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("wav-transcribe is running")
}

#[post("/upload-wav")]
pub async fn upload_wav(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    let request_id = Uuid::new_v4().to_string();

    match data
        .pipeline
        .process(&request_id, req.query_string(), &body)
        .await
    {
        Ok(text) => {
            info!("[{request_id}] Transcription completed: {} characters", text.len());
            HttpResponse::Ok().json(UploadResponse::ok(text))
        }
        Err(e) => {
            error!("[{request_id}] Error processing WAV file ({}): {e}", e.kind());
            HttpResponse::InternalServerError().json(UploadResponse::failed())
        }
    }
}

/// Routes, middleware and shared state for one app instance.
pub fn configure(state: web::Data<AppState>, max_body_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(state)
            .app_data(web::PayloadConfig::new(max_body_bytes))
            .service(index)
            .service(upload_wav);
    }
}

pub fn build_state(config: &ServerConfig) -> Result<web::Data<AppState>> {
    let engine_config = config
        .engine
        .prepare()
        .context("Engine is not usable")?;
    info!(
        "Using engine {} (work_dir={}, timeout={:?}, max_jobs={})",
        engine_config.program.display(),
        engine_config.work_dir.display(),
        engine_config.timeout,
        engine_config.max_jobs
    );

    let corrector = match &config.correction {
        Some(correction) => {
            if correction.api_key.is_none() {
                warn!("Correction is enabled but OPENAI_API_KEY is not set; corrections will fail");
            }
            Some(Corrector::new(correction).context("Failed to build correction client")?)
        }
        None => None,
    };

    let pipeline = Pipeline::new(WhisperEngine::new(&engine_config), corrector);
    Ok(web::Data::new(AppState { pipeline }))
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    info!("Starting WAV transcription service");

    let state = build_state(&config)?;
    info!(
        "Correction stage {}",
        if state.pipeline.correction_enabled() { "enabled" } else { "disabled" }
    );

    let max_body_bytes = config.max_body_bytes;
    info!("Starting HTTP server on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(configure(state.clone(), max_body_bytes))
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?
    .run()
    .await?;

    Ok(())
}
