use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::{DeleteResponse, HealthResponse, TtsRequest, TtsResponse};
use crate::api::routes::AppState;
use crate::error::AppError;

const MAX_TEXT_CHARS: usize = 1000;

pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TtsRequest>,
) -> Result<Json<TtsResponse>, AppError> {
    // Validation order matters: engine presence first, then input checks.
    if !state.tts.is_loaded() {
        return Err(AppError::ModelNotLoaded);
    }

    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text cannot be empty".into()));
    }

    if request.text.chars().count() > MAX_TEXT_CHARS {
        return Err(AppError::BadRequest(
            "Text is too long (max 1000 characters)".into(),
        ));
    }

    let filename = state.store.fresh_filename();
    let path = state.store.path_for(&filename);

    state
        .tts
        .synthesize(&request.text, &request.language, &path)
        .await?;

    tracing::info!("Audio generated: {}", filename);

    Ok(Json(TtsResponse {
        success: true,
        audio_url: format!("/static/audio/{}", filename),
        message: "Speech generated successfully!".into(),
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.tts.is_loaded(),
        model_type: state.tts.model_type().map(|t| t.to_string()),
    })
}

pub async fn delete_audio(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.store.delete(&filename)?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "Audio deleted".into(),
    }))
}
