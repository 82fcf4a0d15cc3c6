use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{GenerateResponse, GenerationRecord, RawGenerateRequest},
    orchestrator::Generator,
};

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/generation/:id", get(get_generation))
        .route("/api/generations", get(list_generations))
        .layer(ServiceBuilder::new().layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ))
        .with_state(state)
}

pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<RawGenerateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GenerateResponse>), ApiError> {
    let Json(raw) = body.map_err(|e| ApiError::Validation(vec![e.body_text()]))?;
    let request = raw.validate().map_err(ApiError::Validation)?;

    tracing::info!("🚀 Generating blueprint for idea: {}", request.idea);
    let response = state.generator.generate(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_generation(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<GenerationRecord>, ApiError> {
    let not_found = || ApiError::NotFound("Generation not found".into());
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    state.generator.find_by_id(id).await?.map(Json).ok_or_else(not_found)
}

pub async fn list_generations(State(state): State<AppState>) -> Result<Json<Vec<GenerationRecord>>, ApiError> {
    Ok(Json(state.generator.find_all().await?))
}
