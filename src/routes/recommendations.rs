use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{RecommendationResponse, TasteProfile, UserPreferences},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub movies: Vec<String>,
    #[serde(default)]
    pub preferences: Option<UserPreferences>,
}

/// Handler for the book recommendation endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<RecommendationResponse>>> {
    let responses = state
        .recommendations
        .generate(&request.movies, request.preferences.as_ref())
        .await?;
    Ok(Json(responses))
}

/// Handler for the standalone taste-profile endpoint
pub async fn taste_profile(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<TasteProfile>> {
    let profile = state
        .recommendations
        .analyze_taste_profile(&request.movies, request.preferences.as_ref())
        .await?;
    Ok(Json(profile))
}
