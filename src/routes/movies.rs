use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{models::MovieSummary, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Handler for movie search/autocomplete.
///
/// Infallible: short or failing searches degrade to the fixed fallback list.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<MovieSummary>> {
    Json(state.movie_search.search(&params.q).await)
}
