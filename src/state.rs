use std::sync::Arc;

use crate::services::{movie_search::MovieSearchService, recommendations::RecommendationService};

/// Shared application state
///
/// Only immutable configuration and wired service facades; no mutable state
/// is shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
    pub movie_search: Arc<MovieSearchService>,
}

impl AppState {
    pub fn new(
        recommendations: Arc<RecommendationService>,
        movie_search: Arc<MovieSearchService>,
    ) -> Self {
        Self {
            recommendations,
            movie_search,
        }
    }
}
