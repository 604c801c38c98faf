/// External provider abstraction
///
/// This module provides a pluggable architecture for the two outbound
/// dependencies: a text-generation provider (taste analysis and book
/// recommendations) and a movie-metadata provider (search/autocomplete).
/// Each is an opaque, possibly-unreliable HTTP service; the service layer
/// above decides what happens when a call fails.
use crate::{error::AppResult, models::MovieSummary};

pub mod openai;
pub mod tmdb;

/// Trait for text-generation providers
///
/// One call, one text blob back. No retries are performed at this layer;
/// callers absorb failures into their deterministic fallbacks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Submit a system instruction and user prompt, returning the raw reply text
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for movie-metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Search for movies by free-text query, ranked by provider relevance
    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieSummary>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
