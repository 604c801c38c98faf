/// TMDB movie-metadata provider
///
/// Single bounded-timeout GET against the movie-search endpoint with a fixed
/// locale, first page only, adult content excluded. Results are capped at 10
/// and projected into MovieSummary with zero/empty defaults for anything the
/// provider leaves out.
use crate::{
    error::{AppError, AppResult},
    models::{MovieSummary, TmdbSearchResponse},
    services::providers::MovieCatalog,
};
use reqwest::Client as HttpClient;
use std::time::Duration;

const SEARCH_TIMEOUT_SECS: u64 = 10;
const SEARCH_LANGUAGE: &str = "en-US";
const MAX_RESULTS: usize = 10;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    read_access_token: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(read_access_token: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            read_access_token,
            api_url,
        }
    }
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbProvider {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieSummary>> {
        let url = format!("{}/search/movie", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.read_access_token)
            .query(&[
                ("query", query),
                ("language", SEARCH_LANGUAGE),
                ("page", "1"),
                ("include_adult", "false"),
                ("sort_by", "popularity.desc"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let search_response: TmdbSearchResponse = response.json().await?;
        let movies: Vec<MovieSummary> = search_response
            .results
            .into_iter()
            .take(MAX_RESULTS)
            .map(MovieSummary::from)
            .collect();

        tracing::info!(
            query = %query,
            results = movies.len(),
            provider = "tmdb",
            "Movie search completed"
        );

        Ok(movies)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
