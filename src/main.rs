use std::sync::Arc;

use reelread_api::{
    config::Config,
    routes::create_router,
    services::{
        movie_search::MovieSearchService,
        providers::{openai::OpenAiProvider, tmdb::TmdbProvider},
        recommendations::RecommendationService,
    },
    state::AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let generator = Arc::new(OpenAiProvider::new(
        config.openai_api_key.clone(),
        config.openai_api_url.clone(),
        config.openai_model.clone(),
        config.generation_timeout_secs,
    ));
    let catalog = Arc::new(TmdbProvider::new(
        config.tmdb_read_access_token.clone(),
        config.tmdb_api_url.clone(),
    ));

    let state = AppState::new(
        Arc::new(RecommendationService::new(
            generator,
            config.books_per_recommendation,
        )),
        Arc::new(MovieSearchService::new(catalog)),
    );

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
