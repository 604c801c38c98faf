use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Text-generation provider API key
    pub openai_api_key: String,

    /// Text-generation provider base URL
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    /// Model identifier sent with every completion request
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Timeout for text-generation calls, in seconds
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// TMDB read access token (bearer auth)
    pub tmdb_read_access_token: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Number of books returned per recommendation
    #[serde(default = "default_books_per_recommendation")]
    pub books_per_recommendation: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    30
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_books_per_recommendation() -> usize {
    3
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
