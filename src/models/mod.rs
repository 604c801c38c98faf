use serde::{Deserialize, Serialize};

/// Aesthetic profile inferred from a user's movie choices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TasteProfile {
    pub themes: Vec<String>,
    pub narrative_style: String,
    pub emotional_tone: String,
    pub genre_fusion: String,
    pub character_preferences: String,
    pub artistic_sensibilities: String,
    pub confidence_score: f64,
}

/// A single book recommendation surfaced to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookRecommendation {
    pub title: String,
    pub author: String,
    pub reason: String,
    pub taste_match_score: Option<f64>,
    pub primary_appeal: Option<String>,
}

/// One recommendation set: summary of the input movies, the books, and the
/// profile they were derived from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub movie: String,
    pub books: Vec<BookRecommendation>,
    pub taste_profile: TasteProfile,
}

/// Advisory constraints folded into the generation prompt.
///
/// None of these are validated against an enum; whatever the caller sends is
/// forwarded verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub pace: Option<String>,
    #[serde(default)]
    pub genre_preferences: Option<Vec<String>>,
    #[serde(default)]
    pub genre_blocklist: Option<Vec<String>>,
}

/// Movie search result returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: String,
    pub vote_average: f64,
    pub overview: String,
    pub popularity: f64,
}

// ============================================================================
// Text-generation provider reply types
// ============================================================================

/// Taste profile as the text-generation provider returns it.
///
/// Every field is optional on the wire; missing fields decode to empty values
/// and a missing confidence score decodes to 0.7.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmTasteProfile {
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub narrative_style: String,
    #[serde(default)]
    pub emotional_tone: String,
    #[serde(default)]
    pub genre_fusion: String,
    #[serde(default)]
    pub character_preferences: String,
    #[serde(default)]
    pub artistic_sensibilities: String,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

impl From<LlmTasteProfile> for TasteProfile {
    fn from(raw: LlmTasteProfile) -> Self {
        TasteProfile {
            themes: raw.themes,
            narrative_style: raw.narrative_style,
            emotional_tone: raw.emotional_tone,
            genre_fusion: raw.genre_fusion,
            character_preferences: raw.character_preferences,
            artistic_sensibilities: raw.artistic_sensibilities,
            confidence_score: raw.confidence_score.unwrap_or(0.7),
        }
    }
}

/// Book entry as the text-generation provider returns it
#[derive(Debug, Clone, Deserialize)]
pub struct LlmBook {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub taste_match_score: Option<f64>,
    #[serde(default)]
    pub primary_appeal: Option<String>,
}

impl LlmBook {
    /// A book without both a title and an author is unusable
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty() && !self.author.is_empty()
    }
}

impl From<LlmBook> for BookRecommendation {
    fn from(raw: LlmBook) -> Self {
        BookRecommendation {
            title: raw.title,
            author: raw.author,
            reason: raw.reason,
            taste_match_score: raw.taste_match_score,
            primary_appeal: raw.primary_appeal,
        }
    }
}

/// Full recommendation payload embedded in the provider's text reply
#[derive(Debug, Clone, Deserialize)]
pub struct LlmRecommendationPayload {
    #[serde(default)]
    pub taste_profile: Option<LlmTasteProfile>,
    #[serde(default)]
    pub unified_recommendations: Option<Vec<LlmBook>>,
}

// ============================================================================
// Movie-metadata provider types
// ============================================================================

/// Response body from the movie search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

/// Raw movie object from the movie-metadata provider.
///
/// All fields are optional upstream; absent ones default to zero / empty.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub popularity: f64,
}

impl From<TmdbMovie> for MovieSummary {
    fn from(movie: TmdbMovie) -> Self {
        MovieSummary {
            id: movie.id,
            title: movie.title,
            poster_path: movie.poster_path,
            release_date: movie.release_date,
            vote_average: movie.vote_average,
            overview: movie.overview,
            popularity: movie.popularity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_taste_profile_defaults_confidence() {
        let raw: LlmTasteProfile = serde_json::from_str(r#"{"themes": ["wonder"]}"#).unwrap();
        let profile: TasteProfile = raw.into();
        assert_eq!(profile.themes, vec!["wonder"]);
        assert_eq!(profile.confidence_score, 0.7);
        assert_eq!(profile.narrative_style, "");
    }

    #[test]
    fn test_llm_taste_profile_keeps_explicit_confidence() {
        let raw: LlmTasteProfile =
            serde_json::from_str(r#"{"confidence_score": 0.92}"#).unwrap();
        let profile: TasteProfile = raw.into();
        assert_eq!(profile.confidence_score, 0.92);
    }

    #[test]
    fn test_llm_book_validity() {
        let complete: LlmBook =
            serde_json::from_str(r#"{"title": "Dune", "author": "Frank Herbert"}"#).unwrap();
        assert!(complete.is_valid());

        let missing_author: LlmBook = serde_json::from_str(r#"{"title": "Dune"}"#).unwrap();
        assert!(!missing_author.is_valid());

        let missing_title: LlmBook =
            serde_json::from_str(r#"{"author": "Frank Herbert"}"#).unwrap();
        assert!(!missing_title.is_valid());
    }

    #[test]
    fn test_llm_book_conversion_defaults() {
        let raw: LlmBook =
            serde_json::from_str(r#"{"title": "Dune", "author": "Frank Herbert"}"#).unwrap();
        let book: BookRecommendation = raw.into();
        assert_eq!(book.reason, "");
        assert_eq!(book.taste_match_score, None);
        assert_eq!(book.primary_appeal, None);
    }

    #[test]
    fn test_payload_without_recommendations_field() {
        let payload: LlmRecommendationPayload =
            serde_json::from_str(r#"{"taste_profile": {}}"#).unwrap();
        assert!(payload.unified_recommendations.is_none());
        assert!(payload.taste_profile.is_some());
    }

    #[test]
    fn test_tmdb_movie_defaults_missing_fields() {
        let movie: TmdbMovie = serde_json::from_str(r#"{"title": "Inception"}"#).unwrap();
        let summary: MovieSummary = movie.into();
        assert_eq!(summary.id, 0);
        assert_eq!(summary.title, "Inception");
        assert_eq!(summary.poster_path, None);
        assert_eq!(summary.release_date, "");
        assert_eq!(summary.vote_average, 0.0);
        assert_eq!(summary.popularity, 0.0);
    }

    #[test]
    fn test_tmdb_search_response_full_object() {
        let json = r#"{
            "results": [{
                "id": 155,
                "title": "The Dark Knight",
                "poster_path": "/qJ2tW6WMUDux911r6m7haRef0WH.jpg",
                "release_date": "2008-07-18",
                "vote_average": 9.0,
                "overview": "Batman raises the stakes in his war on crime.",
                "popularity": 75.0
            }]
        }"#;

        let response: TmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 1);
        let summary: MovieSummary = response.results[0].clone().into();
        assert_eq!(summary.id, 155);
        assert_eq!(
            summary.poster_path,
            Some("/qJ2tW6WMUDux911r6m7haRef0WH.jpg".to_string())
        );
        assert_eq!(summary.vote_average, 9.0);
    }
}
