use crate::{
    error::{AppError, AppResult},
    models::{
        BookRecommendation, LlmRecommendationPayload, LlmTasteProfile, RecommendationResponse,
        TasteProfile, UserPreferences,
    },
    services::providers::TextGenerator,
};
use std::sync::Arc;

const GENERATE_MAX_TOKENS: u32 = 1500;
const GENERATE_TEMPERATURE: f32 = 0.7;
const PROFILE_MAX_TOKENS: u32 = 600;
const PROFILE_TEMPERATURE: f32 = 0.6;

/// The fallback path always returns exactly this many books, independent of
/// the configured per-response count.
const FALLBACK_BOOK_COUNT: usize = 3;

const SYSTEM_PROMPT: &str = r#"You are a literary taste analyst specializing in cross-media pattern recognition.

CORE TASK: Analyze movie preferences → Extract unified aesthetic patterns → Recommend books matching that profile

ANALYSIS PRINCIPLES:
- Identify narrative DNA (themes, tone, complexity) across ALL movies
- Focus on overarching patterns, not individual movie matches
- Extract emotional resonance and artistic sensibilities
- Handle genre conflicts by finding deeper connective tissue

SCORING CALIBRATION:
- confidence_score: 0.9+ = clear patterns, 0.7-0.8 = moderate patterns, <0.7 = conflicting signals
- taste_match_score: 0.9+ = exceptional thematic alignment, 0.8+ = strong match, 0.7+ = good fit

QUALITY STANDARDS:
- Each book reason: 75+ words explaining taste profile connection
- Avoid obvious/surface-level matches
- Prioritize literary quality and thematic depth
- Return exactly the JSON format specified (no extra text)

EDGE CASE HANDLING:
- Single movie: Focus on directorial style, themes, narrative approach
- Conflicting genres: Find deeper aesthetic commonalities
- Obscure films: Analyze based on available thematic elements"#;

const PROFILE_SYSTEM_PROMPT: &str = "You are an expert in cross-media aesthetic analysis. Extract unified patterns from film preferences. Always respond with valid JSON only.";

/// JSON example embedded in the generation prompt. The parser must accept
/// this document verbatim.
const RESPONSE_SCHEMA: &str = r#"{
  "taste_profile": {
    "themes": ["theme1", "theme2", "theme3"],
    "narrative_style": "concise description of storytelling preferences",
    "emotional_tone": "preferred emotional register",
    "genre_fusion": "genre preferences and blending patterns",
    "character_preferences": "preferred character archetypes and development",
    "artistic_sensibilities": "aesthetic and stylistic preferences",
    "confidence_score": 0.85
  },
  "unified_recommendations": [
    {
      "title": "Book Title",
      "author": "Author Name",
      "reason": "75+ word explanation connecting to unified taste profile",
      "taste_match_score": 0.95,
      "primary_appeal": "core aspect of taste this book satisfies"
    }
  ]
}"#;

const PROFILE_SCHEMA: &str = r#"{
  "themes": ["specific thematic elements"],
  "narrative_style": "storytelling approach preferences",
  "emotional_tone": "tonal and atmospheric preferences",
  "genre_fusion": "genre blending and boundary preferences",
  "character_preferences": "character type and development preferences",
  "artistic_sensibilities": "aesthetic and stylistic preferences",
  "confidence_score": 0.85
}"#;

/// One keyword-matching rule for the deterministic fallback.
///
/// Rules are evaluated in order: theme lists accumulate across every matching
/// rule, while the scalar strings are overwritten by each match, so the last
/// matching rule wins for narrative/tone/fusion.
struct ThemeRule {
    keywords: &'static [&'static str],
    themes: &'static [&'static str],
    narrative_style: &'static str,
    emotional_tone: &'static str,
    genre_fusion: &'static str,
}

const THEME_RULES: &[ThemeRule] = &[
    // Action / superhero vocabulary
    ThemeRule {
        keywords: &[
            "batman", "superman", "avengers", "marvel", "dc", "hero", "knight", "action", "fight",
        ],
        themes: &["heroism", "justice", "moral complexity"],
        narrative_style: "Epic storytelling with high stakes",
        emotional_tone: "Intense and dramatic",
        genre_fusion: "Adventure fiction with philosophical undertones",
    },
    // Sci-fi / fantasy vocabulary
    ThemeRule {
        keywords: &[
            "star wars", "jedi", "force", "space", "alien", "future", "time", "magic", "dragon",
        ],
        themes: &["exploration", "wonder", "human potential"],
        narrative_style: "Imaginative world-building",
        emotional_tone: "Awe-inspiring and philosophical",
        genre_fusion: "Speculative fiction with deep themes",
    },
    // Drama / romance vocabulary
    ThemeRule {
        keywords: &["love", "romance", "relationship", "drama", "heart", "passion"],
        themes: &["human connection", "emotional growth", "relationships"],
        narrative_style: "Character-driven narratives",
        emotional_tone: "Emotional and intimate",
        genre_fusion: "Literary fiction with romantic elements",
    },
    // Mystery / thriller vocabulary
    ThemeRule {
        keywords: &[
            "detective",
            "mystery",
            "thriller",
            "crime",
            "murder",
            "investigation",
        ],
        themes: &["intrigue", "justice", "psychological depth"],
        narrative_style: "Complex plotting with twists",
        emotional_tone: "Suspenseful and intense",
        genre_fusion: "Mystery and psychological fiction",
    },
    // Comedy vocabulary
    ThemeRule {
        keywords: &["comedy", "funny", "laugh", "humor", "joke"],
        themes: &["wit", "human folly", "social commentary"],
        narrative_style: "Sharp and observant storytelling",
        emotional_tone: "Witty and engaging",
        genre_fusion: "Humorous literary fiction",
    },
];

const DEFAULT_THEMES: &[&str] = &["character development", "emotional depth", "human experience"];

/// Static book entry for the theme lookup table
struct BookSeed {
    title: &'static str,
    author: &'static str,
    reason: &'static str,
    taste_match_score: f64,
    primary_appeal: &'static str,
}

impl From<&BookSeed> for BookRecommendation {
    fn from(seed: &BookSeed) -> Self {
        BookRecommendation {
            title: seed.title.to_string(),
            author: seed.author.to_string(),
            reason: seed.reason.to_string(),
            taste_match_score: Some(seed.taste_match_score),
            primary_appeal: Some(seed.primary_appeal.to_string()),
        }
    }
}

/// Theme → books lookup table for the fallback path.
///
/// Themes with no entry ("relationships", the default themes) fall through to
/// the default books below.
fn books_for_theme(theme: &str) -> &'static [BookSeed] {
    match theme {
        "heroism" => &[
            BookSeed {
                title: "The Name of the Wind",
                author: "Patrick Rothfuss",
                reason: "A hero's journey filled with wonder, danger, and personal growth, much like the epic adventures in superhero sagas.",
                taste_match_score: 0.85,
                primary_appeal: "Epic heroism and personal destiny",
            },
            BookSeed {
                title: "The Way of Kings",
                author: "Brandon Sanderson",
                reason: "Complex world-building with themes of honor, leadership, and moral dilemmas, appealing to fans of heroic narratives.",
                taste_match_score: 0.82,
                primary_appeal: "Epic fantasy with heroic themes",
            },
        ],
        "justice" => &[BookSeed {
            title: "The City We Became",
            author: "N.K. Jemisin",
            reason: "Explores themes of community, justice, and urban life with a fantastical twist, perfect for those who enjoy moral complexity.",
            taste_match_score: 0.88,
            primary_appeal: "Social justice and community themes",
        }],
        "moral complexity" => &[BookSeed {
            title: "The Night Circus",
            author: "Erin Morgenstern",
            reason: "A magical competition that explores the gray areas of morality and human nature, much like anti-hero stories.",
            taste_match_score: 0.80,
            primary_appeal: "Moral ambiguity and complex characters",
        }],
        "exploration" => &[
            BookSeed {
                title: "Dune",
                author: "Frank Herbert",
                reason: "Epic exploration of alien worlds, politics, and human destiny, perfect for space opera enthusiasts.",
                taste_match_score: 0.90,
                primary_appeal: "Grand-scale exploration and world-building",
            },
            BookSeed {
                title: "The Left Hand of Darkness",
                author: "Ursula K. Le Guin",
                reason: "Thoughtful exploration of alien cultures and human nature, appealing to fans of deep speculative fiction.",
                taste_match_score: 0.85,
                primary_appeal: "Cultural exploration and philosophical depth",
            },
        ],
        "wonder" => &[BookSeed {
            title: "American Gods",
            author: "Neil Gaiman",
            reason: "A modern fantasy filled with wonder, mythology, and magical realism that sparks imagination.",
            taste_match_score: 0.83,
            primary_appeal: "Mythological wonder and imagination",
        }],
        "human potential" => &[BookSeed {
            title: "Ender's Game",
            author: "Orson Scott Card",
            reason: "Explores human potential, strategy, and growth under pressure, much like coming-of-age hero stories.",
            taste_match_score: 0.87,
            primary_appeal: "Human potential and strategic thinking",
        }],
        "human connection" => &[
            BookSeed {
                title: "The Seven Husbands of Evelyn Hugo",
                author: "Taylor Jenkins Reid",
                reason: "Deep exploration of relationships, love, and human connection through a compelling life story.",
                taste_match_score: 0.85,
                primary_appeal: "Emotional relationships and human connection",
            },
            BookSeed {
                title: "Normal People",
                author: "Sally Rooney",
                reason: "Intimate portrayal of young love and emotional growth, perfect for romance and drama fans.",
                taste_match_score: 0.82,
                primary_appeal: "Intimate relationships and emotional depth",
            },
        ],
        "emotional growth" => &[BookSeed {
            title: "Educated",
            author: "Tara Westover",
            reason: "A powerful story of personal growth, resilience, and self-discovery against all odds.",
            taste_match_score: 0.88,
            primary_appeal: "Personal growth and transformation",
        }],
        "intrigue" => &[BookSeed {
            title: "The Girl with the Dragon Tattoo",
            author: "Stieg Larsson",
            reason: "Complex mystery and investigation with psychological depth, appealing to thriller enthusiasts.",
            taste_match_score: 0.86,
            primary_appeal: "Intricate plotting and suspense",
        }],
        "psychological depth" => &[BookSeed {
            title: "Gone Girl",
            author: "Gillian Flynn",
            reason: "Psychological thriller exploring the dark sides of relationships and human nature.",
            taste_match_score: 0.84,
            primary_appeal: "Psychological complexity and tension",
        }],
        "wit" => &[BookSeed {
            title: "The Hitchhiker's Guide to the Galaxy",
            author: "Douglas Adams",
            reason: "Hilarious and witty exploration of the universe with clever humor and social commentary.",
            taste_match_score: 0.89,
            primary_appeal: "Intelligent humor and wit",
        }],
        "social commentary" => &[BookSeed {
            title: "Catch-22",
            author: "Joseph Heller",
            reason: "Satirical take on bureaucracy and human folly with sharp wit and social critique.",
            taste_match_score: 0.87,
            primary_appeal: "Satire and social commentary",
        }],
        _ => &[],
    }
}

/// Ordered padding list used when theme matches yield fewer than three books
const DEFAULT_BOOKS: &[BookSeed] = &[
    BookSeed {
        title: "The Seven Husbands of Evelyn Hugo",
        author: "Taylor Jenkins Reid",
        reason: "A compelling narrative that combines character depth with emotional complexity, appealing to viewers who appreciate sophisticated storytelling.",
        taste_match_score: 0.8,
        primary_appeal: "Character-driven storytelling",
    },
    BookSeed {
        title: "Klara and the Sun",
        author: "Kazuo Ishiguro",
        reason: "Masterful blend of speculative elements with profound human themes, perfect for those who enjoy thoughtful, emotionally resonant narratives.",
        taste_match_score: 0.85,
        primary_appeal: "Thoughtful speculative fiction",
    },
    BookSeed {
        title: "The Midnight Library",
        author: "Matt Haig",
        reason: "Philosophical exploration of life choices and possibilities, combining accessibility with deeper existential themes.",
        taste_match_score: 0.75,
        primary_appeal: "Philosophical exploration",
    },
];

/// Profile fields derived by the keyword rules
struct DerivedThemes {
    themes: Vec<String>,
    narrative_style: &'static str,
    emotional_tone: &'static str,
    genre_fusion: &'static str,
    character_preferences: &'static str,
    artistic_sensibilities: &'static str,
}

/// Generates unified book recommendations from a movie taste profile
///
/// Delegates the actual reasoning to the configured TextGenerator and absorbs
/// every provider failure into a deterministic keyword-driven fallback, so
/// callers never observe an error beyond invalid input.
pub struct RecommendationService {
    generator: Arc<dyn TextGenerator>,
    books_per_response: usize,
}

impl RecommendationService {
    pub fn new(generator: Arc<dyn TextGenerator>, books_per_response: usize) -> Self {
        Self {
            generator,
            books_per_response,
        }
    }

    /// Generate book recommendations for a list of movies.
    ///
    /// Always returns a single-element list; the element is either the
    /// provider-derived response or the deterministic fallback.
    pub async fn generate(
        &self,
        movies: &[String],
        preferences: Option<&UserPreferences>,
    ) -> AppResult<Vec<RecommendationResponse>> {
        Self::require_movies(movies)?;

        let prompt = self.build_unified_prompt(movies, preferences);

        let response = match self
            .generator
            .complete(SYSTEM_PROMPT, &prompt, GENERATE_MAX_TOKENS, GENERATE_TEMPERATURE)
            .await
        {
            Ok(content) => self
                .parse_unified_reply(&content, movies)
                .unwrap_or_else(|| self.fallback_response(movies)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    provider = self.generator.name(),
                    "Text generation failed"
                );
                self.fallback_response(movies)
            }
        };

        Ok(vec![response])
    }

    /// Analyze and return only the taste profile, without book selection.
    ///
    /// Uses a shorter prompt and a smaller output budget; any failure yields
    /// a fixed generic profile with confidence 0.5.
    pub async fn analyze_taste_profile(
        &self,
        movies: &[String],
        preferences: Option<&UserPreferences>,
    ) -> AppResult<TasteProfile> {
        Self::require_movies(movies)?;

        let prompt = Self::build_profile_prompt(movies, preferences);

        let profile = match self
            .generator
            .complete(
                PROFILE_SYSTEM_PROMPT,
                &prompt,
                PROFILE_MAX_TOKENS,
                PROFILE_TEMPERATURE,
            )
            .await
        {
            Ok(content) => Self::extract_json_object(&content)
                .and_then(|json| serde_json::from_str::<LlmTasteProfile>(json).ok())
                .map(TasteProfile::from)
                .unwrap_or_else(|| {
                    tracing::error!("Unusable taste profile reply, using default profile");
                    Self::default_analysis_profile()
                }),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    provider = self.generator.name(),
                    "Taste profile analysis failed"
                );
                Self::default_analysis_profile()
            }
        };

        Ok(profile)
    }

    fn require_movies(movies: &[String]) -> AppResult<()> {
        if movies.iter().any(|m| !m.trim().is_empty()) {
            Ok(())
        } else {
            Err(AppError::InvalidInput(
                "At least one movie title is required".to_string(),
            ))
        }
    }

    fn build_unified_prompt(
        &self,
        movies: &[String],
        preferences: Option<&UserPreferences>,
    ) -> String {
        let movies_str = movies.join(", ");

        let analysis_instruction = if movies.len() == 1 {
            format!(
                "Analyze {} to extract the viewer's aesthetic preferences:",
                movies[0]
            )
        } else {
            format!("Find the unified taste pattern across: {}", movies_str)
        };

        let mut prompt = format!(
            "{analysis_instruction}\n\n\
             STEP 1 - TASTE ANALYSIS:\n\
             Extract the aesthetic DNA by identifying:\n\
             • Recurring themes and emotional territories\n\
             • Narrative complexity preferences (linear/non-linear, character vs. plot-driven)\n\
             • Tonal signatures (dark/light, realistic/fantastical, introspective/action-oriented)\n\
             • Character archetype preferences and relationship dynamics\n\
             • Visual/atmospheric sensibilities that translate to literary mood\n\n\
             STEP 2 - BOOK RECOMMENDATIONS:\n\
             Select {count} books that share this aesthetic DNA. Prioritize:\n\
             • Thematic resonance over genre matching\n\
             • Narrative sophistication level alignment\n\
             • Emotional and tonal consistency\n\
             • Character depth matching viewer preferences",
            count = self.books_per_response,
        );

        Self::append_constraints(&mut prompt, preferences);

        prompt.push_str(&format!(
            "\n\nReturn response as valid JSON matching this exact structure:\n{RESPONSE_SCHEMA}"
        ));

        prompt
    }

    fn build_profile_prompt(movies: &[String], preferences: Option<&UserPreferences>) -> String {
        let movies_str = movies.join(", ");

        let mut prompt = format!(
            "Extract the unified aesthetic profile from: {movies_str}\n\n\
             ANALYSIS FRAMEWORK:\n\
             • Thematic territories: Core emotional/philosophical themes\n\
             • Narrative DNA: Structural and storytelling preferences\n\
             • Tonal signature: Emotional register and atmospheric preferences\n\
             • Character archetypes: Relationship dynamics and development patterns\n\
             • Artistic sensibilities: Visual/stylistic elements that translate to literary mood\n\n\
             SCORING: Rate confidence (0.5-1.0) based on pattern clarity across films.",
        );

        Self::append_constraints(&mut prompt, preferences);

        prompt.push_str(&format!("\n\nRESPONSE FORMAT:\n{PROFILE_SCHEMA}"));

        prompt
    }

    /// Appends a CONSTRAINTS block built only from the preference fields the
    /// caller actually set, as bullet lines in a fixed order.
    fn append_constraints(prompt: &mut String, preferences: Option<&UserPreferences>) {
        let Some(prefs) = preferences else {
            return;
        };

        let mut constraints = Vec::new();
        if let Some(mood) = &prefs.mood {
            if !mood.is_empty() {
                constraints.push(format!("Mood alignment: {}", mood));
            }
        }
        if let Some(pace) = &prefs.pace {
            if !pace.is_empty() {
                constraints.push(format!("Pacing: {}", pace));
            }
        }
        if let Some(genres) = &prefs.genre_preferences {
            if !genres.is_empty() {
                constraints.push(format!("Favor: {}", genres.join(", ")));
            }
        }
        if let Some(blocked) = &prefs.genre_blocklist {
            if !blocked.is_empty() {
                constraints.push(format!("Avoid: {}", blocked.join(", ")));
            }
        }

        if !constraints.is_empty() {
            prompt.push_str("\n\nCONSTRAINTS:\n• ");
            prompt.push_str(&constraints.join("\n• "));
        }
    }

    /// Treats the substring from the first `{` to the last `}` (inclusive) as
    /// a JSON document, tolerating providers that wrap JSON in prose.
    fn extract_json_object(content: &str) -> Option<&str> {
        let start = content.find('{')?;
        let end = content.rfind('}')?;
        if end < start {
            return None;
        }
        Some(&content[start..=end])
    }

    /// Parse a provider reply into a recommendation response.
    ///
    /// Returns None when the reply is unusable: not JSON, missing the
    /// unified_recommendations field, or no entry carrying both a title and
    /// an author. Callers fall through to the deterministic fallback.
    fn parse_unified_reply(
        &self,
        content: &str,
        movies: &[String],
    ) -> Option<RecommendationResponse> {
        let Some(json) = Self::extract_json_object(content) else {
            tracing::error!("No JSON object found in generation reply");
            return None;
        };

        let payload: LlmRecommendationPayload = match serde_json::from_str(json) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to decode generation reply");
                return None;
            }
        };

        let Some(raw_books) = payload.unified_recommendations else {
            tracing::error!("Generation reply missing unified_recommendations");
            return None;
        };

        let books: Vec<BookRecommendation> = raw_books
            .into_iter()
            .filter(|book| book.is_valid())
            .map(BookRecommendation::from)
            .collect();

        if books.is_empty() {
            tracing::error!("Generation reply contained no usable book recommendations");
            return None;
        }

        let taste_profile: TasteProfile = payload.taste_profile.unwrap_or_default().into();

        Some(RecommendationResponse {
            movie: Self::movie_summary(movies),
            books,
            taste_profile,
        })
    }

    /// Human-readable summary of the input movies
    fn movie_summary(movies: &[String]) -> String {
        match movies {
            [only] => format!("Based on your interest in {}", only),
            [first, second] => format!("Based on your taste for {} and {}", first, second),
            _ => {
                let all_but_last = movies[..movies.len() - 1].join(", ");
                format!(
                    "Based on your taste profile from {}, and {}",
                    all_but_last,
                    movies[movies.len() - 1]
                )
            }
        }
    }

    /// Deterministic response used whenever the provider call fails or its
    /// reply is unusable
    fn fallback_response(&self, movies: &[String]) -> RecommendationResponse {
        tracing::warn!("Text-generation unavailable, using keyword-based fallback");

        let derived = Self::analyze_movie_themes(movies);
        let books = Self::select_fallback_books(&derived.themes);

        RecommendationResponse {
            movie: Self::movie_summary(movies),
            books,
            taste_profile: TasteProfile {
                themes: derived.themes,
                narrative_style: derived.narrative_style.to_string(),
                emotional_tone: derived.emotional_tone.to_string(),
                genre_fusion: derived.genre_fusion.to_string(),
                character_preferences: derived.character_preferences.to_string(),
                artistic_sensibilities: derived.artistic_sensibilities.to_string(),
                confidence_score: 0.7,
            },
        }
    }

    /// Derive themes from movie titles by keyword membership.
    ///
    /// Theme lists union across all matching rules; scalar fields take the
    /// last matching rule's values.
    fn analyze_movie_themes(movies: &[String]) -> DerivedThemes {
        let movie_text = movies.join(" ").to_lowercase();

        let mut derived = DerivedThemes {
            themes: Vec::new(),
            narrative_style: "Engaging storytelling",
            emotional_tone: "Thoughtful and immersive",
            genre_fusion: "Literary fiction",
            character_preferences: "Complex characters",
            artistic_sensibilities: "Quality craftsmanship",
        };

        for rule in THEME_RULES {
            if rule.keywords.iter().any(|k| movie_text.contains(k)) {
                derived
                    .themes
                    .extend(rule.themes.iter().map(|t| t.to_string()));
                derived.narrative_style = rule.narrative_style;
                derived.emotional_tone = rule.emotional_tone;
                derived.genre_fusion = rule.genre_fusion;
            }
        }

        if derived.themes.is_empty() {
            derived.themes = DEFAULT_THEMES.iter().map(|t| t.to_string()).collect();
        }

        derived
    }

    /// Select fallback books: up to two per matched theme, deduplicated by
    /// value, padded from the default list up to exactly three.
    fn select_fallback_books(themes: &[String]) -> Vec<BookRecommendation> {
        let mut selected: Vec<BookRecommendation> = Vec::new();

        for theme in themes {
            for seed in books_for_theme(theme).iter().take(2) {
                let book = BookRecommendation::from(seed);
                if !selected.contains(&book) {
                    selected.push(book);
                }
            }
        }

        for seed in DEFAULT_BOOKS {
            if selected.len() >= FALLBACK_BOOK_COUNT {
                break;
            }
            let book = BookRecommendation::from(seed);
            if !selected.contains(&book) {
                selected.push(book);
            }
        }

        selected.truncate(FALLBACK_BOOK_COUNT);
        selected
    }

    /// Fixed profile returned when taste analysis fails entirely
    fn default_analysis_profile() -> TasteProfile {
        TasteProfile {
            themes: vec![
                "character-driven narratives".to_string(),
                "emotional complexity".to_string(),
            ],
            narrative_style: "Layered, sophisticated storytelling".to_string(),
            emotional_tone: "Thoughtful and emotionally resonant".to_string(),
            genre_fusion: "Cross-genre sensibilities".to_string(),
            character_preferences: "Complex, well-developed characters".to_string(),
            artistic_sensibilities: "Appreciation for narrative craftsmanship".to_string(),
            confidence_score: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockTextGenerator;

    fn service_with(generator: MockTextGenerator) -> RecommendationService {
        RecommendationService::new(Arc::new(generator), 3)
    }

    fn movies(titles: &[&str]) -> Vec<String> {
        titles.iter().map(|t| t.to_string()).collect()
    }

    fn failing_generator() -> MockTextGenerator {
        let mut mock = MockTextGenerator::new();
        mock.expect_complete()
            .returning(|_, _, _, _| Err(AppError::ExternalApi("provider down".to_string())));
        mock.expect_name().return_const("mock");
        mock
    }

    fn canned_generator(reply: &str) -> MockTextGenerator {
        let reply = reply.to_string();
        let mut mock = MockTextGenerator::new();
        mock.expect_complete()
            .returning(move |_, _, _, _| Ok(reply.clone()));
        mock.expect_name().return_const("mock");
        mock
    }

    #[test]
    fn test_movie_summary_single() {
        assert_eq!(
            RecommendationService::movie_summary(&movies(&["The Dark Knight"])),
            "Based on your interest in The Dark Knight"
        );
    }

    #[test]
    fn test_movie_summary_pair() {
        assert_eq!(
            RecommendationService::movie_summary(&movies(&["A", "B"])),
            "Based on your taste for A and B"
        );
    }

    #[test]
    fn test_movie_summary_three_plus() {
        assert_eq!(
            RecommendationService::movie_summary(&movies(&["A", "B", "C"])),
            "Based on your taste profile from A, B, and C"
        );
        assert_eq!(
            RecommendationService::movie_summary(&movies(&["A", "B", "C", "D"])),
            "Based on your taste profile from A, B, C, and D"
        );
    }

    #[test]
    fn test_dark_knight_derives_heroism_themes() {
        let derived = RecommendationService::analyze_movie_themes(&movies(&["The Dark Knight"]));
        assert!(derived.themes.contains(&"heroism".to_string()));
        assert!(derived.themes.contains(&"justice".to_string()));
        assert!(derived.themes.contains(&"moral complexity".to_string()));
        assert_eq!(derived.narrative_style, "Epic storytelling with high stakes");
    }

    #[test]
    fn test_unmatched_titles_use_default_themes() {
        let derived = RecommendationService::analyze_movie_themes(&movies(&["Amélie"]));
        assert_eq!(
            derived.themes,
            vec!["character development", "emotional depth", "human experience"]
        );
        assert_eq!(derived.narrative_style, "Engaging storytelling");
        assert_eq!(derived.genre_fusion, "Literary fiction");
    }

    #[test]
    fn test_last_matching_rule_wins_scalars_themes_accumulate() {
        // "space" matches the sci-fi rule, "love" the romance rule; the
        // romance rule is checked later so its scalars win, while the theme
        // list carries both bundles in rule order.
        let derived =
            RecommendationService::analyze_movie_themes(&movies(&["Space Love Story"]));
        assert_eq!(
            derived.themes,
            vec![
                "exploration",
                "wonder",
                "human potential",
                "human connection",
                "emotional growth",
                "relationships"
            ]
        );
        assert_eq!(derived.narrative_style, "Character-driven narratives");
        assert_eq!(derived.emotional_tone, "Emotional and intimate");
        assert_eq!(derived.genre_fusion, "Literary fiction with romantic elements");
    }

    #[test]
    fn test_fallback_books_exactly_three_distinct() {
        let derived = RecommendationService::analyze_movie_themes(&movies(&["The Dark Knight"]));
        let books = RecommendationService::select_fallback_books(&derived.themes);
        assert_eq!(books.len(), 3);
        for (i, book) in books.iter().enumerate() {
            assert!(!book.title.is_empty());
            assert!(!book.author.is_empty());
            assert!(books[i + 1..].iter().all(|other| other != book));
        }
    }

    #[test]
    fn test_fallback_books_pad_with_defaults() {
        let books =
            RecommendationService::select_fallback_books(&movies(&["no such theme"]));
        assert_eq!(books.len(), 3);
        assert_eq!(books[0].title, "The Seven Husbands of Evelyn Hugo");
        assert_eq!(books[1].title, "Klara and the Sun");
        assert_eq!(books[2].title, "The Midnight Library");
    }

    #[test]
    fn test_fallback_books_dedupe_against_defaults() {
        // "human connection" already yields Evelyn Hugo; padding must skip it.
        let themes = movies(&["human connection"]);
        let books = RecommendationService::select_fallback_books(&themes);
        assert_eq!(books.len(), 3);
        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "The Seven Husbands of Evelyn Hugo",
                "Normal People",
                "Klara and the Sun"
            ]
        );
    }

    #[test]
    fn test_extract_json_object_plain() {
        let content = r#"{"a": 1}"#;
        assert_eq!(
            RecommendationService::extract_json_object(content),
            Some(r#"{"a": 1}"#)
        );
    }

    #[test]
    fn test_extract_json_object_prose_wrapped() {
        let content = "Here is your JSON:\n{\"a\": 1}\nHope this helps!";
        assert_eq!(
            RecommendationService::extract_json_object(content),
            Some(r#"{"a": 1}"#)
        );
    }

    #[test]
    fn test_extract_json_object_absent() {
        assert_eq!(RecommendationService::extract_json_object("no json here"), None);
        assert_eq!(RecommendationService::extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_round_trips_embedded_schema_example() {
        let service = service_with(MockTextGenerator::new());
        let parsed = service
            .parse_unified_reply(RESPONSE_SCHEMA, &movies(&["Inception"]))
            .unwrap();

        assert_eq!(parsed.books.len(), 1);
        assert_eq!(parsed.books[0].title, "Book Title");
        assert_eq!(parsed.books[0].author, "Author Name");
        assert_eq!(parsed.books[0].taste_match_score, Some(0.95));
        assert_eq!(
            parsed.books[0].primary_appeal.as_deref(),
            Some("core aspect of taste this book satisfies")
        );
        assert_eq!(
            parsed.taste_profile.themes,
            vec!["theme1", "theme2", "theme3"]
        );
        assert_eq!(
            parsed.taste_profile.narrative_style,
            "concise description of storytelling preferences"
        );
        assert_eq!(parsed.taste_profile.confidence_score, 0.85);
        assert_eq!(parsed.movie, "Based on your interest in Inception");
    }

    #[test]
    fn test_parse_rejects_missing_recommendations_field() {
        let service = service_with(MockTextGenerator::new());
        let reply = r#"{"taste_profile": {"themes": ["x"]}}"#;
        assert!(service
            .parse_unified_reply(reply, &movies(&["Inception"]))
            .is_none());
    }

    #[test]
    fn test_parse_rejects_entries_without_title_and_author() {
        let service = service_with(MockTextGenerator::new());
        let reply = r#"{
            "unified_recommendations": [
                {"title": "Orphaned Title"},
                {"author": "Orphaned Author"},
                {"reason": "neither"}
            ]
        }"#;
        assert!(service
            .parse_unified_reply(reply, &movies(&["Inception"]))
            .is_none());
    }

    #[test]
    fn test_parse_keeps_only_complete_entries() {
        let service = service_with(MockTextGenerator::new());
        let reply = r#"{
            "unified_recommendations": [
                {"title": "Dune", "author": "Frank Herbert"},
                {"title": "No Author Given"}
            ]
        }"#;
        let parsed = service
            .parse_unified_reply(reply, &movies(&["Inception"]))
            .unwrap();
        assert_eq!(parsed.books.len(), 1);
        assert_eq!(parsed.books[0].title, "Dune");
        // Missing taste_profile object decodes to empty fields with the
        // default confidence.
        assert_eq!(parsed.taste_profile.confidence_score, 0.7);
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_movie_list() {
        let service = service_with(MockTextGenerator::new());
        let result = service.generate(&[], None).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = service.generate(&movies(&["", "  "]), None).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_provider_failure() {
        let service = service_with(failing_generator());
        let responses = service
            .generate(&movies(&["The Dark Knight"]), None)
            .await
            .unwrap();

        assert_eq!(responses.len(), 1);
        let response = &responses[0];
        assert_eq!(response.movie, "Based on your interest in The Dark Knight");
        assert_eq!(response.books.len(), 3);
        assert_eq!(response.taste_profile.confidence_score, 0.7);
        assert!(response
            .taste_profile
            .themes
            .contains(&"heroism".to_string()));
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_non_json_reply() {
        let service = service_with(canned_generator("I'm sorry, I can't do that."));
        let responses = service
            .generate(&movies(&["A", "B"]), None)
            .await
            .unwrap();

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].movie, "Based on your taste for A and B");
        assert_eq!(responses[0].books.len(), 3);
    }

    #[tokio::test]
    async fn test_generate_uses_provider_reply_when_parseable() {
        let reply = format!("Sure thing!\n{}\nEnjoy your reading.", RESPONSE_SCHEMA);
        let service = service_with(canned_generator(&reply));
        let responses = service
            .generate(&movies(&["Inception"]), None)
            .await
            .unwrap();

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].books[0].title, "Book Title");
        assert_eq!(responses[0].taste_profile.confidence_score, 0.85);
    }

    #[tokio::test]
    async fn test_generate_prompt_carries_set_constraints_only() {
        let mut mock = MockTextGenerator::new();
        mock.expect_complete()
            .withf(|system, prompt, max_tokens, temperature| {
                system.contains("literary taste analyst")
                    && prompt.contains("CONSTRAINTS:")
                    && prompt.contains("• Mood alignment: dark")
                    && prompt.contains("• Favor: Fantasy, Horror")
                    && !prompt.contains("Pacing:")
                    && !prompt.contains("Avoid:")
                    && *max_tokens == 1500
                    && *temperature == 0.7
            })
            .returning(|_, _, _, _| Err(AppError::ExternalApi("down".to_string())));
        mock.expect_name().return_const("mock");

        let preferences = UserPreferences {
            mood: Some("dark".to_string()),
            pace: None,
            genre_preferences: Some(vec!["Fantasy".to_string(), "Horror".to_string()]),
            genre_blocklist: Some(vec![]),
        };

        let service = service_with(mock);
        service
            .generate(&movies(&["Inception"]), Some(&preferences))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_generate_prompt_singular_vs_plural_phrasing() {
        let mut mock = MockTextGenerator::new();
        mock.expect_complete()
            .withf(|_, prompt, _, _| {
                prompt.starts_with("Analyze Inception to extract the viewer's aesthetic")
            })
            .returning(|_, _, _, _| Err(AppError::ExternalApi("down".to_string())));
        mock.expect_name().return_const("mock");
        service_with(mock)
            .generate(&movies(&["Inception"]), None)
            .await
            .unwrap();

        let mut mock = MockTextGenerator::new();
        mock.expect_complete()
            .withf(|_, prompt, _, _| {
                prompt.starts_with("Find the unified taste pattern across: Inception, Heat")
            })
            .returning(|_, _, _, _| Err(AppError::ExternalApi("down".to_string())));
        mock.expect_name().return_const("mock");
        service_with(mock)
            .generate(&movies(&["Inception", "Heat"]), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_analyze_taste_profile_uses_lower_sampling_budget() {
        let mut mock = MockTextGenerator::new();
        mock.expect_complete()
            .withf(|system, prompt, max_tokens, temperature| {
                system.contains("cross-media aesthetic analysis")
                    && prompt.starts_with("Extract the unified aesthetic profile from: Heat")
                    && *max_tokens == 600
                    && *temperature == 0.6
            })
            .returning(|_, _, _, _| {
                Ok(r#"{"themes": ["obsession"], "confidence_score": 0.9}"#.to_string())
            });
        mock.expect_name().return_const("mock");

        let profile = service_with(mock)
            .analyze_taste_profile(&movies(&["Heat"]), None)
            .await
            .unwrap();

        assert_eq!(profile.themes, vec!["obsession"]);
        assert_eq!(profile.confidence_score, 0.9);
    }

    #[tokio::test]
    async fn test_analyze_taste_profile_default_on_failure() {
        let profile = service_with(failing_generator())
            .analyze_taste_profile(&movies(&["Heat"]), None)
            .await
            .unwrap();

        assert_eq!(profile.confidence_score, 0.5);
        assert_eq!(
            profile.themes,
            vec!["character-driven narratives", "emotional complexity"]
        );
    }

    #[tokio::test]
    async fn test_analyze_taste_profile_default_on_garbage_reply() {
        let profile = service_with(canned_generator("not json at all"))
            .analyze_taste_profile(&movies(&["Heat"]), None)
            .await
            .unwrap();

        assert_eq!(profile.confidence_score, 0.5);
    }
}
