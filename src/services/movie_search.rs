use crate::{models::MovieSummary, services::providers::MovieCatalog};
use std::sync::Arc;

/// Minimum trimmed query length before the provider is consulted
const MIN_QUERY_CHARS: usize = 2;

/// Movie search for the autocomplete interface
///
/// Delegates to the configured MovieCatalog and absorbs every failure into a
/// fixed list of well-known movies, so the caller always receives at least
/// one usable result.
pub struct MovieSearchService {
    catalog: Arc<dyn MovieCatalog>,
}

impl MovieSearchService {
    pub fn new(catalog: Arc<dyn MovieCatalog>) -> Self {
        Self { catalog }
    }

    /// Search for movies matching the query.
    ///
    /// Queries shorter than two characters after trimming never hit the
    /// network; they get the fallback list directly. This operation cannot
    /// fail.
    pub async fn search(&self, query: &str) -> Vec<MovieSummary> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Self::fallback_movies();
        }

        match self.catalog.search_movies(query).await {
            Ok(movies) if !movies.is_empty() => movies,
            Ok(_) => {
                tracing::warn!(
                    query = %query,
                    provider = self.catalog.name(),
                    "Movie search returned no results, using fallback list"
                );
                Self::fallback_movies()
            }
            Err(e) => {
                tracing::error!(
                    query = %query,
                    error = %e,
                    provider = self.catalog.name(),
                    "Movie search failed, using fallback list"
                );
                Self::fallback_movies()
            }
        }
    }

    /// Fixed list of well-known movies served when the provider is
    /// unavailable or the query is too short. Never empty.
    pub fn fallback_movies() -> Vec<MovieSummary> {
        vec![
            MovieSummary {
                id: 550,
                title: "Fight Club".to_string(),
                poster_path: Some("/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg".to_string()),
                release_date: "1999-10-15".to_string(),
                vote_average: 8.4,
                overview: "A ticking-time-bomb insomniac and a slippery soap salesman channel primal male aggression into a shocking new form of therapy.".to_string(),
                popularity: 100.0,
            },
            MovieSummary {
                id: 13,
                title: "Forrest Gump".to_string(),
                poster_path: Some("/arw2vcBveWOVZr6pxd9XTd1TdQa.jpg".to_string()),
                release_date: "1994-07-06".to_string(),
                vote_average: 8.5,
                overview: "A man with a low IQ has accomplished great things in his life and been present during significant historic events.".to_string(),
                popularity: 95.0,
            },
            MovieSummary {
                id: 278,
                title: "The Shawshank Redemption".to_string(),
                poster_path: Some("/q6y0Go1tsGEsmtFryDOJo3dEmqu.jpg".to_string()),
                release_date: "1994-09-23".to_string(),
                vote_average: 9.3,
                overview: "Framed in the 1940s for the double murder of his wife and her lover, upstanding banker Andy Dufresne begins a new life at the Shawshank prison.".to_string(),
                popularity: 90.0,
            },
            MovieSummary {
                id: 238,
                title: "The Godfather".to_string(),
                poster_path: Some("/3bhkrj58Vtu7enYsRolD1fZdja1.jpg".to_string()),
                release_date: "1972-03-14".to_string(),
                vote_average: 9.2,
                overview: "Spanning the years 1945 to 1955, a chronicle of the fictional Italian-American Corleone crime family.".to_string(),
                popularity: 85.0,
            },
            MovieSummary {
                id: 680,
                title: "Pulp Fiction".to_string(),
                poster_path: Some("/d5iIlFn5s0ImszYzBPb8JPIfbXD.jpg".to_string()),
                release_date: "1994-09-10".to_string(),
                vote_average: 8.5,
                overview: "A burger-loving hit man, his philosophical partner, a drug-addled gangster's moll and a washed-up boxer converge in this sprawling, comedic crime caper.".to_string(),
                popularity: 80.0,
            },
            MovieSummary {
                id: 155,
                title: "The Dark Knight".to_string(),
                poster_path: Some("/qJ2tW6WMUDux911r6m7haRef0WH.jpg".to_string()),
                release_date: "2008-07-18".to_string(),
                vote_average: 9.0,
                overview: "Batman raises the stakes in his war on crime. With the help of Lt. Jim Gordon and District Attorney Harvey Dent, Batman sets out to dismantle the remaining criminal organizations that plague the streets.".to_string(),
                popularity: 75.0,
            },
        ]
    }
}
