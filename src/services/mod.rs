pub mod movie_search;
pub mod providers;
pub mod recommendations;
