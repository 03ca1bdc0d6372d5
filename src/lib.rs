//! Golf course scorecard scraping library.
//!
//! Fetches scorecard pages through a headless browser and turns them into a
//! uniform [`scraper::CourseDocument`].

pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod scraper;
pub mod types;

pub use error::{FetchError, ScrapeError};
