//! Error types for scorecard scraping.

use thiserror::Error;

/// Failures while driving the headless browser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("Navigation failed: {0}")]
    NavigationError(String),
}

/// Failures of a whole scrape invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No scorecard table found on page")]
    NoScorecardFound,

    #[error("No embedded scorecard data found in page scripts")]
    NoEmbeddedData,
}

impl ScrapeError {
    /// True when the page was reached but no strategy recognised a scorecard.
    pub fn is_structural(&self) -> bool {
        matches!(self, ScrapeError::NoScorecardFound | ScrapeError::NoEmbeddedData)
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        assert!(ScrapeError::NoScorecardFound.is_structural());
        assert!(ScrapeError::NoEmbeddedData.is_structural());
        assert!(!ScrapeError::from(FetchError::LaunchFailed("missing".into())).is_structural());
    }

    #[test]
    fn test_fetch_error_message_passes_through() {
        let err: ScrapeError = FetchError::NavigationTimeout {
            url: "https://example.com".to_string(),
            timeout_secs: 30,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Navigation to https://example.com timed out after 30s"
        );
    }
}
