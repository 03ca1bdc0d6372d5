//! Request and response types for the scorecard API.

use serde::{Deserialize, Serialize};

use crate::scraper::CourseDocument;

/// Scrape request body
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: String,
}

/// Scrape response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub success: bool,
    pub course: CourseDocument,
    pub source_url: String,
}

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_url_defaults_empty() {
        let req: ScrapeRequest = serde_json::from_str("{}").unwrap();
        assert!(req.url.is_empty());
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse {
            error: "400 Bad Request".into(),
            message: "URL is required".into(),
        })
        .unwrap();
        assert_eq!(body["error"], "400 Bad Request");
        assert_eq!(body["message"], "URL is required");
    }
}
