//! API route handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use url::Url;

use crate::config::AppConfig;
use crate::error::ScrapeError;
use crate::scraper::scrape_course;
use crate::types::{ErrorResponse, HealthResponse, ScrapeRequest, ScrapeResponse};

/// Application state shared across handlers.
pub struct AppState {
    pub config: AppConfig,
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: msg.into(),
        }
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        if err.is_structural() {
            Self::unprocessable(err.to_string())
        } else {
            Self::bad_gateway(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Accept only absolute http(s) URLs.
pub fn validate_url(raw: &str) -> Result<Url, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::bad_request("URL is required"));
    }

    let url = Url::parse(raw).map_err(|e| ApiError::bad_request(format!("Invalid URL: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ApiError::bad_request(format!(
            "Unsupported URL scheme: {}",
            other
        ))),
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Scrape endpoint.
pub async fn scrape_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let url = validate_url(&req.url)?;

    tracing::info!("Scrape requested for {}", url);
    let course = scrape_course(url.as_str(), &state.config.browser)
        .await
        .map_err(|e| {
            tracing::warn!("Scrape of {} failed: {}", url, e);
            ApiError::from(e)
        })?;

    Ok(Json(ScrapeResponse {
        success: true,
        source_url: course.source_url.clone(),
        course,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};

    fn state() -> State<Arc<AppState>> {
        State(Arc::new(AppState {
            config: AppConfig::default(),
        }))
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let req = ScrapeRequest { url: "  ".into() };
        let err = scrape_url(state(), Ok(Json(req))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_http_url_rejected() {
        let req = ScrapeRequest {
            url: "ftp://example.com/card".into(),
        };
        let err = scrape_url(state(), Ok(Json(req))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_gets_error_shape() {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"url\": "))
            .unwrap();
        let payload = Json::<ScrapeRequest>::from_request(request, &()).await;
        assert!(payload.is_err());

        let err = scrape_url(state(), payload).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://course.bluegolf.com/x").is_ok());
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("example.com/scorecard").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::from(ScrapeError::NoScorecardFound).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(ScrapeError::NoEmbeddedData).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(ScrapeError::Fetch(FetchError::NavigationError("net".into()))).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_body() {
        let response = ApiError::bad_request("URL is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
