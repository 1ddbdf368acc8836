//! REST API endpoints.
//!
//! Axum-based HTTP API serving player statistics, match history and the
//! upcoming schedule, plus the admin endpoints that maintain them.

pub mod routes;
pub mod state;

use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::auth::{AdminSession, AuthError};
use crate::models::WindowError;
use crate::storage::StorageError;
use state::AppState;

/// Message shown when the data layer cannot deliver a snapshot.
pub const UNAVAILABLE_MESSAGE: &str = "Failed to load data, please try again later";

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Invalid(e) => ApiError::BadRequest(e.to_string()),
            e @ StorageError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            e @ (StorageError::Io(_) | StorageError::Json(_)) => {
                error!("Storage failure: {}", e);
                ApiError::Unavailable(UNAVAILABLE_MESSAGE.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::LoginDisabled => ApiError::Forbidden(err.to_string()),
            AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidSession => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::ExpiryOutOfRange => {
                error!("Admin login failed: {}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<WindowError> for ApiError {
    fn from(err: WindowError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// JSON request body whose rejection uses the API error format.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Query string whose rejection uses the API error format.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        state.sessions.validate(token).await.map_err(|e| {
            warn!("Rejected admin request to {}: {}", parts.uri.path(), e);
            ApiError::from(e)
        })
    }
}

async fn health() -> &'static str {
    "ok"
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any);

    match origin {
        "*" => layer.allow_origin(Any),
        other => match HeaderValue::from_str(other) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", other);
                layer
            }
        },
    }
}

/// Build the application router.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    use routes::{admin, matches, players};

    Router::new()
        .route("/health", get(health))
        .route("/api/players/stats", get(players::player_stats))
        .route("/api/players/:id", get(players::player_detail))
        .route("/api/matches/past", get(matches::past_matches))
        .route("/api/matches/scheduled", get(matches::scheduled_matches))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/logout", post(admin::logout))
        .route("/api/admin/players", post(admin::create_player))
        .route("/api/admin/players/:id", delete(admin::delete_player))
        .route("/api/admin/match-results", post(admin::create_match_result))
        .route(
            "/api/admin/match-results/:id",
            delete(admin::delete_match_result),
        )
        .route("/api/admin/performances", post(admin::create_performance))
        .route(
            "/api/admin/performances/:id",
            delete(admin::delete_performance),
        )
        .route(
            "/api/admin/scheduled-matches",
            post(admin::create_scheduled_match),
        )
        .route(
            "/api/admin/scheduled-matches/:id",
            delete(admin::delete_scheduled_match),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}
