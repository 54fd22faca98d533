//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - JSON API under `/api/v1/...` (grading, quizzes, tutor, cost management)
/// - CORS (allow any origin/method/headers); the pages are served elsewhere
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::http_health))
        // Scoring
        .route("/api/v1/assessment/grade", post(http::http_post_grade))
        .route("/api/v1/quizzes", get(http::http_list_quizzes))
        .route("/api/v1/quiz/attempt", post(http::http_post_attempt))
        .route("/api/v1/quiz/:id", get(http::http_get_quiz))
        .route("/api/v1/quiz/:id/attempts", get(http::http_get_attempts))
        // AI tutor + cost management
        .route("/api/v1/tutor", post(http::http_post_tutor))
        .route("/api/v1/cost", get(http::http_get_cost))
        .route("/api/v1/cost/reset", post(http::http_post_cost_reset))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
