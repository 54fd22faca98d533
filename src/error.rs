//! Error types for configuration loading, the completion client and the HTTP API.

use axum::{
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: toml::de::Error,
  },
}

#[derive(Debug, Error)]
pub enum TutorError {
  #[error("request to completion service failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("completion service returned HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("completion service returned no text")]
  EmptyReply,
}

/// Errors surfaced to HTTP clients as `{error, message}` JSON.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("invalid request body: {0}")]
  BadRequest(String),
  #[error("unknown quiz: {0}")]
  QuizNotFound(String),
  #[error("AI usage limit reached: {window} spend {current:.4} USD exceeds {limit:.4} USD")]
  LimitExceeded { window: &'static str, current: f64, limit: f64 },
}

impl ApiError {
  fn code(&self) -> &'static str {
    match self {
      ApiError::BadRequest(_) => "bad_request",
      ApiError::QuizNotFound(_) => "quiz_not_found",
      ApiError::LimitExceeded { .. } => "usage_limit_exceeded",
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::QuizNotFound(_) => StatusCode::NOT_FOUND,
      ApiError::LimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = json!({ "error": self.code(), "message": self.to_string() });
    (self.status(), Json(body)).into_response()
  }
}
