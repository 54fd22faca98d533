//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{FromRequest, Path, State}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::domain::ScoreResult;
use crate::error::ApiError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

/// `Json` extractor whose rejections go through `ApiError`, so malformed
/// bodies get the same `{error, message}` shape as every other failure.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(body), fields(questions = body.questions.len(), answers = body.answers.len()))]
pub async fn http_post_grade(ApiJson(body): ApiJson<GradeIn>) -> Json<ScoreResult> {
  Json(grade_submission(&body.questions, &body.answers))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_quizzes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let quizzes = state.list_quizzes().await;
  Json(quizzes.iter().map(to_summary).collect::<Vec<_>>())
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<QuizOut>, ApiError> {
  let quiz = state.get_quiz(&id).await.ok_or_else(|| ApiError::QuizNotFound(id.clone()))?;
  info!(target: "grading", %id, questions = quiz.questions.len(), "HTTP quiz served");
  Ok(Json(to_out(&quiz)))
}

#[instrument(level = "info", skip(state, body), fields(quiz_id = %body.quiz_id, answers = body.answers.len()))]
pub async fn http_post_attempt(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<AttemptIn>,
) -> Result<Json<AttemptOut>, ApiError> {
  let out = attempt_quiz(&state, &body.quiz_id, body.student_id, &body.answers).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_attempts(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  if state.get_quiz(&id).await.is_none() {
    return Err(ApiError::QuizNotFound(id));
  }
  Ok(Json(state.attempts_for(&id).await))
}

#[instrument(level = "info", skip(state, body), fields(question_len = body.question.len()))]
pub async fn http_post_tutor(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<TutorIn>,
) -> Result<Json<TutorOut>, ApiError> {
  let out = tutor_reply(&state, &body).await?;
  info!(target: "usage", model = %out.model, tokens = out.tokens, cost_usd = out.cost_usd, "HTTP tutor reply served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_cost(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(usage_report(&state))
}

#[instrument(level = "info", skip(state), fields(scope = ?body.scope))]
pub async fn http_post_cost_reset(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<ResetIn>,
) -> Json<UsageOut> {
  Json(reset_usage(&state, body.scope))
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
  };
  use serde_json::{json, Value};
  use tower::ServiceExt;

  use crate::config::AppConfig;
  use crate::routes::build_router;
  use crate::state::AppState;
  use std::sync::Arc;

  fn router(state: Arc<AppState>) -> axum::Router {
    build_router(state)
  }

  async fn call(app: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header("content-type", "application/json")
      .body(match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
      })
      .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), 1 << 20).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
  }

  fn fresh() -> Arc<AppState> {
    Arc::new(AppState::from_config(AppConfig::default(), None))
  }

  #[tokio::test]
  async fn health_is_ok() {
    let (status, body) = call(router(fresh()), "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
  }

  #[tokio::test]
  async fn grade_endpoint_returns_camel_case_result() {
    let payload = json!({
      "questions": [
        { "prompt": "Capital of France?", "correctAnswer": "paris", "type": "short-answer" },
        { "prompt": "3 + 4", "correctAnswer": 7 }
      ],
      "answers": ["Paris ", " 7"]
    });
    let (status, body) = call(router(fresh()), "POST", "/api/v1/assessment/grade", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalScore"], 2);
    assert_eq!(body["totalPossible"], 2);
    assert_eq!(body["percentage"], 100);
    assert_eq!(body["gradeBand"], "Exceeding");
    assert_eq!(body["perQuestion"][1]["isCorrect"], true);
  }

  #[tokio::test]
  async fn empty_grade_request_scores_below() {
    let (status, body) = call(router(fresh()), "POST", "/api/v1/assessment/grade", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["percentage"], 0);
    assert_eq!(body["gradeBand"], "Below");
  }

  #[tokio::test]
  async fn null_lists_are_treated_as_missing() {
    let payload = json!({ "questions": [{ "correctAnswer": "a" }], "answers": null });
    let (status, body) = call(router(fresh()), "POST", "/api/v1/assessment/grade", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalPossible"], 1);
    assert_eq!(body["perQuestion"][0]["isCorrect"], false);

    let payload = json!({ "quizId": "sci-g5-water", "answers": null });
    let (status, body) = call(router(fresh()), "POST", "/api/v1/quiz/attempt", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["totalScore"], 0);
  }

  #[tokio::test]
  async fn malformed_bodies_get_json_errors() {
    let cases = [
      ("/api/v1/assessment/grade", json!({ "questions": [{ "points": -1 }] })),
      ("/api/v1/cost/reset", json!({ "scope": "weekly" })),
      ("/api/v1/quiz/attempt", json!({ "answers": [] })),
      ("/api/v1/tutor", json!({ "subject": "science" })),
    ];
    for (uri, payload) in cases {
      let (status, body) = call(router(fresh()), "POST", uri, Some(payload)).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
      assert_eq!(body["error"], "bad_request", "{uri}");
      assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()), "{uri}");
    }
  }

  #[tokio::test]
  async fn quiz_view_hides_answers() {
    let (status, body) = call(router(fresh()), "GET", "/api/v1/quiz/sci-g5-water", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(3));
    assert!(body["questions"][0].get("correctAnswer").is_none());
    assert_eq!(body["questions"][0]["type"], "multiple-choice");

    let (status, body) = call(router(fresh()), "GET", "/api/v1/quiz/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "quiz_not_found");
  }

  #[tokio::test]
  async fn attempts_are_listed_after_submission() {
    let state = fresh();
    let (status, body) = call(
      router(state.clone()),
      "POST",
      "/api/v1/quiz/attempt",
      Some(json!({ "quizId": "kis-g3-salamu", "studentId": "s-1", "answers": ["Nzuri"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["percentage"], 50);
    assert_eq!(body["result"]["gradeBand"], "Approaching");
    assert!(body["attemptId"].as_str().is_some());

    let (status, list) = call(router(state), "GET", "/api/v1/quiz/kis-g3-salamu/attempts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["studentId"], "s-1");
  }

  #[tokio::test]
  async fn quizzes_are_listed_in_id_order() {
    let (status, body) = call(router(fresh()), "GET", "/api/v1/quizzes", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body.as_array().unwrap().iter().filter_map(|q| q["id"].as_str()).collect();
    assert_eq!(ids, vec!["kis-g3-salamu", "math-g4-fractions", "sci-g5-water"]);
    assert_eq!(body[1]["questionCount"], 4);
  }

  #[tokio::test]
  async fn cost_report_and_reset() {
    let state = fresh();
    state.usage.record_usage(2000, "gpt-4o");

    let (status, body) = call(router(state.clone()), "GET", "/api/v1/cost", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"]["dailyRequests"], 1);
    assert_eq!(body["dailyLimit"]["exceeded"], false);
    assert_eq!(body["enforced"], false);

    let (status, body) = call(router(state.clone()), "POST", "/api/v1/cost/reset", Some(json!({ "scope": "daily" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"]["dailyCostUSD"], 0.0);
    assert!(body["usage"]["monthlyCostUSD"].as_f64().unwrap() > 0.0);
  }

  #[tokio::test]
  async fn enforced_limit_returns_429() {
    let mut cfg = AppConfig::default();
    cfg.limits.enforce = true;
    cfg.limits.daily_usd = 0.0;
    let state = Arc::new(AppState::from_config(cfg, None));
    state.usage.record_usage(1000, "gpt-4o");

    let (status, body) = call(router(state), "POST", "/api/v1/tutor", Some(json!({ "question": "What is photosynthesis?" }))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "usage_limit_exceeded");
  }
}
