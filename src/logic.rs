//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Grading ad-hoc assessments and bank quiz attempts
//!   - The tutor passthrough, metered through the usage meter
//!   - Usage reports and administrative resets

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{AttemptRecord, Question, ScoreResult};
use crate::error::ApiError;
use crate::protocol::{AttemptOut, ResetScope, TutorIn, TutorOut, UsageOut};
use crate::scoring::score;
use crate::state::AppState;
use crate::util::fill_template;

#[instrument(level = "info", skip_all, fields(questions = questions.len(), answers = answers.len()))]
pub fn grade_submission(questions: &[Question], answers: &[serde_json::Value]) -> ScoreResult {
  let result = score(questions, answers);
  info!(target: "grading", percentage = result.percentage, band = result.grade_band.as_str(), "Assessment graded");
  result
}

#[instrument(level = "info", skip(state, answers), fields(%quiz_id, answers = answers.len()))]
pub async fn attempt_quiz(
  state: &AppState,
  quiz_id: &str,
  student_id: Option<String>,
  answers: &[serde_json::Value],
) -> Result<AttemptOut, ApiError> {
  let quiz = state
    .get_quiz(quiz_id)
    .await
    .ok_or_else(|| ApiError::QuizNotFound(quiz_id.to_string()))?;

  let result = score(&quiz.questions, answers);
  let record = AttemptRecord {
    attempt_id: Uuid::new_v4().to_string(),
    quiz_id: quiz.id.clone(),
    student_id,
    result: result.clone(),
    submitted_at: chrono::Utc::now(),
  };
  let attempt_id = record.attempt_id.clone();
  state.push_attempt(record).await;

  info!(target: "grading", %quiz_id, %attempt_id, percentage = result.percentage, band = result.grade_band.as_str(), "Quiz attempt recorded");
  Ok(AttemptOut {
    attempt_id,
    quiz_id: quiz.id,
    feedback: result.grade_band.feedback().to_string(),
    result,
  })
}

/// Refuse when limits are enforced and either window is over; otherwise warn only.
fn check_spend(state: &AppState) -> Result<(), ApiError> {
  let daily = state.usage.check_daily_limit(state.limits.daily_usd);
  let monthly = state.usage.check_monthly_limit(state.limits.monthly_usd);
  for (window, status) in [("daily", daily), ("monthly", monthly)] {
    if !status.exceeded {
      continue;
    }
    if state.limits.enforce {
      warn!(target: "usage", window, current = status.current, limit = status.limit, "Tutor call refused: limit exceeded");
      return Err(ApiError::LimitExceeded { window, current: status.current, limit: status.limit });
    }
    warn!(target: "usage", window, current = status.current, limit = status.limit, "Spend limit exceeded (not enforced)");
  }
  Ok(())
}

#[instrument(level = "info", skip(state, body), fields(question_len = body.question.len()))]
pub async fn tutor_reply(state: &AppState, body: &TutorIn) -> Result<TutorOut, ApiError> {
  check_spend(state)?;

  let subject = body.subject.as_deref().unwrap_or("general");
  let grade = body.grade.as_deref().unwrap_or("unspecified");

  if let Some(oa) = &state.openai {
    let user = fill_template(
      &state.prompts.tutor_user_template,
      &[("subject", subject), ("grade", grade), ("question", body.question.trim())],
    );
    match oa.chat_plain(&state.prompts.tutor_system, &user, 0.3).await {
      Ok(c) => {
        // Rates are keyed by the configured id, not the dated variant the provider echoes.
        let cost_usd = state.usage.record_usage(c.total_tokens, &oa.tutor_model);
        info!(target: "usage", model = %oa.tutor_model, served_by = %c.model, tokens = c.total_tokens, cost_usd, "Tutor usage recorded");
        return Ok(TutorOut { text: c.text, model: oa.tutor_model.clone(), tokens: c.total_tokens, cost_usd });
      }
      Err(e) => {
        error!(target: "cbc_tutor", error = %e, "Tutor completion failed; using local reply.");
      }
    }
  }

  Ok(TutorOut { text: tutor_local(subject), model: "local".into(), tokens: 0, cost_usd: 0.0 })
}

fn tutor_local(subject: &str) -> String {
  format!(
    "The online tutor is not available right now. For {subject}, re-read the lesson notes for this topic, \
     try the worked examples in your learner's book, and write down the step where you get stuck so your \
     teacher can help."
  )
}

pub fn usage_report(state: &AppState) -> UsageOut {
  UsageOut {
    usage: state.usage.snapshot(),
    daily_limit: state.usage.check_daily_limit(state.limits.daily_usd),
    monthly_limit: state.usage.check_monthly_limit(state.limits.monthly_usd),
    enforced: state.limits.enforce,
  }
}

#[instrument(level = "info", skip(state))]
pub fn reset_usage(state: &AppState, scope: ResetScope) -> UsageOut {
  match scope {
    ResetScope::Daily => state.usage.reset_daily_usage(),
    ResetScope::Monthly => state.usage.reset_monthly_usage(),
  }
  usage_report(state)
}
