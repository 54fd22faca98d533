//! Answer-key scoring.
//!
//! `score` never fails. Missing or `null` answers are wrong, a question with no
//! answer key is never correct, surplus answers are ignored, and an empty quiz
//! scores 0%. Both sides are compared after stringifying, trimming and
//! lower-casing, whatever the question type.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::{GradeBand, Question, QuestionOutcome, ScoreResult};

/// Render an answer value the way a learner would have typed it.
fn answer_to_string(v: &Value) -> String {
  match v {
    Value::Null => String::new(),
    Value::String(s) => s.clone(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => match n.as_f64() {
      // 7.0 and 7 are the same answer.
      Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
      _ => n.to_string(),
    },
    Value::Array(items) => items.iter().map(answer_to_string).collect::<Vec<_>>().join(","),
    Value::Object(_) => v.to_string(),
  }
}

pub fn normalize_answer(v: &Value) -> String {
  answer_to_string(v).trim().to_lowercase()
}

/// `round(100 * earned / possible)`, or 0 when nothing was possible.
pub fn percentage(earned: u64, possible: u64) -> u32 {
  if possible == 0 {
    return 0;
  }
  (100.0 * earned as f64 / possible as f64).round() as u32
}

#[instrument(level = "debug", skip_all, fields(questions = questions.len(), answers = answers.len()))]
pub fn score(questions: &[Question], answers: &[Value]) -> ScoreResult {
  // u64 sums of u32 weights cannot overflow for any realistic question count.
  let mut total_score = 0u64;
  let mut total_possible = 0u64;
  let mut per_question = Vec::with_capacity(questions.len());

  for (i, q) in questions.iter().enumerate() {
    let submitted = answers.get(i).cloned().unwrap_or(Value::Null);
    let is_correct = !submitted.is_null()
      && !q.correct_answer.is_null()
      && normalize_answer(&submitted) == normalize_answer(&q.correct_answer);
    let points_earned = if is_correct { q.points } else { 0 };

    total_score += u64::from(points_earned);
    total_possible += u64::from(q.points);

    per_question.push(QuestionOutcome {
      question_index: i,
      question_id: q.id.clone(),
      is_correct,
      points_earned,
      student_answer: submitted,
      correct_answer: q.correct_answer.clone(),
    });
  }

  let percentage = percentage(total_score, total_possible);
  let grade_band = GradeBand::from_percentage(percentage);
  debug!(target: "grading", total_score, total_possible, percentage, band = grade_band.as_str(), "Scored submission");

  ScoreResult { total_score, total_possible, percentage, grade_band, per_question }
}
