//! Domain models: questions, quizzes, grade bands and scored results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a question is presented. Scoring treats every kind the same way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
  #[serde(alias = "multiple_choice", alias = "mcq")]
  MultipleChoice,
  #[serde(alias = "short_answer")]
  ShortAnswer,
  #[serde(alias = "true_false")]
  TrueFalse,
  #[serde(alias = "open_ended")]
  OpenEnded,
}
impl Default for QuestionType {
  fn default() -> Self { QuestionType::MultipleChoice }
}

fn default_points() -> u32 { 1 }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  #[serde(default)] pub id: Option<String>,
  #[serde(default)] pub prompt: String,
  /// String, number, boolean or a list of choices. `null` means no key.
  #[serde(default, alias = "correct_answer")]
  pub correct_answer: Value,
  #[serde(default, rename = "type")] pub kind: QuestionType,
  #[serde(default = "default_points")] pub points: u32,
  /// Options shown for multiple-choice questions.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub options: Vec<String>,
}

/// CBC-style reporting band derived from a percentage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeBand {
  Exceeding,
  Meeting,
  Approaching,
  Below,
}

impl GradeBand {
  /// Inclusive lower bounds: 80, 60, 40.
  pub fn from_percentage(percentage: u32) -> Self {
    match percentage {
      p if p >= 80 => GradeBand::Exceeding,
      p if p >= 60 => GradeBand::Meeting,
      p if p >= 40 => GradeBand::Approaching,
      _ => GradeBand::Below,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      GradeBand::Exceeding => "Exceeding",
      GradeBand::Meeting => "Meeting",
      GradeBand::Approaching => "Approaching",
      GradeBand::Below => "Below",
    }
  }

  /// Short learner-facing message attached to quiz attempts.
  pub fn feedback(&self) -> &'static str {
    match self {
      GradeBand::Exceeding => "Excellent work! You are exceeding expectations on this topic.",
      GradeBand::Meeting => "Good job. You are meeting expectations; review the questions you missed.",
      GradeBand::Approaching => "You are approaching expectations. Revisit the lesson notes and try again.",
      GradeBand::Below => "This topic needs more practice. Ask the tutor for help with the questions you missed.",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
  pub question_index: usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub question_id: Option<String>,
  pub is_correct: bool,
  pub points_earned: u32,
  /// `null` when the learner left the question unanswered.
  pub student_answer: Value,
  pub correct_answer: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
  pub total_score: u64,
  pub total_possible: u64,
  pub percentage: u32,
  pub grade_band: GradeBand,
  pub per_question: Vec<QuestionOutcome>,
}

/// A quiz held in the in-memory bank.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quiz {
  pub id: String,
  pub title: String,
  #[serde(default)] pub subject: String,
  /// CBC grade label, e.g. "grade-4".
  #[serde(default)] pub grade: String,
  #[serde(default)] pub questions: Vec<Question>,
}

/// One scored submission against a bank quiz.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
  pub attempt_id: String,
  pub quiz_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub student_id: Option<String>,
  pub result: ScoreResult,
  pub submitted_at: DateTime<Utc>,
}
