//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{Question, QuestionType, Quiz, ScoreResult};
use crate::usage::{LimitStatus, UsageSnapshot};

/// Treat an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

//
// Assessment grading
//

#[derive(Debug, Deserialize)]
pub struct GradeIn {
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<Question>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: Vec<Value>,
}

//
// Quiz bank + attempts
//

/// Question as shown to learners: no answer key.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub points: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOut {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub grade: String,
    pub questions: Vec<QuestionOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummaryOut {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub grade: String,
    pub question_count: usize,
}

/// Convert a bank `Quiz` (internal) to the public DTO, dropping correct answers.
pub fn to_out(q: &Quiz) -> QuizOut {
    QuizOut {
        id: q.id.clone(),
        title: q.title.clone(),
        subject: q.subject.clone(),
        grade: q.grade.clone(),
        questions: q
            .questions
            .iter()
            .map(|x| QuestionOut {
                id: x.id.clone(),
                prompt: x.prompt.clone(),
                kind: x.kind,
                points: x.points,
                options: x.options.clone(),
            })
            .collect(),
    }
}

pub fn to_summary(q: &Quiz) -> QuizSummaryOut {
    QuizSummaryOut {
        id: q.id.clone(),
        title: q.title.clone(),
        subject: q.subject.clone(),
        grade: q.grade.clone(),
        question_count: q.questions.len(),
    }
}

#[derive(Debug, Deserialize)]
pub struct AttemptIn {
    #[serde(rename = "quizId")]
    pub quiz_id: String,
    #[serde(default, rename = "studentId")]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOut {
    pub attempt_id: String,
    pub quiz_id: String,
    pub result: ScoreResult,
    pub feedback: String,
}

//
// Tutor passthrough
//

#[derive(Debug, Deserialize)]
pub struct TutorIn {
    pub question: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorOut {
    pub text: String,
    /// "local" when the reply did not come from the completion service.
    pub model: String,
    pub tokens: i64,
    pub cost_usd: f64,
}

//
// Cost management
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOut {
    pub usage: UsageSnapshot,
    pub daily_limit: LimitStatus,
    pub monthly_limit: LimitStatus,
    pub enforced: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResetScope {
    Daily,
    Monthly,
}

#[derive(Debug, Deserialize)]
pub struct ResetIn {
    pub scope: ResetScope,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
