//! Minimal OpenAI-compatible client for the tutor passthrough.
//!
//! We only call chat.completions for plain text and hand the reported token
//! usage back to the caller, which meters it. Calls are instrumented and log
//! model names, latencies and token counts (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::TutorError;
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub tutor_model: String,
}

/// Text plus the usage the provider billed for it.
#[derive(Clone, Debug)]
pub struct Completion {
  pub text: String,
  pub model: String,
  pub total_tokens: i64,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let tutor_model =
      std::env::var("OPENAI_TUTOR_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, tutor_model })
  }

  /// Plain-text chat completion against the tutor model.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.tutor_model))]
  pub async fn chat_plain(&self, system: &str, user: &str, temperature: f32) -> Result<Completion, TutorError> {
    let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
    let req = ChatCompletionRequest {
      model: self.tutor_model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      max_tokens: Some(600),
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "cbc-tutor-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      warn!(status, elapsed = ?start.elapsed(), "Completion service rejected request");
      return Err(TutorError::Status { status, message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    let total_tokens = body.usage.as_ref().map(Usage::total).unwrap_or(0);
    info!(elapsed = ?start.elapsed(), total_tokens, "OpenAI usage");

    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();
    if text.is_empty() {
      return Err(TutorError::EmptyReply);
    }

    Ok(Completion { text, model: body.model.unwrap_or_else(|| self.tutor_model.clone()), total_tokens })
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  #[serde(default)] model: Option<String>,
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

impl Usage {
  // Some compatible servers omit total_tokens.
  fn total(&self) -> i64 {
    match self.total_tokens {
      Some(t) => t as i64,
      None => self.prompt_tokens.unwrap_or(0) as i64 + self.completion_tokens.unwrap_or(0) as i64,
    }
  }
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn usage_total_falls_back_to_sum() {
    let u: Usage = serde_json::from_str(r#"{"prompt_tokens": 120, "completion_tokens": 30}"#).unwrap();
    assert_eq!(u.total(), 150);
    let u: Usage = serde_json::from_str(r#"{"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 9}"#).unwrap();
    assert_eq!(u.total(), 9);
  }

  #[test]
  fn provider_error_message_is_extracted() {
    let body = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Rate limit reached"));
    assert_eq!(extract_openai_error("<html>bad gateway</html>"), None);
  }
}
