//! Loading backend configuration (cost limits, rate table, tutor prompts, the
//! attempt-log cap and an optional quiz bank) from TOML, plus environment
//! overrides for the limits.
//!
//! See `AppConfig` for the expected schema.

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::cost::RateTable;
use crate::domain::Quiz;
use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
  /// Oldest attempts are dropped once a quiz's log reaches this size.
  #[serde(default = "default_max_attempts_per_quiz")]
  pub max_attempts_per_quiz: usize,
  #[serde(default)]
  pub limits: Limits,
  /// Merged over the built-in rate table; entries here win.
  #[serde(default)]
  pub rates: RateTable,
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub quizzes: Vec<Quiz>,
}

fn default_max_attempts_per_quiz() -> usize { 200 }

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      max_attempts_per_quiz: default_max_attempts_per_quiz(),
      limits: Limits::default(),
      rates: RateTable::default(),
      prompts: Prompts::default(),
      quizzes: Vec::new(),
    }
  }
}

/// Spend thresholds handed to `UsageMeter::check_*_limit` by the handlers.
#[derive(Clone, Debug, Deserialize)]
pub struct Limits {
  #[serde(default = "default_daily_usd")]
  pub daily_usd: f64,
  #[serde(default = "default_monthly_usd")]
  pub monthly_usd: f64,
  /// Refuse tutor calls once a limit is exceeded. Off means report only.
  #[serde(default)]
  pub enforce: bool,
}

fn default_daily_usd() -> f64 { 5.0 }
fn default_monthly_usd() -> f64 { 100.0 }

impl Default for Limits {
  fn default() -> Self {
    Self { daily_usd: default_daily_usd(), monthly_usd: default_monthly_usd(), enforce: false }
  }
}

/// Prompts used by the tutor passthrough.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub tutor_system: String,
  pub tutor_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      tutor_system: "You are a patient tutor for Kenyan learners following the Competency Based Curriculum (CBC). Explain step by step in simple language suited to the learner's grade. Keep answers under 150 words and end with one short practice question.".into(),
      tutor_user_template: "Subject: {subject}\nGrade: {grade}\nQuestion: {question}".into(),
    }
  }
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
  let raw = std::fs::read_to_string(path)
    .map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
  toml::from_str::<AppConfig>(&raw)
    .map_err(|source| ConfigError::Parse { path: path.to_string(), source })
}

/// Load from CBC_CONFIG_PATH if set, then apply env overrides.
/// A missing or broken file is logged and replaced by defaults.
pub fn load_app_config_from_env() -> AppConfig {
  let mut cfg = match std::env::var("CBC_CONFIG_PATH") {
    Ok(path) => match load_config(&path) {
      Ok(mut cfg) => {
        validate_limits(&mut cfg.limits);
        info!(target: "cbc_tutor", %path, quizzes = cfg.quizzes.len(), rates = cfg.rates.len(), "Loaded config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "cbc_tutor", %path, error = %e, "Config unusable; falling back to defaults");
        AppConfig::default()
      }
    },
    Err(_) => AppConfig::default(),
  };
  apply_limit_overrides(&mut cfg.limits, |k| std::env::var(k).ok());
  cfg
}

fn valid_limit(v: f64) -> bool {
  v.is_finite() && v >= 0.0
}

/// Replace negative or non-finite file limits with the defaults.
pub fn validate_limits(limits: &mut Limits) {
  let defaults = Limits::default();
  for (key, slot, fallback) in [
    ("daily_usd", &mut limits.daily_usd, defaults.daily_usd),
    ("monthly_usd", &mut limits.monthly_usd, defaults.monthly_usd),
  ] {
    if !valid_limit(*slot) {
      warn!(target: "cbc_tutor", %key, value = *slot, fallback, "Invalid cost limit in config; using default");
      *slot = fallback;
    }
  }
}

/// DAILY_COST_LIMIT_USD, MONTHLY_COST_LIMIT_USD and ENFORCE_COST_LIMITS.
/// Unparseable values are ignored with a warning.
pub fn apply_limit_overrides(limits: &mut Limits, get: impl Fn(&str) -> Option<String>) {
  for (key, slot) in [
    ("DAILY_COST_LIMIT_USD", &mut limits.daily_usd),
    ("MONTHLY_COST_LIMIT_USD", &mut limits.monthly_usd),
  ] {
    if let Some(raw) = get(key) {
      match raw.trim().parse::<f64>() {
        Ok(v) if valid_limit(v) => *slot = v,
        _ => warn!(target: "cbc_tutor", %key, value = %raw, "Ignoring invalid cost limit"),
      }
    }
  }
  if let Some(raw) = get("ENFORCE_COST_LIMITS") {
    limits.enforce = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
  }
}
