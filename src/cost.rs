//! Per-model rate table and the cost estimator used by usage accounting.
//!
//! Costs are blended: a call site reports a single token count, which is billed
//! at the model's input rate. The output rate is kept for reporting only.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// USD price per 1K tokens for one model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelRate {
  pub input_cost_per_1k: f64,
  #[serde(default)]
  pub output_cost_per_1k: f64,
}

/// Model identifier -> rate. Built once at startup and shared read-only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
  rates: HashMap<String, ModelRate>,
}

impl RateTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Built-in prices for the models the tutor is usually pointed at.
  pub fn with_defaults() -> Self {
    let mut t = Self::new();
    t.insert("gpt-4o", ModelRate { input_cost_per_1k: 0.005, output_cost_per_1k: 0.015 });
    t.insert("gpt-4o-mini", ModelRate { input_cost_per_1k: 0.00015, output_cost_per_1k: 0.0006 });
    t.insert("gpt-4-turbo", ModelRate { input_cost_per_1k: 0.01, output_cost_per_1k: 0.03 });
    t.insert("gpt-3.5-turbo", ModelRate { input_cost_per_1k: 0.0005, output_cost_per_1k: 0.0015 });
    t
  }

  pub fn insert(&mut self, model: impl Into<String>, rate: ModelRate) {
    self.rates.insert(model.into(), rate);
  }

  pub fn get(&self, model: &str) -> Option<&ModelRate> {
    self.rates.get(model)
  }

  /// Entries from `other` replace ours on the same model id.
  pub fn merge(&mut self, other: RateTable) {
    self.rates.extend(other.rates);
  }

  pub fn len(&self) -> usize {
    self.rates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rates.is_empty()
  }
}

/// Convert a token count into USD using `rates`.
///
/// Unknown models, non-positive token counts and nonsensical rates all yield
/// `0.0`. No rounding happens here; display code rounds if it wants to.
pub fn estimate(tokens: i64, model: &str, rates: &RateTable) -> f64 {
  let Some(rate) = rates.get(model) else { return 0.0 };
  if tokens <= 0 {
    return 0.0;
  }
  let cost = (tokens as f64 / 1000.0) * rate.input_cost_per_1k;
  if cost.is_finite() && cost > 0.0 { cost } else { 0.0 }
}
