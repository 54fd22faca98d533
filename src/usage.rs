//! In-process usage accounting for AI completion calls.
//!
//! One `UsageMeter` is built at startup and shared through `AppState`. It keeps
//! daily and monthly accumulators that only move through `record_usage` and the
//! explicit reset calls; nothing here resets on a timer.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cost::{estimate, RateTable};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
  #[serde(rename = "dailyCostUSD")]
  pub daily_cost_usd: f64,
  #[serde(rename = "monthlyCostUSD")]
  pub monthly_cost_usd: f64,
  pub daily_tokens: u64,
  pub monthly_tokens: u64,
  pub daily_requests: u64,
  pub monthly_requests: u64,
}

/// Result of comparing an accumulator against a caller-supplied limit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LimitStatus {
  pub exceeded: bool,
  pub current: f64,
  pub limit: f64,
}

impl LimitStatus {
  fn compare(current: f64, limit: f64) -> Self {
    Self { exceeded: current > limit, current, limit }
  }
}

pub struct UsageMeter {
  rates: Arc<RateTable>,
  counters: Mutex<UsageSnapshot>,
}

impl UsageMeter {
  pub fn new(rates: Arc<RateTable>) -> Self {
    Self { rates, counters: Mutex::new(UsageSnapshot::default()) }
  }

  // Counters are plain numbers; a poisoned guard still holds a usable value.
  fn lock(&self) -> MutexGuard<'_, UsageSnapshot> {
    self.counters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Add the cost of `tokens` on `model` to both windows and return it.
  /// Unknown models still count tokens and requests but add no cost.
  /// Every counter belongs to a window and is cleared by that window's reset.
  #[instrument(level = "debug", skip(self), fields(%model, tokens))]
  pub fn record_usage(&self, tokens: i64, model: &str) -> f64 {
    let cost = estimate(tokens, model, &self.rates);
    if self.rates.get(model).is_none() {
      debug!(target: "usage", %model, "Model not in rate table; recording zero cost");
    }
    let counted = tokens.max(0) as u64;

    let mut c = self.lock();
    c.daily_cost_usd += cost;
    c.monthly_cost_usd += cost;
    c.daily_tokens += counted;
    c.monthly_tokens += counted;
    c.daily_requests += 1;
    c.monthly_requests += 1;
    cost
  }

  pub fn daily_usage(&self) -> f64 {
    self.lock().daily_cost_usd
  }

  pub fn monthly_usage(&self) -> f64 {
    self.lock().monthly_cost_usd
  }

  pub fn snapshot(&self) -> UsageSnapshot {
    *self.lock()
  }

  /// Zero the daily window. The monthly window is untouched.
  #[instrument(level = "info", skip(self))]
  pub fn reset_daily_usage(&self) {
    let mut c = self.lock();
    info!(target: "usage", previous_usd = c.daily_cost_usd, "Daily usage reset");
    c.daily_cost_usd = 0.0;
    c.daily_tokens = 0;
    c.daily_requests = 0;
  }

  /// Zero the monthly window. The daily window is untouched.
  #[instrument(level = "info", skip(self))]
  pub fn reset_monthly_usage(&self) {
    let mut c = self.lock();
    info!(target: "usage", previous_usd = c.monthly_cost_usd, "Monthly usage reset");
    c.monthly_cost_usd = 0.0;
    c.monthly_tokens = 0;
    c.monthly_requests = 0;
  }

  pub fn check_daily_limit(&self, limit: f64) -> LimitStatus {
    LimitStatus::compare(self.daily_usage(), limit)
  }

  pub fn check_monthly_limit(&self, limit: f64) -> LimitStatus {
    LimitStatus::compare(self.monthly_usage(), limit)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cost::ModelRate;
  use std::thread;

  fn meter() -> UsageMeter {
    let mut rates = RateTable::new();
    rates.insert("gpt-4o", ModelRate { input_cost_per_1k: 0.005, output_cost_per_1k: 0.015 });
    UsageMeter::new(Arc::new(rates))
  }

  #[test]
  fn starts_at_zero() {
    let m = meter();
    assert_eq!(m.snapshot(), UsageSnapshot::default());
  }

  #[test]
  fn record_adds_to_both_windows() {
    let m = meter();
    let cost = m.record_usage(2000, "gpt-4o");
    assert!((cost - 0.01).abs() < 1e-12);
    assert!((m.daily_usage() - 0.01).abs() < 1e-12);
    assert!((m.monthly_usage() - 0.01).abs() < 1e-12);
    assert_eq!(m.snapshot().daily_tokens, 2000);
  }

  #[test]
  fn unknown_model_is_a_cost_no_op() {
    let m = meter();
    assert_eq!(m.record_usage(5000, "mystery"), 0.0);
    assert_eq!(m.daily_usage(), 0.0);
    assert_eq!(m.snapshot().daily_requests, 1);
  }

  #[test]
  fn negative_tokens_are_clamped() {
    let m = meter();
    m.record_usage(-100, "gpt-4o");
    let s = m.snapshot();
    assert_eq!(s.daily_cost_usd, 0.0);
    assert_eq!(s.daily_tokens, 0);
  }

  #[test]
  fn daily_reset_keeps_monthly() {
    let m = meter();
    m.record_usage(1000, "gpt-4o");
    m.reset_daily_usage();
    assert_eq!(m.daily_usage(), 0.0);
    assert!((m.monthly_usage() - 0.005).abs() < 1e-12);
    let s = m.snapshot();
    assert_eq!((s.daily_requests, s.monthly_requests), (0, 1));
    assert_eq!((s.daily_tokens, s.monthly_tokens), (0, 1000));
  }

  #[test]
  fn monthly_reset_keeps_daily() {
    let m = meter();
    m.record_usage(1000, "gpt-4o");
    m.reset_monthly_usage();
    assert_eq!(m.monthly_usage(), 0.0);
    assert!((m.daily_usage() - 0.005).abs() < 1e-12);
    let s = m.snapshot();
    assert_eq!((s.daily_requests, s.monthly_requests), (1, 0));
  }

  #[test]
  fn limit_is_exceeded_only_when_strictly_above() {
    let m = meter();
    m.record_usage(2000, "gpt-4o");

    let at = m.check_daily_limit(0.01);
    assert!(!at.exceeded);
    assert_eq!(at.limit, 0.01);

    let below = m.check_daily_limit(0.005);
    assert!(below.exceeded);
    assert!((below.current - 0.01).abs() < 1e-12);

    assert!(m.check_monthly_limit(0.001).exceeded);
  }

  #[test]
  fn concurrent_records_do_not_lose_updates() {
    let m = Arc::new(meter());
    let workers = 32;
    let per_worker = 250;

    let handles: Vec<_> = (0..workers)
      .map(|_| {
        let m = Arc::clone(&m);
        thread::spawn(move || {
          for _ in 0..per_worker {
            m.record_usage(1000, "gpt-4o");
          }
        })
      })
      .collect();
    for h in handles {
      h.join().expect("worker panicked");
    }

    let n = (workers * per_worker) as f64;
    let s = m.snapshot();
    assert!((s.daily_cost_usd - n * 0.005).abs() < 1e-6);
    assert!((s.monthly_cost_usd - n * 0.005).abs() < 1e-6);
    assert_eq!(s.daily_requests, (workers * per_worker) as u64);
    assert_eq!(s.monthly_requests, (workers * per_worker) as u64);
    assert_eq!(s.daily_tokens, (workers * per_worker * 1000) as u64);
  }
}
