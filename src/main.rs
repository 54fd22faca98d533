//! CBC Tutor · Assessment scoring & AI usage accounting backend
//!
//! - Axum HTTP JSON API (grading, quiz attempts, tutor passthrough, cost management)
//! - Optional OpenAI integration (via environment variables)
//!
//! Important env variables:
//!   PORT                     : u16 (default 3000)
//!   CBC_CONFIG_PATH          : path to TOML config (limits, rates, prompts, quiz bank)
//!   DAILY_COST_LIMIT_USD     : overrides limits.daily_usd
//!   MONTHLY_COST_LIMIT_USD   : overrides limits.monthly_usd
//!   ENFORCE_COST_LIMITS      : "true" refuses tutor calls over a limit
//!   OPENAI_API_KEY           : enables the tutor completion client if present
//!   OPENAI_BASE_URL          : default "https://api.openai.com/v1"
//!   OPENAI_TUTOR_MODEL       : default "gpt-4o-mini"
//!   LOG_LEVEL                : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT               : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod cost;
mod usage;
mod scoring;
mod config;
mod seeds;
mod state;
mod protocol;
mod logic;
mod openai;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: quiz bank, usage meter, limits, optional OpenAI client.
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "cbc_tutor", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  let usage = state.usage.snapshot();
  info!(target: "usage", daily_usd = usage.daily_cost_usd, monthly_usd = usage.monthly_cost_usd, daily_requests = usage.daily_requests, monthly_requests = usage.monthly_requests, "Shutting down; in-memory usage discarded");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "cbc_tutor", error = %e, "Failed to listen for ctrl-c; serving until killed");
    std::future::pending::<()>().await;
  }
}
