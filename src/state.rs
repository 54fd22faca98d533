//! Application state: quiz bank, attempt log, usage meter, limits, prompts and
//! the optional completion client.
//!
//! Built once in `main` and handed to every handler through axum's `State`.
//! The usage meter lives here rather than in a global so tests can build
//! isolated instances.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::config::{load_app_config_from_env, AppConfig, Limits, Prompts};
use crate::cost::RateTable;
use crate::domain::{AttemptRecord, Quiz};
use crate::openai::OpenAI;
use crate::seeds::seed_quizzes;
use crate::usage::UsageMeter;

#[derive(Clone)]
pub struct AppState {
    pub quizzes: Arc<RwLock<HashMap<String, Quiz>>>,
    pub attempts: Arc<RwLock<HashMap<String, VecDeque<AttemptRecord>>>>,
    /// Per-quiz attempt log size; the oldest record goes first.
    pub max_attempts_per_quiz: usize,
    pub usage: Arc<UsageMeter>,
    pub limits: Limits,
    pub prompts: Prompts,
    pub openai: Option<OpenAI>,
}

impl AppState {
    /// Build state from env: load config, seed quizzes, init the completion client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_app_config_from_env();

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "cbc_tutor", base_url = %oa.base_url, tutor_model = %oa.tutor_model, "OpenAI enabled.");
        } else {
            info!(target: "cbc_tutor", "OpenAI disabled (no OPENAI_API_KEY). Tutor uses local replies.");
        }

        Self::from_config(cfg, openai)
    }

    pub fn from_config(cfg: AppConfig, openai: Option<OpenAI>) -> Self {
        let mut rates = RateTable::with_defaults();
        if !cfg.rates.is_empty() {
            info!(target: "cbc_tutor", configured = cfg.rates.len(), "Merging configured model rates over built-in table");
            rates.merge(cfg.rates);
        }

        // Config-bank quizzes win over built-in seeds with the same id.
        let mut bank = HashMap::<String, Quiz>::new();
        for q in seed_quizzes() {
            bank.insert(q.id.clone(), q);
        }
        for q in cfg.quizzes {
            bank.insert(q.id.clone(), q);
        }

        info!(
            target: "cbc_tutor",
            quizzes = bank.len(),
            priced_models = rates.len(),
            daily_limit_usd = cfg.limits.daily_usd,
            monthly_limit_usd = cfg.limits.monthly_usd,
            enforce_limits = cfg.limits.enforce,
            max_attempts_per_quiz = cfg.max_attempts_per_quiz,
            "Startup state"
        );

        Self {
            quizzes: Arc::new(RwLock::new(bank)),
            attempts: Arc::new(RwLock::new(HashMap::new())),
            max_attempts_per_quiz: cfg.max_attempts_per_quiz.max(1),
            usage: Arc::new(UsageMeter::new(Arc::new(rates))),
            limits: cfg.limits,
            prompts: cfg.prompts,
            openai,
        }
    }

    /// Read-only access to a quiz by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_quiz(&self, id: &str) -> Option<Quiz> {
        self.quizzes.read().await.get(id).cloned()
    }

    /// All quizzes, ordered by id for stable listings.
    pub async fn list_quizzes(&self) -> Vec<Quiz> {
        let mut all: Vec<Quiz> = self.quizzes.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    #[instrument(level = "debug", skip(self, record), fields(quiz_id = %record.quiz_id, attempt_id = %record.attempt_id))]
    pub async fn push_attempt(&self, record: AttemptRecord) {
        let mut attempts = self.attempts.write().await;
        let log = attempts.entry(record.quiz_id.clone()).or_default();
        while log.len() >= self.max_attempts_per_quiz {
            if let Some(dropped) = log.pop_front() {
                debug!(target: "grading", attempt_id = %dropped.attempt_id, "Attempt log full; dropped oldest");
            }
        }
        log.push_back(record);
    }

    /// Attempts for a quiz, oldest first.
    pub async fn attempts_for(&self, quiz_id: &str) -> Vec<AttemptRecord> {
        self.attempts
            .read()
            .await
            .get(quiz_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }
}
