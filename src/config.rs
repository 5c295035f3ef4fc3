//! Match and server configuration
//!
//! Every numeric match setting is clamped to its range on ingestion. Missing,
//! unparseable or non-finite values fall back to the named default.

use crate::types::{QuestionKind, ScoringMode};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_QUESTIONS_PER_GAME: u32 = 20;
pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 30;
pub const DEFAULT_POINTS_CORRECT: u32 = 1;
pub const DEFAULT_POINTS_WRONG: u32 = 0;
pub const DEFAULT_CATEGORY: &str = "general";

pub const QUESTIONS_PER_GAME_RANGE: (u32, u32) = (5, 100);
pub const SECONDS_PER_QUESTION_RANGE: (u32, u32) = (5, 120);
pub const POINTS_CORRECT_RANGE: (u32, u32) = (1, 50);
pub const POINTS_WRONG_RANGE: (u32, u32) = (0, 50);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "MatchConfigInput")]
pub struct MatchConfig {
    pub questions_per_game: u32,
    pub seconds_per_question: u32,
    pub points_correct: u32,
    pub points_wrong: u32,
    pub enable_mcq: bool,
    pub enable_tf: bool,
    pub category: String,
    pub scoring: ScoringMode,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            questions_per_game: DEFAULT_QUESTIONS_PER_GAME,
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            points_correct: DEFAULT_POINTS_CORRECT,
            points_wrong: DEFAULT_POINTS_WRONG,
            enable_mcq: true,
            enable_tf: true,
            category: DEFAULT_CATEGORY.to_string(),
            scoring: ScoringMode::Auto,
        }
    }
}

/// Loosely typed config as it arrives over the wire
#[derive(Debug, Clone, Default, Deserialize)]
struct MatchConfigInput {
    questions_per_game: Option<f64>,
    seconds_per_question: Option<f64>,
    points_correct: Option<f64>,
    points_wrong: Option<f64>,
    enable_mcq: Option<bool>,
    enable_tf: Option<bool>,
    category: Option<String>,
    scoring: Option<ScoringMode>,
}

impl From<MatchConfigInput> for MatchConfig {
    fn from(input: MatchConfigInput) -> Self {
        let config = MatchConfig {
            questions_per_game: clamp_or_default(
                input.questions_per_game,
                DEFAULT_QUESTIONS_PER_GAME,
                QUESTIONS_PER_GAME_RANGE,
            ),
            seconds_per_question: clamp_or_default(
                input.seconds_per_question,
                DEFAULT_SECONDS_PER_QUESTION,
                SECONDS_PER_QUESTION_RANGE,
            ),
            points_correct: clamp_or_default(
                input.points_correct,
                DEFAULT_POINTS_CORRECT,
                POINTS_CORRECT_RANGE,
            ),
            points_wrong: clamp_or_default(
                input.points_wrong,
                DEFAULT_POINTS_WRONG,
                POINTS_WRONG_RANGE,
            ),
            enable_mcq: input.enable_mcq.unwrap_or(true),
            enable_tf: input.enable_tf.unwrap_or(true),
            category: input.category.unwrap_or_default(),
            scoring: input.scoring.unwrap_or_default(),
        };
        config.normalized()
    }
}

/// Clamp a raw number into `range`, or use `default` if it is missing or not finite
fn clamp_or_default(value: Option<f64>, default: u32, range: (u32, u32)) -> u32 {
    match value {
        Some(v) if v.is_finite() => v.clamp(range.0 as f64, range.1 as f64) as u32,
        _ => default,
    }
}

/// Lower-cased, trimmed category name; empty falls back to the default category
pub fn normalize_category(category: &str) -> String {
    let trimmed = category.trim().to_lowercase();
    if trimmed.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        trimmed
    }
}

impl MatchConfig {
    /// Return a copy with every field clamped into its range
    pub fn normalized(&self) -> Self {
        let mut config = MatchConfig {
            questions_per_game: self
                .questions_per_game
                .clamp(QUESTIONS_PER_GAME_RANGE.0, QUESTIONS_PER_GAME_RANGE.1),
            seconds_per_question: self
                .seconds_per_question
                .clamp(SECONDS_PER_QUESTION_RANGE.0, SECONDS_PER_QUESTION_RANGE.1),
            points_correct: self
                .points_correct
                .clamp(POINTS_CORRECT_RANGE.0, POINTS_CORRECT_RANGE.1),
            points_wrong: self
                .points_wrong
                .clamp(POINTS_WRONG_RANGE.0, POINTS_WRONG_RANGE.1),
            enable_mcq: self.enable_mcq,
            enable_tf: self.enable_tf,
            category: normalize_category(&self.category),
            scoring: self.scoring,
        };
        config.ensure_type_enabled();
        config
    }

    /// Force multiple choice on when both question types are disabled.
    /// Returns true if the config had to be changed.
    pub fn ensure_type_enabled(&mut self) -> bool {
        if !self.enable_mcq && !self.enable_tf {
            self.enable_mcq = true;
            return true;
        }
        false
    }

    /// Question types that may enter the pool
    pub fn enabled_kinds(&self) -> Vec<QuestionKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.enable_mcq {
            kinds.push(QuestionKind::MultipleChoice);
        }
        if self.enable_tf {
            kinds.push(QuestionKind::TrueFalse);
        }
        kinds
    }

    pub fn allows(&self, kind: QuestionKind) -> bool {
        match kind {
            QuestionKind::MultipleChoice => self.enable_mcq,
            QuestionKind::TrueFalse => self.enable_tf,
        }
    }

    /// Load match defaults from environment variables
    pub fn from_env() -> Self {
        let input = MatchConfigInput {
            questions_per_game: env_number("QUIZBANK_QUESTIONS_PER_GAME"),
            seconds_per_question: env_number("QUIZBANK_SECONDS_PER_QUESTION"),
            points_correct: env_number("QUIZBANK_POINTS_CORRECT"),
            points_wrong: env_number("QUIZBANK_POINTS_WRONG"),
            enable_mcq: env_bool("QUIZBANK_ENABLE_MCQ"),
            enable_tf: env_bool("QUIZBANK_ENABLE_TF"),
            category: env_string("QUIZBANK_CATEGORY"),
            scoring: env_string("QUIZBANK_SCORING").and_then(|s| {
                let mode = ScoringMode::from_label(&s);
                if mode.is_none() {
                    tracing::warn!("Unknown QUIZBANK_SCORING value '{}', using auto", s);
                }
                mode
            }),
        };
        MatchConfig::from(input)
    }
}

/// Server-level settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Directory holding `questions.<category>.json` files
    pub data_dir: PathBuf,
    /// Base URL of another quizbank server to load questions from
    pub remote_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: PathBuf::from("data"),
            remote_url: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind = match env_string("QUIZBANK_BIND") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Invalid QUIZBANK_BIND '{}': {}, using {}", raw, e, defaults.bind);
                defaults.bind
            }),
            None => defaults.bind,
        };

        Self {
            bind,
            data_dir: env_string("QUIZBANK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            remote_url: env_string("QUIZBANK_REMOTE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn env_number(key: &str) -> Option<f64> {
    env_string(key).and_then(|s| s.parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    env_string(key).and_then(|s| match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}
