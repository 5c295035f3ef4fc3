//! Question storage and ingestion
//!
//! Questions live in one JSON array per category. Loading is forgiving: records that
//! fail the shape checks are dropped with a warning, and only a category with no
//! valid record at all is an error.

mod file;
mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::config::normalize_category;
use crate::types::{Question, QuestionId, QuestionKind};

pub use file::FileQuestionStore;
pub use http::HttpQuestionStore;

/// Minimum prompt length accepted for new submissions
pub const MIN_PROMPT_CHARS: usize = 3;

/// Errors raised while loading a category
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Category '{0}' not found")]
    NotFound(String),

    #[error("Invalid category name '{0}'")]
    InvalidCategory(String),

    #[error("Failed to read category '{category}': {reason}")]
    Io { category: String, reason: String },

    #[error("Malformed question file for '{category}': {reason}")]
    Malformed { category: String, reason: String },

    #[error("No valid questions in category '{0}'")]
    NoValidQuestions(String),

    #[error("Question server request failed: {0}")]
    Http(String),
}

/// Errors raised while submitting a new question
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Invalid question: {0}")]
    Invalid(String),

    #[error("Question already exists in category '{0}'")]
    Duplicate(String),

    #[error("Question rejected: {0}")]
    Rejected(String),

    #[error("Failed to store question: {0}")]
    Io(String),

    #[error("Question server request failed: {0}")]
    Http(String),
}

/// Backend that supplies and persists questions per category
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Load all valid questions of a category
    async fn fetch_questions(&self, category: &str) -> Result<Vec<Question>, LoadError>;

    /// Validate, store and echo back a new question with its store-assigned ID
    async fn submit_question(&self, candidate: NewQuestion) -> Result<Question, SubmitError>;

    /// Name of this backend for logging
    fn name(&self) -> &str;
}

/// A question submitted for storage, before it has an ID
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewQuestion {
    /// Shape-check the candidate and return its normalized form.
    /// True/false questions always get the options `["True", "False"]`.
    pub fn validated(self) -> Result<NewQuestion, SubmitError> {
        let question = self.question.trim().to_string();
        if question.chars().count() < MIN_PROMPT_CHARS {
            return Err(SubmitError::Invalid(format!(
                "question text must have at least {} characters",
                MIN_PROMPT_CHARS
            )));
        }

        let options: Vec<String> = match self.kind {
            QuestionKind::TrueFalse => vec!["True".to_string(), "False".to_string()],
            QuestionKind::MultipleChoice => {
                let options: Vec<String> =
                    self.options.iter().map(|o| o.trim().to_string()).collect();
                if options.len() < 2 {
                    return Err(SubmitError::Invalid(
                        "multiple choice questions need at least 2 options".to_string(),
                    ));
                }
                if options.iter().any(|o| o.is_empty()) {
                    return Err(SubmitError::Invalid("all options must be filled in".to_string()));
                }
                options
            }
        };

        if self.correct_index >= options.len() {
            return Err(SubmitError::Invalid(format!(
                "correct index {} out of range for {} options",
                self.correct_index,
                options.len()
            )));
        }

        Ok(NewQuestion {
            kind: self.kind,
            question,
            options,
            correct_index: self.correct_index,
            category: Some(normalize_category(self.category.as_deref().unwrap_or(""))),
        })
    }

    /// Category after normalization
    pub fn category(&self) -> String {
        normalize_category(self.category.as_deref().unwrap_or(""))
    }

    pub fn into_question(self, id: QuestionId) -> Question {
        let category = self.category();
        Question {
            id,
            kind: self.kind,
            prompt: self.question,
            options: self.options,
            correct_index: self.correct_index,
            category,
        }
    }
}

/// Category names map to file names, so keep them to a safe alphabet
pub fn is_valid_category(category: &str) -> bool {
    !category.is_empty()
        && category
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Parse a raw category payload into validated questions.
///
/// Fails only when the payload is not an array; invalid records are skipped.
/// A missing `id` defaults to the record's 1-based position among the object
/// records. A record whose id repeats an earlier one is dropped.
pub fn parse_category(category: &str, payload: Value) -> Result<Vec<Question>, LoadError> {
    let records = match payload {
        Value::Array(records) => records,
        _ => {
            return Err(LoadError::Malformed {
                category: category.to_string(),
                reason: "expected a JSON array".to_string(),
            })
        }
    };

    let total = records.len();
    let mut seen_ids = HashSet::new();
    let questions: Vec<Question> = records
        .iter()
        .filter(|record| record.is_object())
        .enumerate()
        .filter_map(|(idx, record)| normalize_record(idx, record, category))
        .filter(|q| {
            let first = seen_ids.insert(q.id);
            if !first {
                tracing::warn!(
                    "Dropping question with duplicate id {} in category '{}'",
                    q.id,
                    category
                );
            }
            first
        })
        .collect();

    if questions.len() < total {
        tracing::warn!(
            "Dropped {} of {} question records in category '{}'",
            total - questions.len(),
            total,
            category
        );
    }

    Ok(questions)
}

/// Validate one raw record. Returns None if it fails any shape check.
fn normalize_record(idx: usize, record: &Value, category: &str) -> Option<Question> {
    let obj = record.as_object()?;

    let id = match obj.get("id") {
        None | Some(Value::Null) => idx as u64 + 1,
        Some(value) => as_whole_number(value)?,
    };

    let kind = match obj.get("type") {
        None | Some(Value::Null) => QuestionKind::MultipleChoice,
        Some(Value::String(label)) => QuestionKind::from_label(label)?,
        Some(_) => return None,
    };

    let prompt = obj.get("question")?.as_str()?.trim().to_string();
    if prompt.is_empty() {
        return None;
    }

    let options: Vec<String> = obj
        .get("options")?
        .as_array()?
        .iter()
        .map(|o| match o {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
        .collect();
    if options.len() < 2 {
        return None;
    }

    let correct_index = as_whole_number(obj.get("correctIndex")?)? as usize;
    if correct_index >= options.len() {
        return None;
    }

    Some(Question {
        id,
        kind,
        prompt,
        options,
        correct_index,
        category: category.to_string(),
    })
}

/// Non-negative integers, including integral floats and numeric strings
fn as_whole_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
