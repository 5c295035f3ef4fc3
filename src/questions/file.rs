//! JSON-file question store: one `questions.<category>.json` array per category

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

use super::{is_valid_category, parse_category, LoadError, NewQuestion, QuestionStore, SubmitError};
use crate::config::normalize_category;
use crate::types::Question;

pub struct FileQuestionStore {
    data_dir: PathBuf,
    /// Parsed categories. Also serializes submissions.
    cache: RwLock<HashMap<String, Vec<Question>>>,
}

impl FileQuestionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn category_path(&self, category: &str) -> PathBuf {
        self.data_dir.join(format!("questions.{}.json", category))
    }

    /// Read the raw record array of a category. `Ok(None)` if the file does not exist.
    async fn read_records(&self, category: &str) -> Result<Option<Value>, LoadError> {
        let path = self.category_path(category);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::error!("Failed to read {}: {}", path.display(), e);
                return Err(LoadError::Io {
                    category: category.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| LoadError::Malformed {
                category: category.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl QuestionStore for FileQuestionStore {
    async fn fetch_questions(&self, category: &str) -> Result<Vec<Question>, LoadError> {
        let category = normalize_category(category);
        if !is_valid_category(&category) {
            return Err(LoadError::InvalidCategory(category));
        }

        if let Some(cached) = self.cache.read().await.get(&category) {
            return Ok(cached.clone());
        }

        let payload = self
            .read_records(&category)
            .await?
            .ok_or_else(|| LoadError::NotFound(category.clone()))?;
        let questions = parse_category(&category, payload)?;
        if questions.is_empty() {
            return Err(LoadError::NoValidQuestions(category));
        }

        tracing::info!(
            "Loaded {} questions for category '{}' from {}",
            questions.len(),
            category,
            self.category_path(&category).display()
        );

        self.cache
            .write()
            .await
            .insert(category.clone(), questions.clone());
        Ok(questions)
    }

    async fn submit_question(&self, candidate: NewQuestion) -> Result<Question, SubmitError> {
        let candidate = candidate.validated()?;
        let category = candidate.category();
        if !is_valid_category(&category) {
            return Err(SubmitError::Invalid(format!("invalid category name '{}'", category)));
        }

        // Held across read-modify-write so concurrent submissions can't clobber each other
        let mut cache = self.cache.write().await;

        let mut records = match self.read_records(&category).await {
            Ok(Some(Value::Array(records))) => records,
            Ok(Some(_)) => {
                return Err(SubmitError::Io(format!(
                    "question file for '{}' is not a JSON array",
                    category
                )))
            }
            Ok(None) => Vec::new(),
            Err(e) => return Err(SubmitError::Io(e.to_string())),
        };

        let existing = parse_category(&category, Value::Array(records.clone()))
            .map_err(|e| SubmitError::Io(e.to_string()))?;

        if existing
            .iter()
            .any(|q| q.kind == candidate.kind && q.prompt == candidate.question)
        {
            return Err(SubmitError::Duplicate(category));
        }

        let id = existing.iter().map(|q| q.id).max().unwrap_or(0) + 1;
        let question = candidate.into_question(id);

        let record =
            serde_json::to_value(&question).map_err(|e| SubmitError::Io(e.to_string()))?;
        records.push(record);
        let text = serde_json::to_string_pretty(&Value::Array(records))
            .map_err(|e| SubmitError::Io(e.to_string()))?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| SubmitError::Io(e.to_string()))?;
        tokio::fs::write(self.category_path(&category), text)
            .await
            .map_err(|e| {
                tracing::error!("Failed to write category '{}': {}", category, e);
                SubmitError::Io(e.to_string())
            })?;

        let mut questions = existing;
        questions.push(question.clone());
        cache.insert(category.clone(), questions);

        tracing::info!("Stored question {} in category '{}'", question.id, category);
        Ok(question)
    }

    fn name(&self) -> &str {
        "file"
    }
}
