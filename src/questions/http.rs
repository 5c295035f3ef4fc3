//! Question store backed by another quizbank server over HTTP

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{is_valid_category, parse_category, LoadError, NewQuestion, QuestionStore, SubmitError};
use crate::config::normalize_category;
use crate::types::Question;

pub struct HttpQuestionStore {
    base_url: String,
    client: reqwest::Client,
    cache: RwLock<HashMap<String, Vec<Question>>>,
}

impl HttpQuestionStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LoadError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn category_url(&self, category: &str) -> String {
        format!("{}/data/questions.{}.json", self.base_url, category)
    }

    fn submit_url(&self) -> String {
        format!("{}/api/add-question", self.base_url)
    }
}

#[async_trait]
impl QuestionStore for HttpQuestionStore {
    async fn fetch_questions(&self, category: &str) -> Result<Vec<Question>, LoadError> {
        let category = normalize_category(category);
        if !is_valid_category(&category) {
            return Err(LoadError::InvalidCategory(category));
        }

        if let Some(cached) = self.cache.read().await.get(&category) {
            return Ok(cached.clone());
        }

        let url = self.category_url(&category);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LoadError::Http(format!("GET {}: {}", url, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(LoadError::NotFound(category));
        }
        if !response.status().is_success() {
            return Err(LoadError::Http(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(|e| LoadError::Malformed {
            category: category.clone(),
            reason: e.to_string(),
        })?;

        let questions = parse_category(&category, payload)?;
        if questions.is_empty() {
            return Err(LoadError::NoValidQuestions(category));
        }

        tracing::info!(
            "Fetched {} questions for category '{}' from {}",
            questions.len(),
            category,
            url
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

        let response = self
            .client
            .post(self.submit_url())
            .json(&candidate)
            .send()
            .await
            .map_err(|e| SubmitError::Http(e.to_string()))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("failed to add question")
                .to_string();
            return Err(match status {
                StatusCode::CONFLICT => SubmitError::Duplicate(category),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    SubmitError::Invalid(message)
                }
                _ => SubmitError::Rejected(message),
            });
        }

        let added = body
            .get("added")
            .cloned()
            .ok_or_else(|| SubmitError::Rejected("response is missing 'added'".to_string()))?;
        let question: Question =
            serde_json::from_value(added).map_err(|e| SubmitError::Rejected(e.to_string()))?;

        if let Some(cached) = self.cache.write().await.get_mut(&question.category) {
            cached.push(question.clone());
        }

        tracing::info!(
            "Submitted question {} to {} (category '{}')",
            question.id,
            self.base_url,
            question.category
        );
        Ok(question)
    }

    fn name(&self) -> &str {
        "http"
    }
}
