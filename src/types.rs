use serde::{Deserialize, Serialize};

/// Identifier of a question, unique within its category
pub type QuestionId = u64;

/// Opaque ID of a single match run
pub type MatchId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    #[serde(rename = "MCQ")]
    MultipleChoice,
    #[serde(rename = "TF")]
    TrueFalse,
}

impl QuestionKind {
    /// Short label used in data files and logs
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "MCQ",
            QuestionKind::TrueFalse => "TF",
        }
    }

    /// Parse the label used in data files (case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "MCQ" => Some(QuestionKind::MultipleChoice),
            "TF" => Some(QuestionKind::TrueFalse),
            _ => None,
        }
    }
}

/// A validated question. Immutable once it has been loaded into a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub category: String,
}

impl Question {
    /// Key used for pool deduplication: (type, prompt)
    pub fn dedup_key(&self) -> (QuestionKind, &str) {
        (self.kind, self.prompt.as_str())
    }

    pub fn is_correct(&self, index: usize) -> bool {
        self.correct_index == index
    }
}

/// Question as shown to renderers. The correct option stays hidden until reveal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub prompt: String,
    pub options: Vec<String>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
}

impl QuestionView {
    pub fn hidden(question: &Question) -> Self {
        Self {
            id: question.id,
            kind: question.kind,
            prompt: question.prompt.clone(),
            options: question.options.clone(),
            category: question.category.clone(),
            correct_index: None,
        }
    }

    pub fn revealed(question: &Question) -> Self {
        Self {
            correct_index: Some(question.correct_index),
            ..Self::hidden(question)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Team {
    A,
    B,
}

impl Team {
    pub fn other(self) -> Self {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchPhase {
    Idle,
    Running,
    Ended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Winner {
    A,
    B,
    Tie,
}

/// Host's verdict for the active team's answer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Wrong,
}

/// Whether selecting an option scores it immediately or the host judges by hand
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    #[default]
    Auto,
    Manual,
}

impl ScoringMode {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "auto" => Some(ScoringMode::Auto),
            "manual" => Some(ScoringMode::Manual),
            _ => None,
        }
    }
}

/// Final result handed to the presentation layer when a match ends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSummary {
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Winner,
    pub ran_out_of_questions: bool,
}
