use crate::config::MatchConfig;
use crate::engine::MatchSnapshot;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Protocol version announced in the welcome message
pub const PROTOCOL_VERSION: &str = "1.0";

/// Commands sent by a controlling client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    Start,
    Select {
        index: usize,
    },
    /// Show the correct answer without scoring (auto mode) or before judging (manual mode)
    Reveal,
    Judge {
        verdict: Verdict,
    },
    Next,
    Reset,
    /// Manual score correction outside the question cycle
    AdjustScore {
        team: Team,
        delta: i64,
    },
    UpdateConfig {
        config: MatchConfig,
    },
    Snapshot,
}

/// Events emitted by the match engine for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum MatchEvent {
    MatchStarted {
        match_id: MatchId,
        config: MatchConfig,
        pool_size: usize,
    },
    QuestionPresented {
        question: QuestionView,
        /// 1-based position of the question in this match
        index: u32,
        total: u32,
    },
    Tick {
        remaining: u32,
        total: u32,
        percent: f64,
        label: String,
    },
    /// Selection recorded without judging (manual scoring)
    OptionSelected {
        index: usize,
    },
    Reveal {
        correct_index: usize,
        selected_index: Option<usize>,
    },
    /// A question was closed; `verdict` is None when no points were at stake
    QuestionResolved {
        team: Team,
        verdict: Option<Verdict>,
        delta: i64,
    },
    ScoreChanged {
        score_a: u32,
        score_b: u32,
    },
    TurnChanged {
        turn: Team,
    },
    MatchEnded {
        score_a: u32,
        score_b: u32,
        winner: Winner,
        ran_out_of_questions: bool,
    },
    MatchReset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        snapshot: MatchSnapshot,
        server_now: String,
    },
    Event {
        event: MatchEvent,
    },
    Snapshot {
        snapshot: MatchSnapshot,
    },
    QuestionAdded {
        question: Question,
        /// Whether the question joined the running match's deck
        in_deck: bool,
    },
    ConfigUpdated {
        config: MatchConfig,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}
