//! Match engine
//!
//! Owns one match: the deck, the countdown, both scores and whose turn it is.
//! Every command returns the events it produced; nothing here knows about
//! sockets or rendering.
//!
//! Phases go `Idle -> Running -> Ended`. While running, each question moves
//! through `Awaiting -> Revealed -> Resolved`, and the turn passes to the other
//! team exactly once per resolved question.

pub mod deck;
pub mod scoring;
pub mod timer;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::{MatchConfig, SECONDS_PER_QUESTION_RANGE};
use crate::protocol::MatchEvent;
use crate::questions::LoadError;
use crate::types::*;

use deck::{build_pool, Deck};
use scoring::Scoreboard;
use timer::{TickOutcome, Timer};

/// Errors that keep a match from starting. The match is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("No questions in category '{category}' match the enabled question types")]
    EmptyPool { category: String },

    #[error("A match is already running")]
    AlreadyRunning,
}

impl MatchError {
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::Load(_) => "LOAD_FAILED",
            MatchError::EmptyPool { .. } => "EMPTY_POOL",
            MatchError::AlreadyRunning => "ALREADY_RUNNING",
        }
    }
}

/// Commands that are not valid in the current state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("No match is running")]
    NotRunning,

    #[error("Option {index} does not exist (question has {count} options)")]
    InvalidOption { index: usize, count: usize },

    #[error("This question has already been scored")]
    AlreadyResolved,

    #[error("Manual judging is disabled while answers are scored automatically")]
    ManualScoringDisabled,

    #[error("The current question has not been answered or revealed yet")]
    QuestionPending,
}

impl CommandError {
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::NotRunning => "NOT_RUNNING",
            CommandError::InvalidOption { .. } => "INVALID_OPTION",
            CommandError::AlreadyResolved => "ALREADY_RESOLVED",
            CommandError::ManualScoringDisabled => "MANUAL_SCORING_DISABLED",
            CommandError::QuestionPending => "QUESTION_PENDING",
        }
    }
}

/// Where the current question is in its lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuestionStage {
    /// Open for an answer; the countdown is running
    Awaiting { selected: Option<usize> },
    /// Answer shown, verdict still to come (manual scoring only)
    Revealed { selected: Option<usize> },
    /// Closed. `verdict` is None when it ended without points at stake.
    Resolved {
        selected: Option<usize>,
        verdict: Option<Verdict>,
    },
}

impl QuestionStage {
    pub fn selected(&self) -> Option<usize> {
        match *self {
            QuestionStage::Awaiting { selected }
            | QuestionStage::Revealed { selected }
            | QuestionStage::Resolved { selected, .. } => selected,
        }
    }

    pub fn is_revealed(&self) -> bool {
        !matches!(self, QuestionStage::Awaiting { .. })
    }
}

#[derive(Debug, Clone)]
struct ActiveQuestion {
    question: Question,
    stage: QuestionStage,
}

/// Read model of a match for late-joining clients and the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: Option<MatchId>,
    pub phase: MatchPhase,
    pub turn: Team,
    pub score_a: u32,
    pub score_b: u32,
    pub question_index: u32,
    pub questions_per_game: u32,
    pub question: Option<QuestionView>,
    pub stage: Option<QuestionStage>,
    pub selected_index: Option<usize>,
    pub revealed: bool,
    pub locked: bool,
    pub remaining: Option<u32>,
    pub total: Option<u32>,
    pub pool_size: usize,
    pub deck_remaining: usize,
    pub config: MatchConfig,
    pub summary: Option<MatchSummary>,
}

pub struct MatchEngine {
    match_id: Option<MatchId>,
    config: MatchConfig,
    phase: MatchPhase,
    turn: Team,
    scores: Scoreboard,
    pool: Vec<Question>,
    deck: Deck,
    timer: Timer,
    current: Option<ActiveQuestion>,
    question_index: u32,
    summary: Option<MatchSummary>,
    rng: StdRng,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Engine with a caller-supplied RNG, for reproducible decks
    pub fn with_rng(config: MatchConfig, rng: StdRng) -> Self {
        Self {
            match_id: None,
            config,
            phase: MatchPhase::Idle,
            turn: Team::A,
            scores: Scoreboard::default(),
            pool: Vec::new(),
            deck: Deck::default(),
            timer: Timer::new(),
            current: None,
            question_index: 0,
            summary: None,
            rng,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn turn(&self) -> Team {
        self.turn
    }

    pub fn scores(&self) -> (u32, u32) {
        (self.scores.a, self.scores.b)
    }

    pub fn question_index(&self) -> u32 {
        self.question_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref().map(|c| &c.question)
    }

    pub fn stage(&self) -> Option<QuestionStage> {
        self.current.as_ref().map(|c| c.stage)
    }

    pub fn summary(&self) -> Option<&MatchSummary> {
        self.summary.as_ref()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn timer_readout(&self) -> Option<(u32, u32)> {
        self.timer.readout()
    }

    /// Replace the configuration. A running match is hard reset so the new
    /// settings apply from its next start.
    pub fn set_config(&mut self, config: MatchConfig) -> Vec<MatchEvent> {
        self.config = config;
        if self.phase == MatchPhase::Running {
            tracing::info!("Configuration changed during a running match, resetting");
            return self.reset();
        }
        Vec::new()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start a match from the questions loaded for the configured category.
    /// On error nothing is changed.
    pub fn start(
        &mut self,
        questions: &[Question],
        now: Instant,
    ) -> Result<Vec<MatchEvent>, MatchError> {
        if self.phase == MatchPhase::Running {
            return Err(MatchError::AlreadyRunning);
        }

        let mut config = self.config.clone();
        if config.ensure_type_enabled() {
            tracing::warn!("Both question types were disabled, enabling multiple choice");
        }

        let pool = build_pool(questions, &config.enabled_kinds());
        if pool.is_empty() {
            return Err(MatchError::EmptyPool {
                category: config.category.clone(),
            });
        }

        self.timer.stop();
        self.config = config;
        self.deck = Deck::shuffled(&pool, &mut self.rng);
        self.pool = pool;
        self.match_id = Some(ulid::Ulid::new().to_string());
        self.phase = MatchPhase::Running;
        self.turn = Team::A;
        self.scores = Scoreboard::default();
        self.current = None;
        self.question_index = 0;
        self.summary = None;

        tracing::info!(
            "Match {:?} started: category '{}', pool of {}, {} questions per game",
            self.match_id,
            self.config.category,
            self.pool.len(),
            self.config.questions_per_game
        );

        let mut events = vec![
            MatchEvent::MatchStarted {
                match_id: self.match_id.clone().unwrap_or_default(),
                config: self.config.clone(),
                pool_size: self.pool.len(),
            },
            self.score_event(),
            MatchEvent::TurnChanged { turn: self.turn },
        ];
        events.extend(self.advance(now));
        Ok(events)
    }

    /// Move on to the next question, or end the match when the quota is reached
    /// or the deck is empty.
    pub fn next_question(&mut self, now: Instant) -> Result<Vec<MatchEvent>, CommandError> {
        if self.phase != MatchPhase::Running {
            return Err(CommandError::NotRunning);
        }

        let mut events = Vec::new();
        match self.stage() {
            Some(QuestionStage::Awaiting { .. }) => return Err(CommandError::QuestionPending),
            // Revealed but never judged: close it without points so the turn still passes
            Some(QuestionStage::Revealed { .. }) => events.extend(self.resolve(None)),
            Some(QuestionStage::Resolved { .. }) | None => {}
        }

        events.extend(self.advance(now));
        Ok(events)
    }

    /// Return to Idle, dropping the deck, the scores and any countdown
    pub fn reset(&mut self) -> Vec<MatchEvent> {
        self.timer.stop();
        self.pool.clear();
        self.deck.clear();
        self.match_id = None;
        self.phase = MatchPhase::Idle;
        self.turn = Team::A;
        self.scores = Scoreboard::default();
        self.current = None;
        self.question_index = 0;
        self.summary = None;

        tracing::info!("Match reset");
        vec![
            MatchEvent::MatchReset,
            self.score_event(),
            MatchEvent::TurnChanged { turn: self.turn },
        ]
    }

    fn advance(&mut self, now: Instant) -> Vec<MatchEvent> {
        self.timer.stop();

        if self.question_index >= self.config.questions_per_game {
            return self.end(false);
        }

        let Some(question) = self.deck.draw() else {
            return self.end(true);
        };

        self.question_index += 1;
        let seconds = self
            .config
            .seconds_per_question
            .clamp(SECONDS_PER_QUESTION_RANGE.0, SECONDS_PER_QUESTION_RANGE.1);
        self.timer.start(seconds, now);

        tracing::info!(
            "Question {}/{} (id {}, {}) for team {:?}",
            self.question_index,
            self.config.questions_per_game,
            question.id,
            question.kind.label(),
            self.turn
        );

        let events = vec![
            MatchEvent::QuestionPresented {
                question: QuestionView::hidden(&question),
                index: self.question_index,
                total: self.config.questions_per_game,
            },
            tick_event(seconds, seconds),
        ];
        self.current = Some(ActiveQuestion {
            question,
            stage: QuestionStage::Awaiting { selected: None },
        });
        events
    }

    fn end(&mut self, ran_out_of_questions: bool) -> Vec<MatchEvent> {
        self.timer.stop();
        self.phase = MatchPhase::Ended;

        let summary = MatchSummary {
            score_a: self.scores.a,
            score_b: self.scores.b,
            winner: self.scores.winner(),
            ran_out_of_questions,
        };
        tracing::info!(
            "Match {:?} ended: A={} B={} winner={:?} ran_out={}",
            self.match_id,
            summary.score_a,
            summary.score_b,
            summary.winner,
            ran_out_of_questions
        );
        self.summary = Some(summary.clone());

        vec![MatchEvent::MatchEnded {
            score_a: summary.score_a,
            score_b: summary.score_b,
            winner: summary.winner,
            ran_out_of_questions,
        }]
    }

    // =========================================================================
    // Question cycle
    // =========================================================================

    /// Pick an option for the team whose turn it is. Ignored unless the current
    /// question is still open.
    pub fn select(&mut self, index: usize) -> Result<Vec<MatchEvent>, CommandError> {
        if self.phase != MatchPhase::Running {
            return Ok(Vec::new());
        }
        let Some(active) = self.current.as_mut() else {
            return Ok(Vec::new());
        };
        if active.stage.is_revealed() {
            return Ok(Vec::new());
        }

        let count = active.question.options.len();
        if index >= count {
            return Err(CommandError::InvalidOption { index, count });
        }

        active.stage = QuestionStage::Awaiting {
            selected: Some(index),
        };

        match self.config.scoring {
            ScoringMode::Manual => Ok(vec![MatchEvent::OptionSelected { index }]),
            ScoringMode::Auto => {
                let verdict = if active.question.is_correct(index) {
                    Verdict::Correct
                } else {
                    Verdict::Wrong
                };
                let mut events = self.show_answer();
                events.extend(self.resolve(Some(verdict)));
                Ok(events)
            }
        }
    }

    /// Show the correct answer. With automatic scoring this closes the question
    /// without points; with manual scoring the verdict is still pending.
    /// A second reveal of the same question does nothing.
    pub fn reveal(&mut self) -> Vec<MatchEvent> {
        if self.phase != MatchPhase::Running {
            return Vec::new();
        }
        match self.stage() {
            Some(QuestionStage::Awaiting { .. }) => {}
            _ => return Vec::new(),
        }

        let mut events = self.show_answer();
        if self.config.scoring == ScoringMode::Auto {
            events.extend(self.resolve(None));
        }
        events
    }

    /// Record the host's verdict for the active team (manual scoring only)
    pub fn judge(&mut self, verdict: Verdict) -> Result<Vec<MatchEvent>, CommandError> {
        if self.phase != MatchPhase::Running {
            return Err(CommandError::NotRunning);
        }
        if self.config.scoring != ScoringMode::Manual {
            return Err(CommandError::ManualScoringDisabled);
        }

        let mut events = Vec::new();
        match self.stage() {
            Some(QuestionStage::Awaiting { .. }) => events.extend(self.show_answer()),
            Some(QuestionStage::Revealed { .. }) => {}
            Some(QuestionStage::Resolved { .. }) => return Err(CommandError::AlreadyResolved),
            None => return Err(CommandError::NotRunning),
        }

        events.extend(self.resolve(Some(verdict)));
        Ok(events)
    }

    /// Feed the countdown. Emits tick events, and on expiry reveals the answer
    /// with no points awarded.
    pub fn tick(&mut self, now: Instant) -> Vec<MatchEvent> {
        if self.phase != MatchPhase::Running {
            return Vec::new();
        }

        match self.timer.tick(now) {
            TickOutcome::Idle | TickOutcome::Pending => Vec::new(),
            TickOutcome::Ticked { remaining, total } => {
                tracing::debug!("Tick: {}/{}", remaining, total);
                vec![tick_event(remaining, total)]
            }
            TickOutcome::Expired { total } => {
                tracing::info!("Time is up for team {:?}", self.turn);
                let mut events = vec![tick_event(0, total)];
                events.extend(self.reveal());
                events
            }
        }
    }

    /// Correct a team's score by hand while a match is running
    pub fn adjust_score(&mut self, team: Team, delta: i64) -> Result<Vec<MatchEvent>, CommandError> {
        if self.phase != MatchPhase::Running {
            return Err(CommandError::NotRunning);
        }
        self.scores.apply(team, delta);
        tracing::info!("Manual score adjustment: team {:?} {:+}", team, delta);
        Ok(vec![self.score_event()])
    }

    /// Offer a newly stored question to the running match. Returns true if it
    /// joined the deck.
    pub fn insert_fresh(&mut self, question: Question) -> bool {
        if self.phase != MatchPhase::Running
            || question.category != self.config.category
            || !self.config.allows(question.kind)
            || self
                .pool
                .iter()
                .any(|q| q.dedup_key() == question.dedup_key())
        {
            return false;
        }

        tracing::info!("Question {} added to the running deck", question.id);
        self.pool.push(question.clone());
        self.deck.insert_fresh(question);
        true
    }

    /// Stop the countdown and announce the correct option.
    /// Callers make sure the current question is still awaiting an answer.
    fn show_answer(&mut self) -> Vec<MatchEvent> {
        self.timer.stop();
        let Some(active) = self.current.as_mut() else {
            return Vec::new();
        };

        let selected = active.stage.selected();
        active.stage = QuestionStage::Revealed { selected };
        vec![MatchEvent::Reveal {
            correct_index: active.question.correct_index,
            selected_index: selected,
        }]
    }

    /// Close the current question, score it for the active team and pass the turn
    fn resolve(&mut self, verdict: Option<Verdict>) -> Vec<MatchEvent> {
        self.timer.stop();
        let team = self.turn;
        let delta = match verdict {
            Some(Verdict::Correct) => self.config.points_correct as i64,
            Some(Verdict::Wrong) => -(self.config.points_wrong as i64),
            None => 0,
        };

        if let Some(active) = self.current.as_mut() {
            active.stage = QuestionStage::Resolved {
                selected: active.stage.selected(),
                verdict,
            };
        }

        let mut events = vec![MatchEvent::QuestionResolved {
            team,
            verdict,
            delta,
        }];
        if delta != 0 {
            self.scores.apply(team, delta);
            events.push(self.score_event());
        }

        self.turn = team.other();
        events.push(MatchEvent::TurnChanged { turn: self.turn });
        events
    }

    fn score_event(&self) -> MatchEvent {
        MatchEvent::ScoreChanged {
            score_a: self.scores.a,
            score_b: self.scores.b,
        }
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let stage = self.stage();
        let revealed = stage.map(|s| s.is_revealed()).unwrap_or(false);
        let question = self.current.as_ref().map(|c| {
            if revealed {
                QuestionView::revealed(&c.question)
            } else {
                QuestionView::hidden(&c.question)
            }
        });
        let readout = self.timer.readout();

        MatchSnapshot {
            match_id: self.match_id.clone(),
            phase: self.phase,
            turn: self.turn,
            score_a: self.scores.a,
            score_b: self.scores.b,
            question_index: self.question_index,
            questions_per_game: self.config.questions_per_game,
            question,
            stage,
            selected_index: stage.and_then(|s| s.selected()),
            revealed,
            locked: revealed,
            remaining: readout.map(|(remaining, _)| remaining),
            total: readout.map(|(_, total)| total),
            pool_size: self.pool.len(),
            deck_remaining: self.deck.len(),
            config: self.config.clone(),
            summary: self.summary.clone(),
        }
    }
}

fn tick_event(remaining: u32, total: u32) -> MatchEvent {
    MatchEvent::Tick {
        remaining,
        total,
        percent: timer::percent(remaining, total),
        label: timer::label(remaining),
    }
}

#[cfg(test)]
mod tests;
