use super::AppState;
use crate::config::MatchConfig;
use crate::engine::{CommandError, MatchError};
use crate::protocol::{MatchEvent, ServerMessage};
use crate::types::*;
use tokio::time::Instant;

impl AppState {
    /// Load the configured category and start a match.
    /// The fetch runs before the engine lock is taken; the match stays Idle until it
    /// resolves and is untouched if it fails.
    pub async fn start_match(&self) -> Result<(), MatchError> {
        loop {
            let category = {
                let engine = self.engine.lock().await;
                if engine.phase() == MatchPhase::Running {
                    return Err(MatchError::AlreadyRunning);
                }
                engine.config().category.clone()
            };

            let questions = self.store.fetch_questions(&category).await.map_err(|e| {
                tracing::warn!("Could not load category '{}': {}", category, e);
                MatchError::from(e)
            })?;

            let mut engine = self.engine.lock().await;
            if engine.config().category != category {
                tracing::debug!("Category changed while loading '{}', reloading", category);
                continue;
            }
            let events = engine.start(&questions, Instant::now())?;
            self.publish(events);
            return Ok(());
        }
    }

    pub async fn select(&self, index: usize) -> Result<(), CommandError> {
        let mut engine = self.engine.lock().await;
        let events = engine.select(index)?;
        self.publish(events);
        Ok(())
    }

    pub async fn reveal(&self) {
        let mut engine = self.engine.lock().await;
        let events = engine.reveal();
        self.publish(events);
    }

    pub async fn judge(&self, verdict: Verdict) -> Result<(), CommandError> {
        let mut engine = self.engine.lock().await;
        let events = engine.judge(verdict)?;
        self.publish(events);
        Ok(())
    }

    pub async fn next_question(&self) -> Result<(), CommandError> {
        let mut engine = self.engine.lock().await;
        let events = engine.next_question(Instant::now())?;
        self.publish(events);
        Ok(())
    }

    pub async fn reset(&self) {
        let mut engine = self.engine.lock().await;
        let events = engine.reset();
        self.publish(events);
    }

    pub async fn adjust_score(&self, team: Team, delta: i64) -> Result<(), CommandError> {
        let mut engine = self.engine.lock().await;
        let events = engine.adjust_score(team, delta)?;
        self.publish(events);
        Ok(())
    }

    /// Advance the countdown to the current time
    pub async fn tick(&self) -> Vec<MatchEvent> {
        let mut engine = self.engine.lock().await;
        let events = engine.tick(Instant::now());
        self.publish(events.clone());
        events
    }

    /// Apply a new configuration, clamped into range. A running match is reset.
    pub async fn update_config(&self, config: MatchConfig) -> MatchConfig {
        let config = config.normalized();
        let mut engine = self.engine.lock().await;
        let events = engine.set_config(config.clone());
        self.publish(events);

        tracing::info!("Configuration updated: {:?}", config);
        let _ = self.broadcast.send(ServerMessage::ConfigUpdated {
            config: config.clone(),
        });
        config
    }
}
