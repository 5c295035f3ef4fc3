mod game;
mod submission;

use crate::config::MatchConfig;
use crate::engine::{MatchEngine, MatchSnapshot};
use crate::protocol::{MatchEvent, ServerMessage};
use crate::questions::QuestionStore;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The single match. Every command and tick goes through this lock.
    pub engine: Arc<Mutex<MatchEngine>>,
    pub store: Arc<dyn QuestionStore>,
    /// Broadcast channel for sending messages to all connected clients
    pub broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(store: Arc<dyn QuestionStore>, config: MatchConfig) -> Self {
        Self::with_engine(store, MatchEngine::new(config.normalized()))
    }

    /// State around a prepared engine, e.g. one with a seeded RNG
    pub fn with_engine(store: Arc<dyn QuestionStore>, engine: MatchEngine) -> Self {
        let (tx, _rx) = broadcast::channel(256);
        tracing::info!("Using question store: {}", store.name());
        Self {
            engine: Arc::new(Mutex::new(engine)),
            store,
            broadcast: tx,
        }
    }

    /// Send engine events to every subscriber. Callers hold the engine lock so
    /// events from concurrent commands never interleave.
    pub fn publish(&self, events: Vec<MatchEvent>) {
        for event in events {
            // No receivers connected is fine
            let _ = self.broadcast.send(ServerMessage::Event { event });
        }
    }

    pub async fn snapshot(&self) -> MatchSnapshot {
        self.engine.lock().await.snapshot()
    }

    pub async fn config(&self) -> MatchConfig {
        self.engine.lock().await.config().clone()
    }
}
