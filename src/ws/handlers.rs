//! WebSocket message dispatch
//!
//! Every command runs against the shared match. Events are broadcast to all
//! clients; the return value is only a direct reply to the sender, which is
//! `None` on success for commands that already broadcast their outcome.

use crate::engine::{CommandError, MatchError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

/// Handle client messages and return optional response
pub async fn handle_message(msg: ClientMessage, state: &Arc<AppState>) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Start => match state.start_match().await {
            Ok(()) => None,
            Err(e) => Some(match_error(e)),
        },

        ClientMessage::Select { index } => command_reply(state.select(index).await),

        ClientMessage::Reveal => {
            state.reveal().await;
            None
        }

        ClientMessage::Judge { verdict } => command_reply(state.judge(verdict).await),

        ClientMessage::Next => command_reply(state.next_question().await),

        ClientMessage::Reset => {
            state.reset().await;
            None
        }

        ClientMessage::AdjustScore { team, delta } => {
            command_reply(state.adjust_score(team, delta).await)
        }

        ClientMessage::UpdateConfig { config } => {
            // Broadcast as config_updated to everyone, including the sender
            state.update_config(config).await;
            None
        }

        ClientMessage::Snapshot => Some(ServerMessage::Snapshot {
            snapshot: state.snapshot().await,
        }),
    }
}

fn command_reply(result: Result<(), CommandError>) -> Option<ServerMessage> {
    match result {
        Ok(()) => None,
        Err(e) => {
            tracing::debug!("Command rejected: {}", e);
            Some(ServerMessage::error(e.code(), e.to_string()))
        }
    }
}

fn match_error(e: MatchError) -> ServerMessage {
    tracing::warn!("Match could not start: {}", e);
    ServerMessage::error(e.code(), e.to_string())
}
