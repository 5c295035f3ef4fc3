use super::AppState;
use crate::protocol::ServerMessage;
use crate::questions::{NewQuestion, SubmitError};
use crate::types::Question;

impl AppState {
    /// Store a new question and offer it to the running match.
    /// Returns the stored question and whether it joined the current deck.
    pub async fn submit_question(
        &self,
        candidate: NewQuestion,
    ) -> Result<(Question, bool), SubmitError> {
        let question = self.store.submit_question(candidate).await.map_err(|e| {
            tracing::warn!("Question submission rejected: {}", e);
            e
        })?;

        let mut engine = self.engine.lock().await;
        let in_deck = engine.insert_fresh(question.clone());
        let _ = self.broadcast.send(ServerMessage::QuestionAdded {
            question: question.clone(),
            in_deck,
        });
        Ok((question, in_deck))
    }
}
