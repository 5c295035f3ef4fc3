//! Question pool and deck
//!
//! The pool is the deduplicated, type-filtered set of candidates for a match. The
//! deck is a shuffled copy of it that is consumed one question at a time, so no
//! question can come up twice before the deck is rebuilt.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::types::{Question, QuestionKind};

/// Keep questions of the enabled types, dropping repeated (type, prompt) pairs.
/// The first occurrence wins and input order is preserved.
pub fn build_pool(questions: &[Question], enabled: &[QuestionKind]) -> Vec<Question> {
    let mut seen = HashSet::new();
    questions
        .iter()
        .filter(|q| enabled.contains(&q.kind))
        .filter(|q| seen.insert((q.kind, q.prompt.clone())))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Question>,
}

impl Deck {
    /// Shuffle a copy of the pool (Fisher-Yates)
    pub fn shuffled<R: Rng + ?Sized>(pool: &[Question], rng: &mut R) -> Self {
        let mut cards = pool.to_vec();
        cards.shuffle(rng);
        Self { cards }
    }

    /// Take the next question. `None` means every unique question has been dealt.
    pub fn draw(&mut self) -> Option<Question> {
        self.cards.pop()
    }

    /// Make a newly added question eligible for a later draw
    pub fn insert_fresh(&mut self, question: Question) {
        self.cards.insert(0, question);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}
