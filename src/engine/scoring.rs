use crate::types::{Team, Winner};

/// Apply a signed delta to a score, never going below zero
pub fn apply_score(score: u32, delta: i64) -> u32 {
    (score as i64)
        .saturating_add(delta)
        .clamp(0, u32::MAX as i64) as u32
}

pub fn winner(score_a: u32, score_b: u32) -> Winner {
    match score_a.cmp(&score_b) {
        std::cmp::Ordering::Greater => Winner::A,
        std::cmp::Ordering::Less => Winner::B,
        std::cmp::Ordering::Equal => Winner::Tie,
    }
}

/// Running score pair of the two teams
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub a: u32,
    pub b: u32,
}

impl Scoreboard {
    pub fn apply(&mut self, team: Team, delta: i64) {
        let slot = match team {
            Team::A => &mut self.a,
            Team::B => &mut self.b,
        };
        *slot = apply_score(*slot, delta);
    }

    pub fn winner(&self) -> Winner {
        winner(self.a, self.b)
    }
}
