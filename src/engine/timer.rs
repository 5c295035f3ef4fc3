//! Per-question countdown
//!
//! Pure time math: the caller passes the current instant on every tick, so the
//! countdown follows wall-clock time no matter how irregularly ticks arrive.

use std::time::Duration;
use tokio::time::Instant;

/// Result of feeding the countdown one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No countdown is running
    Idle,
    /// Less than a whole second passed since the last accounted tick
    Pending,
    Ticked { remaining: u32, total: u32 },
    /// Reached zero. Reported once; the countdown is stopped afterwards.
    Expired { total: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Countdown {
    total: u32,
    remaining: u32,
    last_tick_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct Timer {
    countdown: Option<Countdown>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh countdown, replacing any running one
    pub fn start(&mut self, seconds: u32, now: Instant) {
        self.countdown = Some(Countdown {
            total: seconds,
            remaining: seconds,
            last_tick_at: now,
        });
    }

    /// Cancel the countdown. Safe to call when already stopped.
    pub fn stop(&mut self) {
        self.countdown = None;
    }

    /// `(remaining, total)` of the running countdown
    pub fn readout(&self) -> Option<(u32, u32)> {
        self.countdown.map(|c| (c.remaining, c.total))
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let Some(countdown) = self.countdown.as_mut() else {
            return TickOutcome::Idle;
        };

        let elapsed = now.saturating_duration_since(countdown.last_tick_at).as_secs();
        if elapsed < 1 {
            return TickOutcome::Pending;
        }

        // Keep the sub-second remainder for the next tick
        countdown.last_tick_at += Duration::from_secs(elapsed);
        let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
        countdown.remaining = countdown.remaining.saturating_sub(elapsed).min(countdown.total);

        if countdown.remaining == 0 {
            let total = countdown.total;
            self.countdown = None;
            TickOutcome::Expired { total }
        } else {
            TickOutcome::Ticked {
                remaining: countdown.remaining,
                total: countdown.total,
            }
        }
    }
}

/// Share of time left, 0 to 100
pub fn percent(remaining: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (remaining as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn label(remaining: u32) -> String {
    format!("{}s", remaining)
}
