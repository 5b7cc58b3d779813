//! Per-side think time.
//!
//! Every operation has an `_at` form taking the instant explicitly, so the
//! session controller can apply one consistent "now" to a whole transition.

use std::time::{Duration, Instant};

use chess::Color;

#[derive(Debug, Clone)]
pub struct Clock {
    remaining: [Duration; 2],
    turn: Color,
    started_at: Option<Instant>,
}

impl Clock {
    /// Both sides start with `initial`; `turn` is the side whose clock runs first.
    pub fn new(initial: Duration, turn: Color) -> Self {
        Self::with_times(initial, initial, turn)
    }

    pub fn with_times(white: Duration, black: Duration, turn: Color) -> Self {
        Self {
            remaining: [white, black],
            turn,
            started_at: None,
        }
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Start the clock of the side to move. No-op when already running.
    pub fn start_at(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    /// Charge the time elapsed since `start` to the side to move.
    pub fn stop_at(&mut self, now: Instant) {
        if let Some(started) = self.started_at.take() {
            let idx = self.turn.to_index();
            let elapsed = now.saturating_duration_since(started);
            self.remaining[idx] = self.remaining[idx].saturating_sub(elapsed);
        }
    }

    pub fn toggle(&mut self) {
        self.toggle_at(Instant::now());
    }

    /// Stop the mover, hand the turn over and start the receiver.
    pub fn toggle_at(&mut self, now: Instant) {
        self.stop_at(now);
        self.turn = !self.turn;
        self.start_at(now);
    }

    pub fn remaining(&self, color: Color) -> Duration {
        self.remaining_at(color, Instant::now())
    }

    /// Remaining time for `color` as of `now`, never below zero. Pure read.
    pub fn remaining_at(&self, color: Color, now: Instant) -> Duration {
        let stored = self.remaining[color.to_index()];
        match self.started_at {
            Some(started) if color == self.turn => {
                stored.saturating_sub(now.saturating_duration_since(started))
            }
            _ => stored,
        }
    }

    pub fn remaining_ms_at(&self, color: Color, now: Instant) -> u64 {
        self.remaining_at(color, now).as_millis() as u64
    }

    /// A side whose time has run out, the side to move checked first.
    pub fn flagged_at(&self, now: Instant) -> Option<Color> {
        [self.turn, !self.turn]
            .into_iter()
            .find(|&color| self.remaining_at(color, now).is_zero())
    }
}

/// Render a remaining time the way the clock display shows it:
/// `12.3` below one minute, `m:ss` from one minute up.
pub fn format_clock(time: Duration) -> String {
    let seconds = time.as_millis() as f64 / 1000.0;
    if seconds >= 60.0 {
        let minutes = (seconds / 60.0).floor() as u64;
        let rest = (seconds % 60.0).floor() as u64;
        format!("{minutes}:{rest:02}")
    } else {
        format!("{seconds:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn running_side_loses_time_and_other_side_does_not() {
        let t0 = Instant::now();
        let mut clock = Clock::new(MINUTE, Color::White);
        clock.start_at(t0);

        let t1 = t0 + Duration::from_millis(1500);
        assert_eq!(clock.remaining_at(Color::White, t1), Duration::from_millis(58_500));
        assert_eq!(clock.remaining_at(Color::Black, t1), MINUTE);

        clock.toggle_at(t1);
        let t2 = t1 + Duration::from_millis(700);
        assert_eq!(clock.remaining_at(Color::White, t2), Duration::from_millis(58_500));
        assert_eq!(clock.remaining_at(Color::Black, t2), Duration::from_millis(59_300));
    }

    #[test]
    fn remaining_is_a_pure_read() {
        let t0 = Instant::now();
        let mut clock = Clock::new(MINUTE, Color::White);
        clock.start_at(t0);
        let later = t0 + Duration::from_secs(5);
        let _ = clock.remaining_at(Color::White, later);
        let _ = clock.remaining_at(Color::White, later);
        assert_eq!(clock.remaining_at(Color::White, later), Duration::from_secs(55));
        assert!(clock.is_running());
    }

    #[test]
    fn toggle_parity() {
        let t0 = Instant::now();
        let mut clock = Clock::new(MINUTE, Color::Black);
        clock.start_at(t0);
        for n in 1..=6u64 {
            clock.toggle_at(t0 + Duration::from_millis(n * 10));
            let expected = if n % 2 == 0 { Color::Black } else { Color::White };
            assert_eq!(clock.turn(), expected);
        }
    }

    #[test]
    fn stop_is_idempotent() {
        let t0 = Instant::now();
        let mut once = Clock::new(MINUTE, Color::White);
        once.start_at(t0);
        once.stop_at(t0 + Duration::from_secs(3));

        let mut twice = Clock::new(MINUTE, Color::White);
        twice.start_at(t0);
        twice.stop_at(t0 + Duration::from_secs(3));
        twice.stop_at(t0 + Duration::from_secs(9));

        assert_eq!(once.remaining_at(Color::White, t0), twice.remaining_at(Color::White, t0));
        assert!(!twice.is_running());
    }

    #[test]
    fn start_while_running_keeps_first_start() {
        let t0 = Instant::now();
        let mut clock = Clock::new(MINUTE, Color::White);
        clock.start_at(t0);
        clock.start_at(t0 + Duration::from_secs(10));
        assert_eq!(
            clock.remaining_at(Color::White, t0 + Duration::from_secs(20)),
            Duration::from_secs(40)
        );
    }

    #[test]
    fn remaining_never_goes_negative() {
        let t0 = Instant::now();
        let mut clock = Clock::new(Duration::from_secs(1), Color::White);
        clock.start_at(t0);
        let late = t0 + Duration::from_secs(5);
        assert_eq!(clock.remaining_at(Color::White, late), Duration::ZERO);
        assert_eq!(clock.flagged_at(late), Some(Color::White));
        clock.stop_at(late);
        assert_eq!(clock.remaining_at(Color::White, late), Duration::ZERO);
    }

    #[test]
    fn formats_like_the_display() {
        assert_eq!(format_clock(Duration::from_millis(600_000)), "10:00");
        assert_eq!(format_clock(Duration::from_millis(65_900)), "1:05");
        assert_eq!(format_clock(Duration::from_millis(60_000)), "1:00");
        assert_eq!(format_clock(Duration::from_millis(59_940)), "59.9");
        assert_eq!(format_clock(Duration::from_millis(4_260)), "4.3");
        assert_eq!(format_clock(Duration::ZERO), "0.0");
    }
}
