//! Idle session reset for hosted windows.
//!
//! Each hosted window remembers when it was hidden. Showing it again after
//! the configured idle period reloads the hosted page so a stale session (or
//! another account's) is never presented as if it were current.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Active,
    Hidden {
        since: Instant,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// Keep the page as it is.
    Resume,
    /// Reload the hosted URL before showing.
    Reset,
}

impl SessionState {
    pub fn on_hidden(&mut self, now: Instant) {
        // a second hide must not restart the idle clock
        if let Self::Active = self {
            *self = Self::Hidden { since: now };
        }
    }

    /// Moves to `Active` and reports whether the page must be reloaded.
    pub fn on_shown(&mut self, now: Instant, reset_after: Duration) -> ShowOutcome {
        let outcome = match *self {
            Self::Active => ShowOutcome::Resume,
            Self::Hidden { since } => {
                if now.saturating_duration_since(since) >= reset_after {
                    ShowOutcome::Reset
                } else {
                    ShowOutcome::Resume
                }
            }
        };
        *self = Self::Active;
        outcome
    }

    #[cfg(test)]
    pub fn hidden_since(&self) -> Option<Instant> {
        match self {
            Self::Active => None,
            Self::Hidden { since } => Some(*since),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);

    #[test]
    fn test_first_show_never_resets() {
        let mut state = SessionState::default();
        assert_eq!(
            state.on_shown(Instant::now(), Duration::ZERO),
            ShowOutcome::Resume
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let hidden_at = Instant::now();

        let mut state = SessionState::default();
        state.on_hidden(hidden_at);
        assert_eq!(
            state.on_shown(hidden_at + FIVE_MINUTES, FIVE_MINUTES),
            ShowOutcome::Reset
        );

        let mut state = SessionState::default();
        state.on_hidden(hidden_at);
        assert_eq!(
            state.on_shown(
                hidden_at + FIVE_MINUTES - Duration::from_millis(1),
                FIVE_MINUTES
            ),
            ShowOutcome::Resume
        );
    }

    #[test]
    fn test_zero_timer_resets_every_show_after_hide() {
        let mut state = SessionState::default();
        let now = Instant::now();

        for _ in 0..3 {
            state.on_hidden(now);
            assert_eq!(state.on_shown(now, Duration::ZERO), ShowOutcome::Reset);
        }
        // shown again without a hide in between
        assert_eq!(state.on_shown(now, Duration::ZERO), ShowOutcome::Resume);
    }

    #[test]
    fn test_repeated_hide_keeps_first_timestamp() {
        let first = Instant::now();
        let mut state = SessionState::default();

        state.on_hidden(first);
        state.on_hidden(first + Duration::from_secs(240));

        assert_eq!(state.hidden_since(), Some(first));
        assert_eq!(
            state.on_shown(first + FIVE_MINUTES, FIVE_MINUTES),
            ShowOutcome::Reset
        );
        assert_eq!(state, SessionState::Active);
    }
}
