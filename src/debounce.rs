//! Typing-presence debouncing
//!
//! The protocol has no "stopped typing" frame: a sender pings at most once
//! per burst and goes silent, and receivers expire the indicator on their
//! own. Both halves live here.

use std::time::{Duration, Instant};

/// Trailing idle window after which a keystroke burst ends.
pub const TYPING_DEBOUNCE_WINDOW: Duration = Duration::from_millis(2000);

/// How long a peer's typing indicator stays alive without a repeated ping.
///
/// Slightly longer than the sender's debounce window so an indicator does
/// not flicker between re-pings.
pub const TYPING_INDICATOR_TTL: Duration = Duration::from_millis(3000);

/// Sender-side keystroke debouncer
///
/// Two states, `Idle` and `Active`, represented by the trailing deadline.
/// A ping is emitted only on the `Idle -> Active` edge; the `Active -> Idle`
/// transition is the window elapsing and emits nothing.
#[derive(Debug, Default)]
pub struct TypingDebouncer {
    deadline: Option<Instant>,
}

impl TypingDebouncer {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Record a local keystroke at `now`
    ///
    /// Returns `true` when a typing ping should be sent: only on the first
    /// keystroke of a burst. Every keystroke restarts the trailing window.
    pub fn press(&mut self, now: Instant) -> bool {
        let was_idle = match self.deadline {
            None => true,
            Some(deadline) => now >= deadline,
        };
        self.deadline = Some(now + TYPING_DEBOUNCE_WINDOW);
        was_idle
    }

    /// Whether a burst is still in progress at `now`
    pub fn is_typing(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now < deadline)
    }

    /// Force the machine back to `Idle` without emitting anything
    pub fn reset(&mut self) {
        self.deadline = None;
    }
}

/// Receiver-side typing indicator
///
/// Tracks the most recent peer ping. At most one indicator is shown at a
/// time; it expires locally after [`TYPING_INDICATOR_TTL`] and is cleared
/// outright when a chat message arrives or the room changes.
#[derive(Debug, Default)]
pub struct PeerTyping {
    observed: Option<(String, Instant)>,
}

impl PeerTyping {
    pub fn new() -> Self {
        Self { observed: None }
    }

    /// Record a typing ping from `username` at `now`
    pub fn observe(&mut self, username: String, now: Instant) {
        self.observed = Some((username, now));
    }

    /// The peer currently typing, if the indicator has not expired
    pub fn current(&self, now: Instant) -> Option<&str> {
        match &self.observed {
            Some((username, seen)) if now.duration_since(*seen) < TYPING_INDICATOR_TTL => {
                Some(username)
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.observed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_press_pings() {
        let mut debouncer = TypingDebouncer::new();
        let now = Instant::now();
        assert!(debouncer.press(now));
        assert!(debouncer.is_typing(now));
    }

    #[test]
    fn test_burst_collapses_to_one_ping() {
        let mut debouncer = TypingDebouncer::new();
        let start = Instant::now();

        let mut pings = 0;
        for i in 0..10 {
            // Keystrokes every 500ms, all inside the trailing window.
            if debouncer.press(start + Duration::from_millis(i * 500)) {
                pings += 1;
            }
        }
        assert_eq!(pings, 1);
    }

    #[test]
    fn test_spaced_presses_ping_each() {
        let mut debouncer = TypingDebouncer::new();
        let start = Instant::now();

        let mut pings = 0;
        for i in 0..4 {
            if debouncer.press(start + TYPING_DEBOUNCE_WINDOW * i) {
                pings += 1;
            }
        }
        assert_eq!(pings, 4);
    }

    #[test]
    fn test_window_elapses_to_idle() {
        let mut debouncer = TypingDebouncer::new();
        let start = Instant::now();
        debouncer.press(start);

        assert!(debouncer.is_typing(start + Duration::from_millis(1999)));
        assert!(!debouncer.is_typing(start + TYPING_DEBOUNCE_WINDOW));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut debouncer = TypingDebouncer::new();
        let now = Instant::now();
        debouncer.press(now);
        debouncer.reset();

        assert!(!debouncer.is_typing(now));
        // The next keystroke starts a fresh burst.
        assert!(debouncer.press(now + Duration::from_millis(1)));
    }

    #[test]
    fn test_peer_indicator_expires() {
        let mut peer = PeerTyping::new();
        let start = Instant::now();
        peer.observe("bob".to_string(), start);

        assert_eq!(peer.current(start + Duration::from_millis(2999)), Some("bob"));
        assert_eq!(peer.current(start + TYPING_INDICATOR_TTL), None);
    }

    #[test]
    fn test_peer_indicator_replaced_and_cleared() {
        let mut peer = PeerTyping::new();
        let now = Instant::now();
        peer.observe("bob".to_string(), now);
        peer.observe("carol".to_string(), now + Duration::from_millis(100));
        assert_eq!(peer.current(now + Duration::from_millis(200)), Some("carol"));

        peer.clear();
        assert_eq!(peer.current(now + Duration::from_millis(300)), None);
    }
}
