//! Feedback Debouncer
//!
//! One instance per output channel. Time is whatever monotonic seconds the
//! caller supplies with each frame.

/// Rate limiter for repeated identical messages
#[derive(Debug, Clone)]
pub struct FeedbackDebouncer {
    cooldown: f64,
    last: Option<String>,
    last_time: f64,
}

impl FeedbackDebouncer {
    pub fn new(cooldown_secs: f64) -> Self {
        Self {
            cooldown: cooldown_secs,
            last: None,
            last_time: 0.0,
        }
    }

    /// Emit `message` unless it repeats the last emission within the cooldown
    pub fn maybe_emit(&mut self, message: &str, now: f64) -> Option<String> {
        let repeat = self.last.as_deref() == Some(message);
        if repeat && now - self.last_time <= self.cooldown {
            return None;
        }
        self.last = Some(message.to_string());
        self.last_time = now;
        Some(message.to_string())
    }

    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.last_time = 0.0;
    }
}

/// Pick the single message to offer the debouncer: the first entry of
/// `priority` present among `candidates`, otherwise the first candidate
pub fn prioritize<'a>(candidates: &'a [String], priority: &[&str]) -> Option<&'a str> {
    priority
        .iter()
        .find_map(|p| candidates.iter().find(|c| c.as_str() == *p))
        .or_else(|| candidates.first())
        .map(String::as_str)
}

// =============================================================================
// TESTS
// =============================================================================
