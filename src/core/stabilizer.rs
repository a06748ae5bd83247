//! Temporal Stabilizer
//!
//! Two trailing windows per session:
//! - raw accuracy values, averaged for display
//! - raw discrete states, confirmed only by quorum once the window is full

use std::collections::{HashMap, VecDeque};

use crate::config::EngineConfig;

/// Sliding-window mean of raw accuracy values
#[derive(Debug, Clone)]
pub struct ScoreSmoother {
    values: VecDeque<f64>,
    capacity: usize,
}

impl ScoreSmoother {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a raw value and return the mean of the window
    pub fn push(&mut self, value: f64) -> f64 {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Current mean, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Quorum confirmation of discrete states
#[derive(Debug, Clone)]
pub struct StateConfirmer {
    history: VecDeque<String>,
    capacity: usize,
    quorum: usize,
    confirmed: Option<String>,
}

impl StateConfirmer {
    pub fn new(capacity: usize, quorum: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            quorum: quorum.clamp(1, capacity),
            confirmed: None,
        }
    }

    /// Record a raw state. Returns the newly confirmed state when it differs
    /// from the previous confirmation.
    pub fn push(&mut self, state: impl Into<String>) -> Option<String> {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(state.into());

        let dominant = self.dominant()?;
        if self.confirmed.as_deref() == Some(dominant.as_str()) {
            return None;
        }
        self.confirmed = Some(dominant.clone());
        Some(dominant)
    }

    /// Unique most frequent state with at least `quorum` occurrences in a full
    /// window
    fn dominant(&self) -> Option<String> {
        if self.history.len() < self.capacity {
            return None;
        }
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for state in &self.history {
            *counts.entry(state.as_str()).or_insert(0) += 1;
        }
        let top = counts.values().copied().max()?;
        if top < self.quorum {
            return None;
        }
        let mut leaders = counts.iter().filter(|(_, count)| **count == top);
        let (state, _) = leaders.next()?;
        if leaders.next().is_some() {
            return None;
        }
        Some(state.to_string())
    }

    /// Last confirmed state, kept across window clears
    pub fn confirmed(&self) -> Option<&str> {
        self.confirmed.as_deref()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Drop the window, keep the confirmation
    pub fn clear_window(&mut self) {
        self.history.clear();
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.confirmed = None;
    }
}

/// Smoothed view of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Stabilized {
    pub accuracy: f64,
    /// Set only on the frame a different state gets confirmed
    pub changed_to: Option<String>,
}

/// Score smoothing and state confirmation for a session
#[derive(Debug, Clone)]
pub struct TemporalStabilizer {
    scores: ScoreSmoother,
    states: StateConfirmer,
}

impl Default for TemporalStabilizer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl TemporalStabilizer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scores: ScoreSmoother::new(config.smoothing_window),
            states: StateConfirmer::new(config.state_quorum_window, config.state_quorum_threshold),
        }
    }

    pub fn update(&mut self, raw_accuracy: f64, raw_state: &str) -> Stabilized {
        Stabilized {
            accuracy: self.scores.push(raw_accuracy),
            changed_to: self.states.push(raw_state),
        }
    }

    pub fn confirmed(&self) -> Option<&str> {
        self.states.confirmed()
    }

    pub fn smoothed(&self) -> Option<f64> {
        self.scores.mean()
    }

    /// Subject lost: empty both windows
    pub fn clear_windows(&mut self) {
        self.scores.clear();
        self.states.clear_window();
    }

    /// Fresh start for a new exercise
    pub fn reset(&mut self) {
        self.scores.clear();
        self.states.reset();
    }
}

// =============================================================================
// TESTS
// =============================================================================
