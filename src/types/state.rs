//! Discrete states reported by the engine

use serde::{Deserialize, Serialize};

/// Side of the rep counter's hysteresis band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepPhase {
    /// Dipped below the low threshold; the next rise past high counts
    Bottom,
    /// Past the high threshold, or the initial state
    Top,
}

impl std::fmt::Display for RepPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RepPhase::Bottom => "BOTTOM",
            RepPhase::Top => "TOP",
        };
        write!(f, "{}", name)
    }
}

/// Coarse label for the smoothed accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormStatus {
    /// ≥ 85
    Perfect,
    /// ≥ 70
    Good,
    /// ≥ 50
    KeepGoing,
    /// below 50
    AdjustForm,
    /// Nobody in frame
    NoSubject,
}

impl FormStatus {
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 85.0 {
            FormStatus::Perfect
        } else if accuracy >= 70.0 {
            FormStatus::Good
        } else if accuracy >= 50.0 {
            FormStatus::KeepGoing
        } else {
            FormStatus::AdjustForm
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormStatus::Perfect => "PERFECT!",
            FormStatus::Good => "GOOD",
            FormStatus::KeepGoing => "KEEP GOING",
            FormStatus::AdjustForm => "ADJUST FORM",
            FormStatus::NoSubject => "NO SUBJECT",
        }
    }
}

impl std::fmt::Display for FormStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// TESTS
// =============================================================================
