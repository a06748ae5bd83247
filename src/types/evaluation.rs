//! Per-frame evaluation result

use serde::{Deserialize, Serialize};

use crate::types::AngleSet;
use crate::{UNKNOWN_ACCURACY, UNKNOWN_PHASE};

/// Score of a single phase against the frame's angles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseScore {
    pub phase: String,
    /// 0-100, or 0 when none of the phase's angles were available
    pub score: f64,
    /// How many of the phase's angles were present in the frame
    pub considered: usize,
}

/// Outcome of evaluating one frame against one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Clamped 0-100 after penalties
    pub accuracy: f64,
    /// Mistake messages first, then directional cues
    pub feedback: Vec<String>,
    pub phase: String,
    /// Ids of the mistake rules that fired, in rule order
    pub triggered: Vec<String>,
    /// Total deduction applied
    pub penalty: f64,
    pub phase_scores: Vec<PhaseScore>,
    pub angles: AngleSet,
}

impl EvaluationResult {
    /// Neutral result for an exercise id missing from the catalog
    pub fn unknown(angles: AngleSet) -> Self {
        Self {
            accuracy: UNKNOWN_ACCURACY,
            feedback: Vec::new(),
            phase: UNKNOWN_PHASE.to_string(),
            triggered: Vec::new(),
            penalty: 0.0,
            phase_scores: Vec::new(),
            angles,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.phase == UNKNOWN_PHASE
    }

    /// `(accuracy, feedback, phase)` triple
    pub fn summary(&self) -> (f64, &[String], &str) {
        (self.accuracy, &self.feedback, &self.phase)
    }
}
