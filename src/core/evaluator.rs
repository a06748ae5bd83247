//! Phase & Score Evaluator
//!
//! Scores a frame's angles against every phase of an exercise with linear
//! partial credit, picks the best phase, then applies flat penalties for
//! every mistake rule that fires. Stateless: the same angles always give the
//! same result.

use tracing::debug;

use crate::config::EngineConfig;
use crate::types::{
    display_name, AngleSet, EvaluationResult, ExerciseDefinition, PhaseDefinition, PhaseScore,
};

/// Phase reported when no phase earned any credit
pub const NO_PHASE: &str = "TRANSITION";

/// Scoring parameters pulled from [`EngineConfig`]
#[derive(Debug, Clone)]
pub struct PhaseEvaluator {
    tolerance: f64,
    mistake_penalty: f64,
    max_total_penalty: Option<f64>,
    directional_margin: f64,
    max_feedback: usize,
}

impl Default for PhaseEvaluator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl PhaseEvaluator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tolerance: config.partial_credit_tolerance_degrees,
            mistake_penalty: config.mistake_penalty,
            max_total_penalty: config.max_total_penalty,
            directional_margin: config.directional_margin_degrees,
            max_feedback: config.max_feedback,
        }
    }

    /// Evaluate against a definition; `None` gives the neutral unknown result
    pub fn evaluate(
        &self,
        exercise: Option<&ExerciseDefinition>,
        angles: &AngleSet,
    ) -> EvaluationResult {
        let def = match exercise {
            Some(def) => def,
            None => return EvaluationResult::unknown(angles.clone()),
        };

        // Phase selection
        let phase_scores: Vec<PhaseScore> =
            def.phases.iter().map(|p| self.score_phase(p, angles)).collect();

        // A phase must earn some credit to be selected; strict comparison
        // keeps the earlier phase on ties
        let mut best: Option<(usize, f64)> = None;
        for (i, ps) in phase_scores.iter().enumerate() {
            if ps.score > best.map_or(0.0, |(_, score)| score) {
                best = Some((i, ps.score));
            }
        }
        let best_score = best.map_or(0.0, |(_, score)| score);
        let best_phase = best.map(|(i, _)| &def.phases[i]);

        // Mistakes
        let mut feedback = Vec::new();
        let mut triggered = Vec::new();
        for rule in &def.mistakes {
            if let Some(value) = angles.get(&rule.angle) {
                if rule.is_triggered(value) {
                    debug!(rule = %rule, value, "mistake triggered");
                    triggered.push(rule.id.clone());
                    feedback.push(rule.message.clone());
                }
            }
        }
        let mut penalty = self.mistake_penalty * triggered.len() as f64;
        if let Some(cap) = self.max_total_penalty {
            penalty = penalty.min(cap);
        }

        // Directional cues for the chosen phase
        if let Some(phase) = best_phase {
            for range in &phase.ranges {
                if let Some(value) = angles.get(&range.angle) {
                    if value < range.min - self.directional_margin {
                        feedback.push(format!("{}: extend more", display_name(&range.angle)));
                    } else if value > range.max + self.directional_margin {
                        feedback.push(format!("{}: bend more", display_name(&range.angle)));
                    }
                }
            }
        }
        feedback.truncate(self.max_feedback);

        let accuracy = (best_score - penalty).clamp(0.0, 100.0);
        let phase = best_phase.map_or_else(|| NO_PHASE.to_string(), |p| p.name.clone());

        debug!(
            exercise = %def.id,
            phase = %phase,
            accuracy,
            penalty,
            triggered = triggered.len(),
            "frame evaluated"
        );

        EvaluationResult {
            accuracy,
            feedback,
            phase,
            triggered,
            penalty,
            phase_scores,
            angles: angles.clone(),
        }
    }

    /// Mean credit over the phase's available angles, as a percentage
    fn score_phase(&self, phase: &PhaseDefinition, angles: &AngleSet) -> PhaseScore {
        let mut total = 0.0;
        let mut considered = 0;
        for range in &phase.ranges {
            if let Some(value) = angles.get(&range.angle) {
                total += self.credit(range.distance(value));
                considered += 1;
            }
        }
        let score = if considered == 0 {
            0.0
        } else {
            total / considered as f64 * 100.0
        };
        PhaseScore {
            phase: phase.name.clone(),
            score,
            considered,
        }
    }

    /// 1.0 inside the range, falling linearly to 0 at `tolerance` degrees out
    fn credit(&self, distance: f64) -> f64 {
        if distance <= 0.0 {
            1.0
        } else {
            (1.0 - distance / self.tolerance).max(0.0)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
