//! Declarative exercise definitions
//!
//! Phases, mistake rules and rep counting are pure data; nothing in the
//! engine branches on which exercise is active.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngineConfig;

/// Comparison used by a mistake rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
}

impl Comparison {
    /// Does `value <op> threshold` hold?
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::LessThan => value < threshold,
            Comparison::GreaterThan => value > threshold,
        }
    }

    /// Operator as written in catalog files
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::LessThan => "<",
            Comparison::GreaterThan => ">",
        }
    }
}

/// Inclusive acceptable range for one angle within a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub angle: String,
    pub min: f64,
    pub max: f64,
}

impl AngleRange {
    pub fn new(angle: impl Into<String>, min: f64, max: f64) -> Self {
        Self { angle: angle.into(), min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Degrees outside the range, 0 when inside
    pub fn distance(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// A named pose within the movement cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub ranges: Vec<AngleRange>,
}

impl PhaseDefinition {
    pub fn new(name: impl Into<String>, ranges: Vec<AngleRange>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            ranges,
        }
    }
}

/// Threshold condition on one angle, independent of phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeRule {
    pub id: String,
    pub angle: String,
    pub op: Comparison,
    pub threshold: f64,
    /// On-screen message
    pub message: String,
    /// Spoken phrasing; falls back to `message`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl MistakeRule {
    pub fn new(
        id: impl Into<String>,
        angle: impl Into<String>,
        op: Comparison,
        threshold: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            angle: angle.into(),
            op,
            threshold,
            message: message.into(),
            voice: None,
        }
    }

    /// Whether the rule fires for `value`
    pub fn is_triggered(&self, value: f64) -> bool {
        self.op.holds(value, self.threshold)
    }

    /// What to say out loud when this rule is the confirmed state
    pub fn spoken(&self) -> &str {
        self.voice.as_deref().unwrap_or(&self.message)
    }
}

impl fmt::Display for MistakeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {} {}", self.id, self.angle, self.op.symbol(), self.threshold)
    }
}

/// Which angle drives rep counting, with optional threshold overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepCounterSpec {
    pub angle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
}

impl RepCounterSpec {
    /// `(high, low)` with missing overrides taken from the config defaults
    pub fn thresholds(&self, config: &EngineConfig) -> (f64, f64) {
        (
            self.high.unwrap_or(config.rep_high_threshold_degrees),
            self.low.unwrap_or(config.rep_low_threshold_degrees),
        )
    }
}

fn default_good_cue() -> String {
    "Good rep".to_string()
}

/// Everything the engine knows about one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub target: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub camera_position: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    /// Spoken when form is confirmed good
    #[serde(default = "default_good_cue")]
    pub good_cue: String,
    /// Phases in priority order; ties go to the earlier phase
    #[serde(rename = "phase")]
    pub phases: Vec<PhaseDefinition>,
    /// Mistake rules in priority order; earlier rules win the single cue slot
    #[serde(default, rename = "mistake")]
    pub mistakes: Vec<MistakeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<RepCounterSpec>,
}

impl ExerciseDefinition {
    /// Minimal definition with only phases
    pub fn new(id: impl Into<String>, name: impl Into<String>, phases: Vec<PhaseDefinition>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            difficulty: String::new(),
            target: Vec::new(),
            description: String::new(),
            camera_position: String::new(),
            aliases: Vec::new(),
            instructions: Vec::new(),
            tips: Vec::new(),
            good_cue: default_good_cue(),
            phases,
            mistakes: Vec::new(),
            reps: None,
        }
    }

    pub fn with_mistakes(mut self, mistakes: Vec<MistakeRule>) -> Self {
        self.mistakes = mistakes;
        self
    }

    pub fn with_reps(mut self, reps: RepCounterSpec) -> Self {
        self.reps = Some(reps);
        self
    }

    pub fn mistake(&self, id: &str) -> Option<&MistakeRule> {
        self.mistakes.iter().find(|m| m.id == id)
    }

    /// Message texts in rule order, used to rank simultaneous cues
    pub fn feedback_priority(&self) -> Vec<&str> {
        self.mistakes.iter().map(|m| m.message.as_str()).collect()
    }
}

/// Listing entry for clients choosing an exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub difficulty: String,
    pub target: Vec<String>,
    pub camera_position: String,
    pub counts_reps: bool,
}

impl From<&ExerciseDefinition> for ExerciseSummary {
    fn from(def: &ExerciseDefinition) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            category: def.category.clone(),
            difficulty: def.difficulty.clone(),
            target: def.target.clone(),
            camera_position: def.camera_position.clone(),
            counts_reps: def.reps.is_some(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
