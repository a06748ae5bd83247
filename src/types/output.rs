//! Records emitted to renderers, speech sinks and the agent channel

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::types::FormStatus;

/// Structured feedback for one processed frame
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// Wall-clock time the record was built
    pub created_at: DateTime<Utc>,
    /// Monotonic frame timestamp supplied by the caller (seconds)
    pub timestamp: f64,
    pub exercise: String,
    /// False when no subject was in frame
    pub detected: bool,
    /// Smoothed accuracy, 0-100
    pub accuracy: f64,
    /// This frame's unsmoothed accuracy
    pub raw_accuracy: f64,
    pub phase: String,
    pub feedback: Vec<String>,
    /// Highest-priority cue that passed the on-screen debouncer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rep_count: Option<u32>,
    pub status: FormStatus,
}

impl FeedbackRecord {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        if !self.detected {
            return format!(
                "{} t={:.2}s | {}",
                "…".dimmed(),
                self.timestamp,
                "Stand in frame - full body visible".yellow()
            );
        }

        let status = match self.status {
            FormStatus::Perfect => self.status.label().green().bold(),
            FormStatus::Good => self.status.label().cyan().bold(),
            FormStatus::KeepGoing => self.status.label().yellow().bold(),
            _ => self.status.label().red().bold(),
        };
        let mut line = format!(
            "{} {:>3.0}% | phase={} | t={:.2}s",
            status,
            self.accuracy,
            self.phase,
            self.timestamp
        );
        if let Some(reps) = self.rep_count {
            line.push_str(&format!(" | reps={}", reps.to_string().bold()));
        }
        for msg in &self.feedback {
            line.push_str(&format!("\n  • {}", msg.truecolor(255, 100, 0)));
        }
        line
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        if !self.detected {
            return format!("t={:.2} | detected=false", self.timestamp);
        }
        let reps = self
            .rep_count
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "t={:.2} | accuracy={:.1} | phase={} | status={} | reps={} | feedback={}",
            self.timestamp,
            self.accuracy,
            self.phase,
            self.status,
            reps,
            self.feedback.join("; ")
        )
    }
}

/// Side effects of processing a frame or changing exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    ExerciseSelected { exercise: String, known: bool },
    StateConfirmed { state: String },
    RepCounted { count: u32 },
    Speak { text: String },
}

/// Everything one frame produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameOutcome {
    pub record: FeedbackRecord,
    pub events: Vec<EngineEvent>,
}

impl FrameOutcome {
    /// Utterances destined for the speech sink, in emission order
    pub fn utterances(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            EngineEvent::Speak { text } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn rep_counted(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, EngineEvent::RepCounted { .. }))
    }
}

/// Snapshot of a session for the voice-agent layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub exercise: String,
    pub exercise_known: bool,
    pub frames_processed: u64,
    pub accuracy: f64,
    pub phase: String,
    pub feedback: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rep_count: Option<u32>,
    /// Good form right now: detected and no mistake confirmed
    pub is_correct: bool,
}
