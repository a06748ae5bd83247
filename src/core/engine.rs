//! Analysis Engine: one session's pipeline
//!
//! Per frame, strictly in order:
//! extract angles → evaluate → stabilize → debounce → rep-count
//!
//! The engine owns every piece of mutable session state and performs no I/O.
//! Utterances come back as [`EngineEvent::Speak`] for the caller to hand to a
//! speech queue.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::core::catalog::ExerciseCatalog;
use crate::core::debounce::{prioritize, FeedbackDebouncer};
use crate::core::evaluator::PhaseEvaluator;
use crate::core::extractor::LandmarkExtractor;
use crate::core::reps::{announcement, RepCounter};
use crate::core::stabilizer::TemporalStabilizer;
use crate::types::{
    AngleSet, EngineEvent, EvaluationResult, ExerciseDefinition, FeedbackRecord, FormStatus,
    FrameOutcome, LandmarkFrame, SessionSummary,
};
use crate::GOOD_STATE;

/// Pose-to-feedback pipeline for a single session
#[derive(Debug)]
pub struct AnalysisEngine {
    config: EngineConfig,
    catalog: Arc<ExerciseCatalog>,
    extractor: LandmarkExtractor,
    evaluator: PhaseEvaluator,
    stabilizer: TemporalStabilizer,
    /// On-screen cue channel
    visual: FeedbackDebouncer,
    /// Spoken cue channel
    speech: FeedbackDebouncer,
    reps: Option<RepCounter>,
    /// Selected id, or the raw name when it did not resolve
    exercise: String,
    known: bool,
    frames_processed: u64,
    last_result: Option<EvaluationResult>,
    last_accuracy: f64,
    last_detected: bool,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default(), Arc::new(ExerciseCatalog::builtin()))
    }
}

impl AnalysisEngine {
    /// Engine with no exercise selected; frames evaluate as unknown until
    /// [`select_exercise`](Self::select_exercise) is called
    pub fn new(config: EngineConfig, catalog: Arc<ExerciseCatalog>) -> Self {
        Self {
            extractor: LandmarkExtractor::new(config.min_presence),
            evaluator: PhaseEvaluator::new(&config),
            stabilizer: TemporalStabilizer::new(&config),
            visual: FeedbackDebouncer::new(config.cooldown_seconds),
            speech: FeedbackDebouncer::new(config.speech_cooldown_seconds),
            reps: None,
            exercise: String::new(),
            known: false,
            frames_processed: 0,
            last_result: None,
            last_accuracy: 0.0,
            last_detected: false,
            config,
            catalog,
        }
    }

    // =========================================================================
    // EXERCISE SELECTION
    // =========================================================================

    /// Switch exercise by id or alias.
    ///
    /// A known exercise resets all session state and queues a start
    /// utterance. An unknown name is kept as the active exercise (frames then
    /// evaluate to the neutral result) without touching the windows.
    pub fn select_exercise(&mut self, name: &str) -> Vec<EngineEvent> {
        let resolved = self.catalog.resolve(name).cloned();
        let def = match resolved {
            Some(def) => def,
            None => {
                info!(exercise = %name, "unknown exercise selected");
                self.exercise = name.trim().to_string();
                self.known = false;
                self.reps = None;
                return vec![EngineEvent::ExerciseSelected {
                    exercise: self.exercise.clone(),
                    known: false,
                }];
            }
        };

        self.exercise = def.id.clone();
        self.known = true;
        self.reset();
        info!(exercise = %def.id, counts_reps = self.reps.is_some(), "exercise selected");

        vec![
            EngineEvent::ExerciseSelected {
                exercise: def.id.clone(),
                known: true,
            },
            EngineEvent::Speak {
                text: start_utterance(&def),
            },
        ]
    }

    /// Clear windows, debouncers and the rep counter for the current exercise
    pub fn reset(&mut self) {
        self.stabilizer.reset();
        self.visual.reset();
        self.speech.reset();
        self.reps = match self.definition().and_then(|def| def.reps.as_ref()) {
            Some(spec) => match RepCounter::from_spec(spec, &self.config) {
                Ok(counter) => Some(counter),
                Err(e) => {
                    warn!(exercise = %self.exercise, error = %e, "rep counting disabled");
                    None
                }
            },
            None => None,
        };
        self.frames_processed = 0;
        self.last_result = None;
        self.last_accuracy = 0.0;
        self.last_detected = false;
    }

    // =========================================================================
    // FRAME PROCESSING
    // =========================================================================

    /// Process one detector frame; `None` means nobody was detected
    pub fn process_frame(&mut self, frame: Option<&LandmarkFrame>, timestamp: f64) -> FrameOutcome {
        let angles = match frame {
            Some(frame) => self.extractor.extract(frame),
            None => AngleSet::new(),
        };
        self.process_angles(angles, timestamp)
    }

    /// Process a precomputed angle set; an empty set counts as no subject
    pub fn process_angles(&mut self, angles: AngleSet, timestamp: f64) -> FrameOutcome {
        self.frames_processed += 1;
        if angles.is_empty() {
            return self.no_subject(timestamp);
        }

        let mut events = Vec::new();
        let definition = self.catalog.get(&self.exercise).filter(|_| self.known);
        let result = self.evaluator.evaluate(definition, &angles);

        // Stabilize
        let raw_state = result
            .triggered
            .first()
            .map(String::as_str)
            .unwrap_or(GOOD_STATE);
        let stable = self.stabilizer.update(result.accuracy, raw_state);

        // Spoken channel: only on a confirmed change. Consecutive confirmed
        // states always differ, so the speech debouncer only suppresses when
        // two of them share a phrase (rules with the same voice line).
        if let Some(state) = stable.changed_to {
            debug!(state = %state, "state confirmed");
            let spoken = definition.and_then(|def| spoken_for_state(def, &state));
            events.push(EngineEvent::StateConfirmed { state });
            if let Some(text) = spoken.and_then(|t| self.speech.maybe_emit(&t, timestamp)) {
                events.push(EngineEvent::Speak { text });
            }
        }

        // On-screen channel: highest-priority message this frame
        let priority = definition.map(|d| d.feedback_priority()).unwrap_or_default();
        let cue = prioritize(&result.feedback, &priority)
            .and_then(|msg| self.visual.maybe_emit(msg, timestamp));

        // Reps
        if let Some(counter) = self.reps.as_mut() {
            if let Some(value) = angles.get(counter.angle()) {
                if counter.update(value) {
                    let count = counter.count();
                    info!(exercise = %self.exercise, count, "rep counted");
                    events.push(EngineEvent::RepCounted { count });
                    if self.config.announce_reps {
                        events.push(EngineEvent::Speak {
                            text: announcement(count),
                        });
                    }
                }
            }
        }

        let record = FeedbackRecord {
            created_at: Utc::now(),
            timestamp,
            exercise: self.exercise.clone(),
            detected: true,
            accuracy: stable.accuracy,
            raw_accuracy: result.accuracy,
            phase: result.phase.clone(),
            feedback: result.feedback.clone(),
            cue,
            confirmed_state: self.stabilizer.confirmed().map(str::to_string),
            rep_count: self.rep_count(),
            status: FormStatus::from_accuracy(stable.accuracy),
        };

        self.last_accuracy = stable.accuracy;
        self.last_detected = true;
        self.last_result = Some(result);

        FrameOutcome { record, events }
    }

    fn no_subject(&mut self, timestamp: f64) -> FrameOutcome {
        if self.last_detected {
            debug!(timestamp, "subject lost");
        }
        self.stabilizer.clear_windows();
        self.last_detected = false;

        let record = FeedbackRecord {
            created_at: Utc::now(),
            timestamp,
            exercise: self.exercise.clone(),
            detected: false,
            accuracy: 0.0,
            raw_accuracy: 0.0,
            phase: String::new(),
            feedback: Vec::new(),
            cue: None,
            confirmed_state: self.stabilizer.confirmed().map(str::to_string),
            rep_count: self.rep_count(),
            status: FormStatus::NoSubject,
        };
        FrameOutcome {
            record,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    /// Closing utterance for the current exercise
    pub fn end_session(&self) -> Vec<EngineEvent> {
        let def = match self.definition() {
            Some(def) => def,
            None => return Vec::new(),
        };
        let text = match self.rep_count() {
            Some(reps) => format!("Great workout! You did {} reps of {}.", reps, def.name),
            None => format!("Great workout! {} complete.", def.name),
        };
        info!(exercise = %def.id, reps = ?self.rep_count(), "session ended");
        vec![EngineEvent::Speak { text }]
    }

    /// Snapshot for the agent channel
    pub fn summary(&self) -> SessionSummary {
        let confirmed = self.stabilizer.confirmed().map(str::to_string);
        let (phase, feedback) = match (&self.last_result, self.last_detected) {
            (Some(r), true) => (r.phase.clone(), r.feedback.clone()),
            _ => (String::new(), Vec::new()),
        };
        SessionSummary {
            exercise: self.exercise.clone(),
            exercise_known: self.known,
            frames_processed: self.frames_processed,
            accuracy: self.last_accuracy,
            phase,
            feedback,
            is_correct: self.last_detected
                && confirmed.as_deref().map_or(true, |s| s == GOOD_STATE),
            confirmed_state: confirmed,
            rep_count: self.rep_count(),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn exercise(&self) -> &str {
        &self.exercise
    }

    pub fn is_known(&self) -> bool {
        self.known
    }

    pub fn definition(&self) -> Option<&ExerciseDefinition> {
        if self.known {
            self.catalog.get(&self.exercise)
        } else {
            None
        }
    }

    pub fn rep_count(&self) -> Option<u32> {
        self.reps.as_ref().map(RepCounter::count)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ExerciseCatalog {
        &self.catalog
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}

/// "Starting Squat. <first instruction>"
fn start_utterance(def: &ExerciseDefinition) -> String {
    match def.instructions.first() {
        Some(first) => format!("Starting {}. {}", def.name, first),
        None => format!("Starting {}.", def.name),
    }
}

fn spoken_for_state(def: &ExerciseDefinition, state: &str) -> Option<String> {
    if state == GOOD_STATE {
        Some(def.good_cue.clone())
    } else {
        def.mistake(state).map(|rule| rule.spoken().to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
