//! Core modules for FormFit

pub mod geometry;
pub mod extractor;
pub mod catalog;
pub mod evaluator;
pub mod stabilizer;
pub mod debounce;
pub mod reps;
pub mod engine;
pub mod speech;
pub mod api;

pub use geometry::{angle_at, midpoint, tilt_from_vertical};
pub use extractor::LandmarkExtractor;
pub use catalog::ExerciseCatalog;
pub use evaluator::{PhaseEvaluator, NO_PHASE};
pub use stabilizer::{ScoreSmoother, Stabilized, StateConfirmer, TemporalStabilizer};
pub use debounce::{prioritize, FeedbackDebouncer};
pub use reps::{announcement, RepCounter};
pub use engine::AnalysisEngine;
pub use speech::{CommandSpeechSink, DrainPolicy, LogSpeechSink, SpeechQueue, SpeechSink, SpeechStats};
pub use api::{create_router, router_with_state, run_server, AppState};
