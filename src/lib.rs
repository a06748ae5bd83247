//! FormFit: real-time exercise form analysis
//!
//! Pose landmarks → angle set → phase & score → temporal smoothing →
//! debounced feedback, with rep counting alongside.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{FormError, Result};

// =============================================================================
// SMOOTHING & CONFIRMATION
// =============================================================================

/// Raw accuracy values averaged for the displayed score
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Trailing window of raw form states used for quorum confirmation
pub const DEFAULT_STATE_QUORUM_WINDOW: usize = 10;

/// Occurrences a state needs inside the window to be confirmed
pub const DEFAULT_STATE_QUORUM_THRESHOLD: usize = 6;

// =============================================================================
// DEBOUNCE
// =============================================================================

/// Identical feedback is suppressed for this long (seconds)
pub const DEFAULT_COOLDOWN_SECS: f64 = 1.5;

// =============================================================================
// SCORING
// =============================================================================

/// Distance outside a range (degrees) at which partial credit reaches zero
pub const DEFAULT_PARTIAL_CREDIT_TOLERANCE: f64 = 30.0;

/// Flat penalty per triggered mistake rule
pub const DEFAULT_MISTAKE_PENALTY: f64 = 15.0;

/// Miss beyond a range (degrees) before a directional cue is added
pub const DEFAULT_DIRECTIONAL_MARGIN: f64 = 15.0;

/// Upper bound on feedback messages per frame
pub const DEFAULT_MAX_FEEDBACK: usize = 4;

/// Neutral accuracy reported for an unknown exercise
pub const UNKNOWN_ACCURACY: f64 = 50.0;

/// Phase name reported for an unknown exercise
pub const UNKNOWN_PHASE: &str = "UNKNOWN";

/// Raw form state when no mistake rule fires
pub const GOOD_STATE: &str = "GOOD";

// =============================================================================
// REP COUNTING
// =============================================================================

/// Angle above which BOTTOM → TOP counts a rep
pub const DEFAULT_REP_HIGH_THRESHOLD: f64 = 160.0;

/// Angle below which TOP → BOTTOM re-arms the counter
pub const DEFAULT_REP_LOW_THRESHOLD: f64 = 90.0;

// =============================================================================
// LANDMARKS
// =============================================================================

/// Landmarks below this presence are treated as missing
pub const DEFAULT_MIN_PRESENCE: f64 = 0.5;

// =============================================================================
// SPEECH
// =============================================================================

/// Pending utterances held by the speech queue
pub const DEFAULT_SPEECH_QUEUE_CAPACITY: usize = 16;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
