//! Engine tuning options, loadable from TOML
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{FormError, Result};
use crate::{
    DEFAULT_COOLDOWN_SECS, DEFAULT_DIRECTIONAL_MARGIN, DEFAULT_MAX_FEEDBACK,
    DEFAULT_MIN_PRESENCE, DEFAULT_MISTAKE_PENALTY, DEFAULT_PARTIAL_CREDIT_TOLERANCE,
    DEFAULT_REP_HIGH_THRESHOLD, DEFAULT_REP_LOW_THRESHOLD, DEFAULT_SMOOTHING_WINDOW,
    DEFAULT_SPEECH_QUEUE_CAPACITY, DEFAULT_STATE_QUORUM_THRESHOLD,
    DEFAULT_STATE_QUORUM_WINDOW,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Raw accuracy values averaged for display
    pub smoothing_window: usize,
    /// Trailing window of raw states for confirmation
    pub state_quorum_window: usize,
    /// Occurrences needed inside the window to confirm a state
    pub state_quorum_threshold: usize,
    /// Cooldown for on-screen cues (seconds)
    pub cooldown_seconds: f64,
    /// Cooldown for spoken cues (seconds)
    pub speech_cooldown_seconds: f64,
    /// Degrees outside a range at which partial credit reaches zero
    pub partial_credit_tolerance_degrees: f64,
    /// Default BOTTOM → TOP threshold
    pub rep_high_threshold_degrees: f64,
    /// Default TOP → BOTTOM threshold
    pub rep_low_threshold_degrees: f64,
    /// Points deducted per triggered mistake
    pub mistake_penalty: f64,
    /// Optional cap on the summed penalty; `None` leaves it uncapped
    pub max_total_penalty: Option<f64>,
    /// Miss (degrees) beyond a phase range before a directional cue
    pub directional_margin_degrees: f64,
    /// Feedback messages kept per frame
    pub max_feedback: usize,
    /// Pending utterances in the speech queue
    pub speech_queue_capacity: usize,
    /// Presence below which a landmark counts as missing
    pub min_presence: f64,
    /// Speak rep counts as they happen
    pub announce_reps: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            state_quorum_window: DEFAULT_STATE_QUORUM_WINDOW,
            state_quorum_threshold: DEFAULT_STATE_QUORUM_THRESHOLD,
            cooldown_seconds: DEFAULT_COOLDOWN_SECS,
            speech_cooldown_seconds: DEFAULT_COOLDOWN_SECS,
            partial_credit_tolerance_degrees: DEFAULT_PARTIAL_CREDIT_TOLERANCE,
            rep_high_threshold_degrees: DEFAULT_REP_HIGH_THRESHOLD,
            rep_low_threshold_degrees: DEFAULT_REP_LOW_THRESHOLD,
            mistake_penalty: DEFAULT_MISTAKE_PENALTY,
            max_total_penalty: None,
            directional_margin_degrees: DEFAULT_DIRECTIONAL_MARGIN,
            max_feedback: DEFAULT_MAX_FEEDBACK,
            speech_queue_capacity: DEFAULT_SPEECH_QUEUE_CAPACITY,
            min_presence: DEFAULT_MIN_PRESENCE,
            announce_reps: true,
        }
    }
}

impl EngineConfig {
    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FormError::InvalidConfig(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check the relationships between options
    pub fn validate(&self) -> Result<()> {
        if self.smoothing_window == 0 {
            return Err(invalid("smoothing_window must be at least 1"));
        }
        if self.state_quorum_window == 0 {
            return Err(invalid("state_quorum_window must be at least 1"));
        }
        if self.state_quorum_threshold == 0
            || self.state_quorum_threshold > self.state_quorum_window
        {
            return Err(invalid(format!(
                "state_quorum_threshold must be in 1..={}, got {}",
                self.state_quorum_window, self.state_quorum_threshold
            )));
        }
        if !(self.cooldown_seconds >= 0.0) || !(self.speech_cooldown_seconds >= 0.0) {
            return Err(invalid("cooldowns must be non-negative"));
        }
        if !(self.partial_credit_tolerance_degrees > 0.0) {
            return Err(invalid("partial_credit_tolerance_degrees must be positive"));
        }
        if !(self.rep_high_threshold_degrees > self.rep_low_threshold_degrees) {
            return Err(invalid(format!(
                "rep thresholds need a hysteresis band: high {} must exceed low {}",
                self.rep_high_threshold_degrees, self.rep_low_threshold_degrees
            )));
        }
        if !(self.mistake_penalty >= 0.0) {
            return Err(invalid("mistake_penalty must be non-negative"));
        }
        if let Some(cap) = self.max_total_penalty {
            if !(cap >= 0.0) {
                return Err(invalid("max_total_penalty must be non-negative"));
            }
        }
        if self.speech_queue_capacity == 0 {
            return Err(invalid("speech_queue_capacity must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> FormError {
    FormError::InvalidConfig(msg.into())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.smoothing_window, 5);
        assert_eq!(config.state_quorum_window, 10);
        assert_eq!(config.state_quorum_threshold, 6);
        assert_eq!(config.cooldown_seconds, 1.5);
        assert_eq!(config.partial_credit_tolerance_degrees, 30.0);
        assert!(config.max_total_penalty.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            "smoothing_window = 3\ncooldown_seconds = 2.0\n",
        )
        .unwrap();
        assert_eq!(config.smoothing_window, 3);
        assert_eq!(config.cooldown_seconds, 2.0);
        assert_eq!(config.state_quorum_window, 10);
    }

    #[test]
    fn test_rejects_quorum_above_window() {
        let result = EngineConfig::from_toml_str(
            "state_quorum_window = 4\nstate_quorum_threshold = 5\n",
        );
        assert!(matches!(result, Err(FormError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_collapsed_hysteresis_band() {
        let result = EngineConfig::from_toml_str(
            "rep_high_threshold_degrees = 90.0\nrep_low_threshold_degrees = 90.0\n",
        );
        assert!(matches!(result, Err(FormError::InvalidConfig(_))));
    }

    #[test]
    fn test_penalty_cap_parses() {
        let config = EngineConfig::from_toml_str("max_total_penalty = 30.0\n").unwrap();
        assert_eq!(config.max_total_penalty, Some(30.0));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "formfit_config_{}.toml",
            std::process::id()
        ));
        let mut config = EngineConfig::default();
        config.smoothing_window = 7;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(&path);
    }
}
