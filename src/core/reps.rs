//! Rep Counter: two-state hysteresis over one representative angle
//!
//! BOTTOM → TOP when the angle rises above `high` (counts a rep),
//! TOP → BOTTOM when it falls below `low`. The counter starts in TOP, so
//! the first rep needs a full dip below `low` and back up.

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{FormError, Result};
use crate::types::{RepCounterSpec, RepPhase};

#[derive(Debug, Clone)]
pub struct RepCounter {
    angle: String,
    high: f64,
    low: f64,
    phase: RepPhase,
    count: u32,
}

impl RepCounter {
    pub fn new(angle: impl Into<String>, high: f64, low: f64) -> Self {
        Self {
            angle: angle.into(),
            high,
            low,
            phase: RepPhase::Top,
            count: 0,
        }
    }

    /// Counter for an exercise, filling missing thresholds from config.
    /// Fails when the resulting band is empty or inverted.
    pub fn from_spec(spec: &RepCounterSpec, config: &EngineConfig) -> Result<Self> {
        let (high, low) = spec.thresholds(config);
        if !(high > low) {
            return Err(FormError::InvalidCatalog(format!(
                "rep thresholds on '{}' need high {} above low {}",
                spec.angle, high, low
            )));
        }
        Ok(Self::new(spec.angle.clone(), high, low))
    }

    /// Feed one angle sample; true when a rep was counted
    pub fn update(&mut self, value: f64) -> bool {
        match self.phase {
            RepPhase::Bottom if value > self.high => {
                self.phase = RepPhase::Top;
                self.count += 1;
                debug!(angle = %self.angle, value, count = self.count, "rep counted");
                true
            }
            RepPhase::Top if value < self.low => {
                self.phase = RepPhase::Bottom;
                false
            }
            _ => false,
        }
    }

    /// Angle key this counter follows
    pub fn angle(&self) -> &str {
        &self.angle
    }

    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn thresholds(&self) -> (f64, f64) {
        (self.high, self.low)
    }

    pub fn reset(&mut self) {
        self.phase = RepPhase::Top;
        self.count = 0;
    }
}

/// Spoken form of a rep count
pub fn announcement(count: u32) -> String {
    match count {
        1 => "One!".to_string(),
        5 => "Five! Great job!".to_string(),
        10 => "Ten! You're on fire!".to_string(),
        n if n % 5 == 0 => format!("{}!", n),
        n => n.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
