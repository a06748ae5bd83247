//! Named joint angles derived from one frame

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Angle names produced by the extractor
pub mod keys {
    pub const LEFT_ELBOW: &str = "left_elbow";
    pub const RIGHT_ELBOW: &str = "right_elbow";
    pub const LEFT_KNEE: &str = "left_knee";
    pub const RIGHT_KNEE: &str = "right_knee";
    pub const LEFT_HIP: &str = "left_hip";
    pub const RIGHT_HIP: &str = "right_hip";
    pub const LEFT_ARM_RAISE: &str = "left_arm_raise";
    pub const RIGHT_ARM_RAISE: &str = "right_arm_raise";
    pub const LEFT_FOREARM_TILT: &str = "left_forearm_tilt";
    pub const RIGHT_FOREARM_TILT: &str = "right_forearm_tilt";
    pub const MAX_FOREARM_TILT: &str = "max_forearm_tilt";
    pub const BACK: &str = "back";

    /// Bilateral joints that get `avg_*`, `min_*` and `*_diff` values
    pub const BILATERAL: [&str; 4] = ["elbow", "knee", "hip", "arm_raise"];
}

/// Mapping from angle name to degrees in [0, 180]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AngleSet {
    angles: BTreeMap<String, f64>,
}

impl AngleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from literal pairs, without derived values
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let mut set = Self::new();
        for (name, value) in pairs {
            set.insert(name, value);
        }
        set
    }

    /// Insert or replace an angle
    pub fn insert(&mut self, name: impl Into<String>, degrees: f64) {
        self.angles.insert(name.into(), degrees);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.angles.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.angles.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// Angles in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.angles.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Add `avg_*`, `min_*` and `*_diff` for every bilateral joint with both
    /// sides present, plus `max_forearm_tilt`
    pub fn derive_bilateral(&mut self) {
        for joint in keys::BILATERAL {
            let left = self.get(&format!("left_{}", joint));
            let right = self.get(&format!("right_{}", joint));
            if let (Some(l), Some(r)) = (left, right) {
                self.insert(format!("avg_{}", joint), (l + r) / 2.0);
                self.insert(format!("min_{}", joint), l.min(r));
                self.insert(format!("{}_diff", joint), (l - r).abs());
            }
        }

        let tilts = [
            self.get(keys::LEFT_FOREARM_TILT),
            self.get(keys::RIGHT_FOREARM_TILT),
        ];
        if let Some(max) = tilts.iter().flatten().copied().reduce(f64::max) {
            self.insert(keys::MAX_FOREARM_TILT, max);
        }
    }

    /// Builder form of [`derive_bilateral`](Self::derive_bilateral)
    pub fn with_derived(mut self) -> Self {
        self.derive_bilateral();
        self
    }
}

/// Render an angle key for people: `left_elbow` → `Left Elbow`
pub fn display_name(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// TESTS
// =============================================================================
