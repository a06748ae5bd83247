//! Landmark Extractor: frame → named angle set
//!
//! Every angle is computed independently, so a frame with missing or hidden
//! landmarks still yields whatever angles its visible points allow.

use tracing::debug;

use crate::core::geometry::{angle_at, midpoint, tilt_from_vertical};
use crate::types::{index, keys, AngleSet, LandmarkFrame};
use crate::DEFAULT_MIN_PRESENCE;

/// Three-point joint angles: (key, first, vertex, second)
const JOINT_ANGLES: [(&str, usize, usize, usize); 8] = [
    (keys::LEFT_ELBOW, index::LEFT_SHOULDER, index::LEFT_ELBOW, index::LEFT_WRIST),
    (keys::RIGHT_ELBOW, index::RIGHT_SHOULDER, index::RIGHT_ELBOW, index::RIGHT_WRIST),
    (keys::LEFT_KNEE, index::LEFT_HIP, index::LEFT_KNEE, index::LEFT_ANKLE),
    (keys::RIGHT_KNEE, index::RIGHT_HIP, index::RIGHT_KNEE, index::RIGHT_ANKLE),
    (keys::LEFT_HIP, index::LEFT_SHOULDER, index::LEFT_HIP, index::LEFT_KNEE),
    (keys::RIGHT_HIP, index::RIGHT_SHOULDER, index::RIGHT_HIP, index::RIGHT_KNEE),
    (keys::LEFT_ARM_RAISE, index::LEFT_HIP, index::LEFT_SHOULDER, index::LEFT_ELBOW),
    (keys::RIGHT_ARM_RAISE, index::RIGHT_HIP, index::RIGHT_SHOULDER, index::RIGHT_ELBOW),
];

/// Forearm tilt from vertical: (key, elbow, wrist)
const FOREARM_TILTS: [(&str, usize, usize); 2] = [
    (keys::LEFT_FOREARM_TILT, index::LEFT_ELBOW, index::LEFT_WRIST),
    (keys::RIGHT_FOREARM_TILT, index::RIGHT_ELBOW, index::RIGHT_WRIST),
];

/// Derives the per-frame angle set
#[derive(Debug, Clone)]
pub struct LandmarkExtractor {
    min_presence: f64,
}

impl Default for LandmarkExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PRESENCE)
    }
}

impl LandmarkExtractor {
    pub fn new(min_presence: f64) -> Self {
        Self { min_presence }
    }

    /// Compute every angle the frame supports, plus bilateral averages,
    /// minimums and differences
    pub fn extract(&self, frame: &LandmarkFrame) -> AngleSet {
        let mut angles = AngleSet::new();

        for (key, a, vertex, b) in JOINT_ANGLES {
            if let (Some(a), Some(v), Some(b)) =
                (self.point(frame, a), self.point(frame, vertex), self.point(frame, b))
            {
                angles.insert(key, angle_at(a, v, b));
            }
        }

        for (key, elbow, wrist) in FOREARM_TILTS {
            if let (Some(e), Some(w)) = (self.point(frame, elbow), self.point(frame, wrist)) {
                angles.insert(key, tilt_from_vertical(e, w));
            }
        }

        if let Some(back) = self.back_angle(frame) {
            angles.insert(keys::BACK, back);
        }

        angles.derive_bilateral();

        debug!(count = angles.len(), landmarks = frame.len(), "angles extracted");
        angles
    }

    /// Torso alignment from shoulder, hip and knee midpoints
    fn back_angle(&self, frame: &LandmarkFrame) -> Option<f64> {
        let shoulders = self.midpoint(frame, index::LEFT_SHOULDER, index::RIGHT_SHOULDER)?;
        let hips = self.midpoint(frame, index::LEFT_HIP, index::RIGHT_HIP)?;
        let knees = self.midpoint(frame, index::LEFT_KNEE, index::RIGHT_KNEE)?;
        Some(angle_at(shoulders, hips, knees))
    }

    fn midpoint(&self, frame: &LandmarkFrame, left: usize, right: usize) -> Option<(f64, f64)> {
        Some(midpoint(self.point(frame, left)?, self.point(frame, right)?))
    }

    fn point(&self, frame: &LandmarkFrame, idx: usize) -> Option<(f64, f64)> {
        frame
            .get(idx)
            .filter(|lm| lm.is_present(self.min_presence))
            .map(|lm| lm.point())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{index::POSE_LANDMARK_COUNT, Landmark};

    /// Upright figure, arms hanging straight down, legs straight
    fn standing_frame() -> LandmarkFrame {
        let mut frame = LandmarkFrame::new(vec![Landmark::new(0.5, 0.1); POSE_LANDMARK_COUNT]);
        frame.set(index::LEFT_SHOULDER, Landmark::new(0.4, 0.3));
        frame.set(index::RIGHT_SHOULDER, Landmark::new(0.6, 0.3));
        frame.set(index::LEFT_ELBOW, Landmark::new(0.4, 0.45));
        frame.set(index::RIGHT_ELBOW, Landmark::new(0.6, 0.45));
        frame.set(index::LEFT_WRIST, Landmark::new(0.4, 0.6));
        frame.set(index::RIGHT_WRIST, Landmark::new(0.6, 0.6));
        frame.set(index::LEFT_HIP, Landmark::new(0.45, 0.6));
        frame.set(index::RIGHT_HIP, Landmark::new(0.55, 0.6));
        frame.set(index::LEFT_KNEE, Landmark::new(0.45, 0.75));
        frame.set(index::RIGHT_KNEE, Landmark::new(0.55, 0.75));
        frame.set(index::LEFT_ANKLE, Landmark::new(0.45, 0.9));
        frame.set(index::RIGHT_ANKLE, Landmark::new(0.55, 0.9));
        frame
    }

    #[test]
    fn test_full_frame_has_all_keys() {
        let angles = LandmarkExtractor::default().extract(&standing_frame());
        for key in [
            "left_elbow", "right_elbow", "left_knee", "right_knee", "left_hip", "right_hip",
            "left_arm_raise", "right_arm_raise", "back", "avg_elbow", "avg_knee", "avg_hip",
            "avg_arm_raise", "elbow_diff", "knee_diff", "hip_diff", "arm_raise_diff",
            "min_knee", "max_forearm_tilt",
        ] {
            assert!(angles.contains(key), "missing {}", key);
        }
    }

    #[test]
    fn test_standing_angles() {
        let angles = LandmarkExtractor::default().extract(&standing_frame());
        assert!((angles.get("left_knee").unwrap() - 180.0).abs() < 1e-6);
        assert!((angles.get("right_elbow").unwrap() - 180.0).abs() < 1e-6);
        assert!((angles.get("back").unwrap() - 180.0).abs() < 1e-6);
        assert!(angles.get("max_forearm_tilt").unwrap() < 1e-6);
        assert!(angles.get("knee_diff").unwrap() < 1e-6);
    }

    #[test]
    fn test_short_frame_gives_partial_set() {
        // Only up to the wrists: arms available, legs not
        let frame = LandmarkFrame::new(standing_frame().points()[..17].to_vec());
        let angles = LandmarkExtractor::default().extract(&frame);
        assert!(angles.contains("left_elbow"));
        assert!(angles.contains("elbow_diff"));
        assert!(!angles.contains("left_knee"));
        assert!(!angles.contains("back"));
        assert!(!angles.contains("left_arm_raise"));
    }

    #[test]
    fn test_hidden_landmark_drops_dependent_angles() {
        let mut frame = standing_frame();
        frame.set(index::LEFT_ANKLE, Landmark::with_presence(0.45, 0.9, 0.1));
        let angles = LandmarkExtractor::default().extract(&frame);
        assert!(!angles.contains("left_knee"));
        assert!(angles.contains("right_knee"));
        assert!(!angles.contains("avg_knee"));
    }

    #[test]
    fn test_empty_frame_gives_empty_set() {
        let angles = LandmarkExtractor::default().extract(&LandmarkFrame::default());
        assert!(angles.is_empty());
    }

    #[test]
    fn test_coincident_points_never_nan() {
        let frame = LandmarkFrame::new(vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT]);
        let angles = LandmarkExtractor::default().extract(&frame);
        assert!(!angles.is_empty());
        assert!(angles.iter().all(|(_, v)| v == 0.0));
    }
}
