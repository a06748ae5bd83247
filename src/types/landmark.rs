//! Landmark frames produced by the external pose detector

use serde::{Deserialize, Serialize};

/// One estimated body point in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, 0 = left edge, 1 = right edge
    pub x: f64,
    /// Vertical position, 0 = top edge, 1 = bottom edge
    pub y: f64,
    /// Detection confidence; absent means the detector did not report one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<f64>,
}

impl Landmark {
    /// Landmark without a presence score
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, presence: None }
    }

    /// Landmark with a presence score
    pub fn with_presence(x: f64, y: f64, presence: f64) -> Self {
        Self { x, y, presence: Some(presence) }
    }

    /// Usable when finite and not flagged below `min_presence`
    pub fn is_present(&self, min_presence: f64) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.presence.map_or(true, |p| p >= min_presence)
    }

    /// `(x, y)` pair
    pub fn point(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// MediaPipe pose landmark indices used by the extractor
pub mod index {
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;

    /// Total points in a full pose
    pub const POSE_LANDMARK_COUNT: usize = 33;
}

/// Every landmark for one video frame, in detector order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    points: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Landmark at `idx` if the detector reported it
    pub fn get(&self, idx: usize) -> Option<&Landmark> {
        self.points.get(idx)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Replace one landmark, growing the frame with hidden points if needed
    pub fn set(&mut self, idx: usize, landmark: Landmark) {
        if idx >= self.points.len() {
            self.points
                .resize(idx + 1, Landmark::with_presence(0.0, 0.0, 0.0));
        }
        self.points[idx] = landmark;
    }
}

impl From<Vec<Landmark>> for LandmarkFrame {
    fn from(points: Vec<Landmark>) -> Self {
        Self::new(points)
    }
}

/// One timestamped frame as received from the detector or a replay file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedFrame {
    /// Monotonic seconds since the stream started
    pub timestamp: f64,
    /// `None` when nobody was detected
    #[serde(default)]
    pub landmarks: Option<LandmarkFrame>,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_defaults_to_visible() {
        assert!(Landmark::new(0.5, 0.5).is_present(0.5));
        assert!(!Landmark::with_presence(0.5, 0.5, 0.2).is_present(0.5));
        assert!(!Landmark::new(f64::NAN, 0.5).is_present(0.0));
    }

    #[test]
    fn test_set_grows_frame() {
        let mut frame = LandmarkFrame::default();
        frame.set(3, Landmark::new(0.1, 0.2));
        assert_eq!(frame.len(), 4);
        assert!(!frame.get(0).unwrap().is_present(0.5));
        assert_eq!(frame.get(3).unwrap().point(), (0.1, 0.2));
    }

    #[test]
    fn test_timed_frame_json() {
        let json = r#"{"timestamp": 0.5, "landmarks": [{"x": 0.1, "y": 0.2, "presence": 0.9}]}"#;
        let frame: TimedFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp, 0.5);
        assert_eq!(frame.landmarks.unwrap().len(), 1);

        let empty: TimedFrame = serde_json::from_str(r#"{"timestamp": 1.0}"#).unwrap();
        assert!(empty.landmarks.is_none());
    }
}
