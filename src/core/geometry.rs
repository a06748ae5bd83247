//! Planar joint angles

/// Angle in degrees at `vertex` between the rays to `a` and `b`.
///
/// Uses the dot-product form with the cosine clamped to [-1, 1]. When either
/// ray has zero length (coincident points) or an input is not finite the
/// angle is undefined and `0.0` is returned, so callers never see NaN.
pub fn angle_at(a: (f64, f64), vertex: (f64, f64), b: (f64, f64)) -> f64 {
    let v1 = (a.0 - vertex.0, a.1 - vertex.1);
    let v2 = (b.0 - vertex.0, b.1 - vertex.1);

    let mag1 = v1.0.hypot(v1.1);
    let mag2 = v2.0.hypot(v2.1);
    let usable = |m: f64| m.is_finite() && m > f64::EPSILON;
    if !usable(mag1) || !usable(mag2) {
        return 0.0;
    }

    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Midpoint of two points
pub fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Angle between the segment `from → to` and the image vertical, 0-90°.
/// Coincident points give `0.0`.
pub fn tilt_from_vertical(from: (f64, f64), to: (f64, f64)) -> f64 {
    let below = (from.0, from.1 + 1.0);
    let angle = angle_at(to, from, below);
    // Up or down along the vertical both count as untilted
    angle.min(180.0 - angle)
}

// =============================================================================
// TESTS
// =============================================================================
