//! Small numeric helpers shared by the schedule and the synthesizer.

/// Linear interpolation between `a` and `b`; `t = 0` gives `a`, `t = 1`
/// gives `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Inclusive range check.
pub fn within(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}
