//! Tunable bloom parameters and the soft-threshold curve.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Smallest knee width used by the threshold curve.
pub const MIN_KNEE: f32 = 1e-4;

/// Tunables consumed by [`BloomEngine`](crate::BloomEngine).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomParameters {
    /// Brightness cutoff.
    pub threshold: f32,
    /// Smoothness of the threshold falloff. Range \[0, 1\].
    pub soft_knee: f32,
    /// Blend strength of bloom into the final image.
    pub intensity: f32,
    /// Maximum mip-chain depth.
    pub iterations: u32,
}

impl Default for BloomParameters {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            soft_knee: 0.7,
            intensity: 0.8,
            iterations: 8,
        }
    }
}

impl BloomParameters {
    /// Knee width, floored so the curve never divides by zero.
    pub fn knee(&self) -> f32 {
        (self.threshold * self.soft_knee).max(MIN_KNEE)
    }

    pub fn curve(&self) -> ThresholdCurve {
        ThresholdCurve::new(self.threshold, self.soft_knee)
    }
}

/// Quadratic soft-threshold curve `(threshold - knee, 2 * knee, 0.25 / knee)`.
///
/// Below `threshold - knee` a pixel contributes nothing; inside the knee the
/// contribution rises quadratically; above `threshold + knee` it follows
/// `brightness - threshold`. The two pieces meet with matching value and slope.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCurve {
    pub threshold: f32,
    pub knee_start: f32,
    pub knee_width: f32,
    pub knee_scale: f32,
}

impl ThresholdCurve {
    pub fn new(threshold: f32, soft_knee: f32) -> Self {
        let knee = (threshold * soft_knee).max(MIN_KNEE);
        Self {
            threshold,
            knee_start: threshold - knee,
            knee_width: knee * 2.0,
            knee_scale: 0.25 / knee,
        }
    }

    /// The `(x, y, z)` triple handed to prefilter kernels.
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.knee_start, self.knee_width, self.knee_scale)
    }

    /// Fraction of a pixel with the given brightness that survives the prefilter.
    pub fn response(&self, brightness: f32) -> f32 {
        let rq = (brightness - self.knee_start).clamp(0.0, self.knee_width);
        let rq = self.knee_scale * rq * rq;
        rq.max(brightness - self.threshold) / brightness.max(1e-5)
    }
}
