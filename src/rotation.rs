use std::fmt;

use crate::vector::Vector3;

/// Rotate `v` about `axis` (through the origin) by `angle_degrees`.
///
/// Uses Rodrigues' rotation formula. The axis is normalized first; an
/// axis of zero length leaves `v` unchanged.
#[inline]
pub fn rotate(axis: &Vector3, angle_degrees: f64, v: &Vector3) -> Vector3 {
    let Some(k) = axis.try_normalize() else {
        return *v;
    };
    let (sin, cos) = angle_degrees.to_radians().sin_cos();

    // v cos + (k x v) sin + k (k . v)(1 - cos)
    *v * cos + k.cross(v) * sin + k * (k.dot(v) * (1.0 - cos))
}

/// A rotation about an axis through the origin.
///
/// Only built by the transform loader; the axis has unit length unless the
/// derivation could not determine one, in which case it is zero and the
/// operator leaves vectors unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationOperator {
    axis: Vector3,
    angle_degrees: f64,
}

impl RotationOperator {
    pub(crate) fn from_radians(axis: Vector3, angle_radians: f64) -> Self {
        let angle_degrees = if angle_radians.is_nan() {
            0.0
        } else {
            angle_radians * (180.0 / std::f64::consts::PI)
        };
        Self {
            axis,
            angle_degrees,
        }
    }

    pub fn axis(&self) -> Vector3 {
        self.axis
    }

    pub fn angle_degrees(&self) -> f64 {
        self.angle_degrees
    }

    pub fn angle_radians(&self) -> f64 {
        self.angle_degrees.to_radians()
    }

    /// True when applying this operator cannot move a vector.
    pub fn is_identity(&self) -> bool {
        self.angle_degrees == 0.0 || self.axis.is_zero()
    }

    /// Rotate a direction; there is no translation component.
    #[inline]
    pub fn apply(&self, v: &Vector3) -> Vector3 {
        rotate(&self.axis, self.angle_degrees, v)
    }
}

impl fmt::Display for RotationOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rotate [angle={:.4}, axis={}]",
            self.angle_degrees, self.axis
        )
    }
}
