use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use thiserror::Error;

/// Default distance within which a coordinate snaps to the nearest integer.
pub const ROUNDING_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorParseError {
    #[error("expected 3 whitespace separated components, found {found}")]
    TokenCount { found: usize },

    #[error("invalid component {token:?}")]
    InvalidNumber { token: String },
}

/// Three component vector, used for directions and points alike.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);
    pub const X: Vector3 = Vector3::new(1.0, 0.0, 0.0);
    pub const Y: Vector3 = Vector3::new(0.0, 1.0, 0.0);
    pub const Z: Vector3 = Vector3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x.mul_add(other.x, self.y.mul_add(other.y, self.z * other.z))
    }

    #[inline]
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn has_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    /// Unit vector in the same direction, or `None` for a zero-length vector.
    pub fn try_normalize(&self) -> Option<Vector3> {
        let length = self.length();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        Some(*self * (1.0 / length))
    }

    /// Like [`Vector3::try_normalize`] but a zero vector stays zero.
    pub fn normalize_or_zero(&self) -> Vector3 {
        self.try_normalize().unwrap_or(Vector3::ZERO)
    }

    /// Snap every coordinate lying within `tolerance` of an integer onto it.
    pub fn round_near_integers(&self, tolerance: f64) -> Vector3 {
        let snap = |value: f64| {
            let rounded = value.round();
            if (value - rounded).abs() <= tolerance {
                rounded
            } else {
                value
            }
        };
        Vector3::new(snap(self.x), snap(self.y), snap(self.z))
    }

    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Vector3::new(x, y, z)
    }
}

impl From<Vector3> for [f64; 3] {
    fn from(v: Vector3) -> Self {
        v.to_array()
    }
}

impl FromStr for Vector3 {
    type Err = VectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.len() != 3 {
            return Err(VectorParseError::TokenCount {
                found: tokens.len(),
            });
        }

        let mut components = [0.0; 3];
        for (component, token) in components.iter_mut().zip(&tokens) {
            *component = token
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| VectorParseError::InvalidNumber {
                    token: (*token).to_owned(),
                })?;
        }
        Ok(Vector3::from(components))
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.x, self.y, self.z)
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}
