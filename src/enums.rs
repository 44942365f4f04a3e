use std::fmt;

use crate::vector::Vector3;

/// The two named anatomical reference axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalAxisId {
    /// Anterior-posterior
    AP,
    /// Left-right
    LR,
}

impl CanonicalAxisId {
    pub const ALL: [CanonicalAxisId; 2] = [CanonicalAxisId::AP, CanonicalAxisId::LR];

    /// Fixed direction this axis is rotated onto in canonical orientation.
    pub const fn canonical_target(self) -> Vector3 {
        match self {
            // anterior points down the negative x axis
            CanonicalAxisId::AP => Vector3::new(-1.0, 0.0, 0.0),
            // left points out toward the viewer
            CanonicalAxisId::LR => Vector3::new(0.0, 0.0, 1.0),
        }
    }

    /// Key under which the raw orientation string is stored in the config source.
    pub const fn config_key(self) -> &'static str {
        match self {
            CanonicalAxisId::AP => "AP_orientation",
            CanonicalAxisId::LR => "LR_orientation",
        }
    }
}

impl fmt::Display for CanonicalAxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalAxisId::AP => f.write_str("AP"),
            CanonicalAxisId::LR => f.write_str("LR"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TransformState {
    #[default]
    Uninitialized,
    Active,
    Failed,
}

/// How a vanishing rotation axis with a non-zero angle is resolved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateAxisPolicy {
    /// Only inputs lying exactly on the AP target's x axis (rotate about z)
    /// or the LR target's z axis (rotate about x) are resolved.
    #[default]
    AxisAligned,
    /// Fall back to the unrounded cross product, or to any vector
    /// perpendicular to the input when that vanishes too.
    Perpendicular,
}
