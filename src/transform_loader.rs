use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    config::{MeasureConfig, OrientationSource, TransformOptions},
    enums::{CanonicalAxisId, DegenerateAxisPolicy, TransformState},
    rotation::RotationOperator,
    transform::CanonicalTransform,
    vector::{Vector3, VectorParseError},
};

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{axis} orientation {input:?} is formatted improperly: {source}")]
    Format {
        axis: CanonicalAxisId,
        input: String,
        source: VectorParseError,
    },

    #[error("no value for orientation key {key:?}")]
    MissingKey { key: &'static str },

    #[error("malformed orientation config: {reason}")]
    MalformedConfig { reason: String },

    #[error("{axis} orientation vector has zero length")]
    DegenerateInput { axis: CanonicalAxisId },

    #[error("{axis} orientation incorrectly rotated to {rotated}")]
    Validation {
        axis: CanonicalAxisId,
        rotated: Vector3,
    },

    #[error("rotation produced a non-numeric component")]
    NumericFailure,

    #[error("expected vectors with 3 components, got {columns}")]
    InvalidShape { columns: usize },

    #[error("canonical transform is not active ({state:?})")]
    Inactive { state: TransformState },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransformResult<T> = Result<T, TransformError>;

/// Derived rotation for one reference axis.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AxisOrientation {
    /// Normalized input direction.
    pub(crate) input: Vector3,
    pub(crate) rotation: RotationOperator,
}

pub struct TransformLoader;

impl TransformLoader {
    /// Build and validate a canonical transform from a config source
    ///
    /// # Arguments
    ///
    /// * `source` - Store holding the `AP_orientation` and `LR_orientation` strings
    /// * `options` - Rounding tolerance and degenerate axis handling
    ///
    /// # Errors
    ///
    /// Returns error if either string is missing or malformed, an input has
    /// zero length, or a derived rotation does not reach its canonical target
    pub fn load_from_source<S>(
        source: &S,
        options: &TransformOptions,
    ) -> TransformResult<CanonicalTransform>
    where
        S: OrientationSource + ?Sized,
    {
        let ap = Self::read_axis(source, CanonicalAxisId::AP)?;
        let lr = Self::read_axis(source, CanonicalAxisId::LR)?;
        Self::load_from_vectors(ap, lr, options)
    }

    /// Build from the two raw orientation strings
    pub fn load_from_strings(
        ap: &str,
        lr: &str,
        options: &TransformOptions,
    ) -> TransformResult<CanonicalTransform> {
        let ap = Self::parse_axis(ap, CanonicalAxisId::AP)?;
        let lr = Self::parse_axis(lr, CanonicalAxisId::LR)?;
        Self::load_from_vectors(ap, lr, options)
    }

    /// Build from an AuxInfo v2 CSV file
    pub fn load_from_path(
        path: impl AsRef<Path>,
        options: &TransformOptions,
    ) -> TransformResult<CanonicalTransform> {
        let config = MeasureConfig::from_path(path)?;
        Self::load_from_source(&config, options)
    }

    /// Build from already parsed, not necessarily normalized, input vectors
    pub fn load_from_vectors(
        ap: Vector3,
        lr: Vector3,
        options: &TransformOptions,
    ) -> TransformResult<CanonicalTransform> {
        info!("Constructing canonical transform");

        let ap = Self::init_axis(ap, CanonicalAxisId::AP, options)?;
        let lr = Self::init_axis(lr, CanonicalAxisId::LR, options)?;
        let dv = ap.input.cross(&lr.input);
        debug!(dv = %dv, "DV orientation");

        Self::confirm_axis(&ap, CanonicalAxisId::AP, options)?;
        Self::confirm_axis(&lr, CanonicalAxisId::LR, options)?;

        info!(
            ap = %ap.rotation,
            lr = %lr.rotation,
            "Confirmed transforms rotate from initial AP, LR to canonical"
        );
        Ok(CanonicalTransform::active(ap, lr, dv))
    }

    fn read_axis<S>(source: &S, axis: CanonicalAxisId) -> TransformResult<Vector3>
    where
        S: OrientationSource + ?Sized,
    {
        let raw = source
            .axis_value(axis)
            .ok_or(TransformError::MissingKey {
                key: axis.config_key(),
            })
            .inspect_err(|err| error!("{err}"))?;
        Self::parse_axis(raw, axis)
    }

    fn parse_axis(raw: &str, axis: CanonicalAxisId) -> TransformResult<Vector3> {
        raw.parse::<Vector3>()
            .map_err(|source| TransformError::Format {
                axis,
                input: raw.to_owned(),
                source,
            })
            .inspect_err(|err| error!("{err}"))
    }

    /// Axis-angle rotation taking `input` onto the canonical target of `axis`.
    fn init_axis(
        input: Vector3,
        axis: CanonicalAxisId,
        options: &TransformOptions,
    ) -> TransformResult<AxisOrientation> {
        let input = input
            .try_normalize()
            .ok_or(TransformError::DegenerateInput { axis })
            .inspect_err(|err| error!("{err}"))?;
        let target = axis.canonical_target();

        let raw_axis = input.cross(&target);
        let mut rotation_axis = raw_axis
            .round_near_integers(options.rounding_tolerance)
            .normalize_or_zero();
        let angle = Self::angle_between(&input, &target);

        // a zero angle means the input is already canonical
        if angle != 0.0 && rotation_axis.is_zero() {
            rotation_axis = Self::resolve_degenerate_axis(&input, &raw_axis, axis, options);
        }

        let rotation = RotationOperator::from_radians(rotation_axis, angle);
        debug!(%axis, rotation = %rotation, "Derived axis-angle rotation");
        Ok(AxisOrientation { input, rotation })
    }

    fn resolve_degenerate_axis(
        input: &Vector3,
        raw_axis: &Vector3,
        axis: CanonicalAxisId,
        options: &TransformOptions,
    ) -> Vector3 {
        match options.degenerate_axis {
            DegenerateAxisPolicy::AxisAligned => match axis {
                CanonicalAxisId::AP if input.x != 0.0 && input.y == 0.0 && input.z == 0.0 => {
                    warn!("Degenerate axis-angle rotation, rotating about z in the xy plane");
                    Vector3::Z
                }
                CanonicalAxisId::LR if input.x == 0.0 && input.y == 0.0 && input.z != 0.0 => {
                    warn!("Degenerate axis-angle rotation, rotating about x in the yz plane");
                    Vector3::X
                }
                _ => {
                    warn!(%axis, input = %input, "Unresolved degenerate axis-angle rotation");
                    Vector3::ZERO
                }
            },
            DegenerateAxisPolicy::Perpendicular => {
                if raw_axis.length() > f64::EPSILON {
                    warn!(%axis, "Rotation axis rounded away, using unrounded cross product");
                    return raw_axis.normalize_or_zero();
                }
                let helper = if input.x.abs() < 0.9 {
                    Vector3::X
                } else {
                    Vector3::Y
                };
                warn!(%axis, "Anti-parallel input, rotating about a perpendicular axis");
                helper.cross(input).normalize_or_zero()
            }
        }
    }

    /// `acos(a . b / (|a| |b|))`, with an undefined result coerced to zero.
    fn angle_between(a: &Vector3, b: &Vector3) -> f64 {
        let angle = (a.dot(b) / (a.length() * b.length())).acos();
        if angle.is_nan() { 0.0 } else { angle }
    }

    fn confirm_axis(
        orientation: &AxisOrientation,
        axis: CanonicalAxisId,
        options: &TransformOptions,
    ) -> TransformResult<()> {
        let rotated = orientation
            .rotation
            .apply(&orientation.input)
            .normalize_or_zero()
            .round_near_integers(options.rounding_tolerance);

        if rotated != axis.canonical_target() {
            let err = TransformError::Validation { axis, rotated };
            warn!("{err}; falling back to the legacy orientation scheme");
            return Err(err);
        }
        Ok(())
    }
}
