use crate::config::{OrientationSource, TransformOptions};
use crate::enums::{CanonicalAxisId, TransformState};
use crate::rotation::RotationOperator;
use crate::transform_loader::{AxisOrientation, TransformError, TransformLoader, TransformResult};
use crate::vector::Vector3;

use ndarray::{ArrayViewMut1, ArrayViewMut2, Axis};
use rayon::prelude::*;
use tracing::{info, warn};

/// Outcome of transforming a block of vectors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub transformed: usize,
    /// Rows left untouched because rotating them produced NaN.
    pub skipped: usize,
}

/// Rotations taking a dataset's AP and LR directions into canonical orientation.
///
/// Built once; the rotations and the state never change afterwards, so a
/// value can be shared read-only between threads.
#[derive(Debug, Default)]
pub struct CanonicalTransform {
    state: TransformState,
    ap: Option<AxisOrientation>,
    lr: Option<AxisOrientation>,
    dv: Option<Vector3>,
    failure: Option<TransformError>,
}

impl CanonicalTransform {
    pub(crate) fn active(ap: AxisOrientation, lr: AxisOrientation, dv: Vector3) -> Self {
        Self {
            state: TransformState::Active,
            ap: Some(ap),
            lr: Some(lr),
            dv: Some(dv),
            failure: None,
        }
    }

    fn failed(failure: TransformError) -> Self {
        Self {
            state: TransformState::Failed,
            failure: Some(failure),
            ..Self::default()
        }
    }

    /// Build the transform, folding any construction error into the
    /// `Failed` state. `None` yields an `Uninitialized` transform.
    ///
    /// Returns the transform and whether it is active.
    pub fn build<S>(source: Option<&S>, options: &TransformOptions) -> (Self, bool)
    where
        S: OrientationSource + ?Sized,
    {
        let Some(source) = source else {
            info!("No configuration supplied to canonical transform");
            return (Self::default(), false);
        };

        let transform = match TransformLoader::load_from_source(source, options) {
            Ok(transform) => transform,
            Err(err) => {
                warn!("Canonical transform inactive: {err}");
                Self::failed(err)
            }
        };
        let is_active = transform.is_active();
        (transform, is_active)
    }

    /// Build the transform, returning the construction error directly.
    pub fn try_build<S>(source: &S, options: &TransformOptions) -> TransformResult<Self>
    where
        S: OrientationSource + ?Sized,
    {
        TransformLoader::load_from_source(source, options)
    }

    pub fn state(&self) -> TransformState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TransformState::Active
    }

    /// Why construction failed, if it did.
    pub fn failure(&self) -> Option<&TransformError> {
        self.failure.as_ref()
    }

    pub fn rotation(&self, axis: CanonicalAxisId) -> Option<&RotationOperator> {
        self.orientation(axis).map(|orientation| &orientation.rotation)
    }

    /// Normalized input direction the rotation for `axis` was derived from.
    pub fn input_orientation(&self, axis: CanonicalAxisId) -> Option<Vector3> {
        self.orientation(axis).map(|orientation| orientation.input)
    }

    /// Cross product of the normalized AP and LR inputs; diagnostic only.
    pub fn dv_orientation(&self) -> Option<Vector3> {
        self.dv
    }

    fn orientation(&self, axis: CanonicalAxisId) -> Option<&AxisOrientation> {
        match axis {
            CanonicalAxisId::AP => self.ap.as_ref(),
            CanonicalAxisId::LR => self.lr.as_ref(),
        }
    }

    fn active_rotations(&self) -> TransformResult<(&RotationOperator, &RotationOperator)> {
        match (&self.state, &self.ap, &self.lr) {
            (TransformState::Active, Some(ap), Some(lr)) => Ok((&ap.rotation, &lr.rotation)),
            _ => Err(TransformError::Inactive { state: self.state }),
        }
    }

    fn checked(v: Vector3) -> TransformResult<Vector3> {
        if v.has_nan() {
            Err(TransformError::NumericFailure)
        } else {
            Ok(v)
        }
    }

    /// Rotate by AP, then by LR, returning the result.
    pub fn product_transformed(&self, vector: Vector3) -> TransformResult<Vector3> {
        let (ap, lr) = self.active_rotations()?;
        let first = ap.apply(&vector);
        Self::checked(lr.apply(&first))
    }

    /// Rotate by the operator for `axis` only, returning the result.
    pub fn single_transformed(
        &self,
        vector: Vector3,
        axis: CanonicalAxisId,
    ) -> TransformResult<Vector3> {
        let (ap, lr) = self.active_rotations()?;
        let rotation = match axis {
            CanonicalAxisId::AP => ap,
            CanonicalAxisId::LR => lr,
        };
        Self::checked(rotation.apply(&vector))
    }

    /// Rotate `vector` in place by AP then LR.
    ///
    /// # Errors
    ///
    /// Returns error if the transform is not active or the rotation produced
    /// NaN; `vector` is left untouched in both cases
    pub fn apply_product_transform(&self, vector: &mut Vector3) -> TransformResult<()> {
        *vector = self.product_transformed(*vector)?;
        Ok(())
    }

    /// Rotate `vector` in place by the operator for `axis`.
    pub fn apply_single_transform(
        &self,
        vector: &mut Vector3,
        axis: CanonicalAxisId,
    ) -> TransformResult<()> {
        *vector = self.single_transformed(*vector, axis)?;
        Ok(())
    }

    /// Product transform applied to every row of an `N x 3` block in parallel.
    ///
    /// # Errors
    ///
    /// Returns error if the transform is inactive or the block does not have
    /// three columns; nothing is written in that case
    pub fn apply_product_transform_rows(
        &self,
        vectors: ArrayViewMut2<'_, f64>,
    ) -> TransformResult<BatchReport> {
        self.apply_rows(vectors, |v| self.product_transformed(v))
    }

    /// Single axis transform applied to every row of an `N x 3` block.
    pub fn apply_single_transform_rows(
        &self,
        vectors: ArrayViewMut2<'_, f64>,
        axis: CanonicalAxisId,
    ) -> TransformResult<BatchReport> {
        self.apply_rows(vectors, |v| self.single_transformed(v, axis))
    }

    fn apply_rows<F>(
        &self,
        mut vectors: ArrayViewMut2<'_, f64>,
        transform: F,
    ) -> TransformResult<BatchReport>
    where
        F: Fn(Vector3) -> TransformResult<Vector3> + Sync,
    {
        self.active_rotations()?;
        let columns = vectors.ncols();
        if columns != 3 {
            return Err(TransformError::InvalidShape { columns });
        }

        let transformed = vectors
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .map(|row| Self::apply_row(row, &transform))
            .filter(|&done| done)
            .count();

        let report = BatchReport {
            transformed,
            skipped: vectors.nrows() - transformed,
        };
        if report.skipped > 0 {
            warn!(skipped = report.skipped, "Rows produced non-numeric rotations");
        }
        Ok(report)
    }

    fn apply_row<F>(mut row: ArrayViewMut1<'_, f64>, transform: &F) -> bool
    where
        F: Fn(Vector3) -> TransformResult<Vector3>,
    {
        let local = Vector3::new(row[0], row[1], row[2]);
        match transform(local) {
            Ok(rotated) => {
                row[0] = rotated.x;
                row[1] = rotated.y;
                row[2] = rotated.z;
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeasureConfig;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn config(ap: &str, lr: &str) -> MeasureConfig {
        MeasureConfig::new()
            .with("AP_orientation", ap)
            .with("LR_orientation", lr)
    }

    fn build(ap: &str, lr: &str) -> CanonicalTransform {
        let (transform, _) =
            CanonicalTransform::build(Some(&config(ap, lr)), &TransformOptions::default());
        transform
    }

    #[test]
    fn default_is_uninitialized() {
        let transform = CanonicalTransform::default();
        assert_eq!(transform.state(), TransformState::Uninitialized);
        assert!(!transform.is_active());
        assert!(transform.failure().is_none());
    }

    #[test]
    fn no_source_is_uninitialized() {
        let (transform, active) =
            CanonicalTransform::build::<MeasureConfig>(None, &TransformOptions::default());
        assert!(!active);
        assert_eq!(transform.state(), TransformState::Uninitialized);
    }

    #[test]
    fn identity_rotations_for_canonical_input() {
        let transform = build("-1 0 0", "0 0 1");
        assert_eq!(transform.state(), TransformState::Active);
        for axis in CanonicalAxisId::ALL {
            assert_eq!(transform.rotation(axis).unwrap().angle_degrees(), 0.0);
        }

        let mut v = Vector3::new(5.0, 3.0, 2.0);
        transform.apply_product_transform(&mut v).unwrap();
        assert_eq!(v, Vector3::new(5.0, 3.0, 2.0));
    }

    #[test]
    fn writes_back_every_component() {
        // AP: +y -> -x is a quarter turn about z; LR already canonical
        let transform = build("0 1 0", "0 0 1");
        assert!(transform.is_active());

        let mut v = Vector3::new(1.0, 2.0, 3.0);
        transform.apply_product_transform(&mut v).unwrap();
        assert_relative_eq!(v.x, -2.0, epsilon = 1e-10);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-10);
        assert_relative_eq!(v.z, 3.0, epsilon = 1e-10);
    }

    #[test]
    fn product_applies_ap_before_lr() {
        let transform = build("0 1 0", "0 1 0");
        assert!(transform.is_active());

        let v = Vector3::new(1.0, 0.0, 0.0);
        let ap = transform.rotation(CanonicalAxisId::AP).unwrap();
        let lr = transform.rotation(CanonicalAxisId::LR).unwrap();
        let expected = lr.apply(&ap.apply(&v));
        let reversed = ap.apply(&lr.apply(&v));

        let product = transform.product_transformed(v).unwrap();
        assert_relative_eq!(product.x, expected.x, epsilon = 1e-12);
        assert_relative_eq!(product.y, expected.y, epsilon = 1e-12);
        assert_relative_eq!(product.z, expected.z, epsilon = 1e-12);
        assert!((product - reversed).length() > 1e-6);
    }

    #[test]
    fn single_transform_maps_input_to_target() {
        let transform = build("2 3 -1", "-1 4 2");
        assert!(transform.is_active());

        for axis in CanonicalAxisId::ALL {
            let mut v = transform.input_orientation(axis).unwrap();
            transform.apply_single_transform(&mut v, axis).unwrap();
            let snapped = v.normalize_or_zero().round_near_integers(0.1);
            assert_eq!(snapped, axis.canonical_target());
        }
    }

    #[test]
    fn inactive_transform_leaves_vector_untouched() {
        let transform = build("0 0 0", "0 0 1");
        assert_eq!(transform.state(), TransformState::Failed);
        assert!(matches!(
            transform.failure(),
            Some(TransformError::DegenerateInput {
                axis: CanonicalAxisId::AP
            })
        ));

        let mut v = Vector3::new(5.0, 3.0, 2.0);
        assert!(matches!(
            transform.apply_product_transform(&mut v),
            Err(TransformError::Inactive {
                state: TransformState::Failed
            })
        ));
        assert!(
            transform
                .apply_single_transform(&mut v, CanonicalAxisId::LR)
                .is_err()
        );
        assert_eq!(v, Vector3::new(5.0, 3.0, 2.0));
    }

    #[test]
    fn nan_result_leaves_vector_untouched() {
        let transform = build("0 1 0", "1 0 0");
        assert!(transform.is_active());

        let mut v = Vector3::new(1.0, f64::NAN, 2.0);
        let before = v.to_array().map(f64::to_bits);
        assert!(matches!(
            transform.apply_product_transform(&mut v),
            Err(TransformError::NumericFailure)
        ));
        assert!(matches!(
            transform.apply_single_transform(&mut v, CanonicalAxisId::AP),
            Err(TransformError::NumericFailure)
        ));
        assert_eq!(v.to_array().map(f64::to_bits), before);
    }

    #[test]
    fn dv_is_cross_of_inputs() {
        let transform = build("-1 0 0", "0 0 1");
        assert_eq!(transform.dv_orientation(), Some(Vector3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn rows_are_rotated_in_place() {
        let transform = build("0 1 0", "0 0 1");
        let mut block = array![[1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [4.0, f64::NAN, 0.0]];

        let report = transform.apply_product_transform_rows(block.view_mut()).unwrap();
        assert_eq!(
            report,
            BatchReport {
                transformed: 2,
                skipped: 1
            }
        );
        assert_relative_eq!(block[[0, 0]], -2.0, epsilon = 1e-10);
        assert_relative_eq!(block[[0, 1]], 1.0, epsilon = 1e-10);
        assert_relative_eq!(block[[0, 2]], 3.0, epsilon = 1e-10);
        assert_relative_eq!(block[[1, 0]], -1.0, epsilon = 1e-10);
        assert_eq!(block[[2, 0]], 4.0);
        assert!(block[[2, 1]].is_nan());
    }

    #[test]
    fn rows_need_three_columns() {
        let transform = build("-1 0 0", "0 0 1");
        let mut block = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(matches!(
            transform.apply_single_transform_rows(block.view_mut(), CanonicalAxisId::AP),
            Err(TransformError::InvalidShape { columns: 2 })
        ));
        assert_eq!(block, array![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn rows_refused_while_inactive() {
        let transform = build("1 2", "0 0 1");
        let mut block = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            transform.apply_product_transform_rows(block.view_mut()),
            Err(TransformError::Inactive { .. })
        ));
        assert_eq!(block, array![[1.0, 2.0, 3.0]]);
    }
}
