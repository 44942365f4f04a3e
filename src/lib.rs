//! # Canonical orientation library
//!
//! This crate rotates vectors measured in an arbitrarily oriented imaging
//! dataset into the canonical embryo orientation
//!
//! Two reference directions describe the dataset: the anterior-posterior
//! (AP) and the left-right (LR) axis, each given as a string of three
//! whitespace separated numbers (for example in an AuxInfo v2 file). From
//! these an axis-angle rotation is derived per axis that takes the given
//! direction onto its canonical target:
//!  - AP onto `<-1, 0, 0>`
//!  - LR onto `<0, 0, 1>`
//!
//! Both rotations are checked at construction time. Only when each one maps
//! its input onto its target (within a tolerance of 0.1 per coordinate) does
//! the transform become active. An inactive transform refuses to rotate
//! anything, and callers are expected to fall back to their legacy
//! orientation scheme.
//!
//! Once built the transform never changes and can be shared between threads.
//! Blocks of vectors stored as `N x 3` ndarrays are rotated in parallel
//! using rayon.
//!
//! # Examples
//!
//! ## Rotating a division vector
//!
//! ```
//! # use canonical_orientation::{CanonicalTransform, MeasureConfig, TransformOptions, Vector3};
//! let config = MeasureConfig::new()
//!     .with("AP_orientation", "-1 0 0")
//!     .with("LR_orientation", "0 0 1");
//! let (transform, active) = CanonicalTransform::build(Some(&config), &TransformOptions::default());
//! assert!(active);
//!
//! let mut division = Vector3::new(5.0, 3.0, 2.0);
//! transform
//!     .apply_product_transform(&mut division)
//!     .expect("should have rotated the vector");
//! assert_eq!(division, Vector3::new(5.0, 3.0, 2.0));
//! ```
//!
//! ## Loading an AuxInfo file
//!
//! ```no_run
//! # use canonical_orientation::{TransformLoader, TransformOptions};
//! let transform = TransformLoader::load_from_path("AuxInfo_v2.csv", &TransformOptions::default())
//!     .expect("should have built an active transform");
//! ```

pub mod config;
pub mod enums;
pub mod rotation;
pub mod transform;
pub mod transform_loader;
pub mod vector;

pub use config::{MeasureConfig, OrientationSource, TransformOptions};
pub use enums::{CanonicalAxisId, DegenerateAxisPolicy, TransformState};
pub use rotation::{RotationOperator, rotate};
pub use transform::{BatchReport, CanonicalTransform};
pub use transform_loader::{TransformError, TransformLoader, TransformResult};
pub use vector::{Vector3, VectorParseError};
