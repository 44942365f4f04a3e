use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::enums::{CanonicalAxisId, DegenerateAxisPolicy};
use crate::transform_loader::TransformError;
use crate::vector::ROUNDING_TOLERANCE;

/// Anything that can hand out the raw orientation strings by key.
pub trait OrientationSource {
    fn orientation_value(&self, key: &str) -> Option<&str>;

    fn axis_value(&self, axis: CanonicalAxisId) -> Option<&str> {
        self.orientation_value(axis.config_key())
    }
}

impl OrientationSource for HashMap<String, String> {
    fn orientation_value(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Key/value measurement store, as found in an AuxInfo v2 file.
#[derive(Debug, Default, Clone)]
pub struct MeasureConfig {
    values: HashMap<String, String>,
}

impl MeasureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse the two row CSV layout: a header row of keys followed by a row
    /// of values. Blank lines are skipped, cells are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::MalformedConfig`] when either row is missing
    /// or the rows have different column counts.
    pub fn from_csv_str(contents: &str) -> Result<Self, TransformError> {
        let mut rows = contents.lines().filter(|line| !line.trim().is_empty());
        let (Some(header), Some(values)) = (rows.next(), rows.next()) else {
            return Err(TransformError::MalformedConfig {
                reason: "expected a header row and a value row".to_owned(),
            });
        };

        let keys: Vec<&str> = header.split(',').map(str::trim).collect();
        let values: Vec<&str> = values.split(',').map(str::trim).collect();
        if keys.len() != values.len() {
            return Err(TransformError::MalformedConfig {
                reason: format!(
                    "{} header columns but {} value columns",
                    keys.len(),
                    values.len()
                ),
            });
        }

        let values = keys
            .into_iter()
            .zip(values)
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        Ok(Self { values })
    }

    /// Read an AuxInfo file from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TransformError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_csv_str(&contents)
    }
}

impl OrientationSource for MeasureConfig {
    fn orientation_value(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}

/// Numeric knobs for building a canonical transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOptions {
    /// Distance within which axis and validation coordinates snap to integers.
    pub rounding_tolerance: f64,
    pub degenerate_axis: DegenerateAxisPolicy,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            rounding_tolerance: ROUNDING_TOLERANCE,
            degenerate_axis: DegenerateAxisPolicy::default(),
        }
    }
}
