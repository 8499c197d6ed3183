//! Percentile range calculation using the LMS method.
//!
//! Converts the reference parameters for an age into the measurement interval
//! between two z-scores (by default -2 and +2, roughly the 2nd and 98th
//! percentiles).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::reference::{Gender, LmsParams, ReferenceTable};

/// Default z-score magnitude of the expected band.
pub const DEFAULT_Z_SCORE: f64 = 2.0;

/// Measurement at z-score `z` for the given distribution parameters.
///
/// Uses `M * (1 + L*S*z)^(1/L)`, or `M * exp(S*z)` when `L` is zero. The
/// result may be non-finite for parameters that do not describe a valid
/// distribution; callers are expected to check.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn lms_value(params: LmsParams, z: f64) -> f64 {
    let LmsParams { l, m, s } = params;
    if l == 0.0 {
        m * (s * z).exp()
    } else {
        m * (1.0 + l * s * z).powf(1.0 / l)
    }
}

/// First bound whose Box-Cox base `1 + L*S*z` is not positive.
///
/// Such a base has no real root in general, and when `1/L` is an even
/// integer it yields a finite but meaningless bound.
#[allow(clippy::float_cmp)]
fn non_positive_base(params: LmsParams, z_score: f64) -> Option<(f64, f64)> {
    if params.l == 0.0 {
        return None;
    }
    [-z_score, z_score]
        .into_iter()
        .map(|z| (z, 1.0 + params.l * params.s * z))
        .find(|&(_, base)| base <= 0.0)
}

/// Inclusive interval of expected measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRange {
    /// Measurement at the lower z-score.
    pub lower: f64,
    /// Measurement at the upper z-score.
    pub upper: f64,
}

impl ExpectedRange {
    /// Check if a value lies within the range, bounds included.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Distance between the bounds.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Computes expected ranges from a reference table it owns.
#[derive(Debug, Clone)]
pub struct RangeCalculator {
    table: ReferenceTable,
    z_score: f64,
}

impl RangeCalculator {
    /// Create a calculator using the default ±2 z-score band.
    #[must_use]
    pub fn new(table: ReferenceTable) -> Self {
        Self {
            table,
            z_score: DEFAULT_Z_SCORE,
        }
    }

    /// Create a calculator with a custom z-score band `[-z, +z]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if `z_score` is not finite and
    /// positive.
    pub fn with_z_score(table: ReferenceTable, z_score: f64) -> Result<Self> {
        if !z_score.is_finite() || z_score <= 0.0 {
            return Err(Error::ConfigValidation {
                message: format!("z_score must be a positive number, got {z_score}"),
            });
        }
        Ok(Self { table, z_score })
    }

    /// The reference table used for lookups.
    #[must_use]
    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    /// The z-score magnitude of the band.
    #[must_use]
    pub fn z_score(&self) -> f64 {
        self.z_score
    }

    /// Expected measurement range for an age in whole years.
    ///
    /// Returns `Ok(None)` when the table has no row for that age.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataIntegrity`] if the Box-Cox base `1 + L*S*z` is not
    /// positive at either bound, if the computed bounds are not finite, or if
    /// the lower bound exceeds the upper bound.
    pub fn expected_range(&self, age_years: u32, gender: Gender) -> Result<Option<ExpectedRange>> {
        let Some(params) = self.table.lookup(age_years, gender) else {
            return Ok(None);
        };

        if let Some((z, base)) = non_positive_base(params, self.z_score) {
            return Err(Error::data_integrity(format!(
                "non-positive LMS base {base} at z={z} for {gender} aged {age_years} \
                 (L={}, M={}, S={})",
                params.l, params.m, params.s
            )));
        }

        let lower = lms_value(params, -self.z_score);
        let upper = lms_value(params, self.z_score);

        if !lower.is_finite() || !upper.is_finite() {
            return Err(Error::data_integrity(format!(
                "non-finite expected range [{lower}, {upper}] for {gender} aged {age_years} \
                 (L={}, M={}, S={})",
                params.l, params.m, params.s
            )));
        }
        if lower > upper {
            return Err(Error::data_integrity(format!(
                "lower bound {lower} exceeds upper bound {upper} for {gender} aged {age_years}"
            )));
        }

        debug!(
            "Expected range for {} aged {}: [{:.2}, {:.2}]",
            gender, age_years, lower, upper
        );
        Ok(Some(ExpectedRange { lower, upper }))
    }
}
