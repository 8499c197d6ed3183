//! Growth classification.
//!
//! Compares a (predicted) height against the expected range for the child's
//! age and gender and returns a structured verdict. Rendering the verdict for
//! people is left to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::range::{ExpectedRange, RangeCalculator};
use crate::reference::Gender;

/// Outcome of comparing a measurement with its expected range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStatus {
    /// No reference data for this age and gender.
    OutOfRange,
    /// Below the lower bound.
    Undergrowth,
    /// Above the upper bound.
    Overgrowth,
    /// Within the expected range, bounds included.
    Normal,
}

impl GrowthStatus {
    /// Check if the status warrants consulting a healthcare provider.
    #[must_use]
    pub fn is_abnormal(&self) -> bool {
        matches!(self, Self::Undergrowth | Self::Overgrowth)
    }
}

impl fmt::Display for GrowthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "out_of_range"),
            Self::Undergrowth => write!(f, "undergrowth"),
            Self::Overgrowth => write!(f, "overgrowth"),
            Self::Normal => write!(f, "normal"),
        }
    }
}

/// Classification result for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthVerdict {
    /// The classification.
    pub status: GrowthStatus,
    /// The measurement that was classified.
    pub predicted: f64,
    /// Lower bound of the expected range, absent when out of range.
    pub lower: Option<f64>,
    /// Upper bound of the expected range, absent when out of range.
    pub upper: Option<f64>,
}

impl GrowthVerdict {
    fn out_of_range(predicted: f64) -> Self {
        Self {
            status: GrowthStatus::OutOfRange,
            predicted,
            lower: None,
            upper: None,
        }
    }

    fn within(status: GrowthStatus, predicted: f64, range: ExpectedRange) -> Self {
        Self {
            status,
            predicted,
            lower: Some(range.lower),
            upper: Some(range.upper),
        }
    }

    /// The expected range the measurement was compared against.
    #[must_use]
    pub fn range(&self) -> Option<ExpectedRange> {
        Some(ExpectedRange {
            lower: self.lower?,
            upper: self.upper?,
        })
    }
}

/// Classify a measurement against an expected range.
#[must_use]
pub fn classify_against(predicted: f64, range: ExpectedRange) -> GrowthStatus {
    if predicted < range.lower {
        GrowthStatus::Undergrowth
    } else if predicted > range.upper {
        GrowthStatus::Overgrowth
    } else {
        GrowthStatus::Normal
    }
}

/// Classifies heights using a shared range calculator.
#[derive(Debug, Clone, Copy)]
pub struct GrowthClassifier<'a> {
    calculator: &'a RangeCalculator,
}

impl<'a> GrowthClassifier<'a> {
    /// Create a classifier borrowing the given calculator.
    #[must_use]
    pub fn new(calculator: &'a RangeCalculator) -> Self {
        Self { calculator }
    }

    /// The calculator backing this classifier.
    #[must_use]
    pub fn calculator(&self) -> &'a RangeCalculator {
        self.calculator
    }

    /// Classify a predicted height for a child of the given age and gender.
    ///
    /// An age without reference data yields [`GrowthStatus::OutOfRange`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMeasurement`] if `predicted` is not finite, and
    /// propagates [`Error::DataIntegrity`] from the range calculation.
    pub fn classify(&self, predicted: f64, age_years: u32, gender: Gender) -> Result<GrowthVerdict> {
        if !predicted.is_finite() {
            return Err(Error::invalid_measurement(
                "predicted_height",
                format!("must be a finite number, got {predicted}"),
            ));
        }

        let Some(range) = self.calculator.expected_range(age_years, gender)? else {
            debug!("No reference range for {} aged {}", gender, age_years);
            return Ok(GrowthVerdict::out_of_range(predicted));
        };

        let status = classify_against(predicted, range);
        debug!(
            "Classified {:.2} for {} aged {} as {}",
            predicted, gender, age_years, status
        );
        Ok(GrowthVerdict::within(status, predicted, range))
    }
}
