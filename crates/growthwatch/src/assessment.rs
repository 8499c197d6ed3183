//! End-to-end growth assessment.
//!
//! Ties the pieces together: a child's current measurements are validated,
//! turned into an estimator record, fed to the height model, and the
//! prediction is classified against the reference range for the child's
//! current age. A horizon shifts that age forward when the range for a later
//! age is wanted instead.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bmi::{bmi, BmiCategory};
use crate::classify::{GrowthClassifier, GrowthVerdict};
use crate::error::{Error, Result};
use crate::estimator::{EstimatorInput, HeightEstimator};
use crate::range::RangeCalculator;
use crate::reference::Gender;

/// Oldest accepted current age, in years.
pub const MAX_PROFILE_AGE_YEARS: u32 = 18;

/// Accepted current height range, in centimetres.
pub const HEIGHT_RANGE_CM: (f64, f64) = (50.0, 200.0);

/// Accepted current weight range, in kilograms.
pub const WEIGHT_RANGE_KG: (f64, f64) = (5.0, 100.0);

/// Default number of years added to the current age before classifying.
pub const DEFAULT_HORIZON_YEARS: u32 = 0;

/// A child's current measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    /// Age in whole years.
    pub age_years: u32,
    /// Reference curve to compare against.
    pub gender: Gender,
    /// Current height in centimetres.
    pub height_cm: f64,
    /// Current weight in kilograms.
    pub weight_kg: f64,
}

impl ChildProfile {
    /// Check the measurements fall within the accepted input limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMeasurement`] for the first out-of-limit field.
    pub fn validate(&self) -> Result<()> {
        if self.age_years > MAX_PROFILE_AGE_YEARS {
            return Err(Error::invalid_measurement(
                "age_years",
                format!(
                    "must be between 0 and {MAX_PROFILE_AGE_YEARS}, got {}",
                    self.age_years
                ),
            ));
        }
        check_between("height_cm", self.height_cm, HEIGHT_RANGE_CM)?;
        check_between("weight_kg", self.weight_kg, WEIGHT_RANGE_KG)?;
        Ok(())
    }
}

fn check_between(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_measurement(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ))
    }
}

/// Result of a full assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthAssessment {
    /// The measurements that were assessed.
    pub profile: ChildProfile,
    /// Current body mass index.
    pub bmi: f64,
    /// Band of the current BMI.
    pub bmi_category: BmiCategory,
    /// Height predicted by the estimator.
    pub predicted_height: f64,
    /// Age whose expected range the prediction was classified against.
    pub target_age_years: u32,
    /// Classification of the predicted height.
    pub verdict: GrowthVerdict,
}

/// Runs the estimator and classifier for child profiles.
///
/// Both collaborators are borrowed: they are built once at startup and shared.
pub struct GrowthAssessor<'a> {
    classifier: GrowthClassifier<'a>,
    estimator: &'a dyn HeightEstimator,
    horizon_years: u32,
}

impl std::fmt::Debug for GrowthAssessor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowthAssessor")
            .field("classifier", &self.classifier)
            .field("estimator", &self.estimator.name())
            .field("horizon_years", &self.horizon_years)
            .finish()
    }
}

impl<'a> GrowthAssessor<'a> {
    /// Create an assessor that classifies at the child's current age.
    #[must_use]
    pub fn new(calculator: &'a RangeCalculator, estimator: &'a dyn HeightEstimator) -> Self {
        Self {
            classifier: GrowthClassifier::new(calculator),
            estimator,
            horizon_years: DEFAULT_HORIZON_YEARS,
        }
    }

    /// Set how many years are added to the current age before classifying.
    #[must_use]
    pub fn with_horizon(mut self, horizon_years: u32) -> Self {
        self.horizon_years = horizon_years;
        self
    }

    /// The configured prediction horizon.
    #[must_use]
    pub fn horizon_years(&self) -> u32 {
        self.horizon_years
    }

    /// Assess a child's growth.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMeasurement`] for out-of-limit input,
    /// [`Error::Estimator`] if the model fails, and propagates
    /// [`Error::DataIntegrity`] from the range calculation.
    pub fn assess(&self, profile: &ChildProfile) -> Result<GrowthAssessment> {
        profile.validate()?;

        let bmi = bmi(profile.height_cm, profile.weight_kg)?;
        let input = EstimatorInput {
            age: profile.age_years,
            height: profile.height_cm,
            weight: profile.weight_kg,
            bmi,
        };

        let predicted_height = self.estimator.predict(&input)?;
        debug!(
            "Estimator '{}' predicted {:.2} cm from {:?}",
            self.estimator.name(),
            predicted_height,
            input
        );

        let target_age_years = profile.age_years.saturating_add(self.horizon_years);
        let verdict = self
            .classifier
            .classify(predicted_height, target_age_years, profile.gender)?;

        info!(
            "Assessed {} aged {}: predicted {:.2} cm at age {} ({})",
            profile.gender, profile.age_years, predicted_height, target_age_years, verdict.status
        );

        Ok(GrowthAssessment {
            profile: *profile,
            bmi,
            bmi_category: BmiCategory::from_bmi(bmi),
            predicted_height,
            target_age_years,
            verdict,
        })
    }
}
