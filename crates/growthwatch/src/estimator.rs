//! Height prediction models.
//!
//! The classifier only needs a number to compare, so any model that maps the
//! fixed `{age, height, weight, BMI}` record to a predicted height can be used.
//! Closures implement [`HeightEstimator`] directly, which makes swapping in a
//! different model (or a stub in tests) trivial.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Input record for a height estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorInput {
    /// Current age in whole years.
    pub age: u32,
    /// Current height in centimetres.
    pub height: f64,
    /// Current weight in kilograms.
    pub weight: f64,
    /// Body mass index derived from height and weight.
    #[serde(rename = "BMI")]
    pub bmi: f64,
}

/// A model predicting future height.
///
/// Implementations must return a height in the same unit as the input height.
pub trait HeightEstimator {
    /// Short name of the model (for logging/output).
    fn name(&self) -> &str {
        "custom"
    }

    /// Predict the height for the given record.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot produce a prediction.
    fn predict(&self, input: &EstimatorInput) -> Result<f64>;
}

impl<F> HeightEstimator for F
where
    F: Fn(&EstimatorInput) -> f64,
{
    fn predict(&self, input: &EstimatorInput) -> Result<f64> {
        Ok(self(input))
    }
}

/// Linear model over the estimator input.
///
/// `predicted = intercept + age*a + height*h + weight*w + bmi*b`. The default
/// coefficients add 5 cm to the current height, the average yearly gain in
/// the 5 to 19 year range of the reference data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearEstimator {
    /// Constant term.
    pub intercept: f64,
    /// Coefficient for age in years.
    pub age: f64,
    /// Coefficient for height in centimetres.
    pub height: f64,
    /// Coefficient for weight in kilograms.
    pub weight: f64,
    /// Coefficient for BMI.
    pub bmi: f64,
}

impl Default for LinearEstimator {
    fn default() -> Self {
        Self {
            intercept: 5.0,
            age: 0.0,
            height: 1.0,
            weight: 0.0,
            bmi: 0.0,
        }
    }
}

impl LinearEstimator {
    /// Check all coefficients are finite.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] naming the first non-finite
    /// coefficient.
    pub fn validate(&self) -> Result<()> {
        let coefficients = [
            ("intercept", self.intercept),
            ("age", self.age),
            ("height", self.height),
            ("weight", self.weight),
            ("bmi", self.bmi),
        ];
        for (name, value) in coefficients {
            if !value.is_finite() {
                return Err(Error::ConfigValidation {
                    message: format!("estimator coefficient '{name}' must be finite, got {value}"),
                });
            }
        }
        Ok(())
    }
}

impl HeightEstimator for LinearEstimator {
    fn name(&self) -> &str {
        "linear"
    }

    fn predict(&self, input: &EstimatorInput) -> Result<f64> {
        let predicted = self.intercept
            + self.age * f64::from(input.age)
            + self.height * input.height
            + self.weight * input.weight
            + self.bmi * input.bmi;

        if predicted.is_finite() {
            Ok(predicted)
        } else {
            Err(Error::estimator(format!(
                "linear model produced a non-finite prediction for {input:?}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> EstimatorInput {
        EstimatorInput {
            age: 10,
            height: 138.0,
            weight: 32.0,
            bmi: 16.8,
        }
    }

    #[test]
    fn test_default_linear_adds_yearly_gain() {
        let model = LinearEstimator::default();
        let predicted = model.predict(&input()).unwrap();
        assert!((predicted - 143.0).abs() < 1e-9);
        assert_eq!(model.name(), "linear");
    }

    #[test]
    fn test_linear_uses_all_features() {
        let model = LinearEstimator {
            intercept: 1.0,
            age: 2.0,
            height: 0.5,
            weight: 0.25,
            bmi: 1.0,
        };
        // 1 + 20 + 69 + 8 + 16.8
        let predicted = model.predict(&input()).unwrap();
        assert!((predicted - 114.8).abs() < 1e-9);
    }

    #[test]
    fn test_linear_non_finite_prediction() {
        let model = LinearEstimator::default();
        let mut record = input();
        record.height = f64::INFINITY;
        let err = model.predict(&record).unwrap_err();
        assert!(matches!(err, Error::Estimator(_)));
    }

    #[test]
    fn test_validate_coefficients() {
        assert!(LinearEstimator::default().validate().is_ok());

        let model = LinearEstimator {
            weight: f64::NAN,
            ..LinearEstimator::default()
        };
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("'weight'"));
    }

    #[test]
    fn test_closure_is_an_estimator() {
        let model = |record: &EstimatorInput| record.height + 2.5;
        let predicted = model.predict(&input()).unwrap();
        assert!((predicted - 140.5).abs() < 1e-9);
        assert_eq!(model.name(), "custom");
    }

    #[test]
    fn test_estimators_are_swappable_behind_dyn() {
        let models: Vec<Box<dyn HeightEstimator>> = vec![
            Box::new(LinearEstimator::default()),
            Box::new(|_: &EstimatorInput| 150.0),
        ];
        let predictions: Vec<f64> = models
            .iter()
            .map(|m| m.predict(&input()).unwrap())
            .collect();
        assert_eq!(predictions.len(), 2);
        assert!((predictions[1] - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_input_serializes_bmi_uppercase() {
        let json = serde_json::to_string(&input()).unwrap();
        assert!(json.contains("\"BMI\":16.8"));
    }

    #[test]
    fn test_linear_deserialize_partial() {
        let model: LinearEstimator = serde_json::from_str(r#"{"intercept": 6.0}"#).unwrap();
        assert!((model.intercept - 6.0).abs() < f64::EPSILON);
        assert!((model.height - 1.0).abs() < f64::EPSILON);
    }
}
