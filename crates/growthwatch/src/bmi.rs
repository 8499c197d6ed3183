//! Body mass index and its pediatric category bands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Compute BMI from height in centimetres and weight in kilograms.
///
/// # Errors
///
/// Returns [`Error::InvalidMeasurement`] if either value is not a positive
/// finite number.
pub fn bmi(height_cm: f64, weight_kg: f64) -> Result<f64> {
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(Error::invalid_measurement(
            "height_cm",
            format!("must be a positive number, got {height_cm}"),
        ));
    }
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(Error::invalid_measurement(
            "weight_kg",
            format!("must be a positive number, got {weight_kg}"),
        ));
    }
    let height_m = height_cm / 100.0;
    Ok(weight_kg / (height_m * height_m))
}

/// Coarse BMI band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    /// BMI below 14.
    Underweight,
    /// BMI from 14 up to 18.
    Normal,
    /// BMI from 18 up to 21.
    SlightlyOverweight,
    /// BMI of 21 or more.
    Overweight,
}

impl BmiCategory {
    /// Band a BMI value.
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 14.0 {
            Self::Underweight
        } else if bmi < 18.0 {
            Self::Normal
        } else if bmi < 21.0 {
            Self::SlightlyOverweight
        } else {
            Self::Overweight
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Underweight => write!(f, "Underweight"),
            Self::Normal => write!(f, "Normal"),
            Self::SlightlyOverweight => write!(f, "Slightly Overweight"),
            Self::Overweight => write!(f, "Overweight"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_value() {
        let value = bmi(100.0, 20.0).unwrap();
        assert!((value - 20.0).abs() < 1e-9);

        let value = bmi(150.0, 45.0).unwrap();
        assert!((value - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_bmi_rejects_bad_input() {
        assert!(bmi(0.0, 20.0).unwrap_err().is_invalid_input());
        assert!(bmi(-100.0, 20.0).is_err());
        assert!(bmi(100.0, 0.0).is_err());
        assert!(bmi(f64::NAN, 20.0).is_err());
        assert!(bmi(100.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_category_bands() {
        assert_eq!(BmiCategory::from_bmi(13.99), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(14.0), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(17.99), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(18.0), BmiCategory::SlightlyOverweight);
        assert_eq!(BmiCategory::from_bmi(20.99), BmiCategory::SlightlyOverweight);
        assert_eq!(BmiCategory::from_bmi(21.0), BmiCategory::Overweight);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(
            BmiCategory::SlightlyOverweight.to_string(),
            "Slightly Overweight"
        );
        assert_eq!(
            serde_json::to_string(&BmiCategory::SlightlyOverweight).unwrap(),
            "\"slightly_overweight\""
        );
    }
}
