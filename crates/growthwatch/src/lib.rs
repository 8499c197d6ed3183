//! `growthwatch` - Child growth screening against WHO reference standards
//!
//! This library computes the expected height range for a child's age and gender
//! from LMS growth reference tables, and classifies measured or predicted
//! heights as normal, undergrowth or overgrowth.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod assessment;
pub mod bmi;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod estimator;
pub mod logging;
pub mod range;
pub mod reference;
pub mod storage;

pub use assessment::{ChildProfile, GrowthAssessment, GrowthAssessor};
pub use bmi::{bmi, BmiCategory};
pub use classify::{classify_against, GrowthClassifier, GrowthStatus, GrowthVerdict};
pub use config::Config;
pub use error::{Error, Result};
pub use estimator::{EstimatorInput, HeightEstimator, LinearEstimator};
pub use logging::init_logging;
pub use range::{ExpectedRange, RangeCalculator};
pub use reference::{Gender, GrowthReferenceRow, LmsParams, ReferenceTable};
pub use storage::{ImportOutcome, ReferenceSource, ReferenceStore, StoreStats};
