//! Growth reference table.
//!
//! Holds the per-gender, per-month LMS parameters of a growth standard
//! (WHO 2007 height-for-age for ages 5 to 19 years). The table is built once,
//! validated, and read-only afterwards, so it can be shared freely between
//! threads without locking.
//!
//! # Example
//!
//! ```
//! use growthwatch::reference::{Gender, GrowthReferenceRow, LmsParams, ReferenceTable};
//!
//! let table = ReferenceTable::from_rows(vec![GrowthReferenceRow::new(
//!     120,
//!     Gender::Male,
//!     LmsParams::new(1.0, 138.6, 0.05),
//! )])
//! .unwrap();
//!
//! assert!(table.lookup(10, Gender::Male).is_some());
//! assert!(table.lookup(10, Gender::Female).is_none());
//! ```

mod parse;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub use parse::{load_lms_file, parse_lms_table};

/// Youngest age, in months, the growth standard is defined for.
pub const MIN_AGE_MONTHS: u32 = 5 * 12;

/// Oldest age, in months, the growth standard is defined for.
pub const MAX_AGE_MONTHS: u32 = 19 * 12;

/// Biological sex used to select the reference curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Boys reference curve.
    Male,
    /// Girls reference curve.
    Female,
}

impl Gender {
    /// Both genders, in storage order.
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// Stable lowercase name used in storage and output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "boy" | "boys" => Ok(Self::Male),
            "female" | "f" | "girl" | "girls" => Ok(Self::Female),
            other => Err(Error::invalid_measurement(
                "gender",
                format!("unknown gender '{other}', expected male or female"),
            )),
        }
    }
}

/// Box-Cox distribution parameters for one age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmsParams {
    /// Box-Cox power (skewness).
    pub l: f64,
    /// Median.
    pub m: f64,
    /// Coefficient of variation.
    pub s: f64,
}

impl LmsParams {
    /// Create a new parameter set.
    #[must_use]
    pub fn new(l: f64, m: f64, s: f64) -> Self {
        Self { l, m, s }
    }

    /// Check the parameters describe a usable distribution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataIntegrity`] if any value is non-finite, or if the
    /// median or coefficient of variation is not positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.l.is_finite() && self.m.is_finite() && self.s.is_finite()) {
            return Err(Error::data_integrity(format!(
                "non-finite LMS parameters (L={}, M={}, S={})",
                self.l, self.m, self.s
            )));
        }
        if self.m <= 0.0 {
            return Err(Error::data_integrity(format!(
                "median M must be positive, got {}",
                self.m
            )));
        }
        if self.s <= 0.0 {
            return Err(Error::data_integrity(format!(
                "coefficient of variation S must be positive, got {}",
                self.s
            )));
        }
        Ok(())
    }
}

/// One row of a growth reference table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthReferenceRow {
    /// Age in completed months.
    pub age_months: u32,
    /// Which curve the row belongs to.
    pub gender: Gender,
    /// Distribution parameters at this age.
    #[serde(flatten)]
    pub params: LmsParams,
}

impl GrowthReferenceRow {
    /// Create a new reference row.
    #[must_use]
    pub fn new(age_months: u32, gender: Gender, params: LmsParams) -> Self {
        Self {
            age_months,
            gender,
            params,
        }
    }
}

/// Immutable growth reference table, keyed by gender and month of age.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    male: BTreeMap<u32, LmsParams>,
    female: BTreeMap<u32, LmsParams>,
}

impl ReferenceTable {
    /// Build a table from rows, validating every entry.
    ///
    /// Gaps in the month sequence are accepted (a lookup into a gap simply
    /// finds nothing) but are logged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataIntegrity`] for invalid parameters or if the same
    /// gender and month appear twice.
    pub fn from_rows(rows: impl IntoIterator<Item = GrowthReferenceRow>) -> Result<Self> {
        let mut table = Self::default();

        for row in rows {
            row.params.validate().map_err(|err| {
                Error::data_integrity(format!(
                    "{} row at month {}: {err}",
                    row.gender, row.age_months
                ))
            })?;

            let curve = table.curve_mut(row.gender);
            if curve.insert(row.age_months, row.params).is_some() {
                return Err(Error::data_integrity(format!(
                    "duplicate {} row for month {}",
                    row.gender, row.age_months
                )));
            }
        }

        for gender in Gender::ALL {
            let gaps = table.gaps(gender);
            if !gaps.is_empty() {
                warn!(
                    "{} reference curve has {} missing month(s) between {:?}",
                    gender,
                    gaps.len(),
                    table.month_range(gender)
                );
            }
        }

        debug!(
            "Reference table built with {} male and {} female rows",
            table.male.len(),
            table.female.len()
        );
        Ok(table)
    }

    fn curve(&self, gender: Gender) -> &BTreeMap<u32, LmsParams> {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }

    fn curve_mut(&mut self, gender: Gender) -> &mut BTreeMap<u32, LmsParams> {
        match gender {
            Gender::Male => &mut self.male,
            Gender::Female => &mut self.female,
        }
    }

    /// Look up the LMS parameters for an age in whole years.
    ///
    /// Only exact month matches are returned; there is no interpolation.
    /// Returns `None` if the age is outside 5 to 19 years or the table has no
    /// row for that month.
    #[must_use]
    pub fn lookup(&self, age_years: u32, gender: Gender) -> Option<LmsParams> {
        let age_months = age_years.checked_mul(12)?;
        self.lookup_month(age_months, gender)
    }

    /// Look up the LMS parameters for an exact month of age.
    #[must_use]
    pub fn lookup_month(&self, age_months: u32, gender: Gender) -> Option<LmsParams> {
        if !(MIN_AGE_MONTHS..=MAX_AGE_MONTHS).contains(&age_months) {
            debug!(
                "Age {} months outside reference domain {}..={}",
                age_months, MIN_AGE_MONTHS, MAX_AGE_MONTHS
            );
            return None;
        }

        let params = self.curve(gender).get(&age_months).copied();
        if params.is_none() {
            debug!("No {} reference row for month {}", gender, age_months);
        }
        params
    }

    /// First and last month present for a gender.
    #[must_use]
    pub fn month_range(&self, gender: Gender) -> Option<(u32, u32)> {
        let curve = self.curve(gender);
        let first = curve.keys().next()?;
        let last = curve.keys().next_back()?;
        Some((*first, *last))
    }

    /// Months missing between the first and last row of a gender.
    #[must_use]
    pub fn gaps(&self, gender: Gender) -> Vec<u32> {
        let curve = self.curve(gender);
        let Some((first, last)) = self.month_range(gender) else {
            return Vec::new();
        };
        (first..=last).filter(|m| !curve.contains_key(m)).collect()
    }

    /// Whole-year ages that [`lookup`](Self::lookup) can answer, as an
    /// inclusive `(youngest, oldest)` pair.
    ///
    /// With the WHO 2007 tables, which start at 61 months, this is `(6, 19)`.
    /// Years inside the span may still lack a row when the table has gaps.
    #[must_use]
    pub fn supported_age_years(&self, gender: Gender) -> Option<(u32, u32)> {
        let curve = self.curve(gender);
        let mut ages = (MIN_AGE_MONTHS / 12..=MAX_AGE_MONTHS / 12)
            .filter(|years| curve.contains_key(&(years * 12)));
        let youngest = ages.next()?;
        let oldest = ages.last().unwrap_or(youngest);
        Some((youngest, oldest))
    }

    /// Rows of one gender in ascending month order.
    pub fn rows(&self, gender: Gender) -> impl Iterator<Item = GrowthReferenceRow> + '_ {
        self.curve(gender)
            .iter()
            .map(move |(month, params)| GrowthReferenceRow::new(*month, gender, *params))
    }

    /// Number of rows for a gender.
    #[must_use]
    pub fn len_for(&self, gender: Gender) -> usize {
        self.curve(gender).len()
    }

    /// Total number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.male.len() + self.female.len()
    }

    /// Check if the table has no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.male.is_empty() && self.female.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(month: u32, gender: Gender, m: f64) -> GrowthReferenceRow {
        GrowthReferenceRow::new(month, gender, LmsParams::new(1.0, m, 0.045))
    }

    fn sample_table() -> ReferenceTable {
        ReferenceTable::from_rows(vec![
            row(61, Gender::Male, 110.3),
            row(72, Gender::Male, 116.0),
            row(120, Gender::Male, 138.6),
            row(228, Gender::Male, 176.5),
            row(120, Gender::Female, 138.4),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_exact_month() {
        let table = sample_table();
        let params = table.lookup(10, Gender::Male).unwrap();
        assert!((params.m - 138.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lookup_selects_gender() {
        let table = sample_table();
        let female = table.lookup(10, Gender::Female).unwrap();
        assert!((female.m - 138.4).abs() < f64::EPSILON);
        assert!(table.lookup(6, Gender::Female).is_none());
    }

    #[test]
    fn test_lookup_gap_is_none() {
        let table = sample_table();
        assert!(table.lookup(8, Gender::Male).is_none());
    }

    #[test]
    fn test_lookup_outside_domain() {
        let table = ReferenceTable::from_rows(vec![
            row(48, Gender::Male, 103.0),
            row(240, Gender::Male, 177.0),
        ])
        .unwrap();
        assert!(table.lookup(4, Gender::Male).is_none());
        assert!(table.lookup(20, Gender::Male).is_none());
    }

    #[test]
    fn test_lookup_upper_domain_edge() {
        let table = sample_table();
        assert!(table.lookup(19, Gender::Male).is_some());
    }

    #[test]
    fn test_lookup_overflowing_age() {
        let table = sample_table();
        assert!(table.lookup(u32::MAX, Gender::Male).is_none());
    }

    #[test]
    fn test_duplicate_row_rejected() {
        let result = ReferenceTable::from_rows(vec![
            row(120, Gender::Male, 138.6),
            row(120, Gender::Male, 139.0),
        ]);
        let err = result.unwrap_err();
        assert!(err.is_data_integrity());
        assert!(err.to_string().contains("duplicate male row for month 120"));
    }

    #[test]
    fn test_same_month_different_gender_allowed() {
        let table = ReferenceTable::from_rows(vec![
            row(120, Gender::Male, 138.6),
            row(120, Gender::Female, 138.4),
        ])
        .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad = GrowthReferenceRow::new(120, Gender::Male, LmsParams::new(1.0, f64::NAN, 0.05));
        assert!(ReferenceTable::from_rows(vec![bad])
            .unwrap_err()
            .is_data_integrity());

        let bad = GrowthReferenceRow::new(120, Gender::Male, LmsParams::new(1.0, 0.0, 0.05));
        assert!(ReferenceTable::from_rows(vec![bad])
            .unwrap_err()
            .to_string()
            .contains("median"));

        let bad = GrowthReferenceRow::new(120, Gender::Male, LmsParams::new(1.0, 138.6, -0.1));
        assert!(ReferenceTable::from_rows(vec![bad])
            .unwrap_err()
            .to_string()
            .contains("coefficient of variation"));
    }

    #[test]
    fn test_month_range_and_gaps() {
        let table = ReferenceTable::from_rows(vec![
            row(60, Gender::Female, 109.0),
            row(61, Gender::Female, 109.6),
            row(63, Gender::Female, 110.7),
        ])
        .unwrap();
        assert_eq!(table.month_range(Gender::Female), Some((60, 63)));
        assert_eq!(table.gaps(Gender::Female), vec![62]);
        assert_eq!(table.month_range(Gender::Male), None);
        assert!(table.gaps(Gender::Male).is_empty());
    }

    #[test]
    fn test_supported_age_years_starts_at_first_whole_year() {
        let table = sample_table();
        // Month 61 is not a whole year, so age 5 is not answerable.
        assert_eq!(table.supported_age_years(Gender::Male), Some((6, 19)));
        assert_eq!(table.supported_age_years(Gender::Female), Some((10, 10)));
    }

    #[test]
    fn test_supported_age_years_spans_interior_gaps() {
        let table = sample_table();
        let (youngest, oldest) = table.supported_age_years(Gender::Male).unwrap();
        assert!((youngest..=oldest).contains(&7));
        assert!(table.lookup(7, Gender::Male).is_none());
    }

    #[test]
    fn test_supported_age_years_empty() {
        let table = ReferenceTable::default();
        assert_eq!(table.supported_age_years(Gender::Male), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_rows_in_month_order() {
        let table = sample_table();
        let months: Vec<u32> = table.rows(Gender::Male).map(|r| r.age_months).collect();
        assert_eq!(months, vec![61, 72, 120, 228]);
        assert_eq!(table.len_for(Gender::Male), 4);
        assert_eq!(table.len_for(Gender::Female), 1);
    }

    #[test]
    fn test_gender_from_str() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("girls".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" F ".parse::<Gender>().unwrap(), Gender::Female);
        assert!("other".parse::<Gender>().unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_gender_display_round_trips() {
        for gender in Gender::ALL {
            assert_eq!(gender.to_string().parse::<Gender>().unwrap(), gender);
        }
    }

    #[test]
    fn test_table_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReferenceTable>();
    }

    #[test]
    fn test_row_serializes_flat() {
        let json = serde_json::to_string(&row(120, Gender::Male, 138.6)).unwrap();
        assert!(json.contains("\"gender\":\"male\""));
        assert!(json.contains("\"m\":138.6"));
    }
}
