//! Parser for WHO-style LMS reference tables.
//!
//! Accepts the plain-text and spreadsheet-exported layouts the WHO publishes:
//! a header line naming the columns followed by one row per month. Fields may
//! be separated by tabs, commas, semicolons, or runs of spaces. Columns other
//! than month, L, M and S (percentiles, SD lines) are ignored.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use super::{Gender, GrowthReferenceRow, LmsParams};
use crate::error::{Error, Result};

/// Pattern matching a field separator.
const FIELD_SEPARATOR: &str = r"\s*[,;\t]\s*|\s+";

static FIELD_SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();

/// The compiled field separator, built on first use.
fn field_separator() -> &'static Regex {
    FIELD_SEPARATOR_REGEX
        .get_or_init(|| Regex::new(FIELD_SEPARATOR).expect("field separator pattern is valid"))
}

/// Header names accepted for the month column.
const MONTH_HEADERS: &[&str] = &["month", "months", "age_months", "agemos", "age"];

/// Column positions discovered from the header line.
#[derive(Debug, Clone, Copy)]
struct Columns {
    month: usize,
    l: usize,
    m: usize,
    s: usize,
}

impl Columns {
    fn from_header(fields: &[&str], line: usize) -> Result<Self> {
        let find = |names: &[&str], label: &str| {
            fields
                .iter()
                .position(|f| names.iter().any(|n| f.eq_ignore_ascii_case(n)))
                .ok_or_else(|| Error::reference_parse(line, format!("missing '{label}' column")))
        };

        Ok(Self {
            month: find(MONTH_HEADERS, "Month")?,
            l: find(&["l"], "L")?,
            m: find(&["m"], "M")?,
            s: find(&["s"], "S")?,
        })
    }

    fn width(self) -> usize {
        self.month.max(self.l).max(self.m).max(self.s) + 1
    }
}

/// Parse a reference table for one gender from delimited text.
///
/// Blank lines and lines starting with `#` are skipped. The first remaining
/// line must be the header.
///
/// # Errors
///
/// Returns [`Error::ReferenceParse`] with the offending line number if the
/// header lacks a required column or a row has a missing or non-numeric value.
pub fn parse_lms_table(text: &str, gender: Gender) -> Result<Vec<GrowthReferenceRow>> {
    let separator = field_separator();

    let mut columns: Option<Columns> = None;
    let mut rows = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim().trim_start_matches('\u{feff}');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = separator
            .split(line)
            .map(|f| f.trim_matches('"'))
            .collect();

        let Some(cols) = columns else {
            let cols = Columns::from_header(&fields, line_no)?;
            debug!("Reference header at line {}: {:?}", line_no, cols);
            columns = Some(cols);
            continue;
        };

        if fields.len() < cols.width() {
            return Err(Error::reference_parse(
                line_no,
                format!(
                    "expected at least {} fields, found {}",
                    cols.width(),
                    fields.len()
                ),
            ));
        }

        let month = parse_month(fields[cols.month], line_no)?;
        let l = parse_number(fields[cols.l], "L", line_no)?;
        let m = parse_number(fields[cols.m], "M", line_no)?;
        let s = parse_number(fields[cols.s], "S", line_no)?;

        rows.push(GrowthReferenceRow::new(month, gender, LmsParams::new(l, m, s)));
    }

    if columns.is_none() {
        return Err(Error::reference_parse(0, "no header line found"));
    }

    Ok(rows)
}

/// Read and parse a reference table file for one gender.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or a parse error as
/// described in [`parse_lms_table`].
pub fn load_lms_file(path: impl AsRef<Path>, gender: Gender) -> Result<Vec<GrowthReferenceRow>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let rows = parse_lms_table(&text, gender)?;
    info!(
        "Parsed {} {} reference rows from {}",
        rows.len(),
        gender,
        path.display()
    );
    Ok(rows)
}

fn parse_month(field: &str, line: usize) -> Result<u32> {
    field.parse::<u32>().map_err(|_| {
        Error::reference_parse(line, format!("month '{field}' is not a whole number"))
    })
}

fn parse_number(field: &str, name: &str, line: usize) -> Result<f64> {
    let value = field
        .parse::<f64>()
        .map_err(|_| Error::reference_parse(line, format!("non-numeric {name} value '{field}'")))?;
    if !value.is_finite() {
        return Err(Error::reference_parse(
            line,
            format!("{name} value '{field}' is not finite"),
        ));
    }
    Ok(value)
}
