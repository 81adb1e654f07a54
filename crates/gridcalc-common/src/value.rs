use chrono::{Datelike, Duration as ChronoDur, NaiveDate};
use std::fmt::{self, Display};

use crate::ErrorCode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ───────────────────── date-serial utilities ───────────────────
1900 system:
  Serial 1  = 1900-01-01
  Serial 59 = 1900-02-28
  Serial 60 = 1900-02-29  (phantom – doesn't exist, but Excel thinks it does)
  Serial 61 = 1900-03-01
Base date = 1899-12-31 so that serial 1 = base + 1 day = 1900-01-01.
1904 system:
  Serial 0  = 1904-01-01, no phantom day.
Time is stored as fractional days (no timezone).
------------------------------------------------------------------- */

const EPOCH_1900: NaiveDate = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
const FIRST_REAL_MARCH_1900: NaiveDate = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap();
const EPOCH_1904: NaiveDate = NaiveDate::from_ymd_opt(1904, 1, 1).unwrap();

/// Largest serial Excel accepts: 9999-12-31 in the 1900 system.
pub const MAX_DATE_SERIAL: f64 = 2_958_465.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateSystem {
    #[default]
    Excel1900,
    Excel1904,
}

impl Display for DateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSystem::Excel1900 => write!(f, "1900"),
            DateSystem::Excel1904 => write!(f, "1904"),
        }
    }
}

impl DateSystem {
    /// Whole-day serial for a calendar date.
    pub fn date_to_serial(self, date: NaiveDate) -> f64 {
        match self {
            DateSystem::Excel1900 => {
                let days = (date - EPOCH_1900).num_days();
                // Dates on or after 1900-03-01 get +1 to account for phantom Feb 29
                if date >= FIRST_REAL_MARCH_1900 {
                    (days + 1) as f64
                } else {
                    days as f64
                }
            }
            DateSystem::Excel1904 => (date - EPOCH_1904).num_days() as f64,
        }
    }

    /// Calendar date for a serial; the fractional (time) part is dropped.
    /// Returns `None` for negative serials and serials past 9999-12-31.
    pub fn serial_to_date(self, serial: f64) -> Option<NaiveDate> {
        if !serial.is_finite() || !(0.0..MAX_DATE_SERIAL + 1.0).contains(&serial) {
            return None;
        }
        let days = serial.trunc() as i64;
        let date = match self {
            DateSystem::Excel1900 => {
                if days == 60 {
                    // phantom 1900-02-29; map to 1900-02-28
                    NaiveDate::from_ymd_opt(1900, 2, 28)?
                } else {
                    let offset = if days < 60 { days } else { days - 1 };
                    EPOCH_1900.checked_add_signed(ChronoDur::try_days(offset)?)?
                }
            }
            DateSystem::Excel1904 => EPOCH_1904.checked_add_signed(ChronoDur::try_days(days)?)?,
        };
        if date.year() > 9999 {
            return None;
        }
        Some(date)
    }
}

/* ───────────────────── number rendering ───────────────────── */

/// Render a number the way the "General" format does when a number is
/// turned into text: at most 15 significant digits, no trailing zeros, and
/// scientific notation at or above 1E+15 and below 1E-9.
pub fn number_to_text(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if !n.is_finite() {
        return ErrorCode::Num.to_string();
    }
    let abs = n.abs();
    if !(1e-9..1e15).contains(&abs) {
        let formatted = format!("{n:.14e}");
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let mantissa = trim_fraction(mantissa);
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}E{sign}{:02}", exponent.abs());
    }
    let magnitude = abs.log10().floor() as i32;
    let decimals = (14 - magnitude).clamp(0, 24) as usize;
    trim_fraction(&format!("{n:.decimals$}")).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/* ───────────────────── values ───────────────────── */

/// Rectangular, row-major grid of values; never empty and never nested.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    rows: usize,
    cols: usize,
    data: Vec<Value>,
}

impl ArrayValue {
    /// Build from row-major data. Nested arrays collapse to their top-left
    /// element. `None` if a dimension is zero or the data length disagrees.
    pub fn new(rows: usize, cols: usize, data: Vec<Value>) -> Option<Self> {
        if rows == 0 || cols == 0 || data.len() != rows * cols {
            return None;
        }
        let data = data
            .into_iter()
            .map(|v| match v {
                Value::Array(inner) => inner.into_top_left(),
                other => other,
            })
            .collect();
        Some(Self { rows, cols, data })
    }

    /// Build from a list of rows. `None` for ragged or empty input.
    pub fn from_rows(rows: Vec<Vec<Value>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Self::new(height, width, rows.into_iter().flatten().collect())
    }

    pub fn filled(rows: usize, cols: usize, value: Value) -> Option<Self> {
        Self::new(rows, cols, vec![value; rows.saturating_mul(cols)])
    }

    pub fn single(value: Value) -> Self {
        Self {
            rows: 1,
            cols: 1,
            data: vec![match value {
                Value::Array(inner) => inner.into_top_left(),
                other => other,
            }],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Implicit-intersection element.
    pub fn top_left(&self) -> &Value {
        &self.data[0]
    }

    pub fn into_top_left(self) -> Value {
        self.data.into_iter().next().unwrap_or(Value::Blank)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.data.iter()
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Value]> {
        self.data.chunks(self.cols)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.data
    }

    pub fn map<F>(&self, f: F) -> Self
    where
        F: FnMut(&Value) -> Value,
    {
        let data = self.data.iter().map(f).collect();
        // same dimensions, so the invariant still holds
        Self::new(self.rows, self.cols, data).unwrap_or_else(|| self.clone())
    }
}

/// A single evaluation result.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorCode),
    #[default]
    Blank,
    Array(ArrayValue),
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&number_to_text(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Error(e) => write!(f, "{e}"),
            Value::Blank => Ok(()),
            Value::Array(a) => {
                f.write_str("{")?;
                for (r, row) in a.iter_rows().enumerate() {
                    if r > 0 {
                        f.write_str(";")?;
                    }
                    for (c, v) in row.iter().enumerate() {
                        if c > 0 {
                            f.write_str(",")?;
                        }
                        match v {
                            Value::Text(s) => write!(f, "\"{s}\"")?,
                            other => write!(f, "{other}")?,
                        }
                    }
                }
                f.write_str("}")
            }
        }
    }
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Blank)
    }

    pub fn error(&self) -> Option<ErrorCode> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Top-left element for arrays, the value itself otherwise.
    pub fn scalar(&self) -> &Value {
        match self {
            Value::Array(a) => a.top_left(),
            other => other,
        }
    }

    pub fn into_scalar(self) -> Value {
        match self {
            Value::Array(a) => a.into_top_left(),
            other => other,
        }
    }

    /// Replace a non-finite number with `#NUM!`.
    pub fn sanitized(self) -> Value {
        match self {
            Value::Number(n) if !n.is_finite() => Value::Error(ErrorCode::Num),
            Value::Array(a) => Value::Array(a.map(|v| v.clone().sanitized())),
            other => other,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Error(_) => "error",
            Value::Blank => "blank",
            Value::Array(_) => "array",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<ErrorCode> for Value {
    fn from(e: ErrorCode) -> Self {
        Value::Error(e)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Self {
        Value::Array(a)
    }
}
