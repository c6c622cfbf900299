use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Represents a cell value in a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    String(String),
}

impl CellValue {
    /// Check if the value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Check if the value is an int or a float
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Int(_) | CellValue::Float(_))
    }

    /// Try to get the value as a boolean
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Int(i) => Some(*i != 0),
            CellValue::Float(f) => Some(*f != 0.0),
            CellValue::String(s) => s.parse().ok(),
            CellValue::Null | CellValue::Date(_) | CellValue::DateTime(_) => None,
        }
    }

    /// Try to get the value as an integer
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) => Some(*f as i64),
            CellValue::Bool(b) => Some(i64::from(*b)),
            CellValue::String(s) => s.parse().ok(),
            CellValue::Null | CellValue::Date(_) | CellValue::DateTime(_) => None,
        }
    }

    /// Try to get the value as a float
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::String(s) => s.parse().ok(),
            CellValue::Null | CellValue::Date(_) | CellValue::DateTime(_) => None,
        }
    }

    /// Try to get the value as a calendar date
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::DateTime(dt) => Some(dt.date()),
            CellValue::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok(),
            _ => None,
        }
    }

    /// Get the value as a string.
    ///
    /// Dates render as ISO 8601; null renders as the empty string.
    #[must_use]
    pub fn as_str(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            CellValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            CellValue::String(s) => s.clone(),
        }
    }

    /// Parse a string into a `CellValue` with type inference
    /// Tries: null -> bool -> int -> float -> date -> datetime -> string
    #[must_use]
    pub fn parse(s: &str) -> CellValue {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Null;
        }

        match trimmed.to_lowercase().as_str() {
            "true" => return CellValue::Bool(true),
            "false" => return CellValue::Bool(false),
            _ => {}
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }

        if let Ok(d) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            return CellValue::Date(d);
        }

        if let Some(dt) = parse_datetime(trimmed) {
            return CellValue::DateTime(dt);
        }

        CellValue::String(s.to_string())
    }

    /// Total ordering used for sorting.
    ///
    /// Values of different kinds order as null < bool < number < date < datetime < text;
    /// ints and floats compare numerically with each other.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Int(a), CellValue::Int(b)) => a.cmp(b),
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a.cmp(b),
            (CellValue::String(a), CellValue::String(b)) => a.cmp(b),
            (a, b) if a.is_number() && b.is_number() => {
                let a = a.as_float().unwrap_or(f64::NAN);
                let b = b.as_float().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Int(_) | CellValue::Float(_) => 2,
            CellValue::Date(_) => 3,
            CellValue::DateTime(_) => 4,
            CellValue::String(_) => 5,
        }
    }

    /// Hashable identity key, distinguishing `Int(1)` from `String("1")`.
    pub(crate) fn key(&self) -> String {
        let tag = match self {
            CellValue::Null => 'n',
            CellValue::Bool(_) => 'b',
            CellValue::Int(_) => 'i',
            CellValue::Float(_) => 'f',
            CellValue::Date(_) => 'd',
            CellValue::DateTime(_) => 't',
            CellValue::String(_) => 's',
        };
        format!("{tag}:{}", self.as_str())
    }
}

/// Parse an ISO 8601 datetime with either a `T` or a space separator.
pub(crate) fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(fl) => write!(f, "{fl}"),
            CellValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            CellValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<u32> for CellValue {
    fn from(i: u32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<f32> for CellValue {
    fn from(f: f32) -> Self {
        CellValue::Float(f64::from(f))
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::approx_constant)]
    use super::*;

    #[test]
    fn test_parse_null() {
        assert_eq!(CellValue::parse(""), CellValue::Null);
        assert_eq!(CellValue::parse("  "), CellValue::Null);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(CellValue::parse("true"), CellValue::Bool(true));
        assert_eq!(CellValue::parse("FALSE"), CellValue::Bool(false));
        assert_eq!(
            CellValue::parse("yes"),
            CellValue::String("yes".to_string())
        );
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(CellValue::parse("42"), CellValue::Int(42));
        assert_eq!(CellValue::parse("-123"), CellValue::Int(-123));
        assert_eq!(CellValue::parse("3.14"), CellValue::Float(3.14));
    }

    #[test]
    fn test_parse_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(CellValue::parse("2024-02-29"), CellValue::Date(date));

        let dt = date.and_hms_opt(13, 5, 0).unwrap();
        assert_eq!(
            CellValue::parse("2024-02-29T13:05:00"),
            CellValue::DateTime(dt)
        );
        assert_eq!(
            CellValue::parse("2024-02-29 13:05:00"),
            CellValue::DateTime(dt)
        );
    }

    #[test]
    fn test_as_str_dates_roundtrip_through_parse() {
        let dt = NaiveDate::from_ymd_opt(2023, 12, 1)
            .unwrap()
            .and_hms_opt(8, 30, 15)
            .unwrap();
        let cell = CellValue::DateTime(dt);
        assert_eq!(cell.as_str(), "2023-12-01T08:30:15");
        assert_eq!(CellValue::parse(&cell.as_str()), cell);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(CellValue::Int(42).as_float(), Some(42.0));
        assert_eq!(CellValue::Float(3.14).as_int(), Some(3));
        assert_eq!(CellValue::Bool(true).as_int(), Some(1));
        assert_eq!(CellValue::String("42".to_string()).as_int(), Some(42));
        assert_eq!(CellValue::from(None::<i64>), CellValue::Null);
    }

    #[test]
    fn test_compare_mixed_numbers() {
        assert_eq!(
            CellValue::Int(2).compare(&CellValue::Float(1.5)),
            Ordering::Greater
        );
        assert_eq!(
            CellValue::Float(2.0).compare(&CellValue::Int(2)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_compare_across_kinds() {
        let ordered = [
            CellValue::Null,
            CellValue::Bool(true),
            CellValue::Int(100),
            CellValue::Date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()),
            CellValue::String("a".to_string()),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].compare(&pair[1]), Ordering::Less);
        }
    }

    #[test]
    fn test_key_distinguishes_types() {
        assert_ne!(
            CellValue::Int(1).key(),
            CellValue::String("1".to_string()).key()
        );
    }
}
