//! Shared calamine plumbing for the spreadsheet readers (xlsx, ods).

use crate::cell::{parse_datetime, CellValue};
use crate::databook::Databook;
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::formats::fill_dataset;
use crate::options::Options;
use calamine::{Data, Reader};
use chrono::{NaiveDate, NaiveTime};
use std::io::Cursor;

/// Integral floats beyond this magnitude stay floats on import
const MAX_SAFE_INT: f64 = 9_007_199_254_740_992.0;

/// Convert calamine Data to CellValue
pub(crate) fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < MAX_SAFE_INT {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return CellValue::Float(dt.as_f64());
            }
            match dt.as_datetime() {
                Some(ndt) if ndt.time() == NaiveTime::MIN => CellValue::Date(ndt.date()),
                Some(ndt) => CellValue::DateTime(ndt),
                None => CellValue::Float(dt.as_f64()),
            }
        }
        Data::DateTimeIso(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                CellValue::Date(d)
            } else if let Some(dt) = parse_datetime(s) {
                CellValue::DateTime(dt)
            } else {
                CellValue::String(s.clone())
            }
        }
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

/// Open a workbook held in memory
fn open<'a, R>(format: &'static str, raw: &'a [u8]) -> Result<R>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: std::fmt::Display,
{
    R::new(Cursor::new(raw)).map_err(|e| TabError::import(format, e))
}

/// Read one worksheet into a grid of cells
fn read_grid<'a, R>(
    format: &'static str,
    workbook: &mut R,
    name: &str,
) -> Result<Vec<Vec<CellValue>>>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: std::fmt::Display,
{
    let range = workbook
        .worksheet_range(name)
        .map_err(|e| TabError::import(format, e))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect())
}

/// Populate a dataset from the sheet named by the `sheet` option, else the first sheet
pub(crate) fn import_set<'a, R>(
    format: &'static str,
    raw: &'a [u8],
    dataset: &mut Dataset,
    options: &Options,
) -> Result<()>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: std::fmt::Display,
{
    let headers = options.bool_or("headers", true)?;
    let mut workbook: R = open(format, raw)?;

    let name = match options.get_str("sheet")? {
        Some(name) => name.to_string(),
        None => match workbook.sheet_names().first() {
            Some(first) => first.clone(),
            None => return Ok(()),
        },
    };

    let grid = read_grid(format, &mut workbook, &name)?;
    if dataset.title().is_none() {
        dataset.set_title(Some(&name));
    }
    fill_dataset(format, dataset, grid, headers, &CellValue::Null)
}

/// Populate a databook with one dataset per worksheet, titled by sheet name
pub(crate) fn import_book<'a, R>(
    format: &'static str,
    raw: &'a [u8],
    book: &mut Databook,
    options: &Options,
) -> Result<()>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: std::fmt::Display,
{
    let headers = options.bool_or("headers", true)?;
    let mut workbook: R = open(format, raw)?;

    for name in workbook.sheet_names() {
        let grid = read_grid(format, &mut workbook, &name)?;
        let mut sheet = Dataset::new().with_title(&name);
        fill_dataset(format, &mut sheet, grid, headers, &CellValue::Null)?;
        book.add_sheet(sheet);
    }
    Ok(())
}

/// True if `raw` is a zip archive (local file header signature)
pub(crate) fn is_zip(raw: &[u8]) -> bool {
    raw.starts_with(b"PK\x03\x04")
}

pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_floats_become_ints() {
        assert_eq!(data_to_cell(&Data::Float(3.0)), CellValue::Int(3));
        assert_eq!(data_to_cell(&Data::Float(2.5)), CellValue::Float(2.5));
        assert_eq!(data_to_cell(&Data::Empty), CellValue::Null);
    }

    #[test]
    fn test_iso_strings() {
        assert_eq!(
            data_to_cell(&Data::DateTimeIso("2024-03-05".to_string())),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
    }

    #[test]
    fn test_contains() {
        assert!(contains(b"PK..xl/workbook", b"xl/"));
        assert!(!contains(b"PK", b"xl/"));
        assert!(!contains(b"abc", b""));
    }
}
