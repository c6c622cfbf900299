//! Built-in codecs, one module per format family.

mod csv;
mod dataframe;
mod dbf;
mod html;
mod jira;
mod json;
mod latex;
mod ods;
mod parquet;
mod rst;
mod spreadsheet;
mod xlsx;
mod yaml;

pub use self::csv::{CsvCodec, CsvOptions};
pub use self::dataframe::ArrowCodec;
pub use self::dbf::DbfCodec;
pub use self::html::HtmlCodec;
pub use self::jira::JiraCodec;
pub use self::json::JsonCodec;
pub use self::latex::LatexCodec;
pub use self::ods::OdsCodec;
pub use self::parquet::ParquetCodec;
pub use self::rst::RstCodec;
pub use self::xlsx::XlsxCodec;
pub use self::yaml::YamlCodec;

use crate::cell::CellValue;
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::row::Row;

/// Load a rectangular-ish grid into an empty dataset.
///
/// With `headers`, the first grid row supplies the labels. The first record (header or
/// data) fixes the width: shorter rows are padded with `fill`, longer rows are rejected
/// with [`TabError::RaggedInput`].
pub(crate) fn fill_dataset(
    format: &'static str,
    dataset: &mut Dataset,
    grid: Vec<Vec<CellValue>>,
    headers: bool,
    fill: &CellValue,
) -> Result<()> {
    let mut records = grid.into_iter();
    let Some(first) = records.next() else {
        return Ok(());
    };
    let width = first.len();

    let mut rows = Vec::new();
    if headers {
        let labels: Vec<String> = first.iter().map(CellValue::as_str).collect();
        dataset.set_headers(Some(labels))?;
    } else {
        rows.push(Row::new(first));
    }

    for (i, values) in records.enumerate() {
        if values.len() > width {
            return Err(TabError::RaggedInput {
                format,
                row: i + 1,
                expected: width,
                actual: values.len(),
            });
        }
        let mut row = Row::new(values);
        row.pad_to(width, fill);
        rows.push(row);
    }

    // Records with no fields carry no data
    if width == 0 {
        return Ok(());
    }
    dataset.extend(rows)
}

/// Header row (if any) followed by data rows, rendered as display text
pub(crate) fn text_grid(dataset: &Dataset) -> Vec<Vec<String>> {
    dataset
        .to_grid()
        .iter()
        .map(|row| row.iter().map(CellValue::as_str).collect())
        .collect()
}

/// Column widths in characters over a text grid
pub(crate) fn column_widths(grid: &[Vec<String>]) -> Vec<usize> {
    let cols = grid.first().map_or(0, Vec::len);
    (0..cols)
        .map(|c| {
            grid.iter()
                .filter_map(|row| row.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
        rows.iter()
            .map(|r| r.iter().map(|s| CellValue::from(*s)).collect())
            .collect()
    }

    #[test]
    fn test_fill_dataset_pads_short_rows() {
        let mut ds = Dataset::new();
        fill_dataset(
            "csv",
            &mut ds,
            grid(&[&["a", "b", "c"], &["1"], &["1", "2", "3"]]),
            true,
            &CellValue::String(String::new()),
        )
        .unwrap();

        assert_eq!(ds.headers().unwrap().len(), 3);
        assert_eq!(ds.height(), 2);
        assert_eq!(ds.get(0, 2).unwrap(), &CellValue::String(String::new()));
    }

    #[test]
    fn test_fill_dataset_skips_empty_records() {
        let mut ds = Dataset::new();
        fill_dataset("json", &mut ds, vec![vec![], vec![]], false, &CellValue::Null).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn test_fill_dataset_rejects_long_rows() {
        let mut ds = Dataset::new();
        let err = fill_dataset(
            "csv",
            &mut ds,
            grid(&[&["a"], &["1", "2"]]),
            false,
            &CellValue::Null,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TabError::RaggedInput {
                row: 1,
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_column_widths_count_chars() {
        let widths = column_widths(&[
            vec!["né".to_string(), "x".to_string()],
            vec!["a".to_string(), "long".to_string()],
        ]);
        assert_eq!(widths, vec![2, 4]);
    }
}
