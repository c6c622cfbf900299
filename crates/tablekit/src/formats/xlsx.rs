//! Excel 2007+ workbooks: calamine for reading, rust_xlsxwriter for writing.

use super::spreadsheet::{self, contains, is_zip};
use crate::cell::CellValue;
use crate::codec::{Capabilities, Codec, Payload};
use crate::databook::Databook;
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::options::Options;
use calamine::Xlsx;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::HashSet;
use std::io::Cursor;
use tracing::warn;

const NAME: &str = "xlsx";

/// Excel limits worksheet names to 31 characters
const MAX_TITLE_LEN: usize = 31;
const INVALID_TITLE_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxCodec;

impl Codec for XlsxCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["xlsx", "xlsm"]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full().binary()
    }

    fn detect(&self, raw: &[u8]) -> bool {
        is_zip(raw) && contains(raw, b"xl/")
    }

    fn import_set(&self, raw: &[u8], dataset: &mut Dataset, options: &Options) -> Result<()> {
        spreadsheet::import_set::<Xlsx<Cursor<&[u8]>>>(NAME, raw, dataset, options)
    }

    fn export_set(&self, dataset: &Dataset, options: &Options) -> Result<Payload> {
        let freeze = options.bool_or("freeze_headers", true)?;
        let mut workbook = Workbook::new();
        let title = worksheet_titles(std::slice::from_ref(dataset))
            .pop()
            .unwrap_or_else(|| "Sheet1".to_string());
        write_worksheet(workbook.add_worksheet(), dataset, &title, freeze)?;
        finish(&mut workbook)
    }

    fn import_book(&self, raw: &[u8], book: &mut Databook, options: &Options) -> Result<()> {
        spreadsheet::import_book::<Xlsx<Cursor<&[u8]>>>(NAME, raw, book, options)
    }

    fn export_book(&self, book: &Databook, options: &Options) -> Result<Payload> {
        let freeze = options.bool_or("freeze_headers", true)?;
        let mut workbook = Workbook::new();
        if book.is_empty() {
            workbook.add_worksheet();
        }
        let titles = worksheet_titles(book.sheets());
        for (sheet, title) in book.sheets().iter().zip(&titles) {
            write_worksheet(workbook.add_worksheet(), sheet, title, freeze)?;
        }
        finish(&mut workbook)
    }
}

fn finish(workbook: &mut Workbook) -> Result<Payload> {
    let buffer = workbook
        .save_to_buffer()
        .map_err(|e| TabError::export(NAME, e))?;
    Ok(Payload::Binary(buffer))
}

/// Worksheet names that Excel will accept: invalid characters replaced, truncated to 31
/// characters and made unique case-insensitively. Untitled sheets are numbered.
fn worksheet_titles(sheets: &[Dataset]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut titles = Vec::with_capacity(sheets.len());

    for (i, sheet) in sheets.iter().enumerate() {
        let fallback = format!("Sheet{}", i + 1);
        let original = sheet.title().unwrap_or(&fallback);

        let cleaned: String = original
            .chars()
            .map(|c| if INVALID_TITLE_CHARS.contains(&c) { '-' } else { c })
            .take(MAX_TITLE_LEN)
            .collect();
        let cleaned = if cleaned.trim().is_empty() {
            fallback.clone()
        } else {
            cleaned
        };

        let mut candidate = cleaned.clone();
        let mut n = 2;
        while used.contains(&candidate.to_lowercase()) {
            let suffix = format!(" ({n})");
            let keep = MAX_TITLE_LEN.saturating_sub(suffix.chars().count());
            candidate = cleaned.chars().take(keep).collect::<String>() + &suffix;
            n += 1;
        }

        if sheet.title().is_some() && candidate != original {
            warn!(
                original,
                renamed = %candidate,
                "worksheet title adjusted for xlsx"
            );
        }
        used.insert(candidate.to_lowercase());
        titles.push(candidate);
    }
    titles
}

/// Write one dataset into a worksheet: bold header row, separator rows, typed cells
fn write_worksheet(
    worksheet: &mut Worksheet,
    dataset: &Dataset,
    title: &str,
    freeze: bool,
) -> Result<()> {
    worksheet
        .set_name(title)
        .map_err(|e| TabError::export(NAME, e))?;

    let bold = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut row_num: u32 = 0;
    if let Some(headers) = dataset.headers() {
        for (col, header) in headers.iter().enumerate() {
            worksheet
                .write_string_with_format(row_num, column(col)?, header, &bold)
                .map_err(|e| TabError::export(NAME, e))?;
        }
        if freeze {
            worksheet
                .set_freeze_panes(1, 0)
                .map_err(|e| TabError::export(NAME, e))?;
        }
        row_num += 1;
    }

    let separators = dataset.separators();
    for (index, row) in dataset.rows().iter().enumerate() {
        for sep in separators.iter().filter(|s| s.index == index) {
            worksheet
                .write_string_with_format(row_num, 0, &sep.text, &bold)
                .map_err(|e| TabError::export(NAME, e))?;
            row_num += 1;
        }

        for (col, cell) in row.iter().enumerate() {
            let col = column(col)?;
            let written = match cell {
                CellValue::Null => continue,
                CellValue::Bool(b) => worksheet.write_boolean(row_num, col, *b),
                // Excel stores every number as f64; ints above 2^53 lose precision
                CellValue::Int(i) => worksheet.write_number(row_num, col, *i as f64),
                CellValue::Float(f) => worksheet.write_number(row_num, col, *f),
                CellValue::Date(d) => {
                    worksheet.write_datetime_with_format(row_num, col, d, &date_format)
                }
                CellValue::DateTime(dt) => {
                    worksheet.write_datetime_with_format(row_num, col, dt, &datetime_format)
                }
                CellValue::String(s) => worksheet.write_string(row_num, col, s),
            };
            written.map_err(|e| TabError::export(NAME, e))?;
        }
        row_num += 1;
    }

    for sep in separators.iter().filter(|s| s.index >= dataset.height()) {
        worksheet
            .write_string_with_format(row_num, 0, &sep.text, &bold)
            .map_err(|e| TabError::export(NAME, e))?;
        row_num += 1;
    }
    Ok(())
}

fn column(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| TabError::export(NAME, "column index overflow"))
}
