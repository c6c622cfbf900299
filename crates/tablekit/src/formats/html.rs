//! HTML tables.
//!
//! Export writes a plain `<table>` with a `<thead>` for headers; databook export emits one
//! `<h3>` title plus table per sheet. Import reads one table (selected by the `table_index`
//! option) with scraper.
//!
//! ## Import features
//!
//! - **Colspan and Rowspan**: spanned cells are duplicated across the covered columns and
//!   rows. Header cells duplicated by colspan get a `_2`, `_3`, ... suffix. Spans are
//!   clamped to the browser limits (colspan 1000, rowspan 65534) and to the table's rows.
//! - **Ragged tables** are normalized to the widest row; missing header labels are generated
//!   as `Column_N`.
//! - **Text extraction**: nested elements are concatenated without whitespace
//!   normalization (`foo<b>bar</b>` becomes `"foobar"`).

use crate::cell::CellValue;
use crate::codec::{Capabilities, Codec, Payload};
use crate::databook::Databook;
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::formats::fill_dataset;
use crate::options::Options;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

const NAME: &str = "html";

/// Span limits browsers apply to table cells
const MAX_COLSPAN: usize = 1000;
const MAX_ROWSPAN: usize = 65534;

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlCodec;

impl Codec for HtmlCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["html", "htm"]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::dataset().with_book_export()
    }

    fn detect(&self, raw: &[u8]) -> bool {
        raw.windows(6)
            .any(|w| w.eq_ignore_ascii_case(b"<table"))
    }

    fn import_set(&self, raw: &[u8], dataset: &mut Dataset, options: &Options) -> Result<()> {
        let headers = options.bool_or("headers", true)?;
        let infer = options.bool_or("infer_types", false)?;
        let table_index = options.get_usize("table_index")?.unwrap_or(0);

        let text = std::str::from_utf8(raw).map_err(|e| TabError::import(NAME, e))?;
        let document = Html::parse_document(text);
        let table_selector = selector("table")?;
        let table = document
            .select(&table_selector)
            .nth(table_index)
            .ok_or_else(|| {
                TabError::import(NAME, format!("table index {table_index} not found"))
            })?;

        let grid = parse_table(table, headers, infer)?;
        let fill = if infer {
            CellValue::Null
        } else {
            CellValue::String(String::new())
        };
        fill_dataset(NAME, dataset, grid, headers, &fill)
    }

    fn export_set(&self, dataset: &Dataset, _options: &Options) -> Result<Payload> {
        let mut out = String::new();
        write_table(&mut out, dataset);
        Ok(Payload::Text(out))
    }

    fn export_book(&self, book: &Databook, _options: &Options) -> Result<Payload> {
        let mut out = String::new();
        for sheet in book {
            if let Some(title) = sheet.title() {
                out.push_str(&format!("<h3>{}</h3>\n", escape(title)));
            }
            write_table(&mut out, sheet);
            out.push('\n');
        }
        Ok(Payload::Text(out))
    }
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| TabError::import(NAME, format!("invalid selector {css}: {e:?}")))
}

fn write_table(out: &mut String, dataset: &Dataset) {
    out.push_str("<table>\n");
    if let Some(headers) = dataset.headers() {
        out.push_str("<thead>\n<tr>");
        for header in headers {
            out.push_str(&format!("<th>{}</th>", escape(header)));
        }
        out.push_str("</tr>\n</thead>\n");
    }
    out.push_str("<tbody>\n");
    for row in dataset.rows() {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", escape(&cell.as_str())));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Read a table element into a grid, expanding colspan/rowspan and padding every row to
/// the widest one
fn parse_table(
    table: ElementRef<'_>,
    headers: bool,
    infer: bool,
) -> Result<Vec<Vec<CellValue>>> {
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;

    let row_count = table.select(&row_selector).count();

    // Cells covered by a rowspan from an earlier row, keyed by (row, column)
    let mut occupied: HashMap<(usize, usize), CellValue> = HashMap::new();
    let mut grid: Vec<Vec<CellValue>> = Vec::new();

    for (row_index, tr) in table.select(&row_selector).enumerate() {
        let header_row = headers && row_index == 0;
        let mut row: Vec<CellValue> = Vec::new();
        let mut col = 0;

        for cell in tr.select(&cell_selector) {
            while let Some(value) = occupied.remove(&(row_index, col)) {
                row.push(value);
                col += 1;
            }

            let text = cell.text().collect::<String>().trim().to_string();
            let span = |name: &str, max: usize| {
                cell.value()
                    .attr(name)
                    .and_then(|s| s.trim().parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .map_or(1, |n| n.min(max))
            };
            let colspan = span("colspan", MAX_COLSPAN);
            // Rows past the end of the table are never read
            let rowspan = span("rowspan", MAX_ROWSPAN).min(row_count - row_index);

            // th cells and header-row cells are always text
            let value = if header_row || cell.value().name() == "th" || !infer {
                CellValue::String(text.clone())
            } else {
                infer_cell(&text)
            };

            for col_offset in 0..colspan {
                let spanned = if col_offset > 0 && header_row {
                    CellValue::String(format!("{}_{}", text, col_offset + 1))
                } else {
                    value.clone()
                };
                for row_offset in 1..rowspan {
                    occupied.insert((row_index + row_offset, col + col_offset), spanned.clone());
                }
                row.push(spanned);
            }
            col += colspan;
        }

        // Trailing cells covered by rowspans, with gaps filled by nulls. Spans that
        // overlap an explicit cell are dropped.
        let mut pending: Vec<usize> = occupied
            .keys()
            .filter(|(r, _)| *r == row_index)
            .map(|(_, c)| *c)
            .collect();
        pending.sort_unstable();
        for c in pending {
            let Some(value) = occupied.remove(&(row_index, c)) else {
                continue;
            };
            if c < col {
                continue;
            }
            while col < c {
                row.push(CellValue::Null);
                col += 1;
            }
            row.push(value);
            col += 1;
        }

        if !row.is_empty() {
            grid.push(row);
        }
    }

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for (row_index, row) in grid.iter_mut().enumerate() {
        while row.len() < width {
            if headers && row_index == 0 {
                row.push(CellValue::String(format!("Column_{}", row.len() + 1)));
            } else if infer {
                row.push(CellValue::Null);
            } else {
                row.push(CellValue::String(String::new()));
            }
        }
    }
    Ok(grid)
}

/// Type inference for data cells; numbers with leading zeros stay text
fn infer_cell(text: &str) -> CellValue {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.") {
        return CellValue::String(text.to_string());
    }
    CellValue::parse(text)
}
