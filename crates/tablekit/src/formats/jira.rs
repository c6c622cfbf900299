use crate::cell::CellValue;
use crate::codec::{Capabilities, Codec, Payload};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::options::Options;

/// Jira wiki markup tables (export only)
#[derive(Debug, Clone, Copy, Default)]
pub struct JiraCodec;

impl Codec for JiraCodec {
    fn name(&self) -> &'static str {
        "jira"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::export_only()
    }

    fn export_set(&self, dataset: &Dataset, _options: &Options) -> Result<Payload> {
        let mut lines = Vec::with_capacity(dataset.height() + 1);
        if let Some(headers) = dataset.headers() {
            lines.push(serialize_row(headers.iter().map(String::as_str), "||"));
        }
        for row in dataset.rows() {
            let cells: Vec<String> = row.iter().map(CellValue::as_str).collect();
            lines.push(serialize_row(cells.iter().map(String::as_str), "|"));
        }
        Ok(Payload::Text(lines.join("\n")))
    }
}

/// `|a|b|` for data rows, `||a||b||` for the header row; empty cells become a space
fn serialize_row<'a>(cells: impl Iterator<Item = &'a str>, delimiter: &str) -> String {
    let cells: Vec<String> = cells
        .map(|cell| {
            if cell.is_empty() {
                " ".to_string()
            } else {
                cell.replace('|', "\\|")
            }
        })
        .collect();
    format!("{delimiter}{}{delimiter}", cells.join(delimiter))
}
