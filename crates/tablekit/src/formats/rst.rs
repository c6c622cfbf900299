//! reStructuredText tables (export only).
//!
//! Datasets whose cells are all single words render as simple tables; anything with
//! whitespace, line breaks or an empty first-column cell renders as a grid table.

use crate::codec::{Capabilities, Codec, Payload};
use crate::databook::Databook;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::formats::{column_widths, text_grid};
use crate::options::Options;

#[derive(Debug, Clone, Copy, Default)]
pub struct RstCodec;

impl Codec for RstCodec {
    fn name(&self) -> &'static str {
        "rst"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rst"]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::export_only().with_book_export()
    }

    fn export_set(&self, dataset: &Dataset, _options: &Options) -> Result<Payload> {
        Ok(Payload::Text(render(dataset)))
    }

    fn export_book(&self, book: &Databook, _options: &Options) -> Result<Payload> {
        let tables: Vec<String> = book.iter().map(render).collect();
        Ok(Payload::Text(tables.join("\n\n")))
    }
}

fn render(dataset: &Dataset) -> String {
    let grid = text_grid(dataset);
    if grid.is_empty() || dataset.width() == 0 {
        return String::new();
    }
    let simple = grid.iter().all(|row| {
        row.first().is_some_and(|c| !c.is_empty())
            && row.iter().all(|c| !c.chars().any(char::is_whitespace))
    });
    if simple {
        simple_table(&grid, dataset.headers().is_some())
    } else {
        grid_table(&grid, dataset.headers().is_some())
    }
}

fn simple_table(grid: &[Vec<String>], headed: bool) -> String {
    let widths = column_widths(grid);
    let border = widths
        .iter()
        .map(|&w| "=".repeat(w))
        .collect::<Vec<_>>()
        .join(" ");
    let line = |row: &Vec<String>| {
        row.iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![border.clone()];
    for (i, row) in grid.iter().enumerate() {
        lines.push(line(row));
        if headed && i == 0 {
            lines.push(border.clone());
        }
    }
    lines.push(border);
    lines.join("\n")
}

fn grid_table(grid: &[Vec<String>], headed: bool) -> String {
    let cols = grid.first().map_or(0, Vec::len);
    let widths: Vec<usize> = (0..cols)
        .map(|c| {
            grid.iter()
                .flat_map(|row| row[c].lines())
                .map(|l| l.chars().count())
                .max()
                .unwrap_or(0)
                .max(1)
        })
        .collect();
    let rule = |fill: char| {
        let parts: Vec<String> = widths
            .iter()
            .map(|&w| fill.to_string().repeat(w + 2))
            .collect();
        format!("+{}+", parts.join("+"))
    };

    let mut lines = vec![rule('-')];
    for (i, row) in grid.iter().enumerate() {
        let cell_lines: Vec<Vec<&str>> = row.iter().map(|c| c.lines().collect()).collect();
        let height = cell_lines.iter().map(Vec::len).max().unwrap_or(0).max(1);
        for n in 0..height {
            let parts: Vec<String> = cell_lines
                .iter()
                .zip(&widths)
                .map(|(lines, &w)| format!(" {:<w$} ", lines.get(n).copied().unwrap_or("")))
                .collect();
            lines.push(format!("|{}|", parts.join("|")));
        }
        lines.push(rule(if headed && i == 0 { '=' } else { '-' }));
    }
    lines.join("\n")
}
