use crate::cell::CellValue;
use crate::codec::{Capabilities, Codec, Payload};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::options::Options;

/// LaTeX `tabular` inside a `table` float, using booktabs rules (export only)
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexCodec;

impl Codec for LatexCodec {
    fn name(&self) -> &'static str {
        "latex"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tex"]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::export_only()
    }

    fn export_set(&self, dataset: &Dataset, _options: &Options) -> Result<Payload> {
        let caption = match dataset.title() {
            Some(title) => format!("\\caption{{{}}}", escape(title)),
            None => "%".to_string(),
        };
        let header = dataset
            .headers()
            .map(|h| serialize_row(h.iter().map(String::as_str)));
        let body: Vec<String> = dataset
            .rows()
            .iter()
            .map(|row| {
                let cells: Vec<String> = row.iter().map(CellValue::as_str).collect();
                serialize_row(cells.iter().map(String::as_str))
            })
            .collect();

        let mut out = String::new();
        out.push_str("%% Note: add \\usepackage{booktabs} to your preamble\n%%\n");
        out.push_str("\\begin{table}[!htbp]\n  \\centering\n");
        out.push_str(&format!("  {caption}\n"));
        out.push_str(&format!("  \\begin{{tabular}}{{{}}}\n", colspec(dataset.width())));
        out.push_str("    \\toprule\n");
        if let Some(header) = header {
            out.push_str(&header);
            out.push_str("\n    \\midrule\n");
        }
        for line in body {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str("    \\bottomrule\n  \\end{tabular}\n\\end{table}\n");
        Ok(Payload::Text(out))
    }
}

/// First column left-aligned, the rest right-aligned
fn colspec(width: usize) -> String {
    if width == 0 {
        return "l".to_string();
    }
    format!("l{}", "r".repeat(width - 1))
}

fn serialize_row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let cells: Vec<String> = cells.map(escape).collect();
    format!("      {} \\\\", cells.join(" & "))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\textbackslash{}"),
            '{' => escaped.push_str("\\{"),
            '}' => escaped.push_str("\\}"),
            '$' => escaped.push_str("\\$"),
            '&' => escaped.push_str("\\&"),
            '#' => escaped.push_str("\\#"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            '_' => escaped.push_str("\\_"),
            '~' => escaped.push_str("\\textasciitilde{}"),
            '%' => escaped.push_str("\\%"),
            _ => escaped.push(c),
        }
    }
    escaped
}
