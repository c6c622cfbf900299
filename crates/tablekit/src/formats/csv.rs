//! Delimited text (CSV and TSV) via the `csv` crate.

use crate::cell::CellValue;
use crate::codec::{Capabilities, Codec, Payload};
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::formats::fill_dataset;
use crate::options::Options;

/// Bytes inspected when sniffing for delimited text
const SAMPLE_LEN: usize = 4096;

/// CSV reader/writer options
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Whether the first row holds headers (default: true)
    pub has_headers: bool,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Whether to use type inference when reading (default: false)
    pub infer_types: bool,
    /// Record terminator written on export
    pub terminator: csv::Terminator,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            has_headers: true,
            quote: b'"',
            infer_types: false,
            terminator: csv::Terminator::CRLF,
        }
    }
}

impl CsvOptions {
    /// Create options for TSV (tab-separated values)
    #[must_use]
    pub fn tsv() -> Self {
        CsvOptions {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Set the delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the first row contains headers
    #[must_use]
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Set whether to infer types
    #[must_use]
    pub fn with_type_inference(mut self, infer_types: bool) -> Self {
        self.infer_types = infer_types;
        self
    }

    /// Overlay the recognized keys of a per-call option map on these defaults
    pub fn from_options(mut self, options: &Options) -> Result<Self> {
        if let Some(c) = options.get_char("delimiter")? {
            self.delimiter = ascii_byte("delimiter", c)?;
        }
        if let Some(c) = options.get_char("quote")? {
            self.quote = ascii_byte("quote", c)?;
        }
        self.has_headers = options.bool_or("headers", self.has_headers)?;
        self.infer_types = options.bool_or("infer_types", self.infer_types)?;
        match options.get_str("line_terminator")? {
            None => {}
            Some("\r\n") => self.terminator = csv::Terminator::CRLF,
            Some("\n") => self.terminator = csv::Terminator::Any(b'\n'),
            Some(_) => {
                return Err(TabError::InvalidOption {
                    key: "line_terminator".to_string(),
                    expected: "\"\\r\\n\" or \"\\n\"",
                })
            }
        }
        Ok(self)
    }

    fn cell(&self, field: &str) -> CellValue {
        if self.infer_types {
            CellValue::parse(field)
        } else {
            CellValue::String(field.to_string())
        }
    }
}

fn ascii_byte(key: &str, c: char) -> Result<u8> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| TabError::InvalidOption {
            key: key.to_string(),
            expected: "a single ASCII character",
        })
}

/// Codec for one delimiter; the registry holds a comma instance and a tab instance
#[derive(Debug, Clone, Copy)]
pub struct CsvCodec {
    name: &'static str,
    delimiter: u8,
    extensions: &'static [&'static str],
}

impl CsvCodec {
    #[must_use]
    pub const fn csv() -> Self {
        CsvCodec {
            name: "csv",
            delimiter: b',',
            extensions: &["csv"],
        }
    }

    #[must_use]
    pub const fn tsv() -> Self {
        CsvCodec {
            name: "tsv",
            delimiter: b'\t',
            extensions: &["tsv", "tab"],
        }
    }

    fn options(&self, options: &Options) -> Result<CsvOptions> {
        CsvOptions::default()
            .with_delimiter(self.delimiter)
            .from_options(options)
    }
}

impl Codec for CsvCodec {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::dataset()
    }

    fn detect(&self, raw: &[u8]) -> bool {
        sniff(raw, self.delimiter)
    }

    fn import_set(&self, raw: &[u8], dataset: &mut Dataset, options: &Options) -> Result<()> {
        let options = self.options(options)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false) // We handle headers ourselves
            .flexible(true)
            .from_reader(raw);

        let mut grid: Vec<Vec<CellValue>> = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| TabError::import(self.name, e))?;
            grid.push(record.iter().map(|field| options.cell(field)).collect());
        }

        let fill = options.cell("");
        fill_dataset(self.name, dataset, grid, options.has_headers, &fill)
    }

    fn export_set(&self, dataset: &Dataset, options: &Options) -> Result<Payload> {
        let options = self.options(options)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(options.terminator)
            .flexible(true)
            .from_writer(Vec::new());

        if options.has_headers {
            if let Some(headers) = dataset.headers() {
                writer
                    .write_record(headers)
                    .map_err(|e| TabError::export(self.name, e))?;
            }
        }
        for row in dataset.rows() {
            let record: Vec<String> = row.iter().map(CellValue::as_str).collect();
            writer
                .write_record(&record)
                .map_err(|e| TabError::export(self.name, e))?;
        }

        let buffer = writer
            .into_inner()
            .map_err(|e| TabError::export(self.name, e.error()))?;
        let text = String::from_utf8(buffer).map_err(|e| TabError::export(self.name, e))?;
        Ok(Payload::Text(text))
    }
}

/// Delimited-text heuristic over a bounded prefix: valid UTF-8 without NUL bytes, at least
/// two fields in the first record and the same field count in every complete record.
fn sniff(raw: &[u8], delimiter: u8) -> bool {
    let sample = &raw[..raw.len().min(SAMPLE_LEN)];
    if sample.contains(&0) {
        return false;
    }
    let text = match std::str::from_utf8(sample) {
        Ok(text) => text,
        // A multi-byte character cut by the sample boundary is fine
        Err(e) if e.error_len().is_none() => match std::str::from_utf8(&sample[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
        Err(_) => return false,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut counts = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => counts.push(record.len()),
            Err(_) => return false,
        }
    }
    if raw.len() > sample.len() && counts.len() > 1 {
        // The last record may be cut off by the sample boundary
        counts.pop();
    }

    match counts.first() {
        Some(&first) if first >= 2 => counts.iter().all(|&c| c == first),
        _ => false,
    }
}
