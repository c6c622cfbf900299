//! dBase III tables.
//!
//! Layout: a 32-byte file header, one 32-byte descriptor per field, a `0x0D` terminator,
//! fixed-length records each led by a deletion flag, and a trailing `0x1A`. Columns are
//! written as `L` (all booleans), `D` (all dates), `N` (all numbers) or `C` (anything
//! else, UTF-8 text up to 254 bytes).

use crate::cell::CellValue;
use crate::codec::{Capabilities, Codec, Payload};
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::options::Options;
use chrono::NaiveDate;
use tracing::warn;

const NAME: &str = "dbf";

const VERSION: u8 = 0x03;
const HEADER_LEN: usize = 32;
const DESCRIPTOR_LEN: usize = 32;
const TERMINATOR: u8 = 0x0D;
const EOF_MARKER: u8 = 0x1A;
const DELETED: u8 = b'*';
const MAX_CHAR_LEN: usize = 254;
const MAX_NUMERIC_LEN: usize = 20;
const MAX_NAME_LEN: usize = 10;

/// Version bytes of dBase-family files we accept on import
const KNOWN_VERSIONS: &[u8] = &[0x02, 0x03, 0x30, 0x31, 0x83, 0x8B, 0xF5];

#[derive(Debug, Clone, Copy, Default)]
pub struct DbfCodec;

#[derive(Debug, Clone, PartialEq)]
struct Field {
    name: String,
    kind: u8,
    length: usize,
    decimals: usize,
}

#[derive(Debug)]
struct Header {
    records: usize,
    header_len: usize,
    record_len: usize,
    fields: Vec<Field>,
}

impl Codec for DbfCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["dbf"]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::dataset().binary()
    }

    fn detect(&self, raw: &[u8]) -> bool {
        parse_header(raw).is_some()
    }

    fn import_set(&self, raw: &[u8], dataset: &mut Dataset, options: &Options) -> Result<()> {
        let infer = options.bool_or("infer_types", false)?;
        let header = parse_header(raw)
            .ok_or_else(|| TabError::import(NAME, "invalid dBase header"))?;

        dataset.set_headers(Some(
            header.fields.iter().map(|f| f.name.clone()).collect::<Vec<_>>(),
        ))?;

        for index in 0..header.records {
            let start = header.header_len + index * header.record_len;
            let record = raw
                .get(start..start + header.record_len)
                .ok_or_else(|| TabError::import(NAME, format!("record {index} is truncated")))?;
            if record[0] == DELETED {
                continue;
            }

            let mut offset = 1;
            let mut values = Vec::with_capacity(header.fields.len());
            for field in &header.fields {
                let bytes = &record[offset..offset + field.length];
                values.push(decode_value(field, bytes, infer));
                offset += field.length;
            }
            dataset.append(values)?;
        }
        Ok(())
    }

    fn export_set(&self, dataset: &Dataset, _options: &Options) -> Result<Payload> {
        let fields = plan_fields(dataset);
        let record_len = 1 + fields.iter().map(|f| f.length).sum::<usize>();
        let header_len = HEADER_LEN + DESCRIPTOR_LEN * fields.len() + 1;

        let records = u32::try_from(dataset.height())
            .map_err(|_| TabError::export(NAME, "too many records"))?;
        let header_len_u16 = u16::try_from(header_len)
            .map_err(|_| TabError::export(NAME, "too many fields"))?;
        let record_len_u16 = u16::try_from(record_len)
            .map_err(|_| TabError::export(NAME, "record too long"))?;

        let mut out = Vec::with_capacity(header_len + record_len * dataset.height() + 1);
        // Last-update date is fixed at 1980-01-01 so exports are reproducible
        out.extend_from_slice(&[VERSION, 80, 1, 1]);
        out.extend_from_slice(&records.to_le_bytes());
        out.extend_from_slice(&header_len_u16.to_le_bytes());
        out.extend_from_slice(&record_len_u16.to_le_bytes());
        out.extend_from_slice(&[0; 20]);

        for field in &fields {
            let mut descriptor = [0u8; DESCRIPTOR_LEN];
            let name = field.name.as_bytes();
            descriptor[..name.len()].copy_from_slice(name);
            descriptor[11] = field.kind;
            descriptor[16] = field.length as u8;
            descriptor[17] = field.decimals as u8;
            out.extend_from_slice(&descriptor);
        }
        out.push(TERMINATOR);

        for row in dataset.rows() {
            out.push(b' ');
            for (field, cell) in fields.iter().zip(row) {
                out.extend_from_slice(&encode_value(field, cell));
            }
        }
        out.push(EOF_MARKER);
        Ok(Payload::Binary(out))
    }
}

fn u16_at(raw: &[u8], at: usize) -> Option<usize> {
    let bytes = raw.get(at..at + 2)?;
    Some(usize::from(u16::from_le_bytes([bytes[0], bytes[1]])))
}

fn u32_at(raw: &[u8], at: usize) -> Option<usize> {
    let bytes = raw.get(at..at + 4)?;
    usize::try_from(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])).ok()
}

/// Validate and decode the file header and field descriptors.
///
/// Returns `None` for anything that is not a self-consistent dBase header.
fn parse_header(raw: &[u8]) -> Option<Header> {
    if !KNOWN_VERSIONS.contains(raw.first()?) {
        return None;
    }
    let (month, day) = (*raw.get(2)?, *raw.get(3)?);
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let records = u32_at(raw, 4)?;
    let header_len = u16_at(raw, 8)?;
    let record_len = u16_at(raw, 10)?;
    if header_len < HEADER_LEN + 1 || record_len == 0 || raw.len() < header_len {
        return None;
    }

    let mut fields = Vec::new();
    let mut pos = HEADER_LEN;
    loop {
        let first = *raw.get(pos)?;
        if first == TERMINATOR {
            break;
        }
        if pos + DESCRIPTOR_LEN > header_len {
            return None;
        }
        let descriptor = raw.get(pos..pos + DESCRIPTOR_LEN)?;
        let kind = descriptor[11];
        if !kind.is_ascii_uppercase() {
            return None;
        }
        let name_bytes = &descriptor[..11];
        let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(11);
        fields.push(Field {
            name: String::from_utf8_lossy(&name_bytes[..name_end]).trim().to_string(),
            kind,
            length: usize::from(descriptor[16]),
            decimals: usize::from(descriptor[17]),
        });
        pos += DESCRIPTOR_LEN;
    }

    if fields.is_empty() || fields.iter().any(|f| f.length == 0) {
        return None;
    }
    if 1 + fields.iter().map(|f| f.length).sum::<usize>() != record_len {
        return None;
    }

    Some(Header {
        records,
        header_len,
        record_len,
        fields,
    })
}

fn decode_value(field: &Field, bytes: &[u8], infer: bool) -> CellValue {
    let text = String::from_utf8_lossy(bytes);
    match field.kind {
        b'C' => {
            let text = text.trim_end_matches([' ', '\0']);
            if infer {
                CellValue::parse(text)
            } else {
                CellValue::String(text.to_string())
            }
        }
        b'N' | b'F' => {
            let text = text.trim();
            if text.is_empty() {
                CellValue::Null
            } else if field.decimals == 0 {
                text.parse::<i64>()
                    .map(CellValue::Int)
                    .or_else(|_| text.parse::<f64>().map(CellValue::Float))
                    .unwrap_or_else(|_| CellValue::String(text.to_string()))
            } else {
                text.parse::<f64>()
                    .map(CellValue::Float)
                    .unwrap_or_else(|_| CellValue::String(text.to_string()))
            }
        }
        b'L' => match text.trim() {
            "T" | "t" | "Y" | "y" => CellValue::Bool(true),
            "F" | "f" | "N" | "n" => CellValue::Bool(false),
            _ => CellValue::Null,
        },
        b'D' => {
            let text = text.trim();
            if text.is_empty() {
                CellValue::Null
            } else {
                NaiveDate::parse_from_str(text, "%Y%m%d")
                    .map(CellValue::Date)
                    .unwrap_or_else(|_| CellValue::String(text.to_string()))
            }
        }
        _ => CellValue::String(text.trim().to_string()),
    }
}

/// Choose a field type and size for every column
fn plan_fields(dataset: &Dataset) -> Vec<Field> {
    let labels = dataset.column_labels();
    let headed = dataset.headers().is_some();

    (0..dataset.width())
        .map(|col| {
            let label = if headed {
                labels[col].clone()
            } else {
                format!("F{}", col + 1)
            };
            let name = field_name(&label);
            let cells: Vec<&CellValue> = dataset
                .rows()
                .iter()
                .map(|row| &row[col])
                .filter(|c| !c.is_null())
                .collect();
            let (kind, length, decimals) = field_type(&cells);
            Field {
                name,
                kind,
                length,
                decimals,
            }
        })
        .collect()
}

fn field_type(cells: &[&CellValue]) -> (u8, usize, usize) {
    if cells.is_empty() {
        return (b'C', 1, 0);
    }
    if cells.iter().all(|c| matches!(c, CellValue::Bool(_))) {
        return (b'L', 1, 0);
    }
    if cells.iter().all(|c| matches!(c, CellValue::Date(_))) {
        return (b'D', 8, 0);
    }
    if cells.iter().all(|c| c.is_number()) {
        let decimals = cells
            .iter()
            .filter_map(|c| match c {
                CellValue::Float(f) => f
                    .to_string()
                    .split_once('.')
                    .map(|(_, frac)| frac.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            .min(15);
        let length = cells
            .iter()
            .map(|c| format_number(c, decimals).len())
            .max()
            .unwrap_or(1);
        let all_finite = cells.iter().all(|c| c.as_float().is_some_and(f64::is_finite));
        if length <= MAX_NUMERIC_LEN && all_finite {
            return (b'N', length, decimals);
        }
    }
    let length = cells
        .iter()
        .map(|c| c.as_str().len())
        .max()
        .unwrap_or(1)
        .clamp(1, MAX_CHAR_LEN);
    (b'C', length, 0)
}

fn format_number(cell: &CellValue, decimals: usize) -> String {
    match cell {
        CellValue::Int(i) if decimals == 0 => i.to_string(),
        other => format!("{:.*}", decimals, other.as_float().unwrap_or(0.0)),
    }
}

/// Field names are at most 10 ASCII bytes
fn field_name(label: &str) -> String {
    let name: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .take(MAX_NAME_LEN)
        .collect();
    if name != label {
        warn!(original = label, renamed = %name, "dbf field name adjusted");
    }
    name
}

fn encode_value(field: &Field, cell: &CellValue) -> Vec<u8> {
    let text = match (field.kind, cell) {
        (_, CellValue::Null) if field.kind == b'L' => "?".to_string(),
        (_, CellValue::Null) => String::new(),
        (b'L', CellValue::Bool(b)) => (if *b { "T" } else { "F" }).to_string(),
        (b'D', CellValue::Date(d)) => d.format("%Y%m%d").to_string(),
        (b'N', value) => format!(
            "{:>width$}",
            format_number(value, field.decimals),
            width = field.length
        ),
        (_, value) => truncate(&value.as_str(), field.length),
    };

    let mut bytes = text.into_bytes();
    bytes.resize(field.length, b' ');
    bytes
}

/// Cut text to at most `max` bytes without splitting a character
fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    warn!(bytes = text.len(), max, "dbf character value truncated");
    text[..end].to_string()
}
