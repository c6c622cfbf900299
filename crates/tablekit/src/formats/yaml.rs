//! YAML support, shaped like the JSON codec: a sequence of mappings (with headers) or of
//! sequences (without), and a sequence of `{title, data}` mappings for databooks.

use crate::cell::CellValue;
use crate::codec::{Capabilities, Codec, Payload};
use crate::databook::Databook;
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::formats::fill_dataset;
use crate::options::Options;
use serde_yaml::{Mapping, Value};

const NAME: &str = "yaml";

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    fn detect(&self, raw: &[u8]) -> bool {
        matches!(
            serde_yaml::from_slice::<Value>(raw),
            Ok(Value::Sequence(_) | Value::Mapping(_))
        )
    }

    fn import_set(&self, raw: &[u8], dataset: &mut Dataset, _options: &Options) -> Result<()> {
        let Value::Sequence(items) = parse(raw)? else {
            return Err(TabError::import(NAME, "expected a sequence of rows"));
        };
        load_rows(&items, dataset)
    }

    fn export_set(&self, dataset: &Dataset, _options: &Options) -> Result<Payload> {
        render(&dataset_value(dataset))
    }

    fn import_book(&self, raw: &[u8], book: &mut Databook, _options: &Options) -> Result<()> {
        let Value::Sequence(entries) = parse(raw)? else {
            return Err(TabError::import(NAME, "expected a sequence of sheets"));
        };

        for (idx, entry) in entries.iter().enumerate() {
            let entry = entry.as_mapping().ok_or_else(|| {
                TabError::import(NAME, format!("sheet at index {idx} must be a mapping"))
            })?;
            if let Some(key) = entry
                .keys()
                .find(|k| !matches!(k.as_str(), Some("title" | "data")))
            {
                return Err(TabError::import(
                    NAME,
                    format!("sheet at index {idx} has unexpected key {}", key_text(key)),
                ));
            }
            let mut sheet = Dataset::new();
            match entry.get("title") {
                None | Some(Value::Null) => {}
                Some(title) => sheet.set_title(Some(&key_text(title))),
            }
            match entry.get("data") {
                Some(Value::Sequence(items)) => load_rows(items, &mut sheet)?,
                Some(_) => {
                    return Err(TabError::import(
                        NAME,
                        format!("sheet at index {idx}: data must be a sequence"),
                    ))
                }
                None => {
                    return Err(TabError::import(
                        NAME,
                        format!("sheet at index {idx} has no data key"),
                    ))
                }
            }
            book.add_sheet(sheet);
        }
        Ok(())
    }

    fn export_book(&self, book: &Databook, _options: &Options) -> Result<Payload> {
        let sheets: Vec<Value> = book
            .iter()
            .map(|sheet| {
                let mut entry = Mapping::new();
                entry.insert(
                    Value::from("title"),
                    sheet.title().map_or(Value::Null, Value::from),
                );
                entry.insert(Value::from("data"), dataset_value(sheet));
                Value::Mapping(entry)
            })
            .collect();
        render(&Value::Sequence(sheets))
    }
}

fn parse(raw: &[u8]) -> Result<Value> {
    serde_yaml::from_slice(raw).map_err(|e| TabError::import(NAME, e))
}

fn render(value: &Value) -> Result<Payload> {
    let text = serde_yaml::to_string(value).map_err(|e| TabError::export(NAME, e))?;
    Ok(Payload::Text(text))
}

fn dataset_value(dataset: &Dataset) -> Value {
    let rows = dataset
        .rows()
        .iter()
        .map(|row| match dataset.headers() {
            Some(headers) => {
                let mut mapping = Mapping::new();
                for (header, cell) in headers.iter().zip(row) {
                    mapping.insert(Value::from(header.as_str()), cell_to_yaml(cell));
                }
                Value::Mapping(mapping)
            }
            None => Value::Sequence(row.iter().map(cell_to_yaml).collect()),
        })
        .collect();
    Value::Sequence(rows)
}

fn load_rows(items: &[Value], dataset: &mut Dataset) -> Result<()> {
    let Some(first) = items.first() else {
        return Ok(());
    };

    let mut grid = Vec::with_capacity(items.len());
    match first {
        Value::Mapping(first) => {
            let keys: Vec<&Value> = first.keys().collect();
            for (idx, item) in items.iter().enumerate() {
                let mapping = item.as_mapping().ok_or_else(|| {
                    TabError::import(NAME, format!("element at index {idx} must be a mapping"))
                })?;
                grid.push(
                    keys.iter()
                        .map(|k| mapping.get(*k).map_or(CellValue::Null, yaml_to_cell))
                        .collect(),
                );
            }
            dataset.set_headers(Some(keys.into_iter().map(key_text).collect::<Vec<_>>()))?;
        }
        Value::Sequence(_) => {
            for (idx, item) in items.iter().enumerate() {
                let values = item.as_sequence().ok_or_else(|| {
                    TabError::import(NAME, format!("element at index {idx} must be a sequence"))
                })?;
                grid.push(values.iter().map(yaml_to_cell).collect());
            }
        }
        _ => return Err(TabError::import(NAME, "rows must be mappings or sequences")),
    }
    fill_dataset(NAME, dataset, grid, false, &CellValue::Null)
}

fn key_text(key: &Value) -> String {
    match yaml_to_cell(key) {
        CellValue::Null => String::new(),
        cell => cell.as_str(),
    }
}

fn yaml_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        Value::String(s) => CellValue::String(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) => serde_yaml::to_string(value)
            .map(|s| CellValue::String(s.trim_end().to_string()))
            .unwrap_or(CellValue::Null),
        Value::Tagged(tagged) => yaml_to_cell(&tagged.value),
    }
}

fn cell_to_yaml(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Int(i) => Value::Number((*i).into()),
        CellValue::Float(f) => Value::Number((*f).into()),
        CellValue::Date(_) | CellValue::DateTime(_) => Value::String(cell.as_str()),
        CellValue::String(s) => Value::String(s.clone()),
    }
}
