//! JSON support.
//!
//! A dataset with headers is written as an array of objects
//! `[{"name": "Alice", "age": 30}, ...]`; without headers as an array of arrays. A databook
//! is an array of `{"title": ..., "data": [...]}` entries.

use crate::cell::CellValue;
use crate::codec::{Capabilities, Codec, Payload};
use crate::databook::Databook;
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::formats::fill_dataset;
use crate::options::Options;
use serde_json::{Map, Value};

const NAME: &str = "json";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    fn detect(&self, raw: &[u8]) -> bool {
        let starts_like_json = raw
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'[' || *b == b'{');
        starts_like_json && serde_json::from_slice::<serde::de::IgnoredAny>(raw).is_ok()
    }

    fn import_set(&self, raw: &[u8], dataset: &mut Dataset, _options: &Options) -> Result<()> {
        let value: Value = serde_json::from_slice(raw).map_err(|e| TabError::import(NAME, e))?;
        let Value::Array(items) = value else {
            return Err(TabError::import(NAME, "expected an array of rows"));
        };
        load_rows(items, dataset)
    }

    fn export_set(&self, dataset: &Dataset, options: &Options) -> Result<Payload> {
        render(&dataset_value(dataset), options)
    }

    fn import_book(&self, raw: &[u8], book: &mut Databook, _options: &Options) -> Result<()> {
        let value: Value = serde_json::from_slice(raw).map_err(|e| TabError::import(NAME, e))?;
        let Value::Array(entries) = value else {
            return Err(TabError::import(NAME, "expected an array of sheets"));
        };

        for (idx, entry) in entries.into_iter().enumerate() {
            let Value::Object(mut entry) = entry else {
                return Err(TabError::import(
                    NAME,
                    format!("sheet at index {idx} must be an object"),
                ));
            };
            let mut sheet = Dataset::new();
            match entry.remove("title") {
                Some(Value::String(title)) => sheet.set_title(Some(&title)),
                Some(Value::Null) | None => {}
                Some(other) => sheet.set_title(Some(&other.to_string())),
            }
            match entry.remove("data") {
                Some(Value::Array(items)) => load_rows(items, &mut sheet)?,
                Some(_) => {
                    return Err(TabError::import(
                        NAME,
                        format!("sheet at index {idx}: data must be an array"),
                    ))
                }
                None => {
                    return Err(TabError::import(
                        NAME,
                        format!("sheet at index {idx} has no data key"),
                    ))
                }
            }
            if let Some(key) = entry.keys().next() {
                return Err(TabError::import(
                    NAME,
                    format!("sheet at index {idx} has unexpected key {key:?}"),
                ));
            }
            book.add_sheet(sheet);
        }
        Ok(())
    }

    fn export_book(&self, book: &Databook, options: &Options) -> Result<Payload> {
        let sheets: Vec<Value> = book
            .iter()
            .map(|sheet| {
                let mut entry = Map::new();
                entry.insert(
                    "title".to_string(),
                    sheet.title().map_or(Value::Null, |t| Value::String(t.to_string())),
                );
                entry.insert("data".to_string(), dataset_value(sheet));
                Value::Object(entry)
            })
            .collect();
        render(&Value::Array(sheets), options)
    }
}

fn render(value: &Value, options: &Options) -> Result<Payload> {
    let text = if options.bool_or("pretty", false)? {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| TabError::export(NAME, e))?;
    Ok(Payload::Text(text))
}

/// Array of objects keyed by header, or array of arrays without headers
fn dataset_value(dataset: &Dataset) -> Value {
    let rows = match dataset.headers() {
        Some(headers) => dataset
            .rows()
            .iter()
            .map(|row| {
                let object: Map<String, Value> = headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(cell_to_json_value))
                    .collect();
                Value::Object(object)
            })
            .collect(),
        None => dataset
            .rows()
            .iter()
            .map(|row| Value::Array(row.iter().map(cell_to_json_value).collect()))
            .collect(),
    };
    Value::Array(rows)
}

/// Fill a dataset from an array of objects (keys of the first object become headers) or
/// an array of arrays (no headers)
fn load_rows(items: Vec<Value>, dataset: &mut Dataset) -> Result<()> {
    let Some(first) = items.first() else {
        return Ok(());
    };

    match first {
        Value::Object(first) => {
            let headers: Vec<String> = first.keys().cloned().collect();
            let mut grid = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let obj = item.as_object().ok_or_else(|| {
                    TabError::import(NAME, format!("element at index {idx} must be an object"))
                })?;
                grid.push(
                    headers
                        .iter()
                        .map(|name| json_value_to_cell(obj.get(name).unwrap_or(&Value::Null)))
                        .collect(),
                );
            }
            dataset.set_headers(Some(headers))?;
            fill_dataset(NAME, dataset, grid, false, &CellValue::Null)
        }
        Value::Array(_) => {
            let mut grid = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let values = item.as_array().ok_or_else(|| {
                    TabError::import(NAME, format!("element at index {idx} must be an array"))
                })?;
                grid.push(values.iter().map(json_value_to_cell).collect());
            }
            fill_dataset(NAME, dataset, grid, false, &CellValue::Null)
        }
        _ => Err(TabError::import(
            NAME,
            "rows must be objects or arrays",
        )),
    }
}

/// Convert a serde_json Value to a CellValue
fn json_value_to_cell(value: &Value) -> CellValue {
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
        // Nested structures are kept as their JSON text
        Value::Array(_) | Value::Object(_) => CellValue::String(value.to_string()),
    }
}

/// Convert a CellValue to a serde_json Value
fn cell_to_json_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Int(i) => Value::Number((*i).into()),
        CellValue::Float(f) => {
            // from_f64 returns None for NaN and Infinity
            serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string()))
        }
        CellValue::Date(_) | CellValue::DateTime(_) => Value::String(cell.as_str()),
        CellValue::String(s) => Value::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_export_objects() {
        let ds = Dataset::from_rows(
            Some(vec!["name", "age"]),
            vec![vec![CellValue::from("Alice"), 30.into()]],
        )
        .unwrap();
        let payload = JsonCodec.export_set(&ds, &Options::new()).unwrap();
        assert_eq!(payload.as_text(), Some(r#"[{"name":"Alice","age":30}]"#));
    }

    #[test]
    fn test_export_arrays_without_headers() {
        let ds = Dataset::from_rows(None::<Vec<String>>, vec![vec![1, 2], vec![3, 4]]).unwrap();
        let payload = JsonCodec.export_set(&ds, &Options::new()).unwrap();
        assert_eq!(payload.as_text(), Some("[[1,2],[3,4]]"));
    }

    #[test]
    fn test_import_types() {
        let json = r#"[
            {"bool": true, "int": 42, "float": 3.5, "string": "hello", "null": null}
        ]"#;
        let mut ds = Dataset::new();
        JsonCodec
            .import_set(json.as_bytes(), &mut ds, &Options::new())
            .unwrap();

        let records = ds.to_records().unwrap();
        assert_eq!(records[0]["bool"], CellValue::Bool(true));
        assert_eq!(records[0]["int"], CellValue::Int(42));
        assert_eq!(records[0]["float"], CellValue::Float(3.5));
        assert_eq!(records[0]["null"], CellValue::Null);
    }

    #[test]
    fn test_import_missing_keys_become_null() {
        let json = r#"[{"a": 1, "b": 2}, {"a": 3}]"#;
        let mut ds = Dataset::new();
        JsonCodec
            .import_set(json.as_bytes(), &mut ds, &Options::new())
            .unwrap();
        assert_eq!(ds.get(1, 1).unwrap(), &CellValue::Null);
    }

    #[test]
    fn test_import_empty() {
        let mut ds = Dataset::new();
        JsonCodec.import_set(b"[]", &mut ds, &Options::new()).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn test_import_rejects_scalars() {
        let mut ds = Dataset::new();
        assert!(JsonCodec.import_set(b"[1, 2]", &mut ds, &Options::new()).is_err());
        assert!(JsonCodec.import_set(b"{\"a\": 1}", &mut ds, &Options::new()).is_err());
    }

    #[test]
    fn test_dates_as_iso_strings() {
        let ds = Dataset::from_rows(
            Some(vec!["d"]),
            vec![vec![NaiveDate::from_ymd_opt(2021, 7, 4).unwrap()]],
        )
        .unwrap();
        let payload = JsonCodec.export_set(&ds, &Options::new()).unwrap();
        assert_eq!(payload.as_text(), Some(r#"[{"d":"2021-07-04"}]"#));
    }

    #[test]
    fn test_nan_infinity_as_strings() {
        let ds = Dataset::from_rows(
            None::<Vec<String>>,
            vec![vec![f64::NAN], vec![f64::INFINITY]],
        )
        .unwrap();
        let json = JsonCodec
            .export_set(&ds, &Options::new())
            .unwrap()
            .as_text()
            .unwrap()
            .to_string();
        assert_eq!(json, r#"[["NaN"],["inf"]]"#);
    }

    #[test]
    fn test_book_roundtrip() {
        let mut book = Databook::new();
        book.add_sheet(
            Dataset::from_rows(Some(vec!["x"]), vec![vec![1]])
                .unwrap()
                .with_title("first"),
        );
        book.add_sheet(Dataset::new().with_title("empty"));

        let payload = JsonCodec.export_book(&book, &Options::new()).unwrap();
        assert_eq!(
            payload.as_text(),
            Some(r#"[{"title":"first","data":[{"x":1}]},{"title":"empty","data":[]}]"#)
        );

        let mut loaded = Databook::new();
        JsonCodec
            .import_book(payload.as_bytes(), &mut loaded, &Options::new())
            .unwrap();
        assert_eq!(loaded.titles(), vec![Some("first"), Some("empty")]);
        assert_eq!(loaded.sheet("first").unwrap().get(0, 0).unwrap(), &CellValue::Int(1));
    }

    #[test]
    fn test_import_book_requires_sheet_entries() {
        for json in [
            r#"[{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]"#,
            r#"[{"title": "t"}]"#,
            r#"[{"title": "t", "data": null}]"#,
            r#"[{"title": "t", "data": [], "extra": 1}]"#,
        ] {
            let mut book = Databook::new();
            let err = JsonCodec
                .import_book(json.as_bytes(), &mut book, &Options::new())
                .unwrap_err();
            assert!(matches!(err, TabError::Import { .. }), "{json}");
        }
    }

    #[test]
    fn test_pretty_option() {
        let ds = Dataset::from_rows(None::<Vec<String>>, vec![vec![1]]).unwrap();
        let payload = JsonCodec
            .export_set(&ds, &Options::new().with("pretty", true))
            .unwrap();
        assert!(payload.as_text().unwrap().contains('\n'));
    }

    #[test]
    fn test_detect() {
        assert!(JsonCodec.detect(b"  [1, 2]"));
        assert!(JsonCodec.detect(b"{\"a\": 1}"));
        assert!(!JsonCodec.detect(b"[1, 2"));
        assert!(!JsonCodec.detect(b"\"text\""));
        assert!(!JsonCodec.detect(b"id,name\r\n"));
    }
}
