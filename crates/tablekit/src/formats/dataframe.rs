//! Arrow conversion and the `df` codec (Arrow IPC file format).
//!
//! Every column becomes one typed Arrow array. A column whose non-null values share one
//! kind keeps that type (ints and floats widen to Float64); anything mixed is written as
//! Utf8. Header-less datasets get positional column names `"0"`, `"1"`, ...

use crate::cell::CellValue;
use crate::codec::{Capabilities, Codec, Payload};
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::options::Options;
use crate::row::Row;
use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::Datelike;
use std::io::Cursor;
use std::sync::Arc;

const NAME: &str = "df";
const MAGIC: &[u8] = b"ARROW1";

/// Days from 0001-01-01 (CE day 1) to the Unix epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowCodec;

impl Codec for ArrowCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["arrow", "feather"]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::dataset().binary()
    }

    fn detect(&self, raw: &[u8]) -> bool {
        raw.starts_with(MAGIC)
    }

    fn import_set(&self, raw: &[u8], dataset: &mut Dataset, _options: &Options) -> Result<()> {
        let reader =
            FileReader::try_new(Cursor::new(raw), None).map_err(|e| TabError::import(NAME, e))?;
        let schema = reader.schema();
        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TabError::import(NAME, e))?;
        load_batches(&schema, &batches, dataset)
    }

    fn export_set(&self, dataset: &Dataset, _options: &Options) -> Result<Payload> {
        let batch = to_record_batch(dataset).map_err(|e| TabError::export(NAME, e))?;
        let mut writer = FileWriter::try_new(Vec::new(), batch.schema_ref())
            .map_err(|e| TabError::export(NAME, e))?;
        writer.write(&batch).map_err(|e| TabError::export(NAME, e))?;
        writer.finish().map_err(|e| TabError::export(NAME, e))?;
        let buffer = writer.into_inner().map_err(|e| TabError::export(NAME, e))?;
        Ok(Payload::Binary(buffer))
    }
}

/// Build a single record batch holding the whole dataset
pub(crate) fn to_record_batch(
    dataset: &Dataset,
) -> std::result::Result<RecordBatch, arrow::error::ArrowError> {
    let rows = dataset.rows();
    let col_types: Vec<DataType> = (0..dataset.width())
        .map(|col| infer_column_type(rows, col))
        .collect();

    let fields: Vec<Field> = dataset
        .column_labels()
        .iter()
        .zip(&col_types)
        .map(|(name, dtype)| Field::new(name, dtype.clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let arrays: Vec<ArrayRef> = col_types
        .iter()
        .enumerate()
        .map(|(col, dtype)| build_arrow_array(rows, col, dtype))
        .collect();

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    RecordBatch::try_new_with_options(schema, arrays, &options)
}

/// Fill a dataset from record batches; schema field names become the headers
pub(crate) fn load_batches(
    schema: &Schema,
    batches: &[RecordBatch],
    dataset: &mut Dataset,
) -> Result<()> {
    if schema.fields().is_empty() {
        return Ok(());
    }
    let headers: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    dataset.set_headers(Some(headers))?;

    for batch in batches {
        for row_idx in 0..batch.num_rows() {
            let values: Vec<CellValue> = batch
                .columns()
                .iter()
                .map(|array| arrow_array_to_cell(array, row_idx))
                .collect();
            dataset.append(values)?;
        }
    }
    Ok(())
}

/// Infer the Arrow DataType for a column from its non-null values
fn infer_column_type(rows: &[Row], col: usize) -> DataType {
    let mut has_bool = false;
    let mut has_int = false;
    let mut has_float = false;
    let mut has_date = false;
    let mut has_datetime = false;
    let mut has_string = false;

    for row in rows {
        match row.get(col) {
            None | Some(CellValue::Null) => {}
            Some(CellValue::Bool(_)) => has_bool = true,
            Some(CellValue::Int(_)) => has_int = true,
            Some(CellValue::Float(_)) => has_float = true,
            Some(CellValue::Date(_)) => has_date = true,
            Some(CellValue::DateTime(_)) => has_datetime = true,
            Some(CellValue::String(_)) => has_string = true,
        }
    }

    let numeric = has_int || has_float;
    let kinds = [has_bool, numeric, has_date, has_datetime, has_string]
        .iter()
        .filter(|k| **k)
        .count();

    match kinds {
        1 if has_bool => DataType::Boolean,
        1 if has_float => DataType::Float64,
        1 if has_int => DataType::Int64,
        1 if has_date => DataType::Date32,
        1 if has_datetime => DataType::Timestamp(TimeUnit::Microsecond, None),
        // Text, mixed kinds, and null-only columns
        _ => DataType::Utf8,
    }
}

/// Build an Arrow array from column data
fn build_arrow_array(rows: &[Row], col: usize, dtype: &DataType) -> ArrayRef {
    let cells = rows.iter().map(|row| row.get(col).filter(|c| !c.is_null()));
    match dtype {
        DataType::Boolean => {
            let values: Vec<Option<bool>> = cells.map(|c| c.and_then(CellValue::as_bool)).collect();
            Arc::new(BooleanArray::from(values))
        }
        DataType::Int64 => {
            let values: Vec<Option<i64>> = cells.map(|c| c.and_then(CellValue::as_int)).collect();
            Arc::new(Int64Array::from(values))
        }
        DataType::Float64 => {
            let values: Vec<Option<f64>> =
                cells.map(|c| c.and_then(CellValue::as_float)).collect();
            Arc::new(Float64Array::from(values))
        }
        DataType::Date32 => {
            let values: Vec<Option<i32>> = cells
                .map(|c| {
                    c.and_then(CellValue::as_date)
                        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
                })
                .collect();
            Arc::new(Date32Array::from(values))
        }
        DataType::Timestamp(TimeUnit::Microsecond, None) => {
            let values: Vec<Option<i64>> = cells
                .map(|c| match c {
                    Some(CellValue::DateTime(dt)) => Some(dt.and_utc().timestamp_micros()),
                    _ => None,
                })
                .collect();
            Arc::new(TimestampMicrosecondArray::from(values))
        }
        _ => {
            let values: Vec<Option<String>> = cells.map(|c| c.map(CellValue::as_str)).collect();
            Arc::new(StringArray::from(values))
        }
    }
}

/// Convert an Arrow array element at a given index to a CellValue
fn arrow_array_to_cell(array: &ArrayRef, idx: usize) -> CellValue {
    if array.is_null(idx) {
        return CellValue::Null;
    }

    let any = array.as_any();
    let converted = match array.data_type() {
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|arr| CellValue::Bool(arr.value(idx))),
        DataType::Int8 => any
            .downcast_ref::<arrow::array::Int8Array>()
            .map(|arr| CellValue::Int(i64::from(arr.value(idx)))),
        DataType::Int16 => any
            .downcast_ref::<arrow::array::Int16Array>()
            .map(|arr| CellValue::Int(i64::from(arr.value(idx)))),
        DataType::Int32 => any
            .downcast_ref::<arrow::array::Int32Array>()
            .map(|arr| CellValue::Int(i64::from(arr.value(idx)))),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|arr| CellValue::Int(arr.value(idx))),
        DataType::UInt8 => any
            .downcast_ref::<arrow::array::UInt8Array>()
            .map(|arr| CellValue::Int(i64::from(arr.value(idx)))),
        DataType::UInt16 => any
            .downcast_ref::<arrow::array::UInt16Array>()
            .map(|arr| CellValue::Int(i64::from(arr.value(idx)))),
        DataType::UInt32 => any
            .downcast_ref::<arrow::array::UInt32Array>()
            .map(|arr| CellValue::Int(i64::from(arr.value(idx)))),
        DataType::UInt64 => any
            .downcast_ref::<arrow::array::UInt64Array>()
            .and_then(|arr| i64::try_from(arr.value(idx)).ok())
            .map(CellValue::Int),
        DataType::Float32 => any
            .downcast_ref::<arrow::array::Float32Array>()
            .map(|arr| CellValue::Float(f64::from(arr.value(idx)))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|arr| CellValue::Float(arr.value(idx))),
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|arr| CellValue::String(arr.value(idx).to_string())),
        DataType::LargeUtf8 => any
            .downcast_ref::<arrow::array::LargeStringArray>()
            .map(|arr| CellValue::String(arr.value(idx).to_string())),
        DataType::Date32 => any
            .downcast_ref::<Date32Array>()
            .and_then(|arr| arr.value_as_date(idx))
            .map(CellValue::Date),
        DataType::Timestamp(TimeUnit::Microsecond, None) => any
            .downcast_ref::<TimestampMicrosecondArray>()
            .and_then(|arr| arr.value_as_datetime(idx))
            .map(CellValue::DateTime),
        _ => None,
    };

    // Other types fall back to Arrow's display formatting
    converted.unwrap_or_else(|| {
        match arrow::util::display::array_value_to_string(array, idx) {
            Ok(s) => CellValue::String(s),
            Err(_) => CellValue::String(format!("<{}>", array.data_type())),
        }
    })
}
