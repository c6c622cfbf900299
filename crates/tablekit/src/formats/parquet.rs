//! Apache Parquet support, a columnar storage format with efficient compression.
//!
//! Datasets go through the same Arrow record batch conversion as the `df` codec.

use crate::codec::{Capabilities, Codec, Payload};
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::formats::dataframe::{load_batches, to_record_batch};
use crate::options::Options;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

const NAME: &str = "parquet";
const MAGIC: &[u8] = b"PAR1";

#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetCodec;

impl Codec for ParquetCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["parquet", "pq"]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::dataset().binary()
    }

    /// Magic bytes at both ends, with room for the footer length between them
    fn detect(&self, raw: &[u8]) -> bool {
        raw.len() >= 12 && raw.starts_with(MAGIC) && raw.ends_with(MAGIC)
    }

    fn import_set(&self, raw: &[u8], dataset: &mut Dataset, _options: &Options) -> Result<()> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(raw.to_vec()))
            .map_err(|e| TabError::import(NAME, e))?;

        let schema = builder.schema().clone();
        let reader = builder.build().map_err(|e| TabError::import(NAME, e))?;

        let mut batches = Vec::new();
        for batch_result in reader {
            batches.push(batch_result.map_err(|e| TabError::import(NAME, e))?);
        }
        load_batches(&schema, &batches, dataset)
    }

    fn export_set(&self, dataset: &Dataset, _options: &Options) -> Result<Payload> {
        let batch = to_record_batch(dataset).map_err(|e| TabError::export(NAME, e))?;

        let mut writer = ArrowWriter::try_new(Vec::new(), batch.schema(), None)
            .map_err(|e| TabError::export(NAME, e))?;
        writer.write(&batch).map_err(|e| TabError::export(NAME, e))?;
        let buffer = writer
            .into_inner()
            .map_err(|e| TabError::export(NAME, e))?;

        Ok(Payload::Binary(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::error::ErrorKind;

    #[test]
    fn test_roundtrip() {
        let ds = Dataset::from_rows(
            Some(vec!["name", "age", "score", "active"]),
            vec![
                vec![
                    CellValue::from("Alice"),
                    CellValue::Int(30),
                    CellValue::Float(95.5),
                    CellValue::Bool(true),
                ],
                vec![
                    CellValue::from("Bob"),
                    CellValue::Null,
                    CellValue::Float(87.0),
                    CellValue::Bool(false),
                ],
            ],
        )
        .unwrap();

        let payload = ParquetCodec.export_set(&ds, &Options::new()).unwrap();
        assert!(payload.is_binary());
        assert!(ParquetCodec.detect(payload.as_bytes()));

        let mut loaded = Dataset::new();
        ParquetCodec
            .import_set(payload.as_bytes(), &mut loaded, &Options::new())
            .unwrap();
        assert_eq!(loaded, ds);
    }

    #[test]
    fn test_detect_needs_both_magics() {
        assert!(!ParquetCodec.detect(b"PAR1"));
        assert!(!ParquetCodec.detect(b"PAR1 not a footer at all"));
        assert!(ParquetCodec.detect(b"PAR1\0\0\0\0\0\0\0\0PAR1"));
    }

    #[test]
    fn test_import_garbage() {
        let mut ds = Dataset::new();
        let err = ParquetCodec
            .import_set(b"PAR1\0\0\0\0\0\0\0\0PAR1", &mut ds, &Options::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Import);
    }
}
