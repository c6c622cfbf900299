use super::spreadsheet::{self, contains, is_zip};
use crate::codec::{Capabilities, Codec};
use crate::databook::Databook;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::options::Options;
use calamine::Ods;
use std::io::Cursor;

const NAME: &str = "ods";
const MIMETYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";

/// OpenDocument spreadsheets (read-only, via calamine)
#[derive(Debug, Clone, Copy, Default)]
pub struct OdsCodec;

impl Codec for OdsCodec {
    fn name(&self) -> &'static str {
        NAME
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ods"]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full().without_export().binary()
    }

    /// The `mimetype` entry is stored first and uncompressed in every ODS package
    fn detect(&self, raw: &[u8]) -> bool {
        let head = &raw[..raw.len().min(256)];
        is_zip(raw) && contains(head, MIMETYPE)
    }

    fn import_set(&self, raw: &[u8], dataset: &mut Dataset, options: &Options) -> Result<()> {
        spreadsheet::import_set::<Ods<Cursor<&[u8]>>>(NAME, raw, dataset, options)
    }

    fn import_book(&self, raw: &[u8], book: &mut Databook, options: &Options) -> Result<()> {
        spreadsheet::import_book::<Ods<Cursor<&[u8]>>>(NAME, raw, book, options)
    }
}
