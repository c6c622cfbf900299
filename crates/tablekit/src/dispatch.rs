//! Routing of import/export calls to codecs.
//!
//! The [`Dispatcher`] resolves a codec either by explicit name or by content detection,
//! enforces the codec's declared capabilities, and runs imports into a scratch container so
//! a failed import never leaves the target half-populated.

use crate::codec::{Codec, Operation, Payload};
use crate::databook::Databook;
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::options::Options;
use crate::registry::Registry;
use std::path::Path;
use tracing::{debug, trace};

/// Resolves codecs against a registry and invokes them
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r Registry,
}

impl Dispatcher<'static> {
    /// Dispatcher over the process-wide built-in registry
    pub fn builtin() -> Self {
        Dispatcher::new(Registry::builtin())
    }
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Dispatcher { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Name of the first codec whose detector accepts `raw`
    pub fn detect(&self, raw: &[u8]) -> Option<&'static str> {
        for codec in self.registry.iter() {
            let matched = codec.detect(raw);
            trace!(format = codec.name(), matched, "detection probe");
            if matched {
                debug!(format = codec.name(), bytes = raw.len(), "format detected");
                return Some(codec.name());
            }
        }
        debug!(bytes = raw.len(), "no codec recognized the input");
        None
    }

    /// Codec for an explicit format name, checked against the requested operation
    fn resolve(&self, format: &str, operation: Operation) -> Result<&'r dyn Codec> {
        let codec = self.registry.get(format)?;
        ensure_supports(codec, operation)?;
        debug!(format, %operation, "codec selected");
        Ok(codec)
    }

    /// Codec for an import: by name when given, otherwise by detection
    fn resolve_import(
        &self,
        raw: &[u8],
        format: Option<&str>,
        operation: Operation,
    ) -> Result<&'r dyn Codec> {
        if let Some(format) = format {
            return self.resolve(format, operation);
        }
        let name = self.detect(raw).ok_or(TabError::UndetectableFormat)?;
        let codec = self.registry.get(name)?;
        ensure_supports(codec, operation)?;
        Ok(codec)
    }

    /// Export through the named codec. Codecs see formatted values.
    pub fn export_set(&self, dataset: &Dataset, format: &str, options: &Options) -> Result<Payload> {
        let codec = self.resolve(format, Operation::ExportSet)?;
        codec.export_set(&dataset.formatted(), options)
    }

    pub fn export_book(&self, book: &Databook, format: &str, options: &Options) -> Result<Payload> {
        let codec = self.resolve(format, Operation::ExportBook)?;
        if book.iter().any(Dataset::has_formatters) {
            let formatted = book.iter().map(|sheet| sheet.formatted().into_owned()).collect();
            return codec.export_book(&Databook::from_sheets(formatted), options);
        }
        codec.export_book(book, options)
    }

    /// Replace `dataset`'s contents with `raw`. The title survives; on error `dataset` is
    /// left untouched.
    pub fn import_set(
        &self,
        raw: &[u8],
        format: Option<&str>,
        dataset: &mut Dataset,
        options: &Options,
    ) -> Result<()> {
        let codec = self.resolve_import(raw, format, Operation::ImportSet)?;

        let mut scratch = Dataset::new();
        scratch.set_title(dataset.title());
        codec.import_set(raw, &mut scratch, options)?;

        debug!(
            format = codec.name(),
            rows = scratch.height(),
            cols = scratch.width(),
            "dataset imported"
        );
        *dataset = scratch;
        Ok(())
    }

    /// Replace `book`'s sheets with the sheets in `raw`; on error `book` is left untouched.
    pub fn import_book(
        &self,
        raw: &[u8],
        format: Option<&str>,
        book: &mut Databook,
        options: &Options,
    ) -> Result<()> {
        let codec = self.resolve_import(raw, format, Operation::ImportBook)?;

        let mut scratch = Databook::new();
        codec.import_book(raw, &mut scratch, options)?;

        debug!(format = codec.name(), sheets = scratch.size(), "databook imported");
        *book = scratch;
        Ok(())
    }
}

fn ensure_supports(codec: &dyn Codec, operation: Operation) -> Result<()> {
    if operation.supported_by(codec.capabilities()) {
        Ok(())
    } else {
        Err(TabError::capability(codec.name(), operation))
    }
}

/// Name of the first built-in format that recognizes `raw`
pub fn detect_format(raw: &[u8]) -> Option<&'static str> {
    Dispatcher::builtin().detect(raw)
}

/// Format named by a path's extension, if a built-in codec claims it
fn format_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    Registry::builtin().for_extension(ext).map(|c| c.name())
}

impl Dataset {
    /// Serialize with the named format and default options
    pub fn export(&self, format: &str) -> Result<Payload> {
        self.export_with(format, &Options::new())
    }

    pub fn export_with(&self, format: &str, options: &Options) -> Result<Payload> {
        Dispatcher::builtin().export_set(self, format, options)
    }

    /// Replace the contents from `raw`, detecting the format when `format` is `None`
    pub fn load(&mut self, raw: &[u8], format: Option<&str>) -> Result<()> {
        self.load_with(raw, format, &Options::new())
    }

    pub fn load_with(&mut self, raw: &[u8], format: Option<&str>, options: &Options) -> Result<()> {
        Dispatcher::builtin().import_set(raw, format, self, options)
    }

    /// Build a new dataset from `raw`
    pub fn import(raw: &[u8], format: Option<&str>) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        dataset.load(raw, format)?;
        Ok(dataset)
    }

    /// Read a file, choosing the format from its extension and falling back to detection
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let path = path.as_ref();
        let raw = std::fs::read(path)?;
        let mut dataset = Dataset::new();
        dataset.load(&raw, format_for_path(path))?;
        Ok(dataset)
    }

    /// Write the dataset to a file in the named format
    pub fn save<P: AsRef<Path>>(&self, path: P, format: &str) -> Result<()> {
        self.export(format)?.save(path)
    }
}

impl Databook {
    pub fn export(&self, format: &str) -> Result<Payload> {
        self.export_with(format, &Options::new())
    }

    pub fn export_with(&self, format: &str, options: &Options) -> Result<Payload> {
        Dispatcher::builtin().export_book(self, format, options)
    }

    /// Replace the sheets from `raw`, detecting the format when `format` is `None`
    pub fn load(&mut self, raw: &[u8], format: Option<&str>) -> Result<()> {
        self.load_with(raw, format, &Options::new())
    }

    pub fn load_with(&mut self, raw: &[u8], format: Option<&str>, options: &Options) -> Result<()> {
        Dispatcher::builtin().import_book(raw, format, self, options)
    }

    pub fn import(raw: &[u8], format: Option<&str>) -> Result<Databook> {
        let mut book = Databook::new();
        book.load(raw, format)?;
        Ok(book)
    }

    /// Read a multi-sheet file, choosing the format from its extension and falling back to
    /// detection
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Databook> {
        let path = path.as_ref();
        let raw = std::fs::read(path)?;
        let mut book = Databook::new();
        book.load(&raw, format_for_path(path))?;
        Ok(book)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, format: &str) -> Result<()> {
        self.export(format)?.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_unknown_format() {
        let err = Dataset::new().export("docx").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_export_only_format_rejects_import() {
        let err = Dataset::import(b"||a||", Some("jira")).unwrap_err();
        assert!(matches!(
            err,
            TabError::Capability {
                operation: Operation::ImportSet,
                ..
            }
        ));
    }

    #[test]
    fn test_undetectable() {
        let err = Dataset::import(b"\x00\x01\x02", None).unwrap_err();
        assert!(matches!(err, TabError::UndetectableFormat));
    }

    #[test]
    fn test_failed_load_keeps_target() {
        let mut data = Dataset::from_rows(Some(vec!["a"]), vec![vec![1]]).unwrap();
        let before = data.clone();
        assert!(data.load(b"{not json", Some("json")).is_err());
        assert_eq!(data, before);
    }

    #[test]
    fn test_load_keeps_title() {
        let mut data = Dataset::new().with_title("people");
        data.load(b"a,b\r\n1,2\r\n", Some("csv")).unwrap();
        assert_eq!(data.title(), Some("people"));
        assert_eq!(data.height(), 1);
    }
}
