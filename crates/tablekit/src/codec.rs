//! The contract every format adapter implements.

use crate::databook::Databook;
use crate::dataset::Dataset;
use crate::error::{Result, TabError};
use crate::options::Options;
use std::fmt;

/// An operation the dispatcher can route to a codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ImportSet,
    ExportSet,
    ImportBook,
    ExportBook,
}

impl Operation {
    /// Whether a codec with these capabilities can perform the operation
    pub fn supported_by(self, caps: Capabilities) -> bool {
        match self {
            Operation::ImportSet => caps.dataset_import,
            Operation::ExportSet => caps.dataset_export,
            Operation::ImportBook => caps.databook_import,
            Operation::ExportBook => caps.databook_export,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::ImportSet => "dataset import",
            Operation::ExportSet => "dataset export",
            Operation::ImportBook => "databook import",
            Operation::ExportBook => "databook export",
        };
        f.write_str(label)
    }
}

/// Static declaration of what a codec can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub dataset_import: bool,
    pub dataset_export: bool,
    pub databook_import: bool,
    pub databook_export: bool,
    pub binary: bool,
}

impl Capabilities {
    /// Dataset import and export, text output
    pub const fn dataset() -> Self {
        Capabilities {
            dataset_import: true,
            dataset_export: true,
            databook_import: false,
            databook_export: false,
            binary: false,
        }
    }

    /// Dataset and databook import and export, text output
    pub const fn full() -> Self {
        Capabilities {
            dataset_import: true,
            dataset_export: true,
            databook_import: true,
            databook_export: true,
            binary: false,
        }
    }

    /// Dataset export only, text output
    pub const fn export_only() -> Self {
        Capabilities {
            dataset_import: false,
            dataset_export: true,
            databook_import: false,
            databook_export: false,
            binary: false,
        }
    }

    #[must_use]
    pub const fn binary(mut self) -> Self {
        self.binary = true;
        self
    }

    #[must_use]
    pub const fn with_book_export(mut self) -> Self {
        self.databook_export = true;
        self
    }

    #[must_use]
    pub const fn without_export(mut self) -> Self {
        self.dataset_export = false;
        self.databook_export = false;
        self
    }
}

/// Serialized output of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(s) => s.as_bytes(),
            Payload::Binary(b) => b,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Text(s) => s.into_bytes(),
            Payload::Binary(b) => b,
        }
    }

    /// The text of a text payload; `None` for binary output
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Binary(_) => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Payload::Binary(_))
    }

    /// Write the payload to a file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.as_bytes())?;
        Ok(())
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// A format adapter.
///
/// Codecs are stateless: they never keep references to a dataset or databook beyond a
/// single call, so one instance serves every call in the process. Operations a codec does
/// not declare in [`Codec::capabilities`] keep their default bodies, which fail with
/// [`TabError::Capability`].
pub trait Codec: Send + Sync {
    /// Stable registry name, e.g. `"csv"`
    fn name(&self) -> &'static str;

    /// File extensions conventionally used for the format
    fn extensions(&self) -> &'static [&'static str] {
        &[]
    }

    fn capabilities(&self) -> Capabilities;

    /// Cheap content sniff. Must return `false` on malformed input, never panic.
    fn detect(&self, _raw: &[u8]) -> bool {
        false
    }

    /// Populate `dataset` (which the dispatcher hands over empty) from `raw`
    fn import_set(&self, _raw: &[u8], _dataset: &mut Dataset, _options: &Options) -> Result<()> {
        Err(TabError::capability(self.name(), Operation::ImportSet))
    }

    fn export_set(&self, _dataset: &Dataset, _options: &Options) -> Result<Payload> {
        Err(TabError::capability(self.name(), Operation::ExportSet))
    }

    fn import_book(&self, _raw: &[u8], _book: &mut Databook, _options: &Options) -> Result<()> {
        Err(TabError::capability(self.name(), Operation::ImportBook))
    }

    fn export_book(&self, _book: &Databook, _options: &Options) -> Result<Payload> {
        Err(TabError::capability(self.name(), Operation::ExportBook))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_presets() {
        let caps = Capabilities::dataset().binary();
        assert!(caps.binary);
        assert!(Operation::ImportSet.supported_by(caps));
        assert!(!Operation::ExportBook.supported_by(caps));

        let caps = Capabilities::full().without_export();
        assert!(Operation::ImportBook.supported_by(caps));
        assert!(!Operation::ExportSet.supported_by(caps));

        let caps = Capabilities::export_only().with_book_export();
        assert!(Operation::ExportBook.supported_by(caps));
        assert!(!Operation::ImportSet.supported_by(caps));
    }

    #[test]
    fn test_payload_bytes() {
        let text = Payload::Text("a,b\r\n".to_string());
        assert_eq!(text.as_bytes(), b"a,b\r\n");
        assert_eq!(text.as_text(), Some("a,b\r\n"));
        assert!(!text.is_binary());

        let binary = Payload::Binary(vec![0, 1, 2]);
        assert!(binary.as_text().is_none());
        assert_eq!(binary.into_bytes(), vec![0, 1, 2]);
    }

    struct Silent;

    impl Codec for Silent {
        fn name(&self) -> &'static str {
            "silent"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::default()
        }
    }

    #[test]
    fn test_default_bodies_fail_with_capability() {
        let err = Silent
            .export_set(&Dataset::new(), &Options::new())
            .unwrap_err();
        assert!(matches!(
            err,
            TabError::Capability {
                operation: Operation::ExportSet,
                ..
            }
        ));
        assert!(!Silent.detect(b"anything"));
    }
}
