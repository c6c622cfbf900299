//! Ordered codec registry.
//!
//! Registration order is significant: auto-detection asks codecs in the order they were
//! registered and the first positive answer wins. The built-in order puts binary formats
//! with unambiguous signatures first and the permissive text sniffers (csv, tsv) last.

use crate::codec::Codec;
use crate::error::{Result, TabError};
use crate::formats::{
    ArrowCodec, CsvCodec, DbfCodec, HtmlCodec, JiraCodec, JsonCodec, LatexCodec, OdsCodec,
    ParquetCodec, RstCodec, XlsxCodec, YamlCodec,
};
use std::sync::OnceLock;
use tracing::debug;

/// Name-addressable, ordered set of codecs
#[derive(Default)]
pub struct Registry {
    codecs: Vec<Box<dyn Codec>>,
}

impl Registry {
    /// Registry with no codecs
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A fresh registry holding every built-in codec in detection order
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(XlsxCodec);
        registry.register(OdsCodec);
        registry.register(ParquetCodec);
        registry.register(ArrowCodec);
        registry.register(DbfCodec);
        registry.register(JsonCodec);
        registry.register(HtmlCodec);
        registry.register(YamlCodec);
        registry.register(CsvCodec::csv());
        registry.register(CsvCodec::tsv());
        registry.register(JiraCodec);
        registry.register(LatexCodec);
        registry.register(RstCodec);
        registry
    }

    /// Process-wide registry of built-in codecs, initialized on first use
    pub fn builtin() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::with_builtins)
    }

    /// Add a codec at the end of the detection order.
    ///
    /// A codec with the same name replaces the existing one and keeps its position.
    pub fn register<C: Codec + 'static>(&mut self, codec: C) {
        let name = codec.name();
        if let Some(slot) = self.codecs.iter_mut().find(|c| c.name() == name) {
            debug!(format = name, "replacing registered codec");
            *slot = Box::new(codec);
        } else {
            self.codecs.push(Box::new(codec));
        }
    }

    /// Look up a codec by name
    pub fn get(&self, name: &str) -> Result<&dyn Codec> {
        self.codecs
            .iter()
            .find(|c| c.name() == name)
            .map(AsRef::as_ref)
            .ok_or_else(|| TabError::UnsupportedFormat {
                format: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.codecs.iter().any(|c| c.name() == name)
    }

    /// First registered codec whose detector accepts `raw`
    pub fn detect(&self, raw: &[u8]) -> Option<&dyn Codec> {
        self.codecs
            .iter()
            .find(|c| c.detect(raw))
            .map(AsRef::as_ref)
    }

    /// First registered codec claiming the file extension (case-insensitive, no dot)
    pub fn for_extension(&self, ext: &str) -> Option<&dyn Codec> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        self.codecs
            .iter()
            .find(|c| c.extensions().iter().any(|e| *e == ext))
            .map(AsRef::as_ref)
    }

    /// Registered names in detection order
    pub fn names(&self) -> Vec<&'static str> {
        self.codecs.iter().map(|c| c.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Codec> {
        self.codecs.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("codecs", &self.names())
            .finish()
    }
}
