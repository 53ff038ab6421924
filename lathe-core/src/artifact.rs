//! In-flight artifact buffers and canonical artifact file names.

/// Extension of the emitted binary image.
pub const BINARY_EXT: &str = "wasm";
/// Extension of the symbol map.
pub const SYMBOL_EXT: &str = "map";
/// Extension of the extracted documentation.
pub const DOC_EXT: &str = "docs.md";

/// The byte buffers produced by one emission.
///
/// A bundle is created fresh per invocation and owned exclusively by
/// that invocation until finalization hands the buffers to the loader
/// or the filesystem writer. Only the binary image is mandatory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArtifactBundle {
    pub binary: Vec<u8>,
    pub symbols: Option<Vec<u8>>,
    pub docs: Option<Vec<u8>>,
}

impl ArtifactBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a non-empty symbol stream is present.
    pub fn has_symbols(&self) -> bool {
        self.symbols.as_ref().is_some_and(|s| !s.is_empty())
    }
}

pub fn binary_file_name(unit: &str) -> String {
    format!("{unit}.{BINARY_EXT}")
}

pub fn symbol_file_name(unit: &str) -> String {
    format!("{unit}.{SYMBOL_EXT}")
}

pub fn doc_file_name(unit: &str) -> String {
    format!("{unit}.{DOC_EXT}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_file_names() {
        assert_eq!(binary_file_name("Foo"), "Foo.wasm");
        assert_eq!(symbol_file_name("Foo"), "Foo.map");
        assert_eq!(doc_file_name("Foo"), "Foo.docs.md");
    }

    #[test]
    fn empty_symbol_stream_counts_as_absent() {
        let mut bundle = ArtifactBundle::new();
        assert!(!bundle.has_symbols());
        bundle.symbols = Some(Vec::new());
        assert!(!bundle.has_symbols());
        bundle.symbols = Some(vec![1]);
        assert!(bundle.has_symbols());
    }
}
