//! Symbol map generation and the symbol-support capability probe.
//!
//! The symbol map is a small text table tying wasm function indices
//! back to source-level names, written next to the binary as
//! `<unit>.map`. Whether symbol output is attempted at all is decided
//! once per process by [`symbols_supported`].

use std::fmt::Write as _;
use std::sync::OnceLock;

use tracing::warn;

use crate::ast::Program;

const FORMAT_HEADER: &str = "lathe-symbols 1";

/// Incremental writer for the symbol map format.
#[derive(Debug)]
pub struct SymbolWriter {
    buf: String,
}

impl SymbolWriter {
    pub fn new() -> Self {
        SymbolWriter {
            buf: format!("{FORMAT_HEADER}\n"),
        }
    }

    pub fn add_function(&mut self, index: u32, name: &str) -> Result<(), std::fmt::Error> {
        writeln!(self.buf, "fn {index} {name}")
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf.into_bytes()
    }
}

impl Default for SymbolWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the symbol map for a whole program.
pub fn write_symbols(program: &Program) -> Result<Vec<u8>, std::fmt::Error> {
    let mut writer = SymbolWriter::new();
    for (index, def) in program.functions.iter().enumerate() {
        writer.add_function(index as u32, &def.name)?;
    }
    Ok(writer.finish())
}

static SYMBOL_SUPPORT: OnceLock<bool> = OnceLock::new();

/// Whether this host can produce symbol maps.
///
/// Evaluated at most once per process; concurrent first callers observe
/// a single underlying probe. The probe soft-degrades: any failure
/// yields `false`, never an error, and the pipeline records a warning
/// diagnostic instead of failing the build.
pub fn symbols_supported() -> bool {
    *SYMBOL_SUPPORT.get_or_init(probe_symbol_writer)
}

fn probe_symbol_writer() -> bool {
    // Trial-run the writer against an empty table. A host where the
    // writer cannot even produce its header gets symbol-less builds.
    let mut writer = SymbolWriter::new();
    match writer.add_function(0, "probe") {
        Ok(()) => !writer.finish().is_empty(),
        Err(err) => {
            warn!(error = %err, "symbol writer probe failed; symbol generation disabled");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn writes_header_and_one_line_per_function() {
        let (program, _) = parse("fn alpha = 1\nfn main = alpha\n");
        let bytes = write_symbols(&program).expect("symbol map");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(text, "lathe-symbols 1\nfn 0 alpha\nfn 1 main\n");
    }

    #[test]
    fn probe_is_stable_across_calls() {
        // The memoized flag must be identical no matter how often or
        // from how many threads it is read.
        let first = symbols_supported();
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(symbols_supported))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("probe thread"), first);
        }
        assert_eq!(symbols_supported(), first);
    }
}
