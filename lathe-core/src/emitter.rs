//! Emission orchestration.
//!
//! [`Emitter`] drives one invocation of the pipeline over a compilation
//! unit: raw emission, the post-compile hook chain, the success gate,
//! and finalization. It exposes two entry points with deliberately
//! different failure contracts:
//!
//! - [`Emitter::load`] hands the finished binary to an in-process
//!   loader and *faults* on any failure — there is no useful partial
//!   outcome when the caller needs a runnable module.
//! - [`Emitter::emit`] persists the artifacts to a directory and
//!   *returns* a [`DiagnosticResult`] when the gate fails, because an
//!   explicit build step wants to render diagnostics and pick its own
//!   exit code. Only hook faults and I/O failures are errors here.
//!
//! Emission is attempted exactly once per invocation; callers retry by
//! constructing a fresh invocation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use crate::artifact::{ArtifactBundle, binary_file_name, doc_file_name, symbol_file_name};
use crate::codegen::EmitOptions;
use crate::diagnostic::{Diagnostic, DiagnosticResult, has_errors, merge};
use crate::error::{EmitError, LoadError};
use crate::hooks::{AfterCompileContext, HookError};
use crate::loader::ModuleLoader;
use crate::symbols::symbols_supported;
use crate::unit::CompilationUnit;

/// One pipeline invocation over a borrowed compilation unit.
pub struct Emitter<'a> {
    unit: &'a CompilationUnit,
    symbol_support: bool,
}

impl<'a> Emitter<'a> {
    /// Create an emitter for `unit`, consulting the process-wide
    /// symbol-support probe.
    pub fn new(unit: &'a CompilationUnit) -> Self {
        Emitter {
            unit,
            symbol_support: symbols_supported(),
        }
    }

    /// Override the probed symbol support for this invocation.
    pub fn with_symbol_support(mut self, supported: bool) -> Self {
        self.symbol_support = supported;
        self
    }

    /// Build the unit and load it into the process via `loader`.
    ///
    /// Produces binary and symbol streams only. On gate failure the
    /// full diagnostic sequence, in phase order, travels with the
    /// returned [`LoadError::CompilationFailed`].
    pub fn load<L: ModuleLoader>(&self, loader: &L) -> Result<L::Module, LoadError> {
        let opts = EmitOptions {
            symbols: self.symbol_support,
            docs: false,
            manifest: false,
        };
        let (bundle, diagnostics, emit_ok) = self
            .run_pipeline(&opts)
            .map_err(|(hook, source)| LoadError::Hook { hook, source })?;

        if !emit_ok || has_errors(&diagnostics) {
            return Err(LoadError::CompilationFailed {
                unit: self.unit.name().to_string(),
                diagnostics,
            });
        }

        // An empty symbol stream is handed over as no stream at all.
        let symbols = bundle
            .symbols
            .as_deref()
            .filter(|stream| !stream.is_empty());
        loader
            .load_module(&bundle.binary, symbols)
            .map_err(|err| LoadError::Loader(Box::new(err)))
    }

    /// Build the unit and persist its artifacts under `out_dir`.
    ///
    /// Writes `<name>.wasm`, `<name>.docs.md` and, when symbol support
    /// is available, `<name>.map`. Nothing is created on disk — not
    /// even the directory — unless the success gate passes.
    pub fn emit(&self, out_dir: &Path) -> Result<DiagnosticResult, EmitError> {
        let opts = EmitOptions {
            symbols: self.symbol_support,
            docs: true,
            manifest: true,
        };
        let (bundle, diagnostics, emit_ok) = self
            .run_pipeline(&opts)
            .map_err(|(hook, source)| EmitError::Hook { hook, source })?;

        if !emit_ok || has_errors(&diagnostics) {
            return Ok(DiagnosticResult::new(false, diagnostics));
        }

        fs::create_dir_all(out_dir).map_err(|source| EmitError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let name = self.unit.name();
        write_artifact(&out_dir.join(binary_file_name(name)), &bundle.binary)?;

        if let Some(docs) = &bundle.docs {
            write_artifact(&out_dir.join(doc_file_name(name)), docs)?;
        }

        // Symbol persistence is gated on the probe, not on stream
        // contents.
        if self.symbol_support {
            if let Some(symbols) = &bundle.symbols {
                write_artifact(&out_dir.join(symbol_file_name(name)), symbols)?;
            }
        }

        info!(unit = name, dir = %out_dir.display(), "artifacts written");
        Ok(DiagnosticResult::new(true, diagnostics))
    }

    /// Shared skeleton: raw emission followed by the hook chain.
    ///
    /// Returns the bundle, the merged diagnostics (analysis first, then
    /// emission, then hook-appended), and the raw-emission success
    /// flag. A hook fault aborts the chain and surfaces as `Err`.
    fn run_pipeline(
        &self,
        opts: &EmitOptions,
    ) -> Result<(ArtifactBundle, Vec<Diagnostic>, bool), (String, HookError)> {
        let mut emission_diagnostics = Vec::new();
        if !self.symbol_support {
            warn!(
                unit = self.unit.name(),
                "symbol generation is not supported on this platform"
            );
            emission_diagnostics.push(Diagnostic::warning(
                "symbol generation unavailable on this platform",
            ));
        }

        let mut bundle = ArtifactBundle::new();

        info!(unit = self.unit.name(), "emitting wasm module");
        let started = Instant::now();
        let outcome = self.unit.emit(&mut bundle, opts);
        info!(
            unit = self.unit.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            success = outcome.success,
            "emission finished"
        );
        emission_diagnostics.extend(outcome.diagnostics);

        let mut diagnostics = merge([self.unit.diagnostics().to_vec(), emission_diagnostics]);

        for hook in self.unit.hooks() {
            let mut cx = AfterCompileContext::new(
                self.unit.name(),
                &mut bundle.binary,
                bundle.symbols.as_mut(),
                bundle.docs.as_mut(),
                &mut diagnostics,
            );
            hook.after_compile(&mut cx)
                .map_err(|source| (hook.name().to_string(), source))?;
        }

        Ok((bundle, diagnostics, outcome.success))
    }
}

fn write_artifact(path: &PathBuf, bytes: &[u8]) -> Result<(), EmitError> {
    fs::write(path, bytes).map_err(|source| EmitError::Io {
        path: path.clone(),
        source,
    })
}
