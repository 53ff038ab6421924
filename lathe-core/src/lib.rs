//! Core emission pipeline for the Lathe toolchain.
//!
//! This crate takes an analyzed compilation unit and turns it into
//! consumable build output. The pipeline is roughly:
//!
//!   analyzed unit (program + diagnostics + resources + hooks)
//!     -> codegen        (wasm-encoder binary, symbol map, docs)
//!     -> hook chain     (observers mutate streams, append diagnostics)
//!     -> success gate   (emission outcome + error diagnostics)
//!     -> finalization   (in-process load, or artifact files on disk)
//!
//! Higher-level tools (CLI, build servers, etc.) should depend on this
//! crate rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Diagnostics and errors
// ---------------------------------------------------------------------

pub mod diagnostic;
pub mod error;
pub mod span;

// ---------------------------------------------------------------------
// Front-end collaborator: parsing and analysis
// ---------------------------------------------------------------------

pub mod analyze;
pub mod ast;
pub mod parser;

// ---------------------------------------------------------------------
// Raw emission: codegen and artifact streams
// ---------------------------------------------------------------------

pub mod artifact;
pub mod codegen;
pub mod docs;
pub mod symbols;

// ---------------------------------------------------------------------
// Pipeline: unit, hooks, orchestration, loading
// ---------------------------------------------------------------------

pub mod emitter;
pub mod hooks;
pub mod loader;
pub mod unit;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use artifact::ArtifactBundle;
pub use diagnostic::{Diagnostic, DiagnosticResult, Severity};
pub use emitter::Emitter;
pub use error::{EmitError, LoadError};
pub use hooks::{AfterCompile, AfterCompileContext, HookError};
pub use loader::ModuleLoader;
pub use symbols::symbols_supported;
pub use unit::{CompilationUnit, EmbeddedResource};
