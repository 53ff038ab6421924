use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::hooks::HookError;

/// Failure of the in-process Load path.
///
/// Load has no partial-success outcome: the caller needs a loaded,
/// runnable module or nothing, so every failure is a fault.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Emission failed or an error diagnostic survived the hook chain.
    /// Carries the full diagnostic sequence in phase order.
    #[error("compilation of unit '{unit}' failed")]
    CompilationFailed {
        unit: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// A post-compile hook faulted; the chain was aborted.
    #[error("post-compile hook '{hook}' failed")]
    Hook {
        hook: String,
        #[source]
        source: HookError,
    },

    /// The external loader rejected the finished binary.
    #[error("module load failed")]
    Loader(#[source] HookError),
}

impl LoadError {
    /// Diagnostics carried by a compilation failure, if any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            LoadError::CompilationFailed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

/// Fault of the durable Emit path.
///
/// Gate failures are *not* faults there — they come back as a
/// `DiagnosticResult` — so this only covers hook faults and I/O
/// failures during persistence.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("post-compile hook '{hook}' failed")]
    Hook {
        hook: String,
        #[source]
        source: HookError,
    },

    #[error("failed to write artifact {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
