//! Severity-classified build diagnostics.
//!
//! Every phase of the pipeline (analysis, emission, post-compile hooks)
//! reports conditions as [`Diagnostic`] values rather than hard errors.
//! The orchestrator concatenates the phases in order and decides overall
//! success from the merged sequence; [`DiagnosticResult`] is the filtered
//! view handed back to callers.

use std::fmt;

use crate::span::Span;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub code: Option<&'static str>,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            code: None,
            span: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            code: None,
            span: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Info,
            message: message.into(),
            code: None,
            span: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(span) = self.span {
            write!(f, " (at {span})")?;
        }
        Ok(())
    }
}

/// Concatenate per-phase diagnostic sequences.
///
/// Phase order and intra-phase order are preserved exactly; there is no
/// deduplication and no severity promotion.
pub fn merge(phases: impl IntoIterator<Item = Vec<Diagnostic>>) -> Vec<Diagnostic> {
    let mut merged = Vec::new();
    for phase in phases {
        merged.extend(phase);
    }
    merged
}

/// True iff any entry in the sequence is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Outcome of a durable emission, as seen by callers.
///
/// Informational entries are internal-only and dropped here; the caller
/// sees the success flag plus warnings and errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticResult {
    success: bool,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new(success: bool, diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
        DiagnosticResult {
            success,
            diagnostics: diagnostics
                .into_iter()
                .filter(|d| d.severity != Severity::Info)
                .collect(),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
