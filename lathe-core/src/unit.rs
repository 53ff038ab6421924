//! The compilation unit: an analyzed program plus everything the
//! emission pipeline needs to know about it.

use tracing::debug;

use crate::analyze::analyze;
use crate::artifact::ArtifactBundle;
use crate::ast::Program;
use crate::codegen::{self, EmitOptions, EmitOutcome};
use crate::diagnostic::Diagnostic;
use crate::hooks::AfterCompile;
use crate::parser;

/// A named blob embedded into the binary as a wasm custom section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedResource {
    pub name: String,
    pub data: Vec<u8>,
}

/// An analyzed program, its accumulated analysis diagnostics, the
/// resources to embed, and the registered post-compile hooks.
///
/// Units are built up-front and consumed read-only by the emission
/// pipeline; a failed emission leaves the unit untouched, so callers
/// can inspect it or retry with a fresh invocation.
pub struct CompilationUnit {
    name: String,
    program: Program,
    diagnostics: Vec<Diagnostic>,
    resources: Vec<EmbeddedResource>,
    hooks: Vec<Box<dyn AfterCompile>>,
}

impl CompilationUnit {
    /// Wrap an already-built program, running semantic analysis.
    pub fn new(name: impl Into<String>, program: Program) -> Self {
        let diagnostics = analyze(&program);
        CompilationUnit {
            name: name.into(),
            program,
            diagnostics,
            resources: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Parse and analyze source text.
    pub fn parse(name: impl Into<String>, source: &str) -> Self {
        let (program, mut diagnostics) = parser::parse(source);
        diagnostics.extend(analyze(&program));
        CompilationUnit {
            name: name.into(),
            program,
            diagnostics,
            resources: Vec::new(),
            hooks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Analysis-phase diagnostics, in source order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn add_resource(&mut self, resource: EmbeddedResource) {
        self.resources.push(resource);
    }

    pub fn register_hook(&mut self, hook: Box<dyn AfterCompile>) {
        self.hooks.push(hook);
    }

    pub(crate) fn hooks(&self) -> &[Box<dyn AfterCompile>] {
        &self.hooks
    }

    /// Raw emission: lower the program and fill `dest`.
    ///
    /// Reports the outcome of this phase only; the caller is
    /// responsible for merging with analysis and hook diagnostics.
    pub fn emit(&self, dest: &mut ArtifactBundle, opts: &EmitOptions) -> EmitOutcome {
        debug!(
            unit = self.name.as_str(),
            functions = self.program.functions.len(),
            resources = self.resources.len(),
            "lowering program"
        );
        codegen::emit_module(&self.name, &self.program, &self.resources, dest, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_collects_analysis_diagnostics() {
        let unit = CompilationUnit::parse("Foo", "fn main = 1\nfn helper = 2\n");
        assert_eq!(unit.name(), "Foo");
        assert_eq!(unit.diagnostics().len(), 1);
        assert!(unit.diagnostics()[0].message.contains("helper"));
    }

    #[test]
    fn emit_fills_the_bundle() {
        let unit = CompilationUnit::parse("Foo", "fn main = add 1 2");
        let mut bundle = ArtifactBundle::new();
        let outcome = unit.emit(
            &mut bundle,
            &EmitOptions {
                symbols: true,
                docs: true,
                manifest: true,
            },
        );
        assert!(outcome.success);
        assert!(!bundle.binary.is_empty());
        assert!(bundle.has_symbols());
        assert!(bundle.docs.is_some());
    }
}
