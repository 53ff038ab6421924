//! Post-compile hooks.
//!
//! Hooks are external observers registered on a compilation unit. After
//! raw emission and before finalization, the orchestrator invokes each
//! hook in registration order with mutable access to the in-flight
//! artifact streams and the running diagnostic sequence. A hook that
//! returns `Err` aborts the remaining chain and fails the whole
//! invocation; hook faults are defects in an extension, not ordinary
//! compile-time conditions, so they are never turned into diagnostics.

use crate::diagnostic::Diagnostic;

/// Fault raised by a hook. Boxed so external hooks can use whatever
/// error type they like.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A post-compile observer.
pub trait AfterCompile {
    /// Stable name used in logs and fault messages.
    fn name(&self) -> &str {
        "after-compile"
    }

    fn after_compile(&self, cx: &mut AfterCompileContext<'_>) -> Result<(), HookError>;
}

/// Mutable view of one invocation's in-flight state, handed to hooks.
///
/// Streams may be replaced wholesale; diagnostics are append-only
/// through [`AfterCompileContext::report`] — prior entries can be read
/// but never removed or reordered.
pub struct AfterCompileContext<'a> {
    pub unit_name: &'a str,
    pub binary: &'a mut Vec<u8>,
    /// Absent when symbol generation is unsupported or was not requested.
    pub symbols: Option<&'a mut Vec<u8>>,
    /// Present on the durable-emit path only.
    pub docs: Option<&'a mut Vec<u8>>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> AfterCompileContext<'a> {
    pub(crate) fn new(
        unit_name: &'a str,
        binary: &'a mut Vec<u8>,
        symbols: Option<&'a mut Vec<u8>>,
        docs: Option<&'a mut Vec<u8>>,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        AfterCompileContext {
            unit_name,
            binary,
            symbols,
            docs,
            diagnostics,
        }
    }

    /// Diagnostics accumulated so far, in phase order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics
    }

    /// Append a diagnostic to the running sequence.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StampHook;

    impl AfterCompile for StampHook {
        fn name(&self) -> &str {
            "stamp"
        }

        fn after_compile(&self, cx: &mut AfterCompileContext<'_>) -> Result<(), HookError> {
            cx.binary.extend_from_slice(b"stamp");
            cx.report(Diagnostic::info(format!("stamped {}", cx.unit_name)));
            Ok(())
        }
    }

    #[test]
    fn hook_can_mutate_streams_and_append_diagnostics() {
        let mut binary = vec![1, 2, 3];
        let mut diagnostics = vec![Diagnostic::warning("pre-existing")];

        let mut cx = AfterCompileContext::new("Foo", &mut binary, None, None, &mut diagnostics);
        assert_eq!(cx.diagnostics().len(), 1);
        StampHook.after_compile(&mut cx).expect("hook");

        assert!(binary.ends_with(b"stamp"));
        assert_eq!(diagnostics.len(), 2);
        // Prior entries are untouched and keep their position.
        assert_eq!(diagnostics[0].message, "pre-existing");
    }
}
