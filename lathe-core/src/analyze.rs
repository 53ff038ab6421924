//! Semantic checks over a parsed program.
//!
//! Analysis never faults and never rewrites the program; every finding
//! is reported as a diagnostic. Units built programmatically go through
//! the same checks as parsed source, so arity and resolution are
//! verified here even though the parser cannot produce some of those
//! shapes itself.

use std::collections::HashSet;

use crate::ast::{Expr, Program};
use crate::diagnostic::Diagnostic;
use crate::parser::operator_arity;

/// Run all semantic checks and return the analysis diagnostics.
pub fn analyze(program: &Program) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let mut seen = HashSet::new();
    for def in &program.functions {
        if !seen.insert(def.name.as_str()) {
            diagnostics.push(
                Diagnostic::error(format!("function '{}' is defined more than once", def.name))
                    .with_code("E0101")
                    .with_span(def.span),
            );
        }
    }

    if program.entry().is_none() {
        diagnostics.push(
            Diagnostic::error(format!(
                "program does not define a '{}' function",
                Program::ENTRY_NAME
            ))
            .with_code("E0102"),
        );
    }

    for def in &program.functions {
        check_expr(program, &def.body, &mut diagnostics);
    }

    check_reachability(program, &mut diagnostics);

    diagnostics
}

fn check_expr(program: &Program, expr: &Expr, diagnostics: &mut Vec<Diagnostic>) {
    let Expr::Call { name, args, span } = expr else {
        return;
    };

    if let Some(arity) = operator_arity(name) {
        if args.len() != arity {
            diagnostics.push(
                Diagnostic::error(format!(
                    "operator '{name}' expects {arity} argument(s) but received {}",
                    args.len()
                ))
                .with_code("E0103")
                .with_span(*span),
            );
        }
        if matches!(name.as_str(), "div" | "mod")
            && matches!(args.get(1), Some(Expr::Number { value: 0, .. }))
        {
            diagnostics.push(
                Diagnostic::error(format!("{name} by constant zero"))
                    .with_code("E0104")
                    .with_span(*span),
            );
        }
    } else if program.get(name).is_some() {
        if !args.is_empty() {
            diagnostics.push(
                Diagnostic::error(format!("function '{name}' takes no arguments"))
                    .with_code("E0105")
                    .with_span(*span),
            );
        }
    } else {
        diagnostics.push(
            Diagnostic::error(format!("unresolved reference '{name}'"))
                .with_code("E0106")
                .with_span(*span),
        );
    }

    for arg in args {
        check_expr(program, arg, diagnostics);
    }
}

/// Warn about definitions that can never be reached from the entry point.
fn check_reachability(program: &Program, diagnostics: &mut Vec<Diagnostic>) {
    if program.entry().is_none() {
        return;
    }

    let mut reachable = HashSet::new();
    let mut work = vec![Program::ENTRY_NAME.to_string()];
    while let Some(name) = work.pop() {
        if !reachable.insert(name.clone()) {
            continue;
        }
        if let Some(def) = program.get(&name) {
            collect_references(program, &def.body, &mut work);
        }
    }

    for def in &program.functions {
        if !reachable.contains(def.name.as_str()) {
            diagnostics.push(
                Diagnostic::warning(format!("function '{}' is never used", def.name))
                    .with_span(def.span),
            );
        }
    }
}

fn collect_references(program: &Program, expr: &Expr, out: &mut Vec<String>) {
    if let Expr::Call { name, args, .. } = expr {
        if operator_arity(name).is_none() && program.get(name).is_some() {
            out.push(name.clone());
        }
        for arg in args {
            collect_references(program, arg, out);
        }
    }
}
