//! Parser for lathe source programs.
//!
//! A program is a sequence of lines: `#` doc lines attach to the next
//! definition, and each `fn <name> = <expr>` line defines one
//! zero-argument function. Expressions are prefix applications over
//! integer literals, with parentheses for grouping:
//!
//! ```text
//! # Entry point.
//! fn main = add 1 (mul 2 3)
//! ```
//!
//! Parsing never faults; syntax problems become error diagnostics and
//! the malformed definition is skipped.

use crate::ast::{Expr, FnDef, Program};
use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// Parse a full source text into a program plus parse diagnostics.
pub fn parse(source: &str) -> (Program, Vec<Diagnostic>) {
    let mut functions = Vec::new();
    let mut diagnostics = Vec::new();
    let mut pending_doc: Vec<String> = Vec::new();

    let mut offset = 0u32;
    for line in source.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len() as u32;

        let trimmed = line.trim_end_matches(['\n', '\r']);
        let content = trimmed.trim_start();
        if content.is_empty() {
            continue;
        }

        if let Some(doc) = content.strip_prefix('#') {
            pending_doc.push(doc.strip_prefix(' ').unwrap_or(doc).to_string());
            continue;
        }

        let indent = (trimmed.len() - content.len()) as u32;
        let base = line_start + indent;
        let doc = if pending_doc.is_empty() {
            None
        } else {
            Some(pending_doc.drain(..).collect::<Vec<_>>().join("\n"))
        };

        match parse_definition(content, base, &mut diagnostics) {
            Some(mut def) => {
                def.doc = doc;
                functions.push(def);
            }
            None => {
                // Diagnostics already recorded; the doc text is dropped
                // with the definition it belonged to.
            }
        }
    }

    if !pending_doc.is_empty() {
        diagnostics.push(Diagnostic::warning(
            "doc comment is not attached to any function definition",
        ));
    }

    (Program { functions }, diagnostics)
}

/// Arity of a built-in operator, or `None` for user-level names.
///
/// This is the full language-level operator set; the wasm backend lowers
/// a subset of it and reports the remainder at emission time.
pub fn operator_arity(name: &str) -> Option<usize> {
    match name {
        "add" | "sub" | "mul" | "div" | "mod" | "pow" | "gcd" | "lcm" => Some(2),
        "and" | "or" | "xor" => Some(2),
        "lt" | "le" | "eq" | "ne" | "gt" | "ge" => Some(2),
        "neg" | "not" | "factorial" => Some(1),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    Number(i32),
    LParen,
    RParen,
    Equal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    span: Span,
}

fn parse_definition(
    line: &str,
    base: u32,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<FnDef> {
    let tokens = tokenize(line, base, diagnostics)?;
    let line_span = Span::new(base, base + line.len() as u32);

    let mut position = 0;
    match tokens.get(position) {
        Some(tok) if matches!(&tok.kind, TokenKind::Ident(kw) if kw == "fn") => position += 1,
        _ => {
            diagnostics.push(
                Diagnostic::error("expected a function definition starting with 'fn'")
                    .with_code("E0003")
                    .with_span(line_span),
            );
            return None;
        }
    }

    let name = match tokens.get(position) {
        Some(Token {
            kind: TokenKind::Ident(name),
            ..
        }) => {
            position += 1;
            name.clone()
        }
        _ => {
            diagnostics.push(
                Diagnostic::error("expected a function name after 'fn'")
                    .with_code("E0004")
                    .with_span(line_span),
            );
            return None;
        }
    };

    match tokens.get(position) {
        Some(tok) if tok.kind == TokenKind::Equal => position += 1,
        _ => {
            diagnostics.push(
                Diagnostic::error(format!("expected '=' after 'fn {name}'"))
                    .with_code("E0005")
                    .with_span(line_span),
            );
            return None;
        }
    }

    let body = match parse_expr(&tokens, &mut position) {
        Ok(expr) => expr,
        Err(diag) => {
            diagnostics.push(diag);
            return None;
        }
    };

    if position != tokens.len() {
        let span = tokens[position].span.to(tokens[tokens.len() - 1].span);
        diagnostics.push(
            Diagnostic::error("unexpected trailing input after expression")
                .with_code("E0006")
                .with_span(span),
        );
        return None;
    }

    Some(FnDef {
        name,
        doc: None,
        body,
        span: line_span,
    })
}

fn parse_expr(tokens: &[Token], position: &mut usize) -> Result<Expr, Diagnostic> {
    let token = tokens.get(*position).ok_or_else(|| {
        Diagnostic::error("unexpected end of expression").with_code("E0007")
    })?;
    *position += 1;

    match &token.kind {
        TokenKind::Number(value) => Ok(Expr::Number {
            value: *value,
            span: token.span,
        }),
        TokenKind::LParen => {
            let expr = parse_expr(tokens, position)?;
            match tokens.get(*position) {
                Some(tok) if tok.kind == TokenKind::RParen => {
                    *position += 1;
                    Ok(expr)
                }
                _ => Err(Diagnostic::error("expected ')'")
                    .with_code("E0008")
                    .with_span(token.span)),
            }
        }
        TokenKind::Ident(name) => {
            // Operators consume as many arguments as their arity says;
            // any other identifier is a zero-argument reference.
            let arity = operator_arity(name).unwrap_or(0);
            let mut args = Vec::with_capacity(arity);
            let mut span = token.span;
            for _ in 0..arity {
                let arg = parse_expr(tokens, position)?;
                span = span.to(arg.span());
                args.push(arg);
            }
            Ok(Expr::Call {
                name: name.clone(),
                args,
                span,
            })
        }
        TokenKind::RParen => Err(Diagnostic::error("unexpected ')'")
            .with_code("E0009")
            .with_span(token.span)),
        TokenKind::Equal => Err(Diagnostic::error("unexpected '='")
            .with_code("E0009")
            .with_span(token.span)),
    }
}

fn tokenize(line: &str, base: u32, diagnostics: &mut Vec<Diagnostic>) -> Option<Vec<Token>> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut index = 0;

    while index < bytes.len() {
        let ch = bytes[index];
        let start = base + index as u32;
        match ch {
            b' ' | b'\t' => {
                index += 1;
            }
            b'(' => {
                index += 1;
                tokens.push(Token {
                    kind: TokenKind::LParen,
                    span: Span::new(start, start + 1),
                });
            }
            b')' => {
                index += 1;
                tokens.push(Token {
                    kind: TokenKind::RParen,
                    span: Span::new(start, start + 1),
                });
            }
            b'=' => {
                index += 1;
                tokens.push(Token {
                    kind: TokenKind::Equal,
                    span: Span::new(start, start + 1),
                });
            }
            b'0'..=b'9' => {
                let begin = index;
                while index < bytes.len() && bytes[index].is_ascii_digit() {
                    index += 1;
                }
                let text = &line[begin..index];
                let span = Span::new(start, base + index as u32);
                match text.parse::<i32>() {
                    Ok(value) => tokens.push(Token {
                        kind: TokenKind::Number(value),
                        span,
                    }),
                    Err(_) => {
                        diagnostics.push(
                            Diagnostic::error(format!(
                                "integer literal '{text}' does not fit in i32"
                            ))
                            .with_code("E0002")
                            .with_span(span),
                        );
                        return None;
                    }
                }
            }
            _ if is_ident_start(ch) => {
                let begin = index;
                while index < bytes.len() && is_ident_continue(bytes[index]) {
                    index += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(line[begin..index].to_string()),
                    span: Span::new(start, base + index as u32),
                });
            }
            _ => {
                diagnostics.push(
                    Diagnostic::error("unexpected character")
                        .with_code("E0001")
                        .with_span(Span::new(start, start + 1)),
                );
                return None;
            }
        }
    }

    Some(tokens)
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_uppercase() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_clean(source: &str) -> Program {
        let (program, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "unexpected: {diagnostics:?}");
        program
    }

    #[test]
    fn parses_single_definition() {
        let program = parse_clean("fn main = add 1 2");
        assert_eq!(program.functions.len(), 1);
        assert!(program.entry().is_some());
    }

    #[test]
    fn parses_nested_expression_with_parens() {
        let program = parse_clean("fn main = add 1 (mul 2 3)");
        let body = &program.entry().unwrap().body;
        if let Expr::Call { name, args, .. } = body {
            assert_eq!(name, "add");
            assert_eq!(args.len(), 2);
        } else {
            panic!("unexpected variant");
        }
    }

    #[test]
    fn attaches_doc_lines_to_the_following_definition() {
        let program = parse_clean("# The entry point.\n# Returns three.\nfn main = 3\n");
        let def = program.entry().unwrap();
        assert_eq!(def.doc.as_deref(), Some("The entry point.\nReturns three."));
    }

    #[test]
    fn bare_identifier_is_a_zero_argument_reference() {
        let program = parse_clean("fn main = helper\nfn helper = 7\n");
        assert!(program.entry().unwrap().body.is_call("helper"));
    }

    #[test]
    fn reports_trailing_tokens() {
        let (_, diagnostics) = parse("fn main = add 1 2 3");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
        assert_eq!(diagnostics[0].code, Some("E0006"));
    }

    #[test]
    fn reports_missing_equal_sign() {
        let (program, diagnostics) = parse("fn main 3");
        assert!(program.functions.is_empty());
        assert!(diagnostics.iter().any(|d| d.code == Some("E0005")));
    }

    #[test]
    fn reports_oversized_literal() {
        let (_, diagnostics) = parse("fn main = 99999999999");
        assert!(diagnostics.iter().any(|d| d.code == Some("E0002")));
    }

    #[test]
    fn warns_about_dangling_doc_comment() {
        let (_, diagnostics) = parse("fn main = 1\n# lost doc\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].is_error());
    }

    #[test]
    fn keeps_definition_order() {
        let program = parse_clean("fn alpha = 1\nfn beta = 2\nfn main = alpha\n");
        assert_eq!(program.index_of("alpha"), Some(0));
        assert_eq!(program.index_of("beta"), Some(1));
        assert_eq!(program.index_of("main"), Some(2));
    }
}
