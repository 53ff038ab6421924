//! Documentation extraction.
//!
//! Collects the `#` doc lines of a program into a markdown artifact
//! written next to the binary as `<unit>.docs.md`. Output is fully
//! deterministic for a given unit.

use std::fmt::Write as _;

use crate::ast::Program;

pub fn write_docs(unit_name: &str, program: &Program) -> Vec<u8> {
    let mut out = String::new();
    let _ = writeln!(out, "# {unit_name}");
    for def in &program.functions {
        let _ = writeln!(out, "\n## fn {}", def.name);
        if let Some(doc) = &def.doc {
            let _ = writeln!(out, "\n{doc}");
        }
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn renders_doc_lines_under_function_headings() {
        let (program, _) = parse("# Adds one and two.\nfn main = add 1 2\nfn bare = 0\n");
        let text = String::from_utf8(write_docs("Foo", &program)).expect("utf8");
        assert!(text.starts_with("# Foo\n"));
        assert!(text.contains("## fn main"));
        assert!(text.contains("Adds one and two."));
        assert!(text.contains("## fn bare"));
    }

    #[test]
    fn output_is_deterministic() {
        let (program, _) = parse("fn main = 1\n");
        assert_eq!(write_docs("Foo", &program), write_docs("Foo", &program));
    }
}
