//! Wasm backend: lowers an analyzed program to a binary image.
//!
//! The backend intentionally lowers a subset of the language-level
//! operator set; anything analysis accepts but the backend cannot
//! express is reported as an emission-phase error diagnostic rather
//! than a fault. Output is deterministic: the same unit always
//! produces the same bytes.

use std::borrow::Cow;

use wasm_encoder::{
    CodeSection, CustomSection, ExportKind, ExportSection, Function, FunctionSection, Instruction,
    Module, TypeSection, ValType,
};

use crate::artifact::ArtifactBundle;
use crate::ast::{Expr, Program};
use crate::diagnostic::{Diagnostic, has_errors};
use crate::docs::write_docs;
use crate::parser::operator_arity;
use crate::symbols::write_symbols;
use crate::unit::EmbeddedResource;

/// Name of the custom section carrying the default manifest.
pub const MANIFEST_SECTION: &str = "lathe.manifest";

/// Which optional streams an emission should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    pub symbols: bool,
    pub docs: bool,
    pub manifest: bool,
}

/// Result of a raw emission: success flag plus emission diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOutcome {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lower `program` into `dest` according to `opts`.
///
/// On failure the bundle is left empty; partial artifacts are never
/// handed onward.
pub fn emit_module(
    unit_name: &str,
    program: &Program,
    resources: &[EmbeddedResource],
    dest: &mut ArtifactBundle,
    opts: &EmitOptions,
) -> EmitOutcome {
    let mut diagnostics = Vec::new();

    let entry_index = program.index_of(Program::ENTRY_NAME);
    if entry_index.is_none() {
        diagnostics.push(Diagnostic::error(format!(
            "no '{}' function to export",
            Program::ENTRY_NAME
        )));
    }

    let mut bodies = Vec::with_capacity(program.functions.len());
    for def in &program.functions {
        let mut function = Function::new(Vec::new());
        lower_expr(program, &def.body, &mut function, &mut diagnostics);
        function.instruction(&Instruction::End);
        bodies.push(function);
    }

    if has_errors(&diagnostics) {
        return EmitOutcome {
            success: false,
            diagnostics,
        };
    }

    let mut module = Module::new();

    // Single shared type: () -> i32.
    let mut types = TypeSection::new();
    let type_index = types.len();
    types.ty().function(Vec::<ValType>::new(), [ValType::I32]);
    module.section(&types);

    let mut functions = FunctionSection::new();
    for _ in &bodies {
        functions.function(type_index);
    }
    module.section(&functions);

    let mut exports = ExportSection::new();
    if let Some(index) = entry_index {
        exports.export(Program::ENTRY_NAME, ExportKind::Func, index);
    }
    module.section(&exports);

    let mut code = CodeSection::new();
    for body in &bodies {
        code.function(body);
    }
    module.section(&code);

    for resource in resources {
        module.section(&CustomSection {
            name: Cow::Borrowed(resource.name.as_str()),
            data: Cow::Borrowed(resource.data.as_slice()),
        });
    }

    if opts.manifest {
        let manifest = manifest_contents(unit_name);
        module.section(&CustomSection {
            name: Cow::Borrowed(MANIFEST_SECTION),
            data: Cow::Owned(manifest),
        });
    }

    dest.binary = module.finish();

    if opts.symbols {
        match write_symbols(program) {
            Ok(map) => dest.symbols = Some(map),
            Err(err) => {
                diagnostics
                    .push(Diagnostic::warning(format!("failed to write symbol map: {err}")));
            }
        }
    }

    if opts.docs {
        dest.docs = Some(write_docs(unit_name, program));
    }

    EmitOutcome {
        success: true,
        diagnostics,
    }
}

/// The fixed default manifest. Always a name/producer pair; there is no
/// customization knob.
fn manifest_contents(unit_name: &str) -> Vec<u8> {
    format!(
        "unit={unit_name}\nproducer=lathe {}\n",
        env!("CARGO_PKG_VERSION")
    )
    .into_bytes()
}

fn lower_expr(
    program: &Program,
    expr: &Expr,
    function: &mut Function,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match expr {
        Expr::Number { value, .. } => {
            function.instruction(&Instruction::I32Const(*value));
        }
        Expr::Call { name, args, span } => {
            if let Some(arity) = operator_arity(name) {
                if args.len() != arity {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "operator '{name}' expects {arity} argument(s) but received {}",
                            args.len()
                        ))
                        .with_code("E0202")
                        .with_span(*span),
                    );
                    return;
                }
            }
            match name.as_str() {
                "add" => lower_binary(program, args, function, diagnostics, Instruction::I32Add),
                "sub" => lower_binary(program, args, function, diagnostics, Instruction::I32Sub),
                "mul" => lower_binary(program, args, function, diagnostics, Instruction::I32Mul),
                "div" => lower_binary(program, args, function, diagnostics, Instruction::I32DivS),
                "mod" => lower_binary(program, args, function, diagnostics, Instruction::I32RemS),
                "neg" => {
                    function.instruction(&Instruction::I32Const(0));
                    lower_expr(program, &args[0], function, diagnostics);
                    function.instruction(&Instruction::I32Sub);
                }
                "and" => lower_logic(program, args, function, diagnostics, Instruction::I32And),
                "or" => lower_logic(program, args, function, diagnostics, Instruction::I32Or),
                "xor" => lower_logic(program, args, function, diagnostics, Instruction::I32Xor),
                "not" => {
                    lower_expr(program, &args[0], function, diagnostics);
                    function.instruction(&Instruction::I32Eqz);
                    function.instruction(&Instruction::I32Const(1));
                    function.instruction(&Instruction::I32And);
                }
                "lt" => lower_binary(program, args, function, diagnostics, Instruction::I32LtS),
                "le" => lower_binary(program, args, function, diagnostics, Instruction::I32LeS),
                "eq" => lower_binary(program, args, function, diagnostics, Instruction::I32Eq),
                "ne" => lower_binary(program, args, function, diagnostics, Instruction::I32Ne),
                "gt" => lower_binary(program, args, function, diagnostics, Instruction::I32GtS),
                "ge" => lower_binary(program, args, function, diagnostics, Instruction::I32GeS),
                _ => {
                    if let Some(index) = program.index_of(name) {
                        for arg in args {
                            lower_expr(program, arg, function, diagnostics);
                        }
                        function.instruction(&Instruction::Call(index));
                    } else {
                        diagnostics.push(
                            Diagnostic::error(format!(
                                "operator '{name}' is not supported by the wasm backend"
                            ))
                            .with_code("E0201")
                            .with_span(*span),
                        );
                    }
                }
            }
        }
    }
}

fn lower_binary(
    program: &Program,
    args: &[Expr],
    function: &mut Function,
    diagnostics: &mut Vec<Diagnostic>,
    op: Instruction,
) {
    lower_expr(program, &args[0], function, diagnostics);
    lower_expr(program, &args[1], function, diagnostics);
    function.instruction(&op);
}

fn lower_logic(
    program: &Program,
    args: &[Expr],
    function: &mut Function,
    diagnostics: &mut Vec<Diagnostic>,
    op: Instruction,
) {
    lower_truthy(program, &args[0], function, diagnostics);
    lower_truthy(program, &args[1], function, diagnostics);
    function.instruction(&op);
}

fn lower_truthy(
    program: &Program,
    expr: &Expr,
    function: &mut Function,
    diagnostics: &mut Vec<Diagnostic>,
) {
    lower_expr(program, expr, function, diagnostics);
    function.instruction(&Instruction::I32Const(0));
    function.instruction(&Instruction::I32Ne);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn emit_source(source: &str, opts: &EmitOptions) -> (ArtifactBundle, EmitOutcome) {
        let (program, diags) = parse(source);
        assert!(diags.is_empty(), "unexpected: {diags:?}");
        let mut bundle = ArtifactBundle::new();
        let outcome = emit_module("Foo", &program, &[], &mut bundle, opts);
        (bundle, outcome)
    }

    const ALL: EmitOptions = EmitOptions {
        symbols: true,
        docs: true,
        manifest: true,
    };

    #[test]
    fn emits_a_valid_wasm_module() {
        let (bundle, outcome) = emit_source("fn main = add 1 (mul 2 3)", &ALL);
        assert!(outcome.success);
        assert!(outcome.diagnostics.is_empty());

        let mut parser = wasmparser::Parser::new(0);
        let payload = parser.parse(&bundle.binary, true).expect("payload");
        assert!(matches!(payload, wasmparser::Chunk::Parsed { .. }));
    }

    #[test]
    fn generated_module_executes_under_wasmi() {
        let (bundle, outcome) = emit_source("fn main = add 4 (sub 10 3)", &ALL);
        assert!(outcome.success);

        let engine = wasmi::Engine::default();
        let module = wasmi::Module::new(&engine, &bundle.binary).expect("module");
        let linker = wasmi::Linker::new(&engine);
        let mut store = wasmi::Store::new(&engine, ());
        let instance = linker
            .instantiate_and_start(&mut store, &module)
            .expect("instantiate");
        let main = instance
            .get_typed_func::<(), i32>(&store, "main")
            .expect("typed func");
        assert_eq!(main.call(&mut store, ()).expect("execute"), 11);
    }

    #[test]
    fn cross_function_calls_execute() {
        let (bundle, outcome) = emit_source("fn seven = 7\nfn main = add seven 4\n", &ALL);
        assert!(outcome.success);

        let engine = wasmi::Engine::default();
        let module = wasmi::Module::new(&engine, &bundle.binary).expect("module");
        let linker = wasmi::Linker::new(&engine);
        let mut store = wasmi::Store::new(&engine, ());
        let instance = linker
            .instantiate_and_start(&mut store, &module)
            .expect("instantiate");
        let main = instance
            .get_typed_func::<(), i32>(&store, "main")
            .expect("typed func");
        assert_eq!(main.call(&mut store, ()).expect("execute"), 11);
    }

    #[test]
    fn unsupported_operator_fails_emission() {
        let (bundle, outcome) = emit_source("fn main = pow 2 4", &ALL);
        assert!(!outcome.success);
        assert!(bundle.binary.is_empty());
        assert!(bundle.symbols.is_none());
        assert!(
            outcome
                .diagnostics
                .iter()
                .any(|d| d.is_error() && d.code == Some("E0201"))
        );
    }

    #[test]
    fn missing_entry_point_fails_emission() {
        let (program, _) = parse("fn helper = 1");
        let mut bundle = ArtifactBundle::new();
        let outcome = emit_module("Foo", &program, &[], &mut bundle, &ALL);
        assert!(!outcome.success);
        assert!(bundle.binary.is_empty());
    }

    #[test]
    fn embeds_resources_and_manifest_as_custom_sections() {
        let (program, _) = parse("fn main = 1");
        let resources = vec![EmbeddedResource {
            name: "assets/banner".into(),
            data: b"hello".to_vec(),
        }];
        let mut bundle = ArtifactBundle::new();
        let outcome = emit_module("Foo", &program, &resources, &mut bundle, &ALL);
        assert!(outcome.success);

        let mut names = Vec::new();
        for payload in wasmparser::Parser::new(0).parse_all(&bundle.binary) {
            if let wasmparser::Payload::CustomSection(reader) = payload.expect("payload") {
                names.push(reader.name().to_string());
                if reader.name() == "assets/banner" {
                    assert_eq!(reader.data(), b"hello");
                }
                if reader.name() == MANIFEST_SECTION {
                    let text = std::str::from_utf8(reader.data()).expect("utf8");
                    assert!(text.contains("unit=Foo"));
                    assert!(text.contains("producer=lathe"));
                }
            }
        }
        assert!(names.contains(&"assets/banner".to_string()));
        assert!(names.contains(&MANIFEST_SECTION.to_string()));
    }

    #[test]
    fn manifest_section_can_be_suppressed() {
        let opts = EmitOptions {
            symbols: false,
            docs: false,
            manifest: false,
        };
        let (bundle, outcome) = emit_source("fn main = 1", &opts);
        assert!(outcome.success);
        assert!(bundle.symbols.is_none());
        assert!(bundle.docs.is_none());

        for payload in wasmparser::Parser::new(0).parse_all(&bundle.binary) {
            if let wasmparser::Payload::CustomSection(reader) = payload.expect("payload") {
                assert_ne!(reader.name(), MANIFEST_SECTION);
            }
        }
    }

    #[test]
    fn emission_is_deterministic() {
        let (first, _) = emit_source("fn main = add 1 2", &ALL);
        let (second, _) = emit_source("fn main = add 1 2", &ALL);
        assert_eq!(first, second);
    }
}
