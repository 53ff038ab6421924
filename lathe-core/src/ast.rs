//! Analyzed program representation consumed by the emission pipeline.

use crate::span::Span;

/// An expression: an integer literal or a prefix application.
///
/// Zero-argument applications double as references to other functions
/// defined in the same program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Number { value: i32, span: Span },
    Call { name: String, args: Vec<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number { span, .. } => *span,
            Expr::Call { span, .. } => *span,
        }
    }

    pub fn is_call(&self, name: &str) -> bool {
        matches!(self, Expr::Call { name: n, .. } if n == name)
    }
}

/// A single zero-argument function definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnDef {
    pub name: String,
    /// Doc text collected from `#` lines preceding the definition.
    pub doc: Option<String>,
    pub body: Expr,
    pub span: Span,
}

/// A parsed program: an ordered list of function definitions.
///
/// Definition order is meaningful; it fixes wasm function indices and
/// therefore the layout of the emitted binary and symbol map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub functions: Vec<FnDef>,
}

impl Program {
    pub const ENTRY_NAME: &'static str = "main";

    pub fn get(&self, name: &str) -> Option<&FnDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn entry(&self) -> Option<&FnDef> {
        self.get(Self::ENTRY_NAME)
    }

    /// Wasm function index of a definition, by name.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(|i| i as u32)
    }
}
