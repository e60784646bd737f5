//! Emitter for the tsonic compiler.
//!
//! Lowers IR modules to a closed, strongly-typed C# AST and prints that
//! AST deterministically: identical ASTs produce byte-identical text.
//! No raw-string escape hatches exist; every construct is a named node.

pub mod cs;
pub use cs::{
    CompilationUnit, CsArg, CsCatch, CsDecl, CsExpr, CsInterfaceMember, CsLambdaBody, CsLiteral,
    CsMember, CsModifier, CsParam, CsParamModifier, CsPrimitive, CsStmt, CsType,
};

pub mod writer;
pub use writer::SourceWriter;

pub mod printer;
pub use printer::print_unit;

pub mod emit_context;
pub use emit_context::EmitContext;

pub mod lower;
pub use lower::lower_module;
