//! IR builder for the tsonic compiler.
//!
//! Walks the surface tree with the type system in hand and produces one
//! `IrModule` per source file. Expression conversion is deterministic:
//! every `inferred_type` is fixed here (or by a later middle pass), never
//! during emission. Converters never throw on user error - they write to
//! the diagnostic sink and substitute a poisoned IR value.

pub mod context;
pub use context::ProgramContext;

pub mod module_builder;
pub use module_builder::{build_module, build_modules};

pub mod stmts;
pub mod exprs;
