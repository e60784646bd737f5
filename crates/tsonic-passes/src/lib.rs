//! Middle passes of the tsonic compiler.
//!
//! Each pass takes ownership of the IR modules and returns a new tree
//! (the builder's tree is retained by the driver for provenance). Passes
//! run in a fixed order: narrowing, anonymous-object synthesis,
//! monomorphization, structural-constraint adapters, numeric proof.

pub mod narrowing;
pub mod synthesis;
pub mod monomorphize;
pub mod adapters;
pub mod numeric_proof;

use tsonic_common::diagnostics::DiagnosticSink;
use tsonic_ir::module::IrModule;
use tsonic_surface::ast::Program;
use tsonic_types::TypeSystem;

/// Run all middle passes in order.
pub fn run_all(
    mut modules: Vec<IrModule>,
    program: &Program,
    types: &TypeSystem<'_>,
    sink: &mut DiagnosticSink,
) -> Vec<IrModule> {
    modules = narrowing::run(modules, types);
    modules = synthesis::run(modules, program, sink);
    modules = monomorphize::run(modules);
    modules = adapters::run(modules);
    modules = numeric_proof::run(modules, sink);
    for diagnostic in types.drain_diagnostics() {
        sink.push(diagnostic);
    }
    modules
}
