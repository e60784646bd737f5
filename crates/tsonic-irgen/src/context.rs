//! `ProgramContext` - everything a converter needs.
//!
//! Carries the binder, the type system, the diagnostic sink, and a scoped
//! type environment for locals whose declarations have no annotation but
//! whose types were fixed by their initializers.

use rustc_hash::FxHashMap;
use tsonic_binder::Binder;
use tsonic_common::diagnostics::{Diagnostic, DiagnosticSink, format_message, get_message_template};
use tsonic_common::span::Span;
use tsonic_ir::types::IrType;
use tsonic_surface::ast::{FileId, NodeId, Program};
use tsonic_types::TypeSystem;

/// Per-module conversion state.
pub struct ProgramContext<'a> {
    pub program: &'a Program,
    pub binder: &'a Binder,
    pub types: &'a TypeSystem<'a>,
    pub file: FileId,
    pub file_path: String,
    pub sink: &'a mut DiagnosticSink,
    /// Scope stack of local-name → type for unannotated locals.
    locals: Vec<FxHashMap<String, IrType>>,
    /// Declared return type of the enclosing function, for `return`
    /// expected-type threading.
    pub current_return_type: Option<IrType>,
}

impl<'a> ProgramContext<'a> {
    pub fn new(
        program: &'a Program,
        binder: &'a Binder,
        types: &'a TypeSystem<'a>,
        file: FileId,
        sink: &'a mut DiagnosticSink,
    ) -> Self {
        let file_path = program
            .file(file)
            .map_or_else(String::new, |f| f.path.clone());
        Self {
            program,
            binder,
            types,
            file,
            file_path,
            sink,
            locals: vec![FxHashMap::default()],
            current_return_type: None,
        }
    }

    pub fn enter_scope(&mut self) {
        self.locals.push(FxHashMap::default());
    }

    pub fn exit_scope(&mut self) {
        self.locals.pop();
    }

    pub fn record_local(&mut self, name: &str, ty: IrType) {
        if let Some(scope) = self.locals.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    #[must_use]
    pub fn local_type(&self, name: &str) -> Option<&IrType> {
        self.locals.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Report an error diagnostic from the static message table.
    pub fn error(&mut self, span: Span, code: u32, args: &[&str]) {
        let template = get_message_template(code).unwrap_or("Unknown diagnostic.");
        self.sink.push(Diagnostic::error(
            self.file_path.clone(),
            span,
            format_message(template, args),
            code,
        ));
    }

    #[must_use]
    pub fn span_of(&self, node: NodeId) -> Span {
        self.program.arena.span(node)
    }
}
