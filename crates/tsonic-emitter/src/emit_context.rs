//! `EmitContext` - state threaded through every lowering function.
//!
//! Carries the name tables (the catalog, for CLR member names and global
//! renames only - the emitter never asks type questions), the using sink,
//! and the per-scope flags.

use indexmap::IndexSet;
use tsonic_common::diagnostics::{Diagnostic, DiagnosticSink, format_message, get_message_template};
use tsonic_common::span::Span;
use tsonic_ir::types::{IrPrimitive, IrType};
use tsonic_types::TypeCatalog;
use tsonic_types::catalog::CatalogMember;

/// Per-module emission state.
pub struct EmitContext<'a> {
    pub catalog: &'a TypeCatalog,
    pub sink: &'a mut DiagnosticSink,
    /// Using directives collected during lowering; sorted and
    /// deduplicated by the printer.
    pub usings: IndexSet<String>,
    pub file_path: String,
    pub namespace: String,
    pub container: String,
    /// Whether members lower as `static` (static-container module).
    pub is_static: bool,
    pub is_async: bool,
    /// Exchange class name while lowering a generator core body.
    pub generator_exchange: Option<String>,
    /// Result-setter callback name for generators with a non-void return.
    pub generator_result_setter: Option<String>,
    temp_counter: u32,
}

impl<'a> EmitContext<'a> {
    pub fn new(
        catalog: &'a TypeCatalog,
        sink: &'a mut DiagnosticSink,
        file_path: &str,
        namespace: &str,
        container: &str,
    ) -> Self {
        Self {
            catalog,
            sink,
            usings: IndexSet::new(),
            file_path: file_path.to_string(),
            namespace: namespace.to_string(),
            container: container.to_string(),
            is_static: false,
            is_async: false,
            generator_exchange: None,
            generator_result_setter: None,
            temp_counter: 0,
        }
    }

    pub fn add_using(&mut self, namespace: &str) {
        self.usings.insert(namespace.to_string());
    }

    /// Next temporary name (`__t0`, `__t1`, …).
    pub fn next_temp(&mut self) -> String {
        let name = format!("__t{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    pub fn warn(&mut self, span: Option<Span>, code: u32, args: &[&str]) {
        let template = get_message_template(code).unwrap_or("Unknown diagnostic.");
        self.sink.push(Diagnostic::warning(
            self.file_path.clone(),
            span.unwrap_or_else(Span::dummy),
            format_message(template, args),
            code,
        ));
    }

    pub fn error(&mut self, span: Option<Span>, code: u32, args: &[&str]) {
        let template = get_message_template(code).unwrap_or("Unknown diagnostic.");
        self.sink.push(Diagnostic::error(
            self.file_path.clone(),
            span.unwrap_or_else(Span::dummy),
            format_message(template, args),
            code,
        ));
    }

    /// The catalog member behind `receiver.name`, for CLR name mapping.
    /// Walks direct members only; inherited members were already typed by
    /// the builder and keep their surface names.
    #[must_use]
    pub fn catalog_member(&self, receiver: &IrType, name: &str) -> Option<&'a CatalogMember> {
        let id = match receiver {
            IrType::Primitive(IrPrimitive::String) => self.catalog.resolve_ts_name("String")?,
            IrType::Array { .. } => self.catalog.resolve_ts_name("Array")?,
            IrType::Reference { type_id, name: type_name, .. } => match type_id {
                Some(id) => *id,
                None => self.catalog.resolve_ts_name(type_name)?,
            },
            _ => return None,
        };
        self.catalog.find_member(id, name)
    }

    /// The CLR member name for `receiver.name`, falling back to the
    /// surface name.
    #[must_use]
    pub fn member_emit_name(&self, receiver: &IrType, name: &str) -> String {
        self.catalog_member(receiver, name)
            .and_then(|m| m.clr_name.clone())
            .unwrap_or_else(|| name.to_string())
    }
}
