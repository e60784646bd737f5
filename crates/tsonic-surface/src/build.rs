//! Programmatic construction of surface programs.
//!
//! The host parser produces `Program` values over a data boundary; this
//! builder produces the same values in-process. It is the construction
//! path for host-side adapters and for tests throughout the workspace.

use tsonic_common::position::LineMap;
use tsonic_common::span::Span;

use crate::ast::{FileId, NodeId, NodeKind, Program, SourceFile};
use crate::symbols::ImportTarget;

/// Builder over a [`Program`] under construction.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    program: Program,
    current_file: Option<FileId>,
}

impl TreeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new source file; subsequent [`TreeBuilder::item`] calls
    /// append to it.
    pub fn file(&mut self, path: &str) -> FileId {
        let id = FileId(self.program.files.len() as u32);
        self.program.files.push(SourceFile {
            path: path.to_string(),
            line_map: LineMap::from_text(""),
            items: Vec::new(),
        });
        self.current_file = Some(id);
        id
    }

    /// Attach a line map built from source text to the current file.
    pub fn with_text(&mut self, text: &str) {
        if let Some(file) = self.current_file {
            self.program.files[file.index()].line_map = LineMap::from_text(text);
        }
    }

    /// Allocate a node with a dummy span.
    pub fn node(&mut self, kind: NodeKind) -> NodeId {
        self.program.arena.alloc(kind, Span::dummy())
    }

    /// Allocate a node at a specific span.
    pub fn node_at(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.program.arena.alloc(kind, span)
    }

    /// Append a top-level item to the current file.
    pub fn item(&mut self, id: NodeId) {
        let file = self
            .current_file
            .expect("TreeBuilder::item called before TreeBuilder::file");
        self.program.files[file.index()].items.push(id);
    }

    // ----- symbol table recording (the host's half of the contract) -----

    pub fn record_use(&mut self, use_node: NodeId, decl_node: NodeId) {
        self.program.symbols.record_use(use_node, decl_node);
    }

    pub fn record_call_target(&mut self, call_node: NodeId, decl_node: NodeId) {
        self.program.symbols.record_call_target(call_node, decl_node);
    }

    pub fn record_import(&mut self, file: FileId, local_name: &str, target: ImportTarget) {
        self.program
            .symbols
            .record_import(file, local_name.to_string(), target);
    }

    // ----- small conveniences for common leaf nodes -----

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.node(NodeKind::Ident(name.to_string()))
    }

    pub fn number(&mut self, lexeme: &str) -> NodeId {
        self.node(NodeKind::NumberLit {
            lexeme: lexeme.to_string(),
        })
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.node(NodeKind::StringLit(value.to_string()))
    }

    pub fn type_ref(&mut self, name: &str, type_args: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::TypeRef {
            name: name.to_string(),
            type_args,
        })
    }

    pub fn param(&mut self, name: &str, type_annotation: Option<NodeId>) -> NodeId {
        self.node(NodeKind::Param {
            name: name.to_string(),
            type_annotation,
            optional: false,
            default: None,
        })
    }

    /// Finish construction.
    #[must_use]
    pub fn finish(self) -> Program {
        self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_produces_program() {
        let mut builder = TreeBuilder::new();
        builder.file("main.ts");
        let int_ty = builder.type_ref("int", Vec::new());
        let init = builder.number("1");
        let var = builder.node(NodeKind::Var {
            name: "x".into(),
            declared_type: Some(int_ty),
            init: Some(init),
            is_const: true,
            exported: false,
        });
        builder.item(var);
        let program = builder.finish();
        assert_eq!(program.files.len(), 1);
        assert_eq!(program.files[0].items.len(), 1);
        assert_eq!(program.arena.len(), 3);
    }
}
