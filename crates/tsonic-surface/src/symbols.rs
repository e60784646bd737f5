//! Host symbol table.
//!
//! Produced by the external host parser alongside the surface tree. Maps
//! identifier uses to declaration nodes, call sites to their target
//! declarations, and imported names to the exporting file. Only
//! `tsonic-binder` is allowed to read it; nothing downstream of binding
//! ever touches host symbols.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ast::{FileId, NodeId};

/// Where an imported name comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTarget {
    pub file: FileId,
    pub export: String,
}

/// The host symbol table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    /// Identifier-use node → declaration node.
    decls: FxHashMap<NodeId, NodeId>,
    /// Call/new node → callee declaration node (function, method, class).
    call_targets: FxHashMap<NodeId, NodeId>,
    /// Importing file → local name → exporting file and export name.
    imports: FxHashMap<FileId, FxHashMap<String, ImportTarget>>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_use(&mut self, use_node: NodeId, decl_node: NodeId) {
        self.decls.insert(use_node, decl_node);
    }

    pub fn record_call_target(&mut self, call_node: NodeId, decl_node: NodeId) {
        self.call_targets.insert(call_node, decl_node);
    }

    pub fn record_import(&mut self, file: FileId, local_name: String, target: ImportTarget) {
        self.imports
            .entry(file)
            .or_default()
            .insert(local_name, target);
    }

    #[must_use]
    pub fn declaration_of(&self, use_node: NodeId) -> Option<NodeId> {
        self.decls.get(&use_node).copied()
    }

    #[must_use]
    pub fn call_target_of(&self, call_node: NodeId) -> Option<NodeId> {
        self.call_targets.get(&call_node).copied()
    }

    #[must_use]
    pub fn import_target(&self, file: FileId, local_name: &str) -> Option<&ImportTarget> {
        self.imports.get(&file)?.get(local_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_resolution() {
        let mut table = SymbolTable::new();
        table.record_use(NodeId(5), NodeId(1));
        assert_eq!(table.declaration_of(NodeId(5)), Some(NodeId(1)));
        assert_eq!(table.declaration_of(NodeId(6)), None);
    }

    #[test]
    fn test_import_target() {
        let mut table = SymbolTable::new();
        table.record_import(
            FileId(0),
            "point".into(),
            ImportTarget {
                file: FileId(1),
                export: "Point".into(),
            },
        );
        let target = table.import_target(FileId(0), "point").unwrap();
        assert_eq!(target.file, FileId(1));
        assert_eq!(target.export, "Point");
    }
}
