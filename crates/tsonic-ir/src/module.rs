//! IR modules.
//!
//! One `IrModule` per source file, carrying the synthesized target
//! namespace, the container class name, and the classified imports.

use serde::Serialize;

use crate::stmt::IrStatement;

/// How an import is classified during module building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ImportKind {
    /// Another module of this compilation.
    Local,
    /// A runtime host API (e.g. the console/process surface).
    RuntimeHost,
    /// A nominal facade backed by a binding manifest.
    NominalFacade,
}

/// One classified import.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrImport {
    pub kind: ImportKind,
    pub specifier: String,
    /// Imported names with optional aliases.
    pub names: Vec<(String, Option<String>)>,
    /// The target namespace this import maps to, when known.
    pub namespace: Option<String>,
}

/// One source file lowered to IR.
#[derive(Clone, Debug, Serialize)]
pub struct IrModule {
    /// Source-root-relative path of the originating file.
    pub file_path: String,
    /// Synthesized target namespace, e.g. `App.Geom`.
    pub namespace: String,
    /// Container class name, e.g. `Point`.
    pub container_class: String,
    /// True when the module has no top-level executable code, at least one
    /// export, and no class matching the filename.
    pub is_static_container: bool,
    pub imports: Vec<IrImport>,
    pub statements: Vec<IrStatement>,
}

impl IrModule {
    /// Exported declaration names, in order.
    #[must_use]
    pub fn exported_names(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter_map(|s| match s {
                IrStatement::VarDecl { name, exported: true, .. } => Some(name.as_str()),
                IrStatement::Function(f) if f.exported => Some(f.name.as_str()),
                IrStatement::Class(c) if c.exported => Some(c.name.as_str()),
                IrStatement::Interface(i) if i.exported => Some(i.name.as_str()),
                IrStatement::TypeAlias { name, exported: true, .. } => Some(name.as_str()),
                IrStatement::Enum { name, exported: true, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}
