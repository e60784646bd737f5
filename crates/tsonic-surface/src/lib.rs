//! Surface syntax tree and host-boundary data for the tsonic compiler.
//!
//! The host parser is an external collaborator: it parses source text and
//! hands the compiler a pure-data surface tree plus a symbol table. This
//! crate defines that narrow interface:
//! - `ast` - arena-allocated surface nodes (statements, expressions, types)
//! - `symbols` - the host symbol table (only `tsonic-binder` reads it)
//! - `manifest` - external binding-manifest schemas
//! - `workspace` - `tsonic.workspace.json` schema (consumed by the CLI)
//! - `build` - programmatic tree construction, used at the host boundary
//!   and by tests

pub mod ast;
pub use ast::{
    ArrowBody, AssignOp, BinaryOp, FileId, ImportClause, Node, NodeArena, NodeId, NodeKind,
    ObjectProp, Program, PropKey, SourceFile, TypeParam, UnaryOp,
};

pub mod symbols;
pub use symbols::{ImportTarget, SymbolTable};

pub mod manifest;
pub use manifest::{BindingManifest, GlobalBinding, ModuleManifest};

pub mod workspace;
pub use workspace::WorkspaceConfig;

pub mod build;
pub use build::TreeBuilder;
