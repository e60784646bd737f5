//! Registry records behind the binder's opaque ids.
//!
//! Each registry is an append-only `Vec` indexed by its id type. Records
//! are pure data; none of them reference host-parser types beyond the
//! `NodeId`/`FileId` handles of the surface tree.

use serde::Serialize;
use tsonic_surface::ast::{FileId, NodeId};

use crate::ids::{DeclId, SignatureId, TypeSyntaxId};

/// What kind of declaration a [`DeclInfo`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DeclKind {
    Var,
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Param,
    Property,
    Method,
}

/// One declaration.
#[derive(Clone, Debug, Serialize)]
pub struct DeclInfo {
    pub name: String,
    pub kind: DeclKind,
    pub file: FileId,
    pub node: NodeId,
    /// Captured declared-type syntax, when the declaration has one.
    pub type_syntax: Option<TypeSyntaxId>,
    /// The call signature, for functions and methods.
    pub signature: Option<SignatureId>,
    pub exported: bool,
}

/// Parameter passing mode, normalized at registration time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ParamMode {
    #[default]
    Value,
    Ref,
    Out,
    In,
}

impl ParamMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParamMode::Value => "value",
            ParamMode::Ref => "ref",
            ParamMode::Out => "out",
            ParamMode::In => "in",
        }
    }
}

impl std::fmt::Display for ParamMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parameter of a signature.
#[derive(Clone, Debug, Serialize)]
pub struct ParamInfo {
    pub name: String,
    /// Declared type with marker wrappers (`ref<T>` etc.) already unwrapped.
    pub type_syntax: Option<TypeSyntaxId>,
    pub mode: ParamMode,
    pub optional: bool,
    pub has_default: bool,
}

/// A type parameter of a signature or declaration.
#[derive(Clone, Debug, Serialize)]
pub struct TypeParamInfo {
    pub name: String,
    pub constraint: Option<TypeSyntaxId>,
    pub default: Option<TypeSyntaxId>,
}

/// One call or constructor signature.
#[derive(Clone, Debug, Serialize)]
pub struct SignatureInfo {
    /// The declaring function/method, when there is one.
    pub decl: Option<DeclId>,
    pub type_params: Vec<TypeParamInfo>,
    pub params: Vec<ParamInfo>,
    pub return_syntax: Option<TypeSyntaxId>,
    pub is_constructor: bool,
}

/// What kind of member a [`MemberInfo`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MemberKind {
    Property,
    Method,
    Constructor,
}

/// One member of a nominal type (class or interface declaration).
#[derive(Clone, Debug, Serialize)]
pub struct MemberInfo {
    /// The owning class/interface declaration.
    pub owner: DeclId,
    pub name: String,
    pub kind: MemberKind,
    pub type_syntax: Option<TypeSyntaxId>,
    pub signature: Option<SignatureId>,
    pub optional: bool,
    pub readonly: bool,
    pub is_static: bool,
}

/// One captured type-syntax node.
#[derive(Clone, Debug, Serialize)]
pub struct TypeSyntaxInfo {
    pub file: FileId,
    pub node: NodeId,
    /// Type-parameter names in scope at the capture site, innermost last.
    pub scope: Vec<String>,
}
