//! Surface syntax tree.
//!
//! Nodes live in a single program-wide arena and reference each other by
//! `NodeId`. The tree is pure data: no host-parser types, no methods that
//! compute semantics. Every consumer walks it with exhaustive matches.

use serde::{Deserialize, Serialize};
use tsonic_common::position::LineMap;
use tsonic_common::span::Span;

/// Index of a node in the program arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Index of a source file in the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// One surface node: a kind payload plus its source span.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Arena of surface nodes, append-only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        id
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.index()).map(|n| &n.kind)
    }

    #[must_use]
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes
            .get(id.index())
            .map_or_else(Span::dummy, |n| n.span)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One source file: path, host-provided line map, top-level items.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceFile {
    /// Source-root-relative path, e.g. `geom/point.ts`.
    pub path: String,
    pub line_map: LineMap,
    pub items: Vec<NodeId>,
}

impl SourceFile {
    /// The file stem, e.g. `point` for `geom/point.ts`.
    #[must_use]
    pub fn stem(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        name.strip_suffix(".ts").unwrap_or(name)
    }
}

/// A whole surface program as handed over by the host parser.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Program {
    pub arena: NodeArena,
    pub files: Vec<SourceFile>,
    pub symbols: crate::symbols::SymbolTable,
}

impl Program {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.index())
    }

    /// File ids sorted by source path, the canonical visitation order.
    #[must_use]
    pub fn files_in_order(&self) -> Vec<FileId> {
        let mut ids: Vec<FileId> = (0..self.files.len() as u32).map(FileId).collect();
        ids.sort_by(|a, b| self.files[a.index()].path.cmp(&self.files[b.index()].path));
        ids
    }
}

// =============================================================================
// Node kinds
// =============================================================================

/// Import clause shapes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ImportClause {
    /// `import { a, b as c } from "…"`
    Named(Vec<ImportName>),
    /// `import * as ns from "…"`
    Namespace(String),
    /// `import d from "…"`
    Default(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

/// A type parameter declaration, `T extends C = D`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<NodeId>,
    pub default: Option<NodeId>,
}

/// Keys of object literal properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropKey {
    Ident(String),
    String(String),
    /// `[expr]: …`
    Computed(NodeId),
}

/// One property of an object literal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObjectProp {
    /// `key: value`
    Init { key: PropKey, value: NodeId },
    /// `name` shorthand
    Shorthand { name: String },
    /// `key() { … }`
    Method { key: PropKey, function: NodeId },
    /// `get key() { … }` / `set key(v) { … }`
    Accessor { key: PropKey },
    /// `...expr`
    Spread { expr: NodeId },
}

/// Body of an arrow function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ArrowBody {
    Expr(NodeId),
    Block(Vec<NodeId>),
}

/// Binary operators (surface forms).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    ShiftLeft,
    ShiftRight,
    ShiftRightUnsigned,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    In,
    InstanceOf,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Coalesce,
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Void,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

/// Assignment operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    Coalesce,
}

/// Literal payloads of literal type nodes (`"a"`, `1`, `true`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TypeLiteral {
    String(String),
    Number(String),
    Boolean(bool),
}

/// A member of an object type (`{ id: number; [k: string]: V }`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObjectTypeMember {
    Property {
        name: String,
        type_annotation: NodeId,
        optional: bool,
        readonly: bool,
    },
    Index {
        key_type: NodeId,
        value_type: NodeId,
    },
}

/// Enum member: a name and an optional initializer expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub init: Option<NodeId>,
}

/// The sum of all surface node shapes.
///
/// Statements, expressions, and type nodes share one enum; the host parser
/// guarantees each id is used in the right position, and converters reject
/// out-of-position kinds with an internal-error diagnostic rather than
/// panicking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // ----- declarations and statements -----
    Import {
        clause: ImportClause,
        specifier: String,
    },
    Var {
        name: String,
        declared_type: Option<NodeId>,
        init: Option<NodeId>,
        is_const: bool,
        exported: bool,
    },
    Function {
        name: String,
        type_params: Vec<TypeParam>,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: Vec<NodeId>,
        is_generator: bool,
        is_async: bool,
        exported: bool,
    },
    Param {
        name: String,
        type_annotation: Option<NodeId>,
        optional: bool,
        default: Option<NodeId>,
    },
    Class {
        name: String,
        type_params: Vec<TypeParam>,
        extends: Option<NodeId>,
        implements: Vec<NodeId>,
        members: Vec<NodeId>,
        exported: bool,
    },
    Property {
        name: String,
        type_annotation: Option<NodeId>,
        optional: bool,
        readonly: bool,
        is_static: bool,
        init: Option<NodeId>,
    },
    Method {
        name: String,
        type_params: Vec<TypeParam>,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: Vec<NodeId>,
        is_static: bool,
        is_generator: bool,
        is_async: bool,
    },
    Constructor {
        params: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    Interface {
        name: String,
        type_params: Vec<TypeParam>,
        extends: Vec<NodeId>,
        members: Vec<NodeId>,
        exported: bool,
    },
    PropertySig {
        name: String,
        type_annotation: NodeId,
        optional: bool,
        readonly: bool,
    },
    MethodSig {
        name: String,
        type_params: Vec<TypeParam>,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
    },
    TypeAlias {
        name: String,
        type_params: Vec<TypeParam>,
        body: NodeId,
        exported: bool,
    },
    Enum {
        name: String,
        members: Vec<EnumMember>,
        exported: bool,
    },
    Block(Vec<NodeId>),
    ExprStmt(NodeId),
    Return(Option<NodeId>),
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForOf {
        binding: String,
        iterable: NodeId,
        body: NodeId,
    },
    Break,
    Continue,
    Throw(NodeId),
    Try {
        block: NodeId,
        catch_binding: Option<String>,
        catch_block: Option<NodeId>,
        finally_block: Option<NodeId>,
    },

    // ----- expressions -----
    Ident(String),
    StringLit(String),
    NumberLit {
        /// Original lexeme; intent (Int32/Double) is derived from its form.
        lexeme: String,
    },
    BoolLit(bool),
    NullLit,
    UndefinedLit,
    ArrayLit(Vec<NodeId>),
    ObjectLit(Vec<ObjectProp>),
    Arrow {
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: ArrowBody,
        is_async: bool,
    },
    Call {
        callee: NodeId,
        type_args: Vec<NodeId>,
        args: Vec<NodeId>,
    },
    New {
        callee: NodeId,
        type_args: Vec<NodeId>,
        args: Vec<NodeId>,
    },
    PropertyAccess {
        object: NodeId,
        name: String,
        optional: bool,
    },
    ElementAccess {
        object: NodeId,
        index: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Assign {
        op: AssignOp,
        target: NodeId,
        value: NodeId,
    },
    Conditional {
        cond: NodeId,
        when_true: NodeId,
        when_false: NodeId,
    },
    Paren(NodeId),
    As {
        expr: NodeId,
        target: NodeId,
    },
    Yield {
        expr: Option<NodeId>,
        delegate: bool,
    },
    Await(NodeId),

    // ----- type nodes -----
    TypeRef {
        name: String,
        type_args: Vec<NodeId>,
    },
    ArrayType {
        element: NodeId,
    },
    TupleType {
        elements: Vec<NodeId>,
    },
    FunctionType {
        params: Vec<(String, NodeId)>,
        return_type: NodeId,
    },
    ObjectType {
        members: Vec<ObjectTypeMember>,
    },
    UnionType(Vec<NodeId>),
    IntersectionType(Vec<NodeId>),
    LiteralType(TypeLiteral),
    /// `x is T` in a return-type position.
    TypePredicate {
        param: String,
        target: NodeId,
    },
}

impl NodeKind {
    /// Whether this kind appears in type-node position.
    #[must_use]
    pub fn is_type_node(&self) -> bool {
        matches!(
            self,
            NodeKind::TypeRef { .. }
                | NodeKind::ArrayType { .. }
                | NodeKind::TupleType { .. }
                | NodeKind::FunctionType { .. }
                | NodeKind::ObjectType { .. }
                | NodeKind::UnionType(_)
                | NodeKind::IntersectionType(_)
                | NodeKind::LiteralType(_)
                | NodeKind::TypePredicate { .. }
        )
    }

    /// The declared name, for declaration kinds.
    #[must_use]
    pub fn decl_name(&self) -> Option<&str> {
        match self {
            NodeKind::Var { name, .. }
            | NodeKind::Function { name, .. }
            | NodeKind::Class { name, .. }
            | NodeKind::Interface { name, .. }
            | NodeKind::TypeAlias { name, .. }
            | NodeKind::Enum { name, .. }
            | NodeKind::Param { name, .. }
            | NodeKind::Property { name, .. }
            | NodeKind::Method { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether this kind is an exported declaration.
    #[must_use]
    pub fn is_exported(&self) -> bool {
        matches!(
            self,
            NodeKind::Var { exported: true, .. }
                | NodeKind::Function { exported: true, .. }
                | NodeKind::Class { exported: true, .. }
                | NodeKind::Interface { exported: true, .. }
                | NodeKind::TypeAlias { exported: true, .. }
                | NodeKind::Enum { exported: true, .. }
        )
    }
}
