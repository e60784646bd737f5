//! IR expressions.
//!
//! Every expression node carries an optional `inferred_type` fixed by the
//! IR builder and middle passes, an optional source span, and (after the
//! numeric proof pass) an optional Int32 proof. Nodes are immutable;
//! passes produce new nodes.

use serde::Serialize;
use tsonic_binder::ids::{DeclId, MemberId, SignatureId};
use tsonic_binder::registry::ParamMode;
use tsonic_common::numeric::NumericIntent;
use tsonic_common::span::Span;

use crate::types::IrType;

/// Binary operators in the IR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IrBinaryOp {
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

impl IrBinaryOp {
    /// Whether this operator yields `boolean`.
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            IrBinaryOp::Less
                | IrBinaryOp::LessEq
                | IrBinaryOp::Greater
                | IrBinaryOp::GreaterEq
                | IrBinaryOp::In
                | IrBinaryOp::InstanceOf
                | IrBinaryOp::EqEq
                | IrBinaryOp::NotEq
                | IrBinaryOp::EqEqEq
                | IrBinaryOp::NotEqEq
        )
    }

    /// Whether this operator yields `int`.
    #[must_use]
    pub const fn is_bitwise(&self) -> bool {
        matches!(
            self,
            IrBinaryOp::ShiftLeft
                | IrBinaryOp::ShiftRight
                | IrBinaryOp::ShiftRightUnsigned
                | IrBinaryOp::BitAnd
                | IrBinaryOp::BitXor
                | IrBinaryOp::BitOr
        )
    }

    /// Whether this operator is numeric arithmetic.
    #[must_use]
    pub const fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            IrBinaryOp::Add
                | IrBinaryOp::Sub
                | IrBinaryOp::Mul
                | IrBinaryOp::Div
                | IrBinaryOp::Rem
                | IrBinaryOp::Exp
        )
    }
}

/// Unary operators in the IR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IrUnaryOp {
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

/// Assignment operators in the IR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IrAssignOp {
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

/// Literal payloads.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum IrLiteral {
    String(String),
    Number {
        /// Original lexeme as written.
        lexeme: String,
        value: f64,
        intent: NumericIntent,
    },
    Boolean(bool),
    Null,
    Undefined,
}

/// One parameter of an IR function or lambda.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrParam {
    pub name: String,
    pub ty: Option<IrType>,
    pub mode: ParamMode,
    pub optional: bool,
    pub default: Option<Box<IrExpression>>,
}

/// Body of a lambda: a bare expression or a statement block.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum IrLambdaBody {
    Expr(Box<IrExpression>),
    Block(Vec<crate::stmt::IrStatement>),
}

/// A call or construction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrCall {
    pub callee: Box<IrExpression>,
    pub type_args: Vec<IrType>,
    pub args: Vec<IrExpression>,
    /// Per-argument passing modes, length equal to `args`.
    pub arg_modes: Vec<ParamMode>,
    pub signature: Option<SignatureId>,
    /// Set when generic inference decided this call needs a specialized
    /// target declaration.
    pub requires_specialization: bool,
    /// Mangled target name, filled in by monomorphization.
    pub specialized_name: Option<String>,
}

/// One property of an object literal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrObjectProp {
    pub name: String,
    pub value: IrExpression,
}

/// What proved an expression's Int32-ness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ProofSource {
    /// Integer literal within `i32` range.
    IntLiteralInRange,
    /// Declaration (parameter, variable) with declared integer type.
    DeclaredInt,
    /// Runtime API declared to return an integer kind (e.g. `length`).
    RuntimeIntReturn,
    /// Binary operation over proven integer operands.
    BinaryOverProven,
    /// Unary operation over a proven integer operand.
    UnaryOverProven,
    /// Explicit, validated `as int` narrowing.
    DeclaredNarrowing,
}

/// Proof of integer intent attached by the numeric proof pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NumericProof {
    pub kind: NumericIntent,
    pub source: ProofSource,
}

impl NumericProof {
    #[must_use]
    pub const fn int32(source: ProofSource) -> Self {
        Self {
            kind: NumericIntent::Int32,
            source,
        }
    }
}

/// The expression node: a kind plus the deterministic typing facts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrExpression {
    pub kind: IrExpressionKind,
    pub inferred_type: Option<IrType>,
    pub span: Option<Span>,
    pub numeric_proof: Option<NumericProof>,
}

impl IrExpression {
    #[must_use]
    pub fn new(kind: IrExpressionKind) -> Self {
        Self {
            kind,
            inferred_type: None,
            span: None,
            numeric_proof: None,
        }
    }

    #[must_use]
    pub fn typed(kind: IrExpressionKind, ty: IrType) -> Self {
        Self {
            kind,
            inferred_type: Some(ty),
            span: None,
            numeric_proof: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn with_proof(mut self, proof: NumericProof) -> Self {
        self.numeric_proof = Some(proof);
        self
    }

    /// The inferred type, or `Unknown` when unset.
    #[must_use]
    pub fn ty(&self) -> IrType {
        self.inferred_type.clone().unwrap_or(IrType::Unknown)
    }
}

/// The expression sum.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum IrExpressionKind {
    Literal(IrLiteral),
    Ident {
        name: String,
        decl: Option<DeclId>,
    },
    Member {
        object: Box<IrExpression>,
        name: String,
        member: Option<MemberId>,
        optional: bool,
    },
    Index {
        object: Box<IrExpression>,
        index: Box<IrExpression>,
    },
    Call(IrCall),
    New(IrCall),
    Binary {
        op: IrBinaryOp,
        left: Box<IrExpression>,
        right: Box<IrExpression>,
    },
    Unary {
        op: IrUnaryOp,
        operand: Box<IrExpression>,
    },
    Assign {
        op: IrAssignOp,
        target: Box<IrExpression>,
        value: Box<IrExpression>,
    },
    Conditional {
        cond: Box<IrExpression>,
        when_true: Box<IrExpression>,
        when_false: Box<IrExpression>,
    },
    Lambda {
        params: Vec<IrParam>,
        return_type: Option<IrType>,
        body: IrLambdaBody,
        is_async: bool,
    },
    ObjectLiteral {
        props: Vec<IrObjectProp>,
        /// Name of the synthesized anonymous type, when synthesis ran.
        synthesized_name: Option<String>,
    },
    ArrayLiteral(Vec<IrExpression>),
    /// `trycast<T>(x)`, result type `T | null`.
    TryCast {
        expr: Box<IrExpression>,
        target: IrType,
    },
    /// `x as T`.
    Cast {
        expr: Box<IrExpression>,
        target: IrType,
    },
    Yield {
        expr: Option<Box<IrExpression>>,
        delegate: bool,
    },
    Await(Box<IrExpression>),
    This,
    Super,
}
