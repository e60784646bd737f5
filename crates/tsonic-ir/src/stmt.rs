//! IR statements and declarations.

use serde::Serialize;
use tsonic_binder::ids::DeclId;
use tsonic_common::span::Span;

use crate::expr::{IrExpression, IrParam};
use crate::types::IrType;

/// A type parameter with its (possibly structural) constraint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrTypeParam {
    pub name: String,
    pub constraint: Option<IrType>,
}

/// A function or method declaration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrFunction {
    pub name: String,
    pub type_params: Vec<IrTypeParam>,
    pub params: Vec<IrParam>,
    pub return_type: Option<IrType>,
    pub body: Vec<IrStatement>,
    pub is_generator: bool,
    pub is_async: bool,
    pub is_static: bool,
    pub exported: bool,
    /// Set when generic inference decided call sites need specialized
    /// copies of this declaration.
    pub requires_specialization: bool,
    pub decl: Option<DeclId>,
    pub span: Option<Span>,
}

/// A class property.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrProperty {
    pub name: String,
    pub ty: Option<IrType>,
    pub optional: bool,
    pub readonly: bool,
    pub is_static: bool,
    pub init: Option<IrExpression>,
}

/// Members of a class.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum IrClassMember {
    Property(IrProperty),
    Method(IrFunction),
    Constructor {
        params: Vec<IrParam>,
        body: Vec<IrStatement>,
    },
}

/// A class declaration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrClass {
    pub name: String,
    pub type_params: Vec<IrTypeParam>,
    pub extends: Option<IrType>,
    pub implements: Vec<IrType>,
    pub members: Vec<IrClassMember>,
    pub exported: bool,
    pub decl: Option<DeclId>,
    pub span: Option<Span>,
}

/// Members of an interface.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum IrInterfaceMember {
    Property {
        name: String,
        ty: IrType,
        optional: bool,
        readonly: bool,
    },
    Method {
        name: String,
        params: Vec<IrParam>,
        return_type: Option<IrType>,
    },
}

/// An interface declaration. User interfaces are nominalized to classes
/// at emit time; synthesized constraint adapters stay real interfaces.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrInterface {
    pub name: String,
    pub type_params: Vec<IrTypeParam>,
    pub extends: Vec<IrType>,
    pub members: Vec<IrInterfaceMember>,
    pub exported: bool,
    /// Set on `__Constraint_*` interfaces synthesized by the adapter pass.
    pub is_constraint_adapter: bool,
    pub decl: Option<DeclId>,
    pub span: Option<Span>,
}

/// An enum member.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IrEnumMember {
    pub name: String,
    pub init: Option<IrExpression>,
}

/// The statement sum.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum IrStatement {
    VarDecl {
        name: String,
        declared_type: Option<IrType>,
        init: Option<IrExpression>,
        is_const: bool,
        exported: bool,
        decl: Option<DeclId>,
        span: Option<Span>,
    },
    Function(IrFunction),
    Class(IrClass),
    Interface(IrInterface),
    TypeAlias {
        name: String,
        type_params: Vec<String>,
        body: IrType,
        exported: bool,
        span: Option<Span>,
    },
    Enum {
        name: String,
        members: Vec<IrEnumMember>,
        exported: bool,
        span: Option<Span>,
    },
    Expr(IrExpression),
    Return(Option<IrExpression>),
    If {
        cond: IrExpression,
        then_branch: Vec<IrStatement>,
        else_branch: Option<Vec<IrStatement>>,
    },
    While {
        cond: IrExpression,
        body: Vec<IrStatement>,
    },
    For {
        init: Option<Box<IrStatement>>,
        cond: Option<IrExpression>,
        update: Option<IrExpression>,
        body: Vec<IrStatement>,
    },
    ForOf {
        binding: String,
        binding_type: Option<IrType>,
        iterable: IrExpression,
        body: Vec<IrStatement>,
    },
    Break,
    Continue,
    Throw(IrExpression),
    Try {
        block: Vec<IrStatement>,
        catch_binding: Option<String>,
        catch_block: Option<Vec<IrStatement>>,
        finally_block: Option<Vec<IrStatement>>,
    },
    Block(Vec<IrStatement>),
}

impl IrStatement {
    /// The declared name, for declaration statements.
    #[must_use]
    pub fn decl_name(&self) -> Option<&str> {
        match self {
            IrStatement::VarDecl { name, .. }
            | IrStatement::TypeAlias { name, .. }
            | IrStatement::Enum { name, .. } => Some(name),
            IrStatement::Function(f) => Some(&f.name),
            IrStatement::Class(c) => Some(&c.name),
            IrStatement::Interface(i) => Some(&i.name),
            _ => None,
        }
    }

    /// Whether this statement is top-level executable code (not a
    /// declaration), which disqualifies a module from being a static
    /// container.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        !matches!(
            self,
            IrStatement::Function(_)
                | IrStatement::Class(_)
                | IrStatement::Interface(_)
                | IrStatement::TypeAlias { .. }
                | IrStatement::Enum { .. }
                | IrStatement::VarDecl { .. }
        )
    }
}
