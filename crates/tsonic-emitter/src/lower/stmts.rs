//! IR statement and declaration → C# lowering.

use tsonic_ir::expr::{IrExpression, IrExpressionKind, IrParam};
use tsonic_ir::stmt::{
    IrClass, IrClassMember, IrEnumMember, IrFunction, IrInterface, IrInterfaceMember, IrStatement,
    IrTypeParam,
};
use tsonic_ir::types::IrType;

use crate::cs::{
    CsArg, CsDecl, CsExpr, CsInterfaceMember, CsMember, CsModifier, CsParam, CsParamModifier,
    CsStmt, CsType, CsWhereClause,
};
use crate::emit_context::EmitContext;
use crate::lower::exprs::lower_expr;
use crate::lower::types::{lower_optional_type, lower_type};
use tsonic_binder::registry::ParamMode;

/// Lower a statement list.
pub fn lower_body(ctx: &mut EmitContext<'_>, stmts: &[IrStatement]) -> Vec<CsStmt> {
    let mut lowered = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        lowered.extend(lower_stmt(ctx, stmt));
    }
    lowered
}

/// Lower one statement; some forms expand to several target statements.
pub fn lower_stmt(ctx: &mut EmitContext<'_>, stmt: &IrStatement) -> Vec<CsStmt> {
    match stmt {
        IrStatement::VarDecl {
            name,
            declared_type,
            init,
            ..
        } => {
            // A generator's `const x = yield e` threads through the
            // exchange object.
            if let (Some(exchange), Some(init_expr)) = (ctx.generator_exchange.clone(), init)
                && let IrExpressionKind::Yield {
                    expr: yielded,
                    delegate: false,
                } = &init_expr.kind
            {
                return lower_yield_binding(ctx, &exchange, name, declared_type.as_ref(), yielded.as_deref());
            }
            let ty = declared_type.as_ref().map(|t| lower_type(ctx, t));
            vec![CsStmt::LocalDecl {
                ty,
                name: name.clone(),
                init: init.as_ref().map(|i| lower_expr(ctx, i)),
            }]
        }
        IrStatement::Expr(expr) => {
            if let Some(exchange) = ctx.generator_exchange.clone()
                && let IrExpressionKind::Yield { expr: yielded, delegate } = &expr.kind
            {
                if *delegate {
                    let temp = ctx.next_temp();
                    let iterable = yielded
                        .as_deref()
                        .map_or(CsExpr::Default(None), |y| lower_expr(ctx, y));
                    return vec![CsStmt::Foreach {
                        ty: None,
                        binding: temp.clone(),
                        iterable,
                        body: vec![CsStmt::YieldReturn(CsExpr::Ident(temp))],
                    }];
                }
                return vec![CsStmt::YieldReturn(new_exchange(ctx, &exchange, yielded.as_deref()))];
            }
            vec![CsStmt::Expr(lower_expr(ctx, expr))]
        }
        IrStatement::Return(expr) => {
            if ctx.generator_exchange.is_some() {
                let mut stmts = Vec::new();
                if let (Some(setter), Some(expr)) =
                    (ctx.generator_result_setter.clone(), expr.as_ref())
                {
                    let value = lower_expr(ctx, expr);
                    stmts.push(CsStmt::Expr(CsExpr::Invocation {
                        target: Box::new(CsExpr::Ident(setter)),
                        type_args: Vec::new(),
                        args: vec![CsArg::plain(value)],
                    }));
                }
                stmts.push(CsStmt::YieldBreak);
                return stmts;
            }
            vec![CsStmt::Return(expr.as_ref().map(|e| lower_expr(ctx, e)))]
        }
        IrStatement::If {
            cond,
            then_branch,
            else_branch,
        } => vec![CsStmt::If {
            cond: lower_expr(ctx, cond),
            then_branch: lower_body(ctx, then_branch),
            else_branch: else_branch.as_ref().map(|e| lower_body(ctx, e)),
        }],
        IrStatement::While { cond, body } => vec![CsStmt::While {
            cond: lower_expr(ctx, cond),
            body: lower_body(ctx, body),
        }],
        IrStatement::For {
            init,
            cond,
            update,
            body,
        } => {
            let init = init
                .as_ref()
                .and_then(|i| lower_stmt(ctx, i).into_iter().next())
                .map(Box::new);
            vec![CsStmt::For {
                init,
                cond: cond.as_ref().map(|c| lower_expr(ctx, c)),
                update: update.as_ref().map(|u| lower_expr(ctx, u)),
                body: lower_body(ctx, body),
            }]
        }
        IrStatement::ForOf {
            binding,
            binding_type,
            iterable,
            body,
        } => vec![CsStmt::Foreach {
            ty: binding_type.as_ref().map(|t| lower_type(ctx, t)),
            binding: binding.clone(),
            iterable: lower_expr(ctx, iterable),
            body: lower_body(ctx, body),
        }],
        IrStatement::Break => vec![CsStmt::Break],
        IrStatement::Continue => vec![CsStmt::Continue],
        IrStatement::Throw(expr) => vec![CsStmt::Throw(Some(lower_expr(ctx, expr)))],
        IrStatement::Try {
            block,
            catch_binding,
            catch_block,
            finally_block,
        } => {
            ctx.add_using("System");
            let catches = catch_block
                .as_ref()
                .map(|block| {
                    vec![crate::cs::CsCatch {
                        ty: Some(CsType::named("Exception")),
                        binding: catch_binding.clone(),
                        block: lower_body(ctx, block),
                    }]
                })
                .unwrap_or_default();
            vec![CsStmt::Try {
                block: lower_body(ctx, block),
                catches,
                finally_block: finally_block.as_ref().map(|f| lower_body(ctx, f)),
            }]
        }
        IrStatement::Block(stmts) => vec![CsStmt::Block(lower_body(ctx, stmts))],
        // Declarations inside bodies have no C# local form here; module
        // assembly handles top-level declarations.
        IrStatement::Function(f) => vec![CsStmt::Comment(format!(
            "local function '{}' is not representable",
            f.name
        ))],
        IrStatement::Class(c) => vec![CsStmt::Comment(format!(
            "local class '{}' is not representable",
            c.name
        ))],
        IrStatement::Interface(i) => vec![CsStmt::Comment(format!(
            "local interface '{}' is not representable",
            i.name
        ))],
        IrStatement::TypeAlias { name, .. } => {
            vec![CsStmt::Comment(format!("type alias '{name}'"))]
        }
        IrStatement::Enum { name, .. } => {
            vec![CsStmt::Comment(format!("local enum '{name}'"))]
        }
    }
}

fn new_exchange(
    ctx: &mut EmitContext<'_>,
    exchange: &str,
    yielded: Option<&IrExpression>,
) -> CsExpr {
    let initializer = yielded
        .map(|y| vec![("Value".to_string(), lower_expr(ctx, y))])
        .unwrap_or_default();
    CsExpr::ObjectCreation {
        ty: CsType::named(exchange),
        args: Vec::new(),
        initializer,
    }
}

/// `const got = yield e` → allocate the exchange, yield it, read the
/// input the driver stored into it.
fn lower_yield_binding(
    ctx: &mut EmitContext<'_>,
    exchange: &str,
    name: &str,
    declared: Option<&IrType>,
    yielded: Option<&IrExpression>,
) -> Vec<CsStmt> {
    let temp = ctx.next_temp();
    let creation = new_exchange(ctx, exchange, yielded);
    let ty = declared.map(|t| lower_type(ctx, t));
    vec![
        CsStmt::LocalDecl {
            ty: Some(CsType::named(exchange)),
            name: temp.clone(),
            init: Some(creation),
        },
        CsStmt::YieldReturn(CsExpr::Ident(temp.clone())),
        CsStmt::LocalDecl {
            ty,
            name: name.to_string(),
            init: Some(CsExpr::Binary {
                op: crate::cs::CsBinaryOp::Coalesce,
                left: Box::new(CsExpr::Member {
                    target: Box::new(CsExpr::Ident(temp)),
                    name: "Input".into(),
                    conditional: false,
                }),
                right: Box::new(CsExpr::Default(None)),
            }),
        },
    ]
}

// =============================================================================
// Declarations
// =============================================================================

pub fn lower_params(ctx: &mut EmitContext<'_>, params: &[IrParam]) -> Vec<CsParam> {
    params
        .iter()
        .map(|p| {
            let base = p.ty.clone().unwrap_or(IrType::Unknown);
            let ty = if p.optional {
                lower_optional_type(ctx, &base)
            } else {
                lower_type(ctx, &base)
            };
            let default = match &p.default {
                Some(default) => Some(lower_expr(ctx, default)),
                None if p.optional => Some(CsExpr::Default(None)),
                None => None,
            };
            CsParam {
                modifier: match p.mode {
                    ParamMode::Value => None,
                    ParamMode::Ref => Some(CsParamModifier::Ref),
                    ParamMode::Out => Some(CsParamModifier::Out),
                    ParamMode::In => Some(CsParamModifier::In),
                },
                ty,
                name: p.name.clone(),
                default,
            }
        })
        .collect()
}

pub fn where_clauses_of(
    ctx: &mut EmitContext<'_>,
    type_params: &[IrTypeParam],
) -> Vec<CsWhereClause> {
    type_params
        .iter()
        .filter_map(|tp| {
            tp.constraint.as_ref().map(|constraint| CsWhereClause {
                param: tp.name.clone(),
                bounds: vec![lower_type(ctx, constraint)],
            })
        })
        .collect()
}

/// Lower a function/method declaration to a class member.
pub fn lower_function_member(ctx: &mut EmitContext<'_>, function: &IrFunction) -> CsMember {
    let mut modifiers = vec![CsModifier::Public];
    if ctx.is_static || function.is_static {
        modifiers.push(CsModifier::Static);
    }
    if function.is_async {
        modifiers.push(CsModifier::Async);
    }
    let return_type = match &function.return_type {
        Some(ty) => lower_type(ctx, ty),
        None => CsType::Void,
    };
    let params = lower_params(ctx, &function.params);
    let where_clauses = where_clauses_of(ctx, &function.type_params);
    let body = lower_body(ctx, &function.body);
    CsMember::Method {
        modifiers,
        type_params: function
            .type_params
            .iter()
            .map(|tp| tp.name.clone())
            .collect(),
        where_clauses,
        return_type,
        name: function.name.clone(),
        params,
        body: Some(body),
    }
}

/// Lower a class declaration.
pub fn lower_class_decl(ctx: &mut EmitContext<'_>, class: &IrClass) -> CsDecl {
    let mut bases = Vec::new();
    if let Some(extends) = &class.extends {
        bases.push(lower_type(ctx, extends));
    }
    for implemented in &class.implements {
        bases.push(lower_type(ctx, implemented));
    }
    let where_clauses = where_clauses_of(ctx, &class.type_params);
    let mut members = Vec::with_capacity(class.members.len());
    for member in &class.members {
        match member {
            IrClassMember::Property(p) => {
                let base = p.ty.clone().unwrap_or(IrType::Unknown);
                let ty = if p.optional {
                    lower_optional_type(ctx, &base)
                } else {
                    lower_type(ctx, &base)
                };
                let mut modifiers = vec![CsModifier::Public];
                if p.is_static {
                    modifiers.push(CsModifier::Static);
                }
                members.push(CsMember::AutoProperty {
                    modifiers,
                    ty,
                    name: p.name.clone(),
                    get_only: p.readonly,
                    init: p.init.as_ref().map(|i| lower_expr(ctx, i)),
                });
            }
            IrClassMember::Method(m) => {
                let was_static = ctx.is_static;
                ctx.is_static = false;
                members.push(lower_function_member(ctx, m));
                ctx.is_static = was_static;
            }
            IrClassMember::Constructor { params, body } => {
                let params = lower_params(ctx, params);
                // `super(...)` in first position becomes the base
                // initializer.
                let (base_args, rest) = split_base_initializer(body);
                let body = lower_body(ctx, rest);
                let base_args = base_args.map(|args| {
                    args.iter()
                        .map(|a| CsArg::plain(lower_expr(ctx, a)))
                        .collect()
                });
                members.push(CsMember::Constructor {
                    modifiers: vec![CsModifier::Public],
                    name: class.name.clone(),
                    params,
                    base_args,
                    body,
                });
            }
        }
    }
    CsDecl::Class {
        modifiers: vec![CsModifier::Public],
        name: class.name.clone(),
        type_params: class
            .type_params
            .iter()
            .map(|tp| tp.name.clone())
            .collect(),
        where_clauses,
        bases,
        members,
    }
}

/// Split off a first-statement `super(...)` call.
fn split_base_initializer(body: &[IrStatement]) -> (Option<&Vec<IrExpression>>, &[IrStatement]) {
    if let Some(IrStatement::Expr(expr)) = body.first()
        && let IrExpressionKind::Call(call) = &expr.kind
        && matches!(call.callee.kind, IrExpressionKind::Super)
    {
        return (Some(&call.args), &body[1..]);
    }
    (None, body)
}

/// Lower an interface. User interfaces nominalize to classes with
/// auto-properties; synthesized constraint adapters stay interfaces.
pub fn lower_interface_decl(ctx: &mut EmitContext<'_>, interface: &IrInterface) -> CsDecl {
    if interface.is_constraint_adapter {
        let members = interface
            .members
            .iter()
            .filter_map(|m| match m {
                IrInterfaceMember::Property {
                    name,
                    ty,
                    optional,
                    readonly,
                } => {
                    let lowered = if *optional {
                        lower_optional_type(ctx, ty)
                    } else {
                        lower_type(ctx, ty)
                    };
                    Some(CsInterfaceMember::Property {
                        ty: lowered,
                        name: name.clone(),
                        get_only: *readonly,
                    })
                }
                IrInterfaceMember::Method { .. } => None,
            })
            .collect();
        return CsDecl::Interface {
            modifiers: vec![CsModifier::Public],
            name: interface.name.clone(),
            type_params: interface
                .type_params
                .iter()
                .map(|tp| tp.name.clone())
                .collect(),
            members,
        };
    }

    let mut members = Vec::with_capacity(interface.members.len());
    for member in &interface.members {
        match member {
            IrInterfaceMember::Property {
                name,
                ty,
                optional,
                readonly,
            } => {
                let lowered = if *optional {
                    lower_optional_type(ctx, ty)
                } else {
                    lower_type(ctx, ty)
                };
                members.push(CsMember::AutoProperty {
                    modifiers: vec![CsModifier::Public],
                    ty: lowered,
                    name: name.clone(),
                    get_only: *readonly,
                    init: None,
                });
            }
            IrInterfaceMember::Method {
                name,
                params,
                return_type,
            } => {
                ctx.add_using("System");
                let params = lower_params(ctx, params);
                let return_type = match return_type {
                    Some(ty) => lower_type(ctx, ty),
                    None => CsType::Void,
                };
                members.push(CsMember::Method {
                    modifiers: vec![CsModifier::Public, CsModifier::Virtual],
                    type_params: Vec::new(),
                    where_clauses: Vec::new(),
                    return_type,
                    name: name.clone(),
                    params,
                    body: Some(vec![CsStmt::Throw(Some(CsExpr::ObjectCreation {
                        ty: CsType::named("NotImplementedException"),
                        args: Vec::new(),
                        initializer: Vec::new(),
                    }))]),
                });
            }
        }
    }
    CsDecl::Class {
        modifiers: vec![CsModifier::Public],
        name: interface.name.clone(),
        type_params: interface
            .type_params
            .iter()
            .map(|tp| tp.name.clone())
            .collect(),
        where_clauses: Vec::new(),
        bases: interface.extends.iter().map(|e| lower_type(ctx, e)).collect(),
        members,
    }
}

/// Lower a type alias: object bodies become sealed `__Alias` classes,
/// anything else is recorded as a comment only.
pub fn lower_type_alias_decl(
    ctx: &mut EmitContext<'_>,
    name: &str,
    type_params: &[String],
    body: &IrType,
) -> CsDecl {
    match body {
        IrType::Object(props) => CsDecl::Class {
            modifiers: vec![CsModifier::Public, CsModifier::Sealed],
            name: format!("{name}__Alias"),
            type_params: type_params.to_vec(),
            where_clauses: Vec::new(),
            bases: Vec::new(),
            members: props
                .iter()
                .map(|p| {
                    let ty = if p.optional {
                        lower_optional_type(ctx, &p.ty)
                    } else {
                        lower_type(ctx, &p.ty)
                    };
                    CsMember::AutoProperty {
                        modifiers: vec![CsModifier::Public],
                        ty,
                        name: p.name.clone(),
                        get_only: p.readonly,
                        init: None,
                    }
                })
                .collect(),
        },
        other => CsDecl::Comment(format!("type alias {name} = {}", other.display_name())),
    }
}

/// Lower an enum declaration.
pub fn lower_enum_decl(ctx: &mut EmitContext<'_>, name: &str, members: &[IrEnumMember]) -> CsDecl {
    CsDecl::Enum {
        modifiers: vec![CsModifier::Public],
        name: name.to_string(),
        members: members
            .iter()
            .map(|m| {
                (
                    m.name.clone(),
                    m.init.as_ref().map(|i| lower_expr(ctx, i)),
                )
            })
            .collect(),
    }
}
