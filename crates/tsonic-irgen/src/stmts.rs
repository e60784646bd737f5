//! Per-node statement converters.

use tsonic_common::diagnostics::codes;
use tsonic_binder::registry::ParamMode;
use tsonic_ir::expr::{IrExpression, IrExpressionKind, IrParam};
use tsonic_ir::stmt::{
    IrClass, IrClassMember, IrEnumMember, IrFunction, IrInterface, IrInterfaceMember, IrProperty,
    IrStatement, IrTypeParam,
};
use tsonic_ir::types::{IrPrimitive, IrType};
use tsonic_surface::ast::{NodeId, NodeKind, TypeParam};

use crate::context::ProgramContext;
use crate::exprs::{convert_expression, type_of_type_node};

/// Convert one statement node. Imports are handled by the module builder
/// and return `None` here.
pub fn convert_statement(ctx: &mut ProgramContext<'_>, node: NodeId) -> Option<IrStatement> {
    let span = ctx.span_of(node);
    let kind = ctx.program.arena.kind(node).cloned()?;
    match kind {
        NodeKind::Import { .. } => None,
        NodeKind::Var {
            name,
            declared_type,
            init,
            is_const,
            exported,
        } => {
            let declared = declared_type.map(|t| type_of_type_node(ctx, t));
            let init = init.map(|i| convert_expression(ctx, i, declared.as_ref()));
            let local_ty = declared
                .clone()
                .or_else(|| init.as_ref().map(IrExpression::ty));
            if let Some(ty) = local_ty {
                ctx.record_local(&name, ty);
            }
            Some(IrStatement::VarDecl {
                decl: ctx.binder.decl_of_node(node),
                name,
                declared_type: declared,
                init,
                is_const,
                exported,
                span: Some(span),
            })
        }
        NodeKind::Function {
            name,
            type_params,
            params,
            return_type,
            body,
            is_generator,
            is_async,
            exported,
        } => Some(IrStatement::Function(convert_function(
            ctx,
            node,
            &name,
            &type_params,
            &params,
            return_type,
            &body,
            is_generator,
            is_async,
            false,
            exported,
        ))),
        NodeKind::Class {
            name,
            type_params,
            extends,
            implements,
            members,
            exported,
        } => Some(convert_class(
            ctx, node, &name, &type_params, extends, &implements, &members, exported,
        )),
        NodeKind::Interface {
            name,
            type_params,
            extends,
            members,
            exported,
        } => Some(convert_interface(
            ctx, node, &name, &type_params, &extends, &members, exported,
        )),
        NodeKind::TypeAlias {
            name,
            type_params,
            body,
            exported,
        } => {
            let body_ty = match ctx.binder.type_syntax_of_node(body) {
                Some(id) => ctx.types.type_from_syntax(id),
                None => IrType::Unknown,
            };
            Some(IrStatement::TypeAlias {
                name,
                type_params: type_params.iter().map(|tp| tp.name.clone()).collect(),
                body: body_ty,
                exported,
                span: Some(span),
            })
        }
        NodeKind::Enum {
            name,
            members,
            exported,
        } => Some(IrStatement::Enum {
            name,
            members: members
                .iter()
                .map(|m| IrEnumMember {
                    name: m.name.clone(),
                    init: m.init.map(|i| convert_expression(ctx, i, Some(&IrType::INT))),
                })
                .collect(),
            exported,
            span: Some(span),
        }),
        NodeKind::Block(stmts) => {
            ctx.enter_scope();
            let converted = convert_block(ctx, &stmts);
            ctx.exit_scope();
            Some(IrStatement::Block(converted))
        }
        NodeKind::ExprStmt(expr) => Some(IrStatement::Expr(convert_expression(ctx, expr, None))),
        NodeKind::Return(expr) => {
            let expected = ctx.current_return_type.clone();
            Some(IrStatement::Return(
                expr.map(|e| convert_expression(ctx, e, expected.as_ref())),
            ))
        }
        NodeKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let cond = convert_expression(ctx, cond, Some(&IrType::BOOLEAN));
            let then_branch = convert_branch(ctx, then_branch);
            let else_branch = else_branch.map(|e| convert_branch(ctx, e));
            Some(IrStatement::If {
                cond,
                then_branch,
                else_branch,
            })
        }
        NodeKind::While { cond, body } => Some(IrStatement::While {
            cond: convert_expression(ctx, cond, Some(&IrType::BOOLEAN)),
            body: convert_branch(ctx, body),
        }),
        NodeKind::For {
            init,
            cond,
            update,
            body,
        } => {
            ctx.enter_scope();
            let init = init.and_then(|i| convert_statement(ctx, i)).map(Box::new);
            let cond = cond.map(|c| convert_expression(ctx, c, Some(&IrType::BOOLEAN)));
            let update = update.map(|u| convert_expression(ctx, u, None));
            let body = convert_branch(ctx, body);
            ctx.exit_scope();
            Some(IrStatement::For {
                init,
                cond,
                update,
                body,
            })
        }
        NodeKind::ForOf {
            binding,
            iterable,
            body,
        } => {
            let iterable = convert_expression(ctx, iterable, None);
            let binding_type = element_type_of(&iterable.ty());
            ctx.enter_scope();
            if let Some(ty) = &binding_type {
                ctx.record_local(&binding, ty.clone());
            }
            let body = convert_branch(ctx, body);
            ctx.exit_scope();
            Some(IrStatement::ForOf {
                binding,
                binding_type,
                iterable,
                body,
            })
        }
        NodeKind::Break => Some(IrStatement::Break),
        NodeKind::Continue => Some(IrStatement::Continue),
        NodeKind::Throw(expr) => Some(IrStatement::Throw(convert_expression(ctx, expr, None))),
        NodeKind::Try {
            block,
            catch_binding,
            catch_block,
            finally_block,
        } => Some(IrStatement::Try {
            block: convert_branch(ctx, block),
            catch_binding,
            catch_block: catch_block.map(|b| convert_branch(ctx, b)),
            finally_block: finally_block.map(|b| convert_branch(ctx, b)),
        }),
        // An expression in statement position.
        _ => Some(IrStatement::Expr(convert_expression(ctx, node, None))),
    }
}

/// Convert a branch node (a block or a single statement) to a statement
/// list.
fn convert_branch(ctx: &mut ProgramContext<'_>, node: NodeId) -> Vec<IrStatement> {
    match ctx.program.arena.kind(node) {
        Some(NodeKind::Block(stmts)) => {
            let stmts = stmts.clone();
            ctx.enter_scope();
            let converted = convert_block(ctx, &stmts);
            ctx.exit_scope();
            converted
        }
        _ => convert_statement(ctx, node).into_iter().collect(),
    }
}

fn convert_block(ctx: &mut ProgramContext<'_>, stmts: &[NodeId]) -> Vec<IrStatement> {
    stmts
        .iter()
        .filter_map(|s| convert_statement(ctx, *s))
        .collect()
}

/// The element type an iteration over `ty` produces.
fn element_type_of(ty: &IrType) -> Option<IrType> {
    match ty {
        IrType::Array { element, .. } => Some(element.as_ref().clone()),
        IrType::Primitive(IrPrimitive::String) => Some(IrType::CHAR),
        IrType::Dictionary { key, value } => Some(IrType::Tuple(vec![
            key.as_ref().clone(),
            value.as_ref().clone(),
        ])),
        _ => None,
    }
}

fn convert_type_params(ctx: &mut ProgramContext<'_>, type_params: &[TypeParam]) -> Vec<IrTypeParam> {
    type_params
        .iter()
        .map(|tp| IrTypeParam {
            name: tp.name.clone(),
            constraint: tp.constraint.map(|c| type_of_type_node(ctx, c)),
        })
        .collect()
}

/// Build the IR parameter list from the surface parameter nodes plus the
/// binder's normalized modes.
fn convert_params(ctx: &mut ProgramContext<'_>, params: &[NodeId]) -> Vec<IrParam> {
    let mut converted = Vec::with_capacity(params.len());
    for param in params {
        let Some(NodeKind::Param {
            name,
            optional,
            default,
            ..
        }) = ctx.program.arena.kind(*param).cloned()
        else {
            continue;
        };
        let (ty, mode) = match ctx
            .binder
            .decl_of_node(*param)
            .and_then(|d| ctx.binder.decl(d))
        {
            Some(info) => {
                let ty = info.type_syntax.map(|t| ctx.types.type_from_syntax(t));
                // The declared mode lives on the signature; recover it
                // from the captured param registration.
                let mode = param_mode_of(ctx, *param);
                (ty, mode)
            }
            None => (None, ParamMode::Value),
        };
        if let Some(ty) = &ty {
            ctx.record_local(&name, ty.clone());
        }
        let default = default.map(|d| Box::new(convert_expression(ctx, d, ty.as_ref())));
        converted.push(IrParam {
            name,
            ty,
            mode,
            optional,
            default,
        });
    }
    converted
}

fn param_mode_of(ctx: &ProgramContext<'_>, param_node: NodeId) -> ParamMode {
    // Marker wrappers were unwrapped at registration; the surface
    // annotation tells us which mode was declared.
    if let Some(NodeKind::Param {
        type_annotation: Some(annotation),
        ..
    }) = ctx.program.arena.kind(param_node)
        && let Some(NodeKind::TypeRef { name, type_args }) = ctx.program.arena.kind(*annotation)
        && type_args.len() == 1
    {
        return match name.as_str() {
            "ref" => ParamMode::Ref,
            "out" => ParamMode::Out,
            "inref" => ParamMode::In,
            _ => ParamMode::Value,
        };
    }
    ParamMode::Value
}

fn convert_function(
    ctx: &mut ProgramContext<'_>,
    node: NodeId,
    name: &str,
    type_params: &[TypeParam],
    params: &[NodeId],
    return_type: Option<NodeId>,
    body: &[NodeId],
    is_generator: bool,
    is_async: bool,
    is_static: bool,
    exported: bool,
) -> IrFunction {
    let span = ctx.span_of(node);
    if let Some(sig) = ctx.binder.signature_of_node(node) {
        ctx.types.check_parameter_annotations(sig, ctx.file, span);
    }
    let ir_type_params = convert_type_params(ctx, type_params);
    ctx.enter_scope();
    let ir_params = convert_params(ctx, params);
    let declared_return = return_type.map(|r| type_of_type_node(ctx, r));
    let prev_return = ctx.current_return_type.take();
    ctx.current_return_type = declared_return.clone();
    let body = convert_block(ctx, body);
    ctx.current_return_type = prev_return;
    ctx.exit_scope();
    IrFunction {
        name: name.to_string(),
        type_params: ir_type_params,
        params: ir_params,
        return_type: declared_return,
        body,
        is_generator,
        is_async,
        is_static,
        exported,
        requires_specialization: false,
        decl: ctx.binder.decl_of_node(node),
        span: Some(span),
    }
}

fn convert_class(
    ctx: &mut ProgramContext<'_>,
    node: NodeId,
    name: &str,
    type_params: &[TypeParam],
    extends: Option<NodeId>,
    implements: &[NodeId],
    members: &[NodeId],
    exported: bool,
) -> IrStatement {
    let span = ctx.span_of(node);
    let ir_type_params = convert_type_params(ctx, type_params);
    let extends = extends.map(|e| type_of_type_node(ctx, e));
    let implements: Vec<IrType> = implements
        .iter()
        .map(|i| {
            let ty = type_of_type_node(ctx, *i);
            // Interfaces are nominalized to classes; implementing a
            // user-defined one is not representable.
            if ctx.types.is_source_interface(&ty) {
                let interface_name = ty.display_name();
                ctx.error(
                    span,
                    codes::IMPLEMENTS_NOMINALIZED_INTERFACE,
                    &[name, &interface_name],
                );
            }
            ty
        })
        .collect();

    let mut ir_members = Vec::with_capacity(members.len());
    for member in members {
        let Some(kind) = ctx.program.arena.kind(*member).cloned() else {
            continue;
        };
        match kind {
            NodeKind::Property {
                name,
                type_annotation,
                optional,
                readonly,
                is_static,
                init,
            } => {
                let ty = type_annotation.map(|t| type_of_type_node(ctx, t));
                let init = init.map(|i| convert_expression(ctx, i, ty.as_ref()));
                ir_members.push(IrClassMember::Property(IrProperty {
                    name,
                    ty,
                    optional,
                    readonly,
                    is_static,
                    init,
                }));
            }
            NodeKind::Method {
                name,
                type_params,
                params,
                return_type,
                body,
                is_static,
                is_generator,
                is_async,
            } => {
                ir_members.push(IrClassMember::Method(convert_function(
                    ctx,
                    *member,
                    &name,
                    &type_params,
                    &params,
                    return_type,
                    &body,
                    is_generator,
                    is_async,
                    is_static,
                    false,
                )));
            }
            NodeKind::Constructor { params, body } => {
                ctx.enter_scope();
                let ir_params = convert_params(ctx, &params);
                let body = convert_block(ctx, &body);
                ctx.exit_scope();
                check_super_position(ctx, span, &body);
                ir_members.push(IrClassMember::Constructor {
                    params: ir_params,
                    body,
                });
            }
            _ => {}
        }
    }

    IrStatement::Class(IrClass {
        name: name.to_string(),
        type_params: ir_type_params,
        extends,
        implements,
        members: ir_members,
        exported,
        decl: ctx.binder.decl_of_node(node),
        span: Some(span),
    })
}

/// `super(...)` must be the first statement of a constructor body.
fn check_super_position(
    ctx: &mut ProgramContext<'_>,
    span: tsonic_common::span::Span,
    body: &[IrStatement],
) {
    for (index, stmt) in body.iter().enumerate() {
        if let IrStatement::Expr(expr) = stmt
            && let IrExpressionKind::Call(call) = &expr.kind
            && matches!(call.callee.kind, IrExpressionKind::Super)
            && index > 0
        {
            ctx.error(span, codes::SUPER_NOT_FIRST, &[]);
        }
    }
}

fn convert_interface(
    ctx: &mut ProgramContext<'_>,
    node: NodeId,
    name: &str,
    type_params: &[TypeParam],
    extends: &[NodeId],
    members: &[NodeId],
    exported: bool,
) -> IrStatement {
    let span = ctx.span_of(node);
    let ir_type_params = convert_type_params(ctx, type_params);
    let extends = extends.iter().map(|e| type_of_type_node(ctx, *e)).collect();
    let mut ir_members = Vec::with_capacity(members.len());
    for member in members {
        let Some(kind) = ctx.program.arena.kind(*member).cloned() else {
            continue;
        };
        match kind {
            NodeKind::PropertySig {
                name,
                type_annotation,
                optional,
                readonly,
            } => {
                ir_members.push(IrInterfaceMember::Property {
                    name,
                    ty: type_of_type_node(ctx, type_annotation),
                    optional,
                    readonly,
                });
            }
            NodeKind::MethodSig {
                name,
                params,
                return_type,
                ..
            } => {
                ctx.enter_scope();
                let params = convert_params(ctx, &params);
                let return_type = return_type.map(|r| type_of_type_node(ctx, r));
                ctx.exit_scope();
                ir_members.push(IrInterfaceMember::Method {
                    name,
                    params,
                    return_type,
                });
            }
            _ => {}
        }
    }
    IrStatement::Interface(IrInterface {
        name: name.to_string(),
        type_params: ir_type_params,
        extends,
        members: ir_members,
        exported,
        is_constraint_adapter: false,
        decl: ctx.binder.decl_of_node(node),
        span: Some(span),
    })
}
