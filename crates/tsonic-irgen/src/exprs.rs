//! Per-node expression converters.
//!
//! Conversion fixes the `inferred_type` of every expression node. Typing
//! is deterministic and local: literals type from their lexeme, operators
//! from their operands, calls from the signature oracle. On user error a
//! converter records a diagnostic and substitutes a poisoned value; it
//! never throws.

use tsonic_common::diagnostics::codes;
use tsonic_common::numeric::{NumericIntent, classify_numeric_lexeme, parse_numeric_literal_value};
use tsonic_common::span::Span;
use tsonic_binder::registry::ParamMode;
use tsonic_ir::expr::{
    IrAssignOp, IrBinaryOp, IrCall, IrExpression, IrExpressionKind, IrLambdaBody, IrLiteral,
    IrObjectProp, IrParam, IrUnaryOp,
};
use tsonic_ir::types::{ArrayOrigin, IrPrimitive, IrType, ObjectProperty};
use tsonic_surface::ast::{
    ArrowBody, AssignOp, BinaryOp, NodeId, NodeKind, ObjectProp, PropKey, UnaryOp,
};
use tsonic_types::CallQuery;

use crate::context::ProgramContext;
use crate::stmts::convert_statement;

/// Convert one expression node with an optional expected type.
pub fn convert_expression(
    ctx: &mut ProgramContext<'_>,
    node: NodeId,
    expected: Option<&IrType>,
) -> IrExpression {
    let span = ctx.span_of(node);
    let Some(kind) = ctx.program.arena.kind(node).cloned() else {
        ctx.error(span, codes::INTERNAL_ERROR, &["missing expression node"]);
        return poisoned(span);
    };
    match kind {
        NodeKind::StringLit(value) => IrExpression::typed(
            IrExpressionKind::Literal(IrLiteral::String(value)),
            IrType::STRING,
        )
        .with_span(span),
        NodeKind::NumberLit { lexeme } => convert_number_literal(ctx, span, &lexeme, expected),
        NodeKind::BoolLit(value) => IrExpression::typed(
            IrExpressionKind::Literal(IrLiteral::Boolean(value)),
            IrType::BOOLEAN,
        )
        .with_span(span),
        NodeKind::NullLit => {
            IrExpression::typed(IrExpressionKind::Literal(IrLiteral::Null), IrType::NULL)
                .with_span(span)
        }
        NodeKind::UndefinedLit => IrExpression::typed(
            IrExpressionKind::Literal(IrLiteral::Undefined),
            IrType::UNDEFINED,
        )
        .with_span(span),
        NodeKind::Ident(name) => convert_identifier(ctx, node, span, &name),
        NodeKind::Paren(inner) => convert_expression(ctx, inner, expected),
        NodeKind::PropertyAccess {
            object,
            name,
            optional,
        } => convert_member(ctx, span, object, &name, optional),
        NodeKind::ElementAccess { object, index } => convert_index(ctx, span, object, index),
        NodeKind::Binary { op, left, right } => {
            convert_binary(ctx, span, op, left, right, expected)
        }
        NodeKind::Unary { op, operand } => convert_unary(ctx, span, op, operand),
        NodeKind::Assign { op, target, value } => convert_assign(ctx, span, op, target, value),
        NodeKind::Conditional {
            cond,
            when_true,
            when_false,
        } => {
            let cond = convert_expression(ctx, cond, Some(&IrType::BOOLEAN));
            let when_true = convert_expression(ctx, when_true, expected);
            let when_false = convert_expression(ctx, when_false, expected);
            let ty = IrType::union(vec![when_true.ty(), when_false.ty()]);
            IrExpression::typed(
                IrExpressionKind::Conditional {
                    cond: Box::new(cond),
                    when_true: Box::new(when_true),
                    when_false: Box::new(when_false),
                },
                ty,
            )
            .with_span(span)
        }
        NodeKind::ArrayLit(items) => convert_array_literal(ctx, span, &items, expected),
        NodeKind::ObjectLit(props) => convert_object_literal(ctx, span, &props, expected),
        NodeKind::Arrow {
            params,
            return_type,
            body,
            is_async,
        } => convert_lambda(ctx, span, &params, return_type, &body, is_async, expected),
        NodeKind::Call {
            callee,
            type_args,
            args,
        } => convert_call(ctx, node, span, callee, &type_args, &args, false, expected),
        NodeKind::New {
            callee,
            type_args,
            args,
        } => convert_call(ctx, node, span, callee, &type_args, &args, true, expected),
        NodeKind::As { expr, target } => {
            let inner = convert_expression(ctx, expr, None);
            let target_ty = type_of_type_node(ctx, target);
            IrExpression::typed(
                IrExpressionKind::Cast {
                    expr: Box::new(inner),
                    target: target_ty.clone(),
                },
                target_ty,
            )
            .with_span(span)
        }
        NodeKind::Yield { expr, delegate } => {
            let inner = expr.map(|e| Box::new(convert_expression(ctx, e, None)));
            IrExpression::new(IrExpressionKind::Yield {
                expr: inner,
                delegate,
            })
            .with_span(span)
        }
        NodeKind::Await(inner) => {
            let inner = convert_expression(ctx, inner, None);
            let ty = match inner.ty() {
                IrType::Reference { ref name, ref type_args, .. }
                    if name == "Promise" && type_args.len() == 1 =>
                {
                    type_args[0].clone()
                }
                other => other,
            };
            IrExpression::typed(IrExpressionKind::Await(Box::new(inner)), ty).with_span(span)
        }
        _ => {
            ctx.error(span, codes::INTERNAL_ERROR, &["expression node expected"]);
            poisoned(span)
        }
    }
}

fn poisoned(span: Span) -> IrExpression {
    IrExpression::typed(IrExpressionKind::Literal(IrLiteral::Undefined), IrType::Unknown)
        .with_span(span)
}

/// Convert a type node appearing in expression position (`as` targets,
/// explicit type arguments). The syntax was captured during binding.
pub fn type_of_type_node(ctx: &mut ProgramContext<'_>, node: NodeId) -> IrType {
    match ctx.binder.type_syntax_of_node(node) {
        Some(id) => ctx.types.type_from_syntax(id),
        None => {
            let span = ctx.span_of(node);
            ctx.error(span, codes::INTERNAL_ERROR, &["uncaptured type syntax"]);
            IrType::Unknown
        }
    }
}

fn convert_number_literal(
    ctx: &mut ProgramContext<'_>,
    span: Span,
    lexeme: &str,
    expected: Option<&IrType>,
) -> IrExpression {
    let Some(value) = parse_numeric_literal_value(lexeme) else {
        ctx.error(span, codes::INTERNAL_ERROR, &["unparseable numeric literal"]);
        return poisoned(span);
    };
    let intent = classify_numeric_lexeme(lexeme).unwrap_or(NumericIntent::Double);
    // A numeric literal is `number` by default; a contextual `int`
    // re-labels an Int32-intent literal, and never a Double-intent one.
    let ty = match (expected, intent) {
        (Some(IrType::Primitive(IrPrimitive::Int)), NumericIntent::Int32) => IrType::INT,
        _ => IrType::NUMBER,
    };
    IrExpression::typed(
        IrExpressionKind::Literal(IrLiteral::Number {
            lexeme: lexeme.to_string(),
            value,
            intent,
        }),
        ty,
    )
    .with_span(span)
}

fn convert_identifier(
    ctx: &mut ProgramContext<'_>,
    node: NodeId,
    span: Span,
    name: &str,
) -> IrExpression {
    if name == "this" {
        return IrExpression::new(IrExpressionKind::This).with_span(span);
    }
    if name == "super" {
        return IrExpression::new(IrExpressionKind::Super).with_span(span);
    }
    let decl = ctx.binder.resolve_identifier(node);
    let mut ty = decl.map_or(IrType::Unknown, |d| ctx.types.type_of_decl(d));
    if ty.is_unknown()
        && let Some(local) = ctx.local_type(name)
    {
        ty = local.clone();
    }
    IrExpression::typed(
        IrExpressionKind::Ident {
            name: name.to_string(),
            decl,
        },
        ty,
    )
    .with_span(span)
}

fn convert_member(
    ctx: &mut ProgramContext<'_>,
    span: Span,
    object: NodeId,
    name: &str,
    optional: bool,
) -> IrExpression {
    let object = convert_expression(ctx, object, None);
    let receiver = object.ty();
    let member_ty = ctx.types.type_of_member(&receiver, name);
    let member = ctx.types.source_member(&receiver, name);
    IrExpression::typed(
        IrExpressionKind::Member {
            object: Box::new(object),
            name: name.to_string(),
            member,
            optional,
        },
        member_ty,
    )
    .with_span(span)
}

fn convert_index(
    ctx: &mut ProgramContext<'_>,
    span: Span,
    object: NodeId,
    index: NodeId,
) -> IrExpression {
    let object = convert_expression(ctx, object, None);
    let index = convert_expression(ctx, index, Some(&IrType::INT));
    let ty = match object.ty() {
        IrType::Array { element, .. } => *element,
        IrType::Primitive(IrPrimitive::String) => IrType::CHAR,
        IrType::Dictionary { value, .. } => *value,
        IrType::Tuple(elements) => match &index.kind {
            IrExpressionKind::Literal(IrLiteral::Number { value, .. }) => elements
                .get(*value as usize)
                .cloned()
                .unwrap_or(IrType::Unknown),
            _ => IrType::union(elements),
        },
        _ => IrType::Unknown,
    };
    IrExpression::typed(
        IrExpressionKind::Index {
            object: Box::new(object),
            index: Box::new(index),
        },
        ty,
    )
    .with_span(span)
}

fn convert_binary(
    ctx: &mut ProgramContext<'_>,
    span: Span,
    op: BinaryOp,
    left: NodeId,
    right: NodeId,
    expected: Option<&IrType>,
) -> IrExpression {
    let ir_op = map_binary_op(op);
    let mut left = convert_expression(ctx, left, None);
    // `??` / `||` thread the expected type to the right-hand fallback.
    let rhs_expected = match ir_op {
        IrBinaryOp::Or | IrBinaryOp::Coalesce => expected.cloned().or_else(|| left.inferred_type.clone()),
        _ => None,
    };
    let mut right = convert_expression(ctx, right, rhs_expected.as_ref());
    // Arithmetic with an `int` sibling re-labels an Int32-intent literal
    // on the other side, keeping `int` arithmetic closed.
    if ir_op.is_arithmetic() {
        if left.ty().is_int() {
            relabel_int_literal(&mut right);
        } else if right.ty().is_int() {
            relabel_int_literal(&mut left);
        }
    }
    let ty = binary_result_type(ir_op, &left, &right);
    IrExpression::typed(
        IrExpressionKind::Binary {
            op: ir_op,
            left: Box::new(left),
            right: Box::new(right),
        },
        ty,
    )
    .with_span(span)
}

/// Operator result typing: comparisons and type tests yield `boolean`;
/// bitwise yields `int`; arithmetic yields `int` only over two ints and
/// otherwise widens to `number`; `+` with any string operand yields
/// `string`; logical operators propagate an operand type.
fn binary_result_type(op: IrBinaryOp, left: &IrExpression, right: &IrExpression) -> IrType {
    if op.is_comparison() {
        return IrType::BOOLEAN;
    }
    if op.is_bitwise() {
        return IrType::INT;
    }
    if op == IrBinaryOp::Add && (left.ty().is_string() || right.ty().is_string()) {
        return IrType::STRING;
    }
    if op.is_arithmetic() {
        return if left.ty().is_int() && right.ty().is_int() {
            IrType::INT
        } else {
            IrType::NUMBER
        };
    }
    match op {
        IrBinaryOp::And => right.ty(),
        IrBinaryOp::Or | IrBinaryOp::Coalesce => {
            IrType::union(vec![left.ty().non_null(), right.ty()])
        }
        _ => IrType::Unknown,
    }
}

/// Re-label an Int32-intent numeric literal as `int`.
fn relabel_int_literal(expr: &mut IrExpression) {
    if let IrExpressionKind::Literal(IrLiteral::Number { intent, .. }) = &expr.kind
        && *intent == NumericIntent::Int32
        && expr.ty().is_number()
    {
        expr.inferred_type = Some(IrType::INT);
    }
}

fn convert_unary(
    ctx: &mut ProgramContext<'_>,
    span: Span,
    op: UnaryOp,
    operand: NodeId,
) -> IrExpression {
    let ir_op = map_unary_op(op);
    let operand = convert_expression(ctx, operand, None);
    let ty = match ir_op {
        IrUnaryOp::Not => IrType::BOOLEAN,
        IrUnaryOp::BitNot => IrType::INT,
        IrUnaryOp::TypeOf => IrType::STRING,
        IrUnaryOp::Void => IrType::UNDEFINED,
        IrUnaryOp::Minus
        | IrUnaryOp::Plus
        | IrUnaryOp::PreIncrement
        | IrUnaryOp::PreDecrement
        | IrUnaryOp::PostIncrement
        | IrUnaryOp::PostDecrement => {
            if operand.ty().is_int() {
                IrType::INT
            } else {
                IrType::NUMBER
            }
        }
    };
    IrExpression::typed(
        IrExpressionKind::Unary {
            op: ir_op,
            operand: Box::new(operand),
        },
        ty,
    )
    .with_span(span)
}

fn convert_assign(
    ctx: &mut ProgramContext<'_>,
    span: Span,
    op: AssignOp,
    target: NodeId,
    value: NodeId,
) -> IrExpression {
    let target = convert_expression(ctx, target, None);
    // Assignment propagates the left-hand declared type to the right.
    let expected = target.inferred_type.clone();
    let value = convert_expression(ctx, value, expected.as_ref());
    let ty = target.ty();
    IrExpression::typed(
        IrExpressionKind::Assign {
            op: map_assign_op(op),
            target: Box::new(target),
            value: Box::new(value),
        },
        ty,
    )
    .with_span(span)
}

fn convert_array_literal(
    ctx: &mut ProgramContext<'_>,
    span: Span,
    items: &[NodeId],
    expected: Option<&IrType>,
) -> IrExpression {
    let element_expected = match expected {
        Some(IrType::Array { element, .. }) => Some(element.as_ref().clone()),
        _ => None,
    };
    let items: Vec<IrExpression> = items
        .iter()
        .map(|item| convert_expression(ctx, *item, element_expected.as_ref()))
        .collect();
    let element = element_expected.unwrap_or_else(|| {
        IrType::union(items.iter().map(IrExpression::ty).collect())
    });
    let element = if matches!(element, IrType::Never) {
        IrType::Unknown
    } else {
        element
    };
    IrExpression::typed(
        IrExpressionKind::ArrayLiteral(items),
        IrType::Array {
            element: Box::new(element),
            origin: ArrayOrigin::Inferred,
        },
    )
    .with_span(span)
}

fn convert_object_literal(
    ctx: &mut ProgramContext<'_>,
    span: Span,
    props: &[ObjectProp],
    expected: Option<&IrType>,
) -> IrExpression {
    let expected_props: Vec<ObjectProperty> = match expected {
        Some(IrType::Object(props)) => props.clone(),
        _ => Vec::new(),
    };
    let mut converted = Vec::with_capacity(props.len());
    for prop in props {
        match prop {
            ObjectProp::Init { key, value } => {
                let name = match key {
                    PropKey::Ident(name) | PropKey::String(name) => name.clone(),
                    PropKey::Computed(_) => {
                        if expected.is_none() {
                            ctx.error(
                                span,
                                codes::SYNTHESIS_INELIGIBLE_LITERAL,
                                &["computed non-literal key"],
                            );
                        }
                        continue;
                    }
                };
                let prop_expected = expected_props
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| p.ty.clone());
                let value = convert_expression(ctx, *value, prop_expected.as_ref());
                converted.push(IrObjectProp { name, value });
            }
            ObjectProp::Shorthand { name } => {
                let ty = ctx
                    .local_type(name)
                    .cloned()
                    .unwrap_or(IrType::Unknown);
                converted.push(IrObjectProp {
                    name: name.clone(),
                    value: IrExpression::typed(
                        IrExpressionKind::Ident {
                            name: name.clone(),
                            decl: None,
                        },
                        ty,
                    ),
                });
            }
            ObjectProp::Method { .. } => {
                if expected.is_none() {
                    ctx.error(
                        span,
                        codes::SYNTHESIS_INELIGIBLE_LITERAL,
                        &["method shorthand"],
                    );
                }
            }
            ObjectProp::Accessor { .. } => {
                if expected.is_none() {
                    ctx.error(span, codes::SYNTHESIS_INELIGIBLE_LITERAL, &["accessor"]);
                }
            }
            ObjectProp::Spread { expr } => {
                // A spread is only admissible when its source carries a
                // type annotation we can expand structurally.
                let spread = convert_expression(ctx, *expr, None);
                match spread.ty() {
                    IrType::Object(spread_props) => {
                        for p in spread_props {
                            converted.push(IrObjectProp {
                                name: p.name.clone(),
                                value: IrExpression::typed(
                                    IrExpressionKind::Member {
                                        object: Box::new(spread.clone()),
                                        name: p.name,
                                        member: None,
                                        optional: false,
                                    },
                                    p.ty,
                                ),
                            });
                        }
                    }
                    _ => {
                        ctx.error(span, codes::UNTYPED_SPREAD_SOURCE, &[]);
                        if expected.is_none() {
                            ctx.error(
                                span,
                                codes::SYNTHESIS_INELIGIBLE_LITERAL,
                                &["untyped spread"],
                            );
                        }
                    }
                }
            }
        }
    }
    let ty = match expected {
        Some(expected) => expected.clone(),
        None => IrType::Object(
            converted
                .iter()
                .map(|p| ObjectProperty {
                    name: p.name.clone(),
                    ty: p.value.ty(),
                    optional: false,
                    readonly: false,
                })
                .collect(),
        ),
    };
    IrExpression::typed(
        IrExpressionKind::ObjectLiteral {
            props: converted,
            synthesized_name: None,
        },
        ty,
    )
    .with_span(span)
}

fn convert_lambda(
    ctx: &mut ProgramContext<'_>,
    span: Span,
    params: &[NodeId],
    return_type: Option<NodeId>,
    body: &ArrowBody,
    is_async: bool,
    expected: Option<&IrType>,
) -> IrExpression {
    let contextual = expected.and_then(|e| ctx.types.delegate_to_function_type(e));
    let (expected_params, expected_return) = match &contextual {
        Some(IrType::Function {
            params,
            return_type,
        }) => (params.clone(), Some(return_type.as_ref().clone())),
        _ => (Vec::new(), None),
    };

    ctx.enter_scope();
    let mut ir_params = Vec::with_capacity(params.len());
    for (index, param) in params.iter().enumerate() {
        let Some(NodeKind::Param {
            name,
            type_annotation,
            optional,
            default,
        }) = ctx.program.arena.kind(*param).cloned()
        else {
            continue;
        };
        let ty = match type_annotation {
            Some(annotation) => Some(type_of_type_node(ctx, annotation)),
            None => expected_params.get(index).cloned(),
        };
        if let Some(ty) = &ty {
            ctx.record_local(&name, ty.clone());
        }
        let default = default.map(|d| Box::new(convert_expression(ctx, d, ty.as_ref())));
        ir_params.push(IrParam {
            name,
            ty,
            mode: ParamMode::Value,
            optional,
            default,
        });
    }

    let declared_return = return_type.map(|r| type_of_type_node(ctx, r));
    let effective_return = declared_return.clone().or(expected_return);
    let prev_return = ctx.current_return_type.take();
    ctx.current_return_type = effective_return.clone();
    let (ir_body, body_type) = match body {
        ArrowBody::Expr(expr) => {
            let converted = convert_expression(ctx, *expr, effective_return.as_ref());
            let ty = converted.ty();
            (IrLambdaBody::Expr(Box::new(converted)), Some(ty))
        }
        ArrowBody::Block(stmts) => {
            let converted = stmts
                .iter()
                .filter_map(|s| convert_statement(ctx, *s))
                .collect();
            (IrLambdaBody::Block(converted), None)
        }
    };
    ctx.current_return_type = prev_return;
    ctx.exit_scope();

    let final_return = effective_return.or(body_type).unwrap_or(IrType::Unknown);
    let fn_type = IrType::Function {
        params: ir_params
            .iter()
            .map(|p| p.ty.clone().unwrap_or(IrType::Unknown))
            .collect(),
        return_type: Box::new(final_return.clone()),
    };
    IrExpression::typed(
        IrExpressionKind::Lambda {
            params: ir_params,
            return_type: Some(final_return),
            body: ir_body,
            is_async,
        },
        fn_type,
    )
    .with_span(span)
}

// =============================================================================
// Calls
// =============================================================================

/// Call-site marker unwrapping: `out(x)` / `ref(x)` / `inref(x)`.
fn unwrap_marker(ctx: &ProgramContext<'_>, arg: NodeId) -> (NodeId, Option<ParamMode>) {
    if let Some(NodeKind::Call { callee, args, type_args }) = ctx.program.arena.kind(arg)
        && type_args.is_empty()
        && args.len() == 1
        && let Some(NodeKind::Ident(name)) = ctx.program.arena.kind(*callee)
    {
        let mode = match name.as_str() {
            "out" => Some(ParamMode::Out),
            "ref" => Some(ParamMode::Ref),
            "inref" => Some(ParamMode::In),
            _ => None,
        };
        if mode.is_some() {
            return (args[0], mode);
        }
    }
    (arg, None)
}

fn is_lambda(ctx: &ProgramContext<'_>, node: NodeId) -> bool {
    matches!(ctx.program.arena.kind(node), Some(NodeKind::Arrow { .. }))
}

fn convert_call(
    ctx: &mut ProgramContext<'_>,
    node: NodeId,
    span: Span,
    callee: NodeId,
    type_args: &[NodeId],
    args: &[NodeId],
    is_new: bool,
    expected: Option<&IrType>,
) -> IrExpression {
    // The trycast intrinsic: `trycast<T>(x)` lowers to a dedicated node
    // whose result type is `T | null`.
    if !is_new
        && let Some(NodeKind::Ident(name)) = ctx.program.arena.kind(callee)
        && name == "trycast"
        && type_args.len() == 1
        && args.len() == 1
    {
        let target = type_of_type_node(ctx, type_args[0]);
        let inner = convert_expression(ctx, args[0], None);
        let ty = IrType::union(vec![target.clone(), IrType::NULL]);
        return IrExpression::typed(
            IrExpressionKind::TryCast {
                expr: Box::new(inner),
                target,
            },
            ty,
        )
        .with_span(span);
    }

    let explicit_type_args: Vec<IrType> = type_args
        .iter()
        .map(|t| type_of_type_node(ctx, *t))
        .collect();

    // Erase parameter-passing markers, caching per-argument overrides.
    let mut arg_nodes = Vec::with_capacity(args.len());
    let mut overrides: Vec<Option<ParamMode>> = Vec::with_capacity(args.len());
    for arg in args {
        let (inner, marker) = unwrap_marker(ctx, *arg);
        arg_nodes.push(inner);
        overrides.push(marker);
    }

    let sig = if is_new {
        ctx.binder.resolve_constructor_signature(node)
    } else {
        ctx.binder.resolve_call_signature(node)
    };

    // Convert the callee; a member callee supplies the receiver type.
    let (callee_expr, receiver, member_name) = match ctx.program.arena.kind(callee).cloned() {
        Some(NodeKind::PropertyAccess {
            object,
            name,
            optional,
        }) => {
            let object = convert_expression(ctx, object, None);
            let receiver = object.ty();
            let member = ctx.types.source_member(&receiver, &name);
            let member_ty = ctx.types.type_of_member(&receiver, &name);
            let expr = IrExpression::typed(
                IrExpressionKind::Member {
                    object: Box::new(object),
                    name: name.clone(),
                    member,
                    optional,
                },
                member_ty,
            )
            .with_span(ctx.span_of(callee));
            (expr, Some(receiver), Some(name))
        }
        _ => (convert_expression(ctx, callee, None), None, None),
    };

    // First pass: convert non-lambda arguments to harvest their types.
    let mut converted: Vec<Option<IrExpression>> = vec![None; arg_nodes.len()];
    let mut arg_types: Vec<IrType> = vec![IrType::Unknown; arg_nodes.len()];
    for (index, arg) in arg_nodes.iter().enumerate() {
        if !is_lambda(ctx, *arg) {
            let expr = convert_expression(ctx, *arg, None);
            arg_types[index] = expr.ty();
            converted[index] = Some(expr);
        }
    }

    // Second pass: re-resolve with harvested argument types, then convert
    // lambdas against the inferred parameter types.
    let intermediate = resolve_call_site(
        ctx,
        sig,
        arg_nodes.len(),
        receiver.as_ref(),
        member_name.as_deref(),
        &explicit_type_args,
        &arg_types,
        expected,
        span,
    );
    for (index, arg) in arg_nodes.iter().enumerate() {
        if converted[index].is_none() {
            let expected_param = intermediate.parameter_types.get(index).cloned();
            let expr = convert_expression(ctx, *arg, expected_param.as_ref());
            arg_types[index] = expr.ty();
            converted[index] = Some(expr);
        }
    }

    // Final resolution with the complete argument types.
    let resolved = resolve_call_site(
        ctx,
        sig,
        arg_nodes.len(),
        receiver.as_ref(),
        member_name.as_deref(),
        &explicit_type_args,
        &arg_types,
        expected,
        span,
    );
    for diagnostic in &resolved.diagnostics {
        ctx.sink.push(diagnostic.clone());
    }

    // Marker/mode conflicts.
    for (index, marker) in overrides.iter().enumerate() {
        if let Some(marker) = marker {
            let declared = resolved
                .parameter_modes
                .get(index)
                .copied()
                .unwrap_or_default();
            if declared != *marker {
                ctx.error(
                    span,
                    codes::PARAMETER_MODIFIER_CONFLICT,
                    &[marker.as_str(), declared.as_str()],
                );
            }
        }
    }

    // Ordinary generic calls stay generic in the target; a call needs a
    // specialized copy only when a type argument has no target-language
    // spelling (structural, literal, or union types).
    let effective_type_args: &[IrType] = if explicit_type_args.is_empty() {
        &resolved.inferred_type_args
    } else {
        &explicit_type_args
    };
    let requires_specialization = resolved.generic
        && effective_type_args.iter().any(|t| {
            matches!(
                t,
                IrType::Object(_) | IrType::Union(_) | IrType::Literal(_) | IrType::Intersection(_)
            )
        })
        && sig
            .and_then(|s| ctx.binder.signature(s))
            .is_some_and(|s| s.decl.is_some() && !s.is_constructor);

    let args: Vec<IrExpression> = converted
        .into_iter()
        .enumerate()
        .map(|(index, expr)| expr.unwrap_or_else(|| poisoned(ctx.span_of(arg_nodes[index]))))
        .collect();

    let call = IrCall {
        callee: Box::new(callee_expr),
        type_args: if explicit_type_args.is_empty() {
            resolved.inferred_type_args.clone()
        } else {
            explicit_type_args
        },
        args,
        arg_modes: resolved.parameter_modes.clone(),
        signature: sig,
        requires_specialization,
        specialized_name: None,
    };
    let kind = if is_new {
        IrExpressionKind::New(call)
    } else {
        IrExpressionKind::Call(call)
    };
    IrExpression::typed(kind, resolved.return_type).with_span(span)
}

/// One invocation of the call oracle: through the signature when the
/// binder resolved one, through member lookup for facade receivers, and
/// poisoned otherwise.
fn resolve_call_site(
    ctx: &mut ProgramContext<'_>,
    sig: Option<tsonic_binder::ids::SignatureId>,
    argument_count: usize,
    receiver: Option<&IrType>,
    member_name: Option<&str>,
    explicit_type_args: &[IrType],
    arg_types: &[IrType],
    expected: Option<&IrType>,
    span: Span,
) -> tsonic_types::ResolvedCall {
    if sig.is_some() {
        return ctx.types.resolve_call(&CallQuery {
            sig,
            argument_count,
            receiver_type: receiver,
            explicit_type_args,
            arg_types: Some(arg_types),
            expected_return_type: expected,
            file: &ctx.file_path,
            site: Some(span),
        });
    }
    if let (Some(receiver), Some(member_name)) = (receiver, member_name) {
        return ctx
            .types
            .resolve_member_call(receiver, member_name, argument_count);
    }
    let mut poisoned = tsonic_types::ResolvedCall::poisoned(argument_count);
    poisoned
        .diagnostics
        .push(tsonic_common::diagnostics::Diagnostic::error(
            ctx.file_path.clone(),
            span,
            "Cannot resolve call target.",
            codes::UNRESOLVED_BINDING,
        ));
    poisoned
}

// =============================================================================
// Operator mapping
// =============================================================================

pub(crate) fn map_binary_op(op: BinaryOp) -> IrBinaryOp {
    match op {
        BinaryOp::Add => IrBinaryOp::Add,
        BinaryOp::Sub => IrBinaryOp::Sub,
        BinaryOp::Mul => IrBinaryOp::Mul,
        BinaryOp::Div => IrBinaryOp::Div,
        BinaryOp::Rem => IrBinaryOp::Rem,
        BinaryOp::Exp => IrBinaryOp::Exp,
        BinaryOp::ShiftLeft => IrBinaryOp::ShiftLeft,
        BinaryOp::ShiftRight => IrBinaryOp::ShiftRight,
        BinaryOp::ShiftRightUnsigned => IrBinaryOp::ShiftRightUnsigned,
        BinaryOp::Less => IrBinaryOp::Less,
        BinaryOp::LessEq => IrBinaryOp::LessEq,
        BinaryOp::Greater => IrBinaryOp::Greater,
        BinaryOp::GreaterEq => IrBinaryOp::GreaterEq,
        BinaryOp::In => IrBinaryOp::In,
        BinaryOp::InstanceOf => IrBinaryOp::InstanceOf,
        BinaryOp::EqEq => IrBinaryOp::EqEq,
        BinaryOp::NotEq => IrBinaryOp::NotEq,
        BinaryOp::EqEqEq => IrBinaryOp::EqEqEq,
        BinaryOp::NotEqEq => IrBinaryOp::NotEqEq,
        BinaryOp::BitAnd => IrBinaryOp::BitAnd,
        BinaryOp::BitXor => IrBinaryOp::BitXor,
        BinaryOp::BitOr => IrBinaryOp::BitOr,
        BinaryOp::And => IrBinaryOp::And,
        BinaryOp::Or => IrBinaryOp::Or,
        BinaryOp::Coalesce => IrBinaryOp::Coalesce,
    }
}

pub(crate) fn map_unary_op(op: UnaryOp) -> IrUnaryOp {
    match op {
        UnaryOp::Minus => IrUnaryOp::Minus,
        UnaryOp::Plus => IrUnaryOp::Plus,
        UnaryOp::Not => IrUnaryOp::Not,
        UnaryOp::BitNot => IrUnaryOp::BitNot,
        UnaryOp::TypeOf => IrUnaryOp::TypeOf,
        UnaryOp::Void => IrUnaryOp::Void,
        UnaryOp::PreIncrement => IrUnaryOp::PreIncrement,
        UnaryOp::PreDecrement => IrUnaryOp::PreDecrement,
        UnaryOp::PostIncrement => IrUnaryOp::PostIncrement,
        UnaryOp::PostDecrement => IrUnaryOp::PostDecrement,
    }
}


pub(crate) fn map_assign_op(op: AssignOp) -> IrAssignOp {
    match op {
        AssignOp::Assign => IrAssignOp::Assign,
        AssignOp::Add => IrAssignOp::Add,
        AssignOp::Sub => IrAssignOp::Sub,
        AssignOp::Mul => IrAssignOp::Mul,
        AssignOp::Div => IrAssignOp::Div,
        AssignOp::Rem => IrAssignOp::Rem,
        AssignOp::BitAnd => IrAssignOp::BitAnd,
        AssignOp::BitOr => IrAssignOp::BitOr,
        AssignOp::BitXor => IrAssignOp::BitXor,
        AssignOp::ShiftLeft => IrAssignOp::ShiftLeft,
        AssignOp::ShiftRight => IrAssignOp::ShiftRight,
        AssignOp::Coalesce => IrAssignOp::Coalesce,
    }
}
