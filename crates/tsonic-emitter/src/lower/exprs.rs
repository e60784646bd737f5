//! IR expression → C# expression lowering.
//!
//! The emitter reads `inferred_type` as fixed truth; no type queries
//! happen here. Notable rewrites: `||` becomes `??` over a nullable left
//! operand and is elided over a non-nullable value type; `**` becomes
//! `Math.Pow`; `>>>` becomes an unsigned shift cast chain; `trycast`
//! becomes `as`.

use tsonic_common::numeric::NumericIntent;
use tsonic_binder::registry::ParamMode;
use tsonic_ir::expr::{
    IrAssignOp, IrBinaryOp, IrCall, IrExpression, IrExpressionKind, IrLambdaBody, IrLiteral,
    IrUnaryOp,
};
use tsonic_ir::types::IrType;

use crate::cs::{
    CsArg, CsBinaryOp, CsExpr, CsLambdaBody, CsLiteral, CsParamModifier, CsPrimitive, CsType,
    CsUnaryOp,
};
use crate::emit_context::EmitContext;
use crate::lower::stmts::lower_body;
use crate::lower::types::lower_type;

/// Lower one expression.
pub fn lower_expr(ctx: &mut EmitContext<'_>, expr: &IrExpression) -> CsExpr {
    match &expr.kind {
        IrExpressionKind::Literal(lit) => lower_literal(lit),
        IrExpressionKind::Ident { name, .. } => {
            let emitted = ctx
                .catalog
                .global_rename(name)
                .map_or_else(|| name.clone(), str::to_string);
            CsExpr::Ident(emitted)
        }
        IrExpressionKind::This => CsExpr::This,
        IrExpressionKind::Super => CsExpr::Base,
        IrExpressionKind::Member {
            object,
            name,
            optional,
            ..
        } => {
            let emit_name = ctx.member_emit_name(&object.ty(), name);
            CsExpr::Member {
                target: Box::new(lower_expr(ctx, object)),
                name: emit_name,
                conditional: *optional,
            }
        }
        IrExpressionKind::Index { object, index } => CsExpr::Index {
            target: Box::new(lower_expr(ctx, object)),
            index: Box::new(lower_expr(ctx, index)),
        },
        IrExpressionKind::Call(call) => lower_call(ctx, call, false, expr.inferred_type.as_ref()),
        IrExpressionKind::New(call) => lower_call(ctx, call, true, expr.inferred_type.as_ref()),
        IrExpressionKind::Binary { op, left, right } => lower_binary(ctx, *op, left, right),
        IrExpressionKind::Unary { op, operand } => {
            let operand = Box::new(lower_expr(ctx, operand));
            match op {
                IrUnaryOp::Minus => CsExpr::Unary {
                    op: CsUnaryOp::Neg,
                    operand,
                },
                IrUnaryOp::Plus => *operand,
                IrUnaryOp::Not => CsExpr::Unary {
                    op: CsUnaryOp::Not,
                    operand,
                },
                IrUnaryOp::BitNot => CsExpr::Unary {
                    op: CsUnaryOp::BitNot,
                    operand,
                },
                IrUnaryOp::TypeOf => {
                    // typeof is a static concept here: the runtime name of
                    // the target type.
                    CsExpr::Invocation {
                        target: Box::new(CsExpr::Member {
                            target: Box::new(CsExpr::Invocation {
                                target: Box::new(CsExpr::Member {
                                    target: operand,
                                    name: "GetType".into(),
                                    conditional: false,
                                }),
                                type_args: Vec::new(),
                                args: Vec::new(),
                            }),
                            name: "ToString".into(),
                            conditional: false,
                        }),
                        type_args: Vec::new(),
                        args: Vec::new(),
                    }
                }
                IrUnaryOp::Void => CsExpr::Literal(CsLiteral::Null),
                IrUnaryOp::PreIncrement => CsExpr::Unary {
                    op: CsUnaryOp::PreIncrement,
                    operand,
                },
                IrUnaryOp::PreDecrement => CsExpr::Unary {
                    op: CsUnaryOp::PreDecrement,
                    operand,
                },
                IrUnaryOp::PostIncrement => CsExpr::Unary {
                    op: CsUnaryOp::PostIncrement,
                    operand,
                },
                IrUnaryOp::PostDecrement => CsExpr::Unary {
                    op: CsUnaryOp::PostDecrement,
                    operand,
                },
            }
        }
        IrExpressionKind::Assign { op, target, value } => CsExpr::Assign {
            op: lower_assign_op(*op),
            target: Box::new(lower_expr(ctx, target)),
            value: Box::new(lower_expr(ctx, value)),
        },
        IrExpressionKind::Conditional {
            cond,
            when_true,
            when_false,
        } => CsExpr::Conditional {
            cond: Box::new(lower_expr(ctx, cond)),
            when_true: Box::new(lower_expr(ctx, when_true)),
            when_false: Box::new(lower_expr(ctx, when_false)),
        },
        IrExpressionKind::Lambda {
            params,
            body,
            is_async,
            ..
        } => {
            let cs_params = params
                .iter()
                .map(|p| {
                    let ty = p.ty.as_ref().map(|t| lower_type(ctx, t));
                    (ty, p.name.clone())
                })
                .collect();
            let body = match body {
                IrLambdaBody::Expr(e) => CsLambdaBody::Expr(Box::new(lower_expr(ctx, e))),
                IrLambdaBody::Block(stmts) => CsLambdaBody::Block(lower_body(ctx, stmts)),
            };
            CsExpr::Lambda {
                params: cs_params,
                body,
                is_async: *is_async,
            }
        }
        IrExpressionKind::ObjectLiteral {
            props,
            synthesized_name,
        } => {
            let ty = match synthesized_name {
                Some(name) => CsType::named(name.clone()),
                None => match expr.inferred_type.as_ref() {
                    Some(ty @ IrType::Reference { .. }) => lower_type(ctx, ty),
                    _ => CsType::Primitive(CsPrimitive::Object),
                },
            };
            CsExpr::ObjectCreation {
                ty,
                args: Vec::new(),
                initializer: props
                    .iter()
                    .map(|p| (p.name.clone(), lower_expr(ctx, &p.value)))
                    .collect(),
            }
        }
        IrExpressionKind::ArrayLiteral(items) => {
            let element = match expr.inferred_type.as_ref() {
                Some(IrType::Array { element, .. }) => lower_type(ctx, element),
                _ => CsType::Primitive(CsPrimitive::Object),
            };
            CsExpr::ArrayCreation {
                element,
                items: items.iter().map(|i| lower_expr(ctx, i)).collect(),
            }
        }
        IrExpressionKind::TryCast { expr: inner, target } => CsExpr::AsType {
            expr: Box::new(lower_expr(ctx, inner)),
            ty: lower_type(ctx, target),
        },
        IrExpressionKind::Cast { expr: inner, target } => CsExpr::Cast {
            ty: lower_type(ctx, target),
            expr: Box::new(lower_expr(ctx, inner)),
        },
        IrExpressionKind::Await(inner) => CsExpr::Await(Box::new(lower_expr(ctx, inner))),
        IrExpressionKind::Yield { .. } => {
            // Yields are consumed by the generator statement lowering;
            // one reaching plain expression lowering is a poisoned site.
            CsExpr::Default(None)
        }
    }
}

fn lower_literal(lit: &IrLiteral) -> CsExpr {
    match lit {
        IrLiteral::String(value) => CsExpr::Literal(CsLiteral::String(value.clone())),
        IrLiteral::Number { lexeme, intent, .. } => match intent {
            NumericIntent::Int32 => CsExpr::Literal(CsLiteral::Int(lexeme.clone())),
            NumericIntent::Double => CsExpr::Literal(CsLiteral::Double(lexeme.clone())),
        },
        IrLiteral::Boolean(value) => CsExpr::Literal(CsLiteral::Bool(*value)),
        IrLiteral::Null | IrLiteral::Undefined => CsExpr::Literal(CsLiteral::Null),
    }
}

fn lower_assign_op(op: IrAssignOp) -> Option<CsBinaryOp> {
    match op {
        IrAssignOp::Assign => None,
        IrAssignOp::Add => Some(CsBinaryOp::Add),
        IrAssignOp::Sub => Some(CsBinaryOp::Sub),
        IrAssignOp::Mul => Some(CsBinaryOp::Mul),
        IrAssignOp::Div => Some(CsBinaryOp::Div),
        IrAssignOp::Rem => Some(CsBinaryOp::Rem),
        IrAssignOp::BitAnd => Some(CsBinaryOp::BitAnd),
        IrAssignOp::BitOr => Some(CsBinaryOp::BitOr),
        IrAssignOp::BitXor => Some(CsBinaryOp::BitXor),
        IrAssignOp::ShiftLeft => Some(CsBinaryOp::Shl),
        IrAssignOp::ShiftRight => Some(CsBinaryOp::Shr),
        IrAssignOp::Coalesce => Some(CsBinaryOp::Coalesce),
    }
}

/// Whether an expression contains a conditional-access operator; `||`
/// elision is disabled over such operands.
fn contains_conditional_access(expr: &IrExpression) -> bool {
    match &expr.kind {
        IrExpressionKind::Member {
            object, optional, ..
        } => *optional || contains_conditional_access(object),
        IrExpressionKind::Index { object, index } => {
            contains_conditional_access(object) || contains_conditional_access(index)
        }
        IrExpressionKind::Call(call) | IrExpressionKind::New(call) => {
            contains_conditional_access(&call.callee)
                || call.args.iter().any(contains_conditional_access)
        }
        IrExpressionKind::Binary { left, right, .. } => {
            contains_conditional_access(left) || contains_conditional_access(right)
        }
        IrExpressionKind::Unary { operand, .. } => contains_conditional_access(operand),
        IrExpressionKind::Cast { expr, .. } | IrExpressionKind::TryCast { expr, .. } => {
            contains_conditional_access(expr)
        }
        _ => false,
    }
}

fn lower_binary(
    ctx: &mut EmitContext<'_>,
    op: IrBinaryOp,
    left: &IrExpression,
    right: &IrExpression,
) -> CsExpr {
    match op {
        // `||` over a nullable left operand is null-coalescing; over a
        // non-nullable value type the fallback is unreachable and the
        // whole expression collapses to the left operand.
        IrBinaryOp::Or => {
            let left_ty = left.ty();
            if left_ty.is_nullable() {
                return CsExpr::Binary {
                    op: CsBinaryOp::Coalesce,
                    left: Box::new(lower_expr(ctx, left)),
                    right: Box::new(lower_expr(ctx, right)),
                };
            }
            if left_ty.is_value_type() && !contains_conditional_access(left) {
                return lower_expr(ctx, left);
            }
            CsExpr::Binary {
                op: CsBinaryOp::Or,
                left: Box::new(lower_expr(ctx, left)),
                right: Box::new(lower_expr(ctx, right)),
            }
        }
        IrBinaryOp::Exp => {
            ctx.add_using("System");
            CsExpr::Invocation {
                target: Box::new(CsExpr::Member {
                    target: Box::new(CsExpr::Ident("Math".into())),
                    name: "Pow".into(),
                    conditional: false,
                }),
                type_args: Vec::new(),
                args: vec![
                    CsArg::plain(lower_expr(ctx, left)),
                    CsArg::plain(lower_expr(ctx, right)),
                ],
            }
        }
        IrBinaryOp::ShiftRightUnsigned => {
            // (int)((uint)left >> right)
            let unsigned = CsExpr::Cast {
                ty: CsType::named("uint"),
                expr: Box::new(lower_expr(ctx, left)),
            };
            CsExpr::Cast {
                ty: CsType::Primitive(CsPrimitive::Int),
                expr: Box::new(CsExpr::Binary {
                    op: CsBinaryOp::Shr,
                    left: Box::new(unsigned),
                    right: Box::new(lower_expr(ctx, right)),
                }),
            }
        }
        IrBinaryOp::In => CsExpr::Invocation {
            target: Box::new(CsExpr::Member {
                target: Box::new(lower_expr(ctx, right)),
                name: "ContainsKey".into(),
                conditional: false,
            }),
            type_args: Vec::new(),
            args: vec![CsArg::plain(lower_expr(ctx, left))],
        },
        IrBinaryOp::InstanceOf => {
            let target = match right.ty() {
                ty @ IrType::Reference { .. } => lower_type(ctx, &ty),
                _ => match &right.kind {
                    IrExpressionKind::Ident { name, .. } => CsType::named(name.clone()),
                    _ => CsType::Primitive(CsPrimitive::Object),
                },
            };
            CsExpr::IsType {
                expr: Box::new(lower_expr(ctx, left)),
                ty: target,
            }
        }
        other => {
            let cs_op = match other {
                IrBinaryOp::Add => CsBinaryOp::Add,
                IrBinaryOp::Sub => CsBinaryOp::Sub,
                IrBinaryOp::Mul => CsBinaryOp::Mul,
                IrBinaryOp::Div => CsBinaryOp::Div,
                IrBinaryOp::Rem => CsBinaryOp::Rem,
                IrBinaryOp::ShiftLeft => CsBinaryOp::Shl,
                IrBinaryOp::ShiftRight => CsBinaryOp::Shr,
                IrBinaryOp::Less => CsBinaryOp::Lt,
                IrBinaryOp::LessEq => CsBinaryOp::Le,
                IrBinaryOp::Greater => CsBinaryOp::Gt,
                IrBinaryOp::GreaterEq => CsBinaryOp::Ge,
                IrBinaryOp::EqEq | IrBinaryOp::EqEqEq => CsBinaryOp::Eq,
                IrBinaryOp::NotEq | IrBinaryOp::NotEqEq => CsBinaryOp::NotEq,
                IrBinaryOp::BitAnd => CsBinaryOp::BitAnd,
                IrBinaryOp::BitXor => CsBinaryOp::BitXor,
                IrBinaryOp::BitOr => CsBinaryOp::BitOr,
                IrBinaryOp::And => CsBinaryOp::And,
                IrBinaryOp::Coalesce => CsBinaryOp::Coalesce,
                _ => CsBinaryOp::Add,
            };
            CsExpr::Binary {
                op: cs_op,
                left: Box::new(lower_expr(ctx, left)),
                right: Box::new(lower_expr(ctx, right)),
            }
        }
    }
}

fn lower_call(
    ctx: &mut EmitContext<'_>,
    call: &IrCall,
    is_new: bool,
    result_type: Option<&IrType>,
) -> CsExpr {
    let args: Vec<CsArg> = call
        .args
        .iter()
        .enumerate()
        .map(|(index, arg)| CsArg {
            modifier: call.arg_modes.get(index).and_then(|mode| match mode {
                ParamMode::Value => None,
                ParamMode::Ref => Some(CsParamModifier::Ref),
                ParamMode::Out => Some(CsParamModifier::Out),
                ParamMode::In => Some(CsParamModifier::In),
            }),
            expr: lower_expr(ctx, arg),
        })
        .collect();

    if is_new {
        let ty = match result_type {
            Some(ty @ IrType::Reference { .. }) => lower_type(ctx, ty),
            _ => match &call.callee.kind {
                IrExpressionKind::Ident { name, .. } => CsType::named(name.clone()),
                _ => CsType::Primitive(CsPrimitive::Object),
            },
        };
        return CsExpr::ObjectCreation {
            ty,
            args,
            initializer: Vec::new(),
        };
    }

    // A specialized call drops its type arguments and targets the
    // mangled name.
    let (target, type_args) = match &call.specialized_name {
        Some(specialized) => {
            let target = match &call.callee.kind {
                IrExpressionKind::Member { object, optional, .. } => CsExpr::Member {
                    target: Box::new(lower_expr(ctx, object)),
                    name: specialized.clone(),
                    conditional: *optional,
                },
                _ => CsExpr::Ident(specialized.clone()),
            };
            (target, Vec::new())
        }
        None => {
            let target = lower_expr(ctx, &call.callee);
            let concrete = !call.type_args.is_empty()
                && !call
                    .type_args
                    .iter()
                    .any(|t| matches!(t, IrType::Unknown | IrType::Any));
            let type_args = if concrete {
                call.type_args.iter().map(|t| lower_type(ctx, t)).collect()
            } else {
                Vec::new()
            };
            (target, type_args)
        }
    };
    CsExpr::Invocation {
        target: Box::new(target),
        type_args,
        args,
    }
}
