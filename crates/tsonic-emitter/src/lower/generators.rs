//! Generator lowering.
//!
//! A generator function lowers to three coordinated constructs: an
//! `_exchange` class carrying each step's output and input, a
//! `_Generator` wrapper exposing `next`/`return`/`throw` over the
//! underlying enumerator, a private `_core` method yielding a lazy
//! sequence of exchanges, and the public entry that instantiates the
//! wrapper. When the generator's return type is non-void, the return
//! value is threaded through a closure-captured getter.
//!
//! Documented limitation: `throw(e)` cannot resume at the suspended
//! yield point; it terminates the generator and rethrows externally.
//! A compile-time note (TSN7460) is recorded per generator.

use tsonic_common::diagnostics::codes;
use tsonic_ir::stmt::IrFunction;
use tsonic_ir::types::IrType;

use crate::cs::{
    CsArg, CsDecl, CsExpr, CsLambdaBody, CsLiteral, CsMember, CsModifier, CsParam, CsStmt, CsType,
};
use crate::emit_context::EmitContext;
use crate::lower::stmts::{lower_body, lower_params};
use crate::lower::types::lower_type;

/// Lower one generator function into namespace-level support classes and
/// container members (`_core` + public entry).
pub fn lower_generator(
    ctx: &mut EmitContext<'_>,
    function: &IrFunction,
) -> (Vec<CsDecl>, Vec<CsMember>) {
    ctx.add_using("System");
    ctx.add_using("System.Collections.Generic");
    ctx.warn(function.span, codes::GENERATOR_THROW_LIMITATION, &[]);

    let name = &function.name;
    let exchange_name = format!("{name}_exchange");
    let generator_name = format!("{name}_Generator");
    let core_name = format!("{name}_core");

    // Generator<Y, R, N> type arguments.
    let (yield_ty, return_ty, next_ty) = match &function.return_type {
        Some(IrType::Reference {
            name: ref_name,
            type_args,
            ..
        }) if ref_name == "Generator" && type_args.len() == 3 => (
            type_args[0].clone(),
            type_args[1].clone(),
            type_args[2].clone(),
        ),
        _ => (IrType::Unknown, IrType::Void, IrType::Unknown),
    };
    let yield_cs = lower_type(ctx, &yield_ty);
    let next_cs = nullable(lower_type(ctx, &next_ty));
    let has_result = !matches!(return_ty, IrType::Void | IrType::Never);
    let result_cs = lower_type(ctx, &return_ty);

    let exchange_ty = CsType::named(exchange_name.clone());
    let nullable_exchange = nullable(exchange_ty.clone());

    let decls = vec![
        exchange_class(&exchange_name, &yield_cs, &next_cs),
        wrapper_class(
            &generator_name,
            &exchange_ty,
            &nullable_exchange,
            &next_cs,
            has_result.then(|| result_cs.clone()),
        ),
    ];

    // The private core: the original body with yields rewritten to
    // exchange objects. Defaults stay on the public entry.
    let mut core_params = lower_params(ctx, &function.params);
    for param in &mut core_params {
        param.default = None;
    }
    if has_result {
        core_params.push(CsParam {
            modifier: None,
            ty: CsType::generic("Action", vec![result_cs.clone()]),
            name: "__setResult".into(),
            default: None,
        });
    }
    let prev_exchange = ctx.generator_exchange.replace(exchange_name.clone());
    let prev_setter = if has_result {
        ctx.generator_result_setter
            .replace("__setResult".to_string())
    } else {
        ctx.generator_result_setter.take()
    };
    let core_body = lower_body(ctx, &function.body);
    ctx.generator_exchange = prev_exchange;
    ctx.generator_result_setter = prev_setter;

    let core = CsMember::Method {
        modifiers: vec![CsModifier::Private, CsModifier::Static],
        type_params: Vec::new(),
        where_clauses: Vec::new(),
        return_type: CsType::generic("IEnumerable", vec![exchange_ty.clone()]),
        name: core_name.clone(),
        params: core_params,
        body: Some(core_body),
    };

    // The public entry instantiates the wrapper over the lazy core.
    let entry_params = lower_params(ctx, &function.params);
    let mut core_args: Vec<CsArg> = function
        .params
        .iter()
        .map(|p| CsArg::plain(CsExpr::Ident(p.name.clone())))
        .collect();
    let mut entry_body = Vec::new();
    let mut wrapper_args = Vec::new();
    if has_result {
        entry_body.push(CsStmt::LocalDecl {
            ty: Some(result_cs.clone()),
            name: "__ret".into(),
            init: Some(CsExpr::Default(None)),
        });
        core_args.push(CsArg::plain(CsExpr::Lambda {
            params: vec![(None, "v".into())],
            body: CsLambdaBody::Expr(Box::new(CsExpr::Assign {
                op: None,
                target: Box::new(CsExpr::Ident("__ret".into())),
                value: Box::new(CsExpr::Ident("v".into())),
            })),
            is_async: false,
        }));
        wrapper_args.push(CsArg::plain(CsExpr::Invocation {
            target: Box::new(CsExpr::Ident(core_name.clone())),
            type_args: Vec::new(),
            args: core_args,
        }));
        wrapper_args.push(CsArg::plain(CsExpr::Lambda {
            params: Vec::new(),
            body: CsLambdaBody::Expr(Box::new(CsExpr::Ident("__ret".into()))),
            is_async: false,
        }));
    } else {
        wrapper_args.push(CsArg::plain(CsExpr::Invocation {
            target: Box::new(CsExpr::Ident(core_name)),
            type_args: Vec::new(),
            args: core_args,
        }));
    }
    entry_body.push(CsStmt::Return(Some(CsExpr::ObjectCreation {
        ty: CsType::named(generator_name.clone()),
        args: wrapper_args,
        initializer: Vec::new(),
    })));
    let entry = CsMember::Method {
        modifiers: vec![CsModifier::Public, CsModifier::Static],
        type_params: Vec::new(),
        where_clauses: Vec::new(),
        return_type: CsType::named(generator_name),
        name: name.clone(),
        params: entry_params,
        body: Some(entry_body),
    };

    (decls, vec![core, entry])
}

fn nullable(ty: CsType) -> CsType {
    match ty {
        CsType::Nullable(_) => ty,
        other => CsType::Nullable(Box::new(other)),
    }
}

/// `public class <name>_exchange { Value; Input; }`
fn exchange_class(name: &str, yield_ty: &CsType, next_ty: &CsType) -> CsDecl {
    CsDecl::Class {
        modifiers: vec![CsModifier::Public],
        name: name.to_string(),
        type_params: Vec::new(),
        where_clauses: Vec::new(),
        bases: Vec::new(),
        members: vec![
            CsMember::AutoProperty {
                modifiers: vec![CsModifier::Public],
                ty: yield_ty.clone(),
                name: "Value".into(),
                get_only: false,
                init: None,
            },
            CsMember::AutoProperty {
                modifiers: vec![CsModifier::Public],
                ty: next_ty.clone(),
                name: "Input".into(),
                get_only: false,
                init: None,
            },
        ],
    }
}

/// The wrapper driving the enumerator: `next` advances, `return`
/// disposes and marks done, `throw` disposes and rethrows.
fn wrapper_class(
    name: &str,
    exchange_ty: &CsType,
    nullable_exchange: &CsType,
    next_ty: &CsType,
    result_ty: Option<CsType>,
) -> CsDecl {
    let iter_field = CsMember::Field {
        modifiers: vec![CsModifier::Private, CsModifier::Readonly],
        ty: CsType::generic("IEnumerator", vec![exchange_ty.clone()]),
        name: "_iter".into(),
        init: None,
    };
    let current_field = CsMember::Field {
        modifiers: vec![CsModifier::Private],
        ty: nullable_exchange.clone(),
        name: "_current".into(),
        init: None,
    };
    let done_field = CsMember::Field {
        modifiers: vec![CsModifier::Private],
        ty: CsType::named("bool"),
        name: "_done".into(),
        init: None,
    };

    let mut ctor_params = vec![CsParam {
        modifier: None,
        ty: CsType::generic("IEnumerable", vec![exchange_ty.clone()]),
        name: "source".into(),
        default: None,
    }];
    let mut ctor_body = vec![CsStmt::Expr(CsExpr::Assign {
        op: None,
        target: Box::new(CsExpr::Ident("_iter".into())),
        value: Box::new(CsExpr::Invocation {
            target: Box::new(CsExpr::Member {
                target: Box::new(CsExpr::Ident("source".into())),
                name: "GetEnumerator".into(),
                conditional: false,
            }),
            type_args: Vec::new(),
            args: Vec::new(),
        }),
    })];
    let mut members = vec![iter_field, current_field, done_field];
    if let Some(result_ty) = &result_ty {
        members.push(CsMember::Field {
            modifiers: vec![CsModifier::Private, CsModifier::Readonly],
            ty: CsType::generic("Func", vec![result_ty.clone()]),
            name: "_result".into(),
            init: None,
        });
        ctor_params.push(CsParam {
            modifier: None,
            ty: CsType::generic("Func", vec![result_ty.clone()]),
            name: "result".into(),
            default: None,
        });
        ctor_body.push(CsStmt::Expr(CsExpr::Assign {
            op: None,
            target: Box::new(CsExpr::Ident("_result".into())),
            value: Box::new(CsExpr::Ident("result".into())),
        }));
    }
    members.push(CsMember::Constructor {
        modifiers: vec![CsModifier::Public],
        name: name.to_string(),
        params: ctor_params,
        base_args: None,
        body: ctor_body,
    });

    // next(value?): feed the pending exchange, advance, surface the next
    // exchange or mark done.
    members.push(CsMember::Method {
        modifiers: vec![CsModifier::Public],
        type_params: Vec::new(),
        where_clauses: Vec::new(),
        return_type: nullable_exchange.clone(),
        name: "next".into(),
        params: vec![CsParam {
            modifier: None,
            ty: next_ty.clone(),
            name: "value".into(),
            default: Some(CsExpr::Default(None)),
        }],
        body: Some(vec![
            CsStmt::If {
                cond: CsExpr::Ident("_done".into()),
                then_branch: vec![CsStmt::Return(Some(CsExpr::Literal(CsLiteral::Null)))],
                else_branch: None,
            },
            CsStmt::If {
                cond: CsExpr::Binary {
                    op: crate::cs::CsBinaryOp::NotEq,
                    left: Box::new(CsExpr::Ident("_current".into())),
                    right: Box::new(CsExpr::Literal(CsLiteral::Null)),
                },
                then_branch: vec![CsStmt::Expr(CsExpr::Assign {
                    op: None,
                    target: Box::new(CsExpr::Member {
                        target: Box::new(CsExpr::Ident("_current".into())),
                        name: "Input".into(),
                        conditional: false,
                    }),
                    value: Box::new(CsExpr::Ident("value".into())),
                })],
                else_branch: None,
            },
            CsStmt::If {
                cond: CsExpr::Invocation {
                    target: Box::new(CsExpr::Member {
                        target: Box::new(CsExpr::Ident("_iter".into())),
                        name: "MoveNext".into(),
                        conditional: false,
                    }),
                    type_args: Vec::new(),
                    args: Vec::new(),
                },
                then_branch: vec![
                    CsStmt::Expr(CsExpr::Assign {
                        op: None,
                        target: Box::new(CsExpr::Ident("_current".into())),
                        value: Box::new(CsExpr::Member {
                            target: Box::new(CsExpr::Ident("_iter".into())),
                            name: "Current".into(),
                            conditional: false,
                        }),
                    }),
                    CsStmt::Return(Some(CsExpr::Ident("_current".into()))),
                ],
                else_branch: None,
            },
            CsStmt::Expr(CsExpr::Assign {
                op: None,
                target: Box::new(CsExpr::Ident("_done".into())),
                value: Box::new(CsExpr::Literal(CsLiteral::Bool(true))),
            }),
            CsStmt::Return(Some(CsExpr::Literal(CsLiteral::Null))),
        ]),
    });

    // return(value?): dispose and mark done.
    members.push(CsMember::Method {
        modifiers: vec![CsModifier::Public],
        type_params: Vec::new(),
        where_clauses: Vec::new(),
        return_type: nullable_exchange.clone(),
        name: "return".into(),
        params: vec![CsParam {
            modifier: None,
            ty: next_ty.clone(),
            name: "value".into(),
            default: Some(CsExpr::Default(None)),
        }],
        body: Some(vec![
            CsStmt::Expr(dispose_iter()),
            CsStmt::Expr(CsExpr::Assign {
                op: None,
                target: Box::new(CsExpr::Ident("_done".into())),
                value: Box::new(CsExpr::Literal(CsLiteral::Bool(true))),
            }),
            CsStmt::Return(Some(CsExpr::Literal(CsLiteral::Null))),
        ]),
    });

    // throw(e): cannot resume at the suspended yield point; terminates
    // and rethrows externally.
    members.push(CsMember::Method {
        modifiers: vec![CsModifier::Public],
        type_params: Vec::new(),
        where_clauses: Vec::new(),
        return_type: CsType::Void,
        name: "throw".into(),
        params: vec![CsParam {
            modifier: None,
            ty: CsType::named("Exception"),
            name: "e".into(),
            default: None,
        }],
        body: Some(vec![
            CsStmt::Expr(dispose_iter()),
            CsStmt::Expr(CsExpr::Assign {
                op: None,
                target: Box::new(CsExpr::Ident("_done".into())),
                value: Box::new(CsExpr::Literal(CsLiteral::Bool(true))),
            }),
            CsStmt::Throw(Some(CsExpr::Ident("e".into()))),
        ]),
    });

    if result_ty.is_some() {
        members.push(CsMember::Method {
            modifiers: vec![CsModifier::Public],
            type_params: Vec::new(),
            where_clauses: Vec::new(),
            return_type: result_ty.unwrap_or(CsType::Void),
            name: "result".into(),
            params: Vec::new(),
            body: Some(vec![CsStmt::Return(Some(CsExpr::Invocation {
                target: Box::new(CsExpr::Ident("_result".into())),
                type_args: Vec::new(),
                args: Vec::new(),
            }))]),
        });
    }

    CsDecl::Class {
        modifiers: vec![CsModifier::Public],
        name: name.to_string(),
        type_params: Vec::new(),
        where_clauses: Vec::new(),
        bases: Vec::new(),
        members,
    }
}

fn dispose_iter() -> CsExpr {
    CsExpr::Invocation {
        target: Box::new(CsExpr::Member {
            target: Box::new(CsExpr::Ident("_iter".into())),
            name: "Dispose".into(),
            conditional: false,
        }),
        type_args: Vec::new(),
        args: Vec::new(),
    }
}
