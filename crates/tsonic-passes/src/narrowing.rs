//! Flow-sensitive narrowing.
//!
//! Propagates type narrowings from predicates into the branch where the
//! narrowing holds, materialized as an expression-level rewrite: the
//! narrowed binding is replaced by a structured view (`x.AsN()`) for
//! discriminated unions, or by a downcast for `instanceof` and predicate
//! functions. Null checks re-type the binding. Narrowings never leak
//! past the end of the conditional branch.

use tracing::debug;
use tsonic_ir::expr::{
    IrBinaryOp, IrCall, IrExpression, IrExpressionKind, IrLiteral,
};
use tsonic_ir::module::IrModule;
use tsonic_ir::stmt::{IrClassMember, IrStatement};
use tsonic_ir::types::IrType;
use tsonic_types::TypeSystem;
use tsonic_types::catalog::pascal_case;

/// Run the pass over all modules.
pub fn run(mut modules: Vec<IrModule>, types: &TypeSystem<'_>) -> Vec<IrModule> {
    for module in &mut modules {
        for stmt in &mut module.statements {
            narrow_statement(stmt, types);
        }
    }
    debug!("narrowing complete");
    modules
}

fn narrow_statement(stmt: &mut IrStatement, types: &TypeSystem<'_>) {
    match stmt {
        IrStatement::If {
            cond,
            then_branch,
            else_branch,
        } => {
            if let Some(narrowing) = narrowing_of(cond, types) {
                for stmt in then_branch.iter_mut() {
                    apply_narrowing(stmt, &narrowing);
                }
            }
            for stmt in then_branch {
                narrow_statement(stmt, types);
            }
            if let Some(else_branch) = else_branch {
                for stmt in else_branch {
                    narrow_statement(stmt, types);
                }
            }
        }
        IrStatement::While { body, .. }
        | IrStatement::Block(body)
        | IrStatement::ForOf { body, .. } => {
            for stmt in body {
                narrow_statement(stmt, types);
            }
        }
        IrStatement::For { body, .. } => {
            for stmt in body {
                narrow_statement(stmt, types);
            }
        }
        IrStatement::Function(f) => {
            for stmt in &mut f.body {
                narrow_statement(stmt, types);
            }
        }
        IrStatement::Class(c) => {
            for member in &mut c.members {
                match member {
                    IrClassMember::Method(m) => {
                        for stmt in &mut m.body {
                            narrow_statement(stmt, types);
                        }
                    }
                    IrClassMember::Constructor { body, .. } => {
                        for stmt in body {
                            narrow_statement(stmt, types);
                        }
                    }
                    IrClassMember::Property(_) => {}
                }
            }
        }
        IrStatement::Try {
            block,
            catch_block,
            finally_block,
            ..
        } => {
            for stmt in block {
                narrow_statement(stmt, types);
            }
            if let Some(catch_block) = catch_block {
                for stmt in catch_block {
                    narrow_statement(stmt, types);
                }
            }
            if let Some(finally_block) = finally_block {
                for stmt in finally_block {
                    narrow_statement(stmt, types);
                }
            }
        }
        _ => {}
    }
}

/// How a binding is rewritten inside the narrowed branch.
#[derive(Clone, Debug)]
enum Rewrite {
    /// `x` → `x.AsN()` (discriminated-union view).
    View { method: String, ty: IrType },
    /// `x` → `(T)x` downcast.
    Downcast(IrType),
    /// `x` keeps its shape but drops `null`/`undefined` from its type.
    NonNull,
}

#[derive(Clone, Debug)]
struct Narrowing {
    binding: String,
    rewrite: Rewrite,
}

/// Recognize a narrowing predicate in an `if` condition.
fn narrowing_of(cond: &IrExpression, types: &TypeSystem<'_>) -> Option<Narrowing> {
    match &cond.kind {
        // x.kind === "a"  →  view rewrite
        IrExpressionKind::Binary {
            op: IrBinaryOp::EqEqEq | IrBinaryOp::EqEq,
            left,
            right,
        } => {
            let IrExpressionKind::Member { object, .. } = &left.kind else {
                return None;
            };
            let IrExpressionKind::Ident { name: binding, .. } = &object.kind else {
                return None;
            };
            let IrExpressionKind::Literal(IrLiteral::String(tag)) = &right.kind else {
                return None;
            };
            let case = pascal_case(tag);
            let narrowed = match object.ty() {
                IrType::Union(members) => members
                    .iter()
                    .find(|m| matches!(m, IrType::Reference { name, .. } if *name == case))
                    .cloned()
                    .unwrap_or_else(|| IrType::reference(case.clone(), Vec::new())),
                _ => IrType::reference(case.clone(), Vec::new()),
            };
            Some(Narrowing {
                binding: binding.clone(),
                rewrite: Rewrite::View {
                    method: format!("As{case}"),
                    ty: narrowed,
                },
            })
        }
        // x instanceof T  →  downcast
        IrExpressionKind::Binary {
            op: IrBinaryOp::InstanceOf,
            left,
            right,
        } => {
            let IrExpressionKind::Ident { name: binding, .. } = &left.kind else {
                return None;
            };
            let target = match (&right.kind, right.ty()) {
                (_, ty @ IrType::Reference { .. }) => ty,
                (IrExpressionKind::Ident { name, .. }, _) => {
                    IrType::reference(name.clone(), Vec::new())
                }
                _ => return None,
            };
            Some(Narrowing {
                binding: binding.clone(),
                rewrite: Rewrite::Downcast(target),
            })
        }
        // x !== null / x !== undefined  →  non-null re-typing
        IrExpressionKind::Binary {
            op: IrBinaryOp::NotEqEq | IrBinaryOp::NotEq,
            left,
            right,
        } => {
            let IrExpressionKind::Ident { name: binding, .. } = &left.kind else {
                return None;
            };
            if !matches!(
                right.kind,
                IrExpressionKind::Literal(IrLiteral::Null | IrLiteral::Undefined)
            ) {
                return None;
            }
            Some(Narrowing {
                binding: binding.clone(),
                rewrite: Rewrite::NonNull,
            })
        }
        // isT(x)  →  downcast to the predicate target
        IrExpressionKind::Call(call) => {
            let predicate = types
                .resolve_call(&tsonic_types::CallQuery {
                    sig: call.signature,
                    argument_count: call.args.len(),
                    ..tsonic_types::CallQuery::default()
                })
                .type_predicate?;
            let index = predicate.param_index?;
            let IrExpressionKind::Ident { name: binding, .. } = &call.args.get(index)?.kind
            else {
                return None;
            };
            Some(Narrowing {
                binding: binding.clone(),
                rewrite: Rewrite::Downcast(predicate.ty),
            })
        }
        _ => None,
    }
}

/// Rewrite uses of the narrowed binding inside one branch statement.
fn apply_narrowing(stmt: &mut IrStatement, narrowing: &Narrowing) {
    tsonic_ir::visit::visit_statement_expressions_mut(stmt, &mut |expr: &mut IrExpression| {
        let IrExpressionKind::Ident { name, .. } = &expr.kind else {
            return;
        };
        if name != &narrowing.binding {
            return;
        }
        match &narrowing.rewrite {
            Rewrite::View { method, ty } => {
                let receiver = expr.clone();
                *expr = IrExpression::typed(
                    IrExpressionKind::Call(IrCall {
                        callee: Box::new(IrExpression::typed(
                            IrExpressionKind::Member {
                                object: Box::new(receiver),
                                name: method.clone(),
                                member: None,
                                optional: false,
                            },
                            IrType::Function {
                                params: Vec::new(),
                                return_type: Box::new(ty.clone()),
                            },
                        )),
                        type_args: Vec::new(),
                        args: Vec::new(),
                        arg_modes: Vec::new(),
                        signature: None,
                        requires_specialization: false,
                        specialized_name: None,
                    }),
                    ty.clone(),
                );
            }
            Rewrite::Downcast(target) => {
                let inner = expr.clone();
                *expr = IrExpression::typed(
                    IrExpressionKind::Cast {
                        expr: Box::new(inner),
                        target: target.clone(),
                    },
                    target.clone(),
                );
            }
            Rewrite::NonNull => {
                expr.inferred_type = Some(expr.ty().non_null());
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsonic_binder::Binder;
    use tsonic_surface::TreeBuilder;
    use tsonic_surface::ast::Program;
    use tsonic_types::{AliasTable, TypeCatalog};

    fn empty_world() -> (Program, Binder, TypeCatalog, AliasTable) {
        let mut builder = TreeBuilder::new();
        builder.file("main.ts");
        let program = builder.finish();
        let binder = Binder::bind(&program);
        let catalog = TypeCatalog::with_builtins();
        let aliases = AliasTable::new();
        (program, binder, catalog, aliases)
    }

    fn ident(name: &str, ty: IrType) -> IrExpression {
        IrExpression::typed(
            IrExpressionKind::Ident {
                name: name.into(),
                decl: None,
            },
            ty,
        )
    }

    fn module_with(statements: Vec<IrStatement>) -> IrModule {
        IrModule {
            file_path: "main.ts".into(),
            namespace: "App".into(),
            container_class: "Main".into(),
            is_static_container: false,
            imports: Vec::new(),
            statements,
        }
    }

    #[test]
    fn test_discriminant_check_rewrites_to_view() {
        let (program, binder, catalog, aliases) = empty_world();
        let types = TypeSystem::new(&program, &binder, &catalog, &aliases);
        let shape_union = IrType::union(vec![
            IrType::reference("Circle", Vec::new()),
            IrType::reference("Square", Vec::new()),
        ]);
        let cond = IrExpression::typed(
            IrExpressionKind::Binary {
                op: IrBinaryOp::EqEqEq,
                left: Box::new(IrExpression::typed(
                    IrExpressionKind::Member {
                        object: Box::new(ident("shape", shape_union.clone())),
                        name: "kind".into(),
                        member: None,
                        optional: false,
                    },
                    IrType::STRING,
                )),
                right: Box::new(IrExpression::typed(
                    IrExpressionKind::Literal(IrLiteral::String("circle".into())),
                    IrType::STRING,
                )),
            },
            IrType::BOOLEAN,
        );
        let body = vec![IrStatement::Expr(ident("shape", shape_union))];
        let stmt = IrStatement::If {
            cond,
            then_branch: body,
            else_branch: None,
        };
        let modules = run(vec![module_with(vec![stmt])], &types);
        let IrStatement::If { then_branch, .. } = &modules[0].statements[0] else {
            panic!();
        };
        let IrStatement::Expr(expr) = &then_branch[0] else {
            panic!();
        };
        let IrExpressionKind::Call(call) = &expr.kind else {
            panic!("expected view call, got {:?}", expr.kind);
        };
        let IrExpressionKind::Member { name, .. } = &call.callee.kind else {
            panic!();
        };
        assert_eq!(name, "AsCircle");
        assert!(matches!(
            expr.inferred_type,
            Some(IrType::Reference { ref name, .. }) if name == "Circle"
        ));
    }

    #[test]
    fn test_instanceof_rewrites_to_downcast() {
        let (program, binder, catalog, aliases) = empty_world();
        let types = TypeSystem::new(&program, &binder, &catalog, &aliases);
        let animal = IrType::reference("Animal", Vec::new());
        let cat = IrType::reference("Cat", Vec::new());
        let cond = IrExpression::typed(
            IrExpressionKind::Binary {
                op: IrBinaryOp::InstanceOf,
                left: Box::new(ident("pet", animal.clone())),
                right: Box::new(ident("Cat", cat.clone())),
            },
            IrType::BOOLEAN,
        );
        let stmt = IrStatement::If {
            cond,
            then_branch: vec![IrStatement::Expr(ident("pet", animal.clone()))],
            else_branch: Some(vec![IrStatement::Expr(ident("pet", animal))]),
        };
        let modules = run(vec![module_with(vec![stmt])], &types);
        let IrStatement::If {
            then_branch,
            else_branch,
            ..
        } = &modules[0].statements[0]
        else {
            panic!();
        };
        let IrStatement::Expr(narrowed) = &then_branch[0] else {
            panic!();
        };
        assert!(matches!(narrowed.kind, IrExpressionKind::Cast { .. }));
        assert_eq!(narrowed.inferred_type, Some(cat));
        // The narrowing does not leak into the else branch.
        let IrStatement::Expr(untouched) = &else_branch.as_ref().unwrap()[0] else {
            panic!();
        };
        assert!(matches!(untouched.kind, IrExpressionKind::Ident { .. }));
    }

    #[test]
    fn test_null_check_drops_null_from_type() {
        let (program, binder, catalog, aliases) = empty_world();
        let types = TypeSystem::new(&program, &binder, &catalog, &aliases);
        let nullable = IrType::union(vec![IrType::STRING, IrType::NULL]);
        let cond = IrExpression::typed(
            IrExpressionKind::Binary {
                op: IrBinaryOp::NotEqEq,
                left: Box::new(ident("s", nullable.clone())),
                right: Box::new(IrExpression::typed(
                    IrExpressionKind::Literal(IrLiteral::Null),
                    IrType::NULL,
                )),
            },
            IrType::BOOLEAN,
        );
        let stmt = IrStatement::If {
            cond,
            then_branch: vec![IrStatement::Expr(ident("s", nullable))],
            else_branch: None,
        };
        let modules = run(vec![module_with(vec![stmt])], &types);
        let IrStatement::If { then_branch, .. } = &modules[0].statements[0] else {
            panic!();
        };
        let IrStatement::Expr(expr) = &then_branch[0] else {
            panic!();
        };
        assert_eq!(expr.inferred_type, Some(IrType::STRING));
    }
}
