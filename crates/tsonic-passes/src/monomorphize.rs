//! Monomorphization.
//!
//! Calls flagged `requires_specialization` (their type arguments have no
//! target-language spelling) are rewritten to reference a specialized
//! copy of the generic declaration, one per concrete instantiation. The
//! specialized copy substitutes the type arguments through its signature
//! and body and carries a name that mangles them.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;
use tsonic_ir::expr::{IrExpression, IrExpressionKind};
use tsonic_ir::module::IrModule;
use tsonic_ir::stmt::{IrFunction, IrStatement};
use tsonic_ir::types::{IrType, stable_ir_type_key};
use tsonic_ir::visit::{visit_module_expressions_mut, visit_statement_expressions_mut};
use tsonic_types::typesystem::{Substitution, substitute};

/// Run the pass over all modules.
pub fn run(mut modules: Vec<IrModule>) -> Vec<IrModule> {
    // Generic top-level function name → (module index, statement index).
    let mut generics: FxHashMap<String, (usize, usize)> = FxHashMap::default();
    for (module_index, module) in modules.iter().enumerate() {
        for (stmt_index, stmt) in module.statements.iter().enumerate() {
            if let IrStatement::Function(f) = stmt
                && !f.type_params.is_empty()
            {
                generics.insert(f.name.clone(), (module_index, stmt_index));
            }
        }
    }

    // (function name, args key) → specialized name; encounter order is
    // generation order.
    let mut table: IndexMap<(String, String), (String, Vec<IrType>)> = IndexMap::new();

    for module in &mut modules {
        visit_module_expressions_mut(module, &mut |expr: &mut IrExpression| {
            let (IrExpressionKind::Call(call) | IrExpressionKind::New(call)) = &mut expr.kind
            else {
                return;
            };
            if !call.requires_specialization || call.type_args.is_empty() {
                return;
            }
            if call.type_args.iter().any(IrType::is_unknown) {
                return;
            }
            let callee_name = match &call.callee.kind {
                IrExpressionKind::Ident { name, .. } => name.clone(),
                _ => return,
            };
            if !generics.contains_key(&callee_name) {
                return;
            }
            let args_key = call
                .type_args
                .iter()
                .map(stable_ir_type_key)
                .collect::<Vec<_>>()
                .join(",");
            let entry = table
                .entry((callee_name.clone(), args_key))
                .or_insert_with(|| {
                    (
                        mangle(&callee_name, &call.type_args),
                        call.type_args.clone(),
                    )
                });
            call.specialized_name = Some(entry.0.clone());
        });
    }

    // Generate the specialized declarations next to their generics.
    for ((name, _), (specialized_name, type_args)) in &table {
        let Some(&(module_index, stmt_index)) = generics.get(name) else {
            continue;
        };
        let IrStatement::Function(generic) = &mut modules[module_index].statements[stmt_index]
        else {
            continue;
        };
        generic.requires_specialization = true;
        let generic = generic.clone();
        let specialized = specialize(&generic, specialized_name, type_args);
        modules[module_index]
            .statements
            .push(IrStatement::Function(specialized));
    }
    debug!(specializations = table.len(), "monomorphization complete");
    modules
}

/// Mangle a specialized name from the type arguments.
#[must_use]
pub fn mangle(name: &str, type_args: &[IrType]) -> String {
    let parts: Vec<String> = type_args.iter().map(mangle_type).collect();
    format!("{name}__{}", parts.join("_"))
}

fn mangle_type(ty: &IrType) -> String {
    let display = ty.display_name();
    let mut mangled = String::with_capacity(display.len());
    for c in display.chars() {
        if c.is_ascii_alphanumeric() {
            mangled.push(c);
        } else if !mangled.ends_with('_') {
            mangled.push('_');
        }
    }
    mangled.trim_matches('_').to_string()
}

/// Produce a specialized copy of a generic function: type parameters
/// substituted through the signature and the body, the name mangled.
fn specialize(generic: &IrFunction, name: &str, type_args: &[IrType]) -> IrFunction {
    let subst: Substitution = generic
        .type_params
        .iter()
        .map(|tp| tp.name.clone())
        .zip(type_args.iter().cloned())
        .collect();
    let mut specialized = generic.clone();
    specialized.name = name.to_string();
    specialized.type_params = Vec::new();
    specialized.requires_specialization = false;
    for param in &mut specialized.params {
        if let Some(ty) = &param.ty {
            param.ty = Some(substitute(ty, &subst));
        }
    }
    if let Some(ret) = &specialized.return_type {
        specialized.return_type = Some(substitute(ret, &subst));
    }
    for stmt in &mut specialized.body {
        substitute_statement_types(stmt, &subst);
        visit_statement_expressions_mut(stmt, &mut |expr| {
            substitute_expression_types(expr, &subst);
        });
    }
    specialized
}

fn substitute_statement_types(stmt: &mut IrStatement, subst: &Substitution) {
    match stmt {
        IrStatement::VarDecl { declared_type, .. } => {
            if let Some(ty) = declared_type {
                *ty = substitute(ty, subst);
            }
        }
        IrStatement::ForOf { binding_type, body, .. } => {
            if let Some(ty) = binding_type {
                *ty = substitute(ty, subst);
            }
            for stmt in body {
                substitute_statement_types(stmt, subst);
            }
        }
        IrStatement::If {
            then_branch,
            else_branch,
            ..
        } => {
            for stmt in then_branch {
                substitute_statement_types(stmt, subst);
            }
            if let Some(else_branch) = else_branch {
                for stmt in else_branch {
                    substitute_statement_types(stmt, subst);
                }
            }
        }
        IrStatement::While { body, .. } | IrStatement::Block(body) => {
            for stmt in body {
                substitute_statement_types(stmt, subst);
            }
        }
        IrStatement::For { init, body, .. } => {
            if let Some(init) = init {
                substitute_statement_types(init, subst);
            }
            for stmt in body {
                substitute_statement_types(stmt, subst);
            }
        }
        IrStatement::Try {
            block,
            catch_block,
            finally_block,
            ..
        } => {
            for stmt in block {
                substitute_statement_types(stmt, subst);
            }
            if let Some(catch_block) = catch_block {
                for stmt in catch_block {
                    substitute_statement_types(stmt, subst);
                }
            }
            if let Some(finally_block) = finally_block {
                for stmt in finally_block {
                    substitute_statement_types(stmt, subst);
                }
            }
        }
        _ => {}
    }
}

fn substitute_expression_types(expr: &mut IrExpression, subst: &Substitution) {
    if let Some(ty) = &expr.inferred_type {
        expr.inferred_type = Some(substitute(ty, subst));
    }
    match &mut expr.kind {
        IrExpressionKind::Cast { target, .. } | IrExpressionKind::TryCast { target, .. } => {
            *target = substitute(target, subst);
        }
        IrExpressionKind::Call(call) | IrExpressionKind::New(call) => {
            for arg in &mut call.type_args {
                *arg = substitute(arg, subst);
            }
        }
        IrExpressionKind::Lambda {
            params,
            return_type,
            ..
        } => {
            for param in params {
                if let Some(ty) = &param.ty {
                    param.ty = Some(substitute(ty, subst));
                }
            }
            if let Some(ret) = return_type {
                *ret = substitute(ret, subst);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsonic_ir::expr::IrCall;
    use tsonic_ir::stmt::IrTypeParam;
    use tsonic_ir::types::ObjectProperty;

    fn generic_function(name: &str) -> IrFunction {
        IrFunction {
            name: name.into(),
            type_params: vec![IrTypeParam {
                name: "T".into(),
                constraint: None,
            }],
            params: vec![tsonic_ir::expr::IrParam {
                name: "x".into(),
                ty: Some(IrType::TypeParameter("T".into())),
                mode: tsonic_binder::registry::ParamMode::Value,
                optional: false,
                default: None,
            }],
            return_type: Some(IrType::TypeParameter("T".into())),
            body: Vec::new(),
            is_generator: false,
            is_async: false,
            is_static: false,
            exported: true,
            requires_specialization: false,
            decl: None,
            span: None,
        }
    }

    fn call_with_args(name: &str, type_args: Vec<IrType>, flagged: bool) -> IrExpression {
        IrExpression::new(IrExpressionKind::Call(IrCall {
            callee: Box::new(IrExpression::new(IrExpressionKind::Ident {
                name: name.into(),
                decl: None,
            })),
            type_args,
            args: Vec::new(),
            arg_modes: Vec::new(),
            signature: None,
            requires_specialization: flagged,
            specialized_name: None,
        }))
    }

    fn module_with(statements: Vec<IrStatement>) -> IrModule {
        IrModule {
            file_path: "main.ts".into(),
            namespace: "App".into(),
            container_class: "Main".into(),
            is_static_container: true,
            imports: Vec::new(),
            statements,
        }
    }

    fn structural_arg() -> IrType {
        IrType::Object(vec![ObjectProperty {
            name: "id".into(),
            ty: IrType::NUMBER,
            optional: false,
            readonly: false,
        }])
    }

    #[test]
    fn test_flagged_call_is_rewritten_and_specialized() {
        let module = module_with(vec![
            IrStatement::Function(generic_function("pick")),
            IrStatement::Expr(call_with_args("pick", vec![structural_arg()], true)),
        ]);
        let modules = run(vec![module]);
        // Call site rewritten.
        let IrStatement::Expr(expr) = &modules[0].statements[1] else {
            panic!();
        };
        let IrExpressionKind::Call(call) = &expr.kind else {
            panic!();
        };
        let specialized_name = call.specialized_name.clone().unwrap();
        assert!(specialized_name.starts_with("pick__"));
        // A specialized declaration with substituted types was appended.
        let specialized = modules[0]
            .statements
            .iter()
            .find_map(|s| match s {
                IrStatement::Function(f) if f.name == specialized_name => Some(f),
                _ => None,
            })
            .unwrap();
        assert!(specialized.type_params.is_empty());
        assert_eq!(specialized.params[0].ty, Some(structural_arg()));
        // The generic is marked as requiring specialization.
        let IrStatement::Function(generic) = &modules[0].statements[0] else {
            panic!();
        };
        assert!(generic.requires_specialization);
    }

    #[test]
    fn test_identical_instantiations_share_one_copy() {
        let module = module_with(vec![
            IrStatement::Function(generic_function("pick")),
            IrStatement::Expr(call_with_args("pick", vec![structural_arg()], true)),
            IrStatement::Expr(call_with_args("pick", vec![structural_arg()], true)),
        ]);
        let modules = run(vec![module]);
        let specialized_count = modules[0]
            .statements
            .iter()
            .filter(|s| matches!(s, IrStatement::Function(f) if f.name.contains("__")))
            .count();
        assert_eq!(specialized_count, 1);
    }

    #[test]
    fn test_unflagged_generic_call_is_untouched() {
        let module = module_with(vec![
            IrStatement::Function(generic_function("id")),
            IrStatement::Expr(call_with_args("id", vec![IrType::STRING], false)),
        ]);
        let modules = run(vec![module]);
        let IrStatement::Expr(expr) = &modules[0].statements[1] else {
            panic!();
        };
        let IrExpressionKind::Call(call) = &expr.kind else {
            panic!();
        };
        assert!(call.specialized_name.is_none());
        assert_eq!(modules[0].statements.len(), 2);
    }

    #[test]
    fn test_unknown_type_args_are_not_specialized() {
        let module = module_with(vec![
            IrStatement::Function(generic_function("pick")),
            IrStatement::Expr(call_with_args("pick", vec![IrType::Unknown], true)),
        ]);
        let modules = run(vec![module]);
        assert_eq!(modules[0].statements.len(), 2);
    }
}
