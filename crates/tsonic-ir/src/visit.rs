//! Mutable post-order expression walkers shared by the middle passes.

use crate::expr::{IrExpression, IrExpressionKind, IrLambdaBody};
use crate::module::IrModule;
use crate::stmt::{IrClassMember, IrStatement};

/// Visit every expression of a module, children before parents.
pub fn visit_module_expressions_mut<F: FnMut(&mut IrExpression)>(module: &mut IrModule, f: &mut F) {
    for stmt in &mut module.statements {
        visit_statement_expressions_mut(stmt, f);
    }
}

/// Visit every expression under a statement, children before parents.
pub fn visit_statement_expressions_mut<F: FnMut(&mut IrExpression)>(
    stmt: &mut IrStatement,
    f: &mut F,
) {
    match stmt {
        IrStatement::VarDecl { init, .. } => {
            if let Some(init) = init {
                visit_expression_mut(init, f);
            }
        }
        IrStatement::Function(func) => {
            for param in &mut func.params {
                if let Some(default) = &mut param.default {
                    visit_expression_mut(default, f);
                }
            }
            for stmt in &mut func.body {
                visit_statement_expressions_mut(stmt, f);
            }
        }
        IrStatement::Class(class) => {
            for member in &mut class.members {
                match member {
                    IrClassMember::Property(p) => {
                        if let Some(init) = &mut p.init {
                            visit_expression_mut(init, f);
                        }
                    }
                    IrClassMember::Method(m) => {
                        for stmt in &mut m.body {
                            visit_statement_expressions_mut(stmt, f);
                        }
                    }
                    IrClassMember::Constructor { params, body } => {
                        for param in params {
                            if let Some(default) = &mut param.default {
                                visit_expression_mut(default, f);
                            }
                        }
                        for stmt in body {
                            visit_statement_expressions_mut(stmt, f);
                        }
                    }
                }
            }
        }
        IrStatement::Expr(e) | IrStatement::Throw(e) => visit_expression_mut(e, f),
        IrStatement::Return(Some(e)) => visit_expression_mut(e, f),
        IrStatement::Return(None) => {}
        IrStatement::If {
            cond,
            then_branch,
            else_branch,
        } => {
            visit_expression_mut(cond, f);
            for stmt in then_branch {
                visit_statement_expressions_mut(stmt, f);
            }
            if let Some(else_branch) = else_branch {
                for stmt in else_branch {
                    visit_statement_expressions_mut(stmt, f);
                }
            }
        }
        IrStatement::While { cond, body } => {
            visit_expression_mut(cond, f);
            for stmt in body {
                visit_statement_expressions_mut(stmt, f);
            }
        }
        IrStatement::For {
            init,
            cond,
            update,
            body,
        } => {
            if let Some(init) = init {
                visit_statement_expressions_mut(init, f);
            }
            if let Some(cond) = cond {
                visit_expression_mut(cond, f);
            }
            if let Some(update) = update {
                visit_expression_mut(update, f);
            }
            for stmt in body {
                visit_statement_expressions_mut(stmt, f);
            }
        }
        IrStatement::ForOf { iterable, body, .. } => {
            visit_expression_mut(iterable, f);
            for stmt in body {
                visit_statement_expressions_mut(stmt, f);
            }
        }
        IrStatement::Try {
            block,
            catch_block,
            finally_block,
            ..
        } => {
            for stmt in block {
                visit_statement_expressions_mut(stmt, f);
            }
            if let Some(catch_block) = catch_block {
                for stmt in catch_block {
                    visit_statement_expressions_mut(stmt, f);
                }
            }
            if let Some(finally_block) = finally_block {
                for stmt in finally_block {
                    visit_statement_expressions_mut(stmt, f);
                }
            }
        }
        IrStatement::Block(stmts) => {
            for stmt in stmts {
                visit_statement_expressions_mut(stmt, f);
            }
        }
        IrStatement::Enum { members, .. } => {
            for member in members {
                if let Some(init) = &mut member.init {
                    visit_expression_mut(init, f);
                }
            }
        }
        IrStatement::Interface(_)
        | IrStatement::TypeAlias { .. }
        | IrStatement::Break
        | IrStatement::Continue => {}
    }
}

/// Visit an expression tree, children before parents.
pub fn visit_expression_mut<F: FnMut(&mut IrExpression)>(expr: &mut IrExpression, f: &mut F) {
    match &mut expr.kind {
        IrExpressionKind::Literal(_)
        | IrExpressionKind::Ident { .. }
        | IrExpressionKind::This
        | IrExpressionKind::Super => {}
        IrExpressionKind::Member { object, .. } => visit_expression_mut(object, f),
        IrExpressionKind::Index { object, index } => {
            visit_expression_mut(object, f);
            visit_expression_mut(index, f);
        }
        IrExpressionKind::Call(call) | IrExpressionKind::New(call) => {
            visit_expression_mut(&mut call.callee, f);
            for arg in &mut call.args {
                visit_expression_mut(arg, f);
            }
        }
        IrExpressionKind::Binary { left, right, .. } => {
            visit_expression_mut(left, f);
            visit_expression_mut(right, f);
        }
        IrExpressionKind::Unary { operand, .. } => visit_expression_mut(operand, f),
        IrExpressionKind::Assign { target, value, .. } => {
            visit_expression_mut(target, f);
            visit_expression_mut(value, f);
        }
        IrExpressionKind::Conditional {
            cond,
            when_true,
            when_false,
        } => {
            visit_expression_mut(cond, f);
            visit_expression_mut(when_true, f);
            visit_expression_mut(when_false, f);
        }
        IrExpressionKind::Lambda { params, body, .. } => {
            for param in params {
                if let Some(default) = &mut param.default {
                    visit_expression_mut(default, f);
                }
            }
            match body {
                IrLambdaBody::Expr(e) => visit_expression_mut(e, f),
                IrLambdaBody::Block(stmts) => {
                    for stmt in stmts {
                        visit_statement_expressions_mut(stmt, f);
                    }
                }
            }
        }
        IrExpressionKind::ObjectLiteral { props, .. } => {
            for prop in props {
                visit_expression_mut(&mut prop.value, f);
            }
        }
        IrExpressionKind::ArrayLiteral(items) => {
            for item in items {
                visit_expression_mut(item, f);
            }
        }
        IrExpressionKind::TryCast { expr: inner, .. }
        | IrExpressionKind::Cast { expr: inner, .. } => visit_expression_mut(inner, f),
        IrExpressionKind::Yield { expr: inner, .. } => {
            if let Some(inner) = inner {
                visit_expression_mut(inner, f);
            }
        }
        IrExpressionKind::Await(inner) => visit_expression_mut(inner, f),
    }
    f(expr);
}
