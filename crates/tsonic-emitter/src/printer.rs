//! Deterministic C# AST printer.
//!
//! Identical ASTs produce byte-identical text. Operator nesting is
//! parenthesized conservatively from the precedence table; using
//! directives are sorted and deduplicated; reserved words used as
//! identifiers are escaped with `@`.

use crate::cs::{
    CompilationUnit, CsArg, CsDecl, CsExpr, CsInterfaceMember, CsLambdaBody, CsLiteral, CsMember,
    CsModifier, CsParam, CsStmt, CsType, CsUnaryOp, CsWhereClause,
};
use crate::writer::SourceWriter;

/// Print one compilation unit.
#[must_use]
pub fn print_unit(unit: &CompilationUnit) -> String {
    let mut w = SourceWriter::new();
    if let Some(header) = &unit.header {
        for line in header.lines() {
            w.line(&format!("// {line}"));
        }
    }
    let mut usings: Vec<String> = unit.usings.clone();
    usings.sort();
    usings.dedup();
    for using in &usings {
        w.line(&format!("using {using};"));
    }
    if !usings.is_empty() || unit.header.is_some() {
        w.write_line();
    }
    w.line(&format!("namespace {}", unit.namespace));
    w.line("{");
    w.increase_indent();
    for (index, decl) in unit.decls.iter().enumerate() {
        if index > 0 {
            w.write_line();
        }
        print_decl(&mut w, decl);
    }
    w.decrease_indent();
    w.line("}");
    w.finish()
}

/// C# reserved words that need `@` escaping when used as identifiers.
fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        "return" | "throw" | "base" | "this" | "class" | "int" | "double" | "string" | "bool"
            | "char" | "void" | "object" | "new" | "ref" | "out" | "in" | "params" | "event"
            | "lock" | "checked" | "default" | "delegate" | "operator" | "is" | "as"
    )
}

fn ident(name: &str) -> String {
    if is_reserved(name) {
        format!("@{name}")
    } else {
        name.to_string()
    }
}

// =============================================================================
// Types
// =============================================================================

fn type_text(ty: &CsType) -> String {
    match ty {
        CsType::Primitive(p) => p.keyword().to_string(),
        CsType::Named { name, args } => {
            if args.is_empty() {
                name.clone()
            } else {
                let args: Vec<String> = args.iter().map(type_text).collect();
                format!("{name}<{}>", args.join(", "))
            }
        }
        CsType::Array(element) => format!("{}[]", type_text(element)),
        CsType::Nullable(inner) => format!("{}?", type_text(inner)),
        CsType::Tuple(elements) => {
            let parts: Vec<String> = elements
                .iter()
                .map(|(name, ty)| match name {
                    Some(name) => format!("{} {}", type_text(ty), ident(name)),
                    None => type_text(ty),
                })
                .collect();
            format!("({})", parts.join(", "))
        }
        CsType::Void => "void".to_string(),
    }
}

// =============================================================================
// Expressions
// =============================================================================

/// Precedence of an expression for conservative parenthesization.
/// Primary expressions sit above every operator level.
fn expr_precedence(expr: &CsExpr) -> u8 {
    match expr {
        CsExpr::Binary { op, .. } => op.precedence(),
        CsExpr::Conditional { .. } => 3,
        CsExpr::Assign { .. } | CsExpr::Lambda { .. } => 2,
        CsExpr::Unary { .. } | CsExpr::Cast { .. } | CsExpr::Await(_) => 16,
        CsExpr::AsType { .. } | CsExpr::IsType { .. } => 11,
        _ => 20,
    }
}

fn operand_text(operand: &CsExpr, parent_precedence: u8, is_right: bool) -> String {
    let text = expr_text(operand);
    let own = expr_precedence(operand);
    let needs_parens = own < parent_precedence || (own == parent_precedence && is_right);
    if needs_parens && own < 20 {
        format!("({text})")
    } else {
        text
    }
}

fn args_text(args: &[CsArg]) -> String {
    let parts: Vec<String> = args
        .iter()
        .map(|arg| match arg.modifier {
            Some(modifier) => format!("{} {}", modifier.keyword(), expr_text(&arg.expr)),
            None => expr_text(&arg.expr),
        })
        .collect();
    parts.join(", ")
}

fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn expr_text(expr: &CsExpr) -> String {
    match expr {
        CsExpr::Literal(lit) => match lit {
            CsLiteral::Int(lexeme) | CsLiteral::Double(lexeme) => lexeme.clone(),
            CsLiteral::String(value) => format!("\"{}\"", escape_string(value)),
            CsLiteral::Char(c) => format!("'{c}'"),
            CsLiteral::Bool(b) => b.to_string(),
            CsLiteral::Null => "null".to_string(),
        },
        CsExpr::Ident(name) => ident(name),
        CsExpr::Member {
            target,
            name,
            conditional,
        } => {
            let op = if *conditional { "?." } else { "." };
            format!("{}{op}{}", operand_text(target, 20, false), ident(name))
        }
        CsExpr::Invocation {
            target,
            type_args,
            args,
        } => {
            let type_args = if type_args.is_empty() {
                String::new()
            } else {
                let parts: Vec<String> = type_args.iter().map(type_text).collect();
                format!("<{}>", parts.join(", "))
            };
            format!(
                "{}{type_args}({})",
                operand_text(target, 20, false),
                args_text(args)
            )
        }
        CsExpr::ObjectCreation {
            ty,
            args,
            initializer,
        } => {
            let mut text = format!("new {}({})", type_text(ty), args_text(args));
            if !initializer.is_empty() {
                let parts: Vec<String> = initializer
                    .iter()
                    .map(|(name, value)| format!("{} = {}", ident(name), expr_text(value)))
                    .collect();
                text = format!(
                    "new {} {{ {} }}",
                    type_text(ty),
                    parts.join(", ")
                );
            }
            text
        }
        CsExpr::ArrayCreation { element, items } => {
            let parts: Vec<String> = items.iter().map(expr_text).collect();
            format!("new {}[] {{ {} }}", type_text(element), parts.join(", "))
        }
        CsExpr::Index { target, index } => {
            format!(
                "{}[{}]",
                operand_text(target, 20, false),
                expr_text(index)
            )
        }
        CsExpr::Binary { op, left, right } => {
            format!(
                "{} {} {}",
                operand_text(left, op.precedence(), false),
                op.token(),
                operand_text(right, op.precedence(), true)
            )
        }
        CsExpr::Unary { op, operand } => match op {
            CsUnaryOp::Neg => format!("-{}", operand_text(operand, 16, false)),
            CsUnaryOp::Not => format!("!{}", operand_text(operand, 16, false)),
            CsUnaryOp::BitNot => format!("~{}", operand_text(operand, 16, false)),
            CsUnaryOp::PreIncrement => format!("++{}", operand_text(operand, 16, false)),
            CsUnaryOp::PreDecrement => format!("--{}", operand_text(operand, 16, false)),
            CsUnaryOp::PostIncrement => format!("{}++", operand_text(operand, 16, false)),
            CsUnaryOp::PostDecrement => format!("{}--", operand_text(operand, 16, false)),
        },
        CsExpr::Assign { op, target, value } => {
            let op = op.map_or_else(|| "=".to_string(), |op| format!("{}=", op.token()));
            format!("{} {op} {}", expr_text(target), expr_text(value))
        }
        CsExpr::Conditional {
            cond,
            when_true,
            when_false,
        } => format!(
            "{} ? {} : {}",
            operand_text(cond, 4, false),
            expr_text(when_true),
            expr_text(when_false)
        ),
        CsExpr::Cast { ty, expr } => {
            format!("({}){}", type_text(ty), operand_text(expr, 16, false))
        }
        CsExpr::AsType { expr, ty } => {
            format!("{} as {}", operand_text(expr, 11, false), type_text(ty))
        }
        CsExpr::IsType { expr, ty } => {
            format!("{} is {}", operand_text(expr, 11, false), type_text(ty))
        }
        CsExpr::Lambda {
            params,
            body,
            is_async,
        } => {
            let prefix = if *is_async { "async " } else { "" };
            let params_text = match params.len() {
                1 if params[0].0.is_none() => ident(&params[0].1),
                _ => {
                    let parts: Vec<String> = params
                        .iter()
                        .map(|(ty, name)| match ty {
                            Some(ty) => format!("{} {}", type_text(ty), ident(name)),
                            None => ident(name),
                        })
                        .collect();
                    format!("({})", parts.join(", "))
                }
            };
            match body {
                CsLambdaBody::Expr(expr) => {
                    format!("{prefix}{params_text} => {}", expr_text(expr))
                }
                CsLambdaBody::Block(stmts) => {
                    let mut w = SourceWriter::new();
                    w.line("=>");
                    print_block(&mut w, stmts);
                    format!("{prefix}{params_text} {}", w.finish().trim_end())
                }
            }
        }
        CsExpr::Await(inner) => format!("await {}", operand_text(inner, 16, false)),
        CsExpr::Default(ty) => match ty {
            Some(ty) => format!("default({})", type_text(ty)),
            None => "default".to_string(),
        },
        CsExpr::This => "this".to_string(),
        CsExpr::Base => "base".to_string(),
    }
}

// =============================================================================
// Statements
// =============================================================================

fn print_block(w: &mut SourceWriter, stmts: &[CsStmt]) {
    w.line("{");
    w.increase_indent();
    for stmt in stmts {
        print_stmt(w, stmt);
    }
    w.decrease_indent();
    w.line("}");
}

fn print_stmt(w: &mut SourceWriter, stmt: &CsStmt) {
    match stmt {
        CsStmt::LocalDecl { ty, name, init } => {
            let ty = ty.as_ref().map_or_else(|| "var".to_string(), type_text);
            match init {
                Some(init) => w.line(&format!("{ty} {} = {};", ident(name), expr_text(init))),
                None => w.line(&format!("{ty} {};", ident(name))),
            }
        }
        CsStmt::Expr(expr) => w.line(&format!("{};", expr_text(expr))),
        CsStmt::Return(expr) => match expr {
            Some(expr) => w.line(&format!("return {};", expr_text(expr))),
            None => w.line("return;"),
        },
        CsStmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            w.line(&format!("if ({})", expr_text(cond)));
            print_block(w, then_branch);
            if let Some(else_branch) = else_branch {
                w.line("else");
                print_block(w, else_branch);
            }
        }
        CsStmt::While { cond, body } => {
            w.line(&format!("while ({})", expr_text(cond)));
            print_block(w, body);
        }
        CsStmt::For {
            init,
            cond,
            update,
            body,
        } => {
            let init_text = init.as_ref().map_or_else(String::new, |i| {
                let mut inner = SourceWriter::new();
                print_stmt(&mut inner, i);
                inner.finish().trim_end().trim_end_matches(';').to_string()
            });
            let cond_text = cond.as_ref().map_or_else(String::new, expr_text);
            let update_text = update.as_ref().map_or_else(String::new, expr_text);
            w.line(&format!("for ({init_text}; {cond_text}; {update_text})"));
            print_block(w, body);
        }
        CsStmt::Foreach {
            ty,
            binding,
            iterable,
            body,
        } => {
            let ty = ty.as_ref().map_or_else(|| "var".to_string(), type_text);
            w.line(&format!(
                "foreach ({ty} {} in {})",
                ident(binding),
                expr_text(iterable)
            ));
            print_block(w, body);
        }
        CsStmt::Break => w.line("break;"),
        CsStmt::Continue => w.line("continue;"),
        CsStmt::Throw(expr) => match expr {
            Some(expr) => w.line(&format!("throw {};", expr_text(expr))),
            None => w.line("throw;"),
        },
        CsStmt::Try {
            block,
            catches,
            finally_block,
        } => {
            w.line("try");
            print_block(w, block);
            for catch in catches {
                match (&catch.ty, &catch.binding) {
                    (Some(ty), Some(binding)) => {
                        w.line(&format!("catch ({} {})", type_text(ty), ident(binding)));
                    }
                    (Some(ty), None) => w.line(&format!("catch ({})", type_text(ty))),
                    _ => w.line("catch"),
                }
                print_block(w, &catch.block);
            }
            if let Some(finally_block) = finally_block {
                w.line("finally");
                print_block(w, finally_block);
            }
        }
        CsStmt::YieldReturn(expr) => w.line(&format!("yield return {};", expr_text(expr))),
        CsStmt::YieldBreak => w.line("yield break;"),
        CsStmt::Block(stmts) => print_block(w, stmts),
        CsStmt::Comment(text) => w.line(&format!("// {text}")),
    }
}

// =============================================================================
// Members and declarations
// =============================================================================

fn modifiers_text(modifiers: &[CsModifier]) -> String {
    let mut text = String::new();
    for modifier in modifiers {
        text.push_str(modifier.keyword());
        text.push(' ');
    }
    text
}

fn params_text(params: &[CsParam]) -> String {
    let parts: Vec<String> = params
        .iter()
        .map(|p| {
            let mut text = String::new();
            if let Some(modifier) = p.modifier {
                text.push_str(modifier.keyword());
                text.push(' ');
            }
            text.push_str(&type_text(&p.ty));
            text.push(' ');
            text.push_str(&ident(&p.name));
            if let Some(default) = &p.default {
                text.push_str(" = ");
                text.push_str(&expr_text(default));
            }
            text
        })
        .collect();
    parts.join(", ")
}

fn type_params_text(type_params: &[String]) -> String {
    if type_params.is_empty() {
        String::new()
    } else {
        format!("<{}>", type_params.join(", "))
    }
}

fn where_clauses_text(where_clauses: &[CsWhereClause]) -> String {
    let mut text = String::new();
    for clause in where_clauses {
        let bounds: Vec<String> = clause.bounds.iter().map(type_text).collect();
        text.push_str(&format!(" where {} : {}", clause.param, bounds.join(", ")));
    }
    text
}

fn print_member(w: &mut SourceWriter, member: &CsMember) {
    match member {
        CsMember::Field {
            modifiers,
            ty,
            name,
            init,
        } => {
            let init_text = init
                .as_ref()
                .map_or_else(String::new, |i| format!(" = {}", expr_text(i)));
            w.line(&format!(
                "{}{} {}{init_text};",
                modifiers_text(modifiers),
                type_text(ty),
                ident(name)
            ));
        }
        CsMember::AutoProperty {
            modifiers,
            ty,
            name,
            get_only,
            init,
        } => {
            let accessors = if *get_only { "{ get; }" } else { "{ get; set; }" };
            let init_text = init
                .as_ref()
                .map_or_else(String::new, |i| format!(" = {};", expr_text(i)));
            w.line(&format!(
                "{}{} {} {accessors}{init_text}",
                modifiers_text(modifiers),
                type_text(ty),
                ident(name)
            ));
        }
        CsMember::Method {
            modifiers,
            type_params,
            where_clauses,
            return_type,
            name,
            params,
            body,
        } => {
            let signature = format!(
                "{}{} {}{}({}){}",
                modifiers_text(modifiers),
                type_text(return_type),
                ident(name),
                type_params_text(type_params),
                params_text(params),
                where_clauses_text(where_clauses)
            );
            match body {
                Some(body) => {
                    w.line(&signature);
                    print_block(w, body);
                }
                None => w.line(&format!("{signature};")),
            }
        }
        CsMember::Constructor {
            modifiers,
            name,
            params,
            base_args,
            body,
        } => {
            let base = base_args
                .as_ref()
                .map_or_else(String::new, |args| format!(" : base({})", args_text(args)));
            w.line(&format!(
                "{}{}({}){base}",
                modifiers_text(modifiers),
                ident(name),
                params_text(params)
            ));
            print_block(w, body);
        }
    }
}

fn print_decl(w: &mut SourceWriter, decl: &CsDecl) {
    match decl {
        CsDecl::Class {
            modifiers,
            name,
            type_params,
            where_clauses,
            bases,
            members,
        } => {
            let bases_text = if bases.is_empty() {
                String::new()
            } else {
                let parts: Vec<String> = bases.iter().map(type_text).collect();
                format!(" : {}", parts.join(", "))
            };
            w.line(&format!(
                "{}class {}{}{bases_text}{}",
                modifiers_text(modifiers),
                ident(name),
                type_params_text(type_params),
                where_clauses_text(where_clauses)
            ));
            w.line("{");
            w.increase_indent();
            for (index, member) in members.iter().enumerate() {
                if index > 0 {
                    w.write_line();
                }
                print_member(w, member);
            }
            w.decrease_indent();
            w.line("}");
        }
        CsDecl::Interface {
            modifiers,
            name,
            type_params,
            members,
        } => {
            w.line(&format!(
                "{}interface {}{}",
                modifiers_text(modifiers),
                ident(name),
                type_params_text(type_params)
            ));
            w.line("{");
            w.increase_indent();
            for member in members {
                let CsInterfaceMember::Property { ty, name, get_only } = member;
                let accessors = if *get_only { "{ get; }" } else { "{ get; set; }" };
                w.line(&format!("{} {} {accessors}", type_text(ty), ident(name)));
            }
            w.decrease_indent();
            w.line("}");
        }
        CsDecl::Enum {
            modifiers,
            name,
            members,
        } => {
            w.line(&format!("{}enum {}", modifiers_text(modifiers), ident(name)));
            w.line("{");
            w.increase_indent();
            for (member_name, init) in members {
                match init {
                    Some(init) => {
                        w.line(&format!("{} = {},", ident(member_name), expr_text(init)));
                    }
                    None => w.line(&format!("{},", ident(member_name))),
                }
            }
            w.decrease_indent();
            w.line("}");
        }
        CsDecl::Comment(text) => {
            for line in text.lines() {
                w.line(&format!("// {line}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::{CsBinaryOp, CsPrimitive};

    fn int_lit(value: &str) -> CsExpr {
        CsExpr::Literal(CsLiteral::Int(value.to_string()))
    }

    #[test]
    fn test_precedence_parenthesization() {
        // (1 + 2) * 3 keeps its parens; 1 + 2 * 3 needs none.
        let sum = CsExpr::Binary {
            op: CsBinaryOp::Add,
            left: Box::new(int_lit("1")),
            right: Box::new(int_lit("2")),
        };
        let product = CsExpr::Binary {
            op: CsBinaryOp::Mul,
            left: Box::new(sum.clone()),
            right: Box::new(int_lit("3")),
        };
        assert_eq!(expr_text(&product), "(1 + 2) * 3");
        let product_first = CsExpr::Binary {
            op: CsBinaryOp::Add,
            left: Box::new(int_lit("1")),
            right: Box::new(CsExpr::Binary {
                op: CsBinaryOp::Mul,
                left: Box::new(int_lit("2")),
                right: Box::new(int_lit("3")),
            }),
        };
        assert_eq!(expr_text(&product_first), "1 + 2 * 3");
    }

    #[test]
    fn test_right_operand_same_precedence_parenthesized() {
        // a - (b - c)
        let inner = CsExpr::Binary {
            op: CsBinaryOp::Sub,
            left: Box::new(CsExpr::Ident("b".into())),
            right: Box::new(CsExpr::Ident("c".into())),
        };
        let outer = CsExpr::Binary {
            op: CsBinaryOp::Sub,
            left: Box::new(CsExpr::Ident("a".into())),
            right: Box::new(inner),
        };
        assert_eq!(expr_text(&outer), "a - (b - c)");
    }

    #[test]
    fn test_reserved_identifier_escaping() {
        assert_eq!(ident("return"), "@return");
        assert_eq!(ident("next"), "next");
    }

    #[test]
    fn test_usings_sorted_and_deduplicated() {
        let unit = CompilationUnit {
            header: None,
            usings: vec![
                "System.Collections.Generic".into(),
                "System".into(),
                "System".into(),
            ],
            namespace: "App".into(),
            decls: Vec::new(),
        };
        let text = print_unit(&unit);
        let sys = text.find("using System;").unwrap();
        let collections = text.find("using System.Collections.Generic;").unwrap();
        assert!(sys < collections);
        assert_eq!(text.matches("using System;").count(), 1);
    }

    #[test]
    fn test_printer_determinism() {
        let unit = CompilationUnit {
            header: Some("generated".into()),
            usings: vec!["System".into()],
            namespace: "App".into(),
            decls: vec![CsDecl::Class {
                modifiers: vec![CsModifier::Public, CsModifier::Static],
                name: "Util".into(),
                type_params: Vec::new(),
                where_clauses: Vec::new(),
                bases: Vec::new(),
                members: vec![CsMember::Method {
                    modifiers: vec![CsModifier::Public, CsModifier::Static],
                    type_params: vec!["T".into()],
                    where_clauses: Vec::new(),
                    return_type: CsType::named("T"),
                    name: "identity".into(),
                    params: vec![CsParam {
                        modifier: None,
                        ty: CsType::named("T"),
                        name: "value".into(),
                        default: None,
                    }],
                    body: Some(vec![CsStmt::Return(Some(CsExpr::Ident("value".into())))]),
                }],
            }],
        };
        let first = print_unit(&unit);
        let second = print_unit(&unit);
        assert_eq!(first, second);
        assert!(first.contains("public static T identity<T>(T value)"));
        assert!(first.contains("return value;"));
    }

    #[test]
    fn test_nullable_and_tuple_types() {
        assert_eq!(
            type_text(&CsType::Nullable(Box::new(CsType::Primitive(
                CsPrimitive::Double
            )))),
            "double?"
        );
        assert_eq!(
            type_text(&CsType::Tuple(vec![
                (None, CsType::Primitive(CsPrimitive::Int)),
                (None, CsType::Primitive(CsPrimitive::String)),
            ])),
            "(int, string)"
        );
    }
}
