//! Numeric proof pass.
//!
//! Attaches a `NumericProof` to expressions whose Int32-ness is provable:
//! integer literals in range, declarations with declared integer type,
//! runtime APIs declared to return an integer kind, binary/unary
//! operations over proven operands, and explicit validated `as int`
//! narrowings. Array/string indexing requires the index to carry a
//! proof; unproven integer intent at an index position is TSN5107, and
//! implicit `number` → `int` narrowing is TSN5110.

use tracing::debug;
use tsonic_common::diagnostics::{DiagnosticSink, codes, format_message, get_message_template};
use tsonic_common::numeric::{NumericIntent, int_literal_in_range};
use tsonic_common::span::Span;
use tsonic_common::diagnostics::Diagnostic;
use tsonic_ir::expr::{
    IrExpression, IrExpressionKind, IrLiteral, NumericProof, ProofSource,
};
use tsonic_ir::module::IrModule;
use tsonic_ir::stmt::{IrClassMember, IrStatement};
use tsonic_ir::types::{IrPrimitive, IrType};

/// Run the pass over all modules.
pub fn run(mut modules: Vec<IrModule>, sink: &mut DiagnosticSink) -> Vec<IrModule> {
    for module in &mut modules {
        let mut pass = ProofPass {
            file: module.file_path.clone(),
            sink: &mut *sink,
        };
        for stmt in &mut module.statements {
            pass.visit_statement(stmt);
        }
    }
    debug!("numeric proof pass complete");
    modules
}

struct ProofPass<'a> {
    file: String,
    sink: &'a mut DiagnosticSink,
}

impl ProofPass<'_> {
    fn error(&mut self, span: Option<Span>, code: u32, args: &[&str]) {
        let template = get_message_template(code).unwrap_or("Unknown diagnostic.");
        self.sink.push(Diagnostic::error(
            self.file.clone(),
            span.unwrap_or_else(Span::dummy),
            format_message(template, args),
            code,
        ));
    }

    fn visit_statement(&mut self, stmt: &mut IrStatement) {
        match stmt {
            IrStatement::VarDecl {
                declared_type,
                init,
                ..
            } => {
                if let Some(init) = init {
                    self.visit_expression(init);
                    // Implicit narrowing: a declared `int` fed a `number`.
                    if matches!(declared_type, Some(IrType::Primitive(IrPrimitive::Int)))
                        && init.ty().is_number()
                    {
                        self.error(init.span, codes::IMPLICIT_NUMERIC_NARROWING, &[]);
                    }
                }
            }
            IrStatement::Function(f) => {
                for param in &mut f.params {
                    if let Some(default) = &mut param.default {
                        self.visit_expression(default);
                    }
                }
                for stmt in &mut f.body {
                    self.visit_statement(stmt);
                }
            }
            IrStatement::Class(c) => {
                for member in &mut c.members {
                    match member {
                        IrClassMember::Property(p) => {
                            if let Some(init) = &mut p.init {
                                self.visit_expression(init);
                            }
                        }
                        IrClassMember::Method(m) => {
                            for stmt in &mut m.body {
                                self.visit_statement(stmt);
                            }
                        }
                        IrClassMember::Constructor { body, .. } => {
                            for stmt in body {
                                self.visit_statement(stmt);
                            }
                        }
                    }
                }
            }
            IrStatement::Expr(e) | IrStatement::Throw(e) => self.visit_expression(e),
            IrStatement::Return(Some(e)) => self.visit_expression(e),
            IrStatement::Return(None) => {}
            IrStatement::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.visit_expression(cond);
                for stmt in then_branch {
                    self.visit_statement(stmt);
                }
                if let Some(else_branch) = else_branch {
                    for stmt in else_branch {
                        self.visit_statement(stmt);
                    }
                }
            }
            IrStatement::While { cond, body } => {
                self.visit_expression(cond);
                for stmt in body {
                    self.visit_statement(stmt);
                }
            }
            IrStatement::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.visit_statement(init);
                }
                if let Some(cond) = cond {
                    self.visit_expression(cond);
                }
                if let Some(update) = update {
                    self.visit_expression(update);
                }
                for stmt in body {
                    self.visit_statement(stmt);
                }
            }
            IrStatement::ForOf { iterable, body, .. } => {
                self.visit_expression(iterable);
                for stmt in body {
                    self.visit_statement(stmt);
                }
            }
            IrStatement::Try {
                block,
                catch_block,
                finally_block,
                ..
            } => {
                for stmt in block {
                    self.visit_statement(stmt);
                }
                if let Some(catch_block) = catch_block {
                    for stmt in catch_block {
                        self.visit_statement(stmt);
                    }
                }
                if let Some(finally_block) = finally_block {
                    for stmt in finally_block {
                        self.visit_statement(stmt);
                    }
                }
            }
            IrStatement::Block(stmts) => {
                for stmt in stmts {
                    self.visit_statement(stmt);
                }
            }
            IrStatement::Enum { members, .. } => {
                for member in members {
                    if let Some(init) = &mut member.init {
                        self.visit_expression(init);
                    }
                }
            }
            IrStatement::Interface(_)
            | IrStatement::TypeAlias { .. }
            | IrStatement::Break
            | IrStatement::Continue => {}
        }
    }

    /// Attach proofs bottom-up, then enforce index discipline.
    fn visit_expression(&mut self, expr: &mut IrExpression) {
        match &mut expr.kind {
            IrExpressionKind::Literal(_)
            | IrExpressionKind::Ident { .. }
            | IrExpressionKind::This
            | IrExpressionKind::Super => {}
            IrExpressionKind::Member { object, .. } => self.visit_expression(object),
            IrExpressionKind::Index { object, index } => {
                self.visit_expression(object);
                self.visit_expression(index);
                let needs_proof = match object.ty() {
                    IrType::Array { .. } | IrType::Primitive(IrPrimitive::String) => true,
                    IrType::Dictionary { key, .. } => key.is_int(),
                    _ => false,
                };
                if needs_proof && index.numeric_proof.is_none() {
                    let description = index
                        .inferred_type
                        .as_ref()
                        .map_or_else(|| "unknown".to_string(), IrType::display_name);
                    self.error(index.span, codes::UNPROVEN_INT_INDEX, &[&description]);
                }
            }
            IrExpressionKind::Call(call) | IrExpressionKind::New(call) => {
                self.visit_expression(&mut call.callee);
                for arg in &mut call.args {
                    self.visit_expression(arg);
                }
            }
            IrExpressionKind::Binary { left, right, .. } => {
                self.visit_expression(left);
                self.visit_expression(right);
            }
            IrExpressionKind::Unary { operand, .. } => self.visit_expression(operand),
            IrExpressionKind::Assign { target, value, .. } => {
                self.visit_expression(target);
                self.visit_expression(value);
                if target.ty().is_int() && value.ty().is_number() {
                    self.error(value.span, codes::IMPLICIT_NUMERIC_NARROWING, &[]);
                }
            }
            IrExpressionKind::Conditional {
                cond,
                when_true,
                when_false,
            } => {
                self.visit_expression(cond);
                self.visit_expression(when_true);
                self.visit_expression(when_false);
            }
            IrExpressionKind::Lambda { body, params, .. } => {
                for param in params {
                    if let Some(default) = &mut param.default {
                        self.visit_expression(default);
                    }
                }
                match body {
                    tsonic_ir::expr::IrLambdaBody::Expr(e) => self.visit_expression(e),
                    tsonic_ir::expr::IrLambdaBody::Block(stmts) => {
                        for stmt in stmts {
                            self.visit_statement(stmt);
                        }
                    }
                }
            }
            IrExpressionKind::ObjectLiteral { props, .. } => {
                for prop in props {
                    self.visit_expression(&mut prop.value);
                }
            }
            IrExpressionKind::ArrayLiteral(items) => {
                for item in items {
                    self.visit_expression(item);
                }
            }
            IrExpressionKind::TryCast { expr: inner, .. }
            | IrExpressionKind::Cast { expr: inner, .. } => self.visit_expression(inner),
            IrExpressionKind::Yield { expr: inner, .. } => {
                if let Some(inner) = inner {
                    self.visit_expression(inner);
                }
            }
            IrExpressionKind::Await(inner) => self.visit_expression(inner),
        }
        if let Some(proof) = self.prove(expr) {
            expr.numeric_proof = Some(proof);
        }
    }

    /// Derive an Int32 proof for an expression, if one exists.
    fn prove(&mut self, expr: &IrExpression) -> Option<NumericProof> {
        match &expr.kind {
            IrExpressionKind::Literal(IrLiteral::Number { lexeme, intent, .. }) => {
                if *intent == NumericIntent::Int32 && int_literal_in_range(lexeme) {
                    Some(NumericProof::int32(ProofSource::IntLiteralInRange))
                } else {
                    None
                }
            }
            IrExpressionKind::Ident { .. } => {
                if expr.ty().is_int() {
                    Some(NumericProof::int32(ProofSource::DeclaredInt))
                } else {
                    None
                }
            }
            IrExpressionKind::Member { .. } | IrExpressionKind::Index { .. } => {
                if expr.ty().is_int() {
                    Some(NumericProof::int32(ProofSource::RuntimeIntReturn))
                } else {
                    None
                }
            }
            IrExpressionKind::Call(_) | IrExpressionKind::New(_) => {
                if expr.ty().is_int() {
                    Some(NumericProof::int32(ProofSource::RuntimeIntReturn))
                } else {
                    None
                }
            }
            IrExpressionKind::Binary { op, left, right } => {
                // A proven operand is Int32 regardless of the widened
                // static type of the whole expression.
                let both_proven = left.numeric_proof.is_some() && right.numeric_proof.is_some();
                if (op.is_arithmetic() || op.is_bitwise()) && both_proven {
                    Some(NumericProof::int32(ProofSource::BinaryOverProven))
                } else {
                    None
                }
            }
            IrExpressionKind::Unary { operand, .. } => {
                if operand.numeric_proof.is_some() {
                    Some(NumericProof::int32(ProofSource::UnaryOverProven))
                } else {
                    None
                }
            }
            IrExpressionKind::Cast { expr: inner, target } => {
                if target.is_int() {
                    // `as int` is the sanctioned narrowing; validate that
                    // the source is numeric (or poisoned).
                    let source_ok = matches!(
                        inner.ty(),
                        IrType::Primitive(IrPrimitive::Number | IrPrimitive::Int)
                            | IrType::Unknown
                            | IrType::Any
                    );
                    if !source_ok {
                        self.error(expr.span, codes::IMPLICIT_NUMERIC_NARROWING, &[]);
                        return None;
                    }
                    Some(NumericProof::int32(ProofSource::DeclaredNarrowing))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsonic_ir::expr::IrCall;

    fn int_literal(lexeme: &str) -> IrExpression {
        IrExpression::typed(
            IrExpressionKind::Literal(IrLiteral::Number {
                lexeme: lexeme.into(),
                value: lexeme.parse().unwrap_or(0.0),
                intent: NumericIntent::Int32,
            }),
            IrType::INT,
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

    fn array_of_string() -> IrExpression {
        IrExpression::typed(
            IrExpressionKind::Ident {
                name: "arr".into(),
                decl: None,
            },
            IrType::array(IrType::STRING, tsonic_ir::types::ArrayOrigin::Explicit),
        )
    }

    #[test]
    fn test_int_literal_gets_proof() {
        let mut sink = DiagnosticSink::new();
        let stmt = IrStatement::Expr(int_literal("42"));
        let modules = run(vec![module_with(vec![stmt])], &mut sink);
        let IrStatement::Expr(expr) = &modules[0].statements[0] else {
            panic!();
        };
        assert_eq!(
            expr.numeric_proof,
            Some(NumericProof::int32(ProofSource::IntLiteralInRange))
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_length_minus_one_index_is_proven() {
        // arr[arr.length - 1]
        let length = IrExpression::typed(
            IrExpressionKind::Member {
                object: Box::new(array_of_string()),
                name: "length".into(),
                member: None,
                optional: false,
            },
            IrType::INT,
        );
        let minus = IrExpression::typed(
            IrExpressionKind::Binary {
                op: tsonic_ir::expr::IrBinaryOp::Sub,
                left: Box::new(length),
                right: Box::new(int_literal("1")),
            },
            IrType::INT,
        );
        let index = IrExpression::typed(
            IrExpressionKind::Index {
                object: Box::new(array_of_string()),
                index: Box::new(minus),
            },
            IrType::STRING,
        );
        let mut sink = DiagnosticSink::new();
        let modules = run(vec![module_with(vec![IrStatement::Expr(index)])], &mut sink);
        assert!(sink.is_empty(), "expected no TSN5107: {:?}", sink.all());
        let IrStatement::Expr(expr) = &modules[0].statements[0] else {
            panic!();
        };
        let IrExpressionKind::Index { index, .. } = &expr.kind else {
            panic!();
        };
        assert_eq!(
            index.numeric_proof,
            Some(NumericProof::int32(ProofSource::BinaryOverProven))
        );
    }

    #[test]
    fn test_unproven_index_reports_tsn5107() {
        let number_index = IrExpression::typed(
            IrExpressionKind::Ident {
                name: "i".into(),
                decl: None,
            },
            IrType::NUMBER,
        );
        let index = IrExpression::typed(
            IrExpressionKind::Index {
                object: Box::new(array_of_string()),
                index: Box::new(number_index),
            },
            IrType::STRING,
        );
        let mut sink = DiagnosticSink::new();
        run(vec![module_with(vec![IrStatement::Expr(index)])], &mut sink);
        assert!(
            sink.all()
                .iter()
                .any(|d| d.code == codes::UNPROVEN_INT_INDEX)
        );
    }

    #[test]
    fn test_as_int_narrowing_is_validated() {
        let cast = IrExpression::typed(
            IrExpressionKind::Cast {
                expr: Box::new(IrExpression::typed(
                    IrExpressionKind::Ident {
                        name: "n".into(),
                        decl: None,
                    },
                    IrType::NUMBER,
                )),
                target: IrType::INT,
            },
            IrType::INT,
        );
        let mut sink = DiagnosticSink::new();
        let modules = run(vec![module_with(vec![IrStatement::Expr(cast)])], &mut sink);
        assert!(sink.is_empty());
        let IrStatement::Expr(expr) = &modules[0].statements[0] else {
            panic!();
        };
        assert_eq!(
            expr.numeric_proof,
            Some(NumericProof::int32(ProofSource::DeclaredNarrowing))
        );
    }

    #[test]
    fn test_as_int_from_non_numeric_is_rejected() {
        let cast = IrExpression::typed(
            IrExpressionKind::Cast {
                expr: Box::new(IrExpression::typed(
                    IrExpressionKind::Ident {
                        name: "s".into(),
                        decl: None,
                    },
                    IrType::STRING,
                )),
                target: IrType::INT,
            },
            IrType::INT,
        );
        let mut sink = DiagnosticSink::new();
        run(vec![module_with(vec![IrStatement::Expr(cast)])], &mut sink);
        assert!(
            sink.all()
                .iter()
                .any(|d| d.code == codes::IMPLICIT_NUMERIC_NARROWING)
        );
    }

    #[test]
    fn test_implicit_narrowing_on_var_decl() {
        let stmt = IrStatement::VarDecl {
            name: "x".into(),
            declared_type: Some(IrType::INT),
            init: Some(IrExpression::typed(
                IrExpressionKind::Literal(IrLiteral::Number {
                    lexeme: "1.5".into(),
                    value: 1.5,
                    intent: NumericIntent::Double,
                }),
                IrType::NUMBER,
            )),
            is_const: false,
            exported: false,
            decl: None,
            span: None,
        };
        let mut sink = DiagnosticSink::new();
        run(vec![module_with(vec![stmt])], &mut sink);
        assert!(
            sink.all()
                .iter()
                .any(|d| d.code == codes::IMPLICIT_NUMERIC_NARROWING)
        );
    }

    #[test]
    fn test_call_with_int_return_is_proven() {
        let call = IrExpression::typed(
            IrExpressionKind::Call(IrCall {
                callee: Box::new(IrExpression::new(IrExpressionKind::Ident {
                    name: "parse".into(),
                    decl: None,
                })),
                type_args: Vec::new(),
                args: Vec::new(),
                arg_modes: Vec::new(),
                signature: None,
                requires_specialization: false,
                specialized_name: None,
            }),
            IrType::INT,
        );
        let mut sink = DiagnosticSink::new();
        let modules = run(vec![module_with(vec![IrStatement::Expr(call)])], &mut sink);
        let IrStatement::Expr(expr) = &modules[0].statements[0] else {
            panic!();
        };
        assert_eq!(
            expr.numeric_proof,
            Some(NumericProof::int32(ProofSource::RuntimeIntReturn))
        );
    }
}
