//! Anonymous object type synthesis.
//!
//! Object literals that reached this pass with a structural (non-nominal)
//! inferred type receive a synthesized nominal type named
//! `__Anon_<FileStem>_<Line>_<Col>` from their first occurrence site.
//! Identical shapes (same property names, types, optionality, readonly
//! flags) share one synthesized type: the shape signature is the stable
//! serialization of the sorted property list. Type parameters in scope
//! from the enclosing function are captured onto the synthesized type.
//!
//! Eligibility rejection (computed keys, accessors, method shorthand,
//! untyped spreads) happened during conversion; everything arriving here
//! is clean.

use indexmap::IndexMap;
use tracing::debug;
use tsonic_common::diagnostics::DiagnosticSink;
use tsonic_ir::expr::{IrExpression, IrExpressionKind};
use tsonic_ir::module::IrModule;
use tsonic_ir::stmt::{IrClass, IrClassMember, IrProperty, IrStatement, IrTypeParam};
use tsonic_ir::types::{IrType, ObjectProperty, stable_ir_type_key};
use tsonic_ir::visit::visit_module_expressions_mut;
use tsonic_surface::ast::Program;

/// One synthesized anonymous type.
#[derive(Clone, Debug)]
struct SynthesizedType {
    name: String,
    props: Vec<ObjectProperty>,
    type_params: Vec<String>,
    /// Index of the module the first occurrence lives in.
    home: usize,
}

/// Run the pass over all modules.
pub fn run(
    mut modules: Vec<IrModule>,
    program: &Program,
    _sink: &mut DiagnosticSink,
) -> Vec<IrModule> {
    // Shape signature → synthesized type, in first-encounter order.
    let mut by_shape: IndexMap<String, SynthesizedType> = IndexMap::new();

    for (module_index, module) in modules.iter_mut().enumerate() {
        let line_map = program
            .files
            .iter()
            .find(|f| f.path == module.file_path)
            .map(|f| f.line_map.clone());
        let stem = module
            .file_path
            .rsplit('/')
            .next()
            .and_then(|n| n.strip_suffix(".ts"))
            .unwrap_or("module")
            .to_string();

        visit_module_expressions_mut(module, &mut |expr: &mut IrExpression| {
            let IrExpressionKind::ObjectLiteral {
                synthesized_name, ..
            } = &mut expr.kind
            else {
                return;
            };
            let Some(IrType::Object(props)) = expr.inferred_type.clone() else {
                // A contextual nominal type was provided; nothing to do.
                return;
            };
            let shape = shape_signature(&props);
            let entry = by_shape.entry(shape).or_insert_with(|| {
                let (line, col) = expr
                    .span
                    .filter(|s| !s.is_dummy())
                    .and_then(|s| line_map.as_ref().map(|m| m.position(s.start)))
                    .map_or((0, 0), |p| (p.line + 1, p.column + 1));
                SynthesizedType {
                    name: format!("__Anon_{stem}_{line}_{col}"),
                    type_params: captured_type_params(&props),
                    props: props.clone(),
                    home: module_index,
                }
            });
            *synthesized_name = Some(entry.name.clone());
            expr.inferred_type = Some(IrType::Reference {
                name: entry.name.clone(),
                type_args: entry
                    .type_params
                    .iter()
                    .map(|p| IrType::TypeParameter(p.clone()))
                    .collect(),
                type_id: None,
            });
        });
    }

    // Materialize each synthesized type as a class in its home module.
    for synthesized in by_shape.values() {
        let class = IrStatement::Class(IrClass {
            name: synthesized.name.clone(),
            type_params: synthesized
                .type_params
                .iter()
                .map(|name| IrTypeParam {
                    name: name.clone(),
                    constraint: None,
                })
                .collect(),
            extends: None,
            implements: Vec::new(),
            members: synthesized
                .props
                .iter()
                .map(|p| {
                    IrClassMember::Property(IrProperty {
                        name: p.name.clone(),
                        ty: Some(p.ty.clone()),
                        optional: p.optional,
                        readonly: p.readonly,
                        is_static: false,
                        init: None,
                    })
                })
                .collect(),
            exported: false,
            decl: None,
            span: None,
        });
        modules[synthesized.home].statements.push(class);
    }
    debug!(synthesized = by_shape.len(), "anonymous synthesis complete");
    modules
}

/// The deduplication key: property names, optionality, readonly flags,
/// and types, sorted.
#[must_use]
pub fn shape_signature(props: &[ObjectProperty]) -> String {
    stable_ir_type_key(&IrType::Object(props.to_vec()))
}

/// Type parameters referenced by the property types, in first-use order.
fn captured_type_params(props: &[ObjectProperty]) -> Vec<String> {
    let mut captured = Vec::new();
    for prop in props {
        collect_type_params(&prop.ty, &mut captured);
    }
    captured
}

fn collect_type_params(ty: &IrType, captured: &mut Vec<String>) {
    match ty {
        IrType::TypeParameter(name) => {
            if !captured.contains(name) {
                captured.push(name.clone());
            }
        }
        IrType::Reference { type_args, .. } => {
            for arg in type_args {
                collect_type_params(arg, captured);
            }
        }
        IrType::Array { element, .. } => collect_type_params(element, captured),
        IrType::Tuple(elements) => {
            for e in elements {
                collect_type_params(e, captured);
            }
        }
        IrType::Function {
            params,
            return_type,
        } => {
            for p in params {
                collect_type_params(p, captured);
            }
            collect_type_params(return_type, captured);
        }
        IrType::Object(props) => {
            for p in props {
                collect_type_params(&p.ty, captured);
            }
        }
        IrType::Dictionary { key, value } => {
            collect_type_params(key, captured);
            collect_type_params(value, captured);
        }
        IrType::Union(members) | IrType::Intersection(members) => {
            for m in members {
                collect_type_params(m, captured);
            }
        }
        _ => {}
    }
}
