//! IR type → C# type lowering.
//!
//! Primitive mapping: `string → string`, `int → int`, `number → double`,
//! `boolean → bool`, `char → char`. Arrays emit as native arrays
//! regardless of origin; tuples as value-tuples; dictionaries as
//! `Dictionary<TKey, TValue>`. `T | null` / `T | undefined` become
//! nullable types.

use tsonic_ir::types::{IrLiteralType, IrPrimitive, IrType};

use crate::cs::{CsPrimitive, CsType};
use crate::emit_context::EmitContext;

/// Lower an IR type.
pub fn lower_type(ctx: &mut EmitContext<'_>, ty: &IrType) -> CsType {
    match ty {
        IrType::Primitive(p) => match p {
            IrPrimitive::String => CsType::Primitive(CsPrimitive::String),
            IrPrimitive::Number => CsType::Primitive(CsPrimitive::Double),
            IrPrimitive::Int => CsType::Primitive(CsPrimitive::Int),
            IrPrimitive::Char => CsType::Primitive(CsPrimitive::Char),
            IrPrimitive::Boolean => CsType::Primitive(CsPrimitive::Bool),
            IrPrimitive::Null | IrPrimitive::Undefined => {
                CsType::Nullable(Box::new(CsType::Primitive(CsPrimitive::Object)))
            }
        },
        IrType::Reference {
            name, type_args, ..
        } => {
            if name == "Promise" && type_args.len() == 1 {
                ctx.add_using("System.Threading.Tasks");
                let arg = lower_type(ctx, &type_args[0]);
                return CsType::generic("Task", vec![arg]);
            }
            let args = type_args.iter().map(|a| lower_type(ctx, a)).collect();
            CsType::Named {
                name: name.clone(),
                args,
            }
        }
        IrType::TypeParameter(name) => CsType::named(name.clone()),
        IrType::Array { element, .. } => CsType::Array(Box::new(lower_type(ctx, element))),
        IrType::Tuple(elements) => CsType::Tuple(
            elements
                .iter()
                .map(|e| (None, lower_type(ctx, e)))
                .collect(),
        ),
        IrType::Function {
            params,
            return_type,
        } => {
            ctx.add_using("System");
            let mut args: Vec<CsType> = params.iter().map(|p| lower_type(ctx, p)).collect();
            if matches!(return_type.as_ref(), IrType::Void) {
                if args.is_empty() {
                    CsType::named("Action")
                } else {
                    CsType::generic("Action", args)
                }
            } else {
                args.push(lower_type(ctx, return_type));
                CsType::generic("Func", args)
            }
        }
        IrType::Object(_) => CsType::Primitive(CsPrimitive::Object),
        IrType::Dictionary { key, value } => {
            ctx.add_using("System.Collections.Generic");
            let key = lower_type(ctx, key);
            let value = lower_type(ctx, value);
            CsType::generic("Dictionary", vec![key, value])
        }
        IrType::Union(members) => lower_union(ctx, members),
        IrType::Intersection(_) => CsType::Primitive(CsPrimitive::Object),
        IrType::Literal(lit) => match lit {
            IrLiteralType::String(_) => CsType::Primitive(CsPrimitive::String),
            IrLiteralType::Number(lexeme) => {
                if lexeme.contains('.') || lexeme.contains('e') || lexeme.contains('E') {
                    CsType::Primitive(CsPrimitive::Double)
                } else {
                    CsType::Primitive(CsPrimitive::Int)
                }
            }
            IrLiteralType::Boolean(_) => CsType::Primitive(CsPrimitive::Bool),
        },
        IrType::Any | IrType::Unknown => CsType::Primitive(CsPrimitive::Object),
        IrType::Void | IrType::Never => CsType::Void,
    }
}

/// `T | null` → `T?`; anything wider collapses to `object`.
fn lower_union(ctx: &mut EmitContext<'_>, members: &[IrType]) -> CsType {
    let non_null: Vec<&IrType> = members
        .iter()
        .filter(|m| {
            !matches!(
                m,
                IrType::Primitive(IrPrimitive::Null | IrPrimitive::Undefined)
            )
        })
        .collect();
    let had_null = non_null.len() != members.len();
    if non_null.len() == 1 {
        let inner = lower_type(ctx, non_null[0]);
        if had_null {
            return match inner {
                CsType::Nullable(_) => inner,
                other => CsType::Nullable(Box::new(other)),
            };
        }
        return inner;
    }
    let base = CsType::Primitive(CsPrimitive::Object);
    if had_null {
        CsType::Nullable(Box::new(base))
    } else {
        base
    }
}

/// An optional declaration site (`x?: T`) admits null.
pub fn lower_optional_type(ctx: &mut EmitContext<'_>, ty: &IrType) -> CsType {
    let lowered = lower_type(ctx, ty);
    match lowered {
        CsType::Nullable(_) => lowered,
        other => CsType::Nullable(Box::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsonic_common::diagnostics::DiagnosticSink;
    use tsonic_ir::types::ArrayOrigin;
    use tsonic_types::TypeCatalog;

    fn with_ctx<R>(f: impl FnOnce(&mut EmitContext<'_>) -> R) -> R {
        let catalog = TypeCatalog::with_builtins();
        let mut sink = DiagnosticSink::new();
        let mut ctx = EmitContext::new(&catalog, &mut sink, "main.ts", "App", "Main");
        f(&mut ctx)
    }

    #[test]
    fn test_primitive_mapping() {
        with_ctx(|ctx| {
            assert_eq!(
                lower_type(ctx, &IrType::NUMBER),
                CsType::Primitive(CsPrimitive::Double)
            );
            assert_eq!(
                lower_type(ctx, &IrType::INT),
                CsType::Primitive(CsPrimitive::Int)
            );
            assert_eq!(
                lower_type(ctx, &IrType::BOOLEAN),
                CsType::Primitive(CsPrimitive::Bool)
            );
        });
    }

    #[test]
    fn test_arrays_emit_native_both_origins() {
        with_ctx(|ctx| {
            let explicit = IrType::array(IrType::STRING, ArrayOrigin::Explicit);
            let inferred = IrType::array(IrType::STRING, ArrayOrigin::Inferred);
            let expected = CsType::Array(Box::new(CsType::Primitive(CsPrimitive::String)));
            assert_eq!(lower_type(ctx, &explicit), expected);
            assert_eq!(lower_type(ctx, &inferred), expected);
        });
    }

    #[test]
    fn test_dictionary_lowering_adds_using() {
        with_ctx(|ctx| {
            let dict = IrType::Dictionary {
                key: Box::new(IrType::STRING),
                value: Box::new(IrType::INT),
            };
            let lowered = lower_type(ctx, &dict);
            assert_eq!(
                lowered,
                CsType::generic(
                    "Dictionary",
                    vec![
                        CsType::Primitive(CsPrimitive::String),
                        CsType::Primitive(CsPrimitive::Int),
                    ]
                )
            );
            assert!(ctx.usings.contains("System.Collections.Generic"));
        });
    }

    #[test]
    fn test_nullable_union() {
        with_ctx(|ctx| {
            let ty = IrType::union(vec![IrType::reference("Person", Vec::new()), IrType::NULL]);
            assert_eq!(
                lower_type(ctx, &ty),
                CsType::Nullable(Box::new(CsType::named("Person")))
            );
        });
    }

    #[test]
    fn test_function_types_become_delegates() {
        with_ctx(|ctx| {
            let f = IrType::Function {
                params: vec![IrType::INT],
                return_type: Box::new(IrType::STRING),
            };
            assert_eq!(
                lower_type(ctx, &f),
                CsType::generic(
                    "Func",
                    vec![
                        CsType::Primitive(CsPrimitive::Int),
                        CsType::Primitive(CsPrimitive::String),
                    ]
                )
            );
            let action = IrType::Function {
                params: vec![IrType::INT],
                return_type: Box::new(IrType::Void),
            };
            assert_eq!(
                lower_type(ctx, &action),
                CsType::generic("Action", vec![CsType::Primitive(CsPrimitive::Int)])
            );
        });
    }
}
