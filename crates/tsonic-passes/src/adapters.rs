//! Structural-constraint adapters.
//!
//! A type parameter constrained by an object shape
//! (`T extends {id: number}`) induces two synthesized declarations: an
//! interface `__Constraint_T` enumerating the constrained members and a
//! wrapper class `__Wrapper_T` implementing it. The original constraint
//! becomes `where T : __Constraint_T` in the target. Property names,
//! optionality, and readonly flags are preserved.

use indexmap::IndexMap;
use tracing::debug;
use tsonic_ir::module::IrModule;
use tsonic_ir::stmt::{
    IrClass, IrClassMember, IrInterface, IrInterfaceMember, IrProperty, IrStatement, IrTypeParam,
};
use tsonic_ir::types::{IrType, ObjectProperty, stable_ir_type_key};

/// Run the pass over all modules.
pub fn run(mut modules: Vec<IrModule>) -> Vec<IrModule> {
    let mut total = 0usize;
    for module in &mut modules {
        // (param name, shape key) → adapter base name, per module.
        let mut adapters: IndexMap<(String, String), AdapterSeed> = IndexMap::new();
        for stmt in &mut module.statements {
            match stmt {
                IrStatement::Function(f) => {
                    rewrite_constraints(&mut f.type_params, &mut adapters);
                }
                IrStatement::Class(c) => {
                    rewrite_constraints(&mut c.type_params, &mut adapters);
                    for member in &mut c.members {
                        if let IrClassMember::Method(m) = member {
                            rewrite_constraints(&mut m.type_params, &mut adapters);
                        }
                    }
                }
                _ => {}
            }
        }
        total += adapters.len();
        for seed in adapters.into_values() {
            materialize(module, seed);
        }
    }
    debug!(adapters = total, "structural adapters complete");
    modules
}

struct AdapterSeed {
    constraint_name: String,
    wrapper_name: String,
    props: Vec<ObjectProperty>,
}

/// Rewrite object-shaped constraints in a type-parameter list to
/// references to their synthesized constraint interfaces.
fn rewrite_constraints(
    type_params: &mut [IrTypeParam],
    adapters: &mut IndexMap<(String, String), AdapterSeed>,
) {
    for tp in type_params {
        let Some(IrType::Object(props)) = &tp.constraint else {
            continue;
        };
        let shape = stable_ir_type_key(&IrType::Object(props.clone()));
        let key = (tp.name.clone(), shape);
        // A second distinct shape under the same parameter name gets a
        // disambiguating ordinal.
        let same_name = adapters
            .keys()
            .filter(|(name, _)| name == &tp.name)
            .count();
        let seed = adapters.entry(key).or_insert_with(|| {
            let base = if same_name == 0 {
                tp.name.clone()
            } else {
                format!("{}_{}", tp.name, same_name + 1)
            };
            AdapterSeed {
                constraint_name: format!("__Constraint_{base}"),
                wrapper_name: format!("__Wrapper_{base}"),
                props: props.clone(),
            }
        });
        tp.constraint = Some(IrType::reference(seed.constraint_name.clone(), Vec::new()));
    }
}

/// Append the synthesized interface/wrapper pair to the module.
fn materialize(module: &mut IrModule, seed: AdapterSeed) {
    module.statements.push(IrStatement::Interface(IrInterface {
        name: seed.constraint_name.clone(),
        type_params: Vec::new(),
        extends: Vec::new(),
        members: seed
            .props
            .iter()
            .map(|p| IrInterfaceMember::Property {
                name: p.name.clone(),
                ty: p.ty.clone(),
                optional: p.optional,
                readonly: p.readonly,
            })
            .collect(),
        exported: false,
        is_constraint_adapter: true,
        decl: None,
        span: None,
    }));
    module.statements.push(IrStatement::Class(IrClass {
        name: seed.wrapper_name,
        type_params: Vec::new(),
        extends: None,
        implements: vec![IrType::reference(seed.constraint_name, Vec::new())],
        members: seed
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
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsonic_ir::stmt::IrFunction;

    fn constrained_function() -> IrFunction {
        IrFunction {
            name: "process".into(),
            type_params: vec![IrTypeParam {
                name: "T".into(),
                constraint: Some(IrType::Object(vec![
                    ObjectProperty {
                        name: "id".into(),
                        ty: IrType::NUMBER,
                        optional: false,
                        readonly: false,
                    },
                    ObjectProperty {
                        name: "name".into(),
                        ty: IrType::STRING,
                        optional: false,
                        readonly: true,
                    },
                ])),
            }],
            params: Vec::new(),
            return_type: None,
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

    #[test]
    fn test_constraint_induces_adapter_pair() {
        let module = module_with(vec![IrStatement::Function(constrained_function())]);
        let modules = run(vec![module]);
        let stmts = &modules[0].statements;
        // Constraint rewritten on the function.
        let IrStatement::Function(f) = &stmts[0] else {
            panic!();
        };
        assert_eq!(
            f.type_params[0].constraint,
            Some(IrType::reference("__Constraint_T", Vec::new()))
        );
        // Interface preserves names, optionality, readonly.
        let interface = stmts
            .iter()
            .find_map(|s| match s {
                IrStatement::Interface(i) if i.name == "__Constraint_T" => Some(i),
                _ => None,
            })
            .unwrap();
        assert!(interface.is_constraint_adapter);
        assert_eq!(interface.members.len(), 2);
        let IrInterfaceMember::Property { name, readonly, .. } = &interface.members[1] else {
            panic!();
        };
        assert_eq!(name, "name");
        assert!(readonly);
        // Wrapper class implements the interface.
        let wrapper = stmts
            .iter()
            .find_map(|s| match s {
                IrStatement::Class(c) if c.name == "__Wrapper_T" => Some(c),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            wrapper.implements,
            vec![IrType::reference("__Constraint_T", Vec::new())]
        );
        assert_eq!(wrapper.members.len(), 2);
    }

    #[test]
    fn test_same_shape_same_param_shares_adapter() {
        let module = module_with(vec![
            IrStatement::Function(constrained_function()),
            IrStatement::Function(constrained_function()),
        ]);
        let modules = run(vec![module]);
        let interface_count = modules[0]
            .statements
            .iter()
            .filter(|s| matches!(s, IrStatement::Interface(_)))
            .count();
        assert_eq!(interface_count, 1);
    }

    #[test]
    fn test_plain_constraint_is_untouched() {
        let mut f = constrained_function();
        f.type_params[0].constraint = Some(IrType::reference("Comparable", Vec::new()));
        let module = module_with(vec![IrStatement::Function(f)]);
        let modules = run(vec![module]);
        assert_eq!(modules[0].statements.len(), 1);
        let IrStatement::Function(f) = &modules[0].statements[0] else {
            panic!();
        };
        assert_eq!(
            f.type_params[0].constraint,
            Some(IrType::reference("Comparable", Vec::new()))
        );
    }
}
