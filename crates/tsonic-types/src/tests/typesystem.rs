use super::*;
use tsonic_surface::TreeBuilder;
use tsonic_surface::ast::{NodeKind, TypeParam};

fn catalog_for(program: &Program, binder: &Binder) -> (TypeCatalog, AliasTable) {
    let mut catalog = TypeCatalog::with_builtins();
    let aliases = AliasTable::new();
    catalog.add_source_types(program, binder, "App");
    (catalog, aliases)
}

#[test]
fn test_type_of_decl_uses_captured_syntax() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    let int_ty = builder.type_ref("int", Vec::new());
    let var = builder.node(NodeKind::Var {
        name: "x".into(),
        declared_type: Some(int_ty),
        init: None,
        is_const: false,
        exported: false,
    });
    builder.item(var);
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let decl = binder.decl_of_node(var).unwrap();
    assert_eq!(ts.type_of_decl(decl), IrType::INT);
}

#[test]
fn test_type_from_syntax_compound_nodes() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    let string_ty = builder.type_ref("string", Vec::new());
    let null_ty = builder.type_ref("null", Vec::new());
    let union = builder.node(NodeKind::UnionType(vec![string_ty, null_ty]));
    let arr = builder.node(NodeKind::ArrayType { element: union });
    let var = builder.node(NodeKind::Var {
        name: "xs".into(),
        declared_type: Some(arr),
        init: None,
        is_const: false,
        exported: false,
    });
    builder.item(var);
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let decl = binder.decl_of_node(var).unwrap();
    assert_eq!(
        ts.type_of_decl(decl),
        IrType::Array {
            element: Box::new(IrType::union(vec![IrType::STRING, IrType::NULL])),
            origin: ArrayOrigin::Explicit,
        }
    );
}

#[test]
fn test_lone_index_signature_is_dictionary() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    let key = builder.type_ref("string", Vec::new());
    let value = builder.type_ref("int", Vec::new());
    let dict = builder.node(NodeKind::ObjectType {
        members: vec![ObjectTypeMember::Index {
            key_type: key,
            value_type: value,
        }],
    });
    let var = builder.node(NodeKind::Var {
        name: "counts".into(),
        declared_type: Some(dict),
        init: None,
        is_const: false,
        exported: false,
    });
    builder.item(var);
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let decl = binder.decl_of_node(var).unwrap();
    assert_eq!(
        ts.type_of_decl(decl),
        IrType::Dictionary {
            key: Box::new(IrType::STRING),
            value: Box::new(IrType::INT),
        }
    );
}

#[test]
fn test_utility_types_expand_on_concrete_arguments() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    // type Person = { name: string; age: number };
    let name_ty = builder.type_ref("string", Vec::new());
    let age_ty = builder.type_ref("number", Vec::new());
    let person_body = builder.node(NodeKind::ObjectType {
        members: vec![
            ObjectTypeMember::Property {
                name: "name".into(),
                type_annotation: name_ty,
                optional: false,
                readonly: false,
            },
            ObjectTypeMember::Property {
                name: "age".into(),
                type_annotation: age_ty,
                optional: false,
                readonly: false,
            },
        ],
    });
    let alias = builder.node(NodeKind::TypeAlias {
        name: "Person".into(),
        type_params: Vec::new(),
        body: person_body,
        exported: false,
    });
    builder.item(alias);
    // let p: Partial<Person>;
    let person_ref = builder.type_ref("Person", Vec::new());
    let partial = builder.type_ref("Partial", vec![person_ref]);
    let var = builder.node(NodeKind::Var {
        name: "p".into(),
        declared_type: Some(partial),
        init: None,
        is_const: false,
        exported: false,
    });
    builder.item(var);
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let decl = binder.decl_of_node(var).unwrap();
    let IrType::Object(props) = ts.type_of_decl(decl) else {
        panic!("expected object type");
    };
    assert_eq!(props.len(), 2);
    assert!(props.iter().all(|p| p.optional));
}

#[test]
fn test_utility_type_on_type_parameter_falls_through() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    // function f<T>(x: Partial<T>): void {}
    let t_ref = builder.type_ref("T", Vec::new());
    let partial = builder.type_ref("Partial", vec![t_ref]);
    let param = builder.param("x", Some(partial));
    let void_ty = builder.type_ref("void", Vec::new());
    let func = builder.node(NodeKind::Function {
        name: "f".into(),
        type_params: vec![TypeParam {
            name: "T".into(),
            constraint: None,
            default: None,
        }],
        params: vec![param],
        return_type: Some(void_ty),
        body: Vec::new(),
        is_generator: false,
        is_async: false,
        exported: false,
    });
    builder.item(func);
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let sig = binder.signature_of_node(func).unwrap();
    let resolved = ts.resolve_call(&CallQuery {
        sig: Some(sig),
        argument_count: 1,
        ..CallQuery::default()
    });
    // Un-inferred T leaves Partial<T> as a plain reference with
    // `unknown` substituted for the parameter.
    assert_eq!(
        resolved.parameter_types[0],
        IrType::Reference {
            name: "Partial".into(),
            type_args: vec![IrType::Unknown],
            type_id: None,
        }
    );
}

#[test]
fn test_record_expands_to_dictionary() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    let key = builder.type_ref("string", Vec::new());
    let value = builder.type_ref("boolean", Vec::new());
    let record = builder.type_ref("Record", vec![key, value]);
    let var = builder.node(NodeKind::Var {
        name: "flags".into(),
        declared_type: Some(record),
        init: None,
        is_const: false,
        exported: false,
    });
    builder.item(var);
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let decl = binder.decl_of_node(var).unwrap();
    assert_eq!(
        ts.type_of_decl(decl),
        IrType::Dictionary {
            key: Box::new(IrType::STRING),
            value: Box::new(IrType::BOOLEAN),
        }
    );
}

fn generic_identity() -> (Program, tsonic_surface::ast::NodeId) {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    let t_param_ty = builder.type_ref("T", Vec::new());
    let param = builder.param("x", Some(t_param_ty));
    let t_ret = builder.type_ref("T", Vec::new());
    let func = builder.node(NodeKind::Function {
        name: "id".into(),
        type_params: vec![TypeParam {
            name: "T".into(),
            constraint: None,
            default: None,
        }],
        params: vec![param],
        return_type: Some(t_ret),
        body: Vec::new(),
        is_generator: false,
        is_async: false,
        exported: true,
    });
    builder.item(func);
    (builder.finish(), func)
}

#[test]
fn test_resolve_call_infers_from_arg_types() {
    let (program, func) = generic_identity();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let sig = binder.signature_of_node(func).unwrap();
    let args = [IrType::STRING];
    let resolved = ts.resolve_call(&CallQuery {
        sig: Some(sig),
        argument_count: 1,
        arg_types: Some(&args),
        ..CallQuery::default()
    });
    assert_eq!(resolved.parameter_types, vec![IrType::STRING]);
    assert_eq!(resolved.return_type, IrType::STRING);
    assert_eq!(resolved.inferred_type_args, vec![IrType::STRING]);
    assert!(resolved.generic);
}

#[test]
fn test_resolve_call_explicit_type_args_win() {
    let (program, func) = generic_identity();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let sig = binder.signature_of_node(func).unwrap();
    let explicit = [IrType::INT];
    let resolved = ts.resolve_call(&CallQuery {
        sig: Some(sig),
        argument_count: 1,
        explicit_type_args: &explicit,
        ..CallQuery::default()
    });
    assert_eq!(resolved.return_type, IrType::INT);
}

#[test]
fn test_resolve_call_poisoned_result_sized_to_argc() {
    let (program, _) = generic_identity();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let resolved = ts.resolve_call(&CallQuery {
        sig: None,
        argument_count: 3,
        file: "main.ts",
        ..CallQuery::default()
    });
    assert_eq!(resolved.parameter_types.len(), 3);
    assert_eq!(resolved.parameter_modes.len(), 3);
    assert!(resolved.parameter_types.iter().all(IrType::is_unknown));
    assert_eq!(resolved.return_type, IrType::Unknown);
    assert!(!resolved.diagnostics.is_empty());
}

#[test]
fn test_resolve_call_pads_extra_arguments() {
    let (program, func) = generic_identity();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let sig = binder.signature_of_node(func).unwrap();
    let resolved = ts.resolve_call(&CallQuery {
        sig: Some(sig),
        argument_count: 3,
        ..CallQuery::default()
    });
    assert_eq!(resolved.parameter_types.len(), 3);
    assert!(resolved.parameter_types[1].is_unknown());
    assert!(resolved.parameter_types[2].is_unknown());
}

#[test]
fn test_string_length_bridges_to_companion() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    assert_eq!(ts.type_of_member(&IrType::STRING, "length"), IrType::INT);
    let array = IrType::array(IrType::STRING, ArrayOrigin::Explicit);
    assert_eq!(ts.type_of_member(&array, "length"), IrType::INT);
}

#[test]
fn test_member_on_unnormalizable_receiver_is_unknown() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let receiver = IrType::union(vec![IrType::STRING, IrType::INT]);
    assert_eq!(ts.type_of_member(&receiver, "length"), IrType::Unknown);
}

#[test]
fn test_generic_class_member_substitution() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    // class Box<T> { value: T }
    let t_ty = builder.type_ref("T", Vec::new());
    let value_prop = builder.node(NodeKind::Property {
        name: "value".into(),
        type_annotation: Some(t_ty),
        optional: false,
        readonly: false,
        is_static: false,
        init: None,
    });
    let class = builder.node(NodeKind::Class {
        name: "Box".into(),
        type_params: vec![TypeParam {
            name: "T".into(),
            constraint: None,
            default: None,
        }],
        extends: None,
        implements: Vec::new(),
        members: vec![value_prop],
        exported: false,
    });
    builder.item(class);
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let box_id = catalog.resolve_ts_name("Box").unwrap();
    let receiver = IrType::Reference {
        name: "Box".into(),
        type_args: vec![IrType::STRING],
        type_id: Some(box_id),
    };
    assert_eq!(ts.type_of_member(&receiver, "value"), IrType::STRING);
}

#[test]
fn test_inherited_member_substitution_along_chain() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    // class Base<T> { item: T }
    let t_ty = builder.type_ref("T", Vec::new());
    let item_prop = builder.node(NodeKind::Property {
        name: "item".into(),
        type_annotation: Some(t_ty),
        optional: false,
        readonly: false,
        is_static: false,
        init: None,
    });
    let base = builder.node(NodeKind::Class {
        name: "Base".into(),
        type_params: vec![TypeParam {
            name: "T".into(),
            constraint: None,
            default: None,
        }],
        extends: None,
        implements: Vec::new(),
        members: vec![item_prop],
        exported: false,
    });
    builder.item(base);
    // class Derived extends Base<string> {}
    let string_ty = builder.type_ref("string", Vec::new());
    let base_ref = builder.type_ref("Base", vec![string_ty]);
    let derived = builder.node(NodeKind::Class {
        name: "Derived".into(),
        type_params: Vec::new(),
        extends: Some(base_ref),
        implements: Vec::new(),
        members: Vec::new(),
        exported: false,
    });
    builder.item(derived);
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let derived_id = catalog.resolve_ts_name("Derived").unwrap();
    let receiver = IrType::Reference {
        name: "Derived".into(),
        type_args: Vec::new(),
        type_id: Some(derived_id),
    };
    assert_eq!(ts.type_of_member(&receiver, "item"), IrType::STRING);
}

#[test]
fn test_type_predicate_resolution() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    // class Cat {}  function isCat(x: Animal): x is Cat
    let cat = builder.node(NodeKind::Class {
        name: "Cat".into(),
        type_params: Vec::new(),
        extends: None,
        implements: Vec::new(),
        members: Vec::new(),
        exported: false,
    });
    builder.item(cat);
    let animal = builder.node(NodeKind::Class {
        name: "Animal".into(),
        type_params: Vec::new(),
        extends: None,
        implements: Vec::new(),
        members: Vec::new(),
        exported: false,
    });
    builder.item(animal);
    let animal_ty = builder.type_ref("Animal", Vec::new());
    let param = builder.param("x", Some(animal_ty));
    let cat_ty = builder.type_ref("Cat", Vec::new());
    let predicate = builder.node(NodeKind::TypePredicate {
        param: "x".into(),
        target: cat_ty,
    });
    let func = builder.node(NodeKind::Function {
        name: "isCat".into(),
        type_params: Vec::new(),
        params: vec![param],
        return_type: Some(predicate),
        body: Vec::new(),
        is_generator: false,
        is_async: false,
        exported: false,
    });
    builder.item(func);
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let sig = binder.signature_of_node(func).unwrap();
    let resolved = ts.resolve_call(&CallQuery {
        sig: Some(sig),
        argument_count: 1,
        ..CallQuery::default()
    });
    assert_eq!(resolved.return_type, IrType::BOOLEAN);
    let predicate = resolved.type_predicate.unwrap();
    assert_eq!(predicate.param, "x");
    assert_eq!(predicate.param_index, Some(0));
    assert!(matches!(
        predicate.ty,
        IrType::Reference { ref name, .. } if name == "Cat"
    ));
}

#[test]
fn test_resolve_member_call_on_builtin() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let resolved = ts.resolve_member_call(&IrType::STRING, "substring", 2);
    assert_eq!(resolved.parameter_types, vec![IrType::INT, IrType::INT]);
    assert_eq!(resolved.return_type, IrType::STRING);
    assert_eq!(
        resolved.parameter_modes,
        vec![ParamMode::Value, ParamMode::Value]
    );
}

#[test]
fn test_constructor_returns_instance_type() {
    let mut builder = TreeBuilder::new();
    builder.file("main.ts");
    let int_ty = builder.type_ref("int", Vec::new());
    let param = builder.param("x", Some(int_ty));
    let ctor = builder.node(NodeKind::Constructor {
        params: vec![param],
        body: Vec::new(),
    });
    let class = builder.node(NodeKind::Class {
        name: "Point".into(),
        type_params: Vec::new(),
        extends: None,
        implements: Vec::new(),
        members: vec![ctor],
        exported: false,
    });
    builder.item(class);
    let program = builder.finish();
    let binder = Binder::bind(&program);
    let (catalog, aliases) = catalog_for(&program, &binder);
    let ts = TypeSystem::new(&program, &binder, &catalog, &aliases);
    let decl = binder.decl_of_node(class).unwrap();
    let sig = binder.constructor_signature_of(decl).unwrap();
    let resolved = ts.resolve_call(&CallQuery {
        sig: Some(sig),
        argument_count: 1,
        ..CallQuery::default()
    });
    assert_eq!(resolved.parameter_types, vec![IrType::INT]);
    assert!(matches!(
        resolved.return_type,
        IrType::Reference { ref name, .. } if name == "Point"
    ));
}
