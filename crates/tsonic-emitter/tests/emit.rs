//! End-to-end emission tests: surface tree → binding → typing → IR →
//! middle passes → lowering → text.

use tsonic_binder::Binder;
use tsonic_common::diagnostics::{DiagnosticSink, codes};
use tsonic_common::span::Span;
use tsonic_emitter::lower_module;
use tsonic_emitter::printer::print_unit;
use tsonic_irgen::build_modules;
use tsonic_surface::TreeBuilder;
use tsonic_surface::ast::{NodeKind, ObjectProp, Program, PropKey, TypeParam};
use tsonic_types::{AliasTable, TypeCatalog, TypeSystem};

/// Run the whole pipeline over a program, returning one text per module
/// plus the collected diagnostics.
fn compile(program: &Program) -> (Vec<String>, DiagnosticSink) {
    let binder = Binder::bind(program);
    let mut catalog = TypeCatalog::with_builtins();
    let aliases = AliasTable::new();
    catalog.add_source_types(program, &binder, "App");
    let types = TypeSystem::new(program, &binder, &catalog, &aliases);
    let mut sink = DiagnosticSink::new();
    let modules = build_modules(program, &binder, &types, "App", &mut sink);
    let modules = tsonic_passes::run_all(modules, program, &types, &mut sink);
    let texts = modules
        .iter()
        .map(|m| print_unit(&lower_module(m, &catalog, &mut sink, None)))
        .collect();
    (texts, sink)
}

fn errors_of(sink: &DiagnosticSink) -> Vec<u32> {
    sink.all()
        .iter()
        .filter(|d| d.severity == tsonic_common::diagnostics::Severity::Error)
        .map(|d| d.code)
        .collect()
}

// =============================================================================
// Scenario 1: generic identity
// =============================================================================

#[test]
fn test_generic_identity_emits_generic_method_and_typed_call() {
    let mut b = TreeBuilder::new();
    b.file("util.ts");
    let t_param = b.type_ref("T", Vec::new());
    let param = b.param("x", Some(t_param));
    let t_ret = b.type_ref("T", Vec::new());
    let x_use = b.ident("x");
    let ret = b.node(NodeKind::Return(Some(x_use)));
    let func = b.node(NodeKind::Function {
        name: "id".into(),
        type_params: vec![TypeParam {
            name: "T".into(),
            constraint: None,
            default: None,
        }],
        params: vec![param],
        return_type: Some(t_ret),
        body: vec![ret],
        is_generator: false,
        is_async: false,
        exported: true,
    });
    b.item(func);
    b.record_use(x_use, param);

    let callee = b.ident("id");
    let arg = b.string("hello");
    let call = b.node(NodeKind::Call {
        callee,
        type_args: Vec::new(),
        args: vec![arg],
    });
    let stmt = b.node(NodeKind::ExprStmt(call));
    b.item(stmt);
    b.record_call_target(call, func);

    let program = b.finish();
    let (texts, sink) = compile(&program);
    assert!(!sink.has_errors(), "unexpected errors: {:?}", sink.all());
    let text = &texts[0];
    assert!(text.contains("public static T id<T>(T x)"), "{text}");
    assert!(text.contains("return x;"), "{text}");
    assert!(text.contains("id<string>(\"hello\");"), "{text}");
}

// =============================================================================
// Scenario 2: proven integer indexing
// =============================================================================

#[test]
fn test_length_indexing_is_proven_and_renamed() {
    let mut b = TreeBuilder::new();
    b.file("main.ts");
    let string_ty = b.type_ref("string", Vec::new());
    let arr_ty = b.node(NodeKind::ArrayType { element: string_ty });
    let arr_var = b.node(NodeKind::Var {
        name: "arr".into(),
        declared_type: Some(arr_ty),
        init: None,
        is_const: false,
        exported: false,
    });
    b.item(arr_var);

    let arr_use1 = b.ident("arr");
    let arr_use2 = b.ident("arr");
    let length = b.node(NodeKind::PropertyAccess {
        object: arr_use2,
        name: "length".into(),
        optional: false,
    });
    let one = b.number("1");
    let minus = b.node(NodeKind::Binary {
        op: tsonic_surface::ast::BinaryOp::Sub,
        left: length,
        right: one,
    });
    let index = b.node(NodeKind::ElementAccess {
        object: arr_use1,
        index: minus,
    });
    let stmt = b.node(NodeKind::ExprStmt(index));
    b.item(stmt);
    b.record_use(arr_use1, arr_var);
    b.record_use(arr_use2, arr_var);

    let program = b.finish();
    let (texts, sink) = compile(&program);
    assert!(
        !errors_of(&sink).contains(&codes::UNPROVEN_INT_INDEX),
        "unexpected TSN5107: {:?}",
        sink.all()
    );
    assert!(texts[0].contains("arr[arr.Length - 1];"), "{}", texts[0]);
}

#[test]
fn test_unproven_index_is_rejected() {
    let mut b = TreeBuilder::new();
    b.file("main.ts");
    let string_ty = b.type_ref("string", Vec::new());
    let arr_ty = b.node(NodeKind::ArrayType { element: string_ty });
    let arr_var = b.node(NodeKind::Var {
        name: "arr".into(),
        declared_type: Some(arr_ty),
        init: None,
        is_const: false,
        exported: false,
    });
    b.item(arr_var);
    let number_ty = b.type_ref("number", Vec::new());
    let i_var = b.node(NodeKind::Var {
        name: "i".into(),
        declared_type: Some(number_ty),
        init: None,
        is_const: false,
        exported: false,
    });
    b.item(i_var);

    let arr_use = b.ident("arr");
    let i_use = b.ident("i");
    let index = b.node(NodeKind::ElementAccess {
        object: arr_use,
        index: i_use,
    });
    let stmt = b.node(NodeKind::ExprStmt(index));
    b.item(stmt);
    b.record_use(arr_use, arr_var);
    b.record_use(i_use, i_var);

    let program = b.finish();
    let (_, sink) = compile(&program);
    assert!(errors_of(&sink).contains(&codes::UNPROVEN_INT_INDEX));
}

// =============================================================================
// Scenario 3: trycast
// =============================================================================

#[test]
fn test_trycast_emits_as_operator() {
    let mut b = TreeBuilder::new();
    b.file("main.ts");
    let person = b.node(NodeKind::Class {
        name: "Person".into(),
        type_params: Vec::new(),
        extends: None,
        implements: Vec::new(),
        members: Vec::new(),
        exported: true,
    });
    b.item(person);
    let person_ty = b.type_ref("Person", Vec::new());
    let obj_var = b.node(NodeKind::Var {
        name: "obj".into(),
        declared_type: Some(person_ty),
        init: None,
        is_const: false,
        exported: false,
    });
    b.item(obj_var);

    let callee = b.ident("trycast");
    let target = b.type_ref("Person", Vec::new());
    let obj_use = b.ident("obj");
    let call = b.node(NodeKind::Call {
        callee,
        type_args: vec![target],
        args: vec![obj_use],
    });
    let stmt = b.node(NodeKind::ExprStmt(call));
    b.item(stmt);
    b.record_use(obj_use, obj_var);

    let program = b.finish();
    let (texts, sink) = compile(&program);
    assert!(!sink.has_errors(), "unexpected errors: {:?}", sink.all());
    assert!(texts[0].contains("obj as Person;"), "{}", texts[0]);
}

// =============================================================================
// Scenario 4: implements user interface
// =============================================================================

#[test]
fn test_implements_nominalized_interface_is_rejected() {
    let mut b = TreeBuilder::new();
    b.file("main.ts");
    let string_ty = b.type_ref("string", Vec::new());
    let sig = b.node(NodeKind::PropertySig {
        name: "title".into(),
        type_annotation: string_ty,
        optional: false,
        readonly: false,
    });
    let printable = b.node(NodeKind::Interface {
        name: "Printable".into(),
        type_params: Vec::new(),
        extends: Vec::new(),
        members: vec![sig],
        exported: true,
    });
    b.item(printable);
    let printable_ref = b.type_ref("Printable", Vec::new());
    let doc = b.node(NodeKind::Class {
        name: "Doc".into(),
        type_params: Vec::new(),
        extends: None,
        implements: vec![printable_ref],
        members: Vec::new(),
        exported: true,
    });
    b.item(doc);

    let program = b.finish();
    let (_, sink) = compile(&program);
    assert!(
        errors_of(&sink).contains(&codes::IMPLEMENTS_NOMINALIZED_INTERFACE),
        "expected TSN7301: {:?}",
        sink.all()
    );
}

// =============================================================================
// Scenario 5: anonymous object synthesis
// =============================================================================

fn point_literal(b: &mut TreeBuilder, span: Span) -> tsonic_surface::ast::NodeId {
    let x = b.number("1");
    let y = b.number("2");
    b.node_at(
        NodeKind::ObjectLit(vec![
            ObjectProp::Init {
                key: PropKey::Ident("x".into()),
                value: x,
            },
            ObjectProp::Init {
                key: PropKey::Ident("y".into()),
                value: y,
            },
        ]),
        span,
    )
}

#[test]
fn test_anonymous_object_synthesis_and_dedup() {
    let mut b = TreeBuilder::new();
    b.file("geom.ts");
    // Line 10 starts at offset 90; column 14 is offset 103.
    let text = "123456789\n".repeat(9) + "                    \n";
    b.with_text(&text);
    let first = point_literal(&mut b, Span::new(103, 119));
    let var1 = b.node(NodeKind::Var {
        name: "a".into(),
        declared_type: None,
        init: Some(first),
        is_const: true,
        exported: false,
    });
    b.item(var1);
    let second = point_literal(&mut b, Span::new(5, 9));
    let var2 = b.node(NodeKind::Var {
        name: "b".into(),
        declared_type: None,
        init: Some(second),
        is_const: true,
        exported: false,
    });
    b.item(var2);

    let program = b.finish();
    let (texts, sink) = compile(&program);
    assert!(!sink.has_errors(), "unexpected errors: {:?}", sink.all());
    let text = &texts[0];
    assert!(text.contains("public class __Anon_geom_10_14"), "{text}");
    assert!(text.contains("public double x { get; set; }"), "{text}");
    assert!(text.contains("public double y { get; set; }"), "{text}");
    // Both literals share the one synthesized type.
    assert_eq!(text.matches("class __Anon_").count(), 1, "{text}");
    assert_eq!(text.matches("new __Anon_geom_10_14").count(), 2, "{text}");
}

// =============================================================================
// Scenario 6: generator lowering
// =============================================================================

#[test]
fn test_generator_lowers_to_exchange_wrapper_core_entry() {
    let mut b = TreeBuilder::new();
    b.file("acc.ts");
    let number_ty = b.type_ref("number", Vec::new());
    let zero = b.number("0");
    let start_param = b.node(NodeKind::Param {
        name: "start".into(),
        type_annotation: Some(number_ty),
        optional: false,
        default: Some(zero),
    });
    let y = b.type_ref("number", Vec::new());
    let r = b.type_ref("void", Vec::new());
    let n = b.type_ref("number", Vec::new());
    let generator_ty = b.type_ref("Generator", vec![y, r, n]);
    let start_use = b.ident("start");
    let yield_expr = b.node(NodeKind::Yield {
        expr: Some(start_use),
        delegate: false,
    });
    let yield_stmt = b.node(NodeKind::ExprStmt(yield_expr));
    let func = b.node(NodeKind::Function {
        name: "acc".into(),
        type_params: Vec::new(),
        params: vec![start_param],
        return_type: Some(generator_ty),
        body: vec![yield_stmt],
        is_generator: true,
        is_async: false,
        exported: true,
    });
    b.item(func);
    b.record_use(start_use, start_param);

    let program = b.finish();
    let (texts, sink) = compile(&program);
    assert!(!sink.has_errors(), "unexpected errors: {:?}", sink.all());
    let text = &texts[0];
    assert!(text.contains("public class acc_exchange"), "{text}");
    assert!(text.contains("public double Value { get; set; }"), "{text}");
    assert!(text.contains("public double? Input { get; set; }"), "{text}");
    assert!(text.contains("public class acc_Generator"), "{text}");
    assert!(
        text.contains("public acc_exchange? next(double? value = default)"),
        "{text}"
    );
    assert!(
        text.contains("public acc_exchange? @return(double? value = default)"),
        "{text}"
    );
    assert!(text.contains("public void @throw(Exception e)"), "{text}");
    assert!(
        text.contains("private static IEnumerable<acc_exchange> acc_core(double start)"),
        "{text}"
    );
    assert!(
        text.contains("public static acc_Generator acc(double start = 0)"),
        "{text}"
    );
    assert!(
        text.contains("yield return new acc_exchange { Value = start };"),
        "{text}"
    );
    // The documented limitation is surfaced as a compile-time note.
    assert!(
        sink.all()
            .iter()
            .any(|d| d.code == codes::GENERATOR_THROW_LIMITATION),
        "{:?}",
        sink.all()
    );
}

// =============================================================================
// Printer determinism over the whole pipeline
// =============================================================================

#[test]
fn test_reemission_is_byte_identical() {
    let mut b = TreeBuilder::new();
    b.file("geom.ts");
    b.with_text("const a = {x: 1, y: 2};\n");
    let lit = point_literal(&mut b, Span::new(10, 22));
    let var = b.node(NodeKind::Var {
        name: "a".into(),
        declared_type: None,
        init: Some(lit),
        is_const: true,
        exported: false,
    });
    b.item(var);
    let program = b.finish();
    let (first, _) = compile(&program);
    let (second, _) = compile(&program);
    assert_eq!(first, second);
}

// =============================================================================
// Structural constraints round-trip
// =============================================================================

#[test]
fn test_structural_constraint_emits_adapter_pair() {
    let mut b = TreeBuilder::new();
    b.file("main.ts");
    // function tag<T extends {id: number; name: string}>(x: T): void {}
    let id_ty = b.type_ref("number", Vec::new());
    let name_ty = b.type_ref("string", Vec::new());
    let shape = b.node(NodeKind::ObjectType {
        members: vec![
            tsonic_surface::ast::ObjectTypeMember::Property {
                name: "id".into(),
                type_annotation: id_ty,
                optional: false,
                readonly: false,
            },
            tsonic_surface::ast::ObjectTypeMember::Property {
                name: "name".into(),
                type_annotation: name_ty,
                optional: false,
                readonly: false,
            },
        ],
    });
    let t_ref = b.type_ref("T", Vec::new());
    let param = b.param("x", Some(t_ref));
    let void_ty = b.type_ref("void", Vec::new());
    let func = b.node(NodeKind::Function {
        name: "tag".into(),
        type_params: vec![TypeParam {
            name: "T".into(),
            constraint: Some(shape),
            default: None,
        }],
        params: vec![param],
        return_type: Some(void_ty),
        body: Vec::new(),
        is_generator: false,
        is_async: false,
        exported: true,
    });
    b.item(func);

    let program = b.finish();
    let (texts, sink) = compile(&program);
    assert!(!sink.has_errors(), "unexpected errors: {:?}", sink.all());
    let text = &texts[0];
    assert!(text.contains("public interface __Constraint_T"), "{text}");
    assert!(text.contains("double id { get; set; }"), "{text}");
    assert!(text.contains("string name { get; set; }"), "{text}");
    assert!(
        text.contains("public class __Wrapper_T : __Constraint_T"),
        "{text}"
    );
    assert!(
        text.contains("public static void tag<T>(T x) where T : __Constraint_T"),
        "{text}"
    );
}
