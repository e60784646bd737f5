//! Module building - one `IrModule` per source file.
//!
//! For each module, in order: import extraction and classification,
//! statement extraction, the file-name-vs-export-name collision check
//! (fatal), static-container detection, and synthesis of the target
//! namespace and container class from the file path.

use tracing::debug;
use tsonic_binder::Binder;
use tsonic_common::diagnostics::{DiagnosticSink, codes};
use tsonic_ir::module::{ImportKind, IrImport, IrModule};
use tsonic_ir::stmt::IrStatement;
use tsonic_surface::ast::{FileId, ImportClause, NodeKind, Program};
use tsonic_types::TypeSystem;
use tsonic_types::catalog::pascal_case;

use crate::context::ProgramContext;
use crate::stmts::convert_statement;

/// Build all modules in canonical (path-sorted) order.
pub fn build_modules(
    program: &Program,
    binder: &Binder,
    types: &TypeSystem<'_>,
    root_namespace: &str,
    sink: &mut DiagnosticSink,
) -> Vec<IrModule> {
    let modules = program
        .files_in_order()
        .into_iter()
        .map(|file| build_module(program, binder, types, file, root_namespace, sink))
        .collect();
    for diagnostic in types.drain_diagnostics() {
        sink.push(diagnostic);
    }
    modules
}

/// Build the IR module for one source file.
pub fn build_module(
    program: &Program,
    binder: &Binder,
    types: &TypeSystem<'_>,
    file: FileId,
    root_namespace: &str,
    sink: &mut DiagnosticSink,
) -> IrModule {
    let source = &program.files[file.index()];
    let file_path = source.path.clone();
    let items = source.items.clone();
    let stem = source.stem().to_string();
    let container_class = pascal_case(&stem);
    let namespace = namespace_of(root_namespace, &file_path);

    let mut imports = Vec::new();
    let mut statements: Vec<IrStatement> = Vec::new();
    {
        let mut ctx = ProgramContext::new(program, binder, types, file, sink);
        for item in &items {
            match ctx.program.arena.kind(*item) {
                Some(NodeKind::Import { clause, specifier }) => {
                    imports.push(classify_import(
                        root_namespace,
                        &file_path,
                        clause.clone(),
                        specifier,
                    ));
                }
                _ => {
                    if let Some(stmt) = convert_statement(&mut ctx, *item) {
                        statements.push(stmt);
                    }
                }
            }
        }
    }

    // A module exporting a non-class under the container's name collides
    // with its own container class; a class of that name *is* the
    // container.
    let module = IrModule {
        file_path: file_path.clone(),
        namespace,
        container_class: container_class.clone(),
        is_static_container: false,
        imports,
        statements,
    };
    let mut has_container_class = false;
    for stmt in &module.statements {
        let is_class = matches!(stmt, IrStatement::Class(_));
        if let Some(name) = stmt.decl_name()
            && name == container_class
        {
            if is_class {
                has_container_class = true;
            } else {
                sink.error(
                    file_path.clone(),
                    stmt_span(stmt),
                    codes::FILE_EXPORT_NAME_COLLISION,
                    &[&stem, name],
                );
            }
        }
    }

    let has_executable = module.statements.iter().any(IrStatement::is_executable);
    let has_exports = !module.exported_names().is_empty();
    let is_static_container = !has_executable && has_exports && !has_container_class;

    debug!(
        file = %file_path,
        container = %container_class,
        static_container = is_static_container,
        "module built"
    );
    IrModule {
        is_static_container,
        ..module
    }
}

fn stmt_span(stmt: &IrStatement) -> tsonic_common::span::Span {
    use tsonic_common::span::Span;
    match stmt {
        IrStatement::VarDecl { span, .. }
        | IrStatement::TypeAlias { span, .. }
        | IrStatement::Enum { span, .. } => span.unwrap_or_else(Span::dummy),
        IrStatement::Function(f) => f.span.unwrap_or_else(Span::dummy),
        IrStatement::Class(c) => c.span.unwrap_or_else(Span::dummy),
        IrStatement::Interface(i) => i.span.unwrap_or_else(Span::dummy),
        _ => Span::dummy(),
    }
}

/// Classify one import as local / runtime-host-API / nominal-facade.
fn classify_import(
    root_namespace: &str,
    importing_path: &str,
    clause: ImportClause,
    specifier: &str,
) -> IrImport {
    let names = match clause {
        ImportClause::Named(names) => names
            .into_iter()
            .map(|n| (n.name, n.alias))
            .collect(),
        ImportClause::Namespace(name) | ImportClause::Default(name) => vec![(name, None)],
    };
    if specifier.starts_with('.') {
        let target = resolve_relative(importing_path, specifier);
        return IrImport {
            kind: ImportKind::Local,
            specifier: specifier.to_string(),
            names,
            namespace: Some(namespace_of(root_namespace, &target)),
        };
    }
    if specifier.starts_with("tsonic:") {
        return IrImport {
            kind: ImportKind::RuntimeHost,
            specifier: specifier.to_string(),
            names,
            namespace: Some("Tsonic.Runtime".to_string()),
        };
    }
    IrImport {
        kind: ImportKind::NominalFacade,
        specifier: specifier.to_string(),
        names,
        namespace: None,
    }
}

/// Synthesize the target namespace of a file path:
/// `geom/point.ts` under root `App` → `App.Geom`.
#[must_use]
pub fn namespace_of(root_namespace: &str, file_path: &str) -> String {
    let mut parts = vec![root_namespace.to_string()];
    if let Some(idx) = file_path.rfind('/') {
        for segment in file_path[..idx].split('/').filter(|s| !s.is_empty()) {
            parts.push(pascal_case(segment));
        }
    }
    parts.join(".")
}

/// Resolve a relative import specifier against the importing file's
/// directory, yielding a source-root-relative `.ts` path.
#[must_use]
pub fn resolve_relative(importing_path: &str, specifier: &str) -> String {
    let mut segments: Vec<&str> = match importing_path.rfind('/') {
        Some(idx) => importing_path[..idx].split('/').collect(),
        None => Vec::new(),
    };
    for part in specifier.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let mut joined = segments.join("/");
    if !joined.ends_with(".ts") {
        joined.push_str(".ts");
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsonic_common::diagnostics::DiagnosticSink;
    use tsonic_surface::TreeBuilder;
    use tsonic_surface::ast::{ImportName, NodeKind};
    use tsonic_types::{AliasTable, TypeCatalog};

    fn build_single(
        builder: TreeBuilder,
    ) -> (IrModule, DiagnosticSink) {
        let program = builder.finish();
        let binder = Binder::bind(&program);
        let mut catalog = TypeCatalog::with_builtins();
        let aliases = AliasTable::new();
        catalog.add_source_types(&program, &binder, "App");
        let types = TypeSystem::new(&program, &binder, &catalog, &aliases);
        let mut sink = DiagnosticSink::new();
        let modules = build_modules(&program, &binder, &types, "App", &mut sink);
        (modules.into_iter().next().unwrap(), sink)
    }

    #[test]
    fn test_namespace_synthesis() {
        assert_eq!(namespace_of("App", "geom/point.ts"), "App.Geom");
        assert_eq!(namespace_of("App", "main.ts"), "App");
        assert_eq!(namespace_of("App", "a/b/c.ts"), "App.A.B");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_relative("geom/main.ts", "./point"), "geom/point.ts");
        assert_eq!(resolve_relative("geom/main.ts", "../util"), "util.ts");
        assert_eq!(resolve_relative("main.ts", "./lib/x"), "lib/x.ts");
    }

    #[test]
    fn test_static_container_detection() {
        let mut builder = TreeBuilder::new();
        builder.file("util.ts");
        let string_ty = builder.type_ref("string", Vec::new());
        let param = builder.param("x", Some(string_ty));
        let ret_ty = builder.type_ref("string", Vec::new());
        let func = builder.node(NodeKind::Function {
            name: "greet".into(),
            type_params: Vec::new(),
            params: vec![param],
            return_type: Some(ret_ty),
            body: Vec::new(),
            is_generator: false,
            is_async: false,
            exported: true,
        });
        builder.item(func);
        let (module, sink) = build_single(builder);
        assert!(module.is_static_container);
        assert_eq!(module.namespace, "App");
        assert_eq!(module.container_class, "Util");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_top_level_code_disables_static_container() {
        let mut builder = TreeBuilder::new();
        builder.file("main.ts");
        let callee = builder.ident("greet");
        let call = builder.node(NodeKind::Call {
            callee,
            type_args: Vec::new(),
            args: Vec::new(),
        });
        let stmt = builder.node(NodeKind::ExprStmt(call));
        builder.item(stmt);
        let string_ty = builder.type_ref("string", Vec::new());
        let var = builder.node(NodeKind::Var {
            name: "x".into(),
            declared_type: Some(string_ty),
            init: None,
            is_const: false,
            exported: true,
        });
        builder.item(var);
        let (module, _) = build_single(builder);
        assert!(!module.is_static_container);
    }

    #[test]
    fn test_file_export_collision_is_fatal() {
        let mut builder = TreeBuilder::new();
        builder.file("point.ts");
        let int_ty = builder.type_ref("int", Vec::new());
        let var = builder.node(NodeKind::Var {
            name: "Point".into(),
            declared_type: Some(int_ty),
            init: None,
            is_const: true,
            exported: true,
        });
        builder.item(var);
        let (_, sink) = build_single(builder);
        assert!(
            sink.all()
                .iter()
                .any(|d| d.code == codes::FILE_EXPORT_NAME_COLLISION)
        );
    }

    #[test]
    fn test_class_matching_filename_is_not_a_collision() {
        let mut builder = TreeBuilder::new();
        builder.file("point.ts");
        let class = builder.node(NodeKind::Class {
            name: "Point".into(),
            type_params: Vec::new(),
            extends: None,
            implements: Vec::new(),
            members: Vec::new(),
            exported: true,
        });
        builder.item(class);
        let (module, sink) = build_single(builder);
        assert!(sink.is_empty());
        // The class is the container, so the module is not a static
        // container.
        assert!(!module.is_static_container);
    }

    #[test]
    fn test_import_classification() {
        let mut builder = TreeBuilder::new();
        builder.file("geom/main.ts");
        for (specifier, _) in [("./point", 0), ("tsonic:console", 1), ("System.Text", 2)] {
            let import = builder.node(NodeKind::Import {
                clause: ImportClause::Named(vec![ImportName {
                    name: "x".into(),
                    alias: None,
                }]),
                specifier: specifier.to_string(),
            });
            builder.item(import);
        }
        let (module, _) = build_single(builder);
        assert_eq!(module.imports.len(), 3);
        assert_eq!(module.imports[0].kind, ImportKind::Local);
        assert_eq!(module.imports[0].namespace.as_deref(), Some("App.Geom"));
        assert_eq!(module.imports[1].kind, ImportKind::RuntimeHost);
        assert_eq!(module.imports[2].kind, ImportKind::NominalFacade);
    }
}
