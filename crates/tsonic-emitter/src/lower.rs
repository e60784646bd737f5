//! IR module → C# compilation unit lowering.

pub mod types;
pub mod exprs;
pub mod stmts;
pub mod generators;

use tracing::debug;
use tsonic_common::diagnostics::DiagnosticSink;
use tsonic_ir::module::IrModule;
use tsonic_ir::stmt::IrStatement;
use tsonic_types::TypeCatalog;

use crate::cs::{CompilationUnit, CsDecl, CsMember, CsModifier, CsStmt, CsType};
use crate::emit_context::EmitContext;
use crate::lower::exprs::lower_expr;
use crate::lower::generators::lower_generator;
use crate::lower::stmts::{
    lower_class_decl, lower_enum_decl, lower_function_member, lower_interface_decl, lower_stmt,
    lower_type_alias_decl,
};
use crate::lower::types::lower_type;

/// Lower one IR module to a compilation unit.
pub fn lower_module(
    module: &IrModule,
    catalog: &TypeCatalog,
    sink: &mut DiagnosticSink,
    header: Option<&str>,
) -> CompilationUnit {
    let mut ctx = EmitContext::new(
        catalog,
        sink,
        &module.file_path,
        &module.namespace,
        &module.container_class,
    );
    // Top-level functions and variables become static members of the
    // container class.
    ctx.is_static = true;

    for import in &module.imports {
        if let Some(namespace) = &import.namespace
            && namespace != &module.namespace
        {
            ctx.add_using(namespace);
        }
    }

    let mut decls: Vec<CsDecl> = Vec::new();
    let mut container_members: Vec<CsMember> = Vec::new();
    let mut main_stmts: Vec<CsStmt> = Vec::new();

    for stmt in &module.statements {
        match stmt {
            IrStatement::Function(f) if f.is_generator => {
                let (generator_decls, members) = lower_generator(&mut ctx, f);
                decls.extend(generator_decls);
                container_members.extend(members);
            }
            IrStatement::Function(f) => {
                container_members.push(lower_function_member(&mut ctx, f));
            }
            IrStatement::VarDecl {
                name,
                declared_type,
                init,
                is_const,
                ..
            } => {
                let ty = match declared_type
                    .as_ref()
                    .or_else(|| init.as_ref().and_then(|i| i.inferred_type.as_ref()))
                {
                    Some(ty) => lower_type(&mut ctx, ty),
                    None => CsType::named("object"),
                };
                let mut modifiers = vec![CsModifier::Public, CsModifier::Static];
                if *is_const {
                    modifiers.push(CsModifier::Readonly);
                }
                container_members.push(CsMember::Field {
                    modifiers,
                    ty,
                    name: name.clone(),
                    init: init.as_ref().map(|i| lower_expr(&mut ctx, i)),
                });
            }
            IrStatement::Class(c) => decls.push(lower_class_decl(&mut ctx, c)),
            IrStatement::Interface(i) => decls.push(lower_interface_decl(&mut ctx, i)),
            IrStatement::TypeAlias {
                name,
                type_params,
                body,
                ..
            } => decls.push(lower_type_alias_decl(&mut ctx, name, type_params, body)),
            IrStatement::Enum { name, members, .. } => {
                decls.push(lower_enum_decl(&mut ctx, name, members));
            }
            other => main_stmts.extend(lower_stmt(&mut ctx, other)),
        }
    }

    if !main_stmts.is_empty() {
        // A member may not share its enclosing class's name.
        let entry_name = if module.container_class == "Main" {
            "__Main"
        } else {
            "Main"
        };
        container_members.push(CsMember::Method {
            modifiers: vec![CsModifier::Public, CsModifier::Static],
            type_params: Vec::new(),
            where_clauses: Vec::new(),
            return_type: CsType::Void,
            name: entry_name.into(),
            params: Vec::new(),
            body: Some(main_stmts),
        });
    }

    // A class matching the file name is the container; merge loose
    // members into it instead of emitting a clashing static class.
    let mut all_decls = Vec::new();
    if !container_members.is_empty() {
        let existing = decls.iter_mut().find_map(|d| match d {
            CsDecl::Class { name, members, .. } if *name == module.container_class => {
                Some(members)
            }
            _ => None,
        });
        match existing {
            Some(members) => members.extend(container_members),
            None => {
                all_decls.push(CsDecl::Class {
                    modifiers: vec![CsModifier::Public, CsModifier::Static],
                    name: module.container_class.clone(),
                    type_params: Vec::new(),
                    where_clauses: Vec::new(),
                    bases: Vec::new(),
                    members: container_members,
                });
            }
        }
    }
    all_decls.extend(decls);

    debug!(file = %module.file_path, decls = all_decls.len(), "module lowered");
    CompilationUnit {
        header: header.map(str::to_string),
        usings: ctx.usings.iter().cloned().collect(),
        namespace: module.namespace.clone(),
        decls: all_decls,
    }
}
