//! Binder - one registration walk over the surface program.
//!
//! On construction the binder visits every file in canonical (path-sorted)
//! order and populates four registries: declarations, signatures, members,
//! and captured type syntax. Parameter passing modes are normalized here,
//! unwrapping the `ref<T>` / `out<T>` / `inref<T>` marker wrappers, so no
//! later component ever sees a marker type.
//!
//! The binder copies the pieces of host data it needs (symbol table, file
//! paths) and is self-contained afterwards: the same source program always
//! produces the same ids in the same order.

use rustc_hash::FxHashMap;
use tracing::debug;
use tsonic_surface::ast::{FileId, NodeId, NodeKind, Program, TypeParam};
use tsonic_surface::symbols::SymbolTable;

use crate::ids::{DeclId, MemberId, SignatureId, TypeSyntaxId};
use crate::registry::{
    DeclInfo, DeclKind, MemberInfo, MemberKind, ParamInfo, ParamMode, SignatureInfo,
    TypeParamInfo, TypeSyntaxInfo,
};

/// The binding tables for one compilation.
pub struct Binder {
    decls: Vec<DeclInfo>,
    signatures: Vec<SignatureInfo>,
    members: Vec<MemberInfo>,
    type_syntax: Vec<TypeSyntaxInfo>,

    node_to_decl: FxHashMap<NodeId, DeclId>,
    node_to_signature: FxHashMap<NodeId, SignatureId>,
    ctor_signatures: FxHashMap<DeclId, SignatureId>,
    type_syntax_by_node: FxHashMap<NodeId, TypeSyntaxId>,
    exports: FxHashMap<(FileId, String), DeclId>,
    members_by_owner: FxHashMap<DeclId, Vec<MemberId>>,

    symbols: SymbolTable,
    file_paths: Vec<String>,
    /// Stack of type-parameter names currently in scope during the walk.
    scope_type_params: Vec<String>,
}

impl Binder {
    /// Walk the program once and build all registries.
    #[must_use]
    pub fn bind(program: &Program) -> Self {
        let mut binder = Self {
            decls: Vec::new(),
            signatures: Vec::new(),
            members: Vec::new(),
            type_syntax: Vec::new(),
            node_to_decl: FxHashMap::default(),
            node_to_signature: FxHashMap::default(),
            ctor_signatures: FxHashMap::default(),
            type_syntax_by_node: FxHashMap::default(),
            exports: FxHashMap::default(),
            members_by_owner: FxHashMap::default(),
            symbols: program.symbols.clone(),
            file_paths: program.files.iter().map(|f| f.path.clone()).collect(),
            scope_type_params: Vec::new(),
        };

        for file in program.files_in_order() {
            let items = program.files[file.index()].items.clone();
            for item in items {
                binder.bind_statement(program, file, item);
            }
        }
        debug!(
            decls = binder.decls.len(),
            signatures = binder.signatures.len(),
            members = binder.members.len(),
            "binding complete"
        );
        binder
    }

    // =========================================================================
    // Registration walk
    // =========================================================================

    fn bind_statement(&mut self, program: &Program, file: FileId, node: NodeId) {
        let Some(kind) = program.arena.kind(node) else {
            return;
        };
        match kind.clone() {
            NodeKind::Import { .. } => {}
            NodeKind::Var {
                name,
                declared_type,
                init,
                exported,
                ..
            } => {
                let type_syntax = declared_type.map(|t| self.capture(file, t));
                self.register_decl(
                    node,
                    DeclInfo {
                        name: name.clone(),
                        kind: DeclKind::Var,
                        file,
                        node,
                        type_syntax,
                        signature: None,
                        exported,
                    },
                );
                if let Some(init) = init {
                    self.bind_expression(program, file, init);
                }
            }
            NodeKind::Function {
                name,
                type_params,
                params,
                return_type,
                body,
                exported,
                ..
            } => {
                let decl = self.register_decl(
                    node,
                    DeclInfo {
                        name: name.clone(),
                        kind: DeclKind::Function,
                        file,
                        node,
                        type_syntax: None,
                        signature: None,
                        exported,
                    },
                );
                let depth = self.push_scope(&type_params);
                let sig = self.register_signature(
                    program,
                    file,
                    Some(decl),
                    &type_params,
                    &params,
                    return_type,
                    false,
                );
                self.decls[decl.index()].signature = Some(sig);
                self.node_to_signature.insert(node, sig);
                for stmt in body {
                    self.bind_statement(program, file, stmt);
                }
                self.pop_scope(depth);
            }
            NodeKind::Class {
                name,
                type_params,
                extends,
                implements,
                members,
                exported,
            } => {
                let decl = self.register_decl(
                    node,
                    DeclInfo {
                        name: name.clone(),
                        kind: DeclKind::Class,
                        file,
                        node,
                        type_syntax: None,
                        signature: None,
                        exported,
                    },
                );
                let depth = self.push_scope(&type_params);
                if let Some(extends) = extends {
                    self.capture(file, extends);
                }
                for implemented in implements {
                    self.capture(file, implemented);
                }
                let mut has_ctor = false;
                for member in members {
                    has_ctor |= self.bind_class_member(program, file, decl, member);
                }
                self.pop_scope(depth);
                if !has_ctor {
                    // Implicit default constructor.
                    let sig = self.push_signature(SignatureInfo {
                        decl: None,
                        type_params: Vec::new(),
                        params: Vec::new(),
                        return_syntax: None,
                        is_constructor: true,
                    });
                    self.ctor_signatures.insert(decl, sig);
                }
            }
            NodeKind::Interface {
                name,
                type_params,
                extends,
                members,
                exported,
            } => {
                let decl = self.register_decl(
                    node,
                    DeclInfo {
                        name: name.clone(),
                        kind: DeclKind::Interface,
                        file,
                        node,
                        type_syntax: None,
                        signature: None,
                        exported,
                    },
                );
                let depth = self.push_scope(&type_params);
                for extended in extends {
                    self.capture(file, extended);
                }
                for member in members {
                    self.bind_interface_member(program, file, decl, member);
                }
                self.pop_scope(depth);
            }
            NodeKind::TypeAlias {
                name,
                type_params,
                body,
                exported,
            } => {
                let depth = self.push_scope(&type_params);
                let type_syntax = Some(self.capture(file, body));
                self.pop_scope(depth);
                self.register_decl(
                    node,
                    DeclInfo {
                        name: name.clone(),
                        kind: DeclKind::TypeAlias,
                        file,
                        node,
                        type_syntax,
                        signature: None,
                        exported,
                    },
                );
            }
            NodeKind::Enum { name, exported, .. } => {
                self.register_decl(
                    node,
                    DeclInfo {
                        name: name.clone(),
                        kind: DeclKind::Enum,
                        file,
                        node,
                        type_syntax: None,
                        signature: None,
                        exported,
                    },
                );
            }
            NodeKind::Block(stmts) => {
                for stmt in stmts {
                    self.bind_statement(program, file, stmt);
                }
            }
            NodeKind::ExprStmt(expr) | NodeKind::Throw(expr) => {
                self.bind_expression(program, file, expr);
            }
            NodeKind::Return(expr) => {
                if let Some(expr) = expr {
                    self.bind_expression(program, file, expr);
                }
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.bind_expression(program, file, cond);
                self.bind_statement(program, file, then_branch);
                if let Some(else_branch) = else_branch {
                    self.bind_statement(program, file, else_branch);
                }
            }
            NodeKind::While { cond, body } => {
                self.bind_expression(program, file, cond);
                self.bind_statement(program, file, body);
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.bind_statement(program, file, init);
                }
                if let Some(cond) = cond {
                    self.bind_expression(program, file, cond);
                }
                if let Some(update) = update {
                    self.bind_expression(program, file, update);
                }
                self.bind_statement(program, file, body);
            }
            NodeKind::ForOf { iterable, body, .. } => {
                self.bind_expression(program, file, iterable);
                self.bind_statement(program, file, body);
            }
            NodeKind::Try {
                block,
                catch_block,
                finally_block,
                ..
            } => {
                self.bind_statement(program, file, block);
                if let Some(catch_block) = catch_block {
                    self.bind_statement(program, file, catch_block);
                }
                if let Some(finally_block) = finally_block {
                    self.bind_statement(program, file, finally_block);
                }
            }
            NodeKind::Break | NodeKind::Continue => {}
            // An expression in statement position; bind it as one.
            _ => self.bind_expression(program, file, node),
        }
    }

    /// Returns true when the member is a constructor.
    fn bind_class_member(
        &mut self,
        program: &Program,
        file: FileId,
        owner: DeclId,
        node: NodeId,
    ) -> bool {
        let Some(kind) = program.arena.kind(node) else {
            return false;
        };
        match kind.clone() {
            NodeKind::Property {
                name,
                type_annotation,
                optional,
                readonly,
                is_static,
                init,
            } => {
                let type_syntax = type_annotation.map(|t| self.capture(file, t));
                self.register_decl(
                    node,
                    DeclInfo {
                        name: name.clone(),
                        kind: DeclKind::Property,
                        file,
                        node,
                        type_syntax,
                        signature: None,
                        exported: false,
                    },
                );
                self.push_member(
                    owner,
                    MemberInfo {
                        owner,
                        name,
                        kind: MemberKind::Property,
                        type_syntax,
                        signature: None,
                        optional,
                        readonly,
                        is_static,
                    },
                );
                if let Some(init) = init {
                    self.bind_expression(program, file, init);
                }
                false
            }
            NodeKind::Method {
                name,
                type_params,
                params,
                return_type,
                body,
                is_static,
                ..
            } => {
                let depth = self.push_scope(&type_params);
                let decl = self.register_decl(
                    node,
                    DeclInfo {
                        name: name.clone(),
                        kind: DeclKind::Method,
                        file,
                        node,
                        type_syntax: None,
                        signature: None,
                        exported: false,
                    },
                );
                let sig = self.register_signature(
                    program,
                    file,
                    Some(decl),
                    &type_params,
                    &params,
                    return_type,
                    false,
                );
                self.decls[decl.index()].signature = Some(sig);
                self.node_to_signature.insert(node, sig);
                self.push_member(
                    owner,
                    MemberInfo {
                        owner,
                        name,
                        kind: MemberKind::Method,
                        type_syntax: None,
                        signature: Some(sig),
                        optional: false,
                        readonly: false,
                        is_static,
                    },
                );
                for stmt in body {
                    self.bind_statement(program, file, stmt);
                }
                self.pop_scope(depth);
                false
            }
            NodeKind::Constructor { params, body } => {
                let sig =
                    self.register_signature(program, file, None, &[], &params, None, true);
                self.node_to_signature.insert(node, sig);
                self.ctor_signatures.insert(owner, sig);
                self.push_member(
                    owner,
                    MemberInfo {
                        owner,
                        name: "constructor".to_string(),
                        kind: MemberKind::Constructor,
                        type_syntax: None,
                        signature: Some(sig),
                        optional: false,
                        readonly: false,
                        is_static: false,
                    },
                );
                for stmt in body {
                    self.bind_statement(program, file, stmt);
                }
                true
            }
            _ => false,
        }
    }

    fn bind_interface_member(
        &mut self,
        program: &Program,
        file: FileId,
        owner: DeclId,
        node: NodeId,
    ) {
        let Some(kind) = program.arena.kind(node) else {
            return;
        };
        match kind.clone() {
            NodeKind::PropertySig {
                name,
                type_annotation,
                optional,
                readonly,
            } => {
                let type_syntax = Some(self.capture(file, type_annotation));
                self.push_member(
                    owner,
                    MemberInfo {
                        owner,
                        name,
                        kind: MemberKind::Property,
                        type_syntax,
                        signature: None,
                        optional,
                        readonly,
                        is_static: false,
                    },
                );
            }
            NodeKind::MethodSig {
                name,
                type_params,
                params,
                return_type,
            } => {
                let depth = self.push_scope(&type_params);
                let sig = self.register_signature(
                    program,
                    file,
                    None,
                    &type_params,
                    &params,
                    return_type,
                    false,
                );
                self.node_to_signature.insert(node, sig);
                self.pop_scope(depth);
                self.push_member(
                    owner,
                    MemberInfo {
                        owner,
                        name,
                        kind: MemberKind::Method,
                        type_syntax: None,
                        signature: Some(sig),
                        optional: false,
                        readonly: false,
                        is_static: false,
                    },
                );
            }
            _ => {}
        }
    }

    fn bind_expression(&mut self, program: &Program, file: FileId, node: NodeId) {
        let Some(kind) = program.arena.kind(node) else {
            return;
        };
        match kind.clone() {
            NodeKind::ArrayLit(items) => {
                for item in items {
                    self.bind_expression(program, file, item);
                }
            }
            NodeKind::ObjectLit(props) => {
                use tsonic_surface::ast::ObjectProp;
                for prop in props {
                    match prop {
                        ObjectProp::Init { value, .. } => {
                            self.bind_expression(program, file, value);
                        }
                        ObjectProp::Method { function, .. } => {
                            self.bind_expression(program, file, function);
                        }
                        ObjectProp::Spread { expr } => {
                            self.bind_expression(program, file, expr);
                        }
                        ObjectProp::Shorthand { .. } | ObjectProp::Accessor { .. } => {}
                    }
                }
            }
            NodeKind::Arrow { params, return_type, body, .. } => {
                for param in &params {
                    self.bind_param_decl(program, file, *param);
                }
                if let Some(return_type) = return_type {
                    self.capture(file, return_type);
                }
                match body {
                    tsonic_surface::ast::ArrowBody::Expr(expr) => {
                        self.bind_expression(program, file, expr);
                    }
                    tsonic_surface::ast::ArrowBody::Block(stmts) => {
                        for stmt in stmts {
                            self.bind_statement(program, file, stmt);
                        }
                    }
                }
            }
            NodeKind::Call {
                callee,
                type_args,
                args,
            }
            | NodeKind::New {
                callee,
                type_args,
                args,
            } => {
                self.bind_expression(program, file, callee);
                for type_arg in type_args {
                    self.capture(file, type_arg);
                }
                for arg in args {
                    self.bind_expression(program, file, arg);
                }
            }
            NodeKind::PropertyAccess { object, .. } => {
                self.bind_expression(program, file, object);
            }
            NodeKind::ElementAccess { object, index } => {
                self.bind_expression(program, file, object);
                self.bind_expression(program, file, index);
            }
            NodeKind::Binary { left, right, .. } => {
                self.bind_expression(program, file, left);
                self.bind_expression(program, file, right);
            }
            NodeKind::Unary { operand, .. } => {
                self.bind_expression(program, file, operand);
            }
            NodeKind::Assign { target, value, .. } => {
                self.bind_expression(program, file, target);
                self.bind_expression(program, file, value);
            }
            NodeKind::Conditional {
                cond,
                when_true,
                when_false,
            } => {
                self.bind_expression(program, file, cond);
                self.bind_expression(program, file, when_true);
                self.bind_expression(program, file, when_false);
            }
            NodeKind::Paren(inner) | NodeKind::Await(inner) => {
                self.bind_expression(program, file, inner);
            }
            NodeKind::As { expr, target } => {
                self.bind_expression(program, file, expr);
                self.capture(file, target);
            }
            NodeKind::Yield { expr, .. } => {
                if let Some(expr) = expr {
                    self.bind_expression(program, file, expr);
                }
            }
            _ => {}
        }
    }

    fn bind_param_decl(&mut self, program: &Program, file: FileId, node: NodeId) -> Option<ParamInfo> {
        let Some(NodeKind::Param {
            name,
            type_annotation,
            optional,
            default,
        }) = program.arena.kind(node).cloned()
        else {
            return None;
        };
        let (mode, declared) = self.normalize_mode(program, file, type_annotation);
        self.register_decl(
            node,
            DeclInfo {
                name: name.clone(),
                kind: DeclKind::Param,
                file,
                node,
                type_syntax: declared,
                signature: None,
                exported: false,
            },
        );
        if let Some(default) = default {
            self.bind_expression(program, file, default);
        }
        Some(ParamInfo {
            name,
            type_syntax: declared,
            mode,
            optional,
            has_default: default.is_some(),
        })
    }

    /// Unwrap `ref<T>` / `out<T>` / `inref<T>` marker wrappers into a
    /// parameter mode plus the underlying declared type.
    fn normalize_mode(
        &mut self,
        program: &Program,
        file: FileId,
        type_annotation: Option<NodeId>,
    ) -> (ParamMode, Option<TypeSyntaxId>) {
        let Some(annotation) = type_annotation else {
            return (ParamMode::Value, None);
        };
        if let Some(NodeKind::TypeRef { name, type_args }) = program.arena.kind(annotation) {
            let mode = match name.as_str() {
                "ref" => Some(ParamMode::Ref),
                "out" => Some(ParamMode::Out),
                "inref" => Some(ParamMode::In),
                _ => None,
            };
            if let Some(mode) = mode
                && type_args.len() == 1
            {
                let inner = type_args[0];
                return (mode, Some(self.capture(file, inner)));
            }
        }
        (ParamMode::Value, Some(self.capture(file, annotation)))
    }

    fn register_signature(
        &mut self,
        program: &Program,
        file: FileId,
        decl: Option<DeclId>,
        type_params: &[TypeParam],
        params: &[NodeId],
        return_type: Option<NodeId>,
        is_constructor: bool,
    ) -> SignatureId {
        let type_params = type_params
            .iter()
            .map(|tp| TypeParamInfo {
                name: tp.name.clone(),
                constraint: tp.constraint.map(|c| self.capture(file, c)),
                default: tp.default.map(|d| self.capture(file, d)),
            })
            .collect();
        let params = params
            .iter()
            .filter_map(|p| self.bind_param_decl(program, file, *p))
            .collect();
        let return_syntax = return_type.map(|r| self.capture(file, r));
        self.push_signature(SignatureInfo {
            decl,
            type_params,
            params,
            return_syntax,
            is_constructor,
        })
    }

    fn register_decl(&mut self, node: NodeId, info: DeclInfo) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(info);
        self.node_to_decl.insert(node, id);
        let decl = &self.decls[id.index()];
        if decl.exported {
            self.exports.insert((decl.file, decl.name.clone()), id);
        }
        id
    }

    fn push_signature(&mut self, info: SignatureInfo) -> SignatureId {
        let id = SignatureId(self.signatures.len() as u32);
        self.signatures.push(info);
        id
    }

    fn push_member(&mut self, owner: DeclId, info: MemberInfo) -> MemberId {
        let id = MemberId(self.members.len() as u32);
        self.members.push(info);
        self.members_by_owner.entry(owner).or_default().push(id);
        id
    }

    fn capture(&mut self, file: FileId, node: NodeId) -> TypeSyntaxId {
        if let Some(existing) = self.type_syntax_by_node.get(&node) {
            return *existing;
        }
        let id = TypeSyntaxId(self.type_syntax.len() as u32);
        self.type_syntax.push(TypeSyntaxInfo {
            file,
            node,
            scope: self.scope_type_params.clone(),
        });
        self.type_syntax_by_node.insert(node, id);
        id
    }

    fn push_scope(&mut self, type_params: &[TypeParam]) -> usize {
        let depth = self.scope_type_params.len();
        self.scope_type_params
            .extend(type_params.iter().map(|tp| tp.name.clone()));
        depth
    }

    fn pop_scope(&mut self, depth: usize) {
        self.scope_type_params.truncate(depth);
    }

    // =========================================================================
    // Resolution API
    // =========================================================================

    /// Resolve an identifier-use node to its declaration.
    #[must_use]
    pub fn resolve_identifier(&self, node: NodeId) -> Option<DeclId> {
        let decl_node = self.symbols.declaration_of(node)?;
        self.node_to_decl.get(&decl_node).copied()
    }

    /// Resolve an imported local name to the exporting declaration.
    #[must_use]
    pub fn resolve_import(&self, file: FileId, local_name: &str) -> Option<DeclId> {
        let target = self.symbols.import_target(file, local_name)?;
        self.exports.get(&(target.file, target.export.clone())).copied()
    }

    /// Resolve a call node to the signature of its target.
    #[must_use]
    pub fn resolve_call_signature(&self, call_node: NodeId) -> Option<SignatureId> {
        let target = self.symbols.call_target_of(call_node)?;
        self.node_to_signature.get(&target).copied()
    }

    /// Resolve a `new` node to the constructor signature of its class.
    #[must_use]
    pub fn resolve_constructor_signature(&self, new_node: NodeId) -> Option<SignatureId> {
        let target = self.symbols.call_target_of(new_node)?;
        let decl = self.node_to_decl.get(&target)?;
        self.ctor_signatures.get(decl).copied()
    }

    /// Capture a type-syntax node encountered after binding (e.g. an `as`
    /// target discovered during IR building). Append-only.
    pub fn capture_type_syntax(&mut self, file: FileId, node: NodeId) -> TypeSyntaxId {
        self.capture(file, node)
    }

    /// Look up an already-captured type-syntax handle.
    #[must_use]
    pub fn type_syntax_of_node(&self, node: NodeId) -> Option<TypeSyntaxId> {
        self.type_syntax_by_node.get(&node).copied()
    }

    #[must_use]
    pub fn source_file_path_of_decl(&self, decl: DeclId) -> Option<&str> {
        let info = self.decls.get(decl.index())?;
        self.file_paths.get(info.file.index()).map(String::as_str)
    }

    // ----- registry access -----

    #[must_use]
    pub fn decl(&self, id: DeclId) -> Option<&DeclInfo> {
        self.decls.get(id.index())
    }

    #[must_use]
    pub fn signature(&self, id: SignatureId) -> Option<&SignatureInfo> {
        self.signatures.get(id.index())
    }

    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&MemberInfo> {
        self.members.get(id.index())
    }

    #[must_use]
    pub fn type_syntax(&self, id: TypeSyntaxId) -> Option<&TypeSyntaxInfo> {
        self.type_syntax.get(id.index())
    }

    #[must_use]
    pub fn decl_of_node(&self, node: NodeId) -> Option<DeclId> {
        self.node_to_decl.get(&node).copied()
    }

    #[must_use]
    pub fn signature_of_node(&self, node: NodeId) -> Option<SignatureId> {
        self.node_to_signature.get(&node).copied()
    }

    #[must_use]
    pub fn constructor_signature_of(&self, class_decl: DeclId) -> Option<SignatureId> {
        self.ctor_signatures.get(&class_decl).copied()
    }

    /// Members of a class/interface declaration, in declaration order.
    #[must_use]
    pub fn members_of(&self, owner: DeclId) -> &[MemberId] {
        self.members_by_owner
            .get(&owner)
            .map_or(&[], Vec::as_slice)
    }

    /// All declarations, in registration order.
    #[must_use]
    pub fn decls(&self) -> &[DeclInfo] {
        &self.decls
    }

    #[must_use]
    pub fn export(&self, file: FileId, name: &str) -> Option<DeclId> {
        self.exports.get(&(file, name.to_string())).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsonic_surface::TreeBuilder;
    use tsonic_surface::ast::NodeKind;

    fn single_function_program() -> (Program, NodeId, NodeId) {
        let mut builder = TreeBuilder::new();
        builder.file("lib/util.ts");
        let string_ty = builder.type_ref("string", Vec::new());
        let param = builder.param("x", Some(string_ty));
        let ret = builder.type_ref("string", Vec::new());
        let x_use = builder.ident("x");
        let ret_stmt = builder.node(NodeKind::Return(Some(x_use)));
        let func = builder.node(NodeKind::Function {
            name: "id".into(),
            type_params: Vec::new(),
            params: vec![param],
            return_type: Some(ret),
            body: vec![ret_stmt],
            is_generator: false,
            is_async: false,
            exported: true,
        });
        builder.item(func);
        builder.record_use(x_use, param);
        (builder.finish(), func, x_use)
    }

    #[test]
    fn test_function_registration() {
        let (program, func_node, _) = single_function_program();
        let binder = Binder::bind(&program);
        let decl = binder.decl_of_node(func_node).unwrap();
        let info = binder.decl(decl).unwrap();
        assert_eq!(info.name, "id");
        assert_eq!(info.kind, DeclKind::Function);
        assert!(info.exported);
        let sig = binder.signature(info.signature.unwrap()).unwrap();
        assert_eq!(sig.params.len(), 1);
        assert_eq!(sig.params[0].name, "x");
        assert_eq!(sig.params[0].mode, ParamMode::Value);
        assert!(sig.return_syntax.is_some());
    }

    #[test]
    fn test_identifier_resolution_through_symbols() {
        let (program, _, x_use) = single_function_program();
        let binder = Binder::bind(&program);
        // The x use inside the return resolves to the parameter decl.
        let param_decl = binder
            .decls()
            .iter()
            .position(|d| d.kind == DeclKind::Param)
            .unwrap();
        assert_eq!(
            binder.resolve_identifier(x_use),
            Some(DeclId(param_decl as u32))
        );
    }

    #[test]
    fn test_mode_normalization_unwraps_markers() {
        let mut builder = TreeBuilder::new();
        builder.file("main.ts");
        let int_ty = builder.type_ref("int", Vec::new());
        let out_ty = builder.type_ref("out", vec![int_ty]);
        let param = builder.param("result", Some(out_ty));
        let func = builder.node(NodeKind::Function {
            name: "tryParse".into(),
            type_params: Vec::new(),
            params: vec![param],
            return_type: None,
            body: Vec::new(),
            is_generator: false,
            is_async: false,
            exported: false,
        });
        builder.item(func);
        let program = builder.finish();
        let binder = Binder::bind(&program);
        let decl = binder.decl_of_node(func).unwrap();
        let sig = binder
            .signature(binder.decl(decl).unwrap().signature.unwrap())
            .unwrap();
        assert_eq!(sig.params[0].mode, ParamMode::Out);
        // The captured syntax is the unwrapped inner type.
        let captured = binder.type_syntax(sig.params[0].type_syntax.unwrap()).unwrap();
        assert_eq!(captured.node, int_ty);
    }

    #[test]
    fn test_implicit_default_constructor() {
        let mut builder = TreeBuilder::new();
        builder.file("main.ts");
        let class = builder.node(NodeKind::Class {
            name: "Empty".into(),
            type_params: Vec::new(),
            extends: None,
            implements: Vec::new(),
            members: Vec::new(),
            exported: false,
        });
        builder.item(class);
        let program = builder.finish();
        let binder = Binder::bind(&program);
        let decl = binder.decl_of_node(class).unwrap();
        let ctor = binder.constructor_signature_of(decl).unwrap();
        let sig = binder.signature(ctor).unwrap();
        assert!(sig.is_constructor);
        assert!(sig.params.is_empty());
    }

    #[test]
    fn test_deterministic_ids_across_runs() {
        let (program, _, _) = single_function_program();
        let first = Binder::bind(&program);
        let second = Binder::bind(&program);
        assert_eq!(first.decls.len(), second.decls.len());
        for (a, b) in first.decls.iter().zip(second.decls.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.node, b.node);
        }
    }
}
