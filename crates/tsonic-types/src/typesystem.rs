//! The type system - the sole type oracle.
//!
//! Every type query in the compiler goes through this type. Queries are
//! answered against the binder registries and the type catalog; the host
//! type checker is never consulted. When a query cannot be answered
//! authoritatively the result is the poison value `unknown` and a
//! diagnostic is recorded - there are no best-effort fallbacks.
//!
//! Caches are per-compilation, shared across callers, and only ever
//! touched by one pass at a time; interior mutability is a `RefCell`.

use std::cell::RefCell;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;
use tsonic_binder::Binder;
use tsonic_binder::ids::{DeclId, SignatureId, TypeSyntaxId};
use tsonic_binder::registry::{DeclKind, ParamMode};
use tsonic_common::diagnostics::{Diagnostic, codes, format_message, get_message_template};
use tsonic_common::limits::{MAX_INHERITANCE_DEPTH, MAX_TYPE_SYNTAX_DEPTH};
use tsonic_common::span::Span;
use tsonic_ir::types::{
    ArrayOrigin, IrLiteralType, IrPrimitive, IrType, ObjectProperty, TypeId, stable_ir_type_key,
};
use tsonic_surface::ast::{
    FileId, NodeId, NodeKind, ObjectTypeMember, Program, TypeLiteral,
};

use crate::alias::AliasTable;
use crate::catalog::{BaseRef, CatalogMember, CatalogMemberKind, TypeCatalog, TypeDefKind};

/// A type-parameter substitution, name → type.
pub type Substitution = FxHashMap<String, IrType>;

/// Apply a substitution, replacing bound type parameters.
#[must_use]
pub fn substitute(ty: &IrType, subst: &Substitution) -> IrType {
    match ty {
        IrType::TypeParameter(name) => subst.get(name).cloned().unwrap_or_else(|| ty.clone()),
        IrType::Reference {
            name,
            type_args,
            type_id,
        } => IrType::Reference {
            name: name.clone(),
            type_args: type_args.iter().map(|a| substitute(a, subst)).collect(),
            type_id: *type_id,
        },
        IrType::Array { element, origin } => IrType::Array {
            element: Box::new(substitute(element, subst)),
            origin: *origin,
        },
        IrType::Tuple(elements) => {
            IrType::Tuple(elements.iter().map(|e| substitute(e, subst)).collect())
        }
        IrType::Function {
            params,
            return_type,
        } => IrType::Function {
            params: params.iter().map(|p| substitute(p, subst)).collect(),
            return_type: Box::new(substitute(return_type, subst)),
        },
        IrType::Object(props) => IrType::Object(
            props
                .iter()
                .map(|p| ObjectProperty {
                    name: p.name.clone(),
                    ty: substitute(&p.ty, subst),
                    optional: p.optional,
                    readonly: p.readonly,
                })
                .collect(),
        ),
        IrType::Dictionary { key, value } => IrType::Dictionary {
            key: Box::new(substitute(key, subst)),
            value: Box::new(substitute(value, subst)),
        },
        IrType::Union(members) => {
            IrType::union(members.iter().map(|m| substitute(m, subst)).collect())
        }
        IrType::Intersection(members) => {
            IrType::Intersection(members.iter().map(|m| substitute(m, subst)).collect())
        }
        _ => ty.clone(),
    }
}

/// Structurally unify a template against an actual type, growing
/// `bindings`. Unknown actuals are ignored; a conflicting binding moves
/// the parameter to `conflicts` and removes it (un-inferred, not an
/// error at this layer).
pub fn unify(
    template: &IrType,
    actual: &IrType,
    bindings: &mut Substitution,
    conflicts: &mut FxHashSet<String>,
) {
    if actual.is_unknown() {
        return;
    }
    match (template, actual) {
        (IrType::TypeParameter(name), _) => {
            if conflicts.contains(name) {
                return;
            }
            match bindings.get(name) {
                Some(existing) if existing != actual => {
                    bindings.remove(name);
                    conflicts.insert(name.clone());
                }
                Some(_) => {}
                None => {
                    bindings.insert(name.clone(), actual.clone());
                }
            }
        }
        (
            IrType::Reference {
                name: template_name,
                type_args: template_args,
                ..
            },
            IrType::Reference {
                name: actual_name,
                type_args: actual_args,
                ..
            },
        ) if template_name == actual_name && template_args.len() == actual_args.len() => {
            for (t, a) in template_args.iter().zip(actual_args) {
                unify(t, a, bindings, conflicts);
            }
        }
        (IrType::Array { element: t, .. }, IrType::Array { element: a, .. }) => {
            unify(t, a, bindings, conflicts);
        }
        (IrType::Tuple(ts), IrType::Tuple(actuals)) if ts.len() == actuals.len() => {
            for (t, a) in ts.iter().zip(actuals) {
                unify(t, a, bindings, conflicts);
            }
        }
        (
            IrType::Function {
                params: tp,
                return_type: tr,
            },
            IrType::Function {
                params: ap,
                return_type: ar,
            },
        ) if tp.len() == ap.len() => {
            for (t, a) in tp.iter().zip(ap) {
                unify(t, a, bindings, conflicts);
            }
            unify(tr, ar, bindings, conflicts);
        }
        (IrType::Object(tprops), IrType::Object(aprops)) => {
            for tprop in tprops {
                if let Some(aprop) = aprops.iter().find(|p| p.name == tprop.name) {
                    unify(&tprop.ty, &aprop.ty, bindings, conflicts);
                }
            }
        }
        (
            IrType::Dictionary { key: tk, value: tv },
            IrType::Dictionary { key: ak, value: av },
        ) => {
            unify(tk, ak, bindings, conflicts);
            unify(tv, av, bindings, conflicts);
        }
        (IrType::Union(ts), IrType::Union(actuals)) if ts.len() == actuals.len() => {
            for (t, a) in ts.iter().zip(actuals) {
                unify(t, a, bindings, conflicts);
            }
        }
        _ => {}
    }
}

/// A resolved `x is T` type predicate.
#[derive(Clone, Debug, PartialEq)]
pub struct TypePredicate {
    pub param: String,
    pub param_index: Option<usize>,
    pub ty: IrType,
}

/// Input to [`TypeSystem::resolve_call`].
#[derive(Clone, Debug, Default)]
pub struct CallQuery<'q> {
    pub sig: Option<SignatureId>,
    pub argument_count: usize,
    pub receiver_type: Option<&'q IrType>,
    pub explicit_type_args: &'q [IrType],
    pub arg_types: Option<&'q [IrType]>,
    pub expected_return_type: Option<&'q IrType>,
    /// Reporting location of the call site.
    pub file: &'q str,
    pub site: Option<Span>,
}

/// Output of [`TypeSystem::resolve_call`]. `parameter_types` and
/// `parameter_modes` always have length exactly `argument_count`.
#[derive(Clone, Debug)]
pub struct ResolvedCall {
    pub parameter_types: Vec<IrType>,
    pub parameter_modes: Vec<ParamMode>,
    pub return_type: IrType,
    pub type_predicate: Option<TypePredicate>,
    /// One entry per signature type parameter; `unknown` when un-inferred.
    pub inferred_type_args: Vec<IrType>,
    /// Whether the signature declares type parameters.
    pub generic: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedCall {
    /// The poisoned result: `unknown` types, `value` modes, both sized to
    /// the argument count.
    #[must_use]
    pub fn poisoned(argument_count: usize) -> Self {
        Self {
            parameter_types: vec![IrType::Unknown; argument_count],
            parameter_modes: vec![ParamMode::Value; argument_count],
            return_type: IrType::Unknown,
            type_predicate: None,
            inferred_type_args: Vec::new(),
            generic: false,
            diagnostics: Vec::new(),
        }
    }
}

/// The converted form of one signature, with template types in terms of
/// its type parameters.
#[derive(Clone, Debug)]
struct RawSignature {
    type_params: Vec<(String, Option<IrType>)>,
    param_types: Vec<IrType>,
    param_modes: Vec<ParamMode>,
    return_type: IrType,
    predicate: Option<(String, IrType)>,
    declaring: Option<TypeId>,
    is_constructor: bool,
}

#[derive(Default)]
struct Caches {
    decl_type_cache: FxHashMap<DeclId, IrType>,
    member_lookup_cache: FxHashMap<(String, String), IrType>,
    signature_raw_cache: FxHashMap<SignatureId, RawSignature>,
}

/// The sole type oracle for one compilation.
pub struct TypeSystem<'a> {
    program: &'a Program,
    binder: &'a Binder,
    catalog: &'a TypeCatalog,
    aliases: &'a AliasTable,
    /// Type-alias declarations by name, for structural expansion.
    alias_decls: FxHashMap<String, DeclId>,
    /// Signature → declaring catalog type, for receiver substitution.
    sig_owner: FxHashMap<SignatureId, TypeId>,
    caches: RefCell<Caches>,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl<'a> TypeSystem<'a> {
    #[must_use]
    pub fn new(
        program: &'a Program,
        binder: &'a Binder,
        catalog: &'a TypeCatalog,
        aliases: &'a AliasTable,
    ) -> Self {
        let mut alias_decls = FxHashMap::default();
        for (index, decl) in binder.decls().iter().enumerate() {
            if decl.kind == DeclKind::TypeAlias {
                alias_decls
                    .entry(decl.name.clone())
                    .or_insert(DeclId(index as u32));
            }
        }
        let mut sig_owner = FxHashMap::default();
        for def in catalog.defs() {
            for member in &def.members {
                if let Some(member_id) = member.source
                    && let Some(info) = binder.member(member_id)
                    && let Some(sig) = info.signature
                {
                    sig_owner.insert(sig, def.id);
                }
            }
            if let Some(ctor) = def.ctor {
                sig_owner.insert(ctor, def.id);
            }
        }
        Self {
            program,
            binder,
            catalog,
            aliases,
            alias_decls,
            sig_owner,
            caches: RefCell::new(Caches::default()),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Diagnostics recorded by queries since the last drain.
    #[must_use]
    pub fn drain_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics.borrow_mut())
    }

    fn report(&self, file: FileId, span: Span, code: u32, args: &[&str]) {
        let template = get_message_template(code).unwrap_or("Unknown diagnostic.");
        let path = self
            .program
            .file(file)
            .map_or_else(String::new, |f| f.path.clone());
        self.diagnostics.borrow_mut().push(Diagnostic::error(
            path,
            span,
            format_message(template, args),
            code,
        ));
    }

    // =========================================================================
    // typeOfDecl
    // =========================================================================

    /// The declared type of a declaration. Uses the captured type-node
    /// syntax, never a live symbol query.
    #[must_use]
    pub fn type_of_decl(&self, decl: DeclId) -> IrType {
        if let Some(cached) = self.caches.borrow().decl_type_cache.get(&decl) {
            return cached.clone();
        }
        let computed = self.compute_decl_type(decl);
        self.caches
            .borrow_mut()
            .decl_type_cache
            .insert(decl, computed.clone());
        computed
    }

    fn compute_decl_type(&self, decl: DeclId) -> IrType {
        let Some(info) = self.binder.decl(decl) else {
            return IrType::Unknown;
        };
        if let Some(type_syntax) = info.type_syntax {
            return self.type_from_syntax(type_syntax);
        }
        match info.kind {
            DeclKind::Function | DeclKind::Method => {
                let Some(sig) = info.signature else {
                    return IrType::Unknown;
                };
                let raw = self.raw_signature(sig);
                IrType::Function {
                    params: raw.param_types.clone(),
                    return_type: Box::new(raw.return_type.clone()),
                }
            }
            DeclKind::Class | DeclKind::Interface => self
                .catalog
                .resolve_decl(decl)
                .map_or(IrType::Unknown, |id| self.instance_type(id)),
            _ => IrType::Unknown,
        }
    }

    /// The instance type of a catalog type: a reference with the type's
    /// own parameters as arguments.
    #[must_use]
    pub fn instance_type(&self, id: TypeId) -> IrType {
        let Some(def) = self.catalog.get(id) else {
            return IrType::Unknown;
        };
        IrType::Reference {
            name: def.ts_name.clone(),
            type_args: def
                .type_params
                .iter()
                .map(|tp| IrType::TypeParameter(tp.name.clone()))
                .collect(),
            type_id: Some(id),
        }
    }

    // =========================================================================
    // typeFromSyntax
    // =========================================================================

    /// Convert a captured surface type node to an IR type.
    #[must_use]
    pub fn type_from_syntax(&self, id: TypeSyntaxId) -> IrType {
        let Some(info) = self.binder.type_syntax(id) else {
            return IrType::Unknown;
        };
        let scope: Vec<String> = info.scope.clone();
        self.convert_type_node(info.file, info.node, &scope, 0)
    }

    fn convert_type_node(
        &self,
        file: FileId,
        node: NodeId,
        scope: &[String],
        depth: usize,
    ) -> IrType {
        if depth > MAX_TYPE_SYNTAX_DEPTH {
            return IrType::Unknown;
        }
        let Some(kind) = self.program.arena.kind(node) else {
            return IrType::Unknown;
        };
        let span = self.program.arena.span(node);
        match kind {
            NodeKind::TypeRef { name, type_args } => {
                self.convert_type_ref(file, span, name, type_args, scope, depth)
            }
            NodeKind::ArrayType { element } => IrType::Array {
                element: Box::new(self.convert_type_node(file, *element, scope, depth + 1)),
                origin: ArrayOrigin::Explicit,
            },
            NodeKind::TupleType { elements } => IrType::Tuple(
                elements
                    .iter()
                    .map(|e| self.convert_type_node(file, *e, scope, depth + 1))
                    .collect(),
            ),
            NodeKind::FunctionType {
                params,
                return_type,
            } => IrType::Function {
                params: params
                    .iter()
                    .map(|(_, t)| self.convert_type_node(file, *t, scope, depth + 1))
                    .collect(),
                return_type: Box::new(self.convert_type_node(
                    file,
                    *return_type,
                    scope,
                    depth + 1,
                )),
            },
            NodeKind::ObjectType { members } => self.convert_object_type(file, members, scope, depth),
            NodeKind::UnionType(members) => IrType::union(
                members
                    .iter()
                    .map(|m| self.convert_type_node(file, *m, scope, depth + 1))
                    .collect(),
            ),
            NodeKind::IntersectionType(members) => IrType::Intersection(
                members
                    .iter()
                    .map(|m| self.convert_type_node(file, *m, scope, depth + 1))
                    .collect(),
            ),
            NodeKind::LiteralType(lit) => IrType::Literal(match lit {
                TypeLiteral::String(s) => IrLiteralType::String(s.clone()),
                TypeLiteral::Number(n) => IrLiteralType::Number(n.clone()),
                TypeLiteral::Boolean(b) => IrLiteralType::Boolean(*b),
            }),
            NodeKind::TypePredicate { .. } => IrType::BOOLEAN,
            _ => {
                self.report(file, span, codes::INTERNAL_ERROR, &["type node expected"]);
                IrType::Unknown
            }
        }
    }

    fn convert_object_type(
        &self,
        file: FileId,
        members: &[ObjectTypeMember],
        scope: &[String],
        depth: usize,
    ) -> IrType {
        // A lone index signature is a dictionary.
        if members.len() == 1
            && let ObjectTypeMember::Index {
                key_type,
                value_type,
            } = &members[0]
        {
            return IrType::Dictionary {
                key: Box::new(self.convert_type_node(file, *key_type, scope, depth + 1)),
                value: Box::new(self.convert_type_node(file, *value_type, scope, depth + 1)),
            };
        }
        let props = members
            .iter()
            .filter_map(|m| match m {
                ObjectTypeMember::Property {
                    name,
                    type_annotation,
                    optional,
                    readonly,
                } => Some(ObjectProperty {
                    name: name.clone(),
                    ty: self.convert_type_node(file, *type_annotation, scope, depth + 1),
                    optional: *optional,
                    readonly: *readonly,
                }),
                ObjectTypeMember::Index { .. } => None,
            })
            .collect();
        IrType::Object(props)
    }

    fn convert_type_ref(
        &self,
        file: FileId,
        span: Span,
        name: &str,
        type_args: &[NodeId],
        scope: &[String],
        depth: usize,
    ) -> IrType {
        if scope.iter().any(|p| p == name) {
            return IrType::TypeParameter(name.to_string());
        }
        match name {
            "string" => return IrType::STRING,
            "number" => return IrType::NUMBER,
            "int" => return IrType::INT,
            "char" => return IrType::CHAR,
            "boolean" => return IrType::BOOLEAN,
            "null" => return IrType::NULL,
            "undefined" => return IrType::UNDEFINED,
            "any" => return IrType::Any,
            "unknown" => return IrType::Unknown,
            "void" => return IrType::Void,
            "never" => return IrType::Never,
            _ => {}
        }
        let args: Vec<IrType> = type_args
            .iter()
            .map(|a| self.convert_type_node(file, *a, scope, depth + 1))
            .collect();
        if name == "Array" && args.len() == 1 {
            return IrType::Array {
                element: Box::new(args.into_iter().next().unwrap_or(IrType::Unknown)),
                origin: ArrayOrigin::Explicit,
            };
        }
        if let Some(expanded) = self.expand_utility_type(name, &args) {
            return expanded;
        }
        // Type aliases stay as references by name; self-referential
        // aliases resolve lazily on lookup.
        if self.alias_decls.contains_key(name) {
            return IrType::Reference {
                name: name.to_string(),
                type_args: args,
                type_id: None,
            };
        }
        if let Some(id) = self.catalog.resolve_name(name, args.len(), self.aliases) {
            return IrType::Reference {
                name: self
                    .catalog
                    .get(id)
                    .map_or_else(|| name.to_string(), |d| d.ts_name.clone()),
                type_args: args,
                type_id: Some(id),
            };
        }
        self.report(file, span, codes::UNRESOLVED_BINDING, &[name]);
        IrType::Unknown
    }

    // ----- utility types -----

    /// Expand a utility type applied to concrete arguments. Applications
    /// to non-concrete (type-parameter) arguments intentionally fall
    /// through to a plain reference type.
    fn expand_utility_type(&self, name: &str, args: &[IrType]) -> Option<IrType> {
        let is_utility = matches!(
            name,
            "Partial" | "Required" | "Readonly" | "Pick" | "Omit" | "Record" | "NonNullable"
                | "Exclude" | "Extract"
        );
        if !is_utility {
            return None;
        }
        let fallthrough = || {
            Some(IrType::Reference {
                name: name.to_string(),
                type_args: args.to_vec(),
                type_id: None,
            })
        };
        let first = args.first()?;
        if matches!(first, IrType::TypeParameter(_)) {
            return fallthrough();
        }
        match name {
            "Partial" | "Required" | "Readonly" => {
                let Some(props) = self.structural_props(first) else {
                    return fallthrough();
                };
                let mapped = props
                    .into_iter()
                    .map(|p| ObjectProperty {
                        optional: match name {
                            "Partial" => true,
                            "Required" => false,
                            _ => p.optional,
                        },
                        readonly: if name == "Readonly" { true } else { p.readonly },
                        ..p
                    })
                    .collect();
                Some(IrType::Object(mapped))
            }
            "Pick" | "Omit" => {
                let keys = literal_string_set(args.get(1)?)?;
                let Some(props) = self.structural_props(first) else {
                    return fallthrough();
                };
                let kept = props
                    .into_iter()
                    .filter(|p| {
                        let named = keys.contains(&p.name);
                        if name == "Pick" { named } else { !named }
                    })
                    .collect();
                Some(IrType::Object(kept))
            }
            "Record" => {
                let key = args.first()?.clone();
                let value = args.get(1)?.clone();
                Some(IrType::Dictionary {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            "NonNullable" => Some(first.non_null()),
            "Exclude" | "Extract" => {
                let second = args.get(1)?;
                let members = match first {
                    IrType::Union(members) => members.clone(),
                    other => vec![other.clone()],
                };
                let excluded: Vec<IrType> = match second {
                    IrType::Union(targets) => targets.clone(),
                    other => vec![other.clone()],
                };
                let kept = members
                    .into_iter()
                    .filter(|m| {
                        let hit = excluded.contains(m);
                        if name == "Exclude" { !hit } else { hit }
                    })
                    .collect();
                Some(IrType::union(kept))
            }
            _ => None,
        }
    }

    /// The structural property list of a type: object types directly,
    /// alias bodies and source interfaces by expansion.
    fn structural_props(&self, ty: &IrType) -> Option<Vec<ObjectProperty>> {
        match ty {
            IrType::Object(props) => Some(props.clone()),
            IrType::Reference { name, .. } => {
                if let Some(decl) = self.alias_decls.get(name) {
                    let info = self.binder.decl(*decl)?;
                    let body = self.type_from_syntax(info.type_syntax?);
                    return self.structural_props(&body);
                }
                let id = self.catalog.resolve_name(name, 0, self.aliases)?;
                let def = self.catalog.get(id)?;
                if def.kind != TypeDefKind::Interface {
                    return None;
                }
                let props = def
                    .members
                    .iter()
                    .filter(|m| m.kind == CatalogMemberKind::Property)
                    .map(|m| ObjectProperty {
                        name: m.name.clone(),
                        ty: self.member_template_type(m),
                        optional: m.optional,
                        readonly: m.readonly,
                    })
                    .collect();
                Some(props)
            }
            _ => None,
        }
    }

    // =========================================================================
    // typeOfMember
    // =========================================================================

    /// The type of a member on a receiver, with generic substitution
    /// applied along the inheritance chain. Primitives bridge to their
    /// nominal companions. Returns `unknown` when the receiver cannot be
    /// normalized.
    #[must_use]
    pub fn type_of_member(&self, receiver: &IrType, member_name: &str) -> IrType {
        let cache_key = (stable_ir_type_key(receiver), member_name.to_string());
        if let Some(cached) = self.caches.borrow().member_lookup_cache.get(&cache_key) {
            return cached.clone();
        }
        let computed = self
            .lookup_member(receiver, member_name)
            .map_or(IrType::Unknown, |(member, subst)| {
                substitute(&self.member_template_type(&member), &subst)
            });
        self.caches
            .borrow_mut()
            .member_lookup_cache
            .insert(cache_key, computed.clone());
        computed
    }

    /// Find a member along the receiver's inheritance chain, together
    /// with the substitution at the declaring type.
    pub(crate) fn lookup_member(
        &self,
        receiver: &IrType,
        member_name: &str,
    ) -> Option<(CatalogMember, Substitution)> {
        let (mut id, mut args) = self.normalize_receiver(receiver)?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let def = self.catalog.get(id)?;
            let subst: Substitution = def
                .type_params
                .iter()
                .map(|tp| tp.name.clone())
                .zip(args.iter().cloned())
                .collect();
            if let Some(member) = def.members.iter().find(|m| m.name == member_name) {
                return Some((member.clone(), subst));
            }
            let base = match &def.base {
                Some(BaseRef::Concrete(base)) => substitute(base, &subst),
                Some(BaseRef::Syntax(syntax)) => {
                    substitute(&self.type_from_syntax(*syntax), &subst)
                }
                None => return None,
            };
            let (next_id, next_args) = self.normalize_receiver(&base)?;
            id = next_id;
            args = next_args;
        }
        None
    }

    /// Whether a type is a user-defined (source) interface. Classes may
    /// not implement these: interfaces are nominalized to classes at emit
    /// time.
    #[must_use]
    pub fn is_source_interface(&self, ty: &IrType) -> bool {
        let Some((id, _)) = self.normalize_receiver(ty) else {
            return false;
        };
        let Some(def) = self.catalog.get(id) else {
            return false;
        };
        def.kind == TypeDefKind::Interface
            && matches!(def.origin, crate::catalog::TypeOrigin::Source(_))
    }

    /// The binder member behind a receiver's member, for source-declared
    /// types.
    #[must_use]
    pub fn source_member(
        &self,
        receiver: &IrType,
        member_name: &str,
    ) -> Option<tsonic_binder::ids::MemberId> {
        self.lookup_member(receiver, member_name)
            .and_then(|(member, _)| member.source)
    }

    /// Normalize a receiver to a catalog identity plus type arguments,
    /// bridging primitives and arrays to their nominal companions.
    pub(crate) fn normalize_receiver(&self, receiver: &IrType) -> Option<(TypeId, Vec<IrType>)> {
        match receiver {
            IrType::Primitive(IrPrimitive::String) => {
                Some((self.catalog.resolve_ts_name("String")?, Vec::new()))
            }
            IrType::Array { element, .. } => Some((
                self.catalog.resolve_ts_name("Array")?,
                vec![element.as_ref().clone()],
            )),
            IrType::Reference {
                name,
                type_args,
                type_id,
            } => {
                let id = type_id.or_else(|| {
                    self.catalog.resolve_name(name, type_args.len(), self.aliases)
                })?;
                Some((id, type_args.clone()))
            }
            _ => None,
        }
    }

    /// A member's template type, in terms of its declaring type's
    /// parameters.
    fn member_template_type(&self, member: &CatalogMember) -> IrType {
        if let Some(member_id) = member.source {
            let Some(info) = self.binder.member(member_id) else {
                return IrType::Unknown;
            };
            if let Some(type_syntax) = info.type_syntax {
                return self.type_from_syntax(type_syntax);
            }
            if let Some(sig) = info.signature {
                let raw = self.raw_signature(sig);
                return IrType::Function {
                    params: raw.param_types.clone(),
                    return_type: Box::new(raw.return_type.clone()),
                };
            }
            return IrType::Unknown;
        }
        if let Some(ty) = &member.concrete_ty {
            return ty.clone();
        }
        if let Some(params) = &member.concrete_params {
            return IrType::Function {
                params: params.clone(),
                return_type: Box::new(
                    member.concrete_return.clone().unwrap_or(IrType::Unknown),
                ),
            };
        }
        IrType::Unknown
    }

    // =========================================================================
    // resolveCall
    // =========================================================================

    /// The principal oracle: resolve a call site to parameter types,
    /// parameter modes, and a return type.
    ///
    /// The output arrays always have length exactly `argument_count`; a
    /// missing signature produces the poisoned result.
    #[must_use]
    pub fn resolve_call(&self, query: &CallQuery<'_>) -> ResolvedCall {
        // 1. Raw signature lookup.
        let Some(sig) = query.sig else {
            let mut poisoned = ResolvedCall::poisoned(query.argument_count);
            poisoned.diagnostics.push(Diagnostic::error(
                query.file,
                query.site.unwrap_or_else(Span::dummy),
                format_message(
                    get_message_template(codes::UNRESOLVED_BINDING).unwrap_or_default(),
                    &["<call target>"],
                ),
                codes::UNRESOLVED_BINDING,
            ));
            return poisoned;
        };
        if self.binder.signature(sig).is_none() {
            return ResolvedCall::poisoned(query.argument_count);
        }
        let raw = self.raw_signature(sig);
        trace!(sig = %sig, argc = query.argument_count, "resolve_call");

        let mut bindings: Substitution = Substitution::default();
        let mut conflicts: FxHashSet<String> = FxHashSet::default();

        // 2. Explicit type arguments.
        for ((name, _), arg) in raw.type_params.iter().zip(query.explicit_type_args) {
            bindings.insert(name.clone(), arg.clone());
        }

        // 3. Receiver instantiation along the inheritance chain.
        if let Some(receiver) = query.receiver_type
            && let Some(declaring) = raw.declaring
            && let Some(inst) = self.instantiation_in_chain(receiver, declaring)
        {
            for (name, ty) in inst {
                bindings.entry(name).or_insert(ty);
            }
        }

        // 4. Argument unification.
        if let Some(arg_types) = query.arg_types {
            for (template, actual) in raw.param_types.iter().zip(arg_types) {
                unify(template, actual, &mut bindings, &mut conflicts);
            }
        }

        // 5. Expected-return unification for still-unbound parameters.
        if let Some(expected) = query.expected_return_type {
            let mut return_bindings = Substitution::default();
            let mut return_conflicts = FxHashSet::default();
            unify(
                &raw.return_type,
                expected,
                &mut return_bindings,
                &mut return_conflicts,
            );
            for (name, ty) in return_bindings {
                if !bindings.contains_key(&name) && !conflicts.contains(&name) {
                    bindings.insert(name, ty);
                }
            }
        }

        // 6. Final substitution; un-inferred signature parameters poison
        //    to `unknown`.
        let mut final_subst = bindings;
        let mut inferred_type_args = Vec::with_capacity(raw.type_params.len());
        for (name, _) in &raw.type_params {
            let inferred = final_subst.get(name).cloned().unwrap_or(IrType::Unknown);
            final_subst.insert(name.clone(), inferred.clone());
            inferred_type_args.push(inferred);
        }

        let mut parameter_types: Vec<IrType> = raw
            .param_types
            .iter()
            .take(query.argument_count)
            .map(|t| substitute(t, &final_subst))
            .collect();
        parameter_types.resize(query.argument_count, IrType::Unknown);
        let mut parameter_modes: Vec<ParamMode> = raw
            .param_modes
            .iter()
            .take(query.argument_count)
            .copied()
            .collect();
        parameter_modes.resize(query.argument_count, ParamMode::Value);

        let return_type = substitute(&raw.return_type, &final_subst);

        // 7. Type predicate resolution.
        let type_predicate = raw.predicate.as_ref().map(|(param, target)| TypePredicate {
            param: param.clone(),
            param_index: self
                .binder
                .signature(sig)
                .and_then(|s| s.params.iter().position(|p| &p.name == param)),
            ty: substitute(target, &final_subst),
        });

        ResolvedCall {
            parameter_types,
            parameter_modes,
            return_type,
            type_predicate,
            generic: !raw.type_params.is_empty(),
            inferred_type_args,
            diagnostics: Vec::new(),
        }
    }

    /// Resolve a call to a catalog member (facade or builtin) on a
    /// receiver. Same output discipline as [`TypeSystem::resolve_call`].
    #[must_use]
    pub fn resolve_member_call(
        &self,
        receiver: &IrType,
        member_name: &str,
        argument_count: usize,
    ) -> ResolvedCall {
        let Some((member, subst)) = self.lookup_member(receiver, member_name) else {
            return ResolvedCall::poisoned(argument_count);
        };
        if member.source.is_some() {
            // Source members resolve through their signature.
            let Some(info) = member.source.and_then(|m| self.binder.member(m)) else {
                return ResolvedCall::poisoned(argument_count);
            };
            let Some(sig) = info.signature else {
                return ResolvedCall::poisoned(argument_count);
            };
            return self.resolve_call(&CallQuery {
                sig: Some(sig),
                argument_count,
                receiver_type: Some(receiver),
                ..CallQuery::default()
            });
        }
        let Some(params) = &member.concrete_params else {
            return ResolvedCall::poisoned(argument_count);
        };
        let mut parameter_types: Vec<IrType> = params
            .iter()
            .take(argument_count)
            .map(|t| substitute(t, &subst))
            .collect();
        parameter_types.resize(argument_count, IrType::Unknown);
        let mut parameter_modes: Vec<ParamMode> =
            member.modes.iter().take(argument_count).copied().collect();
        parameter_modes.resize(argument_count, ParamMode::Value);
        ResolvedCall {
            parameter_types,
            parameter_modes,
            return_type: member
                .concrete_return
                .as_ref()
                .map_or(IrType::Unknown, |r| substitute(r, &subst)),
            type_predicate: None,
            generic: false,
            inferred_type_args: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Compute the substitution a receiver induces at `target`'s position
    /// in its inheritance chain.
    #[must_use]
    pub fn instantiation_in_chain(
        &self,
        receiver: &IrType,
        target: TypeId,
    ) -> Option<Substitution> {
        let (mut id, mut args) = self.normalize_receiver(receiver)?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let def = self.catalog.get(id)?;
            let subst: Substitution = def
                .type_params
                .iter()
                .map(|tp| tp.name.clone())
                .zip(args.iter().cloned())
                .collect();
            if id == target {
                return Some(subst);
            }
            let base = match &def.base {
                Some(BaseRef::Concrete(base)) => substitute(base, &subst),
                Some(BaseRef::Syntax(syntax)) => {
                    substitute(&self.type_from_syntax(*syntax), &subst)
                }
                None => return None,
            };
            let (next_id, next_args) = self.normalize_receiver(&base)?;
            id = next_id;
            args = next_args;
        }
        None
    }

    fn raw_signature(&self, sig: SignatureId) -> RawSignature {
        if let Some(cached) = self.caches.borrow().signature_raw_cache.get(&sig) {
            return cached.clone();
        }
        let raw = self.build_raw_signature(sig);
        self.caches
            .borrow_mut()
            .signature_raw_cache
            .insert(sig, raw.clone());
        raw
    }

    fn build_raw_signature(&self, sig: SignatureId) -> RawSignature {
        let Some(info) = self.binder.signature(sig) else {
            return RawSignature {
                type_params: Vec::new(),
                param_types: Vec::new(),
                param_modes: Vec::new(),
                return_type: IrType::Unknown,
                predicate: None,
                declaring: None,
                is_constructor: false,
            };
        };
        let declaring = self.sig_owner.get(&sig).copied();

        let mut type_params: Vec<(String, Option<IrType>)> = info
            .type_params
            .iter()
            .map(|tp| {
                (
                    tp.name.clone(),
                    tp.constraint.map(|c| self.type_from_syntax(c)),
                )
            })
            .collect();
        // Constructors are generic over their class's parameters.
        if info.is_constructor
            && let Some(owner) = declaring
        {
            for tp in self.catalog.type_parameters(owner) {
                type_params.push((tp.name.clone(), None));
            }
        }

        let mut param_types = Vec::with_capacity(info.params.len());
        let mut param_modes = Vec::with_capacity(info.params.len());
        for param in &info.params {
            let ty = match param.type_syntax {
                Some(type_syntax) => self.type_from_syntax(type_syntax),
                None => IrType::Unknown,
            };
            param_types.push(ty);
            param_modes.push(param.mode);
        }

        let (return_type, predicate) = if info.is_constructor {
            let instance = declaring.map_or(IrType::Unknown, |id| self.instance_type(id));
            (instance, None)
        } else {
            match info.return_syntax {
                Some(return_syntax) => {
                    let syntax_info = self.binder.type_syntax(return_syntax);
                    let predicate_parts = syntax_info.and_then(|si| {
                        match self.program.arena.kind(si.node) {
                            Some(NodeKind::TypePredicate { param, target }) => {
                                let scope = si.scope.clone();
                                Some((
                                    param.clone(),
                                    self.convert_type_node(si.file, *target, &scope, 0),
                                ))
                            }
                            _ => None,
                        }
                    });
                    match predicate_parts {
                        Some((param, target)) => (IrType::BOOLEAN, Some((param, target))),
                        None => (self.type_from_syntax(return_syntax), None),
                    }
                }
                None => (IrType::Unknown, None),
            }
        };

        RawSignature {
            type_params,
            param_types,
            param_modes,
            return_type,
            predicate,
            declaring,
            is_constructor: info.is_constructor,
        }
    }

    /// Report missing parameter annotations on a signature as
    /// diagnostics. Called once per declaration by the IR builder.
    pub fn check_parameter_annotations(&self, sig: SignatureId, file: FileId, span: Span) {
        let Some(info) = self.binder.signature(sig) else {
            return;
        };
        for param in &info.params {
            if param.type_syntax.is_none() {
                self.report(
                    file,
                    span,
                    codes::MISSING_PARAMETER_ANNOTATION,
                    &[&param.name],
                );
            }
        }
    }

    // =========================================================================
    // delegateToFunctionType
    // =========================================================================

    /// Turn a nominal delegate type into a structural function type for
    /// lambda contextual typing. Function types pass through.
    #[must_use]
    pub fn delegate_to_function_type(&self, ty: &IrType) -> Option<IrType> {
        if matches!(ty, IrType::Function { .. }) {
            return Some(ty.clone());
        }
        let (id, args) = self.normalize_receiver(ty)?;
        let def = self.catalog.get(id)?;
        if def.kind != TypeDefKind::Delegate {
            return None;
        }
        let invoke = def
            .members
            .iter()
            .find(|m| m.name == "invoke" || m.clr_name.as_deref() == Some("Invoke"))?;
        let subst: Substitution = def
            .type_params
            .iter()
            .map(|tp| tp.name.clone())
            .zip(args)
            .collect();
        let params = invoke.concrete_params.clone()?;
        Some(IrType::Function {
            params: params.iter().map(|p| substitute(p, &subst)).collect(),
            return_type: Box::new(
                invoke
                    .concrete_return
                    .as_ref()
                    .map_or(IrType::Unknown, |r| substitute(r, &subst)),
            ),
        })
    }
}

/// The string keys of a `Pick`/`Omit` selector: a string literal or a
/// union of string literals.
fn literal_string_set(ty: &IrType) -> Option<Vec<String>> {
    match ty {
        IrType::Literal(IrLiteralType::String(s)) => Some(vec![s.clone()]),
        IrType::Union(members) => {
            let mut keys = Vec::with_capacity(members.len());
            for member in members {
                let IrType::Literal(IrLiteralType::String(s)) = member else {
                    return None;
                };
                keys.push(s.clone());
            }
            Some(keys)
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/typesystem.rs"]
mod tests;
