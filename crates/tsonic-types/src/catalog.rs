//! Type catalog - the closed universe of nominal types.
//!
//! Each type has a TS-name (as written in source) and a CLR-name (the
//! fully-qualified target name, arity-suffixed where applicable). Types
//! come from three places: user source declarations, external binding
//! manifests, and the built-in primitive companions (`String`, `Array`,
//! `Generator`, …) that bridge primitive member access to nominal lookup.
//!
//! The catalog is populated before IR building and read-only afterwards.

use rustc_hash::FxHashMap;
use tracing::debug;
use tsonic_binder::Binder;
use tsonic_binder::ids::{DeclId, MemberId, SignatureId, TypeSyntaxId};
use tsonic_binder::registry::{DeclKind, MemberKind, ParamMode};
use tsonic_ir::types::{IrPrimitive, IrType, TypeId};
use tsonic_surface::ast::{NodeKind, Program};
use tsonic_surface::manifest::{
    BindingManifest, GlobalBinding, ManifestMemberKind, ManifestType, ManifestTypeExpr,
    ManifestTypeKind, ModuleManifest,
};

use crate::alias::AliasTable;

/// Kind of a catalog type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeDefKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

impl From<ManifestTypeKind> for TypeDefKind {
    fn from(kind: ManifestTypeKind) -> Self {
        match kind {
            ManifestTypeKind::Class => TypeDefKind::Class,
            ManifestTypeKind::Interface => TypeDefKind::Interface,
            ManifestTypeKind::Struct => TypeDefKind::Struct,
            ManifestTypeKind::Enum => TypeDefKind::Enum,
            ManifestTypeKind::Delegate => TypeDefKind::Delegate,
        }
    }
}

/// Where a catalog type came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeOrigin {
    Source(DeclId),
    Manifest { assembly: String },
    Builtin,
}

/// A type parameter of a catalog type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParameterInfo {
    pub name: String,
}

/// Kind of a catalog member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogMemberKind {
    Property,
    Method,
    Field,
}

/// One member of a catalog type.
///
/// Source members carry binder handles and are typed lazily by the type
/// system; manifest and builtin members carry concrete template types
/// (in terms of the owner's type parameters). A member with neither
/// resolves to `unknown`.
#[derive(Clone, Debug)]
pub struct CatalogMember {
    pub name: String,
    pub kind: CatalogMemberKind,
    pub is_static: bool,
    pub readonly: bool,
    pub optional: bool,
    /// Binder member, for source-declared types.
    pub source: Option<MemberId>,
    /// Property/field template type, for manifest/builtin members.
    pub concrete_ty: Option<IrType>,
    /// Method parameter template types, for manifest/builtin members.
    pub concrete_params: Option<Vec<IrType>>,
    pub concrete_return: Option<IrType>,
    pub modes: Vec<ParamMode>,
    /// CLR member name when it differs from the surface name
    /// (e.g. `length` → `Count`).
    pub clr_name: Option<String>,
}

impl CatalogMember {
    fn property(name: &str, ty: IrType) -> Self {
        Self {
            name: name.to_string(),
            kind: CatalogMemberKind::Property,
            is_static: false,
            readonly: true,
            optional: false,
            source: None,
            concrete_ty: Some(ty),
            concrete_params: None,
            concrete_return: None,
            modes: Vec::new(),
            clr_name: None,
        }
    }

    fn method(name: &str, params: Vec<IrType>, returns: IrType) -> Self {
        Self {
            name: name.to_string(),
            kind: CatalogMemberKind::Method,
            is_static: false,
            readonly: false,
            optional: false,
            source: None,
            concrete_ty: None,
            modes: vec![ParamMode::Value; params.len()],
            concrete_params: Some(params),
            concrete_return: Some(returns),
            clr_name: None,
        }
    }

    fn with_clr_name(mut self, clr_name: &str) -> Self {
        self.clr_name = Some(clr_name.to_string());
        self
    }
}

/// Base-type reference of a catalog type.
#[derive(Clone, Debug)]
pub enum BaseRef {
    /// Captured surface syntax (source types); converted lazily.
    Syntax(TypeSyntaxId),
    /// Concrete template type (manifest/builtin types), in terms of the
    /// owner's type parameters.
    Concrete(IrType),
}

/// One nominal type.
#[derive(Clone, Debug)]
pub struct TypeDef {
    pub id: TypeId,
    pub ts_name: String,
    /// Fully-qualified target name, arity-suffixed where applicable.
    pub clr_name: String,
    pub kind: TypeDefKind,
    pub type_params: Vec<TypeParameterInfo>,
    pub base: Option<BaseRef>,
    pub members: Vec<CatalogMember>,
    pub origin: TypeOrigin,
    /// Constructor signature for source classes.
    pub ctor: Option<SignatureId>,
}

/// A value export registered from a manifest `exports` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueBinding {
    pub declaring_clr_type: String,
    pub assembly: String,
    pub clr_name: String,
}

/// The closed universe of nominal types.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    defs: Vec<TypeDef>,
    by_ts_name: FxHashMap<String, TypeId>,
    by_clr_name: FxHashMap<String, TypeId>,
    by_decl: FxHashMap<DeclId, TypeId>,
    /// Flattened value exports from manifests, name → CLR site.
    value_bindings: FxHashMap<String, ValueBinding>,
    /// Global identifier renames (`console` → `Console`).
    global_renames: FxHashMap<String, String>,
}

impl TypeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog pre-seeded with the primitive companions.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.seed_builtins();
        catalog
    }

    // =========================================================================
    // Registration
    // =========================================================================

    fn push(&mut self, mut def: TypeDef) -> TypeId {
        let id = TypeId(self.defs.len() as u32);
        def.id = id;
        self.by_ts_name.entry(def.ts_name.clone()).or_insert(id);
        self.by_clr_name.entry(def.clr_name.clone()).or_insert(id);
        if let TypeOrigin::Source(decl) = def.origin {
            self.by_decl.insert(decl, id);
        }
        self.defs.push(def);
        id
    }

    fn seed_builtins(&mut self) {
        self.push(TypeDef {
            id: TypeId::NONE,
            ts_name: "String".into(),
            clr_name: "System.String".into(),
            kind: TypeDefKind::Class,
            type_params: Vec::new(),
            base: None,
            members: vec![
                CatalogMember::property("length", IrType::INT).with_clr_name("Length"),
                CatalogMember::method("charAt", vec![IrType::INT], IrType::CHAR),
                CatalogMember::method(
                    "substring",
                    vec![IrType::INT, IrType::INT],
                    IrType::STRING,
                )
                .with_clr_name("Substring"),
                CatalogMember::method("indexOf", vec![IrType::STRING], IrType::INT)
                    .with_clr_name("IndexOf"),
            ],
            origin: TypeOrigin::Builtin,
            ctor: None,
        });
        self.push(TypeDef {
            id: TypeId::NONE,
            ts_name: "Array".into(),
            clr_name: "System.Array".into(),
            kind: TypeDefKind::Class,
            type_params: vec![TypeParameterInfo { name: "T".into() }],
            base: None,
            members: vec![
                CatalogMember::property("length", IrType::INT).with_clr_name("Length"),
                CatalogMember::method(
                    "indexOf",
                    vec![IrType::TypeParameter("T".into())],
                    IrType::INT,
                ),
            ],
            origin: TypeOrigin::Builtin,
            ctor: None,
        });
        self.push(TypeDef {
            id: TypeId::NONE,
            ts_name: "Generator".into(),
            clr_name: "Generator_3".into(),
            kind: TypeDefKind::Interface,
            type_params: vec![
                TypeParameterInfo { name: "Y".into() },
                TypeParameterInfo { name: "R".into() },
                TypeParameterInfo { name: "N".into() },
            ],
            base: None,
            members: Vec::new(),
            origin: TypeOrigin::Builtin,
            ctor: None,
        });
        self.push(TypeDef {
            id: TypeId::NONE,
            ts_name: "Error".into(),
            clr_name: "System.Exception".into(),
            kind: TypeDefKind::Class,
            type_params: Vec::new(),
            base: None,
            members: vec![
                CatalogMember::property("message", IrType::STRING).with_clr_name("Message"),
            ],
            origin: TypeOrigin::Builtin,
            ctor: None,
        });
    }

    /// Register all class and interface declarations from user source.
    pub fn add_source_types(&mut self, program: &Program, binder: &Binder, root_namespace: &str) {
        for (index, decl) in binder.decls().iter().enumerate() {
            if !matches!(decl.kind, DeclKind::Class | DeclKind::Interface) {
                continue;
            }
            let decl_id = DeclId(index as u32);
            let Some(node_kind) = program.arena.kind(decl.node) else {
                continue;
            };
            let (kind, type_params, extends) = match node_kind {
                NodeKind::Class {
                    type_params,
                    extends,
                    ..
                } => (TypeDefKind::Class, type_params.clone(), *extends),
                NodeKind::Interface {
                    type_params,
                    extends,
                    ..
                } => (
                    TypeDefKind::Interface,
                    type_params.clone(),
                    extends.first().copied(),
                ),
                _ => continue,
            };
            let file_path = &program.files[decl.file.index()].path;
            let clr_name = source_clr_name(root_namespace, file_path, &decl.name);
            let members = binder
                .members_of(decl_id)
                .iter()
                .filter_map(|member_id| {
                    let member = binder.member(*member_id)?;
                    if member.kind == MemberKind::Constructor {
                        return None;
                    }
                    Some(CatalogMember {
                        name: member.name.clone(),
                        kind: match member.kind {
                            MemberKind::Property => CatalogMemberKind::Property,
                            _ => CatalogMemberKind::Method,
                        },
                        is_static: member.is_static,
                        readonly: member.readonly,
                        optional: member.optional,
                        source: Some(*member_id),
                        concrete_ty: None,
                        concrete_params: None,
                        concrete_return: None,
                        modes: Vec::new(),
                        clr_name: None,
                    })
                })
                .collect();
            let base = extends
                .and_then(|node| binder.type_syntax_of_node(node))
                .map(BaseRef::Syntax);
            self.push(TypeDef {
                id: TypeId::NONE,
                ts_name: decl.name.clone(),
                clr_name,
                kind,
                type_params: type_params
                    .iter()
                    .map(|tp| TypeParameterInfo {
                        name: tp.name.clone(),
                    })
                    .collect(),
                base,
                members,
                origin: TypeOrigin::Source(decl_id),
                ctor: binder.constructor_signature_of(decl_id),
            });
        }
        debug!(types = self.defs.len(), "source types registered");
    }

    /// Register the types of a binding manifest and their aliases.
    pub fn add_manifest(&mut self, manifest: &BindingManifest, aliases: &mut AliasTable) {
        for namespace in &manifest.namespaces {
            for ty in &namespace.types {
                self.add_manifest_type(&namespace.name, &manifest.assembly, ty, aliases);
            }
        }
        if let Some(exports) = &manifest.exports {
            for (name, export) in exports {
                self.value_bindings.insert(
                    name.clone(),
                    ValueBinding {
                        declaring_clr_type: export.declaring_clr_type.clone(),
                        assembly: export.declaring_assembly_name.clone(),
                        clr_name: export.clr_name.clone(),
                    },
                );
            }
        }
    }

    /// Register a module-shaped binding (a single type per module import).
    pub fn add_module_manifest(&mut self, manifest: &ModuleManifest, aliases: &mut AliasTable) {
        self.add_manifest_type(&manifest.module, &manifest.assembly, &manifest.type_def, aliases);
    }

    /// Register a global identifier binding with optional renaming.
    pub fn add_global_binding(&mut self, binding: &GlobalBinding) {
        let clr = binding
            .csharp_name
            .clone()
            .unwrap_or_else(|| binding.name.clone());
        self.global_renames.insert(binding.name.clone(), clr);
        self.value_bindings.insert(
            binding.name.clone(),
            ValueBinding {
                declaring_clr_type: binding.type_name.clone(),
                assembly: binding.assembly.clone(),
                clr_name: binding
                    .csharp_name
                    .clone()
                    .unwrap_or_else(|| binding.name.clone()),
            },
        );
    }

    fn add_manifest_type(
        &mut self,
        namespace: &str,
        assembly: &str,
        ty: &ManifestType,
        aliases: &mut AliasTable,
    ) {
        let ts_name = ty.alias.clone().unwrap_or_else(|| ty.name.clone());
        if let Some(alias) = &ty.alias {
            aliases.add(alias.clone(), ty.name.clone());
        }
        let scope = &ty.type_parameters;
        let members = ty
            .members
            .iter()
            .map(|member| {
                let modes = expand_modes(member);
                CatalogMember {
                    name: member.alias.clone().unwrap_or_else(|| member.name.clone()),
                    kind: match member.kind {
                        ManifestMemberKind::Property | ManifestMemberKind::Event => {
                            CatalogMemberKind::Property
                        }
                        ManifestMemberKind::Field => CatalogMemberKind::Field,
                        ManifestMemberKind::Method => CatalogMemberKind::Method,
                    },
                    is_static: member.is_static,
                    readonly: false,
                    optional: false,
                    source: None,
                    concrete_ty: member
                        .type_expr
                        .as_ref()
                        .map(|e| manifest_type_to_ir(e, scope)),
                    concrete_params: if member.kind == ManifestMemberKind::Method {
                        Some(
                            member
                                .parameters
                                .iter()
                                .map(|p| manifest_type_to_ir(&p.type_expr, scope))
                                .collect(),
                        )
                    } else {
                        None
                    },
                    concrete_return: member
                        .returns
                        .as_ref()
                        .map(|e| manifest_type_to_ir(e, scope)),
                    modes,
                    clr_name: Some(member.binding.member.clone()),
                }
            })
            .collect();
        self.push(TypeDef {
            id: TypeId::NONE,
            ts_name,
            clr_name: format!("{namespace}.{}", ty.name),
            kind: ty.kind.into(),
            type_params: ty
                .type_parameters
                .iter()
                .map(|name| TypeParameterInfo { name: name.clone() })
                .collect(),
            base: ty
                .extends
                .as_ref()
                .map(|e| BaseRef::Concrete(manifest_type_to_ir(e, scope))),
            members,
            origin: TypeOrigin::Manifest {
                assembly: assembly.to_string(),
            },
            ctor: None,
        });
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    #[must_use]
    pub fn get(&self, id: TypeId) -> Option<&TypeDef> {
        self.defs.get(id.index())
    }

    #[must_use]
    pub fn resolve_ts_name(&self, name: &str) -> Option<TypeId> {
        self.by_ts_name.get(name).copied()
    }

    #[must_use]
    pub fn resolve_clr_name(&self, name: &str) -> Option<TypeId> {
        self.by_clr_name.get(name).copied()
    }

    /// Full resolution: alias table → TS-name → CLR-name, retrying with
    /// the deterministic arity suffix.
    #[must_use]
    pub fn resolve_name(&self, name: &str, arity: usize, aliases: &AliasTable) -> Option<TypeId> {
        let canonical = aliases.canonicalize(name, 0);
        if let Some(id) = self
            .resolve_ts_name(&canonical)
            .or_else(|| self.resolve_clr_name(&canonical))
        {
            return Some(id);
        }
        if arity > 0 {
            let retried = aliases.canonicalize(name, arity);
            if retried != canonical {
                return self
                    .resolve_ts_name(&retried)
                    .or_else(|| self.resolve_clr_name(&retried));
            }
        }
        None
    }

    #[must_use]
    pub fn resolve_decl(&self, decl: DeclId) -> Option<TypeId> {
        self.by_decl.get(&decl).copied()
    }

    #[must_use]
    pub fn type_parameters(&self, id: TypeId) -> &[TypeParameterInfo] {
        self.get(id).map_or(&[], |def| def.type_params.as_slice())
    }

    /// The member with the given surface name, searching this type only
    /// (inheritance walks live in the type system).
    #[must_use]
    pub fn find_member(&self, id: TypeId, name: &str) -> Option<&CatalogMember> {
        self.get(id)?.members.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn value_binding(&self, name: &str) -> Option<&ValueBinding> {
        self.value_bindings.get(name)
    }

    #[must_use]
    pub fn global_rename(&self, name: &str) -> Option<&str> {
        self.global_renames.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// All defs in registration order.
    #[must_use]
    pub fn defs(&self) -> &[TypeDef] {
        &self.defs
    }
}

/// Convert a manifest type expression to an IR template type; names in
/// `scope` become type parameters.
fn manifest_type_to_ir(expr: &ManifestTypeExpr, scope: &[String]) -> IrType {
    if scope.iter().any(|p| p == &expr.name) {
        return IrType::TypeParameter(expr.name.clone());
    }
    match expr.name.as_str() {
        "string" => IrType::Primitive(IrPrimitive::String),
        "number" | "double" => IrType::Primitive(IrPrimitive::Number),
        "int" => IrType::Primitive(IrPrimitive::Int),
        "char" => IrType::Primitive(IrPrimitive::Char),
        "boolean" | "bool" => IrType::Primitive(IrPrimitive::Boolean),
        "void" => IrType::Void,
        "any" => IrType::Any,
        _ => IrType::Reference {
            name: expr.name.clone(),
            type_args: expr
                .args
                .iter()
                .map(|a| manifest_type_to_ir(a, scope))
                .collect(),
            type_id: None,
        },
    }
}

fn expand_modes(member: &tsonic_surface::manifest::ManifestMember) -> Vec<ParamMode> {
    use tsonic_surface::manifest::ManifestParameterModifier;
    let mut modes = vec![ParamMode::Value; member.parameters.len()];
    for spec in &member.binding.parameter_modifiers {
        let index = spec.index as usize;
        if index < modes.len() {
            modes[index] = match spec.modifier {
                ManifestParameterModifier::Ref => ParamMode::Ref,
                ManifestParameterModifier::Out => ParamMode::Out,
                ManifestParameterModifier::In => ParamMode::In,
            };
        }
    }
    modes
}

/// Synthesize the CLR name of a source type from the root namespace, the
/// file's directory path, and the type name.
#[must_use]
pub fn source_clr_name(root_namespace: &str, file_path: &str, type_name: &str) -> String {
    let mut parts: Vec<String> = vec![root_namespace.to_string()];
    let dir = match file_path.rfind('/') {
        Some(idx) => &file_path[..idx],
        None => "",
    };
    for segment in dir.split('/').filter(|s| !s.is_empty()) {
        parts.push(pascal_case(segment));
    }
    parts.push(type_name.to_string());
    parts.join(".")
}

/// Upper-case the first letter of a path segment.
#[must_use]
pub fn pascal_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_companions() {
        let catalog = TypeCatalog::with_builtins();
        let string = catalog.resolve_ts_name("String").unwrap();
        let length = catalog.find_member(string, "length").unwrap();
        assert_eq!(length.concrete_ty, Some(IrType::INT));
        assert_eq!(length.clr_name.as_deref(), Some("Length"));
    }

    #[test]
    fn test_resolve_name_with_arity_retry() {
        let mut catalog = TypeCatalog::new();
        let mut aliases = AliasTable::new();
        let manifest = BindingManifest {
            assembly: "System.Runtime".into(),
            namespaces: vec![tsonic_surface::manifest::ManifestNamespace {
                name: "System.Collections.Generic".into(),
                alias: None,
                types: vec![ManifestType {
                    name: "IList_1".into(),
                    alias: Some("IList".into()),
                    kind: ManifestTypeKind::Interface,
                    type_parameters: vec!["T".into()],
                    extends: None,
                    members: Vec::new(),
                }],
            }],
            exports: None,
        };
        catalog.add_manifest(&manifest, &mut aliases);
        // Alias table route.
        assert!(catalog.resolve_name("IList", 1, &aliases).is_some());
        // CLR-name route.
        assert!(
            catalog
                .resolve_name("System.Collections.Generic.IList_1", 0, &aliases)
                .is_some()
        );
        // Arity-suffix retry without an alias entry.
        let mut bare = AliasTable::new();
        bare.add("nothing", "nothing");
        assert!(catalog.resolve_name("IList", 1, &bare).is_some());
    }

    #[test]
    fn test_source_clr_name() {
        assert_eq!(
            source_clr_name("App", "geom/point.ts", "Point"),
            "App.Geom.Point"
        );
        assert_eq!(source_clr_name("App", "main.ts", "Main"), "App.Main");
    }

    #[test]
    fn test_manifest_member_modes() {
        let mut catalog = TypeCatalog::new();
        let mut aliases = AliasTable::new();
        let json = r#"{
            "assembly": "Lib",
            "namespaces": [{
                "name": "Lib",
                "types": [{
                    "name": "Parser",
                    "members": [{
                        "kind": "method",
                        "name": "tryParse",
                        "binding": {
                            "assembly": "Lib", "type": "Lib.Parser", "member": "TryParse",
                            "parameterModifiers": [{"index": 1, "modifier": "out"}]
                        },
                        "parameters": [
                            {"name": "text", "type": {"name": "string"}},
                            {"name": "value", "type": {"name": "int"}}
                        ],
                        "returns": {"name": "boolean"}
                    }]
                }]
            }]
        }"#;
        let manifest = BindingManifest::from_json(json).unwrap();
        catalog.add_manifest(&manifest, &mut aliases);
        let id = catalog.resolve_ts_name("Parser").unwrap();
        let member = catalog.find_member(id, "tryParse").unwrap();
        assert_eq!(member.modes, vec![ParamMode::Value, ParamMode::Out]);
        assert_eq!(member.concrete_return, Some(IrType::BOOLEAN));
    }

    #[test]
    fn test_global_binding_rename() {
        let mut catalog = TypeCatalog::new();
        catalog.add_global_binding(&GlobalBinding {
            name: "console".into(),
            csharp_name: Some("Console".into()),
            assembly: "System.Console".into(),
            type_name: "System.Console".into(),
        });
        assert_eq!(catalog.global_rename("console"), Some("Console"));
        assert!(catalog.value_binding("console").is_some());
    }
}
