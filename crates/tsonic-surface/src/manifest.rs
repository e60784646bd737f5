//! Binding-manifest schemas.
//!
//! Packages describe their CLR surface with JSON manifests: namespaces,
//! types, members, parameter modifiers, and optional surface aliases.
//! Two further forms exist: module-shaped bindings (a single type per
//! module import) and global identifier bindings with optional
//! `csharpName` renaming.
//!
//! Member `type`/`parameters`/`returns` entries use a compact type
//! expression (`{"name": "int"}`, `{"name": "List_1", "args": […]}`);
//! members without one resolve to `unknown` rather than a guessed type.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A package binding manifest.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingManifest {
    pub assembly: String,
    #[serde(default)]
    pub namespaces: Vec<ManifestNamespace>,
    /// Flattened value exports: name → CLR declaration site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<IndexMap<String, ManifestExport>>,
}

impl BindingManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestNamespace {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub types: Vec<ManifestType>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestTypeKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

impl Default for ManifestTypeKind {
    fn default() -> Self {
        ManifestTypeKind::Class
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestType {
    /// CLR-side simple name, arity-suffixed for generics (`List_1`).
    pub name: String,
    /// Surface alias, e.g. `IList` for `IList_1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub kind: ManifestTypeKind,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// Base type as a type expression, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<ManifestTypeExpr>,
    #[serde(default)]
    pub members: Vec<ManifestMember>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestMemberKind {
    Method,
    Property,
    Field,
    Event,
}

/// Compact type expression used for member types in manifests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestTypeExpr {
    pub name: String,
    #[serde(default)]
    pub args: Vec<ManifestTypeExpr>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_expr: ManifestTypeExpr,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestParameterModifier {
    Ref,
    Out,
    In,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterModifierSpec {
    pub index: u32,
    pub modifier: ManifestParameterModifier,
}

/// The CLR binding of a manifest member.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBinding {
    pub assembly: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub member: String,
    #[serde(default)]
    pub parameter_modifiers: Vec<ParameterModifierSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMember {
    pub kind: ManifestMemberKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub binding: MemberBinding,
    /// Property/field type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_expr: Option<ManifestTypeExpr>,
    /// Method parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ManifestParameter>,
    /// Method return type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ManifestTypeExpr>,
    #[serde(default)]
    pub is_static: bool,
}

/// A flattened value export entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestExport {
    pub declaring_clr_type: String,
    pub declaring_assembly_name: String,
    pub clr_name: String,
}

/// Module-shaped binding: a single type per module import.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleManifest {
    pub module: String,
    pub assembly: String,
    #[serde(rename = "type")]
    pub type_def: ManifestType,
}

/// Global identifier binding with optional renaming.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csharp_name: Option<String>,
    pub assembly: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_round_trip() {
        let json = r#"{
            "assembly": "System.Runtime",
            "namespaces": [
                {
                    "name": "System.Collections.Generic",
                    "alias": "collections",
                    "types": [
                        {
                            "name": "List_1",
                            "alias": "List",
                            "kind": "class",
                            "typeParameters": ["T"],
                            "members": [
                                {
                                    "kind": "property",
                                    "name": "length",
                                    "alias": "Count",
                                    "binding": {
                                        "assembly": "System.Runtime",
                                        "type": "System.Collections.Generic.List`1",
                                        "member": "Count"
                                    },
                                    "type": {"name": "int"}
                                },
                                {
                                    "kind": "method",
                                    "name": "push",
                                    "binding": {
                                        "assembly": "System.Runtime",
                                        "type": "System.Collections.Generic.List`1",
                                        "member": "Add",
                                        "parameterModifiers": [{"index": 0, "modifier": "in"}]
                                    },
                                    "parameters": [{"name": "item", "type": {"name": "T"}}],
                                    "returns": {"name": "void"}
                                }
                            ]
                        }
                    ]
                }
            ]
        }"#;
        let manifest = BindingManifest::from_json(json).unwrap();
        assert_eq!(manifest.assembly, "System.Runtime");
        let ty = &manifest.namespaces[0].types[0];
        assert_eq!(ty.name, "List_1");
        assert_eq!(ty.type_parameters, vec!["T"]);
        assert_eq!(ty.members.len(), 2);
        let push = &ty.members[1];
        assert_eq!(push.binding.parameter_modifiers[0].index, 0);
        assert_eq!(
            push.binding.parameter_modifiers[0].modifier,
            ManifestParameterModifier::In
        );
    }

    #[test]
    fn test_exports_map() {
        let json = r#"{
            "assembly": "MyLib",
            "exports": {
                "writeLine": {
                    "declaringClrType": "MyLib.Console",
                    "declaringAssemblyName": "MyLib",
                    "clrName": "WriteLine"
                }
            }
        }"#;
        let manifest = BindingManifest::from_json(json).unwrap();
        let export = &manifest.exports.unwrap()["writeLine"];
        assert_eq!(export.clr_name, "WriteLine");
    }

    #[test]
    fn test_global_binding_rename() {
        let json = r#"{"name": "console", "csharpName": "Console", "assembly": "System.Console", "type": "System.Console"}"#;
        let binding: GlobalBinding = serde_json::from_str(json).unwrap();
        assert_eq!(binding.csharp_name.as_deref(), Some("Console"));
    }
}
