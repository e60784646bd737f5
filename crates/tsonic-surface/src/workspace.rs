//! `tsonic.workspace.json` schema.
//!
//! Consumed only by the CLI driver; the core pipeline never reads it.

use serde::{Deserialize, Serialize};

/// A library reference: either a bare path, or a path with an explicit
/// bindings package.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LibraryRef {
    Path(String),
    Detailed {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        types: Option<String>,
    },
}

/// The `types` field of a package reference: `false` disables binding
/// generation, a string names an external bindings package.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypesOption {
    Disabled(bool),
    Package(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageReference {
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<TypesOption>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    pub schema_version: u32,
    pub dotnet_version: String,
    #[serde(default)]
    pub framework_references: Vec<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryRef>,
    #[serde(default)]
    pub package_references: Vec<PackageReference>,
}

impl WorkspaceConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
