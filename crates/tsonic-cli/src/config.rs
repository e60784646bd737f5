//! Workspace configuration and manifest loading.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tsonic_surface::manifest::{BindingManifest, GlobalBinding, ModuleManifest};
use tsonic_surface::workspace::{TypesOption, WorkspaceConfig};

/// The currently supported workspace schema version.
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

/// Load and validate `tsonic.workspace.json`. A missing file yields the
/// default configuration.
pub fn load_workspace(path: &Path) -> Result<WorkspaceConfig> {
    if !path.exists() {
        return Ok(WorkspaceConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading workspace config {}", path.display()))?;
    let config = WorkspaceConfig::from_json(&text)
        .with_context(|| format!("parsing workspace config {}", path.display()))?;
    if config.schema_version != 0 && config.schema_version != SUPPORTED_SCHEMA_VERSION {
        bail!(
            "unsupported workspace schema version {} in {}",
            config.schema_version,
            path.display()
        );
    }
    Ok(config)
}

/// Package references that want bindings: `types: false` opts out, a
/// string names the external bindings package to use instead.
#[must_use]
pub fn binding_sources(config: &WorkspaceConfig) -> Vec<(String, Option<String>)> {
    config
        .package_references
        .iter()
        .filter_map(|package| match &package.types {
            Some(TypesOption::Disabled(false)) => None,
            Some(TypesOption::Disabled(true)) | None => Some((package.id.clone(), None)),
            Some(TypesOption::Package(name)) => {
                Some((package.id.clone(), Some(name.clone())))
            }
        })
        .collect()
}

/// One parsed manifest file, in any of the three accepted forms.
pub enum LoadedManifest {
    Binding(BindingManifest),
    Module(ModuleManifest),
    Globals(Vec<GlobalBinding>),
}

/// Parse a manifest file: a namespace-shaped binding manifest, a
/// module-shaped manifest, or a list of global identifier bindings.
pub fn load_manifest(path: &Path) -> Result<LoadedManifest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    if let Ok(manifest) = serde_json::from_str::<ModuleManifest>(&text) {
        return Ok(LoadedManifest::Module(manifest));
    }
    if let Ok(globals) = serde_json::from_str::<Vec<GlobalBinding>>(&text) {
        return Ok(LoadedManifest::Globals(globals));
    }
    let manifest = BindingManifest::from_json(&text)
        .with_context(|| format!("parsing manifest {}", path.display()))?;
    Ok(LoadedManifest::Binding(manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_workspace_is_default() {
        let config = load_workspace(Path::new("/nonexistent/tsonic.workspace.json")).unwrap();
        assert_eq!(config.framework_references.len(), 0);
    }

    #[test]
    fn test_unsupported_schema_version_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"schemaVersion": 99, "dotnetVersion": "net8.0"}}"#).unwrap();
        assert!(load_workspace(file.path()).is_err());
    }

    #[test]
    fn test_binding_sources_respect_types_option() {
        let config = WorkspaceConfig::from_json(
            r#"{
                "schemaVersion": 1,
                "dotnetVersion": "net8.0",
                "packageReferences": [
                    {"id": "A", "version": "1.0.0"},
                    {"id": "B", "version": "1.0.0", "types": false},
                    {"id": "C", "version": "1.0.0", "types": "c-bindings"}
                ]
            }"#,
        )
        .unwrap();
        let sources = binding_sources(&config);
        assert_eq!(
            sources,
            vec![
                ("A".to_string(), None),
                ("C".to_string(), Some("c-bindings".to_string())),
            ]
        );
    }
}
