//! The compilation driver.
//!
//! Host-side orchestration of the core pipeline: load the program dump
//! and manifests, bind, build the catalog, run the builder and middle
//! passes, lower and print each module, render diagnostics in final
//! (file, line, column, code) order, and write outputs mirroring the
//! source tree. Partial output is never written: any error diagnostic
//! fails the compilation before the first file lands on disk.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use globset::{Glob, GlobSetBuilder};
use rustc_hash::FxHashMap;
use tracing::{debug, info};
use walkdir::WalkDir;

use tsonic_binder::Binder;
use tsonic_common::diagnostics::DiagnosticSink;
use tsonic_common::position::LineMap;
use tsonic_emitter::{lower_module, print_unit};
use tsonic_irgen::build_modules;
use tsonic_surface::ast::Program;
use tsonic_types::{AliasTable, TypeCatalog, TypeSystem};

use crate::args::CliArgs;
use crate::config::{LoadedManifest, load_manifest, load_workspace};
use crate::render::render_all;

/// Run a full compilation.
pub fn run(args: &CliArgs) -> Result<ExitCode> {
    let workspace = load_workspace(&args.project_root.join(&args.workspace))?;
    debug!(dotnet = %workspace.dotnet_version, "workspace loaded");

    let program_path = args.project_root.join(&args.program);
    let text = std::fs::read_to_string(&program_path)
        .with_context(|| format!("reading program dump {}", program_path.display()))?;
    let program: Program = serde_json::from_str(&text)
        .with_context(|| format!("parsing program dump {}", program_path.display()))?;

    if args.list_files {
        for file in &program.files {
            println!("{}", file.path);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let outputs = compile(&program, args)?;
    match outputs {
        CompileOutcome::Failure(rendered) => {
            eprint!("{rendered}");
            Ok(ExitCode::FAILURE)
        }
        CompileOutcome::Success { files, rendered } => {
            if !rendered.is_empty() {
                eprint!("{rendered}");
            }
            for (relative, text) in files {
                let target = args.out_dir.join(&relative);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                std::fs::write(&target, text)
                    .with_context(|| format!("writing {}", target.display()))?;
                info!(file = %target.display(), "wrote output");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// The result of a compilation: either rendered failure diagnostics, or
/// output files plus rendered warnings.
pub enum CompileOutcome {
    Failure(String),
    Success {
        files: Vec<(PathBuf, String)>,
        rendered: String,
    },
}

/// Run the core pipeline over an already-loaded program.
pub fn compile(program: &Program, args: &CliArgs) -> Result<CompileOutcome> {
    let binder = Binder::bind(program);

    let mut catalog = TypeCatalog::with_builtins();
    let mut aliases = AliasTable::new();
    for manifest_path in &args.manifests {
        let path = args.project_root.join(manifest_path);
        match load_manifest(&path)? {
            LoadedManifest::Binding(manifest) => catalog.add_manifest(&manifest, &mut aliases),
            LoadedManifest::Module(manifest) => {
                catalog.add_module_manifest(&manifest, &mut aliases);
            }
            LoadedManifest::Globals(globals) => {
                for binding in &globals {
                    catalog.add_global_binding(binding);
                }
            }
        }
    }
    catalog.add_source_types(program, &binder, &args.root_namespace);

    let types = TypeSystem::new(program, &binder, &catalog, &aliases);
    let mut sink = DiagnosticSink::new();
    let modules = build_modules(program, &binder, &types, &args.root_namespace, &mut sink);
    let modules = tsonic_passes::run_all(modules, program, &types, &mut sink);

    let mut files = Vec::with_capacity(modules.len());
    for module in &modules {
        let unit = lower_module(module, &catalog, &mut sink, Some("<auto-generated/>"));
        let text = print_unit(&unit);
        files.push((output_path(&module.file_path), text));
    }

    let line_maps: FxHashMap<String, LineMap> = program
        .files
        .iter()
        .map(|f| (f.path.clone(), f.line_map.clone()))
        .collect();
    let rendered = render_all(&sink.sorted(), &line_maps);

    if sink.has_errors() {
        return Ok(CompileOutcome::Failure(rendered));
    }
    Ok(CompileOutcome::Success { files, rendered })
}

/// Mirror a source path under the output root: `geom/point.ts` →
/// `geom/point.cs`.
#[must_use]
pub fn output_path(source_path: &str) -> PathBuf {
    let replaced = source_path
        .strip_suffix(".ts")
        .map_or_else(|| source_path.to_string(), |stem| format!("{stem}.cs"));
    PathBuf::from(replaced)
}

/// Discover `.ts` sources under a root, sorted, honoring exclude globs.
/// Used by hosts that drive the external parser file-by-file.
pub fn discover_sources(root: &Path, excludes: &[String]) -> Result<Vec<PathBuf>> {
    let mut builder = GlobSetBuilder::new();
    for pattern in excludes {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob {pattern}"))?);
    }
    let exclude_set = builder.build()?;
    let mut sources = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "ts") {
            let relative = path.strip_prefix(root).unwrap_or(path);
            if !exclude_set.is_match(relative) {
                sources.push(relative.to_path_buf());
            }
        }
    }
    sources.sort();
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsonic_surface::TreeBuilder;
    use tsonic_surface::ast::NodeKind;

    fn default_args(root: &Path) -> CliArgs {
        CliArgs {
            project_root: root.to_path_buf(),
            program: PathBuf::from("tsonic.program.json"),
            workspace: PathBuf::from("tsonic.workspace.json"),
            manifests: Vec::new(),
            out_dir: root.join("out"),
            root_namespace: "App".to_string(),
            list_files: false,
        }
    }

    fn exported_const_program() -> Program {
        let mut b = TreeBuilder::new();
        b.file("geom/point.ts");
        let int_ty = b.type_ref("int", Vec::new());
        let one = b.number("1");
        let var = b.node(NodeKind::Var {
            name: "unit".into(),
            declared_type: Some(int_ty),
            init: Some(one),
            is_const: true,
            exported: true,
        });
        b.item(var);
        b.finish()
    }

    #[test]
    fn test_output_path_mirrors_tree() {
        assert_eq!(output_path("geom/point.ts"), PathBuf::from("geom/point.cs"));
        assert_eq!(output_path("main.ts"), PathBuf::from("main.cs"));
    }

    #[test]
    fn test_compile_produces_one_output_per_module() {
        let dir = tempfile::tempdir().unwrap();
        let program = exported_const_program();
        let outcome = compile(&program, &default_args(dir.path())).unwrap();
        let CompileOutcome::Success { files, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, PathBuf::from("geom/point.cs"));
        assert!(files[0].1.contains("namespace App.Geom"));
        assert!(
            files[0].1.contains("public static readonly int unit = 1;"),
            "{}",
            files[0].1
        );
    }

    #[test]
    fn test_errors_suppress_output() {
        // A file exporting a non-class under its own container name is
        // the fatal collision case.
        let mut b = TreeBuilder::new();
        b.file("point.ts");
        let int_ty = b.type_ref("int", Vec::new());
        let var = b.node(NodeKind::Var {
            name: "Point".into(),
            declared_type: Some(int_ty),
            init: None,
            is_const: false,
            exported: true,
        });
        b.item(var);
        let program = b.finish();
        let dir = tempfile::tempdir().unwrap();
        let outcome = compile(&program, &default_args(dir.path())).unwrap();
        assert!(matches!(outcome, CompileOutcome::Failure(_)));
    }

    #[test]
    fn test_run_writes_outputs_from_program_dump() {
        let dir = tempfile::tempdir().unwrap();
        let program = exported_const_program();
        let json = serde_json::to_string(&program).unwrap();
        std::fs::write(dir.path().join("tsonic.program.json"), json).unwrap();
        let args = default_args(dir.path());
        run(&args).unwrap();
        let written = std::fs::read_to_string(dir.path().join("out/geom/point.cs")).unwrap();
        assert!(written.contains("// <auto-generated/>"));
        assert!(written.contains("namespace App.Geom"));
    }

    #[test]
    fn test_discover_sources_sorted_with_excludes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("b.ts"), "").unwrap();
        std::fs::write(dir.path().join("a.ts"), "").unwrap();
        std::fs::write(dir.path().join("lib/c.ts"), "").unwrap();
        std::fs::write(dir.path().join("skip.d.ts"), "").unwrap();
        let sources = discover_sources(dir.path(), &["*.d.ts".to_string()]).unwrap();
        assert_eq!(
            sources,
            vec![
                PathBuf::from("a.ts"),
                PathBuf::from("b.ts"),
                PathBuf::from("lib/c.ts"),
            ]
        );
    }
}
