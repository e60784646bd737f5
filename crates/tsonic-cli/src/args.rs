//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Ahead-of-time TypeScript-subset → C# compiler.
#[derive(Debug, Parser)]
#[command(name = "tsonic", version, about)]
pub struct CliArgs {
    /// Project root directory.
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,

    /// The host parser's program dump (surface tree + symbol table).
    #[arg(long, default_value = "tsonic.program.json")]
    pub program: PathBuf,

    /// Workspace configuration file.
    #[arg(long, default_value = "tsonic.workspace.json")]
    pub workspace: PathBuf,

    /// Binding manifest files.
    #[arg(long = "manifest")]
    pub manifests: Vec<PathBuf>,

    /// Output root; the source tree is mirrored below it.
    #[arg(long, default_value = "out")]
    pub out_dir: PathBuf,

    /// Root namespace for emitted code.
    #[arg(long, default_value = "App")]
    pub root_namespace: String,

    /// List the source files the program dump covers and exit.
    #[arg(long)]
    pub list_files: bool,
}
