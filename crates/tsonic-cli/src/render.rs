//! Diagnostic rendering.

use colored::Colorize;
use rustc_hash::FxHashMap;
use tsonic_common::diagnostics::{Diagnostic, Severity};
use tsonic_common::position::LineMap;

/// Render diagnostics (already in final sorted order) for the terminal.
#[must_use]
pub fn render_all(diagnostics: &[Diagnostic], line_maps: &FxHashMap<String, LineMap>) -> String {
    let mut rendered = String::new();
    for diagnostic in diagnostics {
        let severity = match diagnostic.severity {
            Severity::Error => "error".red().bold().to_string(),
            Severity::Warning => "warning".yellow().bold().to_string(),
            Severity::Note => "note".cyan().to_string(),
        };
        let location = match line_maps.get(&diagnostic.file) {
            Some(map) if !diagnostic.span.is_dummy() => {
                let pos = map.position(diagnostic.span.start);
                format!("{}({},{})", diagnostic.file, pos.line + 1, pos.column + 1)
            }
            _ => diagnostic.file.clone(),
        };
        rendered.push_str(&format!(
            "{location}: {severity} {}: {}\n",
            diagnostic.code_string().bold(),
            diagnostic.message
        ));
        if let Some(hint) = &diagnostic.hint {
            rendered.push_str(&format!("  hint: {hint}\n"));
        }
    }
    rendered
}
