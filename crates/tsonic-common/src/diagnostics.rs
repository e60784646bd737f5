//! Diagnostics - codes, messages, and the collection sink.
//!
//! Every user-visible failure in the compiler is reported through a
//! [`Diagnostic`] carrying a stable numeric code rendered in the `TSN####`
//! family. Converters and passes write to a [`DiagnosticSink`]; nothing in
//! the core throws on user error.

pub mod data;

use serde::Serialize;

use crate::position::LineMap;
use crate::span::Span;

/// Severity of a diagnostic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Warning,
    Error,
    Note,
}

/// A diagnostic message template with a stable code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub severity: Severity,
    pub message: &'static str,
}

pub mod codes {
    pub use super::data::codes::*;
}

/// A single reported diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: u32,
    pub file: String,
    pub span: Span,
    pub message: String,
    /// Optional remediation hint appended when rendering.
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, span: Span, message: impl Into<String>, code: u32) -> Self {
        Self {
            severity: Severity::Error,
            code,
            file: file.into(),
            span,
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            file: file.into(),
            span,
            message: message.into(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// The rendered code, e.g. `TSN5107`.
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("TSN{}", self.code)
    }
}

/// Look up the static message template for a code.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    data::DIAGNOSTIC_MESSAGES
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

/// Substitute `{0}`, `{1}`, … placeholders in a message template.
#[must_use]
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Collection point for diagnostics produced during a compilation.
///
/// Diagnostics are recorded in encounter order; [`DiagnosticSink::sorted`]
/// yields the final rendering order of (file, start offset, code). Byte
/// offsets order identically to (line, column) within a file.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Report an error using the static message table.
    pub fn error(&mut self, file: impl Into<String>, span: Span, code: u32, args: &[&str]) {
        let template = get_message_template(code).unwrap_or("Unknown diagnostic.");
        self.push(Diagnostic::error(file, span, format_message(template, args), code));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Diagnostics in encounter order.
    #[must_use]
    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics in final rendering order: (file, start, code).
    #[must_use]
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut sorted = self.diagnostics.clone();
        sorted.sort_by(|a, b| {
            (a.file.as_str(), a.span.start, a.code).cmp(&(b.file.as_str(), b.span.start, b.code))
        });
        sorted
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

/// Render one diagnostic as `file(line,col): severity TSN####: message`.
///
/// Lines and columns are 1-indexed in rendered output.
#[must_use]
pub fn render_diagnostic(diagnostic: &Diagnostic, line_map: Option<&LineMap>) -> String {
    let severity = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Note => "note",
    };
    let location = match line_map {
        Some(map) if !diagnostic.span.is_dummy() => {
            let pos = map.position(diagnostic.span.start);
            format!("{}({},{})", diagnostic.file, pos.line + 1, pos.column + 1)
        }
        _ => diagnostic.file.clone(),
    };
    let mut rendered = format!(
        "{location}: {severity} {}: {}",
        diagnostic.code_string(),
        diagnostic.message
    );
    if let Some(hint) = &diagnostic.hint {
        rendered.push_str(&format!("\n  hint: {hint}"));
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        assert_eq!(
            format_message("Cannot resolve '{0}' in '{1}'.", &["foo", "bar.ts"]),
            "Cannot resolve 'foo' in 'bar.ts'."
        );
    }

    #[test]
    fn test_code_string() {
        let d = Diagnostic::error("a.ts", Span::new(0, 1), "boom", codes::UNPROVEN_INT_INDEX);
        assert_eq!(d.code_string(), "TSN5107");
    }

    #[test]
    fn test_sink_sorted_order() {
        let mut sink = DiagnosticSink::new();
        sink.push(Diagnostic::error("b.ts", Span::new(4, 5), "late", 5201));
        sink.push(Diagnostic::error("a.ts", Span::new(9, 10), "second", 5110));
        sink.push(Diagnostic::error("a.ts", Span::new(2, 3), "first", 5107));
        let sorted = sink.sorted();
        assert_eq!(sorted[0].message, "first");
        assert_eq!(sorted[1].message, "second");
        assert_eq!(sorted[2].message, "late");
    }

    #[test]
    fn test_sink_error_uses_template() {
        let mut sink = DiagnosticSink::new();
        sink.error("a.ts", Span::new(0, 3), codes::MISSING_PARAMETER_ANNOTATION, &["x"]);
        assert!(sink.all()[0].message.contains("'x'"));
        assert!(sink.has_errors());
    }
}
