//! Common types and utilities for the tsonic compiler.
//!
//! This crate provides foundational types used across all tsonic crates:
//! - Source spans (`Span`, `Spanned`)
//! - Position/line-map types for byte-offset → line/column conversion
//! - Diagnostics (`Diagnostic`, `DiagnosticSink`, the `TSN` code tables)
//! - Numeric literal analysis (`NumericIntent`, lexeme parsing)
//! - Compiler limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::{Span, Spanned};

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Location, Position, Range};

// Diagnostics - codes, messages, sink
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity};

// Numeric literal analysis
pub mod numeric;
pub use numeric::{NumericIntent, classify_numeric_lexeme, parse_numeric_literal_value};

// Centralized limits and thresholds
pub mod limits;
