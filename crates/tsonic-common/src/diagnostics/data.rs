//! Static diagnostic message data.
//!
//! The core uses a closed set of codes; each pass documents the codes it
//! can produce. Codes render in the `TSN####` family.

use super::DiagnosticMessage;
use super::Severity;

/// Stable numeric codes for the closed diagnostic set.
pub mod codes {
    /// A file's name collides with the name of one of its exports.
    pub const FILE_EXPORT_NAME_COLLISION: u32 = 2003;
    /// A value declared in a binding manifest has no CLR binding entry.
    pub const MISSING_CLR_VALUE_BINDING: u32 = 4004;
    /// An index expression whose Int32-ness could not be proven.
    pub const UNPROVEN_INT_INDEX: u32 = 5107;
    /// An implicit narrowing from `number` to `int`.
    pub const IMPLICIT_NUMERIC_NARROWING: u32 = 5110;
    /// A parameter without a type annotation.
    pub const MISSING_PARAMETER_ANNOTATION: u32 = 5201;
    /// A spread whose source expression has no type annotation.
    pub const UNTYPED_SPREAD_SOURCE: u32 = 5215;
    /// Internal compiler error.
    pub const INTERNAL_ERROR: u32 = 6001;
    /// A class implements a user-defined interface that is nominalized away.
    pub const IMPLEMENTS_NOMINALIZED_INTERFACE: u32 = 7301;
    /// An object literal that is not eligible for anonymous type synthesis.
    pub const SYNTHESIS_INELIGIBLE_LITERAL: u32 = 7403;
    /// A call-site parameter-passing marker conflicts with the signature.
    pub const PARAMETER_MODIFIER_CONFLICT: u32 = 7444;
    /// A name or signature could not be resolved.
    pub const UNRESOLVED_BINDING: u32 = 2304;
    /// A `super(...)` call in a non-first statement position.
    pub const SUPER_NOT_FIRST: u32 = 2377;
    /// A generator `throw()` cannot resume at the suspended yield point.
    pub const GENERATOR_THROW_LIMITATION: u32 = 7460;
}

/// All diagnostic messages the core can emit.
pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: codes::FILE_EXPORT_NAME_COLLISION,
        severity: Severity::Error,
        message: "File name '{0}' collides with exported name '{1}'.",
    },
    DiagnosticMessage {
        code: codes::UNRESOLVED_BINDING,
        severity: Severity::Error,
        message: "Cannot resolve name '{0}'.",
    },
    DiagnosticMessage {
        code: codes::SUPER_NOT_FIRST,
        severity: Severity::Error,
        message: "A 'super' call must be the first statement in the constructor.",
    },
    DiagnosticMessage {
        code: codes::MISSING_CLR_VALUE_BINDING,
        severity: Severity::Error,
        message: "No CLR binding found for value '{0}' in assembly '{1}'.",
    },
    DiagnosticMessage {
        code: codes::UNPROVEN_INT_INDEX,
        severity: Severity::Error,
        message: "Index expression must have a provable Int32 value; '{0}' could not be proven.",
    },
    DiagnosticMessage {
        code: codes::IMPLICIT_NUMERIC_NARROWING,
        severity: Severity::Error,
        message: "Implicit narrowing from 'number' to 'int' is not allowed; use 'as int'.",
    },
    DiagnosticMessage {
        code: codes::MISSING_PARAMETER_ANNOTATION,
        severity: Severity::Error,
        message: "Parameter '{0}' has no type annotation.",
    },
    DiagnosticMessage {
        code: codes::UNTYPED_SPREAD_SOURCE,
        severity: Severity::Error,
        message: "Spread source has no type annotation.",
    },
    DiagnosticMessage {
        code: codes::INTERNAL_ERROR,
        severity: Severity::Error,
        message: "Internal compiler error: {0}",
    },
    DiagnosticMessage {
        code: codes::IMPLEMENTS_NOMINALIZED_INTERFACE,
        severity: Severity::Error,
        message: "Class '{0}' implements interface '{1}', which is nominalized to a class and cannot be implemented.",
    },
    DiagnosticMessage {
        code: codes::SYNTHESIS_INELIGIBLE_LITERAL,
        severity: Severity::Error,
        message: "Object literal is not eligible for anonymous type synthesis: {0}.",
    },
    DiagnosticMessage {
        code: codes::PARAMETER_MODIFIER_CONFLICT,
        severity: Severity::Error,
        message: "Argument marker '{0}' conflicts with declared parameter mode '{1}'.",
    },
    DiagnosticMessage {
        code: codes::GENERATOR_THROW_LIMITATION,
        severity: Severity::Warning,
        message: "Generator 'throw' cannot resume at the suspended yield point; it terminates the generator and rethrows.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for message in DIAGNOSTIC_MESSAGES {
            assert!(seen.insert(message.code), "duplicate code {}", message.code);
        }
    }

    #[test]
    fn test_closed_set_present() {
        for code in [2003, 4004, 5107, 5110, 5201, 5215, 6001, 7301, 7403, 7444] {
            assert!(
                DIAGNOSTIC_MESSAGES.iter().any(|m| m.code == code),
                "missing message for TSN{code}"
            );
        }
    }
}
