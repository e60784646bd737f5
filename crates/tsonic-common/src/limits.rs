//! Centralized limits and thresholds.

/// Maximum depth when walking nominal inheritance chains.
/// Catalogs are acyclic; this bounds walks over malformed manifests.
pub const MAX_INHERITANCE_DEPTH: usize = 100;

/// Maximum recursion depth when converting type syntax to IR types.
pub const MAX_TYPE_SYNTAX_DEPTH: usize = 50;

/// Maximum number of unification iterations in call resolution.
pub const MAX_UNIFICATION_STEPS: usize = 10_000;
