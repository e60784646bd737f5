//! Type catalog, alias table and the type system for the tsonic compiler.
//!
//! The catalog enumerates the closed universe of nominal types drawn from
//! user source and external binding manifests. The alias table performs
//! arity-aware canonicalization of facade names. The type system is the
//! sole type oracle: every type query in the compiler goes through it, and
//! it never falls back to guessing - unanswerable queries poison to
//! `unknown` and record a diagnostic.

pub mod alias;
pub use alias::AliasTable;

pub mod catalog;
pub use catalog::{
    BaseRef, CatalogMember, CatalogMemberKind, TypeCatalog, TypeDef, TypeDefKind, TypeOrigin,
    TypeParameterInfo,
};

pub mod typesystem;
pub use typesystem::{CallQuery, ResolvedCall, TypePredicate, TypeSystem};
