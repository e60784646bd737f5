//! Binding layer for the tsonic compiler.
//!
//! Assigns stable opaque identifiers to every declaration, call signature,
//! member, and captured type-syntax node in the program, and exposes the
//! resolution API the rest of the compiler uses. This is the only crate
//! allowed to read the host symbol table; host types never escape its
//! outputs.

pub mod ids;
pub use ids::{DeclId, MemberId, SignatureId, TypeSyntaxId};

pub mod registry;
pub use registry::{
    DeclInfo, DeclKind, MemberInfo, MemberKind, ParamInfo, ParamMode, SignatureInfo,
    TypeParamInfo, TypeSyntaxInfo,
};

pub mod bind;
pub use bind::Binder;
