//! Opaque identifiers minted by the binder.
//!
//! All cross-subsystem references go through these integer-like ids; the
//! records behind them live in append-only registries and are never
//! mutated once IR building begins.

use serde::Serialize;

macro_rules! binder_id {
    ($(#[$doc:meta])* $name:ident, $display:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub u32);

        impl $name {
            pub const NONE: $name = $name(u32::MAX);

            #[must_use]
            pub const fn is_none(&self) -> bool {
                self.0 == u32::MAX
            }

            #[must_use]
            pub const fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($display, "#{}"), self.0)
            }
        }
    };
}

binder_id!(
    /// A declaration: variable, function, class, interface, type alias,
    /// enum, parameter, property, or method.
    DeclId,
    "decl"
);
binder_id!(
    /// A single call or constructor signature.
    SignatureId,
    "sig"
);
binder_id!(
    /// A member of a nominal type.
    MemberId,
    "member"
);
binder_id!(
    /// A captured type-syntax node, retrievable only through the handle
    /// registry.
    TypeSyntaxId,
    "tysyn"
);
