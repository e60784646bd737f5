//! IR types.
//!
//! `IrType` is widely shared by value; equality is structural. The
//! canonical serialization `stable_ir_type_key` is a pure, total function
//! used for interning and for shape signatures. No cycles exist:
//! self-referential aliases appear as a `Reference` by name and are
//! resolved lazily on lookup.

use serde::Serialize;

/// A canonical nominal type identity minted by the type catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const NONE: TypeId = TypeId(u32::MAX);

    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// The surface primitives. `Number` and `Int` are distinct and are never
/// unified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IrPrimitive {
    String,
    Number,
    Int,
    Char,
    Boolean,
    Null,
    Undefined,
}

impl IrPrimitive {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            IrPrimitive::String => "string",
            IrPrimitive::Number => "number",
            IrPrimitive::Int => "int",
            IrPrimitive::Char => "char",
            IrPrimitive::Boolean => "boolean",
            IrPrimitive::Null => "null",
            IrPrimitive::Undefined => "undefined",
        }
    }
}

/// Whether an array type was written in source or inferred from a literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ArrayOrigin {
    Explicit,
    Inferred,
}

/// One property of a structural object type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObjectProperty {
    pub name: String,
    pub ty: IrType,
    pub optional: bool,
    pub readonly: bool,
}

/// A literal type (`"a"`, `1`, `true`).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum IrLiteralType {
    String(String),
    Number(String),
    Boolean(bool),
}

/// The IR type family.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum IrType {
    Primitive(IrPrimitive),
    Reference {
        name: String,
        type_args: Vec<IrType>,
        type_id: Option<TypeId>,
    },
    TypeParameter(String),
    Array {
        element: Box<IrType>,
        origin: ArrayOrigin,
    },
    Tuple(Vec<IrType>),
    Function {
        params: Vec<IrType>,
        return_type: Box<IrType>,
    },
    Object(Vec<ObjectProperty>),
    Dictionary {
        key: Box<IrType>,
        value: Box<IrType>,
    },
    Union(Vec<IrType>),
    Intersection(Vec<IrType>),
    Literal(IrLiteralType),
    Any,
    Unknown,
    Void,
    Never,
}

impl IrType {
    pub const STRING: IrType = IrType::Primitive(IrPrimitive::String);
    pub const NUMBER: IrType = IrType::Primitive(IrPrimitive::Number);
    pub const INT: IrType = IrType::Primitive(IrPrimitive::Int);
    pub const CHAR: IrType = IrType::Primitive(IrPrimitive::Char);
    pub const BOOLEAN: IrType = IrType::Primitive(IrPrimitive::Boolean);
    pub const NULL: IrType = IrType::Primitive(IrPrimitive::Null);
    pub const UNDEFINED: IrType = IrType::Primitive(IrPrimitive::Undefined);

    /// A reference type without a catalog identity.
    #[must_use]
    pub fn reference(name: impl Into<String>, type_args: Vec<IrType>) -> IrType {
        IrType::Reference {
            name: name.into(),
            type_args,
            type_id: None,
        }
    }

    #[must_use]
    pub fn array(element: IrType, origin: ArrayOrigin) -> IrType {
        IrType::Array {
            element: Box::new(element),
            origin,
        }
    }

    /// Build a union, flattening nested unions and deduplicating members.
    /// A single surviving member collapses to itself.
    #[must_use]
    pub fn union(members: Vec<IrType>) -> IrType {
        let mut flat: Vec<IrType> = Vec::new();
        for member in members {
            match member {
                IrType::Union(inner) => {
                    for m in inner {
                        if !flat.contains(&m) {
                            flat.push(m);
                        }
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }
        match flat.len() {
            0 => IrType::Never,
            1 => flat.into_iter().next().unwrap_or(IrType::Never),
            _ => IrType::Union(flat),
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, IrType::Unknown)
    }

    #[must_use]
    pub fn is_int(&self) -> bool {
        matches!(self, IrType::Primitive(IrPrimitive::Int))
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, IrType::Primitive(IrPrimitive::Number))
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, IrType::Primitive(IrPrimitive::String))
    }

    /// Whether the type admits `null` or `undefined`.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            IrType::Primitive(IrPrimitive::Null | IrPrimitive::Undefined) => true,
            IrType::Union(members) => members.iter().any(IrType::is_nullable),
            IrType::Any | IrType::Unknown => true,
            _ => false,
        }
    }

    /// Whether the type is a non-nullable value type in the target
    /// (numeric, boolean, char).
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            IrType::Primitive(
                IrPrimitive::Number | IrPrimitive::Int | IrPrimitive::Boolean | IrPrimitive::Char
            )
        )
    }

    /// Strip `null`/`undefined` members from a union.
    #[must_use]
    pub fn non_null(&self) -> IrType {
        match self {
            IrType::Union(members) => {
                let kept: Vec<IrType> = members
                    .iter()
                    .filter(|m| {
                        !matches!(
                            m,
                            IrType::Primitive(IrPrimitive::Null | IrPrimitive::Undefined)
                        )
                    })
                    .cloned()
                    .collect();
                IrType::union(kept)
            }
            other => other.clone(),
        }
    }

    /// A short display name for diagnostics.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            IrType::Primitive(p) => p.name().to_string(),
            IrType::Reference { name, type_args, .. } => {
                if type_args.is_empty() {
                    name.clone()
                } else {
                    let args: Vec<String> =
                        type_args.iter().map(IrType::display_name).collect();
                    format!("{name}<{}>", args.join(", "))
                }
            }
            IrType::TypeParameter(name) => name.clone(),
            IrType::Array { element, .. } => format!("{}[]", element.display_name()),
            IrType::Tuple(elements) => {
                let parts: Vec<String> = elements.iter().map(IrType::display_name).collect();
                format!("[{}]", parts.join(", "))
            }
            IrType::Function { params, return_type } => {
                let parts: Vec<String> = params.iter().map(IrType::display_name).collect();
                format!("({}) => {}", parts.join(", "), return_type.display_name())
            }
            IrType::Object(props) => {
                let parts: Vec<String> = props
                    .iter()
                    .map(|p| format!("{}: {}", p.name, p.ty.display_name()))
                    .collect();
                format!("{{{}}}", parts.join("; "))
            }
            IrType::Dictionary { key, value } => {
                format!("{{[k: {}]: {}}}", key.display_name(), value.display_name())
            }
            IrType::Union(members) => {
                let parts: Vec<String> = members.iter().map(IrType::display_name).collect();
                parts.join(" | ")
            }
            IrType::Intersection(members) => {
                let parts: Vec<String> = members.iter().map(IrType::display_name).collect();
                parts.join(" & ")
            }
            IrType::Literal(IrLiteralType::String(s)) => format!("\"{s}\""),
            IrType::Literal(IrLiteralType::Number(n)) => n.clone(),
            IrType::Literal(IrLiteralType::Boolean(b)) => b.to_string(),
            IrType::Any => "any".to_string(),
            IrType::Unknown => "unknown".to_string(),
            IrType::Void => "void".to_string(),
            IrType::Never => "never".to_string(),
        }
    }
}

/// A pure, total, stable serialization of an `IrType`.
///
/// Two structurally identical types always produce the same key across
/// runs; the key is used for interning and for object-shape signatures.
/// Union and intersection members are sorted by member key so commuted
/// forms agree.
#[must_use]
pub fn stable_ir_type_key(ty: &IrType) -> String {
    match ty {
        IrType::Primitive(p) => format!("prim:{}", p.name()),
        IrType::Reference { name, type_args, .. } => {
            let args: Vec<String> = type_args.iter().map(stable_ir_type_key).collect();
            format!("ref:{name}<{}>", args.join(","))
        }
        IrType::TypeParameter(name) => format!("tp:{name}"),
        IrType::Array { element, origin } => {
            let origin = match origin {
                ArrayOrigin::Explicit => "e",
                ArrayOrigin::Inferred => "i",
            };
            format!("arr[{origin}]:{}", stable_ir_type_key(element))
        }
        IrType::Tuple(elements) => {
            let parts: Vec<String> = elements.iter().map(stable_ir_type_key).collect();
            format!("tup:({})", parts.join(","))
        }
        IrType::Function { params, return_type } => {
            let parts: Vec<String> = params.iter().map(stable_ir_type_key).collect();
            format!("fn:({})->{}", parts.join(","), stable_ir_type_key(return_type))
        }
        IrType::Object(props) => {
            let mut parts: Vec<String> = props
                .iter()
                .map(|p| {
                    format!(
                        "{}{}{}:{}",
                        p.name,
                        if p.optional { "?" } else { "" },
                        if p.readonly { "!" } else { "" },
                        stable_ir_type_key(&p.ty)
                    )
                })
                .collect();
            parts.sort();
            format!("obj:{{{}}}", parts.join(";"))
        }
        IrType::Dictionary { key, value } => {
            format!(
                "dict:[{}=>{}]",
                stable_ir_type_key(key),
                stable_ir_type_key(value)
            )
        }
        IrType::Union(members) => {
            let mut parts: Vec<String> = members.iter().map(stable_ir_type_key).collect();
            parts.sort();
            format!("union:({})", parts.join("|"))
        }
        IrType::Intersection(members) => {
            let mut parts: Vec<String> = members.iter().map(stable_ir_type_key).collect();
            parts.sort();
            format!("isect:({})", parts.join("&"))
        }
        IrType::Literal(IrLiteralType::String(s)) => format!("lit:s:{s}"),
        IrType::Literal(IrLiteralType::Number(n)) => format!("lit:n:{n}"),
        IrType::Literal(IrLiteralType::Boolean(b)) => format!("lit:b:{b}"),
        IrType::Any => "any".to_string(),
        IrType::Unknown => "unknown".to_string(),
        IrType::Void => "void".to_string(),
        IrType::Never => "never".to_string(),
    }
}

/// Structural interner keyed by [`stable_ir_type_key`].
///
/// Interned types with equal keys share one stored value, making equality
/// an identity check for consumers that keep the returned index.
#[derive(Debug, Default)]
pub struct TypeInterner {
    by_key: rustc_hash::FxHashMap<String, u32>,
    types: Vec<IrType>,
}

impl TypeInterner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a type, returning its slot index.
    pub fn intern(&mut self, ty: &IrType) -> u32 {
        let key = stable_ir_type_key(ty);
        if let Some(&slot) = self.by_key.get(&key) {
            return slot;
        }
        let slot = self.types.len() as u32;
        self.types.push(ty.clone());
        self.by_key.insert(key, slot);
        slot
    }

    #[must_use]
    pub fn get(&self, slot: u32) -> Option<&IrType> {
        self.types.get(slot as usize)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_key_is_stable() {
        let ty = IrType::Reference {
            name: "Map".into(),
            type_args: vec![IrType::STRING, IrType::INT],
            type_id: Some(TypeId(7)),
        };
        let first = stable_ir_type_key(&ty);
        let second = stable_ir_type_key(&ty);
        assert_eq!(first, second);
        assert_eq!(first, "ref:Map<prim:string,prim:int>");
    }

    #[test]
    fn test_union_key_sorted() {
        let a = IrType::union(vec![IrType::STRING, IrType::NULL]);
        let b = IrType::union(vec![IrType::NULL, IrType::STRING]);
        assert_eq!(stable_ir_type_key(&a), stable_ir_type_key(&b));
    }

    #[test]
    fn test_union_flattens_and_collapses() {
        let nested = IrType::union(vec![
            IrType::STRING,
            IrType::Union(vec![IrType::STRING, IrType::NULL]),
        ]);
        assert_eq!(nested, IrType::Union(vec![IrType::STRING, IrType::NULL]));
        assert_eq!(IrType::union(vec![IrType::INT]), IrType::INT);
    }

    #[test]
    fn test_non_null() {
        let ty = IrType::union(vec![IrType::reference("Person", Vec::new()), IrType::NULL]);
        assert_eq!(ty.non_null(), IrType::reference("Person", Vec::new()));
    }

    #[test]
    fn test_number_and_int_distinct() {
        assert_ne!(IrType::NUMBER, IrType::INT);
        assert_ne!(
            stable_ir_type_key(&IrType::NUMBER),
            stable_ir_type_key(&IrType::INT)
        );
    }

    #[test]
    fn test_object_key_sorts_properties() {
        let a = IrType::Object(vec![
            ObjectProperty {
                name: "y".into(),
                ty: IrType::NUMBER,
                optional: false,
                readonly: false,
            },
            ObjectProperty {
                name: "x".into(),
                ty: IrType::NUMBER,
                optional: false,
                readonly: false,
            },
        ]);
        let b = IrType::Object(vec![
            ObjectProperty {
                name: "x".into(),
                ty: IrType::NUMBER,
                optional: false,
                readonly: false,
            },
            ObjectProperty {
                name: "y".into(),
                ty: IrType::NUMBER,
                optional: false,
                readonly: false,
            },
        ]);
        assert_eq!(stable_ir_type_key(&a), stable_ir_type_key(&b));
    }

    #[test]
    fn test_interner_dedups_by_key() {
        let mut interner = TypeInterner::new();
        let first = interner.intern(&IrType::array(IrType::STRING, ArrayOrigin::Explicit));
        let second = interner.intern(&IrType::array(IrType::STRING, ArrayOrigin::Explicit));
        assert_eq!(first, second);
        assert_eq!(interner.len(), 1);
    }
}
