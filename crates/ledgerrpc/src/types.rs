//! # Type Descriptors
//!
//! The closed, recursive set of types a contract method may accept or return.
//! User-defined structs, unions and enums are shared behind `Arc` once the
//! schema resolves them, so cloning a descriptor is cheap.

use std::fmt;
use std::sync::Arc;

/// Bit width of an integer descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W32,
    W64,
    W128,
    W256,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            Self::W32 => 32,
            Self::W64 => 64,
            Self::W128 => 128,
            Self::W256 => 256,
        }
    }
}

/// Describes the shape of one value on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    Void,
    Bool,
    Int { signed: bool, width: IntWidth },
    /// UTF-8 text; covers both strings and symbols.
    String,
    Bytes,
    /// Byte array of exactly `n` bytes.
    BytesN(u32),
    Address,
    Option(Box<TypeDesc>),
    Vec(Box<TypeDesc>),
    Map(Box<TypeDesc>, Box<TypeDesc>),
    Tuple(Vec<TypeDesc>),
    Record(Arc<RecordDesc>),
    Union(Arc<UnionDesc>),
    Enum(Arc<EnumDesc>),
    /// Reference to a user-defined type. Only present before schema resolution.
    Named(String),
}

impl TypeDesc {
    pub const U32: TypeDesc = TypeDesc::Int { signed: false, width: IntWidth::W32 };
    pub const I32: TypeDesc = TypeDesc::Int { signed: true, width: IntWidth::W32 };
    pub const U64: TypeDesc = TypeDesc::Int { signed: false, width: IntWidth::W64 };
    pub const I64: TypeDesc = TypeDesc::Int { signed: true, width: IntWidth::W64 };
    pub const U128: TypeDesc = TypeDesc::Int { signed: false, width: IntWidth::W128 };
    pub const I128: TypeDesc = TypeDesc::Int { signed: true, width: IntWidth::W128 };
    pub const U256: TypeDesc = TypeDesc::Int { signed: false, width: IntWidth::W256 };
    pub const I256: TypeDesc = TypeDesc::Int { signed: true, width: IntWidth::W256 };

    pub fn option(inner: TypeDesc) -> Self { Self::Option(Box::new(inner)) }
    pub fn vec(inner: TypeDesc) -> Self { Self::Vec(Box::new(inner)) }
    pub fn map(key: TypeDesc, value: TypeDesc) -> Self { Self::Map(Box::new(key), Box::new(value)) }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Bool => write!(f, "bool"),
            Self::Int { signed, width } => {
                write!(f, "{}{}", if *signed { "i" } else { "u" }, width.bits())
            }
            Self::String => write!(f, "string"),
            Self::Bytes => write!(f, "bytes"),
            Self::BytesN(n) => write!(f, "bytes<{}>", n),
            Self::Address => write!(f, "address"),
            Self::Option(inner) => write!(f, "option<{}>", inner),
            Self::Vec(inner) => write!(f, "vec<{}>", inner),
            Self::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            Self::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Self::Record(rec) => write!(f, "{}", rec.name),
            Self::Union(u) => write!(f, "{}", u.name),
            Self::Enum(e) => write!(f, "{}", e.name),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A user-defined struct with named fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDesc {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeDesc,
}

/// A user-defined tagged union. Each case carries zero or more positional values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionDesc {
    pub name: String,
    pub cases: Vec<UnionCase>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionCase {
    pub name: String,
    pub payload: Vec<TypeDesc>,
}

/// A user-defined integer enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDesc {
    pub name: String,
    pub cases: Vec<EnumCase>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCase {
    pub name: String,
    pub value: u32,
}

/// One declared method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: TypeDesc,
}

/// Name, ordered parameters and return type of one contract method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub doc: String,
    pub params: Vec<Param>,
    /// `TypeDesc::Void` when the method declares no output.
    pub returns: TypeDesc,
}

impl MethodSignature {
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn param_types(&self) -> impl ExactSizeIterator<Item = &TypeDesc> {
        self.params.iter().map(|p| &p.ty)
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{}: {}", p.name, p.ty)?;
        }
        write!(f, ") -> {}", self.returns)
    }
}
