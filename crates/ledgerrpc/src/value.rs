//! # Native Values
//!
//! `Value` is the dynamically typed counterpart of `TypeDesc`. Integers are held at
//! full native width; the descriptor decides how many bits reach the wire.

use std::fmt;
use std::str::FromStr;

/// Length of an address in its textual (strkey) form.
const ADDRESS_LEN: usize = 56;

/// Reasons an address string is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Addresses are exactly 56 characters.
    Length(usize),
    /// The leading character names neither an account (`G`) nor a contract (`C`).
    Kind(char),
    /// A character outside the base32 alphabet `A-Z2-7`.
    Alphabet(char),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length(n) => write!(f, "expected {} characters, found {}", ADDRESS_LEN, n),
            Self::Kind(c) => write!(f, "unknown address kind '{}'", c),
            Self::Alphabet(c) => write!(f, "character '{}' is not base32", c),
        }
    }
}

impl std::error::Error for AddressError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Account,
    Contract,
}

/// An account or contract identity in strkey form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(String);

impl Address {
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if s.len() != ADDRESS_LEN {
            return Err(AddressError::Length(s.chars().count()));
        }
        let mut chars = s.chars();
        match chars.next() {
            Some('G') | Some('C') => {}
            Some(c) => return Err(AddressError::Kind(c)),
            None => return Err(AddressError::Length(0)),
        }
        if let Some(bad) = chars.find(|c| !matches!(c, 'A'..='Z' | '2'..='7')) {
            return Err(AddressError::Alphabet(bad));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> AddressKind {
        if self.0.starts_with('C') { AddressKind::Contract } else { AddressKind::Account }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A native value, decoded from or destined for the wire.
///
/// `Int` and `UInt` compare by the number they hold, so `Int(7) == UInt(7)`.
#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Bool(bool),
    /// Any signed integer descriptor.
    Int(i128),
    /// Any unsigned integer descriptor.
    UInt(u128),
    String(String),
    Bytes(Vec<u8>),
    Address(Address),
    Option(Option<Box<Value>>),
    Vec(Vec<Value>),
    /// Entries in canonical order once decoded.
    Map(Vec<(Value, Value)>),
    Tuple(Vec<Value>),
    /// Fields in declaration order.
    Record(Vec<(String, Value)>),
    /// Case name and positional payload.
    Union(String, Vec<Value>),
    Enum(String),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Int(a), Self::UInt(b)) | (Self::UInt(b), Self::Int(a)) => {
                u128::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Self::Void, Self::Void) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Address(a), Self::Address(b)) => a == b,
            (Self::Option(a), Self::Option(b)) => a == b,
            (Self::Vec(a), Self::Vec(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Union(a, x), Self::Union(b, y)) => a == b && x == y,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    pub fn some(v: impl Into<Value>) -> Self {
        Self::Option(Some(Box::new(v.into())))
    }

    pub fn none() -> Self {
        Self::Option(None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value as `i128`, if it fits.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i128::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Integer value as `u128`, if non-negative.
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::Int(v) => u128::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Self::Address(a) => Some(a),
            _ => None,
        }
    }

    /// Short name of the value's kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Address(_) => "address",
            Self::Option(_) => "option",
            Self::Vec(_) => "vec",
            Self::Map(_) => "map",
            Self::Tuple(_) => "tuple",
            Self::Record(_) => "record",
            Self::Union(..) => "union",
            Self::Enum(_) => "enum",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Self::Bool(v) }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self { Self::Int(v.into()) }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self { Self::Int(v.into()) }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self { Self::Int(v) }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self { Self::UInt(v.into()) }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self { Self::UInt(v.into()) }
}

impl From<u128> for Value {
    fn from(v: u128) -> Self { Self::UInt(v) }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self { Self::String(v.to_string()) }
}

impl From<String> for Value {
    fn from(v: String) -> Self { Self::String(v) }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self { Self::Bytes(v) }
}

impl From<Address> for Value {
    fn from(v: Address) -> Self { Self::Address(v) }
}

impl From<&Address> for Value {
    fn from(v: &Address) -> Self { Self::Address(v.clone()) }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self { Self::Vec(v) }
}
