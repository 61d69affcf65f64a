//! # Schema Decoder
//!
//! Turns the ordered list of contract-spec entries shipped with a binding into
//! method signatures, resolved user types and the contract's error table.
//!
//! ## Invariants
//! - **Deterministic**: the same entries always produce an equal `Schema`.
//! - **Closed type set**: any XDR type tag outside the supported set fails the whole
//!   decode; nothing is skipped.
//! - **Resolved**: no `TypeDesc::Named` survives into a decoded `Schema`.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::types::EnumCase;
use crate::types::EnumDesc;
use crate::types::Field;
use crate::types::MethodSignature;
use crate::types::Param;
use crate::types::RecordDesc;
use crate::types::TypeDesc;
use crate::types::UnionCase;
use crate::types::UnionDesc;
use crate::xdr;
use crate::xdr::XdrReader;

/// Deepest type nesting accepted inside a single descriptor.
const MAX_TYPE_DEPTH: u32 = 32;

/// Entry kind discriminants.
mod entry {
    pub const FUNCTION: u32 = 0;
    pub const STRUCT: u32 = 1;
    pub const UNION: u32 = 2;
    pub const ENUM: u32 = 3;
    pub const ERROR_ENUM: u32 = 4;
}

/// XDR type tags of the supported set.
mod tag {
    pub const BOOL: u32 = 1;
    pub const VOID: u32 = 2;
    pub const U32: u32 = 4;
    pub const I32: u32 = 5;
    pub const U64: u32 = 6;
    pub const I64: u32 = 7;
    pub const TIMEPOINT: u32 = 8;
    pub const DURATION: u32 = 9;
    pub const U128: u32 = 10;
    pub const I128: u32 = 11;
    pub const U256: u32 = 12;
    pub const I256: u32 = 13;
    pub const BYTES: u32 = 14;
    pub const STRING: u32 = 16;
    pub const SYMBOL: u32 = 17;
    pub const ADDRESS: u32 = 19;
    pub const OPTION: u32 = 1000;
    pub const VEC: u32 = 1002;
    pub const MAP: u32 = 1004;
    pub const TUPLE: u32 = 1005;
    pub const BYTES_N: u32 = 1006;
    pub const UDT: u32 = 2000;
}

/// What went wrong while decoding a schema entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// The entry is not valid base64.
    Base64,
    /// The entry ends before its structure does.
    Truncated,
    /// An XDR type tag outside the supported set.
    UnsupportedType(u32),
    UnknownEntryKind(u32),
    /// A string, array or nesting depth exceeds its bound.
    LimitExceeded { limit: u32, found: u32 },
    InvalidUtf8,
    NonZeroPadding,
    TrailingBytes,
    DuplicateMethod(String),
    DuplicateParam(String),
    /// Two fields or cases of one user type share a name.
    DuplicateMember(String),
    DuplicateType(String),
    DuplicateErrorCode(u32),
    UnknownType(String),
    RecursiveType(String),
    TooManyOutputs(u32),
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64 => write!(f, "entry is not valid base64"),
            Self::Truncated => write!(f, "entry is truncated"),
            Self::UnsupportedType(t) => write!(f, "unsupported type tag {}", t),
            Self::UnknownEntryKind(k) => write!(f, "unknown entry kind {}", k),
            Self::LimitExceeded { limit, found } => write!(f, "{} exceeds the limit of {}", found, limit),
            Self::InvalidUtf8 => write!(f, "string is not valid UTF-8"),
            Self::NonZeroPadding => write!(f, "string padding is not zero"),
            Self::TrailingBytes => write!(f, "trailing bytes after entry"),
            Self::DuplicateMethod(n) => write!(f, "method '{}' is declared twice", n),
            Self::DuplicateParam(n) => write!(f, "parameter '{}' is declared twice", n),
            Self::DuplicateMember(n) => write!(f, "member '{}' is declared twice", n),
            Self::DuplicateType(n) => write!(f, "type '{}' is declared twice", n),
            Self::DuplicateErrorCode(c) => write!(f, "error code {} is declared twice", c),
            Self::UnknownType(n) => write!(f, "reference to undeclared type '{}'", n),
            Self::RecursiveType(n) => write!(f, "type '{}' refers to itself", n),
            Self::TooManyOutputs(n) => write!(f, "{} outputs declared, at most one is allowed", n),
        }
    }
}

/// A schema decode failure, located by entry index and byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub entry: usize,
    pub offset: usize,
    pub kind: SchemaErrorKind,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema entry {} at byte {}: {}", self.entry, self.offset, self.kind)
    }
}

impl std::error::Error for SchemaError {}

/// One declared contract error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCase {
    pub name: String,
    pub doc: String,
}

/// Remote error codes declared by the contract's error enums.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTable {
    codes: BTreeMap<u32, ErrorCase>,
}

impl ErrorTable {
    /// Builds a table from `(code, name)` pairs. Later pairs replace earlier ones.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (u32, &'a str)>) -> Self {
        let codes = pairs
            .into_iter()
            .map(|(code, name)| (code, ErrorCase { name: name.to_string(), doc: String::new() }))
            .collect();
        Self { codes }
    }

    pub fn get(&self, code: u32) -> Option<&ErrorCase> {
        self.codes.get(&code)
    }

    /// Name of the error declared for `code`.
    pub fn name(&self, code: u32) -> Option<&str> {
        self.codes.get(&code).map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &ErrorCase)> {
        self.codes.iter().map(|(c, e)| (*c, e))
    }
}

/// The decoded interface of one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    methods: Vec<MethodSignature>,
    types: BTreeMap<String, TypeDesc>,
    errors: ErrorTable,
}

impl Schema {
    /// Decodes base64 entries in source order.
    pub fn from_base64<S: AsRef<str>>(entries: &[S]) -> Result<Self, SchemaError> {
        let mut raw = Vec::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            let bytes = BASE64.decode(e.as_ref().trim()).map_err(|err| {
                let offset = match err {
                    base64::DecodeError::InvalidByte(o, _) => o,
                    base64::DecodeError::InvalidLastSymbol(o, _) => o,
                    _ => 0,
                };
                SchemaError { entry: i, offset, kind: SchemaErrorKind::Base64 }
            })?;
            raw.push(bytes);
        }
        Self::from_xdr(&raw)
    }

    /// Decodes raw XDR entries in source order.
    pub fn from_xdr<B: AsRef<[u8]>>(entries: &[B]) -> Result<Self, SchemaError> {
        let mut parser = Parser::default();
        for (i, e) in entries.iter().enumerate() {
            parser.entry(i, e.as_ref())?;
        }
        parser.finish()
    }

    /// Method signatures in declaration order.
    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// A resolved user-defined type by name.
    pub fn user_type(&self, name: &str) -> Option<&TypeDesc> {
        self.types.get(name)
    }

    pub fn user_types(&self) -> impl Iterator<Item = (&str, &TypeDesc)> {
        self.types.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn errors(&self) -> &ErrorTable {
        &self.errors
    }
}

// ============================================================================
//  Parsing
// ============================================================================

/// A `udt` reference, kept for location reporting.
struct TypeRef {
    entry: usize,
    offset: usize,
    name: String,
}

enum DefBody {
    Struct(Vec<(String, TypeDesc)>),
    Union(Vec<(String, Vec<TypeDesc>)>),
    Enum(Vec<EnumCase>),
}

/// An unresolved user type definition.
struct TypeDef {
    entry: usize,
    offset: usize,
    body: DefBody,
}

#[derive(Default)]
struct Parser {
    methods: Vec<(usize, usize, MethodSignature)>,
    defs: HashMap<String, TypeDef>,
    /// Names in declaration order, so resolution is deterministic.
    order: Vec<String>,
    refs: Vec<TypeRef>,
    errors: BTreeMap<u32, ErrorCase>,
}

impl Parser {
    fn entry(&mut self, index: usize, bytes: &[u8]) -> Result<(), SchemaError> {
        let mut r = XdrReader::new(index, bytes);
        let kind_at = r.pos();
        match r.read_u32()? {
            entry::FUNCTION => self.function(&mut r, index)?,
            entry::STRUCT => self.record(&mut r, index)?,
            entry::UNION => self.union(&mut r, index)?,
            entry::ENUM => self.enumeration(&mut r, index, false)?,
            entry::ERROR_ENUM => self.enumeration(&mut r, index, true)?,
            other => return Err(r.error_at(kind_at, SchemaErrorKind::UnknownEntryKind(other))),
        }
        r.finish()
    }

    fn function(&mut self, r: &mut XdrReader, index: usize) -> Result<(), SchemaError> {
        let doc = r.read_string(xdr::DOC_LIMIT)?;
        let name_at = r.pos();
        let name = r.read_string(xdr::FN_NAME_LIMIT)?;

        let inputs = r.read_count(xdr::INPUTS_LIMIT)?;
        let mut params: Vec<Param> = Vec::with_capacity(inputs as usize);
        for _ in 0..inputs {
            let _doc = r.read_string(xdr::DOC_LIMIT)?;
            let param_at = r.pos();
            let param = r.read_string(xdr::FIELD_NAME_LIMIT)?;
            if params.iter().any(|p| p.name == param) {
                return Err(r.error_at(param_at, SchemaErrorKind::DuplicateParam(param)));
            }
            let ty = self.read_type(r, 0)?;
            params.push(Param { name: param, ty });
        }

        let outputs_at = r.pos();
        let outputs = r.read_u32()?;
        if outputs > xdr::OUTPUTS_LIMIT {
            return Err(r.error_at(outputs_at, SchemaErrorKind::TooManyOutputs(outputs)));
        }
        let returns = if outputs == 1 { self.read_type(r, 0)? } else { TypeDesc::Void };

        self.methods.push((index, name_at, MethodSignature { name, doc, params, returns }));
        Ok(())
    }

    /// Reads the `doc, lib, name` header shared by user type entries.
    fn type_header(r: &mut XdrReader) -> Result<(String, usize), SchemaError> {
        let _doc = r.read_string(xdr::DOC_LIMIT)?;
        let _lib = r.read_string(xdr::LIB_LIMIT)?;
        let name_at = r.pos();
        let name = r.read_string(xdr::TYPE_NAME_LIMIT)?;
        Ok((name, name_at))
    }

    fn define(&mut self, r: &XdrReader, index: usize, name: String, offset: usize, body: DefBody) -> Result<(), SchemaError> {
        if self.defs.contains_key(&name) {
            return Err(r.error_at(offset, SchemaErrorKind::DuplicateType(name)));
        }
        self.order.push(name.clone());
        self.defs.insert(name, TypeDef { entry: index, offset, body });
        Ok(())
    }

    fn record(&mut self, r: &mut XdrReader, index: usize) -> Result<(), SchemaError> {
        let (name, name_at) = Self::type_header(r)?;
        let count = r.read_count(xdr::FIELDS_LIMIT)?;
        let mut fields: Vec<(String, TypeDesc)> = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let _doc = r.read_string(xdr::DOC_LIMIT)?;
            let field_at = r.pos();
            let field = r.read_string(xdr::FIELD_NAME_LIMIT)?;
            if fields.iter().any(|(n, _)| *n == field) {
                return Err(r.error_at(field_at, SchemaErrorKind::DuplicateMember(field)));
            }
            let ty = self.read_type(r, 0)?;
            fields.push((field, ty));
        }
        self.define(r, index, name, name_at, DefBody::Struct(fields))
    }

    fn union(&mut self, r: &mut XdrReader, index: usize) -> Result<(), SchemaError> {
        let (name, name_at) = Self::type_header(r)?;
        let count = r.read_count(xdr::CASES_LIMIT)?;
        let mut cases: Vec<(String, Vec<TypeDesc>)> = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let kind_at = r.pos();
            let kind = r.read_u32()?;
            let _doc = r.read_string(xdr::DOC_LIMIT)?;
            let case_at = r.pos();
            let case = r.read_string(xdr::TYPE_NAME_LIMIT)?;
            let payload = match kind {
                0 => Vec::new(),
                1 => {
                    let n = r.read_count(xdr::TUPLE_LIMIT)?;
                    let mut types = Vec::with_capacity(n as usize);
                    for _ in 0..n {
                        types.push(self.read_type(r, 0)?);
                    }
                    types
                }
                other => return Err(r.error_at(kind_at, SchemaErrorKind::UnknownEntryKind(other))),
            };
            if cases.iter().any(|(n, _)| *n == case) {
                return Err(r.error_at(case_at, SchemaErrorKind::DuplicateMember(case)));
            }
            cases.push((case, payload));
        }
        self.define(r, index, name, name_at, DefBody::Union(cases))
    }

    fn enumeration(&mut self, r: &mut XdrReader, index: usize, is_error: bool) -> Result<(), SchemaError> {
        let (name, name_at) = Self::type_header(r)?;
        let count = r.read_count(xdr::CASES_LIMIT)?;
        let mut cases: Vec<EnumCase> = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let doc = r.read_string(xdr::DOC_LIMIT)?;
            let case_at = r.pos();
            let case = r.read_string(xdr::TYPE_NAME_LIMIT)?;
            let value_at = r.pos();
            let value = r.read_u32()?;
            if cases.iter().any(|c| c.name == case) {
                return Err(r.error_at(case_at, SchemaErrorKind::DuplicateMember(case)));
            }
            if is_error {
                if self.errors.contains_key(&value) {
                    return Err(r.error_at(value_at, SchemaErrorKind::DuplicateErrorCode(value)));
                }
                self.errors.insert(value, ErrorCase { name: case.clone(), doc });
            }
            cases.push(EnumCase { name: case, value });
        }
        self.define(r, index, name, name_at, DefBody::Enum(cases))
    }

    fn read_type(&mut self, r: &mut XdrReader, depth: u32) -> Result<TypeDesc, SchemaError> {
        let at = r.pos();
        if depth >= MAX_TYPE_DEPTH {
            return Err(r.error_at(at, SchemaErrorKind::LimitExceeded { limit: MAX_TYPE_DEPTH, found: depth + 1 }));
        }
        let ty = match r.read_u32()? {
            tag::BOOL => TypeDesc::Bool,
            tag::VOID => TypeDesc::Void,
            tag::U32 => TypeDesc::U32,
            tag::I32 => TypeDesc::I32,
            tag::U64 | tag::TIMEPOINT | tag::DURATION => TypeDesc::U64,
            tag::I64 => TypeDesc::I64,
            tag::U128 => TypeDesc::U128,
            tag::I128 => TypeDesc::I128,
            tag::U256 => TypeDesc::U256,
            tag::I256 => TypeDesc::I256,
            tag::BYTES => TypeDesc::Bytes,
            tag::STRING | tag::SYMBOL => TypeDesc::String,
            tag::ADDRESS => TypeDesc::Address,
            tag::OPTION => TypeDesc::option(self.read_type(r, depth + 1)?),
            tag::VEC => TypeDesc::vec(self.read_type(r, depth + 1)?),
            tag::MAP => {
                let key = self.read_type(r, depth + 1)?;
                let value = self.read_type(r, depth + 1)?;
                TypeDesc::map(key, value)
            }
            tag::TUPLE => {
                let n = r.read_count(xdr::TUPLE_LIMIT)?;
                let mut items = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    items.push(self.read_type(r, depth + 1)?);
                }
                TypeDesc::Tuple(items)
            }
            tag::BYTES_N => TypeDesc::BytesN(r.read_u32()?),
            tag::UDT => {
                let name_at = r.pos();
                let name = r.read_string(xdr::TYPE_NAME_LIMIT)?;
                self.refs.push(TypeRef { entry: r.entry(), offset: name_at, name: name.clone() });
                TypeDesc::Named(name)
            }
            // val, error, result, muxed_address and anything newer.
            other => return Err(r.error_at(at, SchemaErrorKind::UnsupportedType(other))),
        };
        Ok(ty)
    }

    fn finish(self) -> Result<Schema, SchemaError> {
        for r in &self.refs {
            if !self.defs.contains_key(&r.name) {
                return Err(SchemaError {
                    entry: r.entry,
                    offset: r.offset,
                    kind: SchemaErrorKind::UnknownType(r.name.clone()),
                });
            }
        }

        let mut resolver = Resolver { defs: &self.defs, done: HashMap::new(), active: HashSet::new() };
        let mut types = BTreeMap::new();
        for name in &self.order {
            types.insert(name.clone(), resolver.named(name)?);
        }

        let mut methods: Vec<MethodSignature> = Vec::with_capacity(self.methods.len());
        for (entry, offset, mut sig) in self.methods {
            if methods.iter().any(|m| m.name == sig.name) {
                return Err(SchemaError { entry, offset, kind: SchemaErrorKind::DuplicateMethod(sig.name) });
            }
            for p in &mut sig.params {
                p.ty = resolver.resolve(&p.ty)?;
            }
            sig.returns = resolver.resolve(&sig.returns)?;
            methods.push(sig);
        }

        Ok(Schema { methods, types, errors: ErrorTable { codes: self.errors } })
    }
}

/// Replaces `Named` references with shared resolved descriptors.
struct Resolver<'a> {
    defs: &'a HashMap<String, TypeDef>,
    done: HashMap<String, TypeDesc>,
    /// Definitions currently being resolved; meeting one again is a cycle.
    active: HashSet<String>,
}

impl Resolver<'_> {
    fn resolve(&mut self, ty: &TypeDesc) -> Result<TypeDesc, SchemaError> {
        Ok(match ty {
            TypeDesc::Named(name) => self.named(name)?,
            TypeDesc::Option(inner) => TypeDesc::option(self.resolve(inner)?),
            TypeDesc::Vec(inner) => TypeDesc::vec(self.resolve(inner)?),
            TypeDesc::Map(k, v) => TypeDesc::map(self.resolve(k)?, self.resolve(v)?),
            TypeDesc::Tuple(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.resolve(item)?);
                }
                TypeDesc::Tuple(out)
            }
            other => other.clone(),
        })
    }

    fn named(&mut self, name: &str) -> Result<TypeDesc, SchemaError> {
        if let Some(ty) = self.done.get(name) {
            return Ok(ty.clone());
        }
        let defs = self.defs;
        let Some(def) = defs.get(name) else {
            // References are checked before resolution starts.
            return Err(SchemaError { entry: 0, offset: 0, kind: SchemaErrorKind::UnknownType(name.to_string()) });
        };
        if !self.active.insert(name.to_string()) {
            return Err(SchemaError {
                entry: def.entry,
                offset: def.offset,
                kind: SchemaErrorKind::RecursiveType(name.to_string()),
            });
        }

        let ty = match &def.body {
            DefBody::Struct(fields) => {
                let mut resolved = Vec::with_capacity(fields.len());
                for (field, ty) in fields {
                    resolved.push(Field { name: field.clone(), ty: self.resolve(ty)? });
                }
                TypeDesc::Record(Arc::new(RecordDesc { name: name.to_string(), fields: resolved }))
            }
            DefBody::Union(cases) => {
                let mut resolved = Vec::with_capacity(cases.len());
                for (case, payload) in cases {
                    let mut types = Vec::with_capacity(payload.len());
                    for ty in payload {
                        types.push(self.resolve(ty)?);
                    }
                    resolved.push(UnionCase { name: case.clone(), payload: types });
                }
                TypeDesc::Union(Arc::new(UnionDesc { name: name.to_string(), cases: resolved }))
            }
            DefBody::Enum(cases) => {
                TypeDesc::Enum(Arc::new(EnumDesc { name: name.to_string(), cases: cases.clone() }))
            }
        };

        self.active.remove(name);
        self.done.insert(name.to_string(), ty.clone());
        Ok(ty)
    }
}
