//! # Method Table
//!
//! Pure wiring from a decoded `Schema` to the callable surface of a client: one entry
//! per contract function, looked up by name. Building a table touches no transport.

use std::collections::HashMap;
use std::collections::HashSet;

use ledgerrpc::MethodSignature;
use ledgerrpc::Schema;
use ledgerrpc::Value;

use crate::error::ArgumentError;
use crate::error::Error;
use crate::error::Result;

/// Immutable, name-indexed view of a contract's functions.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    entries: Vec<MethodSignature>,
    index: HashMap<String, usize>,
}

impl MethodTable {
    /// One entry per schema function, in declaration order.
    pub fn build(schema: &Schema) -> Self {
        let entries = schema.methods().to_vec();
        let index = entries.iter().enumerate().map(|(i, m)| (m.name.clone(), i)).collect();
        Self { entries, index }
    }

    pub fn get(&self, name: &str) -> Option<&MethodSignature> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Like `get`, but an unknown name is an error.
    pub fn lookup(&self, name: &str) -> Result<&MethodSignature> {
        self.get(name).ok_or_else(|| Error::UnknownMethod(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|m| m.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodSignature> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Named arguments for one call, in the order the caller supplied them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    entries: Vec<(String, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Pairs values with the signature's parameters by position.
    pub fn positional(sig: &MethodSignature, values: impl IntoIterator<Item = Value>) -> Self {
        let entries = sig.params.iter().map(|p| p.name.clone()).zip(values).collect();
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Checks `args` against `sig` and returns them in parameter order.
///
/// Nothing is encoded until the whole argument set is known to fit.
pub fn order_args<'a>(sig: &MethodSignature, args: &'a Args) -> Result<Vec<&'a Value>> {
    let fail = |error| Error::Argument { method: sig.name.clone(), error };

    let mut seen = HashSet::new();
    for (name, _) in args.iter() {
        if !seen.insert(name) {
            return Err(fail(ArgumentError::Duplicate(name.to_string())));
        }
        if sig.param(name).is_none() {
            return Err(fail(ArgumentError::Unexpected(name.to_string())));
        }
    }

    sig.params
        .iter()
        .map(|p| args.get(&p.name).ok_or_else(|| fail(ArgumentError::Missing(p.name.clone()))))
        .collect()
}

/// Validates, then encodes each argument with its declared type.
pub fn encode_args(sig: &MethodSignature, args: &Args) -> Result<Vec<Vec<u8>>> {
    let ordered = order_args(sig, args)?;
    let mut encoded = Vec::with_capacity(ordered.len());
    for (param, value) in sig.params.iter().zip(ordered) {
        encoded.push(ledgerrpc::encode(value, &param.ty)?);
    }
    Ok(encoded)
}
