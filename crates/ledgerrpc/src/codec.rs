//! # Codec
//!
//! The translation layer between native `Value`s and the `ledgerpack` wire format,
//! always driven by the `TypeDesc` the schema declared.
//!
//! ## Invariants
//! - **Recursion Safety**: All recursive operations are bounded by `MAX_RECURSION_DEPTH`.
//! - **Type Strictness**: Decoding verifies wire tags against the expected descriptor.
//! - **Canonical Maps**: Entries are written in ascending order of their encoded key
//!   bytes and decoding rejects any other order, so re-encoding is byte-stable.
//! - **Integer kinds**: Either `Value::Int` or `Value::UInt` is accepted on encode if
//!   the number fits. Unsigned descriptors decode to `UInt`, signed ones to `Int`,
//!   except signed 256-bit values above `i128::MAX`, which decode to `UInt`. The two
//!   kinds compare by number, so every accepted value round-trips.

use ledgerpack::Decoder;
use ledgerpack::Encoder;

use crate::error::Result;
use crate::error::RpcError;
use crate::types::IntWidth;
use crate::types::TypeDesc;
use crate::value::Address;
use crate::value::Value;

/// The maximum nesting depth for Values before trapping.
pub const MAX_RECURSION_DEPTH: usize = 64;

/// Encodes `value` as a standalone item.
pub fn encode(value: &Value, ty: &TypeDesc) -> Result<Vec<u8>> {
    let mut enc = Encoder::new();
    encode_value_impl(&mut enc, value, ty, 0)?;
    Ok(enc.into_bytes()?)
}

/// Decodes exactly one item of type `ty`; trailing bytes are an error.
pub fn decode(bytes: &[u8], ty: &TypeDesc) -> Result<Value> {
    let mut dec = Decoder::new(bytes);
    let value = decode_value_impl(&mut dec, ty, 0)?;
    if dec.remaining() != 0 {
        return Err(RpcError::ShapeMismatch(format!("{} trailing bytes after value", dec.remaining())));
    }
    Ok(value)
}

/// Encodes a `Value` into the encoder stream.
///
/// # Errors
/// Returns `RpcError::RecursionLimitExceeded` if the value is too deeply nested.
pub fn encode_value(enc: &mut Encoder, value: &Value, ty: &TypeDesc) -> Result<()> {
    encode_value_impl(enc, value, ty, 0)
}

/// Decodes a single Value of the expected type.
pub fn decode_value(dec: &mut Decoder, ty: &TypeDesc) -> Result<Value> {
    decode_value_impl(dec, ty, 0)
}

/// Decodes a list of values given a list of expected types.
///
/// Used for argument lists; the list must hold exactly one item per type.
pub fn decode_args<'t>(
    mut list_decoder: Decoder,
    types: impl ExactSizeIterator<Item = &'t TypeDesc>,
) -> Result<Vec<Value>> {
    let mut iter = list_decoder.list()?;
    if iter.count() as usize != types.len() {
        return Err(RpcError::ShapeMismatch(format!(
            "expected {} arguments, found {}", types.len(), iter.count()
        )));
    }

    let mut vals = Vec::with_capacity(types.len());
    for ty in types {
        let Some(mut item) = iter.next()? else {
            return Err(RpcError::ProtocolViolation("Fewer args than types".into()));
        };
        vals.push(decode_value_impl(&mut item, ty, 0)?);
    }
    if iter.next()?.is_some() {
        return Err(RpcError::ProtocolViolation("More args than types".into()));
    }
    Ok(vals)
}

fn mismatch(ty: &TypeDesc, found: &Value) -> RpcError {
    RpcError::TypeMismatch { expected: ty.to_string(), found: found.kind().to_string() }
}

fn out_of_range(ty: &TypeDesc, value: impl ToString) -> RpcError {
    RpcError::Range { ty: ty.to_string(), value: value.to_string() }
}

fn unresolved(name: &str) -> RpcError {
    RpcError::UnsupportedType(format!("unresolved type '{}'", name))
}

/// Narrows an integer value to the native type backing `ty`.
fn fit<T>(value: &Value, ty: &TypeDesc) -> Result<T>
where
    T: TryFrom<i128> + TryFrom<u128>,
{
    let out = match value {
        Value::Int(v) => <T as TryFrom<i128>>::try_from(*v).ok(),
        Value::UInt(v) => <T as TryFrom<u128>>::try_from(*v).ok(),
        other => return Err(mismatch(ty, other)),
    };
    out.ok_or_else(|| match value {
        Value::Int(v) => out_of_range(ty, v),
        Value::UInt(v) => out_of_range(ty, v),
        _ => out_of_range(ty, "?"),
    })
}

fn widen_unsigned(v: u128) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[16..].copy_from_slice(&v.to_be_bytes());
    out
}

fn widen_signed(v: i128) -> [u8; 32] {
    let fill = if v < 0 { 0xFF } else { 0x00 };
    let mut out = [fill; 32];
    out[16..].copy_from_slice(&v.to_be_bytes());
    out
}

fn hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("0x");
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

fn low_half(wide: &[u8; 32]) -> [u8; 16] {
    let mut low = [0u8; 16];
    low.copy_from_slice(&wide[16..]);
    low
}

fn narrow_unsigned(wide: &[u8; 32], ty: &TypeDesc) -> Result<u128> {
    if wide[..16].iter().any(|b| *b != 0) {
        return Err(out_of_range(ty, hex(wide)));
    }
    Ok(u128::from_be_bytes(low_half(wide)))
}

/// Positive values above `i128::MAX` come back as `UInt`.
fn narrow_signed(wide: &[u8; 32], ty: &TypeDesc) -> Result<Value> {
    if wide[..16].iter().all(|b| *b == 0x00) {
        let v = u128::from_be_bytes(low_half(wide));
        return Ok(i128::try_from(v).map_or(Value::UInt(v), Value::Int));
    }
    let v = i128::from_be_bytes(low_half(wide));
    if v >= 0 || wide[..16].iter().any(|b| *b != 0xFF) {
        return Err(out_of_range(ty, hex(wide)));
    }
    Ok(Value::Int(v))
}

fn encode_int(enc: &mut Encoder, value: &Value, ty: &TypeDesc, signed: bool, width: IntWidth) -> Result<()> {
    match (signed, width) {
        (false, IntWidth::W32) => enc.u32(fit(value, ty)?)?,
        (true, IntWidth::W32) => enc.s32(fit(value, ty)?)?,
        (false, IntWidth::W64) => enc.u64(fit(value, ty)?)?,
        (true, IntWidth::W64) => enc.s64(fit(value, ty)?)?,
        (false, IntWidth::W128) => enc.u128(fit(value, ty)?)?,
        (true, IntWidth::W128) => enc.s128(fit(value, ty)?)?,
        (false, IntWidth::W256) => {
            let wide = match value {
                Value::UInt(v) => widen_unsigned(*v),
                Value::Int(v) => widen_unsigned(u128::try_from(*v).map_err(|_| out_of_range(ty, v))?),
                other => return Err(mismatch(ty, other)),
            };
            enc.u256(&wide)?
        }
        (true, IntWidth::W256) => {
            let wide = match value {
                Value::Int(v) => widen_signed(*v),
                Value::UInt(v) => widen_unsigned(*v),
                other => return Err(mismatch(ty, other)),
            };
            enc.s256(&wide)?
        }
    }
    Ok(())
}

fn decode_int(dec: &mut Decoder, ty: &TypeDesc, signed: bool, width: IntWidth) -> Result<Value> {
    Ok(match (signed, width) {
        (false, IntWidth::W32) => Value::UInt(dec.u32()?.into()),
        (true, IntWidth::W32) => Value::Int(dec.s32()?.into()),
        (false, IntWidth::W64) => Value::UInt(dec.u64()?.into()),
        (true, IntWidth::W64) => Value::Int(dec.s64()?.into()),
        (false, IntWidth::W128) => Value::UInt(dec.u128()?),
        (true, IntWidth::W128) => Value::Int(dec.s128()?),
        (false, IntWidth::W256) => Value::UInt(narrow_unsigned(&dec.u256()?, ty)?),
        (true, IntWidth::W256) => narrow_signed(&dec.s256()?, ty)?,
    })
}

fn encode_value_impl(enc: &mut Encoder, value: &Value, ty: &TypeDesc, depth: usize) -> Result<()> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(RpcError::RecursionLimitExceeded);
    }

    match (ty, value) {
        (TypeDesc::Void, Value::Void) => enc.void()?,
        (TypeDesc::Bool, Value::Bool(b)) => enc.bool(*b)?,
        (TypeDesc::Int { signed, width }, v) => encode_int(enc, v, ty, *signed, *width)?,
        (TypeDesc::String, Value::String(s)) => enc.str(s)?,
        (TypeDesc::Bytes, Value::Bytes(b)) => enc.bytes(b)?,
        (TypeDesc::BytesN(n), Value::Bytes(b)) => {
            if b.len() != *n as usize {
                return Err(RpcError::ShapeMismatch(format!("{} expects {} bytes, found {}", ty, n, b.len())));
            }
            enc.bytes(b)?
        }
        (TypeDesc::Address, Value::Address(a)) => enc.address(a.as_str())?,
        (TypeDesc::Option(_), Value::Option(None)) => enc.option_none()?,
        (TypeDesc::Option(inner), Value::Option(Some(v))) => {
            enc.option_some_begin()?;
            encode_value_impl(enc, v, inner, depth + 1)?;
            enc.option_some_end()?;
        }
        (TypeDesc::Vec(inner), Value::Vec(items)) => {
            enc.list_begin()?;
            for item in items {
                encode_value_impl(enc, item, inner, depth + 1)?;
            }
            enc.list_end()?;
        }
        (TypeDesc::Map(kty, vty), Value::Map(entries)) => {
            let mut encoded = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let mut key = Encoder::new();
                encode_value_impl(&mut key, k, kty, depth + 1)?;
                let mut val = Encoder::new();
                encode_value_impl(&mut val, v, vty, depth + 1)?;
                encoded.push((key.into_bytes()?, val.into_bytes()?));
            }
            encoded.sort_by(|a, b| a.0.cmp(&b.0));
            if encoded.windows(2).any(|w| w[0].0 == w[1].0) {
                return Err(RpcError::ShapeMismatch("duplicate map key".into()));
            }
            enc.map_begin()?;
            for (k, v) in &encoded {
                enc.raw_item(k)?;
                enc.raw_item(v)?;
            }
            enc.map_end()?;
        }
        (TypeDesc::Tuple(types), Value::Tuple(items)) => {
            if types.len() != items.len() {
                return Err(RpcError::ShapeMismatch(format!(
                    "{} has {} elements, found {}", ty, types.len(), items.len()
                )));
            }
            enc.tuple_begin()?;
            for (item, ty) in items.iter().zip(types) {
                encode_value_impl(enc, item, ty, depth + 1)?;
            }
            enc.tuple_end()?;
        }
        (TypeDesc::Record(rec), Value::Record(fields)) => {
            if let Some((extra, _)) = fields.iter().find(|(n, _)| !rec.fields.iter().any(|f| f.name == *n)) {
                return Err(RpcError::ShapeMismatch(format!("{} has no field '{}'", rec.name, extra)));
            }
            enc.record_begin()?;
            for field in &rec.fields {
                let mut matches = fields.iter().filter(|(n, _)| *n == field.name);
                let Some((_, v)) = matches.next() else {
                    return Err(RpcError::ShapeMismatch(format!("{} is missing field '{}'", rec.name, field.name)));
                };
                if matches.next().is_some() {
                    return Err(RpcError::ShapeMismatch(format!("{} has field '{}' twice", rec.name, field.name)));
                }
                enc.variant_begin(&field.name)?;
                encode_value_impl(enc, v, &field.ty, depth + 1)?;
                enc.variant_end()?;
            }
            enc.record_end()?;
        }
        (TypeDesc::Union(u), Value::Union(name, payload)) => {
            let Some(case) = u.cases.iter().find(|c| c.name == *name) else {
                return Err(RpcError::ShapeMismatch(format!("{} has no case '{}'", u.name, name)));
            };
            if case.payload.len() != payload.len() {
                return Err(RpcError::ShapeMismatch(format!(
                    "{}::{} carries {} values, found {}", u.name, name, case.payload.len(), payload.len()
                )));
            }
            enc.variant_begin(name)?;
            enc.tuple_begin()?;
            for (item, ty) in payload.iter().zip(&case.payload) {
                encode_value_impl(enc, item, ty, depth + 1)?;
            }
            enc.tuple_end()?;
            enc.variant_end()?;
        }
        (TypeDesc::Enum(e), Value::Enum(name)) => {
            let Some(case) = e.cases.iter().find(|c| c.name == *name) else {
                return Err(RpcError::ShapeMismatch(format!("{} has no case '{}'", e.name, name)));
            };
            enc.variant_begin(name)?;
            enc.u32(case.value)?;
            enc.variant_end()?;
        }
        (TypeDesc::Named(name), _) => return Err(unresolved(name)),
        (ty, other) => return Err(mismatch(ty, other)),
    }
    Ok(())
}

/// Fails if an ADT body holds more than the single item just decoded.
fn expect_end(dec: &Decoder) -> Result<()> {
    if dec.remaining() != 0 {
        return Err(RpcError::ProtocolViolation(format!("{} unexpected bytes in container", dec.remaining())));
    }
    Ok(())
}

fn decode_value_impl(dec: &mut Decoder, ty: &TypeDesc, depth: usize) -> Result<Value> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(RpcError::RecursionLimitExceeded);
    }

    match ty {
        TypeDesc::Void => {
            dec.void()?;
            Ok(Value::Void)
        }
        TypeDesc::Bool => Ok(Value::Bool(dec.bool()?)),
        TypeDesc::Int { signed, width } => decode_int(dec, ty, *signed, *width),
        TypeDesc::String => Ok(Value::String(dec.str()?.to_string())),
        TypeDesc::Bytes => Ok(Value::Bytes(dec.bytes()?.to_vec())),
        TypeDesc::BytesN(n) => {
            let b = dec.bytes()?;
            if b.len() != *n as usize {
                return Err(RpcError::ShapeMismatch(format!("{} expects {} bytes, found {}", ty, n, b.len())));
            }
            Ok(Value::Bytes(b.to_vec()))
        }
        TypeDesc::Address => Ok(Value::Address(Address::parse(dec.address()?)?)),

        TypeDesc::Option(inner) => {
            if let Some(mut some) = dec.option()? {
                let val = decode_value_impl(&mut some, inner, depth + 1)?;
                expect_end(&some)?;
                Ok(Value::Option(Some(Box::new(val))))
            } else {
                Ok(Value::Option(None))
            }
        }

        TypeDesc::Vec(inner) => {
            let mut iter = dec.list()?;
            let mut items = Vec::with_capacity(iter.count().min(1024) as usize);
            while let Some(mut item) = iter.next()? {
                items.push(decode_value_impl(&mut item, inner, depth + 1)?);
            }
            Ok(Value::Vec(items))
        }

        TypeDesc::Map(kty, vty) => {
            let mut iter = dec.map()?;
            let mut entries = Vec::with_capacity(iter.count().min(1024) as usize);
            let mut prev: Option<&[u8]> = None;
            while let Some((mut k, mut v)) = iter.next()? {
                let key_bytes = k.as_slice();
                if prev.is_some_and(|p| p >= key_bytes) {
                    return Err(RpcError::ShapeMismatch("map keys are not in canonical order".into()));
                }
                prev = Some(key_bytes);
                let key = decode_value_impl(&mut k, kty, depth + 1)?;
                let val = decode_value_impl(&mut v, vty, depth + 1)?;
                entries.push((key, val));
            }
            Ok(Value::Map(entries))
        }

        TypeDesc::Tuple(types) => {
            let mut iter = dec.tuple()?;
            if iter.count() as usize != types.len() {
                return Err(RpcError::ShapeMismatch(format!(
                    "{} has {} elements, found {}", ty, types.len(), iter.count()
                )));
            }
            let mut items = Vec::with_capacity(types.len());
            for ty in types {
                let Some(mut item) = iter.next()? else {
                    return Err(RpcError::ProtocolViolation("Tuple too short".into()));
                };
                items.push(decode_value_impl(&mut item, ty, depth + 1)?);
            }
            if iter.next()?.is_some() {
                return Err(RpcError::ProtocolViolation("Tuple too long".into()));
            }
            Ok(Value::Tuple(items))
        }

        TypeDesc::Record(rec) => {
            let mut iter = dec.record()?;
            if iter.count() as usize != rec.fields.len() {
                return Err(RpcError::ShapeMismatch(format!(
                    "{} has {} fields, found {}", rec.name, rec.fields.len(), iter.count()
                )));
            }
            let mut fields = Vec::with_capacity(rec.fields.len());
            for field in &rec.fields {
                let Some((name, mut val)) = iter.next()? else {
                    return Err(RpcError::ProtocolViolation("Record too short".into()));
                };
                if name != field.name {
                    return Err(RpcError::ShapeMismatch(format!(
                        "{} expects field '{}', found '{}'", rec.name, field.name, name
                    )));
                }
                let v = decode_value_impl(&mut val, &field.ty, depth + 1)?;
                expect_end(&val)?;
                fields.push((field.name.clone(), v));
            }
            if iter.next()?.is_some() {
                return Err(RpcError::ProtocolViolation("Record too long".into()));
            }
            Ok(Value::Record(fields))
        }

        TypeDesc::Union(u) => {
            let (name, mut body) = dec.variant()?;
            let Some(case) = u.cases.iter().find(|c| c.name == name) else {
                return Err(RpcError::ShapeMismatch(format!("{} has no case '{}'", u.name, name)));
            };
            let mut iter = body.tuple()?;
            if iter.count() as usize != case.payload.len() {
                return Err(RpcError::ShapeMismatch(format!(
                    "{}::{} carries {} values, found {}", u.name, name, case.payload.len(), iter.count()
                )));
            }
            let mut payload = Vec::with_capacity(case.payload.len());
            for ty in &case.payload {
                let Some(mut item) = iter.next()? else {
                    return Err(RpcError::ProtocolViolation("Union payload too short".into()));
                };
                payload.push(decode_value_impl(&mut item, ty, depth + 1)?);
            }
            if iter.next()?.is_some() {
                return Err(RpcError::ProtocolViolation("Union payload too long".into()));
            }
            expect_end(&body)?;
            Ok(Value::Union(name.to_string(), payload))
        }

        TypeDesc::Enum(e) => {
            let (name, mut body) = dec.variant()?;
            let Some(case) = e.cases.iter().find(|c| c.name == name) else {
                return Err(RpcError::ShapeMismatch(format!("{} has no case '{}'", e.name, name)));
            };
            let value = body.u32()?;
            expect_end(&body)?;
            if value != case.value {
                return Err(RpcError::ShapeMismatch(format!(
                    "{}::{} is {}, found {}", e.name, name, case.value, value
                )));
            }
            Ok(Value::Enum(name.to_string()))
        }

        TypeDesc::Named(name) => Err(unresolved(name)),
    }
}
