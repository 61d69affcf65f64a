//! # Ledgerpack
//!
//! A strict, bounded TLV format for values crossing a contract call boundary.
//!
//! ## Philosophy
//!
//! - **Explicit state**: The encoder tracks every open container on a stack and
//!   back-patches headers when the container closes. No hidden buffering.
//! - **TLV Architecture**: `[Tag][Length?][Value]` structure enables safe skipping of unknown fields.
//! - **Canonical integers**: Fixed width, big-endian, two's complement for signed.
//!
//! ## Format
//!
//! - **Scalars**: `[Tag: 1b][Data: N]`
//! - **Blobs**: `[Tag: 1b][Len: 4b][Data: Len]`
//! - **Sequences**: `[Tag: 1b][Len: 4b][Count: 4b][Body: Len]`
//! - **ADTs**: `[Tag: 1b][Len: 4b][Body: Len]`
//!
//! All integers are Big-Endian. `Len` never includes the `Count` word.

#[cfg(test)]
mod tests;

/// Ledgerpack serialization and deserialization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Byte does not correspond to a valid Ledgerpack `Tag`.
    InvalidTag(u8),
    /// A valid tag was found where a different one was required.
    UnexpectedTag { expected: Tag, found: Tag },
    /// String data is not valid UTF-8.
    InvalidUtf8,
    /// Closing a scope that does not match the active scope stack.
    ScopeMismatch { expected: Scope, actual: Scope },
    /// Attempted to close a scope when only the Root remains.
    ScopeUnderflow,
    /// Attempted to finalize the buffer with open scopes.
    ScopeStillOpen,
    /// Buffer exhausted while reading.
    UnexpectedEnd,
    /// Blob or container length exceeds `u32::MAX`.
    BlobTooLarge(usize),
    /// Structural Violation: Attempted to write >1 item into a strict scope (Option/Result/Variant).
    TooManyItems(Scope),
    /// Structural Violation: Attempted to close a strict scope (Option/Result/Variant) without a value.
    EmptyAdt(Scope),
    /// Structural Violation: Attempted to write a non-Variant directly into a Record.
    InvalidRecordEntry,
    /// Structural Violation: A Map was closed with a key that has no value.
    DanglingMapKey,
    /// The declared item count of a sequence disagrees with its body.
    CountMismatch { declared: u32, found: u32 },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidTag(b) => write!(f, "Invalid Tag byte: {:#04x}", b),
            Error::UnexpectedTag { expected, found } => {
                write!(f, "Unexpected Tag: expected {:?}, found {:?}", expected, found)
            }
            Error::ScopeMismatch { expected, actual } => {
                write!(f, "Scope Mismatch: expected {:?}, found {:?}", expected, actual)
            }
            Error::TooManyItems(s) => write!(f, "Too many items in scope {:?}; expected exactly 1", s),
            Error::EmptyAdt(s) => write!(f, "Empty ADT scope {:?}; expected exactly 1 item", s),
            Error::CountMismatch { declared, found } => {
                write!(f, "Count Mismatch: header declares {} items, body holds {}", declared, found)
            }
            _ => write!(f, "{:?}", self),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for Ledgerpack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies the type of the encoded value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Padding/Alignment (Skip).
    Pad = 0x00,

    // Fixed-width scalars
    BoolTrue = 0x01,
    BoolFalse = 0x02,
    U8 = 0x03,
    U16 = 0x04,
    U32 = 0x05,
    U64 = 0x06,
    U128 = 0x07,
    U256 = 0x08,
    S8 = 0x09,
    S16 = 0x0A,
    S32 = 0x0B,
    S64 = 0x0C,
    S128 = 0x0D,
    S256 = 0x0E,

    // Unit / Void
    Void = 0x0F,
    OptionNone = 0x10,

    // Blobs (Tag + u32 Len + Bytes)
    String = 0x18,
    Bytes = 0x19,
    Address = 0x1A,

    // Sequences (Tag + u32 Len + u32 Count + Body)
    List = 0x20,
    Map = 0x21,
    Tuple = 0x22,
    Record = 0x23,

    // ADTs (Tag + u32 Len + Body)
    OptionSome = 0x30,
    ResultOk = 0x31,
    ResultErr = 0x32,
    Variant = 0x33,
}

impl Tag {
    /// Returns the Tag variant for a given byte, or `None` if invalid.
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(Tag::Pad),
            0x01 => Some(Tag::BoolTrue),
            0x02 => Some(Tag::BoolFalse),
            0x03 => Some(Tag::U8),
            0x04 => Some(Tag::U16),
            0x05 => Some(Tag::U32),
            0x06 => Some(Tag::U64),
            0x07 => Some(Tag::U128),
            0x08 => Some(Tag::U256),
            0x09 => Some(Tag::S8),
            0x0A => Some(Tag::S16),
            0x0B => Some(Tag::S32),
            0x0C => Some(Tag::S64),
            0x0D => Some(Tag::S128),
            0x0E => Some(Tag::S256),
            0x0F => Some(Tag::Void),
            0x10 => Some(Tag::OptionNone),
            0x18 => Some(Tag::String),
            0x19 => Some(Tag::Bytes),
            0x1A => Some(Tag::Address),
            0x20 => Some(Tag::List),
            0x21 => Some(Tag::Map),
            0x22 => Some(Tag::Tuple),
            0x23 => Some(Tag::Record),
            0x30 => Some(Tag::OptionSome),
            0x31 => Some(Tag::ResultOk),
            0x32 => Some(Tag::ResultErr),
            0x33 => Some(Tag::Variant),
            _ => None,
        }
    }

    /// Number of data bytes following a fixed-width scalar tag.
    fn scalar_width(self) -> Option<usize> {
        match self {
            Tag::Pad | Tag::BoolTrue | Tag::BoolFalse | Tag::Void | Tag::OptionNone => Some(0),
            Tag::U8 | Tag::S8 => Some(1),
            Tag::U16 | Tag::S16 => Some(2),
            Tag::U32 | Tag::S32 => Some(4),
            Tag::U64 | Tag::S64 => Some(8),
            Tag::U128 | Tag::S128 => Some(16),
            Tag::U256 | Tag::S256 => Some(32),
            _ => None,
        }
    }

    /// True for containers that carry a `Count` word after the length.
    fn is_sequence(self) -> bool {
        matches!(self, Tag::List | Tag::Map | Tag::Tuple | Tag::Record)
    }
}

/// Internal state tracking for the `Encoder` stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The virtual root; allows any item.
    Root,
    /// Ordered sequence; allows any number of items.
    List,
    /// Key-Value container; items alternate key, value.
    Map,
    /// Fixed arity sequence; allows any number of items.
    Tuple,
    /// Named fields; strictly allows only `Tag::Variant` items.
    Record,
    /// Strict container; allows exactly one item.
    Option,
    /// Strict container; allows exactly one item.
    Result,
    /// Strict container; allows exactly one item (the payload) after the name.
    Variant,
}

/// An active container scope on the `Encoder` stack.
struct Frame {
    start: usize,
    scope: Scope,
    count: usize,
}

/// A bounded, state-machine driven encoder.
///
/// The Encoder maintains a stack of open scopes to enforce structural strictness
/// and automatically back-patch length and count headers.
///
/// # Structural Invariants
///
/// All write methods validate the operation against the current `Scope`.
/// Returns an `Error` if the write violates the following rules:
///
/// 1.  **Record Scopes**: Only `Tag::Variant` items may be written.
/// 2.  **Map Scopes**: Must hold an even number of items when closed.
/// 3.  **ADT Scopes (Option, Result, Variant)**: Exactly one item must be written.
///     Attempts to write >1 item or close the scope with 0 items will fail.
/// 4.  **Root Scope**: The encoder must end in the Root scope to finalize bytes.
pub struct Encoder {
    buf: Vec<u8>,
    /// Bottom is always `Scope::Root`.
    stack: Vec<Frame>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Creates a new encoder with default capacity.
    pub fn new() -> Self {
        let mut enc = Self {
            buf: Vec::with_capacity(256),
            stack: Vec::with_capacity(8),
        };
        enc.stack.push(Frame { start: 0, scope: Scope::Root, count: 0 });
        enc
    }

    /// Consumes the encoder and returns the final byte vector.
    ///
    /// # Errors
    /// Returns `Error::ScopeStillOpen` if the stack depth > 1.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if self.stack.len() > 1 {
            return Err(Error::ScopeStillOpen);
        }
        Ok(self.buf)
    }

    /// Returns a view of the current buffer.
    ///
    /// # Errors
    /// Returns `Error::ScopeStillOpen` if the stack depth > 1.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        if self.stack.len() > 1 {
            return Err(Error::ScopeStillOpen);
        }
        Ok(&self.buf)
    }

    /// Appends bytes produced by another encoder as a single item.
    ///
    /// The caller guarantees `item` holds exactly one complete value.
    pub fn raw_item(&mut self, item: &[u8]) -> Result<()> {
        let tag = Decoder::new(item).peek_tag()?;
        self.check_write(tag)?;
        self.buf.extend_from_slice(item);
        self.on_item_written();
        Ok(())
    }

    fn current_frame(&mut self) -> &mut Frame {
        // The root frame is pushed in `new` and `end_scope` never pops it.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn check_write(&mut self, tag: Tag) -> Result<()> {
        let frame = self.current_frame();
        match frame.scope {
            Scope::Root | Scope::List | Scope::Map | Scope::Tuple => Ok(()),
            Scope::Record => {
                if tag != Tag::Variant {
                    Err(Error::InvalidRecordEntry)
                } else {
                    Ok(())
                }
            },
            Scope::Option | Scope::Result | Scope::Variant => {
                if frame.count >= 1 {
                    Err(Error::TooManyItems(frame.scope))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn on_item_written(&mut self) {
        let frame = self.current_frame();
        frame.count += 1;
    }

    fn write_tag(&mut self, tag: Tag) -> Result<()> {
        self.check_write(tag)?;
        self.buf.push(tag as u8);
        Ok(())
    }

    fn write_u32_raw(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn scalar(&mut self, tag: Tag, data: &[u8]) -> Result<()> {
        self.write_tag(tag)?;
        self.buf.extend_from_slice(data);
        self.on_item_written();
        Ok(())
    }

    fn blob(&mut self, tag: Tag, data: &[u8]) -> Result<()> {
        let len = data.len();
        if len > u32::MAX as usize { return Err(Error::BlobTooLarge(len)); }
        self.write_tag(tag)?;
        self.write_u32_raw(len as u32);
        self.buf.extend_from_slice(data);
        self.on_item_written();
        Ok(())
    }

    fn begin_scope(&mut self, tag: Tag, scope: Scope) -> Result<()> {
        self.check_write(tag)?;

        self.buf.push(tag as u8);
        self.buf.extend_from_slice(&[0, 0, 0, 0]); // Length placeholder
        if tag.is_sequence() {
            self.buf.extend_from_slice(&[0, 0, 0, 0]); // Count placeholder
        }

        self.stack.push(Frame {
            start: self.buf.len(), // Body starts after the header
            scope,
            count: 0,
        });
        Ok(())
    }

    fn end_scope(&mut self, expected: Scope) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(Error::ScopeUnderflow);
        }

        { // Validate Scope State
            let frame = self.current_frame();
            if frame.scope != expected {
                return Err(Error::ScopeMismatch { expected, actual: frame.scope });
            }

            match frame.scope {
                Scope::Option | Scope::Result | Scope::Variant => {
                    if frame.count == 0 {
                        return Err(Error::EmptyAdt(frame.scope));
                    }
                },
                Scope::Map => {
                    if frame.count % 2 != 0 {
                        return Err(Error::DanglingMapKey);
                    }
                },
                _ => {}
            }
        }

        // Pop and Patch
        let Some(frame) = self.stack.pop() else {
            return Err(Error::ScopeUnderflow);
        };
        let body_len = self.buf.len() - frame.start;

        if body_len > u32::MAX as usize {
            return Err(Error::BlobTooLarge(body_len));
        }

        let is_sequence = matches!(frame.scope, Scope::List | Scope::Map | Scope::Tuple | Scope::Record);
        if is_sequence {
            let count = if frame.scope == Scope::Map { frame.count / 2 } else { frame.count };
            let count_pos = frame.start - 4;
            self.buf[count_pos..frame.start].copy_from_slice(&(count as u32).to_be_bytes());
            let len_pos = frame.start - 8;
            self.buf[len_pos..count_pos].copy_from_slice(&(body_len as u32).to_be_bytes());
        } else {
            let len_pos = frame.start - 4;
            self.buf[len_pos..frame.start].copy_from_slice(&(body_len as u32).to_be_bytes());
        }

        self.on_item_written();

        Ok(())
    }

    /// Encodes a boolean value.
    pub fn bool(&mut self, v: bool) -> Result<()> {
        self.scalar(if v { Tag::BoolTrue } else { Tag::BoolFalse }, &[])
    }

    /// Encodes an unsigned 8-bit integer.
    pub fn u8(&mut self, v: u8) -> Result<()> { self.scalar(Tag::U8, &[v]) }
    /// Encodes a signed 8-bit integer.
    pub fn s8(&mut self, v: i8) -> Result<()> { self.scalar(Tag::S8, &v.to_be_bytes()) }

    /// Encodes an unsigned 16-bit integer (BE).
    pub fn u16(&mut self, v: u16) -> Result<()> { self.scalar(Tag::U16, &v.to_be_bytes()) }
    /// Encodes a signed 16-bit integer (BE).
    pub fn s16(&mut self, v: i16) -> Result<()> { self.scalar(Tag::S16, &v.to_be_bytes()) }

    /// Encodes an unsigned 32-bit integer (BE).
    pub fn u32(&mut self, v: u32) -> Result<()> { self.scalar(Tag::U32, &v.to_be_bytes()) }
    /// Encodes a signed 32-bit integer (BE).
    pub fn s32(&mut self, v: i32) -> Result<()> { self.scalar(Tag::S32, &v.to_be_bytes()) }

    /// Encodes an unsigned 64-bit integer (BE).
    pub fn u64(&mut self, v: u64) -> Result<()> { self.scalar(Tag::U64, &v.to_be_bytes()) }
    /// Encodes a signed 64-bit integer (BE).
    pub fn s64(&mut self, v: i64) -> Result<()> { self.scalar(Tag::S64, &v.to_be_bytes()) }

    /// Encodes an unsigned 128-bit integer (BE).
    pub fn u128(&mut self, v: u128) -> Result<()> { self.scalar(Tag::U128, &v.to_be_bytes()) }
    /// Encodes a signed 128-bit integer (BE).
    pub fn s128(&mut self, v: i128) -> Result<()> { self.scalar(Tag::S128, &v.to_be_bytes()) }

    /// Encodes an unsigned 256-bit integer given as 32 big-endian bytes.
    pub fn u256(&mut self, v: &[u8; 32]) -> Result<()> { self.scalar(Tag::U256, v) }
    /// Encodes a signed 256-bit integer given as 32 big-endian two's complement bytes.
    pub fn s256(&mut self, v: &[u8; 32]) -> Result<()> { self.scalar(Tag::S256, v) }

    /// Encodes Void `()`.
    pub fn void(&mut self) -> Result<()> { self.scalar(Tag::Void, &[]) }
    /// Encodes `Option::None`.
    pub fn option_none(&mut self) -> Result<()> { self.scalar(Tag::OptionNone, &[]) }

    /// Encodes a UTF-8 string blob.
    pub fn str(&mut self, v: &str) -> Result<()> { self.blob(Tag::String, v.as_bytes()) }

    /// Encodes a raw byte blob.
    pub fn bytes(&mut self, v: &[u8]) -> Result<()> { self.blob(Tag::Bytes, v) }

    /// Encodes an address in its textual form.
    pub fn address(&mut self, v: &str) -> Result<()> { self.blob(Tag::Address, v.as_bytes()) }

    /// Begins a List container.
    ///
    /// # Invariants
    /// - Must be closed via `list_end()`.
    /// - Allows any number of items.
    pub fn list_begin(&mut self) -> Result<()> { self.begin_scope(Tag::List, Scope::List) }
    /// Ends a List container.
    pub fn list_end(&mut self) -> Result<()> { self.end_scope(Scope::List) }

    /// Begins a Map container.
    ///
    /// # Invariants
    /// - Must be closed via `map_end()`.
    /// - Items alternate key, value. The count header holds the number of pairs.
    pub fn map_begin(&mut self) -> Result<()> { self.begin_scope(Tag::Map, Scope::Map) }
    /// Ends a Map container.
    pub fn map_end(&mut self) -> Result<()> { self.end_scope(Scope::Map) }

    /// Begins a Tuple container.
    pub fn tuple_begin(&mut self) -> Result<()> { self.begin_scope(Tag::Tuple, Scope::Tuple) }
    /// Ends a Tuple container.
    pub fn tuple_end(&mut self) -> Result<()> { self.end_scope(Scope::Tuple) }

    /// Begins a Record container.
    ///
    /// # Invariants
    /// - Must be closed via `record_end()`.
    /// - **Strict:** Only `variant_begin()` (named field) is allowed as a direct child.
    pub fn record_begin(&mut self) -> Result<()> { self.begin_scope(Tag::Record, Scope::Record) }
    /// Ends a Record container.
    pub fn record_end(&mut self) -> Result<()> { self.end_scope(Scope::Record) }

    /// Begins an `Option::Some` container.
    ///
    /// # Invariants
    /// - Must be closed via `option_some_end()`.
    /// - **Strict:** Requires exactly one item to be written.
    pub fn option_some_begin(&mut self) -> Result<()> { self.begin_scope(Tag::OptionSome, Scope::Option) }
    /// Ends an `Option::Some` container.
    pub fn option_some_end(&mut self) -> Result<()> { self.end_scope(Scope::Option) }

    /// Begins a `Result::Ok` container.
    pub fn result_ok_begin(&mut self) -> Result<()> { self.begin_scope(Tag::ResultOk, Scope::Result) }
    /// Ends a `Result::Ok` container.
    pub fn result_ok_end(&mut self) -> Result<()> { self.end_scope(Scope::Result) }

    /// Begins a `Result::Err` container.
    pub fn result_err_begin(&mut self) -> Result<()> { self.begin_scope(Tag::ResultErr, Scope::Result) }
    /// Ends a `Result::Err` container.
    pub fn result_err_end(&mut self) -> Result<()> { self.end_scope(Scope::Result) }

    /// Begins a Variant (Named Payload).
    ///
    /// Encodes the name string immediately.
    ///
    /// # Invariants
    /// - Must be closed via `variant_end()`.
    /// - **Strict:** Requires exactly one item (the payload) to be written after this call.
    pub fn variant_begin(&mut self, name: &str) -> Result<()> {
        self.begin_scope(Tag::Variant, Scope::Variant)?;
        // Write Name (metadata, not payload)
        self.str(name)?;
        // Reset count; user must write exactly one payload item next.
        self.current_frame().count = 0;
        Ok(())
    }
    /// Ends a Variant.
    pub fn variant_end(&mut self) -> Result<()> { self.end_scope(Scope::Variant) }
}

/// A zero-copy, bounds-checked cursor over a byte slice.
///
/// Decoders are immutable views. Reading advances the internal cursor.
/// Container reads return new `Decoder` instances restricted to the container's body.
///
/// # Errors
/// All read operations return `Error::UnexpectedEnd` if the buffer is exhausted.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over the slice.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Returns the remaining bytes in the view.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Returns the unread bytes without advancing.
    pub fn as_slice(&self) -> &'a [u8] {
        self.buf
    }

    /// Peeks the next Tag without advancing.
    pub fn peek_tag(&self) -> Result<Tag> {
        let Some(&b) = self.buf.first() else { return Err(Error::UnexpectedEnd) };
        Tag::from_u8(b).ok_or(Error::InvalidTag(b))
    }

    fn consume(&mut self, n: usize) -> Result<()> {
        if n > self.buf.len() { return Err(Error::UnexpectedEnd); }
        self.buf = &self.buf[n..];
        Ok(())
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buf.len() { return Err(Error::UnexpectedEnd); }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_u32_raw(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_slice(&mut self, n: usize) -> Result<Decoder<'a>> {
        let bytes = self.read_bytes(n)?;
        Ok(Decoder::new(bytes))
    }

    fn check_tag(&mut self, expected: Tag) -> Result<()> {
        let tag = self.peek_tag()?;
        if tag == expected {
            self.consume(1)?;
            Ok(())
        } else {
            Err(Error::UnexpectedTag { expected, found: tag })
        }
    }

    /// Skips the next item and its nested children.
    pub fn skip(&mut self) -> Result<()> {
        let tag = self.peek_tag()?;
        self.consume(1)?; // Consume Tag

        if let Some(width) = tag.scalar_width() {
            return self.consume(width);
        }

        // Variable length (Blob, Sequence or ADT)
        // Structure: [Length: u32] [Count: u32]? [Body: Length]
        let len = self.read_u32_raw()? as usize;
        if tag.is_sequence() {
            self.consume(4)?;
        }
        self.consume(len)
    }

    /// Splits off the next complete item as its own decoder.
    pub fn next_item(&mut self) -> Result<Decoder<'a>> {
        let mut probe = self.clone();
        probe.skip()?;
        let len = self.remaining() - probe.remaining();
        self.read_slice(len)
    }

    /// Decodes a bool.
    pub fn bool(&mut self) -> Result<bool> {
        let tag = self.peek_tag()?;
        match tag {
            Tag::BoolTrue => { self.consume(1)?; Ok(true) },
            Tag::BoolFalse => { self.consume(1)?; Ok(false) },
            _ => Err(Error::UnexpectedTag { expected: Tag::BoolTrue, found: tag })
        }
    }

    /// Decodes u8.
    pub fn u8(&mut self) -> Result<u8> { self.check_tag(Tag::U8)?; Ok(self.read_array::<1>()?[0]) }
    /// Decodes s8.
    pub fn s8(&mut self) -> Result<i8> { self.check_tag(Tag::S8)?; Ok(i8::from_be_bytes(self.read_array()?)) }

    /// Decodes u16 (BE).
    pub fn u16(&mut self) -> Result<u16> { self.check_tag(Tag::U16)?; Ok(u16::from_be_bytes(self.read_array()?)) }
    /// Decodes s16 (BE).
    pub fn s16(&mut self) -> Result<i16> { self.check_tag(Tag::S16)?; Ok(i16::from_be_bytes(self.read_array()?)) }

    /// Decodes u32 (BE).
    pub fn u32(&mut self) -> Result<u32> { self.check_tag(Tag::U32)?; Ok(u32::from_be_bytes(self.read_array()?)) }
    /// Decodes s32 (BE).
    pub fn s32(&mut self) -> Result<i32> { self.check_tag(Tag::S32)?; Ok(i32::from_be_bytes(self.read_array()?)) }

    /// Decodes u64 (BE).
    pub fn u64(&mut self) -> Result<u64> { self.check_tag(Tag::U64)?; Ok(u64::from_be_bytes(self.read_array()?)) }
    /// Decodes s64 (BE).
    pub fn s64(&mut self) -> Result<i64> { self.check_tag(Tag::S64)?; Ok(i64::from_be_bytes(self.read_array()?)) }

    /// Decodes u128 (BE).
    pub fn u128(&mut self) -> Result<u128> { self.check_tag(Tag::U128)?; Ok(u128::from_be_bytes(self.read_array()?)) }
    /// Decodes s128 (BE).
    pub fn s128(&mut self) -> Result<i128> { self.check_tag(Tag::S128)?; Ok(i128::from_be_bytes(self.read_array()?)) }

    /// Decodes u256 as 32 big-endian bytes.
    pub fn u256(&mut self) -> Result<[u8; 32]> { self.check_tag(Tag::U256)?; self.read_array() }
    /// Decodes s256 as 32 big-endian two's complement bytes.
    pub fn s256(&mut self) -> Result<[u8; 32]> { self.check_tag(Tag::S256)?; self.read_array() }

    /// Decodes Void `()`.
    pub fn void(&mut self) -> Result<()> { self.check_tag(Tag::Void) }
    /// Decodes `Option::None`.
    pub fn option_none(&mut self) -> Result<()> { self.check_tag(Tag::OptionNone) }

    fn blob(&mut self, tag: Tag) -> Result<&'a [u8]> {
        self.check_tag(tag)?;
        let len = self.read_u32_raw()? as usize;
        self.read_bytes(len)
    }

    /// Decodes a string slice (UTF-8).
    pub fn str(&mut self) -> Result<&'a str> {
        let bytes = self.blob(Tag::String)?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    /// Decodes a byte slice.
    pub fn bytes(&mut self) -> Result<&'a [u8]> {
        self.blob(Tag::Bytes)
    }

    /// Decodes the textual form of an address.
    pub fn address(&mut self) -> Result<&'a str> {
        let bytes = self.blob(Tag::Address)?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    fn enter_adt(&mut self, expected: Tag) -> Result<Decoder<'a>> {
        self.check_tag(expected)?;
        let len = self.read_u32_raw()? as usize;
        self.read_slice(len)
    }

    fn enter_sequence(&mut self, expected: Tag) -> Result<SeqIter<'a>> {
        self.check_tag(expected)?;
        let len = self.read_u32_raw()? as usize;
        let count = self.read_u32_raw()?;
        Ok(SeqIter { dec: self.read_slice(len)?, declared: count, seen: 0 })
    }

    /// Decodes a List into an iterator.
    pub fn list(&mut self) -> Result<SeqIter<'a>> {
        self.enter_sequence(Tag::List)
    }

    /// Decodes a Tuple into an iterator.
    pub fn tuple(&mut self) -> Result<SeqIter<'a>> {
        self.enter_sequence(Tag::Tuple)
    }

    /// Decodes a Map into an iterator over key/value pairs.
    pub fn map(&mut self) -> Result<MapIter<'a>> {
        Ok(MapIter { inner: self.enter_sequence(Tag::Map)? })
    }

    /// Decodes a Record into an iterator over named fields.
    pub fn record(&mut self) -> Result<RecordIter<'a>> {
        Ok(RecordIter { inner: self.enter_sequence(Tag::Record)? })
    }

    /// Decodes an Option.
    ///
    /// Returns `Some(Decoder)` for the payload if present, or `None`.
    pub fn option(&mut self) -> Result<Option<Decoder<'a>>> {
        let tag = self.peek_tag()?;
        match tag {
            Tag::OptionNone => {
                self.consume(1)?;
                Ok(None)
            }
            Tag::OptionSome => {
                Ok(Some(self.enter_adt(Tag::OptionSome)?))
            }
            _ => Err(Error::UnexpectedTag { expected: Tag::OptionSome, found: tag })
        }
    }

    /// Decodes a Result.
    ///
    /// Returns `Ok(Decoder)` or `Err(Decoder)` for the respective payloads.
    pub fn result(&mut self) -> Result<std::result::Result<Decoder<'a>, Decoder<'a>>> {
        let tag = self.peek_tag()?;
        match tag {
            Tag::ResultOk => Ok(Ok(self.enter_adt(Tag::ResultOk)?)),
            Tag::ResultErr => Ok(Err(self.enter_adt(Tag::ResultErr)?)),
            _ => Err(Error::UnexpectedTag { expected: Tag::ResultOk, found: tag })
        }
    }

    /// Decodes a Variant.
    ///
    /// Returns `(Name, PayloadDecoder)`.
    pub fn variant(&mut self) -> Result<(&'a str, Decoder<'a>)> {
        let mut inner = self.enter_adt(Tag::Variant)?;
        let name = inner.str()?;
        Ok((name, inner))
    }
}

/// Iterator for items within a List or Tuple.
///
/// Yields exactly as many items as the header declares, or fails.
#[derive(Debug)]
pub struct SeqIter<'a> {
    dec: Decoder<'a>,
    declared: u32,
    seen: u32,
}

impl<'a> SeqIter<'a> {
    /// Number of items declared by the container header.
    pub fn count(&self) -> u32 {
        self.declared
    }

    /// Returns a Decoder for the next item, or `None` once the body is exhausted.
    ///
    /// # Errors
    /// Returns `Error::CountMismatch` if the body and the header disagree.
    pub fn next(&mut self) -> Result<Option<Decoder<'a>>> {
        if self.seen == self.declared {
            if self.dec.remaining() != 0 {
                return Err(Error::CountMismatch { declared: self.declared, found: self.seen + 1 });
            }
            return Ok(None);
        }
        if self.dec.remaining() == 0 {
            return Err(Error::CountMismatch { declared: self.declared, found: self.seen });
        }
        let item = self.dec.next_item()?;
        self.seen += 1;
        Ok(Some(item))
    }
}

/// Iterator for Key-Value pairs within a Map.
#[derive(Debug)]
pub struct MapIter<'a> {
    inner: SeqIter<'a>,
}

impl<'a> MapIter<'a> {
    /// Number of pairs declared by the container header.
    pub fn count(&self) -> u32 {
        self.inner.declared
    }

    /// Returns `(KeyDecoder, ValueDecoder)` for the next pair, or `None`.
    pub fn next(&mut self) -> Result<Option<(Decoder<'a>, Decoder<'a>)>> {
        let inner = &mut self.inner;
        if inner.seen == inner.declared {
            if inner.dec.remaining() != 0 {
                return Err(Error::CountMismatch { declared: inner.declared, found: inner.seen + 1 });
            }
            return Ok(None);
        }
        if inner.dec.remaining() == 0 {
            return Err(Error::CountMismatch { declared: inner.declared, found: inner.seen });
        }
        let key = inner.dec.next_item()?;
        let val = inner.dec.next_item()?;
        inner.seen += 1;
        Ok(Some((key, val)))
    }
}

/// Iterator for named fields (Variants) within a Record.
#[derive(Debug)]
pub struct RecordIter<'a> {
    inner: SeqIter<'a>,
}

impl<'a> RecordIter<'a> {
    /// Number of fields declared by the container header.
    pub fn count(&self) -> u32 {
        self.inner.declared
    }

    /// Returns `(Name, ValueDecoder)` for the next field, or `None`.
    pub fn next(&mut self) -> Result<Option<(&'a str, Decoder<'a>)>> {
        match self.inner.next()? {
            Some(mut item) => {
                let (name, val) = item.variant()?;
                Ok(Some((name, val)))
            }
            None => Ok(None),
        }
    }
}
