//! # XDR Cursor
//!
//! Bounds-checked reads over one XDR-encoded schema entry. Every failure carries
//! the entry index and the byte offset at which it was detected.

use crate::schema::SchemaError;
use crate::schema::SchemaErrorKind;

/// Longest doc string an entry may carry.
pub const DOC_LIMIT: u32 = 1024;
/// Function names are symbols.
pub const FN_NAME_LIMIT: u32 = 32;
/// Parameter and field names.
pub const FIELD_NAME_LIMIT: u32 = 30;
/// Type, case and user-defined reference names.
pub const TYPE_NAME_LIMIT: u32 = 60;
/// Library names on user-defined types.
pub const LIB_LIMIT: u32 = 80;
pub const INPUTS_LIMIT: u32 = 10;
pub const OUTPUTS_LIMIT: u32 = 1;
pub const TUPLE_LIMIT: u32 = 12;
pub const FIELDS_LIMIT: u32 = 40;
pub const CASES_LIMIT: u32 = 50;

/// A cursor over a single entry's bytes.
#[derive(Debug, Clone)]
pub struct XdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
    entry: usize,
}

impl<'a> XdrReader<'a> {
    pub fn new(entry: usize, buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, entry }
    }

    /// Index of the entry being read.
    pub fn entry(&self) -> usize {
        self.entry
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Builds an error located at the current offset.
    pub fn error(&self, kind: SchemaErrorKind) -> SchemaError {
        self.error_at(self.pos, kind)
    }

    pub fn error_at(&self, offset: usize, kind: SchemaErrorKind) -> SchemaError {
        SchemaError { entry: self.entry, offset, kind }
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], SchemaError> {
        if n > self.remaining() {
            return Err(self.error(SchemaErrorKind::Truncated));
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, SchemaError> {
        let bytes = self.read_bytes(4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(bytes);
        Ok(u32::from_be_bytes(word))
    }

    /// Reads an array length and checks it against `limit`.
    pub fn read_count(&mut self, limit: u32) -> Result<u32, SchemaError> {
        let at = self.pos;
        let n = self.read_u32()?;
        if n > limit {
            return Err(self.error_at(at, SchemaErrorKind::LimitExceeded { limit, found: n }));
        }
        Ok(n)
    }

    /// Reads a length-prefixed, zero-padded UTF-8 string of at most `limit` bytes.
    pub fn read_string(&mut self, limit: u32) -> Result<String, SchemaError> {
        let len = self.read_count(limit)? as usize;
        let data_at = self.pos;
        let data = self.read_bytes(len)?;
        let text = std::str::from_utf8(data)
            .map_err(|_| self.error_at(data_at, SchemaErrorKind::InvalidUtf8))?
            .to_string();
        let pad = (4 - len % 4) % 4;
        let pad_at = self.pos;
        if self.read_bytes(pad)?.iter().any(|b| *b != 0) {
            return Err(self.error_at(pad_at, SchemaErrorKind::NonZeroPadding));
        }
        Ok(text)
    }

    /// Fails if any bytes remain after the entry body.
    pub fn finish(&self) -> Result<(), SchemaError> {
        if self.remaining() != 0 {
            return Err(self.error(SchemaErrorKind::TrailingBytes));
        }
        Ok(())
    }
}

/// Writes XDR words and strings; the inverse of `XdrReader`.
///
/// Used to assemble schema entries by hand, mostly in tests.
#[derive(Debug, Default)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        self.u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
        let pad = (4 - s.len() % 4) % 4;
        self.buf.extend(std::iter::repeat_n(0u8, pad));
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Takes the bytes written so far, leaving the writer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}
