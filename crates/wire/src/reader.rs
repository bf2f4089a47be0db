//! # Overview
//!
//! Every decoder in this crate follows the same resumable contract,
//! captured by the [`Reader`] trait: feed it whatever bytes the host
//! delivered, learn whether it completed, and reset it for reuse. A reader
//! completes exactly once per use; partial state survives between feeds so
//! a value split across deliveries decodes identically to one arriving
//! whole.
//!
//! This module holds the trait together with the primitive readers that are
//! not variable-length integers: length-prefixed binary strings, fixed-width
//! little-endian POD values, and the password-complexity rule list.

use core::marker::PhantomData;
use std::borrow::Cow;
use std::mem;

use crate::cursor::Cursor;
use crate::error::WireError;
use crate::varuint::VarUIntReader;

/// Resumable decoder over a fragmented byte stream.
pub trait Reader {
    /// Consumes bytes from `data` until the reader completes or the
    /// delivery runs out. Returns whether the reader is now complete.
    ///
    /// Completion is monotonic: once a feed returned `true`, later feeds
    /// keep returning `true` without consuming bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] when the bytes violate the wire format; the
    /// reader must then be abandoned or reset.
    fn feed(&mut self, data: &mut Cursor<'_>) -> Result<bool, WireError>;

    /// Reports whether the accumulated value is complete.
    fn is_complete(&self) -> bool;

    /// Clears the accumulated value so the reader can be reused.
    fn reset(&mut self);
}

/// Resumable decoder for a VarUInt-length-prefixed byte string.
///
/// The accumulated bytes are kept verbatim; ClickHouse strings are not
/// required to be UTF-8, so text access is lossy by design.
#[derive(Clone, Debug, Default)]
pub struct StringReader {
    size: VarUIntReader,
    read: u64,
    value: Vec<u8>,
}

impl StringReader {
    /// Creates a reader that has not absorbed any bytes yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            size: VarUIntReader::new(),
            read: 0,
            value: Vec::new(),
        }
    }

    /// The accumulated bytes. Meaningful once the reader is complete.
    #[must_use]
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.value
    }

    /// The accumulated bytes as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }

    pub(crate) fn take_text(&mut self) -> String {
        match String::from_utf8(mem::take(&mut self.value)) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

impl Reader for StringReader {
    fn feed(&mut self, data: &mut Cursor<'_>) -> Result<bool, WireError> {
        if !self.size.is_complete() && !self.size.feed(data)? {
            return Ok(false);
        }

        let total = self.size.value();
        while self.read < total && data.has_remaining() {
            let chunk = data.chunk();
            let want = usize::try_from(total - self.read).unwrap_or(usize::MAX);
            let take = chunk.len().min(want);
            self.value.extend_from_slice(&chunk[..take]);
            data.advance(take);
            self.read += take as u64;
        }

        Ok(self.is_complete())
    }

    fn is_complete(&self) -> bool {
        self.size.is_complete() && self.read == self.size.value()
    }

    fn reset(&mut self) {
        self.size.reset();
        self.read = 0;
        self.value.clear();
    }
}

/// Fixed-width values this crate can reconstruct from little-endian bytes.
pub trait FromLeBytes: Copy + Default {
    /// Encoded width in bytes. At most eight.
    const WIDTH: usize;

    /// Reconstructs the value from exactly [`Self::WIDTH`] bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

impl FromLeBytes for u32 {
    const WIDTH: usize = 4;

    fn from_le_slice(bytes: &[u8]) -> Self {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl FromLeBytes for u64 {
    const WIDTH: usize = 8;

    fn from_le_slice(bytes: &[u8]) -> Self {
        u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
    }
}

/// Resumable decoder for a fixed-width little-endian POD value.
#[derive(Clone, Debug, Default)]
pub struct PodReader<T: FromLeBytes> {
    buf: [u8; 8],
    filled: usize,
    _value: PhantomData<T>,
}

impl<T: FromLeBytes> PodReader<T> {
    /// Creates a reader that has not absorbed any bytes yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; 8],
            filled: 0,
            _value: PhantomData,
        }
    }

    /// The decoded value. Meaningful once the reader is complete.
    #[must_use]
    pub fn value(&self) -> T {
        T::from_le_slice(&self.buf[..T::WIDTH])
    }
}

impl<T: FromLeBytes> Reader for PodReader<T> {
    fn feed(&mut self, data: &mut Cursor<'_>) -> Result<bool, WireError> {
        debug_assert!(T::WIDTH <= 8);
        while self.filled < T::WIDTH && data.has_remaining() {
            let chunk = data.chunk();
            let take = chunk.len().min(T::WIDTH - self.filled);
            self.buf[self.filled..self.filled + take].copy_from_slice(&chunk[..take]);
            data.advance(take);
            self.filled += take;
        }
        Ok(self.is_complete())
    }

    fn is_complete(&self) -> bool {
        self.filled == T::WIDTH
    }

    fn reset(&mut self) {
        self.buf = [0; 8];
        self.filled = 0;
    }
}

/// One entry of the server-announced password complexity rule set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComplexityRule {
    /// Pattern the server validates new passwords against.
    pub original_pattern: String,
    /// Message returned when a password violates the pattern.
    pub exception_message: String,
}

/// Resumable decoder for the password complexity rule list: a VarUInt count
/// followed by that many pattern/message string pairs.
#[derive(Clone, Debug, Default)]
pub struct RulesReader {
    count: VarUIntReader,
    pattern: StringReader,
    message: StringReader,
    rules: Vec<ComplexityRule>,
}

impl RulesReader {
    /// Creates a reader that has not absorbed any bytes yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: VarUIntReader::new(),
            pattern: StringReader::new(),
            message: StringReader::new(),
            rules: Vec::new(),
        }
    }

    /// The decoded rules. Meaningful once the reader is complete.
    #[must_use]
    #[inline]
    pub fn rules(&self) -> &[ComplexityRule] {
        &self.rules
    }
}

impl Reader for RulesReader {
    fn feed(&mut self, data: &mut Cursor<'_>) -> Result<bool, WireError> {
        if !self.count.is_complete() && !self.count.feed(data)? {
            return Ok(false);
        }

        while (self.rules.len() as u64) < self.count.value() {
            if !self.pattern.is_complete() && !self.pattern.feed(data)? {
                return Ok(false);
            }
            if !self.message.is_complete() && !self.message.feed(data)? {
                return Ok(false);
            }
            self.rules.push(ComplexityRule {
                original_pattern: self.pattern.take_text(),
                exception_message: self.message.take_text(),
            });
            self.pattern.reset();
            self.message.reset();
        }

        Ok(true)
    }

    fn is_complete(&self) -> bool {
        self.count.is_complete() && self.rules.len() as u64 == self.count.value()
    }

    fn reset(&mut self) {
        self.count.reset();
        self.pattern.reset();
        self.message.reset();
        self.rules.clear();
    }
}
