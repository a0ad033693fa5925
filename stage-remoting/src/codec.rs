//! Big-endian byte writer and reader.
//!
//! Integers and floats are four bytes each; booleans are one byte.

use crate::error::{RemotingError, RemotingResult};

/// Append-only output buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireWriter {
    out: Vec<u8>,
}

impl WireWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// The written bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    /// Write a 32-bit signed integer.
    #[inline]
    pub fn write_int(&mut self, value: i32) {
        self.out.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a 32-bit float.
    #[inline]
    pub fn write_float(&mut self, value: f32) {
        self.out.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a one-byte boolean.
    #[inline]
    pub fn write_boolean(&mut self, value: bool) {
        self.out.push(u8::from(value));
    }

    /// Write a length as an integer, saturating at `i32::MAX`.
    #[inline]
    pub fn write_count(&mut self, count: usize) {
        self.write_int(i32::try_from(count).unwrap_or(i32::MAX));
    }

    /// Take the written bytes, leaving the writer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }

    /// Consume the writer.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

/// Cursor over an input buffer.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Start reading at the beginning of `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Whether every byte has been read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take<const N: usize>(&mut self) -> RemotingResult<[u8; N]> {
        let end = self.pos + N;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or(RemotingError::UnexpectedEof {
                needed: N,
                remaining: self.remaining(),
            })?;
        let mut out = [0; N];
        out.copy_from_slice(bytes);
        self.pos = end;
        Ok(out)
    }

    /// Read a 32-bit signed integer.
    ///
    /// # Errors
    ///
    /// Returns [`RemotingError::UnexpectedEof`] if fewer than four bytes remain.
    pub fn read_int(&mut self) -> RemotingResult<i32> {
        self.take::<4>().map(i32::from_be_bytes)
    }

    /// Read a 32-bit float.
    ///
    /// # Errors
    ///
    /// Returns [`RemotingError::UnexpectedEof`] if fewer than four bytes remain.
    pub fn read_float(&mut self) -> RemotingResult<f32> {
        self.take::<4>().map(f32::from_be_bytes)
    }

    /// Read a one-byte boolean; any nonzero byte is true.
    ///
    /// # Errors
    ///
    /// Returns [`RemotingError::UnexpectedEof`] at the end of the buffer.
    pub fn read_boolean(&mut self) -> RemotingResult<bool> {
        self.take::<1>().map(|[b]| b != 0)
    }

    /// Read a non-negative count.
    ///
    /// # Errors
    ///
    /// Fails at the end of the buffer or on a negative value.
    pub fn read_count(&mut self) -> RemotingResult<usize> {
        let value = self.read_int()?;
        usize::try_from(value).map_err(|_| RemotingError::NegativeCount(value))
    }
}
