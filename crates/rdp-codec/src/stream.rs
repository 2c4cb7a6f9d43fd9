//! Cursor-based byte stream
//!
//! A single buffer serves both directions: reads consume from the cursor,
//! writes append at the end. Decoding never looks back, so a stream handed
//! out by [`ByteStream::sub_stream`] is an independent copy of the range it
//! covers.

use crate::{CodecError, CodecResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// In-memory byte buffer with a read cursor
#[derive(Debug, Clone, Default)]
pub struct ByteStream {
    buf: BytesMut,
    offset: usize,
}

impl ByteStream {
    /// Create an empty stream for encoding
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            offset: 0,
        }
    }

    /// Current read position
    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left to read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Total bytes held, read or not
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn ensure(&self, needed: usize) -> CodecResult<()> {
        if self.remaining() < needed {
            return Err(CodecError::Underrun {
                needed,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read the next `n` bytes and advance the cursor
    pub fn read(&mut self, n: usize) -> CodecResult<Bytes> {
        self.ensure(n)?;
        let bytes = Bytes::copy_from_slice(&self.buf[self.offset..self.offset + n]);
        self.offset += n;
        Ok(bytes)
    }

    /// Advance the cursor without copying
    pub fn skip(&mut self, n: usize) -> CodecResult<()> {
        self.ensure(n)?;
        self.offset += n;
        Ok(())
    }

    /// Extract the next `n` bytes as a stream of their own
    pub fn sub_stream(&mut self, n: usize) -> CodecResult<ByteStream> {
        Ok(ByteStream::from(self.read(n)?))
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        self.ensure(1)?;
        let value = self.buf[self.offset];
        self.offset += 1;
        Ok(value)
    }

    pub fn read_u16_le(&mut self) -> CodecResult<u16> {
        self.ensure(2)?;
        let value = (&self.buf[self.offset..]).get_u16_le();
        self.offset += 2;
        Ok(value)
    }

    pub fn read_u32_le(&mut self) -> CodecResult<u32> {
        self.ensure(4)?;
        let value = (&self.buf[self.offset..]).get_u32_le();
        self.offset += 4;
        Ok(value)
    }

    /// Append raw bytes
    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn write_zeros(&mut self, n: usize) {
        self.buf.put_bytes(0, n);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_u16_le(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    /// Whole buffer, including already-read bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl From<Bytes> for ByteStream {
    fn from(bytes: Bytes) -> Self {
        Self {
            buf: BytesMut::from(&bytes[..]),
            offset: 0,
        }
    }
}

impl From<&[u8]> for ByteStream {
    fn from(bytes: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(bytes),
            offset: 0,
        }
    }
}

impl From<Vec<u8>> for ByteStream {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            buf: BytesMut::from(&bytes[..]),
            offset: 0,
        }
    }
}
