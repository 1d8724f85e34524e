//! Little-endian byte codec shared by the index file and the engine state blob.
//!
//! Every variable-length field is written as a `u64` length followed by the
//! payload. The reader checks each length against the bytes actually left
//! before allocating anything.

use super::error::{PersistenceError, PersistenceResult};

/// Append-only encoder
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_len(&mut self, len: usize) {
        self.put_u64(len as u64);
    }

    /// Length-prefixed byte string
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_len(bytes.len());
        self.put_raw(bytes);
    }

    pub fn put_str(&mut self, value: &str) {
        self.put_bytes(value.as_bytes());
    }

    /// Length-prefixed f32 array
    pub fn put_f32_slice(&mut self, values: &[f32]) {
        self.put_len(values.len());
        for &value in values {
            self.put_f32(value);
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked decoder over a borrowed buffer
#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, n: usize) -> PersistenceResult<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(PersistenceError::Truncated {
                needed: n,
                remaining,
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> PersistenceResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u32(&mut self) -> PersistenceResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn u64(&mut self) -> PersistenceResult<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> PersistenceResult<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn f32(&mut self) -> PersistenceResult<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    /// Consume `magic` or fail with [`PersistenceError::BadMagic`].
    pub fn expect_magic(&mut self, magic: &[u8; 4]) -> PersistenceResult<()> {
        let found = self.take(magic.len())?;
        if found != magic {
            return Err(PersistenceError::BadMagic {
                expected: String::from_utf8_lossy(magic).into_owned(),
                found: String::from_utf8_lossy(found).into_owned(),
            });
        }
        Ok(())
    }

    /// Consume a version word and compare it with `expected`.
    pub fn expect_version(&mut self, expected: u32) -> PersistenceResult<()> {
        let actual = self.u32()?;
        if actual != expected {
            return Err(PersistenceError::VersionMismatch { expected, actual });
        }
        Ok(())
    }

    /// Read a count of items that each occupy at least `min_item_bytes`,
    /// rejecting counts the remaining data cannot possibly hold.
    pub fn count(
        &mut self,
        field: &'static str,
        min_item_bytes: usize,
    ) -> PersistenceResult<usize> {
        let length = self.u64()?;
        let remaining = self.remaining();
        let fits = usize::try_from(length)
            .ok()
            .and_then(|n| n.checked_mul(min_item_bytes.max(1)))
            .is_some_and(|bytes| bytes <= remaining);
        if !fits {
            return Err(PersistenceError::LengthOutOfRange {
                field,
                length,
                remaining,
            });
        }
        // fits implies the conversion succeeded
        Ok(length as usize)
    }

    pub fn bytes(&mut self, field: &'static str) -> PersistenceResult<&'a [u8]> {
        let len = self.count(field, 1)?;
        self.take(len)
    }

    pub fn string(&mut self, field: &'static str) -> PersistenceResult<String> {
        let bytes = self.bytes(field)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| PersistenceError::InvalidUtf8 { field })
    }

    pub fn f32_vec(&mut self, field: &'static str) -> PersistenceResult<Vec<f32>> {
        let len = self.count(field, size_of::<f32>())?;
        (0..len).map(|_| self.f32()).collect()
    }
}
