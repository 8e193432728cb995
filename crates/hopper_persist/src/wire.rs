//! Wire primitives
//!
//! Little-endian framing over `std::io`, matching the byte layout of the
//! save streams this crate decodes. Strings are UTF-8 with a 7-bit varint
//! length prefix (each byte carries 7 bits, high bit set on continuation).

use std::io::{Read, Write};
use thiserror::Error;

/// Longest string the format ever stores. A corrupt length prefix past
/// this fails before any buffer is allocated for it.
pub const MAX_STRING_LEN: u32 = 1 << 16;

/// Persistence errors
#[derive(Debug, Error)]
pub enum PersistError {
    /// Stream I/O error, including short reads.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// String field holds invalid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidString(#[from] std::string::FromUtf8Error),
    /// Unknown stack kind tag byte.
    #[error("unknown stack kind tag {0}")]
    UnknownTag(u8),
    /// Unknown permission mode byte.
    #[error("unknown permission value {0}")]
    UnknownPermissions(u8),
    /// Structurally invalid stream.
    #[error("corrupted stream: {0}")]
    Corrupted(&'static str),
}

/// Little-endian writer.
pub struct WireWriter<W> {
    inner: W,
}

impl<W: Write> WireWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), PersistError> {
        self.inner.write_all(&[value])?;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), PersistError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), PersistError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), PersistError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<(), PersistError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), PersistError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), PersistError> {
        self.write_u8(value as u8)
    }

    /// UTF-8 string with a 7-bit varint byte-length prefix.
    pub fn write_string(&mut self, value: &str) -> Result<(), PersistError> {
        let mut len = value.len() as u32;
        loop {
            if len < 0x80 {
                self.write_u8(len as u8)?;
                break;
            }
            self.write_u8((len as u8 & 0x7F) | 0x80)?;
            len >>= 7;
        }
        self.inner.write_all(value.as_bytes())?;
        Ok(())
    }
}

/// Little-endian reader.
pub struct WireReader<R> {
    inner: R,
}

impl<R: Read> WireReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn read_u8(&mut self) -> Result<u8, PersistError> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, PersistError> {
        let mut buf = [0u8; 2];
        self.inner.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_u32(&mut self) -> Result<u32, PersistError> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_i32(&mut self) -> Result<i32, PersistError> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    pub fn read_i64(&mut self) -> Result<i64, PersistError> {
        let mut buf = [0u8; 8];
        self.inner.read_exact(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    pub fn read_f32(&mut self) -> Result<f32, PersistError> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    pub fn read_bool(&mut self) -> Result<bool, PersistError> {
        Ok(self.read_u8()? != 0)
    }

    /// UTF-8 string with a 7-bit varint byte-length prefix.
    pub fn read_string(&mut self) -> Result<String, PersistError> {
        let mut len: u32 = 0;
        let mut shift = 0;
        loop {
            if shift > 28 {
                return Err(PersistError::Corrupted("string length prefix too long"));
            }
            let byte = self.read_u8()?;
            len |= ((byte & 0x7F) as u32) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        if len > MAX_STRING_LEN {
            return Err(PersistError::Corrupted("string length exceeds limit"));
        }
        let mut bytes = vec![0u8; len as usize];
        self.inner.read_exact(&mut bytes)?;
        Ok(String::from_utf8(bytes)?)
    }
}
