//! The wire cursor: reads big-endian integers, length-prefixed character
//! strings and raw byte runs out of a DNS message buffer.
//!
//! Reads past the end of the buffer are either rejected (`FormatError`, the
//! default) or silently zero-filled when the cursor is built in lenient mode
//! -- kept only for bug-compatibility with servers that send truncated UDP
//! replies. See `WireCursor::lenient`.
use byteorder::{BigEndian, ByteOrder};

use crate::error::{DNSError, DNSResult};

/// A read-only cursor over a DNS message.
///
/// Unlike `std::io::Cursor`, out-of-range reads do not automatically turn
/// into an `UnexpectedEof` error: the behavior is chosen at construction
/// time through `strict`.
#[derive(Debug, Clone, Copy)]
pub struct WireCursor<'a> {
    buffer: &'a [u8],
    pos: usize,
    strict: bool,
}

impl<'a> WireCursor<'a> {
    /// Strict cursor: any out-of-range read is a `FormatError`.
    pub fn new(buffer: &'a [u8]) -> Self {
        WireCursor {
            buffer,
            pos: 0,
            strict: true,
        }
    }

    /// Lenient cursor: out-of-range reads are zero-filled and the cursor
    /// still advances. Preserved from the source for bug-compatibility; not
    /// used by the query engine by default.
    pub fn lenient(buffer: &'a [u8]) -> Self {
        WireCursor {
            buffer,
            pos: 0,
            strict: false,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.pos)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Move the cursor to an absolute offset. Used by RDATA variants to
    /// re-read the preceding rdlength, and by the name decoder to follow a
    /// compression pointer.
    pub fn seek_to(&mut self, pos: usize) -> DNSResult<()> {
        if pos > self.buffer.len() && self.strict {
            return Err(DNSError::Format(format!(
                "seek to {} past end of {}-byte buffer",
                pos,
                self.buffer.len()
            )));
        }
        self.pos = pos;
        Ok(())
    }

    /// Move the cursor relative to its current position.
    pub fn seek_relative(&mut self, delta: i64) -> DNSResult<()> {
        let target = self.pos as i64 + delta;
        if target < 0 {
            return Err(DNSError::Format("seek before start of buffer".into()));
        }
        self.seek_to(target as usize)
    }

    fn take(&mut self, n: usize) -> DNSResult<&'a [u8]> {
        if self.pos + n > self.buffer.len() {
            if self.strict {
                return Err(DNSError::Format(format!(
                    "read of {} bytes at offset {} exceeds {}-byte buffer",
                    n,
                    self.pos,
                    self.buffer.len()
                )));
            }
            // lenient: advance past the end anyway, caller gets zero bytes
            self.pos += n;
            return Ok(&[]);
        }
        let slice = &self.buffer[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> DNSResult<u8> {
        let slice = self.take(1)?;
        Ok(slice.first().copied().unwrap_or(0))
    }

    pub fn read_u16(&mut self) -> DNSResult<u16> {
        let slice = self.take(2)?;
        if slice.len() < 2 {
            return Ok(0);
        }
        Ok(BigEndian::read_u16(slice))
    }

    pub fn read_u32(&mut self) -> DNSResult<u32> {
        let slice = self.take(4)?;
        if slice.len() < 4 {
            return Ok(0);
        }
        Ok(BigEndian::read_u32(slice))
    }

    /// Read `n` raw bytes, returning an owned copy.
    pub fn read_bytes(&mut self, n: usize) -> DNSResult<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    /// Read a `<character-string>`: one length octet, then that many raw
    /// bytes, interpreted as 8-bit characters (not necessarily valid UTF-8 in
    /// the wild, but every teacher fixture and every RFC example is ASCII).
    pub fn read_character_string(&mut self) -> DNSResult<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    pub fn peek_u8(&self) -> DNSResult<u8> {
        if self.pos >= self.buffer.len() {
            if self.strict {
                return Err(DNSError::Format("peek past end of buffer".into()));
            }
            return Ok(0);
        }
        Ok(self.buffer[self.pos])
    }
}

/// True when the top two bits of a label-length octet mark a compression
/// pointer (RFC1035 §4.1.4): `11xxxxxx`.
pub fn is_pointer(b: u8) -> bool {
    b & 0b1100_0000 == 0b1100_0000
}

/// The maximum number of pointer hops followed while expanding a single
/// domain name. Bounds the otherwise-unbounded recursion the original
/// implementation allowed (see Design Notes: pointer loops).
pub const MAX_POINTER_HOPS: usize = 255;

/// The maximum expanded length of a domain name, in octets, including label
/// length bytes (RFC1035 §3.1).
pub const MAX_NAME_LENGTH: usize = 255;

pub fn label_too_long(len: usize) -> DNSError {
    DNSError::Format(format!("label of {} octets exceeds the 63-octet maximum", len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_integers() {
        let buf = [0x12, 0x34, 0x56, 0x78];
        let mut c = WireCursor::new(&buf);
        assert_eq!(c.read_u16().unwrap(), 0x1234);
        assert_eq!(c.read_u16().unwrap(), 0x5678);
        assert_eq!(c.position(), 4);
    }

    #[test]
    fn read_u32_reassembles_four_octets() {
        let buf = [0x01, 0x02, 0x03, 0x04];
        let mut c = WireCursor::new(&buf);
        assert_eq!(c.read_u32().unwrap(), 0x01020304);
    }

    #[test]
    fn strict_cursor_rejects_short_reads() {
        let buf = [0x00];
        let mut c = WireCursor::new(&buf);
        assert!(c.read_u32().is_err());
    }

    #[test]
    fn lenient_cursor_zero_fills_and_advances() {
        let buf = [0x00];
        let mut c = WireCursor::lenient(&buf);
        assert_eq!(c.read_u32().unwrap(), 0);
        assert_eq!(c.position(), 4);
    }

    #[test]
    fn character_string_reads_length_prefixed_bytes() {
        let buf = [0x05, b'h', b'e', b'l', b'l', b'o'];
        let mut c = WireCursor::new(&buf);
        assert_eq!(c.read_character_string().unwrap(), "hello");
    }

    #[test]
    fn pointer_bit_detection() {
        assert!(is_pointer(0xc0));
        assert!(is_pointer(0xff));
        assert!(!is_pointer(0x3f));
        assert!(!is_pointer(0x00));
    }
}
