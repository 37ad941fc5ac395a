//! Domain name wire codec: label sequences, the root name and compression
//! pointers (RFC1035 §4.1.4).
use byteorder::WriteBytesExt;

use crate::error::{DNSError, DNSResult};
use crate::network_order::primitive::{
    is_pointer, label_too_long, WireCursor, MAX_NAME_LENGTH, MAX_POINTER_HOPS,
};
use crate::rfc1035::DomainName;

impl DomainName {
    /// Encode the name as a sequence of length-prefixed labels terminated by
    /// the root label. Requests never emit compressed names (§4.3): case is
    /// preserved exactly as given.
    pub fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> DNSResult<usize> {
        let mut length = 0usize;

        for label in &self.0 {
            let bytes = label.as_bytes();
            if bytes.len() > 63 {
                return Err(label_too_long(bytes.len()));
            }
            buffer.write_u8(bytes.len() as u8)?;
            buffer.extend_from_slice(bytes);
            length += bytes.len() + 1;
        }

        buffer.write_u8(0)?;
        Ok(length + 1)
    }

    /// Decode a name starting at the cursor's current position, following at
    /// most one level of compression pointer per call site (the pointer
    /// chain itself is bounded below). Returns the expanded name; the
    /// cursor is left just past the terminating root label or, if a pointer
    /// was the very first byte, just past the two-byte pointer.
    pub fn from_network_bytes(cursor: &mut WireCursor) -> DNSResult<Self> {
        let mut labels: Vec<String> = Vec::new();
        let mut hops = 0usize;
        let mut expanded_len = 0usize;

        // the cursor only ever needs to advance past the *first* occurrence
        // of either a zero label or a pointer: once we jump, we continue
        // reading from a cursor seeded at the pointer target, and the
        // caller-visible cursor has already stopped advancing.
        let mut jumped = false;
        let mut resume_at: Option<usize> = None;

        loop {
            let b = cursor.peek_u8()?;

            if b == 0 {
                cursor.read_u8()?;
                break;
            }

            if is_pointer(b) {
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(DNSError::Format(
                        "domain name exceeds the maximum number of compression pointer hops"
                            .into(),
                    ));
                }

                let hi = cursor.read_u8()?;
                let lo = cursor.read_u8()?;
                let offset = (((hi & 0x3f) as usize) << 8) | lo as usize;

                if !jumped {
                    // the outer cursor stops right after the two pointer
                    // octets: record that position so we can restore it
                    // once the jump chain is done expanding the name.
                    resume_at = Some(cursor.position());
                }
                jumped = true;

                if offset >= cursor.buffer().len() {
                    return Err(DNSError::Format(format!(
                        "compression pointer offset {} out of range",
                        offset
                    )));
                }
                cursor.seek_to(offset)?;
                continue;
            }

            // regular label: one length octet followed by that many bytes
            let len = b as usize;
            if len > 63 {
                return Err(label_too_long(len));
            }
            cursor.read_u8()?;
            let bytes = cursor.read_bytes(len)?;
            let label = std::str::from_utf8(&bytes)?.to_string();

            expanded_len += len + 1;
            if expanded_len > MAX_NAME_LENGTH {
                return Err(DNSError::Format(format!(
                    "domain name exceeds the {}-octet maximum",
                    MAX_NAME_LENGTH
                )));
            }

            labels.push(label);
        }

        if let Some(pos) = resume_at {
            cursor.seek_to(pos)?;
        }

        Ok(DomainName(labels))
    }

    /// Decode a name at an absolute offset without disturbing `cursor`'s own
    /// position; used by RDATA fields (e.g. SOA's mname/rname) that embed a
    /// name which may point earlier into the whole message.
    pub fn from_network_bytes_at(cursor: &WireCursor, offset: usize) -> DNSResult<(Self, usize)> {
        let mut sub = *cursor;
        sub.seek_to(offset)?;
        let name = Self::from_network_bytes(&mut sub)?;
        Ok((name, sub.position()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        // "www.google.ie"
        vec![
            0x03, b'w', b'w', b'w', 0x06, b'g', b'o', b'o', b'g', b'l', b'e', 0x02, b'i', b'e',
            0x00,
        ]
    }

    #[test]
    fn encode_decode_round_trip() {
        let name = DomainName::try_from("www.google.ie").unwrap();
        let mut buf = Vec::new();
        let n = name.to_network_bytes(&mut buf).unwrap();
        assert_eq!(n, 15);
        assert_eq!(buf, sample());

        let mut cursor = WireCursor::new(&buf);
        let decoded = DomainName::from_network_bytes(&mut cursor).unwrap();
        assert_eq!(decoded.to_string(), "www.google.ie.");
    }

    #[test]
    fn decompression_across_two_labels() {
        // offset 12: "foo" then a pointer to offset 18, where "bar" lives
        let mut buf = vec![0u8; 12];
        buf.extend_from_slice(&[0x03, b'f', b'o', b'o', 0xc0, 18]);
        buf.extend_from_slice(&[0x03, b'b', b'a', b'r', 0x00]);

        let mut cursor = WireCursor::new(&buf);
        cursor.seek_to(12).unwrap();
        let name = DomainName::from_network_bytes(&mut cursor).unwrap();
        assert_eq!(name.to_string(), "foo.bar.");
        assert_eq!(cursor.position(), 18);
    }

    #[test]
    fn root_name_renders_as_dot() {
        let buf = [0x00];
        let mut cursor = WireCursor::new(&buf);
        let name = DomainName::from_network_bytes(&mut cursor).unwrap();
        assert_eq!(name.to_string(), ".");
    }

    #[test]
    fn pointer_loop_is_rejected() {
        // offset 0 points to itself
        let buf = [0xc0, 0x00];
        let mut cursor = WireCursor::new(&buf);
        assert!(DomainName::from_network_bytes(&mut cursor).is_err());
    }

    #[test]
    fn pointer_out_of_range_is_rejected() {
        let buf = [0xc0, 0xff];
        let mut cursor = WireCursor::new(&buf);
        assert!(DomainName::from_network_bytes(&mut cursor).is_err());
    }
}
