//! The full DNS message: header + question(s) + resource record sections,
//! and the request/response envelopes the query engine exchanges with a
//! server.
use std::net::SocketAddr;
use std::time::Instant;

use byteorder::WriteBytesExt;

use crate::error::DNSResult;
use crate::network_order::WireCursor;
use crate::rdata::RData;
use crate::rfc1035::{DomainName, Flags, Header, QClass, QType, Question};

/// A single resource record, as it appears in the answer, authority or
/// additional sections of a message (RFC1035 §4.1.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub rtype: QType,
    pub rclass: QClass,
    pub ttl: u32,
    pub rdlength: u16,
    pub rdata: RData,
}

impl ResourceRecord {
    fn decode(cursor: &mut WireCursor) -> DNSResult<Self> {
        let name = DomainName::from_network_bytes(cursor)?;
        let rtype = QType::from_code(cursor.read_u16()?);
        let rclass = QClass::from_code(cursor.read_u16()?);
        let ttl = cursor.read_u32()?;
        let rdlength = cursor.read_u16()?;
        let rdata = RData::decode(rtype, cursor, rdlength)?;
        Ok(ResourceRecord {
            name,
            rtype,
            rclass,
            ttl,
            rdlength,
            rdata,
        })
    }
}

impl std::fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name, self.ttl, self.rclass, self.rtype, self.rdata
        )
    }
}

/// An outgoing query: a header plus one or more questions (the engine in
/// `crate::resolver` only ever sends a single question, matching every
/// server's behavior in practice, but the wire format and this encoder both
/// allow more).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub header: Header,
    pub questions: Vec<Question>,
}

impl Request {
    pub fn new(id: u16, question: Question, recursion_desired: bool) -> Self {
        let header = Header {
            id,
            flags: Flags {
                rd: recursion_desired,
                ..Flags::default()
            },
            qdcount: 1,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        };
        Request {
            header,
            questions: vec![question],
        }
    }

    pub fn to_network_bytes(&self) -> DNSResult<Vec<u8>> {
        let mut buf = Vec::new();
        buf.write_u16::<byteorder::BigEndian>(self.header.id)?;
        buf.write_u16::<byteorder::BigEndian>(self.header.flags.to_u16())?;
        buf.write_u16::<byteorder::BigEndian>(self.questions.len() as u16)?;
        buf.write_u16::<byteorder::BigEndian>(0)?; // ancount
        buf.write_u16::<byteorder::BigEndian>(0)?; // nscount
        buf.write_u16::<byteorder::BigEndian>(0)?; // arcount

        for question in &self.questions {
            question.qname.to_network_bytes(&mut buf)?;
            buf.write_u16::<byteorder::BigEndian>(question.qtype.code())?;
            buf.write_u16::<byteorder::BigEndian>(question.qclass.code())?;
        }

        Ok(buf)
    }
}

/// The result of sending a `Request` to one server and reading back a reply.
///
/// Decoding never fails outward: a malformed or truncated reply is captured
/// as `error` rather than propagated as a `Result`, because a caller
/// retrying across servers (`crate::resolver`) wants one response shape to
/// inspect regardless of which server misbehaved.
#[derive(Debug, Clone)]
pub struct Response {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
    pub server: SocketAddr,
    pub captured_at: Instant,
    pub size: usize,
    pub error: Option<String>,
}

impl Response {
    /// Build a failure `Response` for a query that never produced a reply
    /// to decode (configuration error, exhausted retries, timeout). Carries
    /// no server address since none may have been reachable; used by
    /// `crate::resolver::Resolver` at every point it would otherwise need
    /// to return a `Result`.
    pub fn failed(error: String) -> Self {
        Response {
            header: Header::default(),
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
            server: "0.0.0.0:0".parse().expect("static socket addr"),
            captured_at: Instant::now(),
            size: 0,
            error: Some(error),
        }
    }

    /// Decode a full message read from `server`. Always returns a `Response`;
    /// a decode failure is recorded in `error` with an otherwise-empty
    /// message (default header, no records).
    pub fn decode(bytes: &[u8], server: SocketAddr, captured_at: Instant) -> Self {
        match Self::try_decode(bytes) {
            Ok((header, questions, answers, authorities, additionals)) => Response {
                header,
                questions,
                answers,
                authorities,
                additionals,
                server,
                captured_at,
                size: bytes.len(),
                error: None,
            },
            Err(e) => Response {
                header: Header::default(),
                questions: Vec::new(),
                answers: Vec::new(),
                authorities: Vec::new(),
                additionals: Vec::new(),
                server,
                captured_at,
                size: bytes.len(),
                error: Some(e.to_string()),
            },
        }
    }

    #[allow(clippy::type_complexity)]
    fn try_decode(
        bytes: &[u8],
    ) -> DNSResult<(
        Header,
        Vec<Question>,
        Vec<ResourceRecord>,
        Vec<ResourceRecord>,
        Vec<ResourceRecord>,
    )> {
        let mut cursor = WireCursor::new(bytes);

        let id = cursor.read_u16()?;
        let flags = Flags::from_u16(cursor.read_u16()?);
        let qdcount = cursor.read_u16()?;
        let ancount = cursor.read_u16()?;
        let nscount = cursor.read_u16()?;
        let arcount = cursor.read_u16()?;
        let header = Header {
            id,
            flags,
            qdcount,
            ancount,
            nscount,
            arcount,
        };

        let mut questions = Vec::with_capacity(qdcount as usize);
        for _ in 0..qdcount {
            let qname = DomainName::from_network_bytes(&mut cursor)?;
            let qtype = QType::from_code(cursor.read_u16()?);
            let qclass = QClass::from_code(cursor.read_u16()?);
            questions.push(Question {
                qname,
                qtype,
                qclass,
            });
        }

        let answers = Self::decode_records(&mut cursor, ancount)?;
        let authorities = Self::decode_records(&mut cursor, nscount)?;
        let additionals = Self::decode_records(&mut cursor, arcount)?;

        Ok((header, questions, answers, authorities, additionals))
    }

    fn decode_records(cursor: &mut WireCursor, count: u16) -> DNSResult<Vec<ResourceRecord>> {
        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            records.push(ResourceRecord::decode(cursor)?);
        }
        Ok(records)
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.header.flags.rcode == crate::rfc1035::ResponseCode::NoError
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(e) = &self.error {
            return write!(f, "error decoding response from {}: {}", self.server, e);
        }
        writeln!(
            f,
            ";; rcode:{} answers:{} authorities:{} additionals:{}",
            self.header.flags.rcode,
            self.answers.len(),
            self.authorities.len(),
            self.additionals.len()
        )?;
        for rr in &self.answers {
            writeln!(f, "{}", rr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc1035::OpCode;

    fn minimal_a_query_bytes() -> Vec<u8> {
        let question = Question::new("example.com", QType::A, Some(QClass::IN)).unwrap();
        Request::new(0x1234, question, true)
            .to_network_bytes()
            .unwrap()
    }

    #[test]
    fn request_encodes_header_and_question() {
        let bytes = minimal_a_query_bytes();
        assert_eq!(bytes[0], 0x12);
        assert_eq!(bytes[1], 0x34);
        // qdcount == 1
        assert_eq!(bytes[4], 0x00);
        assert_eq!(bytes[5], 0x01);
    }

    #[test]
    fn response_decode_never_panics_on_garbage() {
        let response = Response::decode(&[0xff; 3], "127.0.0.1:53".parse().unwrap(), Instant::now());
        assert!(response.error.is_some());
        assert!(!response.is_success());
    }

    #[test]
    fn response_decode_round_trips_a_record() {
        // handcrafted minimal reply: one question, one A answer, no
        // compression, matching the request built above.
        let mut buf = vec![
            0x12, 0x34, // id
            0x81, 0x80, // flags: qr=1, rd=1, ra=1, rcode=0
            0x00, 0x01, // qdcount
            0x00, 0x01, // ancount
            0x00, 0x00, // nscount
            0x00, 0x00, // arcount
        ];
        // question: example.com A IN
        buf.extend_from_slice(&[7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0]);
        buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        // answer: pointer back to qname at offset 12, A, IN, ttl, rdlength 4, addr
        buf.extend_from_slice(&[0xc0, 0x0c]);
        buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        buf.extend_from_slice(&[0x00, 0x00, 0x00, 0x3c]);
        buf.extend_from_slice(&[0x00, 0x04]);
        buf.extend_from_slice(&[93, 184, 216, 34]);

        let response = Response::decode(&buf, "127.0.0.1:53".parse().unwrap(), Instant::now());
        assert!(response.error.is_none(), "decode failed: {:?}", response.error);
        assert!(response.is_success());
        assert_eq!(response.header.flags.opcode, OpCode::Query);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].name.to_string(), "example.com.");
        assert_eq!(response.answers[0].ttl, 60);
    }
}
