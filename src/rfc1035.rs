//! Base structures for DNS messages, taken from
//! <https://datatracker.ietf.org/doc/html/rfc1035>, plus the handful of
//! later RFCs needed to round out the type and class code-points (RFC3596
//! AAAA, RFC2782 SRV, RFC4034 DNSSEC types, ...).
use crate::code_enum;
use crate::error::{DNSError, DNSResult, InternalError};

// DNS packet header: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub id: u16, // a 16 bit identifier assigned by the program that generates
    // any kind of query, copied into the reply so the requester can match
    // replies to outstanding queries.
    pub flags: Flags,
    pub qdcount: u16, // number of entries in the question section
    pub ancount: u16, // number of RRs in the answer section
    pub nscount: u16, // number of RRs in the authority records section
    pub arcount: u16, // number of RRs in the additional records section
}

// Flags: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub qr: bool,        // 0 = query, 1 = response
    pub opcode: OpCode,  // kind of query
    pub aa: bool,        // Authoritative Answer
    pub tc: bool,        // TrunCation
    pub rd: bool,        // Recursion Desired
    pub ra: bool,        // Recursion Available
    pub z: u8,           // reserved, must be zero on the wire (3 bits)
    pub rcode: ResponseCode,
}

impl Default for Flags {
    fn default() -> Self {
        Flags {
            qr: false,
            opcode: OpCode::Query,
            aa: false,
            tc: false,
            rd: false,
            ra: false,
            z: 0,
            rcode: ResponseCode::NoError,
        }
    }
}

impl Flags {
    pub fn to_u16(self) -> u16 {
        ((self.qr as u16) << 15)
            | ((self.opcode.code() as u16 & 0b1111) << 11)
            | ((self.aa as u16) << 10)
            | ((self.tc as u16) << 9)
            | ((self.rd as u16) << 8)
            | ((self.ra as u16) << 7)
            | ((self.z as u16 & 0b111) << 4)
            | (self.rcode.code() as u16 & 0b1111)
    }

    pub fn from_u16(value: u16) -> Self {
        Flags {
            qr: (value >> 15) & 1 != 0,
            opcode: OpCode::from_code(((value >> 11) & 0b1111) as u8),
            aa: (value >> 10) & 1 != 0,
            tc: (value >> 9) & 1 != 0,
            rd: (value >> 8) & 1 != 0,
            ra: (value >> 7) & 1 != 0,
            z: ((value >> 4) & 0b111) as u8,
            rcode: ResponseCode::from_code((value & 0b1111) as u8),
        }
    }
}

// op codes: https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-5
code_enum!(OpCode: u8 {
    Query = 0,
    IQuery = 1,
    Status = 2,
    Notify = 4,
    Update = 5,
    Dso = 6,
});

impl Default for OpCode {
    fn default() -> Self {
        OpCode::Query
    }
}

// response codes: https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-6
code_enum!(ResponseCode: u8 {
    NoError = 0,
    FormErr = 1,
    ServFail = 2,
    NXDomain = 3,
    NotImp = 4,
    Refused = 5,
    YXDomain = 6,
    YXRRSet = 7,
    NXRRSet = 8,
    NotAuth = 9,
    NotZone = 10,
    DsoTypeNi = 11,
});

impl Default for ResponseCode {
    fn default() -> Self {
        ResponseCode::NoError
    }
}

// RR type codes: https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4
code_enum!(QType: u16 {
    A = 1,
    NS = 2,
    MD = 3,
    MF = 4,
    CNAME = 5,
    SOA = 6,
    MB = 7,
    MG = 8,
    MR = 9,
    NULL = 10,
    WKS = 11,
    PTR = 12,
    HINFO = 13,
    MINFO = 14,
    MX = 15,
    TXT = 16,
    RP = 17,
    AFSDB = 18,
    X25 = 19,
    ISDN = 20,
    RT = 21,
    NSAP = 22,
    NSAPPTR = 23,
    SIG = 24,
    KEY = 25,
    PX = 26,
    GPOS = 27,
    AAAA = 28,
    LOC = 29,
    NXT = 30,
    EID = 31,
    NIMLOC = 32,
    SRV = 33,
    ATMA = 34,
    NAPTR = 35,
    KX = 36,
    CERT = 37,
    A6 = 38,
    DNAME = 39,
    SINK = 40,
    OPT = 41,
    APL = 42,
    DS = 43,
    SSHFP = 44,
    IPSECKEY = 45,
    RRSIG = 46,
    NSEC = 47,
    DNSKEY = 48,
    DHCID = 49,
    NSEC3 = 50,
    NSEC3PARAM = 51,
    TLSA = 52,
    SMIMEA = 53,
    HIP = 55,
    NINFO = 56,
    RKEY = 57,
    TALINK = 58,
    CDS = 59,
    CDNSKEY = 60,
    OPENPGPKEY = 61,
    CSYNC = 62,
    ZONEMD = 63,
    SVCB = 64,
    HTTPS = 65,
    SPF = 99,
    TKEY = 249,
    TSIG = 250,
    IXFR = 251,
    AXFR = 252,
    MAILB = 253,
    MAILA = 254,
    ANY = 255,
    URI = 256,
    CAA = 257,
    AVC = 258,
    DOA = 259,
    AMTRELAY = 260,
    TA = 32768,
    DLV = 32769,
});

// RR Class values: https://datatracker.ietf.org/doc/html/rfc1035#section-3.2.4
code_enum!(QClass: u16 {
    IN = 1, // the Internet
    CS = 2, // the CSNET class (obsolete)
    CH = 3, // the CHAOS class
    HS = 4, // Hesiod
    ANY = 255,
});

impl Default for QClass {
    fn default() -> Self {
        QClass::IN
    }
}

// Domain name: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4
//
// Stored as a plain sequence of labels (the root's zero-length label is
// implicit, not a member of the vector). Comparisons are case-insensitive
// (`DomainName::eq_ignore_case`/`canonical`); on-wire emission preserves
// whatever case the caller supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DomainName(pub Vec<String>);

impl DomainName {
    pub fn root() -> Self {
        DomainName(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// A lowercase, dot-joined rendering used as the cache key and for
    /// case-insensitive equality checks.
    pub fn canonical(&self) -> String {
        let mut s = self
            .0
            .iter()
            .map(|l| l.to_lowercase())
            .collect::<Vec<_>>()
            .join(".");
        s.push('.');
        s
    }

    pub fn eq_ignore_case(&self, other: &DomainName) -> bool {
        self.canonical() == other.canonical()
    }
}

/// ```
/// use dnslib::rfc1035::DomainName;
///
/// let dn = DomainName::try_from("www.google.com").unwrap();
/// assert_eq!(dn.to_string(), "www.google.com.");
///
/// let dn = DomainName::try_from("www.google.ie.").unwrap();
/// assert_eq!(dn.to_string(), "www.google.ie.");
///
/// let dn = DomainName::try_from(".").unwrap();
/// assert_eq!(dn.to_string(), ".");
/// ```
impl std::fmt::Display for DomainName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            return write!(f, ".");
        }
        for label in &self.0 {
            write!(f, "{}.", label)?;
        }
        Ok(())
    }
}

impl TryFrom<&str> for DomainName {
    type Error = DNSError;

    fn try_from(domain: &str) -> DNSResult<Self> {
        if domain.is_empty() {
            return Err(DNSError::DNSInternalError(InternalError::EmptyDomainName));
        }

        if domain == "." {
            return Ok(DomainName::root());
        }

        let labels: Vec<String> = domain
            .split('.')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        for label in &labels {
            if label.len() > 63 {
                return Err(DNSError::DNSInternalError(InternalError::DnsDomainNameTooLong));
            }
        }

        Ok(DomainName(labels))
    }
}

//--------------------------------------------------------------------------------
// Question structure: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
//--------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub qname: DomainName,
    pub qtype: QType,
    pub qclass: QClass,
}

impl Question {
    /// Create a new question. The IN class is used if `qclass` is `None`.
    pub fn new(domain: &str, qtype: QType, qclass: Option<QClass>) -> DNSResult<Self> {
        Ok(Question {
            qname: DomainName::try_from(domain)?,
            qtype,
            qclass: qclass.unwrap_or(QClass::IN),
        })
    }
}

pub const MAX_UDP_PACKET_SIZE: usize = 512;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_round_trip_through_u16() {
        let flags = Flags {
            qr: true,
            opcode: OpCode::IQuery,
            aa: true,
            tc: true,
            rd: true,
            ra: true,
            z: 0,
            rcode: ResponseCode::NoError,
        };
        let encoded = flags.to_u16();
        let decoded = Flags::from_u16(encoded);
        assert_eq!(flags, decoded);
    }

    #[test]
    fn qtype_round_trips_through_its_code() {
        assert_eq!(QType::from_code(1), QType::A);
        assert_eq!(QType::A.code(), 1);
        assert_eq!(QType::from_code(28), QType::AAAA);
        assert_eq!(QType::from_code(61234), QType::Unknown(61234));
    }

    #[test]
    fn qtype_from_str_is_case_insensitive() {
        use std::str::FromStr;
        assert_eq!(QType::from_str("a").unwrap(), QType::A);
        assert_eq!(QType::from_str("AAAA").unwrap(), QType::AAAA);
        assert!(QType::from_str("bogus").is_err());
    }

    #[test]
    fn domain_name_parses_labels_and_root() {
        let dn = DomainName::try_from("www.example.com").unwrap();
        assert_eq!(dn.0, &["www", "example", "com"]);

        let dn = DomainName::try_from("com.").unwrap();
        assert_eq!(dn.0, &["com"]);

        let dn = DomainName::try_from(".").unwrap();
        assert!(dn.is_root());

        assert!(DomainName::try_from("").is_err());
    }

    #[test]
    fn domain_name_equality_ignores_case() {
        let a = DomainName::try_from("WWW.Example.COM").unwrap();
        let b = DomainName::try_from("www.example.com").unwrap();
        assert!(a.eq_ignore_case(&b));
    }
}
