//! A dedicated error for all possible errors in DNS queries: I/O, DNS packet inconsistencies, etc
use std::io;
use std::str;

use crate::rfc1035::ResponseCode;

#[derive(Debug)]
pub enum DNSError {
    Io(io::Error),
    FromUtf8(std::string::FromUtf8Error),
    Utf8(str::Utf8Error),
    LoggerError(log::SetLoggerError),
    DNS(String),
    DNSInternalError(InternalError),

    /// all attempts across all configured servers failed to receive a valid reply
    Timeout,
    /// a reply whose header rcode is not NoError
    Protocol(ResponseCode),
    /// malformed bytes: overlong names, out-of-range pointers, rdata length mismatch
    Format(String),
    /// unknown transport type or empty server list at dispatch time
    Config(String),
}

#[derive(Debug)]
pub enum InternalError {
    DnsDomainNameTooLong,
    EmptyDomainName,
    PointerOutOfRange,
    PointerLoop,
    LabelTooLong,
}

impl DNSError {
    // Helper function to create a new DNS error from a string
    pub fn new(s: &str) -> Self {
        DNSError::DNS(String::from(s))
    }
}

/// A specific custom `Result` for all functions
pub type DNSResult<T> = Result<T, DNSError>;

// All conversions for internal errors for DNSError
impl From<io::Error> for DNSError {
    fn from(err: io::Error) -> Self {
        DNSError::Io(err)
    }
}

impl From<String> for DNSError {
    fn from(err: String) -> Self {
        DNSError::DNS(err)
    }
}

impl From<std::string::FromUtf8Error> for DNSError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        DNSError::FromUtf8(err)
    }
}

impl From<str::Utf8Error> for DNSError {
    fn from(err: str::Utf8Error) -> Self {
        DNSError::Utf8(err)
    }
}

impl From<log::SetLoggerError> for DNSError {
    fn from(err: log::SetLoggerError) -> Self {
        DNSError::LoggerError(err)
    }
}

impl std::fmt::Display for DNSError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DNSError::Io(e) => write!(f, "I/O error: {}", e),
            DNSError::FromUtf8(e) => write!(f, "invalid UTF8: {}", e),
            DNSError::Utf8(e) => write!(f, "invalid UTF8: {}", e),
            DNSError::LoggerError(e) => write!(f, "logger error: {}", e),
            DNSError::DNS(s) => write!(f, "DNS error: {}", s),
            DNSError::DNSInternalError(e) => write!(f, "internal error: {:?}", e),
            DNSError::Timeout => write!(f, "Timeout Error"),
            DNSError::Protocol(rcode) => write!(f, "protocol error: rcode={:?}", rcode),
            DNSError::Format(s) => write!(f, "format error: {}", s),
            DNSError::Config(s) => write!(f, "configuration error: {}", s),
        }
    }
}

impl std::error::Error for DNSError {}
