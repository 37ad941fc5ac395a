//! Declarative macros for the repetitive boilerplate that shows up once per
//! DNS code-point enumeration (QTYPE, QCLASS, OPCODE, RCODE): a closed list
//! of named values over an integer wire representation, plus an `Unknown`
//! catch-all so decoding never fails on an unassigned or experimental code.

/// Defines an enum over a numeric DNS code point: `code()`/`from_code()`
/// round-trip to the wire representation, `Display` renders the mnemonic
/// (or `TYPE<n>`/`CLASS<n>` style fallback for `Unknown`), and `FromStr`
/// accepts the mnemonic case-insensitively for command-line use.
#[macro_export]
macro_rules! code_enum {
    ($name:ident : $int:ty { $($variant:ident = $code:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unknown($int),
        }

        impl $name {
            pub fn code(&self) -> $int {
                match self {
                    $($name::$variant => $code,)+
                    $name::Unknown(c) => *c,
                }
            }

            pub fn from_code(code: $int) -> Self {
                match code {
                    $($code => $name::$variant,)+
                    other => $name::Unknown(other),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($name::$variant => write!(f, stringify!($variant)),)+
                    $name::Unknown(c) => write!(f, "{}{}", stringify!($name), c),
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::DNSError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_uppercase().as_str() {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    _ => Err($crate::error::DNSError::new(&format!(
                        concat!("unknown ", stringify!($name), ": {}"),
                        s
                    ))),
                }
            }
        }
    };
}

/// Format a byte slice for a debug/trace log line: `"XX XX XX .."` in hex,
/// or the printable-ASCII rendering used by the original source's console
/// dumps, selected with a one-letter mode just like the source's own
/// `format_buffer!` call sites did.
#[macro_export]
macro_rules! format_buffer {
    ("X", $buf:expr) => {{
        $buf.iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }};
    ("C", $buf:expr) => {{
        $buf.iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect::<String>()
    }};
}
