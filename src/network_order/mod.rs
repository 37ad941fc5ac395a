//! Wire-format primitives: the cursor (`primitive`) and the domain-name
//! codec built on top of it (`name`). Per-record-type RDATA codecs live in
//! `crate::rdata`; the full message codec lives in `crate::message`.
pub mod name;
pub mod primitive;

pub use primitive::WireCursor;
