//! A DNS stub resolver: wire-format codec plus a query engine that sends a
//! question to a configured set of servers, retries across them, and caches
//! successful answers for their TTL.
//!
//! The modules mirror the two halves of the problem: [`rfc1035`], [`rdata`],
//! [`message`] and [`network_order`] are the wire codec (pure, no I/O);
//! [`config`], [`cache`], [`transport`] and [`resolver`] are the query
//! engine built on top of it.
#[macro_use]
pub mod macros;

pub mod cache;
pub mod config;
pub mod error;
pub mod message;
pub mod network_order;
pub mod rdata;
pub mod resolver;
pub mod rfc1035;
pub mod transport;

pub use config::{ResolverConfig, TransportType};
pub use error::{DNSError, DNSResult};
pub use message::{Request, Response};
pub use resolver::Resolver;
pub use rfc1035::{QClass, QType};
