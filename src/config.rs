//! Resolver configuration: which servers to query, how hard to retry, and
//! which transport to use.
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::{DNSError, DNSResult};

/// Which socket type carries the query. TCP is required for zone transfers
/// (AXFR/IXFR) and for any reply the server marks truncated; UDP is the
/// default for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    Udp,
    Tcp,
}

impl Default for TransportType {
    fn default() -> Self {
        TransportType::Udp
    }
}

/// Resolver behavior: which servers to ask, how long to wait per attempt,
/// how many attempts to make, and whether to use the response cache.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub servers: Vec<SocketAddr>,
    pub timeout: Duration,
    pub retries: u32,
    pub recursion_desired: bool,
    pub transport: TransportType,
    pub use_cache: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            servers: Vec::new(),
            timeout: Duration::from_secs(1),
            retries: 3,
            recursion_desired: true,
            transport: TransportType::Udp,
            use_cache: true,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a server given as `host:port`, or bare `host` (defaulting to
    /// port 53). `host` must be a literal IP address: a hostname-valued
    /// server is resolved via an internal A query against the servers
    /// already configured here (§4.6), not through the platform resolver,
    /// so that lookup stays on this crate's own query engine end to end.
    /// Use [`crate::resolver::Resolver::resolve_server_hostname`] to add a
    /// hostname-valued server once at least one literal server exists to
    /// bootstrap the query against.
    pub fn add_server(mut self, host: &str) -> DNSResult<Self> {
        self.servers.push(Self::parse_literal(host)?);
        Ok(self)
    }

    /// Parse `host` as a literal `ip:port` or bare `ip` (defaulting to port
    /// 53). Never performs name resolution of any kind.
    fn parse_literal(host: &str) -> DNSResult<SocketAddr> {
        if let Ok(addr) = host.parse::<SocketAddr>() {
            return Ok(addr);
        }
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, 53));
        }
        Err(DNSError::Config(format!(
            "'{}' is not a literal IP address; hostname-valued servers must go through \
             Resolver::resolve_server_hostname",
            host
        )))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_recursion_desired(mut self, recursion_desired: bool) -> Self {
        self.recursion_desired = recursion_desired;
        self
    }

    pub fn with_transport(mut self, transport: TransportType) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn validate(&self) -> DNSResult<()> {
        if self.servers.is_empty() {
            return Err(DNSError::Config("no servers configured".into()));
        }
        if self.retries == 0 {
            return Err(DNSError::Config("retries must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = ResolverConfig::default();
        assert_eq!(config.retries, 3);
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert!(config.recursion_desired);
        assert_eq!(config.transport, TransportType::Udp);
        assert!(config.use_cache);
    }

    #[test]
    fn add_server_defaults_to_port_53() {
        let config = ResolverConfig::new().add_server("127.0.0.1").unwrap();
        assert_eq!(config.servers[0].port(), 53);
    }

    #[test]
    fn add_server_honors_explicit_port() {
        let config = ResolverConfig::new().add_server("127.0.0.1:5353").unwrap();
        assert_eq!(config.servers[0].port(), 5353);
    }

    #[test]
    fn add_server_rejects_hostnames() {
        // hostname-valued servers go through Resolver::resolve_server_hostname
        // instead, which bootstraps over this crate's own query engine
        // rather than the platform resolver.
        assert!(ResolverConfig::new().add_server("ns.example.com").is_err());
    }

    #[test]
    fn validate_rejects_empty_server_list() {
        assert!(ResolverConfig::new().validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_retries() {
        let config = ResolverConfig::new()
            .add_server("127.0.0.1")
            .unwrap()
            .with_retries(0);
        assert!(config.validate().is_err());
    }
}
