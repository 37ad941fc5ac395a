//! The query engine: ties configuration, cache and transport together into
//! `Resolver::resolve`, the single entry point a caller uses to ask a
//! question and get a `Response` back.
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use rand::Rng;

use crate::cache::SharedCache;
use crate::config::{ResolverConfig, TransportType};
use crate::error::{DNSError, DNSResult};
use crate::message::{Request, Response};
use crate::rdata::RData;
use crate::rfc1035::{QClass, QType, Question};
use crate::transport::{self, Listener};

/// A DNS resolver bound to a fixed set of upstream servers. Cheap to clone:
/// the cache and the query-id counter are shared behind an `Arc`.
#[derive(Clone)]
pub struct Resolver {
    config: ResolverConfig,
    cache: SharedCache,
    next_id: Arc<AtomicU16>,
    listener: Option<Arc<Listener>>,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        let seed = rand::thread_rng().gen::<u16>();
        Resolver {
            config,
            cache: SharedCache::new(),
            next_id: Arc::new(AtomicU16::new(seed)),
            listener: None,
        }
    }

    /// Install a progress listener invoked with a one-line note per attempt,
    /// timeout and retry. Replaces any previously installed listener.
    pub fn with_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener) as Arc<Listener>);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a hostname-valued DNS server and make it the sole configured
    /// server (§4.6: "Setting DnsServer to a non-IP value is interpreted as
    /// a hostname to be resolved via an internal A query against the
    /// currently configured servers; the first A answer becomes the sole
    /// server"). At least one literal server must already be configured to
    /// bootstrap the query against.
    pub fn resolve_server_hostname(&mut self, hostname: &str) -> DNSResult<()> {
        self.config.validate()?;

        let response = self.resolve(hostname, QType::A, QClass::IN);
        if !response.is_success() {
            return Err(DNSError::Config(format!(
                "could not resolve DNS server hostname '{}': {}",
                hostname,
                response.error.as_deref().unwrap_or("no A record returned")
            )));
        }

        let ip = response
            .answers
            .iter()
            .find_map(|rr| match &rr.rdata {
                RData::A(addr) => Some(*addr),
                _ => None,
            })
            .ok_or_else(|| {
                DNSError::Config(format!("no A record found for DNS server hostname '{}'", hostname))
            })?;

        self.config.servers = vec![SocketAddr::new(std::net::IpAddr::V4(ip), 53)];
        Ok(())
    }

    fn next_query_id(&self) -> u16 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn notify(&self, message: impl FnOnce() -> String) {
        if let Some(listener) = &self.listener {
            listener(&message());
        }
    }

    /// Resolve `qname`/`qtype`/`qclass` against the configured servers,
    /// retrying across servers up to `config.retries` times. Never returns
    /// `Err`: transport failures, timeouts and malformed replies all end up
    /// recorded on the returned `Response`'s `error` field, since a caller
    /// retrying across servers wants one response shape to inspect
    /// regardless of which server or attempt failed (§7 propagation
    /// policy). The only way to see an error value from this call is by
    /// way of a misconfigured resolver, e.g. an empty server list, which is
    /// itself surfaced the same way.
    pub fn resolve(&self, qname: &str, qtype: QType, qclass: QClass) -> Response {
        if let Err(e) = self.config.validate() {
            return Response::failed(e.to_string());
        }

        let canonical = match crate::rfc1035::DomainName::try_from(qname) {
            Ok(name) => name.canonical(),
            Err(e) => return Response::failed(e.to_string()),
        };

        if self.config.use_cache {
            if let Some(cached) = self.cache.get(&canonical, qtype, qclass) {
                self.notify(|| format!("cache hit for {} {:?} {:?}", canonical, qclass, qtype));
                return cached;
            }
        }

        let question = match Question::new(qname, qtype, Some(qclass)) {
            Ok(q) => q,
            Err(e) => return Response::failed(e.to_string()),
        };

        let mut last: Option<Response> = None;

        'attempts: for attempt in 0..self.config.retries {
            for server in &self.config.servers {
                let id = self.next_query_id();
                let request = Request::new(id, question.clone(), self.config.recursion_desired);

                self.notify(|| {
                    format!(
                        "attempt {}/{}: querying {} for {} {:?}",
                        attempt + 1,
                        self.config.retries,
                        server,
                        qname,
                        qtype
                    )
                });

                let outcome = match self.config.transport {
                    TransportType::Udp => {
                        transport::udp_query(&request, *server, self.config.timeout, self.listener.as_deref())
                    }
                    TransportType::Tcp => {
                        transport::tcp_query(&request, *server, self.config.timeout, self.listener.as_deref())
                    }
                };

                match outcome {
                    // Any response the transport actually decoded --
                    // success, a non-NoError rcode, or a format error
                    // recorded on the response itself -- is returned to the
                    // caller immediately. Only a transport-level `Err`
                    // (the server never replied, or replied with something
                    // that didn't even look like our request) advances to
                    // the next server/attempt.
                    Ok(response) => {
                        if response.is_success() {
                            if self.config.use_cache {
                                self.cache
                                    .insert(&canonical, qtype, qclass, response.clone());
                            }
                        } else {
                            self.notify(|| match &response.error {
                                Some(e) => format!("{} replied with a malformed message: {}", server, e),
                                None => format!("{} answered with rcode {}", server, response.header.flags.rcode),
                            });
                        }
                        last = Some(response);
                        break 'attempts;
                    }
                    Err(e) => {
                        self.notify(|| format!("{} failed: {}", server, e));
                        last = Some(Response::failed(e.to_string()));
                    }
                }
            }
        }

        last.unwrap_or_else(|| Response::failed("no servers configured".into()))
    }

    /// Stream a zone transfer (AXFR) from the first configured server. Zone
    /// transfers are always carried over TCP regardless of
    /// `config.transport` (RFC5936 §4).
    pub fn axfr(&self, zone: &str) -> Response {
        if let Err(e) = self.config.validate() {
            return Response::failed(e.to_string());
        }

        let server = match self.config.servers.first() {
            Some(s) => *s,
            None => return Response::failed("no servers configured".into()),
        };

        let question = match Question::new(zone, QType::AXFR, Some(QClass::IN)) {
            Ok(q) => q,
            Err(e) => return Response::failed(e.to_string()),
        };
        let request = Request::new(self.next_query_id(), question, false);

        match transport::axfr(&request, server, self.config.timeout, self.listener.as_deref()) {
            Ok(response) => response,
            Err(e) => Response::failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;

    #[test]
    fn resolve_reports_timeout_against_a_silent_server() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = silent.local_addr().unwrap();

        let config = ResolverConfig::new()
            .add_server(&addr.to_string())
            .unwrap()
            .with_retries(1)
            .with_timeout(std::time::Duration::from_millis(50));

        let resolver = Resolver::new(config);
        let response = resolver.resolve("example.com", QType::A, QClass::IN);
        assert!(!response.is_success());
        assert!(response.error.is_some());
    }

    #[test]
    fn resolve_rejects_empty_configuration() {
        let resolver = Resolver::new(ResolverConfig::new());
        let response = resolver.resolve("example.com", QType::A, QClass::IN);
        assert!(!response.is_success());
    }

    #[test]
    fn query_ids_are_monotonic_per_resolver() {
        let resolver = Resolver::new(ResolverConfig::new().add_server("127.0.0.1").unwrap());
        let a = resolver.next_query_id();
        let b = resolver.next_query_id();
        assert_eq!(b, a.wrapping_add(1));
    }

    #[test]
    fn resolve_server_hostname_replaces_the_server_list_with_the_first_a_answer() {
        use std::thread;

        let fake_server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let fake_addr = fake_server.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut buf = [0u8; 512];
            let (len, from) = fake_server.recv_from(&mut buf).unwrap();

            // echo the request's id and question section back inside a
            // minimal reply carrying one A answer.
            let mut reply = vec![buf[0], buf[1], 0x81, 0x80, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
            reply.extend_from_slice(&buf[12..len]);
            reply.extend_from_slice(&[0xc0, 0x0c]); // name: pointer to qname
            reply.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]); // type A, class IN
            reply.extend_from_slice(&[0x00, 0x00, 0x00, 0x3c]); // ttl
            reply.extend_from_slice(&[0x00, 0x04]); // rdlength
            reply.extend_from_slice(&[198, 51, 100, 7]);

            fake_server.send_to(&reply, from).unwrap();
        });

        let config = ResolverConfig::new()
            .add_server(&fake_addr.to_string())
            .unwrap()
            .with_retries(1)
            .with_timeout(std::time::Duration::from_millis(500));
        let mut resolver = Resolver::new(config);

        resolver.resolve_server_hostname("ns.example.com").unwrap();
        handle.join().unwrap();

        assert_eq!(resolver.config().servers.len(), 1);
        assert_eq!(resolver.config().servers[0].ip().to_string(), "198.51.100.7");
        assert_eq!(resolver.config().servers[0].port(), 53);
    }

    #[test]
    fn resolve_server_hostname_requires_a_bootstrap_server() {
        let mut resolver = Resolver::new(ResolverConfig::new());
        assert!(resolver.resolve_server_hostname("ns.example.com").is_err());
    }
}
