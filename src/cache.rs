//! A TTL-aware response cache keyed by question. Guarded by a single mutex:
//! lookups and insertions are both brief, and a resolver only ever touches
//! the cache around a network round trip it already pays the latency for,
//! so there is no payoff to the extra complexity of a reader/writer lock.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::message::Response;
use crate::rfc1035::{QClass, QType, ResponseCode};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    qname: String,
    qtype: u16,
    qclass: u16,
}

impl CacheKey {
    fn new(qname: &str, qtype: QType, qclass: QClass) -> Self {
        CacheKey {
            qname: qname.to_string(),
            qtype: qtype.code(),
            qclass: qclass.code(),
        }
    }
}

struct Entry {
    response: Response,
    inserted_at: Instant,
    ttl: Duration,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }
}

/// Minimum TTL across every RR in the response -- answers, authorities and
/// additionals alike (§4.4: "for each RR in the candidate response"), so a
/// NODATA reply whose only record is an authority-section SOA still gets a
/// TTL to cache under. A response with no RRs at all has nothing to age it
/// by and is never cached.
fn response_ttl(response: &Response) -> Option<Duration> {
    response
        .answers
        .iter()
        .chain(response.authorities.iter())
        .chain(response.additionals.iter())
        .map(|rr| rr.ttl)
        .min()
        .map(|secs| Duration::from_secs(secs as u64))
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
}

/// A cheaply cloneable handle to the shared cache; every `Resolver` clone
/// shares the same underlying table.
#[derive(Clone)]
pub struct SharedCache(Arc<Mutex<Inner>>);

impl SharedCache {
    pub fn new() -> Self {
        SharedCache(Arc::new(Mutex::new(Inner::default())))
    }

    /// Look up a cached, still-fresh response for the given question.
    pub fn get(&self, qname: &str, qtype: QType, qclass: QClass) -> Option<Response> {
        let key = CacheKey::new(qname, qtype, qclass);
        let mut inner = self.0.lock().expect("cache mutex poisoned");
        let now = Instant::now();

        match inner.entries.get(&key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.response.clone()),
            Some(_) => {
                inner.entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Insert a response for the given question, provided it is worth
    /// caching: a successful (`NOERROR`) answer with at least one record and
    /// a non-zero TTL.
    pub fn insert(&self, qname: &str, qtype: QType, qclass: QClass, response: Response) {
        if response.header.flags.rcode != ResponseCode::NoError {
            return;
        }
        let ttl = match response_ttl(&response) {
            Some(ttl) if ttl > Duration::ZERO => ttl,
            _ => return,
        };

        let key = CacheKey::new(qname, qtype, qclass);
        let mut inner = self.0.lock().expect("cache mutex poisoned");
        inner.entries.insert(
            key,
            Entry {
                response,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.0.lock().expect("cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.0.lock().expect("cache mutex poisoned").entries.clear();
    }
}

impl Default for SharedCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc1035::{Flags, Header};
    use std::net::SocketAddr;

    fn response_with_ttl(ttl: u32, rcode: ResponseCode) -> Response {
        use crate::message::ResourceRecord;
        use crate::rdata::RData;
        use crate::rfc1035::DomainName;
        use std::net::Ipv4Addr;

        let mut header = Header::default();
        header.flags = Flags {
            rcode,
            ..Flags::default()
        };

        let answers = if rcode == ResponseCode::NoError {
            vec![ResourceRecord {
                name: DomainName::try_from("example.com").unwrap(),
                rtype: QType::A,
                rclass: QClass::IN,
                ttl,
                rdlength: 4,
                rdata: RData::A(Ipv4Addr::new(127, 0, 0, 1)),
            }]
        } else {
            Vec::new()
        };

        Response {
            header,
            questions: Vec::new(),
            answers,
            authorities: Vec::new(),
            additionals: Vec::new(),
            server: "127.0.0.1:53".parse::<SocketAddr>().unwrap(),
            captured_at: Instant::now(),
            size: 0,
            error: None,
        }
    }

    #[test]
    fn caches_successful_responses() {
        let cache = SharedCache::new();
        cache.insert("example.com.", QType::A, QClass::IN, response_with_ttl(60, ResponseCode::NoError));
        assert!(cache.get("example.com.", QType::A, QClass::IN).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn caches_nodata_replies_using_the_authority_soa_ttl() {
        use crate::message::ResourceRecord;
        use crate::rdata::{RData, SoaData};
        use crate::rfc1035::DomainName;

        let mut header = Header::default();
        header.flags = Flags {
            rcode: ResponseCode::NoError,
            ..Flags::default()
        };
        let response = Response {
            header,
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: vec![ResourceRecord {
                name: DomainName::try_from("example.com").unwrap(),
                rtype: QType::SOA,
                rclass: QClass::IN,
                ttl: 30,
                rdlength: 0,
                rdata: RData::Soa(SoaData {
                    mname: DomainName::try_from("ns.example.com").unwrap(),
                    rname: DomainName::try_from("hostmaster.example.com").unwrap(),
                    serial: 1,
                    refresh: 1,
                    retry: 1,
                    expire: 1,
                    minimum: 30,
                }),
            }],
            additionals: Vec::new(),
            server: "127.0.0.1:53".parse::<SocketAddr>().unwrap(),
            captured_at: Instant::now(),
            size: 0,
            error: None,
        };

        let cache = SharedCache::new();
        cache.insert("example.com.", QType::A, QClass::IN, response);
        assert!(cache.get("example.com.", QType::A, QClass::IN).is_some());
    }

    #[test]
    fn does_not_cache_errors_or_zero_ttl() {
        let cache = SharedCache::new();
        cache.insert("example.com.", QType::A, QClass::IN, response_with_ttl(60, ResponseCode::NXDomain));
        assert!(cache.is_empty());

        cache.insert("example.com.", QType::A, QClass::IN, response_with_ttl(0, ResponseCode::NoError));
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = SharedCache::new();
        let mut response = response_with_ttl(60, ResponseCode::NoError);
        response.answers[0].ttl = 60;
        // simulate an entry inserted long enough ago to have expired by
        // inserting directly with a zero-duration ttl-minus-epsilon via a
        // short ttl and a synthetic sleep is undesirable in a unit test, so
        // this checks the boundary condition logic itself via is_expired.
        let entry = Entry {
            response,
            inserted_at: Instant::now() - Duration::from_secs(120),
            ttl: Duration::from_secs(60),
        };
        assert!(entry.is_expired(Instant::now()));
    }

    #[test]
    fn distinct_qtype_is_a_distinct_key() {
        let cache = SharedCache::new();
        cache.insert("example.com.", QType::A, QClass::IN, response_with_ttl(60, ResponseCode::NoError));
        assert!(cache.get("example.com.", QType::AAAA, QClass::IN).is_none());
    }
}
