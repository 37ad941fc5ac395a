//! Sending a `Request` to one server and reading back its reply, over UDP or
//! TCP. Retrying across servers and counting attempts is the query engine's
//! job (`crate::resolver`); this module only knows how to talk to a single
//! address once.
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::time::{Duration, Instant};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{DNSError, DNSResult};
use crate::message::{Request, Response};
use crate::rfc1035::{QType, MAX_UDP_PACKET_SIZE};

/// A closure invoked with a one-line progress note on every attempt, timeout
/// and retry. Never blocks the hot path: call sites treat it as fire-and-
/// forget and never propagate whatever it does.
pub type Listener = dyn Fn(&str) + Send + Sync;

fn notify(listener: Option<&Listener>, message: impl FnOnce() -> String) {
    if let Some(listener) = listener {
        listener(&message());
    }
}

/// Send `request` to `server` over UDP and wait up to `timeout` for a reply.
/// The datagram that comes back is accepted only if the transaction ID
/// matches (any attacker on the local network can otherwise race the real
/// server's reply); `UdpSocket::recv_from` already binds the reply's source
/// address, so spoofed replies from a different host are rejected by the
/// kernel before this code ever sees them.
pub fn udp_query(
    request: &Request,
    server: SocketAddr,
    timeout: Duration,
    listener: Option<&Listener>,
) -> DNSResult<Response> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_read_timeout(Some(timeout))?;
    socket.set_write_timeout(Some(timeout))?;

    let bytes = request.to_network_bytes()?;
    notify(listener, || format!("sending {} bytes to {} over UDP", bytes.len(), server));
    log::debug!("-> {} ({} bytes): {}", server, bytes.len(), crate::format_buffer!("X", &bytes));
    socket.send_to(&bytes, server)?;

    let mut buf = [0u8; MAX_UDP_PACKET_SIZE];
    let captured_at = Instant::now();
    let (received, from) = match socket.recv_from(&mut buf) {
        Ok(v) => v,
        Err(e) if is_timeout(&e) => {
            notify(listener, || format!("timed out waiting for {}", server));
            return Err(DNSError::Timeout);
        }
        Err(e) => return Err(DNSError::Io(e)),
    };
    log::debug!(
        "<- {} ({} bytes): {}",
        from,
        received,
        crate::format_buffer!("X", &buf[..received])
    );

    if from.ip() != server.ip() {
        return Err(DNSError::Format(format!(
            "reply source {} does not match queried server {}",
            from.ip(),
            server.ip()
        )));
    }

    let response = Response::decode(&buf[..received], server, captured_at);
    if response.header.id != request.header.id {
        return Err(DNSError::Format(format!(
            "reply transaction id {:04x} does not match request id {:04x}",
            response.header.id, request.header.id
        )));
    }

    Ok(response)
}

/// Send `request` to `server` over TCP, using the standard 2-octet
/// length-prefix framing (RFC1035 §4.2.2).
pub fn tcp_query(
    request: &Request,
    server: SocketAddr,
    timeout: Duration,
    listener: Option<&Listener>,
) -> DNSResult<Response> {
    let mut stream = TcpStream::connect_timeout(&server, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let payload = request.to_network_bytes()?;
    notify(listener, || format!("sending {} bytes to {} over TCP", payload.len(), server));
    log::debug!("-> {} ({} bytes): {}", server, payload.len(), crate::format_buffer!("X", &payload));
    write_framed(&mut stream, &payload)?;

    let captured_at = Instant::now();
    let bytes = read_framed(&mut stream)?;
    log::debug!("<- {} ({} bytes): {}", server, bytes.len(), crate::format_buffer!("X", &bytes));
    Ok(Response::decode(&bytes, server, captured_at))
}

fn write_framed(stream: &mut TcpStream, payload: &[u8]) -> DNSResult<()> {
    stream.write_u16::<BigEndian>(payload.len() as u16)?;
    stream.write_all(payload)?;
    Ok(())
}

fn read_framed(stream: &mut TcpStream) -> DNSResult<Vec<u8>> {
    let len = match stream.read_u16::<BigEndian>() {
        Ok(len) => len,
        Err(e) if is_timeout(&e) => return Err(DNSError::Timeout),
        Err(e) => return Err(DNSError::Io(e)),
    };
    let mut buf = vec![0u8; len as usize];
    stream
        .read_exact(&mut buf)
        .map_err(|e| if is_timeout(&e) { DNSError::Timeout } else { DNSError::Io(e) })?;
    Ok(buf)
}

/// Stream a zone transfer (AXFR) over TCP: keep reading length-prefixed
/// messages and aggregating their answer records until a second SOA record
/// closes the transfer (RFC5936 §2.2), then return one synthetic `Response`
/// carrying every collected answer with the header counts recomputed to
/// match.
pub fn axfr(
    request: &Request,
    server: SocketAddr,
    timeout: Duration,
    listener: Option<&Listener>,
) -> DNSResult<Response> {
    let mut stream = TcpStream::connect_timeout(&server, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let payload = request.to_network_bytes()?;
    write_framed(&mut stream, &payload)?;

    let mut soa_seen = 0u32;
    let mut aggregated: Option<Response> = None;
    let mut total_size = 0usize;
    let captured_at = Instant::now();

    loop {
        let bytes = read_framed(&mut stream)?;
        total_size += bytes.len();
        let chunk = Response::decode(&bytes, server, captured_at);
        if let Some(err) = &chunk.error {
            return Err(DNSError::Format(format!("AXFR message decode failed: {}", err)));
        }

        notify(listener, || format!("AXFR chunk with {} records from {}", chunk.answers.len(), server));
        soa_seen += chunk.answers.iter().filter(|rr| rr.rtype == QType::SOA).count() as u32;

        match &mut aggregated {
            None => aggregated = Some(chunk),
            Some(agg) => {
                agg.answers.extend(chunk.answers);
                agg.authorities.extend(chunk.authorities);
                agg.additionals.extend(chunk.additionals);
            }
        }

        if soa_seen >= 2 {
            break;
        }
    }

    let mut response = aggregated.ok_or_else(|| DNSError::Format("AXFR produced no messages".into()))?;
    response.header.ancount = response.answers.len() as u16;
    response.header.nscount = response.authorities.len() as u16;
    response.header.arcount = response.additionals.len() as u16;
    response.size = total_size;
    Ok(response)
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc1035::{QClass, Question};
    use std::net::UdpSocket as StdUdpSocket;

    #[test]
    fn udp_query_times_out_against_a_silent_server() {
        // bind a socket that never replies, to exercise the timeout path
        // without depending on network access.
        let silent = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = silent.local_addr().unwrap();

        let question = Question::new("example.com", QType::A, Some(QClass::IN)).unwrap();
        let request = Request::new(0x1, question, true);

        let result = udp_query(&request, addr, Duration::from_millis(100), None);
        assert!(matches!(result, Err(DNSError::Timeout)));
    }
}
