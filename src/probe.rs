//! Timed HTTP fetch through a single proxy.

use std::fmt;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use url::Url;

const CHUNK: usize = 1024;

/// Why a probe produced no throughput figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outage {
    Connect,
    Timeout,
    Protocol,
    Write,
    Read,
    /// The fetch finished in under one whole second, so the throughput
    /// division would be by zero. Recorded as an outage instead.
    SubSecond,
}

impl fmt::Display for Outage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outage::Connect => "connect failed",
            Outage::Timeout => "timed out",
            Outage::Protocol => "malformed response",
            Outage::Write => "write failed",
            Outage::Read => "read failed",
            Outage::SubSecond => "completed in under one second",
        };
        f.write_str(s)
    }
}

/// Result of one probe. Every outcome collapses to a history sample; only
/// `Up` carries a non-zero one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeOutcome {
    Up { bits_per_sec: f64 },
    Down(Outage),
}

impl ProbeOutcome {
    /// The value recorded in the history buffer: measured throughput, or the
    /// outage sentinel 0.
    pub fn sample(&self) -> f64 {
        match self {
            ProbeOutcome::Up { bits_per_sec } => *bits_per_sec,
            ProbeOutcome::Down(_) => 0.0,
        }
    }
}

/// Fetch `target` once through the HTTP proxy at `address:port` and measure
/// throughput in bits per whole second of wall-clock time.
///
/// The request uses the absolute-form target with `Connection: close`, so the
/// response is drained in fixed-size chunks until a short or empty chunk
/// marks end-of-stream. `timeout` bounds each socket operation (connect,
/// write, every read) individually, not the probe as a whole, matching
/// per-socket read-timeout semantics; no failure escapes as an error.
pub async fn probe(address: &str, port: u16, target: &Url, timeout: Duration) -> ProbeOutcome {
    let start = Instant::now();

    let mut stream = match tokio::time::timeout(timeout, TcpStream::connect((address, port))).await
    {
        Ok(Ok(s)) => s,
        Ok(Err(_)) => return ProbeOutcome::Down(Outage::Connect),
        Err(_) => return ProbeOutcome::Down(Outage::Timeout),
    };
    stream.set_nodelay(true).ok();

    let host = target.host_str().unwrap_or_default();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        target, host
    );
    match tokio::time::timeout(timeout, stream.write_all(request.as_bytes())).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => return ProbeOutcome::Down(Outage::Write),
        Err(_) => return ProbeOutcome::Down(Outage::Timeout),
    }

    let mut total = 0usize;
    let mut buf = [0u8; CHUNK];
    let mut first = true;
    loop {
        let n = match tokio::time::timeout(timeout, stream.read(&mut buf)).await {
            Ok(Ok(n)) => n,
            Ok(Err(_)) => return ProbeOutcome::Down(Outage::Read),
            Err(_) => return ProbeOutcome::Down(Outage::Timeout),
        };
        if first {
            if n < 5 || !buf.starts_with(b"HTTP/") {
                return ProbeOutcome::Down(Outage::Protocol);
            }
            first = false;
        }
        total += n;
        if n < CHUNK {
            break;
        }
    }

    let secs = start.elapsed().as_secs();
    if secs == 0 {
        return ProbeOutcome::Down(Outage::SubSecond);
    }
    ProbeOutcome::Up {
        bits_per_sec: (total * 8) as f64 / secs as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    fn target() -> Url {
        Url::parse("http://www.google.com").unwrap()
    }

    #[test]
    fn outage_collapses_to_zero_sample() {
        assert_eq!(ProbeOutcome::Down(Outage::Timeout).sample(), 0.0);
        assert_eq!(ProbeOutcome::Up { bits_per_sec: 8.0 }.sample(), 8.0);
    }

    #[test]
    fn outage_reasons_name_the_failing_operation() {
        assert_eq!(Outage::Write.to_string(), "write failed");
        assert_eq!(Outage::Read.to_string(), "read failed");
        assert_eq!(Outage::Timeout.to_string(), "timed out");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            // Accept, then never answer.
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 512];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let start = Instant::now();
        let outcome = probe("127.0.0.1", port, &target(), Duration::from_millis(300)).await;
        assert_eq!(outcome, ProbeOutcome::Down(Outage::Timeout));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn refused_connection_is_an_outage() {
        // Bind then drop to obtain a port with no listener behind it.
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let outcome = probe("127.0.0.1", port, &target(), Duration::from_secs(1)).await;
        assert_eq!(outcome, ProbeOutcome::Down(Outage::Connect));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn garbage_response_is_a_protocol_outage() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 512];
            let _ = socket.read(&mut buf).await;
            socket.write_all(b"ICY 200 whatever\r\n\r\n").await.unwrap();
        });

        let outcome = probe("127.0.0.1", port, &target(), Duration::from_secs(2)).await;
        assert_eq!(outcome, ProbeOutcome::Down(Outage::Protocol));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sub_second_fetch_never_divides_by_zero() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 512];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\nok")
                .await
                .unwrap();
        });

        let outcome = probe("127.0.0.1", port, &target(), Duration::from_secs(2)).await;
        assert_eq!(outcome, ProbeOutcome::Down(Outage::SubSecond));
        assert_eq!(outcome.sample(), 0.0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn slow_fetch_yields_throughput() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 512];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(Duration::from_millis(1200)).await;
            let mut response = b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_vec();
            response.extend_from_slice(&[b'x'; 100]);
            socket.write_all(&response).await.unwrap();
        });

        let outcome = probe("127.0.0.1", port, &target(), Duration::from_secs(5)).await;
        match outcome {
            ProbeOutcome::Up { bits_per_sec } => assert!(bits_per_sec > 0.0),
            other => panic!("expected throughput, got {:?}", other),
        }
    }
}
