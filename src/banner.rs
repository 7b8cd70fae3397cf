//! Banner grabbing for middleware endpoints.
//!
//! Middleware masters usually speak XML-RPC over HTTP and stay silent until
//! spoken to, so after a short wait for an unsolicited greeting a minimal
//! HTTP request is sent to make the server identify itself.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Maximum bytes to read for a banner.
const MAX_BANNER_SIZE: usize = 1024;

/// Probe sent when the service does not greet first.
const HTTP_PROBE: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";

/// Grab a banner from an established stream.
///
/// Returns `None` if the service sends nothing within `wait` for either the
/// greeting or the probe response.
pub async fn grab_banner_from_stream(mut stream: TcpStream, wait: Duration) -> Option<String> {
    let mut buffer = vec![0u8; MAX_BANNER_SIZE];

    if let Ok(Ok(n)) = timeout(wait, stream.read(&mut buffer)).await {
        if n > 0 {
            return Some(sanitize_banner(&buffer[..n]));
        }
    }

    stream.write_all(HTTP_PROBE).await.ok()?;
    match timeout(wait, stream.read(&mut buffer)).await {
        Ok(Ok(n)) if n > 0 => Some(sanitize_banner(&buffer[..n])),
        _ => None,
    }
}

/// Sanitize banner by removing non-printable characters and limiting length.
fn sanitize_banner(data: &[u8]) -> String {
    let s: String = data
        .iter()
        .take(256)
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else if b == b'\r' || b == b'\n' || b == b'\t' {
                ' '
            } else {
                '.'
            }
        })
        .collect();

    // Collapse runs of whitespace
    let mut result = String::with_capacity(s.len());
    let mut prev_space = false;
    for c in s.chars() {
        if c == ' ' {
            if !prev_space {
                result.push(c);
            }
            prev_space = true;
        } else {
            result.push(c);
            prev_space = false;
        }
    }

    result.trim().to_string()
}
