// ===============================
// src/test_http.rs (test only)
// ===============================
//
// One-shot HTTP/1.1 server on 127.0.0.1 for exercising the reqwest adapters:
// - serve_once   : reply with a canned response, then close
// - serve_silent : accept + read the request, never reply (timeout path)
//

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub fn response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

pub fn json_response(status: &str, body: &str) -> String {
    response(status, "application/json", body)
}

/// Base URL (`http://127.0.0.1:port`) of a server that answers one request.
pub async fn serve_once(raw_response: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        read_request(&mut sock).await;
        let _ = sock.write_all(raw_response.as_bytes()).await;
        let _ = sock.shutdown().await;
    });
    format!("http://{addr}")
}

/// Base URL of a server that reads the request and then stays quiet for `hold`.
pub async fn serve_silent(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        read_request(&mut sock).await;
        tokio::time::sleep(hold).await;
    });
    format!("http://{addr}")
}

// Headers plus Content-Length bytes of body, so the client never sees a reset.
async fn read_request(sock: &mut TcpStream) {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = sock.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + body_len {
                return;
            }
        }
    }
}
