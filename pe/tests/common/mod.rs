//! Shared helpers for integration tests

#![allow(dead_code)]

use std::time::Duration;

use planexec::config::ResolvedOrchestratorConfig;
use planexec::{OrchestratorClient, StreamEvent};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// How the raw server ends the response after its chunks
pub enum Ending {
    /// Send the terminating zero-length chunk
    Complete,
    /// Keep the connection open until the client goes away
    Hold,
    /// Close the socket without terminating the chunked body
    Abort,
}

/// Client pointed at `base_url` with default settings
pub fn client_for(base_url: &str) -> OrchestratorClient {
    OrchestratorClient::from_config(&ResolvedOrchestratorConfig::for_base_url(base_url)).expect("client")
}

/// Receive events until the channel closes
pub async fn collect_events(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("event stream stalled")
    {
        events.push(event);
    }
    events
}

/// Start a one-shot server that streams `steps` as HTTP chunks of an SSE body
pub async fn start_chunked_sse_server(steps: Vec<(Duration, Vec<u8>)>, ending: Ending) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        let (mut socket, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(_) => return,
        };

        // Read the whole request so no unread bytes are left when the socket closes.
        let mut buf = [0u8; 4096];
        let mut received = Vec::new();
        loop {
            let n = match socket.read(&mut buf).await {
                Ok(n) => n,
                Err(_) => return,
            };
            if n == 0 {
                return;
            }
            received.extend_from_slice(&buf[..n]);
            if request_complete(&received) {
                break;
            }
        }

        let headers = concat!(
            "HTTP/1.1 200 OK\r\n",
            "Content-Type: text/event-stream\r\n",
            "Transfer-Encoding: chunked\r\n",
            "\r\n"
        );
        if socket.write_all(headers.as_bytes()).await.is_err() {
            return;
        }

        for (delay, payload) in steps {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let mut chunk = format!("{:X}\r\n", payload.len()).into_bytes();
            chunk.extend_from_slice(&payload);
            chunk.extend_from_slice(b"\r\n");
            if socket.write_all(&chunk).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
        }

        match ending {
            Ending::Complete => {
                let _ = socket.write_all(b"0\r\n\r\n").await;
            }
            Ending::Hold => {
                // Park until the client drops the connection.
                while let Ok(n) = socket.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                }
            }
            Ending::Abort => {
                let _ = socket.shutdown().await;
            }
        }
    });

    format!("http://{}", addr)
}

/// True once the headers and a `Content-Length` body have fully arrived
fn request_complete(received: &[u8]) -> bool {
    let Some(header_end) = received.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&received[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    received.len() >= header_end + 4 + content_length
}
