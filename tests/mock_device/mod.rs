#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Instant,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
    task::JoinHandle,
};

/// One request as seen by the mock controller
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<String>,
    pub body: String,
    pub at: Instant,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.iter().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }
}

/// Decides the answer for the n-th request (0-based): status code and body
pub type Responder = Arc<dyn Fn(usize, &Recorded) -> (u16, String) + Send + Sync>;

/// How the mock answers once a request has been read
#[derive(Clone)]
enum Reply {
    Full(Responder),
    /// Write these bytes verbatim, then keep the connection open
    Stalled(String),
    Silent,
}

/// Minimal HTTP/1.1 servo controller on 127.0.0.1
pub struct MockDevice {
    pub port: u16,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: JoinHandle<()>,
}

impl MockDevice {
    pub async fn start(responder: Responder) -> Self {
        Self::spawn(Reply::Full(responder)).await
    }

    /// Accepts connections but never answers
    pub async fn start_silent() -> Self {
        Self::spawn(Reply::Silent).await
    }

    /// Sends the status line and headers announcing a 64 byte body, then only
    /// the first byte of it, and keeps the connection open
    pub async fn start_stalled(status: u16) -> Self {
        Self::spawn(Reply::Stalled(format!(
            "HTTP/1.1 {status} MOCK\r\nContent-Type: text/plain\r\nContent-Length: 64\r\n\r\n{{"
        )))
        .await
    }

    pub async fn ok(body: &'static str) -> Self {
        Self::start(Arc::new(move |_, _| (200, body.to_string()))).await
    }

    async fn spawn(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock device");
        let port = listener.local_addr().expect("no local addr").port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let reply = reply.clone();
                let recorded = recorded.clone();

                tokio::spawn(async move {
                    let mut reader = BufReader::new(stream);

                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).await.is_err() {
                        return;
                    }
                    let mut parts = request_line.split_whitespace();
                    let method = parts.next().unwrap_or_default().to_string();
                    let path = parts.next().unwrap_or_default().to_string();

                    // Read HTTP headers
                    let mut headers = Vec::new();
                    loop {
                        let mut line = String::new();
                        if reader.read_line(&mut line).await.is_err() {
                            return;
                        }
                        if line.trim().is_empty() {
                            break;
                        }
                        headers.push(line.trim().to_string());
                    }

                    let content_length = headers
                        .iter()
                        .find_map(|line| {
                            let (key, value) = line.split_once(':')?;
                            key.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);

                    let mut body = vec![0u8; content_length];
                    if reader.read_exact(&mut body).await.is_err() {
                        return;
                    }

                    let request = Recorded {
                        method,
                        path,
                        headers,
                        body: String::from_utf8_lossy(&body).to_string(),
                        at: Instant::now(),
                    };

                    let index = {
                        let mut requests = recorded.lock().unwrap();
                        requests.push(request.clone());
                        requests.len() - 1
                    };

                    let responder = match reply {
                        Reply::Full(responder) => responder,
                        Reply::Stalled(head) => {
                            let _ = reader.get_mut().write_all(head.as_bytes()).await;
                            let _ = reader.get_mut().flush().await;
                            let _ = reader.read_to_end(&mut Vec::new()).await;
                            return;
                        }
                        Reply::Silent => {
                            // hold the connection open without replying
                            let _ = reader.read_to_end(&mut Vec::new()).await;
                            return;
                        }
                    };

                    let (status, response_body) = responder(index, &request);
                    let http_response = format!(
                        "HTTP/1.1 {status} MOCK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response_body}",
                        response_body.len()
                    );

                    let mut stream = reader.into_inner();
                    let _ = stream.write_all(http_response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        MockDevice {
            port,
            requests,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A local port nothing listens on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind probe listener");
    let addr: SocketAddr = listener.local_addr().expect("no local addr");
    drop(listener);
    addr.port()
}
