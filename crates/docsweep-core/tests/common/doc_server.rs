//! Minimal HTTP/1.1 server for integration tests.
//!
//! Every request is answered by a caller-supplied route function keyed on the
//! request target (path + query). Requests are recorded so tests can assert
//! which ids were fetched and which headers were sent.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Canned response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl Reply {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            location: None,
            body: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn pdf(body: &[u8]) -> Self {
        Self::new(200).content_type("application/pdf").body(body)
    }

    pub fn html(body: &str) -> Self {
        Self::new(200)
            .content_type("text/html; charset=utf-8")
            .body(body.as_bytes())
    }

    pub fn redirect(location: &str) -> Self {
        let mut r = Self::new(302);
        r.location = Some(location.to_string());
        r
    }

    pub fn content_type(mut self, ct: &str) -> Self {
        self.content_type = Some(ct.to_string());
        self
    }

    pub fn body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One request as seen by the server.
#[derive(Debug, Clone, Default)]
pub struct Seen {
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl Seen {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `for_id` query value, if present.
    pub fn id(&self) -> Option<u64> {
        id_of(&self.target)
    }
}

pub struct DocServer {
    pub base: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl DocServer {
    /// Template whose rendered URLs hit `/doc?for_id=<id>` on this server.
    pub fn url_template(&self) -> String {
        format!("{}/doc?for_id={{id}}", self.base)
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// Ids requested via `/doc`, in arrival order.
    pub fn requested_ids(&self) -> Vec<u64> {
        self.requests().iter().filter_map(Seen::id).collect()
    }
}

/// Extract the `for_id` query parameter from a request target.
pub fn id_of(target: &str) -> Option<u64> {
    let (_, query) = target.split_once('?')?;
    query
        .split('&')
        .find_map(|kv| kv.strip_prefix("for_id="))
        .and_then(|v| v.parse().ok())
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start<F>(route: F) -> DocServer
where
    F: Fn(&str) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let route = Arc::new(route);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_srv = Arc::clone(&seen);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let route = Arc::clone(&route);
            let seen = Arc::clone(&seen_srv);
            thread::spawn(move || handle(stream, route.as_ref(), &seen));
        }
    });
    DocServer {
        base: format!("http://127.0.0.1:{}", port),
        seen,
    }
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().unwrap().port()
}

fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if buf.len() > 64 * 1024 {
            break;
        }
    }
    String::from_utf8(buf).ok()
}

fn handle<F>(mut stream: TcpStream, route: &F, seen: &Mutex<Vec<Seen>>)
where
    F: Fn(&str) -> Reply + ?Sized,
{
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let Some(head) = read_head(&mut stream) else {
        return;
    };
    let mut lines = head.lines();
    let target = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();
    seen.lock().unwrap().push(Seen {
        target: target.clone(),
        headers,
    });

    let reply = route(&target);
    if !reply.delay.is_zero() {
        thread::sleep(reply.delay);
    }
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reason(reply.status),
        reply.body.len()
    );
    if let Some(ct) = &reply.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    if let Some(loc) = &reply.location {
        head.push_str(&format!("Location: {}\r\n", loc));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&reply.body);
    let _ = stream.flush();
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
