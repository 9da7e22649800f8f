#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Read;
use std::sync::{Arc, Mutex};

use redfish::transport::{Body, PartContent, Request, Response, Transport};
use redfish::{Client, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

pub const ENDPOINT: &str = "https://bmc.example";

/// A canned answer.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_owned(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self::json(status, "")
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_owned()));
        self
    }
}

/// What the transport saw.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub json: Option<serde_json::Value>,
    pub parts: Vec<(String, String)>,
}

#[derive(Default)]
struct State {
    routes: HashMap<(String, String), VecDeque<Reply>>,
    seen: Vec<Seen>,
}

/// Answers requests from per-route queues and records every request.
///
/// The last reply queued for a route is repeated; unknown routes get a 404.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: &str, path: &str, reply: Reply) -> &Self {
        let mut state = self.state.lock().expect("lock");
        state
            .routes
            .entry((method.to_owned(), path.to_owned()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.state.lock().expect("lock").seen.clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.seen()
            .iter()
            .filter(|s| s.method == method && s.path == path)
            .count()
    }

    pub fn client(&self) -> Client {
        Client::builder(ENDPOINT)
            .transport(self.clone())
            .build()
            .expect("client")
    }
}

impl Transport for MockTransport {
    fn send(&self, request: Request) -> Result<Response> {
        let path = request
            .url
            .strip_prefix(ENDPOINT)
            .unwrap_or(&request.url)
            .to_owned();
        let method = request.method.to_string();

        let mut json = None;
        let mut parts = Vec::new();
        match request.body {
            Body::Empty => {}
            Body::Json(bytes) => json = serde_json::from_slice(&bytes).ok(),
            Body::Multipart(form) => {
                for part in form {
                    let value = match part.content {
                        PartContent::Text(text) => text,
                        PartContent::Json(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                        PartContent::File {
                            file_name,
                            mut reader,
                        } => {
                            let mut content = String::new();
                            reader.read_to_string(&mut content).expect("read part");
                            format!("{file_name}:{content}")
                        }
                    };
                    parts.push((part.name, value));
                }
            }
        }

        let mut state = self.state.lock().expect("lock");
        state.seen.push(Seen {
            method: method.clone(),
            path: path.clone(),
            headers: request.headers,
            json,
            parts,
        });

        let reply = match state.routes.get_mut(&(method, path)) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        }
        .unwrap_or_else(|| {
            Reply::json(
                404,
                r#"{"error": {"code": "Base.1.0.ResourceMissingAtURI", "message": "not found"}}"#,
            )
        });

        let mut headers = HeaderMap::new();
        for (name, value) in &reply.headers {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_str(value).expect("header value"),
            );
        }
        Ok(Response::new(reply.status, headers, reply.body.into_bytes()))
    }
}
