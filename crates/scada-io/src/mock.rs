//! In-process fake backend for tests.
//!
//! Serves canned `(status, body)` replies keyed by method and raw request
//! path, and records every request it receives.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path as sent, still percent-encoded.
    pub path: String,
    pub body: String,
}

#[derive(Debug, Clone)]
struct Reply {
    status: u16,
    body: Vec<u8>,
    delay: Option<Duration>,
}

type Routes = Arc<Mutex<HashMap<(String, String), Reply>>>;

pub struct MockBackend {
    server: Arc<Server>,
    base_url: String,
    routes: Routes,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl MockBackend {
    pub fn start() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let server = Arc::new(Server::http("127.0.0.1:0")?);
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or("mock backend is not bound to an IP address")?;
        let routes: Routes = Arc::default();
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();

        let worker = {
            let server = Arc::clone(&server);
            let routes = Arc::clone(&routes);
            let requests = Arc::clone(&requests);
            thread::spawn(move || serve(&server, &routes, &requests))
        };

        Ok(Self {
            server,
            base_url: format!("http://{addr}"),
            routes,
            requests,
            worker: Some(worker),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register or replace the reply for `method path`.
    pub fn route(&self, method: &str, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.insert(method, path, Reply {
            status,
            body: body.into(),
            delay: None,
        });
    }

    pub fn route_json(&self, method: &str, path: &str, body: &serde_json::Value) {
        self.route(method, path, 200, body.to_string());
    }

    /// Reply only after `delay`.
    pub fn route_delayed(
        &self,
        method: &str,
        path: &str,
        delay: Duration,
        body: &serde_json::Value,
    ) {
        self.insert(method, path, Reply {
            status: 200,
            body: body.to_string().into_bytes(),
            delay: Some(delay),
        });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn hits(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn insert(&self, method: &str, path: &str, reply: Reply) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert((method.to_string(), path.to_string()), reply);
        }
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn serve(server: &Server, routes: &Routes, requests: &Mutex<Vec<RecordedRequest>>) {
    for mut request in server.incoming_requests() {
        let method = request.method().to_string();
        let path = request.url().to_string();
        let mut body = String::new();
        let _ = request.as_reader().read_to_string(&mut body);

        if let Ok(mut log) = requests.lock() {
            log.push(RecordedRequest {
                method: method.clone(),
                path: path.clone(),
                body,
            });
        }

        let reply = routes
            .lock()
            .ok()
            .and_then(|r| r.get(&(method, path)).cloned());

        let response = match reply {
            Some(reply) => {
                if let Some(delay) = reply.delay {
                    thread::sleep(delay);
                }
                let mut response = Response::from_data(reply.body).with_status_code(reply.status);
                if let Ok(header) =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                {
                    response = response.with_header(header);
                }
                response
            }
            None => Response::from_data(b"Not Found".to_vec()).with_status_code(404),
        };
        let _ = request.respond(response);
    }
}
