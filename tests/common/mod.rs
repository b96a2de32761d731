//! Shared test helpers: a local fake upstream built on tiny_http.
//!
//! Each fake answers from a route closure, counts every request it
//! receives and responds from its own thread so that delayed replies do
//! not hold up other requests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into(), delay: Duration::ZERO }
    }

    pub fn status(status: u16) -> Self {
        Self { status, body: String::new(), delay: Duration::ZERO }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub struct FakeUpstream {
    base_url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
    server: Arc<Server>,
}

impl FakeUpstream {
    /// Starts a fake on an ephemeral local port. `route` receives the
    /// request URL (path and query).
    pub fn start<F>(route: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind fake upstream"));
        let addr = server.server_addr().to_ip().expect("fake upstream listens on an IP address");
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route = Arc::new(route);

        {
            let server = server.clone();
            let hits = hits.clone();
            let requests = requests.clone();
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    hits.fetch_add(1, Ordering::SeqCst);
                    requests.lock().unwrap().push(request.url().to_string());
                    let reply = route(request.url());

                    thread::spawn(move || {
                        if !reply.delay.is_zero() {
                            thread::sleep(reply.delay);
                        }
                        let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                        let response = Response::from_string(reply.body)
                            .with_status_code(reply.status)
                            .with_header(header);
                        // The client may have given up already (timeouts).
                        let _ = request.respond(response);
                    });
                }
            });
        }

        Self {
            base_url: format!("http://{}", addr),
            hits,
            requests,
            server,
        }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

/// Value of the last `&`-separated query segment, i.e. the pin name in a
/// single-pin sensor bridge request.
pub fn last_query_segment(url: &str) -> &str {
    url.rsplit('&').next().unwrap_or("")
}
