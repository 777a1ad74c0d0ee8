//! In-process stand-in for the signing backend, used by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::net::api::ApiClient;

#[derive(Debug, Clone)]
pub(crate) struct MockReply {
    status: StatusCode,
    body: Vec<u8>,
    content_type: &'static str,
    delay: Duration,
}

impl MockReply {
    pub(crate) fn json(value: Value) -> Self {
        Self::status(200, value)
    }

    pub(crate) fn status(code: u16, value: Value) -> Self {
        Self {
            status: StatusCode::from_u16(code).unwrap(),
            body: value.to_string().into_bytes(),
            content_type: "application/json",
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn bytes(body: &[u8], content_type: &'static str) -> Self {
        Self { status: StatusCode::OK, body: body.to_vec(), content_type, delay: Duration::ZERO }
    }

    pub(crate) fn empty(code: u16) -> Self {
        Self {
            status: StatusCode::from_u16(code).unwrap(),
            body: Vec::new(),
            content_type: "text/plain",
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub(crate) fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

type Routes = Arc<Mutex<HashMap<(String, String), MockReply>>>;

#[derive(Clone)]
struct MockState {
    routes: Routes,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub(crate) struct MockServer {
    pub base_url: String,
    state: MockState,
    task: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub(crate) async fn start() -> Self {
        let state = MockState { routes: Arc::default(), requests: Arc::default() };
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base_url: format!("http://{addr}"), state, task }
    }

    pub(crate) fn route(&self, method: &str, path: &str, reply: MockReply) {
        self.state
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((method.to_owned(), path.to_owned()), reply);
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub(crate) fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url)
    }

    pub(crate) fn api(&self) -> ApiClient {
        ApiClient::new(&self.config()).unwrap()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(State(state): State<MockState>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let header_value =
        |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    let recorded = Recorded {
        method: method.as_str().to_owned(),
        path: uri.path().to_owned(),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body: body.to_vec(),
    };
    state.requests.lock().unwrap_or_else(PoisonError::into_inner).push(recorded);

    let reply = state
        .routes
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&(method.as_str().to_owned(), uri.path().to_owned()))
        .cloned();
    let Some(reply) = reply else {
        return (StatusCode::NOT_FOUND, [(header::CONTENT_TYPE, "application/json")], r#"{"msg":"no route"}"#)
            .into_response();
    };
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    (reply.status, [(header::CONTENT_TYPE, reply.content_type)], reply.body).into_response()
}
