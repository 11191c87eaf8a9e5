//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::cache::{CacheStorage, CachedEntry, MemoryStorage, QueryCache, QueryKey};
use crate::config::{ServiceTable, ServicesConfig};
use crate::event::{Alert, AlertKind, AlertSink, Navigator};
use crate::gateway::{
  Gateway, GatewayError, HttpRequest, HttpResponse, HttpTransport, StaticToken,
};
use crate::session::Session;

type Reply = Result<HttpResponse, GatewayError>;

struct Route {
  method: Option<Method>,
  url_contains: String,
  reply: Reply,
}

/// Transport that records requests and answers from routes, then a FIFO queue.
#[derive(Default)]
pub struct StubTransport {
  requests: Mutex<Vec<HttpRequest>>,
  routes: Mutex<Vec<Route>>,
  queue: Mutex<VecDeque<Reply>>,
}

fn reply(status: u16, body: &str) -> Reply {
  Ok(HttpResponse {
    status,
    body: body.as_bytes().to_vec(),
  })
}

impl StubTransport {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue a response for the next unrouted request.
  pub fn respond(&self, status: u16, body: &str) {
    self.queue.lock().unwrap().push_back(reply(status, body));
  }

  /// Answer every request whose URL contains `url_contains`.
  pub fn route(&self, url_contains: &str, status: u16, body: &str) {
    self.routes.lock().unwrap().push(Route {
      method: None,
      url_contains: url_contains.to_string(),
      reply: reply(status, body),
    });
  }

  pub fn route_method(&self, method: Method, url_contains: &str, status: u16, body: &str) {
    self.routes.lock().unwrap().push(Route {
      method: Some(method),
      url_contains: url_contains.to_string(),
      reply: reply(status, body),
    });
  }

  /// Fail every request whose URL contains `url_contains` at the transport level.
  pub fn fail(&self, url_contains: &str) {
    self.routes.lock().unwrap().push(Route {
      method: None,
      url_contains: url_contains.to_string(),
      reply: Err(GatewayError::Transport("connection refused".to_string())),
    });
  }

  pub fn requests(&self) -> Vec<HttpRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn urls(&self) -> Vec<String> {
    self
      .requests()
      .into_iter()
      .map(|r| format!("{} {}", r.method, r.url))
      .collect()
  }
}

#[async_trait]
impl HttpTransport for StubTransport {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GatewayError> {
    let url = request.url.to_string();
    let method = request.method.clone();
    self.requests.lock().unwrap().push(request);

    let routed = self
      .routes
      .lock()
      .unwrap()
      .iter()
      .find(|r| {
        url.contains(&r.url_contains) && r.method.as_ref().map_or(true, |m| *m == method)
      })
      .map(|r| r.reply.clone());
    if let Some(reply) = routed {
      return reply;
    }

    self
      .queue
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Err(GatewayError::Transport(format!("no stub for {}", url))))
  }
}

/// Alert sink and navigator that remembers everything.
#[derive(Default)]
pub struct RecordingSink {
  alerts: Mutex<Vec<Alert>>,
  routes: Mutex<Vec<String>>,
}

impl RecordingSink {
  pub fn alerts(&self) -> Vec<Alert> {
    self.alerts.lock().unwrap().clone()
  }

  pub fn count(&self, kind: AlertKind) -> usize {
    self.alerts().iter().filter(|a| a.kind == kind).count()
  }

  pub fn routes(&self) -> Vec<String> {
    self.routes.lock().unwrap().clone()
  }
}

impl AlertSink for RecordingSink {
  fn display_alert(&self, kind: AlertKind, message: &str) {
    self.alerts.lock().unwrap().push(Alert {
      kind,
      message: message.to_string(),
    });
  }
}

impl Navigator for RecordingSink {
  fn navigate(&self, route: &str) {
    self.routes.lock().unwrap().push(route.to_string());
  }
}

/// In-memory storage that logs every invalidation it receives.
#[derive(Default)]
pub struct CountingStorage {
  inner: MemoryStorage,
  invalidated: Arc<Mutex<Vec<QueryKey>>>,
}

impl CountingStorage {
  /// Handle to the invalidation log that outlives moving the storage into a cache.
  pub fn log(&self) -> Arc<Mutex<Vec<QueryKey>>> {
    self.invalidated.clone()
  }
}

impl CacheStorage for CountingStorage {
  fn get(&self, key: &QueryKey) -> Option<CachedEntry> {
    self.inner.get(key)
  }

  fn store(&self, key: QueryKey, value: Value) {
    self.inner.store(key, value);
  }

  fn invalidate(&self, prefix: &QueryKey) -> usize {
    self.invalidated.lock().unwrap().push(prefix.clone());
    self.inner.invalidate(prefix)
  }

  fn clear(&self) {
    self.inner.clear();
  }
}

pub struct Harness {
  pub session: Arc<Session>,
  pub transport: Arc<StubTransport>,
  pub sink: Arc<RecordingSink>,
}

/// Release and product services on their own hosts so direct and fallback
/// calls are distinguishable.
pub fn services() -> ServicesConfig {
  ServicesConfig {
    api_url: "https://api.test".to_string(),
    product_service_url: Some("https://product.test".to_string()),
    release_service_url: Some("https://release.test".to_string()),
    collabhub_url: Some("https://collab.test".to_string()),
    feedback_sheet: Some("https://sheet.test/feedback".to_string()),
  }
}

/// Session over any transport and cache, reporting into `sink`.
pub fn session_with(
  services: &ServicesConfig,
  transport: Arc<dyn HttpTransport>,
  cache: QueryCache,
  sink: Arc<RecordingSink>,
) -> Arc<Session> {
  let gateway = Gateway::new(
    ServiceTable::from_config(services).unwrap(),
    transport,
    Arc::new(StaticToken("token".to_string())),
  );
  Arc::new(Session::start(gateway, cache, sink.clone(), sink, None))
}

pub fn harness() -> Harness {
  harness_with(services())
}

/// Session wired to a stub transport.
pub fn harness_with(services: ServicesConfig) -> Harness {
  let transport = Arc::new(StubTransport::new());
  let sink = Arc::new(RecordingSink::default());
  let session = session_with(
    &services,
    transport.clone(),
    QueryCache::new(chrono::Duration::seconds(30)),
    sink.clone(),
  );

  Harness {
    session,
    transport,
    sink,
  }
}
