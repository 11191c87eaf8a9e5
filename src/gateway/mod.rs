//! The single function through which every outbound HTTP call is issued.
//!
//! The gateway resolves a [`ServiceTarget`] and path to a URL, attaches the
//! bearer token, sends through an [`HttpTransport`], and hands back either the
//! 2xx response or the backend's error unchanged. It never retries.

mod error;
mod transport;

pub use error::GatewayError;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::config::{ServiceTable, ServiceTarget};

/// Source of the bearer token attached to authorized requests.
pub trait TokenProvider: Send + Sync {
  fn access_token(&self) -> Option<String>;
}

/// A token fixed for the lifetime of the session.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
  fn access_token(&self) -> Option<String> {
    Some(self.0.clone())
  }
}

/// How the caller expects to consume the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
  #[default]
  Json,
  Text,
  Blob,
}

impl ResponseType {
  fn accept(self) -> &'static str {
    match self {
      Self::Json => "application/json",
      Self::Text => "text/plain",
      Self::Blob => "*/*",
    }
  }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
  Json(Value),
  Raw(Vec<u8>),
}

/// One call through the gateway.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
  pub method: Method,
  pub url: Url,
  pub body: Option<RequestBody>,
  /// Attach `Authorization: Bearer <token>`
  pub with_auth: bool,
  /// Send anyway when no token is available instead of failing
  pub skip_auth: bool,
  pub content_type: Option<String>,
  pub response_type: ResponseType,
}

impl GatewayRequest {
  pub fn new(method: Method, url: Url) -> Self {
    Self {
      method,
      url,
      body: None,
      with_auth: true,
      skip_auth: false,
      content_type: None,
      response_type: ResponseType::default(),
    }
  }

  pub fn get(url: Url) -> Self {
    Self::new(Method::GET, url)
  }

  pub fn json(mut self, body: Value) -> Self {
    self.body = Some(RequestBody::Json(body));
    self
  }

  pub fn raw(mut self, body: Vec<u8>, content_type: &str) -> Self {
    self.body = Some(RequestBody::Raw(body));
    self.content_type = Some(content_type.to_string());
    self
  }

  pub fn without_auth(mut self) -> Self {
    self.with_auth = false;
    self
  }

  pub fn skip_auth(mut self) -> Self {
    self.skip_auth = true;
    self
  }

  pub fn response_type(mut self, response_type: ResponseType) -> Self {
    self.response_type = response_type;
    self
  }
}

#[derive(Clone)]
pub struct Gateway {
  services: ServiceTable,
  transport: Arc<dyn HttpTransport>,
  tokens: Arc<dyn TokenProvider>,
}

impl Gateway {
  pub fn new(
    services: ServiceTable,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenProvider>,
  ) -> Self {
    Self {
      services,
      transport,
      tokens,
    }
  }

  /// URL of `path` on the service itself.
  pub fn url(
    &self,
    target: ServiceTarget,
    path: &str,
    query: &[(String, String)],
  ) -> Result<Url, GatewayError> {
    let base = self
      .services
      .base(target)
      .ok_or_else(|| GatewayError::UnconfiguredService(format!("{:?}", target)))?;
    resolve(base, path, query)
  }

  /// URL of the same route through the main API gateway.
  ///
  /// `None` for targets the gateway does not proxy.
  pub fn gateway_url(
    &self,
    target: ServiceTarget,
    path: &str,
    query: &[(String, String)],
  ) -> Option<Result<Url, GatewayError>> {
    let prefix = target.gateway_prefix()?;
    Some(resolve(
      self.services.api_url(),
      &format!("{}/{}", prefix, path),
      query,
    ))
  }

  /// Dispatch one request. Non-2xx responses come back as
  /// [`GatewayError::Status`] carrying the body untouched.
  pub async fn request(&self, request: GatewayRequest) -> Result<HttpResponse, GatewayError> {
    let mut headers = vec![(
      "Accept".to_string(),
      request.response_type.accept().to_string(),
    )];

    if request.with_auth {
      match self.tokens.access_token() {
        Some(token) => headers.push(("Authorization".to_string(), format!("Bearer {}", token))),
        None if request.skip_auth => {}
        None => return Err(GatewayError::MissingToken),
      }
    }

    let body = match request.body {
      Some(RequestBody::Json(value)) => {
        Some(serde_json::to_vec(&value).map_err(|e| GatewayError::Codec(e.to_string()))?)
      }
      Some(RequestBody::Raw(bytes)) => Some(bytes),
      None => None,
    };
    if body.is_some() || request.content_type.is_some() {
      let content_type = request
        .content_type
        .unwrap_or_else(|| "application/json".to_string());
      headers.push(("Content-Type".to_string(), content_type));
    }

    debug!(method = %request.method, url = %request.url, "gateway request");
    let response = self
      .transport
      .send(HttpRequest {
        method: request.method.clone(),
        url: request.url.clone(),
        headers,
        body,
      })
      .await?;
    debug!(
      method = %request.method,
      url = %request.url,
      status = response.status,
      "gateway response"
    );

    if response.is_success() {
      Ok(response)
    } else {
      Err(GatewayError::Status {
        status: response.status,
        body: response.text(),
      })
    }
  }

  /// Dispatch and decode a JSON body. An empty body decodes as `null`.
  pub async fn request_json<T: DeserializeOwned>(
    &self,
    request: GatewayRequest,
  ) -> Result<T, GatewayError> {
    let response = self.request(request).await?;
    if response.body.iter().all(u8::is_ascii_whitespace) {
      return serde_json::from_value(Value::Null).map_err(|e| GatewayError::Codec(e.to_string()));
    }
    serde_json::from_slice(&response.body).map_err(|e| GatewayError::Codec(e.to_string()))
  }
}

fn resolve(base: &Url, path: &str, query: &[(String, String)]) -> Result<Url, GatewayError> {
  let mut url = base
    .join(path.trim_start_matches('/'))
    .map_err(|e| GatewayError::InvalidUrl(format!("{}{}: {}", base, path, e)))?;
  if !query.is_empty() {
    url
      .query_pairs_mut()
      .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
  }
  Ok(url)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ServicesConfig;
  use crate::testing::StubTransport;

  struct NoToken;

  impl TokenProvider for NoToken {
    fn access_token(&self) -> Option<String> {
      None
    }
  }

  fn table() -> ServiceTable {
    ServiceTable::from_config(&ServicesConfig {
      api_url: "https://api.example.com".to_string(),
      release_service_url: Some("https://release.example.com".to_string()),
      ..ServicesConfig::default()
    })
    .unwrap()
  }

  fn gateway(stub: &Arc<StubTransport>, tokens: Arc<dyn TokenProvider>) -> Gateway {
    Gateway::new(table(), stub.clone(), tokens)
  }

  #[tokio::test]
  async fn test_attaches_bearer_token_and_json_content_type() {
    let stub = Arc::new(StubTransport::new());
    stub.respond(200, "{}");
    let gw = gateway(&stub, Arc::new(StaticToken("tok".into())));

    let url = gw.url(ServiceTarget::Release, "feature/", &[]).unwrap();
    gw.request(GatewayRequest::new(Method::POST, url).json(serde_json::json!({"a": 1})))
      .await
      .unwrap();

    let sent = stub.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url.as_str(), "https://release.example.com/feature/");
    assert_eq!(sent[0].header("authorization"), Some("Bearer tok"));
    assert_eq!(sent[0].header("content-type"), Some("application/json"));
    assert_eq!(sent[0].body.as_deref(), Some(br#"{"a":1}"#.as_slice()));
  }

  #[tokio::test]
  async fn test_raw_body_keeps_its_content_type() {
    let stub = Arc::new(StubTransport::new());
    stub.respond(200, "ok");
    let gw = gateway(&stub, Arc::new(StaticToken("tok".into())));

    let url = gw.url(ServiceTarget::Product, "budget/import/", &[]).unwrap();
    let response = gw
      .request(
        GatewayRequest::new(Method::POST, url)
          .raw(b"name,amount\nDesign,100\n".to_vec(), "text/csv")
          .response_type(ResponseType::Text),
      )
      .await
      .unwrap();

    let sent = &stub.requests()[0];
    assert_eq!(sent.header("content-type"), Some("text/csv"));
    assert_eq!(sent.header("accept"), Some("text/plain"));
    assert_eq!(
      sent.body.as_deref(),
      Some(b"name,amount\nDesign,100\n".as_slice())
    );
    assert_eq!(response.text(), "ok");
  }

  #[tokio::test]
  async fn test_blob_response_accepts_anything() {
    let stub = Arc::new(StubTransport::new());
    stub.respond(200, "%PDF");
    let gw = gateway(&stub, Arc::new(StaticToken("tok".into())));

    let url = gw.url(ServiceTarget::Release, "release/r1/report/", &[]).unwrap();
    let response = gw
      .request(GatewayRequest::get(url).response_type(ResponseType::Blob))
      .await
      .unwrap();

    let sent = &stub.requests()[0];
    assert_eq!(sent.header("accept"), Some("*/*"));
    assert_eq!(sent.header("content-type"), None);
    assert_eq!(response.body, b"%PDF".to_vec());
  }

  #[tokio::test]
  async fn test_missing_token_fails_before_sending() {
    let stub = Arc::new(StubTransport::new());
    let gw = gateway(&stub, Arc::new(NoToken));

    let url = gw.url(ServiceTarget::Main, "coreuser/", &[]).unwrap();
    let err = gw.request(GatewayRequest::get(url)).await.unwrap_err();

    assert!(matches!(err, GatewayError::MissingToken));
    assert!(stub.requests().is_empty());
  }

  #[tokio::test]
  async fn test_skip_auth_sends_without_header() {
    let stub = Arc::new(StubTransport::new());
    stub.respond(200, "[]");
    let gw = gateway(&stub, Arc::new(NoToken));

    let url = gw.url(ServiceTarget::Main, "coreuser/", &[]).unwrap();
    gw.request(GatewayRequest::get(url).skip_auth()).await.unwrap();

    assert_eq!(stub.requests()[0].header("authorization"), None);
  }

  #[tokio::test]
  async fn test_backend_error_is_returned_unchanged() {
    let stub = Arc::new(StubTransport::new());
    stub.respond(400, r#"{"detail":"bad"}"#);
    let gw = gateway(&stub, Arc::new(StaticToken("tok".into())));

    let url = gw.url(ServiceTarget::Main, "x/", &[]).unwrap();
    let err = gw.request(GatewayRequest::get(url)).await.unwrap_err();

    match err {
      GatewayError::Status { status, body } => {
        assert_eq!(status, 400);
        assert_eq!(body, r#"{"detail":"bad"}"#);
      }
      other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stub.requests().len(), 1);
  }

  #[tokio::test]
  async fn test_empty_body_decodes_as_null() {
    let stub = Arc::new(StubTransport::new());
    stub.respond(204, "");
    let gw = gateway(&stub, Arc::new(StaticToken("tok".into())));

    let url = gw.url(ServiceTarget::Main, "x/1/", &[]).unwrap();
    let value: Value = gw
      .request_json(GatewayRequest::new(Method::DELETE, url))
      .await
      .unwrap();
    assert_eq!(value, Value::Null);
  }

  #[test]
  fn test_gateway_url_prefixes_service_route() {
    let stub = Arc::new(StubTransport::new());
    let gw = gateway(&stub, Arc::new(NoToken));
    let query = vec![("product_uuid".to_string(), "p1".to_string())];

    let direct = gw.url(ServiceTarget::Release, "feature/", &query).unwrap();
    let fallback = gw
      .gateway_url(ServiceTarget::Release, "feature/", &query)
      .unwrap()
      .unwrap();

    assert_eq!(
      direct.as_str(),
      "https://release.example.com/feature/?product_uuid=p1"
    );
    assert_eq!(
      fallback.as_str(),
      "https://api.example.com/release/feature/?product_uuid=p1"
    );
    assert!(gw
      .gateway_url(ServiceTarget::FeedbackSheet, "", &[])
      .is_none());
  }
}
