//! HTTP transport seam beneath the gateway.

use async_trait::async_trait;
use reqwest::Method;
use std::fmt;
use url::Url;

use super::error::GatewayError;

/// A fully built outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
  pub method: Method,
  pub url: Url,
  pub headers: Vec<(String, String)>,
  pub body: Option<Vec<u8>>,
}

impl HttpRequest {
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(k, _)| k.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
}

/// Raw response; status checking happens in the gateway.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  pub fn text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GatewayError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl fmt::Debug for ReqwestTransport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ReqwestTransport").finish_non_exhaustive()
  }
}

impl ReqwestTransport {
  pub fn new() -> Result<Self, GatewayError> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("buildly/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| GatewayError::Transport(format!("failed to initialize HTTP client: {}", e)))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GatewayError> {
    let mut builder = self.client.request(request.method, request.url);
    for (name, value) in &request.headers {
      builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body {
      builder = builder.body(body);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| GatewayError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
      .bytes()
      .await
      .map_err(|e| GatewayError::Transport(format!("failed to read response body: {}", e)))?;

    Ok(HttpResponse {
      status,
      body: body.to_vec(),
    })
  }
}
