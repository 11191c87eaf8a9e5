use serde_json::Value;
use thiserror::Error;

/// Failure of a single gateway call.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
  /// The request never produced a response
  #[error("transport error: {0}")]
  Transport(String),

  /// The backend answered with a non-2xx status
  #[error("backend returned HTTP {status}: {body}")]
  Status { status: u16, body: String },

  #[error("no access token available")]
  MissingToken,

  #[error("invalid request URL: {0}")]
  InvalidUrl(String),

  #[error("failed to encode request or decode response: {0}")]
  Codec(String),

  #[error("no base URL configured for {0}")]
  UnconfiguredService(String),
}

impl GatewayError {
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn is_not_found(&self) -> bool {
    self.status() == Some(404)
  }

  /// Human-readable message supplied by the backend, if the error body has one.
  ///
  /// Recognizes `{"detail": "..."}`, `{"message": "..."}` and field error maps
  /// like `{"name": ["This field is required."]}`.
  pub fn detail(&self) -> Option<String> {
    let Self::Status { body, .. } = self else {
      return None;
    };
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["detail", "message", "error"] {
      if let Some(text) = object.get(key).and_then(Value::as_str) {
        return Some(text.to_string());
      }
    }

    object.iter().find_map(|(field, errors)| {
      let first = match errors {
        Value::Array(items) => items.first()?.as_str()?,
        Value::String(s) => s.as_str(),
        _ => return None,
      };
      Some(format!("{}: {}", field, first))
    })
  }
}
