use std::fmt;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
  Success,
  Error,
}

impl fmt::Display for AlertKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Success => f.write_str("success"),
      Self::Error => f.write_str("error"),
    }
  }
}

/// User-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
  pub kind: AlertKind,
  pub message: String,
}

/// Where alerts are displayed.
pub trait AlertSink: Send + Sync {
  fn display_alert(&self, kind: AlertKind, message: &str);
}

/// Where post-mutation redirects go.
pub trait Navigator: Send + Sync {
  fn navigate(&self, route: &str);
}

/// Side effects a session emits toward the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Alert(Alert),
  Navigate(String),
}

/// Sending half of the session event channel; acts as both alert sink and navigator
#[derive(Debug, Clone)]
pub struct EventSender {
  tx: mpsc::UnboundedSender<Event>,
}

impl AlertSink for EventSender {
  fn display_alert(&self, kind: AlertKind, message: &str) {
    // Receiver may have been dropped at shutdown
    let _ = self.tx.send(Event::Alert(Alert {
      kind,
      message: message.to_string(),
    }));
  }
}

impl Navigator for EventSender {
  fn navigate(&self, route: &str) {
    let _ = self.tx.send(Event::Navigate(route.to_string()));
  }
}

/// Receiving half of the session event channel
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn channel() -> (EventSender, Self) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, Self { rx })
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }

  /// Drain everything queued so far without waiting
  pub fn drain(&mut self) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = self.rx.try_recv() {
      events.push(event);
    }
    events
  }
}

/// Sink that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
  fn display_alert(&self, kind: AlertKind, message: &str) {
    match kind {
      AlertKind::Success => info!(%message, "alert"),
      AlertKind::Error => error!(%message, "alert"),
    }
  }
}

impl Navigator for LogSink {
  fn navigate(&self, route: &str) {
    info!(%route, "navigate");
  }
}
