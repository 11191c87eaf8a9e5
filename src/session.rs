//! Application context shared by the query and mutation clients.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::cache::QueryCache;
use crate::event::{AlertKind, AlertSink, Navigator};
use crate::gateway::Gateway;

/// Everything a request cycle needs: the gateway, the query cache, the alert
/// and navigation sinks, and the product the user is working in.
///
/// One session lives from sign-in to [`Session::end`].
pub struct Session {
  gateway: Gateway,
  cache: QueryCache,
  alerts: Arc<dyn AlertSink>,
  navigator: Arc<dyn Navigator>,
  active_product: RwLock<Option<String>>,
}

impl Session {
  pub fn start(
    gateway: Gateway,
    cache: QueryCache,
    alerts: Arc<dyn AlertSink>,
    navigator: Arc<dyn Navigator>,
    active_product: Option<String>,
  ) -> Self {
    info!(active_product = ?active_product, "session started");
    Self {
      gateway,
      cache,
      alerts,
      navigator,
      active_product: RwLock::new(active_product),
    }
  }

  pub fn gateway(&self) -> &Gateway {
    &self.gateway
  }

  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  pub fn alert(&self, kind: AlertKind, message: &str) {
    self.alerts.display_alert(kind, message);
  }

  pub fn navigate(&self, route: &str) {
    self.navigator.navigate(route);
  }

  pub fn active_product(&self) -> Option<String> {
    self
      .active_product
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn set_active_product(&self, product_uuid: Option<String>) {
    *self
      .active_product
      .write()
      .unwrap_or_else(PoisonError::into_inner) = product_uuid;
  }

  /// Forget cached results and the active product.
  pub fn end(&self) {
    self.cache.clear();
    self.set_active_product(None);
    info!("session ended");
  }
}
