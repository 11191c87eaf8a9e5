//! Product loading and selection.
//!
//! The states and the pure [`transition`] function know nothing about I/O;
//! [`ProductMachine`] runs the one fetch and keeps the session's active
//! product in step with the selection.

use std::sync::Arc;
use tracing::{info, warn};

use crate::session::Session;

use super::queries::QueryClient;
use super::types::Product;

#[derive(Debug, Clone, PartialEq)]
pub enum ProductState {
  ProductsLoading,
  ProductsLoaded {
    products: Vec<Product>,
    /// At most one; `None` only when the list is empty
    selected: Option<Product>,
  },
  ProductsLoadingFailed {
    error: String,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductEvent {
  ProductsFetched(Vec<Product>),
  ProductsFetchFailed(String),
  SelectProduct(String),
}

/// Compute the next state. Events that make no sense in the current state
/// leave it unchanged.
pub fn transition(
  state: ProductState,
  event: ProductEvent,
  active_product: Option<&str>,
) -> ProductState {
  match (state, event) {
    (ProductState::ProductsLoading, ProductEvent::ProductsFetched(products)) => {
      let selected = active_product
        .and_then(|active| find(&products, active))
        .or_else(|| products.first())
        .cloned();
      ProductState::ProductsLoaded { products, selected }
    }
    (ProductState::ProductsLoading, ProductEvent::ProductsFetchFailed(error)) => {
      ProductState::ProductsLoadingFailed { error }
    }
    (ProductState::ProductsLoaded { products, selected }, ProductEvent::SelectProduct(uuid)) => {
      let selected = find(&products, &uuid).cloned().or(selected);
      ProductState::ProductsLoaded { products, selected }
    }
    (state, _) => state,
  }
}

fn find<'a>(products: &'a [Product], uuid: &str) -> Option<&'a Product> {
  products
    .iter()
    .find(|p| p.product_uuid.as_deref() == Some(uuid))
}

pub struct ProductMachine {
  session: Arc<Session>,
  queries: QueryClient,
  state: ProductState,
}

impl ProductMachine {
  pub fn new(session: Arc<Session>) -> Self {
    Self {
      queries: QueryClient::new(session.clone()),
      session,
      state: ProductState::ProductsLoading,
    }
  }

  pub fn state(&self) -> &ProductState {
    &self.state
  }

  pub fn selected_product(&self) -> Option<&Product> {
    match &self.state {
      ProductState::ProductsLoaded { selected, .. } => selected.as_ref(),
      _ => None,
    }
  }

  /// Fetch the product list of an organization. Only acts while loading.
  pub async fn load(&mut self, organization_uuid: Option<&str>) -> &ProductState {
    if self.state != ProductState::ProductsLoading {
      return &self.state;
    }

    let event = match self.queries.try_list::<Product>(organization_uuid, &[]).await {
      Ok(products) => ProductEvent::ProductsFetched(products),
      Err(e) => {
        warn!(error = %e, "product list fetch failed");
        ProductEvent::ProductsFetchFailed(e.to_string())
      }
    };
    self.send(event)
  }

  pub fn send(&mut self, event: ProductEvent) -> &ProductState {
    let active = self.session.active_product();
    let state = std::mem::replace(&mut self.state, ProductState::ProductsLoading);
    self.state = transition(state, event, active.as_deref());

    if let Some(product) = self.selected_product() {
      let uuid = product.product_uuid.clone();
      if uuid != active {
        info!(product = ?uuid, "active product changed");
        self.session.set_active_product(uuid);
      }
    }
    &self.state
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::AlertKind;
  use crate::testing::harness;

  fn product(uuid: &str) -> Product {
    Product {
      product_uuid: Some(uuid.to_string()),
      name: uuid.to_uppercase(),
      ..Product::default()
    }
  }

  fn loaded(active: Option<&str>) -> ProductState {
    transition(
      ProductState::ProductsLoading,
      ProductEvent::ProductsFetched(vec![product("a"), product("b")]),
      active,
    )
  }

  fn selected(state: &ProductState) -> Option<&str> {
    match state {
      ProductState::ProductsLoaded { selected, .. } => {
        selected.as_ref().and_then(|p| p.product_uuid.as_deref())
      }
      _ => None,
    }
  }

  #[test]
  fn test_fetch_selects_active_product() {
    assert_eq!(selected(&loaded(Some("b"))), Some("b"));
  }

  #[test]
  fn test_fetch_defaults_to_first_product() {
    assert_eq!(selected(&loaded(None)), Some("a"));
    assert_eq!(selected(&loaded(Some("zzz"))), Some("a"));
  }

  #[test]
  fn test_empty_list_selects_nothing() {
    let state = transition(
      ProductState::ProductsLoading,
      ProductEvent::ProductsFetched(Vec::new()),
      Some("a"),
    );
    assert_eq!(
      state,
      ProductState::ProductsLoaded {
        products: Vec::new(),
        selected: None,
      }
    );
  }

  #[test]
  fn test_fetch_failure() {
    let state = transition(
      ProductState::ProductsLoading,
      ProductEvent::ProductsFetchFailed("offline".to_string()),
      None,
    );
    assert_eq!(
      state,
      ProductState::ProductsLoadingFailed {
        error: "offline".to_string()
      }
    );
  }

  #[test]
  fn test_select_product() {
    let state = transition(
      loaded(None),
      ProductEvent::SelectProduct("b".to_string()),
      None,
    );
    assert_eq!(selected(&state), Some("b"));
  }

  #[test]
  fn test_select_unknown_product_keeps_selection() {
    let state = transition(
      loaded(Some("b")),
      ProductEvent::SelectProduct("missing".to_string()),
      None,
    );
    assert_eq!(selected(&state), Some("b"));
  }

  #[test]
  fn test_irrelevant_events_are_ignored() {
    let loading = transition(
      ProductState::ProductsLoading,
      ProductEvent::SelectProduct("a".to_string()),
      None,
    );
    assert_eq!(loading, ProductState::ProductsLoading);

    let failed = ProductState::ProductsLoadingFailed {
      error: "x".to_string(),
    };
    assert_eq!(
      transition(
        failed.clone(),
        ProductEvent::ProductsFetched(vec![product("a")]),
        None
      ),
      failed
    );

    let before = loaded(None);
    assert_eq!(
      transition(
        before.clone(),
        ProductEvent::ProductsFetchFailed("late".to_string()),
        None
      ),
      before
    );
  }

  #[tokio::test]
  async fn test_machine_loads_and_tracks_active_product() {
    let h = harness();
    h.transport.route(
      "product.test/product/",
      200,
      r#"[{"product_uuid":"a","name":"A"},{"product_uuid":"b","name":"B"}]"#,
    );
    h.session.set_active_product(Some("b".to_string()));
    let mut machine = ProductMachine::new(h.session.clone());

    machine.load(Some("org")).await;
    assert_eq!(selected(machine.state()), Some("b"));

    machine.send(ProductEvent::SelectProduct("a".to_string()));
    assert_eq!(selected(machine.state()), Some("a"));
    assert_eq!(h.session.active_product().as_deref(), Some("a"));

    // Loading happens once
    machine.load(Some("org")).await;
    assert_eq!(h.transport.requests().len(), 1);
  }

  #[tokio::test]
  async fn test_machine_records_failure_without_alert() {
    let h = harness();
    h.transport.route("/product/", 500, "down");
    let mut machine = ProductMachine::new(h.session.clone());

    let state = machine.load(Some("org")).await.clone();

    assert!(matches!(state, ProductState::ProductsLoadingFailed { .. }));
    assert_eq!(h.transport.requests().len(), 2);
    assert_eq!(h.sink.count(AlertKind::Error), 0);
  }
}
