//! Write side: create, update and delete with cache invalidation and alerts.
//!
//! Bulk operations send one request per item concurrently and succeed only
//! if every request does. Nothing is invalidated unless all of them succeed.
//! Requests already issued run to completion and are not rolled back.

use futures::future::try_join_all;
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::QueryKey;
use crate::config::ServiceTarget;
use crate::event::AlertKind;
use crate::gateway::{GatewayError, GatewayRequest};
use crate::session::Session;

use super::resource::{Resource, PRODUCT_SCOPED_QUERIES};
use super::types::{
  Board, Budget, Bug, Comment, Feature, Issue, Product, Punchlist, Release, Status, TaskCategory,
};

#[derive(Debug, Error)]
pub enum MutationError {
  #[error(transparent)]
  Gateway(#[from] GatewayError),

  #[error("{resource} has no identifier")]
  MissingIdentifier { resource: &'static str },
}

/// Caller-supplied extras for one mutation.
#[derive(Debug, Clone, Default)]
pub struct MutationOptions {
  /// Keys to invalidate on top of the ones derived from the payload
  pub invalidate: Vec<QueryKey>,
  /// Route to navigate to after success
  pub redirect: Option<String>,
  pub success_message: Option<String>,
}

impl MutationOptions {
  pub fn redirect(route: impl Into<String>) -> Self {
    Self {
      redirect: Some(route.into()),
      ..Self::default()
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
  Create,
  Update,
  Delete,
}

impl Action {
  fn method(self) -> Method {
    match self {
      Self::Create => Method::POST,
      Self::Update => Method::PUT,
      Self::Delete => Method::DELETE,
    }
  }

  fn verb(self) -> &'static str {
    match self {
      Self::Create => "create",
      Self::Update => "update",
      Self::Delete => "delete",
    }
  }

  fn past(self) -> &'static str {
    match self {
      Self::Create => "created",
      Self::Update => "updated",
      Self::Delete => "deleted",
    }
  }
}

/// Requests plus the bookkeeping to do once they all succeed.
struct Batch {
  requests: Vec<GatewayRequest>,
  keys: BTreeSet<QueryKey>,
  success_message: String,
  error_message: String,
  redirect: Option<String>,
}

#[derive(Clone)]
pub struct MutationClient {
  session: Arc<Session>,
}

impl MutationClient {
  pub fn new(session: Arc<Session>) -> Self {
    Self { session }
  }

  pub async fn create<R: Resource>(
    &self,
    item: &R,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self
      .run(Action::Create, std::slice::from_ref(item), options)
      .await
  }

  pub async fn update<R: Resource>(
    &self,
    item: &R,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self
      .run(Action::Update, std::slice::from_ref(item), options)
      .await
  }

  pub async fn delete<R: Resource>(
    &self,
    item: &R,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self
      .run(Action::Delete, std::slice::from_ref(item), options)
      .await
  }

  /// Create every item; responses are flattened in input order.
  pub async fn create_many<R: Resource>(
    &self,
    items: &[R],
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.run(Action::Create, items, options).await
  }

  pub async fn update_many<R: Resource>(
    &self,
    items: &[R],
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.run(Action::Update, items, options).await
  }

  async fn run<R: Resource>(
    &self,
    action: Action,
    items: &[R],
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    let error_message = format!("Couldn't {} {}!", action.verb(), R::LABEL);

    let batch = match self.batch(action, items, options, error_message.clone()) {
      Ok(batch) => batch,
      Err(e) => {
        self.session.alert(AlertKind::Error, &error_message);
        return Err(e);
      }
    };
    self.execute(batch).await
  }

  fn batch<R: Resource>(
    &self,
    action: Action,
    items: &[R],
    options: MutationOptions,
    error_message: String,
  ) -> Result<Batch, MutationError> {
    let mut requests = Vec::with_capacity(items.len());
    let mut keys: BTreeSet<QueryKey> = options.invalidate.into_iter().collect();

    for item in items {
      let path = match action {
        Action::Create => R::PATH.to_string(),
        Action::Update | Action::Delete => {
          let uuid = item
            .uuid()
            .ok_or(MutationError::MissingIdentifier { resource: R::LABEL })?;
          format!("{}{}/", R::PATH, uuid)
        }
      };

      let mut request = GatewayRequest::new(action.method(), self.write_url::<R>(&path)?);
      if action != Action::Delete {
        let body = serde_json::to_value(item).map_err(|e| GatewayError::Codec(e.to_string()))?;
        request = request.json(body);
      }
      if R::SERVICE == ServiceTarget::FeedbackSheet {
        request = request.without_auth();
      }

      requests.push(request);
      keys.extend(item.affected_keys());
    }

    Ok(Batch {
      requests,
      keys,
      success_message: options
        .success_message
        .unwrap_or_else(|| format!("Successfully {} {}", action.past(), R::LABEL)),
      error_message,
      redirect: options.redirect,
    })
  }

  /// Writes go through the main API gateway when it proxies the service.
  fn write_url<R: Resource>(&self, path: &str) -> Result<url::Url, GatewayError> {
    let gateway = self.session.gateway();
    match gateway.gateway_url(R::SERVICE, path, &[]) {
      Some(url) => url,
      None => gateway.url(R::SERVICE, path, &[]),
    }
  }

  /// Issue every request, then report once for the whole batch.
  ///
  /// Each request runs on its own task, so a failure rejects the batch
  /// without cancelling siblings that are still in flight. An empty batch
  /// succeeds.
  async fn execute(&self, batch: Batch) -> Result<Vec<Value>, MutationError> {
    let count = batch.requests.len();
    let calls = batch.requests.into_iter().map(|request| {
      let gateway = self.session.gateway().clone();
      let handle = tokio::spawn(async move { gateway.request_json::<Value>(request).await });
      async move {
        handle
          .await
          .map_err(|e| GatewayError::Transport(format!("request task failed: {}", e)))?
      }
    });

    match try_join_all(calls).await {
      Ok(responses) => {
        for key in &batch.keys {
          self.session.cache().invalidate(key);
        }
        info!(requests = count, invalidated = batch.keys.len(), "mutation succeeded");
        self
          .session
          .alert(AlertKind::Success, &batch.success_message);
        if let Some(route) = &batch.redirect {
          self.session.navigate(route);
        }
        Ok(flatten(responses))
      }
      Err(e) => {
        warn!(requests = count, error = %e, "mutation failed");
        let message = e.detail().unwrap_or(batch.error_message);
        self.session.alert(AlertKind::Error, &message);
        Err(e.into())
      }
    }
  }

  pub async fn create_product(
    &self,
    product: &Product,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create(product, options).await
  }

  pub async fn update_product(
    &self,
    product: &Product,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.update(product, options).await
  }

  /// Delete a product and drop every list scoped to it.
  pub async fn delete_product(
    &self,
    product: &Product,
    mut options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    if let Some(uuid) = product.product_uuid.as_deref() {
      options.invalidate.extend(
        PRODUCT_SCOPED_QUERIES
          .iter()
          .map(|name| QueryKey::list(name, uuid)),
      );
    }
    self.delete(product, options).await
  }

  pub async fn create_release(
    &self,
    release: &Release,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create(release, options).await
  }

  pub async fn update_release(
    &self,
    release: &Release,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.update(release, options).await
  }

  pub async fn delete_release(
    &self,
    release: &Release,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.delete(release, options).await
  }

  pub async fn create_feature(
    &self,
    feature: &Feature,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create(feature, options).await
  }

  pub async fn update_feature(
    &self,
    feature: &Feature,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.update(feature, options).await
  }

  pub async fn delete_feature(
    &self,
    feature: &Feature,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.delete(feature, options).await
  }

  /// Bulk-create features, e.g. from an imported backlog.
  pub async fn import_features(
    &self,
    features: &[Feature],
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create_many(features, options).await
  }

  pub async fn create_issue(
    &self,
    issue: &Issue,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create(issue, options).await
  }

  pub async fn update_issue(
    &self,
    issue: &Issue,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.update(issue, options).await
  }

  pub async fn delete_issue(
    &self,
    issue: &Issue,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.delete(issue, options).await
  }

  /// Replace an issue with a feature: create the feature and delete the issue
  /// concurrently, both or neither reported as done.
  pub async fn convert_issue_to_feature(
    &self,
    issue: &Issue,
    feature: &Feature,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    let error_message = "Couldn't convert issue to feature!".to_string();
    let built = self
      .batch(
        Action::Create,
        std::slice::from_ref(feature),
        options,
        error_message.clone(),
      )
      .and_then(|mut batch| {
        let removal = self.batch(
          Action::Delete,
          std::slice::from_ref(issue),
          MutationOptions::default(),
          error_message.clone(),
        )?;
        batch.requests.extend(removal.requests);
        batch.keys.extend(removal.keys);
        batch.success_message = "Successfully converted issue to feature".to_string();
        Ok(batch)
      });

    match built {
      Ok(batch) => self.execute(batch).await,
      Err(e) => {
        self.session.alert(AlertKind::Error, &error_message);
        Err(e)
      }
    }
  }

  pub async fn create_statuses(
    &self,
    statuses: &[Status],
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create_many(statuses, options).await
  }

  pub async fn update_statuses(
    &self,
    statuses: &[Status],
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.update_many(statuses, options).await
  }

  pub async fn delete_status(
    &self,
    status: &Status,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.delete(status, options).await
  }

  pub async fn create_comment(
    &self,
    comment: &Comment,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create(comment, options).await
  }

  pub async fn create_budget(
    &self,
    budget: &Budget,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create(budget, options).await
  }

  pub async fn update_budget(
    &self,
    budget: &Budget,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.update(budget, options).await
  }

  pub async fn create_task_categories(
    &self,
    categories: &[TaskCategory],
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create_many(categories, options).await
  }

  pub async fn update_task_category(
    &self,
    category: &TaskCategory,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.update(category, options).await
  }

  pub async fn create_board(
    &self,
    board: &Board,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create(board, options).await
  }

  pub async fn create_punchlist(
    &self,
    punchlist: &Punchlist,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create(punchlist, options).await
  }

  /// Append a bug report to the feedback sheet.
  pub async fn report_bug(
    &self,
    bug: &Bug,
    options: MutationOptions,
  ) -> Result<Vec<Value>, MutationError> {
    self.create(bug, options).await
  }
}

/// Array responses contribute their elements, anything else itself; empty
/// bodies (e.g. from deletes) contribute nothing.
fn flatten(responses: Vec<Value>) -> Vec<Value> {
  responses
    .into_iter()
    .flat_map(|response| match response {
      Value::Array(items) => items,
      Value::Null => Vec::new(),
      other => vec![other],
    })
    .collect()
}
