//! Read side: list and detail fetches that never fail.
//!
//! Every fetch tries the service directly, then once more through the main
//! API gateway. Whatever still fails is reported as an alert and the caller
//! gets an empty result.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ServiceTarget;
use crate::event::AlertKind;
use crate::gateway::{GatewayError, GatewayRequest};
use crate::session::Session;

use super::api_types::ListEnvelope;
use super::resource::{is_blank, Resource};
use super::types::{
  Board, Budget, Bug, Comment, CoreUser, Feature, Issue, Organization, Product, Punchlist, Release,
  Status, TaskCategory,
};

#[derive(Clone)]
pub struct QueryClient {
  session: Arc<Session>,
}

impl QueryClient {
  pub fn new(session: Arc<Session>) -> Self {
    Self { session }
  }

  /// List `R` under `parent`, normalizing every failure to an empty list.
  ///
  /// A 404 means the list has no items yet and is not reported.
  pub async fn list<R: Resource>(&self, parent: Option<&str>, filters: &[(&str, &str)]) -> Vec<R> {
    match self.try_list::<R>(parent, filters).await {
      Ok(items) => items,
      Err(e) if e.is_not_found() => {
        debug!(resource = R::LABEL, ?parent, "no items yet");
        Vec::new()
      }
      Err(e) => {
        warn!(resource = R::LABEL, ?parent, error = %e, "list fetch failed");
        self.session.alert(
          AlertKind::Error,
          &format!("Couldn't load {} data!", R::LABEL),
        );
        Vec::new()
      }
    }
  }

  /// Same fetch as [`list`](Self::list) without normalization.
  ///
  /// A blank parent still short-circuits to an empty list.
  pub async fn try_list<R: Resource>(
    &self,
    parent: Option<&str>,
    filters: &[(&str, &str)],
  ) -> Result<Vec<R>, GatewayError> {
    let parent = parent.filter(|p| !is_blank(p));
    let mut query: Vec<(String, String)> = Vec::new();

    if let Some(field) = R::PARENT_FIELD {
      let Some(parent) = parent else {
        return Ok(Vec::new());
      };
      query.push((field.to_string(), parent.to_string()));
    }
    let filters: Vec<(String, String)> = filters
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    query.extend(filters.iter().cloned());

    let key = R::list_key(parent).with_filters(&filters);
    let result = self
      .session
      .cache()
      .fetch(&key, || async {
        self
          .fetch_with_fallback::<ListEnvelope<R>>(R::SERVICE, R::PATH, &query)
          .await
          .map(ListEnvelope::into_items)
      })
      .await?;

    Ok(result.data)
  }

  /// Fetch one entity by identifier. Not cached.
  pub async fn get<R: Resource>(&self, uuid: Option<&str>) -> Option<R> {
    let uuid = uuid.filter(|id| !is_blank(id))?;
    let path = format!("{}{}/", R::PATH, uuid);

    match self.fetch_with_fallback::<R>(R::SERVICE, &path, &[]).await {
      Ok(entity) => Some(entity),
      Err(e) if e.is_not_found() => None,
      Err(e) => {
        warn!(resource = R::LABEL, uuid, error = %e, "detail fetch failed");
        self.session.alert(
          AlertKind::Error,
          &format!("Couldn't load {} details!", R::LABEL),
        );
        None
      }
    }
  }

  /// Direct service call, then exactly one retry through the main API.
  async fn fetch_with_fallback<T: DeserializeOwned>(
    &self,
    target: ServiceTarget,
    path: &str,
    query: &[(String, String)],
  ) -> Result<T, GatewayError> {
    let gateway = self.session.gateway();
    let request = |url| {
      let request = GatewayRequest::get(url);
      if target == ServiceTarget::FeedbackSheet {
        request.without_auth()
      } else {
        request
      }
    };

    let direct_url = gateway.url(target, path, query);
    let mut fallback_url = gateway.gateway_url(target, path, query);
    // Unconfigured services already resolve to their gateway route.
    if matches!((&direct_url, &fallback_url), (Ok(d), Some(Ok(g))) if d == g) {
      fallback_url = None;
    }

    let direct = match direct_url {
      Ok(url) => gateway.request_json(request(url)).await,
      Err(e) => Err(e),
    };

    match direct {
      Ok(value) => Ok(value),
      Err(e) => match fallback_url {
        Some(fallback) => {
          warn!(?target, path, error = %e, "direct service call failed, retrying via main API");
          gateway.request_json(request(fallback?)).await
        }
        None => Err(e),
      },
    }
  }

  pub async fn all_organizations(&self) -> Vec<Organization> {
    self.list(None, &[]).await
  }

  pub async fn all_core_users(&self, organization_uuid: Option<&str>) -> Vec<CoreUser> {
    self.list(organization_uuid, &[]).await
  }

  pub async fn all_products(&self, organization_uuid: Option<&str>) -> Vec<Product> {
    self.list(organization_uuid, &[]).await
  }

  pub async fn all_releases(&self, product_uuid: Option<&str>) -> Vec<Release> {
    self.list(product_uuid, &[]).await
  }

  pub async fn all_features(&self, product_uuid: Option<&str>) -> Vec<Feature> {
    self.list(product_uuid, &[]).await
  }

  pub async fn all_issues(&self, product_uuid: Option<&str>) -> Vec<Issue> {
    self.list(product_uuid, &[]).await
  }

  pub async fn all_statuses(&self, product_uuid: Option<&str>) -> Vec<Status> {
    self.list(product_uuid, &[]).await
  }

  /// Comments of a product, optionally only those on one feature.
  pub async fn all_comments(
    &self,
    product_uuid: Option<&str>,
    feature_uuid: Option<&str>,
  ) -> Vec<Comment> {
    match feature_uuid {
      Some(feature) => self.list(product_uuid, &[("feature", feature)]).await,
      None => self.list(product_uuid, &[]).await,
    }
  }

  pub async fn all_budgets(&self, product_uuid: Option<&str>) -> Vec<Budget> {
    self.list(product_uuid, &[]).await
  }

  pub async fn all_task_categories(&self, product_uuid: Option<&str>) -> Vec<TaskCategory> {
    self.list(product_uuid, &[]).await
  }

  pub async fn all_boards(&self, product_uuid: Option<&str>) -> Vec<Board> {
    self.list(product_uuid, &[]).await
  }

  pub async fn all_punchlists(&self, product_uuid: Option<&str>) -> Vec<Punchlist> {
    self.list(product_uuid, &[]).await
  }

  pub async fn all_bugs(&self, product_uuid: Option<&str>) -> Vec<Bug> {
    self.list(product_uuid, &[]).await
  }
}
